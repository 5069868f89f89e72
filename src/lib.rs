//! # formulation_drill
//!
//! A drill engine for inorganic chemical nomenclature.
//!
//! The engine shows a formula or a name in one of three naming systems
//! (Traditional, Stock, Systematic), accepts a free-text answer, judges it
//! with a tolerant comparison, and keeps per-topic accuracy for the session.
//!
//! ## How it works
//!
//! 1. Load a [`Dataset`] (CSV) and wrap it in a [`QuestionBank`], which maps the
//!    nine curriculum topics to the labels the dataset actually uses.
//! 2. Fill a [`ConfigDraft`] (test kind, topics, modes, naming systems, limit,
//!    email) and `build` it into a [`SessionConfig`]. Every problem is reported
//!    at once.
//! 3. Drive a [`SessionTracker`]: `start`, `submit_answer`, `acknowledge`
//!    after a failure, `skip` (bounded), `reset`.
//! 4. When the tracker is finished, take its [`OutboundReport`] and hand it
//!    to a [`ReportTransport`] with [`dispatch_report`].
//!
//! ## Key features
//!
//! - **Topic-balanced draws**: a topic is chosen uniformly first, so a family
//!   with many rows does not crowd out a small one.
//! - **Tolerant judging**: names ignore case and accents; formulas are
//!   case-sensitive but accept subscript digits (`H₂O` = `H2O`).
//! - **Deterministic**: pass `Some(seed)` to the tracker to replay a session.
//! - **Usable rows only**: rows without a name in the enabled systems are left
//!   out of the draw; when none remain, `start` fails with
//!   [`DrillError::NoEligibleQuestion`] instead of looping.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use formulation_drill::{
//!     CompoundRecord, ConfigDraft, Dataset, DrillSettings, NamingSystem, Phase,
//!     QuestionBank, QuestionLimit, SessionTracker, SubmitOutcome,
//! };
//!
//! let dataset = Dataset::from_records(vec![
//!     CompoundRecord::new("Na2O", "Óxidos").with_name(NamingSystem::Stock, "óxido de sodio"),
//!     CompoundRecord::new("CaO", "Óxidos").with_name(NamingSystem::Stock, "óxido de calcio"),
//! ]);
//! let bank = Arc::new(QuestionBank::new(dataset));
//! let settings = DrillSettings::default();
//!
//! let mut draft = ConfigDraft::new(&settings);
//! draft.toggle_topic(&settings, "Óxidos");
//! draft.set_practice_limit(QuestionLimit::finite(5).unwrap());
//! let config = draft.build(&settings).unwrap();
//!
//! let mut session = SessionTracker::new(bank, settings, Some(42));
//! let question = session.start(config).unwrap();
//! println!("{}: {}", question.instruction(), question.prompt_text);
//!
//! let answer = question.expected_answer.clone();
//! assert!(matches!(session.submit_answer(&answer).unwrap(), SubmitOutcome::Correct { .. }));
//! assert_eq!(session.phase(), Phase::Answering);
//! assert_eq!(session.report().correct_count, 1);
//! ```

pub mod drill_engine;

// Convenience re-exports so callers can use `formulation_drill::SessionTracker`
// directly without reaching into `drill_engine::`.
pub use drill_engine::{
    build_report, build_topic_map, dispatch_report, generate_question, judge, validate_config,
    Advance, CompoundRecord, ConfigDraft, ConfigError, ConfigErrors, Dataset, DatasetError,
    DeliveryStatus, DrillError, DrillSettings, FailureDetails, FileOutbox, MemoryOutbox,
    NamingSystem, OutboundReport, Phase, Question, QuestionBank, QuestionLimit, QuestionRequest,
    QuizMode, ReportTransport, SessionConfig, SessionProgress, SessionReport, SessionState,
    SessionTracker, SettingsError, SubmitOutcome, TestKind, TopicBreakdown, TopicMap, TopicStats,
    TransportError, Verdict, CANONICAL_TOPICS,
};
