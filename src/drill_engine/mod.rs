//! Core drill engine: dataset, question drawing, answer judging and sessions.
//!
//! ## Module overview
//!
//! | Module       | Purpose |
//! |--------------|---------|
//! | `models`     | Shared types: compound records, modes, naming systems, questions, session state |
//! | `normalizer` | Case/accent folding for names, subscript-digit folding for formulas |
//! | `topic_map`  | Canonical topic vocabulary → dataset labels |
//! | `dataset`    | CSV loading of the compound table |
//! | `bank`       | Dataset + topic map, shared read-only across sessions |
//! | `generator`  | `generate_question()`: topic-balanced draw with bounded redraws |
//! | `judge`      | Mode-specific answer comparison |
//! | `config`     | Drill settings (TOML) and the session configuration form |
//! | `session`    | `SessionTracker` state machine |
//! | `report`     | End-of-session summary and report transports |
//! | `payload`    | JSON views for a UI collaborator |
//! | `error`      | Error types |

pub mod bank;
pub mod config;
pub mod dataset;
pub mod error;
pub mod generator;
pub mod judge;
pub mod models;
pub mod normalizer;
pub mod payload;
pub mod report;
pub mod session;
pub mod topic_map;

// Re-export the public API surface so callers can use
// `drill_engine::SessionTracker` without reaching into sub-modules.
pub use bank::QuestionBank;
pub use config::{validate_config, ConfigDraft, DrillSettings};
pub use dataset::Dataset;
pub use error::{ConfigError, ConfigErrors, DatasetError, DrillError, SettingsError, TransportError};
pub use generator::{generate_question, QuestionRequest};
pub use judge::judge;
pub use models::{
    CompoundRecord, FailureDetails, NamingSystem, Phase, Question, QuestionLimit, QuizMode,
    SessionConfig, SessionProgress, SessionState, TestKind, TopicStats, Verdict,
};
pub use report::{
    build_report, dispatch_report, DeliveryStatus, FileOutbox, MemoryOutbox, OutboundReport,
    ReportTransport, SessionReport, TopicBreakdown,
};
pub use session::{Advance, SessionTracker, SubmitOutcome};
pub use topic_map::{build_topic_map, TopicMap, CANONICAL_TOPICS};
