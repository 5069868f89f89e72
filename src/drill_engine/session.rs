//! The per-session state machine.
//!
//! ```text
//! Configuring --start--> Answering --correct--> Answering | Finished
//!                        Answering --incorrect--> ShowingFailure --acknowledge--> Answering | Finished
//!                        Answering --skip--> Answering          (bounded by max_skips)
//! any --reset--> Configuring
//! ```
//!
//! Each tracker owns its [`SessionState`] and RNG; only the [`QuestionBank`]
//! is shared between sessions.

use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info};

use crate::drill_engine::{
    bank::QuestionBank,
    config::{validate_config, DrillSettings},
    error::{ConfigErrors, DrillError},
    generator::{generate_question, QuestionRequest},
    judge::judge,
    models::{
        CompoundRecord, FailureDetails, Phase, Question, QuestionLimit, SessionConfig,
        SessionProgress, SessionState, Verdict,
    },
    report::{build_report, OutboundReport, SessionReport},
};

/// Result of submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// `finished` is true when this answer used up the question limit.
    Correct { verdict: Verdict, finished: bool },
    Incorrect { verdict: Verdict, failure: FailureDetails },
    /// Submitted outside `Answering` (e.g. after the session finished). Nothing changed.
    Ignored,
}

/// Where the session went after acknowledging a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextQuestion,
    Finished,
}

pub struct SessionTracker {
    bank: Arc<QuestionBank>,
    settings: DrillSettings,
    rng: StdRng,
    config: Option<SessionConfig>,
    pool: Vec<CompoundRecord>,
    state: SessionState,
    current: Option<Question>,
    /// Number of questions drawn so far; the next serial.
    draws: u32,
}

impl SessionTracker {
    pub fn new(bank: Arc<QuestionBank>, settings: DrillSettings, rng_seed: Option<u64>) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        SessionTracker {
            bank,
            settings,
            rng,
            config: None,
            pool: Vec::new(),
            state: SessionState::default(),
            current: None,
            draws: 0,
        }
    }

    // ── accessors ────────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn settings(&self) -> &DrillSettings {
        &self.settings
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase == Phase::Finished
    }

    pub fn skips_remaining(&self) -> u32 {
        self.settings.max_skips.saturating_sub(self.state.skips_used)
    }

    pub fn progress(&self) -> SessionProgress {
        let answered = self.state.total_count();
        let limit = self
            .config
            .as_ref()
            .map(|c| c.question_limit)
            .unwrap_or(QuestionLimit::Unbounded);
        let kind = self
            .config
            .as_ref()
            .map(|c| c.test_kind.to_string())
            .unwrap_or_default();
        let (fraction, caption) = match limit.get() {
            Some(n) => (
                (answered as f32 / n as f32).min(1.0),
                format!("{} | {}/{}", kind, (answered + 1).min(n), n),
            ),
            None => (0.0, format!("{} ∞ | Llevas {}", kind, answered)),
        };
        SessionProgress { answered, limit, fraction, caption }
    }

    pub fn report(&self) -> SessionReport {
        build_report(&self.state)
    }

    /// The report wrapped with the student identity, ready for a transport.
    pub fn outbound_report(&self) -> Option<OutboundReport> {
        let config = self.config.as_ref()?;
        Some(OutboundReport {
            student: config.student_label(),
            test_kind: config.test_kind,
            report: self.report(),
        })
    }

    // ── transitions ──────────────────────────────────────────────────────────

    /// `Configuring → Answering`. Validates the configuration, resets every
    /// counter and draws the first question. On error the session stays in
    /// `Configuring`.
    pub fn start(&mut self, config: SessionConfig) -> Result<&Question, DrillError> {
        if self.state.phase != Phase::Configuring {
            return Err(DrillError::InvalidPhase { action: "start", phase: self.state.phase });
        }
        let errors = validate_config(&config, &self.settings);
        if !errors.is_empty() {
            return Err(DrillError::InvalidConfig(ConfigErrors(errors)));
        }

        let pool = self.bank.pool_for(&config.topics);
        if pool.is_empty() {
            return Err(DrillError::NoQuestionsAvailable { topics: config.topics.clone() });
        }

        self.state = SessionState::default();
        self.draws = 0;
        self.pool = pool;
        self.config = Some(config);

        if let Err(e) = self.draw_next() {
            self.clear();
            return Err(e);
        }
        self.state.phase = Phase::Answering;

        if let Some(cfg) = &self.config {
            info!(
                kind = %cfg.test_kind,
                topics = ?cfg.topics,
                limit = %cfg.question_limit,
                pool = self.pool.len(),
                "session started"
            );
        }
        self.current_or_invalid("start")
    }

    /// Judge `raw_answer` against the current question.
    pub fn submit_answer(&mut self, raw_answer: &str) -> Result<SubmitOutcome, DrillError> {
        if self.state.phase != Phase::Answering {
            debug!(phase = %self.state.phase, "stray submission ignored");
            return Ok(SubmitOutcome::Ignored);
        }
        let Some(question) = self.current.as_ref() else {
            return Ok(SubmitOutcome::Ignored);
        };

        let verdict = judge(question.mode, raw_answer, &question.expected_answer);
        let topic = question.record.topic.clone();
        self.state.record_answer(&topic, verdict.is_correct);
        debug!(id = %question.question_id, correct = verdict.is_correct, "answer judged");

        if verdict.is_correct {
            let finished = self.finish_if_limit_reached();
            if !finished {
                self.draw_next()?;
            }
            Ok(SubmitOutcome::Correct { verdict, finished })
        } else {
            let failure = FailureDetails {
                prompt_text: question.prompt_text.clone(),
                user_answer: raw_answer.to_string(),
                expected_answer: question.expected_answer.clone(),
            };
            self.state.last_failure = Some(failure.clone());
            self.state.phase = Phase::ShowingFailure;
            Ok(SubmitOutcome::Incorrect { verdict, failure })
        }
    }

    /// `ShowingFailure → Answering | Finished`.
    pub fn acknowledge(&mut self) -> Result<Advance, DrillError> {
        if self.state.phase != Phase::ShowingFailure {
            return Err(DrillError::InvalidPhase { action: "acknowledge", phase: self.state.phase });
        }
        if self.finish_if_limit_reached() {
            return Ok(Advance::Finished);
        }
        self.state.phase = Phase::Answering;
        self.draw_next()?;
        Ok(Advance::NextQuestion)
    }

    /// Replace the current question without scoring it. A skip is only
    /// spent once the replacement has been drawn.
    pub fn skip(&mut self) -> Result<&Question, DrillError> {
        if self.state.phase != Phase::Answering {
            return Err(DrillError::InvalidPhase { action: "skip", phase: self.state.phase });
        }
        if self.state.skips_used >= self.settings.max_skips {
            return Err(DrillError::SkipBudgetExhausted { max: self.settings.max_skips });
        }
        self.draw_next()?;
        self.state.skips_used += 1;
        self.current_or_invalid("skip")
    }

    /// Draw again after a failed draw left `Answering` without a question.
    pub fn retry_draw(&mut self) -> Result<&Question, DrillError> {
        if self.state.phase != Phase::Answering {
            return Err(DrillError::InvalidPhase { action: "draw", phase: self.state.phase });
        }
        if self.current.is_none() {
            self.draw_next()?;
        }
        self.current_or_invalid("draw")
    }

    /// Any phase → `Configuring`, discarding every counter and the question.
    pub fn reset(&mut self) {
        if self.state.phase != Phase::Configuring {
            info!(
                correct = self.state.correct_count,
                total = self.state.total_count(),
                "session reset"
            );
        }
        self.clear();
    }

    // ── internals ────────────────────────────────────────────────────────────

    fn clear(&mut self) {
        self.state = SessionState::default();
        self.config = None;
        self.pool.clear();
        self.current = None;
        self.draws = 0;
    }

    fn finish_if_limit_reached(&mut self) -> bool {
        let limit = self
            .config
            .as_ref()
            .map(|c| c.question_limit)
            .unwrap_or(QuestionLimit::Unbounded);
        if !limit.is_reached(self.state.questions_asked) {
            return false;
        }
        self.state.phase = Phase::Finished;
        self.current = None;
        info!(
            correct = self.state.correct_count,
            total = self.state.total_count(),
            "session finished"
        );
        true
    }

    fn draw_next(&mut self) -> Result<(), DrillError> {
        self.current = None;
        let Some(config) = self.config.as_ref() else {
            return Err(DrillError::InvalidPhase { action: "draw", phase: self.state.phase });
        };
        let request = QuestionRequest::new(&self.pool, &config.modes, &config.naming_systems)
            .serial(self.draws + 1)
            .max_attempts(self.settings.max_draw_attempts);
        let question = generate_question(&mut self.rng, request)?;
        self.draws += 1;
        self.current = Some(question);
        Ok(())
    }

    fn current_or_invalid(&self, action: &'static str) -> Result<&Question, DrillError> {
        self.current
            .as_ref()
            .ok_or(DrillError::InvalidPhase { action, phase: self.state.phase })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill_engine::{
        dataset::Dataset,
        models::{NamingSystem, QuizMode, TestKind},
    };

    fn bank() -> Arc<QuestionBank> {
        Arc::new(QuestionBank::new(Dataset::from_records(vec![
            CompoundRecord::new("Na2O", "Óxidos").with_name(NamingSystem::Stock, "óxido de sodio"),
            CompoundRecord::new("CaO", "Óxidos").with_name(NamingSystem::Stock, "óxido de calcio"),
            CompoundRecord::new("NaOH", "Hidróxidos").with_name(NamingSystem::Stock, "hidróxido de sodio"),
        ])))
    }

    fn practice(limit: QuestionLimit) -> SessionConfig {
        SessionConfig {
            test_kind: TestKind::Practice,
            topics: vec!["Óxidos".into(), "Hidróxidos".into()],
            modes: QuizMode::ALL.to_vec(),
            naming_systems: vec![NamingSystem::Stock],
            question_limit: limit,
            student_email: None,
        }
    }

    fn tracker() -> SessionTracker {
        SessionTracker::new(bank(), DrillSettings::default(), Some(42))
    }

    fn expected(t: &SessionTracker) -> String {
        t.current_question().unwrap().expected_answer.clone()
    }

    #[test]
    fn starts_in_configuring_and_moves_to_answering() {
        let mut t = tracker();
        assert_eq!(t.phase(), Phase::Configuring);
        let q = t.start(practice(QuestionLimit::finite(5).unwrap())).unwrap();
        assert_eq!(q.serial, 1);
        assert_eq!(t.phase(), Phase::Answering);
    }

    #[test]
    fn invalid_config_keeps_configuring() {
        let mut t = tracker();
        let mut cfg = practice(QuestionLimit::Unbounded);
        cfg.modes.clear();
        cfg.naming_systems.clear();
        match t.start(cfg) {
            Err(DrillError::InvalidConfig(errs)) => assert_eq!(errs.len(), 2),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
        assert_eq!(t.phase(), Phase::Configuring);
    }

    #[test]
    fn empty_pool_is_surfaced() {
        let mut t = tracker();
        let mut cfg = practice(QuestionLimit::Unbounded);
        cfg.topics = vec!["Sales Dobles".into()];
        assert!(matches!(t.start(cfg), Err(DrillError::NoQuestionsAvailable { .. })));
        assert_eq!(t.phase(), Phase::Configuring);
        assert!(t.current_question().is_none());
    }

    #[test]
    fn wrong_answer_shows_failure_then_continues() {
        let mut t = tracker();
        t.start(practice(QuestionLimit::Unbounded)).unwrap();
        let prompt = t.current_question().unwrap().prompt_text.clone();
        let answer = expected(&t);

        match t.submit_answer("no sé").unwrap() {
            SubmitOutcome::Incorrect { failure, .. } => {
                assert_eq!(failure.prompt_text, prompt);
                assert_eq!(failure.user_answer, "no sé");
                assert_eq!(failure.expected_answer, answer);
            }
            other => panic!("expected Incorrect, got {other:?}"),
        }
        assert_eq!(t.phase(), Phase::ShowingFailure);
        assert_eq!(t.state().incorrect_count, 1);
        assert!(t.state().last_failure.is_some());

        // Submissions while the failure is shown change nothing.
        assert_eq!(t.submit_answer(&answer).unwrap(), SubmitOutcome::Ignored);
        assert_eq!(t.state().total_count(), 1);

        assert_eq!(t.acknowledge().unwrap(), Advance::NextQuestion);
        assert_eq!(t.phase(), Phase::Answering);
        assert_eq!(t.current_question().unwrap().serial, 2);
    }

    #[test]
    fn last_answer_wrong_finishes_after_acknowledge() {
        let mut t = tracker();
        t.start(practice(QuestionLimit::finite(1).unwrap())).unwrap();
        t.submit_answer("").unwrap();
        assert_eq!(t.phase(), Phase::ShowingFailure);
        assert_eq!(t.acknowledge().unwrap(), Advance::Finished);
        assert!(t.is_finished());
        assert_eq!(t.report().percentage, 0.0);
    }

    #[test]
    fn skip_draws_without_scoring_until_budget_is_spent() {
        let mut t = tracker();
        t.start(practice(QuestionLimit::Unbounded)).unwrap();
        for n in 1..=3u32 {
            let q = t.skip().unwrap();
            assert_eq!(q.serial, n + 1);
            assert_eq!(t.skips_remaining(), 3 - n);
        }
        assert!(matches!(t.skip(), Err(DrillError::SkipBudgetExhausted { max: 3 })));
        assert_eq!(t.state().correct_count, 0);
        assert_eq!(t.state().incorrect_count, 0);
        assert_eq!(t.state().skips_used, 3);
    }

    #[test]
    fn failed_skip_draw_keeps_the_skip() {
        let mut t = tracker();
        t.start(practice(QuestionLimit::Unbounded)).unwrap();
        let pool = std::mem::take(&mut t.pool);
        assert!(matches!(t.skip(), Err(DrillError::NoQuestionsAvailable { .. })));
        assert_eq!(t.state().skips_used, 0);
        assert_eq!(t.skips_remaining(), 3);
        assert_eq!(t.phase(), Phase::Answering);
        assert!(t.current_question().is_none());

        t.pool = pool;
        assert_eq!(t.retry_draw().unwrap().serial, 2);
        assert_eq!(t.state().skips_used, 0);
    }

    #[test]
    fn skip_is_rejected_outside_answering() {
        let mut t = tracker();
        assert!(matches!(t.skip(), Err(DrillError::InvalidPhase { action: "skip", .. })));
    }

    #[test]
    fn reset_discards_everything() {
        let mut t = tracker();
        t.start(practice(QuestionLimit::Unbounded)).unwrap();
        let answer = expected(&t);
        t.submit_answer(&answer).unwrap();
        t.skip().unwrap();
        t.reset();
        assert_eq!(t.phase(), Phase::Configuring);
        assert_eq!(t.state(), &SessionState::default());
        assert!(t.current_question().is_none());
        assert!(t.config().is_none());
        // A new session can start right away.
        t.start(practice(QuestionLimit::Unbounded)).unwrap();
        assert_eq!(t.current_question().unwrap().serial, 1);
    }

    #[test]
    fn start_twice_requires_reset() {
        let mut t = tracker();
        t.start(practice(QuestionLimit::Unbounded)).unwrap();
        assert!(matches!(
            t.start(practice(QuestionLimit::Unbounded)),
            Err(DrillError::InvalidPhase { action: "start", .. })
        ));
    }

    #[test]
    fn progress_caption_counts_the_current_question() {
        let mut t = tracker();
        t.start(practice(QuestionLimit::finite(5).unwrap())).unwrap();
        let p = t.progress();
        assert_eq!(p.caption, "Práctica | 1/5");
        assert_eq!(p.fraction, 0.0);

        let answer = expected(&t);
        t.submit_answer(&answer).unwrap();
        let p = t.progress();
        assert_eq!(p.answered, 1);
        assert_eq!(p.caption, "Práctica | 2/5");
        assert!((p.fraction - 0.2).abs() < 1e-6);
    }

    #[test]
    fn unbounded_progress_caption() {
        let mut t = tracker();
        t.start(practice(QuestionLimit::Unbounded)).unwrap();
        assert_eq!(t.progress().caption, "Práctica ∞ | Llevas 0");
    }

    #[test]
    fn outbound_report_uses_student_label() {
        let mut t = tracker();
        let mut cfg = practice(QuestionLimit::finite(5).unwrap());
        cfg.test_kind = TestKind::ExamMixed;
        cfg.student_email = Some("ana@alumno.fomento.edu".into());
        t.start(cfg).unwrap();
        let out = t.outbound_report().unwrap();
        assert_eq!(out.student, "ana@alumno.fomento.edu");
        assert_eq!(out.test_kind, TestKind::ExamMixed);
    }
}
