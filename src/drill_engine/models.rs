use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Nomenclature primitives
// ---------------------------------------------------------------------------

/// One of the three conventions for naming an inorganic compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NamingSystem {
    Traditional,
    Stock,
    /// Systematic nomenclature with multiplier prefixes (mono-, di-, tri-...).
    Systematic,
}

impl NamingSystem {
    pub const ALL: [NamingSystem; 3] = [
        NamingSystem::Traditional,
        NamingSystem::Stock,
        NamingSystem::Systematic,
    ];
}

impl fmt::Display for NamingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NamingSystem::Traditional => "Tradicional",
            NamingSystem::Stock       => "Stock",
            NamingSystem::Systematic  => "Pref. Multiplicadores",
        };
        write!(f, "{}", s)
    }
}

/// Direction of the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuizMode {
    /// Formula shown, the student writes the name ("Nombrar").
    NameFromFormula,
    /// Name shown, the student writes the formula ("Formular").
    FormulaFromName,
}

impl QuizMode {
    pub const ALL: [QuizMode; 2] = [QuizMode::NameFromFormula, QuizMode::FormulaFromName];
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizMode::NameFromFormula => write!(f, "Nombrar"),
            QuizMode::FormulaFromName => write!(f, "Formular"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset rows
// ---------------------------------------------------------------------------

/// One row of the compound dataset. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundRecord {
    pub formula: String,
    /// Only non-blank names are stored.
    pub names: BTreeMap<NamingSystem, String>,
    /// Compound family exactly as it appears in the dataset (trimmed).
    pub topic: String,
}

impl CompoundRecord {
    pub fn new(formula: impl Into<String>, topic: impl Into<String>) -> Self {
        CompoundRecord {
            formula: formula.into().trim().to_string(),
            names: BTreeMap::new(),
            topic: topic.into().trim().to_string(),
        }
    }

    /// Builder-style setter; blank names are ignored.
    pub fn with_name(mut self, system: NamingSystem, name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            self.names.insert(system, trimmed.to_string());
        }
        self
    }

    pub fn name(&self, system: NamingSystem) -> Option<&str> {
        self.names.get(&system).map(String::as_str)
    }

    /// A name is usable as a question when it has more than one character
    /// after trimming.
    pub fn has_usable_name(&self, system: NamingSystem) -> bool {
        self.name(system)
            .map(|n| n.trim().chars().count() > 1)
            .unwrap_or(false)
    }

    /// Systems from `enabled` with a usable name on this record, in the order given.
    pub fn eligible_systems(&self, enabled: &[NamingSystem]) -> Vec<NamingSystem> {
        enabled
            .iter()
            .copied()
            .filter(|s| self.has_usable_name(*s))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Session configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestKind {
    Practice,
    /// Single-topic integrity exam.
    Exam,
    /// Exam over any mix of topics.
    ExamMixed,
}

impl TestKind {
    /// Exams identify the student and have their results delivered.
    pub fn requires_identification(self) -> bool {
        !matches!(self, TestKind::Practice)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::Practice  => write!(f, "Práctica"),
            TestKind::Exam      => write!(f, "Examen"),
            TestKind::ExamMixed => write!(f, "Examen (mezcla)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionLimit {
    Finite(NonZeroU32),
    Unbounded,
}

impl QuestionLimit {
    /// `None` for zero, which is not a valid limit.
    pub fn finite(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(QuestionLimit::Finite)
    }

    pub fn get(self) -> Option<u32> {
        match self {
            QuestionLimit::Finite(n) => Some(n.get()),
            QuestionLimit::Unbounded => None,
        }
    }

    pub fn is_reached(self, answered: u32) -> bool {
        match self {
            QuestionLimit::Finite(n) => answered >= n.get(),
            QuestionLimit::Unbounded => false,
        }
    }
}

impl fmt::Display for QuestionLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionLimit::Finite(n) => write!(f, "{}", n),
            QuestionLimit::Unbounded => write!(f, "∞"),
        }
    }
}

/// Immutable configuration of one session. Compare two values with `==` to
/// detect a configuration change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub test_kind: TestKind,
    /// Canonical topic labels, in selection order.
    pub topics: Vec<String>,
    pub modes: Vec<QuizMode>,
    pub naming_systems: Vec<NamingSystem>,
    pub question_limit: QuestionLimit,
    pub student_email: Option<String>,
}

impl SessionConfig {
    /// Identifier used in reports: the email, or a fixed label for practice.
    pub fn student_label(&self) -> String {
        match &self.student_email {
            Some(email) if self.test_kind.requires_identification() => email.clone(),
            _ => "Práctica libre".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Questions and verdicts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Mode prefix + random hex, e.g. "FN-3A0F11C2".
    pub question_id: String,
    /// Monotonic draw number within the session; identifies the answer input.
    pub serial: u32,
    pub record: CompoundRecord,
    pub mode: QuizMode,
    pub naming_system: NamingSystem,
    pub prompt_text: String,
    pub expected_answer: String,
}

impl Question {
    pub fn topic(&self) -> &str {
        &self.record.topic
    }

    /// Short instruction shown above the prompt.
    pub fn instruction(&self) -> String {
        match self.mode {
            QuizMode::FormulaFromName => format!("Escribe la fórmula ({})", self.naming_system),
            QuizMode::NameFromFormula => format!("Nombra ({})", self.naming_system),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_correct: bool,
    /// The answer as it should be echoed back to the student.
    pub normalized_user_display: String,
}

/// What the student sees after a wrong answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetails {
    pub prompt_text: String,
    pub user_answer: String,
    pub expected_answer: String,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Configuring,
    Answering,
    ShowingFailure,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Configuring    => "configuring",
            Phase::Answering      => "answering",
            Phase::ShowingFailure => "showing-failure",
            Phase::Finished       => "finished",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStats {
    pub correct: u32,
    pub total: u32,
}

impl TopicStats {
    pub fn incorrect(&self) -> u32 {
        self.total - self.correct
    }
}

/// Mutable per-session counters. One per running session, never shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub correct_count: u32,
    pub incorrect_count: u32,
    /// Keyed by dataset topic, in first-encountered order.
    pub per_topic_stats: Vec<(String, TopicStats)>,
    /// Questions resolved by an answer (correct or incorrect).
    pub questions_asked: u32,
    pub skips_used: u32,
    pub phase: Phase,
    pub last_failure: Option<FailureDetails>,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            correct_count: 0,
            incorrect_count: 0,
            per_topic_stats: Vec::new(),
            questions_asked: 0,
            skips_used: 0,
            phase: Phase::Configuring,
            last_failure: None,
        }
    }
}

impl SessionState {
    pub fn total_count(&self) -> u32 {
        self.correct_count + self.incorrect_count
    }

    pub fn record_answer(&mut self, topic: &str, is_correct: bool) {
        if is_correct {
            self.correct_count += 1;
        } else {
            self.incorrect_count += 1;
        }
        self.questions_asked += 1;

        let idx = match self.per_topic_stats.iter().position(|(t, _)| t == topic) {
            Some(i) => i,
            None => {
                self.per_topic_stats.push((topic.to_string(), TopicStats::default()));
                self.per_topic_stats.len() - 1
            }
        };
        let stats = &mut self.per_topic_stats[idx].1;
        stats.total += 1;
        if is_correct {
            stats.correct += 1;
        }
    }

    pub fn topic_stats(&self, topic: &str) -> Option<TopicStats> {
        self.per_topic_stats
            .iter()
            .find(|(t, _)| t == topic)
            .map(|(_, s)| *s)
    }
}

/// Aggregated progress for the header bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub answered: u32,
    pub limit: QuestionLimit,
    /// `answered / limit`, capped at 1.0; always 0.0 when unbounded.
    pub fraction: f32,
    pub caption: String,
}
