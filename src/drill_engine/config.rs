//! Drill settings and the session configuration form.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::drill_engine::{
    error::{ConfigError, ConfigErrors, SettingsError},
    generator::DEFAULT_MAX_DRAW_ATTEMPTS,
    models::{NamingSystem, QuestionLimit, QuizMode, SessionConfig, TestKind},
    topic_map::CANONICAL_TOPICS,
};

/// Deployment-wide policy. Every field has a default, so an empty TOML file
/// (or no file at all) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillSettings {
    /// Suffixes an exam email must end with.
    #[serde(default = "default_email_domains")]
    pub accepted_email_domains: Vec<String>,
    #[serde(default = "default_max_skips")]
    pub max_skips: u32,
    /// Fixed length of both exam kinds.
    #[serde(default = "default_exam_question_count")]
    pub exam_question_count: u32,
    #[serde(default = "default_practice_options")]
    pub practice_limit_options: Vec<u32>,
    #[serde(default = "default_practice_limit")]
    pub practice_default_limit: u32,
    /// Restrict `TestKind::Exam` to exactly one topic.
    #[serde(default = "default_true")]
    pub single_topic_exam: bool,
    #[serde(default = "default_max_draw_attempts")]
    pub max_draw_attempts: u32,
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,
}

fn default_email_domains() -> Vec<String> {
    vec!["@alumno.fomento.edu".to_string(), "@fomento.edu".to_string()]
}
fn default_max_skips() -> u32 {
    3
}
fn default_exam_question_count() -> u32 {
    20
}
fn default_practice_options() -> Vec<u32> {
    vec![5, 10, 15, 20]
}
fn default_practice_limit() -> u32 {
    10
}
fn default_true() -> bool {
    true
}
fn default_max_draw_attempts() -> u32 {
    DEFAULT_MAX_DRAW_ATTEMPTS
}
fn default_outbox_dir() -> PathBuf {
    PathBuf::from("./outbox")
}

impl Default for DrillSettings {
    fn default() -> Self {
        Self {
            accepted_email_domains: default_email_domains(),
            max_skips: default_max_skips(),
            exam_question_count: default_exam_question_count(),
            practice_limit_options: default_practice_options(),
            practice_default_limit: default_practice_limit(),
            single_topic_exam: true,
            max_draw_attempts: default_max_draw_attempts(),
            outbox_dir: default_outbox_dir(),
        }
    }
}

impl DrillSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// True when the trimmed address ends with an accepted suffix.
    pub fn email_accepted(&self, email: &str) -> bool {
        let email = email.trim();
        self.accepted_email_domains
            .iter()
            .any(|d| email.ends_with(d.as_str()))
    }

    /// `None` for an exam when `exam_question_count` is zero.
    fn limit_for(&self, kind: TestKind, practice: QuestionLimit) -> Option<QuestionLimit> {
        match kind {
            TestKind::Practice => Some(practice),
            TestKind::Exam | TestKind::ExamMixed => QuestionLimit::finite(self.exam_question_count),
        }
    }
}

/// Editable state of the configuration screen.
///
/// Selections are kept in the order they were made. `build` validates the
/// whole form and reports every problem at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDraft {
    test_kind: TestKind,
    topics: Vec<String>,
    modes: Vec<QuizMode>,
    naming_systems: Vec<NamingSystem>,
    practice_limit: QuestionLimit,
    email: String,
}

impl ConfigDraft {
    pub fn new(settings: &DrillSettings) -> Self {
        ConfigDraft {
            test_kind: TestKind::Practice,
            topics: Vec::new(),
            modes: QuizMode::ALL.to_vec(),
            naming_systems: NamingSystem::ALL.to_vec(),
            practice_limit: QuestionLimit::finite(settings.practice_default_limit)
                .unwrap_or(QuestionLimit::Unbounded),
            email: String::new(),
        }
    }

    pub fn test_kind(&self) -> TestKind {
        self.test_kind
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Switching kind clears the topic selection.
    pub fn set_test_kind(&mut self, kind: TestKind) {
        if kind != self.test_kind {
            self.test_kind = kind;
            self.topics.clear();
        }
    }

    /// Check or uncheck a topic. Under a single-topic exam, checking replaces
    /// the current selection instead.
    pub fn toggle_topic(&mut self, settings: &DrillSettings, topic: &str) {
        if let Some(pos) = self.topics.iter().position(|t| t == topic) {
            self.topics.remove(pos);
            return;
        }
        if self.test_kind == TestKind::Exam && settings.single_topic_exam {
            self.topics.clear();
        }
        self.topics.push(topic.to_string());
    }

    pub fn set_modes(&mut self, modes: &[QuizMode]) {
        self.modes = dedup(modes);
    }

    pub fn set_naming_systems(&mut self, systems: &[NamingSystem]) {
        self.naming_systems = dedup(systems);
    }

    /// Only meaningful for practice; exams use the fixed count.
    pub fn set_practice_limit(&mut self, limit: QuestionLimit) {
        self.practice_limit = limit;
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    /// Validate the form into an immutable [`SessionConfig`].
    pub fn build(&self, settings: &DrillSettings) -> Result<SessionConfig, ConfigErrors> {
        let identify = self.test_kind.requires_identification();
        let email = self.email.trim();
        let question_limit = settings.limit_for(self.test_kind, self.practice_limit);
        let config = SessionConfig {
            test_kind: self.test_kind,
            topics: self.topics.clone(),
            modes: self.modes.clone(),
            naming_systems: self.naming_systems.clone(),
            question_limit: question_limit.unwrap_or(QuestionLimit::Unbounded),
            student_email: (identify && !email.is_empty()).then(|| email.to_string()),
        };

        let mut errors = validate_config(&config, settings);
        if question_limit.is_none() {
            errors.push(ConfigError::EmptyExam);
        }
        for t in &self.topics {
            if !CANONICAL_TOPICS.contains(&t.as_str()) {
                errors.push(ConfigError::UnknownTopic(t.clone()));
            }
        }
        if self.test_kind == TestKind::Practice {
            if let QuestionLimit::Finite(n) = self.practice_limit {
                if !settings.practice_limit_options.contains(&n.get()) {
                    errors.push(ConfigError::UnsupportedLimit(n.get()));
                }
            }
        }

        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigErrors(errors))
        }
    }
}

/// Check a configuration against the session rules. Returns every problem
/// found; an empty list means the configuration can start a session.
pub fn validate_config(config: &SessionConfig, settings: &DrillSettings) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.test_kind.requires_identification() {
        match config.student_email.as_deref().map(str::trim) {
            None | Some("") => errors.push(ConfigError::MissingEmail),
            Some(email) if !settings.email_accepted(email) => {
                errors.push(ConfigError::EmailDomainRejected {
                    email: email.to_string(),
                    accepted: settings.accepted_email_domains.join(", "),
                });
            }
            Some(_) => {}
        }
    }
    if config.topics.is_empty() {
        errors.push(ConfigError::NoTopics);
    }
    let distinct_topics = dedup_topics(&config.topics).len();
    if config.test_kind == TestKind::Exam && settings.single_topic_exam && distinct_topics > 1 {
        errors.push(ConfigError::TooManyTopicsForExam(distinct_topics));
    }
    if config.modes.is_empty() {
        errors.push(ConfigError::NoModes);
    }
    if config.naming_systems.is_empty() {
        errors.push(ConfigError::NoNamingSystems);
    }
    errors
}

fn dedup_topics(topics: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::with_capacity(topics.len());
    for t in topics {
        if !out.contains(&t.as_str()) {
            out.push(t);
        }
    }
    out
}

fn dedup<T: Copy + PartialEq>(items: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    for &i in items {
        if !out.contains(&i) {
            out.push(i);
        }
    }
    out
}
