//! Error types for the drill engine.
//!
//! Configuration problems are collected into [`ConfigErrors`] so the student
//! can fix every one of them in a single pass. Draw failures are typed so the
//! caller has to decide what to show instead of the engine retrying forever.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::drill_engine::models::Phase;

/// A single problem with a submitted session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("select at least one topic")]
    NoTopics,

    #[error("select at least one mode (name or formula)")]
    NoModes,

    #[error("select at least one naming system")]
    NoNamingSystems,

    #[error("an email address is required for exams")]
    MissingEmail,

    /// The address does not end with any accepted domain suffix.
    #[error("email '{email}' is not in an accepted domain ({accepted})")]
    EmailDomainRejected { email: String, accepted: String },

    #[error("a single-topic exam accepts exactly one topic (got {0})")]
    TooManyTopicsForExam(usize),

    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("question limit {0} is not one of the offered options")]
    UnsupportedLimit(u32),

    /// `exam_question_count` is zero, so an exam could never finish.
    #[error("exam length must be at least one question")]
    EmptyExam,
}

/// Every configuration problem found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigErrors(pub Vec<ConfigError>);

impl ConfigErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter()
    }

    pub fn contains(&self, err: &ConfigError) -> bool {
        self.0.contains(err)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", msgs.join("; "))
    }
}

impl std::error::Error for ConfigErrors {}

/// Failures while reading the compound dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("dataset has no usable rows")]
    Empty,
}

/// Errors from reading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors produced by question drawing and session transitions.
#[derive(Debug, Error)]
pub enum DrillError {
    /// The selected topics match zero dataset rows.
    #[error("no questions available for topics: {}", topics.join(", "))]
    NoQuestionsAvailable { topics: Vec<String> },

    /// None of the selected rows has a usable name for the enabled systems.
    #[error("none of the {rows} selected rows has a name in the enabled naming systems")]
    NoEligibleQuestion { rows: usize },

    #[error("nothing enabled: {0}")]
    NothingEnabled(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigErrors),

    #[error("no skips left (maximum {max})")]
    SkipBudgetExhausted { max: u32 },

    #[error("cannot {action} while {phase}")]
    InvalidPhase { action: &'static str, phase: Phase },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl DrillError {
    /// True for failures the student can fix by changing the configuration.
    pub fn is_configuration_problem(&self) -> bool {
        matches!(
            self,
            DrillError::InvalidConfig(_)
                | DrillError::NoQuestionsAvailable { .. }
                | DrillError::NoEligibleQuestion { .. }
                | DrillError::NothingEnabled(_)
        )
    }
}

/// Report delivery failures. Never invalidate a finished session.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport rejected the report: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_display_joins_all_messages() {
        let errs = ConfigErrors(vec![ConfigError::NoTopics, ConfigError::NoModes]);
        let text = errs.to_string();
        assert!(text.contains("topic"));
        assert!(text.contains("mode"));
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn phase_error_names_action_and_phase() {
        let e = DrillError::InvalidPhase { action: "skip", phase: Phase::Finished };
        assert_eq!(e.to_string(), "cannot skip while finished");
        assert!(!e.is_configuration_problem());
    }
}
