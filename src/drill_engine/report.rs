//! End-of-session summary and its delivery.
//!
//! The engine only builds the payload. Delivery goes through a
//! [`ReportTransport`]; a failed delivery is reported back to the caller but
//! never changes the session or its score.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::drill_engine::{
    error::TransportError,
    models::{SessionState, TestKind},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicBreakdown {
    pub topic: String,
    pub correct: u32,
    pub total: u32,
}

impl TopicBreakdown {
    pub fn incorrect(&self) -> u32 {
        self.total - self.correct
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// 0–100; 0 when nothing was answered.
    pub percentage: f64,
    pub correct_count: u32,
    pub total_count: u32,
    /// In the order topics were first answered.
    pub per_topic_breakdown: Vec<TopicBreakdown>,
}

pub fn build_report(state: &SessionState) -> SessionReport {
    let total_count = state.total_count();
    let percentage = if total_count == 0 {
        0.0
    } else {
        state.correct_count as f64 / total_count as f64 * 100.0
    };
    SessionReport {
        percentage,
        correct_count: state.correct_count,
        total_count,
        per_topic_breakdown: state
            .per_topic_stats
            .iter()
            .map(|(topic, s)| TopicBreakdown {
                topic: topic.clone(),
                correct: s.correct,
                total: s.total,
            })
            .collect(),
    }
}

/// A report addressed to the instructor, with the student identity attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundReport {
    pub student: String,
    pub test_kind: TestKind,
    pub report: SessionReport,
}

impl OutboundReport {
    /// Practice sessions are never sent.
    pub fn requires_delivery(&self) -> bool {
        self.test_kind.requires_identification()
    }

    /// Whole-number score out of 100, truncated.
    pub fn score(&self) -> u32 {
        self.report.percentage as u32
    }

    pub fn subject(&self) -> String {
        format!("Notas Formulación - {}", self.student)
    }

    pub fn breakdown_text(&self) -> String {
        self.report
            .per_topic_breakdown
            .iter()
            .map(|b| format!("- {}: {} aciertos, {} fallos.\n", b.topic, b.correct, b.incorrect()))
            .collect()
    }

    /// Plain-text message body.
    pub fn render_plain_text(&self) -> String {
        format!(
            "Hola,\n\
             El alumno {} ha finalizado ({}).\n\
             NOTA: {} / 100\n\
             Aciertos: {}/{}\n\
             \n\
             Desglose:\n\
             {}",
            self.student,
            self.test_kind,
            self.score(),
            self.report.correct_count,
            self.report.total_count,
            self.breakdown_text(),
        )
    }
}

// ---------------------------------------------------------------------------
// Transports
// ---------------------------------------------------------------------------

/// Something that can carry a finished report to the instructor.
pub trait ReportTransport {
    fn deliver(&self, report: &OutboundReport) -> Result<(), TransportError>;
}

/// Writes each report as a `.txt` file into a directory.
#[derive(Debug, Clone)]
pub struct FileOutbox {
    dir: PathBuf,
}

impl FileOutbox {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileOutbox { dir: dir.into() }
    }

    fn file_name(report: &OutboundReport, n: usize) -> String {
        let student: String = report
            .student
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        format!("{student}-{n:03}.txt")
    }
}

impl ReportTransport for FileOutbox {
    fn deliver(&self, report: &OutboundReport) -> Result<(), TransportError> {
        fs::create_dir_all(&self.dir)?;
        let mut n = 1;
        let path = loop {
            let candidate = self.dir.join(Self::file_name(report, n));
            if !candidate.exists() {
                break candidate;
            }
            n += 1;
        };
        let body = format!("Asunto: {}\n\n{}", report.subject(), report.render_plain_text());
        fs::write(&path, body)?;
        info!(path = %path.display(), "report written to outbox");
        Ok(())
    }
}

/// Keeps delivered reports in memory.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    sent: Mutex<Vec<OutboundReport>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundReport> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ReportTransport for MemoryOutbox {
    fn deliver(&self, report: &OutboundReport) -> Result<(), TransportError> {
        self.sent
            .lock()
            .map_err(|_| TransportError::Rejected("outbox lock poisoned".to_string()))?
            .push(report.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    /// Practice session; nothing to send.
    NotRequired,
    Failed(String),
}

/// Hand the report to `transport` if its test kind requires it.
pub fn dispatch_report(transport: &dyn ReportTransport, report: &OutboundReport) -> DeliveryStatus {
    if !report.requires_delivery() {
        return DeliveryStatus::NotRequired;
    }
    match transport.deliver(report) {
        Ok(()) => DeliveryStatus::Delivered,
        Err(e) => {
            warn!(student = %report.student, error = %e, "report delivery failed");
            DeliveryStatus::Failed(e.to_string())
        }
    }
}
