//! Compound dataset loading.
//!
//! The dataset is a CSV export with one row per compound. Column headers follow
//! the classroom spreadsheet (`Fórmula`, `Nomenclatura Tradicional`,
//! `Nomenclatura de Stock`, `Nomenclatura Sistemática`, `COMPUESTO`); short
//! ASCII aliases are accepted as well. Every cell is treated as text.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::drill_engine::{
    error::DatasetError,
    models::{CompoundRecord, NamingSystem},
};

const FORMULA_HEADERS: [&str; 2] = ["Fórmula", "formula"];
const TOPIC_HEADERS: [&str; 2] = ["COMPUESTO", "topic"];
const NAME_HEADERS: [&str; 6] = [
    "Nomenclatura Tradicional",
    "traditional",
    "Nomenclatura de Stock",
    "stock",
    "Nomenclatura Sistemática",
    "systematic",
];

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Fórmula", alias = "formula", default)]
    formula: Option<String>,
    #[serde(rename = "Nomenclatura Tradicional", alias = "traditional", default)]
    traditional: Option<String>,
    #[serde(rename = "Nomenclatura de Stock", alias = "stock", default)]
    stock: Option<String>,
    #[serde(rename = "Nomenclatura Sistemática", alias = "systematic", default)]
    systematic: Option<String>,
    #[serde(rename = "COMPUESTO", alias = "topic", default)]
    topic: Option<String>,
}

impl RawRow {
    /// `None` when formula or topic is blank.
    fn into_record(self) -> Option<CompoundRecord> {
        let formula = self.formula.filter(|f| !f.trim().is_empty())?;
        let topic = self.topic.filter(|t| !t.trim().is_empty())?;
        let mut record = CompoundRecord::new(formula, topic);
        for (system, name) in [
            (NamingSystem::Traditional, self.traditional),
            (NamingSystem::Stock, self.stock),
            (NamingSystem::Systematic, self.systematic),
        ] {
            if let Some(name) = name {
                record = record.with_name(system, name);
            }
        }
        Some(record)
    }
}

/// The loaded compound table. Read-only for the lifetime of every session.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<CompoundRecord>,
}

impl Dataset {
    /// Wrap already-built records. Records with a blank formula or topic are dropped.
    pub fn from_records(records: Vec<CompoundRecord>) -> Self {
        let records = records
            .into_iter()
            .filter(|r| !r.formula.is_empty() && !r.topic.is_empty())
            .collect();
        Dataset { records }
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_csv_reader(file)?;
        info!(path = %path.display(), rows = dataset.len(), "dataset loaded");
        Ok(dataset)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let has = |names: &[&str]| headers.iter().any(|h| names.contains(&h));
        if !has(&FORMULA_HEADERS) {
            return Err(DatasetError::MissingColumn("Fórmula"));
        }
        if !has(&TOPIC_HEADERS) {
            return Err(DatasetError::MissingColumn("COMPUESTO"));
        }
        if !has(&NAME_HEADERS) {
            warn!("dataset has no nomenclature columns; no question can be drawn");
        }

        let mut records = Vec::new();
        let mut dropped = 0usize;
        for row in rdr.deserialize::<RawRow>() {
            match row?.into_record() {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!(dropped, "rows without formula or topic dropped");
        }
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Dataset { records })
    }

    pub fn records(&self) -> &[CompoundRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct topic labels in first-appearance order.
    pub fn topics(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in &self.records {
            if !out.iter().any(|t| t == &r.topic) {
                out.push(r.topic.clone());
            }
        }
        out
    }

    /// Records whose topic is one of `labels` (dataset labels, not canonical ones).
    pub fn filter_topics<S: AsRef<str>>(&self, labels: &[S]) -> Vec<CompoundRecord> {
        self.records
            .iter()
            .filter(|r| labels.iter().any(|l| l.as_ref() == r.topic))
            .cloned()
            .collect()
    }
}
