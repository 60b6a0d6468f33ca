//! Domain and wire types for breed data.
//!
//! # Design
//! `BreedRecord` is the one shape handed to the display layer. Everything
//! else in this module mirrors an upstream payload and is deliberately
//! lenient: every field is optional and unknown fields are ignored, because
//! the two integrations disagree on naming and the display layer only
//! needs a handful of fields.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, LookupError};

/// Normalized breed record consumed by the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreedRecord {
    pub breed_name: String,
    pub description: Option<String>,
    pub life_span: Option<String>,
    pub run_id: Option<String>,
    pub start_date: Option<String>,
    pub state: Option<String>,
}

/// Result of one fetch cycle: the surviving records in upstream order plus
/// whatever had to be left out.
#[derive(Debug, Default)]
pub struct BreedBatch {
    pub records: Vec<BreedRecord>,
    pub skipped: Vec<SkippedItem>,
}

impl BreedBatch {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Collects per-item outcomes, preserving the relative order of
    /// successes.
    pub fn from_results<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (String, Result<BreedRecord, LookupError>)>,
    {
        let mut batch = BreedBatch::default();
        for (key, result) in items {
            match result {
                Ok(record) => batch.records.push(record),
                Err(reason) => batch.skipped.push(SkippedItem { key, reason }),
            }
        }
        batch
    }
}

/// An item dropped from a batch. `key` is the run id when one is known,
/// otherwise the item's position in the upstream payload.
#[derive(Debug)]
pub struct SkippedItem {
    pub key: String,
    pub reason: LookupError,
}

/// Breed row as served by the direct-record API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreedDto {
    pub id: Option<String>,
    pub breed_name: Option<String>,
    pub description: Option<String>,
    pub life_expectancy: Option<String>,
    pub life_span: Option<String>,
    pub dag_id: Option<String>,
    pub dag_run_id: Option<String>,
    pub run_id: Option<String>,
    pub task_id: Option<String>,
    pub execution_date: Option<String>,
    pub start_date: Option<String>,
    pub created_at: Option<String>,
    pub state: Option<String>,
}

impl BreedDto {
    pub fn normalize(self) -> Result<BreedRecord, LookupError> {
        let breed_name = non_empty(self.breed_name).ok_or(LookupError::MissingBreedName)?;
        Ok(BreedRecord {
            breed_name,
            description: non_empty(self.description),
            life_span: first_non_empty([self.life_span, self.life_expectancy]),
            run_id: first_non_empty([self.run_id, self.dag_run_id]),
            start_date: first_non_empty([self.start_date, self.execution_date]),
            state: non_empty(self.state),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreedStats {
    pub total_breeds: u64,
    pub unique_breeds: u64,
    #[serde(default)]
    pub latest_execution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthCheck {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// One workflow run as listed by the orchestrator, with its id resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDescriptor {
    pub run_id: String,
    pub start_date: Option<String>,
    pub state: Option<String>,
}

/// Listing entry as sent on the wire. Orchestrator versions disagree on
/// the id field; some send both.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunEntry {
    run_id: Option<String>,
    dag_run_id: Option<String>,
    start_date: Option<String>,
    state: Option<String>,
}

impl RunDescriptor {
    /// Decodes one listing entry. An entry without a usable id cannot be
    /// looked up and is rejected on its own, not with the whole listing.
    pub fn from_entry(entry: serde_json::Value) -> Result<Self, LookupError> {
        if !entry.is_object() {
            return Err(LookupError::Malformed(format!("run entry is not an object: {entry}")));
        }
        let entry: RunEntry =
            serde_json::from_value(entry).map_err(|e| LookupError::Malformed(e.to_string()))?;
        let run_id = first_non_empty([entry.run_id, entry.dag_run_id]).ok_or(LookupError::MissingRunId)?;
        Ok(Self {
            run_id,
            start_date: non_empty(entry.start_date),
            state: non_empty(entry.state),
        })
    }
}

/// Runs listing. The orchestrator wraps runs in `dag_runs`; some versions
/// and proxies return the bare array. Entries stay raw so one bad entry
/// does not reject the listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RunList {
    Wrapped { dag_runs: Vec<serde_json::Value> },
    Bare(Vec<serde_json::Value>),
}

impl RunList {
    pub fn from_value(value: serde_json::Value) -> Result<Self, ApiError> {
        serde_json::from_value(value).map_err(|e| ApiError::UpstreamShapeMismatch(e.to_string()))
    }

    pub fn into_runs(self) -> Vec<Result<RunDescriptor, LookupError>> {
        let entries = match self {
            RunList::Wrapped { dag_runs } => dag_runs,
            RunList::Bare(runs) => runs,
        };
        entries.into_iter().map(RunDescriptor::from_entry).collect()
    }
}

/// Entry of the per-run value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunValue {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Structured summary pushed by the summary step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreedSummaryValue {
    pub breed_name: Option<String>,
    pub life_span: Option<String>,
    pub life_expectancy: Option<String>,
    pub description: Option<String>,
    pub message: Option<String>,
}

/// Raw return value of the fetch step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchResultValue {
    pub breed_name: Option<String>,
    pub life_span: Option<String>,
    pub life_expectancy: Option<String>,
    pub description: Option<String>,
    pub full_data: serde_json::Value,
}

/// Fields common to both per-run values, ready to be stamped with run
/// metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedBreed {
    pub breed_name: Option<String>,
    pub life_span: Option<String>,
    pub description: Option<String>,
}

impl From<BreedSummaryValue> for DerivedBreed {
    fn from(v: BreedSummaryValue) -> Self {
        Self {
            breed_name: v.breed_name,
            life_span: first_non_empty([v.life_span, v.life_expectancy]),
            description: v.description,
        }
    }
}

impl From<FetchResultValue> for DerivedBreed {
    fn from(v: FetchResultValue) -> Self {
        Self {
            breed_name: v.breed_name,
            life_span: first_non_empty([v.life_span, v.life_expectancy]),
            description: v.description,
        }
    }
}

impl DerivedBreed {
    pub fn into_record(self, run: &RunDescriptor) -> Result<BreedRecord, LookupError> {
        let breed_name = non_empty(self.breed_name).ok_or(LookupError::MissingBreedName)?;
        Ok(BreedRecord {
            breed_name,
            description: non_empty(self.description),
            life_span: non_empty(self.life_span),
            run_id: Some(run.run_id.clone()),
            start_date: run.start_date.clone(),
            state: run.state.clone(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().find_map(non_empty)
}
