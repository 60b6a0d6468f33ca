//! Refresh state owned by a display layer.
//!
//! `Dashboard` holds the one mutable list of records. Each successful
//! `refresh` replaces it wholesale; a failed refresh keeps the previous list
//! and records the error so the caller can offer a retry.

use tracing::warn;

use crate::error::ApiError;
use crate::repository::BreedRepository;
use crate::types::{BreedBatch, BreedRecord};

/// Status value counted as a successful fetch.
pub const SUCCESS_STATE: &str = "success";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    /// Displayed records whose state is `success`. Skipped runs are not
    /// counted here.
    pub successful: usize,
    /// Items dropped from the last successful batch.
    pub skipped: usize,
    /// `start_date` of the newest record.
    pub last_updated: Option<String>,
}

pub struct Dashboard<R> {
    repository: R,
    workflow_id: String,
    limit: usize,
    records: Vec<BreedRecord>,
    skipped: usize,
    last_error: Option<ApiError>,
    loaded: bool,
}

impl<R: BreedRepository> Dashboard<R> {
    pub fn new(repository: R, workflow_id: impl Into<String>, limit: usize) -> Self {
        Self {
            repository,
            workflow_id: workflow_id.into(),
            limit,
            records: Vec::new(),
            skipped: 0,
            last_error: None,
            loaded: false,
        }
    }

    /// Runs one fetch cycle. On success the previous records are discarded.
    /// A failure is kept until the next successful cycle and returned
    /// borrowed, so callers can branch on the variant.
    pub fn refresh(&mut self) -> Result<&[BreedRecord], &ApiError> {
        match self.repository.fetch_recent(&self.workflow_id, self.limit) {
            Ok(batch) => {
                self.apply(batch);
                Ok(&self.records)
            }
            Err(err) => {
                warn!(workflow_id = %self.workflow_id, error = %err, "refresh failed");
                self.loaded = true;
                Err(&*self.last_error.insert(err))
            }
        }
    }

    fn apply(&mut self, batch: BreedBatch) {
        self.skipped = batch.skipped_count();
        self.records = batch.records;
        self.last_error = None;
        self.loaded = true;
    }

    pub fn records(&self) -> &[BreedRecord] {
        &self.records
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    /// False until the first cycle has completed, successfully or not.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats {
            total: self.records.len(),
            successful: self
                .records
                .iter()
                .filter(|r| r.state.as_deref() == Some(SUCCESS_STATE))
                .count(),
            skipped: self.skipped,
            last_updated: self.records.first().and_then(|r| r.start_date.clone()),
        }
    }
}
