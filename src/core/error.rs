//! Error types for dispatch operations.

use thiserror::Error;

use crate::core::model::{JobId, WorkerId};

/// Errors produced by dispatch components.
///
/// Batch operations report `NotEligible` and `ConflictLost` per job inside
/// their outcomes rather than returning them; only structurally invalid
/// requests, permission failures and storage outages fail a whole call.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request is structurally invalid (empty selection, bad coordinates).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// An aggregate was requested over zero elements.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),
    /// No worker covers the job's service area.
    #[error("no eligible worker for job {0}")]
    NotEligible(JobId),
    /// A conditional write lost a race against another writer.
    #[error("conditional write lost for job {0}")]
    ConflictLost(JobId),
    /// Caller lacks the role required for the requested action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Worker identifier not present in the store.
    #[error("worker not found: {0}")]
    WorkerNotFound(WorkerId),
    /// Job identifier not present in the store.
    #[error("job not found: {0}")]
    JobNotFound(JobId),
    /// Transient storage or geocoding failure.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl DispatchError {
    /// Whether the caller should retry the whole request.
    ///
    /// Retrying a batch is safe: jobs committed by the failed attempt are no
    /// longer unassigned and drop out of candidate selection.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
