//! Persistent store abstraction for workers and jobs.
//!
//! The hosted document store is an external collaborator. The engine needs
//! equality queries and one primitive for every mutation: a per-job
//! conditional write that only applies if the job is still in the state the
//! caller read. That write also moves the job between workers' active counts,
//! so the count invariant holds per job without cross-document transactions.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::core::model::{
    AssignmentSource, AssignmentState, GeoPoint, Job, JobId, JobPriority, Worker,
};
use crate::core::DispatchError;

pub mod memory;
pub mod record;

pub use memory::InMemoryStore;
pub use record::{JobRecord, WorkerRecord};

/// New values written by a conditional update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpdate {
    /// State to move the job into.
    pub state: AssignmentState,
    /// Assignment source to record; `None` leaves it unchanged.
    pub source: Option<AssignmentSource>,
    /// Priority to record; `None` leaves it unchanged.
    pub priority: Option<JobPriority>,
}

impl JobUpdate {
    /// Update that only changes state.
    pub const fn state(state: AssignmentState) -> Self {
        Self {
            state,
            source: None,
            priority: None,
        }
    }

    /// Update that claims the job for a worker.
    pub const fn assign(worker_id: String, source: AssignmentSource) -> Self {
        Self {
            state: AssignmentState::Assigned(worker_id),
            source: Some(source),
            priority: None,
        }
    }

    /// Also record a priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Option<JobPriority>) -> Self {
        self.priority = priority;
        self
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The job was in the expected state and has been updated.
    Applied,
    /// Another writer changed the job first; carries the state found.
    Conflict(AssignmentState),
}

/// Storage operations the engine depends on.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Fetch one worker.
    async fn worker(&self, worker_id: &str) -> Result<Option<Worker>, DispatchError>;

    /// All workers, active or not.
    async fn workers(&self) -> Result<Vec<Worker>, DispatchError>;

    /// Fetch jobs by id in request order. Unknown ids are omitted.
    async fn jobs(&self, job_ids: &[JobId]) -> Result<Vec<Job>, DispatchError>;

    /// All jobs scheduled on `date`, in insertion order.
    async fn jobs_on(&self, date: NaiveDate) -> Result<Vec<Job>, DispatchError>;

    /// Jobs assigned to or in progress with `worker_id`.
    async fn jobs_held_by(&self, worker_id: &str) -> Result<Vec<Job>, DispatchError>;

    /// Apply `update` to the job iff its state still equals `expected`.
    ///
    /// On success the previous holder's active count is decremented and the
    /// new holder's incremented, atomically with the job write.
    async fn compare_and_set(
        &self,
        job_id: &str,
        expected: &AssignmentState,
        update: JobUpdate,
    ) -> Result<WriteOutcome, DispatchError>;

    /// Record geocoded coordinates for a job.
    async fn set_point(&self, job_id: &str, point: GeoPoint) -> Result<(), DispatchError>;
}
