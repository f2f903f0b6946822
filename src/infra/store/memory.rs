//! In-memory store for development, tests and single-process deployments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::core::model::{AssignmentState, GeoPoint, Job, JobId, Worker, WorkerId};
use crate::core::DispatchError;
use crate::infra::store::record::{JobRecord, WorkerRecord};
use crate::infra::store::{AssignmentStore, JobUpdate, WriteOutcome};

#[derive(Default)]
struct StoreState {
    workers: HashMap<WorkerId, Worker>,
    /// Jobs in insertion order.
    jobs: Vec<Job>,
    job_index: HashMap<JobId, usize>,
}

impl StoreState {
    fn job(&self, job_id: &str) -> Option<&Job> {
        self.job_index.get(job_id).map(|&i| &self.jobs[i])
    }
}

/// Mutex-guarded store. Every conditional write holds the lock for the
/// whole read-compare-write, which is what makes it atomic per job.
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    available: AtomicBool,
    writes: AtomicU64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            available: AtomicBool::new(true),
            writes: AtomicU64::new(0),
        }
    }

    /// Build a store from raw documents, validating each one.
    pub fn from_records(
        workers: Vec<WorkerRecord>,
        jobs: Vec<JobRecord>,
    ) -> Result<Self, DispatchError> {
        let store = Self::new();
        for record in workers {
            store.insert_worker(Worker::try_from(record)?);
        }
        for record in jobs {
            store.insert_job(Job::try_from(record)?);
        }
        Ok(store)
    }

    /// Insert or replace a worker.
    pub fn insert_worker(&self, worker: Worker) {
        self.state.lock().workers.insert(worker.id.clone(), worker);
    }

    /// Insert or replace a job, keeping its original position on replace.
    pub fn insert_job(&self, job: Job) {
        let mut state = self.state.lock();
        if let Some(&i) = state.job_index.get(&job.id) {
            state.jobs[i] = job;
        } else {
            let i = state.jobs.len();
            state.job_index.insert(job.id.clone(), i);
            state.jobs.push(job);
        }
    }

    /// Simulate an outage: while unavailable every call fails with
    /// [`DispatchError::StoreUnavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Number of writes applied since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Acquire)
    }

    /// Current copy of a job.
    pub fn job_snapshot(&self, job_id: &str) -> Option<Job> {
        self.state.lock().job(job_id).cloned()
    }

    /// Current copy of a worker.
    pub fn worker_snapshot(&self, worker_id: &str) -> Option<Worker> {
        self.state.lock().workers.get(worker_id).cloned()
    }

    fn check_available(&self) -> Result<(), DispatchError> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(DispatchError::StoreUnavailable(
                "in-memory store marked unavailable".into(),
            ))
        }
    }
}

#[async_trait]
impl AssignmentStore for InMemoryStore {
    async fn worker(&self, worker_id: &str) -> Result<Option<Worker>, DispatchError> {
        self.check_available()?;
        Ok(self.worker_snapshot(worker_id))
    }

    async fn workers(&self) -> Result<Vec<Worker>, DispatchError> {
        self.check_available()?;
        let state = self.state.lock();
        let mut workers: Vec<Worker> = state.workers.values().cloned().collect();
        workers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(workers)
    }

    async fn jobs(&self, job_ids: &[JobId]) -> Result<Vec<Job>, DispatchError> {
        self.check_available()?;
        let state = self.state.lock();
        Ok(job_ids
            .iter()
            .filter_map(|id| state.job(id).cloned())
            .collect())
    }

    async fn jobs_on(&self, date: NaiveDate) -> Result<Vec<Job>, DispatchError> {
        self.check_available()?;
        let state = self.state.lock();
        Ok(state
            .jobs
            .iter()
            .filter(|j| j.scheduled_date == date)
            .cloned()
            .collect())
    }

    async fn jobs_held_by(&self, worker_id: &str) -> Result<Vec<Job>, DispatchError> {
        self.check_available()?;
        let state = self.state.lock();
        Ok(state
            .jobs
            .iter()
            .filter(|j| j.holder() == Some(worker_id))
            .cloned()
            .collect())
    }

    async fn compare_and_set(
        &self,
        job_id: &str,
        expected: &AssignmentState,
        update: JobUpdate,
    ) -> Result<WriteOutcome, DispatchError> {
        self.check_available()?;
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let idx = *state
            .job_index
            .get(job_id)
            .ok_or_else(|| DispatchError::JobNotFound(job_id.to_string()))?;
        let current = state.jobs[idx].state.clone();
        if &current != expected {
            return Ok(WriteOutcome::Conflict(current));
        }

        let previous_holder = current.holder().map(str::to_string);
        let next_holder = update.state.holder().map(str::to_string);
        if let Some(next) = next_holder.as_deref() {
            if !state.workers.contains_key(next) {
                return Err(DispatchError::WorkerNotFound(next.to_string()));
            }
        }

        if previous_holder != next_holder {
            if let Some(prev) = previous_holder.as_deref().and_then(|w| state.workers.get_mut(w)) {
                prev.active_job_count = prev.active_job_count.saturating_sub(1);
            }
            if let Some(next) = next_holder.as_deref().and_then(|w| state.workers.get_mut(w)) {
                next.active_job_count += 1;
            }
        }

        let job = &mut state.jobs[idx];
        job.state = update.state;
        if let Some(source) = update.source {
            job.source = Some(source);
        }
        if let Some(priority) = update.priority {
            job.priority = priority;
        }
        self.writes.fetch_add(1, Ordering::AcqRel);
        Ok(WriteOutcome::Applied)
    }

    async fn set_point(&self, job_id: &str, point: GeoPoint) -> Result<(), DispatchError> {
        self.check_available()?;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let idx = *state
            .job_index
            .get(job_id)
            .ok_or_else(|| DispatchError::JobNotFound(job_id.to_string()))?;
        state.jobs[idx].location.point = Some(point);
        self.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
