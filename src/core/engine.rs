//! Store-backed dispatch operations.
//!
//! The engine is stateless between calls. Every operation reads a snapshot,
//! plans with the pure components, and commits one conditional write per job.
//! A write that finds the job changed since the snapshot is a per-job skip;
//! only invalid requests, permission failures and store outages fail a call.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::DispatchConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::auth::{Authorizer, Caller, RoleAuthorizer};
use crate::core::balancer::{plan_auto_assign, plan_for_activation, Assignment};
use crate::core::capacity::{self, CapacityPolicy, CapacityWarning, WorkloadSnapshot};
use crate::core::model::{
    AssignmentSource, AssignmentState, GeoPoint, Job, JobId, JobPriority, Worker,
};
use crate::core::reassignment::ReassignmentWorkflow;
use crate::core::DispatchError;
use crate::geo::{self, AnchorSpec, ClusterReport};
use crate::infra::geocode::Geocoder;
use crate::infra::store::{AssignmentStore, JobUpdate, WriteOutcome};

/// Actor recorded for scheduled and activation-triggered runs.
pub const SYSTEM_ACTOR: &str = "system";

/// Result of a bulk auto-assign run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAssignOutcome {
    /// Committed pairings.
    pub assigned: Vec<Assignment>,
    /// Planned jobs another writer claimed first.
    pub skipped: Vec<JobId>,
    /// Jobs in areas no active worker covers.
    pub unassignable: Vec<JobId>,
}

/// Result of a manual assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAssignOutcome {
    /// Jobs now held by the worker.
    pub assigned: Vec<JobId>,
    /// Jobs not claimed: unknown, already held, or lost to another writer.
    pub skipped: Vec<JobId>,
    /// Capacity warnings for the batch. Informational.
    pub warnings: Vec<CapacityWarning>,
}

/// Result of a reassignment commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignOutcome {
    /// Jobs moved onto the target.
    pub reassigned: Vec<JobId>,
    /// Jobs held by another worker and left alone.
    pub skipped_conflicts: Vec<JobId>,
    /// Jobs needing no move, unknown, or changed since selection.
    pub skipped: Vec<JobId>,
    /// Capacity warnings shown at confirmation.
    pub warnings: Vec<CapacityWarning>,
}

/// Result of a geocoding backfill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillOutcome {
    /// Jobs that now have coordinates.
    pub located: Vec<JobId>,
    /// Jobs the geocoder does not know.
    pub not_found: Vec<JobId>,
    /// Jobs whose lookup failed transiently; retry later.
    pub failed: Vec<JobId>,
}

/// Which jobs an operation works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobSelection {
    /// Explicit job ids.
    Ids(Vec<JobId>),
    /// Every job scheduled on a date.
    Date(NaiveDate),
}

/// A ranked job in a `nearby` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyJob {
    /// Ranked job.
    pub job_id: JobId,
    /// Distance from the anchor.
    pub distance_miles: f64,
}

/// Assignment engine over a shared store.
pub struct DispatchEngine<S> {
    store: Arc<S>,
    config: DispatchConfig,
    authorizer: Arc<dyn Authorizer>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl<S> Clone for DispatchEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            authorizer: Arc::clone(&self.authorizer),
            audit: self.audit.clone(),
        }
    }
}

impl<S: AssignmentStore> DispatchEngine<S> {
    /// Engine with role-based authorization and no audit sink.
    ///
    /// `config` is taken as already validated, as `DispatchConfig::from_env`
    /// and `DispatchConfig::from_json_str` return it. Use
    /// [`DispatchEngine::try_new`] for a hand-built config.
    pub fn new(store: Arc<S>, config: DispatchConfig) -> Self {
        Self {
            store,
            config,
            authorizer: Arc::new(RoleAuthorizer),
            audit: None,
        }
    }

    /// Engine over a config that is validated first.
    pub fn try_new(store: Arc<S>, config: DispatchConfig) -> Result<Self, DispatchError> {
        config.validate().map_err(|e| {
            DispatchError::InvalidInput(format!("invalid dispatch config: {e}"))
        })?;
        Ok(Self::new(store, config))
    }

    /// Replace the authorizer.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Record committed changes into `sink`.
    #[must_use]
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Underlying store.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Policy in force.
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    fn policy(&self) -> CapacityPolicy {
        CapacityPolicy::from(&self.config)
    }

    async fn require_worker(&self, worker_id: &str) -> Result<Worker, DispatchError> {
        self.store
            .worker(worker_id)
            .await?
            .ok_or_else(|| DispatchError::WorkerNotFound(worker_id.to_string()))
    }

    async fn require_active_worker(&self, worker_id: &str) -> Result<Worker, DispatchError> {
        let worker = self.require_worker(worker_id).await?;
        if !worker.active {
            return Err(DispatchError::InvalidInput(format!(
                "worker {worker_id} is inactive"
            )));
        }
        Ok(worker)
    }

    async fn require_job(&self, job_id: &str) -> Result<Job, DispatchError> {
        self.store
            .jobs(&[job_id.to_string()])
            .await?
            .pop()
            .ok_or_else(|| DispatchError::JobNotFound(job_id.to_string()))
    }

    async fn load_selection(&self, selection: &JobSelection) -> Result<Vec<Job>, DispatchError> {
        match selection {
            JobSelection::Ids(ids) => {
                let ids = dedup_ids(ids)?;
                self.store.jobs(&ids).await
            }
            JobSelection::Date(date) => self.store.jobs_on(*date).await,
        }
    }

    /// One conditional write with audit. `Ok(false)` when another writer
    /// changed the job first.
    async fn commit(
        &self,
        job: &Job,
        update: JobUpdate,
        action: AuditAction,
        actor: &str,
    ) -> Result<bool, DispatchError> {
        let worker_id = update.state.holder().or_else(|| match &update.state {
            AssignmentState::Completed(w) => Some(w.as_str()),
            _ => None,
        });
        let worker_id = worker_id.unwrap_or_default().to_string();

        match self.store.compare_and_set(&job.id, &job.state, update).await? {
            WriteOutcome::Applied => {
                tracing::debug!(job_id = %job.id, worker_id = %worker_id, ?action, "committed");
                if let Some(sink) = &self.audit {
                    sink.record(build_audit_event(
                        job.id.clone(),
                        worker_id,
                        job.holder().map(str::to_string),
                        action,
                        actor,
                        None,
                    ));
                }
                Ok(true)
            }
            WriteOutcome::Conflict(found) => {
                let lost = DispatchError::ConflictLost(job.id.clone());
                tracing::warn!(job_id = %job.id, ?found, "{lost}; skipping");
                Ok(false)
            }
        }
    }

    /// Distribute every unassigned job scheduled on `date` over the active
    /// workers covering it.
    ///
    /// Safe to re-run: jobs claimed by an earlier run are no longer
    /// unassigned and drop out of planning.
    pub async fn auto_assign(&self, date: NaiveDate) -> Result<AutoAssignOutcome, DispatchError> {
        let jobs = self.store.jobs_on(date).await?;
        let workers = self.store.workers().await?;
        let plan = plan_auto_assign(&jobs, &workers);
        let by_id: HashMap<&str, &Job> = jobs.iter().map(|j| (j.id.as_str(), j)).collect();

        let mut outcome = AutoAssignOutcome {
            unassignable: plan.unassignable,
            ..AutoAssignOutcome::default()
        };
        for assignment in plan.assignments {
            let Some(job) = by_id.get(assignment.job_id.as_str()) else {
                continue;
            };
            let update = JobUpdate::assign(assignment.worker_id.clone(), AssignmentSource::Auto);
            if self.commit(job, update, AuditAction::Assign, SYSTEM_ACTOR).await? {
                outcome.assigned.push(assignment);
            } else {
                outcome.skipped.push(assignment.job_id);
            }
        }

        tracing::info!(
            %date,
            assigned = outcome.assigned.len(),
            skipped = outcome.skipped.len(),
            unassignable = outcome.unassignable.len(),
            "auto-assign finished"
        );
        Ok(outcome)
    }

    /// Give a newly active worker every unassigned job on `date` they cover.
    pub async fn assign_on_activation(
        &self,
        worker_id: &str,
        date: NaiveDate,
    ) -> Result<AutoAssignOutcome, DispatchError> {
        let worker = self.require_worker(worker_id).await?;
        let jobs = self.store.jobs_on(date).await?;
        let by_id: HashMap<&str, &Job> = jobs.iter().map(|j| (j.id.as_str(), j)).collect();

        let mut outcome = AutoAssignOutcome::default();
        for assignment in plan_for_activation(&worker, &jobs) {
            let Some(job) = by_id.get(assignment.job_id.as_str()) else {
                continue;
            };
            let update = JobUpdate::assign(worker.id.clone(), AssignmentSource::Auto);
            if self.commit(job, update, AuditAction::Assign, SYSTEM_ACTOR).await? {
                outcome.assigned.push(assignment);
            } else {
                outcome.skipped.push(assignment.job_id);
            }
        }

        tracing::info!(
            worker_id = %worker.id,
            %date,
            assigned = outcome.assigned.len(),
            skipped = outcome.skipped.len(),
            "activation assignment finished"
        );
        Ok(outcome)
    }

    /// Claim the listed unassigned jobs for a worker.
    ///
    /// Capacity warnings are computed for the claimable jobs and returned
    /// alongside the result; they never block the assignment.
    pub async fn manual_assign(
        &self,
        caller: &Caller,
        worker_id: &str,
        job_ids: &[JobId],
        priority: Option<JobPriority>,
    ) -> Result<ManualAssignOutcome, DispatchError> {
        let ids = dedup_ids(job_ids)?;
        let worker = self.require_active_worker(worker_id).await?;
        let jobs = self.store.jobs(&ids).await?;

        let found: HashSet<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        let mut outcome = ManualAssignOutcome {
            skipped: ids
                .iter()
                .filter(|id| !found.contains(id.as_str()))
                .cloned()
                .collect(),
            ..ManualAssignOutcome::default()
        };

        let (claimable, held): (Vec<Job>, Vec<Job>) =
            jobs.into_iter().partition(|j| j.state.is_unassigned());
        outcome.skipped.extend(held.into_iter().map(|j| j.id));

        let workload = WorkloadSnapshot::of(&worker, self.config.capacity_ceiling);
        outcome.warnings = capacity::validate(&worker, &claimable, &workload, &self.policy());

        for job in &claimable {
            let update = JobUpdate::assign(worker.id.clone(), AssignmentSource::Manual)
                .with_priority(priority);
            if self.commit(job, update, AuditAction::Assign, &caller.id).await? {
                outcome.assigned.push(job.id.clone());
            } else {
                outcome.skipped.push(job.id.clone());
            }
        }

        tracing::info!(
            worker_id = %worker.id,
            caller = %caller.id,
            assigned = outcome.assigned.len(),
            skipped = outcome.skipped.len(),
            warnings = outcome.warnings.len(),
            "manual assignment finished"
        );
        Ok(outcome)
    }

    /// Load the target and selection into a workflow awaiting confirmation.
    ///
    /// Unknown job ids are carried on the workflow and reported as skipped
    /// at commit.
    pub async fn prepare_reassignment(
        &self,
        target_worker_id: &str,
        job_ids: &[JobId],
    ) -> Result<ReassignmentWorkflow, DispatchError> {
        let ids = dedup_ids(job_ids)?;
        let target = self.require_active_worker(target_worker_id).await?;
        let workload = WorkloadSnapshot::of(&target, self.config.capacity_ceiling);

        let jobs = self.store.jobs(&ids).await?;
        let found: HashSet<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        let missing: Vec<JobId> = ids
            .iter()
            .filter(|id| !found.contains(id.as_str()))
            .cloned()
            .collect();

        let mut workflow = ReassignmentWorkflow::new(target);
        for job in jobs {
            workflow.select(job)?;
        }
        for id in missing {
            workflow.note_missing(id)?;
        }
        workflow.request_confirmation(&workload, &self.policy())?;
        Ok(workflow)
    }

    /// Perform the writes for a workflow awaiting confirmation.
    ///
    /// A store failure part way through cancels the workflow, since some of
    /// its jobs may already have moved. Retry with a fresh [`reassign`];
    /// jobs already on the target are then reported as skipped.
    ///
    /// [`reassign`]: DispatchEngine::reassign
    pub async fn commit_reassignment(
        &self,
        caller: &Caller,
        workflow: &mut ReassignmentWorkflow,
        allow_override: bool,
    ) -> Result<ReassignOutcome, DispatchError> {
        let permitted = self.authorizer.can_override_reassignment(caller);
        let plan = workflow.commit_plan(allow_override, permitted).map_err(|e| {
            if matches!(e, DispatchError::PermissionDenied(_)) {
                tracing::warn!(caller = %caller.id, role = ?caller.role, "conflict override denied");
            }
            e
        })?;

        let target_id = workflow.target().id.clone();
        let mut outcome = ReassignOutcome {
            skipped_conflicts: plan.skipped_conflicts,
            skipped: plan.skipped,
            warnings: workflow
                .review()
                .map(|r| r.warnings.clone())
                .unwrap_or_default(),
            ..ReassignOutcome::default()
        };

        for job in &plan.moves {
            let action = if job.holder().is_some() {
                AuditAction::Reassign
            } else {
                AuditAction::Assign
            };
            let update = JobUpdate::assign(target_id.clone(), AssignmentSource::Manual);
            match self.commit(job, update, action, &caller.id).await {
                Ok(true) => outcome.reassigned.push(job.id.clone()),
                Ok(false) => outcome.skipped.push(job.id.clone()),
                Err(e) => {
                    tracing::error!(
                        target = %target_id,
                        job_id = %job.id,
                        moved = outcome.reassigned.len(),
                        error = %e,
                        "reassignment interrupted"
                    );
                    workflow.cancel()?;
                    return Err(e);
                }
            }
        }
        workflow.mark_committed()?;

        tracing::info!(
            target = %target_id,
            caller = %caller.id,
            allow_override,
            reassigned = outcome.reassigned.len(),
            skipped_conflicts = outcome.skipped_conflicts.len(),
            skipped = outcome.skipped.len(),
            "reassignment committed"
        );
        Ok(outcome)
    }

    /// Move the listed jobs onto `target_worker_id` in one confirmed step.
    pub async fn reassign(
        &self,
        caller: &Caller,
        target_worker_id: &str,
        job_ids: &[JobId],
        allow_override: bool,
    ) -> Result<ReassignOutcome, DispatchError> {
        let mut workflow = self.prepare_reassignment(target_worker_id, job_ids).await?;
        self.commit_reassignment(caller, &mut workflow, allow_override)
            .await
    }

    /// Cluster the selected jobs. `radius_miles` defaults to the configured
    /// cluster radius.
    pub async fn cluster(
        &self,
        selection: &JobSelection,
        radius_miles: Option<f64>,
    ) -> Result<ClusterReport, DispatchError> {
        let jobs = self.load_selection(selection).await?;
        geo::cluster(
            &jobs,
            radius_miles.unwrap_or(self.config.default_cluster_radius_miles),
        )
    }

    async fn resolve_anchor(
        &self,
        anchor: &AnchorSpec,
        candidates: &[Job],
    ) -> Result<GeoPoint, DispatchError> {
        match anchor {
            AnchorSpec::WorkerStart { worker_id } => {
                geo::worker_start_anchor(&self.require_worker(worker_id).await?)
            }
            AnchorSpec::Job { job_id } => geo::job_anchor(&self.require_job(job_id).await?),
            AnchorSpec::WorkerCentroid { worker_id } => {
                self.require_worker(worker_id).await?;
                let held = self.store.jobs_held_by(worker_id).await?;
                geo::centroid_anchor(&held, candidates)
            }
        }
    }

    /// Rank the candidate jobs by distance from an anchor.
    ///
    /// Every candidate must have coordinates; otherwise the call fails with
    /// `InvalidInput` naming the unlocated jobs so they can be geocoded first.
    /// When the anchor is a job it is left out of its own ranking.
    pub async fn nearby(
        &self,
        anchor: &AnchorSpec,
        job_ids: &[JobId],
        radius_miles: Option<f64>,
        top_n: Option<usize>,
    ) -> Result<Vec<NearbyJob>, DispatchError> {
        let ids = dedup_ids(job_ids)?;
        let mut candidates = self.store.jobs(&ids).await?;
        if let AnchorSpec::Job { job_id } = anchor {
            candidates.retain(|j| &j.id != job_id);
        }
        let unlocated: Vec<&str> = candidates
            .iter()
            .filter(|j| j.point().is_none())
            .map(|j| j.id.as_str())
            .collect();
        if !unlocated.is_empty() {
            return Err(DispatchError::InvalidInput(format!(
                "jobs without a resolved location: {}",
                unlocated.join(", ")
            )));
        }
        let point = self.resolve_anchor(anchor, &candidates).await?;

        let mut ranked = match radius_miles {
            Some(r) => geo::filter_within_radius(&candidates, point, r)?,
            None => geo::sort_by_distance(&candidates, point)?,
        };
        if let Some(n) = top_n {
            ranked.truncate(n);
        }
        Ok(ranked
            .into_iter()
            .map(|r| NearbyJob {
                job_id: r.job.id.clone(),
                distance_miles: r.distance_miles,
            })
            .collect())
    }

    /// Current load against the capacity ceiling.
    pub async fn workload(&self, worker_id: &str) -> Result<WorkloadSnapshot, DispatchError> {
        let worker = self.require_worker(worker_id).await?;
        Ok(WorkloadSnapshot::of(&worker, self.config.capacity_ceiling))
    }

    /// Mark an assigned job as in progress.
    pub async fn start_job(&self, job_id: &str) -> Result<(), DispatchError> {
        let job = self.require_job(job_id).await?;
        let AssignmentState::Assigned(worker_id) = &job.state else {
            return Err(DispatchError::InvalidInput(format!(
                "job {job_id} cannot start from {:?}",
                job.state
            )));
        };
        let update = JobUpdate::state(AssignmentState::InProgress(worker_id.clone()));
        if self.commit(&job, update, AuditAction::Start, worker_id).await? {
            Ok(())
        } else {
            Err(DispatchError::ConflictLost(job.id))
        }
    }

    /// Mark an assigned or in-progress job as completed, releasing the
    /// worker's capacity.
    pub async fn complete_job(&self, job_id: &str) -> Result<(), DispatchError> {
        let job = self.require_job(job_id).await?;
        let worker_id = match &job.state {
            AssignmentState::Assigned(w) | AssignmentState::InProgress(w) => w.clone(),
            other => {
                return Err(DispatchError::InvalidInput(format!(
                    "job {job_id} cannot complete from {other:?}"
                )))
            }
        };
        let update = JobUpdate::state(AssignmentState::Completed(worker_id.clone()));
        if self.commit(&job, update, AuditAction::Complete, &worker_id).await? {
            Ok(())
        } else {
            Err(DispatchError::ConflictLost(job.id))
        }
    }

    /// Geocode every unlocated job scheduled on `date`.
    ///
    /// Transient geocoder failures are reported per job; store failures
    /// abort the run.
    pub async fn backfill_locations(
        &self,
        geocoder: &dyn Geocoder,
        date: NaiveDate,
    ) -> Result<BackfillOutcome, DispatchError> {
        let jobs = self.store.jobs_on(date).await?;
        let mut outcome = BackfillOutcome::default();
        for job in jobs.iter().filter(|j| j.point().is_none()) {
            match geocoder.geocode(&job.location.geocode_query()).await {
                Ok(Some(point)) => {
                    self.store.set_point(&job.id, point).await?;
                    outcome.located.push(job.id.clone());
                }
                Ok(None) => outcome.not_found.push(job.id.clone()),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(job_id = %job.id, error = %e, "geocoding failed");
                    outcome.failed.push(job.id.clone());
                }
                Err(e) => return Err(e),
            }
        }
        tracing::info!(
            %date,
            located = outcome.located.len(),
            not_found = outcome.not_found.len(),
            failed = outcome.failed.len(),
            "location backfill finished"
        );
        Ok(outcome)
    }
}

/// Drop duplicates keeping first occurrence; an empty list is invalid.
fn dedup_ids(ids: &[JobId]) -> Result<Vec<JobId>, DispatchError> {
    if ids.is_empty() {
        return Err(DispatchError::InvalidInput("no job ids given".into()));
    }
    let mut seen = HashSet::new();
    Ok(ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect())
}
