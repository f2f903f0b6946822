//! Confirmation workflow for moving jobs onto a target worker.
//!
//! ```text
//! Drafting ──request_confirmation──▶ PendingConfirmation ──mark_committed──▶ Committed
//!    ▲                                      │
//!    │ reopen                               │ cancel
//!    └────────────── Cancelled ◀────────────┘ (also from Drafting)
//! ```
//!
//! The workflow itself never writes. It holds the selection, the warnings
//! and conflicts shown to the operator, and decides which jobs a commit may
//! move. The engine performs the conditional writes and then marks the
//! workflow committed.

use serde::{Deserialize, Serialize};

use crate::core::capacity::{self, CapacityPolicy, CapacityWarning, WorkloadSnapshot};
use crate::core::model::{AssignmentState, Job, JobId, Worker};
use crate::core::DispatchError;

/// Workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReassignmentState {
    /// Selection is editable.
    Drafting,
    /// Warnings computed, awaiting the operator's decision.
    PendingConfirmation,
    /// Writes performed. Terminal.
    Committed,
    /// Abandoned without writes.
    Cancelled,
}

/// What the operator sees before confirming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    /// Capacity warnings for moving the whole selection.
    pub warnings: Vec<CapacityWarning>,
    /// Selected jobs already claimed by another worker.
    pub conflicts: Vec<JobId>,
}

impl ReviewSummary {
    /// Whether any selected job is held by someone else.
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// The jobs a commit will move, with the state each is expected to be in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitPlan {
    /// Jobs to write, snapshot taken at selection time.
    pub moves: Vec<Job>,
    /// Conflicting jobs left alone because no override was applied.
    pub skipped_conflicts: Vec<JobId>,
    /// Jobs needing no write: completed, already held by the target, or
    /// unknown to the store.
    pub skipped: Vec<JobId>,
}

enum Disposition {
    Free,
    Conflict,
    Skip,
}

/// A reassignment in progress for one target worker.
#[derive(Debug, Clone)]
pub struct ReassignmentWorkflow {
    target: Worker,
    state: ReassignmentState,
    selection: Vec<Job>,
    missing: Vec<JobId>,
    review: Option<ReviewSummary>,
}

impl ReassignmentWorkflow {
    /// Start drafting a move onto `target`.
    pub const fn new(target: Worker) -> Self {
        Self {
            target,
            state: ReassignmentState::Drafting,
            selection: Vec::new(),
            missing: Vec::new(),
            review: None,
        }
    }

    /// Current state.
    pub const fn state(&self) -> ReassignmentState {
        self.state
    }

    /// Receiving worker.
    pub const fn target(&self) -> &Worker {
        &self.target
    }

    /// Selected jobs in selection order.
    pub fn selection(&self) -> &[Job] {
        &self.selection
    }

    /// Requested ids the store did not know.
    pub fn missing(&self) -> &[JobId] {
        &self.missing
    }

    /// Review computed on entering confirmation.
    pub const fn review(&self) -> Option<&ReviewSummary> {
        self.review.as_ref()
    }

    fn require(&self, expected: ReassignmentState, action: &str) -> Result<(), DispatchError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(DispatchError::InvalidInput(format!(
                "cannot {action} while reassignment is {:?}",
                self.state
            )))
        }
    }

    fn disposition(&self, job: &Job) -> Disposition {
        match &job.state {
            AssignmentState::Unassigned => Disposition::Free,
            AssignmentState::Completed(_) => Disposition::Skip,
            AssignmentState::Assigned(w) | AssignmentState::InProgress(w) => {
                if *w == self.target.id {
                    Disposition::Skip
                } else {
                    Disposition::Conflict
                }
            }
        }
    }

    /// Add a job to the selection. Selecting the same job twice replaces the
    /// earlier snapshot in place.
    pub fn select(&mut self, job: Job) -> Result<(), DispatchError> {
        self.require(ReassignmentState::Drafting, "select")?;
        if let Some(slot) = self.selection.iter_mut().find(|j| j.id == job.id) {
            *slot = job;
        } else {
            self.selection.push(job);
        }
        Ok(())
    }

    /// Record a requested id that matched no job. Reported as skipped at
    /// commit.
    pub fn note_missing(&mut self, job_id: JobId) -> Result<(), DispatchError> {
        self.require(ReassignmentState::Drafting, "note a missing job")?;
        if !self.missing.contains(&job_id) {
            self.missing.push(job_id);
        }
        Ok(())
    }

    /// Remove a job from the selection. Returns whether it was selected.
    pub fn deselect(&mut self, job_id: &str) -> Result<bool, DispatchError> {
        self.require(ReassignmentState::Drafting, "deselect")?;
        let before = self.selection.len();
        self.selection.retain(|j| j.id != job_id);
        Ok(self.selection.len() != before)
    }

    /// Compute warnings and conflicts and move to `PendingConfirmation`.
    pub fn request_confirmation(
        &mut self,
        workload: &WorkloadSnapshot,
        policy: &CapacityPolicy,
    ) -> Result<&ReviewSummary, DispatchError> {
        self.require(ReassignmentState::Drafting, "request confirmation")?;
        if self.selection.is_empty() {
            return Err(DispatchError::InvalidInput(
                "reassignment needs at least one selected job".into(),
            ));
        }

        let incoming: Vec<Job> = self
            .selection
            .iter()
            .filter(|j| !matches!(self.disposition(j), Disposition::Skip))
            .cloned()
            .collect();
        let conflicts = self
            .selection
            .iter()
            .filter(|j| matches!(self.disposition(j), Disposition::Conflict))
            .map(|j| j.id.clone())
            .collect();
        let review = ReviewSummary {
            warnings: capacity::validate(&self.target, &incoming, workload, policy),
            conflicts,
        };

        self.state = ReassignmentState::PendingConfirmation;
        Ok(self.review.insert(review))
    }

    /// Decide which jobs a commit moves.
    ///
    /// Conflicting jobs move only when `allow_override` is set, and asking
    /// for an override over conflicts without `permitted` fails outright.
    pub fn commit_plan(
        &self,
        allow_override: bool,
        permitted: bool,
    ) -> Result<CommitPlan, DispatchError> {
        self.require(ReassignmentState::PendingConfirmation, "commit")?;
        let has_conflicts = self.review.as_ref().is_some_and(ReviewSummary::has_conflicts);
        if allow_override && has_conflicts && !permitted {
            return Err(DispatchError::PermissionDenied(format!(
                "overriding existing assignments onto worker {} requires an elevated role",
                self.target.id
            )));
        }

        let mut plan = CommitPlan::default();
        for job in &self.selection {
            match self.disposition(job) {
                Disposition::Free => plan.moves.push(job.clone()),
                Disposition::Conflict if allow_override => plan.moves.push(job.clone()),
                Disposition::Conflict => plan.skipped_conflicts.push(job.id.clone()),
                Disposition::Skip => plan.skipped.push(job.id.clone()),
            }
        }
        plan.skipped.extend(self.missing.iter().cloned());
        Ok(plan)
    }

    /// Record that the commit's writes have been performed.
    pub fn mark_committed(&mut self) -> Result<(), DispatchError> {
        self.require(ReassignmentState::PendingConfirmation, "mark committed")?;
        self.state = ReassignmentState::Committed;
        Ok(())
    }

    /// Abandon the workflow. Nothing is written.
    pub fn cancel(&mut self) -> Result<(), DispatchError> {
        match self.state {
            ReassignmentState::Drafting | ReassignmentState::PendingConfirmation => {
                self.state = ReassignmentState::Cancelled;
                Ok(())
            }
            _ => self.require(ReassignmentState::Drafting, "cancel"),
        }
    }

    /// Return a cancelled workflow to drafting, keeping its selection.
    pub fn reopen(&mut self) -> Result<(), DispatchError> {
        self.require(ReassignmentState::Cancelled, "reopen")?;
        self.review = None;
        self.state = ReassignmentState::Drafting;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::JobLocation;
    use chrono::NaiveDate;

    fn job(id: &str, state: AssignmentState) -> Job {
        Job::new(
            id,
            "cust",
            JobLocation::new("Atlanta", "30301"),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        )
        .with_state(state)
    }

    fn target() -> Worker {
        Worker::new("target", "Target").with_coverage(["atlanta"])
    }

    fn pending(jobs: Vec<Job>) -> ReassignmentWorkflow {
        let mut wf = ReassignmentWorkflow::new(target());
        for j in jobs {
            wf.select(j).unwrap();
        }
        let snap = WorkloadSnapshot::of(wf.target(), 40);
        wf.request_confirmation(&snap, &CapacityPolicy::default()).unwrap();
        wf
    }

    #[test]
    fn empty_selection_cannot_be_confirmed() {
        let mut wf = ReassignmentWorkflow::new(target());
        let snap = WorkloadSnapshot::of(wf.target(), 40);
        assert!(wf.request_confirmation(&snap, &CapacityPolicy::default()).is_err());
        assert_eq!(wf.state(), ReassignmentState::Drafting);
    }

    #[test]
    fn conflicts_are_excluded_without_override() {
        let wf = pending(vec![
            job("j1", AssignmentState::Assigned("other".into())),
            job("j2", AssignmentState::InProgress("other".into())),
        ]);
        assert!(wf.review().unwrap().has_conflicts());
        let plan = wf.commit_plan(false, false).unwrap();
        assert!(plan.moves.is_empty());
        assert_eq!(plan.skipped_conflicts, ["j1", "j2"]);
    }

    #[test]
    fn override_requires_permission() {
        let wf = pending(vec![job("j1", AssignmentState::Assigned("other".into()))]);
        assert!(matches!(
            wf.commit_plan(true, false),
            Err(DispatchError::PermissionDenied(_))
        ));
        let plan = wf.commit_plan(true, true).unwrap();
        assert_eq!(plan.moves.len(), 1);
    }

    #[test]
    fn already_held_and_completed_are_skipped() {
        let wf = pending(vec![
            job("mine", AssignmentState::Assigned("target".into())),
            job("done", AssignmentState::Completed("other".into())),
            job("free", AssignmentState::Unassigned),
        ]);
        assert!(!wf.review().unwrap().has_conflicts());
        let plan = wf.commit_plan(false, false).unwrap();
        assert_eq!(plan.skipped, ["mine", "done"]);
        assert_eq!(plan.moves[0].id, "free");
    }

    #[test]
    fn missing_ids_are_skipped_at_commit() {
        let mut wf = ReassignmentWorkflow::new(target());
        wf.select(job("j1", AssignmentState::Unassigned)).unwrap();
        wf.note_missing("ghost".into()).unwrap();
        wf.note_missing("ghost".into()).unwrap();
        let snap = WorkloadSnapshot::of(wf.target(), 40);
        wf.request_confirmation(&snap, &CapacityPolicy::default()).unwrap();
        assert!(wf.note_missing("late".into()).is_err());

        let plan = wf.commit_plan(false, false).unwrap();
        assert_eq!(plan.moves.len(), 1);
        assert_eq!(plan.skipped, ["ghost"]);
    }

    #[test]
    fn cancel_then_reopen_returns_to_drafting() {
        let mut wf = pending(vec![job("j1", AssignmentState::Unassigned)]);
        assert!(wf.select(job("j2", AssignmentState::Unassigned)).is_err());
        wf.cancel().unwrap();
        assert!(wf.commit_plan(false, false).is_err());
        wf.reopen().unwrap();
        assert_eq!(wf.state(), ReassignmentState::Drafting);
        assert!(wf.review().is_none());
        assert!(wf.deselect("j1").unwrap());
    }

    #[test]
    fn committed_is_terminal() {
        let mut wf = pending(vec![job("j1", AssignmentState::Unassigned)]);
        wf.mark_committed().unwrap();
        assert!(wf.cancel().is_err());
        assert!(wf.reopen().is_err());
    }

    #[test]
    fn review_includes_overload_warning() {
        let mut wf = ReassignmentWorkflow::new(target().with_active_jobs(39));
        wf.select(job("j1", AssignmentState::Unassigned)).unwrap();
        wf.select(job("j2", AssignmentState::Assigned("other".into()))).unwrap();
        let snap = WorkloadSnapshot::of(wf.target(), 40);
        let review = wf
            .request_confirmation(&snap, &CapacityPolicy::default())
            .unwrap();
        assert!(matches!(
            review.warnings.as_slice(),
            [CapacityWarning::Overload { new_total: 41, .. }]
        ));
    }
}
