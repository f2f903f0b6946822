//! Load-balanced distribution of unassigned jobs across eligible workers.
//!
//! The planner works on a snapshot and produces proposed (job, worker) pairs.
//! Committing them is the engine's job, one conditional write per pair.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::model::{AreaKey, Job, JobId, Worker, WorkerId};

/// One proposed or committed job-to-worker pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Assigned job.
    pub job_id: JobId,
    /// Receiving worker.
    pub worker_id: WorkerId,
}

impl Assignment {
    /// Pair a job with a worker.
    pub fn new(job_id: impl Into<JobId>, worker_id: impl Into<WorkerId>) -> Self {
        Self {
            job_id: job_id.into(),
            worker_id: worker_id.into(),
        }
    }
}

/// Output of a planning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalancePlan {
    /// Proposed pairings in planning order.
    pub assignments: Vec<Assignment>,
    /// Jobs whose area no active worker covers.
    pub unassignable: Vec<JobId>,
}

/// Distribute every unassigned job over the active workers covering it.
///
/// Jobs are grouped by exact (city, postal code), groups taken in order of
/// first appearance. For each group the covering workers are sorted by running
/// load, ties broken by worker id, and the group's jobs dealt round-robin over
/// that order. Each deal bumps the worker's running load, so later groups see
/// it. A group no worker covers is reported whole as unassignable.
pub fn plan_auto_assign(jobs: &[Job], workers: &[Worker]) -> BalancePlan {
    let mut order: Vec<AreaKey> = Vec::new();
    let mut groups: HashMap<AreaKey, Vec<&Job>> = HashMap::new();
    for job in jobs.iter().filter(|j| j.state.is_unassigned()) {
        let key = job.location.area_key();
        let group = groups.entry(key).or_insert_with_key(|k| {
            order.push(k.clone());
            Vec::new()
        });
        group.push(job);
    }

    let mut load: HashMap<&str, u32> = workers
        .iter()
        .filter(|w| w.active)
        .map(|w| (w.id.as_str(), w.active_job_count))
        .collect();

    let mut plan = BalancePlan::default();
    for key in &order {
        let Some(group) = groups.get(key) else { continue };
        let Some(first) = group.first() else { continue };

        let mut eligible: Vec<&Worker> = workers
            .iter()
            .filter(|w| w.active && w.covers(&first.location))
            .collect();
        if eligible.is_empty() {
            tracing::warn!(
                city = %key.city,
                postal_code = %key.postal_code,
                jobs = group.len(),
                "no eligible worker for area"
            );
            plan.unassignable.extend(group.iter().map(|j| j.id.clone()));
            continue;
        }

        eligible.sort_by(|a, b| {
            let la = load.get(a.id.as_str()).copied().unwrap_or(0);
            let lb = load.get(b.id.as_str()).copied().unwrap_or(0);
            la.cmp(&lb).then_with(|| a.id.cmp(&b.id))
        });

        for (i, job) in group.iter().enumerate() {
            let worker = eligible[i % eligible.len()];
            *load.entry(worker.id.as_str()).or_insert(0) += 1;
            tracing::debug!(job_id = %job.id, worker_id = %worker.id, "planned auto assignment");
            plan.assignments.push(Assignment::new(job.id.clone(), worker.id.clone()));
        }
    }
    plan
}

/// Every unassigned job covered by `worker`, for a worker coming online.
///
/// An inactive worker receives nothing.
pub fn plan_for_activation(worker: &Worker, jobs: &[Job]) -> Vec<Assignment> {
    if !worker.active {
        return Vec::new();
    }
    jobs.iter()
        .filter(|j| j.state.is_unassigned() && worker.covers(&j.location))
        .map(|j| Assignment::new(j.id.clone(), worker.id.clone()))
        .collect()
}
