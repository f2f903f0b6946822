//! API-facing request/response models and handlers.
//!
//! Shapes are camelCase on the wire. Handlers delegate to the engine and
//! convert outcomes into responses; transport is left to the embedding
//! service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{
    Assignment, Caller, DispatchEngine, DispatchError, JobId, JobPriority, JobSelection,
    NearbyJob, WorkerId, WorkloadSnapshot,
};
use crate::core::model::GeoPoint;
use crate::geo::AnchorSpec;
use crate::infra::store::AssignmentStore;
use crate::util::clock::today;

/// Bulk auto-assign payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAssignRequest {
    /// Service date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Bulk auto-assign result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAssignResponse {
    /// Committed pairings.
    pub assigned: Vec<Assignment>,
    /// Jobs claimed by another writer first.
    pub skipped: Vec<JobId>,
    /// Jobs no active worker covers.
    pub unassignable: Vec<JobId>,
}

/// Worker activation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignOnActivationRequest {
    /// Worker that just came online.
    pub worker_id: WorkerId,
    /// Service date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Manual assignment payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAssignRequest {
    /// Receiving worker.
    pub worker_id: WorkerId,
    /// Jobs to claim.
    pub job_ids: Vec<JobId>,
    /// Priority to stamp on the claimed jobs.
    #[serde(default)]
    pub priority: Option<JobPriority>,
}

/// Manual assignment result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAssignResponse {
    /// Claimed jobs.
    pub assigned: Vec<JobId>,
    /// Jobs not claimed.
    pub skipped: Vec<JobId>,
    /// Human-readable capacity warnings.
    pub warnings: Vec<String>,
}

/// Reassignment payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignRequest {
    /// Receiving worker.
    pub target_worker_id: WorkerId,
    /// Jobs to move.
    pub job_ids: Vec<JobId>,
    /// Also move jobs claimed by other workers. Needs an elevated role.
    #[serde(default)]
    pub allow_conflict_override: bool,
}

/// Reassignment result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignResponse {
    /// Jobs moved.
    pub reassigned: Vec<JobId>,
    /// Jobs held elsewhere and left alone.
    pub skipped_conflicts: Vec<JobId>,
    /// Jobs needing no move or changed since selection.
    pub skipped: Vec<JobId>,
    /// Human-readable capacity warnings.
    pub warnings: Vec<String>,
}

/// Clustering payload. Exactly one of `job_ids` and `date` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRequest {
    /// Explicit selection.
    #[serde(default)]
    pub job_ids: Option<Vec<JobId>>,
    /// Every job on a date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Cluster radius; defaults to the configured radius.
    #[serde(default)]
    pub radius_miles: Option<f64>,
}

/// One cluster on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterView {
    /// Members, seed first.
    pub job_ids: Vec<JobId>,
    /// Mean member position.
    pub centroid: GeoPoint,
    /// Greedy tour length.
    pub estimated_route_miles: f64,
}

/// Clustering result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResponse {
    /// Clusters in seed order.
    pub clusters: Vec<ClusterView>,
    /// Jobs without coordinates.
    pub unlocatable: Vec<JobId>,
}

/// Proximity ranking payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRequest {
    /// Reference point policy.
    pub anchor: AnchorSpec,
    /// Candidates.
    pub job_ids: Vec<JobId>,
    /// Keep only jobs within this distance.
    #[serde(default)]
    pub radius_miles: Option<f64>,
    /// Keep only this many nearest.
    #[serde(default)]
    pub top_n: Option<usize>,
}

/// Worker lookup payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadRequest {
    /// Worker to inspect.
    pub worker_id: WorkerId,
}

/// Job transition payload for start and complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTransitionRequest {
    /// Job to transition.
    pub job_id: JobId,
}

/// Error body returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Whether resubmitting the same request may succeed.
    pub retryable: bool,
}

impl From<&DispatchError> for ErrorBody {
    fn from(err: &DispatchError) -> Self {
        let code = match err {
            DispatchError::InvalidInput(_) | DispatchError::EmptyInput(_) => "invalid_input",
            DispatchError::NotEligible(_) => "not_eligible",
            DispatchError::ConflictLost(_) => "conflict_lost",
            DispatchError::PermissionDenied(_) => "permission_denied",
            DispatchError::WorkerNotFound(_) | DispatchError::JobNotFound(_) => "not_found",
            DispatchError::StoreUnavailable(_) => "store_unavailable",
        };
        Self {
            code: code.to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Failure description when not ok.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Run auto-assign for a date.
pub async fn auto_assign<S: AssignmentStore>(
    engine: &DispatchEngine<S>,
    req: AutoAssignRequest,
) -> Result<AutoAssignResponse, DispatchError> {
    let outcome = engine.auto_assign(req.date.unwrap_or_else(today)).await?;
    Ok(AutoAssignResponse {
        assigned: outcome.assigned,
        skipped: outcome.skipped,
        unassignable: outcome.unassignable,
    })
}

/// Assign a newly active worker's covered jobs.
pub async fn assign_on_activation<S: AssignmentStore>(
    engine: &DispatchEngine<S>,
    req: AssignOnActivationRequest,
) -> Result<AutoAssignResponse, DispatchError> {
    let outcome = engine
        .assign_on_activation(&req.worker_id, req.date.unwrap_or_else(today))
        .await?;
    Ok(AutoAssignResponse {
        assigned: outcome.assigned,
        skipped: outcome.skipped,
        unassignable: outcome.unassignable,
    })
}

/// Manually assign jobs to a worker.
pub async fn manual_assign<S: AssignmentStore>(
    engine: &DispatchEngine<S>,
    caller: &Caller,
    req: ManualAssignRequest,
) -> Result<ManualAssignResponse, DispatchError> {
    let outcome = engine
        .manual_assign(caller, &req.worker_id, &req.job_ids, req.priority)
        .await?;
    Ok(ManualAssignResponse {
        assigned: outcome.assigned,
        skipped: outcome.skipped,
        warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
    })
}

/// Move jobs onto a target worker.
pub async fn reassign<S: AssignmentStore>(
    engine: &DispatchEngine<S>,
    caller: &Caller,
    req: ReassignRequest,
) -> Result<ReassignResponse, DispatchError> {
    let outcome = engine
        .reassign(
            caller,
            &req.target_worker_id,
            &req.job_ids,
            req.allow_conflict_override,
        )
        .await?;
    Ok(ReassignResponse {
        reassigned: outcome.reassigned,
        skipped_conflicts: outcome.skipped_conflicts,
        skipped: outcome.skipped,
        warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
    })
}

/// Cluster a selection of jobs.
pub async fn cluster<S: AssignmentStore>(
    engine: &DispatchEngine<S>,
    req: ClusterRequest,
) -> Result<ClusterResponse, DispatchError> {
    let selection = match (req.job_ids, req.date) {
        (Some(ids), None) => JobSelection::Ids(ids),
        (None, Some(date)) => JobSelection::Date(date),
        _ => {
            return Err(DispatchError::InvalidInput(
                "cluster request needs exactly one of jobIds or date".into(),
            ))
        }
    };
    let report = engine.cluster(&selection, req.radius_miles).await?;
    Ok(ClusterResponse {
        clusters: report
            .clusters
            .into_iter()
            .map(|c| ClusterView {
                job_ids: c.job_ids,
                centroid: c.centroid,
                estimated_route_miles: c.estimated_route_miles,
            })
            .collect(),
        unlocatable: report.unlocatable,
    })
}

/// Rank jobs by distance from an anchor.
pub async fn nearby<S: AssignmentStore>(
    engine: &DispatchEngine<S>,
    req: NearbyRequest,
) -> Result<Vec<NearbyJob>, DispatchError> {
    engine
        .nearby(&req.anchor, &req.job_ids, req.radius_miles, req.top_n)
        .await
}

/// A worker's load against capacity.
pub async fn workload<S: AssignmentStore>(
    engine: &DispatchEngine<S>,
    req: WorkloadRequest,
) -> Result<WorkloadSnapshot, DispatchError> {
    engine.workload(&req.worker_id).await
}

/// Start an assigned job.
pub async fn start_job<S: AssignmentStore>(
    engine: &DispatchEngine<S>,
    req: JobTransitionRequest,
) -> Result<(), DispatchError> {
    engine.start_job(&req.job_id).await
}

/// Complete a job.
pub async fn complete_job<S: AssignmentStore>(
    engine: &DispatchEngine<S>,
    req: JobTransitionRequest,
) -> Result<(), DispatchError> {
    engine.complete_job(&req.job_id).await
}

/// Return a health payload. Probes the store with a worker listing.
pub async fn health<S: AssignmentStore>(engine: &DispatchEngine<S>) -> Health {
    match engine.store().workers().await {
        Ok(_) => Health {
            ok: true,
            detail: None,
        },
        Err(e) => Health {
            ok: false,
            detail: Some(e.to_string()),
        },
    }
}
