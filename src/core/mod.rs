//! Domain model, assignment planning, capacity accounting and the engine.

pub mod audit;
pub mod auth;
pub mod balancer;
pub mod capacity;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod model;
pub mod reassignment;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use auth::{Authorizer, Caller, Role, RoleAuthorizer};
pub use balancer::{plan_auto_assign, plan_for_activation, Assignment, BalancePlan};
pub use capacity::{CapacityPolicy, CapacityWarning, Severity, WorkloadSnapshot};
pub use engine::{
    AutoAssignOutcome, BackfillOutcome, DispatchEngine, JobSelection, ManualAssignOutcome,
    NearbyJob, ReassignOutcome, SYSTEM_ACTOR,
};
pub use error::{AppResult, DispatchError};
pub use model::{
    AreaKey, AssignmentSource, AssignmentState, GeoPoint, Job, JobId, JobLocation, JobPriority,
    Worker, WorkerId,
};
pub use reassignment::{CommitPlan, ReassignmentState, ReassignmentWorkflow, ReviewSummary};
