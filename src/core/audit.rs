//! Audit trail for committed assignment changes.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::model::{JobId, WorkerId};
use crate::util::clock::now_ms;

/// What happened to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Claimed from unassigned (auto, activation or manual).
    Assign,
    /// Moved from one worker to another.
    Reassign,
    /// Work started.
    Start,
    /// Work finished.
    Complete,
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Affected job.
    pub job_id: JobId,
    /// Worker holding the job after the change.
    pub worker_id: WorkerId,
    /// Worker holding the job before the change, if any.
    pub previous_worker: Option<WorkerId>,
    /// Action taken.
    pub action: AuditAction,
    /// Who triggered it: a user id, or `system` for scheduled runs.
    pub actor: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub payload: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if self.max_events == 0 {
            return;
        }
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Build an audit event stamped with a fresh id and the current time.
pub fn build_audit_event(
    job_id: impl Into<JobId>,
    worker_id: impl Into<WorkerId>,
    previous_worker: Option<WorkerId>,
    action: AuditAction,
    actor: impl Into<String>,
    payload: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        job_id: job_id.into(),
        worker_id: worker_id.into(),
        previous_worker,
        action,
        actor: actor.into(),
        created_at_ms: now_ms(),
        payload,
    }
}
