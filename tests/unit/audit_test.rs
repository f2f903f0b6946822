//! Tests for audit sink

use fieldcrew_dispatch::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(
        "job1",
        "w1",
        None,
        AuditAction::Assign,
        "system",
        Some("auto".to_string()),
    );

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].job_id, "job1");
    assert_eq!(events[0].action, AuditAction::Assign);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("j1", "w1", None, AuditAction::Assign, "system", None));
    sink.record(build_audit_event("j2", "w1", None, AuditAction::Assign, "system", None));
    sink.record(build_audit_event("j3", "w1", None, AuditAction::Assign, "system", None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].job_id, "j2"); // First one popped
    assert_eq!(events[1].job_id, "j3");
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event(
        "job1",
        "w2",
        Some("w1".to_string()),
        AuditAction::Reassign,
        "manager-1",
        None,
    );

    assert_eq!(event.worker_id, "w2");
    assert_eq!(event.previous_worker.as_deref(), Some("w1"));
    assert_eq!(event.action, AuditAction::Reassign);
    assert_eq!(event.actor, "manager-1");
    assert_eq!(event.event_id.len(), 36);
    assert!(event.created_at_ms > 0);
}

#[test]
fn test_event_ids_are_unique() {
    let a = build_audit_event("j", "w", None, AuditAction::Start, "w", None);
    let b = build_audit_event("j", "w", None, AuditAction::Start, "w", None);
    assert_ne!(a.event_id, b.event_id);
}
