//! Tests for storage boundary records

use fieldcrew_dispatch::core::{AssignmentSource, AssignmentState, Job, Worker};
use fieldcrew_dispatch::infra::{InMemoryStore, JobRecord, WorkerRecord};

fn worker_doc() -> WorkerRecord {
    serde_json::from_str(
        r#"{"id":"w1","name":"Sam","serviceAreas":["Atlanta"],"payRate":21.5,"activeJobs":1,"startLat":33.75,"startLng":-84.39}"#,
    )
    .unwrap()
}

fn job_doc() -> JobRecord {
    serde_json::from_str(
        r#"{"id":"j1","customerId":"c1","address":"12 Peachtree St","city":"Atlanta","zipCode":"30301","scheduledDate":"2026-03-02","status":"assigned","assignedTo":"w1","assignmentSource":"auto"}"#,
    )
    .unwrap()
}

#[test]
fn test_worker_record_conversion() {
    let worker = Worker::try_from(worker_doc()).unwrap();
    assert_eq!(worker.name, "Sam");
    assert!((worker.pay_rate - 21.5).abs() < f64::EPSILON);
    assert!(worker.start_location.is_some());
}

#[test]
fn test_job_record_conversion() {
    let job = Job::try_from(job_doc()).unwrap();
    assert_eq!(job.state, AssignmentState::Assigned("w1".into()));
    assert_eq!(job.source, Some(AssignmentSource::Auto));
    assert_eq!(job.location.street.as_deref(), Some("12 Peachtree St"));
}

#[test]
fn test_bad_date_rejected() {
    let mut doc = job_doc();
    doc.scheduled_date = Some("03/02/2026".into());
    assert!(Job::try_from(doc).is_err());
}

#[test]
fn test_unknown_status_rejected() {
    let mut doc = job_doc();
    doc.status = Some("parked".into());
    assert!(Job::try_from(doc).is_err());
}

#[test]
fn test_out_of_range_coordinates_rejected() {
    let mut doc = worker_doc();
    doc.start_lat = Some(123.0);
    assert!(Worker::try_from(doc).is_err());
}

#[test]
fn test_store_from_records() {
    let store = InMemoryStore::from_records(vec![worker_doc()], vec![job_doc()]).unwrap();
    assert_eq!(store.worker_snapshot("w1").unwrap().active_job_count, 1);
    assert!(store.job_snapshot("j1").is_some());

    let bad = JobRecord {
        id: Some("j2".into()),
        ..JobRecord::default()
    };
    assert!(InMemoryStore::from_records(vec![], vec![bad]).is_err());
}
