//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use fieldcrew_dispatch::config::DispatchConfig;
use fieldcrew_dispatch::core::{
    AssignmentState, Caller, DispatchEngine, GeoPoint, Job, JobLocation, Role, Worker,
};
use fieldcrew_dispatch::infra::InMemoryStore;

pub fn service_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

pub fn job(id: &str, city: &str, postal: &str) -> Job {
    Job::new(id, "cust-1", JobLocation::new(city, postal), service_date())
}

pub fn located(id: &str, lat: f64, lon: f64) -> Job {
    job(id, "Atlanta", "30301").with_point(GeoPoint::new(lat, lon).unwrap())
}

pub fn held_by(mut job: Job, worker_id: &str) -> Job {
    job.state = AssignmentState::Assigned(worker_id.to_string());
    job
}

pub fn atlanta_worker(id: &str) -> Worker {
    Worker::new(id, id.to_uppercase()).with_coverage(["Atlanta", "30301"])
}

pub fn store_with(workers: Vec<Worker>, jobs: Vec<Job>) -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    for w in workers {
        store.insert_worker(w);
    }
    for j in jobs {
        store.insert_job(j);
    }
    Arc::new(store)
}

pub fn engine(store: &Arc<InMemoryStore>) -> DispatchEngine<InMemoryStore> {
    DispatchEngine::new(Arc::clone(store), DispatchConfig::default())
}

pub fn admin() -> Caller {
    Caller::new("admin-1", Role::Admin)
}

pub fn tech() -> Caller {
    Caller::new("tech-1", Role::FieldTech)
}

pub fn active_count(store: &InMemoryStore, worker_id: &str) -> u32 {
    store.worker_snapshot(worker_id).unwrap().active_job_count
}
