//! Concurrent writers against one shared store.

mod common;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::*;
use fieldcrew_dispatch::core::{
    AssignmentSource, AssignmentState, DispatchEngine, DispatchError, GeoPoint, Job, JobId,
    Worker,
};
use fieldcrew_dispatch::config::DispatchConfig;
use fieldcrew_dispatch::infra::{AssignmentStore, InMemoryStore, JobUpdate, WriteOutcome};
use parking_lot::Mutex;

fn busy_day() -> Arc<InMemoryStore> {
    let cities = [("Atlanta", "30301"), ("Decatur", "30030"), ("Marietta", "30060")];
    let jobs = (0..240)
        .map(|i| {
            let (city, postal) = cities[i % cities.len()];
            job(&format!("job-{i:03}"), city, postal)
        })
        .collect();
    let workers = vec![
        Worker::new("w1", "One").with_coverage(["atlanta", "decatur"]),
        Worker::new("w2", "Two").with_coverage(["30060", "atlanta"]),
        Worker::new("w3", "Three").with_coverage(["marietta"]),
        Worker::new("late", "Late").with_coverage(["Atlanta", "Decatur", "Marietta"]),
    ];
    store_with(workers, jobs)
}

fn assert_counts_match_holders(store: &InMemoryStore, workers: &[&str], jobs: usize) {
    let mut held: HashMap<String, u32> = HashMap::new();
    for i in 0..jobs {
        let job = store.job_snapshot(&format!("job-{i:03}")).unwrap();
        if let Some(w) = job.holder() {
            *held.entry(w.to_string()).or_default() += 1;
        }
    }
    for w in workers {
        assert_eq!(
            active_count(store, w),
            held.get(*w).copied().unwrap_or(0),
            "count drift for {w}"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn auto_assign_and_activation_never_double_claim() {
    for _ in 0..20 {
        let store = busy_day();
        let bulk = engine(&store);
        let activation = DispatchEngine::new(Arc::clone(&store), DispatchConfig::default());

        let a = tokio::spawn(async move { bulk.auto_assign(service_date()).await });
        let b = tokio::spawn(async move {
            activation
                .assign_on_activation("late", service_date())
                .await
        });
        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());

        let mut claimed: HashSet<JobId> = HashSet::new();
        for assignment in a.assigned.iter().chain(b.assigned.iter()) {
            assert!(
                claimed.insert(assignment.job_id.clone()),
                "{} claimed twice",
                assignment.job_id
            );
            let job = store.job_snapshot(&assignment.job_id).unwrap();
            assert_eq!(job.holder(), Some(assignment.worker_id.as_str()));
        }
        assert_eq!(claimed.len(), 240);
        for skipped in a.skipped.iter().chain(b.skipped.iter()) {
            assert!(claimed.contains(skipped));
        }
        assert_counts_match_holders(&store, &["w1", "w2", "w3", "late"], 240);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_auto_assign_runs_partition_the_day() {
    let store = busy_day();
    let runs: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine(&store);
            tokio::spawn(async move { engine.auto_assign(service_date()).await })
        })
        .collect();

    let mut total = 0;
    for run in futures::future::join_all(runs).await {
        total += run.unwrap().unwrap().assigned.len();
    }
    assert_eq!(total, 240);
    assert_counts_match_holders(&store, &["w1", "w2", "w3", "late"], 240);
}

/// Lets a rival writer claim one job between the engine's read and write.
struct RacingStore {
    inner: InMemoryStore,
    steal: Mutex<Option<(JobId, String)>>,
}

#[async_trait]
impl AssignmentStore for RacingStore {
    async fn worker(&self, worker_id: &str) -> Result<Option<Worker>, DispatchError> {
        self.inner.worker(worker_id).await
    }

    async fn workers(&self) -> Result<Vec<Worker>, DispatchError> {
        self.inner.workers().await
    }

    async fn jobs(&self, job_ids: &[JobId]) -> Result<Vec<Job>, DispatchError> {
        self.inner.jobs(job_ids).await
    }

    async fn jobs_on(&self, date: NaiveDate) -> Result<Vec<Job>, DispatchError> {
        self.inner.jobs_on(date).await
    }

    async fn jobs_held_by(&self, worker_id: &str) -> Result<Vec<Job>, DispatchError> {
        self.inner.jobs_held_by(worker_id).await
    }

    async fn compare_and_set(
        &self,
        job_id: &str,
        expected: &AssignmentState,
        update: JobUpdate,
    ) -> Result<WriteOutcome, DispatchError> {
        let rival = {
            let mut steal = self.steal.lock();
            if steal.as_ref().is_some_and(|(target, _)| target == job_id) {
                steal.take()
            } else {
                None
            }
        };
        if let Some((target, thief)) = rival {
            self.inner
                .compare_and_set(
                    &target,
                    &AssignmentState::Unassigned,
                    JobUpdate::assign(thief, AssignmentSource::Manual),
                )
                .await?;
        }
        self.inner.compare_and_set(job_id, expected, update).await
    }

    async fn set_point(&self, job_id: &str, point: GeoPoint) -> Result<(), DispatchError> {
        self.inner.set_point(job_id, point).await
    }
}

#[tokio::test]
async fn lost_race_is_a_per_job_skip() {
    let inner = InMemoryStore::new();
    inner.insert_worker(atlanta_worker("w1"));
    inner.insert_worker(Worker::new("rival", "Rival"));
    for id in ["j1", "j2", "j3"] {
        inner.insert_job(job(id, "Atlanta", "30301"));
    }
    let store = Arc::new(RacingStore {
        inner,
        steal: Mutex::new(Some(("j2".into(), "rival".into()))),
    });
    let engine = DispatchEngine::new(Arc::clone(&store), DispatchConfig::default());

    let outcome = engine.auto_assign(service_date()).await.unwrap();
    let assigned: Vec<_> = outcome.assigned.iter().map(|a| a.job_id.as_str()).collect();
    assert_eq!(assigned, ["j1", "j3"]);
    assert_eq!(outcome.skipped, ["j2"]);
    assert_eq!(
        store.inner.job_snapshot("j2").unwrap().state,
        AssignmentState::Assigned("rival".into())
    );
    assert_eq!(store.inner.worker_snapshot("w1").unwrap().active_job_count, 2);
    assert_eq!(store.inner.worker_snapshot("rival").unwrap().active_job_count, 1);
}
