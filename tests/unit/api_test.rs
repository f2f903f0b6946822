//! Tests for API request/response shapes and handlers

use std::sync::Arc;

use chrono::NaiveDate;
use fieldcrew_dispatch::config::DispatchConfig;
use fieldcrew_dispatch::core::{Caller, DispatchEngine, Job, JobLocation, Role, Worker};
use fieldcrew_dispatch::infra::InMemoryStore;
use fieldcrew_dispatch::runtime::api::{self, AutoAssignRequest, ClusterRequest, ManualAssignRequest};

fn engine() -> DispatchEngine<InMemoryStore> {
    let store = InMemoryStore::new();
    store.insert_worker(
        Worker::new("w1", "One")
            .with_coverage(["atlanta"])
            .with_active_jobs(39),
    );
    let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    store.insert_job(Job::new("j1", "c1", JobLocation::new("Atlanta", "30301"), date));
    store.insert_job(Job::new("j2", "c1", JobLocation::new("Atlanta", "30301"), date));
    DispatchEngine::new(Arc::new(store), DispatchConfig::default())
}

#[tokio::test]
async fn test_manual_assign_reports_warning_strings() {
    let engine = engine();
    let req: ManualAssignRequest =
        serde_json::from_str(r#"{"workerId":"w1","jobIds":["j1","j2"],"priority":"urgent"}"#)
            .unwrap();
    let resp = api::manual_assign(&engine, &Caller::new("m1", Role::Manager), req)
        .await
        .unwrap();
    assert_eq!(resp.assigned, ["j1", "j2"]);
    assert_eq!(resp.warnings.len(), 1);
    assert!(resp.warnings[0].starts_with("overload: new total 41 exceeds capacity 40"));

    let json = serde_json::to_value(&resp).unwrap();
    assert!(json.get("warnings").is_some());
}

#[tokio::test]
async fn test_auto_assign_response_is_camel_case() {
    let engine = engine();
    let req = AutoAssignRequest {
        date: NaiveDate::from_ymd_opt(2026, 3, 2),
    };
    let resp = api::auto_assign(&engine, req).await.unwrap();
    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["assigned"][0]["workerId"], "w1");
    assert_eq!(json["assigned"][0]["jobId"], "j1");
}

#[tokio::test]
async fn test_cluster_request_needs_one_selector() {
    let engine = engine();
    assert!(api::cluster(&engine, ClusterRequest::default()).await.is_err());

    let req = ClusterRequest {
        date: NaiveDate::from_ymd_opt(2026, 3, 2),
        ..ClusterRequest::default()
    };
    let resp = api::cluster(&engine, req).await.unwrap();
    assert!(resp.clusters.is_empty());
    assert_eq!(resp.unlocatable, ["j1", "j2"]);
}

#[tokio::test]
async fn test_health_reflects_store() {
    let engine = engine();
    assert!(api::health(&engine).await.ok);
    engine.store().set_available(false);
    let health = api::health(&engine).await;
    assert!(!health.ok);
    assert!(health.detail.unwrap().contains("unavailable"));
}
