//! Tests for configuration validation

use fieldcrew_dispatch::config::DispatchConfig;

#[test]
fn test_default_config_validation() {
    let cfg = DispatchConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.capacity_ceiling, 40);
    assert_eq!(cfg.max_distinct_areas, 5);
    assert_eq!(cfg.max_batch_jobs, 30);
    assert!(cfg.zone_filtering);
}

#[test]
fn test_config_invalid_utilization() {
    let invalid = DispatchConfig {
        high_utilization_pct: 120.0,
        ..DispatchConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_radius() {
    let invalid = DispatchConfig {
        default_cluster_radius_miles: f64::NAN,
        ..DispatchConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_from_json_partial() {
    let cfg = DispatchConfig::from_json_str(r#"{"capacity_ceiling": 25, "zone_filtering": false}"#)
        .unwrap();
    assert_eq!(cfg.capacity_ceiling, 25);
    assert!(!cfg.zone_filtering);
    assert_eq!(cfg.max_batch_jobs, 30);
}

#[test]
fn test_config_from_json_rejects_invalid() {
    let err = DispatchConfig::from_json_str(r#"{"auto_assign_interval_secs": 0}"#).unwrap_err();
    assert!(err.contains("auto_assign_interval_secs"));
    assert!(DispatchConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_from_lookup() {
    let cfg = DispatchConfig::from_lookup(|key| match key {
        "DISPATCH_MAX_DISTINCT_AREAS" => Some("8".into()),
        "DISPATCH_DEFAULT_CLUSTER_RADIUS_MILES" => Some(" 2.5 ".into()),
        _ => None,
    })
    .unwrap();
    assert_eq!(cfg.max_distinct_areas, 8);
    assert!((cfg.default_cluster_radius_miles - 2.5).abs() < f64::EPSILON);
}
