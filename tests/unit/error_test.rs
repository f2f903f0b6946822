//! Tests for error types

use fieldcrew_dispatch::core::DispatchError;

#[test]
fn test_invalid_input_error() {
    let err = DispatchError::InvalidInput("no job ids given".to_string());
    assert_eq!(format!("{}", err), "invalid input: no job ids given");
}

#[test]
fn test_permission_denied_error() {
    let err = DispatchError::PermissionDenied("override".to_string());
    assert_eq!(format!("{}", err), "permission denied: override");
    assert!(!err.is_retryable());
}

#[test]
fn test_store_unavailable_is_retryable() {
    let err = DispatchError::StoreUnavailable("timeout".to_string());
    assert_eq!(format!("{}", err), "store unavailable: timeout");
    assert!(err.is_retryable());
}

#[test]
fn test_not_found_errors() {
    assert_eq!(
        DispatchError::WorkerNotFound("w1".into()).to_string(),
        "worker not found: w1"
    );
    assert_eq!(
        DispatchError::JobNotFound("j1".into()).to_string(),
        "job not found: j1"
    );
}

#[test]
fn test_conflict_lost_error() {
    let err = DispatchError::ConflictLost("j7".into());
    assert_eq!(err.to_string(), "conditional write lost for job j7");
    assert!(!err.is_retryable());
}

#[test]
fn test_error_into_anyhow() {
    let err: anyhow::Error = DispatchError::EmptyInput("centroid of zero points").into();
    assert!(err.to_string().contains("centroid of zero points"));
}
