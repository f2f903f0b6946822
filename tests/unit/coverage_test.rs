//! Tests for service-area matching

use fieldcrew_dispatch::core::coverage::matches;
use fieldcrew_dispatch::core::{JobLocation, Worker};

#[test]
fn test_city_token_matches() {
    assert!(matches("Atlanta", "30301", &["atlanta"]));
}

#[test]
fn test_partial_city_does_not_match() {
    assert!(!matches("Atl", "30399", &["atlanta"]));
}

#[test]
fn test_postal_token_matches() {
    assert!(matches("Smyrna", "30080", &["Marietta", "30080"]));
}

#[test]
fn test_empty_coverage_matches_nothing() {
    let none: [&str; 0] = [];
    assert!(!matches("Atlanta", "30301", &none));
}

#[test]
fn test_county_does_not_imply_city() {
    assert!(!matches("Decatur", "30030", &["DeKalb County"]));
}

#[test]
fn test_worker_covers_location() {
    let worker = Worker::new("w1", "One").with_coverage(["Atlanta"]);
    assert!(worker.covers(&JobLocation::new("ATLANTA", "30301")));
    assert!(!worker.covers(&JobLocation::new("Macon", "31201")));
}
