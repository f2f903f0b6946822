//! Address geocoding collaborator.
//!
//! Geocoding is slow and rate-limited, so it only runs from the out-of-band
//! backfill, never inside an assignment operation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::coverage::normalize_token;
use crate::core::model::GeoPoint;
use crate::core::DispatchError;

/// Resolves a free-form address line to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the address is unknown; `Err` for transient failures.
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, DispatchError>;
}

/// Lookup-table geocoder for development and tests.
///
/// Queries are matched after trimming and case folding.
#[derive(Default)]
pub struct StaticGeocoder {
    entries: RwLock<HashMap<String, GeoPoint>>,
    failing: AtomicBool,
}

impl StaticGeocoder {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an address.
    #[must_use]
    pub fn with_entry(self, query: &str, point: GeoPoint) -> Self {
        self.insert(query, point);
        self
    }

    /// Add or replace an address in place.
    pub fn insert(&self, query: &str, point: GeoPoint) {
        self.entries.write().insert(normalize_token(query), point);
    }

    /// Make every lookup fail with `StoreUnavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, DispatchError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(DispatchError::StoreUnavailable(
                "geocoder unavailable".into(),
            ));
        }
        Ok(self.entries.read().get(&normalize_token(query)).copied())
    }
}
