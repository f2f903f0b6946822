//! Infrastructure adapters for storage and geocoding backends.

pub mod geocode;
pub mod store;

pub use geocode::{Geocoder, StaticGeocoder};
pub use store::{AssignmentStore, InMemoryStore, JobRecord, JobUpdate, WorkerRecord, WriteOutcome};
