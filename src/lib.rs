//! # Fieldcrew Dispatch
//!
//! Workforce assignment and geographic proximity engine for field-service
//! operations.
//!
//! The crate decides which field worker services which job, keeps workload
//! balanced across workers, groups jobs by proximity, and moves claimed work
//! between workers without breaking capacity or coverage rules.
//!
//! ## Core Problem Solved
//!
//! Several writers touch the same day's jobs at once: the scheduled
//! auto-assign run, a worker coming online, and operators assigning or
//! reassigning by hand. Every assignment-producing operation here is a
//! per-job conditional write against the job's current state, so a job is
//! never held by two workers and a lost race only skips that one job.
//!
//! ## Key Features
//!
//! - **Service-area matching**: exact, case-insensitive city or postal code
//!   matching against a worker's coverage tokens
//! - **Load balancing**: round-robin over eligible workers ordered by running
//!   load, with ties broken by worker id
//! - **Proximity**: haversine distances, radius filters and nearest-N ranking
//!   around a worker start, a job, or a worker's centroid
//! - **Clustering**: greedy running-centroid clusters with a route estimate
//! - **Capacity warnings**: overload, utilization, spread, volume and zone
//!   checks that inform without blocking
//! - **Reassignment workflow**: a confirmation state machine with
//!   role-gated conflict overrides
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fieldcrew_dispatch::config::DispatchConfig;
//! use fieldcrew_dispatch::core::DispatchEngine;
//! use fieldcrew_dispatch::infra::InMemoryStore;
//!
//! let store = Arc::new(InMemoryStore::from_records(worker_docs, job_docs)?);
//! let engine = DispatchEngine::new(store, DispatchConfig::from_env()?);
//! let outcome = engine.auto_assign(date).await?;
//! println!("{} assigned, {} unassignable", outcome.assigned.len(), outcome.unassignable.len());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Domain model, assignment planning, capacity accounting and the engine.
pub mod core;
/// Dispatch policy configuration.
pub mod config;
/// Distances, proximity ranking and clustering.
pub mod geo;
/// Storage and geocoding adapters.
pub mod infra;
/// API surface and scheduled runs.
pub mod runtime;
/// Shared utilities.
pub mod util;
