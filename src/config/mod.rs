//! Configuration models for dispatch policy.

pub mod dispatch;

pub use dispatch::{DispatchConfig, ENV_PREFIX};
