//! Dispatch policy configuration.

use std::env;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Prefix for environment overrides, e.g. `DISPATCH_CAPACITY_CEILING`.
pub const ENV_PREFIX: &str = "DISPATCH_";

/// Tunable policy values for the assignment engine.
///
/// Defaults reproduce the current operating policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum simultaneous jobs per worker.
    pub capacity_ceiling: u32,
    /// Utilization percentage above which a soft warning is raised.
    pub high_utilization_pct: f64,
    /// Distinct service areas in one batch before a multi-day split is suggested.
    pub max_distinct_areas: usize,
    /// Jobs in one batch before a drive-time warning is raised.
    pub max_batch_jobs: usize,
    /// Flag proposed jobs outside a worker's coverage.
    pub zone_filtering: bool,
    /// Radius used by clustering when the caller does not pick one.
    pub default_cluster_radius_miles: f64,
    /// Seconds between scheduled auto-assign runs.
    pub auto_assign_interval_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            capacity_ceiling: 40,
            high_utilization_pct: 80.0,
            max_distinct_areas: 5,
            max_batch_jobs: 30,
            zone_filtering: true,
            default_cluster_radius_miles: 5.0,
            auto_assign_interval_secs: 900,
        }
    }
}

impl DispatchConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity_ceiling == 0 {
            return Err("capacity_ceiling must be greater than 0".into());
        }
        if !(self.high_utilization_pct > 0.0 && self.high_utilization_pct <= 100.0) {
            return Err("high_utilization_pct must be in (0, 100]".into());
        }
        if self.max_batch_jobs == 0 {
            return Err("max_batch_jobs must be greater than 0".into());
        }
        if !self.default_cluster_radius_miles.is_finite() || self.default_cluster_radius_miles <= 0.0
        {
            return Err("default_cluster_radius_miles must be a positive number".into());
        }
        if self.auto_assign_interval_secs == 0 {
            return Err("auto_assign_interval_secs must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate. Missing keys take
    /// their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `DISPATCH_*` environment variables, after
    /// loading a `.env` file if one is present.
    pub fn from_env() -> AppResult<Self> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        override_with(&lookup, "CAPACITY_CEILING", &mut cfg.capacity_ceiling)?;
        override_with(&lookup, "HIGH_UTILIZATION_PCT", &mut cfg.high_utilization_pct)?;
        override_with(&lookup, "MAX_DISTINCT_AREAS", &mut cfg.max_distinct_areas)?;
        override_with(&lookup, "MAX_BATCH_JOBS", &mut cfg.max_batch_jobs)?;
        override_with(&lookup, "ZONE_FILTERING", &mut cfg.zone_filtering)?;
        override_with(
            &lookup,
            "DEFAULT_CLUSTER_RADIUS_MILES",
            &mut cfg.default_cluster_radius_miles,
        )?;
        override_with(
            &lookup,
            "AUTO_ASSIGN_INTERVAL_SECS",
            &mut cfg.auto_assign_interval_secs,
        )?;
        cfg.validate()
            .map_err(anyhow::Error::msg)
            .context("invalid dispatch configuration")?;
        Ok(cfg)
    }
}

fn override_with<T, F>(lookup: &F, name: &str, slot: &mut T) -> AppResult<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    let key = format!("{ENV_PREFIX}{name}");
    if let Some(raw) = lookup(&key) {
        *slot = raw
            .trim()
            .parse()
            .with_context(|| format!("{key}={raw:?} is not valid"))?;
    }
    Ok(())
}
