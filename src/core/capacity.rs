//! Capacity and risk checks for a proposed assignment batch.
//!
//! Validation never blocks. It produces warnings that the confirmation step
//! shows to the operator before anything is committed.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::DispatchConfig;
use crate::core::coverage::normalize_token;
use crate::core::model::{Job, JobId, Worker, WorkerId};

/// A worker's current load against the capacity ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSnapshot {
    /// Worker the snapshot describes.
    pub worker_id: WorkerId,
    /// Jobs currently assigned or in progress.
    pub current_count: u32,
    /// Maximum simultaneous jobs allowed.
    pub capacity_ceiling: u32,
    /// `current_count` as a percentage of the ceiling.
    pub utilization_pct: f64,
}

impl WorkloadSnapshot {
    /// Snapshot from a count and a ceiling.
    pub fn new(worker_id: impl Into<WorkerId>, current_count: u32, capacity_ceiling: u32) -> Self {
        Self {
            worker_id: worker_id.into(),
            current_count,
            capacity_ceiling,
            utilization_pct: utilization_pct(current_count, capacity_ceiling),
        }
    }

    /// Snapshot of a worker's recorded active-job count.
    pub fn of(worker: &Worker, capacity_ceiling: u32) -> Self {
        Self::new(worker.id.clone(), worker.active_job_count, capacity_ceiling)
    }
}

fn utilization_pct(count: u32, ceiling: u32) -> f64 {
    if ceiling == 0 {
        return f64::INFINITY;
    }
    f64::from(count) * 100.0 / f64::from(ceiling)
}

/// Thresholds the validator applies.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityPolicy {
    /// Hard ceiling on simultaneous jobs per worker.
    pub capacity_ceiling: u32,
    /// Utilization above which a soft warning is raised.
    pub high_utilization_pct: f64,
    /// Distinct (city, postal code) areas allowed before suggesting a split.
    pub max_distinct_areas: usize,
    /// Batch size above which drive time is flagged.
    pub max_batch_jobs: usize,
    /// Whether jobs outside the worker's coverage are flagged.
    pub zone_filtering: bool,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for CapacityPolicy {
    fn from(cfg: &DispatchConfig) -> Self {
        Self {
            capacity_ceiling: cfg.capacity_ceiling,
            high_utilization_pct: cfg.high_utilization_pct,
            max_distinct_areas: cfg.max_distinct_areas,
            max_batch_jobs: cfg.max_batch_jobs,
            zone_filtering: cfg.zone_filtering,
        }
    }
}

/// Whether a warning should stop an operator before confirming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Shown prominently; commit still allowed.
    Hard,
    /// Advisory.
    Soft,
}

/// A risk surfaced for a proposed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapacityWarning {
    /// New total exceeds the ceiling.
    Overload {
        /// Current plus proposed.
        new_total: u32,
        /// Ceiling in force.
        capacity_ceiling: u32,
        /// `new_total` as a percentage of the ceiling.
        utilization_pct: f64,
    },
    /// New total is above the high-utilization threshold but within the ceiling.
    HighUtilization {
        /// Current plus proposed.
        new_total: u32,
        /// `new_total` as a percentage of the ceiling.
        utilization_pct: f64,
    },
    /// Batch spans many distinct areas.
    GeographicSpread {
        /// Number of distinct (city, postal code) keys.
        distinct_areas: usize,
    },
    /// Batch is large enough for drive time to dominate the day.
    Volume {
        /// Jobs proposed in this batch.
        proposed: usize,
    },
    /// Some jobs fall outside the worker's declared coverage.
    ZoneMismatch {
        /// Offending jobs.
        job_ids: Vec<JobId>,
    },
}

impl CapacityWarning {
    /// Severity classification.
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Overload { .. } => Severity::Hard,
            _ => Severity::Soft,
        }
    }
}

impl fmt::Display for CapacityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overload {
                new_total,
                capacity_ceiling,
                utilization_pct,
            } => write!(
                f,
                "overload: new total {new_total} exceeds capacity {capacity_ceiling} ({utilization_pct:.1}% utilization)"
            ),
            Self::HighUtilization {
                new_total,
                utilization_pct,
            } => write!(
                f,
                "high utilization: new total {new_total} ({utilization_pct:.1}% of capacity)"
            ),
            Self::GeographicSpread { distinct_areas } => write!(
                f,
                "jobs span {distinct_areas} service areas; consider splitting across multiple days"
            ),
            Self::Volume { proposed } => write!(
                f,
                "{proposed} jobs in one batch; expect long drive times"
            ),
            Self::ZoneMismatch { job_ids } => write!(
                f,
                "{} job(s) outside the worker's service area: {}",
                job_ids.len(),
                job_ids.join(", ")
            ),
        }
    }
}

/// Evaluate adding `proposed` to `worker` given its current `workload`.
pub fn validate(
    worker: &Worker,
    proposed: &[Job],
    workload: &WorkloadSnapshot,
    policy: &CapacityPolicy,
) -> Vec<CapacityWarning> {
    let mut warnings = Vec::new();
    let added = u32::try_from(proposed.len()).unwrap_or(u32::MAX);
    let new_total = workload.current_count.saturating_add(added);
    let pct = utilization_pct(new_total, policy.capacity_ceiling);

    if new_total > policy.capacity_ceiling {
        warnings.push(CapacityWarning::Overload {
            new_total,
            capacity_ceiling: policy.capacity_ceiling,
            utilization_pct: pct,
        });
    } else if pct > policy.high_utilization_pct {
        warnings.push(CapacityWarning::HighUtilization {
            new_total,
            utilization_pct: pct,
        });
    }

    // Same folding as coverage matching, so case and padding never split an area.
    let areas: HashSet<(String, String)> = proposed
        .iter()
        .map(|j| {
            (
                normalize_token(&j.location.city),
                normalize_token(&j.location.postal_code),
            )
        })
        .collect();
    if areas.len() > policy.max_distinct_areas {
        warnings.push(CapacityWarning::GeographicSpread {
            distinct_areas: areas.len(),
        });
    }

    if proposed.len() > policy.max_batch_jobs {
        warnings.push(CapacityWarning::Volume {
            proposed: proposed.len(),
        });
    }

    if policy.zone_filtering {
        let outside: Vec<JobId> = proposed
            .iter()
            .filter(|j| !worker.covers(&j.location))
            .map(|j| j.id.clone())
            .collect();
        if !outside.is_empty() {
            warnings.push(CapacityWarning::ZoneMismatch { job_ids: outside });
        }
    }

    if !warnings.is_empty() {
        tracing::debug!(
            worker_id = %worker.id,
            new_total,
            warnings = warnings.len(),
            "capacity warnings raised"
        );
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::JobLocation;
    use chrono::NaiveDate;

    fn jobs(n: usize, city: &str) -> Vec<Job> {
        (0..n)
            .map(|i| {
                Job::new(
                    format!("j{i}"),
                    "cust",
                    JobLocation::new(city, format!("{}", 30300 + i)),
                    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                )
            })
            .collect()
    }

    fn atlanta_worker(active: u32) -> Worker {
        Worker::new("w1", "One")
            .with_coverage(["atlanta"])
            .with_active_jobs(active)
    }

    #[test]
    fn overload_reports_total_and_percentage() {
        let worker = atlanta_worker(38);
        let snap = WorkloadSnapshot::of(&worker, 40);
        let proposed = jobs(5, "Atlanta");
        let warnings = validate(&worker, &proposed, &snap, &CapacityPolicy::default());
        let overload = warnings
            .iter()
            .find(|w| matches!(w, CapacityWarning::Overload { .. }))
            .unwrap();
        match overload {
            CapacityWarning::Overload {
                new_total,
                utilization_pct,
                ..
            } => {
                assert_eq!(*new_total, 43);
                assert!((utilization_pct - 107.5).abs() < 1e-9);
            }
            _ => unreachable!(),
        }
        let text = overload.to_string();
        assert!(text.contains("43"));
        assert!(text.contains("107.5%"));
        assert_eq!(overload.severity(), Severity::Hard);
    }

    #[test]
    fn high_utilization_is_soft_and_exclusive_with_overload() {
        let worker = atlanta_worker(30);
        let snap = WorkloadSnapshot::of(&worker, 40);
        let warnings = validate(&worker, &jobs(3, "Atlanta"), &snap, &CapacityPolicy::default());
        assert_eq!(
            warnings,
            [CapacityWarning::HighUtilization {
                new_total: 33,
                utilization_pct: 82.5,
            }]
        );
        assert_eq!(warnings[0].severity(), Severity::Soft);
    }

    #[test]
    fn exactly_at_ceiling_is_not_overload() {
        let worker = atlanta_worker(35);
        let snap = WorkloadSnapshot::of(&worker, 40);
        let warnings = validate(&worker, &jobs(5, "Atlanta"), &snap, &CapacityPolicy::default());
        assert!(matches!(
            warnings.as_slice(),
            [CapacityWarning::HighUtilization { new_total: 40, .. }]
        ));
    }

    #[test]
    fn spread_and_volume_thresholds() {
        let worker = atlanta_worker(0);
        let policy = CapacityPolicy {
            capacity_ceiling: 100,
            ..CapacityPolicy::default()
        };
        let snap = WorkloadSnapshot::of(&worker, 100);
        let warnings = validate(&worker, &jobs(31, "Atlanta"), &snap, &policy);
        assert!(warnings.contains(&CapacityWarning::GeographicSpread { distinct_areas: 31 }));
        assert!(warnings.contains(&CapacityWarning::Volume { proposed: 31 }));

        let warnings = validate(&worker, &jobs(5, "Atlanta"), &snap, &policy);
        assert!(warnings.is_empty());
    }

    #[test]
    fn spread_folds_case_and_whitespace() {
        let worker = atlanta_worker(0);
        let snap = WorkloadSnapshot::of(&worker, 40);
        let policy = CapacityPolicy {
            max_distinct_areas: 1,
            ..CapacityPolicy::default()
        };
        let proposed: Vec<Job> = [("a", "Atlanta", "30301"), ("b", "ATLANTA ", " 30301")]
            .iter()
            .map(|(id, city, postal)| {
                Job::new(
                    *id,
                    "cust",
                    JobLocation::new(*city, *postal),
                    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                )
            })
            .collect();
        let warnings = validate(&worker, &proposed, &snap, &policy);
        assert!(!warnings
            .iter()
            .any(|w| matches!(w, CapacityWarning::GeographicSpread { .. })));
    }

    #[test]
    fn zone_mismatch_only_when_filtering() {
        let worker = atlanta_worker(0);
        let snap = WorkloadSnapshot::of(&worker, 40);
        let proposed = jobs(2, "Macon");
        let warnings = validate(&worker, &proposed, &snap, &CapacityPolicy::default());
        assert_eq!(
            warnings,
            [CapacityWarning::ZoneMismatch {
                job_ids: vec!["j0".into(), "j1".into()],
            }]
        );

        let policy = CapacityPolicy {
            zone_filtering: false,
            ..CapacityPolicy::default()
        };
        assert!(validate(&worker, &proposed, &snap, &policy).is_empty());
    }

    #[test]
    fn snapshot_utilization() {
        let snap = WorkloadSnapshot::new("w1", 10, 40);
        assert!((snap.utilization_pct - 25.0).abs() < 1e-9);
    }
}
