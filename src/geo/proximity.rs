//! Distance ranking of located jobs around an anchor point.
//!
//! Every function here is pure and operates on a caller-supplied snapshot.

use serde::{Deserialize, Serialize};

use crate::core::model::{GeoPoint, Job, JobId, Worker, WorkerId};
use crate::core::DispatchError;
use crate::geo::math::{centroid, distance_miles, BoundingBox};

/// A job paired with its distance from the anchor.
#[derive(Debug, Clone, Copy)]
pub struct RankedJob<'a> {
    /// The ranked job.
    pub job: &'a Job,
    /// Haversine distance from the anchor in miles.
    pub distance_miles: f64,
}

/// How the reference point for a ranking is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorSpec {
    /// The worker's fixed start location.
    WorkerStart {
        /// Worker whose start location anchors the ranking.
        worker_id: WorkerId,
    },
    /// A chosen job's location.
    Job {
        /// Job whose location anchors the ranking.
        job_id: JobId,
    },
    /// Centroid of the worker's assigned jobs, or of all candidates when the
    /// worker holds none.
    WorkerCentroid {
        /// Worker whose assigned jobs define the centroid.
        worker_id: WorkerId,
    },
}

fn require_point(job: &Job) -> Result<GeoPoint, DispatchError> {
    job.point().ok_or_else(|| {
        DispatchError::InvalidInput(format!("job {} has no resolved location", job.id))
    })
}

/// Rank jobs by ascending distance from `anchor`.
///
/// Every job must be located. Ties keep their input order.
pub fn sort_by_distance(jobs: &[Job], anchor: GeoPoint) -> Result<Vec<RankedJob<'_>>, DispatchError> {
    let mut ranked = jobs
        .iter()
        .map(|job| {
            require_point(job).map(|p| RankedJob {
                job,
                distance_miles: distance_miles(p, anchor),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    ranked.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
    Ok(ranked)
}

/// Jobs within `radius_miles` of `anchor` (inclusive), nearest first.
pub fn filter_within_radius(
    jobs: &[Job],
    anchor: GeoPoint,
    radius_miles: f64,
) -> Result<Vec<RankedJob<'_>>, DispatchError> {
    if !radius_miles.is_finite() || radius_miles < 0.0 {
        return Err(DispatchError::InvalidInput(format!(
            "radius must be a non-negative number of miles, got {radius_miles}"
        )));
    }
    let bbox = BoundingBox::around(anchor, radius_miles);
    let mut ranked = Vec::new();
    for job in jobs {
        let p = require_point(job)?;
        if !bbox.contains(p) {
            continue;
        }
        let d = distance_miles(p, anchor);
        if d <= radius_miles {
            ranked.push(RankedJob {
                job,
                distance_miles: d,
            });
        }
    }
    ranked.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
    Ok(ranked)
}

/// The `top_n` nearest jobs to `anchor`.
pub fn nearest(
    jobs: &[Job],
    anchor: GeoPoint,
    top_n: usize,
) -> Result<Vec<RankedJob<'_>>, DispatchError> {
    let mut ranked = sort_by_distance(jobs, anchor)?;
    ranked.truncate(top_n);
    Ok(ranked)
}

/// Anchor at a worker's fixed start location.
pub fn worker_start_anchor(worker: &Worker) -> Result<GeoPoint, DispatchError> {
    worker.start_location.ok_or_else(|| {
        DispatchError::InvalidInput(format!("worker {} has no start location", worker.id))
    })
}

/// Anchor at a chosen job's location.
pub fn job_anchor(job: &Job) -> Result<GeoPoint, DispatchError> {
    require_point(job)
}

/// Centroid of the located `assigned` jobs, falling back to the located
/// `candidates` when the worker has none.
pub fn centroid_anchor(assigned: &[Job], candidates: &[Job]) -> Result<GeoPoint, DispatchError> {
    let held: Vec<GeoPoint> = assigned.iter().filter_map(Job::point).collect();
    if !held.is_empty() {
        return centroid(&held);
    }
    let pool: Vec<GeoPoint> = candidates.iter().filter_map(Job::point).collect();
    centroid(&pool)
}
