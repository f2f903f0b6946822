//! Greedy proximity clustering of located jobs.
//!
//! # Algorithm
//!
//! Jobs are processed in input order. Each job not yet clustered seeds a new
//! cluster, which then absorbs every remaining job within the radius of the
//! cluster's running centroid. The centroid is recomputed after each
//! absorption and the scan repeats until a full pass absorbs nothing.
//!
//! This is a heuristic. It is not globally optimal, and reordering the input
//! can change the result. Capacity warnings and route estimates downstream are
//! calibrated against it, so it should not be swapped for DBSCAN or similar
//! without revisiting those.
//!
//! # Route estimate
//!
//! The estimated route length is a nearest-unvisited-neighbour tour starting
//! at the cluster's first member: the sum of consecutive hop distances. It is
//! a cheap proxy, not a travelling-salesman solution.
//!
//! # Complexity
//!
//! O(n² · k) in the worst case, where k is the size of the largest cluster.

use serde::{Deserialize, Serialize};

use crate::core::model::{GeoPoint, Job, JobId};
use crate::core::DispatchError;
use crate::geo::math::{centroid, distance_miles};

/// A group of geographically close jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Members in absorption order; the first is the seed.
    pub job_ids: Vec<JobId>,
    /// Mean position of the members.
    pub centroid: GeoPoint,
    /// Greedy nearest-neighbour tour length in miles.
    pub estimated_route_miles: f64,
}

impl Cluster {
    /// Number of member jobs.
    pub fn len(&self) -> usize {
        self.job_ids.len()
    }

    /// Whether the cluster has no members. Never true for engine output.
    pub fn is_empty(&self) -> bool {
        self.job_ids.is_empty()
    }
}

/// Result of a clustering pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    /// Clusters in seed order.
    pub clusters: Vec<Cluster>,
    /// Jobs skipped because they have no coordinates yet.
    pub unlocatable: Vec<JobId>,
}

/// Group located jobs into proximity clusters of `radius_miles`.
pub fn cluster(jobs: &[Job], radius_miles: f64) -> Result<ClusterReport, DispatchError> {
    if !radius_miles.is_finite() || radius_miles < 0.0 {
        return Err(DispatchError::InvalidInput(format!(
            "cluster radius must be a non-negative number of miles, got {radius_miles}"
        )));
    }

    let mut report = ClusterReport::default();
    let mut located: Vec<(&JobId, GeoPoint)> = Vec::with_capacity(jobs.len());
    for job in jobs {
        match job.point() {
            Some(p) => located.push((&job.id, p)),
            None => report.unlocatable.push(job.id.clone()),
        }
    }

    let mut taken = vec![false; located.len()];
    for seed in 0..located.len() {
        if taken[seed] {
            continue;
        }
        taken[seed] = true;
        let mut members = vec![seed];
        let mut points = vec![located[seed].1];
        let mut center = located[seed].1;

        loop {
            let mut absorbed = false;
            for (idx, (_, p)) in located.iter().enumerate() {
                if taken[idx] || distance_miles(center, *p) > radius_miles {
                    continue;
                }
                taken[idx] = true;
                members.push(idx);
                points.push(*p);
                center = centroid(&points)?;
                absorbed = true;
            }
            if !absorbed {
                break;
            }
        }

        report.clusters.push(Cluster {
            job_ids: members.iter().map(|&i| located[i].0.clone()).collect(),
            centroid: center,
            estimated_route_miles: greedy_route_miles(&points),
        });
    }

    tracing::debug!(
        clusters = report.clusters.len(),
        unlocatable = report.unlocatable.len(),
        radius_miles,
        "clustered jobs"
    );
    Ok(report)
}

/// Length of the nearest-unvisited-neighbour tour starting at `points[0]`.
pub fn greedy_route_miles(points: &[GeoPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut visited = vec![false; points.len()];
    visited[0] = true;
    let mut current = points[0];
    let mut total = 0.0;
    for _ in 1..points.len() {
        let next = points
            .iter()
            .enumerate()
            .filter(|(i, _)| !visited[*i])
            .map(|(i, p)| (i, distance_miles(current, *p)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let Some((i, hop)) = next else { break };
        visited[i] = true;
        current = points[i];
        total += hop;
    }
    total
}
