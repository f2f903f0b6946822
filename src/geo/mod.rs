//! Pure spatial computations: distances, ranking and clustering.
//!
//! Nothing in this module touches the store; every function works on a
//! snapshot supplied by the caller and is safe to run in parallel.

pub mod cluster;
pub mod math;
pub mod proximity;

pub use cluster::{cluster, Cluster, ClusterReport};
pub use math::{centroid, distance_miles, BoundingBox, EARTH_RADIUS_MILES};
pub use proximity::{
    centroid_anchor, filter_within_radius, job_anchor, nearest, sort_by_distance,
    worker_start_anchor, AnchorSpec, RankedJob,
};
