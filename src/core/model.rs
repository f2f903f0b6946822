//! Typed worker and job records.
//!
//! These are the only shapes that travel past the engine's entry points. Raw
//! documents from the hosted store are converted into them in
//! [`crate::infra::store::record`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::coverage;
use crate::core::DispatchError;

/// Worker identifier.
pub type WorkerId = String;
/// Job (scheduled service visit) identifier.
pub type JobId = String;
/// Customer identifier.
pub type CustomerId = String;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude, -90..=90.
    pub lat: f64,
    /// Longitude, -180..=180.
    pub lon: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lon: f64) -> Result<Self, DispatchError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(DispatchError::InvalidInput(format!(
                "coordinates must be finite, got ({lat}, {lon})"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(DispatchError::InvalidInput(format!(
                "latitude {lat} outside -90..=90"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(DispatchError::InvalidInput(format!(
                "longitude {lon} outside -180..=180"
            )));
        }
        Ok(Self { lat, lon })
    }
}

/// Exact (city, postal code) grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaKey {
    /// City as stored on the job.
    pub city: String,
    /// Postal code as stored on the job.
    pub postal_code: String,
}

/// Where a job takes place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLocation {
    /// Street address, used only for geocoding.
    #[serde(default)]
    pub street: Option<String>,
    /// City name.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
    /// Resolved coordinates; filled lazily by the geocoding backfill.
    #[serde(default)]
    pub point: Option<GeoPoint>,
}

impl JobLocation {
    /// Location without coordinates.
    pub fn new(city: impl Into<String>, postal_code: impl Into<String>) -> Self {
        Self {
            street: None,
            city: city.into(),
            postal_code: postal_code.into(),
            point: None,
        }
    }

    /// Grouping key used by the load balancer and spread warnings.
    pub fn area_key(&self) -> AreaKey {
        AreaKey {
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
        }
    }

    /// Free-form address line handed to a geocoder.
    pub fn geocode_query(&self) -> String {
        match self.street.as_deref().map(str::trim) {
            Some(street) if !street.is_empty() => {
                format!("{street}, {} {}", self.city.trim(), self.postal_code.trim())
            }
            _ => format!("{} {}", self.city.trim(), self.postal_code.trim()),
        }
    }
}

/// Assignment lifecycle of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "worker_id", rename_all = "snake_case")]
pub enum AssignmentState {
    /// No worker holds the job.
    Unassigned,
    /// Claimed by a worker, not started.
    Assigned(WorkerId),
    /// Being serviced by a worker.
    InProgress(WorkerId),
    /// Finished by a worker.
    Completed(WorkerId),
}

impl AssignmentState {
    /// Worker currently holding the job, counting toward that worker's load.
    pub fn holder(&self) -> Option<&str> {
        match self {
            Self::Assigned(w) | Self::InProgress(w) => Some(w),
            Self::Unassigned | Self::Completed(_) => None,
        }
    }

    /// Whether the job is free to be claimed.
    pub const fn is_unassigned(&self) -> bool {
        matches!(self, Self::Unassigned)
    }
}

/// How a job came to be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    /// Auto-assigned by the load balancer.
    Auto,
    /// Assigned by an operator.
    Manual,
}

/// Service priority of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    /// Regular visit.
    #[default]
    Normal,
    /// Elevated.
    Priority,
    /// Same-day.
    Urgent,
}

/// A scheduled service visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier.
    pub id: JobId,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Service location.
    pub location: JobLocation,
    /// Day the visit is scheduled for.
    pub scheduled_date: NaiveDate,
    /// Current assignment state.
    pub state: AssignmentState,
    /// Source of the current assignment, if any.
    #[serde(default)]
    pub source: Option<AssignmentSource>,
    /// Service priority.
    #[serde(default)]
    pub priority: JobPriority,
}

impl Job {
    /// New unassigned job at normal priority.
    pub fn new(
        id: impl Into<JobId>,
        customer_id: impl Into<CustomerId>,
        location: JobLocation,
        scheduled_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            customer_id: customer_id.into(),
            location,
            scheduled_date,
            state: AssignmentState::Unassigned,
            source: None,
            priority: JobPriority::Normal,
        }
    }

    /// Attach resolved coordinates.
    #[must_use]
    pub fn with_point(mut self, point: GeoPoint) -> Self {
        self.location.point = Some(point);
        self
    }

    /// Override the assignment state.
    #[must_use]
    pub fn with_state(mut self, state: AssignmentState) -> Self {
        self.state = state;
        self
    }

    /// Override the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Resolved coordinates, if geocoded.
    pub const fn point(&self) -> Option<GeoPoint> {
        self.location.point
    }

    /// Worker currently holding this job.
    pub fn holder(&self) -> Option<&str> {
        self.state.holder()
    }
}

/// A field worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    /// Worker identifier.
    pub id: WorkerId,
    /// Display name.
    pub name: String,
    /// Ordered coverage tokens: zones, counties, cities, postal codes.
    #[serde(default)]
    pub coverage: Vec<String>,
    /// Hourly pay rate.
    #[serde(default)]
    pub pay_rate: f64,
    /// Number of jobs assigned or in progress for this worker.
    #[serde(default)]
    pub active_job_count: u32,
    /// False once soft-deactivated.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Fixed start-of-day location, used as a proximity anchor.
    #[serde(default)]
    pub start_location: Option<GeoPoint>,
}

const fn default_active() -> bool {
    true
}

impl Worker {
    /// Active worker with no coverage and no jobs.
    pub fn new(id: impl Into<WorkerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coverage: Vec::new(),
            pay_rate: 0.0,
            active_job_count: 0,
            active: true,
            start_location: None,
        }
    }

    /// Replace the coverage tokens.
    #[must_use]
    pub fn with_coverage<I, T>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.coverage = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Set the starting load.
    #[must_use]
    pub fn with_active_jobs(mut self, count: u32) -> Self {
        self.active_job_count = count;
        self
    }

    /// Set the fixed start location.
    #[must_use]
    pub fn with_start_location(mut self, point: GeoPoint) -> Self {
        self.start_location = Some(point);
        self
    }

    /// Whether this worker's coverage includes the location.
    pub fn covers(&self, location: &JobLocation) -> bool {
        coverage::matches(&location.city, &location.postal_code, &self.coverage)
    }
}
