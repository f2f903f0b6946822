//! Raw documents as delivered by the hosted store.
//!
//! Every field is optional because the upstream documents are permissive.
//! Conversion into the typed model happens here and nowhere else; a record
//! missing a required field is rejected with `InvalidInput`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::model::{
    AssignmentSource, AssignmentState, GeoPoint, Job, JobLocation, JobPriority, Worker,
};
use crate::core::DispatchError;

/// Worker document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRecord {
    /// Document id.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Coverage tokens.
    pub service_areas: Option<Vec<String>>,
    /// Hourly pay rate.
    pub pay_rate: Option<f64>,
    /// Active job counter.
    pub active_jobs: Option<u32>,
    /// `"active"` or `"inactive"`; absent means active.
    pub status: Option<String>,
    /// Start-of-day latitude.
    pub start_lat: Option<f64>,
    /// Start-of-day longitude.
    pub start_lng: Option<f64>,
}

/// Job (scheduled service) document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Document id.
    pub id: Option<String>,
    /// Owning customer.
    pub customer_id: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Postal code.
    pub zip_code: Option<String>,
    /// Latitude, once geocoded.
    pub lat: Option<f64>,
    /// Longitude, once geocoded.
    pub lng: Option<f64>,
    /// `YYYY-MM-DD`.
    pub scheduled_date: Option<String>,
    /// `unassigned`, `scheduled`, `assigned`, `in_progress` or `completed`.
    pub status: Option<String>,
    /// Holding worker id.
    pub assigned_to: Option<String>,
    /// `auto` or `manual`.
    pub assignment_source: Option<String>,
    /// `normal`, `priority` or `urgent`.
    pub priority: Option<String>,
}

fn required(field: Option<String>, what: &str, doc: &str) -> Result<String, DispatchError> {
    match field {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DispatchError::InvalidInput(format!(
            "{doc} record missing {what}"
        ))),
    }
}

fn point(lat: Option<f64>, lng: Option<f64>, doc: &str) -> Result<Option<GeoPoint>, DispatchError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).map(Some),
        (None, None) => Ok(None),
        _ => Err(DispatchError::InvalidInput(format!(
            "{doc} record has only one of latitude/longitude"
        ))),
    }
}

impl TryFrom<WorkerRecord> for Worker {
    type Error = DispatchError;

    fn try_from(record: WorkerRecord) -> Result<Self, Self::Error> {
        let id = required(record.id, "id", "worker")?;
        let doc = format!("worker {id}");
        let active = match record.status.as_deref().map(str::trim) {
            None | Some("active") => true,
            Some("inactive") => false,
            Some(other) => {
                return Err(DispatchError::InvalidInput(format!(
                    "{doc} has unknown status {other:?}"
                )))
            }
        };
        Ok(Self {
            name: record.name.unwrap_or_else(|| id.clone()),
            coverage: record.service_areas.unwrap_or_default(),
            pay_rate: record.pay_rate.unwrap_or(0.0),
            active_job_count: record.active_jobs.unwrap_or(0),
            active,
            start_location: point(record.start_lat, record.start_lng, &doc)?,
            id,
        })
    }
}

fn parse_state(
    status: Option<&str>,
    assigned_to: Option<String>,
    doc: &str,
) -> Result<AssignmentState, DispatchError> {
    let holder = |label: &str| {
        assigned_to.clone().filter(|w| !w.trim().is_empty()).ok_or_else(|| {
            DispatchError::InvalidInput(format!("{doc} is {label} but has no assignedTo"))
        })
    };
    match status.map(str::trim) {
        None => Ok(assigned_to
            .clone()
            .filter(|w| !w.trim().is_empty())
            .map_or(AssignmentState::Unassigned, AssignmentState::Assigned)),
        Some("unassigned" | "scheduled") => Ok(AssignmentState::Unassigned),
        Some("assigned") => holder("assigned").map(AssignmentState::Assigned),
        Some("in_progress") => holder("in_progress").map(AssignmentState::InProgress),
        Some("completed") => holder("completed").map(AssignmentState::Completed),
        Some(other) => Err(DispatchError::InvalidInput(format!(
            "{doc} has unknown status {other:?}"
        ))),
    }
}

impl TryFrom<JobRecord> for Job {
    type Error = DispatchError;

    fn try_from(record: JobRecord) -> Result<Self, Self::Error> {
        let id = required(record.id, "id", "job")?;
        let doc = format!("job {id}");
        let raw_date = required(record.scheduled_date, "scheduledDate", &doc)?;
        let scheduled_date = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d").map_err(|e| {
            DispatchError::InvalidInput(format!("{doc} has bad scheduledDate {raw_date:?}: {e}"))
        })?;
        let source = match record.assignment_source.as_deref().map(str::trim) {
            None => None,
            Some("auto") => Some(AssignmentSource::Auto),
            Some("manual") => Some(AssignmentSource::Manual),
            Some(other) => {
                return Err(DispatchError::InvalidInput(format!(
                    "{doc} has unknown assignmentSource {other:?}"
                )))
            }
        };
        let priority = match record.priority.as_deref().map(str::trim) {
            None | Some("normal") => JobPriority::Normal,
            Some("priority") => JobPriority::Priority,
            Some("urgent") => JobPriority::Urgent,
            Some(other) => {
                return Err(DispatchError::InvalidInput(format!(
                    "{doc} has unknown priority {other:?}"
                )))
            }
        };
        Ok(Self {
            customer_id: required(record.customer_id, "customerId", &doc)?,
            location: JobLocation {
                street: record.address,
                city: required(record.city, "city", &doc)?,
                postal_code: required(record.zip_code, "zipCode", &doc)?,
                point: point(record.lat, record.lng, &doc)?,
            },
            scheduled_date,
            state: parse_state(record.status.as_deref(), record.assigned_to, &doc)?,
            source,
            priority,
            id,
        })
    }
}
