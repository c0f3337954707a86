// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::supabase::{sqlstate, SupabaseError};
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub physician_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub status: AppointmentStatus,
    pub summary: Option<String>,
    pub objective: String,
    pub diagnostic: Option<String>,
    pub treatment: Option<String>,
    pub patient_eval_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn involves(&self, patient_id: Uuid, physician_id: Uuid) -> bool {
        self.patient_id == patient_id || self.physician_id == physician_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Requested,
    Accepted,
    Rejected,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Requested => write!(f, "REQUESTED"),
            AppointmentStatus::Accepted => write!(f, "ACCEPTED"),
            AppointmentStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Half-open time range `[start, end)`. Construction enforces `start < end`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppointmentError> {
        if start >= end {
            return Err(AppointmentError::InvalidTime(
                "start_date must be before end_date".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// `[s1,e1)` and `[s2,e2)` intersect iff `s1 < e2 && s2 < e1`.
    /// Ranges that only touch at a boundary do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// A proposed (or re-evaluated) booking as seen by the conflict validator.
#[derive(Debug, Clone)]
pub struct AppointmentCandidate {
    /// Set when re-evaluating a persisted appointment so it never conflicts with itself.
    pub appointment_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub physician_id: Uuid,
    pub range: TimeRange,
}

impl AppointmentCandidate {
    pub fn new(patient_id: Uuid, physician_id: Uuid, range: TimeRange) -> Self {
        Self {
            appointment_id: None,
            patient_id,
            physician_id,
            range,
        }
    }

    pub fn excluding(mut self, appointment_id: Uuid) -> Self {
        self.appointment_id = Some(appointment_id);
        self
    }

    pub fn for_existing(appointment: &Appointment, range: TimeRange) -> Self {
        Self::new(appointment.patient_id, appointment.physician_id, range)
            .excluding(appointment.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Patient,
    Physician,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Patient => write!(f, "patient"),
            Party::Physician => write!(f, "physician"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: Uuid,
    pub physician_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub objective: String,
    pub summary: Option<String>,
    pub patient_eval_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub objective: Option<String>,
    pub diagnostic: Option<String>,
    pub treatment: Option<String>,
}

impl UpdateAppointmentRequest {
    pub fn reschedules(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentListQuery {
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckQuery {
    pub patient_id: Uuid,
    pub physician_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub exclude_appointment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Referenced {0} does not exist")]
    ReferenceNotFound(Party),

    #[error("Patient or physician already has an accepted appointment in this time range")]
    Conflict,

    #[error("Appointment storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Rejected appointments cannot be modified")]
    NotModifiable,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

const PATIENT_FKEY: &str = "\"appointments_patient_id_fkey\"";
const PHYSICIAN_FKEY: &str = "\"appointments_physician_id_fkey\"";

impl From<SupabaseError> for AppointmentError {
    fn from(err: SupabaseError) -> Self {
        if err.is_constraint(sqlstate::EXCLUSION_VIOLATION) {
            return AppointmentError::Conflict;
        }

        if err.is_constraint(sqlstate::FOREIGN_KEY_VIOLATION) {
            let message = err.constraint_message().unwrap_or_default();
            if message.contains(PATIENT_FKEY) {
                return AppointmentError::ReferenceNotFound(Party::Patient);
            }
            if message.contains(PHYSICIAN_FKEY) {
                return AppointmentError::ReferenceNotFound(Party::Physician);
            }
            return AppointmentError::ValidationError(format!("Invalid reference: {}", message));
        }

        if err.is_constraint(sqlstate::CHECK_VIOLATION) {
            return AppointmentError::InvalidTime(
                err.constraint_message().unwrap_or_default().to_string(),
            );
        }

        AppointmentError::StorageUnavailable(err.to_string())
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::ReferenceNotFound(party) => match party {
                Party::Patient => AppError::NotFound("Patient does not exist".to_string()),
                Party::Physician => AppError::NotFound("Physician does not exist".to_string()),
            },
            AppointmentError::Conflict => AppError::Conflict("Patient or Physician occupied".to_string()),
            AppointmentError::StorageUnavailable(msg) => AppError::Database(msg),
            AppointmentError::InvalidTime(msg) => AppError::ValidationError(msg),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::InvalidStatusTransition { .. } | AppointmentError::NotModifiable => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::Unauthorized(msg) => AppError::Forbidden(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_time_range_rejects_empty_and_inverted() {
        assert!(TimeRange::new(at(10, 0), at(11, 0)).is_ok());
        assert!(matches!(
            TimeRange::new(at(10, 0), at(10, 0)),
            Err(AppointmentError::InvalidTime(_))
        ));
        assert!(matches!(
            TimeRange::new(at(11, 0), at(10, 0)),
            Err(AppointmentError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&AppointmentStatus::Accepted).unwrap(), "\"ACCEPTED\"");
        let status: AppointmentStatus = serde_json::from_str("\"REJECTED\"").unwrap();
        assert_eq!(status, AppointmentStatus::Rejected);
    }

    #[test]
    fn test_storage_errors_map_to_taxonomy() {
        let exclusion = SupabaseError::Constraint {
            code: sqlstate::EXCLUSION_VIOLATION.to_string(),
            message: "conflicting key value violates exclusion constraint \"appointments_physician_no_overlap\"".to_string(),
        };
        assert!(matches!(AppointmentError::from(exclusion), AppointmentError::Conflict));

        let missing_physician = SupabaseError::Constraint {
            code: sqlstate::FOREIGN_KEY_VIOLATION.to_string(),
            message: "insert or update on table \"appointments\" violates foreign key constraint \"appointments_physician_id_fkey\"".to_string(),
        };
        assert!(matches!(
            AppointmentError::from(missing_physician),
            AppointmentError::ReferenceNotFound(Party::Physician)
        ));

        let missing_patient = SupabaseError::Constraint {
            code: sqlstate::FOREIGN_KEY_VIOLATION.to_string(),
            message: "violates foreign key constraint \"appointments_patient_id_fkey\"".to_string(),
        };
        assert!(matches!(
            AppointmentError::from(missing_patient),
            AppointmentError::ReferenceNotFound(Party::Patient)
        ));

        let bad_eval = SupabaseError::Constraint {
            code: sqlstate::FOREIGN_KEY_VIOLATION.to_string(),
            message: "insert or update on table \"appointments\" violates foreign key constraint \"appointments_patient_eval_id_fkey\"".to_string(),
        };
        assert!(matches!(
            AppointmentError::from(bad_eval),
            AppointmentError::ValidationError(_)
        ));

        let outage = SupabaseError::Api { status: 503, message: "down".to_string() };
        assert!(matches!(
            AppointmentError::from(outage),
            AppointmentError::StorageUnavailable(_)
        ));
    }
}
