use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentError};
use physio_eval_cell::models::{PhysioEval, PhysioEvalError};
use shared_database::SupabaseError;
use shared_models::auth::Specialty;
use shared_models::error::AppError;
use shared_utils::validation::{account_field_errors, validate_birth_date, validate_pt_mobile};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Columns returned to clients; `password_hash` never leaves the database.
pub const PATIENT_COLUMNS: &str =
    "id,name,email,gender,birth_date,phone_number,address,identification_number,fiscal_number,created_at,updated_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub gender: Option<String>,
    pub birth_date: NaiveDate,
    pub phone_number: String,
    pub address: Option<String>,
    pub identification_number: Option<String>,
    pub fiscal_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Option<String>,
    pub phone_number: String,
    pub address: Option<String>,
    pub identification_number: Option<String>,
    pub fiscal_number: Option<String>,
}

impl CreatePatientRequest {
    pub fn validate(&self) -> Result<(), PatientError> {
        let mut errors = account_field_errors(&self.email, &self.password, &self.name, &self.phone_number);
        errors.check(validate_birth_date(self.birth_date), "birth_date must be in the past");
        errors.into_result().map_err(PatientError::ValidationError)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub identification_number: Option<String>,
    pub fiscal_number: Option<String>,
    /// Only present to refuse it.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl UpdatePatientRequest {
    pub fn validate(&self) -> Result<(), PatientError> {
        if self.password.is_some() {
            return Err(PatientError::PasswordChange);
        }

        let mut errors = shared_utils::validation::FieldErrors::new();
        if let Some(name) = &self.name {
            errors.check(!name.trim().is_empty(), "name is required");
        }
        if let Some(birth_date) = self.birth_date {
            errors.check(validate_birth_date(birth_date), "birth_date must be in the past");
        }
        if let Some(phone_number) = &self.phone_number {
            errors.check(
                validate_pt_mobile(phone_number),
                "phone_number must be a Portuguese mobile number",
            );
        }
        errors.into_result().map_err(PatientError::ValidationError)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSearchQuery {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientListQuery {
    pub created_after: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl PatientListQuery {
    pub fn page_size(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientHistory {
    pub patient: Patient,
    pub appointments: Vec<Appointment>,
    pub physio_evals: Vec<PhysioEval>,
}

/// What a patient sees of the physicians caring for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicianContact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialty: Specialty,
    pub phone_number: Option<String>,
}

/// Body of `POST /patients/profileImage`. `image` is base64, optionally as a
/// `data:image/...;base64,` URL. Physicians must name the patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileImageUpload {
    pub patient_id: Option<Uuid>,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileImage {
    pub patient_id: Uuid,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Patient with email {email} already exists")]
    EmailAlreadyExists { email: String },

    #[error("Password can not be changed this way")]
    PasswordChange,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Failed to hash password: {0}")]
    PasswordHash(String),

    #[error("Profile image not found")]
    ImageNotFound,

    #[error(transparent)]
    Storage(#[from] SupabaseError),

    #[error(transparent)]
    Appointments(#[from] AppointmentError),

    #[error(transparent)]
    PhysioEvals(#[from] PhysioEvalError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::EmailAlreadyExists { .. } => AppError::Conflict(err.to_string()),
            PatientError::PasswordChange => AppError::BadRequest(err.to_string()),
            PatientError::Unauthorized(msg) => AppError::Forbidden(msg),
            PatientError::ValidationError(msg) => AppError::ValidationError(msg),
            PatientError::PasswordHash(_) => AppError::Internal(err.to_string()),
            PatientError::ImageNotFound => AppError::NotFound(err.to_string()),
            PatientError::Storage(e) => AppError::Database(e.to_string()),
            PatientError::Appointments(e) => e.into(),
            PatientError::PhysioEvals(e) => e.into(),
        }
    }
}
