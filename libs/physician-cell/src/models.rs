use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::SupabaseError;
use shared_models::auth::Specialty;
use shared_models::error::AppError;
use shared_utils::validation::{account_field_errors, validate_pt_mobile, FieldErrors};

pub const PHYSICIAN_COLUMNS: &str =
    "id,name,email,specialty,license_number,phone_number,created_at,updated_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Physician {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialty: Specialty,
    pub license_number: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePhysicianRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone_number: String,
    pub specialty: Option<Specialty>,
    pub license_number: Option<String>,
}

impl CreatePhysicianRequest {
    pub fn validate(&self) -> Result<(), PhysicianError> {
        let mut errors = account_field_errors(&self.email, &self.password, &self.name, &self.phone_number);
        errors.check(self.specialty.is_some(), "specialty is required");
        errors.check(
            self.license_number.as_deref().is_some_and(|n| !n.trim().is_empty()),
            "license_number is required",
        );
        errors.into_result().map_err(PhysicianError::ValidationError)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePhysicianRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub license_number: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl UpdatePhysicianRequest {
    pub fn validate(&self) -> Result<(), PhysicianError> {
        if self.password.is_some() {
            return Err(PhysicianError::PasswordChange);
        }

        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.check(!name.trim().is_empty(), "name is required");
        }
        if let Some(phone_number) = &self.phone_number {
            errors.check(
                validate_pt_mobile(phone_number),
                "phone_number must be a Portuguese mobile number",
            );
        }
        if let Some(license_number) = &self.license_number {
            errors.check(!license_number.trim().is_empty(), "license_number is required");
        }
        errors.into_result().map_err(PhysicianError::ValidationError)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PhysicianError {
    #[error("Physician not found")]
    NotFound,

    #[error("Physician with email {email} already exists")]
    EmailAlreadyExists { email: String },

    #[error("Password can not be changed this way")]
    PasswordChange,

    #[error("Patient does not exist")]
    PatientNotFound,

    #[error("Patient is already adopted")]
    AlreadyAdopted,

    #[error("Patient is not adopted")]
    NotAdopted,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Failed to hash password: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Storage(#[from] SupabaseError),
}

impl From<PhysicianError> for AppError {
    fn from(err: PhysicianError) -> Self {
        match err {
            PhysicianError::NotFound | PhysicianError::PatientNotFound => AppError::NotFound(err.to_string()),
            PhysicianError::EmailAlreadyExists { .. } => AppError::Conflict(err.to_string()),
            PhysicianError::PasswordChange
            | PhysicianError::AlreadyAdopted
            | PhysicianError::NotAdopted => AppError::BadRequest(err.to_string()),
            PhysicianError::Unauthorized(msg) => AppError::Forbidden(msg),
            PhysicianError::ValidationError(msg) => AppError::ValidationError(msg),
            PhysicianError::PasswordHash(_) => AppError::Internal(err.to_string()),
            PhysicianError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}
