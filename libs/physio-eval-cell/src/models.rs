use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::SupabaseError;
use shared_models::auth::Specialty;
use shared_models::error::AppError;

pub const MAX_PAIN_SCALE: i32 = 10;

/// Specialties allowed to write and read physiotherapy evaluations.
pub const EVALUATING_SPECIALTIES: [Specialty; 2] = [Specialty::Physiatrist, Specialty::Physiotherapist];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysioEval {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub physician_id: Uuid,
    pub main_complaint: String,
    pub pain_scale: i32,
    pub pain_location: Option<String>,
    pub functional_limitations: Option<String>,
    pub observations: Option<String>,
    pub goals: Option<String>,
    pub treatment_plan: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePhysioEvalRequest {
    pub patient_id: Uuid,
    pub main_complaint: String,
    pub pain_scale: i32,
    pub pain_location: Option<String>,
    pub functional_limitations: Option<String>,
    pub observations: Option<String>,
    pub goals: Option<String>,
    pub treatment_plan: Option<String>,
}

impl CreatePhysioEvalRequest {
    pub fn validate(&self) -> Result<(), PhysioEvalError> {
        let mut errors = shared_utils::validation::FieldErrors::new();
        errors.check(
            !self.main_complaint.trim().is_empty(),
            "main_complaint is required",
        );
        errors.check(
            (0..=MAX_PAIN_SCALE).contains(&self.pain_scale),
            "pain_scale must be between 0 and 10",
        );
        errors.into_result().map_err(PhysioEvalError::ValidationError)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PhysioEvalError {
    #[error("Physio evaluation not found")]
    NotFound,

    #[error("Patient does not exist")]
    PatientNotFound,

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Storage(#[from] SupabaseError),
}

impl From<PhysioEvalError> for AppError {
    fn from(err: PhysioEvalError) -> Self {
        match err {
            PhysioEvalError::NotFound | PhysioEvalError::PatientNotFound => AppError::NotFound(err.to_string()),
            PhysioEvalError::ValidationError(msg) => AppError::ValidationError(msg),
            PhysioEvalError::Unauthorized(msg) => AppError::Forbidden(msg),
            PhysioEvalError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}
