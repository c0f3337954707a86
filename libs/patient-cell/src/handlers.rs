use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{
    CreatePatientRequest, Patient, PatientError, PatientHistory, PatientListQuery,
    PatientSearchQuery, ProfileImage, ProfileImageUpload, UpdatePatientRequest,
};
use crate::services::{AvatarService, PatientService};

fn caller_id(user: &User) -> Result<Uuid, AppError> {
    user.uuid()
        .ok_or_else(|| PatientError::Unauthorized("Invalid user id".to_string()).into())
}

#[axum::debug_handler]
pub async fn register_patient(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Patient>), AppError> {
    let service = PatientService::new(&config);
    let patient = service.register_patient(request).await?;

    Ok((StatusCode::CREATED, Json(patient)))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Patient>, AppError> {
    require_role(&user, &[Role::Patient])?;

    let service = PatientService::new(&config);
    let patient = service.get_patient(caller_id(&user)?).await?;

    Ok(Json(patient))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Patient>, AppError> {
    require_role(&user, &[Role::Patient])?;

    let service = PatientService::new(&config);
    let patient = service.update_patient(caller_id(&user)?, request).await?;

    Ok(Json(patient))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Physician])?;

    let service = PatientService::new(&config);
    let patients = service.search_by_name(&query.name).await?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn get_patient_info(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Patient>, AppError> {
    require_role(&user, &[Role::Physician])?;

    let service = PatientService::new(&config);
    let patient = service.get_patient(patient_id).await?;

    Ok(Json(patient))
}

#[axum::debug_handler]
pub async fn get_patient_history(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<PatientHistory>, AppError> {
    let own_history = user.has_role(Role::Patient) && user.is(&patient_id);
    if !own_history {
        require_role(&user, &[Role::Physician])?;
    }

    let service = PatientService::new(&config);
    let history = service.get_history(patient_id).await?;

    Ok(Json(history))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Physician, Role::Patient])?;

    let service = PatientService::new(&config);
    let patients = service.list_patients(&query).await?;

    // Clients pass the last created_at back to fetch the next page
    let next_cursor = patients.last().map(|patient| patient.created_at);

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len(),
        "next_created_after": next_cursor
    })))
}

#[axum::debug_handler]
pub async fn list_my_physicians(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Patient])?;

    let service = PatientService::new(&config);
    let physicians = service.list_physicians(caller_id(&user)?).await?;

    Ok(Json(json!({
        "physicians": physicians,
        "total": physicians.len()
    })))
}

#[axum::debug_handler]
pub async fn upload_profile_image(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<ProfileImageUpload>,
) -> Result<(StatusCode, Json<ProfileImage>), AppError> {
    require_role(&user, &[Role::Physician, Role::Patient])?;

    let patient_id = if user.has_role(Role::Patient) {
        let own_id = caller_id(&user)?;
        if request.patient_id.is_some_and(|id| id != own_id) {
            return Err(PatientError::Unauthorized(
                "Patients can only change their own profile image".to_string(),
            ).into());
        }
        own_id
    } else {
        request.patient_id.ok_or_else(|| {
            PatientError::ValidationError("patient_id is required".to_string())
        })?
    };

    let service = AvatarService::new(&config);
    let image = service.upload(patient_id, &request.image).await?;

    Ok((StatusCode::CREATED, Json(image)))
}

#[axum::debug_handler]
pub async fn get_profile_image(
    State(config): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
) -> Result<([(header::HeaderName, String); 1], Vec<u8>), AppError> {
    let service = AvatarService::new(&config);
    let image = service.download(patient_id).await?;

    let content_type = image
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], image.bytes))
}
