use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{CreatePhysicianRequest, Physician, PhysicianError, UpdatePhysicianRequest};
use crate::services::{AdoptionService, PhysicianService};

fn caller_physician_id(user: &User) -> Result<Uuid, AppError> {
    require_role(user, &[Role::Physician])?;
    user.uuid()
        .ok_or_else(|| PhysicianError::Unauthorized("Invalid user id".to_string()).into())
}

#[axum::debug_handler]
pub async fn register_physician(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<CreatePhysicianRequest>,
) -> Result<(StatusCode, Json<Physician>), AppError> {
    let service = PhysicianService::new(&config);
    let physician = service.register_physician(request).await?;

    Ok((StatusCode::CREATED, Json(physician)))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Physician>, AppError> {
    let physician_id = caller_physician_id(&user)?;

    let service = PhysicianService::new(&config);
    let physician = service.get_physician(physician_id).await?;

    Ok(Json(physician))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdatePhysicianRequest>,
) -> Result<Json<Physician>, AppError> {
    let physician_id = caller_physician_id(&user)?;

    let service = PhysicianService::new(&config);
    let physician = service.update_physician(physician_id, request).await?;

    Ok(Json(physician))
}

#[axum::debug_handler]
pub async fn adopt_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let physician_id = caller_physician_id(&user)?;

    let service = AdoptionService::new(&config);
    service.adopt(physician_id, patient_id).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Patient adopted",
        "patient_id": patient_id
    }))))
}

#[axum::debug_handler]
pub async fn drop_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let physician_id = caller_physician_id(&user)?;

    let service = AdoptionService::new(&config);
    service.drop_patient(physician_id, patient_id).await?;

    Ok(Json(json!({
        "message": "Patient dropped",
        "patient_id": patient_id
    })))
}

#[axum::debug_handler]
pub async fn list_my_patients(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let physician_id = caller_physician_id(&user)?;

    let service = AdoptionService::new(&config);
    let patients = service.list_patients(physician_id).await?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}
