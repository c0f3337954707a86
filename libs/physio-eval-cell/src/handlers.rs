use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_specialty;

use crate::models::{CreatePhysioEvalRequest, PhysioEval, EVALUATING_SPECIALTIES};
use crate::services::PhysioEvalService;

#[axum::debug_handler]
pub async fn create_physio_eval(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePhysioEvalRequest>,
) -> Result<(StatusCode, Json<PhysioEval>), AppError> {
    require_specialty(&user, &EVALUATING_SPECIALTIES)?;

    let service = PhysioEvalService::new(&config);
    let eval = service.create_eval(&user, request).await?;

    Ok((StatusCode::CREATED, Json(eval)))
}

#[axum::debug_handler]
pub async fn list_patient_evals(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_specialty(&user, &EVALUATING_SPECIALTIES)?;

    let service = PhysioEvalService::new(&config);
    let evals = service.list_for_patient(patient_id).await?;

    Ok(Json(json!({
        "physio_evals": evals,
        "total": evals.len()
    })))
}

#[axum::debug_handler]
pub async fn get_physio_eval(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(eval_id): Path<Uuid>,
) -> Result<Json<PhysioEval>, AppError> {
    let service = PhysioEvalService::new(&config);
    let eval = service.get_eval(&user, eval_id).await?;

    Ok(Json(eval))
}
