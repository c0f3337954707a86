use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::{header::AUTHORIZATION, HeaderMap},
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::bearer_token;
use shared_utils::jwt::validate_token as decode_token;

use crate::models::{LoginRequest, LoginResponse};
use crate::services::AuthService;

pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let auth_service = AuthService::new(&config);

    let response = auth_service.login(request).await?;

    Ok(Json(response))
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let header_value = headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str()
            .map_err(|_| AppError::Auth("Invalid authorization header format".to_string())))
        .transpose()?;
    let token = bearer_token(header_value)?;

    let user = decode_token(token, &config.jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
        specialty: user.specialty,
    }))
}

/// Never fails on a bad token; reports `valid: false` instead.
pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Json<Value> {
    debug!("Verifying token");

    let valid = auth
        .map(|TypedHeader(auth)| decode_token(auth.token(), &config.jwt_secret).is_ok())
        .unwrap_or(false);

    Json(json!({ "valid": valid }))
}

pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
