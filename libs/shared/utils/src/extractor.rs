use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
    body::Body,
};
use tracing::debug;

use shared_models::auth::{Role, Specialty, User};
use shared_models::error::AppError;
use shared_config::AppConfig;

use crate::jwt::validate_token;

/// Pull the raw token out of an `Authorization: Bearer ...` header value.
pub fn bearer_token(header_value: Option<&str>) -> Result<&str, AppError> {
    let auth_value = header_value
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

// Validates the bearer token and stores the resulting `User` in request extensions
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str()
            .map_err(|_| AppError::Auth("Invalid authorization header format".to_string())))
        .transpose()?;

    let token = bearer_token(header_value)?;

    let user = validate_token(token, &config.jwt_secret)
        .map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

/// Role authorization: the caller's role must be one of `allowed`.
pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }

    debug!("User {} with role {} denied, requires one of {:?}", user.id, user.role, allowed);
    Err(AppError::Forbidden(format!(
        "Role {} is not allowed to perform this action",
        user.role
    )))
}

/// Specialty authorization: the caller must be a physician holding one of `allowed`.
pub fn require_specialty(user: &User, allowed: &[Specialty]) -> Result<(), AppError> {
    require_role(user, &[Role::Physician])?;

    match user.specialty {
        Some(specialty) if allowed.contains(&specialty) => Ok(()),
        _ => {
            debug!("Physician {} with specialty {:?} denied", user.id, user.specialty);
            Err(AppError::Forbidden(
                "Physician specialty is not allowed to perform this action".to_string(),
            ))
        }
    }
}
