use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::SupabaseError;
use shared_models::auth::{Role, Specialty, User};
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Account row shared by the tables that can sign in.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub specialty: Option<Specialty>,
    pub created_at: Option<DateTime<Utc>>,
}

impl AccountRecord {
    pub fn into_user(self, role: Role) -> User {
        User {
            id: self.id,
            email: Some(self.email),
            role,
            specialty: self.specialty,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Failed to issue token: {0}")]
    TokenIssue(String),

    #[error("Failed to verify password: {0}")]
    PasswordCheck(String),

    #[error(transparent)]
    Storage(#[from] SupabaseError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Auth(err.to_string()),
            AuthError::Storage(e) => AppError::Database(e.to_string()),
            AuthError::TokenIssue(_) | AuthError::PasswordCheck(_) => AppError::Internal(err.to_string()),
        }
    }
}
