use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::Role;
use shared_utils::jwt::issue_token;
use shared_utils::password::verify_password;
use shared_utils::validation::normalize_email;

use crate::models::{AccountRecord, AuthError, LoginRequest, LoginResponse};

// Tables searched in order; the first one holding the email decides the role
const ACCOUNT_TABLES: [(&str, Role); 3] = [
    ("patients", Role::Patient),
    ("physicians", Role::Physician),
    ("administrators", Role::Admin),
];

pub struct AuthService {
    supabase: Arc<SupabaseClient>,
    jwt_secret: String,
    jwt_expiry_hours: i64,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            jwt_secret: config.jwt_secret.clone(),
            jwt_expiry_hours: config.jwt_expiry_hours,
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(&request.email);
        debug!("Login attempt for {}", email);

        let (account, role) = match self.find_account(&email).await? {
            Some(found) => found,
            None => {
                warn!("Login failed: no account for {}", email);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let password_ok = verify_password(&request.password, &account.password_hash)
            .map_err(|e| AuthError::PasswordCheck(e.to_string()))?;
        if !password_ok {
            warn!("Login failed: wrong password for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        let user = account.into_user(role);
        let token = issue_token(&user, &self.jwt_secret, self.jwt_expiry_hours)
            .map_err(AuthError::TokenIssue)?;

        info!("User {} signed in as {}", user.id, role);
        Ok(LoginResponse { token, user })
    }

    async fn find_account(&self, email: &str) -> Result<Option<(AccountRecord, Role)>, AuthError> {
        for (table, role) in ACCOUNT_TABLES {
            let select = if role == Role::Physician {
                "id,email,password_hash,specialty,created_at"
            } else {
                "id,email,password_hash,created_at"
            };
            let path = format!(
                "/rest/v1/{}?email=eq.{}&select={}",
                table,
                urlencoding::encode(email),
                select
            );

            let rows: Vec<AccountRecord> = self.supabase.request(Method::GET, &path, None).await?;
            if let Some(account) = rows.into_iter().next() {
                return Ok(Some((account, role)));
            }
        }

        Ok(None)
    }
}
