use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::accounts::email_owner;
use shared_database::supabase::sqlstate;
use shared_database::SupabaseClient;
use shared_utils::password::hash_password;
use shared_utils::validation::normalize_email;

use crate::models::{CreatePhysicianRequest, Physician, PhysicianError, UpdatePhysicianRequest, PHYSICIAN_COLUMNS};

pub struct PhysicianService {
    supabase: Arc<SupabaseClient>,
}

impl PhysicianService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn register_physician(&self, request: CreatePhysicianRequest) -> Result<Physician, PhysicianError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        debug!("Registering physician: {}", email);

        if let Some(table) = email_owner(&self.supabase, &email).await? {
            debug!("Email {} already registered in {}", email, table);
            return Err(PhysicianError::EmailAlreadyExists { email });
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| PhysicianError::PasswordHash(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let physician_data = json!({
            "email": email,
            "password_hash": password_hash,
            "name": request.name.trim(),
            "phone_number": request.phone_number.split_whitespace().collect::<String>(),
            "specialty": request.specialty,
            "license_number": request.license_number.as_deref().map(str::trim),
            "created_at": now,
            "updated_at": now
        });

        let path = format!("/rest/v1/physicians?select={}", PHYSICIAN_COLUMNS);
        let result: Result<Vec<Physician>, _> = self.supabase.request_with_headers(
            Method::POST,
            &path,
            Some(physician_data),
            Some(SupabaseClient::representation_headers()),
        ).await;

        let created = match result {
            Ok(rows) => rows,
            Err(e) if e.is_constraint(sqlstate::UNIQUE_VIOLATION) => {
                return Err(PhysicianError::EmailAlreadyExists { email });
            }
            Err(e) => return Err(e.into()),
        };

        let physician = created.into_iter().next().ok_or(PhysicianError::NotFound)?;
        info!("Physician registered with ID: {} ({})", physician.id, physician.specialty);

        Ok(physician)
    }

    pub async fn get_physician(&self, physician_id: Uuid) -> Result<Physician, PhysicianError> {
        let path = format!("/rest/v1/physicians?id=eq.{}&select={}", physician_id, PHYSICIAN_COLUMNS);
        let result: Vec<Physician> = self.supabase.request(Method::GET, &path, None).await?;

        result.into_iter().next().ok_or(PhysicianError::NotFound)
    }

    pub async fn update_physician(
        &self,
        physician_id: Uuid,
        request: UpdatePhysicianRequest,
    ) -> Result<Physician, PhysicianError> {
        request.validate()?;
        debug!("Updating physician profile: {}", physician_id);

        let mut update_data = Map::new();

        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(phone_number) = request.phone_number {
            update_data.insert(
                "phone_number".to_string(),
                json!(phone_number.split_whitespace().collect::<String>()),
            );
        }
        if let Some(license_number) = request.license_number {
            update_data.insert("license_number".to_string(), json!(license_number.trim()));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/physicians?id=eq.{}&select={}", physician_id, PHYSICIAN_COLUMNS);
        let result: Vec<Physician> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(Value::Object(update_data)),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        result.into_iter().next().ok_or(PhysicianError::NotFound)
    }
}
