use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, Specialty, User};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Point the database client at a mock server.
    pub fn with_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            jwt_expiry_hours: 24,
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub specialty: Option<Specialty>,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", Role::Patient, None)
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role, specialty: Option<Specialty>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
            specialty,
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::Patient, None)
    }

    pub fn physician(email: &str) -> Self {
        Self::new(email, Role::Physician, Some(Specialty::Physiotherapist))
    }

    pub fn physician_with(email: &str, specialty: Specialty) -> Self {
        Self::new(email, Role::Physician, Some(specialty))
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin, None)
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).unwrap()
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: self.role,
            specialty: self.specialty,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    fn sign_payload(payload: Value, secret: &str) -> String {
        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        Self::sign_payload(json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "specialty": user.specialty,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        }), secret)
    }

    pub fn create_roleless_token(user: &TestUser, secret: &str) -> String {
        let now = Utc::now();
        Self::sign_payload(json!({
            "sub": user.id,
            "email": user.email,
            "iat": now.timestamp(),
            "exp": (now + Duration::hours(1)).timestamp()
        }), secret)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(user: &TestUser, config: &TestConfig) -> String {
        format!("Bearer {}", Self::create_test_token(user, &config.jwt_secret, Some(1)))
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn patient_response(patient_id: &str, email: &str, name: &str) -> Value {
        json!({
            "id": patient_id,
            "name": name,
            "email": email,
            "gender": "F",
            "birth_date": "1995-12-15",
            "phone_number": "912345678",
            "address": "Rua das Flores 7, Porto",
            "identification_number": "12345678",
            "fiscal_number": "234567890",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn physician_response(physician_id: &str, email: &str, name: &str, specialty: &str) -> Value {
        json!({
            "id": physician_id,
            "name": name,
            "email": email,
            "specialty": specialty,
            "license_number": "OF-12345",
            "phone_number": "936123456",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        appointment_id: &str,
        patient_id: &str,
        physician_id: &str,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        status: &str,
    ) -> Value {
        json!({
            "id": appointment_id,
            "patient_id": patient_id,
            "physician_id": physician_id,
            "start_date": start_date.to_rfc3339(),
            "end_date": end_date.to_rfc3339(),
            "location": "Sala 2",
            "status": status,
            "summary": null,
            "objective": "Reabilitação do joelho",
            "diagnostic": null,
            "treatment": null,
            "patient_eval_id": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn physio_eval_response(eval_id: &str, patient_id: &str, physician_id: &str) -> Value {
        json!({
            "id": eval_id,
            "patient_id": patient_id,
            "physician_id": physician_id,
            "main_complaint": "Dor lombar",
            "pain_scale": 6,
            "pain_location": "Lombar",
            "functional_limitations": null,
            "observations": null,
            "goals": "Retomar corrida",
            "treatment_plan": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    /// PostgREST body for an integrity constraint failure.
    pub fn constraint_error(code: &str, message: &str) -> Value {
        json!({
            "code": code,
            "details": null,
            "hint": null,
            "message": message
        })
    }
}
