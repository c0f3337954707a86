use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{Role, User};

use crate::models::{CreatePhysioEvalRequest, PhysioEval, PhysioEvalError, EVALUATING_SPECIALTIES};

pub struct PhysioEvalService {
    supabase: Arc<SupabaseClient>,
}

impl PhysioEvalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Record an evaluation authored by `physician`.
    pub async fn create_eval(
        &self,
        physician: &User,
        request: CreatePhysioEvalRequest,
    ) -> Result<PhysioEval, PhysioEvalError> {
        request.validate()?;

        let physician_id = physician
            .uuid()
            .ok_or_else(|| PhysioEvalError::Unauthorized("Invalid physician id".to_string()))?;

        let patient_path = format!("/rest/v1/patients?id=eq.{}&select=id", request.patient_id);
        let patients: Vec<Value> = self.supabase.request(Method::GET, &patient_path, None).await?;
        if patients.is_empty() {
            return Err(PhysioEvalError::PatientNotFound);
        }

        let eval_data = json!({
            "patient_id": request.patient_id,
            "physician_id": physician_id,
            "main_complaint": request.main_complaint.trim(),
            "pain_scale": request.pain_scale,
            "pain_location": request.pain_location,
            "functional_limitations": request.functional_limitations,
            "observations": request.observations,
            "goals": request.goals,
            "treatment_plan": request.treatment_plan,
            "created_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<PhysioEval> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/physio_evals",
            Some(eval_data),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let eval = result.into_iter().next().ok_or(PhysioEvalError::NotFound)?;
        info!("Physio evaluation {} recorded for patient {}", eval.id, eval.patient_id);

        Ok(eval)
    }

    /// Newest first.
    pub async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<PhysioEval>, PhysioEvalError> {
        debug!("Listing physio evaluations for patient {}", patient_id);

        let path = format!(
            "/rest/v1/physio_evals?patient_id=eq.{}&order=created_at.desc",
            patient_id
        );
        let evals: Vec<PhysioEval> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(evals)
    }

    pub async fn get_eval(&self, user: &User, eval_id: Uuid) -> Result<PhysioEval, PhysioEvalError> {
        let path = format!("/rest/v1/physio_evals?id=eq.{}", eval_id);
        let result: Vec<PhysioEval> = self.supabase.request(Method::GET, &path, None).await?;
        let eval = result.into_iter().next().ok_or(PhysioEvalError::NotFound)?;

        let is_specialist = user.has_role(Role::Physician)
            && user.specialty.map_or(false, |s| EVALUATING_SPECIALTIES.contains(&s));
        let is_evaluated_patient = user.has_role(Role::Patient) && user.is(&eval.patient_id);

        if !is_specialist && !is_evaluated_patient {
            return Err(PhysioEvalError::Unauthorized(
                "Not authorized to view this evaluation".to_string(),
            ));
        }

        Ok(eval)
    }
}
