use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use patient_cell::models::{Patient, PATIENT_COLUMNS};
use shared_config::AppConfig;
use shared_database::supabase::sqlstate;
use shared_database::SupabaseClient;

use crate::models::PhysicianError;

#[derive(Deserialize)]
struct CareLink {
    patient_id: Uuid,
}

/// Care relationships between physicians and patients, one row per pair in
/// `patient_physicians`.
pub struct AdoptionService {
    supabase: Arc<SupabaseClient>,
}

impl AdoptionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn adopt(&self, physician_id: Uuid, patient_id: Uuid) -> Result<(), PhysicianError> {
        let patient_path = format!("/rest/v1/patients?id=eq.{}&select=id", patient_id);
        let patients: Vec<Value> = self.supabase.request(Method::GET, &patient_path, None).await?;
        if patients.is_empty() {
            return Err(PhysicianError::PatientNotFound);
        }

        let link = json!({
            "physician_id": physician_id,
            "patient_id": patient_id,
            "created_at": Utc::now().to_rfc3339()
        });

        let result: Result<Vec<Value>, _> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/patient_physicians",
            Some(link),
            Some(SupabaseClient::representation_headers()),
        ).await;

        match result {
            Ok(_) => {
                info!("Physician {} adopted patient {}", physician_id, patient_id);
                Ok(())
            }
            Err(e) if e.is_constraint(sqlstate::UNIQUE_VIOLATION) => Err(PhysicianError::AlreadyAdopted),
            // Patient removed between the lookup and the insert
            Err(e) if e.is_constraint(sqlstate::FOREIGN_KEY_VIOLATION) => Err(PhysicianError::PatientNotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn drop_patient(&self, physician_id: Uuid, patient_id: Uuid) -> Result<(), PhysicianError> {
        let path = format!(
            "/rest/v1/patient_physicians?physician_id=eq.{}&patient_id=eq.{}",
            physician_id, patient_id
        );
        let removed: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            None,
            Some(SupabaseClient::representation_headers()),
        ).await?;

        if removed.is_empty() {
            return Err(PhysicianError::NotAdopted);
        }

        info!("Physician {} dropped patient {}", physician_id, patient_id);
        Ok(())
    }

    pub async fn list_patients(&self, physician_id: Uuid) -> Result<Vec<Patient>, PhysicianError> {
        let links_path = format!(
            "/rest/v1/patient_physicians?physician_id=eq.{}&select=patient_id",
            physician_id
        );
        let links: Vec<CareLink> = self.supabase.request(Method::GET, &links_path, None).await?;

        if links.is_empty() {
            return Ok(Vec::new());
        }

        let ids = links
            .iter()
            .map(|link| link.patient_id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/patients?id=in.({})&select={}&order=name.asc",
            ids, PATIENT_COLUMNS
        );
        let patients: Vec<Patient> = self.supabase.request(Method::GET, &path, None).await?;

        if patients.len() != links.len() {
            warn!(
                "Physician {} links {} patients but only {} were found",
                physician_id,
                links.len(),
                patients.len()
            );
        }

        Ok(patients)
    }
}
