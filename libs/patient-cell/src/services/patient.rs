use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::services::SupabaseAppointmentStore;
use physio_eval_cell::services::PhysioEvalService;
use shared_config::AppConfig;
use shared_database::accounts::email_owner;
use shared_database::supabase::sqlstate;
use shared_database::SupabaseClient;
use shared_utils::password::hash_password;
use shared_utils::validation::normalize_email;

use crate::models::{
    CreatePatientRequest, Patient, PatientError, PatientHistory, PatientListQuery,
    PhysicianContact, UpdatePatientRequest, PATIENT_COLUMNS,
};

const PHYSICIAN_CONTACT_COLUMNS: &str = "id,name,email,specialty,phone_number";

#[derive(Deserialize)]
struct CareLink {
    physician_id: Uuid,
}

pub struct PatientService {
    supabase: Arc<SupabaseClient>,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn register_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        debug!("Registering patient: {}", email);

        if let Some(table) = email_owner(&self.supabase, &email).await? {
            debug!("Email {} already registered in {}", email, table);
            return Err(PatientError::EmailAlreadyExists { email });
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| PatientError::PasswordHash(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let patient_data = json!({
            "email": email,
            "password_hash": password_hash,
            "name": request.name.trim(),
            "birth_date": request.birth_date.format("%Y-%m-%d").to_string(),
            "gender": request.gender,
            "phone_number": request.phone_number.split_whitespace().collect::<String>(),
            "address": request.address,
            "identification_number": request.identification_number,
            "fiscal_number": request.fiscal_number,
            "created_at": now,
            "updated_at": now
        });

        let path = format!("/rest/v1/patients?select={}", PATIENT_COLUMNS);
        let result: Result<Vec<Patient>, _> = self.supabase.request_with_headers(
            Method::POST,
            &path,
            Some(patient_data),
            Some(SupabaseClient::representation_headers()),
        ).await;

        let created = match result {
            Ok(rows) => rows,
            // Lost a race with a concurrent signup for the same email
            Err(e) if e.is_constraint(sqlstate::UNIQUE_VIOLATION) => {
                return Err(PatientError::EmailAlreadyExists { email });
            }
            Err(e) => return Err(e.into()),
        };

        let patient = created.into_iter().next().ok_or(PatientError::NotFound)?;
        info!("Patient registered with ID: {}", patient.id);

        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        debug!("Fetching patient profile: {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}&select={}", patient_id, PATIENT_COLUMNS);
        let result: Vec<Patient> = self.supabase.request(Method::GET, &path, None).await?;

        result.into_iter().next().ok_or(PatientError::NotFound)
    }

    pub async fn update_patient(
        &self,
        patient_id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        request.validate()?;
        debug!("Updating patient profile: {}", patient_id);

        let mut update_data = Map::new();

        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(gender) = request.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(birth_date) = request.birth_date {
            update_data.insert("birth_date".to_string(), json!(birth_date.format("%Y-%m-%d").to_string()));
        }
        if let Some(phone_number) = request.phone_number {
            update_data.insert(
                "phone_number".to_string(),
                json!(phone_number.split_whitespace().collect::<String>()),
            );
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(identification_number) = request.identification_number {
            update_data.insert("identification_number".to_string(), json!(identification_number));
        }
        if let Some(fiscal_number) = request.fiscal_number {
            update_data.insert("fiscal_number".to_string(), json!(fiscal_number));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/patients?id=eq.{}&select={}", patient_id, PATIENT_COLUMNS);
        let result: Vec<Patient> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(Value::Object(update_data)),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        result.into_iter().next().ok_or(PatientError::NotFound)
    }

    /// Case-insensitive substring match on the patient's name.
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Patient>, PatientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PatientError::ValidationError("name is required".to_string()));
        }

        let path = format!(
            "/rest/v1/patients?name=ilike.*{}*&select={}&order=name.asc",
            urlencoding::encode(name),
            PATIENT_COLUMNS
        );
        let patients: Vec<Patient> = self.supabase.request(Method::GET, &path, None).await?;

        debug!("Found {} patients matching '{}'", patients.len(), name);
        Ok(patients)
    }

    /// One page of patients ordered by creation date, starting after `created_after`.
    pub async fn list_patients(&self, query: &PatientListQuery) -> Result<Vec<Patient>, PatientError> {
        let mut query_parts = vec![format!("select={}", PATIENT_COLUMNS)];

        if let Some(created_after) = query.created_after {
            query_parts.push(format!(
                "created_at=gt.{}",
                urlencoding::encode(&created_after.to_rfc3339())
            ));
        }
        query_parts.push("order=created_at.asc".to_string());
        query_parts.push(format!("limit={}", query.page_size()));

        let path = format!("/rest/v1/patients?{}", query_parts.join("&"));
        let patients: Vec<Patient> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(patients)
    }

    /// Profile plus every appointment and physio evaluation, fetched concurrently.
    pub async fn get_history(&self, patient_id: Uuid) -> Result<PatientHistory, PatientError> {
        let appointment_store = SupabaseAppointmentStore::new(Arc::clone(&self.supabase));
        let physio_evals = PhysioEvalService::with_client(Arc::clone(&self.supabase));

        let (patient, appointments, evals) = futures::try_join!(
            self.get_patient(patient_id),
            async {
                appointment_store
                    .list_for_patient(patient_id, None)
                    .await
                    .map_err(PatientError::from)
            },
            async {
                physio_evals
                    .list_for_patient(patient_id)
                    .await
                    .map_err(PatientError::from)
            },
        )?;

        Ok(PatientHistory {
            patient,
            appointments,
            physio_evals: evals,
        })
    }

    pub async fn list_physicians(&self, patient_id: Uuid) -> Result<Vec<PhysicianContact>, PatientError> {
        let links_path = format!(
            "/rest/v1/patient_physicians?patient_id=eq.{}&select=physician_id",
            patient_id
        );
        let links: Vec<CareLink> = self.supabase.request(Method::GET, &links_path, None).await?;

        if links.is_empty() {
            return Ok(Vec::new());
        }

        let ids = links
            .iter()
            .map(|link| link.physician_id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/physicians?id=in.({})&select={}&order=name.asc",
            ids, PHYSICIAN_CONTACT_COLUMNS
        );
        let physicians: Vec<PhysicianContact> = self.supabase.request(Method::GET, &path, None).await?;

        if physicians.len() != links.len() {
            warn!(
                "Patient {} links {} physicians but only {} were found",
                patient_id,
                links.len(),
                physicians.len()
            );
        }

        Ok(physicians)
    }
}
