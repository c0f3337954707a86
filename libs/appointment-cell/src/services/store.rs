// libs/appointment-cell/src/services/store.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::conflict::AppointmentDirectory;

/// PostgREST access to the `appointments` table and the party tables it references.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn row_exists(&self, table: &str, id: Uuid) -> Result<bool, AppointmentError> {
        let path = format!("/rest/v1/{}?id=eq.{}&select=id", table, id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(!rows.is_empty())
    }

    /// True when `eval_id` is a physio evaluation of `patient_id`.
    pub async fn eval_belongs_to(&self, eval_id: Uuid, patient_id: Uuid) -> Result<bool, AppointmentError> {
        let path = format!(
            "/rest/v1/physio_evals?id=eq.{}&patient_id=eq.{}&select=id",
            eval_id, patient_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(!rows.is_empty())
    }

    pub async fn insert(&self, appointment_data: Value) -> Result<Appointment, AppointmentError> {
        let rows: Vec<Appointment> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(appointment_data),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppointmentError::StorageUnavailable("Insert returned no rows".to_string()))
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;

        rows.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    /// Patch one appointment. With `expected_status` the write only applies while the
    /// row still holds that status; `None` is returned when nothing matched.
    pub async fn update(
        &self,
        appointment_id: Uuid,
        changes: Value,
        expected_status: Option<AppointmentStatus>,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let mut path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        if let Some(status) = expected_status {
            path.push_str(&format!("&status=eq.{}", status));
        }

        let rows: Vec<Appointment> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(changes),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        Ok(rows.into_iter().next())
    }

    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_by("patient_id", patient_id, status).await
    }

    pub async fn list_for_physician(
        &self,
        physician_id: Uuid,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_by("physician_id", physician_id, status).await
    }

    async fn list_by(
        &self,
        column: &str,
        id: Uuid,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut query_parts = vec![format!("{}=eq.{}", column, id)];
        if let Some(status) = status {
            query_parts.push(format!("status=eq.{}", status));
        }
        query_parts.push("order=start_date.asc".to_string());

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));
        let appointments: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(appointments)
    }
}

#[async_trait]
impl AppointmentDirectory for SupabaseAppointmentStore {
    async fn patient_exists(&self, patient_id: Uuid) -> Result<bool, AppointmentError> {
        self.row_exists("patients", patient_id).await
    }

    async fn physician_exists(&self, physician_id: Uuid) -> Result<bool, AppointmentError> {
        self.row_exists("physicians", physician_id).await
    }

    async fn accepted_appointments_for(
        &self,
        patient_id: Uuid,
        physician_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?status=eq.{}&or=(patient_id.eq.{},physician_id.eq.{})&order=start_date.asc",
            AppointmentStatus::Accepted, patient_id, physician_id
        );

        let appointments: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;
        debug!(
            "Found {} accepted appointments for patient {} or physician {}",
            appointments.len(), patient_id, physician_id
        );
        Ok(appointments)
    }
}
