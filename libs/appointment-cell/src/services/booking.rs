// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{Role, User};

use crate::models::{
    Appointment, AppointmentCandidate, AppointmentError, AppointmentStatus, ConflictCheckQuery,
    ConflictCheckResponse, CreateAppointmentRequest, TimeRange, UpdateAppointmentRequest,
};
use crate::services::conflict::ConflictValidator;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::SupabaseAppointmentStore;

pub struct AppointmentBookingService {
    store: Arc<SupabaseAppointmentStore>,
    validator: ConflictValidator,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let store = Arc::new(SupabaseAppointmentStore::new(supabase));
        let validator = ConflictValidator::new(store.clone());

        Self {
            store,
            validator,
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    /// Create a `REQUESTED` appointment once references and schedule are clear.
    #[instrument(skip(self, user, request), fields(user_id = %user.id))]
    pub async fn request_appointment(
        &self,
        user: &User,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let booking_for_self = (user.has_role(Role::Patient) && user.is(&request.patient_id))
            || (user.has_role(Role::Physician) && user.is(&request.physician_id));
        if !booking_for_self {
            return Err(AppointmentError::Unauthorized(
                "Not authorized to book appointment for this patient".to_string(),
            ));
        }

        Self::validate_required_text(&request.objective, "objective")?;
        Self::validate_required_text(&request.location, "location")?;

        let range = TimeRange::new(request.start_date, request.end_date)?;
        let candidate = AppointmentCandidate::new(request.patient_id, request.physician_id, range);
        self.validator.validate(&candidate).await?;

        if let Some(eval_id) = request.patient_eval_id {
            if !self.store.eval_belongs_to(eval_id, request.patient_id).await? {
                return Err(AppointmentError::ValidationError(
                    "patient_eval_id must reference an evaluation of this patient".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let appointment_data = json!({
            "patient_id": request.patient_id,
            "physician_id": request.physician_id,
            "start_date": range.start.to_rfc3339(),
            "end_date": range.end.to_rfc3339(),
            "location": request.location.trim(),
            "status": AppointmentStatus::Requested.to_string(),
            "objective": request.objective.trim(),
            "summary": request.summary,
            "patient_eval_id": request.patient_eval_id,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let appointment = self.store.insert(appointment_data).await?;
        info!(
            "Appointment {} requested for patient {} with physician {}",
            appointment.id, appointment.patient_id, appointment.physician_id
        );

        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        user: &User,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.store.get(appointment_id).await?;

        let is_participant = user.is(&appointment.patient_id) || user.is(&appointment.physician_id);
        if !is_participant && !user.is_admin() {
            return Err(AppointmentError::Unauthorized(
                "Not authorized to view this appointment".to_string(),
            ));
        }

        Ok(appointment)
    }

    /// Physician edits; moving the slot re-runs the conflict check against everything but itself.
    #[instrument(skip(self, user, request), fields(user_id = %user.id))]
    pub async fn update_appointment(
        &self,
        user: &User,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.owned_by_physician(user, appointment_id).await?;

        if !self.lifecycle_service.can_modify(current.status) {
            return Err(AppointmentError::NotModifiable);
        }

        let mut changes = Map::new();

        if request.reschedules() {
            let range = TimeRange::new(
                request.start_date.unwrap_or(current.start_date),
                request.end_date.unwrap_or(current.end_date),
            )?;
            self.validator
                .validate(&AppointmentCandidate::for_existing(&current, range))
                .await?;

            changes.insert("start_date".to_string(), json!(range.start.to_rfc3339()));
            changes.insert("end_date".to_string(), json!(range.end.to_rfc3339()));
        }

        if let Some(objective) = &request.objective {
            Self::validate_required_text(objective, "objective")?;
        }
        if let Some(location) = &request.location {
            Self::validate_required_text(location, "location")?;
        }

        let text_fields = [
            ("location", &request.location),
            ("summary", &request.summary),
            ("objective", &request.objective),
            ("diagnostic", &request.diagnostic),
            ("treatment", &request.treatment),
        ];
        for (column, value) in text_fields {
            if let Some(value) = value {
                changes.insert(column.to_string(), json!(value.trim()));
            }
        }

        if changes.is_empty() {
            debug!("No changes requested for appointment {}", appointment_id);
            return Ok(current);
        }
        changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        // Guarded by the status read above so a concurrent rejection is not overwritten
        let changes = Value::Object(changes);
        let updated = self
            .store
            .update(appointment_id, changes.clone(), Some(current.status))
            .await?;
        if let Some(appointment) = updated {
            return Ok(appointment);
        }

        let latest = self.store.get(appointment_id).await?;
        if !self.lifecycle_service.can_modify(latest.status) {
            return Err(AppointmentError::NotModifiable);
        }

        // Accepted in the meantime, which is still editable; from here only rejection can follow
        debug!(
            "Appointment {} moved from {} to {}, retrying update",
            appointment_id, current.status, latest.status
        );
        self.store
            .update(appointment_id, changes, Some(latest.status))
            .await?
            .ok_or(AppointmentError::NotModifiable)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn accept_appointment(
        &self,
        user: &User,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.owned_by_physician(user, appointment_id).await?;

        self.lifecycle_service
            .validate_status_transition(current.status, AppointmentStatus::Accepted)?;

        self.validator
            .validate(&AppointmentCandidate::for_existing(&current, current.range()))
            .await?;

        let appointment = self
            .transition(&current, AppointmentStatus::Accepted)
            .await?;
        info!("Appointment {} accepted by physician {}", appointment.id, user.id);

        Ok(appointment)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn reject_appointment(
        &self,
        user: &User,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.owned_by_physician(user, appointment_id).await?;

        self.lifecycle_service
            .validate_status_transition(current.status, AppointmentStatus::Rejected)?;

        let appointment = self
            .transition(&current, AppointmentStatus::Rejected)
            .await?;
        info!("Appointment {} rejected by physician {}", appointment.id, user.id);

        Ok(appointment)
    }

    pub async fn list_for_patient(
        &self,
        user: &User,
        patient_id: Uuid,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if user.is(&patient_id) || user.is_admin() {
            return self.store.list_for_patient(patient_id, status).await;
        }

        if user.has_role(Role::Physician) {
            let appointments = self.store.list_for_patient(patient_id, status).await?;
            return Ok(appointments
                .into_iter()
                .filter(|appointment| user.is(&appointment.physician_id))
                .collect());
        }

        Err(AppointmentError::Unauthorized(
            "Not authorized to view this patient's appointments".to_string(),
        ))
    }

    pub async fn list_for_physician(
        &self,
        user: &User,
        physician_id: Uuid,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if !user.is(&physician_id) && !user.is_admin() {
            return Err(AppointmentError::Unauthorized(
                "Not authorized to view this physician's appointments".to_string(),
            ));
        }

        self.store.list_for_physician(physician_id, status).await
    }

    /// Ad-hoc check: a blocking overlap is reported as data, reference errors still fail.
    pub async fn check_conflicts(
        &self,
        query: ConflictCheckQuery,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        let range = TimeRange::new(query.start_date, query.end_date)?;
        let mut candidate = AppointmentCandidate::new(query.patient_id, query.physician_id, range);
        if let Some(exclude_id) = query.exclude_appointment_id {
            candidate = candidate.excluding(exclude_id);
        }

        match self.validator.validate(&candidate).await {
            Ok(()) => Ok(ConflictCheckResponse { has_conflict: false }),
            Err(AppointmentError::Conflict) => Ok(ConflictCheckResponse { has_conflict: true }),
            Err(e) => Err(e),
        }
    }

    async fn owned_by_physician(
        &self,
        user: &User,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        if !user.has_role(Role::Physician) {
            return Err(AppointmentError::Unauthorized(
                "Only physicians can manage appointments".to_string(),
            ));
        }

        let appointment = self.store.get(appointment_id).await?;
        if !user.is(&appointment.physician_id) {
            return Err(AppointmentError::Unauthorized(
                "Not the physician of this appointment".to_string(),
            ));
        }

        Ok(appointment)
    }

    async fn transition(
        &self,
        current: &Appointment,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let changes = json!({
            "status": new_status.to_string(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let updated = self
            .store
            .update(current.id, changes, Some(current.status))
            .await?;

        match updated {
            Some(appointment) => Ok(appointment),
            None => {
                // Status moved under us; report against the stored state
                let latest = self.store.get(current.id).await?;
                warn!(
                    "Appointment {} changed to {} before {} could be applied",
                    current.id, latest.status, new_status
                );
                Err(AppointmentError::InvalidStatusTransition {
                    from: latest.status,
                    to: new_status,
                })
            }
        }
    }

    fn validate_required_text(value: &str, field: &str) -> Result<(), AppointmentError> {
        if value.trim().is_empty() {
            return Err(AppointmentError::ValidationError(format!("{} is required", field)));
        }
        Ok(())
    }
}
