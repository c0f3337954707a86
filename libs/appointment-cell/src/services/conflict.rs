// libs/appointment-cell/src/services/conflict.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentCandidate, AppointmentError, AppointmentStatus, Party};

/// Read access the conflict validator needs from the backing store.
#[async_trait]
pub trait AppointmentDirectory: Send + Sync {
    async fn patient_exists(&self, patient_id: Uuid) -> Result<bool, AppointmentError>;

    async fn physician_exists(&self, physician_id: Uuid) -> Result<bool, AppointmentError>;

    /// Accepted appointments involving the patient or the physician.
    async fn accepted_appointments_for(
        &self,
        patient_id: Uuid,
        physician_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentError>;
}

/// First existing appointment that blocks `candidate`, if any.
///
/// Only `ACCEPTED` appointments block. Either shared party is enough, and the
/// candidate never conflicts with its own persisted row.
pub fn find_conflict<'a>(
    candidate: &AppointmentCandidate,
    existing: &'a [Appointment],
) -> Option<&'a Appointment> {
    existing.iter().find(|appointment| {
        appointment.status == AppointmentStatus::Accepted
            && candidate.appointment_id != Some(appointment.id)
            && appointment.involves(candidate.patient_id, candidate.physician_id)
            && candidate.range.overlaps(&appointment.range())
    })
}

pub struct ConflictValidator {
    directory: Arc<dyn AppointmentDirectory>,
}

impl ConflictValidator {
    pub fn new(directory: Arc<dyn AppointmentDirectory>) -> Self {
        Self { directory }
    }

    /// Check references, then scan accepted appointments for overlap.
    /// The first failing step ends validation.
    pub async fn validate(&self, candidate: &AppointmentCandidate) -> Result<(), AppointmentError> {
        debug!(
            "Validating appointment for patient {} and physician {} from {} to {}",
            candidate.patient_id, candidate.physician_id, candidate.range.start, candidate.range.end
        );

        if !self.directory.patient_exists(candidate.patient_id).await? {
            return Err(AppointmentError::ReferenceNotFound(Party::Patient));
        }

        if !self.directory.physician_exists(candidate.physician_id).await? {
            return Err(AppointmentError::ReferenceNotFound(Party::Physician));
        }

        if self.has_conflict(candidate).await? {
            return Err(AppointmentError::Conflict);
        }

        Ok(())
    }

    /// Overlap scan only, without reference checks.
    pub async fn has_conflict(&self, candidate: &AppointmentCandidate) -> Result<bool, AppointmentError> {
        let existing = self
            .directory
            .accepted_appointments_for(candidate.patient_id, candidate.physician_id)
            .await?;

        match find_conflict(candidate, &existing) {
            Some(blocking) => {
                warn!(
                    "Appointment request overlaps accepted appointment {} ({} - {})",
                    blocking.id, blocking.start_date, blocking.end_date
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
