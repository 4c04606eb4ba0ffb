//! Doctor portal: patient search and consultations

use medilink_common::codec::DecodedAttachment;
use medilink_common::ids::CONSULTATION_IDS;
use medilink_common::{resolver, time, Consultation, DoctorProfile, Profile};
use tracing::{info, warn};

use super::migrant::{history_for, open_attachment};
use super::{ConsultationForm, Portal};
use crate::error::Result;

/// A stored consultation and the doctor record after the count update
#[derive(Debug, Clone)]
pub struct ConsultationReceipt {
    pub consultation: Consultation,
    pub doctor: DoctorProfile,
}

impl Portal {
    pub async fn login_doctor(&self, username: &str, password: &str) -> Result<DoctorProfile> {
        self.login_as(username, password, "Invalid Doctor Credentials.")
            .await
    }

    /// Find a patient by `MED-` id or national ID; blank queries find nothing
    pub async fn search_patient(&self, query: &str) -> Result<Option<Profile>> {
        let profiles = self.store.load::<Profile>().await?;
        Ok(resolver::resolve(&profiles, query)?.cloned())
    }

    /// Record a consultation, then count the patient for the doctor
    ///
    /// The consultation is saved before the doctor's count is bumped; if the
    /// second write fails the consultation stays recorded and the count is
    /// one short.
    pub async fn submit_consultation(
        &self,
        doctor: &DoctorProfile,
        patient: &Profile,
        form: ConsultationForm,
    ) -> Result<ConsultationReceipt> {
        let date = form.date.unwrap_or_else(time::today);
        let consultation = self
            .store
            .update(|consultations: &mut Vec<Consultation>| {
                let id = CONSULTATION_IDS.generate(consultations.iter().map(|c| c.id.as_str()))?;
                let consultation = Consultation {
                    id,
                    doctor_id: doctor.id.clone(),
                    doctor_name: doctor.name.clone(),
                    patient_id: patient.id.clone(),
                    patient_name: patient.name.clone(),
                    date,
                    patient_age: patient.age,
                    diagnosis: form.diagnosis,
                    cause_of_illness: form.cause_of_illness,
                    prescription: form.prescription,
                };
                consultations.push(consultation.clone());
                Ok(consultation)
            })
            .await?;
        info!(
            id = %consultation.id,
            doctor = %doctor.id,
            patient = %patient.id,
            "Consultation recorded"
        );

        let doctor = match self.mutator.increment_treated_count(doctor).await {
            Ok(doctor) => doctor,
            Err(e) => {
                warn!(
                    id = %consultation.id,
                    doctor = %doctor.id,
                    error = %e,
                    "Consultation stored but treated count not updated"
                );
                return Err(e.into());
            }
        };

        Ok(ConsultationReceipt {
            consultation,
            doctor,
        })
    }

    /// Decode a report from a patient found through search
    pub fn open_patient_report(&self, patient: &Profile, index: usize) -> Result<DecodedAttachment> {
        open_attachment(patient, index)
    }

    /// Consultation history of a patient found through search
    pub async fn patient_history(&self, patient: &Profile) -> Result<Vec<Consultation>> {
        history_for(&self.store, &patient.id).await
    }
}
