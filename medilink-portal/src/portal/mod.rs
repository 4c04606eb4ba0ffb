//! Portal workflows
//!
//! [`Portal`] holds the shared store handles; the role-specific operations
//! live in the `migrant`, `doctor` and `government` submodules as further
//! `impl Portal` blocks.

use chrono::NaiveDate;
use medilink_ai::InFlightRegistry;
use medilink_common::config::AdminConfig;
use medilink_common::models::Credentialed;
use medilink_common::{resolver, ProfileMutator, Record, RecordStore};
use serde::Serialize;
use std::time::Duration;

use crate::error::{PortalError, Result};

mod doctor;
mod government;
mod migrant;

pub use doctor::ConsultationReceipt;

/// Migrant registration form
#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub name: String,
    pub age: u32,
    pub native_state: String,
    pub native_city: String,
    pub residing_city: String,
    pub national_id: String,
    pub dob: Option<NaiveDate>,
    pub contact_number: String,
    pub mobile_number: String,
    pub emergency_mobile_number: String,
    pub blood_group: String,
    pub username: String,
    pub password: String,
}

/// Doctor registration form (government portal)
#[derive(Debug, Clone, Default)]
pub struct NewDoctor {
    pub name: String,
    pub username: String,
    pub password: String,
    pub specialization: String,
}

/// Consultation form filled in by a doctor
#[derive(Debug, Clone, Default)]
pub struct ConsultationForm {
    pub diagnosis: String,
    pub cause_of_illness: String,
    pub prescription: String,
    /// Defaults to today when absent
    pub date: Option<NaiveDate>,
}

/// Totals shown on the government dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub patients: usize,
    pub doctors: usize,
    pub consultations: usize,
}

/// Shared state behind every portal
#[derive(Clone)]
pub struct Portal {
    store: RecordStore,
    mutator: ProfileMutator,
    admin: AdminConfig,
    in_flight: InFlightRegistry,
    transcription_timeout: Duration,
}

impl Portal {
    pub fn new(store: RecordStore, admin: AdminConfig, transcription_timeout: Duration) -> Self {
        Self {
            mutator: ProfileMutator::new(store.clone()),
            store,
            admin,
            in_flight: InFlightRegistry::new(),
            transcription_timeout,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    async fn login_as<T>(&self, username: &str, password: &str, denied: &str) -> Result<T>
    where
        T: Record + Credentialed,
    {
        let entities = self.store.load::<T>().await?;
        match resolver::authenticate(&entities, username, password) {
            Ok(entity) => {
                tracing::info!(collection = %T::COLLECTION, id = entity.id(), "Login succeeded");
                Ok(entity.clone())
            }
            Err(_) => {
                tracing::warn!(collection = %T::COLLECTION, username, "Login rejected");
                Err(PortalError::Unauthorized(denied.to_string()))
            }
        }
    }
}

/// Blank required fields are refused before anything is written
fn require(field: &str, value: &str) -> medilink_common::Result<()> {
    if value.trim().is_empty() {
        return Err(medilink_common::Error::InvalidInput(format!(
            "{} is required",
            field
        )));
    }
    Ok(())
}

/// Usernames are unique within a collection
fn ensure_username_free<T: Credentialed>(
    entities: &[T],
    username: &str,
) -> medilink_common::Result<()> {
    if entities.iter().any(|e| e.username() == username) {
        return Err(medilink_common::Error::InvalidInput(format!(
            "username '{}' is already registered",
            username
        )));
    }
    Ok(())
}
