//! Entity models
//!
//! Each collection is an independent top-level aggregate stored as one JSON
//! array under a well-known slot name. Field names are camelCase so slots
//! written by the browser build of MediLink+ still decode.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

use crate::codec::AttachmentToken;

/// The three persisted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Profiles,
    Doctors,
    Consultations,
}

impl Collection {
    /// Slot key the collection is stored under
    pub fn slot_key(&self) -> &'static str {
        match self {
            Collection::Profiles => "mock_migrants",
            Collection::Doctors => "mock_doctors",
            Collection::Consultations => "mock_consultations",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slot_key())
    }
}

/// An entity stored in a collection
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection this entity type lives in
    const COLLECTION: Collection;

    /// Primary identifier (unique within the collection)
    fn id(&self) -> &str;

    /// Secondary lookup key, separator-insensitive
    fn secondary_key(&self) -> Option<&str> {
        None
    }

    /// Checks applied after decoding a stored entity
    fn validate(&self) -> std::result::Result<(), String> {
        if self.id().trim().is_empty() {
            return Err("empty identifier".to_string());
        }
        Ok(())
    }
}

/// Entity mutated in place, guarded by an optimistic revision counter
pub trait Versioned: Record {
    fn revision(&self) -> u64;
    fn set_revision(&mut self, revision: u64);
}

/// Entity carrying a literal username/password pair
pub trait Credentialed {
    fn username(&self) -> &str;
    fn password(&self) -> &str;
}

/// Registered migrant/patient record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub native_state: String,
    #[serde(default)]
    pub native_city: String,
    #[serde(default)]
    pub residing_city: String,
    /// National-ID-like number; free-form, separators allowed
    #[serde(rename = "aadharNo", default)]
    pub national_id: String,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    // contact_number and mobile_number are independent fields; the data
    // carries no rule tying one to the other.
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub emergency_mobile_number: String,
    #[serde(default)]
    pub blood_group: String,
    /// Uploaded reports, display order
    #[serde(default)]
    pub medical_reports: Vec<AttachmentToken>,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Translated text of the last voice note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_note: Option<String>,
    #[serde(default)]
    pub revision: u64,
}

impl Record for Profile {
    const COLLECTION: Collection = Collection::Profiles;

    fn id(&self) -> &str {
        &self.id
    }

    fn secondary_key(&self) -> Option<&str> {
        if self.national_id.is_empty() {
            None
        } else {
            Some(&self.national_id)
        }
    }
}

impl Versioned for Profile {
    fn revision(&self) -> u64 {
        self.revision
    }

    fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }
}

impl Credentialed for Profile {
    fn username(&self) -> &str {
        &self.username
    }

    fn password(&self) -> &str {
        &self.password
    }
}

/// Registered clinician
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub specialization: String,
    /// Only ever incremented, by consultation submission
    #[serde(default)]
    pub patients_treated: u64,
    #[serde(default)]
    pub revision: u64,
}

impl Record for DoctorProfile {
    const COLLECTION: Collection = Collection::Doctors;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Versioned for DoctorProfile {
    fn revision(&self) -> u64 {
        self.revision
    }

    fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }
}

impl Credentialed for DoctorProfile {
    fn username(&self) -> &str {
        &self.username
    }

    fn password(&self) -> &str {
        &self.password
    }
}

/// Diagnosis/prescription event; append-only
///
/// Doctor and patient names and the patient's age are copies taken at
/// creation time and are never re-synced with their source records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub patient_id: String,
    pub patient_name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub patient_age: u32,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub cause_of_illness: String,
    #[serde(default)]
    pub prescription: String,
}

impl Record for Consultation {
    const COLLECTION: Collection = Collection::Consultations;

    fn id(&self) -> &str {
        &self.id
    }
}
