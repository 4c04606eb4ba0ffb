//! Demo records present on every start
//!
//! The demo migrant is skipped when its id or its username is already taken,
//! the demo doctor when its username is. Reseeding never duplicates them and
//! never creates a second account under a registered username.

use chrono::NaiveDate;
use medilink_common::{DoctorProfile, Profile, RecordStore, Result};
use tracing::{info, warn};

pub const DEMO_MIGRANT_ID: &str = "MED-123456";
pub const DEMO_MIGRANT_USERNAME: &str = "rajesh";
pub const DEMO_DOCTOR_USERNAME: &str = "doc_demo";

/// Which demo records had to be inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub migrant_added: bool,
    pub doctor_added: bool,
}

pub fn demo_migrant() -> Profile {
    Profile {
        id: DEMO_MIGRANT_ID.to_string(),
        name: "Rajesh Kumar".to_string(),
        age: 32,
        native_state: "Bihar".to_string(),
        native_city: "Patna".to_string(),
        residing_city: "Chennai".to_string(),
        national_id: "1234-5678-9012".to_string(),
        dob: NaiveDate::from_ymd_opt(1992, 5, 15),
        contact_number: "9876543210".to_string(),
        mobile_number: "9876543210".to_string(),
        emergency_mobile_number: "9123456789".to_string(),
        blood_group: "O+".to_string(),
        medical_reports: Vec::new(),
        username: DEMO_MIGRANT_USERNAME.to_string(),
        password: "password123".to_string(),
        voice_note: Some("I have recurring chest pain and slight fever for three days.".to_string()),
        revision: 0,
    }
}

pub fn demo_doctor() -> DoctorProfile {
    DoctorProfile {
        id: "DOC-999".to_string(),
        name: "Dr. Sarah Wilson".to_string(),
        username: DEMO_DOCTOR_USERNAME.to_string(),
        password: "password123".to_string(),
        specialization: "General Physician".to_string(),
        patients_treated: 45,
        revision: 0,
    }
}

/// Insert the demo migrant and doctor where missing
pub async fn ensure_demo_records(store: &RecordStore) -> Result<SeedReport> {
    let migrant_added = store
        .update(|profiles: &mut Vec<Profile>| {
            if profiles.iter().any(|p| p.id == DEMO_MIGRANT_ID) {
                return Ok(false);
            }
            if profiles.iter().any(|p| p.username == DEMO_MIGRANT_USERNAME) {
                warn!(
                    username = DEMO_MIGRANT_USERNAME,
                    "Demo migrant username already registered, not seeding"
                );
                return Ok(false);
            }
            profiles.push(demo_migrant());
            Ok(true)
        })
        .await?;

    let doctor_added = store
        .update(|doctors: &mut Vec<DoctorProfile>| {
            if doctors.iter().any(|d| d.username == DEMO_DOCTOR_USERNAME) {
                return Ok(false);
            }
            doctors.push(demo_doctor());
            Ok(true)
        })
        .await?;

    let report = SeedReport {
        migrant_added,
        doctor_added,
    };
    if report.migrant_added || report.doctor_added {
        info!(
            migrant = report.migrant_added,
            doctor = report.doctor_added,
            "Demo records seeded"
        );
    }
    Ok(report)
}
