//! Printable views of stored entities
//!
//! Passwords never leave the store, and reports are summarized instead of
//! dumping their encoded payloads.

use chrono::NaiveDate;
use medilink_common::{AttachmentToken, Consultation, DoctorProfile, Profile};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub index: usize,
    pub mime_type: Option<String>,
    pub encoded_bytes: usize,
}

impl ReportSummary {
    fn of(index: usize, token: &AttachmentToken) -> Self {
        Self {
            index,
            mime_type: token.mime_type().map(str::to_string),
            encoded_bytes: token.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: String,
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
    pub voice_note: Option<String>,
    pub reports: Vec<ReportSummary>,
}

impl From<&Profile> for ProfileView {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            age: p.age,
            native_state: p.native_state.clone(),
            native_city: p.native_city.clone(),
            residing_city: p.residing_city.clone(),
            national_id: p.national_id.clone(),
            dob: p.dob,
            contact_number: p.contact_number.clone(),
            mobile_number: p.mobile_number.clone(),
            emergency_mobile_number: p.emergency_mobile_number.clone(),
            blood_group: p.blood_group.clone(),
            username: p.username.clone(),
            voice_note: p.voice_note.clone(),
            reports: p
                .medical_reports
                .iter()
                .enumerate()
                .map(|(i, t)| ReportSummary::of(i, t))
                .collect(),
        }
    }
}

impl fmt::Display for ProfileView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}  {} (age {})", self.id, self.name, self.age)?;
        writeln!(f, "  National ID:  {}", self.national_id)?;
        if let Some(dob) = self.dob {
            writeln!(f, "  Born:         {}", dob)?;
        }
        writeln!(
            f,
            "  From:         {}, {}  residing in {}",
            self.native_city, self.native_state, self.residing_city
        )?;
        writeln!(
            f,
            "  Phone:        {} / {}  emergency {}",
            self.contact_number, self.mobile_number, self.emergency_mobile_number
        )?;
        writeln!(f, "  Blood group:  {}", self.blood_group)?;
        if let Some(note) = &self.voice_note {
            writeln!(f, "  Voice note:   {}", note)?;
        }
        write!(f, "  Reports:      {}", self.reports.len())?;
        for report in &self.reports {
            write!(
                f,
                "\n    [{}] {} ({} bytes encoded)",
                report.index,
                report.mime_type.as_deref().unwrap_or("unknown"),
                report.encoded_bytes
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorView {
    pub id: String,
    pub name: String,
    pub username: String,
    pub specialization: String,
    pub patients_treated: u64,
}

impl From<&DoctorProfile> for DoctorView {
    fn from(d: &DoctorProfile) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            username: d.username.clone(),
            specialization: d.specialization.clone(),
            patients_treated: d.patients_treated,
        }
    }
}

impl fmt::Display for DoctorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  {}  ({} patients treated)",
            self.id, self.name, self.specialization, self.patients_treated
        )
    }
}

/// One consultation as a text block
pub fn render_consultation(c: &Consultation) -> String {
    format!(
        "{}  {}  {} -> {} (age {})\n  Diagnosis:    {}\n  Cause:        {}\n  Prescription: {}",
        c.id,
        c.date,
        c.doctor_name,
        c.patient_name,
        c.patient_age,
        c.diagnosis,
        c.cause_of_illness,
        c.prescription
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{demo_doctor, demo_migrant};
    use medilink_common::codec;

    #[test]
    fn test_profile_view_hides_password_and_payloads() {
        let mut profile = demo_migrant();
        profile
            .medical_reports
            .push(codec::encode(b"report", "text/plain").unwrap());

        let view = ProfileView::from(&profile);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("password123"));
        assert!(!json.contains("cmVwb3J0"));
        assert_eq!(view.reports[0].mime_type.as_deref(), Some("text/plain"));

        let text = view.to_string();
        assert!(text.starts_with("MED-123456  Rajesh Kumar (age 32)"));
        assert!(text.contains("[0] text/plain"));
    }

    #[test]
    fn test_doctor_view_line() {
        let view = DoctorView::from(&demo_doctor());
        assert_eq!(
            view.to_string(),
            "DOC-999  Dr. Sarah Wilson  General Physician  (45 patients treated)"
        );
    }
}
