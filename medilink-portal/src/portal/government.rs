//! Government portal: dashboard totals and doctor registration

use medilink_common::ids::DOCTOR_IDS;
use medilink_common::{Consultation, DoctorProfile, Profile};
use tracing::{info, warn};

use super::{ensure_username_free, require, DashboardStats, NewDoctor, Portal};
use crate::error::{PortalError, Result};

impl Portal {
    /// Check the configured admin credentials
    pub fn login_admin(&self, username: &str, password: &str) -> Result<()> {
        if username == self.admin.username && password == self.admin.password {
            info!("Government admin logged in");
            Ok(())
        } else {
            warn!(username, "Government login rejected");
            Err(PortalError::Unauthorized("Invalid Admin Credentials.".to_string()))
        }
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        Ok(DashboardStats {
            patients: self.store.count::<Profile>().await?,
            doctors: self.store.count::<DoctorProfile>().await?,
            consultations: self.store.count::<Consultation>().await?,
        })
    }

    pub async fn list_patients(&self) -> Result<Vec<Profile>> {
        Ok(self.store.load::<Profile>().await?)
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorProfile>> {
        Ok(self.store.load::<DoctorProfile>().await?)
    }

    /// Register a doctor with a fresh `DOC-` id and no treated patients
    pub async fn register_doctor(&self, form: NewDoctor) -> Result<DoctorProfile> {
        require("name", &form.name)?;
        require("username", &form.username)?;
        require("password", &form.password)?;

        let doctor = self
            .store
            .insert_with(|doctors: &[DoctorProfile]| {
                ensure_username_free(doctors, &form.username)?;
                let id = DOCTOR_IDS.generate(doctors.iter().map(|d| d.id.as_str()))?;

                Ok(DoctorProfile {
                    id,
                    name: form.name.trim().to_string(),
                    username: form.username,
                    password: form.password,
                    specialization: form.specialization,
                    patients_treated: 0,
                    revision: 0,
                })
            })
            .await?;
        info!(id = %doctor.id, "Doctor registered");
        Ok(doctor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medilink_common::config::AdminConfig;
    use medilink_common::RecordStore;
    use std::time::Duration;

    fn portal() -> Portal {
        Portal::new(
            RecordStore::in_memory(),
            AdminConfig::default(),
            Duration::from_secs(5),
        )
    }

    fn new_doctor(username: &str) -> NewDoctor {
        NewDoctor {
            name: "Dr. Meera Nair".to_string(),
            username: username.to_string(),
            password: "clinic".to_string(),
            specialization: "Pulmonologist".to_string(),
        }
    }

    #[test]
    fn test_admin_login_uses_configured_credentials() {
        let portal = Portal::new(
            RecordStore::in_memory(),
            AdminConfig {
                username: "state_admin".to_string(),
                password: "s3cret".to_string(),
            },
            Duration::from_secs(5),
        );

        assert!(portal.login_admin("state_admin", "s3cret").is_ok());
        assert!(matches!(
            portal.login_admin("gov_admin", "admin_password"),
            Err(PortalError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_register_doctor_then_login() {
        let portal = portal();
        let doctor = portal.register_doctor(new_doctor("meera")).await.unwrap();

        assert!(doctor.id.starts_with("DOC-"));
        assert_eq!(doctor.patients_treated, 0);
        assert_eq!(portal.login_doctor("meera", "clinic").await.unwrap(), doctor);
        assert!(portal.register_doctor(new_doctor("meera")).await.is_err());
    }

    #[tokio::test]
    async fn test_stats_count_each_collection() {
        let portal = portal();
        assert_eq!(
            portal.stats().await.unwrap(),
            DashboardStats {
                patients: 0,
                doctors: 0,
                consultations: 0
            }
        );

        portal.register_doctor(new_doctor("a")).await.unwrap();
        portal.register_doctor(new_doctor("b")).await.unwrap();

        let stats = portal.stats().await.unwrap();
        assert_eq!(stats.doctors, 2);
        assert_eq!(portal.list_doctors().await.unwrap().len(), 2);
        assert!(portal.list_patients().await.unwrap().is_empty());
    }
}
