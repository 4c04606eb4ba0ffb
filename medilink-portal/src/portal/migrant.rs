//! Migrant portal: registration, reports, voice notes, history

use medilink_ai::{Transcript, TranscriptionError, TranscriptionGateway, VoiceNoteCapture};
use medilink_common::codec::{self, DecodedAttachment};
use medilink_common::ids::PATIENT_IDS;
use medilink_common::{Consultation, Error, Profile, RecordStore};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{ensure_username_free, require, NewProfile, Portal};
use crate::error::Result;

impl Portal {
    /// Create a profile with a fresh `MED-` id and no reports
    pub async fn register_migrant(&self, form: NewProfile) -> Result<Profile> {
        require("name", &form.name)?;
        require("username", &form.username)?;
        require("password", &form.password)?;

        let profile = self
            .store
            .insert_with(|profiles: &[Profile]| {
                ensure_username_free(profiles, &form.username)?;
                let id = PATIENT_IDS.generate(profiles.iter().map(|p| p.id.as_str()))?;

                Ok(Profile {
                    id,
                    name: form.name.trim().to_string(),
                    age: form.age,
                    native_state: form.native_state,
                    native_city: form.native_city,
                    residing_city: form.residing_city,
                    national_id: form.national_id.trim().to_string(),
                    dob: form.dob,
                    contact_number: form.contact_number,
                    mobile_number: form.mobile_number,
                    emergency_mobile_number: form.emergency_mobile_number,
                    blood_group: form.blood_group,
                    medical_reports: Vec::new(),
                    username: form.username,
                    password: form.password,
                    voice_note: None,
                    revision: 0,
                })
            })
            .await?;
        info!(id = %profile.id, "Migrant registered");
        Ok(profile)
    }

    pub async fn login_migrant(&self, username: &str, password: &str) -> Result<Profile> {
        self.login_as(username, password, "Account not found or password incorrect.")
            .await
    }

    /// Append an uploaded file; the MIME type is sniffed when not given
    pub async fn upload_report(
        &self,
        profile: &Profile,
        bytes: &[u8],
        mime_type: Option<&str>,
    ) -> Result<Profile> {
        let mime_type = mime_type.unwrap_or_else(|| codec::detect_mime(bytes));
        Ok(self.mutator.attach_upload(profile, bytes, mime_type).await?)
    }

    pub async fn remove_report(&self, profile: &Profile, index: usize) -> Result<Profile> {
        Ok(self.mutator.remove_attachment(profile, index).await?)
    }

    /// Decode one of the profile's reports for export
    pub fn open_report(&self, profile: &Profile, index: usize) -> Result<DecodedAttachment> {
        open_attachment(profile, index)
    }

    /// Transcribe a recorded clip and store it as the profile's voice note
    ///
    /// A failed or cancelled transcription leaves the stored profile as it
    /// was. Only one transcription per profile may be outstanding.
    pub async fn record_voice_note(
        &self,
        profile: &Profile,
        audio: Vec<u8>,
        mime_type: &str,
        gateway: &dyn TranscriptionGateway,
        cancel: CancellationToken,
    ) -> Result<(Profile, Transcript)> {
        let _guard = self.in_flight.acquire(&profile.id)?;
        if cancel.is_cancelled() {
            return Err(TranscriptionError::Cancelled.into());
        }

        let mut capture = VoiceNoteCapture::with_cancel_token(self.transcription_timeout, cancel);
        capture.start_recording()?;
        let clip = capture.stop_recording(audio, mime_type)?;
        let transcript = capture.transcribe(gateway, &clip).await?;

        let updated = self
            .mutator
            .set_voice_note(profile, transcript.as_note())
            .await?;
        Ok((updated, transcript))
    }

    /// Consultations recorded for this profile, in stored order
    pub async fn consultation_history(&self, profile: &Profile) -> Result<Vec<Consultation>> {
        history_for(&self.store, &profile.id).await
    }
}

pub(super) fn open_attachment(profile: &Profile, index: usize) -> Result<DecodedAttachment> {
    let token = profile.medical_reports.get(index).ok_or_else(|| {
        Error::InvalidInput(format!(
            "report index {} out of range ({} reports)",
            index,
            profile.medical_reports.len()
        ))
    })?;
    Ok(codec::decode(token)?)
}

pub(super) async fn history_for(store: &RecordStore, patient_id: &str) -> Result<Vec<Consultation>> {
    let consultations = store.load::<Consultation>().await?;
    Ok(consultations
        .into_iter()
        .filter(|c| c.patient_id == patient_id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medilink_ai::AudioClip;
    use medilink_common::config::AdminConfig;
    use medilink_common::MAX_ATTACHMENT_BYTES;
    use std::time::Duration;

    use crate::PortalError;

    struct EchoGateway(&'static str);

    #[async_trait]
    impl TranscriptionGateway for EchoGateway {
        fn source_id(&self) -> &'static str {
            "Echo"
        }

        async fn transcribe(&self, _clip: &AudioClip) -> medilink_ai::error::Result<Transcript> {
            Ok(Transcript::from_service_text(self.0).unwrap())
        }
    }

    struct DownGateway;

    #[async_trait]
    impl TranscriptionGateway for DownGateway {
        fn source_id(&self) -> &'static str {
            "Down"
        }

        async fn transcribe(&self, _clip: &AudioClip) -> medilink_ai::error::Result<Transcript> {
            Err(TranscriptionError::Network("connection refused".to_string()))
        }
    }

    fn portal() -> Portal {
        Portal::new(
            RecordStore::in_memory(),
            AdminConfig::default(),
            Duration::from_secs(5),
        )
    }

    fn form(username: &str) -> NewProfile {
        NewProfile {
            name: "Anita Devi".to_string(),
            age: 28,
            national_id: "5555 6666 7777".to_string(),
            username: username.to_string(),
            password: "secret".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_assigns_patient_id() {
        let portal = portal();
        let profile = portal.register_migrant(form("anita")).await.unwrap();

        assert!(profile.id.starts_with("MED-"));
        assert!(profile.medical_reports.is_empty());
        assert_eq!(portal.store().count::<Profile>().await.unwrap(), 1);

        let logged_in = portal.login_migrant("anita", "secret").await.unwrap();
        assert_eq!(logged_in, profile);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username_and_blank_fields() {
        let portal = portal();
        portal.register_migrant(form("anita")).await.unwrap();

        let duplicate = portal.register_migrant(form("anita")).await;
        assert!(matches!(duplicate, Err(PortalError::Store(Error::InvalidInput(_)))));

        let mut blank = form("other");
        blank.password = "  ".to_string();
        assert!(portal.register_migrant(blank).await.is_err());
        assert_eq!(portal.store().count::<Profile>().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let portal = portal();
        portal.register_migrant(form("anita")).await.unwrap();

        let result = portal.login_migrant("anita", "Secret").await;
        assert!(matches!(result, Err(PortalError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_upload_sniffs_mime_and_opens_back() {
        let portal = portal();
        let profile = portal.register_migrant(form("anita")).await.unwrap();

        let pdf = b"%PDF-1.4\n1 0 obj\n".to_vec();
        let profile = portal.upload_report(&profile, &pdf, None).await.unwrap();
        assert_eq!(profile.medical_reports[0].mime_type(), Some("application/pdf"));

        let opened = portal.open_report(&profile, 0).unwrap();
        assert_eq!(opened.bytes, pdf);
        assert_eq!(opened.extension(), "pdf");

        assert!(portal.open_report(&profile, 1).is_err());
    }

    #[tokio::test]
    async fn test_oversize_upload_is_refused() {
        let portal = portal();
        let profile = portal.register_migrant(form("anita")).await.unwrap();

        let big = vec![0u8; MAX_ATTACHMENT_BYTES + 1];
        let result = portal.upload_report(&profile, &big, Some("image/png")).await;
        assert!(matches!(
            result,
            Err(PortalError::Store(Error::OversizeInput { .. }))
        ));
    }

    #[tokio::test]
    async fn test_voice_note_stored_on_success() {
        let portal = portal();
        let profile = portal.register_migrant(form("anita")).await.unwrap();

        let (updated, transcript) = portal
            .record_voice_note(
                &profile,
                vec![1, 2, 3],
                "audio/wav",
                &EchoGateway("Headache since morning."),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(transcript, Transcript::Text("Headache since morning.".to_string()));
        assert_eq!(updated.voice_note.as_deref(), Some("Headache since morning."));
        assert!(!portal.in_flight().is_active(&profile.id));
    }

    #[tokio::test]
    async fn test_no_speech_is_stored_as_sentinel() {
        let portal = portal();
        let profile = portal.register_migrant(form("anita")).await.unwrap();

        let (updated, transcript) = portal
            .record_voice_note(
                &profile,
                vec![0; 16],
                "audio/wav",
                &EchoGateway("No speech detected"),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(transcript, Transcript::NoSpeech);
        assert_eq!(updated.voice_note.as_deref(), Some("No speech detected"));
    }

    #[tokio::test]
    async fn test_voice_note_failure_leaves_profile_untouched() {
        let portal = portal();
        let profile = portal.register_migrant(form("anita")).await.unwrap();
        let before = portal
            .store()
            .snapshot(medilink_common::Collection::Profiles)
            .await
            .unwrap();

        let result = portal
            .record_voice_note(
                &profile,
                vec![1, 2, 3],
                "audio/wav",
                &DownGateway,
                CancellationToken::new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(PortalError::Transcription(TranscriptionError::Network(_)))
        ));
        let after = portal
            .store()
            .snapshot(medilink_common::Collection::Profiles)
            .await
            .unwrap();
        assert_eq!(before, after);
        assert!(!portal.in_flight().is_active(&profile.id));
    }

    #[tokio::test]
    async fn test_voice_note_busy_while_in_flight() {
        let portal = portal();
        let profile = portal.register_migrant(form("anita")).await.unwrap();

        let _held = portal.in_flight().acquire(&profile.id).unwrap();
        let result = portal
            .record_voice_note(
                &profile,
                vec![1],
                "audio/wav",
                &EchoGateway("text"),
                CancellationToken::new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(PortalError::Transcription(TranscriptionError::Busy(_)))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let portal = portal();
        let profile = portal.register_migrant(form("anita")).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = portal
            .record_voice_note(&profile, vec![1], "audio/wav", &EchoGateway("text"), cancel)
            .await;
        assert!(matches!(
            result,
            Err(PortalError::Transcription(TranscriptionError::Cancelled))
        ));
    }
}
