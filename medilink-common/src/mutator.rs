//! Profile mutation
//!
//! Every mutation copies the caller's entity, applies the change, then
//! re-reads the full collection, swaps the stored entity for the updated
//! copy and writes the collection back. The stored revision must match the
//! revision the caller started from; otherwise another session changed or
//! removed the entity and the write is refused with `StaleWrite`. The whole
//! cycle runs under the collection lock of [`RecordStore::update`].

use tracing::{info, warn};

use crate::codec::{self, AttachmentToken};
use crate::models::{DoctorProfile, Profile, Versioned};
use crate::store::RecordStore;
use crate::{Error, Result};

/// Applies in-place changes to profiles and doctors
#[derive(Clone)]
pub struct ProfileMutator {
    store: RecordStore,
}

impl ProfileMutator {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Append an already-encoded attachment
    pub async fn append_attachment(
        &self,
        profile: &Profile,
        token: AttachmentToken,
    ) -> Result<Profile> {
        let mut updated = profile.clone();
        updated.medical_reports.push(token);
        let updated = self.commit(profile, updated).await?;
        info!(
            id = %updated.id,
            reports = updated.medical_reports.len(),
            "Attachment appended"
        );
        Ok(updated)
    }

    /// Size-check, encode and append an uploaded file
    pub async fn attach_upload(
        &self,
        profile: &Profile,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<Profile> {
        codec::check_size(bytes.len())?;
        let token = codec::encode(bytes, mime_type)?;
        self.append_attachment(profile, token).await
    }

    /// Remove the attachment at `index`, keeping the others in order
    pub async fn remove_attachment(&self, profile: &Profile, index: usize) -> Result<Profile> {
        if index >= profile.medical_reports.len() {
            return Err(Error::InvalidInput(format!(
                "attachment index {} out of range ({} attachments)",
                index,
                profile.medical_reports.len()
            )));
        }

        let mut updated = profile.clone();
        updated.medical_reports.remove(index);
        let updated = self.commit(profile, updated).await?;
        info!(id = %updated.id, index, "Attachment removed");
        Ok(updated)
    }

    /// Store the latest transcription result
    pub async fn set_voice_note(&self, profile: &Profile, text: &str) -> Result<Profile> {
        let mut updated = profile.clone();
        updated.voice_note = Some(text.to_string());
        let updated = self.commit(profile, updated).await?;
        info!(id = %updated.id, "Voice note updated");
        Ok(updated)
    }

    /// Count one more treated patient
    pub async fn increment_treated_count(&self, doctor: &DoctorProfile) -> Result<DoctorProfile> {
        let mut updated = doctor.clone();
        updated.patients_treated += 1;
        let updated = self.commit(doctor, updated).await?;
        info!(
            id = %updated.id,
            patients_treated = updated.patients_treated,
            "Treated count incremented"
        );
        Ok(updated)
    }

    async fn commit<T: Versioned>(&self, original: &T, mut updated: T) -> Result<T> {
        let id = original.id().to_string();
        let expected = original.revision();

        self.store
            .update(move |entities: &mut Vec<T>| {
                let Some(slot) = entities.iter_mut().find(|e| e.id() == id) else {
                    warn!(collection = %T::COLLECTION, %id, "Entity vanished before write");
                    return Err(Error::StaleWrite {
                        id,
                        reason: "no longer present in the stored collection".to_string(),
                    });
                };

                if slot.revision() != expected {
                    warn!(
                        collection = %T::COLLECTION,
                        %id,
                        expected,
                        found = slot.revision(),
                        "Revision mismatch"
                    );
                    return Err(Error::StaleWrite {
                        reason: format!(
                            "modified elsewhere (revision {} expected, {} stored)",
                            expected,
                            slot.revision()
                        ),
                        id,
                    });
                }

                updated.set_revision(expected + 1);
                *slot = updated.clone();
                Ok(updated)
            })
            .await
    }
}
