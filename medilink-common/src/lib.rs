//! # MediLink Common Library
//!
//! Shared code for the MediLink+ portals including:
//! - Entity models (profiles, doctors, consultations)
//! - Slot stores and the typed record store
//! - Identity resolution and profile mutation
//! - Attachment encoding
//! - Configuration loading
//! - Identifier and time utilities

pub mod codec;
pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod mutator;
pub mod resolver;
pub mod store;
pub mod time;

pub use codec::{AttachmentToken, DecodedAttachment, MAX_ATTACHMENT_BYTES};
pub use error::{Error, Result};
pub use models::{Collection, Consultation, DoctorProfile, Profile, Record, Versioned};
pub use mutator::ProfileMutator;
pub use store::{MemorySlots, RecordStore, SlotStore, SqliteSlots};
