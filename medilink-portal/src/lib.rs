//! MediLink+ portals
//!
//! Role-scoped workflows over the shared record store: migrants manage their
//! own profile, doctors search patients and record consultations, the
//! government admin registers doctors and reads totals.

pub mod cli;
pub mod commands;
pub mod error;
pub mod portal;
pub mod seed;
pub mod views;

pub use error::{PortalError, Result};
pub use portal::{
    ConsultationForm, ConsultationReceipt, DashboardStats, NewDoctor, NewProfile, Portal,
};
