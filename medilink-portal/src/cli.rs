//! Command-line arguments for `medilink`

use clap::{Args, Parser, Subcommand};
use medilink_ai::DEFAULT_AUDIO_MIME;
use std::path::PathBuf;

/// Command-line arguments for medilink
#[derive(Parser, Debug)]
#[command(name = "medilink")]
#[command(about = "MediLink+ migrant health records")]
#[command(version)]
pub struct Cli {
    /// Root folder holding the record database
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// Config file (defaults to the platform config location)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert the demo migrant and doctor if missing
    Seed,

    /// Migrant portal
    Migrant {
        #[command(subcommand)]
        action: MigrantAction,
    },

    /// Doctor portal
    Doctor {
        #[command(subcommand)]
        action: DoctorAction,
    },

    /// Government portal
    Gov {
        #[command(subcommand)]
        action: GovAction,
    },
}

#[derive(Args, Debug, Clone)]
pub struct Credentials {
    #[arg(short, long)]
    pub username: String,

    #[arg(short, long)]
    pub password: String,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value_t = 0)]
    pub age: u32,
    #[arg(long, default_value = "")]
    pub native_state: String,
    #[arg(long, default_value = "")]
    pub native_city: String,
    #[arg(long, default_value = "")]
    pub residing_city: String,
    /// National ID number, separators allowed
    #[arg(long, default_value = "")]
    pub national_id: String,
    /// Date of birth, YYYY-MM-DD
    #[arg(long)]
    pub dob: Option<String>,
    #[arg(long, default_value = "")]
    pub contact_number: String,
    #[arg(long, default_value = "")]
    pub mobile_number: String,
    #[arg(long, default_value = "")]
    pub emergency_mobile_number: String,
    #[arg(long, default_value = "")]
    pub blood_group: String,
    #[command(flatten)]
    pub credentials: Credentials,
}

#[derive(Subcommand, Debug)]
pub enum MigrantAction {
    /// Create a new migrant profile
    Register(RegisterArgs),

    /// Show the logged-in profile
    Profile(Credentials),

    /// Upload a medical report file
    Upload {
        #[command(flatten)]
        credentials: Credentials,
        file: PathBuf,
        /// MIME type; sniffed from the content when omitted
        #[arg(long)]
        mime: Option<String>,
    },

    /// Remove a report by its index
    RemoveReport {
        #[command(flatten)]
        credentials: Credentials,
        index: usize,
    },

    /// Write a report to a file
    ExportReport {
        #[command(flatten)]
        credentials: Credentials,
        index: usize,
        /// Output path; defaults to report-<index>.<ext>
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Transcribe a recorded clip into the profile's voice note
    VoiceNote {
        #[command(flatten)]
        credentials: Credentials,
        file: PathBuf,
        #[arg(long, default_value = DEFAULT_AUDIO_MIME)]
        mime: String,
    },

    /// List consultations recorded for the profile
    History(Credentials),
}

#[derive(Subcommand, Debug)]
pub enum DoctorAction {
    /// Show the logged-in doctor
    Profile(Credentials),

    /// Find a patient by MED- id or national ID
    Search {
        #[command(flatten)]
        credentials: Credentials,
        query: String,
    },

    /// Record a consultation for a patient
    Consult {
        #[command(flatten)]
        credentials: Credentials,
        /// Patient MED- id or national ID
        patient: String,
        #[arg(long)]
        diagnosis: String,
        #[arg(long, default_value = "")]
        cause: String,
        #[arg(long)]
        prescription: String,
        /// Consultation date, YYYY-MM-DD (default today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Write one of a patient's reports to a file
    ExportReport {
        #[command(flatten)]
        credentials: Credentials,
        patient: String,
        index: usize,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum GovAction {
    /// Totals of patients, doctors and consultations
    Stats(Credentials),

    /// List registered patients
    Patients(Credentials),

    /// List registered doctors
    Doctors(Credentials),

    /// Find a patient by MED- id or national ID
    Search {
        #[command(flatten)]
        credentials: Credentials,
        query: String,
    },

    /// Register a new doctor
    AddDoctor {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        name: String,
        #[arg(long)]
        doctor_username: String,
        #[arg(long)]
        doctor_password: String,
        #[arg(long, default_value = "General Physician")]
        specialization: String,
    },
}
