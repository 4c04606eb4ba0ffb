//! Command dispatch for the `medilink` binary

use anyhow::{anyhow, Context, Result};
use medilink_ai::{GeminiClient, Transcript};
use medilink_common::codec::DecodedAttachment;
use medilink_common::config::TranscriptionConfig;
use medilink_common::time;
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::{Command, Credentials, DoctorAction, GovAction, MigrantAction, RegisterArgs};
use crate::seed::ensure_demo_records;
use crate::views::{render_consultation, DoctorView, ProfileView};
use crate::{ConsultationForm, NewDoctor, NewProfile, Portal, PortalError};

/// Everything a command needs besides its own arguments
pub struct RunContext {
    pub portal: Portal,
    pub transcription: TranscriptionConfig,
    pub cancel: CancellationToken,
    pub json: bool,
}

impl RunContext {
    fn emit<T: Serialize + Display>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", value);
        }
        Ok(())
    }

    fn emit_list<T: Serialize + Display>(&self, values: &[T]) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(values)?);
        } else if values.is_empty() {
            println!("(none)");
        } else {
            for value in values {
                println!("{}", value);
            }
        }
        Ok(())
    }

    fn emit_consultations(&self, consultations: &[medilink_common::Consultation]) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(consultations)?);
        } else if consultations.is_empty() {
            println!("No consultations recorded.");
        } else {
            for c in consultations {
                println!("{}\n", render_consultation(c));
            }
        }
        Ok(())
    }
}

/// Seed the demo records, then run one command
pub async fn run(ctx: &RunContext, command: Command) -> Result<()> {
    let seeded = ensure_demo_records(ctx.portal.store())
        .await
        .context("Failed to seed demo records")?;

    match command {
        Command::Seed => {
            let stats = ctx.portal.stats().await?;
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "Demo migrant {}, demo doctor {}. Totals: {} patients, {} doctors, {} consultations",
                    if seeded.migrant_added { "added" } else { "present" },
                    if seeded.doctor_added { "added" } else { "present" },
                    stats.patients,
                    stats.doctors,
                    stats.consultations
                );
            }
            Ok(())
        }
        Command::Migrant { action } => run_migrant(ctx, action).await,
        Command::Doctor { action } => run_doctor(ctx, action).await,
        Command::Gov { action } => run_gov(ctx, action).await,
    }
}

async fn run_migrant(ctx: &RunContext, action: MigrantAction) -> Result<()> {
    let portal = &ctx.portal;
    match action {
        MigrantAction::Register(args) => {
            let profile = portal.register_migrant(registration_form(args)?).await?;
            ctx.emit(&ProfileView::from(&profile))
        }
        MigrantAction::Profile(creds) => {
            let profile = login_migrant(portal, &creds).await?;
            ctx.emit(&ProfileView::from(&profile))
        }
        MigrantAction::Upload {
            credentials,
            file,
            mime,
        } => {
            let profile = login_migrant(portal, &credentials).await?;
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let profile = portal
                .upload_report(&profile, &bytes, mime.as_deref())
                .await?;
            ctx.emit(&ProfileView::from(&profile))
        }
        MigrantAction::RemoveReport { credentials, index } => {
            let profile = login_migrant(portal, &credentials).await?;
            let profile = portal.remove_report(&profile, index).await?;
            ctx.emit(&ProfileView::from(&profile))
        }
        MigrantAction::ExportReport {
            credentials,
            index,
            out,
        } => {
            let profile = login_migrant(portal, &credentials).await?;
            let report = portal.open_report(&profile, index)?;
            export(&report, index, out).await
        }
        MigrantAction::VoiceNote {
            credentials,
            file,
            mime,
        } => {
            let profile = login_migrant(portal, &credentials).await?;
            let audio = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let gateway = GeminiClient::from_config(&ctx.transcription)?;
            let (_, transcript) = portal
                .record_voice_note(&profile, audio, &mime, &gateway, ctx.cancel.clone())
                .await?;
            match transcript {
                Transcript::Text(text) => println!("{}", text),
                Transcript::NoSpeech => println!("No speech detected in the recording."),
            }
            Ok(())
        }
        MigrantAction::History(creds) => {
            let profile = login_migrant(portal, &creds).await?;
            let history = portal.consultation_history(&profile).await?;
            ctx.emit_consultations(&history)
        }
    }
}

async fn run_doctor(ctx: &RunContext, action: DoctorAction) -> Result<()> {
    let portal = &ctx.portal;
    match action {
        DoctorAction::Profile(creds) => {
            let doctor = portal
                .login_doctor(&creds.username, &creds.password)
                .await?;
            ctx.emit(&DoctorView::from(&doctor))
        }
        DoctorAction::Search { credentials, query } => {
            portal
                .login_doctor(&credentials.username, &credentials.password)
                .await?;
            let patient = find_patient(portal, &query).await?;
            ctx.emit(&ProfileView::from(&patient))?;
            let history = portal.patient_history(&patient).await?;
            ctx.emit_consultations(&history)
        }
        DoctorAction::Consult {
            credentials,
            patient,
            diagnosis,
            cause,
            prescription,
            date,
        } => {
            let doctor = portal
                .login_doctor(&credentials.username, &credentials.password)
                .await?;
            let patient = find_patient(portal, &patient).await?;
            let form = ConsultationForm {
                diagnosis,
                cause_of_illness: cause,
                prescription,
                date: date.as_deref().map(time::parse_date).transpose()?,
            };
            let receipt = portal.submit_consultation(&doctor, &patient, form).await?;
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&receipt.consultation)?);
            } else {
                println!("{}", render_consultation(&receipt.consultation));
                println!(
                    "{} has now treated {} patients",
                    receipt.doctor.name, receipt.doctor.patients_treated
                );
            }
            Ok(())
        }
        DoctorAction::ExportReport {
            credentials,
            patient,
            index,
            out,
        } => {
            portal
                .login_doctor(&credentials.username, &credentials.password)
                .await?;
            let patient = find_patient(portal, &patient).await?;
            let report = portal.open_patient_report(&patient, index)?;
            export(&report, index, out).await
        }
    }
}

async fn run_gov(ctx: &RunContext, action: GovAction) -> Result<()> {
    let portal = &ctx.portal;
    match action {
        GovAction::Stats(creds) => {
            login_admin(portal, &creds)?;
            let stats = portal.stats().await?;
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Registered migrants: {}", stats.patients);
                println!("Registered doctors:  {}", stats.doctors);
                println!("Consultations:       {}", stats.consultations);
            }
            Ok(())
        }
        GovAction::Patients(creds) => {
            login_admin(portal, &creds)?;
            let views: Vec<ProfileView> = portal
                .list_patients()
                .await?
                .iter()
                .map(ProfileView::from)
                .collect();
            ctx.emit_list(&views)
        }
        GovAction::Doctors(creds) => {
            login_admin(portal, &creds)?;
            let views: Vec<DoctorView> = portal
                .list_doctors()
                .await?
                .iter()
                .map(DoctorView::from)
                .collect();
            ctx.emit_list(&views)
        }
        GovAction::Search { credentials, query } => {
            login_admin(portal, &credentials)?;
            let patient = find_patient(portal, &query).await?;
            ctx.emit(&ProfileView::from(&patient))
        }
        GovAction::AddDoctor {
            credentials,
            name,
            doctor_username,
            doctor_password,
            specialization,
        } => {
            login_admin(portal, &credentials)?;
            let doctor = portal
                .register_doctor(NewDoctor {
                    name,
                    username: doctor_username,
                    password: doctor_password,
                    specialization,
                })
                .await?;
            ctx.emit(&DoctorView::from(&doctor))
        }
    }
}

async fn login_migrant(portal: &Portal, creds: &Credentials) -> Result<medilink_common::Profile> {
    Ok(portal
        .login_migrant(&creds.username, &creds.password)
        .await?)
}

fn login_admin(portal: &Portal, creds: &Credentials) -> Result<()> {
    Ok(portal.login_admin(&creds.username, &creds.password)?)
}

async fn find_patient(portal: &Portal, query: &str) -> Result<medilink_common::Profile> {
    portal
        .search_patient(query)
        .await?
        .ok_or_else(|| anyhow!("Enter a patient ID or national ID to search"))
}

fn registration_form(args: RegisterArgs) -> Result<NewProfile> {
    Ok(NewProfile {
        name: args.name,
        age: args.age,
        native_state: args.native_state,
        native_city: args.native_city,
        residing_city: args.residing_city,
        national_id: args.national_id,
        dob: args.dob.as_deref().map(time::parse_date).transpose()?,
        contact_number: args.contact_number,
        mobile_number: args.mobile_number,
        emergency_mobile_number: args.emergency_mobile_number,
        blood_group: args.blood_group,
        username: args.credentials.username,
        password: args.credentials.password,
    })
}

/// True when `err` comes from input the user can correct and retry
///
/// Such failures are reported without a backtrace-style error chain and exit
/// with a distinct status.
pub fn is_user_error(err: &anyhow::Error) -> bool {
    if let Some(e) = err.downcast_ref::<PortalError>() {
        return e.is_recoverable();
    }
    if let Some(e) = err.downcast_ref::<medilink_common::Error>() {
        return e.is_recoverable();
    }
    false
}

/// Default export name: `report-<index>.<ext>`
fn export_path(report: &DecodedAttachment, index: usize, out: Option<PathBuf>) -> PathBuf {
    out.unwrap_or_else(|| PathBuf::from(format!("report-{}.{}", index, report.extension())))
}

async fn export(report: &DecodedAttachment, index: usize, out: Option<PathBuf>) -> Result<()> {
    let path = export_path(report, index, out);
    write_file(&path, &report.bytes).await?;
    info!(path = %path.display(), mime = %report.mime_type, "Report exported");
    println!("Saved report {} ({}) to {}", index, report.mime_type, path.display());
    Ok(())
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
