use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use medicard_core::{
    derived_patient_id, CoreConfig, DirectoryStore, IdentifierText, ManualSource, PatientRecord,
    ScanSession, SessionController, SessionObserver, SessionPhase, DEFAULT_DATA_DIR,
};

#[derive(Parser)]
#[command(name = "medicard")]
#[command(about = "MediCard patient identification CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify a patient from a scanned payload
    ///
    /// With --payload, runs a single scan session. Without it, reads one
    /// payload per line from stdin (tethered reader mode), resetting the
    /// session between scans.
    Scan {
        /// Raw payload as produced by the QR/NFC decoder
        #[arg(long)]
        payload: Option<String>,
    },
    /// Register a patient record
    Add {
        /// Full name
        full_name: String,
        /// Card-printable patient ID (derived from the record id if omitted)
        #[arg(long)]
        patient_id: Option<String>,
        /// NFC tag serial
        #[arg(long)]
        nfc_id: Option<String>,
        /// QR code value
        #[arg(long)]
        qr_code: Option<String>,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        date_of_birth: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        blood_type: Option<String>,
        /// Allergies (comma-separated)
        #[arg(long)]
        allergies: Option<String>,
        /// Medical conditions (comma-separated)
        #[arg(long)]
        conditions: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        emergency_contact_name: Option<String>,
        #[arg(long)]
        emergency_contact_phone: Option<String>,
    },
    /// List all patients
    List,
    /// Search patients by name, patient ID or phone
    Search {
        /// Substring to match
        term: String,
    },
}

/// Prints session progress to stdout as the scan advances.
struct StdoutObserver;

impl SessionObserver for StdoutObserver {
    fn session_changed(&mut self, session: &ScanSession) {
        match session.phase() {
            SessionPhase::Scanning => println!("-- waiting for scan..."),
            SessionPhase::Resolving => println!("-- looking up patient..."),
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir =
        std::env::var("MEDICARD_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let cfg = Arc::new(CoreConfig::new(PathBuf::from(data_dir))?);
    let store = DirectoryStore::new(cfg);

    match cli.command {
        Some(Commands::Scan { payload }) => {
            let mut controller =
                SessionController::new(ManualSource::new(), store, StdoutObserver);

            match payload {
                Some(payload) => {
                    controller.start_scan();
                    controller.process_payload(&payload).await;
                    report(controller.session());
                }
                None => {
                    let stdin = std::io::stdin();
                    for line in stdin.lock().lines() {
                        let line = line?;
                        if line.trim().is_empty() {
                            continue;
                        }
                        controller.start_scan();
                        controller.process_payload(&line).await;
                        report(controller.session());
                        controller.reset();
                    }
                }
            }
        }
        Some(Commands::Add {
            full_name,
            patient_id,
            nfc_id,
            qr_code,
            date_of_birth,
            gender,
            blood_type,
            allergies,
            conditions,
            phone,
            email,
            emergency_contact_name,
            emergency_contact_phone,
        }) => {
            let id = Uuid::new_v4();
            let patient_id = match patient_id {
                Some(supplied) => IdentifierText::new(&supplied)?,
                None => derived_patient_id(&id),
            };

            let record = PatientRecord {
                id,
                patient_id,
                nfc_id,
                qr_code,
                full_name,
                date_of_birth,
                gender,
                blood_type,
                allergies: split_list(allergies),
                medical_conditions: split_list(conditions),
                phone,
                email,
                emergency_contact_name,
                emergency_contact_phone,
                created_at: Utc::now(),
            };

            match store.create(&record) {
                Ok(()) => println!("Registered patient with ID: {}", record.patient_id),
                Err(e) => eprintln!("Error registering patient: {}", e),
            }
        }
        Some(Commands::List) => {
            let patients = store.list();
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in patients {
                    println!(
                        "ID: {}, Name: {}, Registered: {}",
                        patient.patient_id, patient.full_name, patient.created_at
                    );
                }
            }
        }
        Some(Commands::Search { term }) => {
            let patients = store.search(&term);
            if patients.is_empty() {
                println!("No patients matched '{}'.", term);
            } else {
                for patient in patients {
                    println!("ID: {}, Name: {}", patient.patient_id, patient.full_name);
                }
            }
        }
        None => {
            println!("Use 'medicard --help' for commands");
        }
    }

    Ok(())
}

fn split_list(input: Option<String>) -> Vec<String> {
    input
        .map(|s| {
            s.split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Print the settled session: the patient card, or the failure cause.
fn report(session: &ScanSession) {
    match session.phase() {
        SessionPhase::Success => {
            if let Some(patient) = session.patient() {
                print_card(patient);
            }
        }
        SessionPhase::Failed => {
            if let Some(error) = session.error() {
                eprintln!("Scan failed ({}): {}", error.kind(), error);
            }
        }
        phase => eprintln!("Session did not settle (phase: {})", phase),
    }
}

fn print_card(patient: &PatientRecord) {
    println!("=== {} ===", patient.full_name);
    println!("Patient ID:    {}", patient.patient_id);
    if let Some(dob) = &patient.date_of_birth {
        println!("Date of birth: {}", dob);
    }
    if let Some(gender) = &patient.gender {
        println!("Gender:        {}", gender);
    }
    if let Some(blood_type) = &patient.blood_type {
        println!("Blood type:    {}", blood_type);
    }
    if !patient.allergies.is_empty() {
        println!("!! ALLERGIES:  {}", patient.allergies.join(", "));
    }
    if !patient.medical_conditions.is_empty() {
        println!("Conditions:    {}", patient.medical_conditions.join(", "));
    }
    if let Some(phone) = &patient.phone {
        println!("Phone:         {}", phone);
    }
    if let Some(email) = &patient.email {
        println!("Email:         {}", email);
    }
    if let Some(name) = &patient.emergency_contact_name {
        match &patient.emergency_contact_phone {
            Some(phone) => println!("Emergency:     {} - {}", name, phone),
            None => println!("Emergency:     {}", name),
        }
    }
}
