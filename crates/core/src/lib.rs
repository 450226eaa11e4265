//! # MediCard Core
//!
//! Core logic for the MediCard scan-to-identify workflow.
//!
//! This crate contains the identifier resolver and the scan session
//! controller, plus the file-backed patient directory store:
//! - Payload interpretation with deterministic field precedence
//! - The scan → resolve → lookup → display session lifecycle
//! - Patient records in sharded JSON storage under the data dir
//!
//! **No API concerns**: HTTP servers and CLI surfaces belong in `api-rest`
//! and `medicard-cli`.

pub mod config;
pub mod error;
pub mod identifier;
pub mod lookup;
pub mod patient;
pub mod query;
pub mod session;
pub mod store;

pub use config::{CoreConfig, DEFAULT_DATA_DIR};
pub use error::{ScanError, SourceError, StoreError, StoreResult};
pub use identifier::{resolve, ParsedIdentifier, StructuredIdentifier};
pub use lookup::{LookupError, PatientLookup};
pub use medicard_types::{IdentifierError, IdentifierText};
pub use patient::{derived_patient_id, PatientRecord};
pub use query::{IdentityColumn, LookupQuery, Predicate};
pub use session::{
    ManualSource, NullObserver, PendingLookup, ScanSession, ScanSource, SessionController,
    SessionObserver, SessionPhase, TraceObserver,
};
pub use store::DirectoryStore;
