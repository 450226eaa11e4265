//! Patient directory store.
//!
//! The bundled [`PatientLookup`] implementation: JSON records in a two-level
//! sharded directory tree under the configured data dir,
//! `<data>/patients/<s1>/<s2>/<32hex-uuid>/patient.json`, where `s1`/`s2` are
//! the first four hex characters of the record UUID.
//!
//! Registration rejects identifier values already present in any identity
//! column, so the three-way OR lookup a bare scan produces can never match
//! two different patients.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::CoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::lookup::{LookupError, PatientLookup};
use crate::patient::PatientRecord;
use crate::query::{IdentityColumn, LookupQuery};

const RECORD_FILE_NAME: &str = "patient.json";

/// File-backed patient store.
#[derive(Clone)]
pub struct DirectoryStore {
    cfg: Arc<CoreConfig>,
}

impl DirectoryStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Register a new patient record.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if:
    /// - any of the record's identity values is already registered, under any
    ///   identity column, to an existing record,
    /// - the storage or patient directory cannot be created,
    /// - the record cannot be serialised or written.
    pub fn create(&self, record: &PatientRecord) -> StoreResult<()> {
        self.check_identifier_uniqueness(record)?;

        let json = serde_json::to_string_pretty(record).map_err(StoreError::Serialization)?;

        fs::create_dir_all(self.cfg.patients_dir()).map_err(StoreError::StorageDirCreation)?;

        let patient_dir = self.record_dir(record);
        fs::create_dir_all(&patient_dir).map_err(StoreError::PatientDirCreation)?;
        fs::write(patient_dir.join(RECORD_FILE_NAME), json).map_err(StoreError::FileWrite)?;

        tracing::info!(patient_id = %record.patient_id, "registered patient record");
        Ok(())
    }

    /// Lists all patient records.
    ///
    /// Traverses the sharded directory structure and reads every
    /// `patient.json`. A record that cannot be parsed is logged as a warning
    /// and skipped; a missing data directory yields an empty list.
    pub fn list(&self) -> Vec<PatientRecord> {
        let mut records = Vec::new();

        let patients_dir = self.cfg.patients_dir();
        let s1_iter = match fs::read_dir(&patients_dir) {
            Ok(it) => it,
            Err(_) => return records,
        };

        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let record_path = id_ent.path().join(RECORD_FILE_NAME);
                    if !record_path.is_file() {
                        continue;
                    }

                    match load_record(&record_path) {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            tracing::warn!(
                                "failed to load patient record {}: {}",
                                record_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        records
    }

    /// Case-insensitive substring search over full name, patient id and
    /// phone number.
    pub fn search(&self, term: &str) -> Vec<PatientRecord> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.list();
        }

        self.list()
            .into_iter()
            .filter(|record| {
                record.full_name.to_lowercase().contains(&needle)
                    || record
                        .patient_id
                        .as_str()
                        .to_lowercase()
                        .contains(&needle)
                    || record
                        .phone
                        .as_deref()
                        .is_some_and(|phone| phone.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Find the first record matching the query.
    ///
    /// First-match is deterministic because [`create`](Self::create) keeps
    /// identity values unique across records and columns.
    pub fn find(&self, query: &LookupQuery) -> Option<PatientRecord> {
        self.list().into_iter().find(|record| query.matches(record))
    }

    fn check_identifier_uniqueness(&self, record: &PatientRecord) -> StoreResult<()> {
        let new_values: Vec<&str> = IdentityColumn::ALL
            .into_iter()
            .filter_map(|column| record.identity_value(column))
            .collect();

        for existing in self.list() {
            if existing.id == record.id {
                return Err(StoreError::InvalidInput(format!(
                    "record {} already exists",
                    record.id
                )));
            }

            for column in IdentityColumn::ALL {
                let Some(existing_value) = existing.identity_value(column) else {
                    continue;
                };
                if new_values.contains(&existing_value) {
                    return Err(StoreError::DuplicateIdentifier(existing_value.to_owned()));
                }
            }
        }

        Ok(())
    }

    /// Sharded directory for a record: `<patients>/<s1>/<s2>/<32hex-id>`.
    fn record_dir(&self, record: &PatientRecord) -> PathBuf {
        let hex = record.id.simple().to_string();
        self.cfg
            .patients_dir()
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(&hex)
    }
}

fn load_record(path: &Path) -> StoreResult<PatientRecord> {
    let contents = fs::read_to_string(path).map_err(StoreError::FileRead)?;
    serde_json::from_str(&contents).map_err(StoreError::Deserialization)
}

#[async_trait]
impl PatientLookup for DirectoryStore {
    async fn find_patient(
        &self,
        query: &LookupQuery,
    ) -> Result<Option<PatientRecord>, LookupError> {
        Ok(self.find(query))
    }
}
