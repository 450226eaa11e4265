//! The patient lookup port.
//!
//! The scan core never talks to a backend directly; it resolves a payload to
//! a [`LookupQuery`] and hands it to whichever [`PatientLookup`]
//! implementation the embedding wired in: the bundled directory store, or a
//! client for a hosted backend.

use async_trait::async_trait;

use crate::patient::PatientRecord;
use crate::query::LookupQuery;

/// Failure of the lookup transport itself.
///
/// "No row matched" is not an error at this boundary (it is the `Ok(None)`
/// result), so implementations reserve this type for backend and network
/// failures.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("patient lookup transport failure: {0}")]
    Transport(String),
}

/// Resolves a lookup query to at most one patient.
///
/// Implementations must guarantee that the identity columns are unique
/// across patients (the same value must never be registered under
/// `patient_id` for one patient and `nfc_id` or `qr_code` for another)
/// so that an OR query over the three columns is unambiguous.
#[async_trait]
pub trait PatientLookup: Send + Sync {
    /// Find the patient matching the query.
    ///
    /// Returns `Ok(None)` when no patient matched.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when the backend could not be reached or
    /// failed while executing the query.
    async fn find_patient(
        &self,
        query: &LookupQuery,
    ) -> Result<Option<PatientRecord>, LookupError>;
}
