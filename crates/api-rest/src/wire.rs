//! Wire models for the REST API.
//!
//! These are deliberately flat, all-string shapes: the OpenAPI document and
//! every client see plain JSON, while the core keeps its typed aggregate.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use medicard_core::{PatientRecord, ScanError};

/// Health status response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A raw scanned payload, exactly as the decoder produced it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanReq {
    pub payload: String,
}

/// Tagged scan failure.
///
/// `kind` is one of `no_usable_identifier`, `not_found`, `transport`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanErrorRes {
    pub kind: String,
    pub message: String,
}

impl From<ScanError> for ScanErrorRes {
    fn from(error: ScanError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Patient aggregate on the wire.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub patient_id: String,
    pub nfc_id: Option<String>,
    pub qr_code: Option<String>,
    pub full_name: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Vec<String>,
    pub medical_conditions: Vec<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub created_at: String,
}

impl From<PatientRecord> for PatientRes {
    fn from(record: PatientRecord) -> Self {
        Self {
            id: record.id.to_string(),
            patient_id: record.patient_id.into_string(),
            nfc_id: record.nfc_id,
            qr_code: record.qr_code,
            full_name: record.full_name,
            date_of_birth: record.date_of_birth,
            gender: record.gender,
            blood_type: record.blood_type,
            allergies: record.allergies,
            medical_conditions: record.medical_conditions,
            phone: record.phone,
            email: record.email,
            emergency_contact_name: record.emergency_contact_name,
            emergency_contact_phone: record.emergency_contact_phone,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// List of patient records.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientRes>,
}

/// Patient registration request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePatientReq {
    pub full_name: String,
    /// Card-printable identifier; derived from the record id when omitted.
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub nfc_id: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub emergency_contact_name: Option<String>,
    #[serde(default)]
    pub emergency_contact_phone: Option<String>,
}

/// Query parameters for patient search.
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Substring matched against full name, patient id and phone.
    pub q: String,
}
