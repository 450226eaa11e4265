//! The patient aggregate returned by a successful lookup.
//!
//! Field names match the columns of the backing patient table so that records
//! serialise to the same shape the hosted backend exposes. Optional columns
//! are serde-lenient: a record written by an older deployment still parses.

use chrono::{DateTime, Utc};
use medicard_types::IdentifierText;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::query::IdentityColumn;

/// Combined identity, demographic and medical-profile record for one patient.
///
/// The scan core treats this as an opaque success payload: it is produced by
/// a [`PatientLookup`](crate::lookup::PatientLookup) implementation and
/// forwarded to the display collaborator unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Record identifier of the backing row.
    pub id: Uuid,

    /// Human-readable patient identifier printed on the physical card.
    pub patient_id: IdentifierText,

    /// Serial of the NFC tag embedded in the card, if one was issued.
    #[serde(default)]
    pub nfc_id: Option<String>,

    /// Value encoded in the card's QR code, if one was issued.
    #[serde(default)]
    pub qr_code: Option<String>,

    pub full_name: String,

    /// ISO 8601 date (YYYY-MM-DD).
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

    pub created_at: DateTime<Utc>,
}

impl PatientRecord {
    /// Returns the record's value for the given identity column, if set.
    pub fn identity_value(&self, column: IdentityColumn) -> Option<&str> {
        match column {
            IdentityColumn::PatientId => Some(self.patient_id.as_str()),
            IdentityColumn::NfcId => self.nfc_id.as_deref(),
            IdentityColumn::QrCode => self.qr_code.as_deref(),
        }
    }
}

/// Derive a card-printable patient identifier from a record id.
///
/// Used when a patient is registered without an explicit `patient_id`: the
/// first ten hex characters of the record UUID, upper-cased, behind a `P`
/// prefix. Deterministic, so re-deriving for the same record always agrees.
pub fn derived_patient_id(id: &Uuid) -> IdentifierText {
    let hex = id.simple().to_string();
    let formatted = format!("P{}", hex[..10].to_uppercase());
    IdentifierText::new(formatted).expect("derived patient id is never blank")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_record() {
        let input = r#"{
            "id": "90a8d1ea-3180-41d9-adb0-70a834d4e0f6",
            "patient_id": "P1234567890",
            "full_name": "Sarah Williams",
            "created_at": "2026-01-23T13:58:04Z"
        }"#;

        let record: PatientRecord = serde_json::from_str(input).expect("parse record");
        assert_eq!(record.patient_id.as_str(), "P1234567890");
        assert_eq!(record.full_name, "Sarah Williams");
        assert!(record.nfc_id.is_none());
        assert!(record.allergies.is_empty());
    }

    #[test]
    fn identity_value_maps_columns() {
        let input = r#"{
            "id": "90a8d1ea-3180-41d9-adb0-70a834d4e0f6",
            "patient_id": "P1234567890",
            "nfc_id": "NFC_P987",
            "full_name": "Sarah Williams",
            "created_at": "2026-01-23T13:58:04Z"
        }"#;

        let record: PatientRecord = serde_json::from_str(input).expect("parse record");
        assert_eq!(
            record.identity_value(IdentityColumn::PatientId),
            Some("P1234567890")
        );
        assert_eq!(record.identity_value(IdentityColumn::NfcId), Some("NFC_P987"));
        assert_eq!(record.identity_value(IdentityColumn::QrCode), None);
    }

    #[test]
    fn rejects_blank_patient_id() {
        let input = r#"{
            "id": "90a8d1ea-3180-41d9-adb0-70a834d4e0f6",
            "patient_id": "  ",
            "full_name": "Sarah Williams",
            "created_at": "2026-01-23T13:58:04Z"
        }"#;

        let result: Result<PatientRecord, _> = serde_json::from_str(input);
        assert!(result.is_err());
    }

    #[test]
    fn derived_patient_id_is_deterministic() {
        let id = Uuid::parse_str("90a8d1ea-3180-41d9-adb0-70a834d4e0f6").expect("valid uuid");
        let first = derived_patient_id(&id);
        let second = derived_patient_id(&id);
        assert_eq!(first, second);
        assert_eq!(first.as_str(), "P90A8D1EA31");
    }
}
