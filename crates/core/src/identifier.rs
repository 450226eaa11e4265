//! The identifier resolver: raw scan payload → lookup query.
//!
//! A payload read off a card is either a JSON object written by the issuing
//! system (explicit, named identifier fields) or a bare string (a tag serial,
//! a legacy code). Interpretation is a tagged parse result, never
//! exception-driven: any input that is not a JSON object degrades to an
//! opaque identifier rather than erroring.
//!
//! Field precedence mirrors the printed card: `patientId` is the canonical
//! human-readable ID and wins outright; `nfcId` and `qrCode` follow; a
//! generic `id` is ambiguous and is checked against all three identity
//! columns. A bare string gets the same three-way treatment, since the
//! issuing medium is not self-describing once reduced to text.

use medicard_types::IdentifierText;
use serde_json::{Map, Value};

use crate::error::ScanError;
use crate::query::{IdentityColumn, LookupQuery};

/// A structured identifier payload, as issued in the card's QR code.
///
/// Recognised fields are lifted out; everything else the card carries
/// (`name`, `bloodType`, emergency contact for offline use) is kept in
/// `extra` for display but never used for lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredIdentifier {
    pub patient_id: Option<String>,
    pub nfc_id: Option<String>,
    pub qr_code: Option<String>,
    pub id: Option<String>,
    pub extra: Map<String, Value>,
}

/// Result of interpreting a scan payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedIdentifier {
    /// The payload was a JSON object with named fields.
    Structured(StructuredIdentifier),
    /// Anything else: the raw string itself is the candidate identifier.
    Opaque(String),
}

impl ParsedIdentifier {
    /// Interpret a raw scan payload.
    ///
    /// A blank payload fails with [`ScanError::NoUsableIdentifier`] before
    /// any parsing is attempted. A JSON object becomes
    /// [`ParsedIdentifier::Structured`]; every other input (non-JSON text,
    /// but also JSON scalars and arrays) degrades to
    /// [`ParsedIdentifier::Opaque`] carrying the trimmed raw string.
    pub fn parse(raw: &str) -> Result<Self, ScanError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ScanError::NoUsableIdentifier);
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(fields)) => Ok(ParsedIdentifier::Structured(
                StructuredIdentifier::from_fields(fields),
            )),
            _ => Ok(ParsedIdentifier::Opaque(trimmed.to_owned())),
        }
    }

    /// Derive the lookup query per the field-precedence rules.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NoUsableIdentifier`] when a structured payload
    /// carries none of the recognised fields with a usable value.
    pub fn to_query(&self) -> Result<LookupQuery, ScanError> {
        match self {
            ParsedIdentifier::Structured(fields) => {
                if let Some(value) = usable(&fields.patient_id) {
                    Ok(LookupQuery::exact(IdentityColumn::PatientId, value))
                } else if let Some(value) = usable(&fields.nfc_id) {
                    Ok(LookupQuery::exact(IdentityColumn::NfcId, value))
                } else if let Some(value) = usable(&fields.qr_code) {
                    Ok(LookupQuery::exact(IdentityColumn::QrCode, value))
                } else if let Some(value) = usable(&fields.id) {
                    Ok(LookupQuery::any_identity(value))
                } else {
                    Err(ScanError::NoUsableIdentifier)
                }
            }
            ParsedIdentifier::Opaque(raw) => {
                let value =
                    IdentifierText::new(raw).map_err(|_| ScanError::NoUsableIdentifier)?;
                Ok(LookupQuery::any_identity(value))
            }
        }
    }
}

impl StructuredIdentifier {
    fn from_fields(mut fields: Map<String, Value>) -> Self {
        let patient_id = take_string(&mut fields, "patientId");
        let nfc_id = take_string(&mut fields, "nfcId");
        let qr_code = take_string(&mut fields, "qrCode");
        let id = take_string(&mut fields, "id");

        Self {
            patient_id,
            nfc_id,
            qr_code,
            id,
            extra: fields,
        }
    }
}

/// Remove a field from the payload map, coercing it to a string.
///
/// Numeric values are accepted (legacy cards encode bare serial numbers);
/// any other shape is left in place as an extra field.
fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    let coerced = match fields.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    if coerced.is_some() {
        fields.remove(key);
    }
    coerced
}

/// Treat blank or over-long field values as absent.
fn usable(field: &Option<String>) -> Option<IdentifierText> {
    field.as_deref().and_then(|value| IdentifierText::new(value).ok())
}

/// One-shot resolution: payload in, query out.
pub fn resolve(raw: &str) -> Result<LookupQuery, ScanError> {
    ParsedIdentifier::parse(raw)?.to_query()
}
