//! Typed lookup queries over the patient identity columns.
//!
//! A [`LookupQuery`] is a set of equality predicates combined with OR
//! semantics. Queries are non-empty by construction: predicate values are
//! [`IdentifierText`], which cannot be blank, and there is no empty-query
//! constructor.

use medicard_types::IdentifierText;

use crate::patient::PatientRecord;

/// The three columns an identifier can be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityColumn {
    /// The canonical human-readable ID printed on the physical card.
    PatientId,
    /// The NFC tag serial.
    NfcId,
    /// The value encoded in the QR code.
    QrCode,
}

impl IdentityColumn {
    pub const ALL: [IdentityColumn; 3] = [
        IdentityColumn::PatientId,
        IdentityColumn::NfcId,
        IdentityColumn::QrCode,
    ];

    /// Column name in the backing patient table.
    pub fn column_name(self) -> &'static str {
        match self {
            IdentityColumn::PatientId => "patient_id",
            IdentityColumn::NfcId => "nfc_id",
            IdentityColumn::QrCode => "qr_code",
        }
    }
}

/// A single `column = value` equality predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: IdentityColumn,
    pub value: IdentifierText,
}

/// Equality predicates over the identity columns, combined with OR semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupQuery {
    predicates: Vec<Predicate>,
}

impl LookupQuery {
    /// A query matching exactly one column.
    pub fn exact(column: IdentityColumn, value: IdentifierText) -> Self {
        Self {
            predicates: vec![Predicate { column, value }],
        }
    }

    /// A query matching the value against every identity column.
    ///
    /// Used for bare identifiers whose issuing medium is unknown: once a tag
    /// serial or code value is reduced to a bare string, nothing says which
    /// column it belongs to, so all three are checked.
    pub fn any_identity(value: IdentifierText) -> Self {
        Self {
            predicates: IdentityColumn::ALL
                .into_iter()
                .map(|column| Predicate {
                    column,
                    value: value.clone(),
                })
                .collect(),
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Whether any predicate matches the given record.
    pub fn matches(&self, record: &PatientRecord) -> bool {
        self.predicates.iter().any(|predicate| {
            record.identity_value(predicate.column) == Some(predicate.value.as_str())
        })
    }
}

impl std::fmt::Display for LookupQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                write!(f, " OR ")?;
            }
            write!(f, "{} = {}", predicate.column.column_name(), predicate.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_record() -> PatientRecord {
        PatientRecord {
            id: Uuid::new_v4(),
            patient_id: IdentifierText::new("P1234567890").expect("valid identifier"),
            nfc_id: Some("NFC_P987".into()),
            qr_code: None,
            full_name: "John Doe".into(),
            date_of_birth: None,
            gender: None,
            blood_type: Some("A+".into()),
            allergies: vec!["Penicillin".into()],
            medical_conditions: vec![],
            phone: None,
            email: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn exact_query_matches_single_column() {
        let record = sample_record();
        let value = IdentifierText::new("P1234567890").expect("valid identifier");

        let query = LookupQuery::exact(IdentityColumn::PatientId, value.clone());
        assert!(query.matches(&record));

        // Same value against a different column does not match.
        let query = LookupQuery::exact(IdentityColumn::NfcId, value);
        assert!(!query.matches(&record));
    }

    #[test]
    fn any_identity_checks_all_columns() {
        let record = sample_record();
        let query =
            LookupQuery::any_identity(IdentifierText::new("NFC_P987").expect("valid identifier"));
        assert_eq!(query.predicates().len(), 3);
        assert!(query.matches(&record));
    }

    #[test]
    fn unset_column_never_matches() {
        let record = sample_record();
        let query = LookupQuery::exact(
            IdentityColumn::QrCode,
            IdentifierText::new("QR_MISSING").expect("valid identifier"),
        );
        assert!(!query.matches(&record));
    }

    #[test]
    fn display_renders_or_chain() {
        let query =
            LookupQuery::any_identity(IdentifierText::new("X1").expect("valid identifier"));
        assert_eq!(
            query.to_string(),
            "patient_id = X1 OR nfc_id = X1 OR qr_code = X1"
        );
    }
}
