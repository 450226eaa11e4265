//! Error types for the scan-to-identify core.
//!
//! The scan taxonomy keeps its three causes distinct: a payload that could
//! not be interpreted, a lookup that matched nothing, and a capability or
//! backend failure each call for a different operator response.

/// Errors that terminate a scan session in the `Failed` phase.
///
/// Every variant is recoverable by resetting the session; none are fatal to
/// the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// The payload parsed but carried no recognised identifier field, or was
    /// blank to begin with.
    #[error("scanned payload contained no usable identifier")]
    NoUsableIdentifier,
    /// The lookup executed but no patient matched.
    #[error("no patient matched the scanned identifier")]
    NotFound,
    /// The scan capability or the lookup backend failed.
    #[error("scan transport failure: {0}")]
    Transport(String),
}

impl ScanError {
    /// Stable machine-readable tag for this error cause.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::NoUsableIdentifier => "no_usable_identifier",
            ScanError::NotFound => "not_found",
            ScanError::Transport(_) => "transport",
        }
    }
}

/// Errors reported by a scan capability (camera decoder, tag reader).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("scan hardware is not supported on this device")]
    Unsupported,
    #[error("scan device error: {0}")]
    Device(String),
}

/// Errors raised by the patient directory store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("identifier already registered to another patient: {0}")]
    DuplicateIdentifier(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create patient directory: {0}")]
    PatientDirCreation(std::io::Error),
    #[error("failed to write patient file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read patient file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialise patient: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialise patient: {0}")]
    Deserialization(serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_kinds_are_stable() {
        assert_eq!(ScanError::NoUsableIdentifier.kind(), "no_usable_identifier");
        assert_eq!(ScanError::NotFound.kind(), "not_found");
        assert_eq!(ScanError::Transport("net down".into()).kind(), "transport");
    }

    #[test]
    fn transport_message_is_preserved() {
        let err = ScanError::Transport("backend unreachable".into());
        assert_eq!(
            err.to_string(),
            "scan transport failure: backend unreachable"
        );
    }
}
