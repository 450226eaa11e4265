/// Upper bound on identifier length.
///
/// Card payload fields come from untrusted media (QR codes, NFC tags); anything
/// longer than this is not a plausible identity value.
pub const MAX_IDENTIFIER_LEN: usize = 512;

/// Errors that can occur when creating validated identifier types.
#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    /// The input was empty or contained only whitespace
    #[error("Identifier cannot be empty")]
    Empty,
    /// The input exceeded [`MAX_IDENTIFIER_LEN`] characters after trimming
    #[error("Identifier exceeds {MAX_IDENTIFIER_LEN} characters")]
    TooLong,
}

/// A string type that guarantees a usable identifier value.
///
/// This type wraps a `String` and ensures it contains at least one
/// non-whitespace character and stays within [`MAX_IDENTIFIER_LEN`]. The input
/// is trimmed of leading and trailing whitespace during construction, so two
/// scans of the same card normalise to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentifierText(String);

impl IdentifierText {
    /// Creates a new `IdentifierText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, or longer than [`MAX_IDENTIFIER_LEN`], an error is
    /// returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(IdentifierText)` if the trimmed input is usable, or an
    /// [`IdentifierError`] describing why it is not.
    pub fn new(input: impl AsRef<str>) -> Result<Self, IdentifierError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if trimmed.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns the inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for IdentifierText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for IdentifierText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for IdentifierText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for IdentifierText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        IdentifierText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let id = IdentifierText::new("  NFC_P987  ").expect("valid identifier");
        assert_eq!(id.as_str(), "NFC_P987");
    }

    #[test]
    fn rejects_blank_input() {
        assert!(matches!(
            IdentifierText::new("   "),
            Err(IdentifierError::Empty)
        ));
        assert!(matches!(IdentifierText::new(""), Err(IdentifierError::Empty)));
    }

    #[test]
    fn rejects_overlong_input() {
        let long = "x".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(matches!(
            IdentifierText::new(long),
            Err(IdentifierError::TooLong)
        ));
    }

    #[test]
    fn serde_round_trip() {
        let id = IdentifierText::new("P1234567890").expect("valid identifier");
        let json = serde_json::to_string(&id).expect("serialise");
        let back: IdentifierText = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(id, back);
    }

    #[test]
    fn deserialise_rejects_blank() {
        let result: Result<IdentifierText, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }
}
