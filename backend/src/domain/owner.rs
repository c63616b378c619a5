//! Owning identity of an expense record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`OwnerId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerIdValidationError {
    Empty,
    SurroundingWhitespace,
}

impl fmt::Display for OwnerIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "owner id must not be empty"),
            Self::SurroundingWhitespace => {
                write!(f, "owner id must not have surrounding whitespace")
            }
        }
    }
}

impl std::error::Error for OwnerIdValidationError {}

/// Authenticated subject that owns expense records.
///
/// Upstream authenticators hand out opaque subjects (user-pool `sub` claims,
/// custom authorizer principals), so no format beyond "non-empty, trimmed" is
/// enforced. Stored under the `userId` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Validate and construct an [`OwnerId`].
    ///
    /// # Examples
    /// ```
    /// use receipts::domain::OwnerId;
    ///
    /// assert!(OwnerId::new("a1b2").is_ok());
    /// assert!(OwnerId::new("  ").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, OwnerIdValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(OwnerIdValidationError::Empty);
        }
        if id.trim() != id {
            return Err(OwnerIdValidationError::SurroundingWhitespace);
        }
        Ok(Self(id))
    }

    /// Borrow the raw subject.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = OwnerIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(value: OwnerId) -> Self {
        value.0
    }
}
