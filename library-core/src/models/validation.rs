//! Validation errors raised while constructing domain values

use thiserror::Error;

/// Why a piece of user input was rejected.
///
/// Field names are static so the HTTP layer can echo them back without
/// allocating or leaking request content into logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} has too many entries (max {max})")]
    TooMany { field: &'static str, max: usize },

    #[error("{field}: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    #[error("invalid {field} value: '{value}'")]
    InvalidVariant { field: &'static str, value: String },

    /// Row read back from storage breaks a domain invariant.
    #[error("corrupt {entity} record: {reason}")]
    Corrupt {
        entity: &'static str,
        reason: &'static str,
    },
}

/// Trim `s` and check it is non-empty and at most `max` characters.
pub(crate) fn bounded(field: &'static str, s: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}
