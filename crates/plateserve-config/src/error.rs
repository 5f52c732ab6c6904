//! # Design
//!
//! - Keep error messages constant; the offending key and value live in fields.
//! - Reasons are machine-readable so tests can match on them.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Environment key (or logical field) that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str, value: &str) -> Self {
        Self::InvalidField {
            field,
            reason,
            value: Some(value.to_string()),
        }
    }

    /// Machine-readable reason attached to the error.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidField { reason, .. } => reason,
        }
    }

    /// Field that failed validation.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidField { field, .. } => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_field_keeps_context_out_of_message() {
        let err = ConfigError::invalid("PLATESERVE_HTTP_PORT", "out_of_range", "70000");
        assert_eq!(err.to_string(), "invalid configuration field");
        assert_eq!(err.field(), "PLATESERVE_HTTP_PORT");
        assert_eq!(err.reason(), "out_of_range");
        assert!(matches!(
            err,
            ConfigError::InvalidField { value: Some(ref value), .. } if value == "70000"
        ));
    }
}
