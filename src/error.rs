//! Error types for the EKM iSerial protocol.

use thiserror::Error;

use crate::types::{CodeTable, Field, ResponseVariant};

/// Result type alias for meter operations.
pub type Result<T> = std::result::Result<T, MeterError>;

/// EKM iSerial error types.
///
/// Checksum mismatches and unreadable meter clocks are not errors; they are
/// reported through [`crate::observer::Observer`] and decoding continues.
#[derive(Debug, Error)]
pub enum MeterError {
    /// Invalid session configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Meter number is not 1-12 digits
    #[error("Invalid meter number: {0}")]
    InvalidMeterNumber(String),

    /// Transport returned no data
    #[error("No response from meter for request {variant}: {reason}")]
    NoResponse {
        variant: ResponseVariant,
        reason: String,
    },

    /// Response buffer has the wrong length
    #[error("Malformed response {variant}: expected {expected} bytes, got {actual}")]
    MalformedResponse {
        variant: ResponseVariant,
        expected: usize,
        actual: usize,
    },

    /// Raw field content does not parse under its casting rule
    #[error("Cannot cast field {field}: {reason}")]
    FieldCast { field: Field, reason: String },

    /// Code outside the documented range of a lookup table
    #[error("Unknown {table} code: {code}")]
    UnknownCode { table: CodeTable, code: i64 },

    /// Field name not known, or never produced by either variant
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connection or read timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeterError {
    /// Create a configuration error with a message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a field cast error.
    pub fn field_cast(field: Field, reason: impl Into<String>) -> Self {
        Self::FieldCast {
            field,
            reason: reason.into(),
        }
    }

    /// Create an unknown code error.
    pub fn unknown_code(table: CodeTable, code: i64) -> Self {
        Self::UnknownCode { table, code }
    }

    /// Create a no-response error.
    pub fn no_response(variant: ResponseVariant, reason: impl Into<String>) -> Self {
        Self::NoResponse {
            variant,
            reason: reason.into(),
        }
    }

    /// Check if this error was raised while building a session.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InvalidMeterNumber(_))
    }

    /// Check if this error aborts a read cycle.
    pub fn is_cycle_abort(&self) -> bool {
        matches!(
            self,
            Self::NoResponse { .. }
                | Self::MalformedResponse { .. }
                | Self::FieldCast { .. }
                | Self::UnknownCode { .. }
        )
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoResponse { .. }
                | Self::MalformedResponse { .. }
                | Self::Connection(_)
                | Self::Timeout(_)
        )
    }
}
