//! Structured error types for store and configuration operations.
//!
//! These errors never cross the resolver's public surface: backends convert
//! them into absent values or `false` after logging them.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors
    InvalidPath,
    InvalidValue,

    // Backend errors
    BackendUnavailable,
    Serialization,
    Io,
    Database,

    Internal,
}

/// Structured error raised by raw stores and configuration loading.
#[derive(Debug, Serialize)]
pub struct ConfigError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ConfigError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            key: None,
            details: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn invalid_path(path: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidPath,
            format!("Invalid config path '{}': {}", path, reason),
        )
    }

    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidValue, reason)
    }

    pub fn unavailable(backend: &str) -> Self {
        Self::new(
            ErrorCode::BackendUnavailable,
            format!("{} store unavailable", backend),
        )
    }

    pub fn serialization(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Serialization, err.to_string())
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Database, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Internal, err.to_string())
    }

    /// JSON form, used as diagnostic payload.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            Some(ref key) => write!(f, "{} (key: {})", self.message, key),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorCode::Io, err.to_string()).with_details(format!("{:?}", err.kind()))
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err)
    }
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        Self::database(err)
    }
}

impl From<refinery::Error> for ConfigError {
    fn from(err: refinery::Error) -> Self {
        Self::database(err)
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ConfigError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ConfigError>() {
            Ok(config_err) => config_err,
            Err(err) => ConfigError::internal(err),
        }
    }
}

/// Result type for raw store operations.
pub type StoreResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_key_when_present() {
        let err = ConfigError::unavailable("primary").with_key("_lcfg_debug");
        assert_eq!(err.to_string(), "primary store unavailable (key: _lcfg_debug)");
        assert_eq!(err.code, ErrorCode::BackendUnavailable);
    }

    #[test]
    fn anyhow_roundtrip_preserves_code() {
        let err: anyhow::Error = ConfigError::invalid_path("a..b", "empty segment").into();
        let back = ConfigError::from(err);
        assert_eq!(back.code, ErrorCode::InvalidPath);
    }

    #[test]
    fn io_errors_map_to_io_code() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::from(io);
        assert_eq!(err.code, ErrorCode::Io);
        assert_eq!(err.details.as_deref(), Some("PermissionDenied"));
    }

    #[test]
    fn serializes_with_screaming_code() {
        let err = ConfigError::invalid_value("null is not storable");
        let json = err.to_json();
        assert_eq!(json["code"], "INVALID_VALUE");
        assert!(json.get("key").is_none());
    }
}
