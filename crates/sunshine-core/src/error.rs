//! Centralized error types for Sunshine.
//!
//! This module provides a typed error hierarchy that:
//! - Separates sync-channel failures from configuration problems
//! - Provides short messages suitable for a status line on the watch
//! - Preserves full error context for logging

use thiserror::Error;

/// Top-level application error type.
///
/// All errors in Sunshine should be convertible to this type.
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    /// Recover the typed error behind an `anyhow` chain when there is one.
    fn from(e: anyhow::Error) -> Self {
        let e = match e.downcast::<SyncError>() {
            Ok(e) => return AppError::Sync(e),
            Err(e) => e,
        };
        let e = match e.downcast::<ConfigError>() {
            Ok(e) => return AppError::Config(e),
            Err(e) => e,
        };
        let e = match e.downcast::<toml::de::Error>() {
            Ok(e) => return AppError::Config(e.into()),
            Err(e) => e,
        };
        match e.downcast::<std::io::Error>() {
            Ok(e) => AppError::Io(e),
            Err(e) => AppError::Other(e),
        }
    }
}

impl AppError {
    /// Returns a short message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Sync(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed.",
            AppError::Other(_) => "An unexpected error occurred.",
        }
    }
}

/// Device-sync channel errors (connection lifecycle, publish, record decoding).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Listener not registered: {0}")]
    UnknownListener(u64),

    #[error("Malformed record at {path}: {message}")]
    Decode { path: String, message: String },
}

impl SyncError {
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            SyncError::ConnectionFailed(_) => "Unable to reach the paired device.",
            SyncError::NotConnected => "Not connected to the paired device.",
            SyncError::PublishFailed(_) => "Weather update could not be sent.",
            SyncError::UnknownListener(_) => "Weather updates are not being received.",
            SyncError::Decode { .. } => "Received weather data could not be read.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "No configuration directory on this system.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::ParseError(e.to_string())
    }
}
