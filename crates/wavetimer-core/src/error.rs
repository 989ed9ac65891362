//! Core error types for wavetimer-core.
//!
//! Most failures in the background process are logged and swallowed at the
//! call site; these types exist so the layers below can still report them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for wavetimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Settings store errors
    #[error("Settings store error: {0}")]
    Store(#[from] StoreError),

    /// Audio output errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Wire protocol errors
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Data directory could not be resolved or created
    #[error("Cannot prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Settings store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading the backing document failed
    #[error("Failed to read settings for '{user}': {message}")]
    ReadFailed { user: String, message: String },

    /// Writing the backing document failed
    #[error("Failed to write settings for '{user}': {message}")]
    WriteFailed { user: String, message: String },

    /// The store lock was poisoned by a panicking writer
    #[error("Settings store is poisoned")]
    Poisoned,
}

/// Audio output errors.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The requested asset is not available
    #[error("Audio asset '{0}' is unavailable")]
    AssetUnavailable(String),

    /// No asset was loaded before playback was requested
    #[error("No audio asset loaded")]
    NotLoaded,

    /// Output already released
    #[error("Audio output has been disposed")]
    Disposed,

    /// Device-level failure
    #[error("Audio device error: {0}")]
    Device(String),
}

/// Wire protocol errors.
#[derive(Error, Debug)]
pub enum WireError {
    /// The line is not a JSON object
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// A snapshot line lacks a required field
    #[error("Snapshot is missing field '{0}'")]
    MissingField(&'static str),

    /// Serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Duration outside the accepted range
    #[error("Duration must be at least 1 second, got {0}")]
    Duration(i64),

    /// Volume outside [0, 1]
    #[error("Volume must be within 0.0..=1.0, got {0}")]
    Volume(f64),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
