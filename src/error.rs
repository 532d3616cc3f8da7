//! # Error Types
//!
//! Custom error types for RC Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for RC Bridge
#[derive(Debug, Error)]
pub enum RcBridgeError {
    /// Link frame encoding/decoding errors
    #[error("frame error: {0}")]
    Frame(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Serial port errors
    #[error("serial error: {0}")]
    Serial(String),

    /// Controller device errors
    #[error("controller error: {0}")]
    Controller(String),

    /// No controller device found on the system
    #[error("no controller found")]
    ControllerNotFound,

    /// Head-tracking sensor link errors
    #[error("sensor error: {0}")]
    Sensor(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for RC Bridge
pub type Result<T> = std::result::Result<T, RcBridgeError>;
