//! # Error Types
//!
//! Custom error types for the operator interface using `thiserror`.

use thiserror::Error;

/// Main error type for the operator interface
#[derive(Debug, Error)]
pub enum OiError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Controller device errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// Discovery found no gamepad for a driver station port
    #[error("No controller found for port {0}")]
    ControllerNotFound(usize),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the operator interface
pub type Result<T> = std::result::Result<T, OiError>;
