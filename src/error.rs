//! # Error Types
//!
//! Custom error types for FX10 Teleop using `thiserror`.

use thiserror::Error;

/// Main error type for FX10 Teleop
#[derive(Debug, Error)]
pub enum TeleopError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Gamepad device errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No supported gamepad attached
    #[error("No supported gamepad found")]
    ControllerNotFound,

    /// Remote service never became reachable
    #[error("Service {service} not available after {timeout_ms} ms")]
    ServiceUnavailable { service: String, timeout_ms: u64 },

    /// Remote service call failed
    #[error("Service {service} call failed: {reason}")]
    ServiceCall { service: String, reason: String },

    /// Command serialization errors
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type alias for FX10 Teleop
pub type Result<T> = std::result::Result<T, TeleopError>;
