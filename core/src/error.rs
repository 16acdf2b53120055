//! Error types for onnx-shim.

use std::ffi::NulError;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::ErrorCode;

/// Result type alias for onnx-shim operations.
pub type Result<T> = std::result::Result<T, OrtError>;

/// Errors that can occur while talking to the engine.
#[derive(Debug, Error)]
pub enum OrtError {
    /// The engine reported a failure status.
    #[error("ONNX Runtime error ({code}): {message}")]
    Engine { code: ErrorCode, message: String },

    /// The linked runtime does not provide the requested API version.
    #[error("ONNX Runtime does not support API version {0}")]
    ApiUnavailable(u32),

    /// Inference failed outside of an engine status.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Invalid tensor.
    #[error("Invalid tensor: {0}")]
    Tensor(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A string passed to the engine contained an interior NUL byte.
    #[error("Invalid string: {0}")]
    InvalidString(#[from] NulError),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl OrtError {
    /// Create an engine error.
    pub fn engine(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Engine {
            code,
            message: message.into(),
        }
    }

    /// Create an inference error.
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a tensor error.
    pub fn tensor(msg: impl Into<String>) -> Self {
        Self::Tensor(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The engine error code, if this error came from an engine status.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}
