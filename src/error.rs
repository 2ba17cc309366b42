use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForensicsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Image decoding error: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Failed to persist artifact {path}: {source}")]
    ArtifactPersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Which side of the boundary is to blame for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    Server,
}

impl ForensicsError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ForensicsError::InvalidInput(_)
            | ForensicsError::Decode(_)
            | ForensicsError::InvalidParameter(_) => ErrorClass::Client,
            _ => ErrorClass::Server,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self.class() {
            ErrorClass::Client => 400,
            ErrorClass::Server => 500,
        }
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ForensicsError::InvalidInput(_) => "invalid_input",
            ForensicsError::Decode(_) => "decode_error",
            ForensicsError::ModelUnavailable(_) => "model_unavailable",
            ForensicsError::Inference(_) => "inference_error",
            ForensicsError::ShapeMismatch { .. } => "shape_mismatch",
            ForensicsError::ArtifactPersist { .. } => "artifact_persist_error",
            ForensicsError::Io(_) => "io_error",
            ForensicsError::AnalysisFailed(_) => "analysis_failed",
            ForensicsError::InvalidParameter(_) => "invalid_parameter",
            ForensicsError::Config(_) => "config_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ForensicsError>;
