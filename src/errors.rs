use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for grain measurement
#[derive(Error, Debug)]
pub enum GrainError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration from {path}: {source}")]
    ConfigLoad {
        source: toml::de::Error,
        path: PathBuf,
    },

    #[error("Dataset entry '{entry}' references unknown background class '{class}'")]
    UnknownClass {
        entry: String,
        class: String,
    },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, GrainError>;
