use std::path::PathBuf;

use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Atlas data unavailable: {0}")]
    DataUnavailable(#[from] AtlasError),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Feature unavailable: {0}")]
    FeatureUnavailable(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Export failed: {0}")]
    Export(ExportError),
    #[error("UI error: {0}")]
    Ui(String),
}

// Atlas Error Type
#[derive(Error, Debug, Clone)]
pub enum AtlasError {
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("Unknown marker line '{0}'")]
    UnknownMarker(String),
    #[error("Unknown region '{0}'")]
    UnknownRegion(String),
    #[error("Failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },
    #[error("Failed to access cache at {path}: {reason}")]
    Cache { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RoiError {
    #[error("Expected columns x, y, z but found [{}]", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Expected shape (N, 3) but found {0:?}")]
    BadShape(Vec<usize>),
    #[error("Column lengths differ: x={0}, y={1}, z={2}")]
    RaggedColumns(usize, usize, usize),
    #[error("Coordinate at row {0} is not finite")]
    NonFinite(usize),
    #[error("Unsupported file extension '{0}'")]
    UnsupportedExtension(String),
    #[error("ROI set name must not be empty")]
    EmptyName,
    #[error("Both points and named ROI sets were given")]
    AmbiguousInput,
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read {}: {reason}", .path.display())]
    Read { path: PathBuf, reason: String },
    #[error("Reading {0} files requires the '{1}' feature")]
    FeatureDisabled(&'static str, &'static str),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Figure export is not available in this build")]
    Disabled,
    #[error("No marker volume loaded")]
    NoVolume,
    #[error("Unknown projection '{0}'")]
    UnknownProjection(String),
    #[error("Figure size {0}x{1} px is empty or too large")]
    InvalidSize(u32, u32),
    #[error("Failed to write figure: {0}")]
    Write(String),
}

impl From<RoiError> for AppError {
    fn from(error: RoiError) -> Self {
        match error {
            RoiError::NotFound(path) => AppError::FileNotFound(path),
            RoiError::FeatureDisabled(..) => AppError::FeatureUnavailable(error.to_string()),
            other => AppError::InvalidFormat(other.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(error: ExportError) -> Self {
        match error {
            ExportError::Disabled => AppError::FeatureUnavailable(error.to_string()),
            other => AppError::Export(other),
        }
    }
}
