pub mod app;
pub mod atlas;
pub mod config;
pub mod error;
pub mod export;
pub mod roi;
pub mod scene;

pub use app::{RunOptions, RunOptionsBuilder, run};
pub use config::Settings;
pub use error::{AppError, AtlasError, ExportError, RoiError};
