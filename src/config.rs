use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_MARKER_NAME: &str = "jf5Tg";
pub const DEFAULT_BASE_URL: &str = "https://api.mapzebrain.org/media/";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_marker_name: String,
    pub debug: bool,
    pub atlas: AtlasSettings,
    pub view: ViewSettings,
    pub export: ExportSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AtlasSettings {
    pub base_url: String,
    pub cache_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub fetch_buffer_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub point_size: f32,
    pub region_alpha: f32,
    /// Every n-th boundary voxel is kept for the 3D region outline.
    pub region_outline_stride: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub dpi: u32,
    pub width: u32,
    pub height: u32,
    pub output_dir: PathBuf,
    pub scale_bar_voxels: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_marker_name: DEFAULT_MARKER_NAME.to_string(),
            debug: false,
            atlas: AtlasSettings::default(),
            view: ViewSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

impl Default for AtlasSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("mapzebview"),
            request_timeout_secs: 60,
            fetch_buffer_size: 64,
        }
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            point_size: 3.0,
            region_alpha: 0.1,
            region_outline_stride: 7,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            dpi: 300,
            width: 1000,
            height: 600,
            output_dir: PathBuf::from("."),
            scale_bar_voxels: 100.0,
        }
    }
}

impl Settings {
    /// Defaults, then the optional file, then `MAPZEBVIEW__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = Config::builder();
        match path {
            Some(path) => builder = builder.add_source(File::from(path).required(true)),
            None => builder = builder.add_source(File::with_name("mapzebview").required(false)),
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("MAPZEBVIEW")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }

    pub fn markers_dir(&self) -> PathBuf {
        self.atlas.cache_dir.join("markers")
    }

    pub fn regions_dir(&self) -> PathBuf {
        self.atlas.cache_dir.join("regions")
    }

    /// Export scale relative to a 100 dpi baseline.
    pub fn export_scale(&self) -> f32 {
        (self.export.dpi.max(1) as f32) / 100.0
    }
}
