#[cfg(feature = "export")]
mod renderer;

use std::path::PathBuf;

use crate::config::Settings;
use crate::error::ExportError;
use crate::scene::{Camera, SceneComposer, SceneState};

/// Camera used for a figure.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// One of the named orthographic views, e.g. `xy` or `-yz`.
    Named(String),
    /// Whatever the 3D view currently shows.
    Current,
}

impl Projection {
    pub fn camera(&self, state: &SceneState) -> Result<Camera, ExportError> {
        match self {
            Projection::Named(name) => {
                Camera::named(name).ok_or_else(|| ExportError::UnknownProjection(name.clone()))
            }
            Projection::Current => Ok(state.view.camera),
        }
    }
}

/// Largest figure that is rendered, in pixels after dpi scaling.
pub const MAX_PIXELS: u64 = 100_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub projection: Projection,
    /// Figure size at 100 dpi; the output is scaled by `dpi / 100`.
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub path: PathBuf,
}

impl ExportRequest {
    pub fn from_settings(settings: &Settings, projection: Projection, file_name: &str) -> Self {
        Self {
            projection,
            width: settings.export.width,
            height: settings.export.height,
            dpi: settings.export.dpi,
            path: settings.export.output_dir.join(file_name),
        }
    }

    pub fn scale(&self) -> f32 {
        self.dpi.max(1) as f32 / 100.0
    }

    /// Output size in pixels; empty or oversized figures are rejected.
    pub fn pixel_size(&self) -> Result<[u32; 2], ExportError> {
        let scale = self.scale();
        let width = (self.width as f32 * scale).round() as u32;
        let height = (self.height as f32 * scale).round() as u32;
        if width == 0 || height == 0 || u64::from(width) * u64::from(height) > MAX_PIXELS {
            return Err(ExportError::InvalidSize(width, height));
        }
        Ok([width, height])
    }
}

/// Figure styling drawn from the view and export settings.
#[derive(Debug, Clone, Copy)]
pub struct FigureStyle {
    pub point_size: f32,
    pub region_alpha: f32,
    pub scale_bar_voxels: f32,
}

impl FigureStyle {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            point_size: settings.view.point_size,
            region_alpha: settings.view.region_alpha,
            scale_bar_voxels: settings.export.scale_bar_voxels,
        }
    }
}

pub fn is_available() -> bool {
    cfg!(feature = "export")
}

/// Renders the current scene and writes it as PNG to `request.path`.
#[cfg(feature = "export")]
pub fn export_figure(
    state: &SceneState,
    composer: &SceneComposer,
    request: &ExportRequest,
    style: FigureStyle,
) -> Result<PathBuf, ExportError> {
    let image = renderer::render_figure(state, composer, request, style)?;
    if let Some(parent) = request.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ExportError::Write(e.to_string()))?;
    }
    image
        .save(&request.path)
        .map_err(|e| ExportError::Write(e.to_string()))?;
    tracing::info!(
        "Exported {}x{} figure to {}",
        image.width(),
        image.height(),
        request.path.display()
    );
    Ok(request.path.clone())
}

#[cfg(not(feature = "export"))]
pub fn export_figure(
    _state: &SceneState,
    _composer: &SceneComposer,
    _request: &ExportRequest,
    _style: FigureStyle,
) -> Result<PathBuf, ExportError> {
    Err(ExportError::Disabled)
}
