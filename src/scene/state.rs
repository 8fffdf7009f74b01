use std::collections::BTreeMap;
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::roi::RoiPoints;
use crate::scene::camera::Camera;
use crate::scene::palette::Rgb;

/// A loaded ROI set together with its display settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiLayer {
    pub points: RoiPoints,
    pub visible: bool,
    pub color: Rgb,
}

/// Cursor (the three section indices) and 3D camera.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewParams {
    pub cursor: [usize; 3],
    pub camera: Camera,
}

/// Everything the user has selected. Only the interaction controller mutates
/// it; composer and export read it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneState {
    pub marker: Option<String>,
    /// Selected regions and their colors, keyed by name.
    pub regions: BTreeMap<String, Rgb>,
    /// ROI sets in insertion order.
    pub roi_sets: IndexMap<String, RoiLayer>,
    pub view: ViewParams,
}

impl SceneState {
    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    pub fn has_region(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    pub fn visible_roi_sets(&self) -> impl Iterator<Item = (&str, &RoiLayer)> {
        self.roi_sets
            .iter()
            .filter(|(_, layer)| layer.visible)
            .map(|(name, layer)| (name.as_str(), layer))
    }
}

/// Notification of a single applied change to [`SceneState`].
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    MarkerRequested(String),
    MarkerLoaded(String),
    RegionRequested(String),
    RegionAdded(String),
    RegionRemoved(String),
    RegionRecolored(String),
    RoiSetAdded(String),
    RoiSetReplaced(String),
    RoiSetRemoved(String),
    RoiSetStyled(String),
    ViewChanged,
    FigureExported(PathBuf),
}
