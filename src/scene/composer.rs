use std::collections::BTreeMap;
use std::sync::Arc;

use image::RgbaImage;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::atlas::{AtlasProvider, Volume};
use crate::roi::RoiPoints;
use crate::scene::frame::AtlasFrame;
use crate::scene::palette::Rgb;
use crate::scene::section::{SectionAxis, SectionOverlay, compose_section, section_points};
use crate::scene::state::{SceneState, StateChange};

pub struct VolumePrimitive {
    pub name: String,
    pub volume: Arc<Volume>,
    pub revision: u64,
}

pub struct RegionPrimitive {
    pub mask: Arc<Volume>,
    /// Subsampled boundary voxels in display coordinates.
    pub outline: Vec<[f32; 3]>,
    pub color: Rgb,
    pub revision: u64,
}

pub struct RoiPrimitive {
    pub atlas: RoiPoints,
    /// The same points in display coordinates.
    pub display: Vec<[f32; 3]>,
    pub color: Rgb,
    pub visible: bool,
    pub revision: u64,
}

/// 2D ROI points of one set on a section.
pub struct SectionPoints {
    pub name: String,
    pub color: Rgb,
    pub points: Vec<[f32; 2]>,
}

/// Renderable primitives derived from [`SceneState`], rebuilt per change.
pub struct SceneComposer {
    outline_stride: usize,
    frame: Option<AtlasFrame>,
    volume: Option<VolumePrimitive>,
    regions: BTreeMap<String, RegionPrimitive>,
    rois: IndexMap<String, RoiPrimitive>,
    revision: u64,
    section_revision: u64,
}

impl SceneComposer {
    pub fn new(outline_stride: usize) -> Self {
        Self {
            outline_stride,
            frame: None,
            volume: None,
            regions: BTreeMap::new(),
            rois: IndexMap::new(),
            revision: 0,
            section_revision: 0,
        }
    }

    pub fn frame(&self) -> Option<AtlasFrame> {
        self.frame
    }

    pub fn volume(&self) -> Option<&VolumePrimitive> {
        self.volume.as_ref()
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &RegionPrimitive)> {
        self.regions.iter().map(|(name, region)| (name.as_str(), region))
    }

    pub fn rois(&self) -> impl Iterator<Item = (&str, &RoiPrimitive)> {
        self.rois.iter().map(|(name, roi)| (name.as_str(), roi))
    }

    pub fn region(&self, name: &str) -> Option<&RegionPrimitive> {
        self.regions.get(name)
    }

    pub fn roi(&self, name: &str) -> Option<&RoiPrimitive> {
        self.rois.get(name)
    }

    /// Changes whenever anything drawn into section images changes.
    pub fn section_revision(&self) -> u64 {
        self.section_revision
    }

    /// Changes whenever any primitive changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Updates only the primitives touched by `change`.
    pub fn apply(&mut self, change: &StateChange, state: &SceneState, provider: &AtlasProvider) {
        match change {
            StateChange::MarkerLoaded(name) => {
                let Some(volume) = provider.cached_marker(name) else {
                    warn!("Marker {} reported loaded but not cached", name);
                    return;
                };
                let frame = AtlasFrame::new(volume.shape());
                let revision = self.bump();
                self.volume = Some(VolumePrimitive {
                    name: name.clone(),
                    volume,
                    revision,
                });
                self.section_revision = revision;
                if self.frame != Some(frame) {
                    debug!("Atlas frame changed to {:?}, rebuilding overlays", frame.bounds());
                    self.frame = Some(frame);
                    self.rebuild_all(state);
                }
            }
            StateChange::RegionAdded(name) => {
                let Some(mask) = provider.cached_region(name) else {
                    warn!("Region {} reported loaded but not cached", name);
                    return;
                };
                let color = state.regions.get(name).copied().unwrap_or(Rgb([255, 255, 255]));
                self.insert_region(name, mask, color);
            }
            StateChange::RegionRemoved(name) => {
                if self.regions.remove(name).is_some() {
                    self.section_revision = self.bump();
                }
            }
            StateChange::RegionRecolored(name) => {
                let Some(color) = state.regions.get(name).copied() else {
                    return;
                };
                let revision = self.bump();
                if let Some(region) = self.regions.get_mut(name) {
                    region.color = color;
                    region.revision = revision;
                    self.section_revision = revision;
                }
            }
            StateChange::RoiSetAdded(name) | StateChange::RoiSetReplaced(name) => {
                self.rebuild_roi(name, state);
            }
            StateChange::RoiSetRemoved(name) => {
                if self.rois.shift_remove(name).is_some() {
                    self.bump();
                }
            }
            StateChange::RoiSetStyled(name) => {
                let Some(layer) = state.roi_sets.get(name) else {
                    return;
                };
                let revision = self.bump();
                if let Some(roi) = self.rois.get_mut(name) {
                    roi.color = layer.color;
                    roi.visible = layer.visible;
                    roi.revision = revision;
                }
            }
            StateChange::MarkerRequested(_)
            | StateChange::RegionRequested(_)
            | StateChange::ViewChanged
            | StateChange::FigureExported(_) => {}
        }
    }

    fn insert_region(&mut self, name: &str, mask: Arc<Volume>, color: Rgb) {
        let frame = self.frame.unwrap_or_else(|| AtlasFrame::new(mask.shape()));
        let outline = frame.to_display_all(mask.boundary_voxels(self.outline_stride));
        debug!("Region {} outline has {} points", name, outline.len());
        let revision = self.bump();
        self.regions.insert(
            name.to_string(),
            RegionPrimitive {
                mask,
                outline,
                color,
                revision,
            },
        );
        self.section_revision = revision;
    }

    fn rebuild_roi(&mut self, name: &str, state: &SceneState) {
        let Some(layer) = state.roi_sets.get(name) else {
            return;
        };
        let display = match self.frame {
            Some(frame) => frame.to_display_all(layer.points.rows()),
            None => layer.points.rows().collect(),
        };
        let revision = self.bump();
        let primitive = RoiPrimitive {
            atlas: layer.points.clone(),
            display,
            color: layer.color,
            visible: layer.visible,
            revision,
        };
        // Replacing keeps the set's position.
        self.rois.insert(name.to_string(), primitive);
    }

    fn rebuild_all(&mut self, state: &SceneState) {
        let regions: Vec<(String, Arc<Volume>, Rgb)> = self
            .regions
            .iter()
            .map(|(name, region)| (name.clone(), region.mask.clone(), region.color))
            .collect();
        for (name, mask, color) in regions {
            self.insert_region(&name, mask, color);
        }
        let names: Vec<String> = self.rois.keys().cloned().collect();
        for name in names {
            self.rebuild_roi(&name, state);
        }
    }

    /// Marker slice with region overlays, or `None` before a marker is loaded.
    pub fn section_image(&self, axis: SectionAxis, index: usize) -> Option<RgbaImage> {
        let volume = self.volume.as_ref()?;
        let overlays: Vec<SectionOverlay<'_>> = self
            .regions
            .values()
            .map(|region| SectionOverlay {
                mask: &region.mask,
                color: region.color,
            })
            .collect();
        Some(compose_section(axis, index, &volume.volume, &overlays))
    }

    /// Visible ROI points lying on the given slice, per set.
    pub fn section_points(&self, axis: SectionAxis, index: usize) -> Vec<SectionPoints> {
        let Some(frame) = self.frame else {
            return Vec::new();
        };
        self.rois
            .iter()
            .filter(|(_, roi)| roi.visible)
            .map(|(name, roi)| SectionPoints {
                name: name.clone(),
                color: roi.color,
                points: section_points(axis, index, frame.shape(), roi.atlas.rows()),
            })
            .collect()
    }
}
