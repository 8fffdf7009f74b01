use std::path::PathBuf;

use indexmap::IndexMap;

use crate::error::{AppError, RoiError};
use crate::roi::{RoiInput, RoiPoints};

/// What to show when the viewer opens.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Marker line to load; the configured default when `None`.
    pub marker: Option<String>,
    pub regions: Vec<String>,
    pub rois: Option<RoiInput>,
    pub roi_files: Vec<PathBuf>,
}

impl RunOptions {
    pub fn builder() -> RunOptionsBuilder {
        RunOptionsBuilder::new()
    }
}

#[derive(Debug, Default)]
pub struct RunOptionsBuilder {
    marker: Option<String>,
    regions: Vec<String>,
    points: Option<RoiPoints>,
    roi_sets: Option<IndexMap<String, RoiPoints>>,
    roi_files: Vec<PathBuf>,
}

impl RunOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.regions.push(region.into());
        self
    }

    pub fn regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions.extend(regions.into_iter().map(Into::into));
        self
    }

    /// A single unnamed ROI set.
    pub fn points(mut self, points: RoiPoints) -> Self {
        self.points = Some(points);
        self
    }

    pub fn roi_set(mut self, name: impl Into<String>, points: RoiPoints) -> Self {
        self.roi_sets
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), points);
        self
    }

    pub fn roi_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.roi_files.push(path.into());
        self
    }

    /// Fails when both unnamed points and named sets were given.
    pub fn build(self) -> Result<RunOptions, AppError> {
        let rois = match (self.points, self.roi_sets) {
            (Some(_), Some(_)) => return Err(RoiError::AmbiguousInput.into()),
            (Some(points), None) => Some(RoiInput::Single(points)),
            (None, Some(sets)) => Some(RoiInput::Named(sets)),
            (None, None) => None,
        };
        Ok(RunOptions {
            marker: self.marker,
            regions: self.regions,
            rois,
            roi_files: self.roi_files,
        })
    }
}
