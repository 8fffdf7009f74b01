use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::atlas::{MarkerCatalog, Volume};
use crate::error::AtlasError;
use crate::export::ExportRequest;
use crate::roi::{RoiInput, RoiPoints};
use crate::scene::{Rgb, ViewParams};

/// Everything a view can ask the controller to do.
#[derive(Debug, Clone)]
pub enum UiCommand {
    SelectMarker(String),
    ToggleRegion(String),
    AddRoiSet { name: String, points: RoiPoints },
    RemoveRoiSet(String),
    SetView(ViewParams),
    SetCursor([usize; 3]),
    ImportFile(PathBuf),
    ImportRois(RoiInput),
    SetRoiVisible(String, bool),
    SetRoiColor(String, Rgb),
    SetRegionColor(String, Rgb),
    Export(ExportRequest),
    DismissNotices,
}

/// Results of background fetches, delivered to the UI thread.
pub(crate) enum FetchOutcome {
    Catalog(Result<Arc<MarkerCatalog>, AtlasError>),
    Marker {
        name: String,
        result: Result<Arc<Volume>, AtlasError>,
    },
    Region {
        name: String,
        result: Result<Arc<Volume>, AtlasError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message for the notice panel.
#[derive(Debug, Clone)]
pub struct Notice {
    pub at: DateTime<Local>,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            at: Local::now(),
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            at: Local::now(),
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "INFO",
            NoticeLevel::Error => "ERROR",
        };
        write!(f, "{} [{}] {}", self.at.format("%H:%M:%S"), tag, self.message)
    }
}
