use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::atlas::volume::Volume;
use crate::error::AtlasError;

/// One row of `markers_catalog.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarkerEntry {
    pub name: String,
    pub stack: String,
}

/// Marker line name to stack location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerCatalog {
    stacks: BTreeMap<String, String>,
}

impl MarkerCatalog {
    pub fn from_entries(entries: impl IntoIterator<Item = MarkerEntry>) -> Self {
        Self {
            stacks: entries
                .into_iter()
                .map(|entry| (entry.name, entry.stack))
                .collect(),
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let entries: Vec<MarkerEntry> = serde_json::from_slice(bytes)?;
        Ok(Self::from_entries(entries))
    }

    pub fn stack(&self, name: &str) -> Option<&str> {
        self.stacks.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stacks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stacks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

/// Where atlas assets come from.
#[async_trait]
pub trait AtlasSource: Send + Sync {
    async fn marker_catalog(&self) -> Result<MarkerCatalog, AtlasError>;
    async fn marker_volume(&self, name: &str) -> Result<Volume, AtlasError>;
    async fn region_mask(&self, name: &str) -> Result<Volume, AtlasError>;
}
