use std::time::Duration;

use async_trait::async_trait;
use ndarray::Array3;

use crate::atlas::regions::RegionCatalog;
use crate::atlas::source::{AtlasSource, MarkerCatalog, MarkerEntry};
use crate::atlas::volume::Volume;
use crate::error::AtlasError;

pub const DEBUG_SHAPE: [usize; 3] = [300, 700, 200];

const MARKERS: &[&str] = &["jf5Tg", "mpn212Tg", "elavl3H2BRFP", "gad1bGal4", "vglut2aGal4"];

/// Offline stand-in for the atlas server: octant-stepped marker volumes and
/// spherical region masks, all on the same grid.
pub struct SyntheticAtlasSource {
    shape: [usize; 3],
    regions: RegionCatalog,
    latency: Option<Duration>,
}

impl Default for SyntheticAtlasSource {
    fn default() -> Self {
        Self::new(DEBUG_SHAPE)
    }
}

impl SyntheticAtlasSource {
    pub fn new(shape: [usize; 3]) -> Self {
        Self {
            shape,
            regions: RegionCatalog::default(),
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn marker(&self, seed: u64) -> Volume {
        let [nx, ny, nz] = self.shape;
        let base = 40 + (seed % 16) as u8;
        let data = Array3::from_shape_fn((nx, ny, nz), |(x, y, z)| {
            let mut value = base;
            if x < nx / 2 {
                value += 60;
            }
            if y < ny / 2 {
                value += 60;
            }
            if z < nz / 2 {
                value += 60;
            }
            value
        });
        Volume::new(data)
    }

    fn sphere(&self, seed: u64) -> Volume {
        let [nx, ny, nz] = self.shape;
        let center = [
            (seed % 1000) as f32 / 1000.0 * nx as f32,
            ((seed / 1000) % 1000) as f32 / 1000.0 * ny as f32,
            ((seed / 1_000_000) % 1000) as f32 / 1000.0 * nz as f32,
        ];
        let radius = (nx.min(ny).min(nz) as f32 / 6.0).max(1.0);
        let data = Array3::from_shape_fn((nx, ny, nz), |(x, y, z)| {
            let dx = x as f32 - center[0];
            let dy = y as f32 - center[1];
            let dz = z as f32 - center[2];
            if dx * dx + dy * dy + dz * dz <= radius * radius {
                255
            } else {
                0
            }
        });
        Volume::new(data)
    }
}

/// FNV-1a, stable across runs so generated assets do not move between sessions.
fn seed_of(name: &str) -> u64 {
    name.bytes().fold(0xcbf29ce484222325u64, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl AtlasSource for SyntheticAtlasSource {
    async fn marker_catalog(&self) -> Result<MarkerCatalog, AtlasError> {
        self.wait().await;
        Ok(MarkerCatalog::from_entries(MARKERS.iter().map(|name| {
            MarkerEntry {
                name: name.to_string(),
                stack: format!("synthetic/{name}.tif"),
            }
        })))
    }

    async fn marker_volume(&self, name: &str) -> Result<Volume, AtlasError> {
        self.wait().await;
        if !MARKERS.contains(&name) {
            return Err(AtlasError::UnknownMarker(name.to_string()));
        }
        Ok(self.marker(seed_of(name)))
    }

    async fn region_mask(&self, name: &str) -> Result<Volume, AtlasError> {
        self.wait().await;
        if !self.regions.contains(name) {
            return Err(AtlasError::UnknownRegion(name.to_string()));
        }
        Ok(self.sphere(seed_of(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn marker_and_regions_share_the_grid() {
        let source = SyntheticAtlasSource::new([20, 30, 10]);
        let marker = source.marker_volume("jf5Tg").await.unwrap();
        let region = source.region_mask("pretectum").await.unwrap();
        assert_eq!(marker.shape(), [20, 30, 10]);
        assert_eq!(region.shape(), marker.shape());
        assert!(!region.boundary_voxels(1).is_empty());
    }

    #[tokio::test]
    async fn octants_step_up_towards_the_origin() {
        let source = SyntheticAtlasSource::new([20, 30, 10]);
        let marker = source.marker_volume("jf5Tg").await.unwrap();
        assert_eq!(marker.get(0, 0, 0) - marker.get(19, 29, 9), 180);
    }

    #[tokio::test]
    async fn unknown_names_are_rejected() {
        let source = SyntheticAtlasSource::new([4, 4, 4]);
        assert!(matches!(
            source.marker_volume("nopeTg").await,
            Err(AtlasError::UnknownMarker(_))
        ));
        assert!(matches!(
            source.region_mask("cortex").await,
            Err(AtlasError::UnknownRegion(_))
        ));
    }

    #[test]
    fn seeds_are_stable() {
        assert_eq!(seed_of("pretectum"), seed_of("pretectum"));
        assert_ne!(seed_of("pretectum"), seed_of("retina"));
    }
}
