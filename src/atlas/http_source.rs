use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::atlas::source::{AtlasSource, MarkerCatalog};
use crate::atlas::tiff_stack::decode_stack;
use crate::atlas::volume::Volume;
use crate::config::Settings;
use crate::error::AtlasError;

const CATALOG_PATH: &str = "downloads/Lines/markers_catalog.json";
const REGIONS_PATH: &str = "Regions/v2.0.1";

/// Fetches assets from the mapzebrain media server, keeping every download on disk.
pub struct HttpAtlasSource {
    client: reqwest::Client,
    base_url: Url,
    markers_dir: PathBuf,
    regions_dir: PathBuf,
    catalog: OnceCell<MarkerCatalog>,
}

impl HttpAtlasSource {
    pub fn new(settings: &Settings) -> Result<Self, AtlasError> {
        let mut base = settings.atlas.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| AtlasError::Fetch {
            url: base.clone(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.atlas.request_timeout_secs))
            .build()
            .map_err(|e| AtlasError::Fetch {
                url: base.clone(),
                reason: format!("HTTP client init failed: {e}"),
            })?;

        Ok(Self {
            client,
            base_url,
            markers_dir: settings.markers_dir(),
            regions_dir: settings.regions_dir(),
            catalog: OnceCell::new(),
        })
    }

    fn resolve(&self, location: &str) -> Result<Url, AtlasError> {
        Url::parse(location)
            .or_else(|_| self.base_url.join(location.trim_start_matches('/')))
            .map_err(|e| AtlasError::Fetch {
                url: location.to_string(),
                reason: e.to_string(),
            })
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>, AtlasError> {
        let fail = |reason: String| AtlasError::Fetch {
            url: url.to_string(),
            reason,
        };
        info!("Downloading {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?
            .error_for_status()
            .map_err(|e| fail(e.to_string()))?;
        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Decodes the cached file at `path`, downloading it from `url` when it is
    /// missing or unreadable. Only downloads that decode are written to disk.
    async fn cached_decode<T>(
        &self,
        path: &Path,
        url: &Url,
        decode: impl Fn(&[u8]) -> Result<T, AtlasError>,
    ) -> Result<T, AtlasError> {
        if let Some(value) = read_cached(path, &decode).await {
            return Ok(value);
        }

        let bytes = self.download(url).await?;
        let value = decode(&bytes)?;
        if let Err(e) = store(path, &bytes).await {
            // Still usable for this session.
            warn!("{}", e);
        }
        Ok(value)
    }

    async fn catalog(&self) -> Result<&MarkerCatalog, AtlasError> {
        self.catalog
            .get_or_try_init(|| async {
                let url = self.resolve(CATALOG_PATH)?;
                let path = self.markers_dir.join("markers_catalog.json");
                self.cached_decode(&path, &url, decode_catalog).await
            })
            .await
    }
}

/// Region folder names on the server use underscores for spaces.
pub fn region_file_stem(name: &str) -> String {
    name.replace(' ', "_")
}

/// Fallback stem with any parenthesised qualifier dropped.
pub fn alternative_region_stem(stem: &str) -> String {
    stem.split('(')
        .next()
        .unwrap_or(stem)
        .trim_matches('_')
        .to_string()
}

fn decode_catalog(bytes: &[u8]) -> Result<MarkerCatalog, AtlasError> {
    MarkerCatalog::from_json(bytes).map_err(|e| AtlasError::Decode {
        name: "markers_catalog.json".to_string(),
        reason: e.to_string(),
    })
}

/// Reads and decodes a cache file. A file that no longer decodes is removed
/// so the next request downloads it again.
async fn read_cached<T>(
    path: &Path,
    decode: impl Fn(&[u8]) -> Result<T, AtlasError>,
) -> Option<T> {
    let bytes = tokio::fs::read(path).await.ok()?;
    match decode(&bytes) {
        Ok(value) => {
            debug!("Using cached {}", path.display());
            Some(value)
        }
        Err(e) => {
            warn!("Discarding corrupt cache file {}: {}", path.display(), e);
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!("{}", cache_error(path, e));
            }
            None
        }
    }
}

/// Writes through a temporary sibling so an interrupted write never leaves a
/// truncated file under the final name.
async fn store(path: &Path, bytes: &[u8]) -> Result<(), AtlasError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| cache_error(parent, e))?;
    }
    let partial = path.with_extension("part");
    tokio::fs::write(&partial, bytes)
        .await
        .map_err(|e| cache_error(&partial, e))?;
    tokio::fs::rename(&partial, path)
        .await
        .map_err(|e| cache_error(path, e))
}

fn cache_error(path: &Path, error: std::io::Error) -> AtlasError {
    AtlasError::Cache {
        path: path.display().to_string(),
        reason: error.to_string(),
    }
}

#[async_trait]
impl AtlasSource for HttpAtlasSource {
    async fn marker_catalog(&self) -> Result<MarkerCatalog, AtlasError> {
        self.catalog().await.cloned()
    }

    async fn marker_volume(&self, name: &str) -> Result<Volume, AtlasError> {
        let stack = self
            .catalog()
            .await?
            .stack(name)
            .ok_or_else(|| AtlasError::UnknownMarker(name.to_string()))?
            .to_string();
        let url = self.resolve(&stack)?;
        let path = self.markers_dir.join(format!("{name}.tif"));
        self.cached_decode(&path, &url, |bytes| decode_stack(name, bytes))
            .await
    }

    async fn region_mask(&self, name: &str) -> Result<Volume, AtlasError> {
        let stem = region_file_stem(name);
        let path = self.regions_dir.join(format!("{stem}.tif"));

        let decode = |bytes: &[u8]| decode_stack(name, bytes);
        let url = self.resolve(&format!("{REGIONS_PATH}/{stem}/{stem}.tif"))?;
        match self.cached_decode(&path, &url, decode).await {
            Ok(volume) => Ok(volume),
            Err(e) => {
                let alt = alternative_region_stem(&stem);
                if alt == stem || alt.is_empty() {
                    return Err(e);
                }
                warn!("Failed to load region {}: {}. Trying '{}'", name, e, alt);
                let alt_url = self.resolve(&format!("{REGIONS_PATH}/{alt}/{alt}.tif"))?;
                self.cached_decode(&path, &alt_url, decode)
                    .await
                    .map_err(|_| AtlasError::UnknownRegion(name.to_string()))
            }
        }
    }
}
