use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::atlas::source::{AtlasSource, MarkerCatalog};
use crate::atlas::volume::Volume;
use crate::error::AtlasError;

type Slot<T> = Arc<OnceCell<Arc<T>>>;

/// Session-wide cache over an [`AtlasSource`]. Each key is fetched at most once
/// successfully; concurrent requests for a key share the same fetch.
#[derive(Clone)]
pub struct AtlasProvider {
    source: Arc<dyn AtlasSource>,
    catalog: Slot<MarkerCatalog>,
    markers: Arc<Mutex<HashMap<String, Slot<Volume>>>>,
    regions: Arc<Mutex<HashMap<String, Slot<Volume>>>>,
}

impl AtlasProvider {
    pub fn new(source: Arc<dyn AtlasSource>) -> Self {
        Self {
            source,
            catalog: Arc::new(OnceCell::new()),
            markers: Arc::new(Mutex::new(HashMap::new())),
            regions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn marker_catalog(&self) -> Result<Arc<MarkerCatalog>, AtlasError> {
        self.catalog
            .get_or_try_init(|| async {
                let catalog = self.source.marker_catalog().await?;
                info!("Marker catalog loaded with {} lines", catalog.len());
                Ok::<_, AtlasError>(Arc::new(catalog))
            })
            .await
            .cloned()
    }

    pub async fn marker_volume(&self, name: &str) -> Result<Arc<Volume>, AtlasError> {
        let slot = Self::slot(&self.markers, name);
        slot.get_or_try_init(|| async {
            debug!("Fetching marker volume {}", name);
            let volume = self.source.marker_volume(name).await?;
            info!("Marker {} loaded with shape {:?}", name, volume.shape());
            Ok::<_, AtlasError>(Arc::new(volume))
        })
        .await
        .cloned()
    }

    pub async fn region_mask(&self, name: &str) -> Result<Arc<Volume>, AtlasError> {
        let slot = Self::slot(&self.regions, name);
        slot.get_or_try_init(|| async {
            debug!("Fetching region mask {}", name);
            let mask = self.source.region_mask(name).await?;
            info!("Region {} loaded", name);
            Ok::<_, AtlasError>(Arc::new(mask))
        })
        .await
        .cloned()
    }

    /// Cached marker volume, without fetching.
    pub fn cached_marker(&self, name: &str) -> Option<Arc<Volume>> {
        Self::peek(&self.markers, name)
    }

    pub fn cached_region(&self, name: &str) -> Option<Arc<Volume>> {
        Self::peek(&self.regions, name)
    }

    fn slot(map: &Mutex<HashMap<String, Slot<Volume>>>, name: &str) -> Slot<Volume> {
        let mut map = map.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(name.to_string()).or_default().clone()
    }

    fn peek(map: &Mutex<HashMap<String, Slot<Volume>>>, name: &str) -> Option<Arc<Volume>> {
        let map = map.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        map.get(name).and_then(|slot| slot.get().cloned())
    }
}
