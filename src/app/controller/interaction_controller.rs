use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, error, info, warn};

use crate::app::controller::commands::{FetchOutcome, Notice, UiCommand};
use crate::app::options::RunOptions;
use crate::atlas::{AtlasProvider, AtlasSource, RegionCatalog, Volume};
use crate::config::Settings;
use crate::error::{AppError, AtlasError};
use crate::export::{self, ExportRequest, FigureStyle};
use crate::roi::{self, RoiInput, RoiPoints, RoiSet};
use crate::scene::{
    ColorAssigner, Rgb, RoiLayer, SceneComposer, SceneState, StateChange, ViewParams,
};

/// Owns [`SceneState`]: validates commands, mutates state, keeps the
/// composer in step and runs atlas fetches in the background.
pub struct InteractionController {
    settings: Settings,
    runtime: Handle,
    provider: AtlasProvider,
    catalog: RegionCatalog,
    state: SceneState,
    composer: SceneComposer,
    roi_colors: ColorAssigner,
    region_colors: HashMap<String, Rgb>,
    marker_names: Vec<String>,
    pending_marker: Option<String>,
    pending_regions: HashSet<String>,
    in_flight: usize,
    fetch_tx: Sender<FetchOutcome>,
    fetch_rx: Receiver<FetchOutcome>,
    notices: Vec<Notice>,
}

impl InteractionController {
    pub fn new(settings: Settings, source: Arc<dyn AtlasSource>, runtime: Handle) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel(settings.atlas.fetch_buffer_size.max(1));
        let composer = SceneComposer::new(settings.view.region_outline_stride);
        let mut controller = Self {
            settings,
            runtime,
            provider: AtlasProvider::new(source),
            catalog: RegionCatalog::default(),
            state: SceneState::default(),
            composer,
            roi_colors: ColorAssigner::default(),
            region_colors: HashMap::new(),
            marker_names: Vec::new(),
            pending_marker: None,
            pending_regions: HashSet::new(),
            in_flight: 0,
            fetch_tx,
            fetch_rx,
            notices: Vec::new(),
        };
        controller.spawn_catalog_fetch();
        controller
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn marker_names(&self) -> &[String] {
        &self.marker_names
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn pending_marker(&self) -> Option<&str> {
        self.pending_marker.as_deref()
    }

    pub fn is_region_pending(&self, name: &str) -> bool {
        self.pending_regions.contains(name)
    }

    pub fn is_loading(&self) -> bool {
        self.pending_marker.is_some() || !self.pending_regions.is_empty()
    }

    /// Applies a command. Errors become notices; nothing propagates to the UI.
    pub fn handle(&mut self, command: UiCommand) -> Vec<StateChange> {
        let result = match command {
            UiCommand::SelectMarker(name) => self.select_marker(&name),
            UiCommand::ToggleRegion(name) => self.toggle_region(&name),
            UiCommand::AddRoiSet { name, points } => self.add_roi_set(&name, points),
            UiCommand::RemoveRoiSet(name) => self.remove_roi_set(&name),
            UiCommand::SetView(params) => Ok(self.set_view(params)),
            UiCommand::SetCursor(cursor) => Ok(self.set_cursor(cursor)),
            UiCommand::ImportFile(path) => self.import_file(&path),
            UiCommand::ImportRois(input) => self.import_rois(input),
            UiCommand::SetRoiVisible(name, visible) => self.set_roi_visible(&name, visible),
            UiCommand::SetRoiColor(name, color) => self.set_roi_color(&name, color),
            UiCommand::SetRegionColor(name, color) => self.set_region_color(&name, color),
            UiCommand::Export(request) => self.export(&request),
            UiCommand::DismissNotices => {
                self.notices.clear();
                Ok(Vec::new())
            }
        };
        result.unwrap_or_else(|e| {
            self.report(e);
            Vec::new()
        })
    }

    /// Initial selection on startup.
    pub fn apply_options(&mut self, options: RunOptions) -> Vec<StateChange> {
        let marker = options
            .marker
            .unwrap_or_else(|| self.settings.default_marker_name.clone());
        let mut changes = self.handle(UiCommand::SelectMarker(marker));
        for region in options.regions {
            if self.state.has_region(&region) || self.is_region_pending(&region) {
                continue;
            }
            changes.extend(self.handle(UiCommand::ToggleRegion(region)));
        }
        if let Some(input) = options.rois {
            changes.extend(self.handle(UiCommand::ImportRois(input)));
        }
        for path in options.roi_files {
            changes.extend(self.handle(UiCommand::ImportFile(path)));
        }
        changes
    }

    pub fn select_marker(&mut self, name: &str) -> Result<Vec<StateChange>, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidFormat("marker name must not be empty".into()));
        }
        if !self.marker_names.is_empty() && !self.marker_names.iter().any(|n| n == name) {
            return Err(AtlasError::UnknownMarker(name.to_string()).into());
        }
        if self.pending_marker.as_deref() == Some(name) {
            debug!("Marker {} already pending", name);
            return Ok(Vec::new());
        }
        if self.state.marker.as_deref() == Some(name) {
            // Drop whatever else was requested in the meantime.
            self.pending_marker = None;
            return Ok(Vec::new());
        }

        if let Some(volume) = self.provider.cached_marker(name) {
            self.pending_marker = None;
            return Ok(self.marker_loaded(name.to_string(), &volume));
        }

        self.pending_marker = Some(name.to_string());
        self.spawn_marker_fetch(name.to_string());
        Ok(vec![StateChange::MarkerRequested(name.to_string())])
    }

    pub fn toggle_region(&mut self, name: &str) -> Result<Vec<StateChange>, AppError> {
        if !self.catalog.contains(name) {
            return Err(AtlasError::UnknownRegion(name.to_string()).into());
        }
        if self.state.regions.remove(name).is_some() {
            return Ok(self.apply(StateChange::RegionRemoved(name.to_string())));
        }
        if self.pending_regions.remove(name) {
            debug!("Region {} toggled off while loading", name);
            return Ok(vec![StateChange::RegionRemoved(name.to_string())]);
        }

        if self.provider.cached_region(name).is_some() {
            return Ok(self.region_loaded(name.to_string()));
        }

        self.pending_regions.insert(name.to_string());
        self.spawn_region_fetch(name.to_string());
        Ok(vec![StateChange::RegionRequested(name.to_string())])
    }

    /// Adds a set, replacing any set with the same name.
    pub fn add_roi_set(&mut self, name: &str, points: RoiPoints) -> Result<Vec<StateChange>, AppError> {
        let set = RoiSet::new(name, points)?;
        Ok(self.insert_roi_set(set))
    }

    pub fn remove_roi_set(&mut self, name: &str) -> Result<Vec<StateChange>, AppError> {
        if self.state.roi_sets.shift_remove(name).is_none() {
            return Err(AppError::InvalidFormat(format!("no ROI set named '{name}'")));
        }
        info!("Removed ROI set {}", name);
        Ok(self.apply(StateChange::RoiSetRemoved(name.to_string())))
    }

    pub fn set_view(&mut self, params: ViewParams) -> Vec<StateChange> {
        let cursor = self.clamp_cursor(params.cursor);
        let params = ViewParams { cursor, ..params };
        if params == self.state.view {
            return Vec::new();
        }
        self.state.view = params;
        self.apply(StateChange::ViewChanged)
    }

    pub fn set_cursor(&mut self, cursor: [usize; 3]) -> Vec<StateChange> {
        self.set_view(ViewParams {
            cursor,
            ..self.state.view
        })
    }

    pub fn import_file(&mut self, path: &Path) -> Result<Vec<StateChange>, AppError> {
        let sets = roi::ingest_file(path)?;
        let mut changes = Vec::new();
        for set in sets {
            changes.extend(self.insert_roi_set(set));
        }
        self.notices.push(Notice::info(format!("Imported {}", path.display())));
        Ok(changes)
    }

    pub fn import_rois(&mut self, input: RoiInput) -> Result<Vec<StateChange>, AppError> {
        // Validate everything before touching the state.
        let sets = roi::ingest(input)?;
        let mut changes = Vec::new();
        for set in sets {
            changes.extend(self.insert_roi_set(set));
        }
        Ok(changes)
    }

    pub fn set_roi_visible(&mut self, name: &str, visible: bool) -> Result<Vec<StateChange>, AppError> {
        let layer = self.roi_layer_mut(name)?;
        if layer.visible == visible {
            return Ok(Vec::new());
        }
        layer.visible = visible;
        Ok(self.apply(StateChange::RoiSetStyled(name.to_string())))
    }

    pub fn set_roi_color(&mut self, name: &str, color: Rgb) -> Result<Vec<StateChange>, AppError> {
        let layer = self.roi_layer_mut(name)?;
        if layer.color == color {
            return Ok(Vec::new());
        }
        layer.color = color;
        self.roi_colors.set(name, color);
        Ok(self.apply(StateChange::RoiSetStyled(name.to_string())))
    }

    pub fn set_region_color(&mut self, name: &str, color: Rgb) -> Result<Vec<StateChange>, AppError> {
        if !self.catalog.contains(name) {
            return Err(AtlasError::UnknownRegion(name.to_string()).into());
        }
        self.region_colors.insert(name.to_string(), color);
        match self.state.regions.get_mut(name) {
            Some(current) if *current != color => {
                *current = color;
                Ok(self.apply(StateChange::RegionRecolored(name.to_string())))
            }
            _ => Ok(Vec::new()),
        }
    }

    pub fn export(&mut self, request: &ExportRequest) -> Result<Vec<StateChange>, AppError> {
        let style = FigureStyle::from_settings(&self.settings);
        let path = export::export_figure(&self.state, &self.composer, request, style)?;
        self.notices
            .push(Notice::info(format!("Figure saved to {}", path.display())));
        Ok(vec![StateChange::FigureExported(path)])
    }

    /// Drains finished fetches without blocking. Called once per UI frame.
    pub fn poll(&mut self) -> Vec<StateChange> {
        let mut changes = Vec::new();
        loop {
            match self.fetch_rx.try_recv() {
                Ok(outcome) => changes.extend(self.on_fetch(outcome)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    error!("Fetch result channel disconnected");
                    break;
                }
            }
        }
        changes
    }

    /// Waits until every spawned fetch has reported back.
    #[cfg(test)]
    pub(crate) async fn wait_for_fetches(&mut self) -> Vec<StateChange> {
        let mut changes = Vec::new();
        while self.in_flight > 0 {
            match self.fetch_rx.recv().await {
                Some(outcome) => changes.extend(self.on_fetch(outcome)),
                None => break,
            }
        }
        changes
    }

    fn on_fetch(&mut self, outcome: FetchOutcome) -> Vec<StateChange> {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome {
            FetchOutcome::Catalog(Ok(catalog)) => {
                self.marker_names = catalog.names().map(str::to_string).collect();
                Vec::new()
            }
            FetchOutcome::Catalog(Err(e)) => {
                self.report(e.into());
                Vec::new()
            }
            FetchOutcome::Marker { name, result } => {
                if self.pending_marker.as_deref() != Some(name.as_str()) {
                    debug!("Ignoring stale marker result for {}", name);
                    return Vec::new();
                }
                self.pending_marker = None;
                match result {
                    Ok(volume) => self.marker_loaded(name, &volume),
                    Err(e) => {
                        self.report(e.into());
                        Vec::new()
                    }
                }
            }
            FetchOutcome::Region { name, result } => {
                if !self.pending_regions.remove(&name) {
                    debug!("Region {} no longer selected, dropping result", name);
                    return Vec::new();
                }
                match result {
                    Ok(_) => self.region_loaded(name),
                    Err(e) => {
                        self.report(e.into());
                        Vec::new()
                    }
                }
            }
        }
    }

    fn marker_loaded(&mut self, name: String, volume: &Volume) -> Vec<StateChange> {
        let [nx, ny, nz] = volume.shape();
        info!("Showing marker {}", name);
        self.state.marker = Some(name.clone());
        self.state.view.cursor = [nx / 2, ny / 2, nz / 2];
        let mut changes = self.apply(StateChange::MarkerLoaded(name));
        changes.extend(self.apply(StateChange::ViewChanged));
        changes
    }

    fn region_loaded(&mut self, name: String) -> Vec<StateChange> {
        let color = self.region_color(&name);
        self.state.regions.insert(name.clone(), color);
        self.apply(StateChange::RegionAdded(name))
    }

    fn insert_roi_set(&mut self, set: RoiSet) -> Vec<StateChange> {
        let RoiSet { name, points } = set;
        let color = self.roi_colors.color_for(&name);
        let rows = points.len();
        let change = match self.state.roi_sets.get_mut(&name) {
            Some(layer) => {
                layer.points = points;
                StateChange::RoiSetReplaced(name.clone())
            }
            None => {
                self.state.roi_sets.insert(
                    name.clone(),
                    RoiLayer {
                        points,
                        visible: true,
                        color,
                    },
                );
                StateChange::RoiSetAdded(name.clone())
            }
        };
        info!("ROI set {} now has {} points", name, rows);
        self.apply(change)
    }

    fn roi_layer_mut(&mut self, name: &str) -> Result<&mut RoiLayer, AppError> {
        self.state
            .roi_sets
            .get_mut(name)
            .ok_or_else(|| AppError::InvalidFormat(format!("no ROI set named '{name}'")))
    }

    fn region_color(&self, name: &str) -> Rgb {
        self.region_colors.get(name).copied().unwrap_or_else(|| {
            Rgb::categorical(self.catalog.id_of(name).unwrap_or_default())
        })
    }

    fn clamp_cursor(&self, cursor: [usize; 3]) -> [usize; 3] {
        match self.composer.frame() {
            Some(frame) => {
                let shape = frame.shape();
                [0, 1, 2].map(|axis| cursor[axis].min(shape[axis].saturating_sub(1)))
            }
            None => cursor,
        }
    }

    fn apply(&mut self, change: StateChange) -> Vec<StateChange> {
        self.composer.apply(&change, &self.state, &self.provider);
        vec![change]
    }

    fn report(&mut self, error: AppError) {
        warn!("{}", error);
        self.notices.push(Notice::error(error.to_string()));
    }

    fn spawn_catalog_fetch(&mut self) {
        let provider = self.provider.clone();
        let tx = self.fetch_tx.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let result = provider.marker_catalog().await;
            if tx.send(FetchOutcome::Catalog(result)).await.is_err() {
                debug!("Controller gone before the marker catalog arrived");
            }
        });
    }

    fn spawn_marker_fetch(&mut self, name: String) {
        let provider = self.provider.clone();
        let tx = self.fetch_tx.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let result = provider.marker_volume(&name).await;
            if tx.send(FetchOutcome::Marker { name, result }).await.is_err() {
                debug!("Controller gone before a marker fetch finished");
            }
        });
    }

    fn spawn_region_fetch(&mut self, name: String) {
        let provider = self.provider.clone();
        let tx = self.fetch_tx.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let result = provider.region_mask(&name).await;
            if tx.send(FetchOutcome::Region { name, result }).await.is_err() {
                debug!("Controller gone before a region fetch finished");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::SyntheticAtlasSource;
    use crate::atlas::provider::tests::CountingSource;
    use indexmap::IndexMap;
    use std::collections::BTreeSet;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const SHAPE: [usize; 3] = [12, 16, 8];

    fn points(rows: &[[f32; 3]]) -> RoiPoints {
        RoiPoints::from_rows(rows).unwrap()
    }

    async fn controller_with(source: Arc<dyn AtlasSource>) -> InteractionController {
        let mut controller =
            InteractionController::new(Settings::default(), source, Handle::current());
        controller.wait_for_fetches().await;
        controller
    }

    async fn controller() -> InteractionController {
        controller_with(Arc::new(SyntheticAtlasSource::new(SHAPE))).await
    }

    #[tokio::test]
    async fn run_with_marker_shows_only_that_marker() {
        let mut controller = controller().await;
        let options = RunOptions::builder().marker("mpn212Tg").build().unwrap();
        controller.apply_options(options);
        controller.wait_for_fetches().await;

        let state = controller.state();
        assert_eq!(state.marker.as_deref(), Some("mpn212Tg"));
        assert!(state.regions.is_empty());
        assert!(state.roi_sets.is_empty());
        assert!(controller.notices().is_empty());
    }

    #[tokio::test]
    async fn run_with_regions_selects_exactly_those() {
        let mut controller = controller().await;
        let options = RunOptions::builder()
            .regions(["pretectum", "oculomotor nucleus"])
            .build()
            .unwrap();
        controller.apply_options(options);
        controller.wait_for_fetches().await;

        let selected: BTreeSet<&str> = controller.state().region_names().collect();
        assert_eq!(selected, BTreeSet::from(["oculomotor nucleus", "pretectum"]));
        assert_eq!(controller.state().marker.as_deref(), Some("jf5Tg"));
        assert!(controller.composer().region("pretectum").is_some());
    }

    #[tokio::test]
    async fn selecting_the_same_marker_twice_fetches_once() {
        let source = Arc::new(CountingSource::new(SyntheticAtlasSource::new(SHAPE)));
        let mut controller = controller_with(source.clone()).await;

        controller.handle(UiCommand::SelectMarker("mpn212Tg".into()));
        let again = controller.handle(UiCommand::SelectMarker("mpn212Tg".into()));
        assert!(again.is_empty());
        controller.wait_for_fetches().await;
        let before = controller.state().clone();

        let after_load = controller.handle(UiCommand::SelectMarker("mpn212Tg".into()));
        assert!(after_load.is_empty());
        assert_eq!(controller.state(), &before);
        assert_eq!(source.marker_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_row_sets_are_kept() {
        let mut controller = controller().await;
        let changes = controller.handle(UiCommand::AddRoiSet {
            name: "empty".into(),
            points: RoiPoints::from_rows(&[]).unwrap(),
        });
        assert_eq!(changes, vec![StateChange::RoiSetAdded("empty".into())]);

        let layer = &controller.state().roi_sets["empty"];
        assert!(layer.points.is_empty());
        assert!(layer.visible);
        assert!(controller.composer().roi("empty").is_some());
    }

    #[tokio::test]
    async fn same_name_last_write_wins() {
        let mut controller = controller().await;
        let first = points(&[[1.0, 1.0, 1.0]]);
        let second = points(&[[2.0, 2.0, 2.0], [3.0, 3.0, 3.0]]);

        controller.add_roi_set("A", first).unwrap();
        let color = controller.state().roi_sets["A"].color;
        let changes = controller.add_roi_set("A", second.clone()).unwrap();

        assert_eq!(changes, vec![StateChange::RoiSetReplaced("A".into())]);
        assert_eq!(controller.state().roi_sets.len(), 1);
        assert_eq!(controller.state().roi_sets["A"].points, second);
        assert_eq!(controller.state().roi_sets["A"].color, color);
    }

    #[tokio::test]
    async fn removed_sets_keep_their_color_when_re_added() {
        let mut controller = controller().await;
        controller.add_roi_set("A", RoiPoints::empty()).unwrap();
        controller.add_roi_set("B", RoiPoints::empty()).unwrap();
        let color = controller.state().roi_sets["A"].color;

        controller.remove_roi_set("A").unwrap();
        assert!(controller.composer().roi("A").is_none());
        controller.add_roi_set("A", RoiPoints::empty()).unwrap();
        assert_eq!(controller.state().roi_sets["A"].color, color);
        assert_ne!(controller.state().roi_sets["B"].color, color);
    }

    #[tokio::test]
    async fn malformed_file_leaves_state_untouched() {
        let mut controller = controller().await;
        controller.add_roi_set("A", points(&[[1.0, 2.0, 3.0]])).unwrap();
        let before = controller.state().clone();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.npy");
        ndarray_npy::write_npy(&path, &ndarray::array![[1.0f64, 2.0], [3.0, 4.0]]).unwrap();

        let result = controller.import_file(&path);
        assert!(matches!(result, Err(AppError::InvalidFormat(_))));
        assert_eq!(controller.state(), &before);

        // Through the command boundary the error becomes a notice.
        assert!(controller.handle(UiCommand::ImportFile(path)).is_empty());
        assert_eq!(controller.notices().len(), 1);
    }

    #[cfg(feature = "hdf5")]
    fn write_table(path: &Path, group: &str, columns: &[(&str, [f64; 3])]) {
        let file = hdf5::File::create(path).unwrap();
        let group = file.create_group(group).unwrap();
        for (name, values) in columns {
            group
                .new_dataset_builder()
                .with_data(&values[..])
                .create(*name)
                .unwrap();
        }
    }

    #[cfg(feature = "hdf5")]
    #[tokio::test]
    async fn table_without_z_leaves_state_untouched() {
        let mut controller = controller().await;
        controller.add_roi_set("A", points(&[[1.0, 2.0, 3.0]])).unwrap();
        let before = controller.state().clone();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.h5");
        write_table(&path, "cells", &[("x", [1.0, 2.0, 3.0]), ("y", [4.0, 5.0, 6.0])]);

        let result = controller.import_file(&path);
        assert!(matches!(result, Err(AppError::InvalidFormat(_))));
        assert_eq!(controller.state(), &before);
    }

    #[cfg(feature = "hdf5")]
    #[tokio::test]
    async fn table_groups_become_roi_sets() {
        let mut controller = controller().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.h5");
        write_table(
            &path,
            "tectum",
            &[("x", [1.0, 2.0, 3.0]), ("y", [4.0, 5.0, 6.0]), ("z", [7.0, 8.0, 9.0])],
        );

        let changes = controller.import_file(&path).unwrap();
        assert_eq!(changes, vec![StateChange::RoiSetAdded("cells/tectum".into())]);
        let layer = &controller.state().roi_sets["cells/tectum"];
        assert_eq!(layer.points.len(), 3);
        assert_eq!(layer.points.rows().next(), Some([1.0, 4.0, 7.0]));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let mut controller = controller().await;
        let result = controller.import_file(Path::new("/nowhere/cells.npy"));
        assert!(matches!(result, Err(AppError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn named_input_is_all_or_nothing() {
        let mut controller = controller().await;
        let mut sets = IndexMap::new();
        sets.insert("A".to_string(), points(&[[1.0, 1.0, 1.0]]));
        sets.insert(" ".to_string(), points(&[[2.0, 2.0, 2.0]]));

        let result = controller.import_rois(RoiInput::Named(sets));
        assert!(matches!(result, Err(AppError::InvalidFormat(_))));
        assert!(controller.state().roi_sets.is_empty());

        controller
            .import_rois(RoiInput::Single(points(&[[1.0, 1.0, 1.0]])))
            .unwrap();
        assert!(controller.state().roi_sets.contains_key("ROIs"));
    }

    #[tokio::test]
    async fn last_requested_marker_wins() {
        let source = SyntheticAtlasSource::new(SHAPE).with_latency(Duration::from_millis(10));
        let mut controller = controller_with(Arc::new(source)).await;

        controller.handle(UiCommand::SelectMarker("gad1bGal4".into()));
        controller.handle(UiCommand::SelectMarker("mpn212Tg".into()));
        assert_eq!(controller.pending_marker(), Some("mpn212Tg"));
        controller.wait_for_fetches().await;

        assert_eq!(controller.state().marker.as_deref(), Some("mpn212Tg"));
        assert_eq!(controller.composer().volume().unwrap().name, "mpn212Tg");
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn region_toggled_off_while_loading_is_not_added() {
        let source = SyntheticAtlasSource::new(SHAPE).with_latency(Duration::from_millis(10));
        let mut controller = controller_with(Arc::new(source)).await;

        controller.handle(UiCommand::ToggleRegion("pretectum".into()));
        assert!(controller.is_region_pending("pretectum"));
        controller.handle(UiCommand::ToggleRegion("pretectum".into()));
        controller.wait_for_fetches().await;

        assert!(!controller.state().has_region("pretectum"));
        assert!(controller.composer().region("pretectum").is_none());
    }

    #[tokio::test]
    async fn unknown_names_become_notices() {
        let mut controller = controller().await;
        controller.handle(UiCommand::SelectMarker("notAMarker".into()));
        controller.handle(UiCommand::ToggleRegion("cortex".into()));
        controller.wait_for_fetches().await;

        assert_eq!(controller.notices().len(), 2);
        assert!(controller.state().marker.is_none());
        assert!(controller.state().regions.is_empty());
    }

    #[tokio::test]
    async fn region_colors_follow_the_tree_and_overrides() {
        let mut controller = controller().await;
        controller.handle(UiCommand::ToggleRegion("pretectum".into()));
        controller.wait_for_fetches().await;

        let id = controller.catalog().id_of("pretectum").unwrap();
        assert_eq!(controller.state().regions["pretectum"], Rgb::categorical(id));

        let changes = controller
            .set_region_color("pretectum", Rgb([1, 2, 3]))
            .unwrap();
        assert_eq!(changes, vec![StateChange::RegionRecolored("pretectum".into())]);
        assert_eq!(controller.composer().region("pretectum").unwrap().color, Rgb([1, 2, 3]));
    }

    #[cfg(feature = "export")]
    #[tokio::test]
    async fn oversized_export_becomes_a_notice() {
        let mut controller = controller().await;
        controller.handle(UiCommand::SelectMarker("jf5Tg".into()));
        controller.wait_for_fetches().await;

        let dir = tempfile::tempdir().unwrap();
        let request = ExportRequest {
            projection: export::Projection::Current,
            width: 4000,
            height: 4000,
            dpi: 1200,
            path: dir.path().join("huge.png"),
        };
        let result = controller.export(&request);
        assert!(matches!(
            result,
            Err(AppError::Export(crate::error::ExportError::InvalidSize(..)))
        ));

        assert!(controller.handle(UiCommand::Export(request.clone())).is_empty());
        assert_eq!(controller.notices().len(), 1);
        assert!(!request.path.exists());
    }

    #[tokio::test]
    async fn cursor_is_centered_and_clamped() {
        let mut controller = controller().await;
        controller.handle(UiCommand::SelectMarker("jf5Tg".into()));
        controller.wait_for_fetches().await;
        assert_eq!(controller.state().view.cursor, [6, 8, 4]);

        controller.handle(UiCommand::SetCursor([100, 2, 3]));
        assert_eq!(controller.state().view.cursor, [11, 2, 3]);
        assert!(controller.handle(UiCommand::SetCursor([11, 2, 3])).is_empty());
    }
}
