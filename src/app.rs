/// Viewer session: the composition root
///
/// Owns the selection state (phase, case, marker), the fetch worker and
/// both source caches. Cubes and libraries are shared read-only once built.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use thiserror::Error;

use geocube::{CubeError, GeoCube};
use spectral_lib::{sample, CaseVariant, SampledLibrary, SpectralError, SpectralLibrary};

use crate::data::assets::{AssetCatalog, Composite};
use crate::data::fetch_worker::{CubeResponse, FileFetcher, GeoCubeWorker};
use crate::data::settings::ViewerSettings;
use crate::data::source_cache::SourceCache;
use crate::log::reproducibility::SessionLog;
use crate::pipeline::coordinate::{DisplayedImage, ImageMeasurements, MapResult, Point, Size};
use crate::pipeline::lookup::{lookup_pixel, LookupOutcome};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Geo-cube error: {0}")]
    Cube(#[from] CubeError),
    #[error("Spectral library error: {0}")]
    Spectral(#[from] SpectralError),
    #[error("No geo-cube loaded for phase {0}°")]
    NoCube(u32),
    #[error("No spectral library loaded")]
    NoLibrary,
    #[error("Timed out waiting for the phase {0}° geo-cube")]
    Timeout(u32),
    #[error("Geo-cube fetch worker stopped while phase {0}° was loading")]
    WorkerDisconnected(u32),
}

/// State of the geo-cube for the selected phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Ready,
    Loading,
}

/// Native size used until a composite image has been read
const FALLBACK_NATURAL: Size = Size {
    width: geocube::GEO_SAMPLES as f64,
    height: geocube::GEO_LINES as f64,
};

pub struct ViewerSession {
    settings: ViewerSettings,
    catalog: AssetCatalog,
    worker: GeoCubeWorker,
    cubes: SourceCache<PathBuf, GeoCube>,
    libraries: SourceCache<PathBuf, SampledLibrary>,

    phase: u32,
    composite: Composite,
    case: CaseVariant,
    /// Request id whose response may become the current cube
    awaiting: Option<u64>,
    /// Queued fetches by geo-cube path
    in_flight: HashMap<PathBuf, u64>,
    cube: Option<Arc<GeoCube>>,
    library: Option<Arc<SampledLibrary>>,
    image: DisplayedImage,
    last_lookup: Option<LookupOutcome>,

    log: SessionLog,
}

impl ViewerSession {
    pub fn new(settings: ViewerSettings) -> Result<Self, SessionError> {
        let worker = GeoCubeWorker::spawn(Box::new(FileFetcher))?;
        Ok(Self::with_worker(settings, worker))
    }

    pub fn with_worker(settings: ViewerSettings, worker: GeoCubeWorker) -> Self {
        let catalog = AssetCatalog::new(&settings.asset_dir, settings.mission_label.clone());
        let mut log = SessionLog::new();
        log.set_sources(&settings.asset_dir, &settings.library_path);
        log::info!(
            "Viewer session {} (assets {}, label {})",
            log.session_id,
            settings.asset_dir.display(),
            settings.mission_label
        );

        Self {
            phase: settings.default_phase,
            composite: settings.composite,
            case: settings.default_case,
            catalog,
            worker,
            cubes: SourceCache::new("geo-cube"),
            libraries: SourceCache::new("spectral library"),
            awaiting: None,
            in_flight: HashMap::new(),
            cube: None,
            library: None,
            image: DisplayedImage::new(FALLBACK_NATURAL, FALLBACK_NATURAL),
            last_lookup: None,
            log,
            settings,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn case(&self) -> CaseVariant {
        self.case
    }

    pub fn composite(&self) -> Composite {
        self.composite
    }

    pub fn cube(&self) -> Option<&Arc<GeoCube>> {
        self.cube.as_ref()
    }

    pub fn library(&self) -> Option<&Arc<SampledLibrary>> {
        self.library.as_ref()
    }

    pub fn image(&self) -> &DisplayedImage {
        &self.image
    }

    pub fn last_lookup(&self) -> Option<&LookupOutcome> {
        self.last_lookup.as_ref()
    }

    pub fn session_log(&self) -> &SessionLog {
        &self.log
    }

    pub fn is_loading(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Command prefix reproducing this session's sources and case
    fn command_prefix(&self) -> String {
        format!(
            "geo-spectral-viewer --assets {} --label {} --library {} --max-points {} --case {}",
            self.settings.asset_dir.display(),
            self.settings.mission_label,
            self.settings.library_path.display(),
            self.settings.max_points,
            self.case.key()
        )
    }

    // ─── Library ────────────────────────────────────────────────────────────

    /// Load and sample the spectral library at `path`, once per session
    pub fn load_library(&mut self, path: &Path) -> Result<Arc<SampledLibrary>, SessionError> {
        let max_points = self.settings.max_points;
        let key = path.to_path_buf();
        let library = self
            .libraries
            .get_or_try_insert_with(key, || -> Result<SampledLibrary, SpectralError> {
                Ok(sample(SpectralLibrary::open(path)?, max_points))
            })?;

        self.log.record(
            "library",
            &format!(
                "{}: {} of {} wavelengths, {} rows",
                path.display(),
                library.wavelength.len(),
                library.source_points(),
                library.row_count()
            ),
            "",
        );
        self.library = Some(Arc::clone(&library));
        self.refresh_lookup()?;
        Ok(library)
    }

    /// Load the library named in the settings
    pub fn load_configured_library(&mut self) -> Result<Arc<SampledLibrary>, SessionError> {
        let path = self.settings.library_path.clone();
        self.load_library(&path)
    }

    // ─── Phase selection ────────────────────────────────────────────────────

    /// Select a phase angle, snapped to the grid.
    ///
    /// Uses the cached cube when there is one, then a fetch already queued
    /// for the same path, and only otherwise queues a new fetch.
    /// The marker keeps its native position; its spectrum is recomputed
    /// once the new cube is available.
    pub fn select_phase(&mut self, requested: u32) -> PhaseStatus {
        let phase = AssetCatalog::snap_phase(requested as f64).unwrap_or(0);
        if phase != requested {
            log::info!("Phase {}° snapped to {}°", requested, phase);
        }
        self.phase = phase;
        self.cube = None;
        self.last_lookup = None;
        self.refresh_natural_size();

        let path = self.catalog.geo_path(phase);
        let status = match self.cubes.get(&path) {
            Some(cube) => {
                self.awaiting = None;
                self.cube = Some(cube);
                if let Err(e) = self.refresh_lookup() {
                    log::warn!("Lookup after phase change failed: {}", e);
                }
                PhaseStatus::Ready
            }
            None => {
                let id = match self.in_flight.get(&path) {
                    Some(&id) => {
                        log::debug!("Phase {}° already loading (request {})", phase, id);
                        id
                    }
                    None => {
                        let id = self.worker.request(phase, path.clone());
                        self.in_flight.insert(path, id);
                        id
                    }
                };
                self.awaiting = Some(id);
                PhaseStatus::Loading
            }
        };

        self.log.record("phase", &format!("Selected {}° ({:?})", phase, status), "");
        status
    }

    fn refresh_natural_size(&mut self) {
        match self.catalog.natural_size(self.phase, self.composite) {
            Ok(dims) => self.image.set_natural(Size::from(dims)),
            Err(e) => log::debug!("Composite for phase {}° not readable: {}", self.phase, e),
        }
    }

    /// Take a worker response. A cube for a superseded selection is cached
    /// but never made current; one for a request no longer tracked (after
    /// teardown) is dropped. Returns whether the current cube became ready.
    fn accept(&mut self, response: CubeResponse) -> Result<bool, SessionError> {
        let tracked = self.in_flight.get(&response.path) == Some(&response.id);
        if tracked {
            self.in_flight.remove(&response.path);
        }

        if self.awaiting != Some(response.id) {
            match response.result {
                Ok(cube) if tracked => {
                    log::info!(
                        "Caching geo-cube for phase {}° (selected {}°)",
                        response.phase,
                        self.phase
                    );
                    self.cubes.insert(response.path, cube);
                }
                Ok(_) => log::debug!("Dropping untracked geo-cube for phase {}°", response.phase),
                Err(e) => log::info!("Ignoring failed fetch for phase {}°: {}", response.phase, e),
            }
            return Ok(false);
        }
        self.awaiting = None;

        let cube = response.result?;
        let cube = self.cubes.insert(response.path, cube);
        self.cube = Some(cube);
        self.refresh_lookup()?;
        Ok(true)
    }

    /// Drain finished fetches without blocking
    pub fn poll(&mut self) -> Result<bool, SessionError> {
        let mut ready = false;
        while let Some(response) = self.worker.try_take() {
            ready |= self.accept(response)?;
        }
        Ok(ready)
    }

    /// Block until the selected phase's cube is available
    pub fn wait_for_cube(&mut self, timeout: Duration) -> Result<Arc<GeoCube>, SessionError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(cube) = &self.cube {
                return Ok(Arc::clone(cube));
            }
            if self.awaiting.is_none() {
                return Err(SessionError::NoCube(self.phase));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.worker.wait(remaining) {
                Ok(response) => {
                    self.accept(response)?;
                }
                Err(RecvTimeoutError::Timeout) => return Err(SessionError::Timeout(self.phase)),
                Err(RecvTimeoutError::Disconnected) => {
                    self.awaiting = None;
                    self.in_flight.clear();
                    return Err(SessionError::WorkerDisconnected(self.phase));
                }
            }
        }
    }

    /// `wait_for_cube` with the configured timeout
    pub fn wait_for_cube_default(&mut self) -> Result<Arc<GeoCube>, SessionError> {
        self.wait_for_cube(Duration::from_secs(self.settings.fetch_timeout_secs))
    }

    // ─── Marker and lookup ──────────────────────────────────────────────────

    /// Apply a click on the displayed composite
    pub fn click<M: ImageMeasurements + ?Sized>(
        &mut self,
        measurements: &M,
        pointer: Point,
    ) -> Result<MapResult, SessionError> {
        let result = self.image.click(measurements, pointer);
        match result {
            MapResult::Placed(marker) => {
                self.log.record(
                    "click",
                    &format!(
                        "Display ({:.1}, {:.1}) -> native ({}, {})",
                        marker.display_x, marker.display_y, marker.natural_x, marker.natural_y
                    ),
                    "",
                );
                self.refresh_lookup()?;
            }
            MapResult::Cleared => {
                self.last_lookup = None;
                self.log.record("clear", "Marker cleared", "");
            }
            MapResult::Outside => log::debug!("Click outside image at ({}, {})", pointer.x, pointer.y),
            MapResult::Unavailable => log::warn!("Click ignored: image not measured"),
        }
        Ok(result)
    }

    /// Place the marker at a native pixel and look up its spectrum
    ///
    /// Coordinates beyond the native raster are clamped to its last pixel.
    pub fn inspect_pixel(&mut self, x: u32, y: u32) -> Result<LookupOutcome, SessionError> {
        self.image.place_native(x, y);
        self.refresh_lookup()?;
        match &self.last_lookup {
            Some(outcome) => Ok(outcome.clone()),
            None if self.library.is_none() => Err(SessionError::NoLibrary),
            None => Err(SessionError::NoCube(self.phase)),
        }
    }

    /// Recompute the lookup for the current marker, if everything is loaded
    fn refresh_lookup(&mut self) -> Result<(), SessionError> {
        self.last_lookup = None;
        let (Some(marker), Some(cube), Some(library)) =
            (self.image.marker().copied(), self.cube.as_ref(), self.library.as_ref())
        else {
            return Ok(());
        };

        let outcome = lookup_pixel(
            &**cube,
            library.library(),
            marker.natural_x,
            marker.natural_y,
            self.case,
        )?;

        let description = match &outcome.selection {
            Some(sel) => format!(
                "({}, {}) phase {}° -> row {} ({}, {} points)",
                outcome.x,
                outcome.y,
                self.phase,
                sel.row,
                self.case.key(),
                outcome.curve.len()
            ),
            None => format!("({}, {}) phase {}° -> N/A", outcome.x, outcome.y, self.phase),
        };
        let command = format!(
            "{} pixel --phase {} --x {} --y {}",
            self.command_prefix(),
            self.phase,
            outcome.x,
            outcome.y
        );
        self.log.record("lookup", &description, &command);
        self.last_lookup = Some(outcome);
        Ok(())
    }

    pub fn set_case(&mut self, case: CaseVariant) -> Result<(), SessionError> {
        if case == self.case {
            return Ok(());
        }
        self.case = case;
        self.log.record("case", &format!("Switched to {}", case.key()), "");
        self.refresh_lookup()
    }

    /// Switch composite; a smaller image clamps the marker, so the lookup
    /// is redone
    pub fn set_composite(&mut self, composite: Composite) -> Result<(), SessionError> {
        self.composite = composite;
        self.refresh_natural_size();
        self.log.record("composite", &format!("Composite {}", composite.label()), "");
        self.refresh_lookup()
    }

    pub fn set_display_size(&mut self, display: Size) {
        self.image.resize(display);
    }

    // ─── Teardown ───────────────────────────────────────────────────────────

    /// Drop every cached source and the current selection's data
    pub fn teardown(&mut self) {
        if self.cubes.is_empty() && self.libraries.is_empty() && self.cube.is_none() && self.library.is_none() {
            return;
        }
        log::info!(
            "Session teardown: geo-cube cache {} hits / {} misses",
            self.cubes.hits(),
            self.cubes.misses()
        );
        self.cubes.clear();
        self.libraries.clear();
        self.cube = None;
        self.library = None;
        self.awaiting = None;
        self.in_flight.clear();
        self.last_lookup = None;
        self.log.record("teardown", "Caches cleared", "");
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
