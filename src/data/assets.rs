/// Asset catalog: phase-angle grid and asset filenames
///
/// Every phase angle on the 5° grid has one geo-cube and one composite
/// image per band combination, all sharing a mission label prefix:
///
///   <label>_p<phase:03>_geo.img
///   <label>_p<phase:03>_<composite>.png

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use spectral_lib::{closest_index, SpectralError};

/// Mission label used by the bundled assets.
pub const DEFAULT_MISSION_LABEL: &str = "2012_A0.1";
/// Spacing of the phase-angle grid (degrees).
pub const PHASE_STEP_DEG: u32 = 5;
/// Last phase angle on the grid (degrees).
pub const PHASE_MAX_DEG: u32 = 355;

/// Band combination of a pre-rendered composite image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Composite {
    /// 5, 2, 1.3 µm as red, green, blue
    #[serde(rename = "5_2_1.3")]
    Long,
    /// 2, 1.6, 1.3 µm as red, green, blue
    #[serde(rename = "2_1.6_1.3")]
    Short,
}

impl Composite {
    pub fn all() -> &'static [Composite] {
        &[Composite::Long, Composite::Short]
    }

    /// Filename key
    pub fn key(&self) -> &'static str {
        match self {
            Composite::Long => "5_2_1.3",
            Composite::Short => "2_1.6_1.3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Composite::Long => "5, 2, 1.3 µm",
            Composite::Short => "2, 1.6, 1.3 µm",
        }
    }
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Composite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Composite::all()
            .iter()
            .find(|c| c.key() == s.trim())
            .copied()
            .ok_or_else(|| format!("unknown composite '{}' (expected 5_2_1.3 or 2_1.6_1.3)", s))
    }
}

/// Locates geo-cubes and composite images for each phase angle
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    root: PathBuf,
    mission_label: String,
}

impl AssetCatalog {
    pub fn new(root: impl Into<PathBuf>, mission_label: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            mission_label: mission_label.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mission_label(&self) -> &str {
        &self.mission_label
    }

    /// Every phase angle on the grid, ascending
    pub fn phase_angles() -> Vec<u32> {
        (0..=PHASE_MAX_DEG).step_by(PHASE_STEP_DEG as usize).collect()
    }

    /// Snap an arbitrary phase angle to the nearest grid angle
    pub fn snap_phase(angle: f64) -> Result<u32, SpectralError> {
        let grid = Self::phase_angles();
        let as_f64: Vec<f64> = grid.iter().map(|&p| p as f64).collect();
        let i = closest_index(&as_f64, angle)?;
        Ok(grid[i])
    }

    pub fn geo_file_name(&self, phase: u32) -> String {
        format!("{}_p{:03}_geo.img", self.mission_label, phase)
    }

    pub fn composite_file_name(&self, phase: u32, composite: Composite) -> String {
        format!("{}_p{:03}_{}.png", self.mission_label, phase, composite.key())
    }

    pub fn geo_path(&self, phase: u32) -> PathBuf {
        self.root.join(self.geo_file_name(phase))
    }

    pub fn composite_path(&self, phase: u32, composite: Composite) -> PathBuf {
        self.root.join(self.composite_file_name(phase, composite))
    }

    /// Grid phases whose geo-cube exists under the asset root
    pub fn available_phases(&self) -> Vec<u32> {
        Self::phase_angles()
            .into_iter()
            .filter(|&p| self.geo_path(p).is_file())
            .collect()
    }

    /// Natural pixel size of a composite image, read from its header only
    pub fn natural_size(&self, phase: u32, composite: Composite) -> image::ImageResult<(u32, u32)> {
        let path = self.composite_path(phase, composite);
        let dims = image::image_dimensions(&path)?;
        log::debug!("{}: natural size {}×{}", path.display(), dims.0, dims.1);
        Ok(dims)
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::new("assets", DEFAULT_MISSION_LABEL)
    }
}
