/// Viewer settings
///
/// Loaded from an optional JSON file; every key is optional and falls back
/// to its default. Command-line flags override individual fields.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use spectral_lib::CaseVariant;

use super::assets::{Composite, DEFAULT_MISSION_LABEL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Directory holding geo-cubes and composite images
    pub asset_dir: PathBuf,
    /// Filename prefix shared by all assets
    pub mission_label: String,
    /// Spectral library document
    pub library_path: PathBuf,
    /// Wavelength point budget applied once per library load
    pub max_points: usize,
    /// Phase angle selected at startup (degrees)
    pub default_phase: u32,
    pub default_case: CaseVariant,
    pub composite: Composite,
    /// How long a blocking caller waits for a geo-cube fetch
    pub fetch_timeout_secs: u64,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            mission_label: DEFAULT_MISSION_LABEL.to_string(),
            library_path: PathBuf::from("assets/spectral_library.json"),
            max_points: 2000,
            default_phase: 0,
            default_case: CaseVariant::Standard,
            composite: Composite::Long,
            fetch_timeout_secs: 30,
        }
    }
}

impl ViewerSettings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&text).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid settings file {}: {}", path.display(), e),
            )
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}
