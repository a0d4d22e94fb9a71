//! Per-pixel geometry readout.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::band::Band;
use crate::cube::CubeError;

/// Anything that can answer a clamped `(x, y, band)` lookup.
pub trait BandSource {
    fn lookup(&self, x: i64, y: i64, band: i64) -> Result<f32, CubeError>;
}

/// Geometry values at one native pixel.
///
/// A field is `None` when its band lookup failed; the remaining fields are
/// still valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryReading {
    pub lat: Option<f32>,
    pub lon: Option<f32>,
    pub phase: Option<f32>,
    pub incidence: Option<f32>,
    pub emission: Option<f32>,
    pub azimuth: Option<f32>,
}

impl GeometryReading {
    /// Look up every geometry band at `(x, y)`, keeping partial results.
    pub fn extract<S: BandSource + ?Sized>(source: &S, x: i64, y: i64) -> Self {
        let read = |band: Band| match source.lookup(x, y, band.index() as i64) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("{} unavailable at ({}, {}): {}", band, x, y, e);
                None
            }
        };

        Self {
            lat: read(Band::Latitude),
            lon: read(Band::Longitude),
            phase: read(Band::Phase),
            incidence: read(Band::Incidence),
            emission: read(Band::Emission),
            azimuth: read(Band::Azimuth),
        }
    }

    pub fn get(&self, band: Band) -> Option<f32> {
        match band {
            Band::Latitude => self.lat,
            Band::Longitude => self.lon,
            Band::Phase => self.phase,
            Band::Incidence => self.incidence,
            Band::Emission => self.emission,
            Band::Azimuth => self.azimuth,
            _ => None,
        }
    }

    /// The `(incidence, emission, azimuth)` triple used for spectral lookup.
    ///
    /// `None` unless all three are present and finite.
    pub fn viewing_angles(&self) -> Option<(f64, f64, f64)> {
        let inc = self.incidence.filter(|v| v.is_finite())?;
        let emi = self.emission.filter(|v| v.is_finite())?;
        let az = self.azimuth.filter(|v| v.is_finite())?;
        Some((inc as f64, emi as f64, az as f64))
    }

    pub fn is_complete(&self) -> bool {
        Band::GEOMETRY.iter().all(|b| self.get(*b).is_some())
    }
}

impl fmt::Display for GeometryReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, band) in Band::GEOMETRY.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match self.get(*band) {
                Some(v) => write!(f, "{:<16} {:>10.3} {}", band.label(), v, band.unit())?,
                None => write!(f, "{:<16} {:>10}", band.label(), "N/A")?,
            }
            if let Some(note) = band.sign_note() {
                write!(f, "  ({})", note)?;
            }
        }
        Ok(())
    }
}
