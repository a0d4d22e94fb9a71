//! Band semantics of the geo-cube.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the nine fixed bands of a geo-cube, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Latitude = 0,
    Longitude = 1,
    XResolution = 2,
    YResolution = 3,
    Phase = 4,
    Incidence = 5,
    Emission = 6,
    Azimuth = 7,
    Distance = 8,
}

impl Band {
    pub const ALL: [Band; 9] = [
        Band::Latitude,
        Band::Longitude,
        Band::XResolution,
        Band::YResolution,
        Band::Phase,
        Band::Incidence,
        Band::Emission,
        Band::Azimuth,
        Band::Distance,
    ];

    /// Bands extracted for a geometry readout.
    pub const GEOMETRY: [Band; 6] = [
        Band::Latitude,
        Band::Longitude,
        Band::Phase,
        Band::Incidence,
        Band::Emission,
        Band::Azimuth,
    ];

    /// Zero-based band index within the cube.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Band> {
        Self::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Band::Latitude => "Latitude",
            Band::Longitude => "Longitude",
            Band::XResolution => "X resolution",
            Band::YResolution => "Y resolution",
            Band::Phase => "Phase angle",
            Band::Incidence => "Incidence angle",
            Band::Emission => "Emission angle",
            Band::Azimuth => "Azimuth angle",
            Band::Distance => "Distance",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Band::XResolution | Band::YResolution => "km/px",
            Band::Distance => "km",
            _ => "deg",
        }
    }

    /// Sign convention as annotated in the source products.
    ///
    /// These disagree with the usual geographic convention and are kept as
    /// annotations only; values are never flipped.
    pub fn sign_note(&self) -> Option<&'static str> {
        match self {
            Band::Latitude => Some("negative = North"),
            Band::Longitude => Some("negative = West"),
            _ => None,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
