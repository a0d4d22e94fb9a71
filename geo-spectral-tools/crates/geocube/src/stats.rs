//! Per-band summaries over finite values.

use serde::Serialize;

use crate::band::Band;
use crate::cube::GeoCube;

/// Summary of one band plane. Non-finite values are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandSummary {
    pub band: Band,
    pub finite_count: usize,
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub mean: Option<f64>,
}

impl BandSummary {
    pub fn from_values(band: Band, values: &[f32]) -> Self {
        let mut count = 0usize;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        for &v in values.iter().filter(|v| v.is_finite()) {
            count += 1;
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
        }

        if count == 0 {
            return Self {
                band,
                finite_count: 0,
                min: None,
                max: None,
                mean: None,
            };
        }

        Self {
            band,
            finite_count: count,
            min: Some(min),
            max: Some(max),
            mean: Some(sum / count as f64),
        }
    }
}

/// Summaries of every band present in the cube.
pub fn summarize(cube: &GeoCube) -> Vec<BandSummary> {
    Band::ALL
        .iter()
        .filter_map(|&band| {
            cube.band_plane(band)
                .map(|plane| BandSummary::from_values(band, plane))
        })
        .collect()
}
