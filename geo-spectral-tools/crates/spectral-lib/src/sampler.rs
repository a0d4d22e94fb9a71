//! Point-budget sampling of a spectral library.
//!
//! Sampling is lossy and applied once per load. [`sample`] consumes the
//! library and returns a [`SampledLibrary`], which cannot be sampled again.

use serde::Serialize;
use std::ops::Deref;

use crate::library::SpectralLibrary;
use crate::matcher::distinct_values;

/// A library reduced to a point budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampledLibrary {
    library: SpectralLibrary,
    step: usize,
    source_points: usize,
}

impl SampledLibrary {
    pub fn library(&self) -> &SpectralLibrary {
        &self.library
    }

    /// Stride used over the original wavelength axis.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Wavelength count before sampling.
    pub fn source_points(&self) -> usize {
        self.source_points
    }
}

impl Deref for SampledLibrary {
    type Target = SpectralLibrary;

    fn deref(&self) -> &SpectralLibrary {
        &self.library
    }
}

/// Stride and retained positions for `len` wavelengths under `max_points`.
///
/// Keeps every `step`-th position from 0 and always keeps the final one.
/// A budget of 0 keeps everything.
pub fn sample_indices(len: usize, max_points: usize) -> (usize, Vec<usize>) {
    let step = if max_points == 0 {
        1
    } else {
        (len / max_points).max(1)
    };
    let mut indices: Vec<usize> = (0..len).step_by(step).collect();
    if let Some(&last) = indices.last() {
        if last != len - 1 {
            indices.push(len - 1);
        }
    }
    (step, indices)
}

fn pick(values: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().filter_map(|&i| values.get(i).copied()).collect()
}

fn pick_rows(rows: &[Vec<f64>], indices: &[usize]) -> Vec<Vec<f64>> {
    rows.iter().map(|row| pick(row, indices)).collect()
}

/// Downsample the wavelength axis and every case-table row at the same
/// positions, and collapse the angle axes to their distinct values.
pub fn sample(library: SpectralLibrary, max_points: usize) -> SampledLibrary {
    let source_points = library.wavelength.len();
    let (step, indices) = sample_indices(source_points, max_points);

    let sampled = SpectralLibrary {
        wavelength: pick(&library.wavelength, &indices),
        inc: distinct_values(&library.inc),
        emi: distinct_values(&library.emi),
        daz: distinct_values(&library.daz),
        standard: pick_rows(&library.standard, &indices),
        no_ch4: pick_rows(&library.no_ch4, &indices),
        no_haze: pick_rows(&library.no_haze, &indices),
    };

    log::info!(
        "Sampled spectral library: {} -> {} wavelengths (step {}), {} rows",
        source_points,
        sampled.wavelength.len(),
        step,
        sampled.row_count()
    );

    SampledLibrary {
        library: sampled,
        step,
        source_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twelve_point_library() -> SpectralLibrary {
        let wavelength: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let row = |offset: f64| -> Vec<f64> { (0..12).map(|i| offset + i as f64).collect() };
        SpectralLibrary {
            wavelength,
            inc: vec![0.0, 0.0, 30.0, 30.0],
            emi: vec![0.0, 0.0, 0.0, 0.0],
            daz: vec![0.0, 90.0, 0.0, 90.0],
            standard: vec![row(100.0), row(200.0), row(300.0), row(400.0)],
            no_ch4: vec![row(500.0), row(600.0), row(700.0), row(800.0)],
            no_haze: vec![row(900.0), row(1000.0), row(1100.0), row(1200.0)],
        }
    }

    #[test]
    fn test_indices_keep_final_wavelength() {
        assert_eq!(sample_indices(12, 4), (3, vec![0, 3, 6, 9, 11]));
        assert_eq!(sample_indices(13, 4), (3, vec![0, 3, 6, 9, 12]));
        assert_eq!(sample_indices(10, 5), (2, vec![0, 2, 4, 6, 8, 9]));
    }

    #[test]
    fn test_indices_small_sources() {
        assert_eq!(sample_indices(3, 10), (1, vec![0, 1, 2]));
        assert_eq!(sample_indices(1, 4), (1, vec![0]));
        assert_eq!(sample_indices(0, 4), (1, vec![]));
        assert_eq!(sample_indices(5, 0), (1, vec![0, 1, 2, 3, 4]));
    }

    #[test]
    fn test_sample_aligns_axis_and_rows() {
        let sampled = sample(twelve_point_library(), 4);
        assert_eq!(sampled.step(), 3);
        assert_eq!(sampled.source_points(), 12);
        assert_eq!(sampled.wavelength, vec![0.0, 3.0, 6.0, 9.0, 11.0]);
        assert_eq!(sampled.standard[1], vec![200.0, 203.0, 206.0, 209.0, 211.0]);
        assert_eq!(sampled.no_ch4[0], vec![500.0, 503.0, 506.0, 509.0, 511.0]);
        assert_eq!(sampled.no_haze[3], vec![1200.0, 1203.0, 1206.0, 1209.0, 1211.0]);
        for &case in crate::library::CaseVariant::all() {
            for row in sampled.table(case) {
                assert_eq!(row.len(), sampled.wavelength.len());
            }
        }
    }

    #[test]
    fn test_sample_collapses_angle_axes() {
        let sampled = sample(twelve_point_library(), 4);
        assert_eq!(sampled.inc, vec![0.0, 30.0]);
        assert_eq!(sampled.emi, vec![0.0]);
        assert_eq!(sampled.daz, vec![0.0, 90.0]);
        sampled.validate().unwrap();
    }

    #[test]
    fn test_sample_keeps_missing_case_empty() {
        let mut lib = twelve_point_library();
        lib.no_haze.clear();
        let sampled = sample(lib, 6);
        assert!(sampled.no_haze.is_empty());
        assert_eq!(sampled.row_count(), 4);
    }
}
