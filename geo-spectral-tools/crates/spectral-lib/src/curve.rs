//! Renderable wavelength/intensity sequences.

use serde::{Deserialize, Serialize};

use crate::library::CaseVariant;

/// One spectrum ready for plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumCurve {
    pub case: CaseVariant,
    pub wavelength: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl SpectrumCurve {
    /// Pair a wavelength axis with a table row, truncating to the shorter.
    pub fn from_row(case: CaseVariant, wavelength: &[f64], row: &[f64]) -> Self {
        let n = wavelength.len().min(row.len());
        if row.len() != wavelength.len() && !row.is_empty() {
            log::warn!(
                "Row has {} values for {} wavelengths; truncating to {}",
                row.len(),
                wavelength.len(),
                n
            );
        }
        Self {
            case,
            wavelength: wavelength[..n].to_vec(),
            intensity: row[..n].to_vec(),
        }
    }

    pub fn empty(case: CaseVariant) -> Self {
        Self {
            case,
            wavelength: Vec::new(),
            intensity: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.intensity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensity.is_empty()
    }

    /// `[wavelength, intensity]` pairs.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.wavelength
            .iter()
            .zip(&self.intensity)
            .map(|(&w, &i)| [w, i])
            .collect()
    }

    /// Finite intensity range.
    pub fn intensity_range(&self) -> Option<(f64, f64)> {
        self.intensity
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Point of maximum intensity.
    pub fn peak(&self) -> Option<[f64; 2]> {
        self.points()
            .into_iter()
            .filter(|p| p[1].is_finite())
            .fold(None, |best: Option<[f64; 2]>, p| match best {
                Some(b) if b[1] >= p[1] => Some(b),
                _ => Some(p),
            })
    }

    /// Two-column CSV with a header line.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("wavelength_um,intensity\n");
        for [w, i] in self.points() {
            out.push_str(&format!("{},{}\n", w, i));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_pair_index_for_index() {
        let c = SpectrumCurve::from_row(CaseVariant::Standard, &[1.0, 2.0], &[0.5, 0.25]);
        assert_eq!(c.points(), vec![[1.0, 0.5], [2.0, 0.25]]);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_from_empty_row() {
        let c = SpectrumCurve::from_row(CaseVariant::NoHaze, &[1.0, 2.0], &[]);
        assert!(c.is_empty());
        assert!(c.wavelength.is_empty());
        assert_eq!(c, SpectrumCurve::empty(CaseVariant::NoHaze));
    }

    #[test]
    fn test_range_and_peak() {
        let c = SpectrumCurve::from_row(
            CaseVariant::Standard,
            &[1.0, 2.0, 3.0, 4.0],
            &[0.2, f64::NAN, 0.9, -0.1],
        );
        assert_eq!(c.intensity_range(), Some((-0.1, 0.9)));
        assert_eq!(c.peak(), Some([3.0, 0.9]));
    }

    #[test]
    fn test_csv() {
        let c = SpectrumCurve::from_row(CaseVariant::Standard, &[1.5], &[0.75]);
        assert_eq!(c.to_csv(), "wavelength_um,intensity\n1.5,0.75\n");
    }
}
