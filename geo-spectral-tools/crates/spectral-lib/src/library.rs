//! Spectral library document model.
//!
//! The library is delivered as a JSON document with keys `wavelength`,
//! `inc`, `emi`, `daz` and one `R × N` table per case variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::curve::SpectrumCurve;
use crate::error::SpectralError;
use crate::matcher::distinct_values;
use crate::resolver::{resolve_row, select_case, AngleAxes, RowSelection, ViewingAngles};

/// Precomputed atmospheric scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseVariant {
    Standard,
    NoCh4,
    NoHaze,
}

impl CaseVariant {
    pub fn all() -> &'static [CaseVariant] {
        &[CaseVariant::Standard, CaseVariant::NoCh4, CaseVariant::NoHaze]
    }

    /// Document key of this case's table.
    pub fn key(&self) -> &'static str {
        match self {
            CaseVariant::Standard => "standard",
            CaseVariant::NoCh4 => "no_ch4",
            CaseVariant::NoHaze => "no_haze",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaseVariant::Standard => "Standard",
            CaseVariant::NoCh4 => "No CH4",
            CaseVariant::NoHaze => "No haze",
        }
    }
}

impl fmt::Display for CaseVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for CaseVariant {
    type Err = SpectralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(CaseVariant::Standard),
            "no_ch4" => Ok(CaseVariant::NoCh4),
            "no_haze" => Ok(CaseVariant::NoHaze),
            other => Err(SpectralError::UnknownCase(other.to_string())),
        }
    }
}

/// Wavelength axis, angle axes and the three case tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralLibrary {
    /// Wavelengths in µm, index-aligned with every table row.
    pub wavelength: Vec<f64>,
    /// Incidence angles (deg).
    pub inc: Vec<f64>,
    /// Emission angles (deg).
    pub emi: Vec<f64>,
    /// Azimuth differences (deg).
    pub daz: Vec<f64>,
    #[serde(default)]
    pub standard: Vec<Vec<f64>>,
    #[serde(default)]
    pub no_ch4: Vec<Vec<f64>>,
    #[serde(default)]
    pub no_haze: Vec<Vec<f64>>,
}

impl SpectralLibrary {
    /// Parse a library document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SpectralError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SpectralError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read, parse and validate a library document.
    pub fn open(path: &Path) -> Result<Self, SpectralError> {
        let bytes = std::fs::read(path)?;
        let library = Self::from_slice(&bytes)?;
        library.validate()?;
        log::info!(
            "Loaded spectral library {}: {} wavelengths, {} rows",
            path.display(),
            library.wavelength.len(),
            library.row_count()
        );
        Ok(library)
    }

    pub fn to_json(&self) -> Result<String, SpectralError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn table(&self, case: CaseVariant) -> &[Vec<f64>] {
        match case {
            CaseVariant::Standard => &self.standard,
            CaseVariant::NoCh4 => &self.no_ch4,
            CaseVariant::NoHaze => &self.no_haze,
        }
    }

    /// Row count shared by the case tables (largest, if they disagree).
    pub fn row_count(&self) -> usize {
        CaseVariant::all()
            .iter()
            .map(|c| self.table(*c).len())
            .max()
            .unwrap_or(0)
    }

    /// Distinct angle axes that index the table rows.
    pub fn angle_axes(&self) -> AngleAxes {
        AngleAxes {
            inc: distinct_values(&self.inc),
            emi: distinct_values(&self.emi),
            daz: distinct_values(&self.daz),
        }
    }

    /// Check that the axes and tables describe the same grid.
    pub fn validate(&self) -> Result<(), SpectralError> {
        let n = self.wavelength.len();
        let mut rows: Option<usize> = None;

        for &case in CaseVariant::all() {
            let table = self.table(case);
            if table.is_empty() {
                log::debug!("Case table '{}' is empty", case.key());
                continue;
            }
            match rows {
                Some(r) if r != table.len() => {
                    return Err(SpectralError::Inconsistent(format!(
                        "table '{}' has {} rows, expected {}",
                        case.key(),
                        table.len(),
                        r
                    )));
                }
                None => rows = Some(table.len()),
                _ => {}
            }
            if let Some((i, row)) = table.iter().enumerate().find(|(_, row)| row.len() != n) {
                return Err(SpectralError::Inconsistent(format!(
                    "table '{}' row {} has {} values, wavelength axis has {}",
                    case.key(),
                    i,
                    row.len(),
                    n
                )));
            }
        }

        let axes = self.angle_axes();
        let combos = axes.combinations();
        let rows = rows.unwrap_or(0);
        if combos != rows {
            return Err(SpectralError::Inconsistent(format!(
                "angle axes {}×{}×{} = {} combinations, tables have {} rows",
                axes.inc.len(),
                axes.emi.len(),
                axes.daz.len(),
                combos,
                rows
            )));
        }
        Ok(())
    }

    /// Resolve the table row for a set of viewing angles.
    pub fn resolve(&self, angles: ViewingAngles) -> Result<RowSelection, SpectralError> {
        let axes = self.angle_axes();
        resolve_row(
            &axes.inc,
            &axes.emi,
            &axes.daz,
            angles.incidence,
            angles.emission,
            angles.azimuth,
            self.row_count(),
        )
    }

    /// Row `row` of one case table; empty when that case has no such row.
    pub fn row(&self, case: CaseVariant, row: usize) -> &[f64] {
        select_case(&self.standard, &self.no_ch4, &self.no_haze, case, row)
    }

    /// Wavelength/intensity curve for one case and row.
    pub fn curve(&self, case: CaseVariant, row: usize) -> SpectrumCurve {
        SpectrumCurve::from_row(case, &self.wavelength, self.row(case, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_library() -> SpectralLibrary {
        // 2 inc × 1 emi × 2 daz = 4 rows, 3 wavelengths
        let rows: Vec<Vec<f64>> = (0..4)
            .map(|r| (0..3).map(|w| (r * 10 + w) as f64).collect())
            .collect();
        SpectralLibrary {
            wavelength: vec![1.0, 2.0, 3.0],
            inc: vec![0.0, 45.0],
            emi: vec![0.0],
            daz: vec![0.0, 180.0],
            standard: rows.clone(),
            no_ch4: rows.clone(),
            no_haze: rows,
        }
    }

    #[test]
    fn test_case_variant_parse() {
        assert_eq!("standard".parse::<CaseVariant>().unwrap(), CaseVariant::Standard);
        assert_eq!("NO_CH4".parse::<CaseVariant>().unwrap(), CaseVariant::NoCh4);
        assert_eq!(" no_haze ".parse::<CaseVariant>().unwrap(), CaseVariant::NoHaze);
        assert!(matches!(
            "hazy".parse::<CaseVariant>(),
            Err(SpectralError::UnknownCase(_))
        ));
    }

    #[test]
    fn test_parse_document() {
        let json = br#"{
            "wavelength": [1.0, 2.0],
            "inc": [0.0], "emi": [0.0], "daz": [0.0, 90.0],
            "standard": [[0.1, 0.2], [0.3, 0.4]],
            "no_ch4": [[0.5, 0.6], [0.7, 0.8]]
        }"#;
        let lib = SpectralLibrary::from_slice(json).unwrap();
        assert_eq!(lib.row_count(), 2);
        assert!(lib.no_haze.is_empty());
        lib.validate().unwrap();
    }

    #[test]
    fn test_parse_rejects_malformed_document() {
        assert!(matches!(
            SpectralLibrary::from_slice(b"{\"wavelength\": [1.0"),
            Err(SpectralError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_accepts_consistent_library() {
        small_library().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_row_count_mismatch() {
        let mut lib = small_library();
        lib.no_haze.pop();
        assert!(matches!(lib.validate(), Err(SpectralError::Inconsistent(_))));
    }

    #[test]
    fn test_validate_rejects_short_row() {
        let mut lib = small_library();
        lib.standard[2].pop();
        assert!(matches!(lib.validate(), Err(SpectralError::Inconsistent(_))));
    }

    #[test]
    fn test_validate_rejects_axis_product_mismatch() {
        let mut lib = small_library();
        lib.daz.push(90.0);
        assert!(matches!(lib.validate(), Err(SpectralError::Inconsistent(_))));
    }

    #[test]
    fn test_validate_accepts_per_row_axes() {
        // Axes flattened per row collapse to the same distinct grid
        let mut lib = small_library();
        lib.inc = vec![0.0, 0.0, 45.0, 45.0];
        lib.emi = vec![0.0; 4];
        lib.daz = vec![0.0, 180.0, 0.0, 180.0];
        lib.validate().unwrap();
        assert_eq!(lib.angle_axes().inc, vec![0.0, 45.0]);
    }

    #[test]
    fn test_resolve_and_curve() {
        let lib = small_library();
        let sel = lib
            .resolve(ViewingAngles {
                incidence: 44.0,
                emission: 3.0,
                azimuth: 170.0,
            })
            .unwrap();
        assert_eq!(sel.row, 3);
        let curve = lib.curve(CaseVariant::NoCh4, sel.row);
        assert_eq!(curve.points(), vec![[1.0, 30.0], [2.0, 31.0], [3.0, 32.0]]);
    }

    #[test]
    fn test_missing_case_row_is_empty() {
        let mut lib = small_library();
        lib.no_haze.clear();
        assert!(lib.row(CaseVariant::NoHaze, 1).is_empty());
        assert!(lib.curve(CaseVariant::NoHaze, 1).is_empty());
        assert_eq!(lib.row(CaseVariant::Standard, 1), &[10.0, 11.0, 12.0]);
    }
}
