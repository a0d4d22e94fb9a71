//! Mapping matched angle indices to a flat spectral table row.

use serde::{Deserialize, Serialize};

use crate::error::SpectralError;
use crate::library::CaseVariant;
use crate::matcher::closest_index_on;

/// The three distinct angle axes indexing the table rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleAxes {
    pub inc: Vec<f64>,
    pub emi: Vec<f64>,
    pub daz: Vec<f64>,
}

impl AngleAxes {
    /// Number of `(inc, emi, daz)` combinations.
    pub fn combinations(&self) -> usize {
        self.inc.len() * self.emi.len() * self.daz.len()
    }
}

/// Target viewing geometry for a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewingAngles {
    pub incidence: f64,
    pub emission: f64,
    pub azimuth: f64,
}

impl From<(f64, f64, f64)> for ViewingAngles {
    fn from((incidence, emission, azimuth): (f64, f64, f64)) -> Self {
        Self {
            incidence,
            emission,
            azimuth,
        }
    }
}

/// A resolved table row together with the matched axis entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowSelection {
    pub row: usize,
    pub inc_index: usize,
    pub emi_index: usize,
    pub daz_index: usize,
    pub matched: ViewingAngles,
}

/// Row-major flat index of an angle index triple.
pub fn flat_row(
    inc_index: usize,
    emi_index: usize,
    daz_index: usize,
    emi_len: usize,
    daz_len: usize,
) -> usize {
    inc_index * (emi_len * daz_len) + emi_index * daz_len + daz_index
}

/// Match each target angle on its axis and combine into a table row.
///
/// Fails with [`SpectralError::Range`] when the row is not below
/// `row_count`: the axes and the table disagree.
pub fn resolve_row(
    inc: &[f64],
    emi: &[f64],
    daz: &[f64],
    target_inc: f64,
    target_emi: f64,
    target_daz: f64,
    row_count: usize,
) -> Result<RowSelection, SpectralError> {
    let inc_index = closest_index_on("incidence", inc, target_inc)?;
    let emi_index = closest_index_on("emission", emi, target_emi)?;
    let daz_index = closest_index_on("azimuth", daz, target_daz)?;

    let row = flat_row(inc_index, emi_index, daz_index, emi.len(), daz.len());
    if row >= row_count {
        return Err(SpectralError::Range {
            row,
            rows: row_count,
        });
    }

    log::debug!(
        "Resolved ({:.2}, {:.2}, {:.2}) -> indices ({}, {}, {}) -> row {}",
        target_inc,
        target_emi,
        target_daz,
        inc_index,
        emi_index,
        daz_index,
        row
    );

    Ok(RowSelection {
        row,
        inc_index,
        emi_index,
        daz_index,
        matched: ViewingAngles {
            incidence: inc[inc_index],
            emission: emi[emi_index],
            azimuth: daz[daz_index],
        },
    })
}

/// The row of the table named by `case`, or an empty slice when that
/// table has no such row.
pub fn select_case<'a>(
    standard: &'a [Vec<f64>],
    no_ch4: &'a [Vec<f64>],
    no_haze: &'a [Vec<f64>],
    case: CaseVariant,
    row: usize,
) -> &'a [f64] {
    let table = match case {
        CaseVariant::Standard => standard,
        CaseVariant::NoCh4 => no_ch4,
        CaseVariant::NoHaze => no_haze,
    };
    table.get(row).map(Vec::as_slice).unwrap_or(&[])
}
