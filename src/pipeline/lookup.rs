/// Pixel to spectrum lookup
///
/// Reads the geometry at a native pixel, matches its viewing angles against
/// the library axes and returns the spectrum for the chosen case.

use serde::Serialize;

use geocube::{BandSource, GeometryReading};
use spectral_lib::{CaseVariant, RowSelection, SpectralError, SpectralLibrary, SpectrumCurve, ViewingAngles};

/// Everything derived from one inspected pixel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupOutcome {
    pub x: u32,
    pub y: u32,
    pub reading: GeometryReading,
    /// `None` when a viewing angle is absent or not finite
    pub selection: Option<RowSelection>,
    pub curve: SpectrumCurve,
}

impl LookupOutcome {
    /// A spectrum is available for this pixel and case
    pub fn has_spectrum(&self) -> bool {
        !self.curve.is_empty()
    }
}

/// Run the full lookup at `(x, y)`.
///
/// Missing geometry is not an error: the outcome carries no selection and
/// an empty curve. Axis/table inconsistencies are.
pub fn lookup_pixel<S: BandSource + ?Sized>(
    source: &S,
    library: &SpectralLibrary,
    x: u32,
    y: u32,
    case: CaseVariant,
) -> Result<LookupOutcome, SpectralError> {
    let reading = GeometryReading::extract(source, x as i64, y as i64);

    let Some(angles) = reading.viewing_angles() else {
        log::info!("No viewing geometry at ({}, {}), spectrum N/A", x, y);
        return Ok(LookupOutcome {
            x,
            y,
            reading,
            selection: None,
            curve: SpectrumCurve::empty(case),
        });
    };

    let selection = library.resolve(ViewingAngles::from(angles))?;
    let curve = library.curve(case, selection.row);
    if curve.is_empty() {
        log::info!("Case '{}' has no row {}", case.key(), selection.row);
    }

    Ok(LookupOutcome {
        x,
        y,
        reading,
        selection: Some(selection),
        curve,
    })
}
