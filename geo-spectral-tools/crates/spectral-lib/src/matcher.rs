//! Nearest-angle matching against small discrete angle axes.

use crate::error::SpectralError;

/// Two angles closer than this are treated as identical.
pub const EXACT_MATCH_TOLERANCE: f64 = 1e-6;

/// Index of the angle closest to `target`.
///
/// An exact match (within [`EXACT_MATCH_TOLERANCE`]) wins outright; the
/// first such index is returned. Otherwise the first index achieving the
/// minimum absolute difference is returned, so equidistant candidates
/// resolve to the earlier one.
pub fn closest_index(angles: &[f64], target: f64) -> Result<usize, SpectralError> {
    closest_index_on("angle", angles, target)
}

pub(crate) fn closest_index_on(
    axis: &'static str,
    angles: &[f64],
    target: f64,
) -> Result<usize, SpectralError> {
    if angles.is_empty() {
        return Err(SpectralError::EmptyInput { axis, target });
    }
    if !target.is_finite() {
        return Err(SpectralError::NonFiniteAngle { axis, target });
    }

    if let Some(i) = angles
        .iter()
        .position(|a| (a - target).abs() < EXACT_MATCH_TOLERANCE)
    {
        return Ok(i);
    }

    let mut best: Option<(usize, f64)> = None;
    for (i, a) in angles.iter().enumerate() {
        let diff = (a - target).abs();
        // NaN candidates never compare less and are skipped
        match best {
            Some((_, best_diff)) if diff < best_diff => best = Some((i, diff)),
            None if diff.is_finite() => best = Some((i, diff)),
            _ => {}
        }
    }

    best.map(|(i, _)| i)
        .ok_or(SpectralError::EmptyInput { axis, target })
}

/// Distinct finite values in order of first occurrence.
pub fn distinct_values(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::new();
    for &v in values {
        if !v.is_finite() {
            log::warn!("Dropping non-finite axis value {}", v);
            continue;
        }
        if !out.iter().any(|&u| u == v) {
            out.push(v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const AXIS: [f64; 4] = [0.0, 30.0, 60.0, 90.0];

    #[test]
    fn test_nearest_candidate() {
        assert_eq!(closest_index(&AXIS, 29.0).unwrap(), 1);
        assert_eq!(closest_index(&AXIS, 88.0).unwrap(), 3);
        assert_eq!(closest_index(&AXIS, -20.0).unwrap(), 0);
        assert_eq!(closest_index(&AXIS, 500.0).unwrap(), 3);
    }

    #[test]
    fn test_exact_match_within_tolerance() {
        assert_eq!(closest_index(&AXIS, 30.0000001).unwrap(), 1);
        assert_eq!(closest_index(&AXIS, 60.0).unwrap(), 2);
    }

    #[test]
    fn test_exact_match_returns_first_duplicate() {
        assert_eq!(closest_index(&[10.0, 20.0, 20.0], 20.0).unwrap(), 1);
    }

    #[test]
    fn test_tie_goes_to_earliest_index() {
        assert_eq!(closest_index(&AXIS, 45.0).unwrap(), 1);
        assert_eq!(closest_index(&AXIS, 15.0).unwrap(), 0);
        // Tie-break is by position, not by value order
        assert_eq!(closest_index(&[60.0, 30.0], 45.0).unwrap(), 0);
    }

    #[test]
    fn test_empty_axis_is_an_error() {
        assert!(matches!(
            closest_index(&[], 10.0),
            Err(SpectralError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_non_finite_target_is_an_error() {
        assert!(matches!(
            closest_index(&AXIS, f64::NAN),
            Err(SpectralError::NonFiniteAngle { .. })
        ));
    }

    #[test]
    fn test_nan_candidates_are_skipped() {
        assert_eq!(closest_index(&[f64::NAN, 40.0, 10.0], 12.0).unwrap(), 2);
        assert!(closest_index(&[f64::NAN], 12.0).is_err());
    }

    #[test]
    fn test_distinct_values_keep_first_occurrence_order() {
        let per_row = [60.0, 60.0, 0.0, 0.0, 30.0, 60.0, f64::NAN];
        assert_eq!(distinct_values(&per_row), vec![60.0, 0.0, 30.0]);
    }
}
