//! Geo-cube buffer: decoding and indexed lookup.
//!
//! Layout is band-major: sample varies fastest, then line, then band.
//! Values are IEEE-754 single precision, little-endian, one per 4-byte slot.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

use crate::band::Band;
use crate::geometry::{BandSource, GeometryReading};

// ─── Shape ──────────────────────────────────────────────────────────────────

/// Bands in a geo-cube file.
pub const GEO_BANDS: usize = 9;
/// Lines (rows) per band.
pub const GEO_LINES: usize = 681;
/// Samples (columns) per line.
pub const GEO_SAMPLES: usize = 681;
/// Bytes per stored value.
pub const VALUE_BYTES: usize = 4;
/// Exact size of a geo-cube file in bytes.
pub const GEO_CUBE_BYTES: usize = GEO_BANDS * GEO_LINES * GEO_SAMPLES * VALUE_BYTES; // 16_695_396

#[derive(Error, Debug)]
pub enum CubeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed cube buffer: expected {expected} bytes, got {got}")]
    Format { expected: usize, got: usize },
    #[error("Flat index {index} outside cube of {len} values")]
    Index { index: usize, len: usize },
}

/// Dimensions of a band/line/sample cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeShape {
    pub bands: usize,
    pub lines: usize,
    pub samples: usize,
}

impl CubeShape {
    /// The fixed 9 × 681 × 681 geo-cube shape.
    pub const GEO: CubeShape = CubeShape {
        bands: GEO_BANDS,
        lines: GEO_LINES,
        samples: GEO_SAMPLES,
    };

    pub const fn new(bands: usize, lines: usize, samples: usize) -> Self {
        Self {
            bands,
            lines,
            samples,
        }
    }

    /// Values per band plane.
    pub fn plane_len(&self) -> usize {
        self.lines * self.samples
    }

    pub fn value_count(&self) -> usize {
        self.bands * self.plane_len()
    }

    pub fn byte_len(&self) -> usize {
        self.value_count() * VALUE_BYTES
    }

    /// Flat index of `(band, line, sample)`, without bounds checks.
    pub fn flat_index(&self, sample: usize, line: usize, band: usize) -> usize {
        band * self.plane_len() + line * self.samples + sample
    }

    /// Inverse of [`CubeShape::flat_index`]: `(band, line, sample)`.
    pub fn unravel(&self, index: usize) -> (usize, usize, usize) {
        let plane = self.plane_len().max(1);
        let samples = self.samples.max(1);
        let band = index / plane;
        let rem = index % plane;
        (band, rem / samples, rem % samples)
    }
}

impl Default for CubeShape {
    fn default() -> Self {
        Self::GEO
    }
}

// ─── Cube ───────────────────────────────────────────────────────────────────

/// An immutable decoded geo-cube.
#[derive(Debug, Clone)]
pub struct GeoCube {
    shape: CubeShape,
    data: Vec<f32>,
}

impl GeoCube {
    /// Decode a geo-cube buffer of exactly [`GEO_CUBE_BYTES`] bytes.
    pub fn decode(buf: &[u8]) -> Result<Self, CubeError> {
        Self::decode_with_shape(buf, CubeShape::GEO)
    }

    /// Decode a buffer holding exactly `shape.byte_len()` bytes.
    ///
    /// A buffer of any other length is rejected whole; no partial cube is
    /// produced and nothing is zero-filled.
    pub fn decode_with_shape(buf: &[u8], shape: CubeShape) -> Result<Self, CubeError> {
        let expected = shape.byte_len();
        if buf.len() != expected {
            return Err(CubeError::Format {
                expected,
                got: buf.len(),
            });
        }

        let mut data = vec![0.0f32; shape.value_count()];
        LittleEndian::read_f32_into(buf, &mut data);

        log::debug!(
            "Decoded cube: {} bands × {} lines × {} samples",
            shape.bands,
            shape.lines,
            shape.samples
        );
        Ok(Self { shape, data })
    }

    /// Read a whole stream and decode it as a geo-cube.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, CubeError> {
        let mut buf = Vec::with_capacity(GEO_CUBE_BYTES);
        reader.read_to_end(&mut buf)?;
        Self::decode(&buf)
    }

    /// Read and decode a geo-cube file.
    pub fn open(path: &Path) -> Result<Self, CubeError> {
        let buf = std::fs::read(path)?;
        Self::decode(&buf)
    }

    pub fn shape(&self) -> CubeShape {
        self.shape
    }

    /// All values in file order.
    pub fn values(&self) -> &[f32] {
        &self.data
    }

    /// One band plane, line-major.
    pub fn band_plane(&self, band: Band) -> Option<&[f32]> {
        let plane = self.shape.plane_len();
        let start = band.index() * plane;
        self.data.get(start..start + plane)
    }

    /// Clamp a requested position into the cube, logging every adjustment.
    pub fn clamp_position(&self, x: i64, y: i64, band: i64) -> (usize, usize, usize) {
        (
            clamp_axis("sample", x, self.shape.samples),
            clamp_axis("line", y, self.shape.lines),
            clamp_axis("band", band, self.shape.bands),
        )
    }

    /// Value at sample `x`, line `y` of `band`.
    ///
    /// Each coordinate is clamped into range first. A computed index that
    /// still falls outside the buffer is reported as [`CubeError::Index`].
    pub fn lookup(&self, x: i64, y: i64, band: i64) -> Result<f32, CubeError> {
        let (sx, sy, sb) = self.clamp_position(x, y, band);
        let index = self.shape.flat_index(sx, sy, sb);
        self.data.get(index).copied().ok_or(CubeError::Index {
            index,
            len: self.data.len(),
        })
    }

    /// Value of a named band at a native pixel, `None` when unavailable.
    pub fn value_at(&self, x: usize, y: usize, band: Band) -> Option<f32> {
        self.lookup(x as i64, y as i64, band.index() as i64).ok()
    }

    /// Geometry readout at a native pixel.
    pub fn geometry_at(&self, x: i64, y: i64) -> GeometryReading {
        GeometryReading::extract(self, x, y)
    }

    /// Recover `(band, line, sample)` from a flat index.
    pub fn unravel(&self, index: usize) -> (usize, usize, usize) {
        self.shape.unravel(index)
    }
}

impl BandSource for GeoCube {
    fn lookup(&self, x: i64, y: i64, band: i64) -> Result<f32, CubeError> {
        GeoCube::lookup(self, x, y, band)
    }
}

fn clamp_axis(axis: &str, value: i64, len: usize) -> usize {
    let max = len.saturating_sub(1) as i64;
    let clamped = value.clamp(0, max.max(0));
    if clamped != value {
        log::warn!(
            "Clamped {} index {} into [0, {}] -> {}",
            axis,
            value,
            max,
            clamped
        );
    }
    clamped as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cube whose every value equals its own flat index.
    fn indexed_buffer(shape: CubeShape) -> Vec<u8> {
        let mut buf = vec![0u8; shape.byte_len()];
        for i in 0..shape.value_count() {
            LittleEndian::write_f32(&mut buf[i * 4..(i + 1) * 4], i as f32);
        }
        buf
    }

    #[test]
    fn test_geo_cube_byte_len() {
        assert_eq!(GEO_CUBE_BYTES, 16_695_396);
        assert_eq!(CubeShape::GEO.byte_len(), GEO_CUBE_BYTES);
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let buf = vec![0u8; GEO_CUBE_BYTES - 1];
        match GeoCube::decode(&buf) {
            Err(CubeError::Format { expected, got }) => {
                assert_eq!(expected, GEO_CUBE_BYTES);
                assert_eq!(got, GEO_CUBE_BYTES - 1);
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_long_buffer() {
        let shape = CubeShape::new(2, 3, 4);
        let mut buf = indexed_buffer(shape);
        buf.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            GeoCube::decode_with_shape(&buf, shape),
            Err(CubeError::Format { .. })
        ));
    }

    #[test]
    fn test_decode_little_endian_order() {
        let shape = CubeShape::new(1, 1, 2);
        let mut buf = Vec::new();
        buf.extend_from_slice(&1.5f32.to_le_bytes());
        buf.extend_from_slice(&(-42.25f32).to_le_bytes());
        let cube = GeoCube::decode_with_shape(&buf, shape).unwrap();
        assert_eq!(cube.values(), &[1.5, -42.25]);
    }

    #[test]
    fn test_lookup_uses_band_major_layout() {
        let shape = CubeShape::new(3, 4, 5);
        let cube = GeoCube::decode_with_shape(&indexed_buffer(shape), shape).unwrap();
        // band 2, line 3, sample 1 -> 2*20 + 3*5 + 1
        assert_eq!(cube.lookup(1, 3, 2).unwrap(), 56.0);
    }

    #[test]
    fn test_lookup_clamps_each_axis() {
        let shape = CubeShape::new(3, 4, 5);
        let cube = GeoCube::decode_with_shape(&indexed_buffer(shape), shape).unwrap();
        assert_eq!(cube.lookup(-7, 0, 0).unwrap(), 0.0);
        assert_eq!(cube.lookup(99, 0, 0).unwrap(), 4.0);
        assert_eq!(cube.lookup(0, 99, 0).unwrap(), 15.0);
        assert_eq!(cube.lookup(0, 0, 99).unwrap(), 40.0);
        assert_eq!(cube.clamp_position(-1, 10, -3), (0, 3, 0));
    }

    #[test]
    fn test_lookup_on_empty_cube_is_index_error() {
        let shape = CubeShape::new(0, 0, 0);
        let cube = GeoCube::decode_with_shape(&[], shape).unwrap();
        assert!(matches!(cube.lookup(0, 0, 0), Err(CubeError::Index { .. })));
    }

    #[test]
    fn test_flat_index_round_trips_on_geo_shape() {
        let shape = CubeShape::GEO;
        for &band in &[0usize, 4, 8] {
            for &y in &[0usize, 1, 340, 680] {
                for &x in &[0usize, 2, 679, 680] {
                    let index = shape.flat_index(x, y, band);
                    assert!(index < shape.value_count());
                    assert_eq!(shape.unravel(index), (band, y, x));
                }
            }
        }
    }

    #[test]
    fn test_full_size_decode_and_lookup() {
        let mut buf = vec![0u8; GEO_CUBE_BYTES];
        let index = CubeShape::GEO.flat_index(680, 12, Band::Emission.index());
        LittleEndian::write_f32(&mut buf[index * 4..index * 4 + 4], 33.5);
        let cube = GeoCube::decode(&buf).unwrap();
        assert_eq!(cube.value_at(680, 12, Band::Emission), Some(33.5));
        assert_eq!(cube.unravel(index), (6, 12, 680));
        assert_eq!(cube.band_plane(Band::Distance).map(|p| p.len()), Some(681 * 681));
    }

    #[test]
    fn test_read_from_stream() {
        let buf = vec![0u8; GEO_CUBE_BYTES];
        let mut cursor = io::Cursor::new(buf);
        let cube = GeoCube::read_from(&mut cursor).unwrap();
        assert_eq!(cube.shape(), CubeShape::GEO);
    }
}
