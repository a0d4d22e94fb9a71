//! Geo-cube decoding: fixed-layout band/line/sample rasters of
//! little-endian `f32` values and per-pixel geometry lookup.
//!
//! A geo-cube is aligned pixel-for-pixel with a companion image; each band
//! carries one geometric quantity (latitude, viewing angles, ...).

pub mod band;
pub mod cube;
pub mod geometry;
pub mod stats;

pub use band::*;
pub use cube::*;
pub use geometry::*;
pub use stats::*;
