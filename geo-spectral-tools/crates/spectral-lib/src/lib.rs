//! Angle-indexed spectral library: document model, nearest-angle matching,
//! row resolution, case selection and point-budget sampling.
//!
//! Row `r` of every case table belongs to the angle triple
//! `(inc[i], emi[j], daz[k])` with `r = i·|emi|·|daz| + j·|daz| + k`.

pub mod curve;
pub mod error;
pub mod library;
pub mod matcher;
pub mod resolver;
pub mod sampler;

pub use curve::*;
pub use error::*;
pub use library::*;
pub use matcher::*;
pub use resolver::*;
pub use sampler::*;
