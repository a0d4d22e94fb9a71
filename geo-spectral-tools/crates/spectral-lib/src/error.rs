use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectralError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid library document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Cannot match {axis} angle {target} against an empty axis")]
    EmptyInput { axis: &'static str, target: f64 },
    #[error("Cannot match non-finite {axis} angle {target}")]
    NonFiniteAngle { axis: &'static str, target: f64 },
    #[error("Row {row} out of range for table with {rows} rows")]
    Range { row: usize, rows: usize },
    #[error("Inconsistent library: {0}")]
    Inconsistent(String),
    #[error("Unknown case variant: {0} (expected standard, no_ch4 or no_haze)")]
    UnknownCase(String),
}
