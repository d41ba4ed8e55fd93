//! Typed errors for the reconciliation, profiling, and rendering stages.
//!
//! Application boundaries wrap these in `anyhow::Error` with context; the
//! profiler and renderer match on them to decide which failures are local.

use thiserror::Error;

/// A catalog declared present could not be used.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{catalog} is missing required column '{column}' (found: {found:?})")]
    MissingColumn {
        catalog: &'static str,
        column: &'static str,
        found: Vec<String>,
    },
}

/// Raised while computing column statistics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("column '{column}': {detail}")]
    TypeMismatch { column: String, detail: String },
}

/// Raised by the layout pass over an in-memory sheet.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("cell ({row}, {col}) is outside sheet '{sheet}'")]
    OutOfBounds {
        sheet: String,
        row: usize,
        col: usize,
    },
    #[error("merge {range} overlaps existing merge {existing} on sheet '{sheet}'")]
    OverlappingMerge {
        sheet: String,
        range: String,
        existing: String,
    },
}
