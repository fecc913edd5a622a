//! Shared building blocks for the data-quality crates.
//!
//! - [`Scalar`]: the engine-level cell value extracted from Polars frames
//! - Polars helpers: dtype classification and row/column extraction
//! - Parsing helpers for numbers and ISO-like dates

mod datetime;
mod frame;
mod scalar;

pub use datetime::{format_datetime, parse_date, parse_datetime};
pub use frame::{
    ValueKind, column_names, column_scalars, format_numeric, parse_f64, row_tuples, value_kind,
};
pub use scalar::Scalar;
