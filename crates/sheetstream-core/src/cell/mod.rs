//! Cell-related types and utilities
//!
//! - [`CellValue`] - The value written to a cell
//! - [`CellError`] - Error values such as `#N/A`
//! - [`cell_reference`] / [`column_letters`] - A1 rendering
//! - [`Dimension`] - Used range of a sheet

mod address;
mod value;

pub use address::{cell_reference, column_index, column_letters, Dimension};
pub use value::{CellError, CellValue};
