//! Tabular data consumed and produced by recipe steps.
//!
//! - [`Column`]: typed vector of values (numeric, nominal, logical, date)
//! - [`DataFrame`]: ordered collection of equally sized named columns
//!
//! CSV loading lives on [`DataFrame::from_csv_reader`] and
//! [`DataFrame::from_csv_path`].

mod column;
mod frame;
mod read;

pub use column::{Column, ColumnType};
pub use frame::DataFrame;
