//! CSV loading with per-column type inference.

use crate::data::{Column, DataFrame};
use crate::error::RecipeError;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn is_missing(field: &str) -> bool {
    matches!(field.trim(), "" | "NA" | "na" | "N/A")
}

fn parse_bool(field: &str) -> Option<bool> {
    match field.trim() {
        "true" | "TRUE" | "True" => Some(true),
        "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Infer a column from raw string fields.
///
/// The first type that parses every non-missing field wins, in the order
/// numeric, logical, date, nominal. A column with no values at all is logical.
fn infer_column(fields: &[String]) -> Column {
    let present: Vec<&str> = fields
        .iter()
        .map(String::as_str)
        .filter(|f| !is_missing(f))
        .collect();

    if present.is_empty() {
        return Column::Logical(vec![None; fields.len()]);
    }
    if present.iter().all(|f| f.trim().parse::<f64>().is_ok()) {
        return Column::Numeric(
            fields
                .iter()
                .map(|f| f.trim().parse::<f64>().unwrap_or(f64::NAN))
                .collect(),
        );
    }
    if present.iter().all(|f| parse_bool(f).is_some()) {
        return Column::Logical(fields.iter().map(|f| parse_bool(f)).collect());
    }
    if present
        .iter()
        .all(|f| NaiveDate::parse_from_str(f.trim(), DATE_FORMAT).is_ok())
    {
        return Column::Date(
            fields
                .iter()
                .map(|f| NaiveDate::parse_from_str(f.trim(), DATE_FORMAT).ok())
                .collect(),
        );
    }
    Column::Nominal(
        fields
            .iter()
            .map(|f| (!is_missing(f)).then(|| f.clone()))
            .collect(),
    )
}

impl DataFrame {
    /// Read a headed CSV stream, inferring each column's type.
    ///
    /// Empty fields and `NA` are treated as missing.
    ///
    /// # Errors
    /// [`RecipeError::Data`] for malformed CSV (e.g. ragged rows) and
    /// [`RecipeError::ColumnExists`] for duplicated headers.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, RecipeError> {
        let mut rdr = ReaderBuilder::new().from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for result in rdr.records() {
            let record = result?;
            for (slot, field) in raw.iter_mut().zip(record.iter()) {
                slot.push(field.to_string());
            }
        }

        let mut df = DataFrame::new();
        for (name, fields) in headers.into_iter().zip(raw) {
            df.insert_column(name, infer_column(&fields))?;
        }
        tracing::debug!(rows = df.n_rows(), cols = df.n_cols(), "Loaded CSV");
        Ok(df)
    }

    /// Read a headed CSV file. See [`DataFrame::from_csv_reader`].
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, RecipeError> {
        let file = File::open(path)?;
        Self::from_csv_reader(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnType;

    #[test]
    fn test_csv_type_inference() {
        let csv = "x,city,flag,day\n1.5,paris,true,2024-01-02\n,rome,FALSE,2024-03-04\n3,NA,,\n";
        let df = DataFrame::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(df.n_rows(), 3);
        assert_eq!(df.column_type("x"), Some(ColumnType::Numeric));
        assert_eq!(df.column_type("city"), Some(ColumnType::Nominal));
        assert_eq!(df.column_type("flag"), Some(ColumnType::Logical));
        assert_eq!(df.column_type("day"), Some(ColumnType::Date));

        let x = df.numeric("x").unwrap();
        assert_eq!(x[0], 1.5);
        assert!(x[1].is_nan());
        assert!(df.column("city").unwrap().is_missing(2));
    }

    #[test]
    fn test_csv_ragged_rows_fail() {
        let csv = "a,b\n1,2\n3\n";
        let result = DataFrame::from_csv_reader(csv.as_bytes());
        assert!(matches!(result, Err(RecipeError::Data(_))));
    }
}
