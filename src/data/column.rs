//! Typed column storage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic data type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Floating point values; `NaN` marks a missing value.
    Numeric,
    /// Categorical text values.
    Nominal,
    /// Boolean values.
    Logical,
    /// Calendar dates.
    Date,
}

impl ColumnType {
    /// Lowercase name used in messages and selector strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Nominal => "nominal",
            ColumnType::Logical => "logical",
            ColumnType::Date => "date",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named column's values.
///
/// Numeric columns use `NaN` for missing values; every other kind uses `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Numeric(Vec<f64>),
    Nominal(Vec<Option<String>>),
    Logical(Vec<Option<bool>>),
    Date(Vec<Option<NaiveDate>>),
}

impl Column {
    /// Build a nominal column from non-missing strings.
    pub fn nominal<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Column::Nominal(values.into_iter().map(|v| Some(v.into())).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Nominal(v) => v.len(),
            Column::Logical(v) => v.len(),
            Column::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Numeric(_) => ColumnType::Numeric,
            Column::Nominal(_) => ColumnType::Nominal,
            Column::Logical(_) => ColumnType::Logical,
            Column::Date(_) => ColumnType::Date,
        }
    }

    /// Numeric values, or `None` for any other column type.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Nominal values, or `None` for any other column type.
    pub fn as_nominal(&self) -> Option<&[Option<String>]> {
        match self {
            Column::Nominal(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the value at `row` is missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(v) => v.get(row).is_some_and(|x| x.is_nan()),
            Column::Nominal(v) => v.get(row).is_some_and(Option::is_none),
            Column::Logical(v) => v.get(row).is_some_and(Option::is_none),
            Column::Date(v) => v.get(row).is_some_and(Option::is_none),
        }
    }

    pub fn n_missing(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Keep the rows where `mask` is true, preserving order.
    pub(crate) fn filter(&self, mask: &[bool]) -> Column {
        fn keep<T: Clone>(values: &[T], mask: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(mask)
                .filter(|(_, m)| **m)
                .map(|(v, _)| v.clone())
                .collect()
        }
        match self {
            Column::Numeric(v) => Column::Numeric(keep(v, mask)),
            Column::Nominal(v) => Column::Nominal(keep(v, mask)),
            Column::Logical(v) => Column::Logical(keep(v, mask)),
            Column::Date(v) => Column::Date(keep(v, mask)),
        }
    }

    /// Bitwise equality, treating two `NaN`s with the same payload as equal.
    pub fn bit_eq(&self, other: &Column) -> bool {
        match (self, other) {
            (Column::Numeric(a), Column::Numeric(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            _ => self == other,
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::Numeric(values)
    }
}

impl From<Vec<Option<String>>> for Column {
    fn from(values: Vec<Option<String>>) -> Self {
        Column::Nominal(values)
    }
}

impl From<Vec<Option<bool>>> for Column {
    fn from(values: Vec<Option<bool>>) -> Self {
        Column::Logical(values)
    }
}

impl From<Vec<Option<NaiveDate>>> for Column {
    fn from(values: Vec<Option<NaiveDate>>) -> Self {
        Column::Date(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_per_type() {
        let num = Column::Numeric(vec![1.0, f64::NAN, 3.0]);
        assert!(num.is_missing(1));
        assert!(!num.is_missing(0));
        assert_eq!(num.n_missing(), 1);

        let nom = Column::Nominal(vec![Some("a".to_string()), None]);
        assert!(nom.is_missing(1));
        assert_eq!(nom.column_type(), ColumnType::Nominal);
    }

    #[test]
    fn test_filter_keeps_order() {
        let col = Column::Numeric(vec![1.0, 2.0, 3.0, 4.0]);
        let filtered = col.filter(&[true, false, true, true]);
        assert_eq!(filtered, Column::Numeric(vec![1.0, 3.0, 4.0]));
    }

    #[test]
    fn test_bit_eq_handles_nan() {
        let a = Column::Numeric(vec![f64::NAN, 1.0]);
        let b = Column::Numeric(vec![f64::NAN, 1.0]);
        assert_ne!(a, b);
        assert!(a.bit_eq(&b));
    }

    #[test]
    fn test_nominal_constructor() {
        let col = Column::nominal(["x", "y"]);
        assert_eq!(col.len(), 2);
        assert_eq!(col.as_nominal().unwrap()[1].as_deref(), Some("y"));
        assert!(col.as_numeric().is_none());
    }
}
