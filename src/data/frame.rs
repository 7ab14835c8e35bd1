//! Column-oriented table with ordered, uniquely named columns.

use crate::data::{Column, ColumnType};
use crate::error::RecipeError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An in-memory table of equally sized, named columns.
///
/// Column order is preserved: new columns are appended at the end and
/// replaced columns keep their position.
///
/// # Example
/// ```
/// use feature_recipes::data::{Column, DataFrame};
///
/// let df = DataFrame::new()
///     .with_column("carbon", Column::Numeric(vec![10.0, 50.0, 90.0]))
///     .unwrap();
/// assert_eq!(df.n_rows(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    columns: IndexMap<String, Column>,
    n_rows: usize,
}

impl DataFrame {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, column)` pairs.
    ///
    /// # Errors
    /// Fails if two columns share a name or the columns differ in length.
    pub fn from_columns<S, I>(columns: I) -> Result<Self, RecipeError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Column)>,
    {
        let mut df = Self::new();
        for (name, column) in columns {
            df.insert_column(name, column)?;
        }
        Ok(df)
    }

    /// Builder-style [`DataFrame::insert_column`].
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column: impl Into<Column>,
    ) -> Result<Self, RecipeError> {
        self.insert_column(name, column.into())?;
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> + '_ {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Type of the named column, if present.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(name).map(Column::column_type)
    }

    /// Look up a numeric column.
    ///
    /// # Errors
    /// [`RecipeError::MissingColumns`] if absent, [`RecipeError::TypeMismatch`]
    /// if the column is not numeric.
    pub fn numeric(&self, name: &str) -> Result<&[f64], RecipeError> {
        let column = self
            .columns
            .get(name)
            .ok_or_else(|| RecipeError::MissingColumns {
                columns: vec![name.to_string()],
            })?;
        column.as_numeric().ok_or_else(|| RecipeError::TypeMismatch {
            column: name.to_string(),
            expected: ColumnType::Numeric.to_string(),
            found: column.column_type(),
        })
    }

    /// Names from `names` that are not present in the table.
    pub fn missing_columns<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        names
            .into_iter()
            .filter(|n| !self.columns.contains_key(n.as_str()))
            .cloned()
            .collect()
    }

    /// Append a new column at the end.
    ///
    /// # Errors
    /// [`RecipeError::ColumnExists`] on a name collision, [`RecipeError::Data`]
    /// if the length differs from the table's row count.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<(), RecipeError> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(RecipeError::ColumnExists {
                columns: vec![name],
            });
        }
        self.check_len(&name, &column)?;
        if self.columns.is_empty() {
            self.n_rows = column.len();
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Replace an existing column in place.
    pub fn replace_column(&mut self, name: &str, column: Column) -> Result<(), RecipeError> {
        self.check_len(name, &column)?;
        match self.columns.get_mut(name) {
            Some(slot) => {
                *slot = column;
                Ok(())
            }
            None => Err(RecipeError::MissingColumns {
                columns: vec![name.to_string()],
            }),
        }
    }

    /// Remove a column, keeping the order of the remaining ones.
    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        self.columns.shift_remove(name)
    }

    /// A new table holding only `names`, in the given order.
    pub fn select(&self, names: &[String]) -> Result<DataFrame, RecipeError> {
        let missing = self.missing_columns(names);
        if !missing.is_empty() {
            return Err(RecipeError::MissingColumns { columns: missing });
        }
        let columns = names
            .iter()
            .filter_map(|n| self.columns.get(n).map(|c| (n.clone(), c.clone())))
            .collect();
        Ok(DataFrame {
            columns,
            n_rows: self.n_rows,
        })
    }

    /// A new table holding the rows where `mask` is true, in order.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<DataFrame, RecipeError> {
        if mask.len() != self.n_rows {
            return Err(RecipeError::Data(format!(
                "row mask has length {}, table has {} rows",
                mask.len(),
                self.n_rows
            )));
        }
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), col.filter(mask)))
            .collect();
        Ok(DataFrame {
            columns,
            n_rows: mask.iter().filter(|&&keep| keep).count(),
        })
    }

    /// Same names, order and bitwise-identical values.
    pub fn bit_eq(&self, other: &DataFrame) -> bool {
        self.n_rows == other.n_rows
            && self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|((n1, c1), (n2, c2))| n1 == n2 && c1.bit_eq(c2))
    }

    /// Export numeric columns as an `(n_rows, columns.len())` matrix.
    #[cfg(feature = "ndarray")]
    pub fn to_array2(&self, columns: &[String]) -> Result<ndarray::Array2<f64>, RecipeError> {
        let mut out = ndarray::Array2::<f64>::zeros((self.n_rows, columns.len()));
        for (j, name) in columns.iter().enumerate() {
            let values = self.numeric(name)?;
            for (i, &v) in values.iter().enumerate() {
                out[[i, j]] = v;
            }
        }
        Ok(out)
    }

    fn check_len(&self, name: &str, column: &Column) -> Result<(), RecipeError> {
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(RecipeError::Data(format!(
                "column `{}` has {} rows, expected {}",
                name,
                column.len(),
                self.n_rows
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_frame() -> DataFrame {
        DataFrame::from_columns([
            ("a", Column::Numeric(vec![1.0, 2.0, 3.0])),
            ("b", Column::nominal(["x", "y", "z"])),
        ])
        .unwrap()
    }

    #[test]
    fn test_insert_collision_is_rejected() {
        let mut df = create_test_frame();
        let result = df.insert_column("a", Column::Numeric(vec![0.0; 3]));
        assert!(matches!(result, Err(RecipeError::ColumnExists { .. })));
    }

    #[test]
    fn test_insert_length_mismatch() {
        let mut df = create_test_frame();
        let result = df.insert_column("c", Column::Numeric(vec![0.0; 2]));
        assert!(matches!(result, Err(RecipeError::Data(_))));
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut df = create_test_frame();
        df.replace_column("a", Column::Numeric(vec![9.0, 9.0, 9.0]))
            .unwrap();
        let names: Vec<&str> = df.column_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(df.numeric("a").unwrap(), &[9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut df = create_test_frame()
            .with_column("c", Column::Numeric(vec![0.0; 3]))
            .unwrap();
        df.remove_column("a");
        let names: Vec<&str> = df.column_names().collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_numeric_lookup_errors() {
        let df = create_test_frame();
        assert!(matches!(
            df.numeric("b"),
            Err(RecipeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            df.numeric("nope"),
            Err(RecipeError::MissingColumns { .. })
        ));
    }

    #[test]
    fn test_filter_rows() {
        let df = create_test_frame();
        let filtered = df.filter_rows(&[true, false, true]).unwrap();
        assert_eq!(filtered.n_rows(), 2);
        assert_eq!(filtered.numeric("a").unwrap(), &[1.0, 3.0]);
    }

    #[test]
    fn test_select_missing_column() {
        let df = create_test_frame();
        let result = df.select(&["a".to_string(), "zzz".to_string()]);
        assert!(matches!(result, Err(RecipeError::MissingColumns { columns }) if columns == vec!["zzz"]));
    }
}
