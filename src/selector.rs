//! Column selectors and their resolution against a schema snapshot.
//!
//! A step stores the [`Selector`]s it was declared with and resolves them
//! exactly once, at prep time, against the schema produced by the steps
//! before it. Resolution is a pure function of `(selectors, schema)`.
//!
//! # Rules
//! - Positive selectors add columns in first-seen order, without duplicates.
//! - [`Selector::Minus`] removes columns from the running selection.
//! - A leading negative selector starts from every column.
//!
//! # Example
//! ```
//! use feature_recipes::selector::{self, Selector};
//!
//! let sel = vec![selector::all_numeric_predictors(), selector::col("id").exclude()];
//! assert_eq!(sel[1].to_string(), "-id");
//! ```

use crate::data::ColumnType;
use crate::error::RecipeError;
use crate::schema::{Role, Schema};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A symbolic predicate over column names, roles and types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// A single column by exact name.
    Name(String),
    Everything,
    AllPredictors,
    AllOutcomes,
    HasRole(Role),
    AllNumeric,
    AllNominal,
    HasType(ColumnType),
    AllNumericPredictors,
    AllNominalPredictors,
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    /// Column names matching a regular expression.
    Matches(String),
    /// Remove the inner selection.
    Minus(Box<Selector>),
}

/// Select a column by name.
pub fn col(name: impl Into<String>) -> Selector {
    Selector::Name(name.into())
}

pub fn everything() -> Selector {
    Selector::Everything
}

pub fn all_predictors() -> Selector {
    Selector::AllPredictors
}

pub fn all_outcomes() -> Selector {
    Selector::AllOutcomes
}

pub fn all_numeric() -> Selector {
    Selector::AllNumeric
}

pub fn all_nominal() -> Selector {
    Selector::AllNominal
}

pub fn all_numeric_predictors() -> Selector {
    Selector::AllNumericPredictors
}

pub fn all_nominal_predictors() -> Selector {
    Selector::AllNominalPredictors
}

pub fn has_role(role: impl Into<Role>) -> Selector {
    Selector::HasRole(role.into())
}

pub fn matches(pattern: impl Into<String>) -> Selector {
    Selector::Matches(pattern.into())
}

impl Selector {
    /// Negate this selector.
    pub fn exclude(self) -> Selector {
        Selector::Minus(Box::new(self))
    }

    /// Columns this selector picks on its own, in schema order.
    fn candidates(&self, schema: &Schema) -> Result<Vec<String>, RecipeError> {
        let by = |pred: &dyn Fn(&crate::schema::VarInfo) -> bool| -> Vec<String> {
            schema
                .iter()
                .filter(|v| pred(v))
                .map(|v| v.name.clone())
                .collect()
        };

        let names = match self {
            Selector::Name(name) => {
                if schema.get(name).is_none() {
                    return Err(RecipeError::selector(self, "column not found"));
                }
                vec![name.clone()]
            }
            Selector::Everything => schema.names(),
            Selector::AllPredictors => schema.names_with_role(&Role::Predictor),
            Selector::AllOutcomes => schema.names_with_role(&Role::Outcome),
            Selector::HasRole(role) => {
                if let Role::Other(_) = role {
                    if !schema.has_role(role) {
                        return Err(RecipeError::selector(self, "no column has this role"));
                    }
                }
                schema.names_with_role(role)
            }
            Selector::AllNumeric => by(&|v| v.column_type == ColumnType::Numeric),
            Selector::AllNominal => by(&|v| v.column_type == ColumnType::Nominal),
            Selector::HasType(ty) => by(&|v| v.column_type == *ty),
            Selector::AllNumericPredictors => {
                by(&|v| v.column_type == ColumnType::Numeric && v.role == Role::Predictor)
            }
            Selector::AllNominalPredictors => {
                by(&|v| v.column_type == ColumnType::Nominal && v.role == Role::Predictor)
            }
            Selector::StartsWith(prefix) => by(&|v| v.name.starts_with(prefix.as_str())),
            Selector::EndsWith(suffix) => by(&|v| v.name.ends_with(suffix.as_str())),
            Selector::Contains(part) => by(&|v| v.name.contains(part.as_str())),
            Selector::Matches(pattern) => {
                let re = Regex::new(pattern)
                    .map_err(|e| RecipeError::selector(self, e.to_string()))?;
                by(&|v| re.is_match(&v.name))
            }
            Selector::Minus(inner) => {
                let dropped = inner.candidates(schema)?;
                by(&|v| !dropped.contains(&v.name))
            }
        };
        Ok(names)
    }
}

/// Resolve `selectors` to concrete column names.
///
/// # Errors
/// [`RecipeError::Selector`] for unknown column names, unknown custom roles
/// or invalid regular expressions. Matching zero columns is not an error
/// here; each step decides whether it tolerates an empty selection.
pub fn resolve(selectors: &[Selector], schema: &Schema) -> Result<Vec<String>, RecipeError> {
    let mut selected: Vec<String> = Vec::new();
    for (i, sel) in selectors.iter().enumerate() {
        match sel {
            Selector::Minus(inner) => {
                if i == 0 {
                    selected = schema.names();
                }
                let dropped = inner.candidates(schema)?;
                selected.retain(|n| !dropped.contains(n));
            }
            positive => {
                for name in positive.candidates(schema)? {
                    if !selected.contains(&name) {
                        selected.push(name);
                    }
                }
            }
        }
    }
    Ok(selected)
}

/// Render a selector list the way it was declared, e.g. `carbon, -id`.
pub fn describe(selectors: &[Selector]) -> String {
    selectors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name(name) => write!(f, "{}", name),
            Selector::Everything => write!(f, "everything()"),
            Selector::AllPredictors => write!(f, "all_predictors()"),
            Selector::AllOutcomes => write!(f, "all_outcomes()"),
            Selector::HasRole(role) => write!(f, "has_role({})", role),
            Selector::AllNumeric => write!(f, "all_numeric()"),
            Selector::AllNominal => write!(f, "all_nominal()"),
            Selector::HasType(ty) => write!(f, "has_type({})", ty),
            Selector::AllNumericPredictors => write!(f, "all_numeric_predictors()"),
            Selector::AllNominalPredictors => write!(f, "all_nominal_predictors()"),
            Selector::StartsWith(s) => write!(f, "starts_with({})", s),
            Selector::EndsWith(s) => write!(f, "ends_with({})", s),
            Selector::Contains(s) => write!(f, "contains({})", s),
            Selector::Matches(p) => write!(f, "matches({})", p),
            Selector::Minus(inner) => write!(f, "-{}", inner),
        }
    }
}

fn parse_type(s: &str) -> Option<ColumnType> {
    match s {
        "numeric" => Some(ColumnType::Numeric),
        "nominal" => Some(ColumnType::Nominal),
        "logical" => Some(ColumnType::Logical),
        "date" => Some(ColumnType::Date),
        _ => None,
    }
}

impl FromStr for Selector {
    type Err = RecipeError;

    /// Parse the textual form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RecipeError::selector(s, "empty selector"));
        }
        if let Some(rest) = s.strip_prefix('-') {
            return Ok(Selector::Minus(Box::new(rest.parse()?)));
        }

        let Some((func, tail)) = s.split_once('(') else {
            return Ok(Selector::Name(s.to_string()));
        };
        let Some(arg) = tail.strip_suffix(')') else {
            return Err(RecipeError::selector(s, "unbalanced parentheses"));
        };
        let arg = arg.trim().trim_matches('"');

        let selector = match (func.trim(), arg.is_empty()) {
            ("everything", true) => Selector::Everything,
            ("all_predictors", true) => Selector::AllPredictors,
            ("all_outcomes", true) => Selector::AllOutcomes,
            ("all_numeric", true) => Selector::AllNumeric,
            ("all_nominal", true) => Selector::AllNominal,
            ("all_numeric_predictors", true) => Selector::AllNumericPredictors,
            ("all_nominal_predictors", true) => Selector::AllNominalPredictors,
            ("has_role", false) => Selector::HasRole(Role::from(arg)),
            ("has_type", false) => Selector::HasType(
                parse_type(arg).ok_or_else(|| RecipeError::selector(s, "unknown type"))?,
            ),
            ("starts_with", false) => Selector::StartsWith(arg.to_string()),
            ("ends_with", false) => Selector::EndsWith(arg.to_string()),
            ("contains", false) => Selector::Contains(arg.to_string()),
            ("matches", false) => Selector::Matches(arg.to_string()),
            _ => return Err(RecipeError::selector(s, "unknown selector function")),
        };
        Ok(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, DataFrame};

    fn create_test_schema() -> Schema {
        let df = DataFrame::from_columns([
            ("y", Column::Numeric(vec![1.0])),
            ("carbon", Column::Numeric(vec![1.0])),
            ("hydrogen", Column::Numeric(vec![1.0])),
            ("city", Column::nominal(["a"])),
            ("row_id", Column::Numeric(vec![1.0])),
        ])
        .unwrap();
        let mut schema = Schema::from_frame(&df);
        schema.set_role("y", Role::Outcome);
        schema.set_role("row_id", Role::Other("id".to_string()));
        schema
    }

    #[test]
    fn test_resolve_numeric_predictors() {
        let schema = create_test_schema();
        let cols = resolve(&[all_numeric_predictors()], &schema).unwrap();
        assert_eq!(cols, vec!["carbon", "hydrogen"]);
    }

    #[test]
    fn test_resolve_keeps_declared_order_and_dedups() {
        let schema = create_test_schema();
        let cols = resolve(&[col("hydrogen"), col("carbon"), all_numeric()], &schema).unwrap();
        assert_eq!(cols, vec!["hydrogen", "carbon", "y", "row_id"]);
    }

    #[test]
    fn test_resolve_exclusion() {
        let schema = create_test_schema();
        let cols = resolve(&[all_numeric(), all_outcomes().exclude()], &schema).unwrap();
        assert_eq!(cols, vec!["carbon", "hydrogen", "row_id"]);

        let leading = resolve(&[col("city").exclude()], &schema).unwrap();
        assert_eq!(leading, vec!["y", "carbon", "hydrogen", "row_id"]);
    }

    #[test]
    fn test_resolve_unknown_name_fails() {
        let schema = create_test_schema();
        let result = resolve(&[col("oxygen")], &schema);
        assert!(matches!(result, Err(RecipeError::Selector { .. })));
    }

    #[test]
    fn test_resolve_unknown_custom_role_fails() {
        let schema = create_test_schema();
        assert!(resolve(&[has_role("case_weight")], &schema).is_err());
        assert_eq!(resolve(&[has_role("id")], &schema).unwrap(), vec!["row_id"]);
    }

    #[test]
    fn test_resolve_regex() {
        let schema = create_test_schema();
        assert_eq!(
            resolve(&[matches("^(carbon|hydro)")], &schema).unwrap(),
            vec!["carbon", "hydrogen"]
        );
        assert!(resolve(&[matches("(")], &schema).is_err());
    }

    #[test]
    fn test_empty_match_is_not_an_error() {
        let schema = create_test_schema();
        let cols = resolve(&[Selector::StartsWith("zzz".to_string())], &schema).unwrap();
        assert!(cols.is_empty());
    }

    #[test]
    fn test_parse_display_roundtrip() {
        for text in [
            "carbon",
            "-carbon",
            "all_numeric_predictors()",
            "has_role(id)",
            "has_type(nominal)",
            "matches(^x_)",
        ] {
            let sel: Selector = text.parse().unwrap();
            assert_eq!(sel.to_string(), text);
        }
        assert!("bogus(1)".parse::<Selector>().is_err());
        assert!("all_numeric(".parse::<Selector>().is_err());
    }
}
