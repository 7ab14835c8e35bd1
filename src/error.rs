//! Error types for recipe construction, training and application.

use crate::data::ColumnType;
use thiserror::Error;

/// Error type for every recipe operation.
///
/// Step-level failures raised while a recipe is prepped or baked are wrapped
/// in [`RecipeError::StepFailed`], which carries the position and id of the
/// offending step. Use [`RecipeError::root_cause`] to get at the underlying
/// error.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// Invalid construction-time argument.
    #[error("Invalid argument `{param}`: {reason}")]
    Config { param: String, reason: String },

    /// A selector could not be resolved against the schema.
    #[error("Cannot resolve selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    /// A resolved column does not have the type a step requires.
    #[error("Column `{column}` has type {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: ColumnType,
    },

    /// No columns were selected by a step that does not tolerate it.
    #[error("Step `{step}` selected no columns")]
    EmptySelection { step: String },

    /// A step or recipe was used before it was prepped.
    #[error("Step `{step}` has not been trained; prep the recipe first")]
    NotTrained { step: String },

    /// A trained step or recipe was prepped again without a reset.
    #[error("Step `{step}` is already trained; reset the recipe or prep with `fresh`")]
    AlreadyTrained { step: String },

    /// A tunable placeholder was still present at prep time.
    #[error("Step `{step}` has an unresolved tunable parameter `{param}`")]
    UnresolvedTunable { step: String, param: String },

    /// A step would create columns that already exist.
    #[error("Column(s) already exist: {}", .columns.join(", "))]
    ColumnExists { columns: Vec<String> },

    /// Columns a step needs are absent from the data.
    #[error("Missing column(s): {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// `juice` was called on a recipe prepped with `retain = false`.
    #[error("The processed training set was not retained; prep with `retain = true`")]
    NotRetained,

    /// Malformed tabular data (ragged columns, unparsable input).
    #[error("Data error: {0}")]
    Data(String),

    /// A step failed while the recipe was prepped or baked.
    #[error("Step {index} (`{id}`) failed: {source}")]
    StepFailed {
        index: usize,
        id: String,
        #[source]
        source: Box<RecipeError>,
    },

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecipeError {
    pub(crate) fn config(param: impl Into<String>, reason: impl Into<String>) -> Self {
        RecipeError::Config {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn selector(selector: impl ToString, reason: impl Into<String>) -> Self {
        RecipeError::Selector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    /// Attach the failing step's position and id.
    pub(crate) fn in_step(self, index: usize, id: &str) -> Self {
        RecipeError::StepFailed {
            index,
            id: id.to_string(),
            source: Box::new(self),
        }
    }

    /// Strip any `StepFailed` wrappers and return the underlying error.
    pub fn root_cause(&self) -> &RecipeError {
        match self {
            RecipeError::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Index of the failing step, if the error was raised inside one.
    pub fn step_index(&self) -> Option<usize> {
        match self {
            RecipeError::StepFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl From<bincode::Error> for RecipeError {
    fn from(err: bincode::Error) -> Self {
        RecipeError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for RecipeError {
    fn from(err: serde_json::Error) -> Self {
        RecipeError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for RecipeError {
    fn from(err: toml::de::Error) -> Self {
        RecipeError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for RecipeError {
    fn from(err: csv::Error) -> Self {
        RecipeError::Data(err.to_string())
    }
}
