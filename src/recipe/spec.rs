//! Declarative recipe files.
//!
//! A recipe can be described in TOML (or the equivalent JSON) and built
//! against a template frame:
//!
//! ```toml
//! outcomes = ["y"]
//!
//! [roles]
//! row_id = "id"
//!
//! [[step]]
//! kind = "relu"
//! columns = ["carbon"]
//! shift = { tune = "cut" }
//!
//! [[step]]
//! kind = "normalize"
//! columns = ["all_numeric_predictors()", "-carbon"]
//! ```
//!
//! Every key of a `[[step]]` table other than `kind` and `columns` is
//! passed to [`Step::from_args`]; `{ tune = "label" }` makes a placeholder.

use crate::data::DataFrame;
use crate::error::RecipeError;
use crate::recipe::Recipe;
use crate::schema::Role;
use crate::selector::{self, Selector};
use crate::steps::Step;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// One `[[step]]` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    pub kind: String,
    /// Selector strings, e.g. `"all_numeric()"` or `"-id"`.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(flatten)]
    pub args: Map<String, Value>,
}

/// A recipe file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeSpec {
    #[serde(default)]
    pub outcomes: Vec<String>,
    /// Column name to role.
    #[serde(default)]
    pub roles: BTreeMap<String, String>,
    #[serde(default, rename = "step", alias = "steps")]
    pub steps: Vec<StepSpec>,
}

impl RecipeSpec {
    pub fn from_toml_str(s: &str) -> Result<Self, RecipeError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, RecipeError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load a `.json` file as JSON and anything else as TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RecipeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Build an untrained recipe over `template`.
    ///
    /// # Errors
    /// Selector parse errors and step configuration errors, the latter
    /// wrapped in [`RecipeError::StepFailed`] with the step's position.
    pub fn build(&self, template: &DataFrame) -> Result<Recipe, RecipeError> {
        let mut recipe = Recipe::new(template).with_outcomes(self.outcomes.as_slice())?;
        for (name, role) in &self.roles {
            recipe = recipe.update_role(&[selector::col(name.as_str())], Role::from(role.as_str()))?;
        }
        for (index, spec) in self.steps.iter().enumerate() {
            let selectors = spec
                .columns
                .iter()
                .map(|c| c.parse::<Selector>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.in_step(index, &spec.kind))?;
            let step = Step::from_args(&spec.kind, selectors, spec.args.clone())
                .map_err(|e| e.in_step(index, &spec.kind))?;
            let id = step.id().to_string();
            recipe = recipe
                .add_step(step)
                .map_err(|e| e.in_step(index, &id))?;
        }
        Ok(recipe)
    }
}
