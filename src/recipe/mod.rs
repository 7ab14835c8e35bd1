//! The recipe: an ordered list of steps over a declared set of columns.
//!
//! A [`Recipe`] is built from a template frame that fixes the columns and
//! their types, then extended step by step. Every operation returns a new
//! value; nothing is mutated in place. Training and application live in
//! [`engine`].
//!
//! # Example
//! ```
//! use feature_recipes::data::{Column, DataFrame};
//! use feature_recipes::selector::col;
//! use feature_recipes::steps::StepRelu;
//! use feature_recipes::Recipe;
//!
//! let train = DataFrame::new()
//!     .with_column("carbon", Column::Numeric(vec![10.0, 50.0, 90.0]))
//!     .unwrap();
//! let recipe = Recipe::new(&train)
//!     .add_step(StepRelu::new(vec![col("carbon")]).shift(40.0))
//!     .unwrap();
//! let trained = recipe.prep(&train).unwrap();
//! let baked = trained.bake(&train).unwrap();
//! assert_eq!(baked.numeric("right_relu_carbon").unwrap(), &[0.0, 10.0, 50.0]);
//! ```

pub mod engine;
pub mod spec;

use crate::data::DataFrame;
use crate::error::RecipeError;
use crate::schema::{Role, Schema};
use crate::selector::{self, Selector};
use crate::steps::{new_id, Step, StepReport};
use crate::tunable::{TunableParam, TuneValues};
use serde::{Deserialize, Serialize};

pub use engine::{BakeOptions, BakeTarget, PrepOptions};
pub use spec::{RecipeSpec, StepSpec};

/// An ordered pipeline of steps plus the role metadata of its columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    steps: Vec<Step>,
    /// Columns the recipe was declared on.
    var_info: Schema,
    /// Columns after the last step; set by prep.
    term_info: Option<Schema>,
    trained: bool,
    /// Processed training set, kept for `juice`.
    retained: Option<DataFrame>,
}

impl Recipe {
    /// Declare a recipe over the columns of `template`, all as predictors.
    ///
    /// Only names and types are read; the rows are not kept.
    pub fn new(template: &DataFrame) -> Self {
        Self {
            steps: Vec::new(),
            var_info: Schema::from_frame(template),
            term_info: None,
            trained: false,
            retained: None,
        }
    }

    /// Mark `names` as outcomes.
    pub fn with_outcomes<S: AsRef<str>>(self, names: &[S]) -> Result<Self, RecipeError> {
        let selectors: Vec<Selector> = names.iter().map(|n| selector::col(n.as_ref())).collect();
        self.update_role(&selectors, Role::Outcome)
    }

    /// Give every column matched by `selectors` a new role.
    ///
    /// # Errors
    /// [`RecipeError::AlreadyTrained`] on a trained recipe, or a selector
    /// error if the selection cannot be resolved.
    pub fn update_role(
        &self,
        selectors: &[Selector],
        role: impl Into<Role>,
    ) -> Result<Self, RecipeError> {
        self.ensure_untrained()?;
        let role = role.into();
        let mut var_info = self.var_info.clone();
        for name in selector::resolve(selectors, &self.var_info)? {
            var_info.set_role(&name, role.clone());
        }
        Ok(Self {
            var_info,
            ..self.clone()
        })
    }

    /// Append a step.
    ///
    /// # Errors
    /// [`RecipeError::AlreadyTrained`] if the recipe or the step is trained,
    /// [`RecipeError::Config`] if the step's configuration is invalid or its
    /// explicitly chosen id is already used. A clashing generated id is
    /// drawn again.
    pub fn add_step(&self, step: impl Into<Step>) -> Result<Self, RecipeError> {
        self.ensure_untrained()?;
        let mut step = step.into();
        if step.is_trained() {
            return Err(RecipeError::AlreadyTrained {
                step: step.id().to_string(),
            });
        }
        step.validate()?;
        while self.step_by_id(step.id()).is_some() {
            if !step.common().auto_id {
                return Err(RecipeError::config(
                    "id",
                    format!("a step with id `{}` already exists", step.id()),
                ));
            }
            let id = new_id(step.kind());
            step.common_mut().id = id;
        }
        let mut steps = self.steps.clone();
        steps.push(step);
        Ok(Self {
            steps,
            ..self.clone()
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_by_id(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id() == id)
    }

    /// Columns and roles the recipe was declared on.
    pub fn schema(&self) -> &Schema {
        &self.var_info
    }

    /// Columns and roles produced by the last step, once trained.
    pub fn term_schema(&self) -> Option<&Schema> {
        self.term_info.as_ref()
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// One summary row per step, in order.
    pub fn tidy(&self) -> Vec<StepReport> {
        self.steps.iter().map(Step::tidy).collect()
    }

    pub fn tidy_step(&self, id: &str) -> Option<StepReport> {
        self.step_by_id(id).map(Step::tidy)
    }

    /// Every placeholder in the recipe, in step order.
    ///
    /// Computed from the current steps on each call.
    pub fn tunables(&self) -> impl Iterator<Item = TunableParam> + '_ {
        self.steps.iter().flat_map(Step::tunables)
    }

    /// Substitute placeholder values into every step.
    ///
    /// Labels absent from `values` stay as placeholders.
    ///
    /// # Errors
    /// [`RecipeError::StepFailed`] around a [`RecipeError::Config`] if a
    /// value has the wrong type or falls outside the parameter's domain.
    pub fn finalize(&self, values: &TuneValues) -> Result<Self, RecipeError> {
        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, s)| s.finalize(values).map_err(|e| e.in_step(i, s.id())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            steps,
            ..self.clone()
        })
    }

    /// Same steps and configuration with all learned state discarded.
    pub fn reset(&self) -> Self {
        Self {
            steps: self.steps.iter().map(Step::untrained).collect(),
            var_info: self.var_info.clone(),
            term_info: None,
            trained: false,
            retained: None,
        }
    }

    fn ensure_untrained(&self) -> Result<(), RecipeError> {
        if self.trained {
            return Err(RecipeError::AlreadyTrained {
                step: "recipe".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::selector::{all_numeric_predictors, col};
    use crate::steps::{RecipeStep, StepCenter, StepRelu, StepScale};
    use crate::tunable::Param;
    use serde_json::json;

    fn create_test_frame() -> DataFrame {
        DataFrame::from_columns([
            ("y", Column::Numeric(vec![1.0, 2.0, 3.0])),
            ("carbon", Column::Numeric(vec![10.0, 50.0, 90.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_outcome_roles() {
        let recipe = Recipe::new(&create_test_frame())
            .with_outcomes(&["y"])
            .unwrap();
        assert_eq!(recipe.schema().names_with_role(&Role::Outcome), vec!["y"]);
        assert_eq!(
            recipe.schema().names_with_role(&Role::Predictor),
            vec!["carbon"]
        );

        let bad = Recipe::new(&create_test_frame()).with_outcomes(&["zzz"]);
        assert!(matches!(bad, Err(RecipeError::Selector { .. })));
    }

    #[test]
    fn test_add_step_checks_ids_and_config() {
        let recipe = Recipe::new(&create_test_frame())
            .add_step(StepCenter::new(vec![col("carbon")]).id("c"))
            .unwrap();
        let dup = recipe.add_step(StepScale::new(vec![col("carbon")]).id("c"));
        assert!(matches!(dup, Err(RecipeError::Config { .. })));

        let bad = recipe.add_step(StepScale::new(vec![col("carbon")]).factor(7.0));
        assert!(matches!(bad, Err(RecipeError::Config { .. })));
        assert_eq!(recipe.steps().len(), 1);
    }

    #[test]
    fn test_generated_id_clash_is_redrawn() {
        let step = StepCenter::new(vec![col("carbon")]);
        let recipe = Recipe::new(&create_test_frame())
            .add_step(step.clone())
            .unwrap()
            .add_step(step.clone())
            .unwrap();
        let ids: Vec<&str> = recipe.steps().iter().map(|s| s.id()).collect();
        assert_eq!(ids[0], step.common().id);
        assert_ne!(ids[0], ids[1]);
        assert!(ids[1].starts_with("center_"));
    }

    #[test]
    fn test_tunables_are_recomputed() {
        let recipe = Recipe::new(&create_test_frame())
            .add_step(StepRelu::new(vec![col("carbon")]).shift(Param::tune("cut")).id("r"))
            .unwrap()
            .add_step(StepScale::new(vec![all_numeric_predictors()]).factor(Param::tune("f")))
            .unwrap();

        let labels: Vec<String> = recipe.tunables().map(|t| t.label).collect();
        assert_eq!(labels, vec!["cut", "f"]);
        assert_eq!(recipe.tunables().count(), 2);

        let values = TuneValues::from([("cut".to_string(), json!(40.0))]);
        let partly = recipe.finalize(&values).unwrap();
        let left: Vec<String> = partly.tunables().map(|t| t.label).collect();
        assert_eq!(left, vec!["f"]);
        assert_eq!(recipe.tunables().count(), 2);
    }

    #[test]
    fn test_finalize_reports_step() {
        let recipe = Recipe::new(&create_test_frame())
            .add_step(StepCenter::new(vec![col("carbon")]))
            .unwrap()
            .add_step(StepScale::new(vec![col("carbon")]).factor(Param::tune("f")))
            .unwrap();
        let values = TuneValues::from([("f".to_string(), json!(3.0))]);
        let err = recipe.finalize(&values).unwrap_err();
        assert_eq!(err.step_index(), Some(1));
        assert!(matches!(err.root_cause(), RecipeError::Config { .. }));
    }
}
