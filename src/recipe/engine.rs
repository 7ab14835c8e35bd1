//! Training (`prep`) and application (`bake`) of a recipe.
//!
//! `prep` walks the steps in order. Each step is trained on the data as
//! transformed by the steps before it, then applied to that data so the
//! next step sees its output. The pass runs on copies: the caller's recipe
//! is never touched, and any failure returns an error naming the step,
//! with no partially trained recipe.
//!
//! `bake` replays the trained steps on new data using only learned state.

use crate::data::DataFrame;
use crate::error::RecipeError;
use crate::recipe::Recipe;
use crate::schema::Role;
use crate::selector::{self, Selector};
use tracing::{debug, info};

/// Options for [`Recipe::prep_with`].
#[derive(Clone, Debug)]
pub struct PrepOptions {
    /// Retrain a trained recipe from its untrained configuration instead of
    /// failing with [`RecipeError::AlreadyTrained`].
    pub fresh: bool,
    /// Keep the processed training set for [`Recipe::juice`].
    pub retain: bool,
}

impl Default for PrepOptions {
    fn default() -> Self {
        Self {
            fresh: false,
            retain: true,
        }
    }
}

/// What data a bake call is applied to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BakeTarget {
    /// New data: steps marked `skip` are omitted.
    #[default]
    NewData,
    /// The training data again: every step is applied.
    Training,
}

/// Options for [`Recipe::bake_with`].
#[derive(Clone, Debug, Default)]
pub struct BakeOptions {
    pub target: BakeTarget,
    /// Restrict the output to these columns; empty keeps all.
    pub select: Vec<Selector>,
}

impl Recipe {
    /// Train every step on `training` with default options.
    pub fn prep(&self, training: &DataFrame) -> Result<Recipe, RecipeError> {
        self.prep_with(training, &PrepOptions::default())
    }

    /// Train every step on `training`.
    ///
    /// Columns of `training` the recipe was not declared on are ignored.
    ///
    /// # Errors
    /// - [`RecipeError::MissingColumns`] if a declared column is absent
    /// - [`RecipeError::StepFailed`] wrapping the first step error, e.g.
    ///   `AlreadyTrained` (without `fresh`), `UnresolvedTunable`,
    ///   `TypeMismatch` or `EmptySelection`
    pub fn prep_with(
        &self,
        training: &DataFrame,
        options: &PrepOptions,
    ) -> Result<Recipe, RecipeError> {
        let base = if options.fresh {
            self.reset()
        } else {
            for (index, step) in self.steps.iter().enumerate() {
                if step.is_trained() {
                    return Err(RecipeError::AlreadyTrained {
                        step: step.id().to_string(),
                    }
                    .in_step(index, step.id()));
                }
            }
            self.clone()
        };

        // Placeholders anywhere fail the whole call before any work is done.
        for (index, step) in base.steps.iter().enumerate() {
            step.ensure_resolved()
                .map_err(|e| e.in_step(index, step.id()))?;
        }

        let mut data = training.select(&base.var_info.names())?;
        // Declared roles, column types as found in the training data.
        let mut schema = base.var_info.rebuild(&data, &Role::Predictor);
        let mut fitted = Vec::with_capacity(base.steps.len());

        for (index, step) in base.steps.iter().enumerate() {
            let trained = step
                .prep(&data, &schema)
                .map_err(|e| e.in_step(index, step.id()))?;
            data = trained
                .bake(&data)
                .map_err(|e| e.in_step(index, step.id()))?;
            schema = schema.rebuild(&data, &trained.common().role);
            debug!(
                index,
                id = %trained.id(),
                kind = trained.kind(),
                columns = trained.common().columns.as_ref().map_or(0, Vec::len),
                rows = data.n_rows(),
                "Prepped step"
            );
            fitted.push(trained);
        }

        info!(
            steps = fitted.len(),
            rows = data.n_rows(),
            columns = data.n_cols(),
            "Recipe prepped"
        );

        Ok(Recipe {
            steps: fitted,
            var_info: base.var_info,
            term_info: Some(schema),
            trained: true,
            retained: options.retain.then_some(data),
        })
    }

    /// Apply the trained recipe to new data.
    pub fn bake(&self, data: &DataFrame) -> Result<DataFrame, RecipeError> {
        self.bake_with(data, &BakeOptions::default())
    }

    /// Apply the trained recipe.
    ///
    /// # Errors
    /// [`RecipeError::NotTrained`] before prep; otherwise
    /// [`RecipeError::StepFailed`] wrapping the first step error.
    pub fn bake_with(
        &self,
        data: &DataFrame,
        options: &BakeOptions,
    ) -> Result<DataFrame, RecipeError> {
        self.ensure_trained()?;

        let mut out = data.clone();
        for (index, step) in self.steps.iter().enumerate() {
            if step.skip() && options.target == BakeTarget::NewData {
                debug!(index, id = %step.id(), "Skipped step on new data");
                continue;
            }
            out = step
                .bake(&out)
                .map_err(|e| e.in_step(index, step.id()))?;
            debug!(index, id = %step.id(), kind = step.kind(), "Baked step");
        }
        self.select_output(out, &options.select)
    }

    /// The processed training set kept by prep.
    ///
    /// # Errors
    /// [`RecipeError::NotTrained`] before prep, [`RecipeError::NotRetained`]
    /// if prep ran with `retain = false`.
    pub fn juice(&self) -> Result<DataFrame, RecipeError> {
        self.ensure_trained()?;
        self.retained.clone().ok_or(RecipeError::NotRetained)
    }

    fn ensure_trained(&self) -> Result<(), RecipeError> {
        if self.trained {
            return Ok(());
        }
        let step = self
            .steps
            .iter()
            .find(|s| !s.is_trained())
            .map_or_else(|| "recipe".to_string(), |s| s.id().to_string());
        Err(RecipeError::NotTrained { step })
    }

    fn select_output(
        &self,
        data: DataFrame,
        select: &[Selector],
    ) -> Result<DataFrame, RecipeError> {
        if select.is_empty() {
            return Ok(data);
        }
        let schema = match &self.term_info {
            Some(terms) => terms.rebuild(&data, &Role::Predictor),
            None => self.var_info.rebuild(&data, &Role::Predictor),
        };
        let names = selector::resolve(select, &schema)?;
        data.select(&names)
    }
}
