//! Recipe steps: the contract every step kind satisfies and the closed set
//! of kinds a recipe can hold.
//!
//! A step is created untrained from a list of [`Selector`]s and its own
//! configuration. [`RecipeStep::prep`] resolves the selectors against the
//! current schema, learns whatever state the kind needs from the training
//! data and returns a new, trained value. [`RecipeStep::bake`] replays that
//! state on any data without looking at the selectors again.
//!
//! # Example
//! ```
//! use feature_recipes::data::{Column, DataFrame};
//! use feature_recipes::schema::Schema;
//! use feature_recipes::selector::col;
//! use feature_recipes::steps::{RecipeStep, StepRelu};
//!
//! let df = DataFrame::new()
//!     .with_column("carbon", Column::Numeric(vec![10.0, 50.0, 90.0]))
//!     .unwrap();
//! let step = StepRelu::new(vec![col("carbon")]).shift(40.0);
//! let fitted = step.prep(&df, &Schema::from_frame(&df)).unwrap();
//! let out = fitted.bake(&df).unwrap();
//! assert_eq!(out.numeric("right_relu_carbon").unwrap(), &[0.0, 10.0, 50.0]);
//! ```

use crate::data::{Column, ColumnType, DataFrame};
use crate::error::RecipeError;
use crate::schema::{Role, Schema};
use crate::selector::{self, Selector};
use crate::tunable::{TunableParam, TuneValues};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Builder methods shared by every step kind.
macro_rules! step_builders {
    ($ty:ty) => {
        impl $ty {
            /// Role given to the columns this step creates.
            pub fn role(mut self, role: impl Into<$crate::schema::Role>) -> Self {
                self.common.role = role.into();
                self
            }

            /// Apply this step to the training data only.
            pub fn skip(mut self, skip: bool) -> Self {
                self.common.skip = skip;
                self
            }

            /// Replace the generated id.
            pub fn id(mut self, id: impl Into<String>) -> Self {
                self.common.id = id.into();
                self.common.auto_id = false;
                self
            }
        }
    };
}

mod args;
pub mod center;
pub mod dummy;
pub mod impute;
pub mod log;
pub mod naomit;
pub mod normalize;
pub mod relu;
pub mod scale;

pub use args::Args;
pub use center::StepCenter;
pub use dummy::StepDummy;
pub use impute::{ImputeStrategy, StepImpute};
pub use log::StepLog;
pub use naomit::StepNaomit;
pub use normalize::StepNormalize;
pub use relu::StepRelu;
pub use scale::StepScale;

/// What a step does when its selectors resolve to no columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyPolicy {
    /// Train as a no-op.
    Allow,
    /// Fail with [`RecipeError::EmptySelection`].
    Error,
}

/// Fields every step kind carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepCommon {
    /// Stable identifier, unique within a recipe.
    pub id: String,
    pub selectors: Vec<Selector>,
    /// Role assigned to columns this step creates.
    pub role: Role,
    pub trained: bool,
    /// Apply during prep only; omitted when baking new data.
    pub skip: bool,
    /// Columns the selectors resolved to. `Some` iff trained.
    pub columns: Option<Vec<String>>,
    /// The id was generated rather than chosen by the caller.
    pub(crate) auto_id: bool,
}

impl StepCommon {
    pub(crate) fn new(kind: &str, selectors: Vec<Selector>) -> Self {
        Self {
            id: new_id(kind),
            selectors,
            role: Role::Predictor,
            trained: false,
            skip: false,
            columns: None,
            auto_id: true,
        }
    }

    /// Resolved columns of a trained step.
    ///
    /// # Errors
    /// [`RecipeError::NotTrained`] before prep.
    pub fn columns(&self) -> Result<&[String], RecipeError> {
        match (&self.columns, self.trained) {
            (Some(columns), true) => Ok(columns),
            _ => Err(RecipeError::NotTrained {
                step: self.id.clone(),
            }),
        }
    }

    /// Per-column learned state of a trained step, one entry per column.
    ///
    /// # Errors
    /// [`RecipeError::NotTrained`] when the state is absent or does not
    /// line up with the resolved columns.
    pub(crate) fn learned<'a, T>(
        &self,
        state: &'a Option<Vec<T>>,
    ) -> Result<&'a [T], RecipeError> {
        let columns = self.columns()?;
        match state {
            Some(values) if values.len() == columns.len() => Ok(values),
            _ => Err(RecipeError::NotTrained {
                step: self.id.clone(),
            }),
        }
    }

    pub(crate) fn trained_with(&self, columns: Vec<String>) -> Self {
        Self {
            trained: true,
            columns: Some(columns),
            ..self.clone()
        }
    }

    pub(crate) fn untrained(&self) -> Self {
        Self {
            trained: false,
            columns: None,
            ..self.clone()
        }
    }

    fn apply_args(&mut self, args: &mut Args) -> Result<(), RecipeError> {
        if let Some(role) = args.role()? {
            self.role = role;
        }
        if let Some(skip) = args.value::<bool>("skip")? {
            self.skip = skip;
        }
        if let Some(id) = args.value::<String>("id")? {
            if id.is_empty() {
                return Err(RecipeError::config("id", "must not be empty"));
            }
            self.id = id;
            self.auto_id = false;
        }
        Ok(())
    }
}

/// `<kind>_<5 random alphanumerics>`.
pub fn new_id(kind: &str) -> String {
    let suffix: String = std::iter::repeat_with(fastrand::alphanumeric)
        .take(5)
        .collect();
    format!("{}_{}", kind, suffix)
}

/// Read-only summary of one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub id: String,
    pub kind: String,
    pub trained: bool,
    pub skip: bool,
    pub role: Role,
    /// Resolved columns once trained, selector strings before.
    pub terms: Vec<String>,
    /// Hyperparameters; placeholders appear as `{"tune": label}`.
    pub params: BTreeMap<String, Value>,
    /// Learned state; empty until trained.
    pub statistics: BTreeMap<String, Value>,
}

/// The contract every step kind implements.
///
/// Values are never mutated in place: `prep`, `finalize` and `untrained`
/// all return new values.
pub trait RecipeStep: Clone {
    /// Registry name, e.g. `"relu"`.
    const KIND: &'static str;
    /// Column type every selected column must have, if any.
    const REQUIRES: Option<ColumnType>;
    const EMPTY: EmptyPolicy = EmptyPolicy::Allow;

    fn common(&self) -> &StepCommon;

    fn common_mut(&mut self) -> &mut StepCommon;

    /// Check the static configuration. Placeholders always pass.
    fn validate(&self) -> Result<(), RecipeError> {
        Ok(())
    }

    /// Learn from `data` and return the trained step.
    fn prep(&self, data: &DataFrame, schema: &Schema) -> Result<Self, RecipeError>;

    /// Apply the learned state to `data`.
    fn bake(&self, data: &DataFrame) -> Result<DataFrame, RecipeError>;

    /// Hyperparameters for [`StepReport::params`].
    fn params(&self) -> BTreeMap<String, Value>;

    /// Learned state for [`StepReport::statistics`].
    fn statistics(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    /// Placeholders held by this step.
    fn tunables(&self) -> Vec<TunableParam> {
        Vec::new()
    }

    /// Substitute placeholders and re-validate.
    fn finalize(&self, _values: &TuneValues) -> Result<Self, RecipeError> {
        Ok(self.clone())
    }

    /// Same id and configuration with learned state cleared.
    fn untrained(&self) -> Self;

    /// Fail with `UnresolvedTunable` on the first placeholder.
    fn ensure_resolved(&self) -> Result<(), RecipeError> {
        match self.tunables().into_iter().next() {
            Some(t) => Err(RecipeError::UnresolvedTunable {
                step: t.step_id,
                param: t.param,
            }),
            None => Ok(()),
        }
    }

    /// Prep preamble: refuse trained steps and placeholders, then resolve
    /// and type-check the selection under the kind's empty policy.
    fn begin_prep(&self, schema: &Schema) -> Result<Vec<String>, RecipeError> {
        let common = self.common();
        if common.trained {
            return Err(RecipeError::AlreadyTrained {
                step: common.id.clone(),
            });
        }
        self.ensure_resolved()?;

        let columns = selector::resolve(&common.selectors, schema)?;
        debug!(
            step = %common.id,
            selectors = %selector::describe(&common.selectors),
            columns = columns.len(),
            "Resolved selection"
        );
        if columns.is_empty() && Self::EMPTY == EmptyPolicy::Error {
            return Err(RecipeError::EmptySelection {
                step: common.id.clone(),
            });
        }
        if let Some(required) = Self::REQUIRES {
            for name in &columns {
                if let Some(var) = schema.get(name) {
                    if var.column_type != required {
                        return Err(RecipeError::TypeMismatch {
                            column: name.clone(),
                            expected: required.to_string(),
                            found: var.column_type,
                        });
                    }
                }
            }
        }
        Ok(columns)
    }

    fn tidy(&self) -> StepReport {
        let common = self.common();
        let terms = match &common.columns {
            Some(columns) => columns.clone(),
            None => common.selectors.iter().map(ToString::to_string).collect(),
        };
        StepReport {
            id: common.id.clone(),
            kind: Self::KIND.to_string(),
            trained: common.trained,
            skip: common.skip,
            role: common.role.clone(),
            terms,
            params: self.params(),
            statistics: if common.trained {
                self.statistics()
            } else {
                BTreeMap::new()
            },
        }
    }
}

/// `{column: value}` for per-column statistics.
pub(crate) fn per_column(columns: &[String], values: &[f64]) -> Value {
    let map: Map<String, Value> = columns
        .iter()
        .zip(values)
        .map(|(c, v)| (c.clone(), json!(v)))
        .collect();
    Value::Object(map)
}

/// Mean of the non-NaN values, `None` if there are none.
pub(crate) fn nan_mean(values: &[f64]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Sample standard deviation of the non-NaN values.
///
/// Zero, undefined (fewer than two values) or non-finite spreads map to
/// 1.0 so that dividing by the result leaves the column unscaled.
pub(crate) fn nan_sd(values: &[f64]) -> f64 {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = present.len();
    if n < 2 {
        return 1.0;
    }
    let mean = present.iter().sum::<f64>() / n as f64;
    let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let sd = var.sqrt();
    if sd > f64::EPSILON && sd.is_finite() {
        sd
    } else {
        1.0
    }
}

/// Replace each of `columns` by `f(column_index, value)`.
pub(crate) fn map_numeric<F>(
    data: &DataFrame,
    columns: &[String],
    f: F,
) -> Result<DataFrame, RecipeError>
where
    F: Fn(usize, f64) -> f64,
{
    let mut out = data.clone();
    for (j, name) in columns.iter().enumerate() {
        let mapped: Vec<f64> = data.numeric(name)?.iter().map(|&x| f(j, x)).collect();
        out.replace_column(name, Column::Numeric(mapped))?;
    }
    Ok(out)
}

/// Dispatch `$body` over every variant of [`Step`], binding the inner step
/// to `$s`.
macro_rules! with_step {
    ($step:expr, $s:ident => $body:expr) => {
        match $step {
            Step::Relu($s) => $body,
            Step::Center($s) => $body,
            Step::Scale($s) => $body,
            Step::Normalize($s) => $body,
            Step::Log($s) => $body,
            Step::Impute($s) => $body,
            Step::Dummy($s) => $body,
            Step::Naomit($s) => $body,
        }
    };
}

/// Like `with_step!` but re-wraps the result in the same variant.
macro_rules! map_step {
    ($step:expr, $s:ident => $body:expr) => {
        match $step {
            Step::Relu($s) => Step::Relu($body),
            Step::Center($s) => Step::Center($body),
            Step::Scale($s) => Step::Scale($body),
            Step::Normalize($s) => Step::Normalize($body),
            Step::Log($s) => Step::Log($body),
            Step::Impute($s) => Step::Impute($body),
            Step::Dummy($s) => Step::Dummy($body),
            Step::Naomit($s) => Step::Naomit($body),
        }
    };
}

/// Any step a recipe can hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Step {
    Relu(StepRelu),
    Center(StepCenter),
    Scale(StepScale),
    Normalize(StepNormalize),
    Log(StepLog),
    Impute(StepImpute),
    Dummy(StepDummy),
    Naomit(StepNaomit),
}

fn kind_of<S: RecipeStep>(_: &S) -> &'static str {
    S::KIND
}

impl Step {
    /// Names accepted by [`Step::from_args`].
    pub const KINDS: [&'static str; 8] = [
        "relu",
        "center",
        "scale",
        "normalize",
        "log",
        "impute",
        "dummy",
        "naomit",
    ];

    /// Build a step by kind name from loosely typed arguments.
    ///
    /// Besides the kind's own arguments, every kind accepts `role`, `skip`
    /// and `id`.
    ///
    /// # Errors
    /// [`RecipeError::Config`] for an unknown kind, an unknown argument, or
    /// an argument of the wrong type or outside its domain.
    pub fn from_args(
        kind: &str,
        selectors: Vec<Selector>,
        args: impl Into<Args>,
    ) -> Result<Step, RecipeError> {
        let mut args = args.into();
        let mut step = match kind {
            "relu" => Step::Relu(StepRelu::from_args(selectors, &mut args)?),
            "center" => Step::Center(StepCenter::new(selectors)),
            "scale" => Step::Scale(StepScale::from_args(selectors, &mut args)?),
            "normalize" => Step::Normalize(StepNormalize::new(selectors)),
            "log" => Step::Log(StepLog::from_args(selectors, &mut args)?),
            "impute" => Step::Impute(StepImpute::from_args(selectors, &mut args)?),
            "dummy" => Step::Dummy(StepDummy::from_args(selectors, &mut args)?),
            "naomit" => Step::Naomit(StepNaomit::new(selectors)),
            other => {
                return Err(RecipeError::config(
                    "kind",
                    format!(
                        "unknown step kind `{}`; expected one of {}",
                        other,
                        Step::KINDS.join(", ")
                    ),
                ))
            }
        };
        step.common_mut().apply_args(&mut args)?;
        args.finish(kind)?;
        step.validate()?;
        Ok(step)
    }

    pub fn kind(&self) -> &'static str {
        with_step!(self, s => kind_of(s))
    }

    pub fn common(&self) -> &StepCommon {
        with_step!(self, s => s.common())
    }

    pub(crate) fn common_mut(&mut self) -> &mut StepCommon {
        with_step!(self, s => s.common_mut())
    }

    pub fn id(&self) -> &str {
        &self.common().id
    }

    pub fn is_trained(&self) -> bool {
        self.common().trained
    }

    pub fn skip(&self) -> bool {
        self.common().skip
    }

    pub fn validate(&self) -> Result<(), RecipeError> {
        with_step!(self, s => s.validate())
    }

    pub fn prep(&self, data: &DataFrame, schema: &Schema) -> Result<Step, RecipeError> {
        Ok(map_step!(self, s => s.prep(data, schema)?))
    }

    pub fn bake(&self, data: &DataFrame) -> Result<DataFrame, RecipeError> {
        with_step!(self, s => s.bake(data))
    }

    pub fn tidy(&self) -> StepReport {
        with_step!(self, s => s.tidy())
    }

    pub fn tunables(&self) -> Vec<TunableParam> {
        with_step!(self, s => s.tunables())
    }

    pub fn ensure_resolved(&self) -> Result<(), RecipeError> {
        with_step!(self, s => s.ensure_resolved())
    }

    pub fn finalize(&self, values: &TuneValues) -> Result<Step, RecipeError> {
        Ok(map_step!(self, s => s.finalize(values)?))
    }

    pub fn untrained(&self) -> Step {
        map_step!(self, s => s.untrained())
    }
}

macro_rules! impl_from_step {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for Step {
                fn from(step: $ty) -> Self {
                    Step::$variant(step)
                }
            }
        )+
    };
}

impl_from_step!(
    Relu(StepRelu),
    Center(StepCenter),
    Scale(StepScale),
    Normalize(StepNormalize),
    Log(StepLog),
    Impute(StepImpute),
    Dummy(StepDummy),
    Naomit(StepNaomit),
);
