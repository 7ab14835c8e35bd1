//! Missing value imputation for numeric columns.
//!
//! `NaN` is the missing marker. Fill values are learned per column from the
//! observed training values; a column with none observed is filled with 0.

use crate::data::{ColumnType, DataFrame};
use crate::error::RecipeError;
use crate::schema::Schema;
use crate::selector::Selector;
use crate::steps::{map_numeric, nan_mean, per_column, Args, RecipeStep, StepCommon};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Strategy for imputing missing values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace missing values with the mean of each column.
    #[default]
    Mean,
    /// Replace missing values with the median of each column.
    Median,
    /// Replace missing values with the most frequent value of each column.
    /// Ties go to the smallest value.
    MostFrequent,
    /// Replace missing values with a constant value.
    Constant(f64),
}

impl ImputeStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ImputeStrategy::Mean => "mean",
            ImputeStrategy::Median => "median",
            ImputeStrategy::MostFrequent => "most_frequent",
            ImputeStrategy::Constant(_) => "constant",
        }
    }

    /// Fill value for one column.
    fn statistic(&self, values: &[f64]) -> f64 {
        let mut observed: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if observed.is_empty() {
            return match self {
                ImputeStrategy::Constant(c) => *c,
                _ => 0.0,
            };
        }
        match self {
            ImputeStrategy::Mean => nan_mean(&observed).unwrap_or(0.0),
            ImputeStrategy::Median => {
                observed.sort_by(f64::total_cmp);
                let n = observed.len();
                if n % 2 == 0 {
                    (observed[n / 2 - 1] + observed[n / 2]) / 2.0
                } else {
                    observed[n / 2]
                }
            }
            ImputeStrategy::MostFrequent => {
                observed.sort_by(f64::total_cmp);
                let mut best = (observed[0], 0usize);
                let mut run = (observed[0], 0usize);
                for &v in &observed {
                    if v == run.0 {
                        run.1 += 1;
                    } else {
                        run = (v, 1);
                    }
                    if run.1 > best.1 {
                        best = run;
                    }
                }
                best.0
            }
            ImputeStrategy::Constant(c) => *c,
        }
    }
}

/// Replace `NaN` with a per-column fill value learned at prep time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepImpute {
    common: StepCommon,
    strategy: ImputeStrategy,
    fills: Option<Vec<f64>>,
}

step_builders!(StepImpute);

impl StepImpute {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self {
            common: StepCommon::new(Self::KIND, selectors),
            strategy: ImputeStrategy::default(),
            fills: None,
        }
    }

    pub fn strategy(mut self, strategy: ImputeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Learned fill values, in column order.
    pub fn fills(&self) -> Option<&[f64]> {
        self.fills.as_deref()
    }

    pub(crate) fn from_args(selectors: Vec<Selector>, args: &mut Args) -> Result<Self, RecipeError> {
        let value = args.value::<f64>("value")?;
        let strategy = match args.value::<String>("strategy")?.as_deref() {
            None | Some("mean") => ImputeStrategy::Mean,
            Some("median") => ImputeStrategy::Median,
            Some("most_frequent") => ImputeStrategy::MostFrequent,
            Some("constant") => match value {
                Some(v) => ImputeStrategy::Constant(v),
                None => {
                    return Err(RecipeError::config(
                        "value",
                        "required by the `constant` strategy",
                    ))
                }
            },
            Some(other) => {
                return Err(RecipeError::config(
                    "strategy",
                    format!(
                        "unknown strategy `{}`; expected mean, median, most_frequent or constant",
                        other
                    ),
                ))
            }
        };
        if value.is_some() && !matches!(strategy, ImputeStrategy::Constant(_)) {
            return Err(RecipeError::config(
                "value",
                "only used by the `constant` strategy",
            ));
        }
        Ok(Self::new(selectors).strategy(strategy))
    }
}

impl RecipeStep for StepImpute {
    const KIND: &'static str = "impute";
    const REQUIRES: Option<ColumnType> = Some(ColumnType::Numeric);

    fn common(&self) -> &StepCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StepCommon {
        &mut self.common
    }

    fn validate(&self) -> Result<(), RecipeError> {
        match self.strategy {
            ImputeStrategy::Constant(c) if !c.is_finite() => {
                Err(RecipeError::config("value", "must be a finite number"))
            }
            _ => Ok(()),
        }
    }

    fn prep(&self, data: &DataFrame, schema: &Schema) -> Result<Self, RecipeError> {
        let columns = self.begin_prep(schema)?;
        let fills = columns
            .iter()
            .map(|c| Ok(self.strategy.statistic(data.numeric(c)?)))
            .collect::<Result<Vec<_>, RecipeError>>()?;
        Ok(Self {
            common: self.common.trained_with(columns),
            fills: Some(fills),
            ..self.clone()
        })
    }

    fn bake(&self, data: &DataFrame) -> Result<DataFrame, RecipeError> {
        let columns = self.common.columns()?;
        let fills = self.common.learned(&self.fills)?;
        map_numeric(data, columns, |j, x| if x.is_nan() { fills[j] } else { x })
    }

    fn params(&self) -> BTreeMap<String, Value> {
        let mut params = BTreeMap::from([("strategy".to_string(), json!(self.strategy.name()))]);
        if let ImputeStrategy::Constant(c) = self.strategy {
            params.insert("value".to_string(), json!(c));
        }
        params
    }

    fn statistics(&self) -> BTreeMap<String, Value> {
        match (&self.common.columns, &self.fills) {
            (Some(columns), Some(fills)) => {
                BTreeMap::from([("fills".to_string(), per_column(columns, fills))])
            }
            _ => BTreeMap::new(),
        }
    }

    fn untrained(&self) -> Self {
        Self {
            common: self.common.untrained(),
            fills: None,
            ..self.clone()
        }
    }
}
