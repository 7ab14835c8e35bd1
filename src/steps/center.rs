//! Mean centering.

use crate::data::{ColumnType, DataFrame};
use crate::error::RecipeError;
use crate::schema::Schema;
use crate::selector::Selector;
use crate::steps::{map_numeric, nan_mean, per_column, RecipeStep, StepCommon};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Subtract the training mean from each selected column.
///
/// Means ignore missing values; a column with no observed values gets a
/// mean of zero and is left unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepCenter {
    common: StepCommon,
    means: Option<Vec<f64>>,
}

step_builders!(StepCenter);

impl StepCenter {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self {
            common: StepCommon::new(Self::KIND, selectors),
            means: None,
        }
    }

    /// Learned means, in column order.
    pub fn means(&self) -> Option<&[f64]> {
        self.means.as_deref()
    }
}

impl RecipeStep for StepCenter {
    const KIND: &'static str = "center";
    const REQUIRES: Option<ColumnType> = Some(ColumnType::Numeric);

    fn common(&self) -> &StepCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StepCommon {
        &mut self.common
    }

    fn prep(&self, data: &DataFrame, schema: &Schema) -> Result<Self, RecipeError> {
        let columns = self.begin_prep(schema)?;
        let means = columns
            .iter()
            .map(|c| Ok(nan_mean(data.numeric(c)?).unwrap_or(0.0)))
            .collect::<Result<Vec<_>, RecipeError>>()?;
        Ok(Self {
            common: self.common.trained_with(columns),
            means: Some(means),
        })
    }

    fn bake(&self, data: &DataFrame) -> Result<DataFrame, RecipeError> {
        let columns = self.common.columns()?;
        let means = self.common.learned(&self.means)?;
        map_numeric(data, columns, |j, x| x - means[j])
    }

    fn params(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    fn statistics(&self) -> BTreeMap<String, Value> {
        match (&self.common.columns, &self.means) {
            (Some(columns), Some(means)) => {
                BTreeMap::from([("means".to_string(), per_column(columns, means))])
            }
            _ => BTreeMap::new(),
        }
    }

    fn untrained(&self) -> Self {
        Self {
            common: self.common.untrained(),
            means: None,
        }
    }
}
