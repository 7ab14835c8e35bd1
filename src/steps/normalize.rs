//! Standardization: `(x - mean) / sd` with training statistics.

use crate::data::{ColumnType, DataFrame};
use crate::error::RecipeError;
use crate::schema::Schema;
use crate::selector::Selector;
use crate::steps::scale::learn_sds;
use crate::steps::{map_numeric, nan_mean, per_column, RecipeStep, StepCommon};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Center and scale in one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepNormalize {
    common: StepCommon,
    means: Option<Vec<f64>>,
    sds: Option<Vec<f64>>,
}

step_builders!(StepNormalize);

impl StepNormalize {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self {
            common: StepCommon::new(Self::KIND, selectors),
            means: None,
            sds: None,
        }
    }

    pub fn means(&self) -> Option<&[f64]> {
        self.means.as_deref()
    }

    pub fn sds(&self) -> Option<&[f64]> {
        self.sds.as_deref()
    }
}

impl RecipeStep for StepNormalize {
    const KIND: &'static str = "normalize";
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
        let sds = learn_sds(&self.common.id, data, &columns)?;
        Ok(Self {
            common: self.common.trained_with(columns),
            means: Some(means),
            sds: Some(sds),
        })
    }

    fn bake(&self, data: &DataFrame) -> Result<DataFrame, RecipeError> {
        let columns = self.common.columns()?;
        let means = self.common.learned(&self.means)?;
        let sds = self.common.learned(&self.sds)?;
        map_numeric(data, columns, |j, x| (x - means[j]) / sds[j])
    }

    fn params(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    fn statistics(&self) -> BTreeMap<String, Value> {
        match (&self.common.columns, &self.means, &self.sds) {
            (Some(columns), Some(means), Some(sds)) => BTreeMap::from([
                ("means".to_string(), per_column(columns, means)),
                ("sds".to_string(), per_column(columns, sds)),
            ]),
            _ => BTreeMap::new(),
        }
    }

    fn untrained(&self) -> Self {
        Self {
            common: self.common.untrained(),
            means: None,
            sds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::selector::all_numeric;

    #[test]
    fn test_normalize_gives_zero_mean_unit_sd() {
        let df = DataFrame::new()
            .with_column("x", Column::Numeric(vec![2.0, 4.0, 6.0, 8.0]))
            .unwrap();
        let fitted = StepNormalize::new(vec![all_numeric()])
            .prep(&df, &Schema::from_frame(&df))
            .unwrap();
        let out = fitted.bake(&df).unwrap();
        let x = out.numeric("x").unwrap();

        let mean = x.iter().sum::<f64>() / 4.0;
        let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_is_only_centered() {
        let df = DataFrame::new()
            .with_column("c", Column::Numeric(vec![3.0, 3.0]))
            .unwrap();
        let fitted = StepNormalize::new(vec![all_numeric()])
            .prep(&df, &Schema::from_frame(&df))
            .unwrap();
        assert_eq!(fitted.sds(), Some(&[1.0][..]));
        assert_eq!(fitted.bake(&df).unwrap().numeric("c").unwrap(), &[0.0, 0.0]);
    }
}
