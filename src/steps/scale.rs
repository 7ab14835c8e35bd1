//! Scaling by the training standard deviation.

use crate::data::{ColumnType, DataFrame};
use crate::error::RecipeError;
use crate::schema::Schema;
use crate::selector::Selector;
use crate::steps::{map_numeric, nan_sd, per_column, Args, RecipeStep, StepCommon};
use crate::tunable::{Param, ParamDomain, TunableParam, TuneValues};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Divide each selected column by `factor` training standard deviations.
///
/// `factor = 2` puts numeric predictors on the scale of binary ones.
/// Columns with zero spread are divided by 1 instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepScale {
    common: StepCommon,
    factor: Param<f64>,
    sds: Option<Vec<f64>>,
}

step_builders!(StepScale);

impl StepScale {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self {
            common: StepCommon::new(Self::KIND, selectors),
            factor: Param::Value(1.0),
            sds: None,
        }
    }

    /// 1 or 2.
    pub fn factor(mut self, factor: impl Into<Param<f64>>) -> Self {
        self.factor = factor.into();
        self
    }

    pub fn sds(&self) -> Option<&[f64]> {
        self.sds.as_deref()
    }

    pub(crate) fn from_args(selectors: Vec<Selector>, args: &mut Args) -> Result<Self, RecipeError> {
        let mut step = Self::new(selectors);
        if let Some(factor) = args.param("factor")? {
            step.factor = factor;
        }
        Ok(step)
    }
}

/// Per-column spread with the zero-variance rule, warning once per column.
pub(crate) fn learn_sds(
    step: &str,
    data: &DataFrame,
    columns: &[String],
) -> Result<Vec<f64>, RecipeError> {
    columns
        .iter()
        .map(|c| {
            let values = data.numeric(c)?;
            let observed: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
            if observed.len() > 1 && observed.iter().all(|v| *v == observed[0]) {
                warn!(step = %step, column = %c, "Column has zero variance, leaving it unscaled");
            }
            Ok(nan_sd(values))
        })
        .collect()
}

impl RecipeStep for StepScale {
    const KIND: &'static str = "scale";
    const REQUIRES: Option<ColumnType> = Some(ColumnType::Numeric);

    fn common(&self) -> &StepCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StepCommon {
        &mut self.common
    }

    fn validate(&self) -> Result<(), RecipeError> {
        match self.factor {
            Param::Value(f) if f != 1.0 && f != 2.0 => {
                Err(RecipeError::config("factor", format!("must be 1 or 2, got {}", f)))
            }
            _ => Ok(()),
        }
    }

    fn prep(&self, data: &DataFrame, schema: &Schema) -> Result<Self, RecipeError> {
        let columns = self.begin_prep(schema)?;
        let sds = learn_sds(&self.common.id, data, &columns)?;
        Ok(Self {
            common: self.common.trained_with(columns),
            sds: Some(sds),
            ..self.clone()
        })
    }

    fn bake(&self, data: &DataFrame) -> Result<DataFrame, RecipeError> {
        let columns = self.common.columns()?;
        let factor = *self.factor.require(&self.common.id, "factor")?;
        let sds = self.common.learned(&self.sds)?;
        map_numeric(data, columns, |j, x| x / (factor * sds[j]))
    }

    fn params(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([("factor".to_string(), self.factor.to_json())])
    }

    fn statistics(&self) -> BTreeMap<String, Value> {
        match (&self.common.columns, &self.sds) {
            (Some(columns), Some(sds)) => BTreeMap::from([("sds".to_string(), per_column(columns, sds))]),
            _ => BTreeMap::new(),
        }
    }

    fn tunables(&self) -> Vec<TunableParam> {
        let mut out = Vec::new();
        TunableParam::collect(
            &mut out,
            &self.common.id,
            "factor",
            &self.factor,
            ParamDomain::Discrete(vec![1.0, 2.0]),
        );
        out
    }

    fn finalize(&self, values: &TuneValues) -> Result<Self, RecipeError> {
        let step = Self {
            factor: self.factor.finalize("factor", values)?,
            ..self.clone()
        };
        step.validate()?;
        Ok(step)
    }

    fn untrained(&self) -> Self {
        Self {
            common: self.common.untrained(),
            sds: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::selector::col;
    use serde_json::json;

    fn create_test_frame() -> DataFrame {
        DataFrame::from_columns([
            ("x", Column::Numeric(vec![1.0, 3.0])),
            ("flat", Column::Numeric(vec![4.0, 4.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_scale_by_sd() {
        let df = create_test_frame();
        let fitted = StepScale::new(vec![col("x"), col("flat")])
            .prep(&df, &Schema::from_frame(&df))
            .unwrap();
        let sd = 2.0_f64.sqrt();
        let out = fitted.bake(&df).unwrap();
        let x = out.numeric("x").unwrap();
        assert!((x[0] - 1.0 / sd).abs() < 1e-12);
        assert!((x[1] - 3.0 / sd).abs() < 1e-12);
        assert_eq!(out.numeric("flat").unwrap(), &[4.0, 4.0]);
    }

    #[test]
    fn test_factor_two_halves_result() {
        let df = create_test_frame();
        let one = StepScale::new(vec![col("x")])
            .prep(&df, &Schema::from_frame(&df))
            .unwrap()
            .bake(&df)
            .unwrap();
        let two = StepScale::new(vec![col("x")])
            .factor(2.0)
            .prep(&df, &Schema::from_frame(&df))
            .unwrap()
            .bake(&df)
            .unwrap();
        let (a, b) = (one.numeric("x").unwrap(), two.numeric("x").unwrap());
        assert!((a[0] - 2.0 * b[0]).abs() < 1e-12);
    }

    #[test]
    fn test_factor_domain() {
        assert!(StepScale::new(vec![]).factor(3.0).validate().is_err());

        let tuned = StepScale::new(vec![]).factor(Param::tune("f"));
        assert!(tuned.validate().is_ok());
        let values = TuneValues::from([("f".to_string(), json!(5))]);
        assert!(matches!(tuned.finalize(&values), Err(RecipeError::Config { .. })));
    }
}
