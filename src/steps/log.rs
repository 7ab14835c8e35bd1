//! Logarithmic transform.
//!
//! `log_base(x + offset)`, or with `signed` the sign-preserving
//! `sign(x) * log_base(|x|)` that maps `|x| < 1` to zero.

use crate::data::{ColumnType, DataFrame};
use crate::error::RecipeError;
use crate::schema::Schema;
use crate::selector::Selector;
use crate::steps::{map_numeric, Args, RecipeStep, StepCommon};
use crate::tunable::{Param, ParamDomain, TunableParam, TuneValues};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepLog {
    common: StepCommon,
    base: Param<f64>,
    offset: f64,
    signed: bool,
}

step_builders!(StepLog);

impl StepLog {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self {
            common: StepCommon::new(Self::KIND, selectors),
            base: Param::Value(std::f64::consts::E),
            offset: 0.0,
            signed: false,
        }
    }

    pub fn base(mut self, base: impl Into<Param<f64>>) -> Self {
        self.base = base.into();
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub(crate) fn from_args(selectors: Vec<Selector>, args: &mut Args) -> Result<Self, RecipeError> {
        let mut step = Self::new(selectors);
        if let Some(base) = args.param("base")? {
            step.base = base;
        }
        if let Some(offset) = args.value("offset")? {
            step.offset = offset;
        }
        if let Some(signed) = args.value("signed")? {
            step.signed = signed;
        }
        Ok(step)
    }
}

impl RecipeStep for StepLog {
    const KIND: &'static str = "log";
    const REQUIRES: Option<ColumnType> = Some(ColumnType::Numeric);

    fn common(&self) -> &StepCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StepCommon {
        &mut self.common
    }

    fn validate(&self) -> Result<(), RecipeError> {
        if let Param::Value(base) = self.base {
            if !(base > 0.0 && base.is_finite()) || base == 1.0 {
                return Err(RecipeError::config(
                    "base",
                    format!("must be positive, finite and not 1, got {}", base),
                ));
            }
        }
        if !self.offset.is_finite() {
            return Err(RecipeError::config("offset", "must be a finite number"));
        }
        if self.signed && self.offset != 0.0 {
            return Err(RecipeError::config("offset", "cannot be combined with `signed`"));
        }
        Ok(())
    }

    fn prep(&self, _data: &DataFrame, schema: &Schema) -> Result<Self, RecipeError> {
        let columns = self.begin_prep(schema)?;
        Ok(Self {
            common: self.common.trained_with(columns),
            ..self.clone()
        })
    }

    fn bake(&self, data: &DataFrame) -> Result<DataFrame, RecipeError> {
        let columns = self.common.columns()?;
        let ln_base = self.base.require(&self.common.id, "base")?.ln();
        let (offset, signed) = (self.offset, self.signed);
        map_numeric(data, columns, |_, x| {
            if signed {
                if x.abs() < 1.0 {
                    0.0
                } else {
                    x.signum() * x.abs().ln() / ln_base
                }
            } else {
                (x + offset).ln() / ln_base
            }
        })
    }

    fn params(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("base".to_string(), self.base.to_json()),
            ("offset".to_string(), json!(self.offset)),
            ("signed".to_string(), json!(self.signed)),
        ])
    }

    fn tunables(&self) -> Vec<TunableParam> {
        let mut out = Vec::new();
        TunableParam::collect(
            &mut out,
            &self.common.id,
            "base",
            &self.base,
            ParamDomain::Real {
                lower: Some(0.0),
                upper: None,
            },
        );
        out
    }

    fn finalize(&self, values: &TuneValues) -> Result<Self, RecipeError> {
        let step = Self {
            base: self.base.finalize("base", values)?,
            ..self.clone()
        };
        step.validate()?;
        Ok(step)
    }

    fn untrained(&self) -> Self {
        Self {
            common: self.common.untrained(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::selector::col;

    fn prep_bake(step: StepLog, values: Vec<f64>) -> Vec<f64> {
        let df = DataFrame::new()
            .with_column("x", Column::Numeric(values))
            .unwrap();
        let fitted = step.prep(&df, &Schema::from_frame(&df)).unwrap();
        fitted.bake(&df).unwrap().numeric("x").unwrap().to_vec()
    }

    #[test]
    fn test_base_ten_with_offset() {
        let out = prep_bake(
            StepLog::new(vec![col("x")]).base(10.0).offset(1.0),
            vec![9.0, 99.0],
        );
        assert!((out[0] - 1.0).abs() < 1e-12);
        assert!((out[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_signed_log() {
        let out = prep_bake(
            StepLog::new(vec![col("x")]).signed(true),
            vec![-std::f64::consts::E, 0.5, std::f64::consts::E],
        );
        assert!((out[0] + 1.0).abs() < 1e-12);
        assert_eq!(out[1], 0.0);
        assert!((out[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_base() {
        assert!(StepLog::new(vec![]).base(1.0).validate().is_err());
        assert!(StepLog::new(vec![]).base(-2.0).validate().is_err());
        assert!(StepLog::new(vec![]).base(Param::tune("b")).validate().is_ok());
    }
}
