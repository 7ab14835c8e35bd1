//! Rectified-linear (hinge) features.
//!
//! For each selected column `x` a new column `<prefix>x` is appended with
//! `max(x - shift, 0)`, or `max(shift - x, 0)` when `reverse` is set. With
//! `smooth` the hinge is replaced by the softplus `ln(1 + e^(x - shift))`.
//!
//! The prefix defaults to `right_relu_`, and to `left_relu_` for reversed
//! hinges. An explicitly chosen prefix other than `right_relu_` is kept as
//! given.

use crate::data::{Column, ColumnType, DataFrame};
use crate::error::RecipeError;
use crate::naming;
use crate::schema::Schema;
use crate::selector::Selector;
use crate::steps::{Args, RecipeStep, StepCommon};
use crate::tunable::{Param, ParamDomain, TunableParam, TuneValues};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const RIGHT_PREFIX: &str = "right_relu_";
pub const LEFT_PREFIX: &str = "left_relu_";

/// Hinge transform of numeric columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRelu {
    common: StepCommon,
    shift: Param<f64>,
    reverse: Param<bool>,
    smooth: Param<bool>,
    prefix: String,
}

step_builders!(StepRelu);

impl StepRelu {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self {
            common: StepCommon::new(Self::KIND, selectors),
            shift: Param::Value(0.0),
            reverse: Param::Value(false),
            smooth: Param::Value(false),
            prefix: RIGHT_PREFIX.to_string(),
        }
    }

    /// Knot of the hinge. Any number but NaN; infinite knots give a constant
    /// zero or infinite feature.
    pub fn shift(mut self, shift: impl Into<Param<f64>>) -> Self {
        self.shift = shift.into();
        self
    }

    pub fn reverse(mut self, reverse: impl Into<Param<bool>>) -> Self {
        self.reverse = reverse.into();
        self
    }

    pub fn smooth(mut self, smooth: impl Into<Param<bool>>) -> Self {
        self.smooth = smooth.into();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub(crate) fn from_args(selectors: Vec<Selector>, args: &mut Args) -> Result<Self, RecipeError> {
        let mut step = Self::new(selectors);
        if let Some(shift) = args.param("shift")? {
            step.shift = shift;
        }
        if let Some(reverse) = args.param("reverse")? {
            step.reverse = reverse;
        }
        if let Some(smooth) = args.param("smooth")? {
            step.smooth = smooth;
        }
        if let Some(prefix) = args.value("prefix")? {
            step.prefix = prefix;
        }
        Ok(step)
    }

    /// Prefix actually used for output names, once `reverse` is known.
    pub fn output_prefix(&self) -> Option<&str> {
        match self.reverse {
            Param::Value(true) if self.prefix == RIGHT_PREFIX => Some(LEFT_PREFIX),
            Param::Value(_) => Some(self.prefix.as_str()),
            Param::Tune(_) => None,
        }
    }
}

/// `ln(1 + e^x)` without overflow for large `x`.
pub(crate) fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

fn hinge(x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else {
        x.max(0.0)
    }
}

impl RecipeStep for StepRelu {
    const KIND: &'static str = "relu";
    const REQUIRES: Option<ColumnType> = Some(ColumnType::Numeric);

    fn common(&self) -> &StepCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StepCommon {
        &mut self.common
    }

    fn validate(&self) -> Result<(), RecipeError> {
        if let Param::Value(shift) = self.shift {
            if shift.is_nan() {
                return Err(RecipeError::config("shift", "must be a number, not NaN"));
            }
        }
        if self.prefix.is_empty() {
            return Err(RecipeError::config("prefix", "must not be empty"));
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
        let id = self.common.id.as_str();
        let shift = *self.shift.require(id, "shift")?;
        let reverse = *self.reverse.require(id, "reverse")?;
        let smooth = *self.smooth.require(id, "smooth")?;
        let prefix = self.output_prefix().unwrap_or(self.prefix.as_str());

        let names: Vec<String> = columns
            .iter()
            .map(|c| naming::prefixed(prefix, c))
            .collect();
        naming::check_new_names(data, &names)?;

        let mut out = data.clone();
        for (source, name) in columns.iter().zip(names) {
            let values: Vec<f64> = data
                .numeric(source)?
                .iter()
                .map(|&x| {
                    let shifted = if reverse { shift - x } else { x - shift };
                    if smooth {
                        softplus(shifted)
                    } else {
                        hinge(shifted)
                    }
                })
                .collect();
            out.insert_column(name, Column::Numeric(values))?;
        }
        Ok(out)
    }

    fn params(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("shift".to_string(), self.shift.to_json()),
            ("reverse".to_string(), self.reverse.to_json()),
            ("smooth".to_string(), self.smooth.to_json()),
            (
                "prefix".to_string(),
                json!(self.output_prefix().unwrap_or(self.prefix.as_str())),
            ),
        ])
    }

    fn tunables(&self) -> Vec<TunableParam> {
        let id = &self.common.id;
        let mut out = Vec::new();
        TunableParam::collect(
            &mut out,
            id,
            "shift",
            &self.shift,
            ParamDomain::Real {
                lower: None,
                upper: None,
            },
        );
        TunableParam::collect(&mut out, id, "reverse", &self.reverse, ParamDomain::Boolean);
        TunableParam::collect(&mut out, id, "smooth", &self.smooth, ParamDomain::Boolean);
        out
    }

    fn finalize(&self, values: &TuneValues) -> Result<Self, RecipeError> {
        let step = Self {
            shift: self.shift.finalize("shift", values)?,
            reverse: self.reverse.finalize("reverse", values)?,
            smooth: self.smooth.finalize("smooth", values)?,
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
    use crate::selector::col;

    fn carbon() -> DataFrame {
        DataFrame::new()
            .with_column("carbon", Column::Numeric(vec![10.0, 50.0, 90.0]))
            .unwrap()
    }

    fn prep_bake(step: StepRelu, df: &DataFrame) -> DataFrame {
        let fitted = step.prep(df, &Schema::from_frame(df)).unwrap();
        fitted.bake(df).unwrap()
    }

    #[test]
    fn test_hard_hinge() {
        let df = carbon();
        let out = prep_bake(StepRelu::new(vec![col("carbon")]).shift(40.0), &df);
        assert_eq!(out.numeric("right_relu_carbon").unwrap(), &[0.0, 10.0, 50.0]);
        assert_eq!(out.numeric("carbon").unwrap(), &[10.0, 50.0, 90.0]);
    }

    #[test]
    fn test_reverse_hinge_switches_default_prefix() {
        let df = carbon();
        let out = prep_bake(
            StepRelu::new(vec![col("carbon")]).shift(40.0).reverse(true),
            &df,
        );
        assert_eq!(out.numeric("left_relu_carbon").unwrap(), &[30.0, 0.0, 0.0]);
        assert!(!out.contains("right_relu_carbon"));
    }

    #[test]
    fn test_explicit_prefix_survives_reverse() {
        let df = carbon();
        let out = prep_bake(
            StepRelu::new(vec![col("carbon")])
                .shift(40.0)
                .reverse(true)
                .prefix("hinge_"),
            &df,
        );
        assert_eq!(out.numeric("hinge_carbon").unwrap(), &[30.0, 0.0, 0.0]);
    }

    #[test]
    fn test_smooth_at_zero_is_ln2() {
        let df = DataFrame::new()
            .with_column("x", Column::Numeric(vec![0.0]))
            .unwrap();
        let out = prep_bake(StepRelu::new(vec![col("x")]).smooth(true), &df);
        let v = out.numeric("right_relu_x").unwrap()[0];
        assert!((v - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_softplus_is_stable() {
        assert!((softplus(1000.0) - 1000.0).abs() < 1e-9);
        assert!(softplus(-1000.0) >= 0.0);
        assert!(softplus(-1000.0) < 1e-300);
    }

    #[test]
    fn test_missing_values_stay_missing() {
        let df = DataFrame::new()
            .with_column("x", Column::Numeric(vec![f64::NAN, 5.0]))
            .unwrap();
        let out = prep_bake(StepRelu::new(vec![col("x")]), &df);
        let values = out.numeric("right_relu_x").unwrap();
        assert!(values[0].is_nan());
        assert_eq!(values[1], 5.0);
    }

    #[test]
    fn test_nominal_column_is_rejected() {
        let df = DataFrame::new()
            .with_column("city", Column::nominal(["a", "b"]))
            .unwrap();
        let result = StepRelu::new(vec![col("city")]).prep(&df, &Schema::from_frame(&df));
        assert!(matches!(result, Err(RecipeError::TypeMismatch { column, .. }) if column == "city"));
    }

    #[test]
    fn test_output_collision_is_rejected() {
        let df = carbon()
            .with_column("right_relu_carbon", Column::Numeric(vec![0.0; 3]))
            .unwrap();
        let fitted = StepRelu::new(vec![col("carbon")])
            .prep(&df, &Schema::from_frame(&df))
            .unwrap();
        let result = fitted.bake(&df);
        assert!(matches!(result, Err(RecipeError::ColumnExists { .. })));
    }

    #[test]
    fn test_placeholders_block_prep_until_finalized() {
        let df = carbon();
        let step = StepRelu::new(vec![col("carbon")]).shift(Param::tune("cut"));
        let tunables = step.tunables();
        assert_eq!(tunables.len(), 1);
        assert_eq!(tunables[0].param, "shift");
        assert_eq!(tunables[0].label, "cut");

        let result = step.prep(&df, &Schema::from_frame(&df));
        assert!(matches!(result, Err(RecipeError::UnresolvedTunable { param, .. }) if param == "shift"));

        let values = TuneValues::from([("cut".to_string(), json!(40))]);
        let out = prep_bake(step.finalize(&values).unwrap(), &df);
        assert_eq!(out.numeric("right_relu_carbon").unwrap(), &[0.0, 10.0, 50.0]);
    }

    #[test]
    fn test_nan_shift_is_rejected() {
        let step = StepRelu::new(vec![col("x")]).shift(f64::NAN);
        assert!(matches!(step.validate(), Err(RecipeError::Config { .. })));
    }

    #[test]
    fn test_infinite_shift_is_accepted() {
        let step = StepRelu::new(vec![col("carbon")]).shift(f64::INFINITY);
        assert!(step.validate().is_ok());
        let out = prep_bake(step, &carbon());
        assert_eq!(out.numeric("right_relu_carbon").unwrap(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_nominal_column_is_rejected_at_bake() {
        let fitted = StepRelu::new(vec![col("carbon")])
            .prep(&carbon(), &Schema::from_frame(&carbon()))
            .unwrap();
        let relabelled = DataFrame::new()
            .with_column("carbon", Column::nominal(["low", "mid", "high"]))
            .unwrap();
        let result = fitted.bake(&relabelled);
        assert!(matches!(result, Err(RecipeError::TypeMismatch { column, .. }) if column == "carbon"));
    }
}
