//! Indicator (dummy) variables for nominal columns.
//!
//! Levels are learned from the training data and sorted. By default the
//! first level is the reference and gets no column; with `one_hot` every
//! level gets one. Each source column is replaced by its indicator columns
//! `<column>_<level>`, appended at the end of the table.
//!
//! Missing values and levels never seen in training bake to `NaN` in every
//! indicator column of that row.

use crate::data::{Column, ColumnType, DataFrame};
use crate::error::RecipeError;
use crate::naming;
use crate::schema::Schema;
use crate::selector::Selector;
use crate::steps::{Args, EmptyPolicy, RecipeStep, StepCommon};
use crate::tunable::{Param, ParamDomain, TunableParam, TuneValues};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepDummy {
    common: StepCommon,
    one_hot: Param<bool>,
    /// Sorted training levels per column.
    levels: Option<Vec<Vec<String>>>,
}

step_builders!(StepDummy);

impl StepDummy {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self {
            common: StepCommon::new(Self::KIND, selectors),
            one_hot: Param::Value(false),
            levels: None,
        }
    }

    /// Keep a column for every level instead of dropping the first.
    pub fn one_hot(mut self, one_hot: impl Into<Param<bool>>) -> Self {
        self.one_hot = one_hot.into();
        self
    }

    pub fn levels(&self) -> Option<&[Vec<String>]> {
        self.levels.as_deref()
    }

    pub(crate) fn from_args(selectors: Vec<Selector>, args: &mut Args) -> Result<Self, RecipeError> {
        let mut step = Self::new(selectors);
        if let Some(one_hot) = args.param("one_hot")? {
            step.one_hot = one_hot;
        }
        Ok(step)
    }

    /// Levels that get an indicator column.
    fn encoded<'a>(levels: &'a [String], one_hot: bool) -> &'a [String] {
        if one_hot || levels.is_empty() {
            levels
        } else {
            &levels[1..]
        }
    }
}

impl RecipeStep for StepDummy {
    const KIND: &'static str = "dummy";
    const REQUIRES: Option<ColumnType> = Some(ColumnType::Nominal);
    const EMPTY: EmptyPolicy = EmptyPolicy::Error;

    fn common(&self) -> &StepCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StepCommon {
        &mut self.common
    }

    fn prep(&self, data: &DataFrame, schema: &Schema) -> Result<Self, RecipeError> {
        let columns = self.begin_prep(schema)?;
        let mut levels: Vec<Vec<String>> = Vec::with_capacity(columns.len());
        for name in &columns {
            let values = nominal(data, name)?;
            let seen: BTreeSet<&str> = values.iter().flatten().map(String::as_str).collect();
            levels.push(seen.into_iter().map(str::to_string).collect());
        }
        Ok(Self {
            common: self.common.trained_with(columns),
            levels: Some(levels),
            ..self.clone()
        })
    }

    fn bake(&self, data: &DataFrame) -> Result<DataFrame, RecipeError> {
        let columns = self.common.columns()?;
        let one_hot = *self.one_hot.require(&self.common.id, "one_hot")?;
        let levels = self.common.learned(&self.levels)?;

        let missing = data.missing_columns(columns);
        if !missing.is_empty() {
            return Err(RecipeError::MissingColumns { columns: missing });
        }

        let mut out = data.clone();
        for name in columns {
            out.remove_column(name);
        }
        let names: Vec<String> = columns
            .iter()
            .zip(levels)
            .flat_map(|(c, lv)| {
                Self::encoded(lv, one_hot)
                    .iter()
                    .map(move |l| naming::indicator(c, l))
            })
            .collect();
        naming::check_new_names(&out, &names)?;

        let mut names = names.into_iter();
        for (name, lv) in columns.iter().zip(levels) {
            let values = nominal(data, name)?;
            let unseen = values
                .iter()
                .flatten()
                .filter(|v| lv.binary_search(v).is_err())
                .count();
            if unseen > 0 {
                warn!(
                    step = %self.common.id,
                    column = %name,
                    rows = unseen,
                    "Levels not seen in training; indicators set to missing"
                );
            }
            for level in Self::encoded(lv, one_hot) {
                let indicator: Vec<f64> = values
                    .iter()
                    .map(|v| match v {
                        Some(v) if lv.binary_search(v).is_ok() => {
                            if v == level {
                                1.0
                            } else {
                                0.0
                            }
                        }
                        _ => f64::NAN,
                    })
                    .collect();
                if let Some(new_name) = names.next() {
                    out.insert_column(new_name, Column::Numeric(indicator))?;
                }
            }
        }
        Ok(out)
    }

    fn params(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([("one_hot".to_string(), self.one_hot.to_json())])
    }

    fn statistics(&self) -> BTreeMap<String, Value> {
        match (&self.common.columns, &self.levels) {
            (Some(columns), Some(levels)) => {
                let map: Map<String, Value> = columns
                    .iter()
                    .zip(levels)
                    .map(|(c, lv)| (c.clone(), json!(lv)))
                    .collect();
                BTreeMap::from([("levels".to_string(), Value::Object(map))])
            }
            _ => BTreeMap::new(),
        }
    }

    fn tunables(&self) -> Vec<TunableParam> {
        let mut out = Vec::new();
        TunableParam::collect(
            &mut out,
            &self.common.id,
            "one_hot",
            &self.one_hot,
            ParamDomain::Boolean,
        );
        out
    }

    fn finalize(&self, values: &TuneValues) -> Result<Self, RecipeError> {
        Ok(Self {
            one_hot: self.one_hot.finalize("one_hot", values)?,
            ..self.clone()
        })
    }

    fn untrained(&self) -> Self {
        Self {
            common: self.common.untrained(),
            levels: None,
            ..self.clone()
        }
    }
}

fn nominal<'a>(data: &'a DataFrame, name: &str) -> Result<&'a [Option<String>], RecipeError> {
    let column = data.column(name).ok_or_else(|| RecipeError::MissingColumns {
        columns: vec![name.to_string()],
    })?;
    column.as_nominal().ok_or_else(|| RecipeError::TypeMismatch {
        column: name.to_string(),
        expected: ColumnType::Nominal.to_string(),
        found: column.column_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{all_nominal, col};

    fn create_test_frame() -> DataFrame {
        DataFrame::from_columns([
            ("city", Column::nominal(["paris", "oslo", "paris", "lima"])),
            ("x", Column::Numeric(vec![1.0, 2.0, 3.0, 4.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_reference_level_dropped() {
        let df = create_test_frame();
        let fitted = StepDummy::new(vec![col("city")])
            .prep(&df, &Schema::from_frame(&df))
            .unwrap();
        assert_eq!(
            fitted.levels().unwrap()[0],
            vec!["lima", "oslo", "paris"]
        );

        let out = fitted.bake(&df).unwrap();
        let names: Vec<&str> = out.column_names().collect();
        assert_eq!(names, vec!["x", "city_oslo", "city_paris"]);
        assert_eq!(out.numeric("city_paris").unwrap(), &[1.0, 0.0, 1.0, 0.0]);
        assert_eq!(out.numeric("city_oslo").unwrap(), &[0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_one_hot_keeps_every_level() {
        let df = create_test_frame();
        let out = StepDummy::new(vec![col("city")])
            .one_hot(true)
            .prep(&df, &Schema::from_frame(&df))
            .unwrap()
            .bake(&df)
            .unwrap();
        assert!(out.contains("city_lima"));
        assert_eq!(out.n_cols(), 4);
    }

    #[test]
    fn test_unseen_level_is_missing() {
        let df = create_test_frame();
        let fitted = StepDummy::new(vec![col("city")])
            .prep(&df, &Schema::from_frame(&df))
            .unwrap();
        let new = DataFrame::from_columns([
            ("city", Column::nominal(["rome", "oslo"])),
            ("x", Column::Numeric(vec![0.0, 0.0])),
        ])
        .unwrap();
        let out = fitted.bake(&new).unwrap();
        let oslo = out.numeric("city_oslo").unwrap();
        assert!(oslo[0].is_nan());
        assert_eq!(oslo[1], 1.0);
    }

    #[test]
    fn test_empty_selection_is_an_error() {
        let df = DataFrame::new()
            .with_column("x", Column::Numeric(vec![1.0]))
            .unwrap();
        let result = StepDummy::new(vec![all_nominal()]).prep(&df, &Schema::from_frame(&df));
        assert!(matches!(result, Err(RecipeError::EmptySelection { .. })));
    }

    #[test]
    fn test_numeric_column_rejected() {
        let df = create_test_frame();
        let result = StepDummy::new(vec![col("x")]).prep(&df, &Schema::from_frame(&df));
        assert!(matches!(result, Err(RecipeError::TypeMismatch { column, .. }) if column == "x"));
    }
}
