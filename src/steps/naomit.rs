//! Row removal for missing values.

use crate::data::{ColumnType, DataFrame};
use crate::error::RecipeError;
use crate::schema::Schema;
use crate::selector::Selector;
use crate::steps::{RecipeStep, StepCommon};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Drop every row with a missing value in any selected column.
///
/// Skipped by default: the filter shapes the training set only, and new
/// data keeps all of its rows unless the step is built with `skip(false)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepNaomit {
    common: StepCommon,
}

step_builders!(StepNaomit);

impl StepNaomit {
    pub fn new(selectors: Vec<Selector>) -> Self {
        let mut common = StepCommon::new(Self::KIND, selectors);
        common.skip = true;
        Self { common }
    }
}

impl RecipeStep for StepNaomit {
    const KIND: &'static str = "naomit";
    const REQUIRES: Option<ColumnType> = None;

    fn common(&self) -> &StepCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut StepCommon {
        &mut self.common
    }

    fn prep(&self, _data: &DataFrame, schema: &Schema) -> Result<Self, RecipeError> {
        let columns = self.begin_prep(schema)?;
        Ok(Self {
            common: self.common.trained_with(columns),
        })
    }

    fn bake(&self, data: &DataFrame) -> Result<DataFrame, RecipeError> {
        let columns = self.common.columns()?;
        let mut selected = Vec::with_capacity(columns.len());
        for name in columns {
            let column = data.column(name).ok_or_else(|| RecipeError::MissingColumns {
                columns: vec![name.clone()],
            })?;
            selected.push(column);
        }
        let keep: Vec<bool> = (0..data.n_rows())
            .map(|row| !selected.iter().any(|c| c.is_missing(row)))
            .collect();
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            debug!(step = %self.common.id, rows = dropped, "Dropped rows with missing values");
        }
        data.filter_rows(&keep)
    }

    fn params(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    fn untrained(&self) -> Self {
        Self {
            common: self.common.untrained(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::selector::everything;

    #[test]
    fn test_drops_rows_with_any_missing() {
        let df = DataFrame::from_columns([
            ("x", Column::Numeric(vec![1.0, f64::NAN, 3.0, 4.0])),
            ("city", Column::Nominal(vec![Some("a".into()), Some("b".into()), None, Some("d".into())])),
        ])
        .unwrap();
        let step = StepNaomit::new(vec![everything()]);
        assert!(step.common().skip);

        let fitted = step.prep(&df, &Schema::from_frame(&df)).unwrap();
        let out = fitted.bake(&df).unwrap();
        assert_eq!(out.n_rows(), 2);
        assert_eq!(out.numeric("x").unwrap(), &[1.0, 4.0]);
    }
}
