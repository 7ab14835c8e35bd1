//! Tunable parameters: configuration values left open for an external search.
//!
//! Any step hyperparameter is stored as a [`Param<T>`]. A `Param::Tune`
//! placeholder carries a label; a tuning process enumerates placeholders
//! with [`crate::Recipe::tunables`], picks values, and substitutes them with
//! [`crate::Recipe::finalize`]. Prepping a recipe that still holds a
//! placeholder fails with [`RecipeError::UnresolvedTunable`].

use crate::error::RecipeError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Values for placeholders, keyed by placeholder label.
pub type TuneValues = BTreeMap<String, Value>;

/// A hyperparameter that is either concrete or a labelled placeholder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Param<T> {
    Value(T),
    Tune(String),
}

impl<T> Param<T> {
    /// A placeholder with the given label.
    pub fn tune(label: impl Into<String>) -> Self {
        Param::Tune(label.into())
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Param::Value(v) => Some(v),
            Param::Tune(_) => None,
        }
    }

    pub fn is_tune(&self) -> bool {
        matches!(self, Param::Tune(_))
    }

    /// The placeholder label, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Param::Value(_) => None,
            Param::Tune(label) => Some(label),
        }
    }

    /// The concrete value, or `UnresolvedTunable` naming `step` and `param`.
    pub fn require(&self, step: &str, param: &str) -> Result<&T, RecipeError> {
        self.value().ok_or_else(|| RecipeError::UnresolvedTunable {
            step: step.to_string(),
            param: param.to_string(),
        })
    }
}

impl<T> From<T> for Param<T> {
    fn from(value: T) -> Self {
        Param::Value(value)
    }
}

/// Types a parameter can hold, with their JSON encoding.
pub trait ParamValue: Sized + Clone {
    /// Name used in error messages.
    const TYPE_NAME: &'static str;

    fn from_json(value: &Value) -> Option<Self>;

    fn to_json(&self) -> Value;
}

impl ParamValue for f64 {
    const TYPE_NAME: &'static str = "number";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn to_json(&self) -> Value {
        json!(self)
    }
}

impl ParamValue for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn to_json(&self) -> Value {
        json!(self)
    }
}

impl ParamValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn to_json(&self) -> Value {
        json!(self)
    }
}

impl<T: ParamValue> Param<T> {
    /// Decode a parameter from JSON.
    ///
    /// `{"tune": "label"}` becomes a placeholder and skips type validation;
    /// anything else must decode as `T`.
    pub fn from_json(param: &str, value: &Value) -> Result<Self, RecipeError> {
        if let Some(label) = value.get("tune") {
            return match label.as_str() {
                Some(label) => Ok(Param::Tune(label.to_string())),
                None => Err(RecipeError::config(param, "tune label must be a string")),
            };
        }
        T::from_json(value).map(Param::Value).ok_or_else(|| {
            RecipeError::config(param, format!("expected a {}, got {}", T::TYPE_NAME, value))
        })
    }

    pub fn to_json(&self) -> Value {
        match self {
            Param::Value(v) => v.to_json(),
            Param::Tune(label) => json!({ "tune": label }),
        }
    }

    /// Substitute a placeholder from `values`.
    ///
    /// Placeholders whose label is absent from `values` are kept as is.
    ///
    /// # Errors
    /// [`RecipeError::Config`] if the supplied value has the wrong type.
    pub fn finalize(&self, param: &str, values: &TuneValues) -> Result<Self, RecipeError> {
        match self {
            Param::Tune(label) => match values.get(label) {
                Some(v) => T::from_json(v).map(Param::Value).ok_or_else(|| {
                    RecipeError::config(
                        param,
                        format!("expected a {} for `{}`, got {}", T::TYPE_NAME, label, v),
                    )
                }),
                None => Ok(self.clone()),
            },
            Param::Value(_) => Ok(self.clone()),
        }
    }
}

/// The range of values a tunable parameter may take.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamDomain {
    /// A real number within optional bounds.
    Real {
        lower: Option<f64>,
        upper: Option<f64>,
    },
    Boolean,
    /// One of a fixed set of numbers.
    Discrete(Vec<f64>),
}

/// One placeholder found in a recipe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TunableParam {
    /// Id of the step holding the placeholder.
    pub step_id: String,
    /// Name of the step argument.
    pub param: String,
    /// Placeholder label; the key expected in [`TuneValues`].
    pub label: String,
    pub domain: ParamDomain,
}

impl TunableParam {
    pub(crate) fn collect<T>(
        out: &mut Vec<TunableParam>,
        step_id: &str,
        param: &str,
        value: &Param<T>,
        domain: ParamDomain,
    ) {
        if let Param::Tune(label) = value {
            out.push(TunableParam {
                step_id: step_id.to_string(),
                param: param.to_string(),
                label: label.clone(),
                domain,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_reports_step_and_param() {
        let p: Param<f64> = Param::tune("shift");
        let err = p.require("relu_abc", "shift").unwrap_err();
        assert!(matches!(
            err,
            RecipeError::UnresolvedTunable { ref step, ref param } if step == "relu_abc" && param == "shift"
        ));
    }

    #[test]
    fn test_from_json_placeholder_bypasses_type_check() {
        let p = Param::<f64>::from_json("shift", &json!({"tune": "my_shift"})).unwrap();
        assert_eq!(p.label(), Some("my_shift"));

        let bad = Param::<f64>::from_json("shift", &json!("forty"));
        assert!(matches!(bad, Err(RecipeError::Config { .. })));

        let ok = Param::<bool>::from_json("reverse", &json!(true)).unwrap();
        assert_eq!(ok, Param::Value(true));
    }

    #[test]
    fn test_finalize_validates_type() {
        let p: Param<bool> = Param::tune("flag");
        let mut values = TuneValues::new();
        values.insert("flag".to_string(), json!(1.5));
        assert!(p.finalize("smooth", &values).is_err());

        values.insert("flag".to_string(), json!(true));
        assert_eq!(p.finalize("smooth", &values).unwrap(), Param::Value(true));
    }

    #[test]
    fn test_finalize_keeps_unknown_labels() {
        let p: Param<f64> = Param::tune("other");
        let out = p.finalize("shift", &TuneValues::new()).unwrap();
        assert!(out.is_tune());
    }
}
