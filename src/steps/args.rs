//! Loosely typed step arguments, as read from a recipe file.
//!
//! Every getter removes the key it reads; [`Args::finish`] then rejects
//! whatever the step did not consume.

use crate::error::RecipeError;
use crate::schema::Role;
use crate::tunable::{Param, ParamValue};
use serde_json::{Map, Value};

/// Argument map for [`crate::steps::Step::from_args`].
#[derive(Clone, Debug, Default)]
pub struct Args {
    map: Map<String, Value>,
}

impl Args {
    pub fn new(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// Read a possibly tunable parameter.
    pub fn param<T: ParamValue>(&mut self, name: &str) -> Result<Option<Param<T>>, RecipeError> {
        self.map
            .remove(name)
            .map(|v| Param::from_json(name, &v))
            .transpose()
    }

    /// Read a concrete value; placeholders are rejected.
    pub fn value<T: ParamValue>(&mut self, name: &str) -> Result<Option<T>, RecipeError> {
        match self.param::<T>(name)? {
            Some(Param::Value(v)) => Ok(Some(v)),
            Some(Param::Tune(_)) => Err(RecipeError::config(name, "cannot be tuned")),
            None => Ok(None),
        }
    }

    pub fn role(&mut self) -> Result<Option<Role>, RecipeError> {
        Ok(self.value::<String>("role")?.map(|r| Role::from(r.as_str())))
    }

    /// Fail on any argument nobody read.
    pub fn finish(self, kind: &str) -> Result<(), RecipeError> {
        match self.map.keys().next() {
            Some(key) => Err(RecipeError::config(
                key.as_str(),
                format!("unknown argument for step kind `{}`", kind),
            )),
            None => Ok(()),
        }
    }
}

impl From<Map<String, Value>> for Args {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map)
    }
}
