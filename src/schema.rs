//! Column roles and the schema snapshot that selectors are resolved against.
//!
//! A [`Schema`] lists every column present at one point in the pipeline
//! with its [`Role`] and [`ColumnType`]. The engine rebuilds it after each
//! step so that downstream selectors see derived columns.

use crate::data::{ColumnType, DataFrame};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The part a column plays in the modelling problem.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Predictor,
    Outcome,
    /// Any other label, e.g. `"id"` or `"case_weight"`.
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Predictor => "predictor",
            Role::Outcome => "outcome",
            Role::Other(s) => s,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "predictor" => Role::Predictor,
            "outcome" => Role::Outcome,
            other => Role::Other(other.to_string()),
        }
    }
}

/// Where a column came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// Present in the data the recipe was declared on.
    Original,
    /// Created by a step.
    Derived,
}

/// Metadata for one column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarInfo {
    pub name: String,
    pub role: Role,
    pub column_type: ColumnType,
    pub source: Source,
}

/// Ordered column metadata at one point in the pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    vars: Vec<VarInfo>,
}

impl Schema {
    /// Describe every column of `data` as an original predictor.
    pub fn from_frame(data: &DataFrame) -> Self {
        let vars = data
            .iter()
            .map(|(name, col)| VarInfo {
                name: name.to_string(),
                role: Role::Predictor,
                column_type: col.column_type(),
                source: Source::Original,
            })
            .collect();
        Self { vars }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VarInfo> + '_ {
        self.vars.iter()
    }

    pub fn get(&self, name: &str) -> Option<&VarInfo> {
        self.vars.iter().find(|v| v.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.vars.iter().map(|v| v.name.clone()).collect()
    }

    /// Whether any column carries `role`.
    pub fn has_role(&self, role: &Role) -> bool {
        self.vars.iter().any(|v| &v.role == role)
    }

    /// Names of columns carrying `role`, in order.
    pub fn names_with_role(&self, role: &Role) -> Vec<String> {
        self.vars
            .iter()
            .filter(|v| &v.role == role)
            .map(|v| v.name.clone())
            .collect()
    }

    pub(crate) fn set_role(&mut self, name: &str, role: Role) {
        if let Some(var) = self.vars.iter_mut().find(|v| v.name == name) {
            var.role = role;
        }
    }

    /// Snapshot of `data` after a step ran.
    ///
    /// Columns already known keep their role and source; columns the step
    /// created get `new_role` and [`Source::Derived`]; columns the step
    /// removed are dropped. Types are always re-read from `data`.
    pub fn rebuild(&self, data: &DataFrame, new_role: &Role) -> Schema {
        let vars = data
            .iter()
            .map(|(name, col)| match self.get(name) {
                Some(known) => VarInfo {
                    column_type: col.column_type(),
                    ..known.clone()
                },
                None => VarInfo {
                    name: name.to_string(),
                    role: new_role.clone(),
                    column_type: col.column_type(),
                    source: Source::Derived,
                },
            })
            .collect();
        Schema { vars }
    }
}
