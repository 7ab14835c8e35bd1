//! Declarative feature-engineering recipes.
//!
//! A [`Recipe`] is an ordered list of transformation steps declared over the
//! columns of a template frame. [`Recipe::prep`] estimates every step's
//! statistics once, from training data; [`Recipe::bake`] replays the frozen
//! steps on any later data.
//!
//! - [`data`]: the column-oriented [`DataFrame`] steps operate on
//! - [`selector`]: symbolic column selection (`all_numeric_predictors()`, `-id`, ...)
//! - [`steps`]: the step contract and the built-in step kinds
//! - [`tunable`]: placeholders for hyperparameters chosen by an outer search
//! - [`recipe`]: the recipe value, the prep/bake engine and recipe files
//! - [`serialization`]: binary persistence of trained recipes
//!
//! # Example
//! ```
//! use feature_recipes::data::{Column, DataFrame};
//! use feature_recipes::selector::{all_numeric_predictors, col};
//! use feature_recipes::steps::{StepNormalize, StepRelu};
//! use feature_recipes::Recipe;
//!
//! let train = DataFrame::from_columns([
//!     ("y", Column::Numeric(vec![1.0, 2.0, 3.0])),
//!     ("carbon", Column::Numeric(vec![10.0, 50.0, 90.0])),
//! ])
//! .unwrap();
//!
//! let recipe = Recipe::new(&train)
//!     .with_outcomes(&["y"])
//!     .unwrap()
//!     .add_step(StepRelu::new(vec![col("carbon")]).shift(40.0))
//!     .unwrap()
//!     .add_step(StepNormalize::new(vec![all_numeric_predictors()]))
//!     .unwrap();
//!
//! let trained = recipe.prep(&train).unwrap();
//! let baked = trained.bake(&train).unwrap();
//! assert_eq!(baked.n_cols(), 3);
//! ```

pub mod data;
pub mod error;
pub mod naming;
pub mod recipe;
pub mod schema;
pub mod selector;
pub mod serialization;
pub mod steps;
pub mod tunable;

pub use data::{Column, ColumnType, DataFrame};
pub use error::RecipeError;
pub use recipe::{BakeOptions, BakeTarget, PrepOptions, Recipe, RecipeSpec};
pub use schema::{Role, Schema};
pub use selector::Selector;
pub use serialization::Persist;
pub use steps::{RecipeStep, Step, StepReport};
pub use tunable::{Param, ParamDomain, TunableParam, TuneValues};
