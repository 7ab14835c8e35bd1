//! Hinge features on a small chemistry table.
//!
//! Run with: cargo run --example relu_hinge
//! Set RUST_LOG=feature_recipes=debug to see each step.

use feature_recipes::selector::{all_numeric_predictors, col};
use feature_recipes::steps::{StepNormalize, StepRelu};
use feature_recipes::{Column, DataFrame, Recipe, RecipeError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), RecipeError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feature_recipes=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let train = DataFrame::from_columns([
        ("hhv", Column::Numeric(vec![18.2, 19.1, 20.4, 21.8, 17.5])),
        ("carbon", Column::Numeric(vec![10.0, 50.0, 90.0, 45.0, 30.0])),
        ("hydrogen", Column::Numeric(vec![5.1, 5.9, 6.3, 6.0, 5.5])),
    ])?;

    let recipe = Recipe::new(&train)
        .with_outcomes(&["hhv"])?
        .add_step(StepRelu::new(vec![col("carbon")]).shift(40.0))?
        .add_step(StepRelu::new(vec![col("carbon")]).shift(40.0).reverse(true))?
        .add_step(StepNormalize::new(vec![all_numeric_predictors()]))?;

    let trained = recipe.prep(&train)?;
    for report in trained.tidy() {
        println!("{:<10} {:<18} {:?}", report.kind, report.id, report.terms);
    }

    let new = DataFrame::from_columns([
        ("hhv", Column::Numeric(vec![f64::NAN, f64::NAN])),
        ("carbon", Column::Numeric(vec![20.0, 70.0])),
        ("hydrogen", Column::Numeric(vec![5.4, 6.1])),
    ])?;
    let baked = trained.bake(&new)?;
    for (name, column) in baked.iter() {
        println!("{:<18} {:?}", name, column);
    }
    Ok(())
}
