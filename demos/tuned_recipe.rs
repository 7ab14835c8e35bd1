//! A recipe file with a tunable hinge, resolved by a small grid search.
//!
//! Run with: cargo run --example tuned_recipe

use feature_recipes::{Column, DataFrame, RecipeError, RecipeSpec, TuneValues};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RECIPE: &str = r#"
outcomes = ["y"]

[[step]]
kind = "impute"
columns = ["all_numeric_predictors()"]
strategy = "median"

[[step]]
kind = "relu"
columns = ["x"]
shift = { tune = "knot" }

[[step]]
kind = "dummy"
columns = ["all_nominal_predictors()"]
"#;

/// Correlation of the hinge feature with the outcome.
fn score(data: &DataFrame) -> Result<f64, RecipeError> {
    let x = data.numeric("right_relu_x")?;
    let y = data.numeric("y")?;
    let n = x.len() as f64;
    let (mx, my) = (x.iter().sum::<f64>() / n, y.iter().sum::<f64>() / n);
    let cov: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let sx = x.iter().map(|a| (a - mx).powi(2)).sum::<f64>().sqrt();
    let sy = y.iter().map(|b| (b - my).powi(2)).sum::<f64>().sqrt();
    Ok(if sx > 0.0 { cov / (sx * sy) } else { 0.0 })
}

fn main() -> Result<(), RecipeError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tuned_recipe=info,feature_recipes=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let xs: Vec<f64> = (0..40).map(|i| i as f64).collect();
    let ys: Vec<f64> = xs.iter().map(|x| (x - 25.0).max(0.0) * 2.0 + 1.0).collect();
    let groups = (0..40).map(|i| if i % 2 == 0 { "even" } else { "odd" });
    let train = DataFrame::from_columns([
        ("y", Column::Numeric(ys)),
        ("x", Column::Numeric(xs)),
        ("group", Column::nominal(groups)),
    ])?;

    let recipe = RecipeSpec::from_toml_str(RECIPE)?.build(&train)?;
    for param in recipe.tunables() {
        info!(step = %param.step_id, param = %param.param, label = %param.label, "Tunable");
    }

    let mut best = (f64::NEG_INFINITY, 0.0);
    for knot in [5.0, 15.0, 25.0, 35.0] {
        let values = TuneValues::from([("knot".to_string(), json!(knot))]);
        let trained = recipe.finalize(&values)?.prep(&train)?;
        let s = score(&trained.juice()?)?;
        info!(knot, score = s, "Evaluated");
        if s > best.0 {
            best = (s, knot);
        }
    }
    println!("best knot: {} (correlation {:.4})", best.1, best.0);
    Ok(())
}
