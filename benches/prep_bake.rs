use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use feature_recipes::selector::{all_nominal_predictors, all_numeric_predictors, col};
use feature_recipes::steps::{StepDummy, StepImpute, StepNormalize, StepRelu};
use feature_recipes::{Column, DataFrame, Recipe};

fn create_frame(n: usize) -> DataFrame {
    let cities = ["lima", "oslo", "paris", "rome"];
    DataFrame::from_columns([
        ("y", Column::Numeric((0..n).map(|i| i as f64 * 0.5).collect())),
        (
            "carbon",
            Column::Numeric(
                (0..n)
                    .map(|i| if i % 17 == 0 { f64::NAN } else { (i % 100) as f64 })
                    .collect(),
            ),
        ),
        ("hydrogen", Column::Numeric((0..n).map(|i| (i % 13) as f64 * 0.1).collect())),
        ("city", Column::nominal((0..n).map(|i| cities[i % cities.len()]))),
    ])
    .expect("bench frame")
}

fn create_recipe(template: &DataFrame) -> Recipe {
    Recipe::new(template)
        .with_outcomes(&["y"])
        .and_then(|r| r.add_step(StepImpute::new(vec![all_numeric_predictors()])))
        .and_then(|r| r.add_step(StepRelu::new(vec![col("carbon")]).shift(40.0)))
        .and_then(|r| r.add_step(StepDummy::new(vec![all_nominal_predictors()])))
        .and_then(|r| r.add_step(StepNormalize::new(vec![all_numeric_predictors()])))
        .expect("bench recipe")
}

fn bench_prep(c: &mut Criterion) {
    for size in [100, 1000, 10000, 100000].iter() {
        let data = create_frame(*size);
        let recipe = create_recipe(&data);
        c.bench_with_input(BenchmarkId::new("prep", size), size, |b, _| {
            b.iter(|| {
                let trained = recipe.prep(black_box(&data)).expect("prep");
                black_box(trained);
            });
        });
    }
}

fn bench_bake(c: &mut Criterion) {
    for size in [100, 1000, 10000, 100000].iter() {
        let data = create_frame(*size);
        let trained = create_recipe(&data).prep(&data).expect("prep");
        c.bench_with_input(BenchmarkId::new("bake", size), size, |b, _| {
            b.iter(|| {
                let baked = trained.bake(black_box(&data)).expect("bake");
                black_box(baked);
            });
        });
    }
}

criterion_group!(benches, bench_prep, bench_bake);
criterion_main!(benches);
