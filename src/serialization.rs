//! Binary persistence of recipes and steps.
//!
//! Everything a trained recipe holds (steps, learned statistics, roles,
//! placeholders and the retained training set) round-trips through
//! [`Persist`] unchanged, including `NaN` values.

use crate::data::DataFrame;
use crate::error::RecipeError;
use crate::recipe::Recipe;
use crate::steps::Step;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Byte and file round trips via bincode.
pub trait Persist: Serialize + DeserializeOwned {
    /// Serialize into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, RecipeError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, RecipeError> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), RecipeError> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RecipeError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl Persist for Recipe {}
impl Persist for Step {}
impl Persist for DataFrame {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::selector::col;
    use crate::steps::{StepCenter, StepRelu};
    use crate::tunable::Param;

    fn create_test_frame() -> DataFrame {
        DataFrame::from_columns([
            ("carbon", Column::Numeric(vec![10.0, f64::NAN, 90.0])),
            ("city", Column::nominal(["a", "b", "c"])),
        ])
        .unwrap()
    }

    #[test]
    fn test_trained_recipe_roundtrip() {
        let df = create_test_frame();
        let trained = Recipe::new(&df)
            .add_step(StepCenter::new(vec![col("carbon")]))
            .unwrap()
            .prep(&df)
            .unwrap();

        let restored = Recipe::from_bytes(&trained.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.steps(), trained.steps());
        assert_eq!(restored.term_schema(), trained.term_schema());
        assert!(restored.bake(&df).unwrap().bit_eq(&trained.bake(&df).unwrap()));
        assert!(restored.juice().unwrap().bit_eq(&trained.juice().unwrap()));
    }

    #[test]
    fn test_placeholders_survive() {
        let df = create_test_frame();
        let recipe = Recipe::new(&df)
            .add_step(StepRelu::new(vec![col("carbon")]).shift(Param::tune("cut")))
            .unwrap();
        let restored = Recipe::from_bytes(&recipe.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, recipe);
        assert_eq!(restored.tunables().count(), 1);
    }

    #[test]
    fn test_file_roundtrip() {
        let df = create_test_frame();
        let path = std::env::temp_dir().join(format!("recipe_{}.bin", std::process::id()));
        df.save_to_file(&path).unwrap();
        let loaded = DataFrame::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(loaded.bit_eq(&df));
    }

    #[test]
    fn test_garbage_bytes() {
        let result = Recipe::from_bytes(&[0xff, 0x01]);
        assert!(matches!(result, Err(RecipeError::Serialization(_))));
    }
}
