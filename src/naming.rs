//! Output column naming shared by every step.
//!
//! Policy: a step never overwrites a column it does not own. If any
//! proposed output name already exists in the data, or the proposals
//! collide with each other, the step fails with
//! [`RecipeError::ColumnExists`] listing every offending name.

use crate::data::DataFrame;
use crate::error::RecipeError;

/// `<prefix><source>`, e.g. `right_relu_carbon`.
pub fn prefixed(prefix: &str, source: &str) -> String {
    format!("{}{}", prefix, source)
}

/// `<var>_<level>` with the level made identifier-safe.
pub fn indicator(var: &str, level: &str) -> String {
    format!("{}_{}", var, sanitize(level))
}

/// Replace characters that are awkward in column names with `_`.
pub fn sanitize(level: &str) -> String {
    let cleaned: String = level
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Check proposed output names against the current data.
///
/// # Errors
/// [`RecipeError::ColumnExists`] with every name that already exists in
/// `data` or appears more than once in `proposed`.
pub fn check_new_names(data: &DataFrame, proposed: &[String]) -> Result<(), RecipeError> {
    let mut clashes: Vec<String> = Vec::new();
    for (i, name) in proposed.iter().enumerate() {
        let repeated = proposed[..i].contains(name);
        if (data.contains(name) || repeated) && !clashes.contains(name) {
            clashes.push(name.clone());
        }
    }
    if clashes.is_empty() {
        Ok(())
    } else {
        Err(RecipeError::ColumnExists { columns: clashes })
    }
}
