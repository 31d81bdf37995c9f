//! Identifier-based row subsets

use geowrangle_core::models::value_text;
use geowrangle_core::{read_vector, Result, VectorDataset};
use std::collections::HashSet;
use std::path::Path;

/// Load the dataset at `path` and keep only rows whose `id_field` is in `ids`.
///
/// An empty `ids` slice returns the whole dataset.
pub fn load_subset<S: AsRef<str>>(path: &Path, ids: &[S], id_field: &str) -> Result<VectorDataset> {
    let dataset = read_vector(path)?;
    let subset = filter_by_ids(&dataset, ids, id_field)?;

    if !ids.is_empty() {
        tracing::info!(
            "Kept {} of {} features of {} by {}",
            subset.len(),
            dataset.len(),
            dataset.name,
            id_field
        );
    }

    Ok(subset)
}

/// Keep the rows whose `id_field` value, in text form, is one of `ids`
pub fn filter_by_ids<S: AsRef<str>>(
    dataset: &VectorDataset,
    ids: &[S],
    id_field: &str,
) -> Result<VectorDataset> {
    if ids.is_empty() {
        return Ok(dataset.clone());
    }

    dataset.require_field(id_field)?;
    let wanted: HashSet<&str> = ids.iter().map(AsRef::as_ref).collect();

    Ok(dataset.select(|_, feature| {
        feature
            .property(id_field)
            .and_then(value_text)
            .is_some_and(|id| wanted.contains(id.as_str()))
    }))
}
