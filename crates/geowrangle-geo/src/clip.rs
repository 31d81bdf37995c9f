//! Clip-or-join: persist the part of a dataset that overlaps an area of interest

use geowrangle_core::config::DEFAULT_JOIN_ID_FIELD;
use geowrangle_core::{write_vector, GeowrangleError, Result, VectorDataset};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{join, overlay};

/// How the overlap with the area of interest is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapStrategy {
    /// Exact polygon intersection with merged attributes
    Intersection,
    /// Rows selected by identifier through an intersects join
    SpatialJoin,
}

impl fmt::Display for OverlapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapStrategy::Intersection => write!(f, "intersection"),
            OverlapStrategy::SpatialJoin => write!(f, "spatial join"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClipOptions {
    /// Start with the exact intersection instead of the join
    pub intersect: bool,
    /// Identifier column used by the join strategy
    pub id_field: String,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self { intersect: true, id_field: DEFAULT_JOIN_ID_FIELD.to_string() }
    }
}

impl ClipOptions {
    fn first_strategy(&self) -> OverlapStrategy {
        if self.intersect {
            OverlapStrategy::Intersection
        } else {
            OverlapStrategy::SpatialJoin
        }
    }
}

/// One failed attempt of the clip policy
#[derive(Debug)]
pub struct AttemptFailure {
    pub strategy: OverlapStrategy,
    pub error: GeowrangleError,
}

/// Result of [`clip_or_join`]
#[derive(Debug)]
pub enum ClipOutcome {
    Written { strategy: OverlapStrategy, features: usize, path: PathBuf },
    Failed { attempts: Vec<AttemptFailure> },
}

impl ClipOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, ClipOutcome::Written { .. })
    }

    /// Strategy that produced the output, if any did
    pub fn strategy(&self) -> Option<OverlapStrategy> {
        match self {
            ClipOutcome::Written { strategy, .. } => Some(*strategy),
            ClipOutcome::Failed { .. } => None,
        }
    }
}

/// Derive the overlap of `shape` with `aoi` and write it to `save_path`.
///
/// The requested strategy runs first. If it fails the spatial join is tried
/// exactly once, also when the join was the strategy that just failed, so a
/// transient write error gets a second chance. Errors are logged and
/// collected into [`ClipOutcome::Failed`] instead of returned. A file left
/// behind by a failed write is not removed.
pub fn clip_or_join(
    aoi: &VectorDataset,
    shape: &VectorDataset,
    save_path: &Path,
    options: &ClipOptions,
) -> ClipOutcome {
    let mut attempts = Vec::with_capacity(2);

    for strategy in [options.first_strategy(), OverlapStrategy::SpatialJoin] {
        match run_strategy(strategy, aoi, shape, save_path, &options.id_field) {
            Ok(features) => {
                tracing::info!(
                    "Wrote {} features to {} using {}",
                    features,
                    save_path.display(),
                    strategy
                );
                return ClipOutcome::Written { strategy, features, path: save_path.to_path_buf() };
            }
            Err(error) if attempts.is_empty() => {
                tracing::warn!("{} of {} failed: {}", strategy, shape.name, error);
                tracing::warn!("Trying a spatial join to compare polygon and point/line geometries");
                attempts.push(AttemptFailure { strategy, error });
            }
            Err(error) => {
                tracing::error!("{} of {} failed: {}", strategy, shape.name, error);
                tracing::error!("Error dumping to {}, giving up", save_path.display());
                attempts.push(AttemptFailure { strategy, error });
            }
        }
    }

    ClipOutcome::Failed { attempts }
}

fn run_strategy(
    strategy: OverlapStrategy,
    aoi: &VectorDataset,
    shape: &VectorDataset,
    save_path: &Path,
    id_field: &str,
) -> Result<usize> {
    tracing::info!("Intersecting {} with {} via {}", save_path.display(), aoi.name, strategy);

    let derived = match strategy {
        OverlapStrategy::Intersection => overlay::intersection(aoi, shape)?,
        OverlapStrategy::SpatialJoin => join::overlapping_rows(aoi, shape, id_field)?,
    };

    tracing::info!("Dumping to {}", save_path.display());
    write_vector(&derived, save_path)?;
    Ok(derived.len())
}
