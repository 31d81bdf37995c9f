//! Geowrangle Geo - Vector selection and overlay
//!
//! This crate holds the operations that combine or filter vector datasets:
//! identifier subsets, polygon intersection, and the intersects spatial join
//! used as a fallback when an exact overlay is not possible.

pub mod clip;
pub mod index;
pub mod join;
pub mod overlay;
pub mod subset;

pub use clip::{clip_or_join, AttemptFailure, ClipOptions, ClipOutcome, OverlapStrategy};
pub use subset::{filter_by_ids, load_subset};
