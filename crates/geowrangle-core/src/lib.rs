//! Geowrangle Core - Data model, vector formats, and configuration
//!
//! This crate holds the types shared by every geowrangle routine and the
//! readers/writers that move vector datasets between disk and memory.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;

#[cfg(feature = "gdb")]
pub mod geodatabase;

pub use error::{GeowrangleError, Result};
pub use formats::{read_vector, write_vector};
pub use models::{Crs, Feature, FieldDef, FieldKind, VectorDataset};
