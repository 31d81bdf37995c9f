pub mod dataset;
pub mod geometry;

pub use dataset::{value_text, Feature, FieldDef, FieldKind, VectorDataset};
pub use geometry::{Crs, GeometryType};
