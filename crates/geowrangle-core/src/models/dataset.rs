use geo::{BoundingRect, Geometry, Rect};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::geometry::{Crs, GeometryType};
use crate::error::{GeowrangleError, Result};

/// Attribute column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text { width: u8 },
    Float { width: u8, decimals: u8 },
    Integer,
    Boolean,
    Date,
}

impl FieldKind {
    /// Widest text column a dBase table can hold
    pub const MAX_TEXT_WIDTH: u8 = 254;

    /// Guess the column kind from a sample value
    pub fn infer(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(FieldKind::Text {
                width: s.chars().count().clamp(1, Self::MAX_TEXT_WIDTH as usize) as u8,
            }),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(FieldKind::Integer),
            Value::Number(_) => Some(FieldKind::Float { width: 24, decimals: 15 }),
            Value::Bool(_) => Some(FieldKind::Boolean),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Widen this kind so it can also hold `other`
    pub fn merge(self, other: FieldKind) -> FieldKind {
        match (self, other) {
            (FieldKind::Text { width: a }, FieldKind::Text { width: b }) => {
                FieldKind::Text { width: a.max(b) }
            }
            (FieldKind::Integer, FieldKind::Float { width, decimals })
            | (FieldKind::Float { width, decimals }, FieldKind::Integer) => {
                FieldKind::Float { width, decimals }
            }
            (a, b) if a == b => a,
            _ => FieldKind::Text { width: Self::MAX_TEXT_WIDTH },
        }
    }
}

/// Attribute column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind }
    }

    pub fn text(name: impl Into<String>, width: u8) -> Self {
        Self::new(name, FieldKind::Text { width })
    }
}

/// One geometry paired with its attribute row
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// `None` for null shapes
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Option<Geometry<f64>>, properties: Map<String, Value>) -> Self {
        Self { geometry, properties }
    }

    /// Feature with a geometry and no attributes
    pub fn from_geometry(geometry: impl Into<Geometry<f64>>) -> Self {
        Self::new(Some(geometry.into()), Map::new())
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Attribute rendered as text, `None` for missing or null values
    pub fn property_text(&self, name: &str) -> Option<String> {
        self.property(name).and_then(value_text)
    }
}

/// Render an attribute value the way it reads in a table.
///
/// Whole-number floats drop their fraction so that an identifier stored in a
/// numeric dBase column (`94103.0`) compares equal to its string form.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i.to_string());
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", f as i64)),
                _ => Some(n.to_string()),
            }
        }
        other => Some(other.to_string()),
    }
}

/// An ordered collection of features sharing a CRS and attribute schema
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDataset {
    /// Dataset name, usually the file stem it was read from
    pub name: String,
    pub crs: Crs,
    pub schema: Vec<FieldDef>,
    pub features: Vec<Feature>,
}

impl VectorDataset {
    pub fn new(name: impl Into<String>, crs: Crs, schema: Vec<FieldDef>) -> Self {
        Self { name: name.into(), crs, schema, features: Vec::new() }
    }

    /// Build a dataset whose schema is inferred from the feature attributes
    pub fn from_features(name: impl Into<String>, crs: Crs, features: Vec<Feature>) -> Self {
        let schema = infer_schema(&features);
        Self { name: name.into(), crs, schema, features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.schema.iter().find(|f| f.name == name)
    }

    /// Fail with `FieldNotFound` unless the schema has `name`
    pub fn require_field(&self, name: &str) -> Result<&FieldDef> {
        self.field(name).ok_or_else(|| GeowrangleError::FieldNotFound {
            field: name.to_string(),
            dataset: self.name.clone(),
        })
    }

    /// New dataset holding the features accepted by `keep`, in their original order
    pub fn select<F>(&self, mut keep: F) -> VectorDataset
    where
        F: FnMut(usize, &Feature) -> bool,
    {
        let features = self
            .features
            .iter()
            .enumerate()
            .filter(|(idx, feature)| keep(*idx, feature))
            .map(|(_, feature)| feature.clone())
            .collect();

        VectorDataset {
            name: self.name.clone(),
            crs: self.crs.clone(),
            schema: self.schema.clone(),
            features,
        }
    }

    /// Common geometry type of all non-null features
    pub fn geometry_type(&self) -> GeometryType {
        let mut kinds = self
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .map(GeometryType::of);

        let first = match kinds.next() {
            Some(kind) => kind,
            None => return GeometryType::None,
        };

        if kinds.all(|kind| kind == first) {
            first
        } else {
            GeometryType::Mixed
        }
    }

    /// Bounding rectangle of every geometry in the dataset
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .filter_map(|g| g.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                    (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                )
            })
    }
}

/// Infer a schema from attribute rows, keeping first-seen column order
pub fn infer_schema(features: &[Feature]) -> Vec<FieldDef> {
    let mut schema: Vec<FieldDef> = Vec::new();

    for feature in features {
        for (name, value) in &feature.properties {
            let kind = match FieldKind::infer(value) {
                Some(kind) => kind,
                None if matches!(value, Value::Null) => continue,
                None => FieldKind::Text { width: FieldKind::MAX_TEXT_WIDTH },
            };

            match schema.iter_mut().find(|f| &f.name == name) {
                Some(existing) => existing.kind = existing.kind.merge(kind),
                None => schema.push(FieldDef::new(name.clone(), kind)),
            }
        }
    }

    schema
}
