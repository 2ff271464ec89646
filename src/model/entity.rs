//! Nodes, connectivity-bearing entities, property sets and tables.
//!
//! Entities refer to nodes and properties by id rather than by pointer; the
//! owning [`ModelPart`](crate::model::ModelPart) resolves them.

use crate::model::container::Identified;
use crate::model::registry::EntityKind;
use crate::model::value::{NodalValue, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mesh node: id, coordinates and nodal field data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: u64,
    pub coordinates: [f64; 3],
    pub data: BTreeMap<String, NodalValue>,
}

impl Node {
    pub fn new(id: u64, coordinates: [f64; 3]) -> Self {
        Self {
            id,
            coordinates,
            data: BTreeMap::new(),
        }
    }

    pub fn x(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn y(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn z(&self) -> f64 {
        self.coordinates[2]
    }

    /// Nodal value of `variable`, if assigned.
    pub fn value(&self, variable: &str) -> Option<&Value> {
        self.data.get(variable).map(|v| &v.value)
    }

    /// Whether the degree of freedom `variable` is fixed on this node.
    pub fn is_fixed(&self, variable: &str) -> bool {
        self.data.get(variable).is_some_and(|v| v.fixed)
    }
}

impl Identified for Node {
    fn id(&self) -> u64 {
        self.id
    }
}

/// An element, condition or geometry: a typed, ordered list of node ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u64,
    pub kind: EntityKind,
    /// Registered type name, e.g. `Element2D3N`.
    pub type_name: String,
    /// Geometries carry no properties.
    pub properties_id: Option<u64>,
    pub nodes: Vec<u64>,
    pub data: BTreeMap<String, Value>,
}

impl Entity {
    pub fn value(&self, variable: &str) -> Option<&Value> {
        self.data.get(variable)
    }
}

impl Identified for Entity {
    fn id(&self) -> u64 {
        self.id
    }
}

/// Piecewise-linear table `y(x)` between two registered variables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub x_variable: String,
    pub y_variable: String,
    pub points: Vec<(f64, f64)>,
}

impl Table {
    pub fn new(x_variable: impl Into<String>, y_variable: impl Into<String>) -> Self {
        Self {
            x_variable: x_variable.into(),
            y_variable: y_variable.into(),
            points: Vec::new(),
        }
    }

    /// Linear interpolation, clamped to the first/last row.
    pub fn value_at(&self, x: f64) -> Option<f64> {
        let first = self.points.first()?;
        if x <= first.0 {
            return Some(first.1);
        }
        for pair in self.points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if x <= x1 {
                if x1 == x0 {
                    return Some(y1);
                }
                return Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0));
            }
        }
        self.points.last().map(|p| p.1)
    }
}

/// A property set: typed key/value pairs plus optional tables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    pub id: u64,
    pub values: BTreeMap<String, Value>,
    /// Keyed by `(x_variable, y_variable)`.
    pub tables: BTreeMap<(String, String), Table>,
}

impl Properties {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn value(&self, variable: &str) -> Option<&Value> {
        self.values.get(variable)
    }

    pub fn table(&self, x_variable: &str, y_variable: &str) -> Option<&Table> {
        self.tables
            .get(&(x_variable.to_string(), y_variable.to_string()))
    }
}

impl Identified for Properties {
    fn id(&self) -> u64 {
        self.id
    }
}
