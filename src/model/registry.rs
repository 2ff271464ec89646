//! Entity and variable registries.
//!
//! Readers never consult process-wide state: the set of known element,
//! condition and geometry types, and of field variables, is injected through
//! the [`EntityRegistry`] and [`VariableRegistry`] traits. [`KernelRegistry`]
//! is the in-memory implementation used by applications and tests alike.

use crate::model::entity::Entity;
use crate::model::value::VariableKind;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Variable carrying each node's owning partition in partitioned output.
pub const PARTITION_INDEX: &str = "PARTITION_INDEX";

/// The three connectivity-bearing entity kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Geometry,
    Element,
    Condition,
}

impl EntityKind {
    /// Name of the top-level block holding entities of this kind.
    pub fn block_name(self) -> &'static str {
        match self {
            EntityKind::Geometry => "Geometries",
            EntityKind::Element => "Elements",
            EntityKind::Condition => "Conditions",
        }
    }

    /// Name of the field-data block for this kind, if it has one.
    pub fn data_block_name(self) -> Option<&'static str> {
        match self {
            EntityKind::Geometry => None,
            EntityKind::Element => Some("ElementalData"),
            EntityKind::Condition => Some("ConditionalData"),
        }
    }

    /// Whether records carry a properties id after the entity id.
    pub fn has_properties(self) -> bool {
        !matches!(self, EntityKind::Geometry)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Geometry => "Geometry",
            EntityKind::Element => "Element",
            EntityKind::Condition => "Condition",
        };
        f.write_str(name)
    }
}

/// A registered entity type: its name and fixed node arity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityPrototype {
    name: String,
    kind: EntityKind,
    num_nodes: usize,
}

impl EntityPrototype {
    pub fn new(kind: EntityKind, name: impl Into<String>, num_nodes: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            num_nodes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Number of node ids every record of this type carries.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Instantiate an entity of this type.
    pub fn create(&self, id: u64, nodes: Vec<u64>, properties_id: Option<u64>) -> Entity {
        Entity {
            id,
            kind: self.kind,
            type_name: self.name.clone(),
            properties_id,
            nodes,
            data: BTreeMap::new(),
        }
    }
}

/// Lookup of entity types by name.
pub trait EntityRegistry {
    fn prototype(&self, kind: EntityKind, name: &str) -> Option<&EntityPrototype>;

    fn has_entity(&self, kind: EntityKind, name: &str) -> bool {
        self.prototype(kind, name).is_some()
    }
}

/// Lookup of field variables by name.
pub trait VariableRegistry {
    fn variable_kind(&self, name: &str) -> Option<VariableKind>;

    fn has_variable(&self, name: &str) -> bool {
        self.variable_kind(name).is_some()
    }
}

/// Everything a reader needs to resolve names.
pub trait Registry: EntityRegistry + VariableRegistry {}

impl<T: EntityRegistry + VariableRegistry + ?Sized> Registry for T {}

/// In-memory registry assembled with builder methods.
#[derive(Clone, Debug, Default)]
pub struct KernelRegistry {
    entities: HashMap<(EntityKind, String), EntityPrototype>,
    variables: HashMap<String, VariableKind>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the variables partitioned output relies on.
    pub fn with_core_variables() -> Self {
        Self::new().with_variable(PARTITION_INDEX, VariableKind::Int)
    }

    pub fn register(&mut self, prototype: EntityPrototype) -> &mut Self {
        self.entities
            .insert((prototype.kind, prototype.name.clone()), prototype);
        self
    }

    pub fn register_variable(&mut self, name: impl Into<String>, kind: VariableKind) -> &mut Self {
        self.variables.insert(name.into(), kind);
        self
    }

    pub fn with_element(mut self, name: &str, num_nodes: usize) -> Self {
        self.register(EntityPrototype::new(EntityKind::Element, name, num_nodes));
        self
    }

    pub fn with_condition(mut self, name: &str, num_nodes: usize) -> Self {
        self.register(EntityPrototype::new(EntityKind::Condition, name, num_nodes));
        self
    }

    pub fn with_geometry(mut self, name: &str, num_nodes: usize) -> Self {
        self.register(EntityPrototype::new(EntityKind::Geometry, name, num_nodes));
        self
    }

    pub fn with_variable(mut self, name: &str, kind: VariableKind) -> Self {
        self.register_variable(name, kind);
        self
    }
}

impl EntityRegistry for KernelRegistry {
    fn prototype(&self, kind: EntityKind, name: &str) -> Option<&EntityPrototype> {
        self.entities.get(&(kind, name.to_string()))
    }
}

impl VariableRegistry for KernelRegistry {
    fn variable_kind(&self, name: &str) -> Option<VariableKind> {
        self.variables.get(name).copied()
    }
}
