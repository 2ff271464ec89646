//! In-memory mesh description.
//!
//! A [`ModelPart`] owns every node, property set, geometry, element and
//! condition read from a stream. Named sub regions ([`SubModelPart`]) and
//! legacy meshes ([`Mesh`]) reference the root's entities by id.

pub mod communicator;
pub mod container;
pub mod entity;
pub mod registry;
pub mod value;

pub use communicator::CommunicatorData;
pub use container::{EntityContainer, Identified};
pub use entity::{Entity, Node, Properties, Table};
pub use registry::{
    EntityKind, EntityPrototype, EntityRegistry, KernelRegistry, Registry, VariableRegistry,
};
pub use value::{Matrix, NodalValue, Value, VariableKind};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of a mesh description.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPart {
    pub name: String,
    pub data: BTreeMap<String, Value>,
    pub tables: BTreeMap<u64, Table>,
    pub properties: EntityContainer<Properties>,
    pub nodes: EntityContainer<Node>,
    pub geometries: EntityContainer<Entity>,
    pub elements: EntityContainer<Entity>,
    pub conditions: EntityContainer<Entity>,
    pub meshes: BTreeMap<u64, Mesh>,
    pub sub_model_parts: BTreeMap<String, SubModelPart>,
    pub communicator: Option<CommunicatorData>,
}

impl ModelPart {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Container of the given entity kind.
    pub fn entities(&self, kind: EntityKind) -> &EntityContainer<Entity> {
        match kind {
            EntityKind::Geometry => &self.geometries,
            EntityKind::Element => &self.elements,
            EntityKind::Condition => &self.conditions,
        }
    }

    pub fn entities_mut(&mut self, kind: EntityKind) -> &mut EntityContainer<Entity> {
        match kind {
            EntityKind::Geometry => &mut self.geometries,
            EntityKind::Element => &mut self.elements,
            EntityKind::Condition => &mut self.conditions,
        }
    }

    pub fn node(&self, id: u64) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn element(&self, id: u64) -> Option<&Entity> {
        self.elements.get(id)
    }

    pub fn condition(&self, id: u64) -> Option<&Entity> {
        self.conditions.get(id)
    }

    pub fn geometry(&self, id: u64) -> Option<&Entity> {
        self.geometries.get(id)
    }

    /// Look up a sub model part by dot-separated path, e.g. `"Inlet.Wall"`.
    pub fn sub_model_part(&self, path: &str) -> Option<&SubModelPart> {
        let mut parts = path.split('.');
        let mut current = self.sub_model_parts.get(parts.next()?)?;
        for name in parts {
            current = current.sub_model_parts.get(name)?;
        }
        Some(current)
    }
}

/// A named sub region. Ids reference entities of the root [`ModelPart`];
/// every id of a nested sub model part is also listed in its ancestors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubModelPart {
    pub name: String,
    pub data: BTreeMap<String, Value>,
    pub table_ids: Vec<u64>,
    pub properties_ids: Vec<u64>,
    pub node_ids: Vec<u64>,
    pub element_ids: Vec<u64>,
    pub condition_ids: Vec<u64>,
    pub geometry_ids: Vec<u64>,
    pub sub_model_parts: BTreeMap<String, SubModelPart>,
}

impl SubModelPart {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn entity_ids(&self, kind: EntityKind) -> &[u64] {
        match kind {
            EntityKind::Geometry => &self.geometry_ids,
            EntityKind::Element => &self.element_ids,
            EntityKind::Condition => &self.condition_ids,
        }
    }

    /// Fold a child's ids into this part and keep every list sorted and unique.
    pub(crate) fn absorb_child_ids(&mut self, child: &SubModelPart) {
        self.table_ids.extend_from_slice(&child.table_ids);
        self.properties_ids.extend_from_slice(&child.properties_ids);
        self.node_ids.extend_from_slice(&child.node_ids);
        self.element_ids.extend_from_slice(&child.element_ids);
        self.condition_ids.extend_from_slice(&child.condition_ids);
        self.geometry_ids.extend_from_slice(&child.geometry_ids);
        self.normalize();
    }

    pub(crate) fn normalize(&mut self) {
        for ids in [
            &mut self.table_ids,
            &mut self.properties_ids,
            &mut self.node_ids,
            &mut self.element_ids,
            &mut self.condition_ids,
            &mut self.geometry_ids,
        ] {
            ids.sort_unstable();
            ids.dedup();
        }
    }
}

/// Legacy numbered mesh: data plus node/element/condition id lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub id: u64,
    pub data: BTreeMap<String, Value>,
    pub node_ids: Vec<u64>,
    pub element_ids: Vec<u64>,
    pub condition_ids: Vec<u64>,
}
