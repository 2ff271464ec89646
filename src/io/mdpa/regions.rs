//! Readers for blocks that group ids of entities already defined at the
//! root: `SubModelPart`, `Mesh` and `CommunicatorData`.

use super::MdpaReader;
use crate::io::block::BEGIN;
use crate::io::reorder::IdReorder;
use crate::io::value::parse_value;
use crate::mesh_error::{MeshIoError, ParseErrorKind};
use crate::model::registry::EntityKind;
use crate::model::{CommunicatorData, Mesh, ModelPart, SubModelPart, Value, VariableKind};
use std::io::{BufRead, Seek};

/// Which root container an id list refers to.
#[derive(Clone, Copy, Debug)]
pub(crate) enum IdSpace {
    Table,
    Properties,
    Node,
    Entity(EntityKind),
}

impl IdSpace {
    fn label(self) -> &'static str {
        match self {
            IdSpace::Table => "table",
            IdSpace::Properties => "properties",
            IdSpace::Node => "node",
            IdSpace::Entity(EntityKind::Geometry) => "geometry",
            IdSpace::Entity(EntityKind::Element) => "element",
            IdSpace::Entity(EntityKind::Condition) => "condition",
        }
    }

    fn exists_in(self, root: &ModelPart, id: u64) -> bool {
        match self {
            IdSpace::Table => root.tables.contains_key(&id),
            IdSpace::Properties => root.properties.contains(id),
            IdSpace::Node => root.nodes.contains(id),
            IdSpace::Entity(kind) => root.entities(kind).contains(id),
        }
    }
}

impl<R: BufRead + Seek, O: IdReorder> MdpaReader<'_, R, O> {
    /// Ids up to `End <block>`, remapped and checked against `root`.
    pub(crate) fn read_id_list(
        &mut self,
        block: &str,
        space: IdSpace,
        root: &ModelPart,
    ) -> Result<Vec<u64>, MeshIoError> {
        let mut ids = Vec::new();
        loop {
            let word = self.blocks.expect_word(block)?;
            if self.blocks.check_end_block(block, &word)? {
                return Ok(ids);
            }
            let (raw, id) = match space {
                IdSpace::Table | IdSpace::Properties => {
                    let raw: u64 = self.blocks.parse(&word, space.label())?;
                    (raw, raw)
                }
                IdSpace::Node => {
                    let raw = self.blocks.parse_id(&word, "node id")?;
                    (raw, self.reorder.node_id(raw))
                }
                IdSpace::Entity(kind) => {
                    let raw = self.blocks.parse_id(&word, space.label())?;
                    (raw, self.reorder_entity_id(kind, raw))
                }
            };
            if !space.exists_in(root, id) {
                return Err(self.missing_id(space.label(), raw).into());
            }
            ids.push(id);
        }
    }

    /// `Begin SubModelPart <name>` with nested id lists and children.
    /// Children's ids are folded into the parent.
    pub(crate) fn read_sub_model_part_block(
        &mut self,
        root: &ModelPart,
    ) -> Result<SubModelPart, MeshIoError> {
        let name = self.blocks.expect_word("SubModelPart")?;
        let mut part = SubModelPart::new(name);
        loop {
            let word = self.blocks.expect_word("SubModelPart")?;
            if self.blocks.check_end_block("SubModelPart", &word)? {
                break;
            }
            let block = self.blocks.read_block_name(&word)?;
            match block.as_str() {
                "SubModelPartData" => self.read_data_block(&block, &mut part.data)?,
                "SubModelPartTables" => {
                    let ids = self.read_id_list(&block, IdSpace::Table, root)?;
                    part.table_ids.extend(ids);
                }
                "SubModelPartProperties" => {
                    let ids = self.read_id_list(&block, IdSpace::Properties, root)?;
                    part.properties_ids.extend(ids);
                }
                "SubModelPartNodes" => {
                    let ids = self.read_id_list(&block, IdSpace::Node, root)?;
                    part.node_ids.extend(ids);
                }
                "SubModelPartElements" => {
                    let ids = self.read_id_list(&block, IdSpace::Entity(EntityKind::Element), root)?;
                    part.element_ids.extend(ids);
                }
                "SubModelPartConditions" => {
                    let ids =
                        self.read_id_list(&block, IdSpace::Entity(EntityKind::Condition), root)?;
                    part.condition_ids.extend(ids);
                }
                "SubModelPartGeometries" => {
                    let ids =
                        self.read_id_list(&block, IdSpace::Entity(EntityKind::Geometry), root)?;
                    part.geometry_ids.extend(ids);
                }
                "SubModelPart" => {
                    let child = self.read_sub_model_part_block(root)?;
                    part.absorb_child_ids(&child);
                    part.sub_model_parts.insert(child.name.clone(), child);
                }
                other => self.skip_unknown_block(other)?,
            }
        }
        part.normalize();
        Ok(part)
    }

    /// `Begin Mesh <id>`; id 0 names the model part itself and is rejected.
    pub(crate) fn read_mesh_block(&mut self, root: &ModelPart) -> Result<Mesh, MeshIoError> {
        let id: u64 = self.blocks.read("Mesh", "mesh id")?;
        if id == 0 {
            return Err(self
                .blocks
                .error(ParseErrorKind::MissingId, "mesh 0 is reserved for the model part itself")
                .with_found("0")
                .into());
        }
        let mut mesh = Mesh {
            id,
            ..Default::default()
        };
        loop {
            let word = self.blocks.expect_word("Mesh")?;
            if self.blocks.check_end_block("Mesh", &word)? {
                return Ok(mesh);
            }
            let block = self.blocks.read_block_name(&word)?;
            match block.as_str() {
                "MeshData" => self.read_data_block(&block, &mut mesh.data)?,
                "MeshNodes" => {
                    let ids = self.read_id_list(&block, IdSpace::Node, root)?;
                    mesh.node_ids.extend(ids);
                }
                "MeshElements" => {
                    let ids = self.read_id_list(&block, IdSpace::Entity(EntityKind::Element), root)?;
                    mesh.element_ids.extend(ids);
                }
                "MeshConditions" => {
                    let ids =
                        self.read_id_list(&block, IdSpace::Entity(EntityKind::Condition), root)?;
                    mesh.condition_ids.extend(ids);
                }
                other => self.skip_unknown_block(other)?,
            }
        }
    }

    /// `Begin CommunicatorData` with `NEIGHBOUR_INDICES`, `NUMBER_OF_COLORS`
    /// and `LocalNodes <k>` / `GhostNodes <k>` lists.
    pub(crate) fn read_communicator_data_block(
        &mut self,
        root: &ModelPart,
    ) -> Result<CommunicatorData, MeshIoError> {
        let mut data = CommunicatorData::default();
        loop {
            let word = self.blocks.expect_word("CommunicatorData")?;
            if self.blocks.check_end_block("CommunicatorData", &word)? {
                return Ok(data);
            }
            match word.as_str() {
                BEGIN => {
                    let block = self.blocks.read_block_name(&word)?;
                    let local = match block.as_str() {
                        "LocalNodes" => true,
                        "GhostNodes" => false,
                        other => {
                            self.skip_unknown_block(other)?;
                            continue;
                        }
                    };
                    let interface: usize = self.blocks.read(&block, "interface id")?;
                    let ids = self.read_id_list(&block, IdSpace::Node, root)?;
                    let target = if local {
                        &mut data.local_nodes
                    } else {
                        &mut data.ghost_nodes
                    };
                    target.entry(interface).or_default().extend(ids);
                }
                "NEIGHBOUR_INDICES" => {
                    let text = self.blocks.expect_bracketed("CommunicatorData")?;
                    let indices = match parse_value(VariableKind::Vector, &text) {
                        Ok(Value::Vector(v)) if v.iter().all(|x| x.fract() == 0.0) => {
                            v.into_iter().map(|x| x as i64).collect()
                        }
                        _ => {
                            return Err(self
                                .blocks
                                .error(ParseErrorKind::InvalidValue, "invalid neighbour indices")
                                .with_found(text)
                                .into());
                        }
                    };
                    data.neighbour_indices = indices;
                }
                "NUMBER_OF_COLORS" => {
                    data.number_of_colors = self.blocks.read("CommunicatorData", "number of colors")?;
                }
                _ => {
                    return Err(self
                        .blocks
                        .error(ParseErrorKind::Grammar, "unknown communicator statement")
                        .with_found(word)
                        .into());
                }
            }
        }
    }
}
