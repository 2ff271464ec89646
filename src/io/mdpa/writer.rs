//! `.mdpa` writer.
//!
//! Block text is produced by small formatting helpers that return `String`s,
//! so the partition rewriter can serialize a record once and send the same
//! bytes to several outputs.

use crate::io::ModelPartWriter;
use crate::io::value::{format_f64, format_value};
use crate::mesh_error::MeshIoError;
use crate::model::registry::EntityKind;
use crate::model::{
    CommunicatorData, Entity, EntityContainer, Mesh, ModelPart, Node, Properties, SubModelPart,
    Table, Value,
};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output formatting options.
#[derive(Clone, Debug, Default)]
pub struct MdpaWriteOptions {
    /// Digits after the decimal point in scientific notation. `None` writes
    /// the shortest text that reads back to the same `f64`.
    pub scientific_precision: Option<usize>,
}

/// Serializes a [`ModelPart`] in the `.mdpa` grammar.
#[derive(Clone, Debug, Default)]
pub struct MdpaWriter {
    options: MdpaWriteOptions,
}

fn pad(level: usize) -> String {
    "  ".repeat(level)
}

pub(crate) fn format_data(
    block: &str,
    data: &BTreeMap<String, Value>,
    precision: Option<usize>,
    level: usize,
) -> String {
    let indent = pad(level);
    let mut out = format!("{indent}Begin {block}\n");
    for (name, value) in data {
        out.push_str(&format!("{indent}  {name} {}\n", format_value(value, precision)));
    }
    out.push_str(&format!("{indent}End {block}\n"));
    out
}

fn format_table_rows(table: &Table, precision: Option<usize>, indent: &str) -> String {
    table
        .points
        .iter()
        .map(|&(x, y)| {
            format!(
                "{indent}  {} {}\n",
                format_f64(x, precision),
                format_f64(y, precision)
            )
        })
        .collect()
}

/// Top-level `Begin Table <id> <X> <Y>`.
pub(crate) fn format_table(id: u64, table: &Table, precision: Option<usize>) -> String {
    format!(
        "Begin Table {id} {} {}\n{}End Table\n",
        table.x_variable,
        table.y_variable,
        format_table_rows(table, precision, "")
    )
}

pub(crate) fn format_properties(props: &Properties, precision: Option<usize>) -> String {
    let mut out = format!("Begin Properties {}\n", props.id);
    for (name, value) in &props.values {
        out.push_str(&format!("  {name} {}\n", format_value(value, precision)));
    }
    for table in props.tables.values() {
        out.push_str(&format!(
            "  Begin Table {} {}\n{}  End Table\n",
            table.x_variable,
            table.y_variable,
            format_table_rows(table, precision, "  ")
        ));
    }
    out.push_str("End Properties\n");
    out
}

pub(crate) fn format_node(id: u64, coordinates: &[f64; 3], precision: Option<usize>) -> String {
    format!(
        "  {id} {} {} {}\n",
        format_f64(coordinates[0], precision),
        format_f64(coordinates[1], precision),
        format_f64(coordinates[2], precision)
    )
}

pub(crate) fn format_entity(id: u64, properties_id: Option<u64>, nodes: &[u64]) -> String {
    match properties_id {
        Some(p) => format!("  {id} {p} {}\n", nodes.iter().join(" ")),
        None => format!("  {id} {}\n", nodes.iter().join(" ")),
    }
}

pub(crate) fn format_nodal_value(id: u64, fixed: bool, value: &Value, precision: Option<usize>) -> String {
    format!(
        "  {id} {} {}\n",
        u8::from(fixed),
        format_value(value, precision)
    )
}

pub(crate) fn format_entity_value(id: u64, value: &Value, precision: Option<usize>) -> String {
    format!("  {id} {}\n", format_value(value, precision))
}

fn format_id_list(block: &str, ids: &[u64], level: usize) -> String {
    let indent = pad(level);
    let mut out = format!("{indent}Begin {block}\n");
    for id in ids {
        out.push_str(&format!("{indent}  {id}\n"));
    }
    out.push_str(&format!("{indent}End {block}\n"));
    out
}

/// `CommunicatorData` block; interface lists are written in key order.
pub(crate) fn format_communicator(data: &CommunicatorData) -> String {
    let mut out = String::from("Begin CommunicatorData\n");
    out.push_str(&format!(
        "  NEIGHBOUR_INDICES [{}]({})\n",
        data.neighbour_indices.len(),
        data.neighbour_indices.iter().join(",")
    ));
    out.push_str(&format!("  NUMBER_OF_COLORS {}\n", data.number_of_colors));
    for (block, lists) in [("LocalNodes", &data.local_nodes), ("GhostNodes", &data.ghost_nodes)] {
        for (interface, ids) in lists {
            out.push_str(&format!("  Begin {block} {interface}\n"));
            for id in ids {
                out.push_str(&format!("    {id}\n"));
            }
            out.push_str(&format!("  End {block}\n"));
        }
    }
    out.push_str("End CommunicatorData\n");
    out
}

impl MdpaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MdpaWriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MdpaWriteOptions {
        &self.options
    }

    /// Write `model_part` to `path`, creating or truncating the file.
    pub fn write_to_path(&self, path: impl AsRef<Path>, model_part: &ModelPart) -> Result<(), MeshIoError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_model_part(&mut writer, model_part)?;
        writer.flush()?;
        Ok(())
    }

    /// Write every part of `model_part` in an order the reader accepts.
    pub fn write_model_part<W: Write>(&self, mut writer: W, model_part: &ModelPart) -> Result<(), MeshIoError> {
        let precision = self.options.scientific_precision;

        if !model_part.data.is_empty() {
            writer.write_all(format_data("ModelPartData", &model_part.data, precision, 0).as_bytes())?;
        }
        for (id, table) in &model_part.tables {
            writer.write_all(format_table(*id, table, precision).as_bytes())?;
        }
        for props in &model_part.properties {
            writer.write_all(format_properties(props, precision).as_bytes())?;
        }
        self.write_nodes(&mut writer, &model_part.nodes)?;
        for kind in [EntityKind::Geometry, EntityKind::Element, EntityKind::Condition] {
            self.write_entities(&mut writer, kind, model_part.entities(kind))?;
        }
        self.write_nodal_data(&mut writer, &model_part.nodes)?;
        for kind in [EntityKind::Element, EntityKind::Condition] {
            self.write_entity_data(&mut writer, kind, model_part.entities(kind))?;
        }
        for mesh in model_part.meshes.values() {
            self.write_mesh(&mut writer, mesh)?;
        }
        for part in model_part.sub_model_parts.values() {
            self.write_sub_model_part(&mut writer, part, 0)?;
        }
        if let Some(communicator) = &model_part.communicator {
            writer.write_all(format_communicator(communicator).as_bytes())?;
        }
        Ok(())
    }

    fn write_nodes<W: Write>(&self, writer: &mut W, nodes: &EntityContainer<Node>) -> Result<(), MeshIoError> {
        if nodes.is_empty() {
            return Ok(());
        }
        writeln!(writer, "Begin Nodes")?;
        for node in nodes {
            writer.write_all(
                format_node(node.id, &node.coordinates, self.options.scientific_precision).as_bytes(),
            )?;
        }
        writeln!(writer, "End Nodes")?;
        Ok(())
    }

    /// One block per run of entities sharing a type name.
    fn write_entities<W: Write>(
        &self,
        writer: &mut W,
        kind: EntityKind,
        entities: &EntityContainer<Entity>,
    ) -> Result<(), MeshIoError> {
        let block = kind.block_name();
        for (type_name, run) in &entities.iter().chunk_by(|e| e.type_name.as_str()) {
            writeln!(writer, "Begin {block} {type_name}")?;
            for entity in run {
                writer.write_all(format_entity(entity.id, entity.properties_id, &entity.nodes).as_bytes())?;
            }
            writeln!(writer, "End {block}")?;
        }
        Ok(())
    }

    fn write_nodal_data<W: Write>(&self, writer: &mut W, nodes: &EntityContainer<Node>) -> Result<(), MeshIoError> {
        let variables: BTreeSet<&str> = nodes
            .iter()
            .flat_map(|n| n.data.keys().map(String::as_str))
            .collect();
        for variable in variables {
            writeln!(writer, "Begin NodalData {variable}")?;
            for node in nodes {
                if let Some(v) = node.data.get(variable) {
                    writer.write_all(
                        format_nodal_value(node.id, v.fixed, &v.value, self.options.scientific_precision)
                            .as_bytes(),
                    )?;
                }
            }
            writeln!(writer, "End NodalData")?;
        }
        Ok(())
    }

    fn write_entity_data<W: Write>(
        &self,
        writer: &mut W,
        kind: EntityKind,
        entities: &EntityContainer<Entity>,
    ) -> Result<(), MeshIoError> {
        let Some(block) = kind.data_block_name() else {
            return Ok(());
        };
        let variables: BTreeSet<&str> = entities
            .iter()
            .flat_map(|e| e.data.keys().map(String::as_str))
            .collect();
        for variable in variables {
            writeln!(writer, "Begin {block} {variable}")?;
            for entity in entities {
                if let Some(value) = entity.data.get(variable) {
                    writer.write_all(
                        format_entity_value(entity.id, value, self.options.scientific_precision).as_bytes(),
                    )?;
                }
            }
            writeln!(writer, "End {block}")?;
        }
        Ok(())
    }

    fn write_mesh<W: Write>(&self, writer: &mut W, mesh: &Mesh) -> Result<(), MeshIoError> {
        writeln!(writer, "Begin Mesh {}", mesh.id)?;
        if !mesh.data.is_empty() {
            writer.write_all(
                format_data("MeshData", &mesh.data, self.options.scientific_precision, 1).as_bytes(),
            )?;
        }
        writer.write_all(format_id_list("MeshNodes", &mesh.node_ids, 1).as_bytes())?;
        writer.write_all(format_id_list("MeshElements", &mesh.element_ids, 1).as_bytes())?;
        writer.write_all(format_id_list("MeshConditions", &mesh.condition_ids, 1).as_bytes())?;
        writeln!(writer, "End Mesh")?;
        Ok(())
    }

    fn write_sub_model_part<W: Write>(
        &self,
        writer: &mut W,
        part: &SubModelPart,
        level: usize,
    ) -> Result<(), MeshIoError> {
        let indent = pad(level);
        writeln!(writer, "{indent}Begin SubModelPart {}", part.name)?;
        if !part.data.is_empty() {
            writer.write_all(
                format_data(
                    "SubModelPartData",
                    &part.data,
                    self.options.scientific_precision,
                    level + 1,
                )
                .as_bytes(),
            )?;
        }
        let lists: [(&str, &[u64]); 6] = [
            ("SubModelPartTables", &part.table_ids),
            ("SubModelPartProperties", &part.properties_ids),
            ("SubModelPartNodes", &part.node_ids),
            ("SubModelPartElements", &part.element_ids),
            ("SubModelPartConditions", &part.condition_ids),
            ("SubModelPartGeometries", &part.geometry_ids),
        ];
        for (block, ids) in lists {
            writer.write_all(format_id_list(block, ids, level + 1).as_bytes())?;
        }
        for child in part.sub_model_parts.values() {
            self.write_sub_model_part(writer, child, level + 1)?;
        }
        writeln!(writer, "{indent}End SubModelPart")?;
        Ok(())
    }
}

impl ModelPartWriter for MdpaWriter {
    fn write_model_part<W: Write>(&self, writer: W, model_part: &ModelPart) -> Result<(), MeshIoError> {
        MdpaWriter::write_model_part(self, writer, model_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_are_grouped_by_consecutive_type() {
        let mut elements = EntityContainer::new();
        for (id, ty) in [(1, "Tri"), (2, "Tri"), (3, "Quad"), (4, "Tri")] {
            elements.insert(Entity {
                id,
                kind: EntityKind::Element,
                type_name: ty.to_string(),
                properties_id: Some(0),
                nodes: vec![1, 2],
                data: BTreeMap::new(),
            });
        }
        let mut out = Vec::new();
        MdpaWriter::new()
            .write_entities(&mut out, EntityKind::Element, &elements)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Begin Elements Tri").count(), 2);
        assert_eq!(text.matches("Begin Elements Quad").count(), 1);
        assert!(text.contains("  3 0 1 2\n"));
    }

    #[test]
    fn communicator_block_layout() {
        let mut data = CommunicatorData {
            neighbour_indices: vec![1, -1],
            number_of_colors: 2,
            ..Default::default()
        };
        data.local_nodes.insert(1, vec![4, 5]);
        let text = format_communicator(&data);
        assert!(text.starts_with("Begin CommunicatorData\n  NEIGHBOUR_INDICES [2](1,-1)\n"));
        assert!(text.contains("  Begin LocalNodes 1\n    4\n    5\n  End LocalNodes\n"));
    }

    #[test]
    fn scientific_precision_is_applied() {
        assert_eq!(format_node(3, &[1.0, 0.5, 0.0], Some(2)), "  3 1.00e0 5.00e-1 0.00e0\n");
    }
}
