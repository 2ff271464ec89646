//! Partition rewriter: one forward pass over a `.mdpa` source, fanning each
//! record out to the output of every partition that holds it.
//!
//! Records are parsed, remapped and re-serialized with internal ids, so the
//! ids in the outputs, in the `PARTITION_INDEX` data and in the communicator
//! lists all agree. Data, tables and properties go to every partition; id
//! lists inside meshes and sub model parts are filtered per partition. Any
//! `CommunicatorData` in the source is replaced by the one derived from the
//! [`PartitioningInfo`].

use crate::io::block::BlockReader;
use crate::io::mdpa::MdpaReader;
use crate::io::mdpa::regions::IdSpace;
use crate::io::mdpa::writer::{
    format_communicator, format_data, format_entity, format_entity_value, format_nodal_value,
    format_node, format_properties, format_table,
};
use crate::io::reorder::IdReorder;
use crate::mesh_error::{MeshIoError, ParseErrorKind};
use crate::model::registry::{EntityKind, PARTITION_INDEX};
use crate::model::{EntityContainer, Value};
use crate::partitioning::{
    EntityPartitions, PartitionError, PartitionId, PartitioningInfo, build_communicator_data,
    derive_partitioning,
};
use hashbrown::HashSet;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Directory holding the partitions of `base`.
pub fn partition_dir(root: &Path, base: &str) -> PathBuf {
    root.join(format!("{base}_partitioned"))
}

/// `<root>/<base>_partitioned/<base>_<index>.mdpa`.
pub fn partition_file_path(root: &Path, base: &str, index: usize) -> PathBuf {
    partition_dir(root, base).join(format!("{base}_{index}.mdpa"))
}

/// The set of partition outputs of one run.
struct Fanout<'a, W> {
    outputs: &'a mut [W],
}

impl<W: Write> Fanout<'_, W> {
    fn all(&mut self, text: &str) -> Result<(), MeshIoError> {
        for out in self.outputs.iter_mut() {
            out.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    fn to(&mut self, partitions: &[PartitionId], text: &str) -> Result<(), MeshIoError> {
        for &p in partitions {
            self.outputs[p].write_all(text.as_bytes())?;
        }
        Ok(())
    }

    /// One text per partition.
    fn each(&mut self, texts: &[String]) -> Result<(), MeshIoError> {
        for (out, text) in self.outputs.iter_mut().zip(texts) {
            out.write_all(text.as_bytes())?;
        }
        Ok(())
    }
}

fn indent(level: usize) -> String {
    "  ".repeat(level)
}

fn membership<'i, R: BufRead + Seek>(
    blocks: &BlockReader<R>,
    table: &'i EntityPartitions,
    what: &str,
    raw: u64,
    id: u64,
) -> Result<&'i [PartitionId], MeshIoError> {
    table.partitions_of(id).ok_or_else(|| {
        blocks
            .error(
                ParseErrorKind::InvalidPartition,
                format!("{what} {raw} has no partition assignment"),
            )
            .with_found(raw.to_string())
            .into()
    })
}

impl<R: BufRead + Seek, O: IdReorder> MdpaReader<'_, R, O> {
    /// Derive an assignment for every id space from a node partition, by
    /// reading the connectivities of this source.
    pub fn derive_partitioning(
        &mut self,
        number_of_partitions: usize,
        node_partitions: &[PartitionId],
    ) -> Result<PartitioningInfo, MeshIoError> {
        let elements = self.read_connectivities(EntityKind::Element)?;
        let conditions = self.read_connectivities(EntityKind::Condition)?;
        let geometries = self.read_connectivities(EntityKind::Geometry)?;
        Ok(derive_partitioning(
            number_of_partitions,
            node_partitions,
            &elements,
            &conditions,
            &geometries,
        )?)
    }

    /// Write one file per partition under `<root>/<base>_partitioned/` and
    /// return their paths in partition order.
    pub fn divide_input_to_partitions(
        &mut self,
        root: impl AsRef<Path>,
        base: &str,
        info: &PartitioningInfo,
    ) -> Result<Vec<PathBuf>, MeshIoError> {
        info.validate()?;
        let root = root.as_ref();
        fs::create_dir_all(partition_dir(root, base))?;
        let paths: Vec<PathBuf> = (0..info.number_of_partitions)
            .map(|i| partition_file_path(root, base, i))
            .collect();
        let mut outputs = paths
            .iter()
            .map(|p| File::create(p).map(BufWriter::new))
            .collect::<Result<Vec<_>, _>>()?;
        self.divide_input_to_streams(&mut outputs, info)?;
        for out in &mut outputs {
            out.flush()?;
        }
        Ok(paths)
    }

    /// Rewrite the source into `outputs`, one sink per partition.
    pub fn divide_input_to_streams<W: Write>(
        &mut self,
        outputs: &mut [W],
        info: &PartitioningInfo,
    ) -> Result<(), MeshIoError> {
        info.validate()?;
        if outputs.len() != info.number_of_partitions {
            return Err(PartitionError::SizeMismatch {
                what: "output streams",
                expected: info.number_of_partitions,
                found: outputs.len(),
            }
            .into());
        }
        let started = Instant::now();
        let mut out = Fanout { outputs };
        let mut written_nodes: HashSet<u64> = HashSet::new();

        self.for_each_block(|reader, name| {
            match name {
                "ModelPartData" => {
                    let mut data = BTreeMap::new();
                    reader.read_data_block(name, &mut data)?;
                    out.all(&format_data(name, &data, None, 0))?;
                }
                "Table" => {
                    let mut tables = BTreeMap::new();
                    reader.read_table_block(&mut tables)?;
                    for (id, table) in &tables {
                        out.all(&format_table(*id, table, None))?;
                    }
                }
                "Properties" => {
                    let mut properties = EntityContainer::new();
                    reader.read_properties_block(&mut properties)?;
                    for props in &properties {
                        out.all(&format_properties(props, None))?;
                    }
                }
                "Nodes" => reader.divide_nodes_block(&mut out, info, &mut written_nodes)?,
                "Geometries" => reader.divide_entities_block(EntityKind::Geometry, &mut out, info)?,
                "Elements" => reader.divide_entities_block(EntityKind::Element, &mut out, info)?,
                "Conditions" => reader.divide_entities_block(EntityKind::Condition, &mut out, info)?,
                "NodalData" => reader.divide_nodal_data_block(&mut out, info)?,
                "ElementalData" => reader.divide_entity_data_block(EntityKind::Element, &mut out, info)?,
                "ConditionalData" => {
                    reader.divide_entity_data_block(EntityKind::Condition, &mut out, info)?
                }
                "Mesh" => reader.divide_mesh_block(&mut out, info)?,
                "SubModelPart" => reader.divide_sub_model_part_block(&mut out, info, 0)?,
                "CommunicatorData" => {
                    log::debug!("source communicator data replaced by the derived one");
                    reader.blocks.skip_block(name)?;
                }
                other => reader.skip_unknown_block(other)?,
            }
            Ok(true)
        })?;

        out.each(&partition_index_blocks(info, &written_nodes))?;
        let mut communicators = build_communicator_data(info)?;
        for data in &mut communicators {
            for ids in data.local_nodes.values_mut().chain(data.ghost_nodes.values_mut()) {
                ids.retain(|id| written_nodes.contains(id));
            }
        }
        let texts: Vec<String> = communicators.iter().map(format_communicator).collect();
        out.each(&texts)?;

        if !self.options.skip_timer {
            log::info!(
                "Dividing input into {} partitions took {:.3?}",
                info.number_of_partitions,
                started.elapsed()
            );
        }
        Ok(())
    }

    fn divide_nodes_block<W: Write>(
        &mut self,
        out: &mut Fanout<'_, W>,
        info: &PartitioningInfo,
        written: &mut HashSet<u64>,
    ) -> Result<(), MeshIoError> {
        out.all("Begin Nodes\n")?;
        loop {
            let word = self.blocks.expect_word("Nodes")?;
            if self.blocks.check_end_block("Nodes", &word)? {
                break;
            }
            let raw = self.blocks.parse_id(&word, "node id")?;
            let x: f64 = self.blocks.read("Nodes", "x coordinate")?;
            let y: f64 = self.blocks.read("Nodes", "y coordinate")?;
            let z: f64 = self.blocks.read("Nodes", "z coordinate")?;
            let id = self.reorder.node_id(raw);
            let parts = membership(&self.blocks, &info.nodes, "node", raw, id)?;
            out.to(parts, &format_node(id, &[x, y, z], None))?;
            written.insert(id);
        }
        out.all("End Nodes\n")
    }

    fn divide_entities_block<W: Write>(
        &mut self,
        kind: EntityKind,
        out: &mut Fanout<'_, W>,
        info: &PartitioningInfo,
    ) -> Result<(), MeshIoError> {
        let block = kind.block_name();
        let type_name = self.blocks.expect_word(block)?;
        let Some(arity) = self
            .registry
            .prototype(kind, &type_name)
            .map(|p| p.num_nodes())
        else {
            return Err(self
                .blocks
                .error(ParseErrorKind::UnknownType, format!("{kind} type is not registered"))
                .with_found(type_name)
                .into());
        };
        let what = kind.to_string();
        out.all(&format!("Begin {block} {type_name}\n"))?;
        loop {
            let word = self.blocks.expect_word(block)?;
            if self.blocks.check_end_block(block, &word)? {
                break;
            }
            let raw = self.blocks.parse_id(&word, &format!("{what} id"))?;
            let id = self.reorder_entity_id(kind, raw);
            let properties_id = if kind.has_properties() {
                Some(self.blocks.read::<u64>(block, "properties id")?)
            } else {
                None
            };
            let mut nodes = Vec::with_capacity(arity);
            for _ in 0..arity {
                let node = self.blocks.read_id(block, "node id")?;
                nodes.push(self.reorder.node_id(node));
            }
            let parts = membership(&self.blocks, info.entities(kind), &what, raw, id)?;
            // each output must hold every node its entities use
            for &p in parts {
                if let Some(&node) = nodes
                    .iter()
                    .find(|&&n| info.nodes.partitions_of(n).is_none_or(|all| !all.contains(&p)))
                {
                    return Err(self
                        .blocks
                        .error(
                            ParseErrorKind::InvalidPartition,
                            format!("{what} {raw} placed in partition {p} without its node {node}"),
                        )
                        .with_found(raw.to_string())
                        .into());
                }
            }
            out.to(parts, &format_entity(id, properties_id, &nodes))?;
        }
        out.all(&format!("End {block}\n"))
    }

    fn divide_nodal_data_block<W: Write>(
        &mut self,
        out: &mut Fanout<'_, W>,
        info: &PartitioningInfo,
    ) -> Result<(), MeshIoError> {
        let variable = self.blocks.expect_word("NodalData")?;
        let Some(kind) = self.variable_kind(&variable)? else {
            return self.blocks.skip_block("NodalData");
        };
        out.all(&format!("Begin NodalData {variable}\n"))?;
        loop {
            let word = self.blocks.expect_word("NodalData")?;
            if self.blocks.check_end_block("NodalData", &word)? {
                break;
            }
            let raw = self.blocks.parse_id(&word, "node id")?;
            let id = self.reorder.node_id(raw);
            let fixed = self.blocks.read_flag("NodalData", "fixity flag")?;
            let value = self.blocks.read_value(kind, "NodalData")?;
            let parts = membership(&self.blocks, &info.nodes, "node", raw, id)?;
            out.to(parts, &format_nodal_value(id, fixed && kind.is_fixable(), &value, None))?;
        }
        out.all("End NodalData\n")
    }

    fn divide_entity_data_block<W: Write>(
        &mut self,
        kind: EntityKind,
        out: &mut Fanout<'_, W>,
        info: &PartitioningInfo,
    ) -> Result<(), MeshIoError> {
        let block = kind.data_block_name().unwrap_or("GeometricalData");
        let variable = self.blocks.expect_word(block)?;
        let Some(value_kind) = self.variable_kind(&variable)? else {
            return self.blocks.skip_block(block);
        };
        let what = kind.to_string();
        out.all(&format!("Begin {block} {variable}\n"))?;
        loop {
            let word = self.blocks.expect_word(block)?;
            if self.blocks.check_end_block(block, &word)? {
                break;
            }
            let raw = self.blocks.parse_id(&word, &format!("{what} id"))?;
            let id = self.reorder_entity_id(kind, raw);
            let value = self.blocks.read_value(value_kind, block)?;
            let parts = membership(&self.blocks, info.entities(kind), &what, raw, id)?;
            out.to(parts, &format_entity_value(id, &value, None))?;
        }
        out.all(&format!("End {block}\n"))
    }

    /// An id list split by partition; table and properties ids go everywhere.
    fn divide_id_list<W: Write>(
        &mut self,
        block: &str,
        space: IdSpace,
        out: &mut Fanout<'_, W>,
        info: &PartitioningInfo,
        level: usize,
    ) -> Result<(), MeshIoError> {
        let pad = indent(level);
        let n = info.number_of_partitions;
        let every: Vec<PartitionId> = (0..n).collect();
        let mut texts = vec![format!("{pad}Begin {block}\n"); n];
        loop {
            let word = self.blocks.expect_word(block)?;
            if self.blocks.check_end_block(block, &word)? {
                break;
            }
            let (id, parts) = match space {
                IdSpace::Table | IdSpace::Properties => {
                    let id: u64 = self.blocks.parse(&word, "id")?;
                    (id, every.as_slice())
                }
                IdSpace::Node => {
                    let raw = self.blocks.parse_id(&word, "node id")?;
                    let id = self.reorder.node_id(raw);
                    (id, membership(&self.blocks, &info.nodes, "node", raw, id)?)
                }
                IdSpace::Entity(kind) => {
                    let raw = self.blocks.parse_id(&word, "entity id")?;
                    let id = self.reorder_entity_id(kind, raw);
                    let what = kind.to_string();
                    (id, membership(&self.blocks, info.entities(kind), &what, raw, id)?)
                }
            };
            for &p in parts {
                texts[p].push_str(&format!("{pad}  {id}\n"));
            }
        }
        for text in &mut texts {
            text.push_str(&format!("{pad}End {block}\n"));
        }
        out.each(&texts)
    }

    fn divide_mesh_block<W: Write>(
        &mut self,
        out: &mut Fanout<'_, W>,
        info: &PartitioningInfo,
    ) -> Result<(), MeshIoError> {
        let id: u64 = self.blocks.read("Mesh", "mesh id")?;
        if id == 0 {
            return Err(self
                .blocks
                .error(ParseErrorKind::MissingId, "mesh 0 is reserved for the model part itself")
                .with_found("0")
                .into());
        }
        out.all(&format!("Begin Mesh {id}\n"))?;
        loop {
            let word = self.blocks.expect_word("Mesh")?;
            if self.blocks.check_end_block("Mesh", &word)? {
                break;
            }
            let block = self.blocks.read_block_name(&word)?;
            match block.as_str() {
                "MeshData" => {
                    let mut data = BTreeMap::new();
                    self.read_data_block(&block, &mut data)?;
                    out.all(&format_data(&block, &data, None, 1))?;
                }
                "MeshNodes" => self.divide_id_list(&block, IdSpace::Node, out, info, 1)?,
                "MeshElements" => {
                    self.divide_id_list(&block, IdSpace::Entity(EntityKind::Element), out, info, 1)?
                }
                "MeshConditions" => {
                    self.divide_id_list(&block, IdSpace::Entity(EntityKind::Condition), out, info, 1)?
                }
                other => self.skip_unknown_block(other)?,
            }
        }
        out.all("End Mesh\n")
    }

    fn divide_sub_model_part_block<W: Write>(
        &mut self,
        out: &mut Fanout<'_, W>,
        info: &PartitioningInfo,
        level: usize,
    ) -> Result<(), MeshIoError> {
        let pad = indent(level);
        let name = self.blocks.expect_word("SubModelPart")?;
        out.all(&format!("{pad}Begin SubModelPart {name}\n"))?;
        loop {
            let word = self.blocks.expect_word("SubModelPart")?;
            if self.blocks.check_end_block("SubModelPart", &word)? {
                break;
            }
            let block = self.blocks.read_block_name(&word)?;
            let space = match block.as_str() {
                "SubModelPartData" => {
                    let mut data = BTreeMap::new();
                    self.read_data_block(&block, &mut data)?;
                    out.all(&format_data(&block, &data, None, level + 1))?;
                    continue;
                }
                "SubModelPart" => {
                    self.divide_sub_model_part_block(out, info, level + 1)?;
                    continue;
                }
                "SubModelPartTables" => IdSpace::Table,
                "SubModelPartProperties" => IdSpace::Properties,
                "SubModelPartNodes" => IdSpace::Node,
                "SubModelPartElements" => IdSpace::Entity(EntityKind::Element),
                "SubModelPartConditions" => IdSpace::Entity(EntityKind::Condition),
                "SubModelPartGeometries" => IdSpace::Entity(EntityKind::Geometry),
                other => {
                    self.skip_unknown_block(other)?;
                    continue;
                }
            };
            self.divide_id_list(&block, space, out, info, level + 1)?;
        }
        out.all(&format!("{pad}End SubModelPart\n"))
    }
}

/// `PARTITION_INDEX` nodal data of every partition: each held node with
/// the index of its home partition.
fn partition_index_blocks(info: &PartitioningInfo, written: &HashSet<u64>) -> Vec<String> {
    let mut texts = vec![format!("Begin NodalData {PARTITION_INDEX}\n"); info.number_of_partitions];
    for (i, &home) in info.nodes.home.iter().enumerate() {
        let id = i as u64 + 1;
        if !written.contains(&id) {
            continue;
        }
        for &p in info.nodes.partitions_of(id).unwrap_or(&[]) {
            texts[p].push_str(&format_nodal_value(id, false, &Value::Int(home as i64), None));
        }
    }
    for text in &mut texts {
        text.push_str("End NodalData\n");
    }
    texts
}
