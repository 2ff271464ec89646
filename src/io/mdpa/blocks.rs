//! Readers for the flat top-level blocks: data, tables, properties, nodes,
//! entities and per-entity data.

use super::MdpaReader;
use crate::io::block::BEGIN;
use crate::io::reorder::IdReorder;
use crate::mesh_error::{MeshIoError, ParseErrorKind};
use crate::model::registry::EntityKind;
use crate::model::{Entity, EntityContainer, NodalValue, Node, Properties, Table, Value};
use std::collections::BTreeMap;
use std::io::{BufRead, Seek};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

type NodeRecord = (u64, [f64; 3]);

impl<R: BufRead + Seek, O: IdReorder> MdpaReader<'_, R, O> {
    /// `<VARIABLE> <value>` pairs up to `End <name>`.
    pub(crate) fn read_data_block(
        &mut self,
        name: &str,
        data: &mut BTreeMap<String, Value>,
    ) -> Result<(), MeshIoError> {
        loop {
            let word = self.blocks.expect_word(name)?;
            if self.blocks.check_end_block(name, &word)? {
                return Ok(());
            }
            if word == BEGIN {
                let nested = self.blocks.read_block_name(&word)?;
                self.skip_unknown_block(&nested)?;
                continue;
            }
            match self.variable_kind(&word)? {
                Some(kind) => {
                    let value = self.blocks.read_value(kind, name)?;
                    data.insert(word, value);
                }
                None => self.blocks.skip_value(name)?,
            }
        }
    }

    /// `Begin Table <id> <X> <Y>` followed by `x y` rows.
    pub(crate) fn read_table_block(
        &mut self,
        tables: &mut BTreeMap<u64, Table>,
    ) -> Result<(), MeshIoError> {
        let id: u64 = self.blocks.read("Table", "table id")?;
        let table = self.read_table_body("Table")?;
        if tables.insert(id, table).is_some() {
            log::warn!("line {}: table {id} redefined", self.blocks.line());
        }
        Ok(())
    }

    fn read_table_body(&mut self, context: &str) -> Result<Table, MeshIoError> {
        let x_variable = self.blocks.expect_word(context)?;
        let y_variable = self.blocks.expect_word(context)?;
        let mut table = Table::new(x_variable, y_variable);
        loop {
            let word = self.blocks.expect_word("Table")?;
            if self.blocks.check_end_block("Table", &word)? {
                return Ok(table);
            }
            let x: f64 = self.blocks.parse(&word, "table argument")?;
            let y: f64 = self.blocks.read("Table", "table value")?;
            table.points.push((x, y));
        }
    }

    /// `Begin Properties <id>` with variables and nested `Begin Table X Y`.
    /// Repeated blocks with the same id extend the same property set.
    pub(crate) fn read_properties_block(
        &mut self,
        properties: &mut EntityContainer<Properties>,
    ) -> Result<(), MeshIoError> {
        let id: u64 = self.blocks.read("Properties", "properties id")?;
        let mut props = properties.remove(id).unwrap_or_else(|| Properties::new(id));
        loop {
            let word = self.blocks.expect_word("Properties")?;
            if self.blocks.check_end_block("Properties", &word)? {
                break;
            }
            if word == BEGIN {
                let nested = self.blocks.read_block_name(&word)?;
                if nested == "Table" {
                    let table = self.read_table_body("Properties")?;
                    props
                        .tables
                        .insert((table.x_variable.clone(), table.y_variable.clone()), table);
                } else {
                    self.skip_unknown_block(&nested)?;
                }
                continue;
            }
            match self.variable_kind(&word)? {
                Some(kind) => {
                    let value = self.blocks.read_value(kind, "Properties")?;
                    props.values.insert(word, value);
                }
                None => self.blocks.skip_value("Properties")?,
            }
        }
        properties.insert(props);
        Ok(())
    }

    /// `id x y z` records. Coordinates are collected first and node objects
    /// are built afterwards, split across `node_creation_threads` workers.
    pub(crate) fn read_nodes_block(
        &mut self,
        nodes: &mut EntityContainer<Node>,
    ) -> Result<(), MeshIoError> {
        let mut records: Vec<NodeRecord> = Vec::new();
        loop {
            let word = self.blocks.expect_word("Nodes")?;
            if self.blocks.check_end_block("Nodes", &word)? {
                break;
            }
            let raw = self.blocks.parse_id(&word, "node id")?;
            let x: f64 = self.blocks.read("Nodes", "x coordinate")?;
            let y: f64 = self.blocks.read("Nodes", "y coordinate")?;
            let z: f64 = self.blocks.read("Nodes", "z coordinate")?;
            records.push((self.reorder.node_id(raw), [x, y, z]));
        }

        let read = records.len();
        // stable: the first record of a repeated id stays in front
        records.sort_by_key(|r| r.0);
        records.dedup_by_key(|r| r.0);
        let unique = records.len();
        let created = instantiate_nodes(records, self.options.node_creation_threads);
        let clashes = nodes.merge_sorted(created);
        let duplicates = read - unique + clashes;

        self.report.node_records += read;
        self.report.duplicate_nodes += duplicates;
        if duplicates > 0 {
            log::warn!(
                "line {}: {duplicates} of {read} node records repeat an existing id; first occurrence kept",
                self.blocks.line()
            );
        }
        Ok(())
    }

    /// `Begin <Kind> <TypeName>` followed by `id [properties] n1 .. nk`.
    ///
    /// The type is resolved before any record is consumed. Every referenced
    /// node must already exist; property sets that do not exist yet are
    /// created empty.
    pub(crate) fn read_entities_block(
        &mut self,
        kind: EntityKind,
        nodes: &EntityContainer<Node>,
        properties: &mut EntityContainer<Properties>,
        out: &mut EntityContainer<Entity>,
    ) -> Result<(), MeshIoError> {
        let block = kind.block_name();
        let type_name = self.blocks.expect_word(block)?;
        let registry = self.registry;
        let Some(prototype) = registry.prototype(kind, &type_name) else {
            return Err(self
                .blocks
                .error(ParseErrorKind::UnknownType, format!("{kind} type is not registered"))
                .with_found(type_name)
                .into());
        };
        let arity = prototype.num_nodes();
        let what = format!("{kind} id");

        loop {
            let word = self.blocks.expect_word(block)?;
            if self.blocks.check_end_block(block, &word)? {
                return Ok(());
            }
            let raw = self.blocks.parse_id(&word, &what)?;
            let id = self.reorder_entity_id(kind, raw);
            let properties_id = if kind.has_properties() {
                Some(self.blocks.read::<u64>(block, "properties id")?)
            } else {
                None
            };
            let mut connectivity = Vec::with_capacity(arity);
            for _ in 0..arity {
                let raw_node = self.blocks.read_id(block, "node id")?;
                let node = self.reorder.node_id(raw_node);
                if !nodes.contains(node) {
                    return Err(self.missing_id("node", raw_node).into());
                }
                connectivity.push(node);
            }
            if let Some(pid) = properties_id {
                if !properties.contains(pid) {
                    log::debug!("creating empty properties {pid} referenced by {kind} {raw}");
                    properties.insert(Properties::new(pid));
                }
            }
            if out.insert(prototype.create(id, connectivity, properties_id)).is_some() {
                log::warn!("line {}: {kind} {raw} redefined", self.blocks.line());
            }
        }
    }

    /// `Begin NodalData <VARIABLE>` followed by `id is_fixed value`.
    pub(crate) fn read_nodal_data_block(
        &mut self,
        nodes: &mut EntityContainer<Node>,
    ) -> Result<(), MeshIoError> {
        let variable = self.blocks.expect_word("NodalData")?;
        let Some(kind) = self.variable_kind(&variable)? else {
            return self.blocks.skip_block("NodalData");
        };
        loop {
            let word = self.blocks.expect_word("NodalData")?;
            if self.blocks.check_end_block("NodalData", &word)? {
                return Ok(());
            }
            let raw = self.blocks.parse_id(&word, "node id")?;
            let id = self.reorder.node_id(raw);
            let mut fixed = self.blocks.read_flag("NodalData", "fixity flag")?;
            let value = self.blocks.read_value(kind, "NodalData")?;
            if fixed && !kind.is_fixable() {
                log::warn!(
                    "line {}: {variable} is not a fixable variable; fixity of node {raw} ignored",
                    self.blocks.line()
                );
                fixed = false;
            }
            let Some(node) = nodes.get_mut(id) else {
                return Err(self.missing_id("node", raw).into());
            };
            node.data.insert(variable.clone(), NodalValue { value, fixed });
        }
    }

    /// `Begin ElementalData|ConditionalData <VARIABLE>` followed by
    /// `id value`. Records naming an absent entity are skipped.
    pub(crate) fn read_entity_data_block(
        &mut self,
        kind: EntityKind,
        entities: &mut EntityContainer<Entity>,
    ) -> Result<(), MeshIoError> {
        let block = kind.data_block_name().unwrap_or("GeometricalData");
        let variable = self.blocks.expect_word(block)?;
        let Some(value_kind) = self.variable_kind(&variable)? else {
            return self.blocks.skip_block(block);
        };
        let what = format!("{kind} id");
        loop {
            let word = self.blocks.expect_word(block)?;
            if self.blocks.check_end_block(block, &word)? {
                return Ok(());
            }
            let raw = self.blocks.parse_id(&word, &what)?;
            let id = self.reorder_entity_id(kind, raw);
            let value = self.blocks.read_value(value_kind, block)?;
            match entities.get_mut(id) {
                Some(entity) => {
                    entity.data.insert(variable.clone(), value);
                }
                None => log::warn!(
                    "line {}: {variable} given for missing {kind} {raw}; skipped",
                    self.blocks.line()
                ),
            }
        }
    }
}

fn build_nodes(records: &[NodeRecord]) -> Vec<Node> {
    records.iter().map(|&(id, xyz)| Node::new(id, xyz)).collect()
}

#[cfg(feature = "rayon")]
fn instantiate_nodes(records: Vec<NodeRecord>, threads: usize) -> Vec<Node> {
    if threads <= 1 || records.len() < 2 * threads {
        return build_nodes(&records);
    }
    let chunk = records.len().div_ceil(threads);
    records
        .par_chunks(chunk)
        .map(build_nodes)
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn instantiate_nodes(records: Vec<NodeRecord>, _threads: usize) -> Vec<Node> {
    build_nodes(&records)
}
