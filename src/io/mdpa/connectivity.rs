//! Connectivity passes: nodal graph and per-entity node lists.
//!
//! These passes never build entities. They read only the id fields of the
//! entity blocks (remapped like any other read) and skip everything else.

use super::MdpaReader;
use crate::algs::{ConnectivityTable, NodalGraph};
use crate::io::reorder::IdReorder;
use crate::mesh_error::{MeshIoError, ParseErrorKind};
use crate::model::registry::EntityKind;
use hashbrown::HashSet;
use std::io::{BufRead, Seek};
use std::time::Instant;

impl<R: BufRead + Seek, O: IdReorder> MdpaReader<'_, R, O> {
    /// Walk one entity block, handing each remapped `(id, nodes)` record to
    /// `record`. The type must be registered; property ids are skipped.
    fn scan_entity_records<F>(&mut self, kind: EntityKind, mut record: F) -> Result<(), MeshIoError>
    where
        F: FnMut(u64, &[u64]),
    {
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
        let what = format!("{kind} id");
        let mut nodes = Vec::with_capacity(arity);
        loop {
            let word = self.blocks.expect_word(block)?;
            if self.blocks.check_end_block(block, &word)? {
                return Ok(());
            }
            let raw = self.blocks.parse_id(&word, &what)?;
            let id = self.reorder_entity_id(kind, raw);
            if kind.has_properties() {
                self.blocks.read::<u64>(block, "properties id")?;
            }
            nodes.clear();
            for _ in 0..arity {
                let node = self.blocks.read_id(block, "node id")?;
                nodes.push(self.reorder.node_id(node));
            }
            record(id, &nodes);
        }
    }

    /// Node ids declared in one `Nodes` block; coordinates are skipped.
    fn scan_node_ids<F>(&mut self, mut node: F) -> Result<(), MeshIoError>
    where
        F: FnMut(u64),
    {
        loop {
            let word = self.blocks.expect_word("Nodes")?;
            if self.blocks.check_end_block("Nodes", &word)? {
                return Ok(());
            }
            let raw = self.blocks.parse_id(&word, "node id")?;
            for _ in 0..3 {
                self.blocks.expect_word("Nodes")?;
            }
            node(self.reorder.node_id(raw));
        }
    }

    /// Nodal adjacency over every geometry, element and condition.
    ///
    /// Every node declared in a `Nodes` block or referenced by an entity
    /// must end up with at least one neighbour; the first one that does not
    /// is reported as a [`ParseErrorKind::HangingNode`].
    pub fn read_nodal_graph(&mut self) -> Result<NodalGraph, MeshIoError> {
        let started = Instant::now();
        let mut graph = NodalGraph::new();
        self.for_each_block(|reader, name| {
            match name {
                "Nodes" => reader.scan_node_ids(|id| graph.touch(id))?,
                "Geometries" | "Elements" | "Conditions" => {
                    let kind = entity_kind_of_block(name);
                    reader.scan_entity_records(kind, |_, nodes| graph.add_clique(nodes))?;
                }
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        graph.finish();
        if let Some(node) = graph.first_hanging_node() {
            return Err(self
                .blocks
                .error(
                    ParseErrorKind::HangingNode,
                    format!("node {node} is not connected to any entity"),
                )
                .with_found(node.to_string())
                .into());
        }
        if !self.options.skip_timer {
            log::info!("Building nodal graph took {:.3?}", started.elapsed());
        }
        Ok(graph)
    }

    /// Nodal adjacency restricted to the listed (remapped) element and
    /// condition ids. Nodes outside those entities are not validated.
    pub fn read_nodal_graph_from_entities(
        &mut self,
        element_ids: &HashSet<u64>,
        condition_ids: &HashSet<u64>,
    ) -> Result<NodalGraph, MeshIoError> {
        let mut graph = NodalGraph::new();
        self.for_each_block(|reader, name| {
            let ids = match name {
                "Elements" => element_ids,
                "Conditions" => condition_ids,
                _ => return Ok(false),
            };
            let kind = entity_kind_of_block(name);
            reader.scan_entity_records(kind, |id, nodes| {
                if ids.contains(&id) {
                    graph.add_clique(nodes);
                }
            })?;
            Ok(true)
        })?;
        graph.finish();
        Ok(graph)
    }

    /// Node list of every entity of `kind`, indexed by entity id.
    pub fn read_connectivities(&mut self, kind: EntityKind) -> Result<ConnectivityTable, MeshIoError> {
        self.collect_connectivities(kind, None)
    }

    /// Like [`Self::read_connectivities`], keeping only entities in `ids`.
    pub fn read_connectivities_in(
        &mut self,
        kind: EntityKind,
        ids: &HashSet<u64>,
    ) -> Result<ConnectivityTable, MeshIoError> {
        self.collect_connectivities(kind, Some(ids))
    }

    fn collect_connectivities(
        &mut self,
        kind: EntityKind,
        filter: Option<&HashSet<u64>>,
    ) -> Result<ConnectivityTable, MeshIoError> {
        let mut table = ConnectivityTable::new();
        self.for_each_block(|reader, name| {
            if name != kind.block_name() {
                return Ok(false);
            }
            reader.scan_entity_records(kind, |id, nodes| {
                if filter.is_none_or(|f| f.contains(&id)) {
                    table.set_row(id, nodes.to_vec());
                }
            })?;
            Ok(true)
        })?;
        Ok(table)
    }

    /// Element and condition ids of the sub model part at the dot-separated
    /// `path`, descendants included, sorted and unique.
    pub fn read_sub_model_part_entity_ids(
        &mut self,
        path: &str,
    ) -> Result<(Vec<u64>, Vec<u64>), MeshIoError> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut ids = (Vec::new(), Vec::new());
        let mut found = false;
        self.for_each_block(|reader, name| {
            if name != "SubModelPart" {
                return Ok(false);
            }
            let part = reader.blocks.expect_word("SubModelPart")?;
            if part != segments[0] {
                reader.blocks.skip_block("SubModelPart")?;
                return Ok(true);
            }
            reader.scan_sub_model_part(&segments[1..], &mut ids, &mut found)?;
            Ok(true)
        })?;
        if !found {
            return Err(self
                .blocks
                .error(ParseErrorKind::MissingId, "sub model part not found")
                .with_found(path)
                .into());
        }
        for list in [&mut ids.0, &mut ids.1] {
            list.sort_unstable();
            list.dedup();
        }
        Ok(ids)
    }

    /// Body of a sub model part whose name was just consumed. `rest` is the
    /// remaining path below it; empty means this part is the target.
    fn scan_sub_model_part(
        &mut self,
        rest: &[&str],
        ids: &mut (Vec<u64>, Vec<u64>),
        found: &mut bool,
    ) -> Result<(), MeshIoError> {
        let target = rest.is_empty();
        *found |= target;
        loop {
            let word = self.blocks.expect_word("SubModelPart")?;
            if self.blocks.check_end_block("SubModelPart", &word)? {
                return Ok(());
            }
            let block = self.blocks.read_block_name(&word)?;
            match block.as_str() {
                "SubModelPartElements" if target => {
                    self.scan_id_list(&block, EntityKind::Element, &mut ids.0)?
                }
                "SubModelPartConditions" if target => {
                    self.scan_id_list(&block, EntityKind::Condition, &mut ids.1)?
                }
                "SubModelPart" => {
                    let child = self.blocks.expect_word("SubModelPart")?;
                    if target {
                        self.scan_sub_model_part(rest, ids, found)?;
                    } else if child == rest[0] {
                        self.scan_sub_model_part(&rest[1..], ids, found)?;
                    } else {
                        self.blocks.skip_block("SubModelPart")?;
                    }
                }
                other => self.blocks.skip_block(other)?,
            }
        }
    }

    fn scan_id_list(&mut self, block: &str, kind: EntityKind, out: &mut Vec<u64>) -> Result<(), MeshIoError> {
        let what = format!("{kind} id");
        loop {
            let word = self.blocks.expect_word(block)?;
            if self.blocks.check_end_block(block, &word)? {
                return Ok(());
            }
            let raw = self.blocks.parse_id(&word, &what)?;
            out.push(self.reorder_entity_id(kind, raw));
        }
    }
}

fn entity_kind_of_block(name: &str) -> EntityKind {
    match name {
        "Geometries" => EntityKind::Geometry,
        "Conditions" => EntityKind::Condition,
        _ => EntityKind::Element,
    }
}
