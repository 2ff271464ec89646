//! `.mdpa` model part reader.
//!
//! [`MdpaReader`] drives a single forward pass over a seekable stream and
//! dispatches each top-level `Begin <Block>` to the matching entity block
//! reader. Every public read operation starts a fresh top-level pass by
//! rewinding the stream, so the same reader can serve several passes (graph
//! building, selective reads, partitioning) over one source.
//!
//! # Supported top-level blocks
//! `ModelPartData`, `Table`, `Properties`, `Nodes`, `Geometries`,
//! `Elements`, `Conditions`, `NodalData`, `ElementalData`,
//! `ConditionalData`, `CommunicatorData`, `Mesh`, `SubModelPart`.
//! Any other block is skipped with a warning.

mod blocks;
pub mod connectivity;
pub(crate) mod regions;
pub mod writer;

use crate::io::ModelPartReader;
use crate::io::block::BlockReader;
use crate::io::reorder::{IdReorder, IdentityReorder};
use crate::mesh_error::{MeshIoError, ParseError, ParseErrorKind};
use crate::model::registry::{EntityKind, Registry};
use crate::model::{Entity, EntityContainer, ModelPart, Node, Properties, VariableKind};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File extension of mesh descriptions.
pub const MDPA_EXTENSION: &str = "mdpa";

/// Options controlling a read pass.
#[derive(Clone, Debug)]
pub struct MdpaReadOptions {
    /// Skip-and-warn instead of failing on unregistered variables.
    pub ignore_variable_errors: bool,
    /// Worker count used to instantiate nodes once a block's coordinates are read.
    pub node_creation_threads: usize,
    /// Do not log the elapsed time of a pass.
    pub skip_timer: bool,
}

impl Default for MdpaReadOptions {
    fn default() -> Self {
        Self {
            ignore_variable_errors: false,
            node_creation_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            skip_timer: false,
        }
    }
}

/// Non-fatal findings of the last pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadReport {
    /// Node records read, duplicates included.
    pub node_records: usize,
    /// Node records dropped because their id was already taken.
    pub duplicate_nodes: usize,
    /// Names of blocks skipped because they are not understood.
    pub skipped_blocks: Vec<String>,
    /// Variables skipped under `ignore_variable_errors`.
    pub ignored_variables: Vec<String>,
}

/// Reader for the `.mdpa` grammar.
pub struct MdpaReader<'r, R, O = IdentityReorder> {
    pub(crate) blocks: BlockReader<R>,
    pub(crate) registry: &'r dyn Registry,
    pub(crate) reorder: O,
    pub(crate) options: MdpaReadOptions,
    pub(crate) report: ReadReport,
    source_path: Option<PathBuf>,
}

impl<'r> MdpaReader<'r, BufReader<File>> {
    /// Open a mesh file. A path without extension gets `.mdpa` appended.
    pub fn open(path: impl AsRef<Path>, registry: &'r dyn Registry) -> Result<Self, MeshIoError> {
        let mut path = path.as_ref().to_path_buf();
        if path.extension().is_none() {
            path.set_extension(MDPA_EXTENSION);
        }
        let file = File::open(&path)?;
        let mut reader = Self::new(BufReader::new(file), registry);
        reader.source_path = Some(path);
        Ok(reader)
    }
}

impl<'r, R: BufRead + Seek> MdpaReader<'r, R> {
    pub fn new(source: R, registry: &'r dyn Registry) -> Self {
        Self {
            blocks: BlockReader::new(source),
            registry,
            reorder: IdentityReorder,
            options: MdpaReadOptions::default(),
            report: ReadReport::default(),
            source_path: None,
        }
    }
}

impl<'r, R: BufRead + Seek, O: IdReorder> MdpaReader<'r, R, O> {
    /// Replace the id remapping strategy.
    pub fn with_reorder<P: IdReorder>(self, reorder: P) -> MdpaReader<'r, R, P> {
        MdpaReader {
            blocks: self.blocks,
            registry: self.registry,
            reorder,
            options: self.options,
            report: self.report,
            source_path: self.source_path,
        }
    }

    pub fn with_options(mut self, options: MdpaReadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &MdpaReadOptions {
        &self.options
    }

    pub fn reorder(&self) -> &O {
        &self.reorder
    }

    pub fn reorder_mut(&mut self) -> &mut O {
        &mut self.reorder
    }

    /// Findings of the most recent pass.
    pub fn report(&self) -> &ReadReport {
        &self.report
    }

    /// Path given to [`MdpaReader::open`], if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// File stem of the source, used to name partitioned output.
    pub fn base_name(&self) -> Option<String> {
        self.source_path
            .as_deref()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
    }

    pub fn into_inner(self) -> R {
        self.blocks.into_inner()
    }

    // ---------------------------------------------------------------------
    // pass driver
    // ---------------------------------------------------------------------

    /// Rewind and hand every top-level block name to `handle`. A handler
    /// returning `false` leaves the block body unread; it is then skipped.
    pub(crate) fn for_each_block<F>(&mut self, mut handle: F) -> Result<(), MeshIoError>
    where
        F: FnMut(&mut Self, &str) -> Result<bool, MeshIoError>,
    {
        self.blocks.rewind()?;
        self.report = ReadReport::default();
        while let Some(word) = self.blocks.next_word()? {
            let name = self.blocks.read_block_name(&word)?;
            log::debug!("line {}: block `{name}`", self.blocks.line());
            if !handle(self, &name)? {
                self.blocks.skip_block(&name)?;
            }
        }
        Ok(())
    }

    pub(crate) fn skip_unknown_block(&mut self, name: &str) -> Result<(), MeshIoError> {
        log::warn!(
            "line {}: skipping unrecognized block `{name}`",
            self.blocks.line()
        );
        self.report.skipped_blocks.push(name.to_string());
        self.blocks.skip_block(name)
    }

    /// Registered kind of `variable`, or `None` when it is unknown and
    /// variable errors are being ignored.
    pub(crate) fn variable_kind(&mut self, variable: &str) -> Result<Option<VariableKind>, MeshIoError> {
        if let Some(kind) = self.registry.variable_kind(variable) {
            return Ok(Some(kind));
        }
        if self.options.ignore_variable_errors {
            log::warn!(
                "line {}: variable `{variable}` is not registered; ignoring it",
                self.blocks.line()
            );
            self.report.ignored_variables.push(variable.to_string());
            return Ok(None);
        }
        Err(self
            .blocks
            .error(ParseErrorKind::UnknownVariable, "variable is not registered")
            .with_found(variable)
            .into())
    }

    pub(crate) fn reorder_entity_id(&mut self, kind: EntityKind, raw: u64) -> u64 {
        match kind {
            EntityKind::Geometry => self.reorder.geometry_id(raw),
            EntityKind::Element => self.reorder.element_id(raw),
            EntityKind::Condition => self.reorder.condition_id(raw),
        }
    }

    pub(crate) fn missing_id(&self, what: &str, raw: u64) -> ParseError {
        self.blocks
            .error(ParseErrorKind::MissingId, format!("{what} {raw} not found"))
            .with_found(raw.to_string())
    }

    fn log_elapsed(&self, what: &str, started: Instant) {
        if !self.options.skip_timer {
            log::info!("{what} took {:.3?}", started.elapsed());
        }
    }

    // ---------------------------------------------------------------------
    // full and selective reads
    // ---------------------------------------------------------------------

    /// Read every block of the stream into `model_part`.
    pub fn read_model_part(&mut self, model_part: &mut ModelPart) -> Result<(), MeshIoError> {
        let started = Instant::now();
        self.for_each_block(|reader, name| {
            match name {
                "ModelPartData" => reader.read_data_block(name, &mut model_part.data)?,
                "Table" => reader.read_table_block(&mut model_part.tables)?,
                "Properties" => reader.read_properties_block(&mut model_part.properties)?,
                "Nodes" => reader.read_nodes_block(&mut model_part.nodes)?,
                "Geometries" => reader.read_model_part_entities(EntityKind::Geometry, model_part)?,
                "Elements" => reader.read_model_part_entities(EntityKind::Element, model_part)?,
                "Conditions" => reader.read_model_part_entities(EntityKind::Condition, model_part)?,
                "NodalData" => reader.read_nodal_data_block(&mut model_part.nodes)?,
                "ElementalData" => {
                    reader.read_entity_data_block(EntityKind::Element, &mut model_part.elements)?
                }
                "ConditionalData" => {
                    reader.read_entity_data_block(EntityKind::Condition, &mut model_part.conditions)?
                }
                "CommunicatorData" => {
                    let data = reader.read_communicator_data_block(model_part)?;
                    model_part.communicator = Some(data);
                }
                "Mesh" => {
                    let mesh = reader.read_mesh_block(model_part)?;
                    model_part.meshes.insert(mesh.id, mesh);
                }
                "SubModelPart" => {
                    let sub = reader.read_sub_model_part_block(model_part)?;
                    model_part.sub_model_parts.insert(sub.name.clone(), sub);
                }
                other => reader.skip_unknown_block(other)?,
            }
            Ok(true)
        })?;
        self.log_elapsed("Reading model part", started);
        Ok(())
    }

    fn read_model_part_entities(
        &mut self,
        kind: EntityKind,
        model_part: &mut ModelPart,
    ) -> Result<(), MeshIoError> {
        let ModelPart {
            nodes,
            properties,
            geometries,
            elements,
            conditions,
            ..
        } = model_part;
        let out = match kind {
            EntityKind::Geometry => geometries,
            EntityKind::Element => elements,
            EntityKind::Condition => conditions,
        };
        self.read_entities_block(kind, nodes, properties, out)
    }

    /// Read only the `Nodes` blocks.
    pub fn read_nodes(&mut self, nodes: &mut EntityContainer<Node>) -> Result<(), MeshIoError> {
        self.for_each_block(|reader, name| {
            if name != "Nodes" {
                return Ok(false);
            }
            reader.read_nodes_block(nodes)?;
            Ok(true)
        })
    }

    /// Number of distinct nodes in the stream.
    pub fn count_nodes(&mut self) -> Result<usize, MeshIoError> {
        let mut nodes = EntityContainer::new();
        self.read_nodes(&mut nodes)?;
        Ok(nodes.len())
    }

    /// Read only the `Properties` blocks.
    pub fn read_properties(
        &mut self,
        properties: &mut EntityContainer<Properties>,
    ) -> Result<(), MeshIoError> {
        self.for_each_block(|reader, name| {
            if name != "Properties" {
                return Ok(false);
            }
            reader.read_properties_block(properties)?;
            Ok(true)
        })
    }

    /// Read only the entity blocks of `kind`, resolving node references
    /// against `nodes`. Missing property sets are created in `properties`.
    pub fn read_entities(
        &mut self,
        kind: EntityKind,
        nodes: &EntityContainer<Node>,
        properties: &mut EntityContainer<Properties>,
        out: &mut EntityContainer<Entity>,
    ) -> Result<(), MeshIoError> {
        self.for_each_block(|reader, name| {
            if name != kind.block_name() {
                return Ok(false);
            }
            reader.read_entities_block(kind, nodes, properties, out)?;
            Ok(true)
        })
    }

    pub fn read_geometries(
        &mut self,
        nodes: &EntityContainer<Node>,
        out: &mut EntityContainer<Entity>,
    ) -> Result<(), MeshIoError> {
        let mut unused = EntityContainer::new();
        self.read_entities(EntityKind::Geometry, nodes, &mut unused, out)
    }

    pub fn read_elements(
        &mut self,
        nodes: &EntityContainer<Node>,
        properties: &mut EntityContainer<Properties>,
        out: &mut EntityContainer<Entity>,
    ) -> Result<(), MeshIoError> {
        self.read_entities(EntityKind::Element, nodes, properties, out)
    }

    pub fn read_conditions(
        &mut self,
        nodes: &EntityContainer<Node>,
        properties: &mut EntityContainer<Properties>,
        out: &mut EntityContainer<Entity>,
    ) -> Result<(), MeshIoError> {
        self.read_entities(EntityKind::Condition, nodes, properties, out)
    }
}

impl<R: BufRead + Seek, O: IdReorder> ModelPartReader for MdpaReader<'_, R, O> {
    fn read_model_part(&mut self, model_part: &mut ModelPart) -> Result<(), MeshIoError> {
        MdpaReader::read_model_part(self, model_part)
    }
}
