#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-mdpa
//!
//! mesh-mdpa reads, writes and partitions simulation meshes stored in the
//! block-structured `.mdpa` text format: nodes, properties, geometries,
//! elements, conditions, per-entity field data, tables, meshes, nested sub
//! model parts and parallel communicator data.
//!
//! ## Features
//! - Streaming reader with line-accurate diagnostics and skipping of unknown blocks
//! - Pluggable id remapping (identity or consecutive renumbering)
//! - Injected entity/variable registries instead of global state
//! - Nodal graph and per-entity connectivity passes, exportable as CSR
//! - Single-pass partition rewriter producing one readable file per partition,
//!   with `PARTITION_INDEX` data and derived communicator lists
//! - Optional METIS partitioning of the nodal graph (`metis-support`)
//! - Parallel node instantiation and graph finalization (`rayon`, default)
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mesh-mdpa = "0.1"
//! # features = ["metis-support"]
//! ```
//!
//! ```no_run
//! use mesh_mdpa::prelude::*;
//!
//! # fn main() -> Result<(), MeshIoError> {
//! let registry = KernelRegistry::with_core_variables()
//!     .with_element("Element2D3N", 3)
//!     .with_condition("LineCondition2D2N", 2);
//! let mut reader = MdpaReader::open("cavity", &registry)?;
//! let mut model_part = ModelPart::new("Main");
//! reader.read_model_part(&mut model_part)?;
//! # Ok(())
//! # }
//! ```
//!
//! The crate logs through the `log` facade and never installs a logger.

pub mod algs;
pub mod io;
pub mod mesh_error;
pub mod model;
pub mod partitioning;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::{ConnectivityTable, CsrGraph, NodalGraph};
    pub use crate::io::{
        ConsecutiveReorder, IdReorder, IdentityReorder, MdpaReadOptions, MdpaReader,
        MdpaWriteOptions, MdpaWriter, ModelPartReader, ModelPartWriter,
    };
    pub use crate::mesh_error::{MeshIoError, ParseError, ParseErrorKind};
    pub use crate::model::{
        CommunicatorData, Entity, EntityContainer, EntityKind, EntityPrototype, EntityRegistry,
        KernelRegistry, Matrix, Mesh, ModelPart, NodalValue, Node, Properties, Registry, SubModelPart,
        Table, Value, VariableKind, VariableRegistry,
    };
    pub use crate::partitioning::{
        ColoringGraph, EntityPartitions, PartitionError, PartitioningInfo,
        build_communicator_data, derive_partitioning,
    };
}
