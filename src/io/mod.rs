//! Model part I/O.
//!
//! The `.mdpa` stack is layered bottom-up: [`scanner`] produces words with
//! comments removed, [`block`] recognizes `Begin`/`End` statements and typed
//! tokens, [`value`] handles field values, and [`mdpa`] holds the reader,
//! the writer and the connectivity passes. [`partitioned`] rewrites one
//! source into per-partition outputs.

pub mod block;
pub mod mdpa;
pub mod partitioned;
pub mod reorder;
pub mod scanner;
pub mod value;

pub use mdpa::writer::{MdpaWriteOptions, MdpaWriter};
pub use mdpa::{MdpaReadOptions, MdpaReader, ReadReport};
pub use partitioned::{partition_dir, partition_file_path};
pub use reorder::{ConsecutiveReorder, IdReorder, IdentityReorder};

use crate::mesh_error::MeshIoError;
use crate::model::ModelPart;
use std::io::Write;

/// Anything that can fill a [`ModelPart`].
pub trait ModelPartReader {
    /// Read the whole source into `model_part`.
    fn read_model_part(&mut self, model_part: &mut ModelPart) -> Result<(), MeshIoError>;
}

/// Anything that can serialize a [`ModelPart`].
pub trait ModelPartWriter {
    /// Write `model_part` to `writer`.
    fn write_model_part<W: Write>(&self, writer: W, model_part: &ModelPart) -> Result<(), MeshIoError>;
}
