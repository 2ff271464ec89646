//! Partitioning errors for mesh-mdpa

use thiserror::Error;

/// Errors raised by inconsistent partitioning input or by the partitioner bridge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionError {
    /// An entity was assigned to a partition outside `0..number_of_partitions`.
    #[error("{kind} {id} assigned to partition {partition}, but only {number_of_partitions} partitions exist")]
    InvalidPartitionIndex {
        kind: &'static str,
        id: u64,
        partition: usize,
        number_of_partitions: usize,
    },
    /// An entity lists ghost partitions but no owning partition.
    #[error("{kind} {id} has ghost copies but no home partition among {partitions:?}")]
    MissingHomePartition {
        kind: &'static str,
        id: u64,
        partitions: Vec<usize>,
    },
    /// The coloring graph is not symmetric, or colors a partition with itself.
    #[error("Coloring graph inconsistent between partitions {first} and {second}")]
    InconsistentColoring { first: usize, second: usize },
    /// A table has a size that does not match the configured partition count.
    #[error("Size mismatch for {what}: expected {expected}, found {found}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// Zero partitions were requested.
    #[error("Empty partitioning: at least one partition is required")]
    NoParts,
    /// Other errors (e.g. METIS wrapper failures)
    #[error("Partitioner error: {0}")]
    Other(String),
}
