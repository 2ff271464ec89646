//! Per-partition communication metadata.
//!
//! Interface ids follow the file convention: id `0` holds an undifferentiated
//! list, id `c + 1` holds the nodes shared over interface color `c`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicatorData {
    /// For each color, the neighbouring partition reached through it, or `-1`.
    pub neighbour_indices: Vec<i64>,
    pub number_of_colors: usize,
    /// Interface id → node ids owned by this partition.
    pub local_nodes: BTreeMap<usize, Vec<u64>>,
    /// Interface id → node ids owned by a neighbour.
    pub ghost_nodes: BTreeMap<usize, Vec<u64>>,
}

impl CommunicatorData {
    /// Local nodes on the interface with color `color`.
    pub fn local_nodes_of_color(&self, color: usize) -> &[u64] {
        self.local_nodes
            .get(&(color + 1))
            .map_or(&[], Vec::as_slice)
    }

    /// Ghost nodes on the interface with color `color`.
    pub fn ghost_nodes_of_color(&self, color: usize) -> &[u64] {
        self.ghost_nodes
            .get(&(color + 1))
            .map_or(&[], Vec::as_slice)
    }

    /// Union of all ghost nodes regardless of neighbour.
    pub fn all_ghost_nodes(&self) -> &[u64] {
        self.ghost_nodes.get(&0).map_or(&[], Vec::as_slice)
    }

    /// Partition reached through `color`, if any.
    pub fn neighbour(&self, color: usize) -> Option<usize> {
        self.neighbour_indices
            .get(color)
            .and_then(|&n| usize::try_from(n).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.neighbour_indices.is_empty()
            && self.number_of_colors == 0
            && self.local_nodes.is_empty()
            && self.ghost_nodes.is_empty()
    }
}
