//! Partition-adjacency coloring.
//!
//! Entry `(i, j)` of the coloring graph is the interface color shared by
//! partitions `i` and `j`, or [`ColoringGraph::NO_INTERFACE`]. A valid
//! coloring is symmetric, has an empty diagonal, and never gives one
//! partition two neighbours of the same color, so a color identifies a
//! single neighbour from either side.

use super::PartitionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoringGraph {
    size: usize,
    colors: Vec<i32>,
}

impl ColoringGraph {
    pub const NO_INTERFACE: i32 = -1;

    /// `size × size` graph without interfaces.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            colors: vec![Self::NO_INTERFACE; size * size],
        }
    }

    /// Build from a row-major matrix of raw entries.
    pub fn from_matrix(size: usize, colors: Vec<i32>) -> Result<Self, PartitionError> {
        let graph = Self { size, colors };
        graph.validate()?;
        Ok(graph)
    }

    /// Number of partitions.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn color(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.size || j >= self.size {
            return None;
        }
        usize::try_from(self.colors[i * self.size + j]).ok()
    }

    /// Set the color of the `i`–`j` interface on both sides.
    pub fn set_color(&mut self, i: usize, j: usize, color: usize) {
        let c = color as i32;
        self.colors[i * self.size + j] = c;
        self.colors[j * self.size + i] = c;
    }

    /// One more than the largest color in use.
    pub fn number_of_colors(&self) -> usize {
        self.colors
            .iter()
            .filter_map(|&c| usize::try_from(c).ok())
            .max()
            .map_or(0, |c| c + 1)
    }

    /// `(color, neighbour)` pairs of partition `i`, in neighbour order.
    pub fn neighbours(&self, i: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.size).filter_map(move |j| self.color(i, j).map(|c| (c, j)))
    }

    /// Greedy edge coloring: each adjacent pair, taken in ascending order,
    /// gets the smallest color used by neither endpoint yet.
    pub fn from_adjacency(size: usize, pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let edges: BTreeSet<(usize, usize)> = pairs
            .into_iter()
            .filter(|(a, b)| a != b && *a < size && *b < size)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        let mut graph = Self::new(size);
        let mut used: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); size];
        for (a, b) in edges {
            let color = (0..)
                .find(|c| !used[a].contains(c) && !used[b].contains(c))
                .unwrap_or(0);
            used[a].insert(color);
            used[b].insert(color);
            graph.set_color(a, b, color);
        }
        graph
    }

    pub fn validate(&self) -> Result<(), PartitionError> {
        if self.colors.len() != self.size * self.size {
            return Err(PartitionError::SizeMismatch {
                what: "coloring graph entries",
                expected: self.size * self.size,
                found: self.colors.len(),
            });
        }
        for i in 0..self.size {
            let mut seen = BTreeSet::new();
            for j in 0..self.size {
                let c = self.colors[i * self.size + j];
                let mirrored = self.colors[j * self.size + i];
                let bad_entry = c < Self::NO_INTERFACE || (i == j && c != Self::NO_INTERFACE);
                if bad_entry || c != mirrored || (c >= 0 && !seen.insert(c)) {
                    return Err(PartitionError::InconsistentColoring { first: i, second: j });
                }
            }
        }
        Ok(())
    }
}

impl Default for ColoringGraph {
    fn default() -> Self {
        Self::new(0)
    }
}
