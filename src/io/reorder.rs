//! Identifier remapping strategies.
//!
//! Every raw node, geometry, element and condition id parsed from a stream
//! passes through an [`IdReorder`] before it is stored or dereferenced, so a
//! single strategy decides the id policy for every block reader, the graph
//! builder and the partition rewriter. Property ids are never remapped.

use hashbrown::HashMap;

/// Translation from raw stream ids to internal ids. Defaults to identity.
pub trait IdReorder {
    fn node_id(&mut self, raw: u64) -> u64 {
        raw
    }

    fn geometry_id(&mut self, raw: u64) -> u64 {
        raw
    }

    fn element_id(&mut self, raw: u64) -> u64 {
        raw
    }

    fn condition_id(&mut self, raw: u64) -> u64 {
        raw
    }
}

impl<T: IdReorder + ?Sized> IdReorder for &mut T {
    fn node_id(&mut self, raw: u64) -> u64 {
        (**self).node_id(raw)
    }

    fn geometry_id(&mut self, raw: u64) -> u64 {
        (**self).geometry_id(raw)
    }

    fn element_id(&mut self, raw: u64) -> u64 {
        (**self).element_id(raw)
    }

    fn condition_id(&mut self, raw: u64) -> u64 {
        (**self).condition_id(raw)
    }
}

/// Ids are used exactly as written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentityReorder;

impl IdReorder for IdentityReorder {}

/// Consecutive numbering of one id space in order of first appearance.
#[derive(Clone, Debug, Default)]
pub struct ConsecutiveIds {
    map: HashMap<u64, u64>,
}

impl ConsecutiveIds {
    pub fn get_or_assign(&mut self, raw: u64) -> u64 {
        let next = self.map.len() as u64 + 1;
        *self.map.entry(raw).or_insert(next)
    }

    /// Number of distinct raw ids seen.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Internal id previously assigned to `raw`.
    pub fn get(&self, raw: u64) -> Option<u64> {
        self.map.get(&raw).copied()
    }

    /// Raw ids indexed by `internal - 1`.
    pub fn originals(&self) -> Vec<u64> {
        let mut out = vec![0; self.map.len()];
        for (&raw, &internal) in &self.map {
            out[(internal - 1) as usize] = raw;
        }
        out
    }
}

/// Renumbers all four id spaces to `1..=n` in order of first appearance.
///
/// The mapping persists across passes, so a graph-building pass followed by
/// a partitioning pass over the same source sees the same internal ids.
#[derive(Clone, Debug, Default)]
pub struct ConsecutiveReorder {
    pub nodes: ConsecutiveIds,
    pub geometries: ConsecutiveIds,
    pub elements: ConsecutiveIds,
    pub conditions: ConsecutiveIds,
}

impl ConsecutiveReorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdReorder for ConsecutiveReorder {
    fn node_id(&mut self, raw: u64) -> u64 {
        self.nodes.get_or_assign(raw)
    }

    fn geometry_id(&mut self, raw: u64) -> u64 {
        self.geometries.get_or_assign(raw)
    }

    fn element_id(&mut self, raw: u64) -> u64 {
        self.elements.get_or_assign(raw)
    }

    fn condition_id(&mut self, raw: u64) -> u64 {
        self.conditions.get_or_assign(raw)
    }
}
