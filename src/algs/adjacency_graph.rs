//! Id-indexed connectivity tables and the nodal adjacency graph.
//
// Both structures store one row per 1-based id at index `id - 1`. Rows are
// created lazily: touching an id beyond the current length grows the table
// up to that id and leaves every skipped slot empty, so gaps stay visible
// to later validation.
//
// The nodal graph is exported in the CSR triple external partitioners use:
//
// * `xadj[i] .. xadj[i+1]` = neighbour range of node `i + 1`
// * `adjncy`               = concatenated 0-based neighbour indices

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Rows of node ids keyed by `id - 1`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectivityTable {
    rows: Vec<Vec<u64>>,
}

impl ConnectivityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, i.e. the largest id touched so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Make slot `index` addressable. Capacity at least doubles on growth.
    pub fn ensure_index(&mut self, index: usize) {
        if index < self.rows.len() {
            return;
        }
        let wanted = index + 1;
        if wanted > self.rows.capacity() {
            let target = wanted.max(self.rows.capacity() * 2);
            self.rows.reserve_exact(target - self.rows.len());
        }
        self.rows.resize_with(wanted, Vec::new);
    }

    /// Row of `id`, empty when the id was never touched.
    pub fn row(&self, id: u64) -> &[u64] {
        id.checked_sub(1)
            .and_then(|i| self.rows.get(i as usize))
            .map_or(&[], Vec::as_slice)
    }

    /// Mutable row of `id`, growing the table as needed. `id` must be 1-based.
    pub fn row_mut(&mut self, id: u64) -> &mut Vec<u64> {
        let index = id.saturating_sub(1) as usize;
        self.ensure_index(index);
        &mut self.rows[index]
    }

    pub fn set_row(&mut self, id: u64, nodes: Vec<u64>) {
        *self.row_mut(id) = nodes;
    }

    /// `(id, row)` pairs including empty slots.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[u64])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, r)| (i as u64 + 1, r.as_slice()))
    }

    /// First id whose row is empty.
    pub fn first_empty(&self) -> Option<u64> {
        self.rows
            .iter()
            .position(Vec::is_empty)
            .map(|i| i as u64 + 1)
    }

    pub fn sort_and_dedup_rows(&mut self) {
        #[cfg(feature = "rayon")]
        self.rows.par_iter_mut().for_each(|row| {
            row.sort_unstable();
            row.dedup();
        });
        #[cfg(not(feature = "rayon"))]
        for row in &mut self.rows {
            row.sort_unstable();
            row.dedup();
        }
    }

    pub fn into_rows(self) -> Vec<Vec<u64>> {
        self.rows
    }
}

/// CSR form of a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrGraph {
    pub xadj: Vec<usize>,
    pub adjncy: Vec<usize>,
}

/// Node-to-node adjacency induced by shared entities.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodalGraph {
    table: ConnectivityTable,
}

impl NodalGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make node `id` part of the graph even if it ends up unconnected.
    pub fn touch(&mut self, id: u64) {
        self.table.ensure_index(id.saturating_sub(1) as usize);
    }

    /// Connect every node of one entity to all the others.
    pub fn add_clique(&mut self, nodes: &[u64]) {
        for &a in nodes {
            let row = self.table.row_mut(a);
            row.extend(nodes.iter().copied().filter(|&b| b != a));
        }
    }

    /// Sort and deduplicate every adjacency row.
    pub fn finish(&mut self) {
        self.table.sort_and_dedup_rows();
    }

    /// Number of node slots (largest node id seen).
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn neighbors(&self, id: u64) -> &[u64] {
        self.table.row(id)
    }

    /// First node with no neighbour at all.
    pub fn first_hanging_node(&self) -> Option<u64> {
        self.table.first_empty()
    }

    pub fn table(&self) -> &ConnectivityTable {
        &self.table
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.table.iter().map(|(_, r)| r.len()).sum::<usize>() / 2
    }

    pub fn to_csr(&self) -> CsrGraph {
        let mut xadj = Vec::with_capacity(self.len() + 1);
        let mut adjncy = Vec::new();
        xadj.push(0);
        for (_, row) in self.table.iter() {
            adjncy.extend(row.iter().map(|&n| (n - 1) as usize));
            xadj.push(adjncy.len());
        }
        CsrGraph { xadj, adjncy }
    }

    /// Partition the nodes into `nparts` parts with METIS k-way.
    /// Returns the 0-based part of node `i + 1` at index `i`.
    #[cfg(feature = "metis-support")]
    pub fn partition_metis(
        &self,
        nparts: usize,
    ) -> Result<Vec<usize>, crate::partitioning::PartitionError> {
        use crate::partitioning::PartitionError;
        use metis::Idx;

        if nparts == 0 {
            return Err(PartitionError::NoParts);
        }
        if nparts == 1 || self.is_empty() {
            return Ok(vec![0; self.len()]);
        }
        let csr = self.to_csr();
        let mut xadj: Vec<Idx> = csr.xadj.iter().map(|&v| v as Idx).collect();
        let mut adjncy: Vec<Idx> = csr.adjncy.iter().map(|&v| v as Idx).collect();
        let mut part: Vec<Idx> = vec![0; self.len()];
        metis::Graph::new(1, nparts as Idx, &mut xadj, &mut adjncy)
            .map_err(|e| PartitionError::Other(format!("METIS graph rejected: {e:?}")))?
            .part_kway(&mut part)
            .map_err(|e| PartitionError::Other(format!("METIS failed: {e:?}")))?;
        Ok(part.into_iter().map(|p| p as usize).collect())
    }
}
