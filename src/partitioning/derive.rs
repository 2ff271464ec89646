//! Derive a full [`PartitioningInfo`] from a node partition.
//!
//! Entities follow their nodes: an element or geometry goes to the partition
//! holding most of its nodes (ties to the lowest index); a condition goes
//! with an element that contains all of its nodes when there is one. A node
//! whose own partition ends up holding none of the entities around it is
//! moved next to them. Every node is then copied into each partition that
//! holds an entity using it, and the resulting partition adjacency is
//! colored greedily.

use super::{ColoringGraph, EntityPartitions, PartitionError, PartitionId, PartitioningInfo};
use crate::algs::ConnectivityTable;
use std::collections::BTreeSet;

fn majority(nodes: &[u64], node_home: &[PartitionId], n: usize) -> Option<PartitionId> {
    let mut counts = vec![0usize; n];
    for &node in nodes {
        let p = *node_home.get(node.checked_sub(1)? as usize)?;
        counts[p] += 1;
    }
    // max_by_key keeps the last maximum; iterate in reverse to prefer the lowest index
    (0..n).rev().max_by_key(|&p| counts[p])
}

fn entity_homes(
    kind: &'static str,
    table: &ConnectivityTable,
    node_home: &[PartitionId],
    n: usize,
) -> Result<Vec<PartitionId>, PartitionError> {
    table
        .iter()
        .map(|(id, nodes)| {
            if nodes.is_empty() {
                // slot never filled; keep tables dense
                return Ok(0);
            }
            majority(nodes, node_home, n).ok_or_else(|| {
                PartitionError::Other(format!("{kind} {id} references a node outside the partition"))
            })
        })
        .collect()
}

/// Elements containing each node, indexed by node id - 1.
fn node_to_elements(elements: &ConnectivityTable, node_count: usize) -> Vec<Vec<u64>> {
    let mut map = vec![Vec::new(); node_count];
    for (id, nodes) in elements.iter() {
        for &node in nodes {
            if let Some(list) = node.checked_sub(1).and_then(|i| map.get_mut(i as usize)) {
                list.push(id);
            }
        }
    }
    map
}

/// Build the assignment of every id space from `node_partitions`, where
/// entry `i` is the partition of node `i + 1`.
pub fn derive_partitioning(
    number_of_partitions: usize,
    node_partitions: &[PartitionId],
    elements: &ConnectivityTable,
    conditions: &ConnectivityTable,
    geometries: &ConnectivityTable,
) -> Result<PartitioningInfo, PartitionError> {
    let n = number_of_partitions;
    if n == 0 {
        return Err(PartitionError::NoParts);
    }
    if let Some((i, &p)) = node_partitions.iter().enumerate().find(|&(_, &p)| p >= n) {
        return Err(PartitionError::InvalidPartitionIndex {
            kind: "node",
            id: i as u64 + 1,
            partition: p,
            number_of_partitions: n,
        });
    }
    let node_count = node_partitions.len();
    let mut node_home = node_partitions.to_vec();

    let element_home = entity_homes("element", elements, &node_home, n)?;
    let geometry_home = entity_homes("geometry", geometries, &node_home, n)?;

    let by_node = node_to_elements(elements, node_count);
    let mut condition_home = Vec::with_capacity(conditions.len());
    for (id, nodes) in conditions.iter() {
        if nodes.is_empty() {
            condition_home.push(0);
            continue;
        }
        let mut candidates: Option<BTreeSet<u64>> = None;
        for &node in nodes {
            let around: BTreeSet<u64> = node
                .checked_sub(1)
                .and_then(|i| by_node.get(i as usize))
                .map(|l| l.iter().copied().collect())
                .unwrap_or_default();
            candidates = Some(match candidates {
                None => around,
                Some(c) => c.intersection(&around).copied().collect(),
            });
        }
        let parent = candidates
            .and_then(|c| c.first().copied())
            .and_then(|element| element_home.get(element.checked_sub(1)? as usize).copied());
        let home = match parent {
            Some(home) => home,
            None => majority(nodes, &node_home, n).ok_or_else(|| {
                PartitionError::Other(format!("condition {id} references a node outside the partition"))
            })?,
        };
        condition_home.push(home);
    }

    // holders[i] = partitions of every entity using node i + 1
    let mut holders: Vec<BTreeSet<PartitionId>> = vec![BTreeSet::new(); node_count];
    for (table, homes) in [
        (elements, &element_home),
        (conditions, &condition_home),
        (geometries, &geometry_home),
    ] {
        for ((_, nodes), &home) in table.iter().zip(homes.iter()) {
            for &node in nodes {
                if let Some(set) = node.checked_sub(1).and_then(|i| holders.get_mut(i as usize)) {
                    set.insert(home);
                }
            }
        }
    }

    let mut moved = 0usize;
    for (home, held) in node_home.iter_mut().zip(&holders) {
        if let Some(&first) = held.first() {
            if !held.contains(home) {
                *home = first;
                moved += 1;
            }
        }
    }
    if moved > 0 {
        log::debug!("moved {moved} hanging nodes next to their entities");
    }

    let mut pairs = Vec::new();
    let node_all: Vec<Vec<PartitionId>> = node_home
        .iter()
        .zip(holders)
        .map(|(&home, mut held)| {
            held.insert(home);
            pairs.extend(held.iter().filter(|&&q| q != home).map(|&q| (home, q)));
            held.into_iter().collect()
        })
        .collect();

    let info = PartitioningInfo {
        number_of_partitions: n,
        colors: ColoringGraph::from_adjacency(n, pairs),
        nodes: EntityPartitions {
            home: node_home,
            all: node_all,
        },
        geometries: EntityPartitions::from_home(geometry_home),
        elements: EntityPartitions::from_home(element_home),
        conditions: EntityPartitions::from_home(condition_home),
    };
    info.validate()?;
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(u64, &[u64])]) -> ConnectivityTable {
        let mut t = ConnectivityTable::new();
        for (id, nodes) in rows {
            t.set_row(*id, nodes.to_vec());
        }
        t
    }

    // 1 - 2 - 3 strip of two line elements
    #[test]
    fn two_element_strip() {
        let elements = table(&[(1, &[1, 2]), (2, &[2, 3])]);
        let conditions = table(&[(1, &[3])]);
        let info = derive_partitioning(2, &[0, 0, 1], &elements, &conditions, &ConnectivityTable::new())
            .unwrap();
        // element 2 ties between partitions 0 and 1
        assert_eq!(info.elements.home, vec![0, 0]);
        assert_eq!(info.conditions.home, vec![0]);
        // node 3 held only by partition 0 entities: moved
        assert_eq!(info.nodes.home, vec![0, 0, 0]);
        assert_eq!(info.colors.number_of_colors(), 0);
    }

    #[test]
    fn shared_nodes_are_ghosted() {
        let elements = table(&[(1, &[1, 2]), (2, &[2, 3]), (3, &[3, 4])]);
        let info = derive_partitioning(
            2,
            &[0, 0, 1, 1],
            &elements,
            &ConnectivityTable::new(),
            &ConnectivityTable::new(),
        )
        .unwrap();
        assert_eq!(info.elements.home, vec![0, 0, 1]);
        assert_eq!(info.nodes.partitions_of(3), Some(&[0, 1][..]));
        assert_eq!(info.nodes.home_of(3), Some(1));
        assert_eq!(info.colors.color(0, 1), Some(0));
    }

    #[test]
    fn condition_follows_its_parent_element() {
        let elements = table(&[(1, &[1, 2, 3]), (2, &[3, 4, 5])]);
        let conditions = table(&[(1, &[3, 4])]);
        let info = derive_partitioning(
            2,
            &[0, 0, 0, 1, 1],
            &elements,
            &conditions,
            &ConnectivityTable::new(),
        )
        .unwrap();
        assert_eq!(info.elements.home, vec![0, 1]);
        assert_eq!(info.conditions.home, vec![1]);
    }

    #[test]
    fn node_zero_in_a_row_is_an_error() {
        let elements = table(&[(1, &[1, 2]), (2, &[0, 2])]);
        let err = derive_partitioning(
            2,
            &[0, 1],
            &elements,
            &ConnectivityTable::new(),
            &ConnectivityTable::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PartitionError::Other(_)));

        let conditions = table(&[(1, &[0])]);
        let err = derive_partitioning(
            2,
            &[0, 1],
            &table(&[(1, &[1, 2])]),
            &conditions,
            &ConnectivityTable::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PartitionError::Other(_)));
    }

    #[test]
    fn out_of_range_node_partition() {
        let err = derive_partitioning(
            2,
            &[0, 2],
            &ConnectivityTable::new(),
            &ConnectivityTable::new(),
            &ConnectivityTable::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PartitionError::InvalidPartitionIndex { id: 2, .. }));
    }
}
