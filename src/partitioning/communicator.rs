//! Local/ghost interface lists per partition.

use super::{PartitionError, PartitioningInfo};
use crate::model::CommunicatorData;

/// Communicator data of every partition, indexed by partition.
///
/// A node held by more than one partition is local to its home partition
/// and a ghost everywhere else. For each other partition `q` holding it, the
/// node goes under interface `color(home, q) + 1`: in the home partition's
/// local lists and in `q`'s ghost lists. Interface `0` holds every local
/// node (local side) and every ghost node (ghost side) of the partition.
pub fn build_communicator_data(info: &PartitioningInfo) -> Result<Vec<CommunicatorData>, PartitionError> {
    let n = info.number_of_partitions;
    let number_of_colors = info.colors.number_of_colors();

    let mut out: Vec<CommunicatorData> = (0..n)
        .map(|p| {
            let mut neighbour_indices = vec![-1i64; number_of_colors];
            for (color, q) in info.colors.neighbours(p) {
                neighbour_indices[color] = q as i64;
            }
            CommunicatorData {
                neighbour_indices,
                number_of_colors,
                ..Default::default()
            }
        })
        .collect();

    for (i, &home) in info.nodes.home.iter().enumerate() {
        let id = i as u64 + 1;
        let Some(all) = info.nodes.partitions_of(id) else {
            continue;
        };
        if home >= n {
            return Err(PartitionError::InvalidPartitionIndex {
                kind: "node",
                id,
                partition: home,
                number_of_partitions: n,
            });
        }
        out[home].local_nodes.entry(0).or_default().push(id);
        for &other in all.iter().filter(|&&q| q != home) {
            let Some(color) = info.colors.color(home, other) else {
                return Err(PartitionError::InconsistentColoring {
                    first: home,
                    second: other,
                });
            };
            out[home].local_nodes.entry(color + 1).or_default().push(id);
            out[other].ghost_nodes.entry(color + 1).or_default().push(id);
            out[other].ghost_nodes.entry(0).or_default().push(id);
        }
    }

    for data in &mut out {
        for ids in data.local_nodes.values_mut().chain(data.ghost_nodes.values_mut()) {
            ids.sort_unstable();
            ids.dedup();
        }
    }
    Ok(out)
}
