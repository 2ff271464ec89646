//! Partition assignment model.
//!
//! A [`PartitioningInfo`] says, for every node, geometry, element and
//! condition, which partition owns it (its home) and which partitions hold a
//! copy of it (home plus ghosts), together with the [`ColoringGraph`] of
//! interfaces between partitions. Partition indices are 0-based; entity
//! tables are indexed by internal id minus one.
//!
//! The info is usually produced by [`derive_partitioning`] from a node
//! partition (e.g. METIS output) and consumed by the partition rewriter
//! and [`build_communicator_data`].

pub mod coloring;
pub mod communicator;
pub mod derive;
pub mod error;

pub use coloring::ColoringGraph;
pub use communicator::build_communicator_data;
pub use derive::derive_partitioning;
pub use error::PartitionError;

use crate::mesh_error::MeshIoError;
use crate::model::registry::EntityKind;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

pub type PartitionId = usize;

/// Assignment of one id space.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPartitions {
    /// Owning partition of id `i + 1`.
    pub home: Vec<PartitionId>,
    /// Every partition holding id `i + 1`. An empty table, or an empty
    /// entry, means the home partition only.
    #[serde(default)]
    pub all: Vec<Vec<PartitionId>>,
}

impl EntityPartitions {
    /// Every entity lives in its home partition only.
    pub fn from_home(home: Vec<PartitionId>) -> Self {
        Self {
            home,
            all: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.home.len()
    }

    pub fn is_empty(&self) -> bool {
        self.home.is_empty()
    }

    pub fn home_of(&self, id: u64) -> Option<PartitionId> {
        let i = usize::try_from(id.checked_sub(1)?).ok()?;
        self.home.get(i).copied()
    }

    /// Partitions holding `id`, or `None` when `id` is not covered.
    pub fn partitions_of(&self, id: u64) -> Option<&[PartitionId]> {
        let i = usize::try_from(id.checked_sub(1)?).ok()?;
        let home = self.home.get(i)?;
        match self.all.get(i) {
            Some(all) if !all.is_empty() => Some(all),
            _ => Some(std::slice::from_ref(home)),
        }
    }

    fn validate(&self, kind: &'static str, number_of_partitions: usize) -> Result<(), PartitionError> {
        if !self.all.is_empty() && self.all.len() != self.home.len() {
            return Err(PartitionError::SizeMismatch {
                what: kind,
                expected: self.home.len(),
                found: self.all.len(),
            });
        }
        let out_of_range = |id: usize, partition: usize| PartitionError::InvalidPartitionIndex {
            kind,
            id: id as u64 + 1,
            partition,
            number_of_partitions,
        };
        for (i, &home) in self.home.iter().enumerate() {
            if home >= number_of_partitions {
                return Err(out_of_range(i, home));
            }
            let Some(all) = self.all.get(i) else {
                continue;
            };
            if let Some(&bad) = all.iter().find(|&&p| p >= number_of_partitions) {
                return Err(out_of_range(i, bad));
            }
            if !all.is_empty() && !all.contains(&home) {
                return Err(PartitionError::MissingHomePartition {
                    kind,
                    id: i as u64 + 1,
                    partitions: all.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Full assignment consumed by the partition rewriter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitioningInfo {
    pub number_of_partitions: usize,
    pub colors: ColoringGraph,
    pub nodes: EntityPartitions,
    #[serde(default)]
    pub geometries: EntityPartitions,
    #[serde(default)]
    pub elements: EntityPartitions,
    #[serde(default)]
    pub conditions: EntityPartitions,
}

impl PartitioningInfo {
    /// Empty assignment over `number_of_partitions` partitions.
    pub fn new(number_of_partitions: usize) -> Self {
        Self {
            number_of_partitions,
            colors: ColoringGraph::new(number_of_partitions),
            ..Default::default()
        }
    }

    pub fn entities(&self, kind: EntityKind) -> &EntityPartitions {
        match kind {
            EntityKind::Geometry => &self.geometries,
            EntityKind::Element => &self.elements,
            EntityKind::Condition => &self.conditions,
        }
    }

    /// Check ranges, table sizes and the coloring.
    pub fn validate(&self) -> Result<(), PartitionError> {
        if self.number_of_partitions == 0 {
            return Err(PartitionError::NoParts);
        }
        if self.colors.size() != self.number_of_partitions {
            return Err(PartitionError::SizeMismatch {
                what: "coloring graph",
                expected: self.number_of_partitions,
                found: self.colors.size(),
            });
        }
        self.colors.validate()?;
        let n = self.number_of_partitions;
        self.nodes.validate("node", n)?;
        self.geometries.validate("geometry", n)?;
        self.elements.validate("element", n)?;
        self.conditions.validate("condition", n)
    }

    /// Load and validate an assignment stored as JSON.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, MeshIoError> {
        let info: Self = serde_json::from_reader(reader)?;
        info.validate()?;
        Ok(info)
    }

    pub fn to_json_writer<W: Write>(&self, writer: W) -> Result<(), MeshIoError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_way() -> PartitioningInfo {
        let mut info = PartitioningInfo::new(2);
        info.colors = ColoringGraph::from_adjacency(2, [(0, 1)]);
        info.nodes = EntityPartitions {
            home: vec![0, 0, 1],
            all: vec![vec![0], vec![0, 1], vec![1]],
        };
        info.elements = EntityPartitions::from_home(vec![0, 1]);
        info
    }

    #[test]
    fn empty_membership_falls_back_to_home() {
        let info = two_way();
        assert_eq!(info.elements.partitions_of(2), Some(&[1][..]));
        assert_eq!(info.nodes.partitions_of(2), Some(&[0, 1][..]));
        assert_eq!(info.nodes.partitions_of(0), None);
        assert_eq!(info.nodes.partitions_of(4), None);
    }

    #[test]
    fn validation_catches_out_of_range_and_missing_home() {
        let mut info = two_way();
        assert!(info.validate().is_ok());
        info.elements.home[1] = 2;
        assert!(matches!(
            info.validate(),
            Err(PartitionError::InvalidPartitionIndex { id: 2, partition: 2, .. })
        ));
        let mut info = two_way();
        info.nodes.all[1] = vec![1];
        assert!(matches!(info.validate(), Err(PartitionError::MissingHomePartition { id: 2, .. })));
        assert_eq!(PartitioningInfo::new(0).validate(), Err(PartitionError::NoParts));
    }

    #[test]
    fn json_round_trip() {
        let info = two_way();
        let mut buf = Vec::new();
        info.to_json_writer(&mut buf).unwrap();
        let back = PartitioningInfo::from_json_reader(buf.as_slice()).unwrap();
        assert_eq!(back, info);
    }
}
