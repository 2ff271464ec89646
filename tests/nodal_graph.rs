mod util;

use hashbrown::HashSet;
use mesh_mdpa::prelude::*;
use util::{STRIP, reader, registry};

#[test]
fn strip_graph_adjacency() {
    let registry = registry();
    let mut r = reader(STRIP, &registry);
    let graph = r.read_nodal_graph().unwrap();
    assert_eq!(graph.len(), 6);
    assert_eq!(graph.neighbors(1), &[2, 4]);
    assert_eq!(graph.neighbors(2), &[1, 3, 4, 5]);
    assert_eq!(graph.neighbors(6), &[3, 5]);
    assert_eq!(graph.first_hanging_node(), None);
    // 6 boundary edges, 3 diagonals/interior
    assert_eq!(graph.edge_count(), 9);

    let csr = graph.to_csr();
    assert_eq!(csr.xadj.len(), 7);
    assert_eq!(csr.adjncy.len(), 18);
    assert_eq!(&csr.adjncy[csr.xadj[0]..csr.xadj[1]], &[1, 3]);
}

#[test]
fn unused_node_is_hanging() {
    let text = "Begin Nodes\n1 0 0 0\n2 1 0 0\n3 2 0 0\nEnd Nodes\nBegin Elements Triangle\n1 0 1 2\nEnd Elements\n";
    let registry = registry();
    let err = reader(text, &registry).read_nodal_graph().unwrap_err();
    let parse = err.as_parse().unwrap();
    assert_eq!(parse.kind, ParseErrorKind::HangingNode);
    assert_eq!(parse.found.as_deref(), Some("3"));
}

#[test]
fn gap_in_entity_node_ids_is_hanging() {
    let text = "Begin Elements Triangle\n1 0 1 3\nEnd Elements\n";
    let registry = registry();
    let err = reader(text, &registry).read_nodal_graph().unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::HangingNode));
}

#[test]
fn unknown_type_stops_graph_pass() {
    let text = "Begin Conditions Surface\n1 0 1 2\nEnd Conditions\n";
    let registry = registry();
    let err = reader(text, &registry).read_nodal_graph().unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::UnknownType));
}

#[test]
fn graph_restricted_to_listed_entities() {
    let registry = registry();
    let mut r = reader(STRIP, &registry);
    let elements: HashSet<u64> = [4].into_iter().collect();
    let conditions: HashSet<u64> = [1].into_iter().collect();
    let graph = r.read_nodal_graph_from_entities(&elements, &conditions).unwrap();
    assert_eq!(graph.neighbors(1), &[2]);
    assert_eq!(graph.neighbors(3), &[5, 6]);
    assert!(graph.neighbors(4).is_empty());
}

#[test]
fn connectivities_by_entity_id() {
    let registry = registry();
    let mut r = reader(STRIP, &registry);
    let elements = r.read_connectivities(EntityKind::Element).unwrap();
    assert_eq!(elements.len(), 4);
    assert_eq!(elements.row(3), &[2, 3, 5]);

    let wanted: HashSet<u64> = [2, 3].into_iter().collect();
    let conditions = r.read_connectivities_in(EntityKind::Condition, &wanted).unwrap();
    assert_eq!(conditions.len(), 3);
    assert!(conditions.row(1).is_empty());
    assert_eq!(conditions.row(3), &[3, 6]);
}

#[test]
fn sub_model_part_entity_ids_by_path() {
    let registry = registry();
    let mut r = reader(STRIP, &registry);
    let (elements, conditions) = r.read_sub_model_part_entity_ids("Walls").unwrap();
    assert!(elements.is_empty());
    assert_eq!(conditions, vec![1, 3]);
    let (_, conditions) = r.read_sub_model_part_entity_ids("Walls.Right").unwrap();
    assert_eq!(conditions, vec![3]);
    let err = r.read_sub_model_part_entity_ids("Walls.Left").unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::MissingId));
}

#[test]
fn consecutive_ids_are_shared_between_passes() {
    let text = "Begin Nodes\n10 0 0 0\n20 1 0 0\nEnd Nodes\nBegin Elements Triangle\n5 0 20 10\nEnd Elements\n";
    let registry = registry();
    let mut r = reader(text, &registry).with_reorder(ConsecutiveReorder::new());
    let graph = r.read_nodal_graph().unwrap();
    assert_eq!(graph.neighbors(1), &[2]);
    let table = r.read_connectivities(EntityKind::Element).unwrap();
    assert_eq!(table.row(1), &[2, 1]);
}
