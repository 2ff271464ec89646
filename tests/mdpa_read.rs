mod util;

use mesh_mdpa::prelude::*;
use util::{STRIP, parse_kind, read, reader, registry};

#[test]
fn two_nodes_and_one_element() {
    let text = "Begin Nodes\n1 0.0 0.0 0.0\n2 1.0 0.0 0.0\nEnd Nodes\nBegin Elements Triangle\n1 1 1 2\nEnd Elements\n";
    let mp = read(text).expect("valid mesh");
    assert_eq!(mp.nodes.len(), 2);
    assert_eq!(mp.elements.len(), 1);
    let element = mp.element(1).unwrap();
    assert_eq!(element.nodes, vec![1, 2]);
    assert_eq!(element.type_name, "Triangle");
    assert_eq!(element.properties_id, Some(1));
    assert!(mp.properties.contains(1), "missing property set is created");
}

#[test]
fn unknown_nested_block_is_skipped() {
    let text = "Begin Foo\nBegin Bar\nEnd Bar\nEnd Foo\nBegin Nodes\n1 0 0 0\nEnd Nodes\n";
    let registry = registry();
    let mut r = reader(text, &registry);
    let mut mp = ModelPart::new("Main");
    r.read_model_part(&mut mp).unwrap();
    assert_eq!(mp.nodes.len(), 1);
    assert_eq!(r.report().skipped_blocks, vec!["Foo".to_string()]);
}

#[test]
fn unregistered_type_fails_on_its_header() {
    let text = "Begin Nodes\n1 0 0 0\n2 1 0 0\nEnd Nodes\nBegin Elements Hexahedron\n1 1 1 2\nEnd Elements\n";
    let err = read(text).unwrap_err();
    let parse = err.as_parse().unwrap();
    assert_eq!(parse.kind, ParseErrorKind::UnknownType);
    assert_eq!(parse.line, 5);
    assert_eq!(parse.found.as_deref(), Some("Hexahedron"));
}

#[test]
fn missing_end_is_reported_not_truncated() {
    let text = "Begin Nodes\n1 0 0 0\n2 1 0 0\n";
    assert_eq!(parse_kind(read(text)), ParseErrorKind::UnexpectedEof);
    let text = "Begin Nodes\n1 0 0 0\nEnd Elements\n";
    assert_eq!(parse_kind(read(text)), ParseErrorKind::Grammar);
}

#[test]
fn duplicate_nodes_keep_the_first_record() {
    let text = "Begin Nodes\n1 0 0 0\n2 1 0 0\n1 9 9 9\nEnd Nodes\nBegin Nodes\n2 5 5 5\nEnd Nodes\n";
    let registry = registry();
    let mut r = reader(text, &registry);
    let mut mp = ModelPart::new("Main");
    r.read_model_part(&mut mp).unwrap();
    assert_eq!(mp.nodes.len(), 2);
    assert_eq!(r.report().node_records, 4);
    assert_eq!(r.report().duplicate_nodes, 2);
    assert_eq!(mp.node(1).unwrap().coordinates, [0.0, 0.0, 0.0]);
    assert_eq!(mp.node(2).unwrap().coordinates, [1.0, 0.0, 0.0]);
}

#[test]
fn strip_is_read_completely() {
    let mp = read(STRIP).unwrap();
    assert_eq!(mp.data.get("STEP"), Some(&Value::Int(3)));
    assert_eq!(mp.tables[&1].value_at(50.0), Some(75.0));

    let props = mp.properties.get(1).unwrap();
    assert_eq!(props.value("DENSITY"), Some(&Value::Double(7850.0)));
    assert_eq!(props.value("MATERIAL_NAME"), Some(&Value::String("steel".into())));
    assert_eq!(props.table("TEMPERATURE", "YOUNG_MODULUS").unwrap().points.len(), 2);

    assert_eq!(mp.nodes.len(), 6);
    assert_eq!(mp.elements.len(), 4);
    assert_eq!(mp.conditions.len(), 3);
    assert_eq!(mp.condition(3).unwrap().nodes, vec![3, 6]);

    let n1 = mp.node(1).unwrap();
    assert!(n1.is_fixed("DISPLACEMENT_X"));
    assert_eq!(
        mp.node(5).unwrap().value("VELOCITY"),
        Some(&Value::Array3([1.0, 0.0, 0.0]))
    );
    assert_eq!(
        mp.element(4).unwrap().value("TEMPERATURE"),
        Some(&Value::Double(293.15))
    );
}

#[test]
fn sub_model_part_ids_propagate_upwards() {
    let mp = read(STRIP).unwrap();
    let walls = mp.sub_model_part("Walls").unwrap();
    assert_eq!(walls.node_ids, vec![1, 2, 3, 6]);
    assert_eq!(walls.condition_ids, vec![1, 3]);
    assert_eq!(walls.data.get("IS_RESTARTED"), Some(&Value::Bool(false)));
    let right = mp.sub_model_part("Walls.Right").unwrap();
    assert_eq!(right.node_ids, vec![3, 6]);
    assert!(mp.sub_model_part("Walls.Left").is_none());
}

#[test]
fn sub_model_part_must_reference_existing_ids() {
    let text = "Begin Nodes\n1 0 0 0\nEnd Nodes\nBegin SubModelPart A\nBegin SubModelPartNodes\n1\n7\nEnd SubModelPartNodes\nEnd SubModelPart\n";
    let err = read(text).unwrap_err();
    let parse = err.as_parse().unwrap();
    assert_eq!(parse.kind, ParseErrorKind::MissingId);
    assert_eq!(parse.line, 7);
}

#[test]
fn unknown_variable_is_fatal_unless_ignored() {
    let text = "Begin Nodes\n1 0 0 0\nEnd Nodes\nBegin NodalData PRESSURE\n1 0 3.5\nEnd NodalData\nBegin Properties 0\nVISCOSITY [2](1, 2)\nDENSITY 1.0\nEnd Properties\n";
    assert_eq!(parse_kind(read(text)), ParseErrorKind::UnknownVariable);

    let registry = registry();
    let options = MdpaReadOptions {
        ignore_variable_errors: true,
        skip_timer: true,
        ..Default::default()
    };
    let mut r = reader(text, &registry).with_options(options);
    let mut mp = ModelPart::new("Main");
    r.read_model_part(&mut mp).unwrap();
    assert!(mp.node(1).unwrap().data.is_empty());
    let props = mp.properties.get(0).unwrap();
    assert_eq!(props.values.len(), 1);
    assert_eq!(props.value("DENSITY"), Some(&Value::Double(1.0)));
    assert_eq!(r.report().ignored_variables, vec!["PRESSURE", "VISCOSITY"]);
}

#[test]
fn element_referencing_unknown_node() {
    let text = "Begin Nodes\n1 0 0 0\nEnd Nodes\nBegin Elements Triangle\n1 0 1 2\nEnd Elements\n";
    let err = read(text).unwrap_err();
    let parse = err.as_parse().unwrap();
    assert_eq!(parse.kind, ParseErrorKind::MissingId);
    assert_eq!(parse.found.as_deref(), Some("2"));
}

#[test]
fn zero_ids_are_rejected() {
    assert_eq!(parse_kind(read("Begin Nodes\n0 0 0 0\nEnd Nodes\n")), ParseErrorKind::MissingId);
    assert_eq!(parse_kind(read("Begin Mesh 0\nEnd Mesh\n")), ParseErrorKind::MissingId);
}

#[test]
fn data_for_missing_element_is_skipped() {
    let text = "Begin Nodes\n1 0 0 0\n2 1 0 0\nEnd Nodes\nBegin Elements Triangle\n1 0 1 2\nEnd Elements\nBegin ElementalData TEMPERATURE\n1 10.0\n5 20.0\nEnd ElementalData\n";
    let mp = read(text).unwrap();
    assert_eq!(mp.element(1).unwrap().value("TEMPERATURE"), Some(&Value::Double(10.0)));
}

#[test]
fn fixity_of_non_scalar_variable_is_dropped() {
    let text = "Begin Nodes\n1 0 0 0\nEnd Nodes\nBegin NodalData VELOCITY\n1 1 [3](0,0,1)\nEnd NodalData\n";
    let mp = read(text).unwrap();
    let node = mp.node(1).unwrap();
    assert!(!node.is_fixed("VELOCITY"));
    assert_eq!(node.value("VELOCITY"), Some(&Value::Array3([0.0, 0.0, 1.0])));
}

#[test]
fn invalid_values_carry_the_line() {
    let text = "Begin Nodes\n1 0 0 0\n// comment\n/* multi\nline */ 2 1 zero 0\nEnd Nodes\n";
    let err = read(text).unwrap_err();
    let parse = err.as_parse().unwrap();
    assert_eq!(parse.kind, ParseErrorKind::InvalidValue);
    assert_eq!(parse.line, 5);
    assert_eq!(parse.found.as_deref(), Some("zero"));
    assert!(err.to_string().contains("in line 5"));
}

#[test]
fn consecutive_reorder_renumbers_in_first_seen_order() {
    let text = "Begin Nodes\n10 0 0 0\n30 2 0 0\n20 1 0 0\nEnd Nodes\nBegin Elements Triangle\n7 1 30 20\nEnd Elements\n";
    let registry = registry();
    let mut r = reader(text, &registry).with_reorder(ConsecutiveReorder::new());
    let mut mp = ModelPart::new("Main");
    r.read_model_part(&mut mp).unwrap();
    assert_eq!(mp.nodes.ids().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(mp.node(2).unwrap().x(), 2.0);
    let element = mp.element(1).unwrap();
    assert_eq!(element.nodes, vec![2, 3]);
    assert_eq!(r.reorder().elements.get(7), Some(1));
    assert_eq!(r.reorder().nodes.originals(), vec![10, 30, 20]);
}

#[test]
fn meshes_and_communicator_data() {
    let text = r#"
Begin Nodes
  1 0 0 0
  2 1 0 0
  3 2 0 0
End Nodes
Begin Elements Triangle
  1 0 1 2
End Elements
Begin Mesh 1
  Begin MeshData
    TEMPERATURE 20.0
  End MeshData
  Begin MeshNodes
    1
    2
  End MeshNodes
  Begin MeshElements
    1
  End MeshElements
End Mesh
Begin CommunicatorData
  NEIGHBOUR_INDICES [2](1, -1)
  NUMBER_OF_COLORS 2
  Begin LocalNodes 0
    1
    2
  End LocalNodes
  Begin LocalNodes 1
    2
  End LocalNodes
  Begin GhostNodes 1
    3
  End GhostNodes
End CommunicatorData
"#;
    let mp = read(text).unwrap();
    let mesh = &mp.meshes[&1];
    assert_eq!(mesh.node_ids, vec![1, 2]);
    assert_eq!(mesh.element_ids, vec![1]);
    assert_eq!(mesh.data.get("TEMPERATURE"), Some(&Value::Double(20.0)));

    let comm = mp.communicator.as_ref().unwrap();
    assert_eq!(comm.neighbour_indices, vec![1, -1]);
    assert_eq!(comm.number_of_colors, 2);
    assert_eq!(comm.neighbour(0), Some(1));
    assert_eq!(comm.neighbour(1), None);
    assert_eq!(comm.local_nodes_of_color(0), &[2]);
    assert_eq!(comm.ghost_nodes_of_color(0), &[3]);
}

#[test]
fn unknown_communicator_statement_is_a_grammar_error() {
    let text = "Begin CommunicatorData\nCOLORS 2\nEnd CommunicatorData\n";
    assert_eq!(parse_kind(read(text)), ParseErrorKind::Grammar);
}

#[test]
fn selective_reads() {
    let registry = registry();
    let mut r = reader(STRIP, &registry);
    assert_eq!(r.count_nodes().unwrap(), 6);

    let mut nodes = EntityContainer::new();
    r.read_nodes(&mut nodes).unwrap();
    let mut properties = EntityContainer::new();
    r.read_properties(&mut properties).unwrap();
    assert_eq!(properties.len(), 1);

    let mut elements = EntityContainer::new();
    r.read_elements(&nodes, &mut properties, &mut elements).unwrap();
    let mut conditions = EntityContainer::new();
    r.read_conditions(&nodes, &mut properties, &mut conditions).unwrap();
    let mut geometries = EntityContainer::new();
    r.read_geometries(&nodes, &mut geometries).unwrap();
    assert_eq!(elements.len(), 4);
    assert_eq!(conditions.len(), 3);
    assert!(geometries.is_empty());
}

#[test]
fn open_appends_extension() {
    let dir = std::env::temp_dir().join(format!("mesh-mdpa-open-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("strip.mdpa"), STRIP).unwrap();
    let registry = registry();
    let mut r = MdpaReader::open(dir.join("strip"), &registry).unwrap();
    assert_eq!(r.base_name().as_deref(), Some("strip"));
    assert_eq!(r.count_nodes().unwrap(), 6);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn quoted_strings_may_contain_blanks() {
    let text = "Begin Properties 1\n  MATERIAL_NAME \"stainless  steel // 316\"\n  DENSITY 8000.0\nEnd Properties\n";
    let mp = read(text).unwrap();
    let props = mp.properties.get(1).unwrap();
    assert_eq!(
        props.value("MATERIAL_NAME"),
        Some(&Value::String("stainless  steel // 316".into()))
    );
    assert_eq!(props.value("DENSITY"), Some(&Value::Double(8000.0)));
}

#[test]
fn unterminated_string_is_unexpected_eof() {
    let text = "Begin Properties 1\n  MATERIAL_NAME \"stainless steel\nEnd Properties\n";
    assert_eq!(parse_kind(read(text)), ParseErrorKind::UnexpectedEof);
}

#[test]
fn non_ascii_text_is_decoded() {
    let text = "Begin ModelPartData\n  MATERIAL_NAME \"acier inoxydable \u{e0} 18 %\"\nEnd ModelPartData\n";
    let mp = read(text).unwrap();
    assert_eq!(
        mp.data.get("MATERIAL_NAME"),
        Some(&Value::String("acier inoxydable \u{e0} 18 %".into()))
    );
}

#[test]
fn zero_column_matrix_reads_in_either_form() {
    for body in ["[2,0]()", "[2,0]((),())"] {
        let text = format!("Begin ModelPartData\n  LOCAL_AXES {body}\nEnd ModelPartData\n");
        let mp = read(&text).unwrap();
        assert_eq!(
            mp.data.get("LOCAL_AXES"),
            Some(&Value::Matrix(Matrix::new(2, 0, Vec::new()).unwrap())),
            "{body}"
        );
    }
}
