#![allow(dead_code)]
use mesh_mdpa::prelude::*;
use std::io::Cursor;

/// Two rows of three nodes split into four triangles, with boundary
/// conditions on the bottom and right edges.
///
/// ```text
/// 4---5---6
/// |\  |\  |
/// | \ | \ |
/// 1---2---3
/// ```
pub const STRIP: &str = r#"// strip of four triangles
Begin ModelPartData
  STEP 3
End ModelPartData

Begin Table 1 TEMPERATURE YOUNG_MODULUS
  0.0 100.0
  100.0 50.0
End Table

Begin Properties 1
  DENSITY 7850.0
  MATERIAL_NAME "steel"
  Begin Table TEMPERATURE YOUNG_MODULUS
    0.0 2.1e11
    500.0 1.5e11
  End Table
End Properties

Begin Nodes
  1 0.0 0.0 0.0
  2 1.0 0.0 0.0
  3 2.0 0.0 0.0
  4 0.0 1.0 0.0
  5 1.0 1.0 0.0
  6 2.0 1.0 0.0
End Nodes

Begin Elements Element2D3N /* linear triangles */
  1 1 1 2 4
  2 1 2 5 4
  3 1 2 3 5
  4 1 3 6 5
End Elements

Begin Conditions LineCondition2D2N
  1 1 1 2
  2 1 2 3
  3 1 3 6
End Conditions

Begin NodalData DISPLACEMENT_X
  1 1 0.0
  4 1 0.0
End NodalData

Begin NodalData VELOCITY
  5 0 [3](1.0, 0.0, 0.0)
End NodalData

Begin ElementalData TEMPERATURE
  4 293.15
End ElementalData

Begin SubModelPart Walls
  Begin SubModelPartData
    IS_RESTARTED 0
  End SubModelPartData
  Begin SubModelPartNodes
    1
    2
  End SubModelPartNodes
  Begin SubModelPartConditions
    1
  End SubModelPartConditions
  Begin SubModelPart Right
    Begin SubModelPartNodes
      3
      6
    End SubModelPartNodes
    Begin SubModelPartConditions
      3
    End SubModelPartConditions
  End SubModelPart
End SubModelPart
"#;

/// Node partition of [`STRIP`]: the right column goes to partition 1.
pub const STRIP_NODE_PARTITIONS: [usize; 6] = [0, 0, 1, 0, 0, 1];

pub fn registry() -> KernelRegistry {
    KernelRegistry::with_core_variables()
        .with_element("Triangle", 2)
        .with_element("Element2D3N", 3)
        .with_condition("LineCondition2D2N", 2)
        .with_condition("PointCondition", 1)
        .with_geometry("Line2D2", 2)
        .with_variable("STEP", VariableKind::Int)
        .with_variable("IS_RESTARTED", VariableKind::Bool)
        .with_variable("TEMPERATURE", VariableKind::Double)
        .with_variable("YOUNG_MODULUS", VariableKind::Double)
        .with_variable("DENSITY", VariableKind::Double)
        .with_variable("DISPLACEMENT_X", VariableKind::Double)
        .with_variable("MATERIAL_NAME", VariableKind::String)
        .with_variable("VELOCITY", VariableKind::Array3)
        .with_variable("LOCAL_AXES", VariableKind::Matrix)
}

pub fn reader<'r>(text: &str, registry: &'r KernelRegistry) -> MdpaReader<'r, Cursor<Vec<u8>>> {
    let options = MdpaReadOptions {
        skip_timer: true,
        ..Default::default()
    };
    MdpaReader::new(Cursor::new(text.as_bytes().to_vec()), registry).with_options(options)
}

pub fn read(text: &str) -> Result<ModelPart, MeshIoError> {
    let registry = registry();
    let mut model_part = ModelPart::new("Main");
    reader(text, &registry).read_model_part(&mut model_part)?;
    Ok(model_part)
}

pub fn parse_kind(result: Result<ModelPart, MeshIoError>) -> ParseErrorKind {
    let err = result.expect_err("expected a parse error");
    err.parse_kind()
        .unwrap_or_else(|| panic!("not a parse error: {err:?}"))
}
