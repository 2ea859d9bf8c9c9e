use std::f64::consts::PI;

use devsim_models::prelude::*;
use serde_json::json;

fn square_mesh() -> MeshDescription {
    serde_json::from_value(json!({
        "nodes": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        "triangles": [[0, 1, 2], [0, 2, 3]],
        "contacts": { "outer": [2, 1] }
    }))
    .unwrap()
}

#[test]
fn mesh_description_defaults_missing_tables() {
    let mesh = square_mesh();
    assert_eq!(mesh.dimension, None);
    assert!(mesh.edges.is_empty());
    assert!(mesh.tetrahedra.is_empty());
    assert!(mesh.interfaces.is_empty());

    let text = serde_json::to_string(&mesh).unwrap();
    let back: MeshDescription = serde_json::from_str(&text).unwrap();
    assert_eq!(back, mesh);
}

#[test]
fn device_regions_come_from_descriptions() {
    let mut device = Device::new("diode");
    let region = device.add_region("bulk", square_mesh()).unwrap();
    assert_eq!(region.dimension(), 2);
    assert_eq!(region.edges().len(), 5);
    assert_eq!(&*region.contact("outer").unwrap().nodes, &[1, 2]);
    assert_eq!(region.location(), Location::new("diode", "bulk"));
}

#[test]
fn parameter_sets_drive_cylindrical_models() {
    let parameters: ParameterSet = serde_json::from_str(
        r#"{
            "global": { "raxis_zero": 0.0 },
            "regions": {
                "bulk": { "raxis_variable": "x" },
                "missing": { "raxis_variable": "y" }
            }
        }"#,
    )
    .unwrap();
    assert_eq!(parameters.global["raxis_zero"], ParameterValue::Number(0.0));

    let mut device = Device::new("diode");
    device.add_region("bulk", square_mesh()).unwrap();
    device.apply(&parameters);

    let region = device.region("bulk").unwrap();
    assert_eq!(region.parameter(names::RAXIS_VARIABLE).unwrap().as_text(), "x");
    create_cylindrical_surface_area(region).unwrap();
    let area = device.evaluate::<NodeKind>(names::CYLINDRICAL_SURFACE_AREA);
    let area = area[0].as_ref().unwrap();
    assert!((area.iter().sum::<f64>() - 2.0 * PI).abs() < 1e-12);
}

#[test]
fn device_parameters_reach_existing_regions() {
    let mut device = Device::new("diode");
    device.add_region("bulk", square_mesh()).unwrap();
    let region = device.region("bulk").unwrap();
    region.set_parameter(names::RAXIS_VARIABLE, "y");
    assert!(region.parameter(names::RAXIS_ZERO).is_none());

    device.set_parameter(names::RAXIS_ZERO, 0.5);
    let region = device.region("bulk").unwrap();
    assert_eq!(region.number_parameter(names::RAXIS_ZERO), Some(0.5));

    // A region-local value wins over the device value.
    device.set_parameter(names::RAXIS_VARIABLE, "x");
    let region = device.region("bulk").unwrap();
    assert_eq!(region.parameter(names::RAXIS_VARIABLE).unwrap().as_text(), "y");
    region.clear_parameter(names::RAXIS_VARIABLE);
    assert_eq!(region.parameter(names::RAXIS_VARIABLE).unwrap().as_text(), "x");
}

#[test]
fn bad_meshes_are_rejected() {
    let mut device = Device::new("diode");
    let mesh: MeshDescription = serde_json::from_value(json!({
        "nodes": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        "edges": [[0, 2]]
    }))
    .unwrap();
    assert!(matches!(device.add_region("bad", mesh), Err(ModelError::InvalidMesh(_))));
    assert!(device.regions().is_empty());
}
