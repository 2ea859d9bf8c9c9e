mod util;
use util::*;

use std::f64::consts::PI;

use devsim_models::prelude::*;

fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

fn node_values(region: &Region, name: &str) -> Vec<f64> {
    region.node_model(name).unwrap().scalar_values().unwrap().to_vec()
}

fn edge_values(region: &Region, name: &str) -> Vec<f64> {
    region.edge_model(name).unwrap().scalar_values().unwrap().to_vec()
}

#[test]
fn line_volumes_are_half_cells() {
    let region = line(&[0.0, 1.0, 3.0]);
    create_default_models(&region).unwrap();
    assert_close(&edge_values(&region, names::EDGE_COUPLE), &[1.0, 1.0]);
    assert_close(&edge_values(&region, names::EDGE_NODE_VOLUME), &[0.5, 1.0]);
    assert_close(&node_values(&region, names::NODE_VOLUME), &[0.5, 1.5, 1.0]);
    assert_close(&edge_values(&region, names::EDGE_INVERSE_LENGTH), &[1.0, 0.5]);
}

#[test]
fn unit_vectors_point_from_head_to_tail() {
    let region = line(&[0.0, 2.0, 1.0]);
    create_default_models(&region).unwrap();
    assert_close(&edge_values(&region, names::UNIT_X), &[1.0, -1.0]);
    assert!(region.edge_model(names::UNIT_Y).is_none());
    assert_close(&edge_values(&region, names::EDGE_INDEX), &[0.0, 1.0]);
}

#[test]
fn right_triangle_volumes() {
    let region = right_triangle();
    create_default_models(&region).unwrap();
    let volume = node_values(&region, names::NODE_VOLUME);
    assert_close(&volume, &[0.25, 0.125, 0.125]);
    assert!((sum(&volume) - 0.5).abs() < 1e-12);
}

#[test]
fn unit_square_volumes_and_couples() {
    let region = unit_square();
    create_default_models(&region).unwrap();
    assert_close(&node_values(&region, names::NODE_VOLUME), &[0.25; 4]);

    let couple = edge_values(&region, names::EDGE_COUPLE);
    assert_close(&couple, &[0.5, 0.0, 0.5, 0.5, 0.5]);

    let element = region.triangle_edge_model(names::ELEMENT_EDGE_COUPLE).unwrap();
    assert_eq!(element.scalar_values().unwrap().len(), 6);
    assert_close(&element.values_on_edges().unwrap(), &couple);

    assert_close(&edge_values(&region, names::UNIT_Y), &[0.0, 1.0 / 2f64.sqrt(), 1.0, 1.0, 0.0]);
}

#[test]
fn regular_tetrahedron_volume_is_partitioned() {
    let region = regular_tetrahedron();
    create_default_models(&region).unwrap();
    let volume = node_values(&region, names::NODE_VOLUME);
    assert!((sum(&volume) - 8.0 / 3.0).abs() < 1e-10, "{volume:?}");
    for v in &volume {
        assert!((v - 2.0 / 3.0).abs() < 1e-10);
    }
    assert_eq!(region.edges().len(), 6);
    assert!(region.edge_model(names::UNIT_Z).is_some());
}

#[test]
fn degenerate_triangle_is_reported() {
    let mut b = RegionBuilder::new("dev", "flat");
    b.add_node([0.0, 0.0, 0.0]);
    b.add_node([1.0, 0.0, 0.0]);
    b.add_node([2.0, 0.0, 0.0]);
    b.add_triangle([0, 1, 2]);
    let region = b.finalize().unwrap();
    create_default_models(&region).unwrap();
    let err = region.node_model(names::NODE_VOLUME).unwrap().scalar_values().unwrap_err();
    assert!(matches!(err, ModelError::InvalidMesh(_)), "{err}");
}

fn averaged_line() -> Region {
    let region = line(&[0.0, 2.0]);
    create_default_models(&region).unwrap();
    create_node_model(&region, "N").unwrap().set_values(vec![2.0, 4.0]).unwrap();
    region
}

#[test]
fn edge_averages() {
    let region = averaged_line();
    let cases = [
        (AverageType::Arithmetic, 3.0),
        (AverageType::Geometric, 8f64.sqrt()),
        (AverageType::Gradient, 1.0),
        (AverageType::NegativeGradient, -1.0),
    ];
    for (average_type, want) in cases {
        let name = format!("E_{average_type}");
        let model = create_edge_average_model(&region, &name, "N", average_type, None).unwrap();
        assert_eq!(model.name(), name);
        assert_close(&model.scalar_values().unwrap(), &[want]);
    }

    region.node_model("N").unwrap().set_uniform_value(0.7).unwrap();
    let uniform = region.edge_model("E_arithmetic").unwrap();
    assert_eq!(&*uniform.scalar_values().unwrap(), &[0.7]);
}

#[test]
fn gradient_derivative_with_respect_to_itself() {
    let region = averaged_line();
    let head = create_edge_average_model(&region, "G", "N", AverageType::Gradient, Some("N")).unwrap();
    assert_eq!(head.name(), "G:N@n0");
    assert_close(&head.scalar_values().unwrap(), &[-0.5]);
    let tail = region.edge_model("G:N@n1").unwrap();
    assert_close(&tail.scalar_values().unwrap(), &[0.5]);
}

#[test]
fn geometric_derivative_uses_chain_rule() {
    let region = averaged_line();
    create_node_model(&region, "N:V").unwrap().set_values(vec![1.0, 1.0]).unwrap();
    create_edge_average_model(&region, "G", "N", AverageType::Geometric, Some("V")).unwrap();
    let s = 2f64.sqrt();
    assert_close(&edge_values(&region, "G:V@n0"), &[0.5 * s]);
    assert_close(&edge_values(&region, "G:V@n1"), &[0.5 / s]);
}

#[test]
fn average_requires_its_node_models() {
    let region = averaged_line();
    region.clear_diagnostics();
    let err = create_edge_average_model(&region, "G", "N", AverageType::Arithmetic, Some("V")).unwrap_err();
    assert!(matches!(err, ModelError::MissingDependency { ref required, .. } if required == "N:V"));
    assert_eq!(region.diagnostic_count(Severity::Fatal), 1);
    assert!(region.edge_model("G:V@n0").is_none());
}

#[test]
fn average_follows_node_model_changes() {
    let region = averaged_line();
    let model = create_edge_average_model(&region, "A", "N", AverageType::Arithmetic, None).unwrap();
    model.scalar_values().unwrap();
    region.node_model("N").unwrap().set_values(vec![0.0, 0.0]).unwrap();
    assert!(!model.is_up_to_date());
    assert!(model.is_zero().unwrap());
}

#[test]
fn interface_normals_point_away_from_the_interface() {
    let mut b = unit_square_builder();
    b.add_interface("iface", vec![1, 2]);
    let region = b.finalize().unwrap();
    create_node_model(&region, names::SURFACE_NORMAL[0])
        .unwrap()
        .set_values(vec![0.0, 1.0, 1.0, 0.0])
        .unwrap();
    create_node_model(&region, names::SURFACE_NORMAL[1]).unwrap();

    let distance = create_interface_normal_model(&region, "iface").unwrap();
    assert_eq!(distance.name(), "iface_distance");
    assert_close(
        &distance.scalar_values().unwrap(),
        &[0.5, 0.5f64.sqrt(), 1.25f64.sqrt(), 0.5, 0.5],
    );
    assert_close(&edge_values(&region, "iface_normal_x"), &[1.0; 5]);
    assert_close(&edge_values(&region, "iface_normal_y"), &[0.0; 5]);

    // Moving the interface invalidates the distance.
    region.add_interface("iface", vec![0, 3]).unwrap();
    assert!(!distance.is_up_to_date());
}

#[test]
fn interface_normal_requires_the_interface() {
    let region = unit_square();
    let err = create_interface_normal_model(&region, "nowhere").unwrap_err();
    assert!(matches!(err, ModelError::UnknownInterface(_, ref i) if i == "nowhere"));
    assert_eq!(region.diagnostic_count(Severity::Fatal), 1);
}

#[test]
fn surface_area_splits_contacts_from_interfaces() {
    let mut b = unit_square_builder();
    b.add_contact("left", vec![0, 3]);
    b.add_interface("iface", vec![1, 2, 3]);
    let region = b.finalize().unwrap();
    create_default_models(&region).unwrap();

    assert_close(&node_values(&region, names::SURFACE_AREA), &[0.0, 0.5, 1.0, 0.5]);
    assert_close(&node_values(&region, names::CONTACT_SURFACE_AREA), &[0.5, 0.0, 0.0, 0.5]);
    let s = 0.5f64.sqrt();
    assert_close(&node_values(&region, names::SURFACE_NORMAL[0]), &[0.0, 1.0, s, 0.0]);
    assert_close(&node_values(&region, names::SURFACE_NORMAL[1]), &[0.0, 0.0, s, 1.0]);
    assert!(region.node_model(names::SURFACE_NORMAL[2]).is_none());

    region.add_contact("left", vec![0, 1]).unwrap();
    assert!(!region.node_model(names::SURFACE_AREA).unwrap().is_up_to_date());
    assert_close(&node_values(&region, names::CONTACT_SURFACE_AREA), &[0.5, 0.5, 0.0, 0.0]);
}

#[test]
fn line_surface_area_is_one_per_boundary_node() {
    let region = line(&[0.0, 1.0, 3.0]);
    region.add_contact("anode", vec![0]).unwrap();
    region.add_interface("junction", vec![2]).unwrap();
    create_default_models(&region).unwrap();
    assert_close(&node_values(&region, names::SURFACE_AREA), &[0.0, 0.0, 1.0]);
    assert_close(&node_values(&region, names::CONTACT_SURFACE_AREA), &[1.0, 0.0, 0.0]);
    assert!(region.node_model(names::SURFACE_NORMAL[0]).is_none());
}

#[test]
fn tetrahedron_face_area_is_shared_by_its_nodes() {
    let mut b = RegionBuilder::new("dev", "corner");
    b.add_node([0.0, 0.0, 0.0]);
    b.add_node([1.0, 0.0, 0.0]);
    b.add_node([0.0, 1.0, 0.0]);
    b.add_node([0.0, 0.0, 1.0]);
    b.add_tetrahedron([0, 1, 2, 3]);
    b.add_interface("floor", vec![0, 1, 2]);
    let region = b.finalize().unwrap();
    create_default_models(&region).unwrap();

    let area = node_values(&region, names::SURFACE_AREA);
    assert_close(&area, &[0.25, 0.125, 0.125, 0.0]);
    assert!((sum(&area) - 0.5).abs() < 1e-12);
    assert_close(&node_values(&region, names::SURFACE_NORMAL[0]), &[0.0; 4]);
    assert_close(&node_values(&region, names::SURFACE_NORMAL[1]), &[0.0; 4]);
    let nz: Vec<f64> = node_values(&region, names::SURFACE_NORMAL[2]).iter().map(|v| v.abs()).collect();
    assert_close(&nz, &[1.0, 1.0, 1.0, 0.0]);
}

#[test]
fn interface_normal_uses_default_surface_normals() {
    let mut b = unit_square_builder();
    b.add_interface("iface", vec![1, 2]);
    let region = b.finalize().unwrap();
    create_default_models(&region).unwrap();

    let distance = create_interface_normal_model(&region, "iface").unwrap();
    assert_close(
        &distance.scalar_values().unwrap(),
        &[0.5, 0.5f64.sqrt(), 1.25f64.sqrt(), 0.5, 0.5],
    );
    assert_close(&edge_values(&region, "iface_normal_x"), &[1.0; 5]);
    assert_close(&edge_values(&region, "iface_normal_y"), &[0.0; 5]);
}

#[test]
fn line_gradient_averages_neighbouring_edges() {
    let region = line(&[0.0, 1.0, 3.0]);
    create_default_models(&region).unwrap();
    create_node_model(&region, "N").unwrap().set_values(vec![0.0, 1.0, 5.0]).unwrap();

    let gradient = create_vector_gradient(&region, "N", GradientCalcType::Default).unwrap();
    assert_eq!(gradient.name(), "N_gradx");
    assert_close(&gradient.scalar_values().unwrap(), &[1.0, 1.5, 2.0]);
    assert!(region.node_model("N_grady").is_none());

    let skipping = create_vector_gradient(&region, "N", GradientCalcType::AvoidZero).unwrap();
    assert_close(&skipping.scalar_values().unwrap(), &[0.0, 2.0, 2.0]);
}

#[test]
fn square_gradient_of_a_linear_field() {
    let region = unit_square();
    create_default_models(&region).unwrap();
    let field = create_node_model(&region, "N").unwrap();
    field.set_values(vec![1.0, 2.0, 4.0, 3.0]).unwrap();

    let gradient = create_vector_gradient(&region, "N", GradientCalcType::Default).unwrap();
    assert_close(&gradient.scalar_values().unwrap(), &[1.0; 4]);
    assert_close(&node_values(&region, "N_grady"), &[2.0; 4]);

    // Both triangles touch the node where the field vanishes.
    field.set_values(vec![0.0, 1.0, 3.0, 2.0]).unwrap();
    assert!(!gradient.is_up_to_date());
    let skipping = create_vector_gradient(&region, "N", GradientCalcType::AvoidZero).unwrap();
    assert!(skipping.is_zero().unwrap());
    assert_close(&node_values(&region, "N_grady"), &[0.0; 4]);
}

#[test]
fn vector_gradient_requires_its_node_model() {
    let region = unit_square();
    let err = create_vector_gradient(&region, "Missing", GradientCalcType::Default).unwrap_err();
    assert!(matches!(err, ModelError::MissingDependency { ref required, .. } if required == "Missing"));
    assert_eq!(region.diagnostic_count(Severity::Fatal), 1);
    assert!(region.node_model("Missing_gradx").is_none());
}

fn cylindrical_square() -> Region {
    let mut b = unit_square_builder();
    b.add_contact("outer", vec![1, 2]);
    let region = b.finalize().unwrap();
    region.set_parameter(names::RAXIS_VARIABLE, "x");
    region.set_parameter(names::RAXIS_ZERO, 0.0);
    region
}

#[test]
fn cylindrical_volume_of_a_swept_square() {
    let region = cylindrical_square();
    create_cylindrical_node_volume(&region).unwrap();
    let volume = node_values(&region, names::CYLINDRICAL_NODE_VOLUME);
    assert!((sum(&volume) - PI).abs() < 1e-12, "{volume:?}");
    // Nodes on the axis sweep less than nodes at radius 1.
    assert!(volume[0] < volume[1]);
    assert!(volume[3] < volume[2]);

    let head = edge_values(&region, names::CYLINDRICAL_EDGE_NODE_VOLUME_0);
    let tail = edge_values(&region, names::CYLINDRICAL_EDGE_NODE_VOLUME_1);
    assert!((sum(&head) + sum(&tail) - PI).abs() < 1e-12);
}

#[test]
fn cylindrical_couple_of_a_swept_square() {
    let region = cylindrical_square();
    create_cylindrical_edge_couple(&region).unwrap();
    let couple = edge_values(&region, names::CYLINDRICAL_EDGE_COUPLE);
    // Edge (0,1) lies on y = 0; its dual segment runs from (0.5, 0) to
    // (0.5, 0.5) at radius 0.5.
    assert!((couple[0] - PI * 0.5).abs() < 1e-12, "{couple:?}");
    assert!(couple[1].abs() < 1e-12);
}

#[test]
fn cylindrical_surface_area_of_the_outer_wall() {
    let region = cylindrical_square();
    create_cylindrical_surface_area(&region).unwrap();
    let area = node_values(&region, names::CYLINDRICAL_SURFACE_AREA);
    assert_close(&area, &[0.0, PI, PI, 0.0]);

    region.add_contact("bottom", vec![0, 1]).unwrap();
    let area = node_values(&region, names::CYLINDRICAL_SURFACE_AREA);
    assert!((sum(&area) - 3.0 * PI).abs() < 1e-12, "{area:?}");
}

#[test]
fn cylindrical_models_reject_a_bad_axis() {
    let region = cylindrical_square();
    region.set_parameter(names::RAXIS_VARIABLE, "z");
    create_cylindrical_node_volume(&region).unwrap();
    region.clear_diagnostics();

    let volume = region.node_model(names::CYLINDRICAL_NODE_VOLUME).unwrap();
    let err = volume.scalar_values().unwrap_err();
    match &err {
        ModelError::DomainError { reason, .. } => assert!(reason.contains("\"x\" or \"y\""), "{reason}"),
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(region.diagnostic_count(Severity::Fatal), 1);
    assert!(!volume.is_up_to_date());

    region.set_parameter(names::RAXIS_VARIABLE, "x");
    assert!(!volume.is_up_to_date());
    assert!((sum(&volume.scalar_values().unwrap()) - PI).abs() < 1e-12);
}

#[test]
fn cylindrical_models_are_2d_only() {
    let region = line(&[0.0, 1.0]);
    let err = create_cylindrical_edge_couple(&region).unwrap_err();
    assert!(matches!(err, ModelError::DomainError { .. }));
    assert!(region.triangle_edge_model_list().is_empty());
}
