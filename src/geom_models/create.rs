//! Commands that create models in a region.
//!
//! These are the entry points used both directly and when a saved model file
//! is restored: a saved `BUILTIN` body maps back through
//! [`create_builtin_model`], a `COMMAND` body through [`execute_command`].

use std::collections::BTreeMap;

use crate::geom_models::names::*;
use crate::geom_models::{
    AtContactNode, AverageEdgeModel, AverageType, CylindricalEdgeCouple,
    CylindricalEdgeNodeVolume, CylindricalNodeVolume, CylindricalSurfaceArea, EdgeCouple,
    EdgeIndex, EdgeInverseLength, EdgeLength, EdgeNodeVolume, GradientCalcType, InterfaceNormal,
    NodePosition, NodeVolume, SurfaceArea, TetrahedronEdgeCouple, TetrahedronNodeVolume,
    TriangleCylindricalEdgeCouple, TriangleCylindricalNodeVolume, TriangleEdgeCouple,
    TriangleNodeVolume, UnitVec, VectorGradient,
};
use crate::model::{
    EdgeKind, ElementKind, ModelHandle, ModelKind, NodeKind, Severity, SubModel,
    TetrahedronEdgeKind, TriangleEdgeKind,
};
use crate::model_error::ModelError;
use crate::region::Region;

/// A model creation command with its `-option "value"` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    pub name: String,
    pub options: BTreeMap<String, String>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    fn required(&self, key: &str) -> Result<&str, ModelError> {
        self.get(key).ok_or_else(|| ModelError::MissingOption {
            command: self.name.clone(),
            option: key.to_string(),
        })
    }
}

/// Records `err` as fatal and hands it back.
fn fatal(region: &Region, err: ModelError) -> ModelError {
    region.report(Severity::Fatal, err.to_string());
    err
}

fn require_2d(region: &Region, kind: ModelKind, model: &str) -> Result<(), ModelError> {
    if region.dimension() == 2 {
        return Ok(());
    }
    Err(fatal(
        region,
        ModelError::DomainError {
            location: region.location(),
            kind,
            model: model.to_string(),
            reason: format!(
                "cylindrical models are only supported in 2D, region has dimension {}",
                region.dimension()
            ),
        },
    ))
}

/// Creates the geometric models every region starts with.
///
/// Element couples and volumes are added for 2D (triangle-edge) and 3D
/// (tetrahedron-edge) regions.
pub fn create_default_models(region: &Region) -> Result<(), ModelError> {
    region.add_edge_model(EDGE_COUPLE, EdgeCouple)?;
    region.add_edge_model(EDGE_LENGTH, EdgeLength)?;
    region.add_edge_model(EDGE_INDEX, EdgeIndex)?;
    region.add_edge_model(EDGE_NODE_VOLUME, EdgeNodeVolume)?;
    region.add_node_model(NODE_VOLUME, NodeVolume)?;
    region.add_edge_model(EDGE_INVERSE_LENGTH, EdgeInverseLength)?;
    region.add_node_model(POSITION_X, NodePosition)?;
    region.add_node_model(AT_CONTACT_NODE, AtContactNode)?;
    region.add_node_model(SURFACE_AREA, SurfaceArea)?;
    region.add_edge_model(UNIT_X, UnitVec)?;
    match region.dimension() {
        2 => {
            region.add_triangle_edge_model(ELEMENT_EDGE_COUPLE, TriangleEdgeCouple)?;
            region.add_triangle_edge_model(ELEMENT_NODE_VOLUME, TriangleNodeVolume)?;
        }
        3 => {
            region.add_tetrahedron_edge_model(ELEMENT_EDGE_COUPLE, TetrahedronEdgeCouple)?;
            region.add_tetrahedron_edge_model(ELEMENT_NODE_VOLUME, TetrahedronNodeVolume)?;
        }
        _ => {}
    }
    log::debug!("created default models on {}", region.location());
    Ok(())
}

/// Recreates the built-in model `name` of the given kind.
///
/// Returns `false` if no built-in model of that kind has that name.
pub fn create_builtin_model(region: &Region, kind: ModelKind, name: &str) -> Result<bool, ModelError> {
    match (kind, name) {
        (ModelKind::Node, POSITION_X) => region.add_node_model(name, NodePosition).map(drop),
        (ModelKind::Node, NODE_VOLUME) => region.add_node_model(name, NodeVolume).map(drop),
        (ModelKind::Node, AT_CONTACT_NODE) => region.add_node_model(name, AtContactNode).map(drop),
        (ModelKind::Node, SURFACE_AREA) => region.add_node_model(name, SurfaceArea).map(drop),
        (ModelKind::Edge, EDGE_COUPLE) => region.add_edge_model(name, EdgeCouple).map(drop),
        (ModelKind::Edge, EDGE_LENGTH) => region.add_edge_model(name, EdgeLength).map(drop),
        (ModelKind::Edge, EDGE_INDEX) => region.add_edge_model(name, EdgeIndex).map(drop),
        (ModelKind::Edge, EDGE_NODE_VOLUME) => region.add_edge_model(name, EdgeNodeVolume).map(drop),
        (ModelKind::Edge, EDGE_INVERSE_LENGTH) => region.add_edge_model(name, EdgeInverseLength).map(drop),
        (ModelKind::Edge, UNIT_X) => region.add_edge_model(name, UnitVec).map(drop),
        (ModelKind::TriangleEdge, ELEMENT_EDGE_COUPLE) => {
            region.add_triangle_edge_model(name, TriangleEdgeCouple).map(drop)
        }
        (ModelKind::TriangleEdge, ELEMENT_NODE_VOLUME) => {
            region.add_triangle_edge_model(name, TriangleNodeVolume).map(drop)
        }
        (ModelKind::TetrahedronEdge, ELEMENT_EDGE_COUPLE) => {
            region.add_tetrahedron_edge_model(name, TetrahedronEdgeCouple).map(drop)
        }
        (ModelKind::TetrahedronEdge, ELEMENT_NODE_VOLUME) => {
            region.add_tetrahedron_edge_model(name, TetrahedronNodeVolume).map(drop)
        }
        _ => return Ok(false),
    }?;
    Ok(true)
}

/// Creates (or replaces) a data model of kind `K`, initially uniform zero.
pub fn create_data_model<'r, K: ElementKind>(region: &'r Region, name: &str) -> Result<ModelHandle<'r, K>, ModelError> {
    region.add_model::<K, _>(name, SubModel::data())
}

pub fn create_node_model<'r>(region: &'r Region, name: &str) -> Result<ModelHandle<'r, NodeKind>, ModelError> {
    create_data_model(region, name)
}

pub fn create_edge_model<'r>(region: &'r Region, name: &str) -> Result<ModelHandle<'r, EdgeKind>, ModelError> {
    create_data_model(region, name)
}

pub fn create_triangle_edge_model<'r>(
    region: &'r Region,
    name: &str,
) -> Result<ModelHandle<'r, TriangleEdgeKind>, ModelError> {
    create_data_model(region, name)
}

pub fn create_tetrahedron_edge_model<'r>(
    region: &'r Region,
    name: &str,
) -> Result<ModelHandle<'r, TetrahedronEdgeKind>, ModelError> {
    create_data_model(region, name)
}

/// Creates an edge average of `node_model`, or its derivative with respect
/// to `derivative`.
///
/// # Errors
/// [`ModelError::MissingDependency`] if `node_model`, or the
/// `node_model:derivative` model the derivative form reads, does not exist.
pub fn create_edge_average_model<'r>(
    region: &'r Region,
    edge_model: &str,
    node_model: &str,
    average_type: AverageType,
    derivative: Option<&str>,
) -> Result<ModelHandle<'r, EdgeKind>, ModelError> {
    let mut model = AverageEdgeModel::new(edge_model, node_model, average_type);
    if let Some(var) = derivative {
        model = model.with_derivative(var);
    }
    let name = model.name();
    let required = std::iter::once(node_model.to_string()).chain(model.derivative_model());
    for required in required {
        if region.node_model(&required).is_none() {
            return Err(fatal(
                region,
                ModelError::MissingDependency {
                    location: region.location(),
                    kind: ModelKind::Edge,
                    model: name,
                    required_kind: ModelKind::Node,
                    required,
                },
            ));
        }
    }
    region.add_edge_model(&name, model)
}

/// Creates `<interface>_distance` and its normal companions.
pub fn create_interface_normal_model<'r>(
    region: &'r Region,
    interface: &str,
) -> Result<ModelHandle<'r, EdgeKind>, ModelError> {
    if region.interface(interface).is_none() {
        return Err(fatal(
            region,
            ModelError::UnknownInterface(region.location(), interface.to_string()),
        ));
    }
    let model = InterfaceNormal::new(interface);
    region.add_edge_model(&model.name(), model)
}

/// Creates `<node_model>_gradx` and its `_grady`/`_gradz` companions.
///
/// # Errors
/// [`ModelError::MissingDependency`] if `node_model` does not exist.
pub fn create_vector_gradient<'r>(
    region: &'r Region,
    node_model: &str,
    calc_type: GradientCalcType,
) -> Result<ModelHandle<'r, NodeKind>, ModelError> {
    let model = VectorGradient::new(node_model, calc_type);
    let name = model.name();
    if region.node_model(node_model).is_none() {
        return Err(fatal(
            region,
            ModelError::MissingDependency {
                location: region.location(),
                kind: ModelKind::Node,
                model: name,
                required_kind: ModelKind::Node,
                required: node_model.to_string(),
            },
        ));
    }
    region.add_node_model(&name, model)
}

/// Creates `ElementCylindricalEdgeCouple` and `CylindricalEdgeCouple`.
pub fn create_cylindrical_edge_couple(region: &Region) -> Result<(), ModelError> {
    require_2d(region, ModelKind::TriangleEdge, ELEMENT_CYLINDRICAL_EDGE_COUPLE)?;
    region.add_triangle_edge_model(ELEMENT_CYLINDRICAL_EDGE_COUPLE, TriangleCylindricalEdgeCouple)?;
    region.add_edge_model(CYLINDRICAL_EDGE_COUPLE, CylindricalEdgeCouple)?;
    Ok(())
}

/// Creates the element, edge and node cylindrical volumes.
pub fn create_cylindrical_node_volume(region: &Region) -> Result<(), ModelError> {
    require_2d(region, ModelKind::TriangleEdge, ELEMENT_CYLINDRICAL_NODE_VOLUME_0)?;
    region.add_triangle_edge_model(ELEMENT_CYLINDRICAL_NODE_VOLUME_0, TriangleCylindricalNodeVolume)?;
    region.add_edge_model(CYLINDRICAL_EDGE_NODE_VOLUME_0, CylindricalEdgeNodeVolume)?;
    region.add_node_model(CYLINDRICAL_NODE_VOLUME, CylindricalNodeVolume)?;
    Ok(())
}

pub fn create_cylindrical_surface_area(region: &Region) -> Result<(), ModelError> {
    require_2d(region, ModelKind::Node, CYLINDRICAL_SURFACE_AREA)?;
    region.add_node_model(CYLINDRICAL_SURFACE_AREA, CylindricalSurfaceArea)?;
    Ok(())
}

/// Runs a saved model command against `region`.
///
/// The `-device` and `-region` options are not consulted; the command
/// always applies to `region`.
pub fn execute_command(region: &Region, command: &Command) -> Result<(), ModelError> {
    log::debug!("executing model command \"{}\" on {}", command.name, region.location());
    match command.name.as_str() {
        "edge_average_model" => {
            let average_type = command.get("average_type").unwrap_or("arithmetic").parse()?;
            create_edge_average_model(
                region,
                command.required("edge_model")?,
                command.required("node_model")?,
                average_type,
                command.get("derivative"),
            )
            .map(drop)
        }
        "interface_normal_model" => {
            create_interface_normal_model(region, command.required("interface")?).map(drop)
        }
        "vector_gradient" => {
            let calc_type = command.get("calc_type").unwrap_or("default").parse()?;
            create_vector_gradient(region, command.required("node_model")?, calc_type).map(drop)
        }
        "cylindrical_edge_couple" => create_cylindrical_edge_couple(region),
        "cylindrical_node_volume" => create_cylindrical_node_volume(region),
        "cylindrical_surface_area" => create_cylindrical_surface_area(region),
        other => Err(ModelError::UnknownCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionBuilder;

    fn line() -> Region {
        let mut b = RegionBuilder::new("dev", "r");
        b.add_node([0.0; 3]);
        b.add_node([1.0, 0.0, 0.0]);
        b.add_edge(0, 1);
        b.finalize().unwrap()
    }

    #[test]
    fn defaults_in_1d_skip_element_models() {
        let region = line();
        create_default_models(&region).unwrap();
        assert!(region.edge_model(EDGE_COUPLE).is_some());
        assert!(region.node_model(POSITION_Y).is_some());
        assert!(region.triangle_edge_model_list().is_empty());
        assert!(region.tetrahedron_edge_model_list().is_empty());
    }

    #[test]
    fn builtin_lookup_is_per_kind() {
        let region = line();
        assert!(create_builtin_model(&region, ModelKind::Edge, EDGE_LENGTH).unwrap());
        assert!(!create_builtin_model(&region, ModelKind::Node, EDGE_LENGTH).unwrap());
        assert!(!create_builtin_model(&region, ModelKind::Edge, "Potential").unwrap());
        assert!(create_builtin_model(&region, ModelKind::Node, SURFACE_AREA).unwrap());
        assert!(region.node_model("ContactSurfaceArea").is_some());
    }

    #[test]
    fn vector_gradient_command_parses_calc_type() {
        let region = line();
        create_node_model(&region, "N").unwrap();
        let command = Command::new("vector_gradient").option("node_model", "N");
        let err = execute_command(&region, &command.clone().option("calc_type", "nonzero")).unwrap_err();
        assert_eq!(err, ModelError::UnknownCalcType("nonzero".into()));
        assert!(region.node_model("N_gradx").is_none());

        execute_command(&region, &command).unwrap();
        assert!(region.node_model("N_gradx").is_some());
    }

    #[test]
    fn cylindrical_commands_require_2d() {
        let region = line();
        let err = create_cylindrical_edge_couple(&region).unwrap_err();
        assert!(matches!(err, ModelError::DomainError { .. }));
        assert_eq!(region.diagnostic_count(Severity::Fatal), 1);
        assert!(region.triangle_edge_model(ELEMENT_CYLINDRICAL_EDGE_COUPLE).is_none());
    }

    #[test]
    fn average_requires_node_model() {
        let region = line();
        let err = create_edge_average_model(&region, "Eavg", "Potential", AverageType::Arithmetic, None)
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingDependency { ref required, .. } if required == "Potential"));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let region = line();
        let err = execute_command(&region, &Command::new("element_from_edge_model")).unwrap_err();
        assert_eq!(err, ModelError::UnknownCommand("element_from_edge_model".into()));
        let err = execute_command(&region, &Command::new("interface_normal_model")).unwrap_err();
        assert!(matches!(err, ModelError::MissingOption { .. }));
    }
}
