//! Concrete geometric models.
//!
//! These are the leaves and first-order derived nodes of a region's model
//! graph: lengths, unit vectors, finite-volume couples and node volumes
//! (planar and cylindrical), boundary areas, edge averages and gradients of
//! node fields, and interface normals. [`create`] holds the commands that
//! instantiate them.

pub mod at_contact_node;
pub mod average_edge;
pub mod couple;
pub mod create;
pub mod cylindrical;
pub mod edge_index;
pub mod edge_length;
pub mod interface_normal;
pub mod node_position;
pub mod surface_area;
pub mod unit_vec;
pub mod vector_gradient;
pub mod volume;

use crate::geometry::Vector;
use crate::geometry::vector::midpoint;
use crate::region::Region;

pub use at_contact_node::AtContactNode;
pub use average_edge::{AverageEdgeModel, AverageType};
pub use couple::{EdgeCouple, TetrahedronEdgeCouple, TriangleEdgeCouple};
pub use cylindrical::{
    CylindricalEdgeCouple, CylindricalEdgeNodeVolume, CylindricalNodeVolume,
    CylindricalSurfaceArea, TriangleCylindricalEdgeCouple, TriangleCylindricalNodeVolume,
};
pub use edge_index::EdgeIndex;
pub use edge_length::{EdgeInverseLength, EdgeLength};
pub use interface_normal::InterfaceNormal;
pub use node_position::NodePosition;
pub use surface_area::SurfaceArea;
pub use unit_vec::UnitVec;
pub use vector_gradient::{GradientCalcType, VectorGradient};
pub use volume::{EdgeNodeVolume, NodeVolume, TetrahedronNodeVolume, TriangleNodeVolume};

/// Names of the built-in models and the parameters they read.
pub mod names {
    pub const EDGE_LENGTH: &str = "EdgeLength";
    pub const EDGE_INVERSE_LENGTH: &str = "EdgeInverseLength";
    pub const EDGE_INDEX: &str = "edge_index";
    pub const EDGE_COUPLE: &str = "EdgeCouple";
    pub const EDGE_NODE_VOLUME: &str = "EdgeNodeVolume";
    pub const NODE_VOLUME: &str = "NodeVolume";
    pub const AT_CONTACT_NODE: &str = "AtContactNode";
    pub const ELEMENT_EDGE_COUPLE: &str = "ElementEdgeCouple";
    pub const ELEMENT_NODE_VOLUME: &str = "ElementNodeVolume";

    pub const POSITION_X: &str = "x";
    pub const POSITION_Y: &str = "y";
    pub const POSITION_Z: &str = "z";
    pub const NODE_INDEX: &str = "node_index";

    pub const UNIT_X: &str = "unitx";
    pub const UNIT_Y: &str = "unity";
    pub const UNIT_Z: &str = "unitz";

    pub const ELEMENT_CYLINDRICAL_EDGE_COUPLE: &str = "ElementCylindricalEdgeCouple";
    pub const ELEMENT_CYLINDRICAL_NODE_VOLUME_0: &str = "ElementCylindricalNodeVolume@en0";
    pub const ELEMENT_CYLINDRICAL_NODE_VOLUME_1: &str = "ElementCylindricalNodeVolume@en1";
    pub const CYLINDRICAL_EDGE_COUPLE: &str = "CylindricalEdgeCouple";
    pub const CYLINDRICAL_NODE_VOLUME: &str = "CylindricalNodeVolume";
    pub const CYLINDRICAL_EDGE_NODE_VOLUME_0: &str = "CylindricalEdgeNodeVolume@n0";
    pub const CYLINDRICAL_EDGE_NODE_VOLUME_1: &str = "CylindricalEdgeNodeVolume@n1";
    pub const CYLINDRICAL_SURFACE_AREA: &str = "CylindricalSurfaceArea";

    pub const SURFACE_NORMAL: [&str; 3] = ["NSurfaceNormal_x", "NSurfaceNormal_y", "NSurfaceNormal_z"];
    pub const SURFACE_AREA: &str = "SurfaceArea";
    pub const CONTACT_SURFACE_AREA: &str = "ContactSurfaceArea";

    pub const RAXIS_ZERO: &str = "raxis_zero";
    pub const RAXIS_VARIABLE: &str = "raxis_variable";
}

/// Midpoint of edge `edge`.
pub(crate) fn edge_center(region: &Region, edge: usize) -> Vector {
    let e = &region.edges()[edge];
    midpoint(region.position(e.head()), region.position(e.tail()))
}
