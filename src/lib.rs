#![cfg_attr(docsrs, feature(doc_cfg))]
//! # devsim-models
//!
//! devsim-models is the model layer of a finite-volume semiconductor device
//! simulator: named, lazily evaluated, cached fields defined over the nodes,
//! edges and element edges of a mesh region, kept consistent through a
//! dependency graph.
//!
//! ## Features
//! - Four model namespaces per region (node, edge, triangle-edge,
//!   tetrahedron-edge) sharing one generic [`Model`](model::Model)
//! - Pull-based evaluation: reading a stale model recalculates it and,
//!   recursively, its stale dependencies
//! - Push-based invalidation: setting values marks every transitive
//!   dependent stale without recomputing anything
//! - Companion models filled in by a primary model's calculation, recreated
//!   on demand if deleted
//! - Uniform storage for constant fields, contact-restricted writes
//! - Geometric models: edge lengths and unit vectors, finite-volume couples
//!   and node volumes in 1D, 2D and 3D, and their cylindrical counterparts
//! - Contact and interface surface areas with interface normals, and
//!   node-averaged gradients of node fields
//! - Text save/restore of every model in a region
//! - Optional `rayon` feature for evaluating regions of a device in parallel
//!
//! ## Usage
//!
//! ```
//! use devsim_models::prelude::*;
//!
//! let mut b = RegionBuilder::new("device", "bulk");
//! b.add_node([0.0, 0.0, 0.0]);
//! b.add_node([2.0, 0.0, 0.0]);
//! b.add_edge(0, 1);
//! let region = b.finalize()?;
//! create_default_models(&region)?;
//!
//! let length = region.edge_model("EdgeLength").expect("created above");
//! assert_eq!(&*length.scalar_values()?, &[2.0]);
//! # Ok::<(), ModelError>(())
//! ```
//!
//! ## Errors and diagnostics
//! Every fallible operation returns [`ModelError`](model_error::ModelError).
//! Conditions the model graph recovers from on its own (a deleted
//! companion being recreated, a replaced model) are recorded as
//! [`Diagnostic`](model::Diagnostic)s on the region and forwarded to the
//! [`log`] facade.

pub mod device;
pub mod geom_models;
pub mod geometry;
pub mod model;
pub mod model_error;
pub mod region;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::device::Device;
    pub use crate::geom_models::create::{
        Command, create_builtin_model, create_cylindrical_edge_couple,
        create_cylindrical_node_volume, create_cylindrical_surface_area, create_data_model,
        create_default_models, create_edge_average_model, create_edge_model,
        create_interface_normal_model, create_node_model, create_tetrahedron_edge_model,
        create_triangle_edge_model, create_vector_gradient, execute_command,
    };
    pub use crate::geom_models::{AverageType, GradientCalcType, names};
    pub use crate::geometry::{Edge, Node, Tetrahedron, Triangle, Vector};
    pub use crate::model::{
        ComputeContext, Diagnostic, DisplayType, EdgeKind, ElementEdgeKind, ElementKind,
        ModelCalculation, ModelHandle, ModelKind, NodeKind, Severity, SubModel,
        TetrahedronEdgeKind, TriangleEdgeKind,
    };
    pub use crate::model_error::{FpeKind, Location, ModelError};
    pub use crate::region::{
        CONTACT_CHANGE, INTERFACE_CHANGE, MeshDescription, ParameterSet, ParameterValue, Region,
        RegionBuilder,
    };
}
