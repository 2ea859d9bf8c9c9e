//! Axisymmetric (cylindrical) couples, volumes and surface areas for 2D
//! regions.
//!
//! A 2D region is treated as the meridional cross-section of a body of
//! revolution. The radius is measured along the axis named by the
//! `raxis_variable` parameter (`"x"` or `"y"`), offset by `raxis_zero`; the
//! other axis is the height. Every quantity here is the planar quantity
//! swept once around the symmetry axis.

use std::f64::consts::PI;
use std::fmt;

use itertools::Itertools;

use crate::geom_models::edge_center;
use crate::geom_models::names::{
    CYLINDRICAL_EDGE_NODE_VOLUME_1, ELEMENT_CYLINDRICAL_EDGE_COUPLE,
    ELEMENT_CYLINDRICAL_NODE_VOLUME_0, ELEMENT_CYLINDRICAL_NODE_VOLUME_1, RAXIS_VARIABLE,
    RAXIS_ZERO,
};
use crate::geometry::Vector;
use crate::geometry::vector::{distance, norm, scale, sub};
use crate::model::{
    ComputeContext, EdgeKind, ElementKind, ModelCalculation, ModelHandle, NodeKind,
    TriangleEdgeKind,
};
use crate::model_error::ModelError;
use crate::region::{CONTACT_CHANGE, INTERFACE_CHANGE, Region};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RadialAxis {
    X,
    Y,
}

/// Symmetry axis placement read from the region parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RAxis {
    zero: f64,
    axis: RadialAxis,
}

impl RAxis {
    /// Reads `raxis_zero` and `raxis_variable`, reporting every problem at
    /// once.
    fn read<K: ElementKind>(ctx: &ComputeContext<'_, K>) -> Result<Self, ModelError> {
        let region = ctx.region();
        if region.dimension() != 2 {
            return Err(ctx.domain_error("cylindrical models are only supported in 2D"));
        }
        let where_ = format!(
            "on Device {} on Region {}",
            region.device_name(),
            region.name()
        );
        let mut problems = Vec::new();

        let zero = region.number_parameter(RAXIS_ZERO);
        if zero.is_none() {
            problems.push(format!("{RAXIS_ZERO} {where_} must be a valid number parameter"));
        }
        let axis = match region.parameter(RAXIS_VARIABLE).map(|v| v.as_text()) {
            None => {
                problems.push(format!("{RAXIS_VARIABLE} {where_} must be a valid parameter"));
                None
            }
            Some(v) if v == "x" => Some(RadialAxis::X),
            Some(v) if v == "y" => Some(RadialAxis::Y),
            Some(_) => {
                problems.push(format!("{RAXIS_VARIABLE} {where_} must be \"x\" or \"y\""));
                None
            }
        };

        match (zero, axis) {
            (Some(zero), Some(axis)) => Ok(Self { zero, axis }),
            _ => Err(ctx.domain_error(problems.join("\n"))),
        }
    }

    #[inline]
    fn radius(&self, p: Vector) -> f64 {
        match self.axis {
            RadialAxis::X => p[0] - self.zero,
            RadialAxis::Y => p[1] - self.zero,
        }
    }

    #[inline]
    fn height(&self, p: Vector) -> f64 {
        match self.axis {
            RadialAxis::X => p[1],
            RadialAxis::Y => p[0],
        }
    }

    /// `(height, radius)` of `p`.
    #[inline]
    fn section(&self, p: Vector) -> (f64, f64) {
        (self.height(p), self.radius(p))
    }
}

fn raxis_dependencies() -> Vec<String> {
    vec![RAXIS_ZERO.to_string(), RAXIS_VARIABLE.to_string()]
}

fn write_command(out: &mut dyn fmt::Write, command: &str, region: &Region) -> fmt::Result {
    write!(
        out,
        "COMMAND {command} -device \"{}\" -region \"{}\"",
        region.device_name(),
        region.name()
    )
}

/// Volume swept by a triangle given as `(height, radius)` corners.
///
/// Pappus: `2 * pi * centroid_radius * area`.
pub(crate) fn swept_triangle_volume(corners: [(f64, f64); 3]) -> f64 {
    let [(z0, r0), (z1, r1), (z2, r2)] = corners;
    let area = 0.5 * ((z1 - z0) * (r2 - r0) - (z2 - z0) * (r1 - r0)).abs();
    2.0 * PI * (r0 + r1 + r2) / 3.0 * area
}

/// Swept area of the segment from each triangle edge midpoint to the
/// triangle circumcenter.
#[derive(Debug, Default, Clone, Copy)]
pub struct TriangleCylindricalEdgeCouple;

impl ModelCalculation<TriangleEdgeKind> for TriangleCylindricalEdgeCouple {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        raxis_dependencies()
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, TriangleEdgeKind>) -> Result<(), ModelError> {
        let raxis = RAxis::read(ctx)?;
        let region = ctx.region();
        let centers = region.triangle_centers()?;
        let mut values = Vec::with_capacity(3 * centers.len());
        for (edges, &center) in region.triangle_to_edges().iter().zip(centers) {
            let rc = raxis.radius(center);
            for &e in edges {
                let mid = edge_center(region, e);
                let rm = raxis.radius(mid);
                values.push((PI * (rc + rm) * distance(mid, center)).abs());
            }
        }
        ctx.set_values(values);
        Ok(())
    }

    fn serialize(&self, model: &ModelHandle<'_, TriangleEdgeKind>, out: &mut dyn fmt::Write) -> fmt::Result {
        write_command(out, "cylindrical_edge_couple", model.region())
    }
}

/// Swept volume of the quadrilateral piece of each triangle between an edge
/// and the circumcenter, split by endpoint.
///
/// `ElementCylindricalNodeVolume@en0` holds the half next to the edge head,
/// its companion `@en1` the half next to the tail.
#[derive(Debug, Default, Clone, Copy)]
pub struct TriangleCylindricalNodeVolume;

impl ModelCalculation<TriangleEdgeKind> for TriangleCylindricalNodeVolume {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        raxis_dependencies()
    }

    fn companions(&self, _region: &Region) -> Vec<String> {
        vec![ELEMENT_CYLINDRICAL_NODE_VOLUME_1.to_string()]
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, TriangleEdgeKind>) -> Result<(), ModelError> {
        let raxis = RAxis::read(ctx)?;
        let region = ctx.region();
        let centers = region.triangle_centers()?;
        let mut head = Vec::with_capacity(3 * centers.len());
        let mut tail = Vec::with_capacity(3 * centers.len());
        for (edges, &center) in region.triangle_to_edges().iter().zip(centers) {
            let c = raxis.section(center);
            for &e in edges {
                let edge = &region.edges()[e];
                let m = raxis.section(edge_center(region, e));
                head.push(swept_triangle_volume([raxis.section(region.position(edge.head())), c, m]));
                tail.push(swept_triangle_volume([raxis.section(region.position(edge.tail())), c, m]));
            }
        }
        ctx.set_values(head);
        ctx.set_companion_values(ELEMENT_CYLINDRICAL_NODE_VOLUME_1, tail);
        Ok(())
    }

    fn serialize(&self, model: &ModelHandle<'_, TriangleEdgeKind>, out: &mut dyn fmt::Write) -> fmt::Result {
        write_command(out, "cylindrical_node_volume", model.region())
    }
}

/// `ElementCylindricalEdgeCouple` summed onto region edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct CylindricalEdgeCouple;

impl ModelCalculation<EdgeKind> for CylindricalEdgeCouple {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        vec![ELEMENT_CYLINDRICAL_EDGE_COUPLE.to_string()]
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, EdgeKind>) -> Result<(), ModelError> {
        let values = ctx.values_on_edges::<TriangleEdgeKind>(ELEMENT_CYLINDRICAL_EDGE_COUPLE)?;
        ctx.set_values(values);
        Ok(())
    }

    fn serialize(&self, _model: &ModelHandle<'_, EdgeKind>, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "DATAPARENT \"{ELEMENT_CYLINDRICAL_EDGE_COUPLE}\"")
    }
}

fn cylindrical_volume_dependencies() -> Vec<String> {
    vec![
        ELEMENT_CYLINDRICAL_NODE_VOLUME_0.to_string(),
        ELEMENT_CYLINDRICAL_NODE_VOLUME_1.to_string(),
    ]
}

/// Per-edge swept volumes: `CylindricalEdgeNodeVolume@n0` for the head,
/// companion `@n1` for the tail.
#[derive(Debug, Default, Clone, Copy)]
pub struct CylindricalEdgeNodeVolume;

impl ModelCalculation<EdgeKind> for CylindricalEdgeNodeVolume {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        cylindrical_volume_dependencies()
    }

    fn companions(&self, _region: &Region) -> Vec<String> {
        vec![CYLINDRICAL_EDGE_NODE_VOLUME_1.to_string()]
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, EdgeKind>) -> Result<(), ModelError> {
        let head = ctx.values_on_edges::<TriangleEdgeKind>(ELEMENT_CYLINDRICAL_NODE_VOLUME_0)?;
        let tail = ctx.values_on_edges::<TriangleEdgeKind>(ELEMENT_CYLINDRICAL_NODE_VOLUME_1)?;
        ctx.set_values(head);
        ctx.set_companion_values(CYLINDRICAL_EDGE_NODE_VOLUME_1, tail);
        Ok(())
    }

    fn serialize(&self, _model: &ModelHandle<'_, EdgeKind>, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "DATAPARENT \"{ELEMENT_CYLINDRICAL_NODE_VOLUME_0}\"")
    }
}

/// Swept control volume of each node.
#[derive(Debug, Default, Clone, Copy)]
pub struct CylindricalNodeVolume;

impl ModelCalculation<NodeKind> for CylindricalNodeVolume {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        cylindrical_volume_dependencies()
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, NodeKind>) -> Result<(), ModelError> {
        let head = ctx.values_on_edges::<TriangleEdgeKind>(ELEMENT_CYLINDRICAL_NODE_VOLUME_0)?;
        let tail = ctx.values_on_edges::<TriangleEdgeKind>(ELEMENT_CYLINDRICAL_NODE_VOLUME_1)?;
        let region = ctx.region();
        let mut values = vec![0.0; region.nodes().len()];
        for ((e, h), t) in region.edges().iter().zip(head).zip(tail) {
            values[e.head()] += h;
            values[e.tail()] += t;
        }
        ctx.set_values(values);
        Ok(())
    }

    fn serialize(&self, _model: &ModelHandle<'_, NodeKind>, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "DATAPARENT \"{ELEMENT_CYLINDRICAL_NODE_VOLUME_0}\"")
    }
}

/// Swept boundary area per node, over every contact and interface edge of
/// the region.
#[derive(Debug, Default, Clone, Copy)]
pub struct CylindricalSurfaceArea;

impl ModelCalculation<NodeKind> for CylindricalSurfaceArea {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        let mut deps = vec![INTERFACE_CHANGE.to_string(), CONTACT_CHANGE.to_string()];
        deps.extend(raxis_dependencies());
        deps
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, NodeKind>) -> Result<(), ModelError> {
        let raxis = RAxis::read(ctx)?;
        let region = ctx.region();
        let boundary = region
            .contacts()
            .iter()
            .flat_map(|c| region.edges_within(&c.nodes))
            .chain(region.interfaces().iter().flat_map(|i| region.edges_within(&i.nodes)))
            .sorted_unstable()
            .dedup()
            .collect_vec();

        let mut values = vec![0.0; region.nodes().len()];
        for e in boundary {
            let edge = &region.edges()[e];
            let p0 = region.position(edge.head());
            let p1 = region.position(edge.tail());
            let half = norm(scale(sub(p1, p0), 0.5));
            let r0 = raxis.radius(p0);
            let r1 = raxis.radius(p1);
            let rm = 0.5 * (r0 + r1);
            values[edge.head()] += PI * (rm + r0).abs() * half;
            values[edge.tail()] += PI * (r1 + rm).abs() * half;
        }
        ctx.set_values(values);
        Ok(())
    }

    fn serialize(&self, model: &ModelHandle<'_, NodeKind>, out: &mut dyn fmt::Write) -> fmt::Result {
        write_command(out, "cylindrical_surface_area", model.region())
    }
}
