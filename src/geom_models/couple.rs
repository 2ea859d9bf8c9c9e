//! Finite-volume couples: the dual-face measure associated with each edge.
//!
//! Element couples are measured from an element edge's midpoint to the
//! element circumcenter; [`EdgeCouple`] sums them per region edge.

use crate::geom_models::edge_center;
use crate::geom_models::names::ELEMENT_EDGE_COUPLE;
use crate::geometry::Tetrahedron;
use crate::geometry::centers::triangle_center;
use crate::geometry::vector::{cross, distance, norm, sub};
use crate::model::{
    ComputeContext, EdgeKind, ModelCalculation, TetrahedronEdgeKind, TriangleEdgeKind,
};
use crate::model_error::ModelError;
use crate::region::Region;

/// Distance from each triangle edge midpoint to the triangle circumcenter.
#[derive(Debug, Default, Clone, Copy)]
pub struct TriangleEdgeCouple;

impl ModelCalculation<TriangleEdgeKind> for TriangleEdgeCouple {
    fn calculate(&self, ctx: &mut ComputeContext<'_, TriangleEdgeKind>) -> Result<(), ModelError> {
        let region = ctx.region();
        let centers = region.triangle_centers()?;
        let mut values = Vec::with_capacity(3 * centers.len());
        for (edges, &center) in region.triangle_to_edges().iter().zip(centers) {
            values.extend(edges.iter().map(|&e| distance(edge_center(region, e), center)));
        }
        ctx.set_values(values);
        Ok(())
    }
}

/// Area of the dual face piece each tetrahedron contributes to an edge.
///
/// For edge `(a, b)` the piece is bounded by the edge midpoint, the
/// tetrahedron circumcenter, and the circumcenters of the two faces sharing
/// the edge.
#[derive(Debug, Default, Clone, Copy)]
pub struct TetrahedronEdgeCouple;

impl ModelCalculation<TetrahedronEdgeKind> for TetrahedronEdgeCouple {
    fn calculate(&self, ctx: &mut ComputeContext<'_, TetrahedronEdgeKind>) -> Result<(), ModelError> {
        let region = ctx.region();
        let centers = region.tetrahedron_centers()?;
        let mut values = Vec::with_capacity(6 * centers.len());
        for ((tet, edges), &center) in region
            .tetrahedra()
            .iter()
            .zip(region.tetrahedron_to_edges())
            .zip(centers)
        {
            let mut face_to_center = [[0.0; 3]; 4];
            for (k, v) in face_to_center.iter_mut().enumerate() {
                let [p0, p1, p2] = tet.face_opposite(k).map(|n| region.position(n));
                let face_center = triangle_center(p0, p1, p2).ok_or_else(|| {
                    ctx.domain_error(format!("tetrahedron {} has a degenerate face", tet.index))
                })?;
                *v = sub(face_center, center);
            }
            for (&(a, b), &e) in Tetrahedron::LOCAL_EDGES.iter().zip(edges) {
                let v0 = sub(center, edge_center(region, e));
                // The two faces holding edge (a, b) are opposite the other two nodes.
                let area: f64 = (0..4)
                    .filter(|&k| k != a && k != b)
                    .map(|k| norm(cross(v0, face_to_center[k])))
                    .sum();
                values.push(0.5 * area);
            }
        }
        ctx.set_values(values);
        Ok(())
    }
}

/// Couple per region edge: `1` in 1D, otherwise the sum of the element
/// couples over every element sharing the edge.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeCouple;

impl ModelCalculation<EdgeKind> for EdgeCouple {
    fn dependencies(&self, region: &Region) -> Vec<String> {
        match region.dimension() {
            2 | 3 => vec![ELEMENT_EDGE_COUPLE.to_string()],
            _ => Vec::new(),
        }
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, EdgeKind>) -> Result<(), ModelError> {
        match ctx.region().dimension() {
            1 => ctx.set_uniform(1.0),
            2 => {
                let values = ctx.values_on_edges::<TriangleEdgeKind>(ELEMENT_EDGE_COUPLE)?;
                ctx.set_values(values);
            }
            _ => {
                let values = ctx.values_on_edges::<TetrahedronEdgeKind>(ELEMENT_EDGE_COUPLE)?;
                ctx.set_values(values);
            }
        }
        Ok(())
    }
}
