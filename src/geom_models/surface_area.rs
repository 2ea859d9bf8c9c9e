//! Boundary area assigned to each node.
//!
//! `SurfaceArea` holds the interface area of every node and its companion
//! `ContactSurfaceArea` the contact area. In 2D and 3D the companions
//! `NSurfaceNormal_x`, `_y` (and `_z`) hold the unit interface normal at
//! each node, zero away from any interface.

use std::collections::BTreeSet;
use std::sync::Arc;

use itertools::Itertools;

use crate::geom_models::names::{CONTACT_SURFACE_AREA, EDGE_LENGTH, SURFACE_NORMAL, UNIT_X, UNIT_Y};
use crate::geometry::Vector;
use crate::geometry::centers::triangle_center;
use crate::geometry::vector::{add, cross, dot, norm, scale, sub};
use crate::model::{ComputeContext, ModelCalculation, NodeKind};
use crate::model_error::ModelError;
use crate::region::{CONTACT_CHANGE, INTERFACE_CHANGE, Region};

#[derive(Debug, Default, Clone, Copy)]
pub struct SurfaceArea;

/// Per-node area and summed normal of one kind of boundary.
#[derive(Debug)]
struct Boundary {
    area: Vec<f64>,
    normal: Vec<Vector>,
}

impl Boundary {
    fn new(nodes: usize) -> Self {
        Self {
            area: vec![0.0; nodes],
            normal: vec![[0.0; 3]; nodes],
        }
    }

    /// Adds `area` to `node`; `normal` is flipped to agree with the normal
    /// the node has gathered so far.
    fn add(&mut self, node: usize, area: f64, normal: Vector) {
        self.area[node] += area;
        let current = self.normal[node];
        self.normal[node] = if dot(current, normal) < 0.0 {
            sub(current, normal)
        } else {
            add(current, normal)
        };
    }

    fn into_unit_normals(mut self) -> Self {
        for (area, normal) in self.area.iter().zip(&mut self.normal) {
            let weight = norm(*normal);
            if *area > 0.0 && weight > 0.0 {
                *normal = scale(*normal, 1.0 / weight);
            }
        }
        self
    }
}

/// Edges lying inside one of the node sets, each listed once.
fn boundary_edges(region: &Region, sets: &[Arc<[usize]>]) -> Vec<usize> {
    sets.iter()
        .flat_map(|nodes| region.edges_within(nodes))
        .sorted_unstable()
        .dedup()
        .collect()
}

/// Element faces lying inside one of the node sets, each listed once with
/// its nodes in ascending order.
fn boundary_faces(region: &Region, sets: &[Arc<[usize]>]) -> Vec<[usize; 3]> {
    let mut candidates: Vec<[usize; 3]> = region.triangles().iter().map(|t| t.nodes).collect();
    for t in region.tetrahedra() {
        let [a, b, c, d] = t.nodes;
        candidates.extend([[b, c, d], [a, c, d], [a, b, d], [a, b, c]]);
    }
    let mut faces = BTreeSet::new();
    for mut face in candidates {
        face.sort_unstable();
        if sets
            .iter()
            .any(|nodes| face.iter().all(|n| nodes.binary_search(n).is_ok()))
        {
            faces.insert(face);
        }
    }
    faces.into_iter().collect()
}

impl SurfaceArea {
    fn normal_names(dimension: usize) -> &'static [&'static str] {
        match dimension {
            2 => &SURFACE_NORMAL[..2],
            3 => &SURFACE_NORMAL[..],
            _ => &[],
        }
    }

    fn boundary_1d(region: &Region, sets: &[Arc<[usize]>]) -> Boundary {
        let mut boundary = Boundary::new(region.nodes().len());
        for n in sets.iter().flat_map(|s| s.iter().copied()).sorted_unstable().dedup() {
            boundary.area[n] = 1.0;
        }
        boundary
    }

    fn boundary_2d(
        ctx: &ComputeContext<'_, NodeKind>,
        sets: &[Arc<[usize]>],
    ) -> Result<Boundary, ModelError> {
        let region = ctx.region();
        let length = ctx.edge_values(EDGE_LENGTH)?;
        let unitx = ctx.edge_values(UNIT_X)?;
        let unity = ctx.edge_values(UNIT_Y)?;
        let mut boundary = Boundary::new(region.nodes().len());
        for e in boundary_edges(region, sets) {
            let half = 0.5 * length[e];
            let normal = [unity[e] * half, -unitx[e] * half, 0.0];
            let edge = &region.edges()[e];
            boundary.add(edge.head(), half, normal);
            boundary.add(edge.tail(), half, normal);
        }
        Ok(boundary.into_unit_normals())
    }

    fn boundary_3d(region: &Region, sets: &[Arc<[usize]>]) -> Result<Boundary, ModelError> {
        let mut boundary = Boundary::new(region.nodes().len());
        for face in boundary_faces(region, sets) {
            let p = face.map(|n| region.position(n));
            let center = triangle_center(p[0], p[1], p[2]).ok_or_else(|| {
                ModelError::InvalidMesh(format!(
                    "{} boundary face {face:?} is degenerate",
                    region.location()
                ))
            })?;
            // A quarter of the kite between each side and the face center
            // goes to each end of the side.
            for (a, b) in [(0, 1), (0, 2), (1, 2)] {
                let normal = scale(cross(sub(p[a], p[b]), sub(p[a], center)), 0.25);
                let area = norm(normal);
                boundary.add(face[a], area, normal);
                boundary.add(face[b], area, normal);
            }
        }
        Ok(boundary.into_unit_normals())
    }

    fn boundary(
        ctx: &ComputeContext<'_, NodeKind>,
        sets: &[Arc<[usize]>],
    ) -> Result<Boundary, ModelError> {
        let region = ctx.region();
        match region.dimension() {
            1 => Ok(Self::boundary_1d(region, sets)),
            2 => Self::boundary_2d(ctx, sets),
            _ => Self::boundary_3d(region, sets),
        }
    }
}

impl ModelCalculation<NodeKind> for SurfaceArea {
    fn dependencies(&self, region: &Region) -> Vec<String> {
        let mut deps: Vec<String> = match region.dimension() {
            1 => vec![EDGE_LENGTH.to_string()],
            2 => vec![EDGE_LENGTH.to_string(), UNIT_X.to_string(), UNIT_Y.to_string()],
            _ => Vec::new(),
        };
        deps.push(INTERFACE_CHANGE.to_string());
        deps.push(CONTACT_CHANGE.to_string());
        deps
    }

    fn companions(&self, region: &Region) -> Vec<String> {
        std::iter::once(CONTACT_SURFACE_AREA)
            .chain(Self::normal_names(region.dimension()).iter().copied())
            .map(str::to_string)
            .collect()
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, NodeKind>) -> Result<(), ModelError> {
        let region = ctx.region();
        let contacts = region.contacts().into_iter().map(|c| c.nodes).collect_vec();
        let interfaces = region.interfaces().into_iter().map(|i| i.nodes).collect_vec();

        let contact = Self::boundary(ctx, &contacts)?;
        let interface = Self::boundary(ctx, &interfaces)?;

        ctx.set_values(interface.area);
        ctx.set_companion_values(CONTACT_SURFACE_AREA, contact.area);
        for (c, name) in Self::normal_names(region.dimension()).iter().enumerate() {
            ctx.set_companion_values(*name, interface.normal.iter().map(|v| v[c]).collect());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tetrahedron_faces_inside_a_node_set() {
        let mut b = crate::region::RegionBuilder::new("dev", "tet");
        b.add_node([0.0, 0.0, 0.0]);
        b.add_node([1.0, 0.0, 0.0]);
        b.add_node([0.0, 1.0, 0.0]);
        b.add_node([0.0, 0.0, 1.0]);
        b.add_tetrahedron([0, 1, 2, 3]);
        let region = b.finalize().unwrap();

        let bottom: Arc<[usize]> = vec![0, 1, 2].into();
        assert_eq!(boundary_faces(&region, &[bottom]), vec![[0, 1, 2]]);
        let apex: Arc<[usize]> = vec![0, 3].into();
        assert!(boundary_faces(&region, &[apex]).is_empty());
    }

    #[test]
    fn opposed_normals_cancel_through_flipping() {
        let mut boundary = Boundary::new(1);
        boundary.add(0, 1.0, [0.0, 0.0, 2.0]);
        boundary.add(0, 1.0, [0.0, 0.0, -2.0]);
        let boundary = boundary.into_unit_normals();
        assert_eq!(boundary.area, vec![2.0]);
        assert_eq!(boundary.normal, vec![[0.0, 0.0, 1.0]]);
    }
}
