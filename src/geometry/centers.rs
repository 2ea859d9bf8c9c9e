//! Circumcenters of triangles and tetrahedra.
//!
//! These are the Voronoi vertices the finite-volume couples and node volumes
//! are measured against.

use super::vector::{Vector, add, cross, dot, scale, sub};

const EPS: f64 = 1e-20;

/// Circumcenter of the triangle `(p0, p1, p2)` in 3D space.
///
/// Returns `None` for degenerate (collinear) triangles.
pub fn triangle_center(p0: Vector, p1: Vector, p2: Vector) -> Option<Vector> {
    let a = sub(p0, p2);
    let b = sub(p1, p2);
    let axb = cross(a, b);
    let denom = 2.0 * dot(axb, axb);
    if denom.abs() < EPS {
        return None;
    }
    let num = cross(sub(scale(b, dot(a, a)), scale(a, dot(b, b))), axb);
    Some(add(p2, scale(num, 1.0 / denom)))
}

/// Circumcenter of the tetrahedron with the given corner positions.
///
/// Solves `M c = B` with rows `v_i = p_i - p_0` and `B_i = |v_i|^2 / 2`.
/// Returns `None` when the tetrahedron is flat.
pub fn tetrahedron_center(p: [Vector; 4]) -> Option<Vector> {
    let v1 = sub(p[1], p[0]);
    let v2 = sub(p[2], p[0]);
    let v3 = sub(p[3], p[0]);
    let det = dot(v1, cross(v2, v3));
    if det.abs() < EPS {
        return None;
    }
    let b1 = 0.5 * dot(v1, v1);
    let b2 = 0.5 * dot(v2, v2);
    let b3 = 0.5 * dot(v3, v3);
    let c = add(
        add(scale(cross(v2, v3), b1), scale(cross(v3, v1), b2)),
        scale(cross(v1, v2), b3),
    );
    Some(add(p[0], scale(c, 1.0 / det)))
}
