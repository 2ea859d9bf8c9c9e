//! Node-averaged gradient of a node model.
//!
//! `<node_model>_gradx` is the primary; `_grady` (2D and up) and `_gradz`
//! (3D) are its companions. In 1D each edge contributes its difference
//! quotient; in 2D and 3D each triangle or tetrahedron contributes the
//! gradient of the linear interpolant through its corners. A node takes the
//! mean over the edges or elements that touch it.

use std::fmt;
use std::str::FromStr;

use crate::geom_models::names::{EDGE_INVERSE_LENGTH, UNIT_X};
use crate::geometry::Vector;
use crate::geometry::vector::{add, cross, dot, scale, sub};
use crate::model::{ComputeContext, ModelCalculation, ModelHandle, NodeKind};
use crate::model_error::ModelError;
use crate::region::Region;

/// Which edges or elements take part in the node average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientCalcType {
    #[default]
    Default,
    /// Skip edges and elements that touch a node where the field is zero.
    AvoidZero,
}

impl GradientCalcType {
    pub fn keyword(self) -> &'static str {
        match self {
            GradientCalcType::Default => "default",
            GradientCalcType::AvoidZero => "avoidzero",
        }
    }
}

impl fmt::Display for GradientCalcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for GradientCalcType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(GradientCalcType::Default),
            "avoidzero" => Ok(GradientCalcType::AvoidZero),
            other => Err(ModelError::UnknownCalcType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorGradient {
    node_model: String,
    calc_type: GradientCalcType,
}

impl VectorGradient {
    pub fn new(node_model: impl Into<String>, calc_type: GradientCalcType) -> Self {
        Self {
            node_model: node_model.into(),
            calc_type,
        }
    }

    /// Name of the x component, the primary model.
    pub fn name(&self) -> String {
        format!("{}_gradx", self.node_model)
    }

    fn component_names(&self, dimension: usize) -> Vec<String> {
        ["y", "z"]
            .into_iter()
            .take(dimension.saturating_sub(1))
            .map(|c| format!("{}_grad{}", self.node_model, c))
            .collect()
    }

    fn skips(&self, field: &[f64], nodes: &[usize]) -> bool {
        self.calc_type == GradientCalcType::AvoidZero && nodes.iter().any(|&n| field[n] == 0.0)
    }

    /// Mean of `per_item` over the items listed for each node, zero for a
    /// node with no item taking part.
    fn node_mean(
        &self,
        field: &[f64],
        node_items: &[Vec<usize>],
        item_nodes: impl Fn(usize) -> Vec<usize>,
        per_item: &[Vector],
    ) -> Vec<Vector> {
        node_items
            .iter()
            .map(|items| {
                let used: Vec<usize> = items
                    .iter()
                    .copied()
                    .filter(|&i| !self.skips(field, &item_nodes(i)))
                    .collect();
                if used.is_empty() {
                    return [0.0; 3];
                }
                let total = used.iter().fold([0.0; 3], |acc, &i| add(acc, per_item[i]));
                scale(total, 1.0 / used.len() as f64)
            })
            .collect()
    }
}

/// Gradient of the linear function taking `values` at the triangle corners
/// `p` (in the xy plane).
fn triangle_gradient(p: [Vector; 3], values: [f64; 3]) -> Option<Vector> {
    let d1 = sub(p[1], p[0]);
    let d2 = sub(p[2], p[0]);
    let det = d1[0] * d2[1] - d1[1] * d2[0];
    if det == 0.0 {
        return None;
    }
    let s1 = values[1] - values[0];
    let s2 = values[2] - values[0];
    Some([(s1 * d2[1] - s2 * d1[1]) / det, (d1[0] * s2 - d2[0] * s1) / det, 0.0])
}

/// Gradient of the linear function taking `values` at the tetrahedron
/// corners `p`.
fn tetrahedron_gradient(p: [Vector; 4], values: [f64; 4]) -> Option<Vector> {
    let d1 = sub(p[1], p[0]);
    let d2 = sub(p[2], p[0]);
    let d3 = sub(p[3], p[0]);
    let det = dot(d1, cross(d2, d3));
    if det == 0.0 {
        return None;
    }
    let g = add(
        add(
            scale(cross(d2, d3), values[1] - values[0]),
            scale(cross(d3, d1), values[2] - values[0]),
        ),
        scale(cross(d1, d2), values[3] - values[0]),
    );
    Some(scale(g, 1.0 / det))
}

impl ModelCalculation<NodeKind> for VectorGradient {
    fn dependencies(&self, region: &Region) -> Vec<String> {
        let mut deps = vec![self.node_model.clone()];
        if region.dimension() == 1 {
            deps.push(EDGE_INVERSE_LENGTH.to_string());
            deps.push(UNIT_X.to_string());
        }
        deps
    }

    fn companions(&self, region: &Region) -> Vec<String> {
        self.component_names(region.dimension())
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, NodeKind>) -> Result<(), ModelError> {
        let region = ctx.region();
        let field = ctx.node_values(&self.node_model)?;
        let degenerate = |what: &str, index: usize| {
            ModelError::InvalidMesh(format!("{} {what} {index} is degenerate", region.location()))
        };

        let gradient = match region.dimension() {
            1 => {
                let inverse_length = ctx.edge_values(EDGE_INVERSE_LENGTH)?;
                let unitx = ctx.edge_values(UNIT_X)?;
                let per_edge: Vec<Vector> = region
                    .edges()
                    .iter()
                    .map(|e| {
                        let delta = field[e.tail()] - field[e.head()];
                        [unitx[e.index] * inverse_length[e.index] * delta, 0.0, 0.0]
                    })
                    .collect();
                let edge_nodes = |e: usize| region.edges()[e].nodes.to_vec();
                self.node_mean(&field, region.node_to_edges(), edge_nodes, &per_edge)
            }
            2 => {
                let per_triangle = region
                    .triangles()
                    .iter()
                    .map(|t| {
                        let corners = t.nodes.map(|n| region.position(n));
                        triangle_gradient(corners, t.nodes.map(|n| field[n]))
                            .ok_or_else(|| degenerate("triangle", t.index))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let triangle_nodes = |t: usize| region.triangles()[t].nodes.to_vec();
                self.node_mean(&field, region.node_to_triangles(), triangle_nodes, &per_triangle)
            }
            _ => {
                let per_tetrahedron = region
                    .tetrahedra()
                    .iter()
                    .map(|t| {
                        let corners = t.nodes.map(|n| region.position(n));
                        tetrahedron_gradient(corners, t.nodes.map(|n| field[n]))
                            .ok_or_else(|| degenerate("tetrahedron", t.index))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let tetrahedron_nodes = |t: usize| region.tetrahedra()[t].nodes.to_vec();
                let node_tetrahedra = region.node_to_tetrahedra();
                self.node_mean(&field, node_tetrahedra, tetrahedron_nodes, &per_tetrahedron)
            }
        };

        ctx.set_values(gradient.iter().map(|g| g[0]).collect());
        for (c, name) in self.component_names(region.dimension()).into_iter().enumerate() {
            ctx.set_companion_values(name, gradient.iter().map(|g| g[c + 1]).collect());
        }
        Ok(())
    }

    fn serialize(&self, model: &ModelHandle<'_, NodeKind>, out: &mut dyn fmt::Write) -> fmt::Result {
        let region = model.region();
        write!(
            out,
            "COMMAND vector_gradient -device \"{}\" -region \"{}\" -calc_type \"{}\" -node_model \"{}\"",
            region.device_name(),
            region.name(),
            self.calc_type,
            self.node_model
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_field_gradient_is_exact() {
        let p = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let f = |v: Vector| 3.0 * v[0] - 2.0 * v[1] + 1.0;
        let g = triangle_gradient(p, p.map(f)).unwrap();
        assert!((g[0] - 3.0).abs() < 1e-12);
        assert!((g[1] + 2.0).abs() < 1e-12);

        let p = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let f = |v: Vector| v[0] + 2.0 * v[1] - 4.0 * v[2];
        let g = tetrahedron_gradient(p, p.map(f)).unwrap();
        assert!((g[0] - 1.0).abs() < 1e-12);
        assert!((g[1] - 2.0).abs() < 1e-12);
        assert!((g[2] + 4.0).abs() < 1e-12);
    }

    #[test]
    fn collinear_triangle_has_no_gradient() {
        let p = [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [2.0, 2.0, 0.0]];
        assert!(triangle_gradient(p, [0.0, 1.0, 2.0]).is_none());
    }

    #[test]
    fn calc_type_keywords() {
        assert_eq!("avoidzero".parse::<GradientCalcType>().unwrap(), GradientCalcType::AvoidZero);
        assert_eq!(GradientCalcType::default().to_string(), "default");
        assert!(matches!(
            "nonzero".parse::<GradientCalcType>(),
            Err(ModelError::UnknownCalcType(_))
        ));
    }
}
