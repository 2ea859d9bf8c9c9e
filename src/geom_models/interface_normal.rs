//! Distance from every edge to an interface and the interface normal seen
//! from that edge.
//!
//! `<interface>_distance` is the primary; `<interface>_normal_x`, `_y`
//! (and `_z` in 3D) are its companions. Each edge takes the normal of its
//! nearest interface node, flipped to point from the edge center towards the
//! interface.

use std::fmt;

use crate::geom_models::edge_center;
use crate::geom_models::names::{SURFACE_AREA, SURFACE_NORMAL};
use crate::geometry::Vector;
use crate::geometry::vector::{dot, scale, sub};
use crate::model::{ComputeContext, EdgeKind, ModelCalculation, ModelHandle};
use crate::model_error::ModelError;
use crate::region::{INTERFACE_CHANGE, Region};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceNormal {
    interface: String,
}

impl InterfaceNormal {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Name of the distance model.
    pub fn name(&self) -> String {
        format!("{}_distance", self.interface)
    }

    fn normal_names(&self, dimension: usize) -> Vec<String> {
        ["x", "y", "z"]
            .into_iter()
            .take(if dimension >= 2 { dimension } else { 0 })
            .map(|c| format!("{}_normal_{}", self.interface, c))
            .collect()
    }
}

impl ModelCalculation<EdgeKind> for InterfaceNormal {
    fn dependencies(&self, region: &Region) -> Vec<String> {
        let dimension = region.dimension();
        let mut deps: Vec<String> = SURFACE_NORMAL
            .into_iter()
            .take(if dimension >= 2 { dimension } else { 0 })
            .map(str::to_string)
            .collect();
        deps.push(SURFACE_AREA.to_string());
        deps.push(INTERFACE_CHANGE.to_string());
        deps
    }

    fn companions(&self, region: &Region) -> Vec<String> {
        self.normal_names(region.dimension())
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, EdgeKind>) -> Result<(), ModelError> {
        let region = ctx.region();
        let dimension = region.dimension();
        if dimension == 1 {
            return Err(ctx.domain_error("interface normals are not supported in 1D"));
        }
        let interface = region
            .interface(&self.interface)
            .ok_or_else(|| ModelError::UnknownInterface(region.location(), self.interface.clone()))?;

        let mut surface_normal = Vec::with_capacity(dimension);
        for name in SURFACE_NORMAL.into_iter().take(dimension) {
            surface_normal.push(ctx.node_values(name)?);
        }
        let normal_at = |n: usize| -> Vector {
            let mut v = [0.0; 3];
            for (c, values) in v.iter_mut().zip(&surface_normal) {
                *c = values[n];
            }
            v
        };

        let centers: Vec<Vector> = (0..region.edges().len()).map(|e| edge_center(region, e)).collect();
        let mut distances = vec![f64::MAX; centers.len()];
        let mut normals = vec![[0.0; 3]; centers.len()];
        for &n in interface.nodes.iter() {
            let position = region.position(n);
            let normal = normal_at(n);
            for ((center, d), out) in centers.iter().zip(&mut distances).zip(&mut normals) {
                let t = sub(position, *center);
                let dist = dot(t, t);
                if dist < *d {
                    *d = dist;
                    *out = if dot(t, normal) < 0.0 { scale(normal, -1.0) } else { normal };
                }
            }
        }

        ctx.set_values(distances.into_iter().map(f64::sqrt).collect());
        for (c, name) in self.normal_names(dimension).into_iter().enumerate() {
            ctx.set_companion_values(name, normals.iter().map(|v| v[c]).collect());
        }
        Ok(())
    }

    fn serialize(&self, model: &ModelHandle<'_, EdgeKind>, out: &mut dyn fmt::Write) -> fmt::Result {
        let region = model.region();
        write!(
            out,
            "COMMAND interface_normal_model -device \"{}\" -region \"{}\" -interface \"{}\"",
            region.device_name(),
            region.name(),
            self.interface
        )
    }
}
