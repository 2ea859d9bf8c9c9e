//! Unit tangent of each edge, one model per spatial component.
//!
//! `unitx` is the primary; `unity` (2D and up) and `unitz` (3D) are its
//! companions.

use crate::geom_models::names::{UNIT_X, UNIT_Y, UNIT_Z};
use crate::geometry::vector::{norm, scale, sub};
use crate::model::{ComputeContext, EdgeKind, ModelCalculation};
use crate::model_error::ModelError;
use crate::region::Region;

#[derive(Debug, Default, Clone, Copy)]
pub struct UnitVec;

impl ModelCalculation<EdgeKind> for UnitVec {
    fn companions(&self, region: &Region) -> Vec<String> {
        [UNIT_Y, UNIT_Z]
            .into_iter()
            .take(region.dimension().saturating_sub(1))
            .map(str::to_string)
            .collect()
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, EdgeKind>) -> Result<(), ModelError> {
        let region = ctx.region();
        let mut components = [Vec::new(), Vec::new(), Vec::new()];
        for e in region.edges() {
            let v = sub(region.position(e.tail()), region.position(e.head()));
            let unit = scale(v, 1.0 / norm(v));
            for (c, u) in components.iter_mut().zip(unit) {
                c.push(u);
            }
        }
        let [x, y, z] = components;
        ctx.set_values(x);
        for (name, values) in self.companions(region).into_iter().zip([y, z]) {
            ctx.set_companion_values(name, values);
        }
        Ok(())
    }
}
