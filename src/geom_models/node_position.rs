//! Node coordinates as models.
//!
//! `x` is the primary; `y`, `z` and `node_index` are filled in alongside it.

use crate::geom_models::names::{NODE_INDEX, POSITION_Y, POSITION_Z};
use crate::model::{ComputeContext, ModelCalculation, NodeKind};
use crate::model_error::ModelError;
use crate::region::Region;

#[derive(Debug, Default, Clone, Copy)]
pub struct NodePosition;

impl ModelCalculation<NodeKind> for NodePosition {
    fn companions(&self, _region: &Region) -> Vec<String> {
        vec![
            POSITION_Y.to_string(),
            POSITION_Z.to_string(),
            NODE_INDEX.to_string(),
        ]
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, NodeKind>) -> Result<(), ModelError> {
        let nodes = ctx.region().nodes();
        let component = |d: usize| nodes.iter().map(|n| n.position[d]).collect::<Vec<_>>();
        ctx.set_values(component(0));
        ctx.set_companion_values(POSITION_Y, component(1));
        ctx.set_companion_values(POSITION_Z, component(2));
        ctx.set_companion_values(NODE_INDEX, nodes.iter().map(|n| n.index as f64).collect());
        Ok(())
    }
}
