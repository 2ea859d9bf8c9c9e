//! Edge index as a model, for use in expressions and output.

use crate::model::{ComputeContext, EdgeKind, ModelCalculation};
use crate::model_error::ModelError;

#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeIndex;

impl ModelCalculation<EdgeKind> for EdgeIndex {
    fn calculate(&self, ctx: &mut ComputeContext<'_, EdgeKind>) -> Result<(), ModelError> {
        let values = ctx.region().edges().iter().map(|e| e.index as f64).collect();
        ctx.set_values(values);
        Ok(())
    }
}
