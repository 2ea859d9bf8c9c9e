//! Edge length and its reciprocal.

use crate::geom_models::names::EDGE_LENGTH;
use crate::geometry::vector::distance;
use crate::model::{ComputeContext, EdgeKind, ModelCalculation};
use crate::model_error::ModelError;
use crate::region::Region;

/// `|p(head) - p(tail)|` per edge.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeLength;

impl ModelCalculation<EdgeKind> for EdgeLength {
    fn calculate(&self, ctx: &mut ComputeContext<'_, EdgeKind>) -> Result<(), ModelError> {
        let region = ctx.region();
        let values = region
            .edges()
            .iter()
            .map(|e| distance(region.position(e.head()), region.position(e.tail())))
            .collect();
        ctx.set_values(values);
        Ok(())
    }
}

/// `1 / EdgeLength` per edge. Zero-length edges raise a floating point
/// exception.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeInverseLength;

impl ModelCalculation<EdgeKind> for EdgeInverseLength {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        vec![EDGE_LENGTH.to_string()]
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, EdgeKind>) -> Result<(), ModelError> {
        let lengths = ctx.edge_values(EDGE_LENGTH)?;
        ctx.set_values(lengths.iter().map(|l| 1.0 / l).collect());
        Ok(())
    }
}

