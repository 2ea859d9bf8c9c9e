//! Number of contacts each node belongs to.

use crate::model::{ComputeContext, ModelCalculation, NodeKind};
use crate::model_error::ModelError;
use crate::region::{CONTACT_CHANGE, Region};

#[derive(Debug, Default, Clone, Copy)]
pub struct AtContactNode;

impl ModelCalculation<NodeKind> for AtContactNode {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        vec![CONTACT_CHANGE.to_string()]
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, NodeKind>) -> Result<(), ModelError> {
        let region = ctx.region();
        let mut values = vec![0.0; region.nodes().len()];
        for contact in region.contacts() {
            for &n in contact.nodes.iter() {
                values[n] += 1.0;
            }
        }
        ctx.set_values(values);
        Ok(())
    }
}
