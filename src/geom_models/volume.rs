//! Finite-volume node volumes.
//!
//! Each element edge contributes the volume between the edge's dual face
//! piece and one of its endpoints; sums over edges give the control volume
//! of every node.

use crate::geom_models::names::{
    EDGE_COUPLE, EDGE_LENGTH, EDGE_NODE_VOLUME, ELEMENT_EDGE_COUPLE, ELEMENT_NODE_VOLUME,
};
use crate::model::{
    ComputeContext, EdgeKind, ElementEdgeKind, ModelCalculation, NodeKind, TetrahedronEdgeKind,
    TriangleEdgeKind,
};
use crate::model_error::ModelError;
use crate::region::Region;

/// `couple * length * factor` for each element-edge entry.
fn element_node_volume<K: ElementEdgeKind>(
    ctx: &mut ComputeContext<'_, K>,
    factor: f64,
) -> Result<(), ModelError> {
    let couples = ctx.values::<K>(ELEMENT_EDGE_COUPLE)?;
    let lengths = ctx.edge_values(EDGE_LENGTH)?;
    let entry_edges = K::entry_edges(ctx.region());
    let values = couples
        .iter()
        .zip(entry_edges)
        .map(|(c, &e)| factor * c * lengths[e])
        .collect();
    ctx.set_values(values);
    Ok(())
}

fn element_volume_dependencies() -> Vec<String> {
    vec![ELEMENT_EDGE_COUPLE.to_string(), EDGE_LENGTH.to_string()]
}

/// Node volume per triangle edge entry: `couple * length / 4`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TriangleNodeVolume;

impl ModelCalculation<TriangleEdgeKind> for TriangleNodeVolume {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        element_volume_dependencies()
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, TriangleEdgeKind>) -> Result<(), ModelError> {
        element_node_volume(ctx, 0.25)
    }
}

/// Node volume per tetrahedron edge entry: `couple * length / 6`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TetrahedronNodeVolume;

impl ModelCalculation<TetrahedronEdgeKind> for TetrahedronNodeVolume {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        element_volume_dependencies()
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, TetrahedronEdgeKind>) -> Result<(), ModelError> {
        element_node_volume(ctx, 1.0 / 6.0)
    }
}

/// Volume each edge contributes to either of its endpoints.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeNodeVolume;

impl ModelCalculation<EdgeKind> for EdgeNodeVolume {
    fn dependencies(&self, region: &Region) -> Vec<String> {
        match region.dimension() {
            1 => vec![EDGE_COUPLE.to_string(), EDGE_LENGTH.to_string()],
            _ => vec![ELEMENT_NODE_VOLUME.to_string()],
        }
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, EdgeKind>) -> Result<(), ModelError> {
        let values = match ctx.region().dimension() {
            1 => {
                let couples = ctx.edge_values(EDGE_COUPLE)?;
                let lengths = ctx.edge_values(EDGE_LENGTH)?;
                couples.iter().zip(lengths.iter()).map(|(c, l)| 0.5 * c * l).collect()
            }
            2 => ctx.values_on_edges::<TriangleEdgeKind>(ELEMENT_NODE_VOLUME)?,
            _ => ctx.values_on_edges::<TetrahedronEdgeKind>(ELEMENT_NODE_VOLUME)?,
        };
        ctx.set_values(values);
        Ok(())
    }
}

/// Control volume of each node.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeVolume;

impl ModelCalculation<NodeKind> for NodeVolume {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        vec![EDGE_NODE_VOLUME.to_string()]
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, NodeKind>) -> Result<(), ModelError> {
        let edge_volumes = ctx.edge_values(EDGE_NODE_VOLUME)?;
        let region = ctx.region();
        let mut values = vec![0.0; region.nodes().len()];
        for (e, v) in region.edges().iter().zip(edge_volumes.iter()) {
            values[e.head()] += v;
            values[e.tail()] += v;
        }
        ctx.set_values(values);
        Ok(())
    }
}
