//! Element kinds a model can be attached to.
//!
//! The four model namespaces behave identically and only differ in how many
//! entries they hold per mesh element and which adjacency table maps those
//! entries back to mesh nodes. [`ElementKind`] captures exactly that
//! difference so [`Model`](super::Model) is written once.

use std::fmt;

use itertools::Itertools;

use crate::model::registry::ModelRegistry;
use crate::region::Region;

/// Runtime tag of a model namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    Node,
    Edge,
    TriangleEdge,
    TetrahedronEdge,
}

impl ModelKind {
    /// All kinds, in save order.
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Node,
        ModelKind::Edge,
        ModelKind::TriangleEdge,
        ModelKind::TetrahedronEdge,
    ];

    /// Keyword used in the saved model format (`begin_<keyword>_model`).
    pub fn keyword(self) -> &'static str {
        match self {
            ModelKind::Node => "node",
            ModelKind::Edge => "edge",
            ModelKind::TriangleEdge => "triangle_edge",
            ModelKind::TetrahedronEdge => "tetrahedron_edge",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == keyword)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelKind::Node => "Node Model",
            ModelKind::Edge => "Edge Model",
            ModelKind::TriangleEdge => "Triangle Edge Model",
            ModelKind::TetrahedronEdge => "Tetrahedron Edge Model",
        })
    }
}

/// Compile-time description of a model namespace.
pub trait ElementKind: fmt::Debug + Send + Sync + Sized + 'static {
    const KIND: ModelKind;

    /// Number of value entries a model of this kind holds in `region`.
    fn entry_count(region: &Region) -> usize;

    /// The registry holding this kind's models.
    fn registry(region: &Region) -> &ModelRegistry<Self>;

    /// Entries touching any of `contact_nodes`, sorted and unique.
    fn contact_indexes(region: &Region, contact_nodes: &[usize]) -> Vec<usize>;
}

/// Kinds holding one entry per (element, local edge) pair.
pub trait ElementEdgeKind: ElementKind {
    const EDGES_PER_ELEMENT: usize;

    /// Region edge index of every entry, flattened element by element.
    fn entry_edges(region: &Region) -> &[usize];
}

#[derive(Debug, Clone, Copy)]
pub struct NodeKind;

#[derive(Debug, Clone, Copy)]
pub struct EdgeKind;

/// Three entries per triangle; entry `j` belongs to the edge opposite node `j`.
#[derive(Debug, Clone, Copy)]
pub struct TriangleEdgeKind;

/// Six entries per tetrahedron, in [`Tetrahedron::LOCAL_EDGES`](crate::geometry::Tetrahedron::LOCAL_EDGES) order.
#[derive(Debug, Clone, Copy)]
pub struct TetrahedronEdgeKind;

impl ElementKind for NodeKind {
    const KIND: ModelKind = ModelKind::Node;

    fn entry_count(region: &Region) -> usize {
        region.nodes().len()
    }

    fn registry(region: &Region) -> &ModelRegistry<Self> {
        &region.models().node
    }

    fn contact_indexes(_region: &Region, contact_nodes: &[usize]) -> Vec<usize> {
        contact_nodes.iter().copied().sorted_unstable().dedup().collect()
    }
}

impl ElementKind for EdgeKind {
    const KIND: ModelKind = ModelKind::Edge;

    fn entry_count(region: &Region) -> usize {
        region.edges().len()
    }

    fn registry(region: &Region) -> &ModelRegistry<Self> {
        &region.models().edge
    }

    fn contact_indexes(region: &Region, contact_nodes: &[usize]) -> Vec<usize> {
        let node_to_edges = region.node_to_edges();
        contact_nodes
            .iter()
            .flat_map(|&n| node_to_edges[n].iter().copied())
            .sorted_unstable()
            .dedup()
            .collect()
    }
}

impl ElementKind for TriangleEdgeKind {
    const KIND: ModelKind = ModelKind::TriangleEdge;

    fn entry_count(region: &Region) -> usize {
        3 * region.triangles().len()
    }

    fn registry(region: &Region) -> &ModelRegistry<Self> {
        &region.models().triangle_edge
    }

    fn contact_indexes(region: &Region, contact_nodes: &[usize]) -> Vec<usize> {
        element_entries(region.node_to_triangles(), contact_nodes, 3)
    }
}

impl ElementEdgeKind for TriangleEdgeKind {
    const EDGES_PER_ELEMENT: usize = 3;

    fn entry_edges(region: &Region) -> &[usize] {
        region.triangle_to_edges().as_flattened()
    }
}

impl ElementKind for TetrahedronEdgeKind {
    const KIND: ModelKind = ModelKind::TetrahedronEdge;

    fn entry_count(region: &Region) -> usize {
        6 * region.tetrahedra().len()
    }

    fn registry(region: &Region) -> &ModelRegistry<Self> {
        &region.models().tetrahedron_edge
    }

    fn contact_indexes(region: &Region, contact_nodes: &[usize]) -> Vec<usize> {
        element_entries(region.node_to_tetrahedra(), contact_nodes, 6)
    }
}

impl ElementEdgeKind for TetrahedronEdgeKind {
    const EDGES_PER_ELEMENT: usize = 6;

    fn entry_edges(region: &Region) -> &[usize] {
        region.tetrahedron_to_edges().as_flattened()
    }
}

/// All entries of every element touching one of `nodes`.
fn element_entries(node_to_elements: &[Vec<usize>], nodes: &[usize], per_element: usize) -> Vec<usize> {
    nodes
        .iter()
        .flat_map(|&n| node_to_elements[n].iter().copied())
        .sorted_unstable()
        .dedup()
        .flat_map(|e| per_element * e..per_element * (e + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(ModelKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(ModelKind::from_keyword("face"), None);
    }

    #[test]
    fn element_entries_expand_each_element_once() {
        let node_to_elements = vec![vec![0], vec![0, 1], vec![1]];
        assert_eq!(element_entries(&node_to_elements, &[1, 2], 3), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(element_entries(&node_to_elements, &[2], 3), vec![3, 4, 5]);
    }
}
