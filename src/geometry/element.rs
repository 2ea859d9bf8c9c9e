//! Indexed mesh elements.
//!
//! Indices are dense and 0-based, assigned when the owning region is
//! finalized. Elements refer to nodes by index rather than by pointer.

use serde::{Deserialize, Serialize};

use super::vector::Vector;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub index: usize,
    pub position: Vector,
}

/// Edge between two nodes; `nodes[0]` is the head and `nodes[1]` the tail.
///
/// Finalized edges always satisfy `head < tail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub index: usize,
    pub nodes: [usize; 2],
}

impl Edge {
    #[inline]
    pub fn head(&self) -> usize {
        self.nodes[0]
    }

    #[inline]
    pub fn tail(&self) -> usize {
        self.nodes[1]
    }

    /// The endpoint that is not `node`, if `node` belongs to this edge.
    pub fn other(&self, node: usize) -> Option<usize> {
        if self.nodes[0] == node {
            Some(self.nodes[1])
        } else if self.nodes[1] == node {
            Some(self.nodes[0])
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub index: usize,
    pub nodes: [usize; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tetrahedron {
    pub index: usize,
    pub nodes: [usize; 4],
}

impl Tetrahedron {
    /// Local node pairs of the six tetrahedron edges, in element-edge order.
    pub const LOCAL_EDGES: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

    /// Nodes of the face opposite local node `k`.
    pub fn face_opposite(&self, k: usize) -> [usize; 3] {
        let mut face = [0; 3];
        let mut j = 0;
        for (i, &n) in self.nodes.iter().enumerate() {
            if i != k {
                face[j] = n;
                j += 1;
            }
        }
        face
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_other_endpoint() {
        let e = Edge { index: 0, nodes: [2, 5] };
        assert_eq!(e.other(2), Some(5));
        assert_eq!(e.other(5), Some(2));
        assert_eq!(e.other(3), None);
    }

    #[test]
    fn tetrahedron_faces_skip_one_node() {
        let t = Tetrahedron { index: 0, nodes: [10, 11, 12, 13] };
        assert_eq!(t.face_opposite(0), [11, 12, 13]);
        assert_eq!(t.face_opposite(2), [10, 11, 13]);
    }
}
