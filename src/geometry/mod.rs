//! Geometry primitives read by the model layer.
//!
//! Elements are immutable once a [`Region`](crate::region::Region) is
//! finalized; models only ever see them through shared references.

pub mod centers;
pub mod element;
pub mod vector;

pub use element::{Edge, Node, Tetrahedron, Triangle};
pub use vector::Vector;
