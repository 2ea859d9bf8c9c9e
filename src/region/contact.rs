//! Named node subsets on a region boundary.

use std::sync::Arc;

/// Boundary nodes where a region touches an electrode.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub name: String,
    /// Sorted, unique node indices.
    pub nodes: Arc<[usize]>,
}

/// Boundary nodes shared with another region.
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: String,
    /// Sorted, unique node indices.
    pub nodes: Arc<[usize]>,
}
