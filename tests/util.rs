#![allow(dead_code)]
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use devsim_models::prelude::*;

/// 1D region with nodes at `xs`, consecutive nodes joined by edges.
pub fn line(xs: &[f64]) -> Region {
    let mut b = RegionBuilder::new("dev", "line");
    for &x in xs {
        b.add_node([x, 0.0, 0.0]);
    }
    for i in 1..xs.len() {
        b.add_edge(i - 1, i);
    }
    b.finalize().unwrap()
}

/// Triangle (0,0), (1,0), (0,1).
pub fn right_triangle() -> Region {
    let mut b = RegionBuilder::new("dev", "tri");
    b.add_node([0.0, 0.0, 0.0]);
    b.add_node([1.0, 0.0, 0.0]);
    b.add_node([0.0, 1.0, 0.0]);
    b.add_triangle([0, 1, 2]);
    b.finalize().unwrap()
}

/// Unit square split along the (0,0)-(1,1) diagonal. Edges, in index
/// order: (0,1) (0,2) (0,3) (1,2) (2,3).
pub fn unit_square_builder() -> RegionBuilder {
    let mut b = RegionBuilder::new("dev", "square");
    b.add_node([0.0, 0.0, 0.0]);
    b.add_node([1.0, 0.0, 0.0]);
    b.add_node([1.0, 1.0, 0.0]);
    b.add_node([0.0, 1.0, 0.0]);
    b.add_triangle([0, 1, 2]).add_triangle([0, 2, 3]);
    b
}

pub fn unit_square() -> Region {
    unit_square_builder().finalize().unwrap()
}

/// Regular tetrahedron with volume 8/3 and its circumcenter at the origin.
pub fn regular_tetrahedron() -> Region {
    let mut b = RegionBuilder::new("dev", "tet");
    b.add_node([1.0, 1.0, 1.0]);
    b.add_node([1.0, -1.0, -1.0]);
    b.add_node([-1.0, 1.0, -1.0]);
    b.add_node([-1.0, -1.0, 1.0]);
    b.add_tetrahedron([0, 1, 2, 3]);
    b.finalize().unwrap()
}

/// Node model equal to `source + offset` (or uniformly `offset`), counting
/// its calculations.
#[derive(Debug, Clone)]
pub struct Offset {
    pub source: Option<String>,
    pub offset: f64,
    pub calls: Arc<AtomicUsize>,
}

impl Offset {
    pub fn uniform(offset: f64) -> Self {
        Self {
            source: None,
            offset,
            calls: Arc::default(),
        }
    }

    pub fn of(source: &str, offset: f64) -> Self {
        Self {
            source: Some(source.to_string()),
            offset,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelCalculation<NodeKind> for Offset {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        self.source.iter().cloned().collect()
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, NodeKind>) -> Result<(), ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.source {
            Some(source) => {
                let values = ctx.node_values(source)?;
                ctx.set_values(values.iter().map(|v| v + self.offset).collect());
            }
            None => ctx.set_uniform(self.offset),
        }
        Ok(())
    }
}

pub fn assert_close(got: &[f64], want: &[f64]) {
    assert_eq!(got.len(), want.len(), "got={got:?}\nwant={want:?}");
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() < 1e-12, "got={got:?}\nwant={want:?}");
    }
}
