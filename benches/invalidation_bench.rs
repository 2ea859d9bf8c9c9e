use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use devsim_models::prelude::*;

/// Node model equal to another node model plus one.
#[derive(Debug)]
struct Shifted(String);

impl ModelCalculation<NodeKind> for Shifted {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        vec![self.0.clone()]
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, NodeKind>) -> Result<(), ModelError> {
        let values = ctx.node_values(&self.0)?;
        ctx.set_values(values.iter().map(|v| v + 1.0).collect());
        Ok(())
    }
}

fn line(n: usize) -> Region {
    let mut b = RegionBuilder::new("bench", "line");
    for i in 0..n {
        b.add_node([i as f64, 0.0, 0.0]);
    }
    for i in 1..n {
        b.add_edge(i - 1, i);
    }
    b.finalize().expect("line mesh")
}

/// Data model `N0` read through a chain `N1 ... N<depth>`, with an edge
/// average of the last link.
fn chained(n: usize, depth: usize) -> Region {
    let region = line(n);
    create_default_models(&region).expect("default models");
    create_node_model(&region, "N0").expect("data model");
    for d in 1..=depth {
        region
            .add_node_model(&format!("N{d}"), Shifted(format!("N{}", d - 1)))
            .expect("chain link");
    }
    create_edge_average_model(&region, "Navg", &format!("N{depth}"), AverageType::Arithmetic, None)
        .expect("average");
    region
}

fn bench_invalidate_and_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("invalidate_and_read");

    for &depth in &[4usize, 32usize] {
        let region = chained(1000, depth);
        let source = region.node_model("N0").expect("created");
        let average = region.edge_model("Navg").expect("created");
        let values: Vec<f64> = (0..1000).map(|i| (i % 7) as f64).collect();

        group.bench_with_input(BenchmarkId::new("set_values", depth), &depth, |b, _| {
            b.iter(|| source.set_values(values.clone()).expect("values"));
        });

        group.bench_with_input(BenchmarkId::new("set_then_read", depth), &depth, |b, _| {
            b.iter(|| {
                source.set_values(values.clone()).expect("values");
                black_box(average.scalar_values().expect("average"));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_invalidate_and_read);
criterion_main!(benches);
