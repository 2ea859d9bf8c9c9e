mod util;
use util::*;

use devsim_models::prelude::*;
use proptest::prelude::*;

fn triangle(points: [[f64; 2]; 3]) -> Region {
    let mut b = RegionBuilder::new("dev", "tri");
    for [x, y] in points {
        b.add_node([x, y, 0.0]);
    }
    b.add_triangle([0, 1, 2]);
    b.finalize().unwrap()
}

proptest! {
    // Base (0,0)-(a,0), apex over the interior of the base and at least `a`
    // high: every angle is acute.
    #[test]
    fn acute_triangle_volumes_sum_to_area(
        a in 0.5f64..3.0,
        t in 0.1f64..0.9,
        h_scale in 1.0f64..3.0,
    ) {
        let h = a * h_scale;
        let region = triangle([[0.0, 0.0], [a, 0.0], [t * a, h]]);
        create_default_models(&region).unwrap();
        let volume = region.node_model(names::NODE_VOLUME).unwrap().scalar_values().unwrap();
        let total: f64 = volume.iter().sum();
        prop_assert!((total - 0.5 * a * h).abs() < 1e-9 * (1.0 + a * h));
        prop_assert!(volume.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn right_triangle_volumes_sum_to_area(a in 0.1f64..5.0, b in 0.1f64..5.0) {
        let region = triangle([[0.0, 0.0], [a, 0.0], [0.0, b]]);
        create_default_models(&region).unwrap();
        let volume = region.node_model(names::NODE_VOLUME).unwrap().scalar_values().unwrap();
        prop_assert!((volume.iter().sum::<f64>() - 0.5 * a * b).abs() < 1e-9 * (1.0 + a * b));
        prop_assert!((volume[0] - 0.25 * a * b).abs() < 1e-9 * (1.0 + a * b));
    }

    #[test]
    fn line_volumes_sum_to_length(mut xs in prop::collection::vec(-10.0f64..10.0, 2..12)) {
        xs.sort_by(f64::total_cmp);
        xs.dedup_by(|a, b| (*a - *b).abs() < 1e-6);
        prop_assume!(xs.len() >= 2);
        let region = line(&xs);
        create_default_models(&region).unwrap();
        let volume = region.node_model(names::NODE_VOLUME).unwrap().scalar_values().unwrap();
        let length = xs[xs.len() - 1] - xs[0];
        prop_assert!((volume.iter().sum::<f64>() - length).abs() < 1e-9);
    }

    #[test]
    fn gradients_are_antisymmetric(
        values in prop::collection::vec(-100.0f64..100.0, 4),
    ) {
        let region = line(&[0.0, 0.5, 1.5, 3.0]);
        create_default_models(&region).unwrap();
        create_node_model(&region, "N").unwrap().set_values(values.clone()).unwrap();

        let g = create_edge_average_model(&region, "G", "N", AverageType::Gradient, None).unwrap();
        let ng = create_edge_average_model(&region, "NG", "N", AverageType::NegativeGradient, None).unwrap();
        let g = g.scalar_values().unwrap();
        let ng = ng.scalar_values().unwrap();
        for (a, b) in g.iter().zip(ng.iter()) {
            prop_assert_eq!(*a, -*b);
        }

        let head = create_edge_average_model(&region, "G", "N", AverageType::Gradient, Some("N")).unwrap();
        let head = head.scalar_values().unwrap();
        let tail = region.edge_model("G:N@n1").unwrap().scalar_values().unwrap();
        for (h, t) in head.iter().zip(tail.iter()) {
            prop_assert_eq!(*h, -*t);
        }
    }
}
