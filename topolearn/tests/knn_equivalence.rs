//! End-to-end check that the three NN backends agree: for the same point
//! set, distance, and k, GUG, VPTree and Linear return the same k nearest
//! elements (by distance, ties broken modulo distance equality).

use topolearn::{Gug, GugConfig, Linear, NnIndex, VpTree, VpTreeConfig};
use vecspace::{Euclidean, Vector};

fn v(xs: &[f64]) -> Vector {
    Vector::new(xs.to_vec()).unwrap()
}

fn points() -> Vec<Vector> {
    (0..300)
        .map(|i| {
            let x = ((i * 37) % 211) as f64 / 10.0;
            let y = ((i * 53) % 193) as f64 / 10.0;
            v(&[x, y])
        })
        .collect()
}

#[test]
fn gug_vptree_and_linear_agree_on_k_nearest() {
    let pts = points();

    let mut gug = Gug::new(GugConfig::new(2, vec![0.0, 21.1, 0.0, 19.3]), Euclidean);
    let mut linear = Linear::new(Euclidean);
    let vptree = VpTree::build(
        VpTreeConfig {
            dim: 2,
            maxsize: 4,
            minsize: 1,
        },
        Euclidean,
        pts.clone(),
    );

    for p in &pts {
        gug.add(p.clone());
        linear.add(p.clone());
    }

    for q in 0..25 {
        let query = v(&[(q as f64) * 0.8, (q as f64) * 0.7]);
        for k in 1..=5 {
            let gug_dists = sorted_distances(gug.nearest(&query, k));
            let vp_dists = sorted_distances(vptree.nearest(&query, k));
            let linear_dists = sorted_distances(linear.nearest(&query, k));
            assert_eq!(gug_dists.len(), linear_dists.len());
            for ((g, l), p) in gug_dists.iter().zip(&linear_dists).zip(&vp_dists) {
                assert!((g - l).abs() < 1e-9, "gug {} vs linear {}", g, l);
                assert!((g - p).abs() < 1e-9, "gug {} vs vptree {}", g, p);
            }
        }
    }
}

fn sorted_distances(mut results: Vec<(netcore::ElementId, f64)>) -> Vec<f64> {
    results.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    results.into_iter().map(|(_, d)| d).collect()
}
