//! NN facade (C7): a tagged-enum dispatcher over the three backends,
//! preferring a sum type over the C source's tag-and-switch dispatch.

use super::{Gug, Linear, NnIndex, VpTree};
use netcore::ElementId;
use vecspace::{Metric, Vector};

/// One nearest-neighbor backend, dispatched by a single match per call
pub enum NnBackend<M: Metric> {
    /// Growing Uniform Grid
    Gug(Gug<M>),
    /// Vantage-Point tree
    VpTree(VpTree<M>),
    /// Brute-force linear scan
    Linear(Linear<M>),
}

impl<M: Metric> NnIndex for NnBackend<M> {
    fn add(&mut self, point: Vector) -> ElementId {
        match self {
            NnBackend::Gug(idx) => idx.add(point),
            NnBackend::VpTree(idx) => idx.add(point),
            NnBackend::Linear(idx) => idx.add(point),
        }
    }

    fn remove(&mut self, id: ElementId) {
        match self {
            NnBackend::Gug(idx) => idx.remove(id),
            NnBackend::VpTree(idx) => idx.remove(id),
            NnBackend::Linear(idx) => idx.remove(id),
        }
    }

    fn update(&mut self, id: ElementId, point: Vector) {
        match self {
            NnBackend::Gug(idx) => idx.update(id, point),
            NnBackend::VpTree(idx) => idx.update(id, point),
            NnBackend::Linear(idx) => idx.update(id, point),
        }
    }

    fn nearest(&self, query: &Vector, k: usize) -> Vec<(ElementId, f64)> {
        match self {
            NnBackend::Gug(idx) => idx.nearest(query, k),
            NnBackend::VpTree(idx) => idx.nearest(query, k),
            NnBackend::Linear(idx) => idx.nearest(query, k),
        }
    }

    fn len(&self) -> usize {
        match self {
            NnBackend::Gug(idx) => idx.len(),
            NnBackend::VpTree(idx) => idx.len(),
            NnBackend::Linear(idx) => idx.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::GugConfig;
    use vecspace::Euclidean;

    fn v(xs: &[f64]) -> Vector {
        Vector::new(xs.to_vec()).unwrap()
    }

    #[test]
    fn dispatches_to_the_selected_backend() {
        let mut facade = NnBackend::Linear(Linear::new(Euclidean));
        let a = facade.add(v(&[0.0, 0.0]));
        facade.add(v(&[5.0, 5.0]));
        assert_eq!(facade.nearest(&v(&[0.1, 0.1]), 1)[0].0, a);

        let mut gug_facade = NnBackend::Gug(Gug::new(GugConfig::new(2, vec![0.0, 10.0, 0.0, 10.0]), Euclidean));
        let b = gug_facade.add(v(&[1.0, 1.0]));
        assert_eq!(gug_facade.nearest(&v(&[1.0, 1.0]), 1)[0].0, b);
    }
}
