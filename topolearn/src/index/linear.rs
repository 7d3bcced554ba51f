//! Brute-force kNN baseline (C6). Every query scans every registered point;
//! `update` is a no-op because the scan re-reads the caller's current
//! vector on every call.

use super::{bubble_insert, NnIndex};
use netcore::ElementId;
use vecspace::{Metric, Vector};

enum Slot {
    Occupied(Vector),
    Free { next_free: Option<usize> },
}

/// Linear-scan nearest-neighbor index (C6)
pub struct Linear<M: Metric> {
    metric: M,
    points: Vec<Slot>,
    free: Option<usize>,
    len: usize,
}

impl<M: Metric> Linear<M> {
    /// An empty linear index using `metric`
    pub fn new(metric: M) -> Linear<M> {
        Linear {
            metric,
            points: Vec::new(),
            free: None,
            len: 0,
        }
    }

    /// A human-readable text dump of every live point and its coordinates,
    /// one per line in ascending id order, for debugging only
    pub fn dump_text(&self) -> String {
        let mut out = String::new();
        for (i, slot) in self.points.iter().enumerate() {
            if let Slot::Occupied(p) = slot {
                let coords: Vec<String> = p.as_slice().iter().map(|x| x.to_string()).collect();
                out.push_str(&format!("{} {}\n", i, coords.join(" ")));
            }
        }
        out
    }
}

impl<M: Metric> NnIndex for Linear<M> {
    fn add(&mut self, point: Vector) -> ElementId {
        self.len += 1;
        match self.free.take() {
            Some(i) => {
                self.free = match &self.points[i] {
                    Slot::Free { next_free } => *next_free,
                    Slot::Occupied(_) => unreachable!(),
                };
                self.points[i] = Slot::Occupied(point);
                ElementId::new(i)
            }
            None => {
                self.points.push(Slot::Occupied(point));
                ElementId::new(self.points.len() - 1)
            }
        }
    }

    fn remove(&mut self, id: ElementId) {
        self.points[id.index()] = Slot::Free { next_free: self.free };
        self.free = Some(id.index());
        self.len -= 1;
    }

    fn update(&mut self, id: ElementId, point: Vector) {
        self.points[id.index()] = Slot::Occupied(point);
    }

    fn nearest(&self, query: &Vector, k: usize) -> Vec<(ElementId, f64)> {
        let mut best = Vec::new();
        for (i, slot) in self.points.iter().enumerate() {
            if let Slot::Occupied(p) = slot {
                let d = self.metric.distance(query, p);
                bubble_insert(&mut best, k, ElementId::new(i), d);
            }
        }
        best
    }

    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecspace::Euclidean;

    fn v(xs: &[f64]) -> Vector {
        Vector::new(xs.to_vec()).unwrap()
    }

    #[test]
    fn finds_closest_point() {
        let mut idx = Linear::new(Euclidean);
        let a = idx.add(v(&[0.0, 0.0]));
        let _b = idx.add(v(&[10.0, 10.0]));
        let nearest = idx.nearest(&v(&[0.5, 0.5]), 1);
        assert_eq!(nearest[0].0, a);
    }

    #[test]
    fn k_greater_than_len_returns_all() {
        let mut idx = Linear::new(Euclidean);
        idx.add(v(&[0.0]));
        idx.add(v(&[1.0]));
        let nearest = idx.nearest(&v(&[0.0]), 5);
        assert_eq!(nearest.len(), 2);
    }

    #[test]
    fn dump_text_lists_live_points_only() {
        let mut idx = Linear::new(Euclidean);
        let a = idx.add(v(&[1.0, 2.0]));
        idx.add(v(&[3.0, 4.0]));
        idx.remove(a);
        assert_eq!(idx.dump_text(), "1 3 4\n");
    }

    #[test]
    fn removed_points_are_not_returned() {
        let mut idx = Linear::new(Euclidean);
        let a = idx.add(v(&[0.0]));
        idx.remove(a);
        assert!(idx.is_empty());
        assert!(idx.nearest(&v(&[0.0]), 1).is_empty());
    }
}
