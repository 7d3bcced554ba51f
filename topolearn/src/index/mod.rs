//! Nearest-neighbor backends and the facade that unifies them.

mod facade;
mod gug;
mod linear;
mod vptree;

pub use facade::NnBackend;
pub use gug::{Gug, GugConfig};
pub use linear::Linear;
pub use vptree::{VpTree, VpTreeConfig};

use netcore::ElementId;
use vecspace::Vector;

/// Common contract for the three nearest-neighbor backends (C4/C5/C6),
/// dispatched uniformly by `NnBackend` (C7).
pub trait NnIndex {
    /// Register a new point, returning the id the caller uses to refer to
    /// it from now on
    fn add(&mut self, point: Vector) -> ElementId;

    /// Deregister a point. Panics if `id` is not currently registered.
    fn remove(&mut self, id: ElementId);

    /// Notify the index that a registered point's coordinates changed
    fn update(&mut self, id: ElementId, point: Vector);

    /// The `k` nearest registered points to `query`, sorted by non-decreasing
    /// distance. Returns fewer than `k` results if the index holds fewer
    /// than `k` points (§7 `InsufficientNeighbours`: not an error).
    fn nearest(&self, query: &Vector, k: usize) -> Vec<(ElementId, f64)>;

    /// Number of registered points
    fn len(&self) -> usize;

    /// True iff no points are registered
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Insert `(id, dist)` into a bounded best-so-far buffer of at most `k`
/// entries, kept sorted by non-decreasing distance. Shared by every backend
/// that maintains a "k smallest" result set (GUG shells, VPTree recursion,
/// the linear scan).
pub(crate) fn bubble_insert(buf: &mut Vec<(ElementId, f64)>, k: usize, id: ElementId, dist: f64) {
    if buf.len() < k {
        let pos = buf.partition_point(|&(_, d)| d <= dist);
        buf.insert(pos, (id, dist));
    } else if k > 0 && dist < buf[k - 1].1 {
        let pos = buf.partition_point(|&(_, d)| d <= dist);
        buf.insert(pos, (id, dist));
        buf.truncate(k);
    }
}
