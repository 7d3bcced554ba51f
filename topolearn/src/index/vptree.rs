//! Vantage-point tree: a metric-space binary partition for kNN on
//! non-uniform point distributions. The batch build's mean-vantage-point /
//! median-split choice, including the degenerate-split epsilon nudge and
//! leaf fallback, follows `src/vptree.c`'s `__ferVPTreeFindVP` /
//! `__ferVPTreeMeanMedian`. The C source's incremental `ferVPTreeAdd` /
//! `ferVPTreeRemove` / `ferVPTreeUpdate` are empty stubs; the versions here
//! are a deliberate strengthening, not a port.
//!
//! Nodes live in an arena (`Vec<VpNode>`) rather than behind boxed
//! pointers, matching the arena-over-raw-pointer redesign used for the net
//! substrate.

use super::{bubble_insert, NnIndex};
use crate::diagnostics::WarnOnce;
use netcore::ElementId;
use std::collections::HashMap;
use vecspace::{Metric, Vector};

const DEGENERATE_SPLIT_EPSILON: f64 = 1e-9;

/// Construction parameters for a `VpTree`. Mirrors the C source's build
/// parameters for `bor_vptree_t`.
#[derive(Clone)]
pub struct VpTreeConfig {
    /// Dimension of the covered space
    pub dim: usize,
    /// Maximum elements a leaf may hold before it splits
    pub maxsize: usize,
    /// Minimum bucket size below which contraction is permitted but not
    /// required; this implementation never contracts, so the field exists
    /// for interface parity with the C params struct
    pub minsize: usize,
}

enum VpNode {
    Leaf {
        elements: Vec<(ElementId, Vector)>,
    },
    Internal {
        vantage: Vector,
        mu: f64,
        left: usize,
        right: usize,
    },
}

/// The Vantage-Point tree index (C5)
pub struct VpTree<M: Metric> {
    metric: M,
    dim: usize,
    maxsize: usize,
    nodes: Vec<VpNode>,
    root: Option<usize>,
    location: HashMap<usize, usize>,
    len: usize,
    next_id: usize,
    degenerate_split_warning: WarnOnce,
}

impl<M: Metric> VpTree<M> {
    /// An empty tree
    pub fn new(config: VpTreeConfig, metric: M) -> VpTree<M> {
        VpTree {
            metric,
            dim: config.dim,
            maxsize: config.maxsize.max(1),
            nodes: Vec::new(),
            root: None,
            location: HashMap::new(),
            len: 0,
            next_id: 0,
            degenerate_split_warning: WarnOnce::new(),
        }
    }

    /// Build from a batch of points in one pass rather than one `add` at a
    /// time; produces the same tree an incremental build converges to, up
    /// to tie-breaking.
    pub fn build(config: VpTreeConfig, metric: M, points: Vec<Vector>) -> VpTree<M> {
        let mut tree = VpTree::new(config, metric);
        if points.is_empty() {
            return tree;
        }
        let items: Vec<(ElementId, Vector)> = points
            .into_iter()
            .enumerate()
            .map(|(i, p)| (ElementId::new(i), p))
            .collect();
        tree.len = items.len();
        tree.next_id = items.len();
        let node = tree.build_node(items);
        let idx = tree.nodes.len();
        tree.nodes.push(node);
        tree.reindex_subtree(idx);
        tree.root = Some(idx);
        tree
    }

    fn mean(&self, items: &[(ElementId, Vector)]) -> Vector {
        let mut sum = vec![0.0; self.dim];
        for (_, v) in items {
            for i in 0..self.dim {
                sum[i] += v.as_slice()[i];
            }
        }
        let n = items.len() as f64;
        for x in sum.iter_mut() {
            *x /= n;
        }
        Vector::new(sum).expect("non-empty dimension")
    }

    fn median(&self, mut distances: Vec<f64>) -> f64 {
        distances.sort_by(|a, b| a.partial_cmp(b).unwrap());
        distances[distances.len() / 2]
    }

    fn partition(&self, items: Vec<(ElementId, Vector)>, vantage: &Vector, mu: f64) -> (Vec<(ElementId, Vector)>, Vec<(ElementId, Vector)>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for item in items {
            let d = self.metric.distance(vantage, &item.1);
            if d <= mu {
                left.push(item);
            } else {
                right.push(item);
            }
        }
        (left, right)
    }

    fn build_node(&mut self, items: Vec<(ElementId, Vector)>) -> VpNode {
        if items.len() <= self.maxsize {
            return VpNode::Leaf { elements: items };
        }
        let vantage = self.mean(&items);
        let distances: Vec<f64> = items.iter().map(|(_, v)| self.metric.distance(&vantage, v)).collect();
        let mut mu = self.median(distances);
        let (mut left, mut right) = self.partition(items, &vantage, mu);

        if left.is_empty() || right.is_empty() {
            mu -= DEGENERATE_SPLIT_EPSILON;
            let mut rejoined = left;
            rejoined.extend(right);
            let (l2, r2) = self.partition(rejoined, &vantage, mu);
            left = l2;
            right = r2;
        }

        if left.is_empty() || right.is_empty() {
            self.degenerate_split_warning
                .warn("vptree: vantage-point split was degenerate, keeping node as a leaf");
            let mut rejoined = left;
            rejoined.extend(right);
            return VpNode::Leaf { elements: rejoined };
        }

        let left_node = self.build_node(left);
        let left_idx = self.nodes.len();
        self.nodes.push(left_node);
        let right_node = self.build_node(right);
        let right_idx = self.nodes.len();
        self.nodes.push(right_node);

        VpNode::Internal {
            vantage,
            mu,
            left: left_idx,
            right: right_idx,
        }
    }

    fn reindex_subtree(&mut self, idx: usize) {
        match &self.nodes[idx] {
            VpNode::Leaf { elements } => {
                for (id, _) in elements {
                    self.location.insert(id.index(), idx);
                }
            }
            VpNode::Internal { left, right, .. } => {
                let (left, right) = (*left, *right);
                self.reindex_subtree(left);
                self.reindex_subtree(right);
            }
        }
    }

    /// A human-readable text dump of the tree's structure, for debugging
    /// only: each internal node's vantage point and split radius, each
    /// leaf's elements and their coordinates, indented by depth. Mirrors
    /// `ferVPTreeDump`'s recursive leaf/internal walk.
    pub fn dump_text(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.dump_node(root, 0, &mut out);
        }
        out
    }

    fn dump_node(&self, idx: usize, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match &self.nodes[idx] {
            VpNode::Leaf { elements } => {
                for (id, v) in elements {
                    let coords: Vec<String> = v.as_slice().iter().map(|x| x.to_string()).collect();
                    out.push_str(&format!("{}leaf {} ({})\n", indent, id.index(), coords.join(" ")));
                }
            }
            VpNode::Internal { vantage, mu, left, right } => {
                let coords: Vec<String> = vantage.as_slice().iter().map(|x| x.to_string()).collect();
                out.push_str(&format!("{}vp ({}) mu {}\n", indent, coords.join(" "), mu));
                self.dump_node(*left, depth + 1, out);
                self.dump_node(*right, depth + 1, out);
            }
        }
    }

    fn descend_to_leaf(&self, point: &Vector) -> usize {
        let mut idx = self.root.expect("tree is non-empty");
        loop {
            match &self.nodes[idx] {
                VpNode::Leaf { .. } => return idx,
                VpNode::Internal { vantage, mu, left, right } => {
                    let d = self.metric.distance(vantage, point);
                    idx = if d <= *mu { *left } else { *right };
                }
            }
        }
    }

    fn query_node(&self, idx: usize, query: &Vector, k: usize, best: &mut Vec<(ElementId, f64)>) {
        match &self.nodes[idx] {
            VpNode::Leaf { elements } => {
                for (id, v) in elements {
                    let d = self.metric.distance(query, v);
                    bubble_insert(best, k, *id, d);
                }
            }
            VpNode::Internal { vantage, mu, left, right } => {
                let dq = self.metric.distance(vantage, query);
                let (first, second) = if dq <= *mu { (*left, *right) } else { (*right, *left) };
                self.query_node(first, query, k, best);
                let tau = if best.len() < k { f64::INFINITY } else { best[k - 1].1 };
                if (dq - mu).abs() < tau {
                    self.query_node(second, query, k, best);
                }
            }
        }
    }
}

impl<M: Metric> NnIndex for VpTree<M> {
    fn add(&mut self, point: Vector) -> ElementId {
        let id = ElementId::new(self.next_id);
        self.next_id += 1;
        self.len += 1;

        match self.root {
            None => {
                let leaf = VpNode::Leaf {
                    elements: vec![(id, point)],
                };
                let idx = self.nodes.len();
                self.nodes.push(leaf);
                self.location.insert(id.index(), idx);
                self.root = Some(idx);
            }
            Some(_) => {
                let leaf_idx = self.descend_to_leaf(&point);
                let count = match &mut self.nodes[leaf_idx] {
                    VpNode::Leaf { elements } => {
                        elements.push((id, point));
                        self.location.insert(id.index(), leaf_idx);
                        elements.len()
                    }
                    VpNode::Internal { .. } => unreachable!("descend_to_leaf always returns a leaf"),
                };
                if count > self.maxsize {
                    let elements = match std::mem::replace(&mut self.nodes[leaf_idx], VpNode::Leaf { elements: Vec::new() }) {
                        VpNode::Leaf { elements } => elements,
                        VpNode::Internal { .. } => unreachable!(),
                    };
                    let node = self.build_node(elements);
                    self.nodes[leaf_idx] = node;
                    self.reindex_subtree(leaf_idx);
                }
            }
        }
        id
    }

    fn remove(&mut self, id: ElementId) {
        let leaf_idx = *self.location.get(&id.index()).expect("element not registered");
        match &mut self.nodes[leaf_idx] {
            VpNode::Leaf { elements } => {
                let pos = elements.iter().position(|(eid, _)| *eid == id).expect("element missing from its leaf");
                elements.remove(pos);
            }
            VpNode::Internal { .. } => unreachable!("location always points at a leaf"),
        }
        self.location.remove(&id.index());
        self.len -= 1;
    }

    fn update(&mut self, id: ElementId, point: Vector) {
        let leaf_idx = *self.location.get(&id.index()).expect("element not registered");
        match &mut self.nodes[leaf_idx] {
            VpNode::Leaf { elements } => {
                let entry = elements.iter_mut().find(|(eid, _)| *eid == id).expect("element missing from its leaf");
                entry.1 = point;
            }
            VpNode::Internal { .. } => unreachable!("location always points at a leaf"),
        }
    }

    fn nearest(&self, query: &Vector, k: usize) -> Vec<(ElementId, f64)> {
        let mut best = Vec::new();
        if let Some(root) = self.root {
            self.query_node(root, query, k, &mut best);
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

    fn brute_force(points: &[Vector], query: &Vector, k: usize) -> Vec<f64> {
        let mut dists: Vec<f64> = points.iter().map(|p| Euclidean.distance(query, p)).collect();
        dists.sort_by(|a, b| a.partial_cmp(b).unwrap());
        dists.truncate(k);
        dists
    }

    #[test]
    fn partition_invariant_holds_for_every_internal_node() {
        let config = VpTreeConfig { dim: 2, maxsize: 2, minsize: 1 };
        let points: Vec<Vector> = (0..50).map(|i| v(&[(i % 7) as f64, (i * 3 % 5) as f64])).collect();
        let tree = VpTree::build(config, Euclidean, points);
        for node in &tree.nodes {
            if let VpNode::Internal { vantage, mu, left, right } = node {
                check_side(&tree, *left, vantage, *mu, true);
                check_side(&tree, *right, vantage, *mu, false);
            }
        }
    }

    fn check_side(tree: &VpTree<Euclidean>, idx: usize, vantage: &Vector, mu: f64, is_left: bool) {
        match &tree.nodes[idx] {
            VpNode::Leaf { elements } => {
                for (_, v) in elements {
                    let d = Euclidean.distance(vantage, v);
                    if is_left {
                        assert!(d <= mu + 1e-9);
                    } else {
                        assert!(d > mu - 1e-9);
                    }
                }
            }
            VpNode::Internal { left, right, .. } => {
                check_side(tree, *left, vantage, mu, is_left);
                check_side(tree, *right, vantage, mu, is_left);
            }
        }
    }

    #[test]
    fn matches_brute_force_for_random_queries() {
        let config = VpTreeConfig { dim: 2, maxsize: 3, minsize: 1 };
        let points: Vec<Vector> = (0..200)
            .map(|i| v(&[((i * 37) % 101) as f64, ((i * 53) % 97) as f64]))
            .collect();
        let tree = VpTree::build(config, Euclidean, points.clone());
        for q in 0..20 {
            let query = v(&[(q * 5) as f64, (q * 3) as f64]);
            let got: Vec<f64> = tree.nearest(&query, 4).into_iter().map(|(_, d)| d).collect();
            let want = brute_force(&points, &query, 4);
            assert_eq!(got.len(), want.len());
            for (g, w) in got.iter().zip(&want) {
                assert!((g - w).abs() < 1e-9, "{} != {}", g, w);
            }
        }
    }

    #[test]
    fn incremental_add_matches_batch_build() {
        let config = VpTreeConfig { dim: 2, maxsize: 2, minsize: 1 };
        let mut incremental = VpTree::new(config, Euclidean);
        let points: Vec<Vector> = (0..40).map(|i| v(&[(i % 6) as f64, (i * 2 % 5) as f64])).collect();
        for p in &points {
            incremental.add(p.clone());
        }
        let query = v(&[2.0, 2.0]);
        let got: Vec<f64> = incremental.nearest(&query, 3).into_iter().map(|(_, d)| d).collect();
        let want = brute_force(&points, &query, 3);
        assert_eq!(got, want);
    }

    #[test]
    fn remove_then_query_excludes_the_point() {
        let config = VpTreeConfig { dim: 1, maxsize: 2, minsize: 1 };
        let mut tree = VpTree::new(config, Euclidean);
        let a = tree.add(v(&[0.0]));
        tree.add(v(&[100.0]));
        tree.remove(a);
        let nearest = tree.nearest(&v(&[0.0]), 1);
        assert_eq!(nearest[0].0.index(), 1);
    }

    #[test]
    fn dump_text_lists_every_element_exactly_once() {
        let config = VpTreeConfig { dim: 2, maxsize: 2, minsize: 1 };
        let points: Vec<Vector> = (0..20).map(|i| v(&[(i % 5) as f64, (i * 3 % 4) as f64])).collect();
        let tree = VpTree::build(config, Euclidean, points);
        let dump = tree.dump_text();
        assert_eq!(dump.lines().filter(|l| l.trim_start().starts_with("leaf")).count(), 20);
    }

    #[test]
    fn update_never_relocates_the_element_to_another_leaf() {
        let config = VpTreeConfig { dim: 2, maxsize: 2, minsize: 1 };
        let mut tree = VpTree::new(config, Euclidean);
        let points: Vec<Vector> = (0..40).map(|i| v(&[(i % 6) as f64, (i * 2 % 5) as f64])).collect();
        let mut ids = Vec::new();
        for p in &points {
            ids.push(tree.add(p.clone()));
        }
        for &id in &ids {
            let leaf_before = tree.location[&id.index()];
            // Move the point far outside the region its leaf's vantage split
            // was built for; a re-descending update would hand it to a
            // different leaf, which the documented invariant forbids.
            tree.update(id, v(&[1000.0, -1000.0]));
            let leaf_after = tree.location[&id.index()];
            assert_eq!(leaf_before, leaf_after, "update must not move an element between nodes");
        }
        match &tree.nodes[tree.location[&ids[0].index()]] {
            VpNode::Leaf { elements } => {
                let (_, w) = elements.iter().find(|(eid, _)| *eid == ids[0]).unwrap();
                assert_eq!(w, &v(&[1000.0, -1000.0]));
            }
            VpNode::Internal { .. } => panic!("location must always point at a leaf"),
        }
    }
}
