//! The graph substrate every streaming client (GNG, GNG-T, Kohonen) builds
//! on: nodes and undirected edges with O(1) incidence.
//!
//! `boruvka/net.h` gets there with an intrusive doubly-linked list per node
//! and a tagged hook per edge so the owning edge can be recovered from
//! either of its two list entries. An arena sidesteps both: a node's
//! incident edges are a plain `Vec<EdgeId>` (no hooks to splice), and an
//! edge's own endpoints are stored directly on the edge record (no tag to
//! recover a "which side am I" bit from).

use crate::errors::{TopoError, TopoResult};
use netcore::{EdgeId, NodeId};

struct NodeRecord {
    incident: Vec<EdgeId>,
}

struct EdgeRecord {
    endpoints: [NodeId; 2],
}

enum Slot<T> {
    Occupied(T),
    Free { next_free: Option<usize> },
}

/// The node/edge graph. Payload-free: clients attach their own per-node and
/// per-edge data (weights, errors, ages) in parallel arenas keyed by the
/// same `NodeId`/`EdgeId`.
#[derive(Default)]
pub struct Net {
    nodes: Vec<Slot<NodeRecord>>,
    edges: Vec<Slot<EdgeRecord>>,
    free_nodes: Option<usize>,
    free_edges: Option<usize>,
    nodes_len: usize,
    edges_len: usize,
}

impl Net {
    /// An empty net
    pub fn new() -> Net {
        Net::default()
    }

    /// Number of live nodes
    pub fn nodes_len(&self) -> usize {
        self.nodes_len
    }

    /// Number of live edges
    pub fn edges_len(&self) -> usize {
        self.edges_len
    }

    /// Add a fresh, unconnected node
    pub fn add_node(&mut self) -> NodeId {
        let record = NodeRecord {
            incident: Vec::new(),
        };
        self.nodes_len += 1;
        match self.free_nodes.take() {
            Some(i) => {
                self.free_nodes = match &self.nodes[i] {
                    Slot::Free { next_free } => *next_free,
                    Slot::Occupied(_) => unreachable!("free list pointed at an occupied slot"),
                };
                self.nodes[i] = Slot::Occupied(record);
                NodeId::new(i)
            }
            None => {
                self.nodes.push(Slot::Occupied(record));
                NodeId::new(self.nodes.len() - 1)
            }
        }
    }

    /// Remove a node, failing if it still has incident edges
    pub fn remove_node(&mut self, n: NodeId) -> TopoResult<()> {
        if !self.incident(n).is_empty() {
            return Err(TopoError::ConnectedNodeRemoval);
        }
        self.nodes[n.index()] = Slot::Free {
            next_free: self.free_nodes,
        };
        self.free_nodes = Some(n.index());
        self.nodes_len -= 1;
        Ok(())
    }

    /// Add an undirected edge between `a` and `b`
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> EdgeId {
        let record = EdgeRecord { endpoints: [a, b] };
        self.edges_len += 1;
        let id = match self.free_edges.take() {
            Some(i) => {
                self.free_edges = match &self.edges[i] {
                    Slot::Free { next_free } => *next_free,
                    Slot::Occupied(_) => unreachable!("free list pointed at an occupied slot"),
                };
                self.edges[i] = Slot::Occupied(record);
                EdgeId::new(i)
            }
            None => {
                self.edges.push(Slot::Occupied(record));
                EdgeId::new(self.edges.len() - 1)
            }
        };
        self.node_mut(a).incident.push(id);
        self.node_mut(b).incident.push(id);
        id
    }

    /// Remove an edge, detaching it from both endpoints' incident lists
    pub fn remove_edge(&mut self, e: EdgeId) {
        let [a, b] = self.edge(e).endpoints;
        detach(&mut self.node_mut(a).incident, e);
        detach(&mut self.node_mut(b).incident, e);
        self.edges[e.index()] = Slot::Free {
            next_free: self.free_edges,
        };
        self.free_edges = Some(e.index());
        self.edges_len -= 1;
    }

    /// The edges incident to `n`
    pub fn incident(&self, n: NodeId) -> &[EdgeId] {
        &self.node(n).incident
    }

    /// The number of edges incident to `n`
    pub fn degree(&self, n: NodeId) -> usize {
        self.node(n).incident.len()
    }

    /// The two endpoints of `e`
    pub fn endpoints(&self, e: EdgeId) -> [NodeId; 2] {
        self.edge(e).endpoints
    }

    /// The endpoint of `e` that is not `n`
    pub fn other_endpoint(&self, e: EdgeId, n: NodeId) -> NodeId {
        let [a, b] = self.edge(e).endpoints;
        if a == n {
            b
        } else {
            a
        }
    }

    /// The first edge connecting `a` and `b`, found by scanning whichever
    /// endpoint has fewer incident edges
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        let (scan, target) = if self.degree(a) <= self.degree(b) {
            (a, b)
        } else {
            (b, a)
        };
        self.incident(scan)
            .iter()
            .copied()
            .find(|&e| self.other_endpoint(e, scan) == target)
    }

    /// True iff the three edges form a triangle: every pair shares exactly
    /// one distinct common vertex, and the three shared vertices are
    /// pairwise distinct
    pub fn tri_check(&self, e1: EdgeId, e2: EdgeId, e3: EdgeId) -> bool {
        let shared = |x: EdgeId, y: EdgeId| -> Option<NodeId> {
            let [a0, a1] = self.edge(x).endpoints;
            let [b0, b1] = self.edge(y).endpoints;
            for a in [a0, a1] {
                if a == b0 || a == b1 {
                    return Some(a);
                }
            }
            None
        };
        match (shared(e1, e2), shared(e2, e3), shared(e3, e1)) {
            (Some(v12), Some(v23), Some(v31)) => v12 != v23 && v23 != v31 && v31 != v12,
            _ => false,
        }
    }

    /// Visit every live node
    pub fn for_each_node<F: FnMut(NodeId)>(&self, mut f: F) {
        for (i, slot) in self.nodes.iter().enumerate() {
            if let Slot::Occupied(_) = slot {
                f(NodeId::new(i));
            }
        }
    }

    /// Visit every live edge
    pub fn for_each_edge<F: FnMut(EdgeId)>(&self, mut f: F) {
        for (i, slot) in self.edges.iter().enumerate() {
            if let Slot::Occupied(_) = slot {
                f(EdgeId::new(i));
            }
        }
    }

    /// A human-readable text dump of every live node and edge, one per
    /// line in ascending id order, for debugging only (not part of the
    /// public contract). Format: `node <id>` then `edge <id> <a> <b>`,
    /// the indices-only analogue of `ferNetDumpTriangles`'s one-line-per-
    /// element convention, since `Net` itself carries no geometry to dump.
    pub fn dump_text(&self) -> String {
        let mut out = String::new();
        let mut node_ids = Vec::new();
        self.for_each_node(|n| node_ids.push(n));
        node_ids.sort_by_key(|n: &NodeId| n.index());
        for n in node_ids {
            out.push_str(&format!("node {}\n", n.index()));
        }
        let mut edge_ids = Vec::new();
        self.for_each_edge(|e| edge_ids.push(e));
        edge_ids.sort_by_key(|e: &EdgeId| e.index());
        for e in edge_ids {
            let [a, b] = self.endpoints(e);
            out.push_str(&format!("edge {} {} {}\n", e.index(), a.index(), b.index()));
        }
        out
    }

    /// Consume the net, visiting every node then every edge with a callback
    /// before dropping the arena storage. The Rust-safe equivalent of the
    /// C source's two-phase `ferNetDel2` destructor: there the net frees
    /// its own list bookkeeping while invoking `delnode`/`deledge` on the
    /// caller's embedding records, here `self` is simply moved into the
    /// call and dropped at the end.
    pub fn drain<FN: FnMut(NodeId), FE: FnMut(EdgeId)>(self, mut on_node: FN, mut on_edge: FE) {
        self.for_each_node(&mut on_node);
        self.for_each_edge(&mut on_edge);
    }

    fn node(&self, n: NodeId) -> &NodeRecord {
        match &self.nodes[n.index()] {
            Slot::Occupied(r) => r,
            Slot::Free { .. } => panic!("use of a freed NodeId"),
        }
    }

    fn node_mut(&mut self, n: NodeId) -> &mut NodeRecord {
        match &mut self.nodes[n.index()] {
            Slot::Occupied(r) => r,
            Slot::Free { .. } => panic!("use of a freed NodeId"),
        }
    }

    fn edge(&self, e: EdgeId) -> &EdgeRecord {
        match &self.edges[e.index()] {
            Slot::Occupied(r) => r,
            Slot::Free { .. } => panic!("use of a freed EdgeId"),
        }
    }
}

fn detach(incident: &mut Vec<EdgeId>, e: EdgeId) {
    if let Some(pos) = incident.iter().position(|&x| x == e) {
        incident.swap_remove(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_count_matches_incident_len() {
        let mut net = Net::new();
        let a = net.add_node();
        let b = net.add_node();
        let c = net.add_node();
        net.add_edge(a, b);
        net.add_edge(a, c);
        assert_eq!(net.degree(a), net.incident(a).len());
        assert_eq!(net.degree(a), 2);
        assert_eq!(net.degree(b), 1);
    }

    #[test]
    fn remove_node_fails_while_connected() {
        let mut net = Net::new();
        let a = net.add_node();
        let b = net.add_node();
        net.add_edge(a, b);
        assert!(matches!(
            net.remove_node(a),
            Err(TopoError::ConnectedNodeRemoval)
        ));
    }

    #[test]
    fn remove_node_succeeds_once_isolated() {
        let mut net = Net::new();
        let a = net.add_node();
        let b = net.add_node();
        let e = net.add_edge(a, b);
        net.remove_edge(e);
        assert!(net.remove_node(a).is_ok());
        assert_eq!(net.nodes_len(), 1);
    }

    #[test]
    fn edge_between_finds_connection() {
        let mut net = Net::new();
        let a = net.add_node();
        let b = net.add_node();
        let c = net.add_node();
        let e = net.add_edge(a, b);
        assert_eq!(net.edge_between(a, b), Some(e));
        assert_eq!(net.edge_between(a, c), None);
    }

    #[test]
    fn tri_check_detects_a_triangle() {
        let mut net = Net::new();
        let a = net.add_node();
        let b = net.add_node();
        let c = net.add_node();
        let ab = net.add_edge(a, b);
        let bc = net.add_edge(b, c);
        let ca = net.add_edge(c, a);
        assert!(net.tri_check(ab, bc, ca));
    }

    #[test]
    fn tri_check_rejects_a_path() {
        let mut net = Net::new();
        let a = net.add_node();
        let b = net.add_node();
        let c = net.add_node();
        let d = net.add_node();
        let ab = net.add_edge(a, b);
        let bc = net.add_edge(b, c);
        let cd = net.add_edge(c, d);
        assert!(!net.tri_check(ab, bc, cd));
    }

    #[test]
    fn freed_node_slots_are_reused() {
        let mut net = Net::new();
        let a = net.add_node();
        net.remove_node(a).unwrap();
        let b = net.add_node();
        assert_eq!(a.index(), b.index());
    }

    #[test]
    fn dump_text_lists_nodes_then_edges_in_id_order() {
        let mut net = Net::new();
        let a = net.add_node();
        let b = net.add_node();
        let e = net.add_edge(a, b);
        let dump = net.dump_text();
        assert_eq!(
            dump,
            format!("node {}\nnode {}\nedge {} {} {}\n", a.index(), b.index(), e.index(), a.index(), b.index())
        );
    }

    #[test]
    fn drain_visits_every_node_and_edge_once() {
        let mut net = Net::new();
        let a = net.add_node();
        let b = net.add_node();
        net.add_edge(a, b);
        let mut node_visits = 0;
        let mut edge_visits = 0;
        net.drain(|_| node_visits += 1, |_| edge_visits += 1);
        assert_eq!(node_visits, 2);
        assert_eq!(edge_visits, 1);
    }
}
