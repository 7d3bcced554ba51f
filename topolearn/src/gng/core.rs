//! Growing Neural Gas (C8): a streaming topology learner over the net
//! substrate and the NN facade. Grounded on `gann/src/gng.c`'s
//! `gannGNGLearn` (which resets an edge's age to 0 both when it is created
//! and when it already exists, the policy this module follows) and
//! `gannGNGNewNode` (the insert-node epoch). Global error decay follows
//! `gannGNGDecreaseErrCounters`.

use crate::index::NnIndex;
use crate::net::Net;
use netcore::{EdgeId, ElementId, NodeId};
use std::collections::HashMap;
use vecspace::{Metric, Vector};

/// Tuned constants for a `Gng` run. Defaults match `gannGNGParamsInit`;
/// the end-to-end annulus scenario in this workspace's test suite uses
/// `alpha: 0.5` explicitly rather than relying on `Default`, since the
/// reference scenario and the C source's default disagree on that one
/// field.
#[derive(Clone, Copy, Debug)]
pub struct GngParams {
    /// Samples between insert-node epochs
    pub lambda: usize,
    /// Winner's fractional step toward the sample
    pub eb: f64,
    /// Winner neighbours' fractional step toward the sample
    pub en: f64,
    /// Error-halving factor applied to q/f at an insert-node epoch
    pub alpha: f64,
    /// Per-step global error decay factor
    pub beta: f64,
    /// Maximum edge age before it is pruned
    pub age_max: u32,
}

impl Default for GngParams {
    fn default() -> GngParams {
        GngParams {
            lambda: 200,
            eb: 0.05,
            en: 0.0006,
            alpha: 0.95,
            beta: 0.9995,
            age_max: 200,
        }
    }
}

struct GngNode {
    w: Vector,
    error: f64,
    element: ElementId,
}

/// The GNG core (C8)
pub struct Gng<I: NnIndex, M: Metric> {
    net: Net,
    index: I,
    metric: M,
    nodes: HashMap<NodeId, GngNode>,
    edge_ages: HashMap<EdgeId, u32>,
    element_owner: HashMap<ElementId, NodeId>,
    params: GngParams,
    steps: usize,
}

impl<I: NnIndex, M: Metric> Gng<I, M> {
    /// Seed the network with two nodes, one per sample, and no edges
    /// between them
    pub fn new(params: GngParams, index: I, metric: M, seed1: Vector, seed2: Vector) -> Gng<I, M> {
        let mut gng = Gng {
            net: Net::new(),
            index,
            metric,
            nodes: HashMap::new(),
            edge_ages: HashMap::new(),
            element_owner: HashMap::new(),
            params,
            steps: 0,
        };
        gng.insert_node(seed1);
        gng.insert_node(seed2);
        gng
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Mean error accumulator across all live nodes
    pub fn mean_error(&self) -> f64 {
        self.nodes.values().map(|n| n.error).sum::<f64>() / self.nodes.len() as f64
    }

    /// The weight vector of a node, for inspection by callers and tests
    pub fn weight(&self, n: NodeId) -> &Vector {
        &self.nodes[&n].w
    }

    /// Visit every live node id
    pub fn for_each_node<F: FnMut(NodeId)>(&self, f: F) {
        self.net.for_each_node(f)
    }

    fn insert_node(&mut self, w: Vector) -> NodeId {
        let node_id = self.net.add_node();
        let element_id = self.index.add(w.clone());
        self.nodes.insert(
            node_id,
            GngNode {
                w,
                error: 0.0,
                element: element_id,
            },
        );
        self.element_owner.insert(element_id, node_id);
        node_id
    }

    fn delete_node(&mut self, n: NodeId) {
        let data = self.nodes.remove(&n).expect("node must be registered");
        self.index.remove(data.element);
        self.element_owner.remove(&data.element);
        self.net.remove_node(n).expect("node must be isolated before deletion");
    }

    /// Consume one input signal
    pub fn step(&mut self, sample: &Vector) {
        let nearest = self.index.nearest(sample, 2);
        assert!(
            nearest.len() >= 2,
            "gng needs at least two registered nodes to step"
        );
        let n1 = self.element_owner[&nearest[0].0];
        let n2 = self.element_owner[&nearest[1].0];

        let edge = self.net.edge_between(n1, n2).unwrap_or_else(|| self.net.add_edge(n1, n2));
        self.edge_ages.insert(edge, 0);

        let w1 = self.nodes[&n1].w.clone();
        self.nodes.get_mut(&n1).unwrap().error += self.metric.squared_distance(sample, &w1);

        let moved1 = w1.lerp(sample, self.params.eb).unwrap();
        self.nodes.get_mut(&n1).unwrap().w = moved1.clone();
        let element1 = self.nodes[&n1].element;
        self.index.update(element1, moved1);

        let incident = self.net.incident(n1).to_vec();
        let mut touched_neighbours = Vec::with_capacity(incident.len());
        for e in incident {
            let m = self.net.other_endpoint(e, n1);
            touched_neighbours.push(m);

            let wm = self.nodes[&m].w.clone();
            let moved_m = wm.lerp(sample, self.params.en).unwrap();
            self.nodes.get_mut(&m).unwrap().w = moved_m.clone();
            let element_m = self.nodes[&m].element;
            self.index.update(element_m, moved_m);

            let age = self.edge_ages.entry(e).or_insert(0);
            *age += 1;
            if *age > self.params.age_max {
                self.net.remove_edge(e);
                self.edge_ages.remove(&e);
            }
        }

        for m in touched_neighbours {
            if self.net.degree(m) == 0 {
                self.delete_node(m);
            }
        }
        if self.net.degree(n1) == 0 {
            self.delete_node(n1);
        }

        self.steps += 1;
        if self.params.lambda > 0 && self.steps % self.params.lambda == 0 {
            self.insert_node_epoch();
        }

        self.decay_errors();
    }

    fn decay_errors(&mut self) {
        let beta = self.params.beta;
        for node in self.nodes.values_mut() {
            node.error *= beta;
        }
    }

    /// Insert-node epoch, run every `lambda` steps
    fn insert_node_epoch(&mut self) {
        let q = *self
            .nodes
            .iter()
            .max_by(|a, b| a.1.error.partial_cmp(&b.1.error).unwrap())
            .expect("network must be non-empty")
            .0;

        let q_neighbours: Vec<NodeId> = self
            .net
            .incident(q)
            .iter()
            .map(|&e| self.net.other_endpoint(e, q))
            .collect();
        let f = match q_neighbours
            .iter()
            .copied()
            .max_by(|&a, &b| self.nodes[&a].error.partial_cmp(&self.nodes[&b].error).unwrap())
        {
            Some(f) => f,
            None => return,
        };

        let w_r = self.nodes[&q].w.lerp(&self.nodes[&f].w, 0.5).unwrap();
        let r = self.insert_node(w_r);

        if let Some(e) = self.net.edge_between(q, f) {
            self.net.remove_edge(e);
            self.edge_ages.remove(&e);
        }
        let e_qr = self.net.add_edge(q, r);
        self.edge_ages.insert(e_qr, 0);
        let e_fr = self.net.add_edge(f, r);
        self.edge_ages.insert(e_fr, 0);

        self.nodes.get_mut(&q).unwrap().error *= self.params.alpha;
        self.nodes.get_mut(&f).unwrap().error *= self.params.alpha;
        let q_error = self.nodes[&q].error;
        self.nodes.get_mut(&r).unwrap().error = q_error;
    }
}
