//! GNG-T (C9): same substrate as [`super::core::Gng`], but grow/shrink is
//! decided once per epoch against a target average error rather than
//! growing without bound. Grounded on `src/gng-t.c`'s
//! `ferGNGTAdapt`/`ferGNGTGrowShrink`: lambda inner-adaptation steps with
//! no grow step, then a single grow-or-shrink decision.

use crate::index::NnIndex;
use crate::net::Net;
use netcore::{EdgeId, ElementId, NodeId};
use std::collections::HashMap;
use vecspace::{Metric, Vector};

/// Tuned constants for a `GngT` run
#[derive(Clone, Copy, Debug)]
pub struct GngTParams {
    /// Inner-adaptation steps per epoch
    pub lambda: usize,
    /// Winner's fractional step toward the sample
    pub eb: f64,
    /// Winner neighbours' fractional step toward the sample
    pub en: f64,
    /// Error-halving factor applied to q/f when growing
    pub alpha: f64,
    /// Maximum edge age before it is pruned
    pub age_max: u32,
    /// Average-error threshold the grow/shrink decision is made against
    pub target: f64,
}

impl Default for GngTParams {
    fn default() -> GngTParams {
        GngTParams {
            lambda: 200,
            eb: 0.05,
            en: 0.0006,
            alpha: 0.5,
            age_max: 200,
            target: 0.01,
        }
    }
}

struct GngTNode {
    w: Vector,
    error: f64,
    won: bool,
    element: ElementId,
}

/// GNG-T (C9): growing neural gas steered toward a target node count
pub struct GngT<I: NnIndex, M: Metric> {
    net: Net,
    index: I,
    metric: M,
    nodes: HashMap<NodeId, GngTNode>,
    edge_ages: HashMap<EdgeId, u32>,
    element_owner: HashMap<ElementId, NodeId>,
    params: GngTParams,
}

impl<I: NnIndex, M: Metric> GngT<I, M> {
    /// Seed the network with two nodes and no edges between them
    pub fn new(params: GngTParams, index: I, metric: M, seed1: Vector, seed2: Vector) -> GngT<I, M> {
        let mut gng = GngT {
            net: Net::new(),
            index,
            metric,
            nodes: HashMap::new(),
            edge_ages: HashMap::new(),
            element_owner: HashMap::new(),
            params,
        };
        gng.insert_node(seed1);
        gng.insert_node(seed2);
        gng
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// The weight vector of a node
    pub fn weight(&self, n: NodeId) -> &Vector {
        &self.nodes[&n].w
    }

    /// Whether `n` won at least one inner-adaptation step since the last epoch reset
    pub fn has_won(&self, n: NodeId) -> bool {
        self.nodes[&n].won
    }

    fn insert_node(&mut self, w: Vector) -> NodeId {
        let node_id = self.net.add_node();
        let element_id = self.index.add(w.clone());
        self.nodes.insert(
            node_id,
            GngTNode {
                w,
                error: 0.0,
                won: false,
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

    /// Run one epoch: reset per-node bookkeeping, feed `lambda`
    /// inner-adaptation steps, then compare the network's average error
    /// against `target` to grow or shrink it once.
    ///
    /// Panics if the network would fall below two nodes: per the
    /// documented fatal path, a run that shrinks that far is
    /// misconfigured and cannot continue.
    pub fn epoch<F: FnMut() -> Vector>(&mut self, mut next_sample: F) {
        for node in self.nodes.values_mut() {
            node.error = 0.0;
            node.won = false;
        }

        for _ in 0..self.params.lambda {
            let sample = next_sample();
            self.inner_step(&sample);
        }

        let mean_error = self.nodes.values().map(|n| n.error).sum::<f64>() / self.nodes.len() as f64;
        if mean_error > self.params.target {
            self.grow();
        } else {
            self.shrink();
        }
    }

    fn inner_step(&mut self, sample: &Vector) {
        let nearest = self.index.nearest(sample, 2);
        assert!(
            nearest.len() >= 2,
            "gng-t needs at least two registered nodes to step"
        );
        let n1 = self.element_owner[&nearest[0].0];
        let n2 = self.element_owner[&nearest[1].0];

        let edge = self.net.edge_between(n1, n2).unwrap_or_else(|| self.net.add_edge(n1, n2));
        self.edge_ages.insert(edge, 0);

        let w1 = self.nodes[&n1].w.clone();
        {
            let node1 = self.nodes.get_mut(&n1).unwrap();
            node1.error += self.metric.squared_distance(sample, &w1);
            node1.won = true;
        }

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
    }

    fn grow(&mut self) {
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

    fn shrink(&mut self) {
        assert!(
            self.nodes.len() > 2,
            "gng-t network underflowed below two nodes; run is misconfigured"
        );
        let victim = *self
            .nodes
            .iter()
            .min_by(|a, b| a.1.error.partial_cmp(&b.1.error).unwrap())
            .expect("network must be non-empty")
            .0;

        let incident = self.net.incident(victim).to_vec();
        for e in incident {
            self.net.remove_edge(e);
            self.edge_ages.remove(&e);
        }
        self.delete_node(victim);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Gug, GugConfig};
    use crate::rng::Rng;
    use rand_distr::{Distribution, Uniform};
    use vecspace::Euclidean;

    fn v(xs: &[f64]) -> Vector {
        Vector::new(xs.to_vec()).unwrap()
    }

    fn sample(rng: &mut Rng) -> Vector {
        let u = Uniform::new(-2.0, 2.0);
        v(&[u.sample(rng.inner()), u.sample(rng.inner())])
    }

    #[test]
    fn grows_when_mean_error_exceeds_target() {
        let index = Gug::new(GugConfig::new(2, vec![-3.0, 3.0, -3.0, 3.0]), Euclidean);
        let params = GngTParams {
            lambda: 30,
            target: 0.0,
            ..GngTParams::default()
        };
        let mut gng = GngT::new(params, index, Euclidean, v(&[0.1, 0.0]), v(&[-0.1, 0.0]));
        let mut rng = Rng::from_seed(11);
        for _ in 0..10 {
            gng.epoch(|| sample(&mut rng));
        }
        assert!(gng.len() > 2);
    }

    #[test]
    #[should_panic(expected = "misconfigured")]
    fn shrinking_past_two_nodes_is_fatal() {
        let index = Gug::new(GugConfig::new(2, vec![-3.0, 3.0, -3.0, 3.0]), Euclidean);
        let params = GngTParams {
            lambda: 2,
            target: 1e9,
            ..GngTParams::default()
        };
        let mut gng = GngT::new(params, index, Euclidean, v(&[0.1, 0.0]), v(&[-0.1, 0.0]));
        let mut rng = Rng::from_seed(2);
        gng.epoch(|| sample(&mut rng));
    }
}
