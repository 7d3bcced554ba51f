//! Kohonen self-organising map (C10): same NN substrate as the GNG family,
//! but over a fixed topology built once and never mutated. Grounded on
//! `src/kohonen.c`, which fills in detail this module's operations only
//! sketch elsewhere.
//!
//! BFS from the winner walks net edges with a per-run generation counter
//! instead of a fresh visited-set per step, mirroring
//! `updateWeightsUpdateFifo`'s FIFO breadth walk: a node is marked visited
//! the moment it is enqueued, so it can never be revisited within the same
//! step no matter how many paths reach it.

use crate::index::NnIndex;
use crate::net::Net;
use netcore::{ElementId, NodeId};
use std::collections::{HashMap, VecDeque};
use vecspace::Vector;

struct KohonenNode {
    w: Vector,
    fixed: bool,
    element: ElementId,
    last_visited: u64,
}

/// A Kohonen map: fixed topology, moving weights
pub struct Kohonen<I: NnIndex> {
    net: Net,
    index: I,
    nodes: HashMap<NodeId, KohonenNode>,
    element_owner: HashMap<ElementId, NodeId>,
    generation: u64,
}

impl<I: NnIndex> Kohonen<I> {
    fn empty(index: I) -> Kohonen<I> {
        Kohonen {
            net: Net::new(),
            index,
            nodes: HashMap::new(),
            element_owner: HashMap::new(),
            generation: 0,
        }
    }

    fn insert_node(&mut self, w: Vector) -> NodeId {
        let node_id = self.net.add_node();
        let element_id = self.index.add(w.clone());
        self.nodes.insert(
            node_id,
            KohonenNode {
                w,
                fixed: false,
                element: element_id,
                last_visited: 0,
            },
        );
        self.element_owner.insert(element_id, node_id);
        node_id
    }

    /// Number of nodes in the map
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// The weight vector currently held by `n`
    pub fn weight(&self, n: NodeId) -> &Vector {
        &self.nodes[&n].w
    }

    /// Mark `n` fixed: it is visited by BFS like any other node, but its
    /// weight never moves
    pub fn set_fixed(&mut self, n: NodeId, fixed: bool) {
        self.nodes.get_mut(&n).unwrap().fixed = fixed;
    }

    /// Whether `n` is currently fixed
    pub fn is_fixed(&self, n: NodeId) -> bool {
        self.nodes[&n].fixed
    }

    /// Consume one input signal: find the 1-nearest node, then breadth-walk
    /// outward, moving every in-range, non-fixed node toward `sample`.
    /// `neighbourhood(winner, node, depth)` decides whether a visited node
    /// is in range and, if so, its learning-rate multiplier; BFS does not
    /// continue past a node the callback rejects.
    pub fn step<F>(&mut self, sample: &Vector, learn_rate: f64, mut neighbourhood: F)
    where
        F: FnMut(NodeId, NodeId, usize) -> (bool, f64),
    {
        let nearest = self.index.nearest(sample, 1);
        assert!(!nearest.is_empty(), "kohonen map must have at least one node");
        let winner = self.element_owner[&nearest[0].0];

        self.generation += 1;
        let gen = self.generation;

        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();
        queue.push_back((winner, 0));
        self.nodes.get_mut(&winner).unwrap().last_visited = gen;

        while let Some((n, depth)) = queue.pop_front() {
            let (in_range, rate) = neighbourhood(winner, n, depth);
            if !in_range {
                continue;
            }

            if !self.nodes[&n].fixed {
                let w = self.nodes[&n].w.clone();
                let moved = w.lerp(sample, learn_rate * rate).unwrap();
                self.nodes.get_mut(&n).unwrap().w = moved.clone();
                let element = self.nodes[&n].element;
                self.index.update(element, moved);
            }

            for e in self.net.incident(n).to_vec() {
                let m = self.net.other_endpoint(e, n);
                if self.nodes[&m].last_visited != gen {
                    self.nodes.get_mut(&m).unwrap().last_visited = gen;
                    queue.push_back((m, depth + 1));
                }
            }
        }
    }
}

/// Builds a rectangular grid: `(row, col)` nodes connected to their right
/// and down neighbours (not toroidal)
pub struct GridTopology {
    width: usize,
    height: usize,
}

impl GridTopology {
    /// A `width` by `height` grid
    pub fn new(width: usize, height: usize) -> GridTopology {
        GridTopology { width, height }
    }

    /// Build the map, calling `weight_at(row, col)` once per node
    pub fn build<I, F>(self, index: I, mut weight_at: F) -> (Kohonen<I>, Vec<Vec<NodeId>>)
    where
        I: NnIndex,
        F: FnMut(usize, usize) -> Vector,
    {
        let mut kohonen = Kohonen::empty(index);
        let mut grid = vec![Vec::with_capacity(self.width); self.height];
        for row in 0..self.height {
            for col in 0..self.width {
                grid[row].push(kohonen.insert_node(weight_at(row, col)));
            }
        }
        for row in 0..self.height {
            for col in 0..self.width {
                if col + 1 < self.width {
                    kohonen.net.add_edge(grid[row][col], grid[row][col + 1]);
                }
                if row + 1 < self.height {
                    kohonen.net.add_edge(grid[row][col], grid[row + 1][col]);
                }
            }
        }
        (kohonen, grid)
    }
}

/// Builds a cycle of `size` nodes, each connected to its two neighbours
pub struct RingTopology {
    size: usize,
}

impl RingTopology {
    /// A ring of `size` nodes; `size` must be at least 3
    pub fn new(size: usize) -> RingTopology {
        RingTopology { size }
    }

    /// Build the map, calling `weight_at(index)` once per node
    pub fn build<I, F>(self, index: I, mut weight_at: F) -> (Kohonen<I>, Vec<NodeId>)
    where
        I: NnIndex,
        F: FnMut(usize) -> Vector,
    {
        let mut kohonen = Kohonen::empty(index);
        let ring: Vec<NodeId> = (0..self.size).map(|i| kohonen.insert_node(weight_at(i))).collect();
        for i in 0..self.size {
            kohonen.net.add_edge(ring[i], ring[(i + 1) % self.size]);
        }
        (kohonen, ring)
    }
}
