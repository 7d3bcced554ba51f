//! Growing Uniform Grid: an adaptive cell hash for kNN on mutable point
//! sets. Geometry and cell addressing follow `boruvka/gug.h`'s
//! `__borGUGCoordsToID`/`borGUGAdd`/`borGUGUpdate`; the shell-expansion kNN
//! walk and the density-triggered rebuild are this crate's generalisation
//! of `borGUGNearest`/`__borGUGExpand` to an arbitrary number of dimensions
//! rather than the C source's hand-specialised 2-D/3-D variants.

use super::{bubble_insert, NnIndex};
use crate::diagnostics::WarnOnce;
use netcore::ElementId;
use vecspace::{Metric, Vector};

/// Construction parameters for a `Gug`. Mirrors `bor_gug_params_t`.
#[derive(Clone)]
pub struct GugConfig {
    /// Dimension of the covered space
    pub dim: usize,
    /// Initial guess at the number of cells to allocate; `None` defers
    /// entirely to `max_dens`/`expand_rate`
    pub num_cells_target: Option<usize>,
    /// Density (elements / cells) above which the grid is rebuilt larger
    pub max_dens: f64,
    /// Factor by which total cell count grows on a rebuild
    pub expand_rate: f64,
    /// `[xmin, xmax, ymin, ymax, ...]`, length `2 * dim`
    pub aabb: Vec<f64>,
    /// Stop kNN search as soon as the home cell and its immediate
    /// neighbours hold `k` candidates, skipping the optimality proof
    pub approx: bool,
}

impl GugConfig {
    /// A 2-D config with the given aabb and a density-driven default
    /// geometry, matching `borGUGParamsInit`'s defaults (`max_dens: 1`,
    /// `expand_rate: 2`)
    pub fn new(dim: usize, aabb: Vec<f64>) -> GugConfig {
        GugConfig {
            dim,
            num_cells_target: None,
            max_dens: 1.0,
            expand_rate: 2.0,
            aabb,
            approx: false,
        }
    }
}

struct Element {
    point: Vector,
    cell_id: usize,
}

enum Slot {
    Occupied(Element),
    Free { next_free: Option<usize> },
}

/// The Growing Uniform Grid index (C4)
pub struct Gug<M: Metric> {
    metric: M,
    dim: usize,
    aabb: Vec<f64>,
    shift: Vec<f64>,
    dim_counts: Vec<usize>,
    edge: f64,
    cells: Vec<Vec<ElementId>>,
    elements: Vec<Slot>,
    free_elements: Option<usize>,
    num_els: usize,
    max_dens: f64,
    expand_rate: f64,
    approx: bool,
    out_of_range_warning: WarnOnce,
}

impl<M: Metric> Gug<M> {
    /// Build an empty grid from `config`
    pub fn new(config: GugConfig, metric: M) -> Gug<M> {
        let target = config.num_cells_target.unwrap_or(1).max(1);
        let (edge, dim_counts) = geometry(&config.aabb, config.dim, target);
        let shift: Vec<f64> = (0..config.dim).map(|i| -config.aabb[2 * i]).collect();
        let cells_len = dim_counts.iter().product();
        Gug {
            metric,
            dim: config.dim,
            aabb: config.aabb,
            shift,
            dim_counts,
            edge,
            cells: vec![Vec::new(); cells_len],
            elements: Vec::new(),
            free_elements: None,
            num_els: 0,
            max_dens: config.max_dens,
            expand_rate: config.expand_rate,
            approx: config.approx,
            out_of_range_warning: WarnOnce::new(),
        }
    }

    /// Number of cells currently allocated
    pub fn cells_len(&self) -> usize {
        self.cells.len()
    }

    /// Per-axis cell counts
    pub fn dim_counts(&self) -> &[usize] {
        &self.dim_counts
    }

    /// Length of a cell's edge
    pub fn cell_size(&self) -> f64 {
        self.edge
    }

    fn coords_of(&self, point: &Vector) -> Vec<usize> {
        let mut out_of_range = false;
        let coords: Vec<usize> = (0..self.dim)
            .map(|i| {
                let f = (point.as_slice()[i] + self.shift[i]) / self.edge;
                let raw = f.floor();
                if raw < 0.0 || raw as usize >= self.dim_counts[i] {
                    out_of_range = true;
                }
                let clamped = raw.max(0.0) as usize;
                clamped.min(self.dim_counts[i] - 1)
            })
            .collect();
        if out_of_range {
            self.out_of_range_warning
                .warn("gug: coordinate outside configured aabb, clamped to nearest cell");
        }
        coords
    }

    fn id_of(&self, coords: &[usize]) -> usize {
        let mut id = 0;
        let mut mul = 1;
        for i in 0..self.dim {
            id += coords[i] * mul;
            mul *= self.dim_counts[i];
        }
        id
    }

    fn insert_into(&mut self, id: ElementId, point: Vector) {
        let cell = self.id_of(&self.coords_of(&point));
        self.cells[cell].push(id);
        let slot = &mut self.elements[id.index()];
        *slot = Slot::Occupied(Element { point, cell_id: cell });
        self.num_els += 1;
        if (self.num_els as f64) / (self.cells.len() as f64) > self.max_dens {
            self.rebuild();
        }
    }

    fn remove_from_cell(&mut self, id: ElementId) {
        let cell_id = match &self.elements[id.index()] {
            Slot::Occupied(e) => e.cell_id,
            Slot::Free { .. } => panic!("use of a freed ElementId"),
        };
        let cell = &mut self.cells[cell_id];
        let pos = cell.iter().position(|&e| e == id).expect("element missing from its own cell");
        cell.swap_remove(pos);
        self.num_els -= 1;
    }

    fn rebuild(&mut self) {
        let target_cells = ((self.cells.len() as f64) * self.expand_rate).ceil() as usize;
        let (edge, dim_counts) = geometry(&self.aabb, self.dim, target_cells.max(1));
        self.edge = edge;
        self.dim_counts = dim_counts;
        let cells_len = self.dim_counts.iter().product();
        let mut new_cells = vec![Vec::new(); cells_len];
        for slot in self.elements.iter_mut() {
            if let Slot::Occupied(el) = slot {
                let coords = coords_of_with(
                    &el.point,
                    self.dim,
                    &self.shift,
                    self.edge,
                    &self.dim_counts,
                );
                let cell = id_of_with(&coords, &self.dim_counts);
                el.cell_id = cell;
            }
        }
        for (i, slot) in self.elements.iter().enumerate() {
            if let Slot::Occupied(el) = slot {
                new_cells[el.cell_id].push(ElementId::new(i));
            }
        }
        self.cells = new_cells;
    }

    /// A human-readable text dump of every live element and its
    /// coordinates, one per line in ascending id order, for debugging only
    pub fn dump_text(&self) -> String {
        let mut out = String::new();
        for (i, slot) in self.elements.iter().enumerate() {
            if let Slot::Occupied(el) = slot {
                let coords: Vec<String> = el.point.as_slice().iter().map(|x| x.to_string()).collect();
                out.push_str(&format!("{} {}\n", i, coords.join(" ")));
            }
        }
        out
    }

    fn shell_lower_bound(&self, r: usize) -> f64 {
        if r == 0 {
            0.0
        } else {
            (r - 1) as f64 * self.edge
        }
    }

    fn max_shell_radius(&self, home: &[usize]) -> usize {
        (0..self.dim)
            .map(|i| home[i].max(self.dim_counts[i] - 1 - home[i]))
            .max()
            .unwrap_or(0)
    }

    fn shell_cell_ids(&self, home: &[usize], r: usize) -> Vec<usize> {
        if r == 0 {
            return vec![self.id_of(home)];
        }
        let mut offsets = Vec::new();
        let mut combo = vec![0i64; self.dim];
        let range: Vec<i64> = (-(r as i64)..=(r as i64)).collect();
        generate_combos(0, self.dim, r as i64, &range, &mut combo, &mut offsets);
        offsets
            .into_iter()
            .filter_map(|offset| {
                let mut coords = vec![0usize; self.dim];
                for i in 0..self.dim {
                    let v = home[i] as i64 + offset[i];
                    if v < 0 || v as usize >= self.dim_counts[i] {
                        return None;
                    }
                    coords[i] = v as usize;
                }
                Some(self.id_of(&coords))
            })
            .collect()
    }
}

fn generate_combos(
    axis: usize,
    dim: usize,
    r: i64,
    range: &[i64],
    combo: &mut Vec<i64>,
    out: &mut Vec<Vec<i64>>,
) {
    if axis == dim {
        if combo.iter().any(|&x| x.abs() == r) {
            out.push(combo.clone());
        }
        return;
    }
    for &v in range {
        combo[axis] = v;
        generate_combos(axis + 1, dim, r, range, combo, out);
    }
}

fn coords_of_with(point: &Vector, dim: usize, shift: &[f64], edge: f64, dim_counts: &[usize]) -> Vec<usize> {
    (0..dim)
        .map(|i| {
            let f = (point.as_slice()[i] + shift[i]) / edge;
            let clamped = f.floor().max(0.0) as usize;
            clamped.min(dim_counts[i] - 1)
        })
        .collect()
}

fn id_of_with(coords: &[usize], dim_counts: &[usize]) -> usize {
    let mut id = 0;
    let mut mul = 1;
    for i in 0..coords.len() {
        id += coords[i] * mul;
        mul *= dim_counts[i];
    }
    id
}

/// Choose a cube edge length and per-axis cell counts so that the total
/// cell count is at least `target` and each axis's cell count is
/// proportional to its aabb extent.
fn geometry(aabb: &[f64], dim: usize, target: usize) -> (f64, Vec<usize>) {
    let extents: Vec<f64> = (0..dim).map(|i| (aabb[2 * i + 1] - aabb[2 * i]).max(f64::EPSILON)).collect();
    let volume: f64 = extents.iter().product();
    let edge = (volume / target as f64).powf(1.0 / dim as f64);
    let dim_counts: Vec<usize> = extents
        .iter()
        .map(|&e| ((e / edge).ceil() as usize).max(1))
        .collect();
    (edge, dim_counts)
}

impl<M: Metric> NnIndex for Gug<M> {
    fn add(&mut self, point: Vector) -> ElementId {
        let id = match self.free_elements.take() {
            Some(i) => {
                self.free_elements = match &self.elements[i] {
                    Slot::Free { next_free } => *next_free,
                    Slot::Occupied(_) => unreachable!(),
                };
                ElementId::new(i)
            }
            None => {
                self.elements.push(Slot::Free { next_free: None });
                ElementId::new(self.elements.len() - 1)
            }
        };
        self.insert_into(id, point);
        id
    }

    fn remove(&mut self, id: ElementId) {
        self.remove_from_cell(id);
        self.elements[id.index()] = Slot::Free {
            next_free: self.free_elements,
        };
        self.free_elements = Some(id.index());
    }

    fn update(&mut self, id: ElementId, point: Vector) {
        let new_cell = self.id_of(&self.coords_of(&point));
        let old_cell = match &self.elements[id.index()] {
            Slot::Occupied(e) => e.cell_id,
            Slot::Free { .. } => panic!("use of a freed ElementId"),
        };
        if new_cell == old_cell {
            if let Slot::Occupied(e) = &mut self.elements[id.index()] {
                e.point = point;
            }
        } else {
            self.remove_from_cell(id);
            let pos = self.cells[new_cell].len();
            self.cells[new_cell].push(id);
            let _ = pos;
            if let Slot::Occupied(e) = &mut self.elements[id.index()] {
                e.point = point;
                e.cell_id = new_cell;
            }
            self.num_els += 1;
            if (self.num_els as f64) / (self.cells.len() as f64) > self.max_dens {
                self.rebuild();
            }
        }
    }

    fn nearest(&self, query: &Vector, k: usize) -> Vec<(ElementId, f64)> {
        if k == 0 || self.num_els == 0 {
            return Vec::new();
        }
        let home = self.coords_of(query);
        let max_r = self.max_shell_radius(&home);
        let mut best: Vec<(ElementId, f64)> = Vec::new();
        for r in 0..=max_r {
            if best.len() >= k && self.shell_lower_bound(r) > best[k - 1].1 {
                break;
            }
            for cell_id in self.shell_cell_ids(&home, r) {
                for &eid in &self.cells[cell_id] {
                    let el = match &self.elements[eid.index()] {
                        Slot::Occupied(e) => e,
                        Slot::Free { .. } => unreachable!(),
                    };
                    let d = self.metric.distance(query, &el.point);
                    bubble_insert(&mut best, k, eid, d);
                }
            }
            if self.approx && r >= 1 && best.len() >= k {
                break;
            }
        }
        best
    }

    fn len(&self) -> usize {
        self.num_els
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
    fn two_dimensional_sanity() {
        let config = GugConfig {
            dim: 2,
            num_cells_target: Some(16),
            max_dens: f64::INFINITY,
            expand_rate: 2.0,
            aabb: vec![-1.0, 1.0, -2.0, 2.0],
            approx: false,
        };
        let mut gug = Gug::new(config, Euclidean);
        let a = gug.add(v(&[0.8, 0.2]));
        let _b = gug.add(v(&[0.8, -0.7]));
        let c = gug.add(v(&[-0.2, -1.1]));
        let _d = gug.add(v(&[-10.0, -10.0]));
        let _e = gug.add(v(&[10.0, 10.0]));

        let nearest = gug.nearest(&v(&[0.0, 0.1]), 1);
        assert_eq!(nearest[0].0, c);
        assert_ne!(nearest[0].0, a);
    }

    #[test]
    fn adaptive_expansion_doubles_cells() {
        let config = GugConfig {
            dim: 2,
            num_cells_target: Some(8),
            max_dens: 1.0,
            expand_rate: 2.0,
            aabb: vec![0.0, 1.0, 0.0, 1.0],
            approx: false,
        };
        let mut gug = Gug::new(config, Euclidean);
        let initial_cells = gug.cells_len();
        let mut ids = Vec::new();
        for i in 0..16 {
            let x = (i as f64) / 16.0;
            let y = ((i * 7) % 16) as f64 / 16.0;
            ids.push((gug.add(v(&[x, y])), x, y));
            if i == 8 {
                assert!(gug.cells_len() >= initial_cells * 2);
            }
        }
        for (id, x, y) in ids {
            let nearest = gug.nearest(&v(&[x, y]), 1);
            assert_eq!(nearest[0].0, id);
        }
    }

    #[test]
    fn nearest_distances_are_non_decreasing() {
        let config = GugConfig::new(2, vec![0.0, 10.0, 0.0, 10.0]);
        let mut gug = Gug::new(config, Euclidean);
        for i in 0..30 {
            gug.add(v(&[(i % 10) as f64, (i / 10) as f64]));
        }
        let got = gug.nearest(&v(&[5.0, 5.0]), 5);
        for w in got.windows(2) {
            assert!(w[0].1 <= w[1].1);
        }
    }

    #[test]
    fn update_moves_element_between_cells() {
        let config = GugConfig::new(2, vec![0.0, 10.0, 0.0, 10.0]);
        let mut gug = Gug::new(config, Euclidean);
        let id = gug.add(v(&[1.0, 1.0]));
        gug.update(id, v(&[9.0, 9.0]));
        let nearest = gug.nearest(&v(&[9.0, 9.0]), 1);
        assert_eq!(nearest[0].0, id);
    }

    #[test]
    fn remove_drops_element_from_results() {
        let config = GugConfig::new(2, vec![0.0, 10.0, 0.0, 10.0]);
        let mut gug = Gug::new(config, Euclidean);
        let id = gug.add(v(&[1.0, 1.0]));
        gug.remove(id);
        assert_eq!(gug.len(), 0);
        assert!(gug.nearest(&v(&[1.0, 1.0]), 1).is_empty());
    }

    #[test]
    fn dump_text_lists_each_live_element_once() {
        let config = GugConfig::new(2, vec![0.0, 10.0, 0.0, 10.0]);
        let mut gug = Gug::new(config, Euclidean);
        let a = gug.add(v(&[1.0, 2.0]));
        let b = gug.add(v(&[3.0, 4.0]));
        gug.remove(a);
        let dump = gug.dump_text();
        assert_eq!(dump.lines().count(), 1);
        assert_eq!(dump, format!("{} 3 4\n", b.index()));
    }

    fn assert_invariants_hold<M: Metric>(gug: &Gug<M>) {
        assert!(
            (gug.num_els as f64) / (gug.cells.len() as f64) <= gug.max_dens,
            "density {} exceeds max_dens {} after a mutation",
            gug.num_els,
            gug.max_dens
        );
        for (cell_id, cell) in gug.cells.iter().enumerate() {
            for &eid in cell {
                let el = match &gug.elements[eid.index()] {
                    Slot::Occupied(e) => e,
                    Slot::Free { .. } => panic!("free element listed in a cell"),
                };
                assert_eq!(el.cell_id, cell_id, "element's own cell_id disagrees with the cell it lives in");
                let recomputed = gug.id_of(&gug.coords_of(&el.point));
                assert_eq!(recomputed, cell_id, "cell_of(e.v) must equal e.cell_id");
            }
        }
    }

    #[test]
    fn membership_and_density_invariants_hold_across_mutations() {
        let config = GugConfig::new(2, vec![0.0, 20.0, 0.0, 20.0]);
        let mut gug = Gug::new(config, Euclidean);
        let mut ids = Vec::new();
        for i in 0..60 {
            let x = ((i * 13) % 200) as f64 / 10.0;
            let y = ((i * 29) % 200) as f64 / 10.0;
            ids.push(gug.add(v(&[x, y])));
            assert_invariants_hold(&gug);
        }
        for (j, &id) in ids.iter().enumerate() {
            let x = ((j * 7) % 200) as f64 / 10.0;
            let y = ((j * 17) % 200) as f64 / 10.0;
            gug.update(id, v(&[x, y]));
            assert_invariants_hold(&gug);
        }
        for &id in ids.iter().step_by(2) {
            gug.remove(id);
            assert_invariants_hold(&gug);
        }
    }
}
