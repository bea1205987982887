//! Grid neighborhoods.
//!
//! Every generation each individual gets a list of population indices that
//! are close in grid space. Mates are drawn from this list.
//!
//! - **Scan** (four or more objectives): `j` is a neighbor of `i` when the
//!   Chebyshev distance between their grid coordinates is below `t`.
//!   O(n² · m).
//! - **Child grid** (two or three objectives): individuals are bucketed into
//!   the cells of a [`ChildGrid`]. A table built once at construction lists,
//!   for each cell, the cells of the `(2t + 1)^dims` window around it. The
//!   window is shifted inward at the grid edges, so it keeps its size.

use super::config::GridStrategy;
use super::grid::{ChildGrid, MIN_CELL_WIDTH};
use super::types::Individual;

/// Offset subtracted before taking the ceiling when bucketing, so values
/// sitting exactly on a cell boundary fall into the lower cell.
const BUCKET_EPSILON: f64 = 1e-10;

/// Neighbor lists for the current population.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighborhoods {
    lists: Vec<Vec<usize>>,
}

impl Neighborhoods {
    /// Neighbors of individual `i`.
    pub fn of(&self, i: usize) -> &[usize] {
        self.lists.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of individuals covered.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Whether no individual is covered.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

/// Builds [`Neighborhoods`] with the algorithm chosen for the objective count.
#[derive(Debug, Clone)]
pub enum NeighborhoodBuilder {
    /// Pairwise Chebyshev scan over grid coordinates.
    Scan { threshold: usize },
    /// Child-grid buckets with a precomputed adjacency table.
    ChildGrid {
        grid: ChildGrid,
        adjacency: Vec<Vec<usize>>,
    },
}

impl NeighborhoodBuilder {
    /// Creates the builder for `strategy`, precomputing the adjacency table
    /// on the 2-/3-objective path.
    pub fn new(strategy: GridStrategy, threshold: usize, child_grid: usize) -> Self {
        match strategy.child_dims() {
            None => NeighborhoodBuilder::Scan { threshold },
            Some(dims) => {
                let grid = ChildGrid::new(child_grid, dims);
                let adjacency = adjacency_table(&grid, threshold);
                NeighborhoodBuilder::ChildGrid { grid, adjacency }
            }
        }
    }

    /// Computes the neighbor lists of `population`.
    ///
    /// `ideal` is the current ideal point; the child grid spans from it to
    /// the per-objective maximum of the population.
    pub fn build<S>(&self, population: &[Individual<S>], ideal: &[f64]) -> Neighborhoods {
        match self {
            NeighborhoodBuilder::Scan { threshold } => scan(population, *threshold),
            NeighborhoodBuilder::ChildGrid { grid, adjacency } => {
                let members = bucket(grid, population, ideal);
                let lists = population
                    .iter()
                    .enumerate()
                    .map(|(i, ind)| {
                        let cell = cell_of_individual(grid, ind, ideal, &members.deltas);
                        debug_assert!(members.cells[cell].contains(&i));
                        adjacency[cell]
                            .iter()
                            .flat_map(|&c| members.cells[c].iter().copied())
                            .collect()
                    })
                    .collect();
                Neighborhoods { lists }
            }
        }
    }
}

/// Adjacent cells of every child-grid cell, indexed by cell id.
fn adjacency_table(grid: &ChildGrid, t: usize) -> Vec<Vec<usize>> {
    let n = grid.size();
    let dims = grid.dims();
    let mut table = vec![Vec::new(); grid.cell_count()];

    let planes = if dims == 3 { n } else { 1 };
    for i in 1..=n {
        for j in 1..=n {
            for k in 1..=planes {
                let coords = [i, j, k];
                let windows: Vec<(usize, usize)> =
                    coords[..dims].iter().map(|&c| window(c, t, n)).collect();
                let k_window = if dims == 3 { windows[2] } else { (1, 1) };

                let cell = grid.cell_of(&coords[..dims]);
                let entry = &mut table[cell];
                for ni in windows[0].0..=windows[0].1 {
                    for nj in windows[1].0..=windows[1].1 {
                        for nk in k_window.0..=k_window.1 {
                            entry.push(grid.cell_of(&[ni, nj, nk][..dims]));
                        }
                    }
                }
            }
        }
    }
    table
}

/// The 1-based window `[c - t, c + t]`, shifted inward to stay inside `[1, n]`.
fn window(c: usize, t: usize, n: usize) -> (usize, usize) {
    if c <= t {
        (1, 2 * t + 1)
    } else if c + t > n {
        (n - 2 * t, n)
    } else {
        (c - t, c + t)
    }
}

struct Buckets {
    deltas: Vec<f64>,
    cells: Vec<Vec<usize>>,
}

fn bucket<S>(grid: &ChildGrid, population: &[Individual<S>], ideal: &[f64]) -> Buckets {
    let m = ideal.len();
    let mut max = vec![f64::NEG_INFINITY; m];
    for ind in population {
        for (hi, &v) in max.iter_mut().zip(ind.objectives()) {
            *hi = hi.max(v);
        }
    }
    let deltas = max
        .iter()
        .zip(ideal)
        .map(|(&hi, &lo)| ((hi - lo) / grid.size() as f64).max(MIN_CELL_WIDTH))
        .collect::<Vec<_>>();

    let mut cells = vec![Vec::new(); grid.cell_count()];
    for (i, ind) in population.iter().enumerate() {
        cells[cell_of_individual(grid, ind, ideal, &deltas)].push(i);
    }
    Buckets { deltas, cells }
}

fn cell_of_individual<S>(
    grid: &ChildGrid,
    ind: &Individual<S>,
    ideal: &[f64],
    deltas: &[f64],
) -> usize {
    let mut pos = [1usize; 3];
    for (obj, p) in pos.iter_mut().take(grid.dims()).enumerate() {
        let normalized = ind.objective(obj) - ideal[obj];
        let c = (normalized / deltas[obj] - BUCKET_EPSILON).ceil();
        *p = if c.is_nan() || c < 1.0 { 1 } else { c as usize };
    }
    grid.cell_of(&pos[..grid.dims()])
}

fn scan<S>(population: &[Individual<S>], threshold: usize) -> Neighborhoods {
    let lists = population
        .iter()
        .map(|a| {
            population
                .iter()
                .enumerate()
                .filter(|(_, b)| chebyshev(a.grid(), b.grid()) < threshold)
                .map(|(j, _)| j)
                .collect()
        })
        .collect();
    Neighborhoods { lists }
}

fn chebyshev(a: &[usize], b: &[usize]) -> usize {
    a.iter().zip(b).map(|(&x, &y)| x.abs_diff(y)).max().unwrap_or(0)
}
