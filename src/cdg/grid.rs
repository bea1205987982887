//! Grid indexing.
//!
//! Two grids coexist:
//!
//! - The **ranking grid** ([`GridSystem`]) partitions `[ideal, nadir]` into
//!   `k` cells per objective. Its cell width depends on the evaluation
//!   budget through [`relaxation_coefficient`]. Two-objective and
//!   many-objective runs use a uniform layout; three-objective runs use a
//!   graded layout with wider cells near the ideal point.
//! - The **child grid** ([`ChildGrid`]) is a coarse 2-D/3-D grid whose
//!   cells are numbered by [`cell_id`] so that neighboring cells can be
//!   listed in a precomputed table.

use super::types::Individual;

/// Smallest cell width used anywhere in the grid.
///
/// Guards against an objective whose ideal and nadir values coincide.
pub const MIN_CELL_WIDTH: f64 = 1e-10;

/// Evaluation-budget-dependent relaxation of the grid and the border.
///
/// `1 + (1 - evaluations / max_evaluations) * 0.15`: starts at 1.15 and
/// reaches 1.0 when the budget is spent. Progress is capped at 1.
pub fn relaxation_coefficient(evaluations: usize, max_evaluations: usize) -> f64 {
    let progress = if max_evaluations == 0 {
        1.0
    } else {
        (evaluations as f64 / max_evaluations as f64).min(1.0)
    };
    1.0 + (1.0 - progress) * 0.15
}

/// Scale factor applied to border members, `1 + (coefficient - 1) / 4`.
pub fn border_coefficient(coefficient: f64) -> f64 {
    1.0 + (coefficient - 1.0) / 4.0
}

/// Linear id of a 1-based child-grid cell `(i, j, k)`.
///
/// In each plane, cells are numbered along growing square shells: if
/// `i >= j` the id is `(i-1)² + j`, otherwise `j² - i + 1`. The third
/// coordinate adds a plane offset of `child_grid²`. Use `k = 1` for 2-D.
///
/// ```
/// use u_cdg::cdg::grid::cell_id;
///
/// assert_eq!(cell_id(1, 1, 1, 4), 1);
/// assert_eq!(cell_id(1, 2, 1, 4), 4);
/// assert_eq!(cell_id(2, 1, 1, 4), 2);
/// assert_eq!(cell_id(1, 1, 2, 4), 17);
/// ```
pub fn cell_id(i: usize, j: usize, k: usize, child_grid: usize) -> usize {
    let plane = child_grid * child_grid * (k - 1);
    let s = if i >= j {
        (i - 1) * (i - 1) + j
    } else {
        j * j - i + 1
    };
    s + plane
}

/// The coarse grid used to bucket individuals for neighborhoods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildGrid {
    size: usize,
    dims: usize,
}

impl ChildGrid {
    /// A `size`-per-axis grid in 2 or 3 dimensions.
    pub fn new(size: usize, dims: usize) -> Self {
        debug_assert!(dims == 2 || dims == 3, "child grid is 2-D or 3-D");
        Self { size, dims }
    }

    /// Cells per axis.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of axes.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// One past the largest cell id (`size^dims + 1`); id 0 is unused.
    pub fn cell_count(&self) -> usize {
        self.size.pow(self.dims as u32) + 1
    }

    /// Cell id of 1-based coordinates.
    ///
    /// Coordinates are clamped to `[1, size]` and the id to
    /// `[1, cell_count - 1]`.
    pub fn cell_of(&self, coords: &[usize]) -> usize {
        let clamp = |c: usize| c.clamp(1, self.size);
        let i = clamp(coords[0]);
        let j = clamp(coords[1]);
        let k = if self.dims == 3 { clamp(coords[2]) } else { 1 };
        cell_id(i, j, k, self.size).clamp(1, self.cell_count() - 1)
    }
}

/// Cell layout of the ranking grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GridLayout {
    /// `k` equal cells per axis.
    Uniform,
    /// Per-objective cumulative upper bounds, relative to the ideal point.
    Graded(Vec<Vec<f64>>),
}

/// The ranking grid for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSystem {
    divisions: usize,
    ideal: Vec<f64>,
    cell_width: Vec<f64>,
    layout: GridLayout,
}

impl GridSystem {
    /// Uniform grid over `[ideal, nadir]` widened by `coefficient`.
    ///
    /// Cell width per axis is `(nadir - ideal) * coefficient / k`, at least
    /// [`MIN_CELL_WIDTH`].
    pub fn uniform(ideal: &[f64], nadir: &[f64], coefficient: f64, divisions: usize) -> Self {
        Self {
            divisions,
            ideal: ideal.to_vec(),
            cell_width: cell_widths(ideal, nadir, coefficient, divisions),
            layout: GridLayout::Uniform,
        }
    }

    /// Graded grid for three objectives.
    ///
    /// Cell `0` is a sentinel below the ideal point; cells `1..k-3` are
    /// twice as wide as the remaining ones. The bounds are scaled so the
    /// last one lands on `k * cell_width`.
    pub fn graded(ideal: &[f64], nadir: &[f64], coefficient: f64, divisions: usize) -> Self {
        let cell_width = cell_widths(ideal, nadir, coefficient, divisions);
        let slim = divisions.saturating_sub(3);

        let mut cumulative = vec![0.0f64; divisions];
        let mut sum = 0.0;
        for (i, bound) in cumulative.iter_mut().enumerate() {
            if i == 0 && slim >= 1 {
                *bound = -1.0;
                continue;
            }
            sum += if i < slim { 2.0 } else { 1.0 };
            *bound = sum;
        }

        let bounds = cell_width
            .iter()
            .map(|&d| {
                cumulative
                    .iter()
                    .map(|&c| c / sum * (d * divisions as f64))
                    .collect()
            })
            .collect();

        Self {
            divisions,
            ideal: ideal.to_vec(),
            cell_width,
            layout: GridLayout::Graded(bounds),
        }
    }

    /// Grid divisions per axis.
    pub fn divisions(&self) -> usize {
        self.divisions
    }

    /// Cell width per objective.
    pub fn cell_width(&self) -> &[f64] {
        &self.cell_width
    }

    /// The cell layout.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Grid coordinate of `value` on objective `obj`, in `[0, k - 1]`.
    pub fn coordinate(&self, obj: usize, value: f64) -> usize {
        let offset = value - self.ideal[obj];
        let g = match &self.layout {
            GridLayout::Uniform => {
                let g = (offset / self.cell_width[obj]).ceil();
                if g.is_nan() || g < 0.0 {
                    0
                } else {
                    g as usize
                }
            }
            GridLayout::Graded(bounds) => bounds[obj].iter().filter(|&&b| offset > b).count(),
        };
        g.min(self.divisions - 1)
    }

    /// Fills `grid` with the coordinates of `objectives`.
    pub fn locate(&self, objectives: &[f64], grid: &mut [usize]) {
        for (obj, (&value, g)) in objectives.iter().zip(grid.iter_mut()).enumerate() {
            *g = self.coordinate(obj, value);
        }
    }

    /// Refreshes the grid coordinates of every individual.
    pub fn assign<S>(&self, population: &mut [Individual<S>]) {
        for ind in population {
            self.locate(&ind.objectives, &mut ind.grid);
        }
    }
}

fn cell_widths(ideal: &[f64], nadir: &[f64], coefficient: f64, divisions: usize) -> Vec<f64> {
    ideal
        .iter()
        .zip(nadir)
        .map(|(&lo, &hi)| ((hi - lo) * coefficient / divisions as f64).max(MIN_CELL_WIDTH))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // ---- Coefficients ----

    #[test]
    fn test_relaxation_coefficient_bounds() {
        assert!((relaxation_coefficient(0, 100) - 1.15).abs() < 1e-12);
        assert!((relaxation_coefficient(50, 100) - 1.075).abs() < 1e-12);
        assert!((relaxation_coefficient(100, 100) - 1.0).abs() < 1e-12);
        assert!((relaxation_coefficient(150, 100) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_border_coefficient() {
        assert!((border_coefficient(1.15) - 1.0375).abs() < 1e-12);
        assert!((border_coefficient(1.0) - 1.0).abs() < 1e-12);
    }

    // ---- Cell ids ----

    #[test]
    fn test_cell_id_2d_injective_and_bounded() {
        let n = 7;
        let grid = ChildGrid::new(n, 2);
        let mut seen = HashSet::new();
        for i in 1..=n {
            for j in 1..=n {
                let id = grid.cell_of(&[i, j]);
                assert!((1..grid.cell_count()).contains(&id));
                assert!(seen.insert(id), "duplicate id {id} at ({i}, {j})");
            }
        }
        assert_eq!(seen.len(), n * n);
    }

    #[test]
    fn test_cell_id_3d_injective() {
        let n = 4;
        let grid = ChildGrid::new(n, 3);
        let mut seen = HashSet::new();
        for i in 1..=n {
            for j in 1..=n {
                for k in 1..=n {
                    assert!(seen.insert(grid.cell_of(&[i, j, k])));
                }
            }
        }
        assert_eq!(grid.cell_count(), 65);
        assert_eq!(seen.iter().max(), Some(&64));
    }

    #[test]
    fn test_cell_of_clamps_coordinates() {
        let grid = ChildGrid::new(5, 2);
        assert_eq!(grid.cell_of(&[0, 0]), grid.cell_of(&[1, 1]));
        assert_eq!(grid.cell_of(&[9, 3]), grid.cell_of(&[5, 3]));
    }

    // ---- Ranking grid ----

    #[test]
    fn test_uniform_coordinates() {
        let grid = GridSystem::uniform(&[0.0, 0.0], &[1.0, 2.0], 1.0, 4);
        assert_eq!(grid.cell_width(), &[0.25, 0.5]);
        assert_eq!(grid.coordinate(0, 0.0), 0);
        assert_eq!(grid.coordinate(0, 0.1), 1);
        assert_eq!(grid.coordinate(0, 0.25), 1);
        assert_eq!(grid.coordinate(0, 0.26), 2);
        assert_eq!(grid.coordinate(0, 5.0), 3);
        assert_eq!(grid.coordinate(1, -1.0), 0);
    }

    #[test]
    fn test_zero_width_axis_is_clamped() {
        let grid = GridSystem::uniform(&[1.0, 0.0], &[1.0, 1.0], 1.15, 4);
        assert_eq!(grid.cell_width()[0], MIN_CELL_WIDTH);
        assert_eq!(grid.coordinate(0, 1.0), 0);
        assert_eq!(grid.coordinate(0, 1.5), 3);
    }

    #[test]
    fn test_graded_bounds() {
        // k = 6: slim = 3, widths [sentinel, 2, 2, 1, 1, 1], sum = 7.
        let grid = GridSystem::graded(&[0.0, 0.0, 0.0], &[7.0, 7.0, 7.0], 1.0, 6);
        let GridLayout::Graded(bounds) = grid.layout() else {
            panic!("expected graded layout");
        };
        let expected = [-1.0, 2.0, 4.0, 5.0, 6.0, 7.0];
        for (b, e) in bounds[0].iter().zip(expected) {
            assert!((b - e).abs() < 1e-12, "{b} vs {e}");
        }
        assert_eq!(grid.coordinate(0, 0.0), 1);
        assert_eq!(grid.coordinate(0, 2.5), 2);
        assert_eq!(grid.coordinate(0, 100.0), 5);
    }

    #[test]
    fn test_graded_three_divisions() {
        let grid = GridSystem::graded(&[0.0; 3], &[3.0; 3], 1.0, 3);
        assert_eq!(grid.coordinate(1, 0.5), 0);
        assert_eq!(grid.coordinate(1, 1.5), 1);
        assert_eq!(grid.coordinate(1, 2.5), 2);
        assert_eq!(grid.coordinate(1, 9.0), 2);
    }

    #[test]
    fn test_locate_fills_all_axes() {
        let grid = GridSystem::uniform(&[0.0, 0.0, 0.0, 0.0], &[1.0; 4], 1.0, 10);
        let mut g = vec![0; 4];
        grid.locate(&[0.05, 0.55, 0.95, 1.0], &mut g);
        assert_eq!(g, vec![1, 6, 9, 9]);
    }

    #[test]
    fn test_assign_population() {
        let grid = GridSystem::uniform(&[0.0, 0.0], &[1.0, 1.0], 1.0, 4);
        let mut population = vec![
            Individual::new((), vec![0.3, 0.9]),
            Individual::new((), vec![1.0, 0.0]),
        ];
        grid.assign(&mut population);
        assert_eq!(population[0].grid(), &[2, 3]);
        assert_eq!(population[1].grid(), &[3, 0]);
    }
}
