//! Border of the feasible region (three-objective runs).
//!
//! A border member for objective `i` is an individual that is near the
//! population minimum on axis `i` and on no other axis. Within each axis
//! bucket only points not dominated on the remaining axes are kept; their
//! remaining objectives are then scaled up by the border coefficient so the
//! envelope is looser early in the run.
//!
//! An individual is **inner** when every bucket is non-empty and no border
//! member of any bucket dominates it on that bucket's remaining axes.

use super::grid::border_coefficient;
use super::multi_objective::dominates_excluding;
use super::types::Individual;

/// Per-objective border members, stored as (relaxed) objective vectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Border {
    axes: Vec<Vec<Vec<f64>>>,
}

impl Border {
    /// An empty border for `m` objectives.
    pub fn empty(m: usize) -> Self {
        Self {
            axes: vec![Vec::new(); m],
        }
    }

    /// Computes the border of `population`.
    ///
    /// Runs [`candidates`](Border::candidates), keeps the non-dominated
    /// points of each bucket, and scales their non-defining objectives by
    /// `border_coefficient(coefficient)`. The population is not modified.
    pub fn compute<S>(population: &[Individual<S>], nadir: &[f64], coefficient: f64) -> Self {
        let buckets = Self::candidates(population, nadir);
        let mut border = Self::pareto_filter(population, &buckets);

        let scale = border_coefficient(coefficient);
        for (axis, members) in border.axes.iter_mut().enumerate() {
            for point in members.iter_mut() {
                for (obj, f) in point.iter_mut().enumerate() {
                    if obj != axis {
                        *f *= scale;
                    }
                }
            }
        }
        border
    }

    /// Buckets individuals that are near-minimal on exactly one axis.
    ///
    /// An objective value is near-minimal when it is below the population
    /// minimum plus `nadir / 100`. Returns population indices per axis;
    /// individuals near-minimal on zero or several axes are left out.
    pub fn candidates<S>(population: &[Individual<S>], nadir: &[f64]) -> Vec<Vec<usize>> {
        let m = nadir.len();
        let mut min = vec![f64::INFINITY; m];
        for ind in population {
            for (lo, &f) in min.iter_mut().zip(ind.objectives()) {
                *lo = lo.min(f);
            }
        }

        let mut buckets = vec![Vec::new(); m];
        for (i, ind) in population.iter().enumerate() {
            let mut near = (0..m).filter(|&obj| ind.objective(obj) < min[obj] + nadir[obj] / 100.0);
            if let (Some(axis), None) = (near.next(), near.next()) {
                buckets[axis].push(i);
            }
        }
        buckets
    }

    /// Keeps, per bucket, the points no other bucket member dominates on
    /// the axes other than the bucket's own.
    pub fn pareto_filter<S>(population: &[Individual<S>], buckets: &[Vec<usize>]) -> Self {
        let axes = buckets
            .iter()
            .enumerate()
            .map(|(axis, bucket)| {
                bucket
                    .iter()
                    .filter(|&&p| {
                        !bucket.iter().any(|&q| {
                            dominates_excluding(
                                population[q].objectives(),
                                population[p].objectives(),
                                axis,
                            )
                        })
                    })
                    .map(|&p| population[p].objectives().to_vec())
                    .collect()
            })
            .collect();
        Self { axes }
    }

    /// Members of the border for objective `axis`.
    pub fn members(&self, axis: usize) -> &[Vec<f64>] {
        &self.axes[axis]
    }

    /// Number of objectives.
    pub fn num_axes(&self) -> usize {
        self.axes.len()
    }

    /// Whether `objectives` lies inside the region the border carves out.
    pub fn is_inner(&self, objectives: &[f64]) -> bool {
        self.axes.iter().enumerate().all(|(axis, members)| {
            !members.is_empty() && !self.dominated_on(axis, objectives)
        })
    }

    /// Whether a border member of `axis` dominates `objectives` on the other
    /// axes.
    fn dominated_on(&self, axis: usize, objectives: &[f64]) -> bool {
        self.axes[axis]
            .iter()
            .any(|member| dominates_excluding(member, objectives, axis))
    }
}
