//! Ideal and nadir points.
//!
//! The ideal point is the per-objective minimum over every evaluated
//! individual and never increases. The nadir point is the per-objective
//! maximum over the first non-dominated front of the population; it is
//! recomputed on a fixed generation interval and held otherwise.

use super::multi_objective::non_dominated_sort;
use super::types::Individual;

/// Running ideal point and periodically refreshed nadir point.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePoints {
    ideal: Vec<f64>,
    nadir: Vec<f64>,
}

impl ReferencePoints {
    /// Ideal at `+inf`, nadir at `-inf` on every axis.
    pub fn new(m: usize) -> Self {
        Self {
            ideal: vec![f64::INFINITY; m],
            nadir: vec![f64::NEG_INFINITY; m],
        }
    }

    /// Per-objective best observed value.
    pub fn ideal(&self) -> &[f64] {
        &self.ideal
    }

    /// Per-objective worst value on the non-dominated front.
    pub fn nadir(&self) -> &[f64] {
        &self.nadir
    }

    /// Resets the ideal point and folds in every individual.
    pub fn init_ideal<S>(&mut self, population: &[Individual<S>]) {
        self.ideal.fill(f64::INFINITY);
        for ind in population {
            self.update_ideal(ind.objectives());
        }
    }

    /// Lowers the ideal point wherever `objectives` is better.
    pub fn update_ideal(&mut self, objectives: &[f64]) {
        for (z, &f) in self.ideal.iter_mut().zip(objectives) {
            if f < *z {
                *z = f;
            }
        }
    }

    /// Resets the nadir point and recomputes it from the first front.
    pub fn init_nadir<S>(&mut self, population: &[Individual<S>]) {
        self.nadir.fill(f64::NEG_INFINITY);
        self.update_nadir(population);
    }

    /// Raises the nadir point to cover the first front of `population`.
    pub fn update_nadir<S>(&mut self, population: &[Individual<S>]) {
        let objectives: Vec<&[f64]> = population.iter().map(Individual::objectives).collect();
        let sorted = non_dominated_sort(&objectives);
        let Some(front) = sorted.fronts.first() else {
            return;
        };

        for &i in front {
            for (z, &f) in self.nadir.iter_mut().zip(objectives[i]) {
                if f > *z {
                    *z = f;
                }
            }
        }
    }
}
