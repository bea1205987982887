//! Feasibility filtering and resupply.
//!
//! Rejected individuals are moved to a side pool. When selection later
//! finds the population short, [`resupply`] re-admits uniformly drawn
//! members of that pool (with repetition) until the target size is met.
//!
//! Both filters take a `protected` list of population indices (the special
//! population) that are never rejected.

use rand::Rng;

use super::border::Border;
use super::types::Individual;

/// Which policy the three-objective filter ended up applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Nadir and border tests were applied.
    Border,
    /// Too many individuals failed; only the nadir test was applied.
    NadirFallback,
}

/// Whether any objective exceeds the nadir point.
fn beyond_nadir(objectives: &[f64], nadir: &[f64]) -> bool {
    objectives.iter().zip(nadir).any(|(&f, &z)| f > z)
}

/// Moves every unprotected individual beyond the nadir point into `rejected`.
///
/// `rejected` is cleared first. The relative order of kept individuals is
/// preserved; rejected ones are appended in reverse population order.
pub fn exclude_beyond_nadir<S>(
    population: &mut Vec<Individual<S>>,
    nadir: &[f64],
    protected: &[usize],
    rejected: &mut Vec<Individual<S>>,
) {
    rejected.clear();
    for i in (0..population.len()).rev() {
        if !protected.contains(&i) && beyond_nadir(population[i].objectives(), nadir) {
            rejected.push(population.remove(i));
        }
    }
}

/// Three-objective filter: removes individuals beyond the nadir point or
/// outside the border.
///
/// When that would leave fewer than `target` individuals, nothing is removed
/// by the border test and the nadir-only policy is applied instead.
pub fn exclude_outside_border<S>(
    population: &mut Vec<Individual<S>>,
    nadir: &[f64],
    border: &Border,
    target: usize,
    protected: &[usize],
    rejected: &mut Vec<Individual<S>>,
) -> FilterOutcome {
    let bad: Vec<bool> = population
        .iter()
        .enumerate()
        .map(|(i, ind)| {
            !protected.contains(&i)
                && (beyond_nadir(ind.objectives(), nadir) || !border.is_inner(ind.objectives()))
        })
        .collect();
    let bad_count = bad.iter().filter(|&&b| b).count();

    if population.len() - bad_count < target {
        exclude_beyond_nadir(population, nadir, protected, rejected);
        return FilterOutcome::NadirFallback;
    }

    rejected.clear();
    let mut flags = bad.into_iter();
    let mut kept = Vec::with_capacity(population.len() - bad_count);
    for ind in population.drain(..) {
        if flags.next().unwrap_or(false) {
            rejected.push(ind);
        } else {
            kept.push(ind);
        }
    }
    *population = kept;
    FilterOutcome::Border
}

/// Refills `population` to `target` with uniform draws from `rejected`.
///
/// Re-admitted copies start with fresh ranks; their grid coordinates are
/// whatever the pool carries, so the caller keeps those current. Returns the
/// number of individuals added. An empty pool adds nothing.
pub fn resupply<S: Clone, R: Rng>(
    population: &mut Vec<Individual<S>>,
    rejected: &[Individual<S>],
    target: usize,
    rng: &mut R,
) -> usize {
    if rejected.is_empty() {
        return 0;
    }
    let mut added = 0;
    while population.len() < target {
        let i = rng.random_range(0..rejected.len());
        let mut ind = rejected[i].clone();
        ind.rank.fill(1);
        population.push(ind);
        added += 1;
    }
    added
}
