//! Grid-rank environmental selection.
//!
//! Each generation the merged parent + offspring population is cut back to
//! the target size in seven steps:
//!
//! 1. [`allocate`]: every individual joins one sub-problem per objective,
//!    keyed by the grid coordinates of the *other* objectives
//! 2. [`sort_subproblems`]: each sub-problem is sorted on its own objective
//! 3. [`assign_objective_ranks`]: rank = max(grid distance to the first
//!    member + 1, position + 1)
//! 4. [`mark_special`]: special individuals get [`SPECIAL_RANK`] everywhere
//! 5. [`sort_individual_ranks`]: each rank vector is sorted ascending
//! 6. [`lexicographic_sort`]: the population is sorted by rank vectors,
//!    special individuals first
//! 7. [`choose`]: the best ranked individuals are kept and the special ones
//!    appended, or the population is resupplied if it is short
//!
//! The special population holds individuals sitting exactly on the ideal or
//! nadir value of some objective; see [`choose_special`]. It is picked
//! before feasibility filtering, so its indices are carried through the
//! filter with [`stamp_order`] and [`relocate_special`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;

use super::feasibility::resupply;
use super::grid::GridSystem;
use super::types::Individual;

/// Rank reserved for special (extreme) individuals.
pub const SPECIAL_RANK: usize = 1000;

/// Individuals of one sub-problem, ranked along `objective`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subproblem {
    /// The objective this sub-problem ranks on.
    pub objective: usize,
    /// Population indices of the members.
    pub members: Vec<usize>,
}

/// Picks the special population: for every objective, the first individual
/// whose value equals the ideal value and the first whose value equals the
/// nadir value.
///
/// Returns population indices in ascending order, at most `2 · m` of them.
/// An individual holding several extremes is listed once.
pub fn choose_special<S>(population: &[Individual<S>], ideal: &[f64], nadir: &[f64]) -> Vec<usize> {
    let mut special = BTreeSet::new();
    for extreme in [ideal, nadir] {
        for (obj, &z) in extreme.iter().enumerate() {
            if let Some(i) = population.iter().position(|ind| ind.objective(obj) == z) {
                special.insert(i);
            }
        }
    }
    special.into_iter().collect()
}

/// Records each individual's current index in `order`.
pub fn stamp_order<S>(population: &mut [Individual<S>]) {
    for (i, ind) in population.iter_mut().enumerate() {
        ind.order = i;
    }
}

/// New indices of the individuals whose stamped `order` is in `special`,
/// after the population has been filtered.
pub fn relocate_special<S>(population: &[Individual<S>], special: &[usize]) -> Vec<usize> {
    population
        .iter()
        .enumerate()
        .filter(|(_, ind)| special.contains(&ind.order))
        .map(|(i, _)| i)
        .collect()
}

/// Sub-problem id of `grid` for objective `obj`.
///
/// The other objectives' coordinates form a base-`k` number, the highest
/// objective index being the least significant digit, offset by
/// `obj · k^(m-1)`.
pub fn subproblem_id(grid: &[usize], obj: usize, k: usize) -> usize {
    let m = grid.len();
    let per_objective = k.pow((m - 1) as u32);
    let mut offset = 0;
    let mut weight = 1;
    for other in (0..m).rev().filter(|&o| o != obj) {
        offset += grid[other] * weight;
        weight *= k;
    }
    obj * per_objective + offset
}

/// Step 1: records each individual's index in `order` and groups the
/// population into sub-problems.
///
/// Sub-problems come back in ascending id order; empty ones are omitted.
pub fn allocate<S>(population: &mut [Individual<S>], k: usize) -> Vec<Subproblem> {
    stamp_order(population);
    let mut buckets: BTreeMap<usize, Subproblem> = BTreeMap::new();
    for (i, ind) in population.iter().enumerate() {
        for obj in 0..ind.num_objectives() {
            buckets
                .entry(subproblem_id(&ind.grid, obj, k))
                .or_insert_with(|| Subproblem {
                    objective: obj,
                    members: Vec::new(),
                })
                .members
                .push(i);
        }
    }
    buckets.into_values().collect()
}

/// Step 2: sorts each sub-problem ascending on its objective (stable).
pub fn sort_subproblems<S>(population: &[Individual<S>], subproblems: &mut [Subproblem]) {
    for sp in subproblems.iter_mut() {
        let obj = sp.objective;
        sp.members.sort_by(|&a, &b| {
            population[a]
                .objective(obj)
                .partial_cmp(&population[b].objective(obj))
                .unwrap_or(Ordering::Equal)
        });
    }
}

/// Step 3: assigns per-objective ranks inside each sorted sub-problem.
///
/// A member at position `j` whose value lies `Δ` above the first member's
/// gets `max(ceil(Δ / cell_width) + 1, j + 1)`.
pub fn assign_objective_ranks<S>(
    population: &mut [Individual<S>],
    subproblems: &[Subproblem],
    grid: &GridSystem,
) {
    for sp in subproblems {
        let obj = sp.objective;
        let Some(&first) = sp.members.first() else {
            continue;
        };
        let first_value = population[first].objective(obj);
        let width = grid.cell_width()[obj];

        for (j, &i) in sp.members.iter().enumerate() {
            let distance = ((population[i].objective(obj) - first_value) / width).ceil();
            let grid_rank = if distance.is_nan() || distance < 0.0 {
                0
            } else {
                distance as usize
            };
            population[i].rank[obj] = grid_rank.saturating_add(1).max(j + 1);
        }
    }
}

/// Step 4: overrides every rank of the special individuals.
pub fn mark_special<S>(population: &mut [Individual<S>], special: &[usize]) {
    for &i in special {
        population[i].rank.fill(SPECIAL_RANK);
    }
}

/// Step 5: sorts one individual's own rank vector ascending.
pub fn sort_individual_ranks<S>(individual: &mut Individual<S>) {
    individual.rank.sort_unstable();
}

/// Step 6: sorts the population by rank vectors, first differing component
/// deciding. Special individuals (identified by their `order`) come first.
pub fn lexicographic_sort<S>(population: &mut [Individual<S>], special: &[usize]) {
    let is_special = |ind: &Individual<S>| special.contains(&ind.order);
    population.sort_by(|a, b| {
        is_special(b)
            .cmp(&is_special(a))
            .then_with(|| a.rank.cmp(&b.rank))
    });
}

/// Step 7: cuts the sorted population to `target`.
///
/// If the population is already short, it is resupplied from `rejected`.
/// Otherwise the best `target - |special|` ranked individuals are kept and
/// the special individuals appended after them.
pub fn choose<S: Clone, R: Rng>(
    population: &mut Vec<Individual<S>>,
    special: &[usize],
    target: usize,
    rejected: &[Individual<S>],
    rng: &mut R,
) {
    if population.len() < target {
        resupply(population, rejected, target, rng);
        return;
    }

    let (specials, mut ranked): (Vec<_>, Vec<_>) = population
        .drain(..)
        .partition(|ind| special.contains(&ind.order));
    ranked.truncate(target.saturating_sub(specials.len()));
    ranked.extend(specials);
    *population = ranked;
}

/// Runs steps 1–7 on `population`.
pub fn rank_based_selection<S: Clone, R: Rng>(
    population: &mut Vec<Individual<S>>,
    grid: &GridSystem,
    special: &[usize],
    target: usize,
    rejected: &[Individual<S>],
    rng: &mut R,
) {
    let mut subproblems = allocate(population, grid.divisions());
    sort_subproblems(population, &mut subproblems);
    assign_objective_ranks(population, &subproblems, grid);
    mark_special(population, special);
    for ind in population.iter_mut() {
        sort_individual_ranks(ind);
    }
    lexicographic_sort(population, special);
    choose(population, special, target, rejected, rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use u_numflow::random::create_rng;

    fn ind(id: usize, objectives: &[f64], grid: &[usize]) -> Individual<usize> {
        let mut ind = Individual::new(id, objectives.to_vec());
        ind.grid = grid.to_vec();
        ind
    }

    fn ids(population: &[Individual<usize>]) -> Vec<usize> {
        population.iter().map(|ind| *ind.solution()).collect()
    }

    // ---- Special population ----

    #[test]
    fn test_choose_special_extremes() {
        let population = vec![
            ind(0, &[0.5, 0.5], &[0, 0]),
            ind(1, &[0.0, 1.0], &[0, 0]),
            ind(2, &[1.0, 0.0], &[0, 0]),
            ind(3, &[0.7, 0.7], &[0, 0]),
        ];
        let special = choose_special(&population, &[0.0, 0.0], &[1.0, 1.0]);
        assert_eq!(special, vec![1, 2]);
    }

    #[test]
    fn test_choose_special_one_per_extreme() {
        let population: Vec<_> = (0..10).map(|i| ind(i, &[0.0, 0.0], &[0, 0])).collect();
        let special = choose_special(&population, &[0.0, 0.0], &[1.0, 1.0]);
        assert_eq!(special, vec![0]);
    }

    #[test]
    fn test_choose_special_ties_do_not_crowd_out() {
        // Many copies of one extreme must not push the other extreme out.
        let mut population: Vec<_> = (0..6).map(|i| ind(i, &[0.0, 1.0], &[0, 0])).collect();
        population.push(ind(6, &[0.4, 0.6], &[0, 0]));
        population.push(ind(7, &[1.0, 0.0], &[0, 0]));
        let special = choose_special(&population, &[0.0, 0.0], &[1.0, 1.0]);
        assert_eq!(special, vec![0, 7]);
        assert!(special.len() <= 4);
    }

    #[test]
    fn test_relocate_special_after_removal() {
        let mut population: Vec<_> = (0..5).map(|i| ind(i, &[0.0; 2], &[0; 2])).collect();
        stamp_order(&mut population);
        population.remove(3);
        population.remove(0);
        assert_eq!(relocate_special(&population, &[1, 4]), vec![0, 2]);
    }

    // ---- Allocation ----

    #[test]
    fn test_subproblem_id_mixed_radix() {
        // m = 3, k = 4: objective 0 keyed by (g1, g2) with g2 least significant.
        assert_eq!(subproblem_id(&[9, 1, 2], 0, 4), 4 + 2);
        assert_eq!(subproblem_id(&[3, 9, 2], 1, 4), 16 + 3 * 4 + 2);
        assert_eq!(subproblem_id(&[3, 1, 9], 2, 4), 32 + 3 * 4 + 1);
        assert_eq!(subproblem_id(&[2, 3], 0, 4), 3);
        assert_eq!(subproblem_id(&[2, 3], 1, 4), 4 + 2);
    }

    #[test]
    fn test_allocate_groups_by_other_coordinates() {
        let mut population = vec![
            ind(0, &[0.1, 0.9], &[0, 3]),
            ind(1, &[0.2, 0.9], &[1, 3]),
            ind(2, &[0.3, 0.5], &[1, 2]),
        ];
        let subproblems = allocate(&mut population, 4);
        assert_eq!(
            subproblems,
            vec![
                Subproblem { objective: 0, members: vec![2] },    // id 2: g1 = 2
                Subproblem { objective: 0, members: vec![0, 1] }, // id 3: g1 = 3
                Subproblem { objective: 1, members: vec![0] },    // id 4: g0 = 0
                Subproblem { objective: 1, members: vec![1, 2] }, // id 5: g0 = 1
            ]
        );
        assert_eq!(population[2].order(), 2);
    }

    // ---- Ranking ----

    #[test]
    fn test_objective_ranks_grid_and_position() {
        let grid = GridSystem::uniform(&[0.0, 0.0], &[1.0, 1.0], 1.0, 4);
        let mut population = vec![
            ind(0, &[0.30, 0.0], &[0, 0]),
            ind(1, &[0.10, 0.0], &[0, 0]),
            ind(2, &[0.11, 0.0], &[0, 0]),
            ind(3, &[0.90, 0.0], &[0, 0]),
        ];
        let mut subproblems = allocate(&mut population, 4);
        sort_subproblems(&population, &mut subproblems);
        assert_eq!(subproblems[0].members, vec![1, 2, 0, 3]);

        assign_objective_ranks(&mut population, &subproblems, &grid);
        // Sorted: 0.10 (1), 0.11 (pos 2), 0.30 (ceil(0.8)+1 = 2 vs pos 3), 0.90 (ceil(3.2)+1 = 5)
        assert_eq!(population[1].rank()[0], 1);
        assert_eq!(population[2].rank()[0], 2);
        assert_eq!(population[0].rank()[0], 3);
        assert_eq!(population[3].rank()[0], 5);
        assert!(population.iter().all(|ind| ind.rank().iter().all(|&r| r >= 1)));
    }

    #[test]
    fn test_sort_individual_ranks_idempotent() {
        let mut a = ind(0, &[0.0; 3], &[0; 3]);
        a.rank = vec![5, 1, 3];
        sort_individual_ranks(&mut a);
        let once = a.rank().to_vec();
        sort_individual_ranks(&mut a);
        assert_eq!(once, vec![1, 3, 5]);
        assert_eq!(a.rank(), once.as_slice());
    }

    #[test]
    fn test_lexicographic_sort_special_first() {
        let mut population = vec![
            ind(0, &[0.0; 2], &[0; 2]),
            ind(1, &[0.0; 2], &[0; 2]),
            ind(2, &[0.0; 2], &[0; 2]),
        ];
        stamp_order(&mut population);
        population[0].rank = vec![2, 4];
        population[1].rank = vec![1, 9];
        population[2].rank = vec![1, 1];
        mark_special(&mut population, &[2]);
        lexicographic_sort(&mut population, &[2]);
        assert_eq!(ids(&population), vec![2, 1, 0]);
    }

    // ---- Choosing ----

    #[test]
    fn test_choose_truncates_and_appends_special() {
        let mut rng = create_rng(42);
        let mut population: Vec<_> = (0..6).map(|i| ind(i, &[0.0; 2], &[0; 2])).collect();
        stamp_order(&mut population);
        // Already sorted with the special individual 5 moved to the front.
        population.rotate_right(1);
        choose(&mut population, &[5], 4, &[], &mut rng);
        assert_eq!(ids(&population), vec![0, 1, 2, 5]);
    }

    #[test]
    fn test_choose_resupplies_short_population() {
        let mut rng = create_rng(42);
        let mut population = vec![ind(0, &[0.0; 2], &[0; 2])];
        let rejected = vec![ind(7, &[2.0; 2], &[0; 2])];
        choose(&mut population, &[], 3, &rejected, &mut rng);
        assert_eq!(ids(&population), vec![0, 7, 7]);
    }

    #[test]
    fn test_rank_based_selection_keeps_target_and_specials() {
        let mut rng = create_rng(42);
        let ideal = [0.0, 0.0];
        let nadir = [1.0, 1.0];
        let grid = GridSystem::uniform(&ideal, &nadir, 1.0, 4);
        let mut population: Vec<_> = (0..12)
            .map(|i| {
                let x = i as f64 / 11.0;
                let objectives = [x, 1.0 - x];
                let mut g = vec![0; 2];
                grid.locate(&objectives, &mut g);
                ind(i, &objectives, &g)
            })
            .collect();
        let special = choose_special(&population, &ideal, &nadir);
        assert_eq!(special, vec![0, 11]);

        rank_based_selection(&mut population, &grid, &special, 6, &[], &mut rng);
        assert_eq!(population.len(), 6);
        let kept = ids(&population);
        assert!(kept.contains(&0) && kept.contains(&11));
        assert_eq!(&kept[4..], &[0, 11]);
    }
}
