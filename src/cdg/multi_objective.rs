//! Pareto dominance utilities.
//!
//! - [`non_dominated_sort`]: Fast non-dominated sorting (Deb et al., 2002),
//!   used to refresh the nadir point from the first front
//! - [`dominates`]: Pareto dominance on every objective
//! - [`dominates_excluding`]: Pareto dominance ignoring one objective, used by
//!   the border computation where the defining axis is left out
//!
//! All objectives are **minimized**.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//! - IEEE Transactions on Evolutionary Computation, 6(2), 182-197

/// Result of non-dominated sorting.
///
/// Each element of `ranks` corresponds to the Pareto rank of the solution
/// at the same index. Rank 0 is the Pareto front (non-dominated solutions).
#[derive(Debug, Clone)]
pub struct NondominatedSortResult {
    /// Pareto rank for each solution (0 = front).
    pub ranks: Vec<usize>,

    /// Indices grouped by front: `fronts[0]` contains rank-0 indices, etc.
    pub fronts: Vec<Vec<usize>>,
}

/// Fast non-dominated sorting.
///
/// # Algorithm (Deb et al., 2002)
///
/// 1. For each pair of solutions, determine dominance
/// 2. Solutions dominated by no other belong to front 0 (rank 0)
/// 3. Remove front 0, repeat to find subsequent fronts
///
/// # Complexity
///
/// O(m * n²) where m = number of objectives, n = number of solutions
///
/// An empty input yields an empty result.
///
/// # Example
///
/// ```
/// use u_cdg::cdg::multi_objective::non_dominated_sort;
///
/// let objectives = vec![
///     vec![1.0, 5.0],
///     vec![3.0, 3.0],
///     vec![5.0, 1.0],
///     vec![4.0, 4.0], // dominated by (3, 3)
/// ];
///
/// let result = non_dominated_sort(&objectives);
/// assert_eq!(result.fronts[0], vec![0, 1, 2]);
/// assert_eq!(result.ranks[3], 1);
/// ```
pub fn non_dominated_sort<V: AsRef<[f64]>>(objectives: &[V]) -> NondominatedSortResult {
    let n = objectives.len();
    if n == 0 {
        return NondominatedSortResult {
            ranks: Vec::new(),
            fronts: Vec::new(),
        };
    }

    let mut domination_count = vec![0usize; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut ranks = vec![0usize; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (objectives[i].as_ref(), objectives[j].as_ref());
            if dominates(a, b) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if dominates(b, a) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let front_0: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    let mut fronts = vec![front_0];
    loop {
        let current = &fronts[fronts.len() - 1];
        let mut next_front = Vec::new();

        for &i in current {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    ranks[j] = fronts.len();
                    next_front.push(j);
                }
            }
        }

        if next_front.is_empty() {
            break;
        }
        fronts.push(next_front);
    }

    NondominatedSortResult { ranks, fronts }
}

/// Returns `true` if `a` Pareto-dominates `b`: no worse on every objective
/// and strictly better on at least one.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (&va, &vb) in a.iter().zip(b) {
        if va > vb {
            return false;
        }
        if va < vb {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Pareto dominance over every objective except `skip`.
///
/// Counts objectives where `a <= b` and where `a < b`; `a` dominates `b`
/// when the first count covers all `m - 1` compared objectives and the
/// second is positive.
pub fn dominates_excluding(a: &[f64], b: &[f64], skip: usize) -> bool {
    let compared = a.len().saturating_sub(1);
    let mut no_worse = 0usize;
    let mut better = 0usize;
    for (obj, (&va, &vb)) in a.iter().zip(b).enumerate() {
        if obj == skip {
            continue;
        }
        if va <= vb {
            no_worse += 1;
        }
        if va < vb {
            better += 1;
        }
    }
    no_worse == compared && better > 0
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Non-dominated sort ----

    #[test]
    fn test_empty_input() {
        let objs: Vec<Vec<f64>> = Vec::new();
        let result = non_dominated_sort(&objs);
        assert!(result.ranks.is_empty());
        assert!(result.fronts.is_empty());
    }

    #[test]
    fn test_single_solution() {
        let objs = vec![vec![1.0, 2.0]];
        let result = non_dominated_sort(&objs);
        assert_eq!(result.ranks, vec![0]);
        assert_eq!(result.fronts, vec![vec![0]]);
    }

    #[test]
    fn test_clear_dominance() {
        let objs = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let result = non_dominated_sort(&objs);
        assert_eq!(result.ranks, vec![0, 1, 2]);
        assert_eq!(result.fronts.len(), 3);
    }

    #[test]
    fn test_mixed_fronts() {
        let objs = vec![
            vec![1.0, 5.0], // front 0
            vec![3.0, 3.0], // front 0
            vec![5.0, 1.0], // front 0
            vec![4.0, 4.0], // dominated by [1]
            vec![6.0, 6.0], // dominated by [3]
        ];
        let result = non_dominated_sort(&objs);
        assert_eq!(result.ranks, vec![0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_all_equal() {
        let objs = vec![vec![2.0, 2.0], vec![2.0, 2.0], vec![2.0, 2.0]];
        let result = non_dominated_sort(&objs);
        assert!(result.ranks.iter().all(|&r| r == 0));
    }

    #[test]
    fn test_slices_accepted() {
        let a = [1.0, 4.0];
        let b = [2.0, 5.0];
        let objs: Vec<&[f64]> = vec![&a, &b];
        let result = non_dominated_sort(&objs);
        assert_eq!(result.fronts[0], vec![0]);
    }

    // ---- Dominance ----

    #[test]
    fn test_dominates() {
        assert!(dominates(&[1.0, 1.0], &[1.0, 2.0]));
        assert!(!dominates(&[1.0, 2.0], &[1.0, 2.0]));
        assert!(!dominates(&[0.0, 3.0], &[1.0, 2.0]));
    }

    #[test]
    fn test_dominates_excluding_ignores_axis() {
        // Worse on axis 0, better elsewhere.
        let a = [9.0, 1.0, 1.0];
        let b = [0.0, 2.0, 1.0];
        assert!(!dominates(&a, &b));
        assert!(dominates_excluding(&a, &b, 0));
        assert!(!dominates_excluding(&b, &a, 0));
    }

    #[test]
    fn test_dominates_excluding_equal_is_not_dominance() {
        let a = [0.0, 1.0, 1.0];
        let b = [5.0, 1.0, 1.0];
        assert!(!dominates_excluding(&a, &b, 0));
        assert!(!dominates_excluding(&b, &a, 0));
    }
}
