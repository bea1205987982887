//! Real-coded variation operators.
//!
//! Operators for `Vec<f64>` decision vectors with a common box bound.
//!
//! # Crossover Operators
//!
//! - [`DifferentialEvolution`]: DE/rand/1/bin, one child from three parents
//!
//! # Mutation Operators
//!
//! - [`PolynomialMutation`]: Deb's bounded polynomial mutation
//!
//! # References
//!
//! - Storn & Price (1997), "Differential Evolution – A Simple and Efficient
//!   Heuristic for Global Optimization over Continuous Spaces"
//! - Deb & Goyal (1996), "A Combined Genetic Adaptive Search (GeneAS) for
//!   Engineering Design"

use rand::Rng;

use crate::cdg::{CrossoverOperator, MutationOperator, OperatorError};

// ============================================================================
// Crossover operators
// ============================================================================

/// Differential evolution crossover, rand/1/bin variant.
///
/// Parents are `[r1, r2, current]`. Each gene of the child is
/// `current + F · (r1 - r2)` with probability `CR` (and always at one random
/// index), otherwise the current gene. Results are clipped to
/// `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialEvolution {
    /// Crossover rate `CR` (0.0–1.0).
    pub cr: f64,
    /// Scale factor `F`.
    pub f: f64,
    /// Lower bound of every variable.
    pub lower: f64,
    /// Upper bound of every variable.
    pub upper: f64,
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self {
            cr: 1.0,
            f: 0.5,
            lower: 0.0,
            upper: 1.0,
        }
    }
}

impl DifferentialEvolution {
    /// DE with the given `CR` and `F` on `[0, 1]`.
    pub fn new(cr: f64, f: f64) -> Self {
        Self {
            cr,
            f,
            ..Self::default()
        }
    }

    /// Sets the variable bounds.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }
}

impl CrossoverOperator<Vec<f64>> for DifferentialEvolution {
    type Error = OperatorError;

    fn apply<R: Rng>(&self, parents: &[&Vec<f64>], rng: &mut R) -> Result<Vec<f64>, OperatorError> {
        let [r1, r2, current] = parents else {
            return Err(OperatorError::ParentCount {
                expected: 3,
                actual: parents.len(),
            });
        };
        let n = current.len();
        for p in [r1, r2] {
            if p.len() != n {
                return Err(OperatorError::DimensionMismatch {
                    expected: n,
                    actual: p.len(),
                });
            }
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let forced = rng.random_range(0..n);
        let child = (0..n)
            .map(|j| {
                if rng.random::<f64>() < self.cr || j == forced {
                    (current[j] + self.f * (r1[j] - r2[j])).clamp(self.lower, self.upper)
                } else {
                    current[j]
                }
            })
            .collect();
        Ok(child)
    }
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Polynomial mutation (Deb & Goyal, 1996).
///
/// Each gene mutates with `probability`; the perturbation follows a
/// polynomial distribution whose spread shrinks as `distribution_index`
/// grows. Results stay within `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolynomialMutation {
    /// Per-gene mutation probability.
    pub probability: f64,
    /// Distribution index `η_m`.
    pub distribution_index: f64,
    /// Lower bound of every variable.
    pub lower: f64,
    /// Upper bound of every variable.
    pub upper: f64,
}

impl PolynomialMutation {
    /// Mutation with probability `1 / n` and index 20 on `[0, 1]`.
    pub fn for_variables(n: usize) -> Self {
        Self {
            probability: 1.0 / n.max(1) as f64,
            distribution_index: 20.0,
            lower: 0.0,
            upper: 1.0,
        }
    }

    /// Sets the variable bounds.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    fn perturb<R: Rng>(&self, y: f64, rng: &mut R) -> f64 {
        let (yl, yu) = (self.lower, self.upper);
        let span = yu - yl;
        if span <= 0.0 {
            return yl;
        }
        let delta1 = (y - yl) / span;
        let delta2 = (yu - y) / span;
        let mut_pow = 1.0 / (self.distribution_index + 1.0);
        let rnd: f64 = rng.random();

        let deltaq = if rnd <= 0.5 {
            let xy = 1.0 - delta1;
            let val = 2.0 * rnd + (1.0 - 2.0 * rnd) * xy.powf(self.distribution_index + 1.0);
            val.powf(mut_pow) - 1.0
        } else {
            let xy = 1.0 - delta2;
            let val =
                2.0 * (1.0 - rnd) + 2.0 * (rnd - 0.5) * xy.powf(self.distribution_index + 1.0);
            1.0 - val.powf(mut_pow)
        };
        (y + deltaq * span).clamp(yl, yu)
    }
}

impl MutationOperator<Vec<f64>> for PolynomialMutation {
    type Error = OperatorError;

    fn apply<R: Rng>(&self, solution: &mut Vec<f64>, rng: &mut R) -> Result<(), OperatorError> {
        for gene in solution.iter_mut() {
            if rng.random::<f64>() < self.probability {
                *gene = self.perturb(*gene, rng);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use u_numflow::random::create_rng;

    // ---- Differential evolution ----

    #[test]
    fn test_de_full_rate_formula() {
        let mut rng = create_rng(42);
        let de = DifferentialEvolution::new(1.0, 0.5);
        let r1 = vec![0.8, 0.6];
        let r2 = vec![0.4, 0.2];
        let current = vec![0.1, 0.1];
        let child = de.apply(&[&r1, &r2, &current], &mut rng).unwrap();
        assert!((child[0] - 0.3).abs() < 1e-12);
        assert!((child[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_de_zero_rate_changes_one_gene() {
        let mut rng = create_rng(7);
        let de = DifferentialEvolution::new(0.0, 0.5);
        let r1 = vec![1.0; 5];
        let r2 = vec![0.0; 5];
        let current = vec![0.2; 5];
        let child = de.apply(&[&r1, &r2, &current], &mut rng).unwrap();
        let changed = child.iter().filter(|&&x| (x - 0.2).abs() > 1e-12).count();
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_de_clips_to_bounds() {
        let mut rng = create_rng(42);
        let de = DifferentialEvolution::new(1.0, 1.0);
        let r1 = vec![1.0, 0.0];
        let r2 = vec![0.0, 1.0];
        let current = vec![0.9, 0.1];
        let child = de.apply(&[&r1, &r2, &current], &mut rng).unwrap();
        assert_eq!(child, vec![1.0, 0.0]);
    }

    #[test]
    fn test_de_parent_count() {
        let mut rng = create_rng(42);
        let p = vec![0.5];
        let err = DifferentialEvolution::default()
            .apply(&[&p, &p], &mut rng)
            .unwrap_err();
        assert_eq!(err, OperatorError::ParentCount { expected: 3, actual: 2 });
    }

    #[test]
    fn test_de_dimension_mismatch() {
        let mut rng = create_rng(42);
        let a = vec![0.5, 0.5];
        let b = vec![0.5];
        let err = DifferentialEvolution::default()
            .apply(&[&a, &b, &a], &mut rng)
            .unwrap_err();
        assert!(matches!(err, OperatorError::DimensionMismatch { .. }));
    }

    // ---- Polynomial mutation ----

    #[test]
    fn test_polynomial_stays_in_bounds() {
        let mut rng = create_rng(42);
        let pm = PolynomialMutation {
            probability: 1.0,
            distribution_index: 5.0,
            lower: -1.0,
            upper: 2.0,
        };
        for _ in 0..200 {
            let mut genes = vec![-1.0, 0.0, 0.5, 2.0];
            pm.apply(&mut genes, &mut rng).unwrap();
            assert!(genes.iter().all(|&g| (-1.0..=2.0).contains(&g)));
        }
    }

    #[test]
    fn test_polynomial_zero_probability_noop() {
        let mut rng = create_rng(42);
        let pm = PolynomialMutation {
            probability: 0.0,
            ..PolynomialMutation::for_variables(3)
        };
        let mut genes = vec![0.1, 0.2, 0.3];
        pm.apply(&mut genes, &mut rng).unwrap();
        assert_eq!(genes, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_polynomial_mutates_something() {
        let mut rng = create_rng(42);
        let pm = PolynomialMutation {
            probability: 1.0,
            ..PolynomialMutation::for_variables(10)
        };
        let original = vec![0.5; 10];
        let mut genes = original.clone();
        pm.apply(&mut genes, &mut rng).unwrap();
        assert_ne!(genes, original);
    }

    #[test]
    fn test_for_variables_defaults() {
        let pm = PolynomialMutation::for_variables(4);
        assert!((pm.probability - 0.25).abs() < 1e-12);
        assert!((pm.distribution_index - 20.0).abs() < 1e-12);
    }
}
