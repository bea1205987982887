//! Benchmark problems.
//!
//! Standard continuous test problems over `[0, 1]^n`, all objectives
//! minimized. Used by the tests, the benchmarks and as templates for
//! implementing [`CdgProblem`].

use std::convert::Infallible;
use std::f64::consts::FRAC_PI_2;

use rand::Rng;

use crate::cdg::CdgProblem;

fn random_vector<R: Rng>(n: usize, rng: &mut R) -> Vec<f64> {
    (0..n).map(|_| rng.random::<f64>()).collect()
}

/// ZDT1 (Zitzler, Deb & Thiele, 2000): two objectives, convex front
/// `f2 = 1 - sqrt(f1)` reached when `x[1..] = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zdt1 {
    variables: usize,
}

impl Zdt1 {
    /// ZDT1 with `n` decision variables (at least 2; 30 is customary).
    pub fn new(n: usize) -> Self {
        Self { variables: n.max(2) }
    }

    /// Number of decision variables.
    pub fn variables(&self) -> usize {
        self.variables
    }
}

impl CdgProblem for Zdt1 {
    type Solution = Vec<f64>;
    type Error = Infallible;

    fn number_of_objectives(&self) -> usize {
        2
    }

    fn create_solution<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        random_vector(self.variables, rng)
    }

    fn evaluate(&self, x: &Vec<f64>) -> Result<Vec<f64>, Infallible> {
        let f1 = x[0];
        let tail = &x[1..];
        let g = 1.0 + 9.0 * tail.iter().sum::<f64>() / tail.len().max(1) as f64;
        let f2 = g * (1.0 - (f1 / g).sqrt());
        Ok(vec![f1, f2])
    }
}

/// DTLZ2 (Deb, Thiele, Laumanns & Zitzler, 2002): `m` objectives, the
/// front is the unit hypersphere octant reached when the distance
/// variables equal 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dtlz2 {
    variables: usize,
    objectives: usize,
}

impl Dtlz2 {
    /// DTLZ2 with `n` variables and `m` objectives (`n >= m`; the usual
    /// choice is `n = m + 9`).
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            variables: n.max(m),
            objectives: m,
        }
    }

    /// Number of decision variables.
    pub fn variables(&self) -> usize {
        self.variables
    }
}

impl CdgProblem for Dtlz2 {
    type Solution = Vec<f64>;
    type Error = Infallible;

    fn number_of_objectives(&self) -> usize {
        self.objectives
    }

    fn create_solution<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        random_vector(self.variables, rng)
    }

    fn evaluate(&self, x: &Vec<f64>) -> Result<Vec<f64>, Infallible> {
        let m = self.objectives;
        let g: f64 = x[m - 1..].iter().map(|&xi| (xi - 0.5).powi(2)).sum();

        let objectives = (0..m)
            .map(|i| {
                let mut f = 1.0 + g;
                for &xj in &x[..m - 1 - i] {
                    f *= (xj * FRAC_PI_2).cos();
                }
                if i > 0 {
                    f *= (x[m - 1 - i] * FRAC_PI_2).sin();
                }
                f
            })
            .collect();
        Ok(objectives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use u_numflow::random::create_rng;

    // ---- ZDT1 ----

    #[test]
    fn test_zdt1_on_front() {
        let problem = Zdt1::new(30);
        let mut x = vec![0.0; 30];
        x[0] = 0.25;
        let f = problem.evaluate(&x).unwrap();
        assert!((f[0] - 0.25).abs() < 1e-12);
        assert!((f[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zdt1_off_front() {
        let problem = Zdt1::new(3);
        let f = problem.evaluate(&vec![0.0, 1.0, 1.0]).unwrap();
        assert!((f[1] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_zdt1_create_solution_in_unit_box() {
        let mut rng = create_rng(42);
        let problem = Zdt1::new(10);
        let x = problem.create_solution(&mut rng);
        assert_eq!(x.len(), 10);
        assert!(x.iter().all(|v| (0.0..1.0).contains(v)));
    }

    // ---- DTLZ2 ----

    #[test]
    fn test_dtlz2_front_is_unit_sphere() {
        let problem = Dtlz2::new(12, 3);
        let mut rng = create_rng(42);
        for _ in 0..20 {
            let mut x = problem.create_solution(&mut rng);
            for xi in &mut x[2..] {
                *xi = 0.5;
            }
            let f = problem.evaluate(&x).unwrap();
            let norm: f64 = f.iter().map(|v| v * v).sum();
            assert!((norm - 1.0).abs() < 1e-9, "norm = {norm}");
        }
    }

    #[test]
    fn test_dtlz2_corners() {
        let problem = Dtlz2::new(4, 3);
        let f = problem.evaluate(&vec![0.0, 0.0, 0.5, 0.5]).unwrap();
        assert!((f[0] - 1.0).abs() < 1e-12);
        assert!(f[1].abs() < 1e-12);
        assert!(f[2].abs() < 1e-12);
    }

    #[test]
    fn test_dtlz2_objective_count() {
        assert_eq!(Dtlz2::new(13, 5).number_of_objectives(), 5);
        assert_eq!(Dtlz2::new(2, 5).variables(), 5);
    }
}
