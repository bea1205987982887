//! Core types and collaborator traits for the CDG engine.
//!
//! The engine owns every candidate as an [`Individual`]: the user's
//! solution, its objective vector, and the per-generation scratch state
//! (grid coordinates, per-objective ranks, selection order).
//!
//! Domain logic plugs in through three traits:
//!
//! - [`CdgProblem`]: creates and evaluates solutions
//! - [`CrossoverOperator`]: builds one child from a parent set
//! - [`MutationOperator`]: perturbs a child in place

use rand::Rng;

/// An evaluated candidate with its CDG scratch attributes.
///
/// `grid`, `rank` and `order` are reinitialized whenever the individual
/// enters the population and refreshed every generation by the grid and
/// ranking passes.
///
/// Invariants: `grid[obj] < k` and `rank[obj] >= 1`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Individual<S> {
    solution: S,
    pub(crate) objectives: Vec<f64>,
    pub(crate) grid: Vec<usize>,
    pub(crate) rank: Vec<usize>,
    pub(crate) order: usize,
}

impl<S> Individual<S> {
    /// Wraps an evaluated solution with fresh scratch attributes.
    pub fn new(solution: S, objectives: Vec<f64>) -> Self {
        let m = objectives.len();
        Self {
            solution,
            objectives,
            grid: vec![0; m],
            rank: vec![1; m],
            order: 0,
        }
    }

    /// The decision-space solution.
    pub fn solution(&self) -> &S {
        &self.solution
    }

    /// Objective values (minimized).
    pub fn objectives(&self) -> &[f64] {
        &self.objectives
    }

    /// Objective value on one axis.
    #[inline]
    pub fn objective(&self, obj: usize) -> f64 {
        self.objectives[obj]
    }

    /// Grid coordinate per objective, in `[0, k - 1]`.
    pub fn grid(&self) -> &[usize] {
        &self.grid
    }

    /// Per-objective rank from the last ranking pass.
    pub fn rank(&self) -> &[usize] {
        &self.rank
    }

    /// Index of this individual in the population at allocation time.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of objectives.
    pub fn num_objectives(&self) -> usize {
        self.objectives.len()
    }

    /// Consumes the individual and returns the solution.
    pub fn into_solution(self) -> S {
        self.solution
    }
}

/// Defines a multi-objective problem for the CDG engine.
///
/// All objectives are **minimized**.
///
/// # Thread Safety
///
/// `CdgProblem` must be `Send + Sync` because offspring may be evaluated in
/// parallel when the `parallel` feature is enabled.
///
/// # Example
///
/// ```
/// use rand::Rng;
/// use u_cdg::cdg::CdgProblem;
///
/// struct Segment;
///
/// impl CdgProblem for Segment {
///     type Solution = f64;
///     type Error = std::convert::Infallible;
///
///     fn number_of_objectives(&self) -> usize { 2 }
///     fn create_solution<R: Rng>(&self, rng: &mut R) -> f64 { rng.random_range(0.0..1.0) }
///     fn evaluate(&self, x: &f64) -> Result<Vec<f64>, Self::Error> { Ok(vec![*x, 1.0 - x]) }
/// }
/// ```
pub trait CdgProblem: Send + Sync {
    /// The decision-space representation.
    type Solution: Clone + Send + Sync;

    /// Error raised by [`evaluate`](CdgProblem::evaluate).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of objectives; fixed for the lifetime of the problem.
    fn number_of_objectives(&self) -> usize;

    /// Creates a random solution.
    fn create_solution<R: Rng>(&self, rng: &mut R) -> Self::Solution;

    /// Computes the objective vector of a solution.
    ///
    /// Errors are fatal for the run and are returned to the caller unchanged.
    fn evaluate(&self, solution: &Self::Solution) -> Result<Vec<f64>, Self::Error>;

    /// Called at the end of each generation. The default is a no-op.
    fn on_generation(&self, _generation: usize, _evaluations: usize) {}
}

/// Recombines a parent set into one child.
///
/// The engine always passes `[mate1, mate2, current]`.
pub trait CrossoverOperator<S>: Send + Sync {
    /// Error raised on a malformed parent set.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produces one child.
    fn apply<R: Rng>(&self, parents: &[&S], rng: &mut R) -> Result<S, Self::Error>;
}

/// Perturbs a child in place.
pub trait MutationOperator<S>: Send + Sync {
    /// Error raised by the operator.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Mutates `solution`.
    fn apply<R: Rng>(&self, solution: &mut S, rng: &mut R) -> Result<(), Self::Error>;
}

/// Mutation that leaves the child untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMutation;

impl<S> MutationOperator<S> for NoMutation {
    type Error = std::convert::Infallible;

    fn apply<R: Rng>(&self, _solution: &mut S, _rng: &mut R) -> Result<(), Self::Error> {
        Ok(())
    }
}
