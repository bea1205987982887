//! Error types for the CDG engine.
//!
//! Configuration problems are reported once, at construction, through
//! [`ConfigError`]. Failures raised by external collaborators (the problem
//! evaluator and the variation operators) propagate through [`CdgError`]
//! with the original error boxed, so callers can still
//! [`downcast_ref`](std::error::Error) to the collaborator's own type.

use thiserror::Error;

/// Boxed collaborator error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Invalid [`CdgConfig`](super::CdgConfig) for a given objective count.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The engine needs at least two objectives.
    #[error("at least 2 objectives are required, got {0}")]
    TooFewObjectives(usize),

    /// The population cannot hold the special population plus ranked members.
    #[error("population_size must exceed {min} (2 x objectives), got {actual}")]
    PopulationTooSmall { min: usize, actual: usize },

    /// The evaluation budget does not cover the initial population.
    #[error("max_evaluations ({max_evaluations}) must be at least population_size ({population_size})")]
    BudgetTooSmall {
        max_evaluations: usize,
        population_size: usize,
    },

    /// Too few grid divisions per axis for the selected grid layout.
    #[error("grid_divisions must be at least {min}, got {actual}")]
    GridTooCoarse { min: usize, actual: usize },

    /// The neighborhood threshold must be positive.
    #[error("neighborhood_threshold must be at least 1")]
    ZeroThreshold,

    /// The child grid cannot hold a full neighbor window.
    #[error("child_grid ({child_grid}) must be at least 2 * neighborhood_threshold + 1 ({min})")]
    ChildGridTooSmall { child_grid: usize, min: usize },

    /// A derived grid size does not fit in `usize`.
    #[error("{what} overflows for {objectives} objectives")]
    GridOverflow {
        what: &'static str,
        objectives: usize,
    },

    /// Neighborhood selection probability outside `[0, 1]`.
    #[error("neighborhood_selection_probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),

    /// The nadir refresh interval must be positive.
    #[error("nadir_refresh_interval must be at least 1")]
    ZeroRefreshInterval,
}

/// Fatal error raised while running the engine.
#[derive(Debug, Error)]
pub enum CdgError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The problem evaluator failed.
    #[error(transparent)]
    Evaluation(BoxError),

    /// The crossover operator failed.
    #[error(transparent)]
    Crossover(BoxError),

    /// The mutation operator failed.
    #[error(transparent)]
    Mutation(BoxError),

    /// The evaluator returned an objective vector of the wrong length.
    #[error("evaluator returned {actual} objectives, expected {expected}")]
    ObjectiveCount { expected: usize, actual: usize },
}

impl CdgError {
    /// Returns the collaborator error carried by this error, if any.
    pub fn collaborator(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            CdgError::Evaluation(e) | CdgError::Crossover(e) | CdgError::Mutation(e) => Some(&**e),
            _ => None,
        }
    }
}

/// Error raised by the bundled variation operators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperatorError {
    /// Wrong number of parents for the operator.
    #[error("expected {expected} parents, got {actual}")]
    ParentCount { expected: usize, actual: usize },

    /// Parents with different numbers of variables.
    #[error("dimension mismatch: expected {expected} variables, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
