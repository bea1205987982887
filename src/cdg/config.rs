//! CDG configuration.
//!
//! [`CdgConfig`] holds all parameters that control the generational loop.
//! [`GridStrategy`] is the layout chosen once from the objective count.

use super::error::ConfigError;

/// Grid handling selected from the number of objectives.
///
/// - `TwoD`: uniform grid, child-grid neighborhoods, nadir-only filter
/// - `ThreeD`: graded grid, child-grid neighborhoods, border filter
/// - `General`: uniform grid, Chebyshev-scan neighborhoods, nadir-only filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStrategy {
    TwoD,
    ThreeD,
    General,
}

impl GridStrategy {
    /// Picks the strategy for `m` objectives.
    pub fn for_objectives(m: usize) -> Self {
        match m {
            2 => GridStrategy::TwoD,
            3 => GridStrategy::ThreeD,
            _ => GridStrategy::General,
        }
    }

    /// Dimension of the child grid used for neighborhoods, if any.
    pub fn child_dims(self) -> Option<usize> {
        match self {
            GridStrategy::TwoD => Some(2),
            GridStrategy::ThreeD => Some(3),
            GridStrategy::General => None,
        }
    }
}

/// Configuration for the CDG engine.
///
/// # Defaults
///
/// ```
/// use u_cdg::cdg::CdgConfig;
///
/// let config = CdgConfig::default();
/// assert_eq!(config.population_size, 300);
/// assert_eq!(config.grid_divisions, 180);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_cdg::cdg::CdgConfig;
///
/// let config = CdgConfig::default()
///     .with_population_size(100)
///     .with_max_evaluations(20_000)
///     .with_grid_divisions(40)
///     .with_seed(7);
/// assert!(config.validate(2).is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CdgConfig {
    /// Number of individuals kept after selection.
    pub population_size: usize,

    /// Total number of objective evaluations before termination.
    pub max_evaluations: usize,

    /// Probability of drawing mates from the grid neighborhood instead of
    /// the whole population (0.0–1.0).
    pub neighborhood_selection_probability: f64,

    /// Grid divisions per objective axis (`k`).
    ///
    /// Also sets the sub-problem count, `m · k^(m-1)`.
    pub grid_divisions: usize,

    /// Neighborhood radius in grid cells (`t`).
    pub neighborhood_threshold: usize,

    /// Cells per axis of the coarse grid used for 2-/3-objective
    /// neighborhoods.
    pub child_grid: usize,

    /// Generations between nadir point refreshes.
    pub nadir_refresh_interval: usize,

    /// Whether to evaluate offspring in parallel (requires the `parallel`
    /// feature).
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for CdgConfig {
    fn default() -> Self {
        Self {
            population_size: 300,
            max_evaluations: 300_000,
            neighborhood_selection_probability: 0.9,
            grid_divisions: 180,
            neighborhood_threshold: 1,
            child_grid: 30,
            nadir_refresh_interval: 20,
            parallel: true,
            seed: None,
        }
    }
}

impl CdgConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the evaluation budget.
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = n;
        self
    }

    /// Sets the neighborhood selection probability.
    pub fn with_neighborhood_selection_probability(mut self, p: f64) -> Self {
        self.neighborhood_selection_probability = p;
        self
    }

    /// Sets the grid divisions per axis.
    pub fn with_grid_divisions(mut self, k: usize) -> Self {
        self.grid_divisions = k;
        self
    }

    /// Sets the neighborhood radius.
    pub fn with_neighborhood_threshold(mut self, t: usize) -> Self {
        self.neighborhood_threshold = t;
        self
    }

    /// Sets the child grid resolution.
    pub fn with_child_grid(mut self, cells: usize) -> Self {
        self.child_grid = cells;
        self
    }

    /// Sets the nadir refresh interval in generations.
    pub fn with_nadir_refresh_interval(mut self, generations: usize) -> Self {
        self.nadir_refresh_interval = generations;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Preset for four or more objectives.
    ///
    /// The sub-problem count grows as `k^(m-1)`, so the grid is kept coarse.
    ///
    /// - Population: 200, Evaluations: 200 000, Divisions: 8
    pub fn many_objective() -> Self {
        Self {
            population_size: 200,
            max_evaluations: 200_000,
            grid_divisions: 8,
            ..Self::default()
        }
    }

    /// Number of rank sub-problems, `m · k^(m-1)`.
    pub fn subproblem_count(&self, m: usize) -> Option<usize> {
        let exp = u32::try_from(m.checked_sub(1)?).ok()?;
        self.grid_divisions.checked_pow(exp)?.checked_mul(m)
    }

    /// Validates the configuration for `m` objectives.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self, m: usize) -> Result<(), ConfigError> {
        if m < 2 {
            return Err(ConfigError::TooFewObjectives(m));
        }
        if self.population_size <= 2 * m {
            return Err(ConfigError::PopulationTooSmall {
                min: 2 * m,
                actual: self.population_size,
            });
        }
        if self.max_evaluations < self.population_size {
            return Err(ConfigError::BudgetTooSmall {
                max_evaluations: self.max_evaluations,
                population_size: self.population_size,
            });
        }

        let strategy = GridStrategy::for_objectives(m);
        let min_divisions = if strategy == GridStrategy::ThreeD { 3 } else { 2 };
        if self.grid_divisions < min_divisions {
            return Err(ConfigError::GridTooCoarse {
                min: min_divisions,
                actual: self.grid_divisions,
            });
        }
        if self.neighborhood_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.subproblem_count(m).is_none() {
            return Err(ConfigError::GridOverflow {
                what: "sub-problem count",
                objectives: m,
            });
        }

        if let Some(dims) = strategy.child_dims() {
            let min = 2 * self.neighborhood_threshold + 1;
            if self.child_grid < min {
                return Err(ConfigError::ChildGridTooSmall {
                    child_grid: self.child_grid,
                    min,
                });
            }
            if self.child_grid.checked_pow(dims as u32).is_none() {
                return Err(ConfigError::GridOverflow {
                    what: "child grid cell count",
                    objectives: m,
                });
            }
        }

        if !(0.0..=1.0).contains(&self.neighborhood_selection_probability) {
            return Err(ConfigError::InvalidProbability(
                self.neighborhood_selection_probability,
            ));
        }
        if self.nadir_refresh_interval == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        Ok(())
    }
}
