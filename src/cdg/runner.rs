//! CDG generational loop.
//!
//! [`CdgEngine`] owns the population and drives one generation at a time:
//!
//! 1. Rebuild grid neighborhoods
//! 2. Produce one offspring per population slot, in a random order
//! 3. Evaluate the offspring and fold them into the ideal point
//! 4. Refresh the nadir point every `nadir_refresh_interval` generations
//! 5. Pick the special population from the merged parents and offspring
//! 6. Filter infeasible individuals (nadir test, plus the border test for
//!    three objectives); special individuals are exempt
//! 7. Assign grid coordinates to the population and the rejected pool
//! 8. Grid-rank selection back to `population_size`
//!
//! The loop ends once `max_evaluations` is reached. All per-generation state
//! lives in a [`GenerationContext`] that can be inspected between steps.

use rand::Rng;
use tracing::{debug, info, instrument, trace, warn};
use u_numflow::random::{create_rng, shuffle};

use super::border::Border;
use super::config::{CdgConfig, GridStrategy};
use super::error::{CdgError, ConfigError};
use super::feasibility::{exclude_beyond_nadir, exclude_outside_border, FilterOutcome};
use super::grid::{relaxation_coefficient, GridSystem};
use super::multi_objective::non_dominated_sort;
use super::neighborhood::{NeighborhoodBuilder, Neighborhoods};
use super::reference::ReferencePoints;
use super::selection::{choose_special, rank_based_selection, relocate_special, stamp_order};
use super::types::{CdgProblem, CrossoverOperator, Individual, MutationOperator};

/// Where the mates of one offspring are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborType {
    /// The individual's grid neighborhood.
    Neighbor,
    /// The whole population.
    Population,
}

/// Mutable state carried from one generation to the next.
#[derive(Debug, Clone)]
pub struct GenerationContext<S> {
    pub(crate) population: Vec<Individual<S>>,
    pub(crate) rejected: Vec<Individual<S>>,
    pub(crate) reference: ReferencePoints,
    pub(crate) border: Border,
    pub(crate) neighborhoods: Neighborhoods,
    pub(crate) grid: Option<GridSystem>,
    pub(crate) special: Vec<usize>,
    pub(crate) evaluations: usize,
    pub(crate) generation: usize,
    pub(crate) filter_outcome: Option<FilterOutcome>,
}

impl<S> GenerationContext<S> {
    fn new(m: usize) -> Self {
        Self {
            population: Vec::new(),
            rejected: Vec::new(),
            reference: ReferencePoints::new(m),
            border: Border::empty(m),
            neighborhoods: Neighborhoods::default(),
            grid: None,
            special: Vec::new(),
            evaluations: 0,
            generation: 0,
            filter_outcome: None,
        }
    }

    /// The current population.
    pub fn population(&self) -> &[Individual<S>] {
        &self.population
    }

    /// Individuals removed by the last feasibility filter.
    pub fn rejected(&self) -> &[Individual<S>] {
        &self.rejected
    }

    /// Ideal and nadir points.
    pub fn reference(&self) -> &ReferencePoints {
        &self.reference
    }

    /// Border of the last generation (empty unless three objectives).
    pub fn border(&self) -> &Border {
        &self.border
    }

    /// Neighborhoods used for mating in the last generation.
    pub fn neighborhoods(&self) -> &Neighborhoods {
        &self.neighborhoods
    }

    /// Ranking grid of the last generation, `None` before initialization.
    pub fn grid(&self) -> Option<&GridSystem> {
        self.grid.as_ref()
    }

    /// Special population of the last selection, as indices into the
    /// filtered population it was ranked in.
    pub fn special(&self) -> &[usize] {
        &self.special
    }

    /// Objective evaluations spent so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Completed generations.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Policy applied by the last three-objective filter.
    pub fn filter_outcome(&self) -> Option<FilterOutcome> {
        self.filter_outcome
    }
}

/// Result of a CDG run.
#[derive(Debug, Clone)]
pub struct CdgResult<S> {
    /// Final population.
    pub population: Vec<Individual<S>>,

    /// Total objective evaluations.
    pub evaluations: usize,

    /// Total generations executed.
    pub generations: usize,
}

impl<S> CdgResult<S> {
    /// First non-dominated front of the final population.
    pub fn non_dominated(&self) -> Vec<&Individual<S>> {
        let objectives: Vec<&[f64]> = self.population.iter().map(Individual::objectives).collect();
        let sorted = non_dominated_sort(&objectives);
        sorted
            .fronts
            .first()
            .map(|front| front.iter().map(|&i| &self.population[i]).collect())
            .unwrap_or_default()
    }
}

/// Executes the CDG evolutionary loop.
///
/// # Usage
///
/// ```
/// use u_cdg::cdg::{CdgConfig, CdgEngine};
/// use u_cdg::operators::{DifferentialEvolution, PolynomialMutation};
/// use u_cdg::problems::Zdt1;
///
/// let problem = Zdt1::new(10);
/// let crossover = DifferentialEvolution::new(1.0, 0.5);
/// let mutation = PolynomialMutation::for_variables(10);
/// let config = CdgConfig::default()
///     .with_population_size(20)
///     .with_max_evaluations(200)
///     .with_grid_divisions(10)
///     .with_child_grid(5)
///     .with_seed(42);
///
/// let mut engine = CdgEngine::new(&problem, &crossover, &mutation, config).unwrap();
/// let result = engine.run().unwrap();
/// assert_eq!(result.population.len(), 20);
/// assert_eq!(result.evaluations, 200);
/// ```
pub struct CdgEngine<'a, P: CdgProblem, C, M> {
    problem: &'a P,
    crossover: &'a C,
    mutation: &'a M,
    config: CdgConfig,
    strategy: GridStrategy,
    neighborhood: NeighborhoodBuilder,
    context: GenerationContext<P::Solution>,
}

impl<'a, P, C, M> CdgEngine<'a, P, C, M>
where
    P: CdgProblem,
    C: CrossoverOperator<P::Solution>,
    M: MutationOperator<P::Solution>,
{
    /// Creates an engine, validating `config` against the problem's
    /// objective count.
    pub fn new(
        problem: &'a P,
        crossover: &'a C,
        mutation: &'a M,
        config: CdgConfig,
    ) -> Result<Self, ConfigError> {
        let m = problem.number_of_objectives();
        config.validate(m)?;

        let strategy = GridStrategy::for_objectives(m);
        let neighborhood =
            NeighborhoodBuilder::new(strategy, config.neighborhood_threshold, config.child_grid);

        Ok(Self {
            problem,
            crossover,
            mutation,
            config,
            strategy,
            neighborhood,
            context: GenerationContext::new(m),
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &CdgConfig {
        &self.config
    }

    /// The grid strategy chosen for the problem's objective count.
    pub fn strategy(&self) -> GridStrategy {
        self.strategy
    }

    /// The live population. Valid between generations.
    pub fn result(&self) -> &[Individual<P::Solution>] {
        &self.context.population
    }

    /// State of the last generation.
    pub fn context(&self) -> &GenerationContext<P::Solution> {
        &self.context
    }

    /// Creates and evaluates the initial population, then sets up the
    /// reference points and the grid.
    pub fn initialize<R: Rng>(&mut self, rng: &mut R) -> Result<(), CdgError> {
        let m = self.problem.number_of_objectives();
        let n = self.config.population_size;

        let solutions: Vec<_> = (0..n).map(|_| self.problem.create_solution(rng)).collect();
        let population = evaluate_all(self.problem, m, solutions, self.config.parallel)?;

        let ctx = &mut self.context;
        *ctx = GenerationContext::new(m);
        ctx.population = population;
        ctx.evaluations = n;
        ctx.reference.init_ideal(&ctx.population);
        ctx.reference.init_nadir(&ctx.population);

        let coefficient = relaxation_coefficient(ctx.evaluations, self.config.max_evaluations);
        let grid = self.build_grid(coefficient);
        grid.assign(&mut self.context.population);
        self.context.grid = Some(grid);
        Ok(())
    }

    /// Runs one generation. Initializes the engine first if needed.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> Result<(), CdgError> {
        if self.context.grid.is_none() {
            self.initialize(rng)?;
        }
        let m = self.problem.number_of_objectives();
        let n = self.config.population_size;

        // Variation
        self.context.neighborhoods = self
            .neighborhood
            .build(&self.context.population, self.context.reference.ideal());
        let offspring = self.make_offspring(rng)?;
        let offspring = evaluate_all(self.problem, m, offspring, self.config.parallel)?;

        let ctx = &mut self.context;
        ctx.evaluations += offspring.len();
        for child in &offspring {
            ctx.reference.update_ideal(child.objectives());
        }
        ctx.population.extend(offspring);

        ctx.generation += 1;
        if ctx.generation.is_multiple_of(self.config.nadir_refresh_interval) {
            ctx.reference.init_nadir(&ctx.population);
            trace!(generation = ctx.generation, nadir = ?ctx.reference.nadir(), "nadir refreshed");
        }

        // Specials are picked from the merged population and survive the filter.
        let nadir = ctx.reference.nadir();
        let special = choose_special(&ctx.population, ctx.reference.ideal(), nadir);
        stamp_order(&mut ctx.population);

        // Filtering
        let coefficient = relaxation_coefficient(ctx.evaluations, self.config.max_evaluations);
        if self.strategy == GridStrategy::ThreeD {
            ctx.border = Border::compute(&ctx.population, nadir, coefficient);
            ctx.filter_outcome = Some(exclude_outside_border(
                &mut ctx.population,
                nadir,
                &ctx.border,
                n,
                &special,
                &mut ctx.rejected,
            ));
        } else {
            exclude_beyond_nadir(&mut ctx.population, nadir, &special, &mut ctx.rejected);
        }
        ctx.special = relocate_special(&ctx.population, &special);

        // Selection
        let grid = self.build_grid(coefficient);
        let ctx = &mut self.context;
        grid.assign(&mut ctx.population);
        grid.assign(&mut ctx.rejected);

        if ctx.population.len() < n && ctx.rejected.is_empty() {
            warn!(
                generation = ctx.generation,
                population = ctx.population.len(),
                target = n,
                "rejected pool is empty, population stays short"
            );
        }
        rank_based_selection(
            &mut ctx.population,
            &grid,
            &ctx.special,
            n,
            &ctx.rejected,
            rng,
        );
        ctx.grid = Some(grid);

        debug!(
            generation = ctx.generation,
            evaluations = ctx.evaluations,
            rejected = ctx.rejected.len(),
            special = ctx.special.len(),
            fallback = ctx.filter_outcome == Some(FilterOutcome::NadirFallback),
            "generation complete"
        );
        self.problem.on_generation(ctx.generation, ctx.evaluations);
        Ok(())
    }

    /// Runs until the evaluation budget is spent, drawing all randomness
    /// from `rng`.
    #[instrument(skip_all)]
    pub fn run_with_rng<R: Rng>(&mut self, rng: &mut R) -> Result<CdgResult<P::Solution>, CdgError> {
        info!(
            population_size = self.config.population_size,
            objectives = self.problem.number_of_objectives(),
            strategy = ?self.strategy,
            max_evaluations = self.config.max_evaluations,
            "starting CDG run"
        );

        self.initialize(rng)?;
        while self.context.evaluations < self.config.max_evaluations {
            self.step(rng)?;
        }

        info!(
            generations = self.context.generation,
            evaluations = self.context.evaluations,
            "CDG run finished"
        );
        Ok(CdgResult {
            population: self.context.population.clone(),
            evaluations: self.context.evaluations,
            generations: self.context.generation,
        })
    }

    /// Runs with an RNG seeded from the configuration (random if unset).
    pub fn run(&mut self) -> Result<CdgResult<P::Solution>, CdgError> {
        let mut rng = create_rng(self.config.seed.unwrap_or_else(rand::random));
        self.run_with_rng(&mut rng)
    }

    fn build_grid(&self, coefficient: f64) -> GridSystem {
        let reference = &self.context.reference;
        let k = self.config.grid_divisions;
        match self.strategy {
            GridStrategy::ThreeD => {
                GridSystem::graded(reference.ideal(), reference.nadir(), coefficient, k)
            }
            GridStrategy::TwoD | GridStrategy::General => {
                GridSystem::uniform(reference.ideal(), reference.nadir(), coefficient, k)
            }
        }
    }

    /// One child per population slot, slots visited in a random order.
    fn make_offspring<R: Rng>(&self, rng: &mut R) -> Result<Vec<P::Solution>, CdgError> {
        let population = &self.context.population;
        let mut order: Vec<usize> = (0..population.len()).collect();
        shuffle(&mut order, rng);

        let mut offspring = Vec::with_capacity(order.len());
        for id in order {
            let neighbors = self.context.neighborhoods.of(id);
            let kind = choose_neighbor_type(
                neighbors.len(),
                self.config.neighborhood_selection_probability,
                rng,
            );
            let [a, b] = select_mates(neighbors, population.len(), kind, rng);
            let parents = [
                population[a].solution(),
                population[b].solution(),
                population[id].solution(),
            ];

            let mut child = self
                .crossover
                .apply(&parents, rng)
                .map_err(|e| CdgError::Crossover(Box::new(e)))?;
            self.mutation
                .apply(&mut child, rng)
                .map_err(|e| CdgError::Mutation(Box::new(e)))?;
            offspring.push(child);
        }
        Ok(offspring)
    }
}

/// Mates come from the neighborhood with probability `delta`, provided the
/// neighborhood has more than two members.
pub fn choose_neighbor_type<R: Rng>(neighbors: usize, delta: f64, rng: &mut R) -> NeighborType {
    if rng.random::<f64>() < delta && neighbors > 2 {
        NeighborType::Neighbor
    } else {
        NeighborType::Population
    }
}

/// Draws two mates from the pool selected by `kind`.
///
/// The mates are distinct whenever the pool has two distinct members.
pub fn select_mates<R: Rng>(
    neighbors: &[usize],
    population_size: usize,
    kind: NeighborType,
    rng: &mut R,
) -> [usize; 2] {
    let draw = |rng: &mut R| match kind {
        NeighborType::Neighbor => neighbors[rng.random_range(0..neighbors.len())],
        NeighborType::Population => rng.random_range(0..population_size),
    };

    let first = draw(rng);
    let distinct = match kind {
        NeighborType::Neighbor => neighbors.iter().any(|&j| j != first),
        NeighborType::Population => population_size > 1,
    };
    let mut second = draw(rng);
    while distinct && second == first {
        second = draw(rng);
    }
    [first, second]
}

fn evaluate_one<P: CdgProblem>(
    problem: &P,
    m: usize,
    solution: P::Solution,
) -> Result<Individual<P::Solution>, CdgError> {
    let objectives = problem
        .evaluate(&solution)
        .map_err(|e| CdgError::Evaluation(Box::new(e)))?;
    if objectives.len() != m {
        return Err(CdgError::ObjectiveCount {
            expected: m,
            actual: objectives.len(),
        });
    }
    Ok(Individual::new(solution, objectives))
}

#[cfg(feature = "parallel")]
fn evaluate_all<P: CdgProblem>(
    problem: &P,
    m: usize,
    solutions: Vec<P::Solution>,
    parallel: bool,
) -> Result<Vec<Individual<P::Solution>>, CdgError> {
    use rayon::prelude::*;

    if parallel {
        solutions
            .into_par_iter()
            .map(|s| evaluate_one(problem, m, s))
            .collect()
    } else {
        solutions
            .into_iter()
            .map(|s| evaluate_one(problem, m, s))
            .collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn evaluate_all<P: CdgProblem>(
    problem: &P,
    m: usize,
    solutions: Vec<P::Solution>,
    _parallel: bool,
) -> Result<Vec<Individual<P::Solution>>, CdgError> {
    solutions
        .into_iter()
        .map(|s| evaluate_one(problem, m, s))
        .collect()
}
