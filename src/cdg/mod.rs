//! Constrained decomposition with grids (CDG).
//!
//! A multi-objective evolutionary algorithm that partitions the objective
//! space between the ideal and nadir points into a grid, ranks every
//! individual inside one sub-problem per objective, and keeps the extreme
//! ("special") individuals of the front unconditionally.
//!
//! Users define their problem by implementing [`CdgProblem`] and supply a
//! [`CrossoverOperator`] and a [`MutationOperator`] for its solution type.
//!
//! # Key Types
//!
//! - [`CdgConfig`]: Algorithm parameters and validation
//! - [`CdgEngine`]: Executes the generational loop
//! - [`CdgResult`]: Final population and run statistics
//! - [`GenerationContext`]: Per-generation state, observable between steps
//!
//! # Pipeline Stages
//!
//! - [`grid`]: Ranking grid and child-grid cell indexing
//! - [`neighborhood`]: Mating neighborhoods
//! - [`reference`]: Ideal and nadir points
//! - [`border`]: Border of the feasible region (three objectives)
//! - [`feasibility`]: Infeasible-individual filters and resupply
//! - [`selection`]: Grid-rank environmental selection
//! - [`multi_objective`]: Non-dominated sorting and Pareto dominance
//!
//! # References
//!
//! - Cai, Mei, Hu & Fan (2018), "A Constrained Decomposition Approach With
//!   Grids for Evolutionary Multiobjective Optimization"

pub mod border;
mod config;
mod error;
pub mod feasibility;
pub mod grid;
pub mod multi_objective;
pub mod neighborhood;
pub mod reference;
mod runner;
pub mod selection;
mod types;

pub use config::{CdgConfig, GridStrategy};
pub use error::{BoxError, CdgError, ConfigError, OperatorError};
pub use runner::{
    choose_neighbor_type, select_mates, CdgEngine, CdgResult, GenerationContext, NeighborType,
};
pub use types::{CdgProblem, CrossoverOperator, Individual, MutationOperator, NoMutation};
