//! Grid-based constrained-decomposition multi-objective optimization.
//!
//! Provides a generic implementation of the CDG evolutionary algorithm and
//! the pieces needed to run it on continuous problems:
//!
//! - **CDG engine** ([`cdg`]): Grid ranking, neighborhood mating, border
//!   and nadir feasibility filtering, and special-population protection.
//!   The user implements only [`cdg::CdgProblem`] and picks operators.
//! - **Operators** ([`operators`]): Differential evolution crossover and
//!   polynomial mutation for `Vec<f64>` decision vectors.
//! - **Problems** ([`problems`]): ZDT1 and DTLZ2 benchmark problems.
//!
//! # Architecture
//!
//! This crate sits at Layer 2 (Algorithms) in the U-Engine ecosystem,
//! depending only on `u-numflow` (Layer 1: Foundation) for random number
//! generation. It contains no domain-specific concepts; problems and
//! operators are supplied by consumers.
//!
//! # Features
//!
//! - `parallel`: evaluates each generation's offspring with rayon
//! - `serde`: `Serialize`/`Deserialize` for configurations and individuals

pub mod cdg;
pub mod operators;
pub mod problems;
