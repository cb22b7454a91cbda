//! # Netic - Pareto-optimal gene interaction subnetworks
//!
//! A multi-objective evolutionary search for small gene interaction
//! subnetworks that explain observed evidence (mutations, differential
//! expression) across many experimental conditions.
//!
//! ## Overview
//!
//! Candidate paths through a weighted gene network are found and compiled
//! into probabilistic circuits (smooth d-DNNF) by earlier pipeline stages.
//! This crate loads those artifacts and runs NSGA-II over subnetworks built
//! from the paths. A subnetwork is scored by weighted model counting: every
//! circuit is evaluated under the interactions the subnetwork contains,
//! giving the probability that it covers the evidence of that circuit's
//! condition.
//!
//! ## Features
//!
//! - **Circuit evaluation**: single bottom-up pass over an index-ordered arena
//! - **NSGA-II**: fast non-dominated sorting, crowding distance, binary
//!   tournaments and path-level crossover
//! - **Adaptive network size**: child sizes follow the best part of the
//!   population inside a focus range
//! - **Hypervolume stopping**: sliding-window progress checks against the
//!   first front's hypervolume, computed in-process or by the WFG tools
//! - **Checkpoints**: every generation is written so runs can resume
//! - **Parallel scoring**: one rayon task per subnetwork, reproducible for a
//!   fixed seed
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netic_core::{config::OptimizerConfig, MultiObjectiveRunner};
//!
//! let config = OptimizerConfig {
//!     output_folder: "run1".into(),
//!     seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let results = MultiObjectiveRunner::new(config)?.run()?;
//! println!(
//!     "{} networks, best hypervolume {}",
//!     results.networks.len(),
//!     results.best_hypervolume()
//! );
//! # Ok::<(), netic_core::types::NeticError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`config`]: Run options and artifact locations
//! - [`engine`]: Input loading and the complete optimization run
//! - [`types`]: Packed identifiers, score formatting and errors
//! - [`results`]: Outcome of a run
//! - [`interaction_store`]: Gene and interaction type indexes
//! - [`path`]: Candidate paths and their index
//! - [`circuit`]: Compiled circuits and their evaluation
//! - [`subnetwork`]: Candidate solutions
//! - [`objective`]: Fitness functions and dominance
//! - [`optimizer`]: The NSGA-II loop, size control and checkpoints
//! - [`hypervolume`]: Front hypervolumes
//! - [`output`]: Result files
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, NeticError>`](types::NeticError).
//! Errors for which [`NeticError::is_fatal`](types::NeticError::is_fatal)
//! holds (corrupt checkpoints, duplicate path ids, failed writes) mean the
//! run must stop; the others report bad input or options.

pub mod circuit;
pub mod config;
pub mod engine;
pub mod hypervolume;
pub mod interaction_store;
pub mod objective;
pub mod optimizer;
pub mod output;
pub mod path;
pub mod results;
pub mod subnetwork;
pub mod types;

pub use engine::MultiObjectiveRunner;
pub use optimizer::NsgaOptimizer;
pub use results::OptimizationResults;
