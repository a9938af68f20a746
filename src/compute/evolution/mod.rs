//! Evolutionary search over glider vehicles.
//!
//! # Overview
//!
//! - **Genome Operations** (`genome`): Random vertex clouds, mutation and crossover
//! - **Population** (`population`): Ordered vehicle collection and diversity
//! - **Fitness** (`fitness`): Drop-test displacement with a thinness penalty
//! - **Search** (`search`): The generational engine and result streaming
//! - **Run Archive** (`archive`): JSON records of generations and summaries
//!
//! # Example
//!
//! ```rust,no_run
//! use glider_evolution::schema::EvolutionConfig;
//! use glider_evolution::compute::evolution::{EvolutionEngine, RunArchive};
//!
//! let config = EvolutionConfig {
//!     population_size: 20,
//!     num_generations: 5,
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let archive = RunArchive::create("runs/latest")?;
//! let mut engine = EvolutionEngine::new(config)?;
//! let summary = engine.run_with_callback(|result| {
//!     println!("Generation {}: best fitness = {:.3}",
//!         result.generation, result.best_fitness);
//!     let _ = archive.record_generation(result);
//! })?;
//!
//! println!("Best fitness: {:?}", summary.best_fitness);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Next population
//!
//! Survivors come first, best first, followed by mutated clones of the
//! survivors, crossover children of adjacent survivors, and random vehicles
//! filling the remainder.

mod archive;
mod fitness;
mod genome;
mod population;
mod search;

pub use archive::RunArchive;
pub use fitness::{
    EvaluationError, FitnessEvaluator, FitnessFunction, FitnessReport, thinness_penalty,
};
pub use genome::{GenomeError, GenomeRng, vertex_distance};
pub use population::Population;
pub use search::{EvolutionEngine, EvolutionError, GenerationStream, rank_by_fitness};
