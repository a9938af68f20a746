//! Glider evolution - Genetic search for gliding vertex-cloud shapes.
//!
//! Each vehicle is a cloud of vertices. Its surface is reconstructed with a
//! spherical hull, it is dropped from a fixed height, and it is scored by how
//! far it travels horizontally before touching the ground.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, vehicle and result types
//! - `compute`: Convex hull, surface reconstruction, drop test and evolution
//!
//! # Example
//!
//! ```rust,no_run
//! use glider_evolution::{EvolutionConfig, EvolutionEngine};
//!
//! let config = EvolutionConfig {
//!     population_size: 10,
//!     num_generations: 3,
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut engine = EvolutionEngine::new(config)?;
//! let summary = engine.run()?;
//!
//! for result in &summary.generations {
//!     println!("Generation {}: best={:.3}", result.generation, result.best_fitness);
//! }
//! # Ok::<(), glider_evolution::compute::evolution::EvolutionError>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EvolutionEngine, RunArchive};
pub use compute::{SphericalHullSurface, Surface, SurfaceBuilder};
pub use schema::{EvolutionConfig, GenerationResult, RunSummary, Vehicle};
