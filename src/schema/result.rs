//! Records produced by an evolution run.

use serde::{Deserialize, Serialize};

use super::Vehicle;

/// Summary of one generation, emitted after it has been ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Zero-based generation index.
    pub generation: usize,
    /// Highest fitness in the generation.
    pub best_fitness: f64,
    /// Arithmetic mean of all fitnesses.
    pub avg_fitness: f64,
    /// Top-ranked vehicle, including its reconstructed faces.
    pub best_vehicle: Vehicle,
    /// Per-vehicle fitness in population order.
    pub population_fitness: Vec<f64>,
    /// Mean pairwise vertex distance of the evaluated population (m).
    #[serde(default)]
    pub diversity: f64,
    /// Evaluations that failed and were scored with the failure fitness.
    #[serde(default)]
    pub failed_evaluations: usize,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Seed the run's generator was created from.
    pub random_seed: u64,
    /// Every generation completed, in order.
    pub generations: Vec<GenerationResult>,
    /// Best fitness over all generations, `None` if none ran.
    pub best_fitness: Option<f64>,
    /// Vehicle evaluations performed.
    pub total_evaluations: u64,
    /// Wall-clock duration (s).
    pub elapsed_seconds: f64,
    /// Why the run ended.
    pub stop_reason: StopReason,
}

impl RunSummary {
    /// Best vehicle seen over the whole run.
    pub fn best_vehicle(&self) -> Option<&Vehicle> {
        self.generations
            .iter()
            .max_by(|a, b| a.best_fitness.total_cmp(&b.best_fitness))
            .map(|g| &g.best_vehicle)
    }
}

/// Reason a run stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// All configured generations ran.
    MaxGenerations,
    /// Cancelled between generations.
    Cancelled,
}

/// Engine state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EvolutionPhase {
    /// Created, no population yet.
    #[default]
    Idle,
    /// Initial random population created.
    Seeded,
    /// Scoring the population.
    Evaluating,
    /// Sorting by fitness.
    Ranking,
    /// Taking survivors.
    Selecting,
    /// Building the next population.
    Repopulating,
    /// All generations done.
    Completed,
    /// Stopped by cancellation.
    Stopped,
}
