//! Configuration types for glider evolution runs.

use serde::{Deserialize, Serialize};

use super::VehicleTemplate;

/// Wing density used when a run does not override it (kg/m^3).
pub const DEFAULT_WING_DENSITY: f64 = 23.0;

/// Slack added before flooring weighted counts so that products like
/// `10 * 0.3` do not land one below the intended integer.
const COUNT_EPSILON: f64 = 1e-9;

/// Top-level configuration for an evolution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Number of vehicles per generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Number of generations to run.
    #[serde(default = "default_num_generations")]
    pub num_generations: usize,
    /// Fraction of the population kept unchanged.
    #[serde(default = "default_survival_weight")]
    pub survival_weight: f64,
    /// Fraction of the population produced by mutating survivors.
    #[serde(default = "default_cloning_weight")]
    pub cloning_weight: f64,
    /// Fraction of the population produced by crossing survivors.
    #[serde(default)]
    pub crossover_weight: f64,
    /// Bounding envelope for random vertices and mutation magnitude (m).
    #[serde(default = "default_max_dim_m")]
    pub max_dim_m: f64,
    /// Attach the pilot body to every vehicle.
    #[serde(default)]
    pub pilot: bool,
    /// Wing mass override (kg).
    #[serde(default)]
    pub mass_kg: Option<f64>,
    /// Wing density override (kg/m^3).
    #[serde(default)]
    pub wing_density: Option<f64>,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Vertices per genome.
    #[serde(default = "default_num_genes")]
    pub num_genes: usize,
    /// Mutation operator settings.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Fitness shaping settings.
    #[serde(default)]
    pub fitness: FitnessConfig,
    /// Drop test physics settings.
    #[serde(default)]
    pub drop_test: DropTestConfig,
    /// Evaluation scheduling settings.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            num_generations: default_num_generations(),
            survival_weight: default_survival_weight(),
            cloning_weight: default_cloning_weight(),
            crossover_weight: 0.0,
            max_dim_m: default_max_dim_m(),
            pilot: false,
            mass_kg: None,
            wing_density: None,
            random_seed: None,
            num_genes: default_num_genes(),
            mutation: MutationConfig::default(),
            fitness: FitnessConfig::default(),
            drop_test: DropTestConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

fn default_population_size() -> usize {
    100
}
fn default_num_generations() -> usize {
    10
}
fn default_survival_weight() -> f64 {
    0.3
}
fn default_cloning_weight() -> f64 {
    0.4
}
fn default_max_dim_m() -> f64 {
    4.5
}
fn default_num_genes() -> usize {
    12
}

/// Mutation operator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Probability that a given vertex is perturbed.
    #[serde(default = "default_mutation_chance")]
    pub chance: f64,
    /// Perturbation magnitude as a fraction of `max_dim_m`.
    #[serde(default = "default_mutation_ratio")]
    pub ratio: f64,
    /// Shape of the perturbation.
    #[serde(default)]
    pub distribution: MutationDistribution,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            chance: default_mutation_chance(),
            ratio: default_mutation_ratio(),
            distribution: MutationDistribution::default(),
        }
    }
}

fn default_mutation_chance() -> f64 {
    0.15
}
fn default_mutation_ratio() -> f64 {
    0.05
}

/// Distribution of per-coordinate perturbations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MutationDistribution {
    /// Uniform in `[-ratio * max_dim_m, ratio * max_dim_m]`.
    #[default]
    Uniform,
    /// Normal with standard deviation `ratio * max_dim_m`.
    Gaussian,
}

/// Fitness shaping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessConfig {
    /// Thinness ratio below which the penalty applies.
    #[serde(default = "default_thinness_threshold")]
    pub thinness_threshold: f64,
    /// Penalty at a thinness ratio of zero.
    #[serde(default = "default_thinness_weight")]
    pub thinness_weight: f64,
    /// Fitness assigned to vehicles without a surface.
    #[serde(default)]
    pub degenerate_fitness: f64,
    /// Fitness assigned to isolated evaluation failures.
    #[serde(default)]
    pub failure_fitness: f64,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            thinness_threshold: default_thinness_threshold(),
            thinness_weight: default_thinness_weight(),
            degenerate_fitness: 0.0,
            failure_fitness: 0.0,
        }
    }
}

fn default_thinness_threshold() -> f64 {
    0.15
}
fn default_thinness_weight() -> f64 {
    2.0
}

/// Drop test physics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTestConfig {
    /// Release height of the wing reference point (m).
    #[serde(default = "default_drop_height")]
    pub height_m: f64,
    /// Integration time step (s).
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    /// Step budget before a drop counts as non-converged.
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
    /// Gravitational acceleration (m/s^2).
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    /// Air density (kg/m^3).
    #[serde(default = "default_air_density")]
    pub air_density: f64,
    /// Dynamic viscosity of air (Pa s).
    #[serde(default = "default_air_viscosity")]
    pub air_viscosity: f64,
    /// Euler angles (degrees, XYZ) for vehicles without their own orientation.
    #[serde(default)]
    pub orientation_deg: [f64; 3],
    /// Pilot body attached when a vehicle has `pilot` set.
    #[serde(default)]
    pub pilot: PilotConfig,
}

impl Default for DropTestConfig {
    fn default() -> Self {
        Self {
            height_m: default_drop_height(),
            time_step: default_time_step(),
            max_steps: default_max_steps(),
            gravity: default_gravity(),
            air_density: default_air_density(),
            air_viscosity: default_air_viscosity(),
            orientation_deg: [0.0; 3],
            pilot: PilotConfig::default(),
        }
    }
}

fn default_drop_height() -> f64 {
    50.0
}
fn default_time_step() -> f64 {
    0.01
}
fn default_max_steps() -> u64 {
    20_000
}
fn default_gravity() -> f64 {
    9.81
}
fn default_air_density() -> f64 {
    1.2
}
fn default_air_viscosity() -> f64 {
    0.00002
}

/// Pilot body: a box rigidly attached to the wing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PilotConfig {
    /// Box half extents (m).
    #[serde(default = "default_pilot_half_extents")]
    pub half_extents: [f64; 3],
    /// Pilot mass (kg).
    #[serde(default = "default_pilot_mass")]
    pub mass_kg: f64,
    /// Box center relative to the wing reference point (m).
    #[serde(default = "default_pilot_offset")]
    pub offset: [f64; 3],
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            half_extents: default_pilot_half_extents(),
            mass_kg: default_pilot_mass(),
            offset: default_pilot_offset(),
        }
    }
}

fn default_pilot_half_extents() -> [f64; 3] {
    [1.8, 0.3, 0.6]
}
fn default_pilot_mass() -> f64 {
    68.0
}
fn default_pilot_offset() -> [f64; 3] {
    [0.0, 0.0, -0.3]
}

/// How the population is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EvaluationConfig {
    /// Worker threads for fitness evaluation. `None` uses the global pool.
    #[serde(default)]
    pub workers: Option<usize>,
    /// What to do when one vehicle's evaluation fails.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// Handling of a failed evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FailurePolicy {
    /// Score the vehicle with `failure_fitness` and keep going.
    #[default]
    Isolate,
    /// Abort the run.
    FailFast,
}

/// Number of vehicles each repopulation source contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPlan {
    pub survivors: usize,
    pub clones: usize,
    pub crossovers: usize,
    pub random: usize,
}

impl SelectionPlan {
    /// Total vehicles in the next population.
    pub fn total(&self) -> usize {
        self.survivors + self.clones + self.crossovers + self.random
    }
}

impl EvolutionConfig {
    /// Count of vehicles for a population fraction, rounded down.
    fn weighted_count(&self, weight: f64) -> usize {
        (self.population_size as f64 * weight + COUNT_EPSILON).floor() as usize
    }

    /// Split of the next population between survivors, clones, crossover
    /// children and random fill. The fill takes whatever the floored
    /// weighted counts leave, so the total is always `population_size`.
    pub fn selection_plan(&self) -> SelectionPlan {
        let survivors = self.weighted_count(self.survival_weight);
        let clones = self.weighted_count(self.cloning_weight);
        let crossovers = self.weighted_count(self.crossover_weight);
        let random = self
            .population_size
            .saturating_sub(survivors + clones + crossovers);

        SelectionPlan {
            survivors,
            clones,
            crossovers,
            random,
        }
    }

    /// Wing density used for new vehicles.
    pub fn effective_wing_density(&self) -> f64 {
        self.wing_density.unwrap_or(DEFAULT_WING_DENSITY)
    }

    /// Attributes shared by every randomly created vehicle.
    pub fn vehicle_template(&self) -> VehicleTemplate {
        VehicleTemplate {
            num_vertices: self.num_genes,
            max_dim_m: self.max_dim_m,
            mass_kg: self.mass_kg,
            wing_density: self.effective_wing_density(),
            pilot: self.pilot,
        }
    }

    /// Validate the configuration. Called before any simulation runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::PopulationTooSmall);
        }

        for (name, weight) in [
            ("survival_weight", self.survival_weight),
            ("cloning_weight", self.cloning_weight),
            ("crossover_weight", self.crossover_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::WeightOutOfRange { name, weight });
            }
        }

        let total = self.survival_weight + self.cloning_weight + self.crossover_weight;
        if total > 1.0 + COUNT_EPSILON {
            return Err(ConfigError::WeightsExceedOne(total));
        }

        let plan = self.selection_plan();
        if plan.survivors == 0 && (self.cloning_weight > 0.0 || self.crossover_weight > 0.0) {
            return Err(ConfigError::NoSurvivors);
        }

        check_positive("max_dim_m", self.max_dim_m)?;
        if let Some(density) = self.wing_density {
            check_positive("wing_density", density)?;
        }
        if let Some(mass) = self.mass_kg {
            check_positive("mass_kg", mass)?;
        }

        if !(0.0..=1.0).contains(&self.mutation.chance) {
            return Err(ConfigError::WeightOutOfRange {
                name: "mutation.chance",
                weight: self.mutation.chance,
            });
        }
        if !(self.mutation.ratio >= 0.0) {
            return Err(ConfigError::NonPositive {
                name: "mutation.ratio",
                value: self.mutation.ratio,
            });
        }
        if !(self.fitness.thinness_threshold >= 0.0) {
            return Err(ConfigError::NonPositive {
                name: "fitness.thinness_threshold",
                value: self.fitness.thinness_threshold,
            });
        }

        check_positive("drop_test.height_m", self.drop_test.height_m)?;
        check_positive("drop_test.time_step", self.drop_test.time_step)?;
        if self.drop_test.max_steps == 0 {
            return Err(ConfigError::ZeroMaxSteps);
        }
        if self.pilot {
            check_positive("drop_test.pilot.mass_kg", self.drop_test.pilot.mass_kg)?;
        }

        if self.evaluation.workers == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }

        Ok(())
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Population size must be at least 1")]
    PopulationTooSmall,
    #[error("{name} must lie in [0, 1], got {weight}")]
    WeightOutOfRange { name: &'static str, weight: f64 },
    #[error("Survival, cloning and crossover weights sum to {0}, which exceeds 1")]
    WeightsExceedOne(f64),
    #[error("Cloning or crossover requested but no vehicle survives selection")]
    NoSurvivors,
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("Drop test step budget must be non-zero")]
    ZeroMaxSteps,
    #[error("Worker pool size must be non-zero")]
    ZeroWorkers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = EvolutionConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weights_exceeding_one_rejected() {
        let config = EvolutionConfig {
            survival_weight: 0.6,
            cloning_weight: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightsExceedOne(_))
        ));
    }

    #[test]
    fn test_no_survivors_with_cloning_rejected() {
        let config = EvolutionConfig {
            population_size: 3,
            survival_weight: 0.2,
            cloning_weight: 0.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoSurvivors));

        let no_cloning = EvolutionConfig {
            cloning_weight: 0.0,
            ..config
        };
        assert!(no_cloning.validate().is_ok());
    }

    #[test]
    fn test_selection_plan_fills_population() {
        let config = EvolutionConfig {
            population_size: 5,
            survival_weight: 0.3,
            cloning_weight: 0.4,
            ..Default::default()
        };
        let plan = config.selection_plan();
        assert_eq!(plan.survivors, 1);
        assert_eq!(plan.clones, 2);
        assert_eq!(plan.crossovers, 0);
        assert_eq!(plan.random, 2);
        assert_eq!(plan.total(), 5);
    }

    #[test]
    fn test_selection_plan_exact_products() {
        let config = EvolutionConfig {
            population_size: 10,
            survival_weight: 0.3,
            cloning_weight: 0.7,
            ..Default::default()
        };
        let plan = config.selection_plan();
        assert_eq!(plan.survivors, 3);
        assert_eq!(plan.clones, 7);
        assert_eq!(plan.random, 0);
    }

    #[test]
    fn test_invalid_physics_rejected() {
        let mut config = EvolutionConfig::default();
        config.drop_test.max_steps = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxSteps));

        let mut config = EvolutionConfig::default();
        config.drop_test.time_step = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { .. })
        ));

        let config = EvolutionConfig {
            evaluation: EvaluationConfig {
                workers: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroWorkers));
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{"population_size": 5, "num_generations": 2, "pilot": true}"#;
        let config: EvolutionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.population_size, 5);
        assert_eq!(config.num_generations, 2);
        assert!(config.pilot);
        assert_eq!(config.num_genes, 12);
        assert_eq!(config.mutation, MutationConfig::default());
        assert_eq!(config.effective_wing_density(), DEFAULT_WING_DENSITY);
    }

    #[test]
    fn test_serialization() {
        let config = EvolutionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EvolutionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
