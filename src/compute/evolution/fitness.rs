//! Fitness evaluation for glider vehicles.
//!
//! A vehicle's fitness is the absolute glide displacement its drop test
//! reports, minus a penalty for flat shapes.

use glam::DVec3;

use crate::compute::mesh::thinness_ratio;
use crate::compute::{DropTestSimulator, PilotBody, Scene, SimulationError, Simulator, WingMaterial};
use crate::schema::{DropTestConfig, EvolutionConfig, FitnessConfig, Vehicle};

/// Breakdown of one vehicle's score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessReport {
    /// Final score used for ranking.
    pub fitness: f64,
    /// Signed glide displacement, `None` when the simulator was not run.
    pub displacement: Option<f64>,
    /// Smallest over largest bounding-box extent.
    pub thinness_ratio: f64,
    /// Amount subtracted for thinness.
    pub penalty: f64,
    /// True when the vehicle had no surface.
    pub degenerate: bool,
}

impl FitnessReport {
    /// Report carrying only a score.
    pub fn scored(fitness: f64) -> Self {
        Self {
            fitness,
            displacement: None,
            thinness_ratio: 0.0,
            penalty: 0.0,
            degenerate: false,
        }
    }
}

/// Evaluation failures for a single vehicle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("Drop test failed: {0}")]
    Simulation(#[from] SimulationError),
    #[error("Fitness is not finite: {0}")]
    NonFiniteFitness(f64),
}

/// Strategy scoring one vehicle.
///
/// Implementations must not share mutable state between calls; the engine
/// evaluates vehicles in parallel.
pub trait FitnessFunction: Send + Sync {
    fn evaluate(&self, vehicle: &Vehicle) -> Result<FitnessReport, EvaluationError>;
}

impl<F> FitnessFunction for F
where
    F: Fn(&Vehicle) -> Result<FitnessReport, EvaluationError> + Send + Sync,
{
    fn evaluate(&self, vehicle: &Vehicle) -> Result<FitnessReport, EvaluationError> {
        self(vehicle)
    }
}

/// Penalty for a thinness ratio below `threshold`, scaled so that a
/// ratio of zero costs `weight`.
pub fn thinness_penalty(ratio: f64, threshold: f64, weight: f64) -> f64 {
    if threshold > 0.0 && ratio < threshold {
        weight * (threshold - ratio) / threshold
    } else {
        0.0
    }
}

/// Drop-test fitness through a [`Simulator`].
pub struct FitnessEvaluator<S = DropTestSimulator> {
    config: FitnessConfig,
    drop_test: DropTestConfig,
    simulator: S,
}

impl FitnessEvaluator<DropTestSimulator> {
    /// Evaluator backed by the built-in drop test.
    pub fn from_config(config: &EvolutionConfig) -> Self {
        Self::new(
            config.fitness.clone(),
            config.drop_test.clone(),
            DropTestSimulator::new(config.drop_test.clone()),
        )
    }
}

impl<S: Simulator> FitnessEvaluator<S> {
    /// Create a new fitness evaluator.
    pub fn new(config: FitnessConfig, drop_test: DropTestConfig, simulator: S) -> Self {
        Self {
            config,
            drop_test,
            simulator,
        }
    }

    /// The simulator in use.
    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    /// Scene description for a vehicle.
    pub fn scene(&self, vehicle: &Vehicle) -> Scene {
        let pilot = vehicle.pilot.then(|| PilotBody {
            half_extents: DVec3::from_array(self.drop_test.pilot.half_extents),
            mass_kg: self.drop_test.pilot.mass_kg,
            offset: DVec3::from_array(self.drop_test.pilot.offset),
        });

        Scene {
            vertices: vehicle.vertices.clone(),
            faces: vehicle.faces.clone(),
            wing: WingMaterial {
                density: vehicle.wing_density,
                mass_kg: vehicle.mass_kg,
            },
            pilot,
            drop_height_m: self.drop_test.height_m,
            orientation_deg: DVec3::from_array(
                vehicle.orientation.unwrap_or(self.drop_test.orientation_deg),
            ),
        }
    }
}

impl<S: Simulator> FitnessFunction for FitnessEvaluator<S> {
    fn evaluate(&self, vehicle: &Vehicle) -> Result<FitnessReport, EvaluationError> {
        let ratio = thinness_ratio(&vehicle.vertices);

        // Faceless vehicles are scored without a drop test.
        if !vehicle.has_surface() {
            return Ok(FitnessReport {
                fitness: self.config.degenerate_fitness,
                displacement: None,
                thinness_ratio: ratio,
                penalty: 0.0,
                degenerate: true,
            });
        }

        let outcome = self.simulator.drop_test(&self.scene(vehicle))?;
        let displacement = outcome.horizontal_displacement();
        let penalty = thinness_penalty(
            ratio,
            self.config.thinness_threshold,
            self.config.thinness_weight,
        );
        let fitness = displacement.abs() - penalty;

        if !fitness.is_finite() {
            return Err(EvaluationError::NonFiniteFitness(fitness));
        }

        log::trace!(
            "Drop test: displacement={:.4} penalty={:.4} steps={}",
            displacement,
            penalty,
            outcome.steps
        );

        Ok(FitnessReport {
            fitness,
            displacement: Some(displacement),
            thinness_ratio: ratio,
            penalty,
            degenerate: false,
        })
    }
}
