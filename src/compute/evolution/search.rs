//! Generational search over glider vehicles.
//!
//! Each generation is evaluated, ranked, and replaced by survivors, mutated
//! clones, optional crossover children and random fill, in that order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::Receiver;
use rayon::prelude::*;

use crate::compute::{SphericalHullSurface, SurfaceBuilder};
use crate::schema::{
    ConfigError, EvolutionConfig, EvolutionPhase, FailurePolicy, GenerationResult, RunSummary,
    StopReason, Vehicle,
};

use super::fitness::{EvaluationError, FitnessEvaluator, FitnessFunction, FitnessReport};
use super::genome::{GenomeError, GenomeRng};
use super::population::Population;

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Genome operation failed: {0}")]
    Genome(#[from] GenomeError),
    #[error("Failed to build evaluation worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Evaluation of vehicle {index} failed: {source}")]
    Evaluation {
        index: usize,
        source: EvaluationError,
    },
}

/// Indices of `fitnesses` from best to worst. Ties keep population order.
pub fn rank_by_fitness(fitnesses: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitnesses.len()).collect();
    order.sort_by(|&a, &b| fitnesses[b].total_cmp(&fitnesses[a]));
    order
}

/// Reconstruct one vehicle's surface and score it.
fn evaluate_vehicle(
    surface: &dyn SurfaceBuilder,
    fitness: &dyn FitnessFunction,
    vehicle: &Vehicle,
) -> (Vehicle, Result<FitnessReport, EvaluationError>) {
    let reconstructed = surface.build(&vehicle.vertices);
    let meshed = Vehicle {
        faces: reconstructed.faces,
        ..vehicle.clone()
    };
    let report = fitness.evaluate(&meshed);
    (meshed, report)
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    seed: u64,
    rng: GenomeRng,
    surface: Box<dyn SurfaceBuilder>,
    fitness: Box<dyn FitnessFunction>,
    pool: Option<rayon::ThreadPool>,
    population: Population,
    generation: usize,
    phase: EvolutionPhase,
    cancelled: Arc<AtomicBool>,
}

impl EvolutionEngine {
    /// Create an engine with the spherical hull surface and the built-in
    /// drop test. The configuration is validated here, before any
    /// simulation runs.
    pub fn new(config: EvolutionConfig) -> Result<Self, EvolutionError> {
        config.validate()?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        let pool = config
            .evaluation
            .workers
            .map(|workers| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
            })
            .transpose()?;
        let fitness = FitnessEvaluator::from_config(&config);

        Ok(Self {
            config,
            seed,
            rng: GenomeRng::new(seed),
            surface: Box::new(SphericalHullSurface::default()),
            fitness: Box::new(fitness),
            pool,
            population: Population::default(),
            generation: 0,
            phase: EvolutionPhase::Idle,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replace the surface reconstruction strategy.
    pub fn with_surface_builder(mut self, surface: impl SurfaceBuilder + 'static) -> Self {
        self.surface = Box::new(surface);
        self
    }

    /// Replace the fitness strategy.
    pub fn with_fitness(mut self, fitness: impl FitnessFunction + 'static) -> Self {
        self.fitness = Box::new(fitness);
        self
    }

    /// Get cancellation handle. Cancellation is honored between generations.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Seed the run's generator was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> EvolutionPhase {
        self.phase
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    fn enter(&mut self, phase: EvolutionPhase) {
        log::debug!("Generation {}: {:?}", self.generation, phase);
        self.phase = phase;
    }

    /// Initialize the population.
    pub fn initialize(&mut self) {
        self.generation = 0;
        self.population = Population::random(
            self.config.population_size,
            &mut self.rng,
            &self.config.vehicle_template(),
        );
        self.enter(EvolutionPhase::Seeded);
    }

    /// Reconstruct and score every vehicle, keeping population order.
    fn evaluate_population(&self) -> Vec<(Vehicle, Result<FitnessReport, EvaluationError>)> {
        let surface = self.surface.as_ref();
        let fitness = self.fitness.as_ref();
        let vehicles = self.population.vehicles();

        let evaluate = || {
            vehicles
                .par_iter()
                .map(|vehicle| evaluate_vehicle(surface, fitness, vehicle))
                .collect::<Vec<_>>()
        };

        match &self.pool {
            Some(pool) => pool.install(evaluate),
            None => evaluate(),
        }
    }

    /// Run a single generation step.
    fn step_generation(&mut self) -> Result<GenerationResult, EvolutionError> {
        self.enter(EvolutionPhase::Evaluating);
        let outcomes = self.evaluate_population();

        let mut vehicles = Vec::with_capacity(outcomes.len());
        let mut fitnesses = Vec::with_capacity(outcomes.len());
        let mut failed_evaluations = 0;

        for (index, (vehicle, report)) in outcomes.into_iter().enumerate() {
            let report = report.and_then(|r| {
                if r.fitness.is_finite() {
                    Ok(r)
                } else {
                    Err(EvaluationError::NonFiniteFitness(r.fitness))
                }
            });

            let fitness = match report {
                Ok(report) => report.fitness,
                Err(source) => match self.config.evaluation.failure_policy {
                    FailurePolicy::Isolate => {
                        log::warn!(
                            "Generation {}: vehicle {} scored {} after failure: {}",
                            self.generation,
                            index,
                            self.config.fitness.failure_fitness,
                            source
                        );
                        failed_evaluations += 1;
                        self.config.fitness.failure_fitness
                    }
                    FailurePolicy::FailFast => {
                        return Err(EvolutionError::Evaluation { index, source });
                    }
                },
            };

            log::trace!("Generation {}: vehicle {} fitness {:.4}", self.generation, index, fitness);
            vehicles.push(vehicle);
            fitnesses.push(fitness);
        }

        self.population = Population::from_vehicles(vehicles);
        let diversity = self.population.diversity();

        self.enter(EvolutionPhase::Ranking);
        let ranking = rank_by_fitness(&fitnesses);

        let best_index = ranking[0];
        let avg_fitness = fitnesses.iter().sum::<f64>() / fitnesses.len() as f64;
        let result = GenerationResult {
            generation: self.generation,
            best_fitness: fitnesses[best_index],
            avg_fitness,
            best_vehicle: self.population.vehicles()[best_index].clone(),
            population_fitness: fitnesses,
            diversity,
            failed_evaluations,
        };

        self.enter(EvolutionPhase::Selecting);
        let plan = self.config.selection_plan();
        let survivors: Vec<Vehicle> = ranking
            .iter()
            .take(plan.survivors)
            .map(|&i| self.population.vehicles()[i].clone())
            .collect();

        self.enter(EvolutionPhase::Repopulating);
        log::debug!(
            "Next population: {} survivors, {} clones, {} crossovers, {} random",
            survivors.len(),
            plan.clones,
            plan.crossovers,
            plan.random
        );

        let mut next = Vec::with_capacity(plan.total());

        for survivor in survivors.iter().cycle().take(plan.clones) {
            next.push(self.rng.clone_mutant(survivor, &self.config.mutation));
        }

        let partners = survivors.iter().cycle().skip(1);
        for (first, second) in survivors.iter().cycle().zip(partners).take(plan.crossovers) {
            let vertices = self.rng.crossover(first, second)?;
            next.push(first.with_vertices(vertices));
        }

        let template = self.config.vehicle_template();
        for _ in 0..plan.random {
            next.push(self.rng.random_vehicle(&template));
        }

        let mut population = survivors;
        population.append(&mut next);
        self.population = Population::from_vehicles(population);
        self.generation += 1;

        Ok(result)
    }

    /// Run evolution, handing each generation's result to `callback`
    /// before the next generation starts.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<RunSummary, EvolutionError>
    where
        F: FnMut(&GenerationResult),
    {
        let start_time = Instant::now();
        log::info!(
            "Evolving {} vehicles for {} generations (seed {})",
            self.config.population_size,
            self.config.num_generations,
            self.seed
        );

        self.initialize();
        let mut generations = Vec::with_capacity(self.config.num_generations);

        let stop_reason = loop {
            if self.generation >= self.config.num_generations {
                break StopReason::MaxGenerations;
            }
            if self.cancelled.load(Ordering::Relaxed) {
                log::warn!("Evolution cancelled before generation {}", self.generation);
                break StopReason::Cancelled;
            }

            let result = self.step_generation()?;
            log::info!(
                "Generation {}: best={:.4} avg={:.4} diversity={:.3} failed={}",
                result.generation,
                result.best_fitness,
                result.avg_fitness,
                result.diversity,
                result.failed_evaluations
            );

            callback(&result);
            generations.push(result);
        };

        self.phase = match stop_reason {
            StopReason::MaxGenerations => EvolutionPhase::Completed,
            StopReason::Cancelled => EvolutionPhase::Stopped,
        };

        let best_fitness = generations
            .iter()
            .map(|g| g.best_fitness)
            .reduce(f64::max);

        Ok(RunSummary {
            random_seed: self.seed,
            total_evaluations: (generations.len() * self.config.population_size) as u64,
            generations,
            best_fitness,
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
            stop_reason,
        })
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> Result<RunSummary, EvolutionError> {
        self.run_with_callback(|_| {})
    }

    /// Run on a background thread, streaming results in generation order.
    ///
    /// The channel has no buffer: generation `i + 1` starts only after the
    /// consumer has taken generation `i`. Dropping the stream's receiver
    /// (for example via [`GenerationStream::join`]) cancels the run at the
    /// next generation boundary.
    pub fn spawn(mut self) -> GenerationStream {
        let (sender, receiver) = crossbeam_channel::bounded(0);
        let cancel = self.cancel_handle();

        let handle = std::thread::spawn(move || {
            let cancelled = self.cancel_handle();
            self.run_with_callback(|result| {
                if sender.send(result.clone()).is_err() {
                    cancelled.store(true, Ordering::Relaxed);
                }
            })
        });

        GenerationStream {
            receiver,
            handle,
            cancel,
        }
    }
}

/// Ordered stream of generation results from a spawned engine.
pub struct GenerationStream {
    receiver: Receiver<GenerationResult>,
    handle: JoinHandle<Result<RunSummary, EvolutionError>>,
    cancel: Arc<AtomicBool>,
}

impl GenerationStream {
    /// Next result, or `None` once the run has finished.
    pub fn recv(&self) -> Option<GenerationResult> {
        self.receiver.recv().ok()
    }

    /// Blocking iterator over the remaining results.
    pub fn iter(&self) -> impl Iterator<Item = GenerationResult> + '_ {
        self.receiver.iter()
    }

    /// Request cancellation at the next generation boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Stop consuming and wait for the run to end.
    pub fn join(self) -> Result<RunSummary, EvolutionError> {
        drop(self.receiver);
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
