//! Quick evolution performance test

use glider_evolution::{
    EvolutionConfig, EvolutionEngine,
    schema::{DropTestConfig, EvaluationConfig},
};
use std::time::Instant;

fn main() {
    println!("=== Evolution Performance Test ===\n");

    // Test different vertex counts
    for num_genes in [8, 12, 24] {
        println!("Vertices per vehicle: {}", num_genes);

        let config = EvolutionConfig {
            population_size: 20,
            num_generations: 5,
            num_genes,
            drop_test: DropTestConfig {
                height_m: 20.0,
                ..Default::default()
            },
            random_seed: Some(42),
            ..Default::default()
        };

        let start = Instant::now();
        let summary = match EvolutionEngine::new(config).and_then(|mut e| e.run()) {
            Ok(summary) => summary,
            Err(e) => {
                eprintln!("  Failed: {}", e);
                continue;
            }
        };
        let elapsed = start.elapsed();

        let evals_per_sec = summary.total_evaluations as f64 / elapsed.as_secs_f64();
        let failed: usize = summary
            .generations
            .iter()
            .map(|g| g.failed_evaluations)
            .sum();

        println!("  Generations:    {}", summary.generations.len());
        println!("  Evaluations:    {}", summary.total_evaluations);
        println!("  Failed:         {}", failed);
        println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
        println!("  Evals/sec:      {:.1}", evals_per_sec);
        println!("  Best fitness:   {:.4}", summary.best_fitness.unwrap_or(0.0));
        println!();
    }

    println!("=== Worker Scaling (population 40, 12 vertices) ===\n");

    for workers in [1, 2, 4, 8] {
        let config = EvolutionConfig {
            population_size: 40,
            num_generations: 3,
            evaluation: EvaluationConfig {
                workers: Some(workers),
                ..Default::default()
            },
            random_seed: Some(42),
            ..Default::default()
        };

        let start = Instant::now();
        let summary = match EvolutionEngine::new(config).and_then(|mut e| e.run()) {
            Ok(summary) => summary,
            Err(e) => {
                eprintln!("Workers {}: failed: {}", workers, e);
                continue;
            }
        };
        let elapsed = start.elapsed();

        println!(
            "Workers {}: {} evals in {:.2}s ({:.1} evals/sec)",
            workers,
            summary.total_evaluations,
            elapsed.as_secs_f64(),
            summary.total_evaluations as f64 / elapsed.as_secs_f64()
        );
    }
}
