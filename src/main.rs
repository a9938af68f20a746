//! Glider evolution CLI - Run an evolution from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;

use glider_evolution::{EvolutionConfig, EvolutionEngine, RunArchive, schema::StopReason};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [archive_dir]", args[0]);
        eprintln!();
        eprintln!("Evolve glider shapes from a JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to evolution configuration file");
        eprintln!("  archive_dir  Directory to write generation records to");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let archive_dir = args.get(2).map(PathBuf::from);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: EvolutionConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let archive = archive_dir.map(|dir| {
        RunArchive::create(&dir).unwrap_or_else(|e| {
            eprintln!("Error creating archive in {}: {}", dir.display(), e);
            std::process::exit(1);
        })
    });

    println!("Glider Evolution");
    println!("================");
    println!("Population: {}", config.population_size);
    println!("Generations: {}", config.num_generations);
    println!("Vertices per vehicle: {}", config.num_genes);
    println!(
        "Weights: survival={} cloning={} crossover={}",
        config.survival_weight, config.cloning_weight, config.crossover_weight
    );
    println!();

    let mut engine = EvolutionEngine::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    println!("Seed: {}", engine.seed());
    println!();

    let summary = engine
        .run_with_callback(|result| {
            println!(
                "  Generation {}: best={:.4} avg={:.4} diversity={:.3} failed={}",
                result.generation,
                result.best_fitness,
                result.avg_fitness,
                result.diversity,
                result.failed_evaluations
            );
            if let Some(archive) = &archive
                && let Err(e) = archive.record_generation(result)
            {
                log::error!("Failed to archive generation {}: {}", result.generation, e);
            }
        })
        .unwrap_or_else(|e| {
            eprintln!("Evolution failed: {}", e);
            std::process::exit(1);
        });

    if let Some(archive) = &archive {
        match archive.record_summary(&summary) {
            Ok(path) => println!("\nSummary written to {}", path.display()),
            Err(e) => eprintln!("Error writing summary: {}", e),
        }
    }

    println!();
    match summary.best_fitness {
        Some(best) => println!("Best fitness: {:.4}", best),
        None => println!("No generations completed"),
    }
    if summary.stop_reason == StopReason::Cancelled {
        println!("Run was cancelled");
    }
    println!(
        "Evaluations: {} in {:.2}s",
        summary.total_evaluations, summary.elapsed_seconds
    );
}

fn print_example_config() {
    let config = EvolutionConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
