// Bus Stop Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/bus-stop-simulator
// ```
//
// Or accelerated, for a fixed time:
//
// ```console
// $ ./target/release/bus-stop-simulator --time-scale 120 --duration-secs 30 --verbose
// ```

use anyhow::Context;
use bus_stop_simulator::simulation::{
    LoggingConfig, LoggingGuard, SimulationOrchestrator, SimulationStatistics,
};
use bus_stop_simulator::types::config::CliArgs;
use bus_stop_simulator::types::SimulationConfig;
use clap::Parser;
use std::process;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // Handle special CLI flags that don't require full initialization
    if args.print_config {
        match SimulationConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    let _logging = match init_logging(&args) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    info!("Starting Bus Stop Simulator");

    let config = match load_config(args.clone()) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    };

    info!("Configuration loaded and validated successfully");

    if args.dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config);
        return;
    }

    print_startup_banner(&config);

    match run_simulation(config).await {
        Ok(statistics) => {
            print_final_statistics(&statistics);
            info!("Bus Stop Simulator completed successfully");
        }
        Err(e) => {
            error!("Simulation failed: {:#}", e);
            process::exit(1);
        }
    }
}

/// Pick the logging preset matching the CLI flags
fn init_logging(args: &CliArgs) -> anyhow::Result<LoggingGuard> {
    let mut logging = if args.debug {
        LoggingConfig::debug()
    } else if args.verbose {
        LoggingConfig::verbose()
    } else {
        // Default: minimal logging for normal users
        LoggingConfig::quiet()
    };
    if args.json_logs {
        logging = logging.with_json_format().without_ansi();
    }
    if let Some(dir) = &args.log_dir {
        logging = logging.with_file_logging(dir.clone());
    }

    Ok(logging.init()?)
}

/// Load configuration from CLI arguments and optional config file, then validate it
fn load_config(args: CliArgs) -> anyhow::Result<SimulationConfig> {
    let config =
        SimulationConfig::from_cli_args(args).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

/// Run until Ctrl-C or the configured duration
async fn run_simulation(config: SimulationConfig) -> anyhow::Result<SimulationStatistics> {
    let orchestrator =
        SimulationOrchestrator::new(config).context("Failed to create orchestrator")?;
    info!(run_id = %orchestrator.run_id(), "Simulation initialized");

    let shutdown = orchestrator.cancellation_token();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Ctrl-C received, no new riders or buses will arrive"),
                    Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
                }
                shutdown.cancel();
            }
        }
    });

    let statistics = orchestrator.run().await.context("Simulation run failed")?;
    let in_flight = orchestrator.in_flight_participants();
    if in_flight > 0 {
        eprintln!("{} participants were still at the stop when the simulation ended.", in_flight);
    }
    Ok(statistics)
}

/// Print startup banner and configuration summary
fn print_startup_banner(config: &SimulationConfig) {
    eprintln!("Bus Stop Simulator");
    eprintln!("==================");
    eprintln!("Riders and buses meet under an all-or-nothing boarding rule");
    eprintln!();

    print_configuration_summary(config);
}

/// Print configuration summary
fn print_configuration_summary(config: &SimulationConfig) {
    eprintln!("Configuration:");
    eprintln!("  Capacity: {}", config.capacity);
    eprintln!("  Mean Rider Inter-Arrival: {:.1}s", config.rider_arrival_mean_ms / 1000.0);
    eprintln!("  Mean Bus Inter-Arrival: {:.1}s", config.bus_arrival_mean_ms / 1000.0);
    eprintln!("  Time Scale: {}x", config.time_scale);
    eprintln!("  Boarding Time: {}ms", config.boarding_time_ms);
    match config.duration_secs {
        Some(seconds) => eprintln!("  Duration: {}s", seconds),
        None => eprintln!("  Duration: until Ctrl-C"),
    }
    if let Some(seed) = config.seed {
        eprintln!("  Random Seed: {}", seed);
    }
    if let Some(path) = &config.event_output {
        eprintln!("  Event Output: {}", path);
    }

    let expected_batch = (config.bus_arrival_mean_ms / config.rider_arrival_mean_ms)
        .min(config.capacity as f64);
    eprintln!("\nEstimated Scale:");
    eprintln!("  Riders per Bus: ~{:.1}", expected_batch);
    eprintln!();
}

/// Print final statistics
fn print_final_statistics(statistics: &SimulationStatistics) {
    eprintln!();
    eprint!("{}", statistics);
}
