mod clock;
mod config;
mod error;
mod mailer;
mod predict;
mod scheduler;
mod service;
mod tracker;
mod web;

use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::mailer::LogTransport;
use crate::predict::{Satellite, Sgp4Propagator};
use crate::scheduler::SqliteStore;
use crate::service::{PassService, ServiceSettings};

#[derive(Parser)]
#[command(name = "pass-o-mat")]
#[command(about = "Visible satellite pass prediction and reminders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and the reminder dispatcher
    Serve {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// List visible passes over a location
    Passes {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Two- or three-line TLE file; defaults to the built-in ISS elements
        #[arg(long)]
        tle_file: Option<String>,
    },
    /// Print the current subpoint and ground track
    Locate {
        #[arg(long)]
        tle_file: Option<String>,
    },
    /// Deliver due reminders
    Dispatch {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
        /// Run a single tick instead of looping until interrupted
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config).await,
        Commands::Passes { lat, lng, tle_file } => passes(lat, lng, tle_file.as_deref()),
        Commands::Locate { tle_file } => locate(tle_file.as_deref()),
        Commands::Dispatch { config, once } => dispatch(&config, once).await,
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            None
        }
    }
}

fn load_satellite(tle_file: Option<&str>) -> Option<Satellite> {
    let result = match tle_file {
        Some(path) => match fs::read_to_string(path) {
            Ok(tle) => Satellite::parse(&tle).map_err(|e| e.to_string()),
            Err(e) => Err(format!("Error reading file: {}", e)),
        },
        None => Config::default()
            .default_satellite()
            .map_err(|e| e.to_string()),
    };
    result
        .map_err(|e| eprintln!("Invalid TLE: {}", e))
        .ok()
}

/// Service for one-shot queries that never touch a notification store on
/// disk.
fn offline_service() -> Option<PassService> {
    match SqliteStore::open_in_memory() {
        Ok(store) => Some(PassService::new(
            Arc::new(Sgp4Propagator::default()),
            Arc::new(store),
            Arc::new(LogTransport),
            Arc::new(SystemClock),
            ServiceSettings::default(),
        )),
        Err(e) => {
            eprintln!("Error opening store: {}", e);
            None
        }
    }
}

async fn serve(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let default_satellite = match config.default_satellite() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let service = match PassService::from_config(&config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Error starting service: {}", e);
            return ExitCode::FAILURE;
        }
    };

    service.init();
    let state = web::AppState::new(service.clone(), default_satellite);
    let result = web::run_server(&config.web.bind, state, shutdown_signal()).await;
    service.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn passes(lat: f64, lng: f64, tle_file: Option<&str>) -> ExitCode {
    let (Some(satellite), Some(service)) = (load_satellite(tle_file), offline_service()) else {
        return ExitCode::FAILURE;
    };

    match service.find_visible_passes(&satellite, lat, lng) {
        Ok(passes) => {
            println!("{} visible passes of {}", passes.len(), satellite.name());
            for (i, pass) in passes.iter().enumerate() {
                println!(
                    "  {}: rise {} / max {:.1}° at {} / set {} ({:.1} min, {})",
                    i + 1,
                    pass.rise_time().format("%Y-%m-%d %H:%M:%S"),
                    pass.max_elevation_deg(),
                    pass.culmination_time().format("%H:%M:%S"),
                    pass.set_time().format("%H:%M:%S"),
                    pass.duration_minutes(),
                    pass.visibility()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Prediction failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn locate(tle_file: Option<&str>) -> ExitCode {
    let (Some(satellite), Some(service)) = (load_satellite(tle_file), offline_service()) else {
        return ExitCode::FAILURE;
    };

    match service.current_location(&satellite) {
        Ok(location) => match serde_json::to_string_pretty(&location) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error encoding location: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Propagation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(path: &str, once: bool) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let service = match PassService::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error starting service: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if once {
        return match service.dispatch_once().await {
            Ok(report) => {
                println!(
                    "{} due, {} sent, {} failed, {} not updated",
                    report.due, report.sent, report.failed, report.update_errors
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Dispatch failed: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    service.init();
    shutdown_signal().await;
    service.shutdown().await;
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
