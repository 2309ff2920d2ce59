mod cli;
mod config;
mod location;
mod logger;
mod map;
mod model;
mod navigator;
mod tui;

use std::process;

use clap::Parser;
use tokio::runtime::Runtime;

use cli::Cli;
use config::Config;

fn main() {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    if let Some(route) = cli.route {
        config.initial_route = route;
    }

    let runtime = match Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Some(command) => {
            logger::init_cli_logger(cli.verbose);
            cli::run(command, &config, &runtime)
        }
        None => run_tui(&config, cli.verbose, &runtime),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_tui(config: &Config, verbose: bool, runtime: &Runtime) -> Result<(), String> {
    if let Some(path) = config.log_file() {
        logger::init_file_logger(&path, verbose)
            .map_err(|e| format!("failed to open log {}: {e}", path.display()))?;
    }
    tracing::info!(route = %config.initial_route, "starting");

    let app = tui::App::new(config, runtime.handle().clone()).map_err(|e| e.to_string())?;
    tui::run(app).map_err(|e| e.to_string())
}
