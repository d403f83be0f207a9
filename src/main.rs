use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

mod analysis;
mod cli;
mod commands;
mod config;
mod context;
mod dataset;
mod error;
mod evaluation;
mod generator;
mod model;
mod personality;
mod simulation;
mod store;
mod student;
mod summary;

use cli::{Cli, Commands};
use config::{Config, LogLevel};

fn setup_logging(log_level: &LogLevel) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studentsim")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("studentsim.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG env var takes precedence, otherwise use config log_level
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(match log_level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        });
    }

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    info!(
        "Log level: {} (from {})",
        log_level.as_filter(),
        if std::env::var("RUST_LOG").is_ok() { "RUST_LOG env" } else { "config" }
    );
    Ok(())
}

fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Run {
            personas,
            from,
            to,
            daily,
        } => commands::run::run(personas, from, to, daily, cli.quiet, &config),
        Commands::Traits { action } => commands::traits::run(action, &config),
        Commands::History { action } => commands::history::run(action, &config),
        Commands::Summary { persona } => commands::summary::run(&persona, &config),
        Commands::Doctor => commands::doctor::run(&config),
        Commands::Config { action } => commands::config::run(action, &config),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    // Load configuration (before logging, so log messages in Config::load are silent)
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if cli.verbose && config.log_level != LogLevel::Trace {
        config.log_level = LogLevel::Debug;
    }

    // Setup logging with log level from config (or RUST_LOG env var)
    setup_logging(&config.log_level).context("Failed to setup logging")?;

    info!("Starting studentsim with config from: {:?}", cli.config);

    run(cli, config).context("Command failed")?;

    Ok(())
}
