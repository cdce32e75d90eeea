//! Process configuration checker.
//!
//! Loads a `.mapchete` document with the built-in drivers and prints what
//! a process would see at every initialized zoom level.

mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use process_config::{Configuration, DriverRegistry, InitOptions};
use report::ConfigReport;

#[derive(Parser, Debug)]
#[command(name = "config-check")]
#[command(about = "Validate a process configuration and print it per zoom level")]
struct Args {
    /// Path to the .mapchete document
    file: PathBuf,

    /// Initialize a single zoom or a zoom range (min max)
    #[arg(long, num_args = 1..=2, value_name = "ZOOM")]
    zoom: Option<Vec<u32>>,

    /// Initialize within left bottom right top
    #[arg(long, num_args = 4, value_name = "COORD", allow_negative_numbers = true)]
    bounds: Option<Vec<f64>>,

    /// Processing mode (memory, readonly, continue, overwrite)
    #[arg(long, default_value = "continue", env = "CONFIG_CHECK_MODE")]
    mode: String,

    /// Log level
    #[arg(long, default_value = "info", env = "CONFIG_CHECK_LOG_LEVEL")]
    log_level: String,

    /// Log format (json or pretty)
    #[arg(long, default_value = "pretty", env = "CONFIG_CHECK_LOG_FORMAT")]
    log_format: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(&args.log_level, &args.log_format)?;

    let mut options = InitOptions::default().with_mode(args.mode.clone());
    if let Some(zoom) = &args.zoom {
        options = options.with_zoom(zoom.clone());
    }
    if let Some(bounds) = &args.bounds {
        options = options.with_bounds(bounds.clone());
    }

    let config = Configuration::new(
        args.file.as_path(),
        options,
        &DriverRegistry::with_builtin(),
    )
    .with_context(|| format!("Failed to load configuration {}", args.file.display()))?;

    let report = ConfigReport::build(&config).context("Failed to evaluate configuration")?;
    info!(zooms = report.zooms.len(), "Configuration is valid");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}

fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // logs go to stderr, the report to stdout
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if log_format.eq_ignore_ascii_case("json") {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
