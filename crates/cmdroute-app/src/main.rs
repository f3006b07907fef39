//! cmdroute demo entry point.
//!
//! Registers a small set of demo commands and dispatches the process
//! arguments to them. Set `CMDROUTE_CONFIG` to a TOML file to override the
//! dispatcher settings, and `RUST_LOG` to see registration and dispatch logs.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};

use cmdroute::Dispatcher;
use cmdroute_types::config::DispatcherConfig;

fn load_config() -> Result<DispatcherConfig> {
    let Some(path) = std::env::var_os("CMDROUTE_CONFIG").map(PathBuf::from) else {
        return Ok(DispatcherConfig::default());
    };
    DispatcherConfig::from_file(&path)
        .with_context(|| format!("loading config from {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = load_config()?;
    log::info!(
        "Starting cmdroute (suggestion threshold {})",
        config.suggestion_threshold
    );

    let mut dispatcher = Dispatcher::with_config(config);
    commands::register_demo_commands(&mut dispatcher)?;
    for line in dispatcher.commands() {
        log::debug!("Available: {line}");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = dispatcher.execute(&args);
    log::debug!("Dispatch finished: {outcome:?}");

    if !outcome.is_success() {
        std::process::exit(2);
    }
    Ok(())
}
