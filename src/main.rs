// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use aptblob::config::Config;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise info, or debug with --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("aptblob: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::discover(cli.config.as_deref())?;
    let key_id = cli.key_id.as_deref();

    match cli.command {
        Commands::Init { bucket, dist } => commands::cmd_init(&bucket, &dist, &config, key_id),
        Commands::Upload {
            component,
            bucket,
            dist,
            packages,
        } => commands::cmd_upload(
            &bucket,
            &dist,
            component.as_deref(),
            &packages,
            &config,
            key_id,
        ),
    }
}
