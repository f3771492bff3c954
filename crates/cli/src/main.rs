//! The reel-panel binary.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, ServeArgs};
use color_eyre::eyre::{Result, WrapErr};
use colored::Colorize;
use rp_core::config::loader::load_config;
use rp_core::config::models::AppConfig;
use rp_core::engine::steps::default_steps;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Filter on RUST_LOG, defaulting to info.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact().with_target(true))
        .try_init()
        .wrap_err("error initializing logging/tracing system")?;

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Serve(args)) => serve(args).await,
        Some(Commands::Steps { root }) => print_steps(root).await,
        None => serve(cli.serve).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = resolve_config(args.root, args.config).await?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    tracing::info!(host = %config.host, port = config.port, "starting reel-panel");
    rp_server::serve(config).await.map_err(|e| color_eyre::eyre::eyre!("{e:#}"))
}

async fn print_steps(root: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(root, None).await?;
    let python = config.resolve_python();

    println!("{} {}", "Project root:".bold(), config.project_root.display());
    for step in default_steps(&python, &config.scripts_dir) {
        println!(
            "  {} {}\n      {} {}",
            format!("[{}]", step.id).cyan(),
            step.name.bold(),
            "$".dimmed(),
            step.command.display()
        );
    }
    Ok(())
}

async fn resolve_config(root: Option<PathBuf>, config_file: Option<PathBuf>) -> Result<AppConfig> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir().wrap_err("error reading current directory")?,
    };
    load_config(&root, config_file.as_deref())
        .await
        .wrap_err_with(|| format!("error loading configuration for {}", root.display()))
}
