mod commands;
mod common;
mod error;
mod ui;

use clap::Parser;
use std::path::PathBuf;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::host::SystemHost;
use crate::ui::prelude::*;

/// distpkg: distribution-agnostic package provisioning
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for diagnostics and results
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (defaults to ~/.config/distpkg/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Host identity file to read instead of the configured one
    #[arg(long, global = true)]
    os_release: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    if let Some(path) = &cli.os_release {
        config.os_release_path = path.clone();
    }
    Ok(config)
}

fn main() {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    ui::init(cli.output, !cli.no_color);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            diag(Level::Error, "distpkg", &format!("{:#}", e));
            std::process::exit(1);
        }
    };

    if let Err(err) = commands::dispatch(&SystemHost, &config, cli.command) {
        diag(
            Level::Debug,
            "distpkg",
            &format!("exiting with code {}: {}", err.exit_code(), err),
        );
        std::process::exit(err.exit_code());
    }
}
