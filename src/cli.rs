use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::preparer::RNG_TOOLS_DEFAULTS;
use crate::types::Deployment;

/// pollen-operator - install and supervise the pollen entropy daemon
#[derive(Parser)]
#[command(name = "pollen-operator")]
#[command(about = "Installs, configures and supervises the pollen entropy daemon")]
#[command(version)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured deployment (snap or native)
    #[arg(short, long, global = true)]
    pub deployment: Option<Deployment>,

    /// Dry-run mode: log installs, file writes and service calls instead of
    /// performing them. Device probes and file reads still run.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install packages, write configuration and set up the RNG feeder
    Prepare,
    /// Start the pollen daemon
    Start,
    /// Stop the pollen daemon
    Stop,
    /// Only ensure the rngd tuning directive is present
    ConfigureRng {
        /// rng-tools defaults file to edit
        #[arg(long, default_value = RNG_TOOLS_DEFAULTS)]
        path: PathBuf,
    },
    /// Report which hardware RNG sources are present
    Probe,
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        file: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
