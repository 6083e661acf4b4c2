//! pollen-operator - Main entry point
//!
//! Loads the operator configuration, wires the real (or dry-run) host
//! backends into a `HostEnvironment` and runs one lifecycle operation.

use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{debug, error, info};

use pollen_operator::cli::{Cli, Commands};
use pollen_operator::hardware::find_tpm_nodes;
use pollen_operator::preparer::configure_rng;
use pollen_operator::process_guard;
use pollen_operator::{
    DryRunHost, HostEnvironment, OperatorConfig, RngSources, RngTuning, RsyncDeployer,
    ServiceController, ServicePreparer, SysDevices, SystemPackages, Systemctl,
};

/// Initialize the logger with appropriate settings
fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;

    Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env() // Allows RUST_LOG env var to override
        .init();
}

fn load_config(cli: &Cli) -> Result<OperatorConfig> {
    let mut config = match &cli.config {
        Some(path) => OperatorConfig::load_from_file(path)?,
        None => OperatorConfig::default(),
    };
    if let Some(deployment) = cli.deployment {
        config.deployment = deployment;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    debug!("Effective configuration: {:?}", config);

    let packages = SystemPackages::default();
    let services = Systemctl;
    let files = RsyncDeployer;
    let dry = DryRunHost;
    let devices = SysDevices::new(&config.dev_root);

    let host = if cli.dry_run {
        info!("Dry-run mode: no changes will be made");
        HostEnvironment::new(&dry, &dry, &dry, &devices)
    } else {
        HostEnvironment::new(&packages, &services, &files, &devices)
    };
    let preparer = ServicePreparer::from_config(&config);

    match cli.command {
        Commands::Prepare => {
            let report = preparer.prepare(&host)?;
            println!("active: {}", report);
        }
        Commands::Start => {
            preparer.start(&host).context("Failed to start pollen")?;
            println!("active: pollen started");
        }
        Commands::Stop => {
            preparer.stop(&host).context("Failed to stop pollen")?;
            println!("maintenance: pollen stopped");
        }
        Commands::ConfigureRng { path } => {
            let tuning = configure_rng(host.files, &path)
                .with_context(|| format!("Failed to tune {}", path.display()))?;
            match tuning {
                RngTuning::Appended => println!("✓ Appended rngd tuning to {}", path.display()),
                RngTuning::AlreadyTuned => println!("✓ {} already tuned", path.display()),
            }
        }
        Commands::Probe => {
            let sources = RngSources::detect(host.devices);
            println!("{}", sources);
            for node in find_tpm_nodes(devices.dev_root()) {
                println!("  {}", node.display());
            }
        }
        Commands::Validate { file } => {
            OperatorConfig::load_from_file(&file)?
                .validate()
                .context("Configuration validation failed")?;
            println!("✓ Configuration file is valid: {}", file.display());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    init_logger();
    info!("pollen-operator starting up");

    // Terminates running apt-get/snap/systemctl children on SIGINT/SIGTERM
    if let Err(e) = process_guard::init_signal_handlers() {
        log::warn!("Failed to initialize signal handlers: {}", e);
    }

    let cli = Cli::parse_args();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("blocked: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
