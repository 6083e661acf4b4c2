//! Pollen provisioning sequence
//!
//! `ServicePreparer` brings a host to the point where pollen and its
//! supporting services are installed, configured and ready to run:
//!
//! 1. refresh the package index and install the deployment's package set
//! 2. settle while package hooks finish restarting services
//! 3. create the log directory
//! 4. deploy the AppArmor profile (native only), logrotate and rsyslog rules
//! 5. restart rsyslog
//! 6. set up the RNG feeder when a TPM or hardware RNG is present
//!
//! Install-phase failures surface as `PrepareError::Install`; everything after
//! that as `PrepareError::ConfigurationWrite`. The sequence stops at the first
//! failure and does not roll back what already happened.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::OperatorConfig;
use crate::error::{BackendResult, Classify, PrepareError, Step};
use crate::hardware::RngSources;
use crate::host::{FileDeployer, HostEnvironment};
use crate::types::{DEFAULT_SNAP_CHANNEL, DaemonHandle, Deployment, Ownership};

pub const LOG_DIR: &str = "/var/log/pollen";
pub const LOGROTATE_DEST: &str = "/etc/logrotate.d/pollen";
pub const RSYSLOG_DEST: &str = "/etc/rsyslog.d/40-pollen.conf";
pub const APPARMOR_DEST: &str = "/etc/apparmor.d/usr.bin.pollen";
pub const RNG_TOOLS_DEFAULTS: &str = "/etc/default/rng-tools-debian";

pub const LOGROTATE_SOURCE: &str = "logrotate.conf";
pub const RSYSLOG_SOURCE: &str = "rsyslog.conf";
pub const APPARMOR_SOURCE: &str = "usr.bin.pollen";

pub const RSYSLOG_SERVICE: &str = "rsyslog.service";
pub const APPARMOR_SERVICE: &str = "apparmor.service";
pub const RNGD_SERVICE: &str = "rngd.service";
pub const RNG_TOOLS_PACKAGE: &str = "rng-tools5";

/// Keep the pool at 90% and feed every second.
pub const RNGD_OPTIONS: &str = r#"RNGDOPTIONS="--fill-watermark=90% --feed-interval=1""#;

/// Outcome of the RNG tuning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngTuning {
    /// The directive was appended
    Appended,
    /// The file already carries the directive more than once; left untouched
    AlreadyTuned,
}

/// What happened to the RNG feeder during `prepare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngFeeder {
    Skipped,
    Configured(RngTuning),
}

/// Summary of a successful `prepare`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareReport {
    pub deployment: Deployment,
    pub rng_sources: RngSources,
    pub rng_feeder: RngFeeder,
}

impl fmt::Display for PrepareReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let feeder = match self.rng_feeder {
            RngFeeder::Skipped => "skipped",
            RngFeeder::Configured(RngTuning::Appended) => "configured",
            RngFeeder::Configured(RngTuning::AlreadyTuned) => "already configured",
        };
        write!(
            f,
            "pollen ({}) prepared; {}; rng feeder {}",
            self.deployment, self.rng_sources, feeder
        )
    }
}

/// Lifecycle operations on the pollen daemon.
pub trait ServiceController {
    /// Install and configure pollen and its supporting services.
    fn prepare(&self, host: &HostEnvironment<'_>) -> Result<PrepareReport, PrepareError>;

    /// Start the daemon. Idempotence is left to the backend.
    fn start(&self, host: &HostEnvironment<'_>) -> BackendResult<()>;

    /// Stop the daemon. Idempotence is left to the backend.
    fn stop(&self, host: &HostEnvironment<'_>) -> BackendResult<()>;
}

/// Stateless coordinator for the pollen provisioning steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePreparer {
    deployment: Deployment,
    files_dir: PathBuf,
    snap_channel: String,
    settle_delay: Duration,
    log_owner: Ownership,
}

impl ServicePreparer {
    /// Preparer with the deployment's defaults and payloads under `files/`.
    pub fn new(deployment: Deployment) -> Self {
        Self {
            deployment,
            files_dir: PathBuf::from("files"),
            snap_channel: DEFAULT_SNAP_CHANNEL.to_string(),
            settle_delay: deployment.default_settle_delay(),
            log_owner: Ownership::default(),
        }
    }

    pub fn from_config(config: &OperatorConfig) -> Self {
        Self {
            deployment: config.deployment,
            files_dir: config.files_dir.clone(),
            snap_channel: config.snap_channel.clone(),
            settle_delay: config.settle_delay(),
            log_owner: Ownership::new(&config.log_owner, &config.log_group),
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_files_dir(mut self, files_dir: impl Into<PathBuf>) -> Self {
        self.files_dir = files_dir.into();
        self
    }

    pub fn deployment(&self) -> Deployment {
        self.deployment
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    fn payload(&self, name: &str) -> PathBuf {
        self.files_dir.join(name)
    }

    fn install(&self, host: &HostEnvironment<'_>) -> Result<(), PrepareError> {
        host.packages.update().during_install(Step::RefreshIndex)?;
        host.packages
            .add_packages(self.deployment.native_packages())
            .during_install(Step::InstallPackages)?;
        if let Some(snap) = self.deployment.snap() {
            host.packages
                .add_snap(snap, &self.snap_channel)
                .during_install(Step::InstallSnap)?;
        }
        Ok(())
    }

    fn write_configuration(&self, host: &HostEnvironment<'_>) -> Result<(), PrepareError> {
        host.files
            .ensure_dir(Path::new(LOG_DIR), &self.log_owner)
            .during_configuration(Step::LogDirectory)?;

        if self.deployment.ships_apparmor_profile() {
            host.files
                .deploy(&self.payload(APPARMOR_SOURCE), Path::new(APPARMOR_DEST))
                .during_configuration(Step::DeployAppArmor)?;
            host.services
                .reload(APPARMOR_SERVICE)
                .during_configuration(Step::ReloadAppArmor)?;
        }

        host.files
            .deploy(&self.payload(LOGROTATE_SOURCE), Path::new(LOGROTATE_DEST))
            .during_configuration(Step::DeployLogrotate)?;
        host.files
            .deploy(&self.payload(RSYSLOG_SOURCE), Path::new(RSYSLOG_DEST))
            .during_configuration(Step::DeployRsyslog)?;
        host.services
            .restart(RSYSLOG_SERVICE)
            .during_configuration(Step::RestartRsyslog)?;
        Ok(())
    }

    fn setup_rng_feeder(&self, host: &HostEnvironment<'_>) -> Result<RngTuning, PrepareError> {
        host.packages
            .add_packages(&[RNG_TOOLS_PACKAGE])
            .during_configuration(Step::InstallRngTools)?;
        let tuning = configure_rng(host.files, Path::new(RNG_TOOLS_DEFAULTS))
            .during_configuration(Step::ConfigureRng)?;
        host.services
            .restart(RNGD_SERVICE)
            .during_configuration(Step::RestartRngd)?;
        Ok(tuning)
    }
}

impl ServiceController for ServicePreparer {
    fn prepare(&self, host: &HostEnvironment<'_>) -> Result<PrepareReport, PrepareError> {
        log::info!("Preparing pollen ({} deployment)", self.deployment);

        self.install(host)?;

        if !self.settle_delay.is_zero() {
            log::debug!("Settling for {:?} after package installation", self.settle_delay);
            std::thread::sleep(self.settle_delay);
        }

        self.write_configuration(host)?;

        let rng_sources = RngSources::detect(host.devices);
        let rng_feeder = if rng_sources.any() {
            RngFeeder::Configured(self.setup_rng_feeder(host)?)
        } else {
            log::info!("No hardware RNG source, skipping rng-tools");
            RngFeeder::Skipped
        };

        Ok(PrepareReport {
            deployment: self.deployment,
            rng_sources,
            rng_feeder,
        })
    }

    fn start(&self, host: &HostEnvironment<'_>) -> BackendResult<()> {
        match self.deployment.daemon() {
            DaemonHandle::Snap(name) => host.packages.start_snap(name),
            DaemonHandle::Unit(name) => host.services.start(name),
        }
    }

    fn stop(&self, host: &HostEnvironment<'_>) -> BackendResult<()> {
        match self.deployment.daemon() {
            DaemonHandle::Snap(name) => host.packages.stop_snap(name),
            DaemonHandle::Unit(name) => host.services.stop(name),
        }
    }
}

/// Make sure the rngd tuning directive is in `path`.
///
/// The file counts as already tuned only when the directive occurs more than
/// once; with zero or one occurrence it is appended. Repeated calls therefore
/// settle at two occurrences and never go beyond.
pub fn configure_rng(files: &dyn FileDeployer, path: &Path) -> BackendResult<RngTuning> {
    let content = files.read_to_string(path)?;
    if content.matches(RNGD_OPTIONS).count() > 1 {
        log::debug!("{} already tuned", path.display());
        return Ok(RngTuning::AlreadyTuned);
    }

    let mut line = String::new();
    if !content.is_empty() && !content.ends_with('\n') {
        line.push('\n');
    }
    line.push_str(RNGD_OPTIONS);
    line.push('\n');
    files.append(path, &line)?;
    log::info!("Appended rngd tuning to {}", path.display());
    Ok(RngTuning::Appended)
}
