//! pollen-operator library
//!
//! Installs, configures and supervises the pollen entropy daemon. The
//! provisioning sequence lives in `preparer`; host access goes through the
//! collaborator traits in `host`.

pub mod cli;
pub mod command_executor;
pub mod config;
pub mod deployer;
pub mod dry_run;
pub mod error;
pub mod hardware;
pub mod host;
pub mod package_manager;
pub mod preparer;
pub mod process_guard;
pub mod service_manager;
pub mod types;

// Re-export main types for convenience
pub use config::OperatorConfig;
pub use error::{BackendError, BackendResult, PrepareError, Step};
pub use hardware::{RngSources, SysDevices};
pub use host::{DeviceProbe, FileDeployer, HostEnvironment, PackageManager, ServiceManager};
pub use preparer::{
    PrepareReport, RngFeeder, RngTuning, ServiceController, ServicePreparer, configure_rng,
};
pub use types::{DaemonHandle, Deployment, Ownership, UnitAction};

// Host backends
pub use deployer::RsyncDeployer;
pub use dry_run::DryRunHost;
pub use package_manager::SystemPackages;
pub use service_manager::Systemctl;
