//! Host collaborator contracts.
//!
//! The preparer never touches the host directly. Everything it needs is
//! reached through the four traits below, bundled into a `HostEnvironment`
//! that the caller passes to every operation. Real backends live in
//! `package_manager`, `service_manager`, `deployer` and `hardware`; tests
//! supply recording doubles.

use std::path::Path;

use crate::error::BackendResult;
use crate::types::Ownership;

/// Installs OS packages and manages snap-packaged software.
pub trait PackageManager {
    /// Refresh the package index.
    fn update(&self) -> BackendResult<()>;

    /// Install native packages in a single transaction.
    fn add_packages(&self, names: &[&str]) -> BackendResult<()>;

    /// Install a snap from `channel`.
    fn add_snap(&self, name: &str, channel: &str) -> BackendResult<()>;

    /// Start the services of an installed snap.
    fn start_snap(&self, name: &str) -> BackendResult<()>;

    /// Stop the services of an installed snap.
    fn stop_snap(&self, name: &str) -> BackendResult<()>;
}

/// Drives background services by unit name.
pub trait ServiceManager {
    fn start(&self, unit: &str) -> BackendResult<()>;
    fn stop(&self, unit: &str) -> BackendResult<()>;
    fn reload(&self, unit: &str) -> BackendResult<()>;
    fn restart(&self, unit: &str) -> BackendResult<()>;
}

/// Places configuration payloads on the host filesystem.
pub trait FileDeployer {
    /// Copy `source` to `dest`, replacing its content.
    fn deploy(&self, source: &Path, dest: &Path) -> BackendResult<()>;

    /// Create `path` (and parents) if absent and hand it to `owner`.
    /// An existing directory is not an error.
    fn ensure_dir(&self, path: &Path, owner: &Ownership) -> BackendResult<()>;

    fn read_to_string(&self, path: &Path) -> BackendResult<String>;

    /// Append `text` to `path`, creating it if needed.
    fn append(&self, path: &Path, text: &str) -> BackendResult<()>;
}

/// Hardware RNG capability probes.
pub trait DeviceProbe {
    /// True if any `tpm*` device node exists.
    fn has_tpm(&self) -> bool;

    /// True if the `hwrng` device node exists.
    fn has_hwrng(&self) -> bool;
}

/// Everything a preparer operation may touch on the host.
#[derive(Clone, Copy)]
pub struct HostEnvironment<'a> {
    pub packages: &'a dyn PackageManager,
    pub services: &'a dyn ServiceManager,
    pub files: &'a dyn FileDeployer,
    pub devices: &'a dyn DeviceProbe,
}

impl<'a> HostEnvironment<'a> {
    pub fn new(
        packages: &'a dyn PackageManager,
        services: &'a dyn ServiceManager,
        files: &'a dyn FileDeployer,
        devices: &'a dyn DeviceProbe,
    ) -> Self {
        Self {
            packages,
            services,
            files,
            devices,
        }
    }
}
