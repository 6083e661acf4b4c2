//! Package management backends
//!
//! - `AptPackages`: native Debian/Ubuntu packages through `apt-get`
//! - `SnapPackages`: snap store software through `snap`
//! - `SystemPackages`: both behind the `PackageManager` contract

use crate::command_executor::HostCommand;
use crate::error::BackendResult;
use crate::host::PackageManager;

/// `apt-get` wrapper
#[derive(Debug, Clone, Copy, Default)]
pub struct AptPackages;

impl AptPackages {
    pub fn update(&self) -> BackendResult<()> {
        HostCommand::AptUpdate.execute().map(drop)
    }

    /// Install `names` in one transaction.
    pub fn install(&self, names: &[&str]) -> BackendResult<()> {
        if names.is_empty() {
            log::warn!("apt install called with empty package list");
            return Ok(());
        }
        let packages = names.iter().map(|n| (*n).to_string()).collect();
        HostCommand::AptInstall(packages).execute()?;
        log::info!("Installed packages: {:?}", names);
        Ok(())
    }
}

/// `snap` wrapper
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapPackages;

impl SnapPackages {
    pub fn install(&self, name: &str, channel: &str) -> BackendResult<()> {
        HostCommand::SnapInstall {
            name: name.to_string(),
            channel: channel.to_string(),
        }
        .execute()?;
        log::info!("Installed snap {} from {}", name, channel);
        Ok(())
    }

    pub fn start(&self, name: &str) -> BackendResult<()> {
        HostCommand::SnapStart(name.to_string()).execute().map(drop)
    }

    pub fn stop(&self, name: &str) -> BackendResult<()> {
        HostCommand::SnapStop(name.to_string()).execute().map(drop)
    }
}

/// Host package manager combining apt and snap.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPackages {
    apt: AptPackages,
    snap: SnapPackages,
}

impl PackageManager for SystemPackages {
    fn update(&self) -> BackendResult<()> {
        self.apt.update()
    }

    fn add_packages(&self, names: &[&str]) -> BackendResult<()> {
        self.apt.install(names)
    }

    fn add_snap(&self, name: &str, channel: &str) -> BackendResult<()> {
        self.snap.install(name, channel)
    }

    fn start_snap(&self, name: &str) -> BackendResult<()> {
        self.snap.start(name)
    }

    fn stop_snap(&self, name: &str) -> BackendResult<()> {
        self.snap.stop(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_install_is_noop() {
        // Never reaches apt-get, so this holds on any host
        assert!(AptPackages.install(&[]).is_ok());
    }
}
