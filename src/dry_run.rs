//! Dry-run host collaborators
//!
//! Mutating operations (installs, service control, file writes) are logged
//! and skipped. Reads still hit the real filesystem so the RNG tuning decision
//! shown in a dry run is the one a real run would make.

use std::path::Path;

use crate::error::{BackendError, BackendResult};
use crate::host::{FileDeployer, PackageManager, ServiceManager};
use crate::types::Ownership;

/// Logs every mutating call instead of performing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunHost;

fn skipped(action: std::fmt::Arguments<'_>) -> BackendResult<()> {
    log::info!("[dry-run] would {}", action);
    Ok(())
}

impl PackageManager for DryRunHost {
    fn update(&self) -> BackendResult<()> {
        skipped(format_args!("refresh the package index"))
    }

    fn add_packages(&self, names: &[&str]) -> BackendResult<()> {
        skipped(format_args!("install packages {:?}", names))
    }

    fn add_snap(&self, name: &str, channel: &str) -> BackendResult<()> {
        skipped(format_args!("install snap {} from {}", name, channel))
    }

    fn start_snap(&self, name: &str) -> BackendResult<()> {
        skipped(format_args!("start snap {}", name))
    }

    fn stop_snap(&self, name: &str) -> BackendResult<()> {
        skipped(format_args!("stop snap {}", name))
    }
}

impl ServiceManager for DryRunHost {
    fn start(&self, unit: &str) -> BackendResult<()> {
        skipped(format_args!("start {}", unit))
    }

    fn stop(&self, unit: &str) -> BackendResult<()> {
        skipped(format_args!("stop {}", unit))
    }

    fn reload(&self, unit: &str) -> BackendResult<()> {
        skipped(format_args!("reload {}", unit))
    }

    fn restart(&self, unit: &str) -> BackendResult<()> {
        skipped(format_args!("restart {}", unit))
    }
}

impl FileDeployer for DryRunHost {
    fn deploy(&self, source: &Path, dest: &Path) -> BackendResult<()> {
        skipped(format_args!("copy {} to {}", source.display(), dest.display()))
    }

    fn ensure_dir(&self, path: &Path, owner: &Ownership) -> BackendResult<()> {
        skipped(format_args!("create {} owned by {}", path.display(), owner))
    }

    /// A missing file reads as empty; the real run installs it first.
    fn read_to_string(&self, path: &Path) -> BackendResult<String> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(BackendError::io(path, e)),
        }
    }

    fn append(&self, path: &Path, text: &str) -> BackendResult<()> {
        skipped(format_args!("append {:?} to {}", text.trim_end(), path.display()))
    }
}
