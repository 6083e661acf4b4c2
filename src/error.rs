//! Error handling module for pollen-operator
//!
//! Two layers of errors live here:
//!
//! - `BackendError` is what a host collaborator (apt, snap, systemctl, rsync,
//!   the filesystem) reports when one of its operations fails.
//! - `PrepareError` is the public contract of `ServicePreparer::prepare`. Every
//!   backend failure is classified into exactly one of its two kinds at the
//!   point of the call and returned immediately.

use std::io;
use std::path::{Path, PathBuf};

use strum::Display;
use thiserror::Error;

/// Failure reported by a host collaborator.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The tool backing the operation is not installed on this host
    #[error("{tool} is not available on this host")]
    Missing {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The tool ran but reported a failure (non-zero exit, unknown user, ...)
    #[error("{command} failed: {message}")]
    Operational { command: String, message: String },

    /// Filesystem errors on a specific path
    #[error("IO error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for collaborator operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

impl BackendError {
    /// Classify a spawn failure. `NotFound` means the binary itself is absent.
    pub fn spawn(tool: impl Into<String>, source: io::Error) -> Self {
        let tool = tool.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::Missing { tool, source }
        } else {
            Self::Operational {
                command: tool,
                message: source.to_string(),
            }
        }
    }

    /// Create an operational error
    pub fn operational(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operational {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a filesystem error for `path`
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns true if the backing tool is absent from the host.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

/// The provisioning step that was running when `prepare` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Step {
    RefreshIndex,
    InstallPackages,
    InstallSnap,
    LogDirectory,
    DeployAppArmor,
    ReloadAppArmor,
    DeployLogrotate,
    DeployRsyslog,
    RestartRsyslog,
    InstallRngTools,
    ConfigureRng,
    RestartRngd,
}

/// Typed failure of `prepare`.
#[derive(Error, Debug)]
pub enum PrepareError {
    /// Package installation could not complete
    #[error("Failed to install packages during {step}")]
    Install {
        step: Step,
        #[source]
        source: BackendError,
    },

    /// A configuration file or service operation failed
    #[error("Failed to write configuration during {step}")]
    ConfigurationWrite {
        step: Step,
        #[source]
        source: BackendError,
    },
}

impl PrepareError {
    /// The step that failed
    pub fn step(&self) -> Step {
        match self {
            Self::Install { step, .. } | Self::ConfigurationWrite { step, .. } => *step,
        }
    }

    /// The collaborator failure behind this error
    pub fn backend(&self) -> &BackendError {
        match self {
            Self::Install { source, .. } | Self::ConfigurationWrite { source, .. } => source,
        }
    }

    pub fn is_install(&self) -> bool {
        matches!(self, Self::Install { .. })
    }

    pub fn is_configuration_write(&self) -> bool {
        matches!(self, Self::ConfigurationWrite { .. })
    }
}

/// Classifies a collaborator result into one of the two `PrepareError` kinds.
pub trait Classify<T> {
    /// Any failure becomes `PrepareError::Install`
    fn during_install(self, step: Step) -> Result<T, PrepareError>;

    /// Any failure becomes `PrepareError::ConfigurationWrite`
    fn during_configuration(self, step: Step) -> Result<T, PrepareError>;
}

impl<T> Classify<T> for BackendResult<T> {
    fn during_install(self, step: Step) -> Result<T, PrepareError> {
        self.map_err(|source| {
            log::warn!("{} failed: {}", step, source);
            PrepareError::Install { step, source }
        })
    }

    fn during_configuration(self, step: Step) -> Result<T, PrepareError> {
        self.map_err(|source| {
            log::warn!("{} failed: {}", step, source);
            PrepareError::ConfigurationWrite { step, source }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_not_found_is_missing() {
        let err = BackendError::spawn("apt-get", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_missing());
        assert_eq!(err.to_string(), "apt-get is not available on this host");
    }

    #[test]
    fn test_spawn_other_failure_is_operational() {
        let err = BackendError::spawn(
            "systemctl",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(!err.is_missing());
        assert!(matches!(err, BackendError::Operational { .. }));
    }

    #[test]
    fn test_io_error_display_includes_path() {
        let err = BackendError::io(
            "/etc/default/rng-tools-debian",
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(err.to_string().starts_with("IO error on /etc/default/rng-tools-debian"));
    }

    #[test]
    fn test_step_display() {
        assert_eq!(Step::RestartRsyslog.to_string(), "restart-rsyslog");
        assert_eq!(Step::DeployAppArmor.to_string(), "deploy-app-armor");
    }

    #[test]
    fn test_classify_install() {
        let result: BackendResult<()> = Err(BackendError::operational("apt-get update", "exit 100"));
        let err = result.during_install(Step::RefreshIndex).unwrap_err();
        assert!(err.is_install());
        assert_eq!(err.step(), Step::RefreshIndex);
        assert_eq!(err.to_string(), "Failed to install packages during refresh-index");
    }

    #[test]
    fn test_classify_configuration() {
        let result: BackendResult<()> = Err(BackendError::operational("systemctl", "boom"));
        let err = result.during_configuration(Step::RestartRngd).unwrap_err();
        assert!(err.is_configuration_write());
        assert!(matches!(err.backend(), BackendError::Operational { .. }));
    }

    #[test]
    fn test_classify_passes_success_through() {
        let result: BackendResult<u8> = Ok(7);
        assert_eq!(result.during_configuration(Step::ConfigureRng).unwrap(), 7);
    }
}
