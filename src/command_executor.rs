//! command_executor.rs - Typed host commands and their blocking execution.
//!
//! Every external tool the operator drives is a variant of `HostCommand`.
//! `execute` runs it in its own process group, registers the PID for signal
//! cleanup, waits for it, and maps the outcome onto `BackendError`.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::error::{BackendError, BackendResult};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use crate::types::UnitAction;

/// A host command the operator knows how to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// `apt-get update`
    AptUpdate,
    /// `apt-get install -y <packages>`
    AptInstall(Vec<String>),
    /// `snap install <name> --channel=<channel>`
    SnapInstall { name: String, channel: String },
    /// `snap start <name>`
    SnapStart(String),
    /// `snap stop <name>`
    SnapStop(String),
    /// `systemctl <action> <unit>`
    Systemctl { action: UnitAction, unit: String },
    /// `rsync <source> <dest>`
    Rsync { source: PathBuf, dest: PathBuf },
}

impl HostCommand {
    /// Binary looked up on `PATH`.
    pub fn program(&self) -> &'static str {
        match self {
            Self::AptUpdate | Self::AptInstall(_) => "apt-get",
            Self::SnapInstall { .. } | Self::SnapStart(_) | Self::SnapStop(_) => "snap",
            Self::Systemctl { .. } => "systemctl",
            Self::Rsync { .. } => "rsync",
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            Self::AptUpdate => vec!["update".to_string()],
            Self::AptInstall(packages) => {
                let mut args = vec!["install".to_string(), "-y".to_string()];
                args.extend(packages.iter().cloned());
                args
            }
            Self::SnapInstall { name, channel } => vec![
                "install".to_string(),
                name.clone(),
                format!("--channel={}", channel),
            ],
            Self::SnapStart(name) => vec!["start".to_string(), name.clone()],
            Self::SnapStop(name) => vec!["stop".to_string(), name.clone()],
            Self::Systemctl { action, unit } => vec![action.to_string(), unit.clone()],
            Self::Rsync { source, dest } => vec![
                source.to_string_lossy().into_owned(),
                dest.to_string_lossy().into_owned(),
            ],
        }
    }

    /// apt must never prompt; there is no terminal behind us
    pub fn envs(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            Self::AptUpdate | Self::AptInstall(_) => vec![("DEBIAN_FRONTEND", "noninteractive")],
            _ => Vec::new(),
        }
    }

    /// Run the command to completion and return its stdout.
    pub fn execute(&self) -> BackendResult<String> {
        info!("Running: {}", self);

        let mut cmd = Command::new(self.program());
        cmd.args(self.args())
            .envs(self.envs())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .in_new_process_group();

        let child = cmd
            .spawn()
            .map_err(|e| BackendError::spawn(self.program(), e))?;
        let pid = child.id();

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.register(pid);
        }
        let output = child.wait_with_output();
        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.unregister(pid);
        }

        let output = output.map_err(|e| BackendError::operational(self.to_string(), e.to_string()))?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        if output.status.success() {
            debug!("{} succeeded", self);
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match (stderr.trim(), output.status.code()) {
                ("", Some(code)) => format!("exit code {}", code),
                ("", None) => "terminated by signal".to_string(),
                (msg, _) => msg.to_string(),
            };
            Err(BackendError::operational(self.to_string(), message))
        }
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program())?;
        for arg in self.args() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apt_install_args() {
        let cmd = HostCommand::AptInstall(vec!["pollinate".into(), "ent".into()]);
        assert_eq!(cmd.program(), "apt-get");
        assert_eq!(cmd.args(), vec!["install", "-y", "pollinate", "ent"]);
        assert_eq!(cmd.envs(), vec![("DEBIAN_FRONTEND", "noninteractive")]);
    }

    #[test]
    fn test_snap_install_display() {
        let cmd = HostCommand::SnapInstall {
            name: "gtrkiller-pollen".into(),
            channel: "candidate".into(),
        };
        assert_eq!(
            cmd.to_string(),
            "snap install gtrkiller-pollen --channel=candidate"
        );
        assert!(cmd.envs().is_empty());
    }

    #[test]
    fn test_systemctl_display() {
        let cmd = HostCommand::Systemctl {
            action: UnitAction::Restart,
            unit: "rsyslog.service".into(),
        };
        assert_eq!(cmd.to_string(), "systemctl restart rsyslog.service");
    }

    #[test]
    fn test_rsync_args() {
        let cmd = HostCommand::Rsync {
            source: PathBuf::from("files/logrotate.conf"),
            dest: PathBuf::from("/etc/logrotate.d/pollen"),
        };
        assert_eq!(
            cmd.args(),
            vec!["files/logrotate.conf", "/etc/logrotate.d/pollen"]
        );
    }
}
