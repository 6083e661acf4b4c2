//! Type-safe deployment types for pollen-operator
//!
//! Package sets, service identifiers and ownership are modelled as enums and
//! small structs so the preparer never passes bare strings around.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use strum::{Display, EnumIter, EnumString};

/// Snap carrying the pollen daemon
pub const POLLEN_SNAP: &str = "gtrkiller-pollen";
/// Systemd unit of the natively packaged daemon
pub const POLLEN_UNIT: &str = "pollen.service";
/// Default snap channel for the pollen snap
pub const DEFAULT_SNAP_CHANNEL: &str = "candidate";

/// How the pollen daemon is packaged on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Deployment {
    /// Daemon from the snap store, helpers from apt
    #[default]
    Snap,
    /// Everything from the distribution archive
    Native,
}

impl Deployment {
    /// Native packages installed by `prepare`.
    pub fn native_packages(self) -> &'static [&'static str] {
        match self {
            Self::Snap => &["pollinate", "ent"],
            Self::Native => &["pollen", "pollinate", "ent"],
        }
    }

    /// Snap installed after the native packages, if any.
    pub fn snap(self) -> Option<&'static str> {
        match self {
            Self::Snap => Some(POLLEN_SNAP),
            Self::Native => None,
        }
    }

    /// Handle used by `start` and `stop`.
    pub fn daemon(self) -> DaemonHandle {
        match self {
            Self::Snap => DaemonHandle::Snap(POLLEN_SNAP),
            Self::Native => DaemonHandle::Unit(POLLEN_UNIT),
        }
    }

    /// Whether an AppArmor profile ships with this deployment.
    ///
    /// The snap is confined by snapd, so only the native daemon needs one.
    pub fn ships_apparmor_profile(self) -> bool {
        matches!(self, Self::Native)
    }

    /// Wait after installation before touching services.
    ///
    /// The pollen deb restarts its unit from a postinst trigger that is still
    /// running when apt returns; restarting rsyslog during that window races it.
    pub fn default_settle_delay(self) -> Duration {
        match self {
            Self::Snap => Duration::ZERO,
            Self::Native => Duration::from_secs(10),
        }
    }
}

/// Addressable pollen daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonHandle {
    /// Snap services, driven through the package manager
    Snap(&'static str),
    /// Systemd unit, driven through the service manager
    Unit(&'static str),
}

impl DaemonHandle {
    pub fn name(self) -> &'static str {
        match self {
            Self::Snap(name) | Self::Unit(name) => name,
        }
    }
}

/// Systemd unit verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum UnitAction {
    Start,
    Stop,
    Reload,
    Restart,
}

/// Owner and group applied to a created directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    pub user: String,
    pub group: String,
}

impl Ownership {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }
}

impl Default for Ownership {
    /// rsyslog on Ubuntu writes as `syslog:adm`
    fn default() -> Self {
        Self::new("syslog", "adm")
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user, self.group)
    }
}
