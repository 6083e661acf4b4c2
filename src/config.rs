//! Operator configuration file handling.
//!
//! The configuration is a small JSON document. Every field has a default, so
//! an empty object (`{}`) or no file at all yields the snap deployment with
//! payloads under `files/`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::hardware::DEV_ROOT;
use crate::types::{DEFAULT_SNAP_CHANNEL, Deployment};

/// Upper bound for a configured settle delay
const MAX_SETTLE_DELAY_SECS: u64 = 300;

/// Snap risk levels accepted in a channel
const SNAP_RISKS: &[&str] = &["stable", "candidate", "beta", "edge"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    /// How pollen is packaged
    pub deployment: Deployment,
    /// Directory holding the configuration payloads
    pub files_dir: PathBuf,
    /// Channel for the pollen snap (snap deployment only)
    pub snap_channel: String,
    /// Overrides the deployment's settle delay when set
    pub settle_delay_secs: Option<u64>,
    /// Owner of the pollen log directory
    pub log_owner: String,
    pub log_group: String,
    /// Where device nodes are probed
    pub dev_root: PathBuf,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            deployment: Deployment::default(),
            files_dir: PathBuf::from("files"),
            snap_channel: DEFAULT_SNAP_CHANNEL.to_string(),
            settle_delay_secs: None,
            log_owner: "syslog".to_string(),
            log_group: "adm".to_string(),
            dev_root: PathBuf::from(DEV_ROOT),
        }
    }
}

impl OperatorConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse configuration JSON")
    }

    /// Effective settle delay.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.deployment.default_settle_delay())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.files_dir.as_os_str().is_empty() {
            anyhow::bail!("files_dir must not be empty");
        }

        if !self.dev_root.is_absolute() {
            anyhow::bail!("dev_root must be an absolute path, got {:?}", self.dev_root);
        }

        validate_snap_channel(&self.snap_channel)?;

        if let Some(secs) = self.settle_delay_secs {
            if secs > MAX_SETTLE_DELAY_SECS {
                anyhow::bail!(
                    "settle_delay_secs must be at most {}, got {}",
                    MAX_SETTLE_DELAY_SECS,
                    secs
                );
            }
        }

        validate_account_name("log_owner", &self.log_owner)?;
        validate_account_name("log_group", &self.log_group)?;

        Ok(())
    }
}

/// `risk`, `track/risk` or `track/risk/branch`
fn validate_snap_channel(channel: &str) -> Result<()> {
    let parts: Vec<&str> = channel.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) || parts.len() > 3 {
        anyhow::bail!("Invalid snap channel {:?}", channel);
    }
    let risk = if parts.len() == 1 { parts[0] } else { parts[1] };
    if !SNAP_RISKS.contains(&risk) {
        anyhow::bail!(
            "Snap channel {:?} must name one of the risks {:?}",
            channel,
            SNAP_RISKS
        );
    }
    Ok(())
}

/// Same shape `useradd` accepts: lowercase start, then lowercase, digits, `-`, `_`
fn validate_account_name(field: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !valid_start || !valid_rest || name.len() > 32 {
        anyhow::bail!("{} {:?} is not a valid account name", field, name);
    }
    Ok(())
}
