//! Hardware RNG source detection
//!
//! The RNG feeder is only worth installing when the host exposes a hardware
//! entropy source: a TPM (`/dev/tpm0`, `/dev/tpmrm0`, ...) or a dedicated
//! `/dev/hwrng` node. Detection is a read-only directory scan, no shelling out.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::host::DeviceProbe;

/// Default device directory
pub const DEV_ROOT: &str = "/dev";

/// Device probes rooted at a device directory (normally `/dev`).
#[derive(Debug, Clone)]
pub struct SysDevices {
    dev_root: PathBuf,
}

impl SysDevices {
    pub fn new(dev_root: impl Into<PathBuf>) -> Self {
        Self {
            dev_root: dev_root.into(),
        }
    }

    pub fn dev_root(&self) -> &Path {
        &self.dev_root
    }
}

impl Default for SysDevices {
    fn default() -> Self {
        Self::new(DEV_ROOT)
    }
}

impl DeviceProbe for SysDevices {
    fn has_tpm(&self) -> bool {
        !find_tpm_nodes(&self.dev_root).is_empty()
    }

    fn has_hwrng(&self) -> bool {
        self.dev_root.join("hwrng").exists()
    }
}

/// Entries of `dev_root` whose name starts with `tpm`, sorted.
///
/// An unreadable directory yields no matches, the same as an empty glob.
pub fn find_tpm_nodes(dev_root: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dev_root) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot scan {} for TPM nodes: {}", dev_root.display(), e);
            return Vec::new();
        }
    };

    let mut nodes: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("tpm"))
        .map(|entry| entry.path())
        .collect();
    nodes.sort();
    nodes
}

/// Snapshot of the hardware RNG sources on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RngSources {
    pub tpm: bool,
    pub hwrng: bool,
}

impl RngSources {
    /// Probe each source once.
    pub fn detect(probe: &dyn DeviceProbe) -> Self {
        let sources = Self {
            tpm: probe.has_tpm(),
            hwrng: probe.has_hwrng(),
        };
        log::info!("Hardware RNG detection: {}", sources);
        sources
    }

    /// True if the RNG feeder has something to feed from.
    pub fn any(self) -> bool {
        self.tpm || self.hwrng
    }
}

impl fmt::Display for RngSources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |b: bool| if b { "present" } else { "absent" };
        write!(f, "TPM: {}, hwrng: {}", yes_no(self.tpm), yes_no(self.hwrng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_empty_dev_root_has_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let devices = SysDevices::new(dir.path());
        assert!(!devices.has_tpm());
        assert!(!devices.has_hwrng());
        assert!(!RngSources::detect(&devices).any());
    }

    #[test]
    fn test_tpm_nodes_are_found() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("tpmrm0")).unwrap();
        File::create(dir.path().join("tpm0")).unwrap();
        File::create(dir.path().join("ttyS0")).unwrap();

        let nodes = find_tpm_nodes(dir.path());
        assert_eq!(nodes, vec![dir.path().join("tpm0"), dir.path().join("tpmrm0")]);
        assert!(SysDevices::new(dir.path()).has_tpm());
    }

    #[test]
    fn test_hwrng_node_is_found() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("hwrng")).unwrap();

        let sources = RngSources::detect(&SysDevices::new(dir.path()));
        assert_eq!(sources, RngSources { tpm: false, hwrng: true });
        assert!(sources.any());
    }

    #[test]
    fn test_unreadable_dev_root_finds_no_tpm() {
        assert!(find_tpm_nodes(Path::new("/nonexistent/pollen/dev")).is_empty());
    }

    #[test]
    fn test_rng_sources_display() {
        let sources = RngSources { tpm: true, hwrng: false };
        assert_eq!(sources.to_string(), "TPM: present, hwrng: absent");
    }
}
