//! Configuration payload deployment
//!
//! Payloads are copied with `rsync` so an unchanged destination is left
//! untouched. Directory creation, ownership and the small read/append edits
//! the RNG tuning needs go through `std::fs` and `nix` directly.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use nix::unistd::{Group, User, chown};

use crate::command_executor::HostCommand;
use crate::error::{BackendError, BackendResult};
use crate::host::FileDeployer;
use crate::types::Ownership;

/// `rsync` backed `FileDeployer`
#[derive(Debug, Clone, Copy, Default)]
pub struct RsyncDeployer;

impl FileDeployer for RsyncDeployer {
    fn deploy(&self, source: &Path, dest: &Path) -> BackendResult<()> {
        HostCommand::Rsync {
            source: source.to_path_buf(),
            dest: dest.to_path_buf(),
        }
        .execute()?;
        log::info!("Deployed {} -> {}", source.display(), dest.display());
        Ok(())
    }

    fn ensure_dir(&self, path: &Path, owner: &Ownership) -> BackendResult<()> {
        fs::create_dir_all(path).map_err(|e| BackendError::io(path, e))?;

        let command = format!("chown {} {}", owner, path.display());
        let uid = User::from_name(&owner.user)
            .map_err(|e| BackendError::operational(&command, e.to_string()))?
            .ok_or_else(|| BackendError::operational(&command, format!("unknown user {}", owner.user)))?
            .uid;
        let gid = Group::from_name(&owner.group)
            .map_err(|e| BackendError::operational(&command, e.to_string()))?
            .ok_or_else(|| {
                BackendError::operational(&command, format!("unknown group {}", owner.group))
            })?
            .gid;

        chown(path, Some(uid), Some(gid))
            .map_err(|e| BackendError::operational(&command, e.to_string()))?;
        log::debug!("{} ready, owned by {}", path.display(), owner);
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> BackendResult<String> {
        fs::read_to_string(path).map_err(|e| BackendError::io(path, e))
    }

    fn append(&self, path: &Path, text: &str) -> BackendResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| BackendError::io(path, e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| BackendError::io(path, e))
    }
}
