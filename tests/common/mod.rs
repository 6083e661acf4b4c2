//! Recording host double shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use pollen_operator::{
    BackendError, BackendResult, DeviceProbe, FileDeployer, HostEnvironment, Ownership,
    PackageManager, ServiceManager,
};

/// One collaborator call, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Update,
    AddPackages(Vec<String>),
    AddSnap(String, String),
    StartSnap(String),
    StopSnap(String),
    Start(String),
    Stop(String),
    Reload(String),
    Restart(String),
    Deploy(PathBuf, PathBuf),
    EnsureDir(PathBuf),
    Read(PathBuf),
    Append(PathBuf, String),
}

impl Call {
    fn op(&self) -> Op {
        match self {
            Self::Update => Op::Update,
            Self::AddPackages(_) => Op::AddPackages,
            Self::AddSnap(..) => Op::AddSnap,
            Self::StartSnap(_) => Op::StartSnap,
            Self::StopSnap(_) => Op::StopSnap,
            Self::Start(_) => Op::Start,
            Self::Stop(_) => Op::Stop,
            Self::Reload(_) => Op::Reload,
            Self::Restart(_) => Op::Restart,
            Self::Deploy(..) => Op::Deploy,
            Self::EnsureDir(_) => Op::EnsureDir,
            Self::Read(_) => Op::Read,
            Self::Append(..) => Op::Append,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Update,
    AddPackages,
    AddSnap,
    StartSnap,
    StopSnap,
    Start,
    Stop,
    Reload,
    Restart,
    Deploy,
    EnsureDir,
    Read,
    Append,
}

/// Kind of failure to inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    Missing,
    Operational,
}

impl Fail {
    fn error(self, op: Op) -> BackendError {
        match self {
            Self::Missing => BackendError::spawn(
                format!("{:?}", op),
                io::Error::from(io::ErrorKind::NotFound),
            ),
            Self::Operational => BackendError::operational(format!("{:?}", op), "exit code 1"),
        }
    }
}

/// In-memory host that records every call and fails on request.
#[derive(Default)]
pub struct RecordingHost {
    pub tpm: bool,
    pub hwrng: bool,
    calls: RefCell<Vec<Call>>,
    counts: RefCell<HashMap<Op, usize>>,
    failures: RefCell<Vec<(Op, usize, Fail)>>,
    files: RefCell<HashMap<PathBuf, String>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tpm(mut self) -> Self {
        self.tpm = true;
        self
    }

    pub fn with_hwrng(mut self) -> Self {
        self.hwrng = true;
        self
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files.borrow_mut().insert(path.into(), content.to_string());
        self
    }

    /// Fail the `nth` (1-based) call of `op`.
    pub fn fail_nth(self, op: Op, nth: usize, fail: Fail) -> Self {
        self.failures.borrow_mut().push((op, nth, fail));
        self
    }

    /// Fail every call of `op`.
    pub fn fail_always(self, op: Op, fail: Fail) -> Self {
        self.fail_nth(op, 0, fail)
    }

    pub fn env(&self) -> HostEnvironment<'_> {
        HostEnvironment::new(self, self, self, self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls.borrow().iter().filter(|c| c.op() == op).count()
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    fn record(&self, call: Call) -> BackendResult<()> {
        let op = call.op();
        self.calls.borrow_mut().push(call);
        let mut counts = self.counts.borrow_mut();
        let n = counts.entry(op).or_insert(0);
        *n += 1;
        let failure = self
            .failures
            .borrow()
            .iter()
            .find(|(f_op, nth, _)| *f_op == op && (*nth == 0 || *nth == *n))
            .map(|(_, _, fail)| *fail);
        match failure {
            Some(fail) => Err(fail.error(op)),
            None => Ok(()),
        }
    }
}

impl PackageManager for RecordingHost {
    fn update(&self) -> BackendResult<()> {
        self.record(Call::Update)
    }

    fn add_packages(&self, names: &[&str]) -> BackendResult<()> {
        self.record(Call::AddPackages(names.iter().map(|n| n.to_string()).collect()))
    }

    fn add_snap(&self, name: &str, channel: &str) -> BackendResult<()> {
        self.record(Call::AddSnap(name.to_string(), channel.to_string()))
    }

    fn start_snap(&self, name: &str) -> BackendResult<()> {
        self.record(Call::StartSnap(name.to_string()))
    }

    fn stop_snap(&self, name: &str) -> BackendResult<()> {
        self.record(Call::StopSnap(name.to_string()))
    }
}

impl ServiceManager for RecordingHost {
    fn start(&self, unit: &str) -> BackendResult<()> {
        self.record(Call::Start(unit.to_string()))
    }

    fn stop(&self, unit: &str) -> BackendResult<()> {
        self.record(Call::Stop(unit.to_string()))
    }

    fn reload(&self, unit: &str) -> BackendResult<()> {
        self.record(Call::Reload(unit.to_string()))
    }

    fn restart(&self, unit: &str) -> BackendResult<()> {
        self.record(Call::Restart(unit.to_string()))
    }
}

impl FileDeployer for RecordingHost {
    fn deploy(&self, source: &Path, dest: &Path) -> BackendResult<()> {
        self.record(Call::Deploy(source.to_path_buf(), dest.to_path_buf()))?;
        let content = format!("payload from {}", source.display());
        self.files.borrow_mut().insert(dest.to_path_buf(), content);
        Ok(())
    }

    fn ensure_dir(&self, path: &Path, _owner: &Ownership) -> BackendResult<()> {
        self.record(Call::EnsureDir(path.to_path_buf()))
    }

    fn read_to_string(&self, path: &Path) -> BackendResult<String> {
        self.record(Call::Read(path.to_path_buf()))?;
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::io(path, io::Error::from(io::ErrorKind::NotFound)))
    }

    fn append(&self, path: &Path, text: &str) -> BackendResult<()> {
        self.record(Call::Append(path.to_path_buf(), text.to_string()))?;
        self.files
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_default()
            .push_str(text);
        Ok(())
    }
}

impl DeviceProbe for RecordingHost {
    fn has_tpm(&self) -> bool {
        self.tpm
    }

    fn has_hwrng(&self) -> bool {
        self.hwrng
    }
}
