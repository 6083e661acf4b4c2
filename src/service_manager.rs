//! systemd service control through `systemctl`.

use crate::command_executor::HostCommand;
use crate::error::BackendResult;
use crate::host::ServiceManager;
use crate::types::UnitAction;

/// `systemctl` backed `ServiceManager`
#[derive(Debug, Clone, Copy, Default)]
pub struct Systemctl;

impl Systemctl {
    fn run(&self, action: UnitAction, unit: &str) -> BackendResult<()> {
        HostCommand::Systemctl {
            action,
            unit: unit.to_string(),
        }
        .execute()?;
        log::info!("{} {}: ok", action, unit);
        Ok(())
    }
}

impl ServiceManager for Systemctl {
    fn start(&self, unit: &str) -> BackendResult<()> {
        self.run(UnitAction::Start, unit)
    }

    fn stop(&self, unit: &str) -> BackendResult<()> {
        self.run(UnitAction::Stop, unit)
    }

    fn reload(&self, unit: &str) -> BackendResult<()> {
        self.run(UnitAction::Reload, unit)
    }

    fn restart(&self, unit: &str) -> BackendResult<()> {
        self.run(UnitAction::Restart, unit)
    }
}
