//! Builds and runs the privileged calls.
//!
//! Every public entry point takes gate types from `tuxtuner_core::gate`, so a
//! raw probe or UI string cannot reach an argument vector built here.

use std::path::PathBuf;

use tracing::info;
use tracing::warn;
use tuxtuner_core::config::Config;
use tuxtuner_core::gate::CoreTarget;
use tuxtuner_core::gate::GpuMode;
use tuxtuner_core::gate::MonitorName;
use tuxtuner_core::gate::RefreshRate;
use tuxtuner_core::gate::SessionId;

use crate::contracts::CommandRunner;
use crate::contracts::Invocation;
use crate::error::DispatchError;

#[derive(Debug, Clone)]
pub struct PrivilegedDispatcher<R> {
    runner: R,
    escalator: String,
    helper: PathBuf,
    display_cli: String,
}

impl<R: CommandRunner> PrivilegedDispatcher<R> {
    pub fn new(runner: R, config: &Config) -> Self {
        Self {
            runner,
            escalator: config.helper.escalator.clone(),
            helper: config.helper.path.clone(),
            display_cli: config.probe.display_cli.clone(),
        }
    }

    /// `<escalator> <helper> cpu <N>`
    pub fn core_limit_invocation(&self, target: CoreTarget) -> Invocation {
        self.helper_invocation()
            .arg("cpu")
            .arg(target.get().to_string())
    }

    /// `<escalator> <helper> gpu <MODE> [--logout <ID>]`
    pub fn gpu_switch_invocation(&self, mode: GpuMode, session: &SessionId) -> Invocation {
        let invocation = self.helper_invocation().arg("gpu").arg(mode.label());
        match session.as_deref() {
            Some(id) => invocation.arg("--logout").arg(id),
            None => invocation,
        }
    }

    /// `hyprctl keyword monitor <monitor>,preferred@<hz>,auto,1`
    pub fn refresh_rate_invocation(&self, monitor: &MonitorName, hz: RefreshRate) -> Invocation {
        Invocation::new(&self.display_cli)
            .arg("keyword")
            .arg("monitor")
            .arg(compose_monitor_keyword(monitor, hz))
    }

    pub fn apply_core_limit(&self, target: CoreTarget) -> Result<(), DispatchError> {
        self.execute(self.core_limit_invocation(target))
    }

    pub fn switch_gpu_mode(&self, mode: GpuMode, session: &SessionId) -> Result<(), DispatchError> {
        self.execute(self.gpu_switch_invocation(mode, session))
    }

    pub fn set_refresh_rate(&self, monitor: &MonitorName, hz: RefreshRate) -> Result<(), DispatchError> {
        self.execute(self.refresh_rate_invocation(monitor, hz))
    }

    fn helper_invocation(&self) -> Invocation {
        Invocation::new(&self.escalator).arg(&self.helper)
    }

    /// Single attempt. Exit 0 is success; anything else is terminal.
    fn execute(&self, invocation: Invocation) -> Result<(), DispatchError> {
        let program = invocation.program_lossy();
        info!(argv = ?invocation.argv_lossy(), "dispatching");

        let output = self.runner.run(&invocation).map_err(|source| {
            warn!(%program, error = %source, "launch failed");
            DispatchError::Launch {
                program: program.clone(),
                source,
            }
        })?;

        if output.success() {
            info!(%program, "dispatch succeeded");
            return Ok(());
        }
        warn!(%program, code = ?output.code, stderr = %output.stderr.trim(), "dispatch failed");
        Err(DispatchError::Failed {
            program,
            code: output.code,
            stderr: output.stderr,
        })
    }
}

/// Comma-joined monitor rule accepted by `hyprctl keyword monitor`.
pub fn compose_monitor_keyword(monitor: &MonitorName, hz: RefreshRate) -> String {
    format!("{monitor},preferred@{},auto,1", hz.hz())
}
