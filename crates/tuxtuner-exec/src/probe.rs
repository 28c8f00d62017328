//! Read-only host queries: sysfs core topology, `supergfxctl`, `hyprctl`.
//!
//! Each source fails on its own. A failed source degrades one control and
//! never aborts the others.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;
use tracing::warn;
use tuxtuner_core::config::Config;
use tuxtuner_core::facts::CoreTopology;
use tuxtuner_core::facts::DisplayFacts;
use tuxtuner_core::facts::GpuFacts;
use tuxtuner_core::facts::ProbeReport;

use crate::contracts::CommandOutput;
use crate::contracts::CommandRunner;
use crate::contracts::Invocation;
use crate::error::ProbeError;

#[derive(Debug, Clone, Deserialize)]
struct HyprMonitor {
    name: String,
    #[serde(rename = "refreshRate")]
    refresh_rate: f64,
    #[serde(rename = "availableModes", default)]
    available_modes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StateProbe<R> {
    runner: R,
    gpu_cli: String,
    display_cli: String,
    cpu_sysfs_root: PathBuf,
    core_fallback: Option<u32>,
}

impl<R: CommandRunner> StateProbe<R> {
    pub fn new(runner: R, config: &Config) -> Self {
        Self {
            runner,
            gpu_cli: config.probe.gpu_cli.clone(),
            display_cli: config.probe.display_cli.clone(),
            cpu_sysfs_root: config.probe.cpu_sysfs_root.clone(),
            core_fallback: config.probe.core_fallback,
        }
    }

    /// Runs every query. Failures become per-source reasons in the report.
    pub fn probe_all(&self) -> ProbeReport {
        ProbeReport {
            cpu: degrade("cpu", self.probe_cores()),
            gpu: degrade("gpu", self.probe_gpu()),
            display: degrade("display", self.probe_display()),
        }
    }

    pub fn probe_cores(&self) -> Result<CoreTopology, ProbeError> {
        let counted = count_cores(&self.cpu_sysfs_root);
        match (counted, self.core_fallback) {
            (Ok(topology), _) => Ok(topology),
            (Err(err), Some(fallback)) if fallback > 0 => {
                warn!(error = %err, fallback, "core enumeration failed; using configured fallback");
                Ok(CoreTopology {
                    total: fallback,
                    online: fallback,
                })
            }
            (Err(err), _) => Err(err),
        }
    }

    pub fn probe_gpu(&self) -> Result<GpuFacts, ProbeError> {
        let supported = self.query(Invocation::new(&self.gpu_cli).arg("-s"))?;
        let supported = parse_supported_modes(&supported.stdout);
        if supported.is_empty() {
            return Err(ProbeError::Empty(format!(
                "{} reported no supported modes",
                self.gpu_cli
            )));
        }
        let current = self.query(Invocation::new(&self.gpu_cli).arg("-g"))?;
        Ok(GpuFacts {
            supported,
            current: current.stdout.trim().to_string(),
        })
    }

    pub fn probe_display(&self) -> Result<DisplayFacts, ProbeError> {
        let output = self.query(Invocation::new(&self.display_cli).arg("monitors").arg("-j"))?;
        parse_first_monitor(&output.stdout)
    }

    fn query(&self, invocation: Invocation) -> Result<CommandOutput, ProbeError> {
        let program = invocation.program_lossy();
        debug!(argv = ?invocation.argv_lossy(), "probing");
        let output = self.runner.run(&invocation).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ProbeError::Unavailable {
                    program: program.clone(),
                }
            } else {
                ProbeError::Io {
                    context: format!("failed to run {program}"),
                    source,
                }
            }
        })?;
        if !output.success() {
            return Err(ProbeError::Exit {
                program,
                code: output.code,
            });
        }
        Ok(output)
    }
}

fn degrade<T>(source: &str, result: Result<T, ProbeError>) -> Result<T, String> {
    result.map_err(|err| {
        warn!(source, error = %err, "probe degraded");
        err.to_string()
    })
}

/// Counts `cpuN` entries under `root`. cpu0 is always online; the rest must
/// read `1` from their `online` file.
pub fn count_cores(root: &Path) -> Result<CoreTopology, ProbeError> {
    let entries = fs::read_dir(root).map_err(|source| ProbeError::Io {
        context: format!("cannot read {}", root.display()),
        source,
    })?;

    let mut total = 0u32;
    let mut online = 0u32;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(index) = name
            .to_str()
            .and_then(|name| name.strip_prefix("cpu"))
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u32>().ok())
        else {
            continue;
        };
        total += 1;
        if index == 0 || read_online_flag(&entry.path()) {
            online += 1;
        }
    }

    if total == 0 {
        return Err(ProbeError::Empty(format!(
            "no cpu entries under {}",
            root.display()
        )));
    }
    Ok(CoreTopology { total, online })
}

fn read_online_flag(cpu_dir: &Path) -> bool {
    fs::read_to_string(cpu_dir.join("online"))
        .map(|content| content.trim() == "1")
        .unwrap_or(false)
}

/// `[Integrated, Hybrid, AsusMuxDgpu]` -> each trimmed entry, empties dropped.
pub fn parse_supported_modes(stdout: &str) -> Vec<String> {
    let trimmed = stdout.trim();
    let inner = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    inner
        .split(',')
        .map(str::trim)
        .filter(|mode| !mode.is_empty())
        .map(str::to_string)
        .collect()
}

/// Facts for the first monitor in `hyprctl monitors -j` output.
pub fn parse_first_monitor(json: &str) -> Result<DisplayFacts, ProbeError> {
    let monitors: Vec<HyprMonitor> =
        serde_json::from_str(json).map_err(|err| ProbeError::Parse {
            what: "monitor list".to_string(),
            reason: err.to_string(),
        })?;
    let monitor = monitors
        .into_iter()
        .next()
        .ok_or_else(|| ProbeError::Empty("no monitors reported".to_string()))?;
    Ok(DisplayFacts::from_modes(
        monitor.name,
        monitor.refresh_rate,
        &monitor.available_modes,
    ))
}
