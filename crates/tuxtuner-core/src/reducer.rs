use super::actions::RuntimeAction;
use super::actions::TunerAction;
use super::actions::UserAction;
use super::facts::strip_rate_label;
use super::facts::ProbeReport;
use super::gate;
use super::gate::CoreTarget;
use super::gate::GpuMode;
use super::gate::MonitorName;
use super::gate::RefreshRate;
use super::gate::SessionId;
use super::state::Availability;
use super::state::ConfirmChoice;
use super::state::GpuPhase;
use super::state::NoticeLevel;
use super::state::NoticeSource;
use super::state::RefreshPhase;
use super::state::Section;
use super::state::TunerOverlay;
use super::state::TunerState;

pub const GPU_UNAVAILABLE_REASON: &str = "supergfxctl not found";
pub const NO_RATES_REASON: &str = "Could not detect refresh rates";

/// Every privileged effect carries only gate-approved values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunerEffect {
    RequestFrame,
    StartProbe,
    ApplyCoreLimit(CoreTarget),
    SwitchGpuMode {
        mode: GpuMode,
        session: SessionId,
    },
    SetRefreshRate {
        monitor: MonitorName,
        hz: RefreshRate,
    },
}

pub fn reduce(state: &mut TunerState, action: TunerAction) -> Vec<TunerEffect> {
    match action {
        TunerAction::User(user) => reduce_user(state, user),
        TunerAction::Runtime(runtime) => {
            reduce_runtime(state, runtime);
            vec![TunerEffect::RequestFrame]
        }
    }
}

fn reduce_user(state: &mut TunerState, action: UserAction) -> Vec<TunerEffect> {
    match action {
        UserAction::RequestProbe => {
            if state.probing {
                return Vec::new();
            }
            state.probing = true;
            vec![TunerEffect::StartProbe, TunerEffect::RequestFrame]
        }
        UserAction::ToggleHelp => {
            state.overlay = match state.overlay {
                TunerOverlay::Help => TunerOverlay::None,
                TunerOverlay::None => TunerOverlay::Help,
            };
            vec![TunerEffect::RequestFrame]
        }
        UserAction::CloseOverlay => {
            state.overlay = TunerOverlay::None;
            vec![TunerEffect::RequestFrame]
        }
        UserAction::DismissNotices => {
            state.notices.clear();
            vec![TunerEffect::RequestFrame]
        }
        UserAction::NextSection => {
            state.selection.section = state.selection.section.next();
            vec![TunerEffect::RequestFrame]
        }
        UserAction::PrevSection => {
            state.selection.section = state.selection.section.prev();
            vec![TunerEffect::RequestFrame]
        }
        UserAction::CursorUp => match state.selection.section {
            Section::Cpu => reduce_user(state, UserAction::IncreaseCoreTarget),
            Section::Gpu => {
                state.selection.gpu_cursor =
                    step_back(state.selection.gpu_cursor, state.gpu.supported.len());
                vec![TunerEffect::RequestFrame]
            }
            Section::Display => {
                state.selection.rate_cursor =
                    step_back(state.selection.rate_cursor, state.display.options.len());
                vec![TunerEffect::RequestFrame]
            }
        },
        UserAction::CursorDown => match state.selection.section {
            Section::Cpu => reduce_user(state, UserAction::DecreaseCoreTarget),
            Section::Gpu => {
                state.selection.gpu_cursor =
                    step_forward(state.selection.gpu_cursor, state.gpu.supported.len());
                vec![TunerEffect::RequestFrame]
            }
            Section::Display => {
                state.selection.rate_cursor =
                    step_forward(state.selection.rate_cursor, state.display.options.len());
                vec![TunerEffect::RequestFrame]
            }
        },
        UserAction::Activate => match state.selection.section {
            Section::Cpu => reduce_user(state, UserAction::ApplyCoreTarget),
            Section::Gpu => match state.gpu.supported.get(state.selection.gpu_cursor) {
                Some(raw) => {
                    let raw = raw.clone();
                    reduce_user(state, UserAction::SelectGpuMode(raw))
                }
                None => Vec::new(),
            },
            Section::Display => match state.display.options.get(state.selection.rate_cursor) {
                Some(option) => {
                    let label = option.label();
                    reduce_user(state, UserAction::SelectRefreshRate(label))
                }
                None => Vec::new(),
            },
        },

        UserAction::IncreaseCoreTarget => {
            let next = state.cpu.target.saturating_add(1);
            set_core_target(state, next)
        }
        UserAction::DecreaseCoreTarget => {
            let next = state.cpu.target.saturating_sub(1);
            set_core_target(state, next)
        }
        UserAction::SetCoreTarget(value) => set_core_target(state, value),
        UserAction::ApplyCoreTarget => {
            if !state.cpu.is_enabled() {
                return Vec::new();
            }
            match gate::validate_core_target(i64::from(state.cpu.target), state.cpu.total) {
                Ok(target) => {
                    state.cpu.applying = true;
                    state.notify(
                        NoticeLevel::Info,
                        NoticeSource::App,
                        "Applying CPU settings...",
                    );
                    vec![TunerEffect::ApplyCoreLimit(target), TunerEffect::RequestFrame]
                }
                Err(rejection) => {
                    state.notify(NoticeLevel::Error, NoticeSource::Gate, rejection.to_string());
                    vec![TunerEffect::RequestFrame]
                }
            }
        }

        UserAction::SelectGpuMode(raw) => {
            // Only an in-flight switch blocks selection. Picking another mode
            // with the dialog open replaces `pending` and closes the dialog.
            if !state.gpu.is_enabled() {
                return Vec::new();
            }
            if raw == state.gpu.current {
                state.gpu.phase = GpuPhase::Idle;
                sync_gpu_cursor(state);
                return vec![TunerEffect::RequestFrame];
            }
            match gate::validate_gpu_mode(&raw) {
                Ok(pending) => {
                    state.gpu.phase = GpuPhase::PendingChange { pending };
                }
                Err(rejection) => {
                    state.gpu.phase = GpuPhase::Idle;
                    sync_gpu_cursor(state);
                    state.notify(NoticeLevel::Error, NoticeSource::Gate, rejection.to_string());
                }
            }
            vec![TunerEffect::RequestFrame]
        }
        UserAction::OpenGpuConfirmation => {
            let GpuPhase::PendingChange { pending } = state.gpu.phase else {
                return Vec::new();
            };
            state.gpu.phase = GpuPhase::AwaitingConfirmation {
                pending,
                choice: ConfirmChoice::Cancel,
            };
            vec![TunerEffect::RequestFrame]
        }
        UserAction::ToggleConfirmChoice => {
            if let GpuPhase::AwaitingConfirmation { choice, .. } = &mut state.gpu.phase {
                *choice = choice.toggle();
                return vec![TunerEffect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::SubmitConfirmation { session_raw } => match state.gpu.phase {
            GpuPhase::AwaitingConfirmation {
                choice: ConfirmChoice::SwitchAndLogOut,
                ..
            } => reduce_user(state, UserAction::ConfirmGpuSwitch { session_raw }),
            GpuPhase::AwaitingConfirmation {
                choice: ConfirmChoice::Cancel,
                ..
            } => reduce_user(state, UserAction::CancelGpuSwitch),
            _ => Vec::new(),
        },
        UserAction::ConfirmGpuSwitch { session_raw } => {
            let GpuPhase::AwaitingConfirmation { pending, .. } = state.gpu.phase else {
                return Vec::new();
            };
            match gate::validate_session_id(&session_raw) {
                Ok(session) => {
                    state.gpu.phase = GpuPhase::Confirming { pending };
                    state.notify(
                        NoticeLevel::Warn,
                        NoticeSource::App,
                        format!("Switching to {pending} mode; your session will end."),
                    );
                    vec![
                        TunerEffect::SwitchGpuMode {
                            mode: pending,
                            session,
                        },
                        TunerEffect::RequestFrame,
                    ]
                }
                Err(rejection) => {
                    state.gpu.phase = GpuPhase::Idle;
                    sync_gpu_cursor(state);
                    state.notify(NoticeLevel::Error, NoticeSource::Gate, rejection.to_string());
                    vec![TunerEffect::RequestFrame]
                }
            }
        }
        UserAction::CancelGpuSwitch => match state.gpu.phase {
            GpuPhase::PendingChange { .. } | GpuPhase::AwaitingConfirmation { .. } => {
                state.gpu.phase = GpuPhase::Idle;
                sync_gpu_cursor(state);
                vec![TunerEffect::RequestFrame]
            }
            _ => Vec::new(),
        },

        UserAction::SelectRefreshRate(label) => {
            if !state.display.is_enabled() {
                return Vec::new();
            }
            let hz = match gate::validate_refresh_rate(strip_rate_label(&label)) {
                Ok(hz) => hz,
                Err(rejection) => {
                    state.notify(NoticeLevel::Error, NoticeSource::Gate, rejection.to_string());
                    return vec![TunerEffect::RequestFrame];
                }
            };
            if state.display.current_hz == Some(hz.hz()) {
                return Vec::new();
            }
            match gate::validate_monitor_name(&state.display.monitor) {
                Ok(monitor) => {
                    state.display.phase = RefreshPhase::Applying { hz: hz.hz() };
                    vec![
                        TunerEffect::SetRefreshRate { monitor, hz },
                        TunerEffect::RequestFrame,
                    ]
                }
                Err(rejection) => {
                    sync_rate_cursor(state);
                    state.notify(NoticeLevel::Error, NoticeSource::Gate, rejection.to_string());
                    vec![TunerEffect::RequestFrame]
                }
            }
        }
    }
}

fn reduce_runtime(state: &mut TunerState, action: RuntimeAction) {
    match action {
        RuntimeAction::ProbeFinished(report) => apply_probe_report(state, report),
        RuntimeAction::CoreLimitFinished { target, result } => {
            state.cpu.applying = false;
            match result {
                Ok(()) => {
                    state.cpu.online = target.get();
                    state.cpu.target = target.get();
                    state.notify(
                        NoticeLevel::Success,
                        NoticeSource::Dispatch,
                        "CPU thread limit applied.",
                    );
                }
                Err(detail) => {
                    state.cpu.target = state.cpu.online.clamp(1, state.cpu.total.max(1));
                    state.notify(
                        NoticeLevel::Error,
                        NoticeSource::Dispatch,
                        with_detail("Failed to apply CPU settings.", &detail),
                    );
                }
            }
        }
        RuntimeAction::GpuSwitchFinished { mode, result } => {
            if state.gpu.phase != (GpuPhase::Confirming { pending: mode }) {
                return;
            }
            state.gpu.phase = GpuPhase::Idle;
            match result {
                Ok(()) => {
                    state.gpu.current = mode.label().to_string();
                    state.notify(
                        NoticeLevel::Success,
                        NoticeSource::Dispatch,
                        format!("Graphics mode switched to {mode}."),
                    );
                }
                Err(detail) => {
                    state.notify(
                        NoticeLevel::Error,
                        NoticeSource::Dispatch,
                        with_detail("GPU switch failed.", &detail),
                    );
                }
            }
            sync_gpu_cursor(state);
        }
        RuntimeAction::RefreshRateFinished { hz, result } => {
            state.display.phase = RefreshPhase::Idle;
            match result {
                Ok(()) => {
                    state.display.current_hz = Some(hz.hz());
                    state.notify(
                        NoticeLevel::Success,
                        NoticeSource::Dispatch,
                        format!("Refresh rate set to {}Hz", hz.hz()),
                    );
                }
                Err(detail) => {
                    state.notify(
                        NoticeLevel::Error,
                        NoticeSource::Dispatch,
                        with_detail("Failed to change refresh rate.", &detail),
                    );
                }
            }
            sync_rate_cursor(state);
        }
    }
}

fn apply_probe_report(state: &mut TunerState, report: ProbeReport) {
    state.probing = false;

    match report.cpu {
        Ok(topology) => {
            state.cpu.availability = Availability::Ready;
            state.cpu.total = topology.total;
            state.cpu.online = topology.online;
            if !state.cpu.applying {
                state.cpu.target = topology.online.clamp(1, topology.total.max(1));
            }
        }
        Err(reason) => {
            state.cpu.availability = Availability::Unavailable(reason);
        }
    }

    match report.gpu {
        Ok(facts) if !facts.supported.is_empty() => {
            state.gpu.availability = Availability::Ready;
            state.gpu.current = facts.current;
            state.gpu.supported = facts.supported;
            reconcile_pending(state);
        }
        Ok(_) => mark_gpu_unavailable(state, GPU_UNAVAILABLE_REASON.to_string()),
        Err(reason) => mark_gpu_unavailable(state, reason),
    }
    sync_gpu_cursor(state);

    match report.display {
        Ok(facts) => {
            state.display.apply_facts(facts);
            state.display.availability = if state.display.options.is_empty() {
                Availability::Unavailable(NO_RATES_REASON.to_string())
            } else {
                Availability::Ready
            };
        }
        Err(reason) => {
            state.display.availability = Availability::Unavailable(reason);
        }
    }
    sync_rate_cursor(state);
}

fn mark_gpu_unavailable(state: &mut TunerState, reason: String) {
    state.gpu.availability = Availability::Unavailable(reason);
    state.gpu.supported.clear();
    if !matches!(state.gpu.phase, GpuPhase::Confirming { .. }) {
        state.gpu.phase = GpuPhase::Idle;
    }
}

fn reconcile_pending(state: &mut TunerState) {
    match state.gpu.phase {
        GpuPhase::PendingChange { pending } | GpuPhase::AwaitingConfirmation { pending, .. }
            if pending.label() == state.gpu.current =>
        {
            state.gpu.phase = GpuPhase::Idle;
        }
        _ => {}
    }
}

fn set_core_target(state: &mut TunerState, value: u32) -> Vec<TunerEffect> {
    if !state.cpu.is_enabled() {
        return Vec::new();
    }
    state.cpu.target = value.clamp(1, state.cpu.total.max(1));
    vec![TunerEffect::RequestFrame]
}

fn sync_gpu_cursor(state: &mut TunerState) {
    let selected = state.gpu.selected_label().to_string();
    state.selection.gpu_cursor = state
        .gpu
        .supported
        .iter()
        .position(|mode| *mode == selected)
        .unwrap_or(0);
}

fn sync_rate_cursor(state: &mut TunerState) {
    let current = state.display.current_hz;
    state.selection.rate_cursor = state
        .display
        .options
        .iter()
        .position(|opt| Some(opt.hz) == current)
        .unwrap_or(0);
}

fn step_back(cursor: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else if cursor == 0 {
        len - 1
    } else {
        cursor - 1
    }
}

fn step_forward(cursor: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (cursor + 1) % len
    }
}

fn with_detail(message: &str, detail: &str) -> String {
    let detail = detail.trim();
    if detail.is_empty() {
        message.to_string()
    } else {
        format!("{message} {detail}")
    }
}

#[cfg(test)]
mod tests;
