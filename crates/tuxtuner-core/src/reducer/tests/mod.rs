pub(super) use super::reduce;
pub(super) use super::TunerEffect;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::TunerAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::facts::CoreTopology;
pub(super) use crate::facts::DisplayFacts;
pub(super) use crate::facts::GpuFacts;
pub(super) use crate::facts::ProbeReport;
pub(super) use crate::gate;
pub(super) use crate::gate::GpuMode;
pub(super) use crate::state::Availability;
pub(super) use crate::state::ConfirmChoice;
pub(super) use crate::state::GpuPhase;
pub(super) use crate::state::NoticeBuffer;
pub(super) use crate::state::NoticeLevel;
pub(super) use crate::state::NoticeSource;
pub(super) use crate::state::RefreshPhase;
pub(super) use crate::state::Section;
pub(super) use crate::state::TunerOverlay;
pub(super) use crate::state::TunerState;

mod core_limit;

fn report(
    cpu: Result<CoreTopology, String>,
    gpu: Result<GpuFacts, String>,
    display: Result<DisplayFacts, String>,
) -> ProbeReport {
    ProbeReport { cpu, gpu, display }
}

fn gpu_facts(supported: &[&str], current: &str) -> GpuFacts {
    GpuFacts {
        supported: supported.iter().map(|mode| mode.to_string()).collect(),
        current: current.to_string(),
    }
}

fn display_facts(monitor: &str, current: f64, modes: &[&str]) -> DisplayFacts {
    DisplayFacts::from_modes(monitor.to_string(), current, modes)
}

fn laptop_report() -> ProbeReport {
    report(
        Ok(CoreTopology {
            total: 16,
            online: 8,
        }),
        Ok(gpu_facts(&["Integrated", "Hybrid"], "Hybrid")),
        Ok(display_facts(
            "DP-1",
            60.0,
            &["1920x1200@60.00Hz", "1920x1200@165.01Hz"],
        )),
    )
}

/// A state that has completed one successful probe.
fn probed_state() -> TunerState {
    let mut state = TunerState::new();
    user(&mut state, UserAction::RequestProbe);
    run_runtime(&mut state, RuntimeAction::ProbeFinished(laptop_report()));
    state
}

fn user(state: &mut TunerState, action: UserAction) -> Vec<TunerEffect> {
    reduce(state, TunerAction::User(action))
}

fn run_runtime(state: &mut TunerState, action: RuntimeAction) {
    let effects = reduce(state, TunerAction::Runtime(action));
    assert!(matches!(effects.as_slice(), [TunerEffect::RequestFrame]));
}

fn has_privileged_effect(effects: &[TunerEffect]) -> bool {
    effects.iter().any(|effect| {
        matches!(
            effect,
            TunerEffect::ApplyCoreLimit(_)
                | TunerEffect::SwitchGpuMode { .. }
                | TunerEffect::SetRefreshRate { .. }
        )
    })
}

fn latest_notice(state: &TunerState) -> (NoticeLevel, NoticeSource, String) {
    let notice = state.notices.latest().expect("a notice should be present");
    (notice.level, notice.source, notice.message.clone())
}
