use super::facts::ProbeReport;
use super::gate::CoreTarget;
use super::gate::GpuMode;
use super::gate::RefreshRate;

#[derive(Debug, Clone)]
pub enum TunerAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

/// Intents raised by the presentation layer. All payloads are untrusted.
#[derive(Debug, Clone)]
pub enum UserAction {
    RequestProbe,
    ToggleHelp,
    CloseOverlay,
    DismissNotices,
    NextSection,
    PrevSection,
    CursorUp,
    CursorDown,
    Activate,

    IncreaseCoreTarget,
    DecreaseCoreTarget,
    SetCoreTarget(u32),
    ApplyCoreTarget,

    SelectGpuMode(String),
    OpenGpuConfirmation,
    ToggleConfirmChoice,
    SubmitConfirmation {
        session_raw: String,
    },
    ConfirmGpuSwitch {
        session_raw: String,
    },
    CancelGpuSwitch,

    SelectRefreshRate(String),
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    ProbeFinished(ProbeReport),
    CoreLimitFinished {
        target: CoreTarget,
        result: Result<(), String>,
    },
    GpuSwitchFinished {
        mode: GpuMode,
        result: Result<(), String>,
    },
    RefreshRateFinished {
        hz: RefreshRate,
        result: Result<(), String>,
    },
}
