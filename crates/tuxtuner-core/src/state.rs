use std::collections::VecDeque;

use super::facts::DisplayFacts;
use super::facts::RateOption;
use super::gate::GpuMode;

pub const NOTICE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Loading,
    Ready,
    Unavailable(String),
}

impl Availability {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Loading => Some("Loading..."),
            Self::Ready => None,
            Self::Unavailable(reason) => Some(reason.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Cpu,
    Gpu,
    Display,
}

impl Section {
    pub fn next(self) -> Self {
        match self {
            Self::Cpu => Self::Gpu,
            Self::Gpu => Self::Display,
            Self::Display => Self::Cpu,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Cpu => Self::Display,
            Self::Gpu => Self::Cpu,
            Self::Display => Self::Gpu,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "Processor",
            Self::Gpu => "Graphics",
            Self::Display => "Display",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CpuControl {
    pub availability: Availability,
    pub total: u32,
    pub online: u32,
    pub target: u32,
    pub applying: bool,
}

impl CpuControl {
    pub fn is_enabled(&self) -> bool {
        self.availability.is_ready() && !self.applying
    }

    pub fn status_label(&self) -> String {
        if self.availability.is_ready() {
            format!("{}/{}", self.online, self.total)
        } else {
            "...".to_string()
        }
    }
}

impl Default for CpuControl {
    fn default() -> Self {
        Self {
            availability: Availability::Loading,
            total: 0,
            online: 0,
            target: 1,
            applying: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Cancel,
    SwitchAndLogOut,
}

impl ConfirmChoice {
    pub fn toggle(self) -> Self {
        match self {
            Self::Cancel => Self::SwitchAndLogOut,
            Self::SwitchAndLogOut => Self::Cancel,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cancel => "Cancel",
            Self::SwitchAndLogOut => "Switch & Log Out",
        }
    }
}

/// Pending-vs-committed GPU mode lifecycle.
///
/// `pending` is always an allowlisted mode; it only exists while it differs
/// from the committed mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuPhase {
    Idle,
    PendingChange { pending: GpuMode },
    AwaitingConfirmation { pending: GpuMode, choice: ConfirmChoice },
    Confirming { pending: GpuMode },
}

impl GpuPhase {
    pub fn pending(self) -> Option<GpuMode> {
        match self {
            Self::Idle => None,
            Self::PendingChange { pending }
            | Self::AwaitingConfirmation { pending, .. }
            | Self::Confirming { pending } => Some(pending),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::PendingChange { .. } => "Pending change",
            Self::AwaitingConfirmation { .. } => "Awaiting confirmation",
            Self::Confirming { .. } => "Switching",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GpuControl {
    pub availability: Availability,
    /// Committed mode as last probed or confirmed. May lie outside the allowlist.
    pub current: String,
    pub supported: Vec<String>,
    pub phase: GpuPhase,
}

impl GpuControl {
    pub fn is_enabled(&self) -> bool {
        self.availability.is_ready() && !matches!(self.phase, GpuPhase::Confirming { .. })
    }

    pub fn logout_warning_visible(&self) -> bool {
        matches!(
            self.phase,
            GpuPhase::PendingChange { .. } | GpuPhase::AwaitingConfirmation { .. }
        )
    }

    pub fn selected_label(&self) -> &str {
        match self.phase.pending() {
            Some(mode) => mode.label(),
            None => self.current.as_str(),
        }
    }
}

impl Default for GpuControl {
    fn default() -> Self {
        Self {
            availability: Availability::Loading,
            current: "...".to_string(),
            supported: Vec::new(),
            phase: GpuPhase::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Applying { hz: u32 },
}

#[derive(Debug, Clone)]
pub struct DisplayControl {
    pub availability: Availability,
    pub monitor: String,
    pub current_hz: Option<u32>,
    pub options: Vec<RateOption>,
    pub phase: RefreshPhase,
}

impl DisplayControl {
    pub fn is_enabled(&self) -> bool {
        self.availability.is_ready() && self.phase == RefreshPhase::Idle
    }

    pub fn native_hz(&self) -> Option<u32> {
        self.options.iter().find(|opt| opt.native).map(|opt| opt.hz)
    }

    pub fn current_is_native(&self) -> bool {
        self.current_hz.is_some() && self.current_hz == self.native_hz()
    }

    pub fn status_label(&self) -> String {
        match self.current_hz {
            Some(hz) => format!("{hz}Hz"),
            None => "Unknown".to_string(),
        }
    }

    pub fn apply_facts(&mut self, facts: DisplayFacts) {
        self.monitor = facts.monitor;
        self.current_hz = facts.current_hz;
        self.options = facts.options;
    }
}

impl Default for DisplayControl {
    fn default() -> Self {
        Self {
            availability: Availability::Loading,
            monitor: String::new(),
            current_hz: None,
            options: Vec::new(),
            phase: RefreshPhase::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warn,
    Error,
}

impl NoticeLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "ok",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSource {
    Gate,
    Probe,
    Dispatch,
    App,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub seq: u64,
    pub level: NoticeLevel,
    pub source: NoticeSource,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, source: NoticeSource, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            level,
            source,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoticeBuffer {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<Notice>,
}

impl NoticeBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn append(&mut self, mut notice: Notice) {
        notice.seq = self.next_seq;
        self.next_seq += 1;

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(notice);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.next_seq = 1;
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Notice> {
        self.buf.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.buf.back()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunerOverlay {
    None,
    Help,
}

#[derive(Debug, Clone)]
pub struct TunerSelection {
    pub section: Section,
    pub gpu_cursor: usize,
    pub rate_cursor: usize,
}

#[derive(Debug, Clone)]
pub struct TunerState {
    pub cpu: CpuControl,
    pub gpu: GpuControl,
    pub display: DisplayControl,
    pub probing: bool,
    pub overlay: TunerOverlay,
    pub selection: TunerSelection,
    pub notices: NoticeBuffer,
}

impl TunerState {
    pub fn new() -> Self {
        Self {
            cpu: CpuControl::default(),
            gpu: GpuControl::default(),
            display: DisplayControl::default(),
            probing: false,
            overlay: TunerOverlay::None,
            selection: TunerSelection {
                section: Section::Cpu,
                gpu_cursor: 0,
                rate_cursor: 0,
            },
            notices: NoticeBuffer::new(NOTICE_CAPACITY),
        }
    }

    pub fn notify(&mut self, level: NoticeLevel, source: NoticeSource, message: impl Into<String>) {
        self.notices.append(Notice::new(level, source, message));
    }

    pub fn gpu_status_label(&self) -> &str {
        match &self.gpu.availability {
            Availability::Unavailable(_) => "Unavailable",
            _ => self.gpu.current.as_str(),
        }
    }
}

impl Default for TunerState {
    fn default() -> Self {
        Self::new()
    }
}
