use std::any::Any;
use std::io;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;
use ratatui::Terminal;
use tracing::debug;
use tracing::error;
use tracing::info;

use tuxtuner_core::actions::{RuntimeAction, TunerAction, UserAction};
use tuxtuner_core::config::Config;
use tuxtuner_core::facts::ProbeReport;
use tuxtuner_core::gate;
use tuxtuner_core::reducer::{reduce, TunerEffect};
use tuxtuner_core::state::{
    Availability, ConfirmChoice, GpuPhase, NoticeLevel, RefreshPhase, Section, TunerOverlay,
    TunerState,
};
use tuxtuner_exec::{DispatchError, PrivilegedDispatcher, StateProbe, SystemRunner};

use crate::read_session_env;

const TICK: Duration = Duration::from_millis(120);
const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
    let _guard = TuiGuard; // Ensures terminal is restored on exit or panic

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut state = TunerState::new();

    info!("tui started");
    run_app(&mut terminal, &mut state, config)?;
    info!("tui exited");
    Ok(())
}

enum LoopEvent {
    Input(Event),
    InputFailed(String),
    Worker(RuntimeAction),
}

struct Workers {
    tx: mpsc::Sender<LoopEvent>,
    probe: Arc<StateProbe<SystemRunner>>,
    dispatcher: Arc<PrivilegedDispatcher<SystemRunner>>,
}

impl Workers {
    fn new(tx: mpsc::Sender<LoopEvent>, config: &Config) -> Self {
        Self {
            tx,
            probe: Arc::new(StateProbe::new(SystemRunner, config)),
            dispatcher: Arc::new(PrivilegedDispatcher::new(SystemRunner, config)),
        }
    }

    fn start(&self, effect: TunerEffect) {
        match effect {
            TunerEffect::RequestFrame => {}
            TunerEffect::StartProbe => {
                let probe = Arc::clone(&self.probe);
                spawn_worker(
                    &self.tx,
                    move || RuntimeAction::ProbeFinished(probe.probe_all()),
                    |detail| {
                        RuntimeAction::ProbeFinished(ProbeReport {
                            cpu: Err(detail.clone()),
                            gpu: Err(detail.clone()),
                            display: Err(detail),
                        })
                    },
                );
            }
            TunerEffect::ApplyCoreLimit(target) => {
                let dispatcher = Arc::clone(&self.dispatcher);
                spawn_worker(
                    &self.tx,
                    move || RuntimeAction::CoreLimitFinished {
                        target,
                        result: dispatcher.apply_core_limit(target).map_err(|e| e.detail()),
                    },
                    move |detail| RuntimeAction::CoreLimitFinished {
                        target,
                        result: Err(detail),
                    },
                );
            }
            TunerEffect::SwitchGpuMode { mode, session } => {
                let dispatcher = Arc::clone(&self.dispatcher);
                spawn_worker(
                    &self.tx,
                    move || RuntimeAction::GpuSwitchFinished {
                        mode,
                        result: dispatcher
                            .switch_gpu_mode(mode, &session)
                            .map_err(|e| e.detail()),
                    },
                    move |detail| RuntimeAction::GpuSwitchFinished {
                        mode,
                        result: Err(detail),
                    },
                );
            }
            TunerEffect::SetRefreshRate { monitor, hz } => {
                let dispatcher = Arc::clone(&self.dispatcher);
                spawn_worker(
                    &self.tx,
                    move || RuntimeAction::RefreshRateFinished {
                        hz,
                        result: dispatcher
                            .set_refresh_rate(&monitor, hz)
                            .map_err(|e| e.detail()),
                    },
                    move |detail| RuntimeAction::RefreshRateFinished {
                        hz,
                        result: Err(detail),
                    },
                );
            }
        }
    }
}

/// Short-lived worker. A panic becomes the control's failure result so the
/// control is always re-enabled.
fn spawn_worker<J, P>(tx: &mpsc::Sender<LoopEvent>, job: J, on_panic: P)
where
    J: FnOnce() -> RuntimeAction + Send + 'static,
    P: FnOnce(String) -> RuntimeAction + Send + 'static,
{
    let tx = tx.clone();
    thread::spawn(move || {
        let action = match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(action) => action,
            Err(payload) => {
                let detail = DispatchError::Unexpected(panic_message(payload.as_ref())).to_string();
                error!(%detail, "worker panicked");
                on_panic(detail)
            }
        };
        let _ = tx.send(LoopEvent::Worker(action));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker stopped".to_string()
    }
}

fn spawn_input_reader(tx: mpsc::Sender<LoopEvent>) {
    thread::spawn(move || loop {
        match event::read() {
            Ok(event) => {
                if tx.send(LoopEvent::Input(event)).is_err() {
                    return;
                }
            }
            Err(err) => {
                let _ = tx.send(LoopEvent::InputFailed(err.to_string()));
                return;
            }
        }
    });
}

fn is_busy(state: &TunerState) -> bool {
    state.probing
        || state.cpu.applying
        || matches!(state.gpu.phase, GpuPhase::Confirming { .. })
        || matches!(state.display.phase, RefreshPhase::Applying { .. })
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &mut TunerState,
    config: &Config,
) -> io::Result<()> {
    let (tx, rx) = mpsc::channel();
    spawn_input_reader(tx.clone());
    let workers = Workers::new(tx, config);
    let session_var = config.session.env_var.as_str();

    let mut pending = reduce(state, TunerAction::User(UserAction::RequestProbe));
    let mut tick = 0usize;

    loop {
        let mut needs_frame = false;
        for effect in pending.drain(..) {
            if matches!(effect, TunerEffect::RequestFrame) {
                needs_frame = true;
            } else {
                workers.start(effect);
            }
        }
        if needs_frame {
            terminal.draw(|f| ui(f, state, tick))?;
        }

        let event = match rx.recv_timeout(TICK) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => {
                if is_busy(state) {
                    tick = tick.wrapping_add(1);
                    pending.push(TunerEffect::RequestFrame);
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        };

        match event {
            LoopEvent::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                match handle_key_event(key, state, session_var) {
                    KeyHandlerResult::Continue(effects) => pending.extend(effects),
                    KeyHandlerResult::Exit => return Ok(()),
                }
            }
            LoopEvent::Input(Event::Resize(..)) => pending.push(TunerEffect::RequestFrame),
            LoopEvent::Input(_) => {}
            LoopEvent::InputFailed(err) => return Err(io::Error::other(err)),
            LoopEvent::Worker(action) => {
                debug!(?action, "worker finished");
                pending.extend(reduce(state, TunerAction::Runtime(action)));
            }
        }
    }
}

enum KeyHandlerResult {
    Continue(Vec<TunerEffect>),
    Exit,
}

fn user(state: &mut TunerState, action: UserAction) -> KeyHandlerResult {
    KeyHandlerResult::Continue(reduce(state, TunerAction::User(action)))
}

fn handle_key_event(
    key: event::KeyEvent,
    state: &mut TunerState,
    session_var: &str,
) -> KeyHandlerResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyHandlerResult::Exit;
    }
    if state.overlay == TunerOverlay::Help {
        return handle_help_keys(key, state);
    }
    if matches!(state.gpu.phase, GpuPhase::AwaitingConfirmation { .. }) {
        return handle_confirm_keys(key, state, session_var);
    }
    handle_global_keys(key, state)
}

fn handle_help_keys(key: event::KeyEvent, state: &mut TunerState) -> KeyHandlerResult {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            user(state, UserAction::CloseOverlay)
        }
        _ => KeyHandlerResult::Continue(Vec::new()),
    }
}

fn handle_confirm_keys(
    key: event::KeyEvent,
    state: &mut TunerState,
    session_var: &str,
) -> KeyHandlerResult {
    match key.code {
        KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
            user(state, UserAction::ToggleConfirmChoice)
        }
        KeyCode::Enter => user(
            state,
            UserAction::SubmitConfirmation {
                session_raw: read_session_env(session_var),
            },
        ),
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('q') => {
            user(state, UserAction::CancelGpuSwitch)
        }
        _ => KeyHandlerResult::Continue(Vec::new()),
    }
}

fn handle_global_keys(key: event::KeyEvent, state: &mut TunerState) -> KeyHandlerResult {
    match key.code {
        KeyCode::Char('q') => KeyHandlerResult::Exit,
        KeyCode::Char('?') => user(state, UserAction::ToggleHelp),
        KeyCode::Char('r') => user(state, UserAction::RequestProbe),
        KeyCode::Char('c') => user(state, UserAction::DismissNotices),
        KeyCode::Tab => user(state, UserAction::NextSection),
        KeyCode::BackTab => user(state, UserAction::PrevSection),
        KeyCode::Up | KeyCode::Char('k') => user(state, UserAction::CursorUp),
        KeyCode::Down | KeyCode::Char('j') => user(state, UserAction::CursorDown),
        KeyCode::Right | KeyCode::Char('+') if state.selection.section == Section::Cpu => {
            user(state, UserAction::IncreaseCoreTarget)
        }
        KeyCode::Left | KeyCode::Char('-') if state.selection.section == Section::Cpu => {
            user(state, UserAction::DecreaseCoreTarget)
        }
        KeyCode::Enter | KeyCode::Char(' ') => user(state, UserAction::Activate),
        KeyCode::Char('L') | KeyCode::Char('l') if state.gpu.logout_warning_visible() => {
            user(state, UserAction::OpenGpuConfirmation)
        }
        KeyCode::Esc if state.gpu.logout_warning_visible() => {
            user(state, UserAction::CancelGpuSwitch)
        }
        _ => KeyHandlerResult::Continue(Vec::new()),
    }
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    border: Color,
    panel_bg: Color,
    selected_bg: Color,
}

const PALETTE: UiPalette = UiPalette {
    accent: Color::Cyan,
    success: Color::Green,
    warning: Color::Yellow,
    danger: Color::Red,
    muted: Color::DarkGray,
    border: Color::Gray,
    panel_bg: Color::Black,
    selected_bg: Color::DarkGray,
};

fn spinner(tick: usize) -> &'static str {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

fn ui(f: &mut Frame, state: &TunerState, tick: usize) {
    let palette = PALETTE;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Status
            Constraint::Length(5), // Processor
            Constraint::Min(8),    // Graphics
            Constraint::Min(6),    // Display
            Constraint::Length(5), // Notices
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_status(f, chunks[0], state, palette, tick);
    render_cpu(f, chunks[1], state, palette, tick);
    render_gpu(f, chunks[2], state, palette, tick);
    render_display(f, chunks[3], state, palette, tick);
    render_notices(f, chunks[4], state, palette);
    render_action_bar(f, chunks[5], state, palette);

    if let GpuPhase::AwaitingConfirmation { pending, choice } = state.gpu.phase {
        render_confirm_dialog(f, pending, choice, palette);
    }
    if state.overlay == TunerOverlay::Help {
        render_help(f, palette);
    }
}

fn section_block(title: String, focused: bool, palette: UiPalette) -> Block<'static> {
    let border = if focused { palette.accent } else { palette.border };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(palette.panel_bg))
}

fn reason_line(availability: &Availability, palette: UiPalette) -> Option<Line<'static>> {
    let reason = availability.reason()?;
    let color = match availability {
        Availability::Unavailable(_) => palette.danger,
        _ => palette.muted,
    };
    Some(Line::from(Span::styled(
        reason.to_string(),
        Style::default().fg(color),
    )))
}

fn render_status(f: &mut Frame, area: Rect, state: &TunerState, palette: UiPalette, tick: usize) {
    let mut spans = vec![
        Span::styled("Graphics ", Style::default().fg(palette.muted)),
        Span::styled(
            state.gpu_status_label().to_string(),
            Style::default().fg(palette.accent),
        ),
        Span::styled("  |  Threads ", Style::default().fg(palette.muted)),
        Span::styled(state.cpu.status_label(), Style::default().fg(palette.accent)),
        Span::styled("  |  Refresh ", Style::default().fg(palette.muted)),
        Span::styled(
            state.display.status_label(),
            Style::default().fg(palette.accent),
        ),
    ];
    if state.display.current_is_native() {
        spans.push(Span::styled(
            " NATIVE",
            Style::default()
                .fg(palette.success)
                .add_modifier(Modifier::BOLD),
        ));
    }
    if state.probing {
        spans.push(Span::styled(
            format!("  {} probing", spinner(tick)),
            Style::default().fg(palette.muted),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title("TuxTuner")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .style(Style::default().bg(palette.panel_bg)),
        );
    f.render_widget(header, area);
}

fn render_cpu(f: &mut Frame, area: Rect, state: &TunerState, palette: UiPalette, tick: usize) {
    let focused = state.selection.section == Section::Cpu;
    let block = section_block(Section::Cpu.label().to_string(), focused, palette);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let cpu = &state.cpu;
    if let Some(line) = reason_line(&cpu.availability, palette) {
        f.render_widget(Paragraph::new(line), rows[0]);
        return;
    }

    let summary = Line::from(vec![
        Span::styled("Active threads ", Style::default().fg(palette.muted)),
        Span::raw(cpu.status_label()),
        Span::styled("   Target ", Style::default().fg(palette.muted)),
        Span::styled(
            format!("< {} >", cpu.target),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(Paragraph::new(summary), rows[0]);

    let ratio = if cpu.total == 0 {
        0.0
    } else {
        (f64::from(cpu.target) / f64::from(cpu.total)).clamp(0.0, 1.0)
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(palette.accent).bg(palette.panel_bg))
        .ratio(ratio)
        .label(format!("{} of {} threads", cpu.target, cpu.total));
    f.render_widget(gauge, rows[1]);

    let hint = if cpu.applying {
        Line::from(Span::styled(
            format!("{} Applying CPU settings...", spinner(tick)),
            Style::default().fg(palette.warning),
        ))
    } else {
        Line::from(Span::styled(
            "←/→ adjust  Enter apply",
            Style::default().fg(palette.muted),
        ))
    };
    f.render_widget(Paragraph::new(hint), rows[2]);
}

fn render_gpu(f: &mut Frame, area: Rect, state: &TunerState, palette: UiPalette, tick: usize) {
    let focused = state.selection.section == Section::Gpu;
    let gpu = &state.gpu;
    let title = format!("{} ({})", Section::Gpu.label(), gpu.phase.label());
    let block = section_block(title, focused, palette);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)])
        .split(inner);

    if let Some(line) = reason_line(&gpu.availability, palette) {
        f.render_widget(Paragraph::new(line), rows[0]);
        return;
    }

    let selected = gpu.selected_label();
    let items: Vec<ListItem> = gpu
        .supported
        .iter()
        .enumerate()
        .map(|(index, mode)| {
            let cursor = if focused && index == state.selection.gpu_cursor {
                "› "
            } else {
                "  "
            };
            let marker = if *mode == gpu.current { "● " } else { "○ " };
            let mut style = Style::default();
            let mut suffix = String::new();
            if *mode == gpu.current {
                style = style.fg(palette.success);
            }
            if *mode == selected && *mode != gpu.current {
                style = style.fg(palette.warning).add_modifier(Modifier::BOLD);
                suffix.push_str("  (pending)");
            }
            if gate::validate_gpu_mode(mode).is_err() {
                style = style.fg(palette.muted);
                suffix.push_str("  (not switchable)");
            }
            if focused && index == state.selection.gpu_cursor {
                style = style.bg(palette.selected_bg);
            }
            ListItem::new(Line::from(vec![
                Span::styled(cursor, Style::default().fg(palette.accent)),
                Span::styled(format!("{marker}{mode}{suffix}"), style),
            ]))
        })
        .collect();
    f.render_widget(List::new(items), rows[0]);

    let banner = match gpu.phase {
        GpuPhase::PendingChange { pending } | GpuPhase::AwaitingConfirmation { pending, .. } => {
            Some(Line::from(vec![
                Span::styled(
                    format!("Switching to {pending} will log you out. "),
                    Style::default()
                        .fg(palette.warning)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("L", Style::default().fg(palette.danger)),
                Span::styled(" Switch & Log Out  ", Style::default().fg(palette.muted)),
                Span::styled("Esc", Style::default().fg(palette.accent)),
                Span::styled(" keep current", Style::default().fg(palette.muted)),
            ]))
        }
        GpuPhase::Confirming { pending } => Some(Line::from(Span::styled(
            format!("{} Switching to {pending}...", spinner(tick)),
            Style::default().fg(palette.warning),
        ))),
        GpuPhase::Idle => None,
    };
    if let Some(banner) = banner {
        f.render_widget(Paragraph::new(banner).wrap(Wrap { trim: true }), rows[1]);
    }
}

fn render_display(f: &mut Frame, area: Rect, state: &TunerState, palette: UiPalette, tick: usize) {
    let focused = state.selection.section == Section::Display;
    let display = &state.display;
    let title = if display.monitor.is_empty() {
        Section::Display.label().to_string()
    } else {
        format!("{} ({})", Section::Display.label(), display.monitor)
    };
    let block = section_block(title, focused, palette);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    if let Some(line) = reason_line(&display.availability, palette) {
        f.render_widget(Paragraph::new(line), rows[0]);
        return;
    }

    let items: Vec<ListItem> = display
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let under_cursor = focused && index == state.selection.rate_cursor;
            let is_current = display.current_hz == Some(option.hz);
            let mut style = Style::default();
            if is_current {
                style = style.fg(palette.success);
            }
            if under_cursor {
                style = style.bg(palette.selected_bg);
            }
            let cursor = if under_cursor { "› " } else { "  " };
            let marker = if is_current { "● " } else { "○ " };
            ListItem::new(Line::from(vec![
                Span::styled(cursor, Style::default().fg(palette.accent)),
                Span::styled(format!("{marker}{}", option.label()), style),
            ]))
        })
        .collect();
    f.render_widget(List::new(items), rows[0]);

    if let RefreshPhase::Applying { hz } = display.phase {
        let line = Line::from(Span::styled(
            format!("{} Applying {hz}Hz...", spinner(tick)),
            Style::default().fg(palette.warning),
        ));
        f.render_widget(Paragraph::new(line), rows[1]);
    }
}

fn notice_color(level: NoticeLevel, palette: UiPalette) -> Color {
    match level {
        NoticeLevel::Info => palette.accent,
        NoticeLevel::Success => palette.success,
        NoticeLevel::Warn => palette.warning,
        NoticeLevel::Error => palette.danger,
    }
}

fn render_notices(f: &mut Frame, area: Rect, state: &TunerState, palette: UiPalette) {
    let visible = usize::from(area.height.saturating_sub(2));
    let mut lines: Vec<Line> = state
        .notices
        .iter()
        .rev()
        .take(visible)
        .map(|notice| {
            Line::from(vec![
                Span::styled(
                    format!("{:>5} ", notice.level.label()),
                    Style::default().fg(notice_color(notice.level, palette)),
                ),
                Span::raw(notice.message.clone()),
            ])
        })
        .collect();
    lines.reverse();

    let block = Block::default()
        .title("Notifications")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(Style::default().bg(palette.panel_bg));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_action_bar(f: &mut Frame, area: Rect, state: &TunerState, palette: UiPalette) {
    let text = Line::from(vec![
        Span::styled("Tab", Style::default().fg(palette.accent)),
        Span::styled(
            format!(" {} ", state.selection.section.label()),
            Style::default().fg(palette.muted),
        ),
        Span::styled("↑/↓", Style::default().fg(palette.accent)),
        Span::styled(" move ", Style::default().fg(palette.muted)),
        Span::styled("Enter", Style::default().fg(palette.accent)),
        Span::styled(" apply ", Style::default().fg(palette.muted)),
        Span::styled("r", Style::default().fg(palette.accent)),
        Span::styled(" re-probe ", Style::default().fg(palette.muted)),
        Span::styled("?", Style::default().fg(palette.accent)),
        Span::styled(" help ", Style::default().fg(palette.muted)),
        Span::styled("q", Style::default().fg(palette.warning)),
        Span::styled(" quit", Style::default().fg(palette.muted)),
    ]);
    f.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

fn render_confirm_dialog(
    f: &mut Frame,
    pending: gate::GpuMode,
    choice: ConfirmChoice,
    palette: UiPalette,
) {
    let area = centered_rect(60, 35, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title("Switch Graphics Mode")
        .borders(Borders::ALL)
        .style(Style::default().bg(palette.panel_bg).fg(Color::White))
        .border_style(Style::default().fg(palette.warning));

    let button = |option: ConfirmChoice, active: Color| {
        let style = if option == choice {
            Style::default()
                .fg(Color::Black)
                .bg(active)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        Span::styled(format!("[ {} ]", option.label()), style)
    };

    let text = vec![
        Line::from(Span::styled(
            format!("Switch to {pending} mode?"),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Your session will be logged out immediately."),
        Line::from("Save your work in other applications first."),
        Line::from(""),
        Line::from(vec![
            button(ConfirmChoice::Cancel, palette.accent),
            Span::raw("   "),
            button(ConfirmChoice::SwitchAndLogOut, palette.danger),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "←/→ choose  Enter confirm  Esc cancel",
            Style::default().fg(palette.muted),
        )),
    ];
    let dialog = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(dialog, area);
}

fn render_help(f: &mut Frame, palette: UiPalette) {
    let area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title("Keybindings")
        .borders(Borders::ALL)
        .style(Style::default().bg(palette.panel_bg).fg(Color::White))
        .border_style(Style::default().fg(palette.border));

    let help_text = vec![
        Line::from(Span::styled(
            "General",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  q / Ctrl+C   Quit"),
        Line::from("  ?            Show this help"),
        Line::from("  Tab/BackTab  Next/previous section"),
        Line::from("  r            Re-probe the system"),
        Line::from("  c            Clear notifications"),
        Line::from(""),
        Line::from(Span::styled(
            "Processor",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  ←/→ or +/-   Adjust thread target"),
        Line::from("  Enter        Apply"),
        Line::from(""),
        Line::from(Span::styled(
            "Graphics",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  ↑/↓  Enter   Choose a mode"),
        Line::from("  L            Switch & Log Out"),
        Line::from("  Esc          Keep the current mode"),
        Line::from(""),
        Line::from(Span::styled(
            "Display",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  ↑/↓  Enter   Set refresh rate"),
        Line::from(""),
        Line::from(Span::styled(
            "CPU and graphics changes need a graphical polkit agent.",
            Style::default().fg(palette.muted),
        )),
    ];
    let help = Paragraph::new(help_text).block(block);
    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
