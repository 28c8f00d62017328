mod logging;
mod ui;

use std::env;
use std::io;
use std::io::BufRead;
use std::io::Write;
use std::path::PathBuf;

use tracing::info;
use tuxtuner_core::actions::RuntimeAction;
use tuxtuner_core::actions::TunerAction;
use tuxtuner_core::actions::UserAction;
use tuxtuner_core::config::Config;
use tuxtuner_core::facts::strip_rate_label;
use tuxtuner_core::gate;
use tuxtuner_core::reducer::reduce;
use tuxtuner_core::state::TunerState;
use tuxtuner_exec::CommandRunner;
use tuxtuner_exec::PrivilegedDispatcher;
use tuxtuner_exec::StateProbe;
use tuxtuner_exec::SystemRunner;

use crate::logging::init_logging;
use crate::logging::LogTarget;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliCommand {
    Tui,
    Status { json: bool },
    Cpu { count: String },
    Gpu { mode: String, yes: bool },
    Hz { rate: String },
    Help,
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config: Option<PathBuf>,
    command: CliCommand,
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let options = parse_args(env::args().skip(1).collect())?;
    match options.command {
        CliCommand::Help => {
            write_help(&mut io::stdout())?;
            return Ok(());
        }
        CliCommand::Version => {
            println!("tuxtuner {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(options.config)?;
    let target = if options.command == CliCommand::Tui {
        LogTarget::File
    } else {
        LogTarget::Stderr
    };
    init_logging(target, &config.log_level.0);

    match options.command {
        CliCommand::Tui => ui::run(&config),
        CliCommand::Status { json } => {
            print_status(&config, &SystemRunner, json, &mut io::stdout())
        }
        CliCommand::Cpu { count } => {
            apply_cpu(&config, &SystemRunner, &count, &mut io::stdout())
        }
        CliCommand::Gpu { mode, yes } => switch_gpu(
            &config,
            &SystemRunner,
            &mode,
            yes,
            &mut io::stdin().lock(),
            &mut io::stdout(),
        ),
        CliCommand::Hz { rate } => {
            set_refresh(&config, &SystemRunner, &rate, &mut io::stdout())
        }
        CliCommand::Help | CliCommand::Version => Ok(()),
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, Box<dyn std::error::Error>> {
    let mut config = None;
    let mut positional = Vec::new();
    let mut yes = false;
    let mut json = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--config requires a path".into());
                };
                config = Some(PathBuf::from(value));
                i += 2;
                continue;
            }
            "--yes" | "-y" => yes = true,
            "--json" => json = true,
            "--help" | "-h" => {
                return Ok(CliOptions {
                    config,
                    command: CliCommand::Help,
                })
            }
            "--version" | "-V" => {
                return Ok(CliOptions {
                    config,
                    command: CliCommand::Version,
                })
            }
            other if other.starts_with("--") => {
                return Err(format!("unsupported argument: {other}").into());
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None | Some("tui") => CliCommand::Tui,
        Some("help") => CliCommand::Help,
        Some("version") => CliCommand::Version,
        Some("status") => CliCommand::Status { json },
        Some("cpu") => CliCommand::Cpu {
            count: positional.next().ok_or("cpu requires a thread count")?,
        },
        Some("gpu") => CliCommand::Gpu {
            mode: positional.next().ok_or("gpu requires a mode")?,
            yes,
        },
        Some("hz") => CliCommand::Hz {
            rate: positional.next().ok_or("hz requires a refresh rate")?,
        },
        Some(other) => return Err(format!("unknown command: {other}").into()),
    };
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument: {extra}").into());
    }
    Ok(CliOptions { config, command })
}

fn load_config(explicit: Option<PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = explicit.or_else(|| {
        dirs::config_dir().map(|dir| dir.join("tuxtuner").join("config.toml"))
    });
    match path {
        Some(path) => Ok(Config::load(&path)?),
        None => Ok(Config::default()),
    }
}

/// The login session id, read fresh for every switch attempt. Unset reads as empty.
pub(crate) fn read_session_env(var: &str) -> String {
    env::var_os(var)
        .map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn print_status<R: CommandRunner>(
    config: &Config,
    runner: &R,
    json: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = StateProbe::new(runner, config).probe_all();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    let mut state = TunerState::new();
    reduce(&mut state, TunerAction::User(UserAction::RequestProbe));
    reduce(
        &mut state,
        TunerAction::Runtime(RuntimeAction::ProbeFinished(report)),
    );

    for line in status_lines(&state) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn status_lines(state: &TunerState) -> Vec<String> {
    let mut lines = vec![format!("Graphics: {}", state.gpu_status_label())];
    if let Some(reason) = state.gpu.availability.reason() {
        lines.push(format!("          ({reason})"));
    }

    lines.push(format!("Threads:  {}", state.cpu.status_label()));
    if let Some(reason) = state.cpu.availability.reason() {
        lines.push(format!("          ({reason})"));
    }

    let badge = if state.display.current_is_native() {
        " NATIVE"
    } else {
        ""
    };
    lines.push(format!("Refresh:  {}{badge}", state.display.status_label()));
    if let Some(reason) = state.display.availability.reason() {
        lines.push(format!("          ({reason})"));
    } else {
        let offered: Vec<String> = state.display.options.iter().map(|opt| opt.label()).collect();
        lines.push(format!(
            "          {} offers {}",
            state.display.monitor,
            offered.join(", ")
        ));
    }
    lines
}

fn apply_cpu<R: CommandRunner>(
    config: &Config,
    runner: &R,
    raw: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let requested: i64 = raw
        .parse()
        .map_err(|_| format!("invalid thread count: {raw}"))?;
    let topology = StateProbe::new(runner, config).probe_cores()?;
    let target = gate::validate_core_target(requested, topology.total)?;

    PrivilegedDispatcher::new(runner, config).apply_core_limit(target)?;
    writeln!(out, "CPU thread limit applied: {}/{}", target.get(), topology.total)?;
    Ok(())
}

fn switch_gpu<R: CommandRunner>(
    config: &Config,
    runner: &R,
    raw: &str,
    yes: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mode = gate::validate_gpu_mode(raw)?;
    let facts = StateProbe::new(runner, config).probe_gpu()?;
    if !facts.supported.iter().any(|supported| supported == mode.label()) {
        return Err(format!("{mode} is not supported on this machine").into());
    }
    if facts.current == mode.label() {
        writeln!(out, "Graphics mode is already {mode}.")?;
        return Ok(());
    }

    if !yes && !prompt_logout(mode.label(), input, out)? {
        writeln!(out, "Cancelled.")?;
        return Ok(());
    }

    let session = gate::validate_session_id(&read_session_env(&config.session.env_var))?;
    info!(%mode, logout = !session.is_omitted(), "switching graphics mode");
    PrivilegedDispatcher::new(runner, config).switch_gpu_mode(mode, &session)?;
    writeln!(out, "Graphics mode switched to {mode}.")?;
    Ok(())
}

fn set_refresh<R: CommandRunner>(
    config: &Config,
    runner: &R,
    raw: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let hz = gate::validate_refresh_rate(strip_rate_label(raw))?;
    let facts = StateProbe::new(runner, config).probe_display()?;
    let monitor = gate::validate_monitor_name(&facts.monitor)?;

    PrivilegedDispatcher::new(runner, config).set_refresh_rate(&monitor, hz)?;
    writeln!(out, "Refresh rate set to {}Hz on {monitor}", hz.hz())?;
    Ok(())
}

/// Anything but an explicit yes cancels, including end of input.
fn prompt_logout(
    mode: &str,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> io::Result<bool> {
    write!(
        out,
        "Switching to {mode} will end your session. Switch & Log Out? [y/N]: "
    )?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes" | "YES"))
}

fn write_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "tuxtuner {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "Usage:")?;
    writeln!(out, "  tuxtuner [--config PATH]              Interactive tuner")?;
    writeln!(out, "  tuxtuner status [--json]              Show current settings")?;
    writeln!(out, "  tuxtuner cpu N                        Limit active CPU threads to N")?;
    writeln!(out, "  tuxtuner gpu MODE [--yes]             Switch graphics mode (logs you out)")?;
    writeln!(out, "  tuxtuner hz RATE                      Set the refresh rate of the first monitor")?;
    writeln!(out, "  tuxtuner --help")?;
    writeln!(out, "  tuxtuner --version")?;
    writeln!(out)?;
    writeln!(out, "CPU and graphics changes run the helper through pkexec and need a")?;
    writeln!(out, "graphical polkit agent. The helper never reads from this terminal.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tuxtuner_core::facts::CoreTopology;
    use tuxtuner_core::facts::DisplayFacts;
    use tuxtuner_core::facts::GpuFacts;
    use tuxtuner_core::facts::ProbeReport;
    use tuxtuner_exec::fake::RecordingRunner;

    use super::*;

    const HELPER: &str = "/usr/libexec/tuxtuner-helper";
    const MONITORS_JSON: &str =
        r#"[{"name": "DP-1", "refreshRate": 60.0, "availableModes": ["1920x1200@60.00Hz", "1920x1200@165.01Hz"]}]"#;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.session.env_var = "TUXTUNER_TEST_UNSET_SESSION_VAR".to_string();
        config.probe.cpu_sysfs_root = PathBuf::from("/nonexistent/tuxtuner-test/cpu");
        config.probe.core_fallback = Some(16);
        config
    }

    fn gpu_runner() -> RecordingRunner {
        RecordingRunner::new()
            .stdout("supergfxctl -s", "[Integrated, Hybrid]\n")
            .stdout("supergfxctl -g", "Hybrid\n")
    }

    /// Calls other than the read-only queries.
    fn privileged_calls(runner: &RecordingRunner) -> Vec<Vec<String>> {
        runner
            .calls()
            .into_iter()
            .filter(|argv| argv[0] == "pkexec" || argv.get(1).map(String::as_str) == Some("keyword"))
            .collect()
    }

    fn run_gpu(runner: &RecordingRunner, mode: &str, yes: bool, answer: &str) -> (bool, String) {
        let mut out = Vec::new();
        let result = switch_gpu(
            &test_config(),
            runner,
            mode,
            yes,
            &mut answer.as_bytes(),
            &mut out,
        );
        (result.is_ok(), String::from_utf8(out).expect("utf8 output"))
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    fn command(raw: &[&str]) -> CliCommand {
        parse_args(args(raw)).expect("parse").command
    }

    #[test]
    fn no_arguments_opens_the_tui() {
        assert_eq!(command(&[]), CliCommand::Tui);
    }

    #[test]
    fn config_flag_is_accepted_anywhere() {
        let options = parse_args(args(&["status", "--config", "/tmp/t.toml"])).expect("parse");
        assert_eq!(options.config, Some(PathBuf::from("/tmp/t.toml")));
        assert_eq!(options.command, CliCommand::Status { json: false });

        let options = parse_args(args(&["--config", "/tmp/t.toml"])).expect("parse");
        assert_eq!(options.command, CliCommand::Tui);
    }

    #[test]
    fn one_shot_commands_keep_raw_values_for_the_gate() {
        assert_eq!(
            command(&["gpu", "integrated"]),
            CliCommand::Gpu {
                mode: "integrated".to_string(),
                yes: false
            }
        );
        assert_eq!(
            command(&["gpu", "Hybrid", "--yes"]),
            CliCommand::Gpu {
                mode: "Hybrid".to_string(),
                yes: true
            }
        );
        assert_eq!(
            command(&["hz", "165Hz"]),
            CliCommand::Hz {
                rate: "165Hz".to_string()
            }
        );
        assert_eq!(command(&["status", "--json"]), CliCommand::Status { json: true });
    }

    #[test]
    fn malformed_invocations_are_errors() {
        assert!(parse_args(args(&["cpu"])).is_err());
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["reboot"])).is_err());
        assert!(parse_args(args(&["cpu", "4", "5"])).is_err());
        assert!(parse_args(args(&["--force"])).is_err());
    }

    #[test]
    fn status_lines_show_native_badge_and_reasons() {
        let mut state = TunerState::new();
        let report = ProbeReport {
            cpu: Ok(CoreTopology {
                total: 16,
                online: 8,
            }),
            gpu: Err("supergfxctl not found".to_string()),
            display: Ok(DisplayFacts::from_modes(
                "DP-1".to_string(),
                165.0,
                &["1920x1200@60.00Hz", "1920x1200@165.01Hz"],
            )),
        };
        reduce(
            &mut state,
            TunerAction::Runtime(RuntimeAction::ProbeFinished(report)),
        );

        assert_eq!(
            status_lines(&state),
            vec![
                "Graphics: Unavailable",
                "          (supergfxctl not found)",
                "Threads:  8/16",
                "Refresh:  165Hz NATIVE",
                "          DP-1 offers 60Hz, 165Hz (Native)",
            ]
        );
    }

    #[test]
    fn status_lines_show_unknown_rate() {
        let mut state = TunerState::new();
        let report = ProbeReport {
            cpu: Ok(CoreTopology { total: 4, online: 4 }),
            gpu: Ok(GpuFacts {
                supported: vec!["Hybrid".to_string()],
                current: "Hybrid".to_string(),
            }),
            display: Err("hyprctl not found".to_string()),
        };
        reduce(
            &mut state,
            TunerAction::Runtime(RuntimeAction::ProbeFinished(report)),
        );

        let lines = status_lines(&state);
        assert_eq!(lines[0], "Graphics: Hybrid");
        assert_eq!(lines[2], "Refresh:  Unknown");
        assert_eq!(lines[3], "          (hyprctl not found)");
    }

    #[test]
    fn unset_session_variable_reads_empty() {
        assert_eq!(read_session_env("TUXTUNER_TEST_UNSET_SESSION_VAR"), "");
    }

    #[test]
    fn logout_prompt_defaults_to_cancel() {
        for answer in ["", "\n", "n\n", "maybe\n"] {
            let mut out = Vec::new();
            let confirmed =
                prompt_logout("Integrated", &mut answer.as_bytes(), &mut out).expect("prompt");
            assert!(!confirmed, "answer {answer:?} should cancel");
            assert!(String::from_utf8(out).expect("utf8").ends_with("[y/N]: "));
        }
        let confirmed =
            prompt_logout("Integrated", &mut "y\n".as_bytes(), &mut Vec::<u8>::new()).expect("prompt");
        assert!(confirmed);
    }

    #[test]
    fn gpu_switch_without_yes_is_cancelled_by_empty_or_no_answer() {
        for answer in ["", "n\n"] {
            let runner = gpu_runner();

            let (ok, out) = run_gpu(&runner, "Integrated", false, answer);

            assert!(ok);
            assert!(out.ends_with("Cancelled.\n"));
            assert_eq!(privileged_calls(&runner), Vec::<Vec<String>>::new());
        }
    }

    #[test]
    fn gpu_switch_confirmed_at_prompt_dispatches_without_logout_pair() {
        let runner = gpu_runner();

        let (ok, out) = run_gpu(&runner, "Integrated", false, "y\n");

        assert!(ok);
        assert!(out.ends_with("Graphics mode switched to Integrated.\n"));
        assert_eq!(
            privileged_calls(&runner),
            vec![vec!["pkexec", HELPER, "gpu", "Integrated"]]
        );
    }

    #[test]
    fn gpu_switch_refuses_mode_the_machine_does_not_report() {
        let runner = gpu_runner();
        let mut out = Vec::<u8>::new();

        let err = switch_gpu(
            &test_config(),
            &runner,
            "Compute",
            true,
            &mut "y\n".as_bytes(),
            &mut out,
        )
        .expect_err("unsupported mode");

        assert_eq!(err.to_string(), "Compute is not supported on this machine");
        assert_eq!(privileged_calls(&runner), Vec::<Vec<String>>::new());
    }

    #[test]
    fn gpu_switch_to_current_mode_is_a_no_op() {
        let runner = gpu_runner();

        let (ok, out) = run_gpu(&runner, "Hybrid", true, "");

        assert!(ok);
        assert_eq!(out, "Graphics mode is already Hybrid.\n");
        assert_eq!(privileged_calls(&runner), Vec::<Vec<String>>::new());
    }

    #[test]
    fn gpu_switch_rejects_bad_mode_before_probing() {
        let runner = gpu_runner();

        let (ok, _) = run_gpu(&runner, "integrated", true, "");

        assert!(!ok);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn cpu_command_checks_target_against_detected_total() {
        let runner = RecordingRunner::new();
        let config = test_config();

        assert!(apply_cpu(&config, &runner, "20", &mut Vec::<u8>::new()).is_err());
        assert!(apply_cpu(&config, &runner, "six", &mut Vec::<u8>::new()).is_err());
        assert!(runner.calls().is_empty());

        let mut out = Vec::new();
        apply_cpu(&config, &runner, "6", &mut out).expect("apply");
        assert_eq!(runner.calls(), vec![vec!["pkexec", HELPER, "cpu", "6"]]);
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "CPU thread limit applied: 6/16\n"
        );
    }

    #[test]
    fn refresh_command_targets_detected_monitor() {
        let runner = RecordingRunner::new().stdout("hyprctl monitors -j", MONITORS_JSON);
        let config = test_config();

        assert!(set_refresh(&config, &runner, "29", &mut Vec::<u8>::new()).is_err());
        assert!(runner.calls().is_empty());

        set_refresh(&config, &runner, "165Hz (Native)", &mut Vec::<u8>::new()).expect("set rate");
        assert_eq!(
            privileged_calls(&runner),
            vec![vec!["hyprctl", "keyword", "monitor", "DP-1,preferred@165,auto,1"]]
        );
    }

    #[test]
    fn help_states_the_polkit_agent_requirement() {
        let mut out = Vec::new();
        write_help(&mut out).expect("help");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("graphical polkit agent"));
        assert!(text.contains("tuxtuner gpu MODE [--yes]"));
    }
}
