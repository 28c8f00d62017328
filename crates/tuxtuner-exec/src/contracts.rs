use std::ffi::OsStr;
use std::ffi::OsString;
use std::io;
use std::process::Command;
use std::process::Stdio;

/// One external process call: a program and a discrete argument vector.
///
/// There is no shell anywhere between this value and `execve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn program_lossy(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Program followed by its arguments, for logs and assertions.
    pub fn argv_lossy(&self) -> Vec<String> {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy().into_owned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// The only way this crate starts processes.
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        (**self).run(invocation)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        // The TUI owns the terminal; a child never gets our stdin.
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn argv_keeps_each_argument_discrete() {
        let invocation = Invocation::new("hyprctl")
            .arg("keyword")
            .arg("monitor")
            .arg("DP-1,preferred@165,auto,1");

        assert_eq!(
            invocation.argv_lossy(),
            vec!["hyprctl", "keyword", "monitor", "DP-1,preferred@165,auto,1"]
        );
        assert_eq!(invocation.args.len(), 3);
    }

    #[test]
    fn system_runner_reports_missing_program_as_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("no-such-binary");

        let err = SystemRunner
            .run(&Invocation::new(missing.as_os_str()))
            .expect_err("launch should fail");

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn system_runner_never_hands_the_terminal_to_a_child() {
        // `cat` would block on an inherited terminal; with a null stdin it sees EOF.
        let output = SystemRunner
            .run(&Invocation::new("cat"))
            .expect("cat should launch");

        assert!(output.success());
        assert_eq!(output.stdout, "");
    }
}
