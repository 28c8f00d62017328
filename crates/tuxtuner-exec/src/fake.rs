//! Scripted `CommandRunner` for tests, here and in dependent crates.

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::contracts::CommandOutput;
use crate::contracts::CommandRunner;
use crate::contracts::Invocation;

#[derive(Debug, Clone)]
pub enum Scripted {
    Output(CommandOutput),
    NotFound,
    PermissionDenied,
}

/// Records every argv it is handed and answers from a script keyed by the
/// space-joined argv. Unscripted calls exit 0 with no output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Vec<String>>>,
    script: HashMap<String, Scripted>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, argv: &str, response: Scripted) -> Self {
        self.script.insert(argv.to_string(), response);
        self
    }

    pub fn stdout(self, argv: &str, stdout: &str) -> Self {
        self.respond(argv, Scripted::Output(output(0, stdout, "")))
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pub fn output(code: i32, stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        let argv = invocation.argv_lossy();
        let key = argv.join(" ");
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(argv);
        match self.script.get(&key) {
            Some(Scripted::Output(output)) => Ok(output.clone()),
            Some(Scripted::NotFound) => Err(io::Error::from(io::ErrorKind::NotFound)),
            Some(Scripted::PermissionDenied) => Err(io::Error::from(io::ErrorKind::PermissionDenied)),
            None => Ok(output(0, "", "")),
        }
    }
}
