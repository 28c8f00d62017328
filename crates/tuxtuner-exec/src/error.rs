use std::io;

use thiserror::Error;

/// A privileged call that did not succeed. Callers treat every variant as one
/// terminal failure; the variants only shape the text shown to the user.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {}", exit_label(.code))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl DispatchError {
    /// Diagnostic text for a notification. Prefers the process's own stderr.
    pub fn detail(&self) -> String {
        match self {
            Self::Failed { stderr, .. } if !stderr.trim().is_empty() => stderr.trim().to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{program} not found")]
    Unavailable { program: String },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {}", exit_label(.code))]
    Exit { program: String, code: Option<i32> },
    #[error("could not parse {what}: {reason}")]
    Parse { what: String, reason: String },
    #[error("{0}")]
    Empty(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}
