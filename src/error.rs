//! Error types surfaced by the shell.

use thiserror::Error;

/// Failure reported by a [`LineEditor`](crate::editor::LineEditor) while reading a line.
///
/// Inside a running loop every read failure ends the session: the error text becomes
/// the Exit message instead of being returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The user interrupted the read (Ctrl-C).
    #[error("Interrupted")]
    Interrupted,

    /// The input stream is exhausted (Ctrl-D or end of a script).
    #[error("EOF")]
    Eof,

    /// Any other terminal or I/O failure.
    #[error("{0}")]
    Io(String),
}

impl From<rustyline::error::ReadlineError> for ReadError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        use rustyline::error::ReadlineError;
        match err {
            ReadlineError::Interrupted => ReadError::Interrupted,
            ReadlineError::Eof => ReadError::Eof,
            other => ReadError::Io(other.to_string()),
        }
    }
}

/// Top-level error type of the crate.
#[derive(Error, Debug)]
pub enum ShellError {
    /// A command name was empty or contained whitespace. The registry is left unchanged.
    #[error("invalid command name {name:?}: names must be non-empty and contain no whitespace")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The line editor could not be set up.
    #[error("line editor failure: {0}")]
    Read(#[from] ReadError),

    /// The thread running the loop could not be started.
    #[error("failed to start loop thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// `run` was called after the session had already been stopped.
    #[error("session already finished")]
    SessionFinished,

    /// The loop task ended without anyone calling exit, e.g. a callback panicked.
    #[error("loop task ended without an exit message")]
    LoopAborted,
}

/// Convenient alias used throughout the crate.
pub type Result<T, E = ShellError> = std::result::Result<T, E>;
