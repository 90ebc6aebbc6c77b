//! A small, embeddable interactive command shell.
//!
//! A host program registers named commands with callbacks, then hands control to an
//! [`Interpreter`], which reads lines, dispatches them and prints whatever the callbacks
//! return until the session is exited. Lines are edited with rustyline, so the user gets
//! history and tab completion of command names for free.
//!
//! The main entry point is [`Interpreter`]. [`Registry`] and [`Completer`] hold the
//! command table and the completion policy, and [`ExitHandle`] is how callbacks end the
//! session, possibly from another thread than the one blocked in
//! [`Interpreter::run`]. The [`LineEditor`] trait abstracts the terminal;
//! [`ScriptedEditor`] and [`SharedBuffer`] drive the shell from memory.

pub mod builtin;
pub mod command;
pub mod completion;
pub mod config;
pub mod editor;
pub mod error;
pub mod exit;
mod interpreter;
mod io_adapters;
pub mod registry;

pub use command::{Callback, Command};
pub use completion::Completer;
pub use config::{Scheduling, ShellConfig};
pub use editor::{CompletionFn, LineEditor, RustylineEditor};
pub use error::{ReadError, ShellError};
pub use exit::{ExitHandle, LoopState};
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use io_adapters::{ScriptedEditor, SharedBuffer};
pub use registry::{Dispatch, Registry};
