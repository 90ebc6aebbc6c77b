//! The line editing collaborator and its rustyline-backed implementation.

use crate::error::ReadError;
use rustyline::completion::Completer as RlCompleter;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

/// Completion hook installed into a [`LineEditor`].
pub type CompletionFn = Box<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Interactive line input with history and a completion hook.
///
/// The loop owns its editor exclusively and closes it exactly once when the session
/// ends. Implementations must be `Send` so the loop can run on its own thread.
pub trait LineEditor: Send {
    /// Block until a full line has been entered.
    fn prompt_line(&mut self, prompt: &str) -> Result<String, ReadError>;

    /// Install the completion callback, replacing any previous one.
    fn set_completer(&mut self, completer: CompletionFn);

    fn append_history(&mut self, line: &str);

    /// Release the terminal. Called once per session.
    fn close(&mut self);
}

/// Adapter exposing a [`CompletionFn`] through rustyline's helper traits.
struct ShellHelper {
    completer: Option<CompletionFn>,
}

impl RlCompleter for ShellHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let candidates = match &self.completer {
            Some(complete) => complete(&line[..pos]),
            None => Vec::new(),
        };
        // Candidates replace the whole line.
        Ok((0, candidates))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

/// [`LineEditor`] over a real terminal, backed by rustyline.
pub struct RustylineEditor {
    editor: Option<Editor<ShellHelper, DefaultHistory>>,
}

impl RustylineEditor {
    pub fn new() -> Result<Self, ReadError> {
        let mut editor = Editor::<ShellHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(ShellHelper { completer: None }));
        Ok(Self {
            editor: Some(editor),
        })
    }
}

impl LineEditor for RustylineEditor {
    fn prompt_line(&mut self, prompt: &str) -> Result<String, ReadError> {
        match self.editor.as_mut() {
            Some(editor) => Ok(editor.readline(prompt)?),
            None => Err(ReadError::Io("editor is closed".to_string())),
        }
    }

    fn set_completer(&mut self, completer: CompletionFn) {
        if let Some(editor) = self.editor.as_mut() {
            editor.set_helper(Some(ShellHelper {
                completer: Some(completer),
            }));
        }
    }

    fn append_history(&mut self, line: &str) {
        if let Some(editor) = self.editor.as_mut() {
            if let Err(err) = editor.add_history_entry(line) {
                tracing::warn!(%err, "failed to record history entry");
            }
        }
    }

    fn close(&mut self) {
        // Dropping the editor restores the terminal.
        self.editor.take();
    }
}
