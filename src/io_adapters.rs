use crate::editor::{CompletionFn, LineEditor};
use crate::error::ReadError;
use std::collections::VecDeque;
use std::io::{Result as IoResult, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Memory-backed [`LineEditor`] that replays a fixed script of lines.
///
/// Clones share state, so a caller can hand one clone to the interpreter and keep
/// another to inspect the recorded history, the installed completer and how often
/// the editor was closed. Once the script runs out every read fails with the
/// configured end error ([`ReadError::Eof`] by default).
///
/// Example
/// ```
/// use repl_shell::{Interpreter, ScriptedEditor, SharedBuffer};
/// let editor = ScriptedEditor::new(["exit bye now"]);
/// let out = SharedBuffer::new();
/// let mut shell = Interpreter::new("hi").with_editor(editor.clone()).with_output(out.clone());
/// shell.add_builtins();
/// assert_eq!(shell.run("> ").unwrap(), "bye now");
/// assert_eq!(editor.close_count(), 1);
/// assert_eq!(out.contents(), "hi\nbye now\n");
/// ```
#[derive(Clone)]
pub struct ScriptedEditor {
    lines: Arc<Mutex<VecDeque<String>>>,
    end: ReadError,
    history: Arc<Mutex<Vec<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    completer: Arc<Mutex<Option<CompletionFn>>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedEditor {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Arc::new(Mutex::new(lines.into_iter().map(Into::into).collect())),
            end: ReadError::Eof,
            history: Arc::default(),
            prompts: Arc::default(),
            completer: Arc::default(),
            closes: Arc::default(),
        }
    }

    /// Error returned once the script is exhausted.
    pub fn with_end_error(mut self, err: ReadError) -> Self {
        self.end = err;
        self
    }

    /// Lines appended to the history so far.
    pub fn history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }

    /// Prompts shown so far, one per read attempt.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Run the installed completer, as pressing Tab after `line` would.
    pub fn complete(&self, line: &str) -> Option<Vec<String>> {
        lock(&self.completer).as_ref().map(|complete| complete(line))
    }
}

impl LineEditor for ScriptedEditor {
    fn prompt_line(&mut self, prompt: &str) -> Result<String, ReadError> {
        lock(&self.prompts).push(prompt.to_string());
        lock(&self.lines).pop_front().ok_or_else(|| self.end.clone())
    }

    fn set_completer(&mut self, completer: CompletionFn) {
        *lock(&self.completer) = Some(completer);
    }

    fn append_history(&mut self, line: &str) {
        lock(&self.history).push(line.to_string());
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Memory-backed writer for capturing what the shell prints.
///
/// Clones share the same buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.buf)).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        lock(&self.buf).extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
