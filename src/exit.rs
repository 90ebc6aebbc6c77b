//! Session state shared between the loop and whoever ends it.
//!
//! A [`Session`] owns the loop state, the line editor for the duration of the loop and
//! the one-shot [`ExitSignal`]. [`ExitHandle`] is the public face of it: the only way to
//! stop a running loop.

use crate::editor::LineEditor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tokio::sync::oneshot;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lifecycle of a dispatch loop. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// One-shot rendezvous carrying the exit message to the blocked caller of `run`.
///
/// At most one publish and one wait ever happen.
pub(crate) struct ExitSignal {
    tx: Mutex<Option<oneshot::Sender<String>>>,
    rx: Mutex<Option<oneshot::Receiver<String>>>,
}

impl ExitSignal {
    fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Returns false if the signal was already published or abandoned.
    fn publish(&self, message: String) -> bool {
        match lock(&self.tx).take() {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Drop the sender unused so a waiter wakes up empty-handed.
    pub(crate) fn abandon(&self) {
        lock(&self.tx).take();
    }

    /// Block until published. `None` if the signal was abandoned or already consumed.
    ///
    /// Must not be called from within an async runtime.
    pub(crate) fn wait(&self) -> Option<String> {
        let rx = lock(&self.rx).take()?;
        rx.blocking_recv().ok()
    }
}

pub(crate) struct Session {
    state: Mutex<LoopState>,
    split: AtomicBool,
    editor: Mutex<Option<Box<dyn LineEditor>>>,
    message: Mutex<Option<String>>,
    pub(crate) signal: ExitSignal,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(LoopState::Idle),
            split: AtomicBool::new(false),
            editor: Mutex::new(None),
            message: Mutex::new(None),
            signal: ExitSignal::new(),
        }
    }

    pub(crate) fn state(&self) -> LoopState {
        *lock(&self.state)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// `Idle -> Running`, handing the editor to the session. Gives the editor back if
    /// the session is not idle.
    pub(crate) fn begin(
        &self,
        editor: Box<dyn LineEditor>,
        split: bool,
    ) -> Result<(), Box<dyn LineEditor>> {
        let mut state = lock(&self.state);
        if *state != LoopState::Idle {
            return Err(editor);
        }
        *lock(&self.editor) = Some(editor);
        self.split.store(split, Ordering::SeqCst);
        *state = LoopState::Running;
        Ok(())
    }

    /// Run `f` against the editor. `None` once the editor has been closed.
    pub(crate) fn with_editor<R>(&self, f: impl FnOnce(&mut dyn LineEditor) -> R) -> Option<R> {
        let mut editor = lock(&self.editor);
        editor.as_mut().map(|editor| f(&mut **editor))
    }

    /// Close the editor unless that already happened.
    pub(crate) fn close_editor(&self) {
        if let Some(mut editor) = lock(&self.editor).take() {
            editor.close();
        }
    }

    /// Like [`close_editor`](Self::close_editor) but leaves an editor that is in the
    /// middle of a read to the loop, which closes it as soon as the read returns.
    fn try_close_editor(&self) {
        let mut slot = match self.editor.try_lock() {
            Ok(slot) => slot,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        if let Some(mut editor) = slot.take() {
            editor.close();
        }
    }

    /// Move to `Stopped`. Only the first call records the message, closes the editor
    /// and publishes the signal.
    fn stop(&self, message: &str) -> bool {
        {
            let mut state = lock(&self.state);
            if *state == LoopState::Stopped {
                return false;
            }
            *state = LoopState::Stopped;
        }
        *lock(&self.message) = Some(message.to_string());
        self.try_close_editor();
        if self.split.load(Ordering::SeqCst) {
            self.signal.publish(message.to_string());
        }
        true
    }

    /// Message of the exit that stopped the session.
    pub(crate) fn terminal_message(&self) -> Option<String> {
        lock(&self.message).clone()
    }
}

/// Handle that ends a shell session.
///
/// Cheap to clone and safe to call from any thread; typically captured by the
/// callback of an `exit` command.
#[derive(Clone)]
pub struct ExitHandle {
    session: Arc<Session>,
}

impl ExitHandle {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Stop the loop and return `args` joined by single spaces.
    ///
    /// The first call stops the session and its message becomes the value returned by
    /// [`Interpreter::run`](crate::Interpreter::run). Later calls change nothing but
    /// still return their own message, so this works as a command callback.
    pub fn exit(&self, args: &[String]) -> String {
        let message = args.join(" ");
        if self.session.stop(&message) {
            tracing::info!(message = %message, "session stopped");
        }
        message
    }

    pub fn state(&self) -> LoopState {
        self.session.state()
    }
}
