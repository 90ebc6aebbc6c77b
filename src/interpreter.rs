use crate::builtin::{self, Exit, Help};
use crate::command::tokenize;
use crate::completion::Completer;
use crate::config::{Scheduling, ShellConfig};
use crate::editor::{LineEditor, RustylineEditor};
use crate::error::{Result, ShellError};
use crate::exit::{ExitHandle, LoopState, Session};
use crate::registry::{Dispatch, Registry};
use std::io::Write;
use std::sync::Arc;
use std::thread;

type Output = Box<dyn Write + Send>;

/// An embeddable read-dispatch-print loop.
///
/// Register commands (and optionally a default handler), then call [`run`](Self::run).
/// Each line is split on whitespace; if the first word names a command its callback
/// gets the remaining words, otherwise the default callback gets all of them. Whatever
/// a callback returns is printed. The loop ends when something calls
/// [`ExitHandle::exit`] or the editor fails to read a line.
///
/// Example
/// ```
/// use repl_shell::{Interpreter, ScriptedEditor, SharedBuffer};
/// let out = SharedBuffer::new();
/// let mut sh = Interpreter::new("")
///     .with_editor(ScriptedEditor::new(["shout hey", "nope", "exit done"]))
///     .with_output(out.clone());
/// sh.add_command("shout", "upper-cases its arguments", |args| args.join(" ").to_uppercase()).unwrap();
/// sh.set_default(|args| format!("unknown: {}", args.join(" ")));
/// sh.add_builtins();
/// assert_eq!(sh.run("$ ").unwrap(), "done");
/// assert_eq!(out.contents(), "HEY\nunknown: nope\ndone\n");
/// ```
pub struct Interpreter {
    greeting: String,
    config: ShellConfig,
    registry: Registry,
    session: Arc<Session>,
    editor: Option<Box<dyn LineEditor>>,
    output: Option<Output>,
}

impl Interpreter {
    /// Create an interpreter printing `greeting` once before the first prompt.
    /// An empty greeting prints nothing.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            greeting: greeting.into(),
            config: ShellConfig::default(),
            registry: Registry::new(),
            session: Arc::new(Session::new()),
            editor: None,
            output: None,
        }
    }

    pub fn with_config(mut self, config: ShellConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `editor` instead of a rustyline editor on the terminal.
    pub fn with_editor(mut self, editor: impl LineEditor + 'static) -> Self {
        self.editor = Some(Box::new(editor));
        self
    }

    /// Print results to `output` instead of stdout.
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    /// Handle to the command table, e.g. for a callback that lists commands.
    pub fn registry(&self) -> Registry {
        self.registry.clone()
    }

    /// Handle that stops this interpreter's loop.
    pub fn exit_handle(&self) -> ExitHandle {
        ExitHandle::new(Arc::clone(&self.session))
    }

    pub fn state(&self) -> LoopState {
        self.session.state()
    }

    /// Register a command. See [`Registry::add_command`].
    pub fn add_command(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        callback: impl Fn(&[String]) -> String + Send + Sync + 'static,
    ) -> Result<()> {
        self.registry.add_command(name, help, callback)
    }

    /// Install the handler for lines whose first word matches no command.
    pub fn set_default(&mut self, callback: impl Fn(&[String]) -> String + Send + Sync + 'static) {
        self.registry.set_default(callback);
    }

    /// Register the builtin `help` and `exit` commands.
    pub fn add_builtins(&mut self) {
        builtin::register::<Help>(&self.registry, self.registry.clone());
        builtin::register::<Exit>(&self.registry, self.exit_handle());
    }

    pub fn render_help(&self, args: &[String]) -> String {
        self.registry.render_help(args)
    }

    /// Stop the loop. See [`ExitHandle::exit`].
    pub fn exit(&self, args: &[String]) -> String {
        self.exit_handle().exit(args)
    }

    /// Run the loop until the session is stopped and return the exit message.
    ///
    /// With [`Scheduling::SplitContext`] the loop runs on a dedicated thread and this
    /// call blocks on the exit signal, so it must not be made from inside an async
    /// runtime. A session runs at most once; later calls fail with
    /// [`ShellError::SessionFinished`].
    pub fn run(&mut self, prompt: &str) -> Result<String> {
        if self.session.state() != LoopState::Idle {
            if let Some(mut editor) = self.editor.take() {
                editor.close();
            }
            return Err(ShellError::SessionFinished);
        }

        let mut editor: Box<dyn LineEditor> = match self.editor.take() {
            Some(editor) => editor,
            None => Box::new(RustylineEditor::new()?),
        };
        let completer =
            Completer::new(self.registry.clone()).with_min_substring_len(self.config.min_substring_len);
        editor.set_completer(Box::new(move |line| completer.complete(line)));

        let split = self.config.scheduling == Scheduling::SplitContext;
        if let Err(mut editor) = self.session.begin(editor, split) {
            editor.close();
            return Err(ShellError::SessionFinished);
        }

        let mut output = self
            .output
            .take()
            .unwrap_or_else(|| Box::new(std::io::stdout()) as Output);
        if !self.greeting.is_empty() {
            print_line(&mut output, &self.greeting);
        }

        let body = LoopBody {
            prompt: prompt.to_string(),
            registry: self.registry.clone(),
            session: Arc::clone(&self.session),
            output,
            record_history: self.config.record_history,
        };
        tracing::debug!(prompt, scheduling = ?self.config.scheduling, "starting loop");

        let message = match self.config.scheduling {
            Scheduling::SameContext => {
                self.output = Some(body.run());
                self.session.terminal_message()
            }
            Scheduling::SplitContext => self.run_split(body)?,
        };
        self.session.close_editor();
        message.ok_or(ShellError::LoopAborted)
    }

    fn run_split(&mut self, body: LoopBody) -> Result<Option<String>> {
        let guard = AbandonOnDrop(Arc::clone(&self.session));
        let worker = thread::Builder::new()
            .name("repl-loop".to_string())
            .spawn(move || {
                let _guard = guard;
                body.run()
            })
            .map_err(|err| {
                self.session.close_editor();
                ShellError::Spawn(err)
            })?;

        let message = self.session.signal.wait();
        match worker.join() {
            Ok(output) => self.output = Some(output),
            Err(_) => tracing::error!("loop thread panicked"),
        }
        Ok(message)
    }
}

/// Releases the exit signal if the loop thread dies without exiting, so `run` does
/// not wait forever.
struct AbandonOnDrop(Arc<Session>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.signal.abandon();
    }
}

/// State moved onto whichever thread executes the loop.
struct LoopBody {
    prompt: String,
    registry: Registry,
    session: Arc<Session>,
    output: Output,
    record_history: bool,
}

impl LoopBody {
    /// Returns the output sink so the interpreter can keep it.
    fn run(mut self) -> Output {
        while self.session.is_running() {
            let read = self.session.with_editor(|editor| editor.prompt_line(&self.prompt));
            let line = match read {
                None => break,
                Some(Ok(line)) => line,
                Some(Err(err)) => {
                    tracing::warn!(%err, "read failed, ending session");
                    let message = format!("error: {:?}", err.to_string());
                    ExitHandle::new(Arc::clone(&self.session)).exit(&[message]);
                    break;
                }
            };
            // Stopped from another thread while we were reading.
            if !self.session.is_running() {
                break;
            }

            let tokens = tokenize(&line);
            let dispatch = self.registry.resolve(&tokens);
            match &dispatch {
                Dispatch::Command { command, .. } => {
                    tracing::debug!(command = command.name(), "dispatching");
                    if self.record_history {
                        self.session.with_editor(|editor| editor.append_history(&line));
                    }
                }
                Dispatch::Fallback { .. } => {
                    tracing::debug!(line = %line, "no command matched, using default");
                }
            }
            let result = dispatch.invoke();
            print_line(&mut self.output, &result);
        }
        self.session.close_editor();
        self.output
    }
}

fn print_line(output: &mut Output, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Err(err) = writeln!(output, "{}", text).and_then(|_| output.flush()) {
        tracing::warn!(%err, "failed to write output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;
    use crate::io_adapters::{ScriptedEditor, SharedBuffer};
    use std::sync::Mutex;

    fn same_context() -> ShellConfig {
        ShellConfig::default().scheduling(Scheduling::SameContext)
    }

    fn shell(lines: &[&str], config: ShellConfig) -> (Interpreter, ScriptedEditor, SharedBuffer) {
        let editor = ScriptedEditor::new(lines.iter().copied());
        let out = SharedBuffer::new();
        let sh = Interpreter::new("")
            .with_config(config)
            .with_editor(editor.clone())
            .with_output(out.clone());
        (sh, editor, out)
    }

    fn recorder() -> (Arc<Mutex<Vec<Vec<String>>>>, impl Fn(&[String]) -> String + Send + Sync) {
        let calls: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
        let sink = Arc::clone(&calls);
        (calls, move |args: &[String]| {
            sink.lock().unwrap().push(args.to_vec());
            String::new()
        })
    }

    #[test]
    fn test_end_to_end_help_and_exit() {
        for config in [ShellConfig::default(), same_context()] {
            let (mut sh, editor, out) = shell(&["help", "exit bye now", "never read"], config);
            let registry = sh.registry();
            let handle = sh.exit_handle();
            sh.add_command("help", "prints help", move |args| registry.render_help(args))
                .unwrap();
            sh.add_command("exit", "", move |args| handle.exit(args)).unwrap();

            let help = sh.render_help(&[]);
            assert!(help.lines().any(|l| l.contains("help  -  prints help")));
            assert!(!help.contains("exit"));

            assert_eq!(sh.run("> ").unwrap(), "bye now");
            assert_eq!(sh.state(), LoopState::Stopped);
            assert_eq!(out.contents(), "help  -  prints help\nbye now\n");
            assert_eq!(editor.close_count(), 1);
            assert_eq!(editor.prompts().len(), 2);
        }
    }

    #[test]
    fn test_matched_and_default_dispatch() {
        let (mut sh, _editor, _out) = shell(&["cmd a b", "other x y", "exit"], same_context());
        let (cmd_calls, cmd) = recorder();
        let (default_calls, default) = recorder();
        sh.add_command("cmd", "", cmd).unwrap();
        sh.set_default(default);
        sh.add_builtins();

        assert_eq!(sh.run("> ").unwrap(), "");
        assert_eq!(*cmd_calls.lock().unwrap(), vec![vec!["a", "b"]]);
        assert_eq!(*default_calls.lock().unwrap(), vec![vec!["other", "x", "y"]]);
    }

    #[test]
    fn test_empty_line_goes_to_default_with_no_tokens() {
        let (mut sh, _editor, _out) = shell(&["   ", "exit"], same_context());
        let (calls, default) = recorder();
        sh.set_default(default);
        sh.add_builtins();

        sh.run("> ").unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![Vec::<String>::new()]);
    }

    #[test]
    fn test_history_records_matched_lines_before_callback() {
        let (mut sh, editor, out) = shell(&["look here", "unknown", "exit"], ShellConfig::default());
        let probe = editor.clone();
        sh.add_command("look", "", move |_| probe.history().join("|")).unwrap();
        sh.add_builtins();

        sh.run("> ").unwrap();
        assert_eq!(editor.history(), vec!["look here", "exit"]);
        assert!(out.contents().starts_with("look here\n"));
    }

    #[test]
    fn test_history_can_be_disabled() {
        let (mut sh, editor, _out) = shell(&["help", "exit"], same_context().record_history(false));
        sh.add_builtins();
        sh.run("> ").unwrap();
        assert!(editor.history().is_empty());
    }

    #[test]
    fn test_read_failure_ends_session_with_error_message() {
        for config in [ShellConfig::default(), same_context()] {
            let editor = ScriptedEditor::new(["noop"]).with_end_error(ReadError::Eof);
            let out = SharedBuffer::new();
            let mut sh = Interpreter::new("")
                .with_config(config)
                .with_editor(editor.clone())
                .with_output(out.clone());

            assert_eq!(sh.run("> ").unwrap(), "error: \"EOF\"");
            assert_eq!(editor.close_count(), 1);
            assert_eq!(out.contents(), "");
        }
    }

    #[test]
    fn test_greeting_printed_once_before_loop() {
        let editor = ScriptedEditor::new(["exit"]);
        let out = SharedBuffer::new();
        let mut sh = Interpreter::new("welcome")
            .with_editor(editor)
            .with_output(out.clone());
        sh.add_builtins();

        sh.run("> ").unwrap();
        assert_eq!(out.contents(), "welcome\n");
    }

    #[test]
    fn test_prompt_is_passed_to_editor() {
        let (mut sh, editor, _out) = shell(&["exit"], ShellConfig::default());
        sh.add_builtins();
        sh.run("dummyprompt? ").unwrap();
        assert_eq!(editor.prompts(), vec!["dummyprompt? "]);
    }

    #[test]
    fn test_completer_is_installed_with_min_length() {
        let (mut sh, editor, _out) = shell(&["exit"], same_context().min_substring_len(2));
        sh.add_command("ab", "", |_| String::new()).unwrap();
        sh.add_command("xab", "", |_| String::new()).unwrap();
        sh.add_builtins();
        sh.run("> ").unwrap();

        assert_eq!(editor.complete("a arg"), Some(vec!["ab arg".to_string()]));
        assert_eq!(editor.complete("ex"), Some(vec!["exit ".to_string()]));
    }

    #[test]
    fn test_exit_from_callback_on_loop_thread_returns_once() {
        let (mut sh, editor, _out) = shell(&["quit now", "quit again"], ShellConfig::default());
        let handle = sh.exit_handle();
        let loop_thread = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&loop_thread);
        sh.add_command("quit", "", move |args| {
            *seen.lock().unwrap() = Some(thread::current().id());
            handle.exit(args)
        })
        .unwrap();

        assert_eq!(sh.run("> ").unwrap(), "now");
        let callback_thread = loop_thread.lock().unwrap().unwrap();
        assert_ne!(callback_thread, thread::current().id());
        assert_eq!(editor.prompts().len(), 1);
        assert_eq!(editor.close_count(), 1);
    }

    #[test]
    fn test_same_context_runs_callbacks_on_caller_thread() {
        let (mut sh, _editor, _out) = shell(&["where"], same_context());
        let handle = sh.exit_handle();
        let caller = thread::current().id();
        sh.add_command("where", "", move |_| {
            handle.exit(&[(thread::current().id() == caller).to_string()])
        })
        .unwrap();

        assert_eq!(sh.run("> ").unwrap(), "true");
    }

    #[test]
    fn test_panicking_callback_aborts_split_session() {
        let (mut sh, editor, _out) = shell(&["boom"], ShellConfig::default());
        sh.add_command("boom", "", |_| panic!("callback failure")).unwrap();

        let res = sh.run("> ");

        assert!(matches!(res, Err(ShellError::LoopAborted)));
        assert_eq!(editor.close_count(), 1);
    }

    #[test]
    fn test_run_twice_fails() {
        let (mut sh, editor, _out) = shell(&["exit"], ShellConfig::default());
        sh.add_builtins();
        sh.run("> ").unwrap();

        assert!(matches!(sh.run("> "), Err(ShellError::SessionFinished)));
        assert_eq!(editor.close_count(), 1);
    }

    #[test]
    fn test_exit_before_run_finishes_session() {
        let (mut sh, editor, _out) = shell(&["help"], ShellConfig::default());
        assert_eq!(sh.exit(&["early".to_string()]), "early");

        assert!(matches!(sh.run("> "), Err(ShellError::SessionFinished)));
        assert_eq!(editor.close_count(), 1);
        assert!(editor.prompts().is_empty());
    }

    #[test]
    fn test_invalid_name_rejected_by_interpreter() {
        let mut sh = Interpreter::new("");
        assert!(matches!(
            sh.add_command("has space", "", |_| String::new()),
            Err(ShellError::InvalidName { .. })
        ));
        assert!(sh.registry().is_empty());
    }
}
