use crate::exit::ExitHandle;
use crate::registry::Registry;
use argh::{EarlyExit, FromArgs};

/// Commands shipped with the shell.
///
/// Builtins parse their arguments with the [`argh`] crate (`FromArgs`), so
/// `exit --help` prints usage instead of ending the session.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// What the command needs from the shell to run.
    type Context: Send + Sync + 'static;

    /// Canonical name of the command, e.g. "help".
    fn name() -> &'static str;

    /// Line shown by `help`.
    fn help() -> &'static str;

    fn execute(self, ctx: &Self::Context) -> String;
}

/// Turn a builtin into a registry callback.
///
/// Argument errors and `--help` requests come back as the callback's output.
pub(crate) fn callback<T: BuiltinCommand>(
    ctx: T::Context,
) -> impl Fn(&[String]) -> String + Send + Sync + 'static {
    move |args: &[String]| {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match T::from_args(&[T::name()], &args) {
            Ok(cmd) => cmd.execute(&ctx),
            Err(EarlyExit { output, .. }) => output.trim_end().to_string(),
        }
    }
}

pub(crate) fn register<T: BuiltinCommand>(registry: &Registry, ctx: T::Context) {
    // Builtin names are static and valid.
    if let Err(err) = registry.add_command(T::name(), T::help(), callback::<T>(ctx)) {
        tracing::error!(%err, "failed to register builtin");
    }
}

#[derive(FromArgs)]
/// Print every command that has a help text.
pub struct Help {}

impl BuiltinCommand for Help {
    type Context = Registry;

    fn name() -> &'static str {
        "help"
    }

    fn help() -> &'static str {
        "prints this help message"
    }

    fn execute(self, registry: &Registry) -> String {
        registry.render_help(&[])
    }
}

#[derive(FromArgs)]
/// Leave the shell, printing the given message.
pub struct Exit {
    #[argh(positional, greedy)]
    /// words of the farewell message, joined by single spaces.
    pub message: Vec<String>,
}

impl BuiltinCommand for Exit {
    type Context = ExitHandle;

    fn name() -> &'static str {
        "exit"
    }

    fn help() -> &'static str {
        "exits the input loop"
    }

    fn execute(self, handle: &ExitHandle) -> String {
        handle.exit(&self.message)
    }
}

/// `help` callback listing the commands of `registry`.
pub fn help(registry: Registry) -> impl Fn(&[String]) -> String + Send + Sync + 'static {
    callback::<Help>(registry)
}

/// `exit` callback ending the session behind `handle`.
pub fn exit(handle: ExitHandle) -> impl Fn(&[String]) -> String + Send + Sync + 'static {
    callback::<Exit>(handle)
}
