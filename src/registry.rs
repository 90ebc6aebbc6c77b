use crate::command::{Callback, Command};
use crate::error::Result;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The set of commands known to a shell, plus the fallback for unmatched input.
///
/// `Registry` is a cheap handle: clones share the same table. The interpreter, the
/// completer and any callback that needs to list commands (e.g. `help`) each hold one.
/// Commands are meant to be registered before the loop starts.
///
/// Example
/// ```
/// use repl_shell::Registry;
/// let registry = Registry::new();
/// registry.add_command("greet", "say hello", |args| format!("hello {}", args.join(" "))).unwrap();
/// assert!(registry.add_command("bad name", "", |_| String::new()).is_err());
/// assert_eq!(registry.longest_name(), 5);
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<Table>>,
}

#[derive(Default)]
struct Table {
    commands: BTreeMap<String, Command>,
    fallback: Option<Command>,
    longest_name: usize,
}

/// Outcome of matching a tokenized line against the registry.
pub enum Dispatch {
    /// The first token named a registered command; `args` are the remaining tokens.
    Command { command: Command, args: Vec<String> },
    /// Nothing matched; the fallback gets every token, including the first.
    Fallback { callback: Callback, args: Vec<String> },
}

impl Dispatch {
    pub fn invoke(&self) -> String {
        match self {
            Dispatch::Command { command, args } => command.invoke(args),
            Dispatch::Fallback { callback, args } => callback(args),
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, replacing any command already registered under it.
    ///
    /// Fails with [`ShellError::InvalidName`](crate::ShellError::InvalidName) when the
    /// name is empty or contains whitespace; the registry is unchanged in that case.
    pub fn add_command(
        &self,
        name: impl Into<String>,
        help: impl Into<String>,
        callback: impl Fn(&[String]) -> String + Send + Sync + 'static,
    ) -> Result<()> {
        let command = Command::new(name, help, callback)?;
        self.insert(command);
        Ok(())
    }

    /// Register an already validated command.
    pub fn insert(&self, command: Command) {
        let mut table = self.write();
        let width = command.name().chars().count();
        if table.longest_name < width {
            table.longest_name = width;
        }
        table.commands.insert(command.name().to_string(), command);
    }

    /// Install the callback that receives lines whose first token matches nothing.
    pub fn set_default(&self, callback: impl Fn(&[String]) -> String + Send + Sync + 'static) {
        self.write().fallback = Some(Command::fallback(Arc::new(callback)));
    }

    /// Exact-match lookup.
    pub fn lookup(&self, name: &str) -> Option<Command> {
        self.read().commands.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().commands.contains_key(name)
    }

    /// Registered names in lexicographic order.
    pub fn names(&self) -> Vec<String> {
        self.read().commands.keys().cloned().collect()
    }

    /// Length in characters of the longest registered name.
    pub fn longest_name(&self) -> usize {
        self.read().longest_name
    }

    pub fn len(&self) -> usize {
        self.read().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().commands.is_empty()
    }

    /// One line per command with non-empty help, names right-aligned to the longest name.
    ///
    /// Takes (and ignores) arguments so it can be registered as a callback directly.
    pub fn render_help(&self, _args: &[String]) -> String {
        let table = self.read();
        let width = table.longest_name;
        table
            .commands
            .values()
            .filter(|cmd| !cmd.help().is_empty())
            .map(|cmd| format!("{:>width$}  -  {}", cmd.name(), cmd.help()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Match tokens against the table.
    ///
    /// The callback is cloned out so the lock is not held while it runs.
    pub fn resolve(&self, tokens: &[String]) -> Dispatch {
        let table = self.read();
        if let Some(command) = tokens.first().and_then(|head| table.commands.get(head)) {
            return Dispatch::Command {
                command: command.clone(),
                args: tokens[1..].to_vec(),
            };
        }
        let callback: Callback = match &table.fallback {
            Some(fallback) => fallback.callback(),
            None => Arc::new(|_: &[String]| String::new()),
        };
        Dispatch::Fallback {
            callback,
            args: tokens.to_vec(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
