use crate::error::{Result, ShellError};
use std::fmt;
use std::sync::Arc;

/// Callback invoked with the tokens following the command name.
///
/// The returned text is printed by the loop. Callbacks are shared between the loop
/// and whatever task it runs on, hence `Send + Sync`.
pub type Callback = Arc<dyn Fn(&[String]) -> String + Send + Sync>;

/// A named command registered with the shell.
///
/// The name is validated on construction and cannot change afterwards.
#[derive(Clone)]
pub struct Command {
    name: String,
    help: String,
    callback: Callback,
}

impl Command {
    /// Build a command, rejecting empty names and names containing whitespace.
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        callback: impl Fn(&[String]) -> String + Send + Sync + 'static,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            help: help.into(),
            callback: Arc::new(callback),
        })
    }

    /// The fallback command. Its name is never looked up.
    pub(crate) fn fallback(callback: Callback) -> Self {
        Self {
            name: String::new(),
            help: String::new(),
            callback,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text; empty help hides the command from the help listing.
    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn callback(&self) -> Callback {
        Arc::clone(&self.callback)
    }

    /// Run the callback with the given arguments.
    pub fn invoke(&self, args: &[String]) -> String {
        (self.callback)(args)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(ShellError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Split a line into whitespace separated tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_with_space_is_rejected() {
        let res = Command::new("two words", "", |_| String::new());
        assert!(matches!(res, Err(ShellError::InvalidName { name }) if name == "two words"));
    }

    #[test]
    fn test_name_with_tab_or_empty_is_rejected() {
        assert!(Command::new("a\tb", "", |_| String::new()).is_err());
        assert!(Command::new("", "", |_| String::new()).is_err());
    }

    #[test]
    fn test_invoke_passes_arguments() {
        let cmd = Command::new("join", "joins args", |args| args.join("+")).unwrap();
        assert_eq!(cmd.name(), "join");
        assert_eq!(cmd.help(), "joins args");
        assert_eq!(cmd.invoke(&["a".to_string(), "b".to_string()]), "a+b");
    }

    #[test]
    fn test_tokenize_collapses_whitespace() {
        assert_eq!(tokenize("  foo   bar\tbaz "), vec!["foo", "bar", "baz"]);
        assert!(tokenize("   ").is_empty());
    }
}
