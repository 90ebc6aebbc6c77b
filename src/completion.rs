//! Tab completion over the registered command names.
//!
//! Candidates are whole replacement lines. Names starting with the typed word come
//! first, then names merely containing it; either way the arguments typed after the
//! first word are carried over so completing never discards input.

use crate::command::tokenize;
use crate::registry::Registry;

/// Computes completion candidates for a partial input line.
#[derive(Clone)]
pub struct Completer {
    registry: Registry,
    min_substring_len: usize,
}

impl Completer {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            min_substring_len: 0,
        }
    }

    /// Only fall back to substring matches when the typed word has at least `len`
    /// characters. `0` allows substring matching for any input.
    pub fn with_min_substring_len(mut self, len: usize) -> Self {
        self.min_substring_len = len;
        self
    }

    /// Candidates for `line`.
    ///
    /// If the first word already names a command, the only candidate is the line
    /// followed by a space.
    ///
    /// Example
    /// ```
    /// use repl_shell::{Completer, Registry};
    /// let registry = Registry::new();
    /// registry.add_command("foo", "", |_| String::new()).unwrap();
    /// let completer = Completer::new(registry);
    /// assert_eq!(completer.complete("foo"), vec!["foo "]);
    /// assert_eq!(completer.complete("fo bar baz"), vec!["foo bar baz"]);
    /// ```
    pub fn complete(&self, line: &str) -> Vec<String> {
        let tokens = tokenize(line);
        let (head, rest) = match tokens.split_first() {
            Some((head, rest)) => (head.as_str(), rest),
            None => ("", &[][..]),
        };

        if self.registry.contains(head) {
            return vec![format!("{} ", line)];
        }

        let tail = rest.join(" ");
        let (prefixed, remaining): (Vec<String>, Vec<String>) = self
            .registry
            .names()
            .into_iter()
            .partition(|name| name.starts_with(head));

        let mut candidates: Vec<String> = prefixed
            .iter()
            .map(|name| format!("{} {}", name, tail))
            .collect();

        if head.chars().count() >= self.min_substring_len {
            candidates.extend(
                remaining
                    .iter()
                    .filter(|name| name.contains(head))
                    .map(|name| format!("{} {}", name, tail)),
            );
        }

        tracing::trace!(line, candidates = candidates.len(), "completed");
        candidates
    }
}
