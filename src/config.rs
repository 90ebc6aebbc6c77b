/// Where the dispatch loop runs relative to the caller of [`Interpreter::run`].
///
/// [`Interpreter::run`]: crate::Interpreter::run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheduling {
    /// The loop runs on the caller's thread; exit just flips the loop state.
    SameContext,
    /// The loop runs on its own thread while the caller waits for the exit signal.
    #[default]
    SplitContext,
}

/// Runtime knobs of an [`Interpreter`](crate::Interpreter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub scheduling: Scheduling,
    /// Append lines that matched a registered command to the editor history.
    pub record_history: bool,
    /// Minimum length of the typed word before completion falls back to substring matches.
    pub min_substring_len: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            scheduling: Scheduling::default(),
            record_history: true,
            min_substring_len: 0,
        }
    }
}

impl ShellConfig {
    pub fn scheduling(mut self, scheduling: Scheduling) -> Self {
        self.scheduling = scheduling;
        self
    }

    pub fn record_history(mut self, record: bool) -> Self {
        self.record_history = record;
        self
    }

    pub fn min_substring_len(mut self, len: usize) -> Self {
        self.min_substring_len = len;
        self
    }
}
