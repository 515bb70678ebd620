use std::collections::VecDeque;

use crate::error::ExecutionError;

/// Where `write` output goes and where `read` input comes from.
///
/// The runner supplies a channel-backed console; tests and one-shot
/// evaluation use [`BufferConsole`].
pub trait Console {
    fn write(&mut self, text: String);

    /// Block until a line of input is available. `prompt` describes what is
    /// being asked for, e.g. `side (Number)`.
    fn read(&mut self, prompt: &str) -> Result<String, ExecutionError>;
}

/// In-memory console with scripted input.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    input: VecDeque<String>,
    pub output: Vec<String>,
    pub prompts: Vec<String>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { input: lines.into_iter().map(Into::into).collect(), ..Self::default() }
    }
}

impl Console for BufferConsole {
    fn write(&mut self, text: String) {
        self.output.push(text);
    }

    /// Running out of scripted input behaves like a cancelled read.
    fn read(&mut self, prompt: &str) -> Result<String, ExecutionError> {
        self.prompts.push(prompt.to_string());
        self.input.pop_front().ok_or_else(ExecutionError::interrupted)
    }
}
