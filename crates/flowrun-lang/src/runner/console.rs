use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use crate::error::ExecutionError;
use crate::runtime::console::Console;

use super::shared::SharedState;

/// How long a pending read waits on stdin before re-checking for a stop.
const READ_POLL: Duration = Duration::from_millis(20);

/// Messages from the supervisor to a running worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Stop,
}

/// Console used inside the worker thread. Output goes to the stdout channel;
/// reads wait on the stdin channel while watching the control channel so a
/// stop request can interrupt them.
pub struct ChannelConsole {
    stdout: Sender<String>,
    stdin: Receiver<String>,
    control: Receiver<Control>,
    shared: Arc<SharedState>,
}

impl ChannelConsole {
    pub(crate) fn new(
        stdout: Sender<String>,
        stdin: Receiver<String>,
        control: Receiver<Control>,
        shared: Arc<SharedState>,
    ) -> Self {
        Self { stdout, stdin, control, shared }
    }

    fn wait_for_line(&mut self) -> Result<String, ExecutionError> {
        loop {
            match self.control.try_recv() {
                Ok(Control::Stop) | Err(TryRecvError::Disconnected) => {
                    return Err(ExecutionError::interrupted());
                }
                Err(TryRecvError::Empty) => {}
            }
            if self.shared.is_cancelled() {
                return Err(ExecutionError::interrupted());
            }
            match self.stdin.recv_timeout(READ_POLL) {
                Ok(line) => return Ok(line),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(ExecutionError::interrupted()),
            }
        }
    }
}

impl Console for ChannelConsole {
    fn write(&mut self, text: String) {
        // The supervisor may already have dropped its end after a stop.
        let _ = self.stdout.send(text);
    }

    fn read(&mut self, prompt: &str) -> Result<String, ExecutionError> {
        self.shared.set_prompt(Some(prompt.to_string()));
        let line = self.wait_for_line();
        self.shared.set_prompt(None);
        line
    }
}
