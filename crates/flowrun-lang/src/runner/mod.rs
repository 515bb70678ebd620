//! Executes a flowchart on a background thread and exposes its progress to
//! a supervisor that polls once per frame.
//!
//! Lifecycle: `Idle` → `Building` → `Running` ⇄ `Paused` → `Stopped`. A
//! runner is single-use; once stopped it never runs again.

mod console;
mod shared;
mod worker;

pub use console::{ChannelConsole, Control};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::compiler::Program;
use crate::error::{BuildError, ExecutionError};
use crate::flowchart::{BlockId, Flowchart};
use crate::runtime::value::Value;

use shared::SharedState;
use worker::Worker;

/// Most messages taken from one channel per drain call.
pub const DRAIN_BATCH: usize = 50;

// ─── Options and state ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Pause between two blocks.
    pub step_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { step_delay: Duration::from_millis(500) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Reached END.
    Finished,
    /// A block evaluated to an error.
    Error,
    /// `stop()` was called.
    Aborted,
    BuildFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Building,
    Running,
    Paused,
    Stopped(StopReason),
}

/// Supervisor ends of the run's channels.
struct Channels {
    stdout: Receiver<String>,
    stderr: Receiver<ExecutionError>,
    vars: Receiver<(String, Value)>,
    stdin: Sender<String>,
    control: Sender<Control>,
}

// ─── Runner ──────────────────────────────────────────────────────────────────

pub struct Runner {
    options: RunOptions,
    state: RunState,
    shared: Arc<SharedState>,
    handle: Option<JoinHandle<()>>,
    channels: Option<Channels>,
    variables: BTreeMap<String, Value>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(RunOptions::default())
    }
}

impl Runner {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            state: RunState::Idle,
            shared: Arc::new(SharedState::new(options.step_delay)),
            handle: None,
            channels: None,
            variables: BTreeMap::new(),
        }
    }

    /// Build `chart` and start executing it. Build errors are returned here
    /// and no thread is started. Does nothing unless the runner is idle.
    pub fn start(&mut self, chart: &Flowchart) -> Result<(), Vec<BuildError>> {
        if self.state != RunState::Idle {
            warn!(state = ?self.state, "start ignored: runner already used");
            return Ok(());
        }

        self.state = RunState::Building;
        let program = match Program::build(chart) {
            Ok(p) => p,
            Err(errors) => {
                warn!(errors = errors.len(), "build failed; run not started");
                self.state = RunState::Stopped(StopReason::BuildFailed);
                return Err(errors);
            }
        };

        let (stdout_tx, stdout_rx) = mpsc::channel();
        let (stderr_tx, stderr_rx) = mpsc::channel();
        let (vars_tx, vars_rx) = mpsc::channel();
        let (stdin_tx, stdin_rx) = mpsc::channel();
        let (control_tx, control_rx) = mpsc::channel();

        let worker = Worker {
            program,
            shared: Arc::clone(&self.shared),
            console: ChannelConsole::new(stdout_tx, stdin_rx, control_rx, Arc::clone(&self.shared)),
            vars: vars_tx,
            stderr: stderr_tx,
        };

        match thread::Builder::new().name("flowrun-worker".into()).spawn(move || worker.run()) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.channels = Some(Channels {
                    stdout: stdout_rx,
                    stderr: stderr_rx,
                    vars: vars_rx,
                    stdin: stdin_tx,
                    control: control_tx,
                });
                self.state = RunState::Running;
                info!(delay_ms = self.options.step_delay.as_millis() as u64, "runner started");
            }
            Err(e) => {
                error!(%e, "could not spawn worker thread");
                self.state = RunState::Stopped(StopReason::Aborted);
            }
        }
        Ok(())
    }

    // ─── Control ─────────────────────────────────────────────────────────────

    pub fn pause(&mut self) {
        if self.state() == RunState::Running {
            self.shared.clear_step();
            self.shared.set_paused(true);
            info!("paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state() == RunState::Paused {
            // A step not taken before the resume must not skip a later pause.
            self.shared.clear_step();
            self.shared.set_paused(false);
            self.unpark();
            info!("resumed");
        }
    }

    /// While paused, let the run move on by exactly one block.
    pub fn advance(&mut self) {
        if self.state() == RunState::Paused {
            self.shared.request_step();
            self.unpark();
            debug!("single step");
        }
    }

    /// Cancel the run, wait for the worker to exit and drop every channel.
    /// Safe in any state.
    pub fn stop(&mut self) {
        let ended = match self.state {
            RunState::Running | RunState::Paused => self.finished_reason(),
            _ => None,
        };

        self.shared.cancel();
        if let Some(ch) = &self.channels {
            let _ = ch.control.send(Control::Stop);
        }
        self.shared.set_paused(false);
        self.unpark();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }
        self.channels = None;
        self.shared.set_prompt(None);

        if !matches!(self.state, RunState::Stopped(_)) {
            self.state = RunState::Stopped(ended.unwrap_or(StopReason::Aborted));
            info!(state = ?self.state, "runner stopped");
        }
    }

    pub fn set_step_delay(&mut self, delay: Duration) {
        self.options.step_delay = delay;
        self.shared.set_step_delay(delay);
    }

    fn unpark(&self) {
        if let Some(handle) = &self.handle {
            handle.thread().unpark();
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    pub fn state(&self) -> RunState {
        match self.state {
            RunState::Running | RunState::Paused => {
                if let Some(reason) = self.finished_reason() {
                    RunState::Stopped(reason)
                } else if self.shared.is_paused() {
                    RunState::Paused
                } else {
                    RunState::Running
                }
            }
            other => other,
        }
    }

    /// Why the worker ended, if it has.
    fn finished_reason(&self) -> Option<StopReason> {
        let done = self.handle.as_ref().is_none_or(JoinHandle::is_finished);
        if !done {
            return None;
        }
        Some(if self.shared.error_occurred() {
            StopReason::Error
        } else if self.shared.is_cancelled() {
            StopReason::Aborted
        } else {
            StopReason::Finished
        })
    }

    pub fn step_delay(&self) -> Duration {
        self.options.step_delay
    }

    pub fn current_block_id(&self) -> Option<BlockId> {
        self.shared.current()
    }

    pub fn is_paused(&self) -> bool {
        self.state() == RunState::Paused
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn error_occurred(&self) -> bool {
        self.shared.error_occurred()
    }

    /// Latest value of every variable seen in snapshot messages so far.
    pub fn variables(&self) -> &BTreeMap<String, Value> {
        &self.variables
    }

    // ─── Channels ────────────────────────────────────────────────────────────

    pub fn drain_stdout(&mut self) -> Vec<String> {
        match &self.channels {
            Some(ch) => ch.stdout.try_iter().take(DRAIN_BATCH).collect(),
            None => Vec::new(),
        }
    }

    pub fn drain_stderr(&mut self) -> Vec<ExecutionError> {
        match &self.channels {
            Some(ch) => ch.stderr.try_iter().take(DRAIN_BATCH).collect(),
            None => Vec::new(),
        }
    }

    /// Take pending variable snapshots and fold them into [`Self::variables`].
    pub fn drain_variable_updates(&mut self) -> Vec<(String, Value)> {
        let updates: Vec<(String, Value)> = match &self.channels {
            Some(ch) => ch.vars.try_iter().take(DRAIN_BATCH).collect(),
            None => Vec::new(),
        };
        for (name, value) in &updates {
            self.variables.insert(name.clone(), value.clone());
        }
        updates
    }

    /// Prompt of the read currently waiting for input, e.g. `side (Number)`.
    pub fn pending_stdin_prompt(&self) -> Option<String> {
        self.shared.prompt()
    }

    /// Queue a line for the next read. Returns false when no run is active.
    pub fn submit_input(&mut self, line: impl Into<String>) -> bool {
        match &self.channels {
            Some(ch) => ch.stdin.send(line.into()).is_ok(),
            None => false,
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}
