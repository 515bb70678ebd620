use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::compiler::{Program, Successor};
use crate::error::ExecutionError;
use crate::flowchart::BlockId;
use crate::runtime::environment::Environment;
use crate::runtime::value::Value;

use super::console::ChannelConsole;
use super::shared::SharedState;

/// Upper bound on a single park while paused; cancellation is re-checked
/// at least this often even without an unpark.
const HOLD_SLICE: Duration = Duration::from_millis(50);

pub(crate) struct Worker {
    pub program: Program,
    pub shared: Arc<SharedState>,
    pub console: ChannelConsole,
    pub vars: Sender<(String, Value)>,
    pub stderr: Sender<ExecutionError>,
}

impl Worker {
    pub fn run(mut self) {
        let mut env = Environment::new();
        let mut current = self.program.entry();
        self.shared.set_current(current);
        info!(entry = %current, "run started");

        while let Some(block) = self.program.get(current) {
            if self.shared.is_cancelled() {
                return;
            }

            let value = block.node.evaluate(&mut env, &mut self.console);
            trace!(block = %current, ?value, "evaluated");
            if let Value::Error(e) = value {
                self.fail(current, e);
                return;
            }

            self.publish(&env);

            if !self.pace() || !self.hold() {
                return;
            }

            let next = match block.successor {
                Successor::Linear(next) => next,
                Successor::Branch { on_true, on_false } => match value.to_boolean() {
                    Value::Boolean(true) => on_true,
                    Value::Boolean(false) => on_false,
                    Value::Error(e) => {
                        self.fail(current, e);
                        return;
                    }
                    other => {
                        self.fail(current, ExecutionError::type_err("error.msg.invalid_cast")
                            .with("op_type", other.value_type())
                            .with("cast_type", "Boolean"));
                        return;
                    }
                },
            };

            debug!(from = %current, to = %next, "transition");
            current = next;
            self.shared.set_current(current);
        }

        info!(last = %current, "run finished");
    }

    /// Interrupted reads end the run quietly; anything else is reported.
    fn fail(&self, block: BlockId, error: ExecutionError) {
        if error.is_interrupted() {
            debug!(%block, "read interrupted");
            return;
        }
        info!(%block, %error, "run halted on error");
        self.shared.set_error();
        let _ = self.stderr.send(error);
    }

    fn publish(&self, env: &Environment) {
        for (name, value) in env.iter() {
            let _ = self.vars.send((name.to_string(), value.clone()));
        }
    }

    /// Sleep the step delay. Returns false when cancelled meanwhile.
    fn pace(&self) -> bool {
        let deadline = Instant::now() + self.shared.step_delay();
        loop {
            if self.shared.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::park_timeout(deadline - now);
        }
    }

    /// Wait while paused. A pending single-step request lets exactly one
    /// more block through without clearing the pause.
    fn hold(&self) -> bool {
        while self.shared.is_paused() {
            if self.shared.is_cancelled() {
                return false;
            }
            if self.shared.take_step() {
                break;
            }
            thread::park_timeout(HOLD_SLICE);
        }
        !self.shared.is_cancelled()
    }
}
