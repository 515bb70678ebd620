use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::flowchart::BlockId;

const NO_BLOCK: u64 = BlockId::RESERVED.0;

/// Fields the supervisor and the worker both touch. Each is read and written
/// on its own; no operation needs two of them to change together.
#[derive(Debug)]
pub struct SharedState {
    current: AtomicU64,
    paused: AtomicBool,
    step: AtomicBool,
    error: AtomicBool,
    cancelled: AtomicBool,
    step_delay_ms: AtomicU64,
    prompt: Mutex<Option<String>>,
}

impl SharedState {
    pub fn new(step_delay: Duration) -> Self {
        Self {
            current: AtomicU64::new(NO_BLOCK),
            paused: AtomicBool::new(false),
            step: AtomicBool::new(false),
            error: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            step_delay_ms: AtomicU64::new(duration_ms(step_delay)),
            prompt: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Option<BlockId> {
        match self.current.load(Ordering::Acquire) {
            NO_BLOCK => None,
            id => Some(BlockId(id)),
        }
    }

    pub fn set_current(&self, id: BlockId) {
        self.current.store(id.0, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool { self.paused.load(Ordering::Acquire) }
    pub fn set_paused(&self, v: bool) { self.paused.store(v, Ordering::Release) }

    pub fn request_step(&self) { self.step.store(true, Ordering::Release) }
    pub fn take_step(&self) -> bool { self.step.swap(false, Ordering::AcqRel) }
    pub fn clear_step(&self) { self.step.store(false, Ordering::Release) }

    pub fn error_occurred(&self) -> bool { self.error.load(Ordering::Acquire) }
    pub fn set_error(&self) { self.error.store(true, Ordering::Release) }

    pub fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::Acquire) }
    pub fn cancel(&self) { self.cancelled.store(true, Ordering::Release) }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms.load(Ordering::Relaxed))
    }

    pub fn set_step_delay(&self, delay: Duration) {
        self.step_delay_ms.store(duration_ms(delay), Ordering::Relaxed);
    }

    pub fn prompt(&self) -> Option<String> {
        self.prompt.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_prompt(&self, prompt: Option<String>) {
        *self.prompt.lock().unwrap_or_else(PoisonError::into_inner) = prompt;
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
