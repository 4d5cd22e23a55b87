//! Coalescing of viewport-change signals into evaluation passes.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Monotonic wall clock, counting from its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        ManualClock {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// What to do with a viewport-change signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAction {
    /// Evaluate now.
    RunNow,
    /// Suppressed; a single deferred pass is due at the given time.
    Deferred { due_ms: u64 },
}

/// Limits evaluation passes to one per window.
///
/// A signal within `window_ms` of the last executed pass is suppressed and
/// arms a deferred pass `window_ms` after the first suppressed signal of the
/// burst; later signals in the burst reuse that deadline. The deferred pass
/// reads the viewport when it fires, so the final size is always applied.
#[derive(Debug, Clone)]
pub struct ResizeThrottle {
    window_ms: u64,
    last_run_ms: Option<u64>,
    deferred_ms: Option<u64>,
}

impl ResizeThrottle {
    pub fn new(window_ms: u64) -> Self {
        ResizeThrottle {
            window_ms,
            last_run_ms: None,
            deferred_ms: None,
        }
    }

    pub fn signal(&mut self, now_ms: u64) -> ResizeAction {
        match self.last_run_ms {
            Some(last) if now_ms.saturating_sub(last) < self.window_ms => {
                let due_ms = *self.deferred_ms.get_or_insert(now_ms + self.window_ms);
                ResizeAction::Deferred { due_ms }
            }
            _ => ResizeAction::RunNow,
        }
    }

    /// Records an executed pass. Any deferred pass is cancelled.
    pub fn record_run(&mut self, now_ms: u64) {
        self.last_run_ms = Some(now_ms);
        self.deferred_ms = None;
    }

    /// Deadline of the armed deferred pass.
    pub fn deferred(&self) -> Option<u64> {
        self.deferred_ms
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.deferred_ms.is_some_and(|due| now_ms >= due)
    }
}
