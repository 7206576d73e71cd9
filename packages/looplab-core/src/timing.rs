use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Simulated network latency (ms). Deliberately a fixed constant, decoupled
/// from the speed preset, while the timer default delay tracks the preset —
/// network waits should look long regardless of how fast the loop steps.
pub const NETWORK_LATENCY_MS: u64 = 3_000;

/// Offset applied to a promise continuation's timestamp so it sorts just
/// after its creation task without requiring a promotion.
pub const MICROTASK_SCHEDULE_OFFSET_MS: u64 = 100;

/// Time source for the engine. Different runtimes plug in different clocks:
/// the CLI uses a monotonic system clock, tests a manually advanced one.
pub trait Clock {
    /// Current time in logical milliseconds, monotonic.
    fn now_ms(&self) -> u64;
}

/// Monotonic wall clock, measured from construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
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

/// Manually advanced clock. Clones share the same time, so a test can keep
/// one handle while the session owns the other.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
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

/// Execution speed preset. Governs the automatic step interval and, at half
/// the interval, the settle delay between execution and retirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl Speed {
    pub fn step_interval_ms(self) -> u64 {
        match self {
            Speed::Slow => 2_000,
            Speed::Normal => 1_000,
            Speed::Fast => 500,
        }
    }

    pub fn settle_delay_ms(self) -> u64 {
        self.step_interval_ms() / 2
    }
}
