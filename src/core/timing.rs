//! Loop pacing shared by the update and render loops.
//!
//! Both loops follow the same recipe every iteration: measure the wall-clock
//! time since the previous iteration started, sleep off whatever is left of the
//! target period, and publish a measured rate. The arithmetic lives here as
//! plain functions so it can be checked without a running loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

use thiserror::Error;

pub const NANOS_PER_SECOND: f64 = 1e9;

/// Sleep requests shorter than this are skipped.
pub const MIN_SLEEP_NANOS: i64 = 1_000;

/// Target period in nanoseconds for a rate in Hz.
pub fn target_period_nanos(rate: f64) -> i64 {
    (NANOS_PER_SECOND / rate) as i64
}

/// How long to sleep so the iteration fills the target period, if at all.
pub fn sleep_request(elapsed_nanos: i64, period_nanos: i64) -> Option<Duration> {
    let remaining = period_nanos - elapsed_nanos;
    if remaining < MIN_SLEEP_NANOS {
        None
    } else {
        Some(Duration::from_nanos(remaining as u64))
    }
}

/// Rate reported for one iteration.
///
/// While the loop keeps up, the sleep tops the iteration up to exactly one
/// period, so the target rate is reported. Once an iteration overruns, the
/// true (degraded) rate is reported instead.
pub fn measured_rate(elapsed_nanos: i64, period_nanos: i64) -> f64 {
    if elapsed_nanos < period_nanos {
        NANOS_PER_SECOND / period_nanos as f64
    } else {
        NANOS_PER_SECOND / elapsed_nanos.max(1) as f64
    }
}

//--- Tick ------------------------------------------------------------------

/// Timing of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub elapsed_nanos: i64,
    pub period_nanos: i64,
}

impl Tick {
    pub fn new(elapsed_nanos: i64, target_rate: f64) -> Self {
        Self {
            elapsed_nanos,
            period_nanos: target_period_nanos(target_rate),
        }
    }

    pub fn sleep_request(&self) -> Option<Duration> {
        sleep_request(self.elapsed_nanos, self.period_nanos)
    }

    pub fn measured_rate(&self) -> f64 {
        measured_rate(self.elapsed_nanos, self.period_nanos)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_nanos as f64 / NANOS_PER_SECOND
    }
}

//--- LoopClock -------------------------------------------------------------

/// Measures the time between consecutive iteration starts.
#[derive(Debug)]
pub struct LoopClock {
    last: Instant,
}

impl LoopClock {
    pub fn start() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Nanoseconds since the previous lap (or since `start`).
    pub fn lap(&mut self) -> i64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        elapsed.as_nanos().min(i64::MAX as u128) as i64
    }
}

//--- DeltaWindow -----------------------------------------------------------

/// Two-slot rolling buffer of elapsed samples.
///
/// Scenes receive the sum of the two most recent samples as their delta time,
/// not the latest sample alone. Game logic is tuned against that value, so the
/// window size and the summing are fixed.
#[derive(Debug, Clone, Default)]
pub struct DeltaWindow {
    samples: [f64; 2],
    slot: usize,
}

impl DeltaWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a sample (seconds) and advances to the other slot.
    pub fn record(&mut self, elapsed_secs: f64) {
        self.samples[self.slot] = elapsed_secs;
        self.slot ^= 1;
    }

    /// Delta time handed to `Scene::update`, in seconds.
    pub fn delta(&self) -> f64 {
        self.samples[0] + self.samples[1]
    }
}

//--- AtomicF64 -------------------------------------------------------------

/// An `f64` stored as its bit pattern, for rates shared between loops.
#[derive(Debug)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

//--- Interruptible sleep -----------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("loop sleep was interrupted")]
pub struct Interrupted;

/// Sleep that another thread can cut short.
///
/// An interrupt raised while the owner is awake stays pending and fails the
/// next sleep, so no interrupt is lost between two sleeps.
#[derive(Debug, Default)]
pub struct SleepInterrupt {
    pending: AtomicBool,
    sleeper: Mutex<Option<Thread>>,
}

impl SleepInterrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the calling thread the one `interrupt` wakes up.
    pub fn register_current(&self) {
        let mut sleeper = self.sleeper.lock().unwrap_or_else(|e| e.into_inner());
        *sleeper = Some(thread::current());
    }

    pub fn interrupt(&self) {
        self.pending.store(true, Ordering::Release);
        let sleeper = self.sleeper.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(thread) = sleeper.as_ref() {
            thread.unpark();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Sleeps for `duration` unless interrupted first.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now() + duration;
        loop {
            if self.pending.swap(false, Ordering::AcqRel) {
                return Err(Interrupted);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            // spurious wakeups just go around again
            thread::park_timeout(deadline - now);
        }
    }
}
