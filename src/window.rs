use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;

/// Decaying simple moving average over the last `capacity` integer samples.
///
/// For each decay period the window goes without an [`add`](Self::add), the
/// oldest retained sample is zeroed. Zeroed samples keep their place in the
/// denominator, so an idle window drags its average towards zero rather than
/// shrinking. Decay is applied lazily when the value is read; there is no
/// background maintenance.
///
/// All operations serialize on one internal lock, so a window can be shared
/// across threads behind an `Arc`.
#[derive(Debug)]
pub struct DecayingWindowAverage<C: Clock = SystemClock> {
    capacity: usize,
    decay_period: Duration,
    clock: C,
    inner: Mutex<Window>,
}

#[derive(Debug)]
struct Window {
    values: Vec<i64>,
    cursor: usize,
    sum: i64,
    last_update: Option<Instant>,
}

/// Point-in-time view of a window, taken after pending decay is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub average: f64,
    pub samples: usize,
    pub capacity: usize,
}

impl DecayingWindowAverage<SystemClock> {
    /// Creates a window holding up to `capacity` samples. A zero
    /// `decay_period` disables decay.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, decay_period: Duration) -> Self {
        Self::with_clock(capacity, decay_period, SystemClock)
    }

    /// Like [`new`](Self::new) with the decay period in signed milliseconds.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `decay_period_ms` is negative.
    pub fn from_millis(capacity: usize, decay_period_ms: i64) -> Self {
        Self::try_from_millis(capacity, decay_period_ms).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Fallible form of [`new`](Self::new) for configuration read at runtime.
    pub fn try_new(capacity: usize, decay_period: Duration) -> Result<Self, ConfigError> {
        Self::try_with_clock(capacity, decay_period, SystemClock)
    }

    /// Fallible form of [`from_millis`](Self::from_millis).
    pub fn try_from_millis(capacity: usize, decay_period_ms: i64) -> Result<Self, ConfigError> {
        let millis = u64::try_from(decay_period_ms)
            .map_err(|_| ConfigError::NegativeDecayPeriod { millis: decay_period_ms })?;
        Self::try_new(capacity, Duration::from_millis(millis))
    }
}

impl<C: Clock> DecayingWindowAverage<C> {
    /// Creates a window whose decay is measured against `clock`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_clock(capacity: usize, decay_period: Duration, clock: C) -> Self {
        Self::try_with_clock(capacity, decay_period, clock).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Fallible form of [`with_clock`](Self::with_clock).
    pub fn try_with_clock(
        capacity: usize,
        decay_period: Duration,
        clock: C,
    ) -> Result<Self, ConfigError> {
        if capacity < 1 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            decay_period,
            clock,
            inner: Mutex::new(Window {
                values: Vec::with_capacity(capacity),
                cursor: 0,
                sum: 0,
                last_update: None,
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn decay_period(&self) -> Duration {
        self.decay_period
    }

    /// Number of slots currently held, zeroed ones included. Pending decay is
    /// not applied.
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records `values` in order. Once the window is full each value
    /// overwrites the oldest slot. Restarts the decay countdown, even for an
    /// empty batch.
    pub fn add(&self, values: &[i64]) {
        let mut guard = self.lock();
        let w = &mut *guard;
        for &v in values {
            if w.values.len() < self.capacity {
                // a cursor short of the end marks the oldest slot decay has not reached
                if w.cursor == w.values.len() {
                    w.cursor += 1;
                }
                w.values.push(v);
                w.sum = w.sum.wrapping_add(v);
                continue;
            }
            let slot = w.cursor % self.capacity;
            w.sum = w.sum.wrapping_sub(w.values[slot]).wrapping_add(v);
            w.values[slot] = v;
            w.cursor = slot + 1;
        }
        w.last_update = Some(self.clock.now());
    }

    /// Current average, after zeroing the samples that decayed since the last
    /// update. Returns 0 for an empty window.
    pub fn value(&self) -> f64 {
        let now = self.clock.now();
        let mut w = self.lock();
        self.decay(&mut w, now);
        w.average()
    }

    /// Average and fill level read under a single lock.
    pub fn snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        let mut w = self.lock();
        self.decay(&mut w, now);
        Snapshot {
            average: w.average(),
            samples: w.values.len(),
            capacity: self.capacity,
        }
    }

    fn decay(&self, w: &mut Window, now: Instant) {
        if w.values.is_empty() || self.decay_period.is_zero() {
            return;
        }
        let Some(last_update) = w.last_update else {
            return;
        };
        let elapsed = now.saturating_duration_since(last_update);
        if elapsed <= self.decay_period {
            return;
        }

        let periods = elapsed.as_nanos() / self.decay_period.as_nanos();
        let len = w.values.len();
        if periods >= len as u128 {
            debug!(periods = %periods, samples = len, "window fully decayed");
            w.values.clear();
            w.sum = 0;
            w.cursor = 0;
            return;
        }

        // periods < len, so it fits in usize
        let n = periods as usize;
        for _ in 0..n {
            let slot = w.cursor % len;
            w.sum = w.sum.wrapping_sub(w.values[slot]);
            w.values[slot] = 0;
            w.cursor = slot + 1;
        }
        let advance = u64::try_from(self.decay_period.as_nanos() * periods).unwrap_or(u64::MAX);
        w.last_update = Some(last_update + Duration::from_nanos(advance));
        debug!(periods = n, samples = len, sum = w.sum, "decayed oldest samples");
    }

    fn lock(&self) -> MutexGuard<'_, Window> {
        // every mutation completes before the guard drops, so a poisoned
        // window is still consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Window {
    fn average(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.sum as f64 / self.values.len() as f64
    }
}
