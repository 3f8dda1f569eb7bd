//! sampler.rs
//! Fast periodic task: acquire → timestamp → compare → publish.
//! - Acquisition runs outside the lock; compare/update runs under it.
//! - Statistics refresh on every alerting sample; the alert source is raised
//!   only on the edge into an alert (guarded by `alert_armed`).
//! - SpinSleeper keeps the fixed tick independent of the configured interval.

use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use log::{debug, info, trace, warn};
use spin_sleep::{SpinSleeper, SpinStrategy};

use crate::{
    engine::{
        EngineHandle,
        shared::{Acquisition, Shared},
    },
    error::{EngineError, Result},
    sample::Sample,
    source::TemperatureSource,
};

/// Sampler period bounds. The pacing sleep is not interruptible, so stop
/// waits up to one period.
pub const MIN_TICK: Duration = Duration::from_millis(1);
pub const MAX_TICK: Duration = Duration::from_millis(1000);

pub struct Sampler {
    shared: Arc<Shared>,
    source: Box<dyn TemperatureSource>,
    period: Duration,
    cycles: u64,
    late_cycles: u64,
}

impl Sampler {
    /// Sampler over `handle`'s state, paced at the source's default tick.
    pub fn new(handle: &EngineHandle, source: Box<dyn TemperatureSource>) -> Self {
        let period = source.default_tick();
        Self {
            shared: handle.shared.clone(),
            source,
            period,
            cycles: 0,
            late_cycles: 0,
        }
    }

    /// Overrides the period, clamped to `MIN_TICK..=MAX_TICK`.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.period = tick.clamp(MIN_TICK, MAX_TICK);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs one sampling cycle and returns the published sample.
    ///
    /// A failed hardware read republishes the previous value with
    /// `new_sample == false` and returns the read error. A source that does
    /// not hold its last value has the cycle skipped instead.
    pub fn tick(&mut self) -> Result<Sample> {
        let mode = {
            let inner = self.shared.lock();
            if inner.is_shutdown() {
                return Err(EngineError::ShutdownInProgress);
            }
            inner.config.mode.clone()
        };

        let reading = self.source.next_raw_reading(&mode);
        let timestamp_ns = wall_clock_ns();

        let mut inner = self.shared.lock();
        if inner.is_shutdown() {
            return Err(EngineError::ShutdownInProgress);
        }

        let (temp_mc, failure) = match reading {
            Ok(v) => (v, None),
            Err(e) => match inner.last {
                Some(prev) if self.source.holds_last_value() => (prev.temp_mc, Some(e)),
                _ => return Err(e),
            },
        };

        let acq = Acquisition {
            temp_mc,
            timestamp_ns,
            fresh: failure.is_none(),
        };
        inner.last = Some(acq);
        let sample = inner.sample_from(&acq);
        self.cycles += 1;

        if sample.is_alert() {
            inner.stats.record(timestamp_ns, sample.low_alert, sample.high_alert);
            if !inner.alert_armed {
                inner.alert_armed = true;
                inner.pending.raise_alert();
                self.shared.ready.notify_all();
                debug!(
                    "[Sampler] alert edge: {} mC (low={} high={})",
                    sample.temp_mc, sample.low_alert, sample.high_alert
                );
            }
        }
        drop(inner);

        match failure {
            Some(e) => Err(e),
            None => Ok(sample),
        }
    }

    /// Periodic loop; returns once shutdown is observed.
    pub fn run(mut self) {
        info!(
            "[Sampler] started source={} tick={}ms",
            self.source.name(),
            self.period.as_millis()
        );
        let sleeper = SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread);
        let mut next_deadline = Instant::now() + self.period;

        loop {
            let now = Instant::now();
            if now < next_deadline {
                sleeper.sleep(next_deadline - now);
            } else {
                self.late_cycles += 1;
                trace!("[Sampler] late by {:?}", now - next_deadline);
            }

            match self.tick() {
                Ok(_) => {}
                Err(EngineError::ShutdownInProgress) => break,
                Err(e) => warn!("[Sampler] cycle {}: {}", self.cycles, e),
            }

            next_deadline += self.period;
            // Fell more than a full period behind: resync instead of bursting.
            let now = Instant::now();
            if now > next_deadline + self.period {
                next_deadline = now + self.period;
            }
        }

        debug!(
            "[Sampler] stopped. cycles={} late={}",
            self.cycles, self.late_cycles
        );
    }
}

/// Wall-clock nanoseconds since the Unix epoch.
pub fn wall_clock_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
