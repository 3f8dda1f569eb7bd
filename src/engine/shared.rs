//! shared.rs
//! The one mutable region shared by the sampler, the scheduler and every consumer.
//!
//! A single mutex guards configuration, statistics, the latest acquisition,
//! the control flag and the readiness sources. Two condvars hang off it:
//! - `control`: scheduler's timed wait, woken by reconfiguration/shutdown
//! - `ready`:   consumers blocked in a readiness wait

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::{
    config::Config,
    engine::bridge::Pending,
    sample::Sample,
    stats::Statistics,
};

/// Scheduler control flag. `ShutdownRequested` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Idle,
    ReconfigureRequested,
    ShutdownRequested,
}

/// Latest raw acquisition; thresholds are applied when a sample is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Acquisition {
    pub temp_mc: i32,
    pub timestamp_ns: u64,
    pub fresh: bool,
}

pub(crate) struct Inner {
    pub config: Config,
    pub stats: Statistics,
    pub control: ControlState,
    pub last: Option<Acquisition>,
    pub pending: Pending,
    /// Set on an alert edge; cleared by the scheduler on an alert-free expiry.
    pub alert_armed: bool,
}

impl Inner {
    pub fn is_shutdown(&self) -> bool {
        self.control == ControlState::ShutdownRequested
    }

    /// Builds the sample for `acq` against the live configuration.
    pub fn sample_from(&self, acq: &Acquisition) -> Sample {
        Sample {
            timestamp_ns: acq.timestamp_ns,
            temp_mc: acq.temp_mc,
            sampling_ms: self.config.sampling_ms,
            new_sample: acq.fresh,
            low_alert: acq.temp_mc <= self.config.low_threshold_mc,
            high_alert: acq.temp_mc >= self.config.high_threshold_mc,
        }
    }

    pub fn last_sample(&self) -> Option<Sample> {
        self.last.as_ref().map(|acq| self.sample_from(acq))
    }

    pub fn in_alert(&self) -> bool {
        self.last_sample().is_some_and(|s| s.is_alert())
    }
}

pub(crate) struct Shared {
    inner: Mutex<Inner>,
    pub control: Condvar,
    pub ready: Condvar,
}

impl Shared {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Mutex::new(Inner {
                config,
                stats: Statistics::default(),
                control: ControlState::Idle,
                last: None,
                pending: Pending::default(),
                alert_armed: false,
            }),
            control: Condvar::new(),
            ready: Condvar::new(),
        }
    }

    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock()
    }

    /// Marks a configuration change and cuts the scheduler's current wait short.
    /// No-op once shutdown has begun.
    pub fn request_reconfigure(&self, inner: &mut Inner) {
        if inner.is_shutdown() {
            return;
        }
        inner.control = ControlState::ReconfigureRequested;
        self.control.notify_all();
    }

    /// Terminal. Wakes the scheduler and every blocked consumer.
    pub fn request_shutdown(&self) -> bool {
        let mut inner = self.lock();
        let first = !inner.is_shutdown();
        inner.control = ControlState::ShutdownRequested;
        drop(inner);
        self.control.notify_all();
        self.ready.notify_all();
        first
    }
}
