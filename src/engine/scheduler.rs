//! scheduler.rs
//! Timeout coordinator on the configurable interval.
//!
//! Waits `sampling_ms` or until the control flag leaves `Idle`:
//! - natural expiry while `Idle`: raise data-ready, disarm the alert edge if
//!   the latest sample is alert-free, wake consumers
//! - `ReconfigureRequested`: back to `Idle` silently, re-read the interval
//! - `ShutdownRequested`: exit
//!
//! Alert re-arm is driven from here, so consumer-visible alert cadence follows
//! the notification interval rather than the sampler tick.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use log::{debug, info, trace};

use crate::engine::{
    EngineHandle,
    shared::{ControlState, Inner, Shared},
};

pub struct Scheduler {
    shared: Arc<Shared>,
    expiries: u64,
    reconfigurations: u64,
}

impl Scheduler {
    pub fn new(handle: &EngineHandle) -> Self {
        Self {
            shared: handle.shared.clone(),
            expiries: 0,
            reconfigurations: 0,
        }
    }

    /// Performs the natural-expiry step once, as if the interval had elapsed.
    /// Returns the control state observed; nothing is raised unless `Idle`.
    pub fn expire(&mut self) -> ControlState {
        let shared = self.shared.clone();
        let mut inner = shared.lock();
        let state = inner.control;
        if state == ControlState::Idle {
            self.on_expiry(&mut inner);
        }
        state
    }

    fn on_expiry(&mut self, inner: &mut Inner) {
        inner.pending.raise_data_ready();
        if !inner.in_alert() {
            inner.alert_armed = false;
        }
        self.expiries += 1;
        self.shared.ready.notify_all();
        trace!("[Scheduler] data ready #{}", self.expiries);
    }

    pub fn run(mut self) {
        info!("[Scheduler] started");
        let shared = self.shared.clone();
        let mut inner = shared.lock();

        loop {
            let interval = Duration::from_millis(inner.config.sampling_ms.max(1) as u64);
            let deadline = Instant::now() + interval;

            while inner.control == ControlState::Idle {
                if shared.control.wait_until(&mut inner, deadline).timed_out() {
                    break;
                }
            }

            match inner.control {
                ControlState::Idle => self.on_expiry(&mut inner),
                ControlState::ReconfigureRequested => {
                    inner.control = ControlState::Idle;
                    self.reconfigurations += 1;
                    debug!(
                        "[Scheduler] reconfigured: interval={}ms",
                        inner.config.sampling_ms
                    );
                }
                ControlState::ShutdownRequested => break,
            }
        }

        debug!(
            "[Scheduler] stopped. expiries={} reconfigurations={}",
            self.expiries, self.reconfigurations
        );
    }
}
