//! bridge.rs
//! Readiness notification: two sticky wake sources behind one wait.
//!
//! - data-ready: raised by the scheduler on a natural interval expiry
//! - alert:      raised by the sampler on an alert edge
//!
//! Both are plain booleans guarded by the engine lock and consumed by the
//! first wait that observes them. A source raised while nobody waits is kept
//! for the next wait. Concurrent waiters all wake, but only one of them
//! consumes a given raise.

use std::time::{Duration, Instant};

use crate::{
    engine::shared::Shared,
    error::{EngineError, Result},
};

/// Why a readiness wait returned. Both may be set in one wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
    pub data_ready: bool,
    pub alert: bool,
}

impl Readiness {
    pub fn is_empty(&self) -> bool {
        !self.data_ready && !self.alert
    }
}

#[derive(Debug, Default)]
pub(crate) struct Pending {
    data_ready: bool,
    alert: bool,
}

impl Pending {
    pub fn raise_data_ready(&mut self) {
        self.data_ready = true;
    }

    pub fn raise_alert(&mut self) {
        self.alert = true;
    }

    /// Reads and clears both sources.
    pub fn take(&mut self) -> Readiness {
        let r = Readiness {
            data_ready: self.data_ready,
            alert: self.alert,
        };
        self.data_ready = false;
        self.alert = false;
        r
    }
}

impl Shared {
    /// Blocks until a source is raised, `timeout` elapses (`Ok(None)`), or
    /// shutdown begins. A timeout past the clock's range waits untimed.
    pub(crate) fn wait_ready(&self, timeout: Option<Duration>) -> Result<Option<Readiness>> {
        let deadline = timeout.and_then(|d| Instant::now().checked_add(d));
        let mut inner = self.lock();
        loop {
            if inner.is_shutdown() {
                return Err(EngineError::ShutdownInProgress);
            }
            let r = inner.pending.take();
            if !r.is_empty() {
                return Ok(Some(r));
            }
            match deadline {
                None => self.ready.wait(&mut inner),
                Some(d) => {
                    if self.ready.wait_until(&mut inner, d).timed_out() {
                        if inner.is_shutdown() {
                            return Err(EngineError::ShutdownInProgress);
                        }
                        let r = inner.pending.take();
                        return Ok((!r.is_empty()).then_some(r));
                    }
                }
            }
        }
    }

    pub(crate) fn poll_ready(&self) -> Result<Readiness> {
        let mut inner = self.lock();
        if inner.is_shutdown() {
            return Err(EngineError::ShutdownInProgress);
        }
        Ok(inner.pending.take())
    }
}
