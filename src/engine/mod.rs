// Sampling engine: two periodic tasks over one locked state region.
// Sampler ticks fast and raises alert edges, Scheduler ticks on the configured
// interval and raises data-ready; consumers block on either through the bridge.

pub mod bridge;
pub mod sampler;
pub mod scheduler;
mod shared;

pub use bridge::Readiness;
pub use sampler::Sampler;
pub use scheduler::Scheduler;
pub use shared::ControlState;

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{error, info, warn};
use parking_lot::Mutex;

use crate::{
    config::{Attribute, Config, ConfigUpdate, Mode, Stored},
    error::{EngineError, Result},
    sample::Sample,
    source::{SimulatedSource, TemperatureSource},
    stats::Statistics,
};
use shared::Shared;

/// Cloneable access to a running (or stand-alone) engine state.
///
/// Every configuration write raises a reconfiguration, including writes
/// that change nothing and writes that are rejected.
#[derive(Clone)]
pub struct EngineHandle {
    pub(crate) shared: Arc<Shared>,
}

impl EngineHandle {
    /// State with no tasks attached; drive it with `Sampler::tick` and
    /// `Scheduler::expire`, or spawn tasks via `EngineBuilder`.
    pub fn new(config: Config) -> Self {
        Self {
            shared: Arc::new(Shared::new(config)),
        }
    }

    pub fn config(&self) -> Config {
        self.shared.lock().config.clone()
    }

    pub fn set_config(&self, update: &ConfigUpdate) -> Result<()> {
        let mut inner = self.shared.lock();
        if inner.is_shutdown() {
            return Err(EngineError::ShutdownInProgress);
        }
        let applied = inner.config.apply(update);
        self.shared.request_reconfigure(&mut inner);
        applied
    }

    pub fn set_sampling_ms(&self, ms: i32) -> Result<()> {
        self.set_config(&ConfigUpdate::default().sampling_ms(ms))
    }

    pub fn set_high_threshold_mc(&self, mc: i32) -> Result<()> {
        self.set_config(&ConfigUpdate::default().high_threshold_mc(mc))
    }

    pub fn set_low_threshold_mc(&self, mc: i32) -> Result<()> {
        self.set_config(&ConfigUpdate::default().low_threshold_mc(mc))
    }

    pub fn set_mode(&self, mode: Mode) -> Result<()> {
        self.set_config(&ConfigUpdate::default().mode(mode))
    }

    /// Textual read of an attribute, newline terminated.
    pub fn show(&self, attr: Attribute) -> String {
        let inner = self.shared.lock();
        match attr {
            Attribute::SamplingMs => format!("{}\n", inner.config.sampling_ms),
            Attribute::HighThresholdMc => format!("{}\n", inner.config.high_threshold_mc),
            Attribute::LowThresholdMc => format!("{}\n", inner.config.low_threshold_mc),
            Attribute::Mode => format!("{}\n", inner.config.mode),
            Attribute::Stats => inner.stats.report(),
        }
    }

    /// Textual write of an attribute. A malformed value keeps the previous one.
    pub fn store(&self, attr: Attribute, text: &str) -> Result<Stored> {
        let mut inner = self.shared.lock();
        if inner.is_shutdown() {
            return Err(EngineError::ShutdownInProgress);
        }
        let parsed = attr.parse_value(text);
        let result = match parsed {
            Ok((update, stored)) => inner.config.apply(&update).map(|_| stored),
            Err(e) => Err(e),
        };
        if attr.is_writable() {
            self.shared.request_reconfigure(&mut inner);
        }
        drop(inner);
        match &result {
            Ok(Stored::Truncated { dropped_bytes }) => {
                warn!("[Engine] {} truncated, {} bytes dropped", attr.name(), dropped_bytes)
            }
            Err(e) => warn!("[Engine] store {}: {}", attr.name(), e),
            Ok(Stored::Applied) => {}
        }
        result
    }

    pub fn stats(&self) -> Statistics {
        self.shared.lock().stats
    }

    pub fn stats_report(&self) -> String {
        self.stats().report()
    }

    /// Latest acquisition evaluated against the live configuration.
    /// Does not advance the source or touch statistics.
    pub fn last_sample(&self) -> Result<Sample> {
        let inner = self.shared.lock();
        if inner.is_shutdown() {
            return Err(EngineError::ShutdownInProgress);
        }
        Ok(inner.last_sample().unwrap_or(Sample {
            sampling_ms: inner.config.sampling_ms,
            ..Sample::default()
        }))
    }

    /// Writes the 24-byte sample record into `buf`.
    pub fn read_into(&self, buf: &mut [u8]) -> Result<usize> {
        self.last_sample()?.write_to(buf)
    }

    /// Blocks until data-ready and/or alert is raised.
    pub fn wait_ready(&self) -> Result<Readiness> {
        self.shared
            .wait_ready(None)?
            .ok_or(EngineError::ShutdownInProgress)
    }

    /// As `wait_ready`, giving up after `timeout` with `Ok(None)`.
    pub fn wait_ready_timeout(&self, timeout: Duration) -> Result<Option<Readiness>> {
        self.shared.wait_ready(Some(timeout))
    }

    /// Non-blocking readiness check; consumes whatever is raised.
    pub fn poll_ready(&self) -> Result<Readiness> {
        self.shared.poll_ready()
    }

    pub fn control_state(&self) -> ControlState {
        self.shared.lock().control
    }

    pub fn is_shutdown(&self) -> bool {
        self.control_state() == ControlState::ShutdownRequested
    }

    /// Signals shutdown without joining. Returns false if already requested.
    pub fn request_shutdown(&self) -> bool {
        self.shared.request_shutdown()
    }
}

pub struct EngineBuilder {
    config: Config,
    source: Option<Box<dyn TemperatureSource>>,
    sampler_tick: Option<Duration>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            source: None,
            sampler_tick: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Defaults to an unseeded `SimulatedSource`.
    pub fn source(mut self, source: impl TemperatureSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn boxed_source(mut self, source: Box<dyn TemperatureSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Overrides the source's default sampler period (clamped to
    /// `sampler::MIN_TICK..=sampler::MAX_TICK`).
    pub fn sampler_tick(mut self, tick: Duration) -> Self {
        self.sampler_tick = Some(tick);
        self
    }

    /// Primes one sample synchronously, then spawns the sampler and scheduler.
    pub fn start(self) -> Result<Engine> {
        let handle = EngineHandle::new(self.config);
        let source = self
            .source
            .unwrap_or_else(|| Box::new(SimulatedSource::new()));

        let mut sampler = Sampler::new(&handle, source);
        if let Some(tick) = self.sampler_tick {
            sampler = sampler.with_tick(tick);
        }
        if let Err(e) = sampler.tick() {
            warn!("[Engine] priming sample failed: {}", e);
        }
        let scheduler = Scheduler::new(&handle);

        let engine = Engine {
            handle,
            workers: Mutex::new(Vec::with_capacity(2)),
        };

        let sampler_thread = thread::Builder::new()
            .name("simtemp-sampler".into())
            .spawn(move || sampler.run())?;
        engine.workers.lock().push(sampler_thread);

        match thread::Builder::new()
            .name("simtemp-scheduler".into())
            .spawn(move || scheduler.run())
        {
            Ok(h) => engine.workers.lock().push(h),
            Err(e) => {
                engine.stop();
                return Err(EngineError::Spawn(e));
            }
        }

        info!("[Engine] started");
        Ok(engine)
    }
}

/// Owns the two worker threads; stopping (or dropping) joins them.
pub struct Engine {
    handle: EngineHandle,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Starts with `config` and the default simulated source.
    pub fn start(config: Config) -> Result<Engine> {
        EngineBuilder::new().config(config).start()
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Signals shutdown and joins both tasks. Safe to call repeatedly.
    pub fn stop(&self) {
        self.handle.request_shutdown();
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        if workers.is_empty() {
            return;
        }
        for w in workers {
            let name = w.thread().name().unwrap_or("worker").to_string();
            if w.join().is_err() {
                error!("[Engine] {} panicked", name);
            }
        }
        info!("[Engine] stopped");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}
