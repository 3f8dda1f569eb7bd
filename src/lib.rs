//! # simtemp
//!
//! Simulated (or I2C-backed) temperature sensor engine.
//!
//! Two periodic tasks share one locked state region:
//! - **Sampler**: fixed short tick, acquires a reading, timestamps it,
//!   compares against thresholds, refreshes statistics, raises alert edges.
//! - **Scheduler**: configurable interval, raises data-ready on expiry and
//!   reacts immediately to reconfiguration or shutdown.
//!
//! Consumers block on one readiness wait fed by both sources, then read a
//! fixed-layout `Sample`.
//!
//! ```no_run
//! use simtemp::{Engine, Config};
//!
//! let engine = Engine::start(Config::default())?;
//! let handle = engine.handle();
//! let ready = handle.wait_ready()?;
//! let sample = handle.last_sample()?;
//! println!("{:?} {} mC", ready, sample.temp_mc);
//! engine.stop();
//! # Ok::<(), simtemp::EngineError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod sample;
pub mod source;
pub mod stats;
pub mod utils;

pub use config::{Attribute, Config, ConfigUpdate, Mode, Stored};
pub use engine::{ControlState, Engine, EngineBuilder, EngineHandle, Readiness, Sampler, Scheduler};
pub use error::{EngineError, Result};
pub use sample::{SAMPLE_RECORD_LEN, Sample};
pub use source::{I2cSource, SimulatedSource, TemperatureSource};
pub use stats::{AlertKind, Statistics};
