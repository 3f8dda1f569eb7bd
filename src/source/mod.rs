//! Temperature sources: where each sampler cycle gets its raw reading.
//! - `SimulatedSource`: deterministic 100-step waveform (seedable)
//! - `I2cSource`: one byte per cycle from an I2C sensor, scaled to mC

pub mod hardware;
pub mod simulated;

pub use hardware::I2cSource;
pub use simulated::SimulatedSource;

use std::time::Duration;

use crate::{config::Mode, error::Result};

/// Raw-reading provider polled once per sampler cycle.
///
/// Called outside the engine lock, so a slow bus transaction never blocks
/// the scheduler or consumers.
pub trait TemperatureSource: Send {
    /// Next reading in millidegrees Celsius.
    fn next_raw_reading(&mut self, mode: &Mode) -> Result<i32>;

    fn name(&self) -> &'static str;

    /// Sampler period suited to this source.
    fn default_tick(&self) -> Duration {
        Duration::from_millis(10)
    }

    /// Whether a failed read should republish the previous value.
    fn holds_last_value(&self) -> bool {
        false
    }
}

impl<T: TemperatureSource + ?Sized> TemperatureSource for Box<T> {
    fn next_raw_reading(&mut self, mode: &Mode) -> Result<i32> {
        (**self).next_raw_reading(mode)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn default_tick(&self) -> Duration {
        (**self).default_tick()
    }

    fn holds_last_value(&self) -> bool {
        (**self).holds_last_value()
    }
}
