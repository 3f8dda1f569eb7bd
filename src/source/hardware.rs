//! hardware.rs
//! Real sensor behind an I2C bus: one receive-byte transaction per cycle,
//! the byte being whole degrees Celsius.

use std::time::Duration;

use embedded_hal::i2c::{Error as _, I2c};

use crate::{
    config::Mode,
    error::{EngineError, Result},
    source::TemperatureSource,
};

/// mC per raw count.
pub const SCALE_MC: i32 = 1000;

pub struct I2cSource<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cSource<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c + Send> TemperatureSource for I2cSource<I2C> {
    fn next_raw_reading(&mut self, _mode: &Mode) -> Result<i32> {
        let mut buf = [0u8; 1];
        self.i2c.read(self.address, &mut buf).map_err(|e| {
            EngineError::HardwareRead(format!("addr 0x{:02x}: {:?}", self.address, e.kind()))
        })?;
        Ok(i32::from(buf[0]) * SCALE_MC)
    }

    fn name(&self) -> &'static str {
        "i2c"
    }

    fn default_tick(&self) -> Duration {
        Duration::from_millis(150)
    }

    fn holds_last_value(&self) -> bool {
        true
    }
}
