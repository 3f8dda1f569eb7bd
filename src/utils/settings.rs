//! settings.rs
//! Startup settings from a TOML file: initial configuration and source selection.
//!
//! ```toml
//! [sensor]
//! sampling_ms = 1000
//! high_threshold_mc = 50000
//! low_threshold_mc = 5000
//! mode = "normal"
//!
//! [sampler]
//! tick_ms = 10
//! source = "simulated"   # or "i2c"
//! seed = 42
//! i2c_bus = "/dev/i2c-1"
//! i2c_address = 0x48
//! ```

use std::{fs, path::Path, time::Duration};

use log::warn;
use serde::Deserialize;

use crate::{
    config::{
        Config, ConfigUpdate, DEFAULT_HIGH_THRESHOLD_MC, DEFAULT_LOW_THRESHOLD_MC,
        DEFAULT_SAMPLING_MS, Mode,
    },
    engine::sampler::{MAX_TICK, MIN_TICK},
    error::{EngineError, Result},
    source::SimulatedSource,
};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    pub sensor: SensorSettings,
    pub sampler: SamplerSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct SensorSettings {
    pub sampling_ms: i32,
    pub high_threshold_mc: i32,
    pub low_threshold_mc: i32,
    pub mode: String,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            sampling_ms: DEFAULT_SAMPLING_MS,
            high_threshold_mc: DEFAULT_HIGH_THRESHOLD_MC,
            low_threshold_mc: DEFAULT_LOW_THRESHOLD_MC,
            mode: "normal".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Simulated,
    I2c,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct SamplerSettings {
    /// Unset: the source's own default (10 ms simulated, 150 ms i2c).
    /// Accepted range 1..=1000.
    pub tick_ms: Option<u64>,
    pub source: SourceKind,
    pub seed: Option<u64>,
    pub i2c_bus: String,
    pub i2c_address: u8,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            tick_ms: None,
            source: SourceKind::Simulated,
            seed: None,
            i2c_bus: "/dev/i2c-1".to_string(),
            i2c_address: 0x48,
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| EngineError::Settings(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| EngineError::Settings(e.to_string()))
    }

    /// Initial configuration, validated the same way as a runtime write.
    pub fn config(&self) -> Result<Config> {
        let (mode, dropped) = Mode::parse(&self.sensor.mode);
        if dropped > 0 {
            warn!("[Settings] mode truncated, {} bytes dropped", dropped);
        }
        let mut config = Config::default();
        config.apply(
            &ConfigUpdate::default()
                .sampling_ms(self.sensor.sampling_ms)
                .high_threshold_mc(self.sensor.high_threshold_mc)
                .low_threshold_mc(self.sensor.low_threshold_mc)
                .mode(mode),
        )?;
        Ok(config)
    }

    /// Sampler period override; must lie within `MIN_TICK..=MAX_TICK`.
    pub fn sampler_tick(&self) -> Result<Option<Duration>> {
        let Some(ms) = self.sampler.tick_ms else {
            return Ok(None);
        };
        let tick = Duration::from_millis(ms);
        if !(MIN_TICK..=MAX_TICK).contains(&tick) {
            return Err(EngineError::Settings(format!(
                "sampler.tick_ms = {} outside {}..={}",
                ms,
                MIN_TICK.as_millis(),
                MAX_TICK.as_millis()
            )));
        }
        Ok(Some(tick))
    }

    pub fn simulated_source(&self) -> SimulatedSource {
        match self.sampler.seed {
            Some(seed) => SimulatedSource::with_seed(seed),
            None => SimulatedSource::new(),
        }
    }
}
