//! config.rs
//! Runtime configuration record, partial updates and the textual attribute channel.
//!
//! Values written through the attribute channel are parsed here; the engine
//! applies the resulting `ConfigUpdate` atomically under its lock.

use std::{fmt, str::FromStr};

use crate::error::{EngineError, Result};

pub const DEFAULT_SAMPLING_MS: i32 = 1000;
pub const DEFAULT_HIGH_THRESHOLD_MC: i32 = 50_000;
pub const DEFAULT_LOW_THRESHOLD_MC: i32 = 5_000;

/// Capacity of a free-form mode string, in bytes.
pub const MODE_CAPACITY: usize = 15;

/// Waveform mode. Unknown names are kept verbatim (bounded) and sample like `Normal`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Noisy,
    Ramp,
    Other(heapless::String<MODE_CAPACITY>),
}

impl Mode {
    /// Parses a mode name. Returns the mode and how many bytes were dropped
    /// to fit an unknown name into `MODE_CAPACITY`.
    pub fn parse(text: &str) -> (Mode, usize) {
        let name = text.trim();
        match name {
            "normal" => (Mode::Normal, 0),
            "noisy" => (Mode::Noisy, 0),
            "ramp" => (Mode::Ramp, 0),
            other => {
                let mut kept = heapless::String::new();
                let mut dropped = 0;
                for (idx, c) in other.char_indices() {
                    if kept.push(c).is_err() {
                        dropped = other.len() - idx;
                        break;
                    }
                }
                (Mode::Other(kept), dropped)
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Mode::Normal => "normal",
            Mode::Noisy => "noisy",
            Mode::Ramp => "ramp",
            Mode::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live configuration. `low_threshold_mc < high_threshold_mc` is expected but
/// never enforced; an inverted pair makes every sample alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub sampling_ms: i32,
    pub high_threshold_mc: i32,
    pub low_threshold_mc: i32,
    pub mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampling_ms: DEFAULT_SAMPLING_MS,
            high_threshold_mc: DEFAULT_HIGH_THRESHOLD_MC,
            low_threshold_mc: DEFAULT_LOW_THRESHOLD_MC,
            mode: Mode::Normal,
        }
    }
}

impl Config {
    /// Applies every present field, or none if any is invalid.
    pub fn apply(&mut self, update: &ConfigUpdate) -> Result<()> {
        if let Some(ms) = update.sampling_ms {
            validate_sampling_ms(ms)?;
            self.sampling_ms = ms;
        }
        if let Some(t) = update.high_threshold_mc {
            self.high_threshold_mc = t;
        }
        if let Some(t) = update.low_threshold_mc {
            self.low_threshold_mc = t;
        }
        if let Some(m) = &update.mode {
            self.mode = m.clone();
        }
        Ok(())
    }
}

fn validate_sampling_ms(ms: i32) -> Result<()> {
    if ms <= 0 {
        return Err(EngineError::parse(
            Attribute::SamplingMs.name(),
            &ms.to_string(),
            "sampling interval must be positive",
        ));
    }
    Ok(())
}

/// Partial configuration write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub sampling_ms: Option<i32>,
    pub high_threshold_mc: Option<i32>,
    pub low_threshold_mc: Option<i32>,
    pub mode: Option<Mode>,
}

impl ConfigUpdate {
    pub fn sampling_ms(mut self, ms: i32) -> Self {
        self.sampling_ms = Some(ms);
        self
    }

    pub fn high_threshold_mc(mut self, mc: i32) -> Self {
        self.high_threshold_mc = Some(mc);
        self
    }

    pub fn low_threshold_mc(mut self, mc: i32) -> Self {
        self.low_threshold_mc = Some(mc);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// Named attributes of the textual configuration/statistics channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    SamplingMs,
    HighThresholdMc,
    LowThresholdMc,
    Mode,
    Stats,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::SamplingMs,
        Attribute::HighThresholdMc,
        Attribute::LowThresholdMc,
        Attribute::Mode,
        Attribute::Stats,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::SamplingMs => "sampling_ms",
            Attribute::HighThresholdMc => "htemp_mC",
            Attribute::LowThresholdMc => "ltemp_mC",
            Attribute::Mode => "mode",
            Attribute::Stats => "stats",
        }
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self, Attribute::Stats)
    }

    /// Parses a textual write into an update.
    pub fn parse_value(&self, text: &str) -> Result<(ConfigUpdate, Stored)> {
        let update = ConfigUpdate::default();
        match self {
            Attribute::SamplingMs => {
                let ms = parse_int(*self, text)?;
                validate_sampling_ms(ms)?;
                Ok((update.sampling_ms(ms), Stored::Applied))
            }
            Attribute::HighThresholdMc => {
                Ok((update.high_threshold_mc(parse_int(*self, text)?), Stored::Applied))
            }
            Attribute::LowThresholdMc => {
                Ok((update.low_threshold_mc(parse_int(*self, text)?), Stored::Applied))
            }
            Attribute::Mode => {
                let (mode, dropped) = Mode::parse(text);
                let stored = if dropped > 0 {
                    Stored::Truncated { dropped_bytes: dropped }
                } else {
                    Stored::Applied
                };
                Ok((update.mode(mode), stored))
            }
            Attribute::Stats => Err(EngineError::parse(self.name(), text, "attribute is read-only")),
        }
    }
}

impl FromStr for Attribute {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Attribute::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::parse("attribute", s, "unknown attribute"))
    }
}

/// Outcome of an accepted attribute write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stored {
    Applied,
    /// The value did not fit and was cut on a char boundary.
    Truncated { dropped_bytes: usize },
}

fn parse_int(attr: Attribute, text: &str) -> Result<i32> {
    text.trim()
        .parse::<i32>()
        .map_err(|e| EngineError::parse(attr.name(), text, e.to_string()))
}
