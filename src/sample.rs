//! sample.rs
//! Immutable temperature sample and its fixed binary record.
//!
//! Record layout (little-endian, 24 bytes):
//! - `[0..8]`   timestamp_ns (u64)
//! - `[8..12]`  temp_mC (i32)
//! - `[12..16]` sampling_ms (i32)
//! - `[16..20]` flags word: bit0 NEW_SAMPLE, bit1 LOW_TEMP_ALERT, bit2 HIGH_TEMP_ALERT
//! - `[20..24]` padding, always zero

use serde::Serialize;

use crate::error::{EngineError, Result};

pub const SAMPLE_RECORD_LEN: usize = 24;

const FLAG_NEW_SAMPLE: u32 = 1 << 0;
const FLAG_LOW_ALERT: u32 = 1 << 1;
const FLAG_HIGH_ALERT: u32 = 1 << 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Sample {
    pub timestamp_ns: u64,
    pub temp_mc: i32,
    pub sampling_ms: i32,
    pub new_sample: bool,
    pub low_alert: bool,
    pub high_alert: bool,
}

impl Sample {
    #[inline]
    pub fn is_alert(&self) -> bool {
        self.low_alert || self.high_alert
    }

    /// Temperature in degrees Celsius (display only).
    pub fn celsius(&self) -> f64 {
        f64::from(self.temp_mc) / 1000.0
    }

    pub fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.new_sample {
            flags |= FLAG_NEW_SAMPLE;
        }
        if self.low_alert {
            flags |= FLAG_LOW_ALERT;
        }
        if self.high_alert {
            flags |= FLAG_HIGH_ALERT;
        }
        flags
    }

    pub fn to_bytes(&self) -> [u8; SAMPLE_RECORD_LEN] {
        let mut out = [0u8; SAMPLE_RECORD_LEN];
        out[0..8].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        out[8..12].copy_from_slice(&self.temp_mc.to_le_bytes());
        out[12..16].copy_from_slice(&self.sampling_ms.to_le_bytes());
        out[16..20].copy_from_slice(&self.flags().to_le_bytes());
        out
    }

    /// Decodes a record; unknown flag bits and padding are ignored.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < SAMPLE_RECORD_LEN {
            return Err(EngineError::Wire {
                expected: SAMPLE_RECORD_LEN,
                actual: buf.len(),
            });
        }
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&buf[0..8]);
        let mut word = [0u8; 4];

        word.copy_from_slice(&buf[8..12]);
        let temp_mc = i32::from_le_bytes(word);
        word.copy_from_slice(&buf[12..16]);
        let sampling_ms = i32::from_le_bytes(word);
        word.copy_from_slice(&buf[16..20]);
        let flags = u32::from_le_bytes(word);

        Ok(Sample {
            timestamp_ns: u64::from_le_bytes(ts),
            temp_mc,
            sampling_ms,
            new_sample: flags & FLAG_NEW_SAMPLE != 0,
            low_alert: flags & FLAG_LOW_ALERT != 0,
            high_alert: flags & FLAG_HIGH_ALERT != 0,
        })
    }

    /// Copies the record into `buf`, returning the number of bytes written.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < SAMPLE_RECORD_LEN {
            return Err(EngineError::Wire {
                expected: SAMPLE_RECORD_LEN,
                actual: buf.len(),
            });
        }
        buf[..SAMPLE_RECORD_LEN].copy_from_slice(&self.to_bytes());
        Ok(SAMPLE_RECORD_LEN)
    }
}
