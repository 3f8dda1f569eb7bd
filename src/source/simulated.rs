//! simulated.rs
//! Synthetic sawtooth-like temperature waveform.
//!
//! One call = one phase step, 100 steps per cycle:
//! - step 0:      new random base in [0, 49] °C (×1000 mC)
//! - steps 1..49: +100 mC per step
//! - step 50:     drop by a random multiple of 100 mC (0..900)
//! - steps 51..99: −150 mC per step

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{config::Mode, error::Result, source::TemperatureSource};

pub const CYCLE_LEN: u32 = 100;
const RAMP_UP_MC: i32 = 100;
const RAMP_DOWN_MC: i32 = 150;
const DROP_STEP_MC: i32 = 100;
const NOISE_MC: i32 = 500;

pub struct SimulatedSource<R = StdRng> {
    rng: R,
    phase: u32,
    value_mc: i32,
}

impl SimulatedSource<StdRng> {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Reproducible waveform.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for SimulatedSource<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SimulatedSource<R> {
    pub fn from_rng(rng: R) -> Self {
        Self {
            rng,
            phase: 0,
            value_mc: 0,
        }
    }

    /// Phase the next step will execute.
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Advances one step and returns the clean (noise-free) waveform value.
    fn step(&mut self, deterministic: bool) -> i32 {
        match self.phase {
            0 => {
                let base = if deterministic { 0 } else { self.rng.random_range(0..50) };
                self.value_mc = base * 1000;
            }
            1..50 => self.value_mc += RAMP_UP_MC,
            50 => {
                let k = if deterministic { 0 } else { self.rng.random_range(0..10) };
                self.value_mc -= k * DROP_STEP_MC;
            }
            _ => self.value_mc -= RAMP_DOWN_MC,
        }
        self.phase = (self.phase + 1) % CYCLE_LEN;
        self.value_mc
    }
}

impl<R: Rng + Send> TemperatureSource for SimulatedSource<R> {
    fn next_raw_reading(&mut self, mode: &Mode) -> Result<i32> {
        let clean = self.step(matches!(mode, Mode::Ramp));
        let out = match mode {
            Mode::Noisy => clean + self.rng.random_range(-NOISE_MC..=NOISE_MC),
            _ => clean,
        };
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
