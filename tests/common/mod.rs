#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use simtemp::{EngineError, Mode, Result, TemperatureSource};

/// Plays back readings in order (`None` = failed read), then repeats the last one.
pub struct ScriptedSource {
    script: VecDeque<Option<i32>>,
    tail: Option<i32>,
    holds: bool,
}

impl ScriptedSource {
    pub fn new(readings: impl IntoIterator<Item = i32>) -> Self {
        Self::with_failures(readings.into_iter().map(Some))
    }

    pub fn with_failures(readings: impl IntoIterator<Item = Option<i32>>) -> Self {
        Self {
            script: readings.into_iter().collect(),
            tail: None,
            holds: false,
        }
    }

    /// Behave like a hardware source: failed reads republish the last value.
    pub fn holding(mut self) -> Self {
        self.holds = true;
        self
    }
}

impl TemperatureSource for ScriptedSource {
    fn next_raw_reading(&mut self, _mode: &Mode) -> Result<i32> {
        if let Some(next) = self.script.pop_front() {
            self.tail = next;
        }
        self.tail
            .ok_or_else(|| EngineError::HardwareRead("scripted failure".into()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn holds_last_value(&self) -> bool {
        self.holds
    }
}

/// Always the same reading; counts how often it was asked.
pub struct ConstantSource {
    pub value_mc: i32,
    pub reads: Arc<AtomicU64>,
}

impl ConstantSource {
    pub fn new(value_mc: i32) -> Self {
        Self {
            value_mc,
            reads: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl TemperatureSource for ConstantSource {
    fn next_raw_reading(&mut self, _mode: &Mode) -> Result<i32> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.value_mc)
    }

    fn name(&self) -> &'static str {
        "constant"
    }

    fn default_tick(&self) -> Duration {
        Duration::from_millis(5)
    }
}
