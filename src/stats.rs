//! stats.rs
//! Single-slot alert statistics: when the last out-of-range sample was seen and which side.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertKind {
    #[default]
    None,
    Low,
    High,
}

impl AlertKind {
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::None => "None",
            AlertKind::Low => "Low temperature",
            AlertKind::High => "High temperature",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    /// Wall-clock nanoseconds of the most recent alerting sample; 0 if none.
    pub last_error_ns: u64,
    pub alert_kind: AlertKind,
}

impl Statistics {
    /// Records an alerting sample. High wins when both sides trip.
    pub(crate) fn record(&mut self, timestamp_ns: u64, low: bool, high: bool) {
        if low {
            self.last_error_ns = timestamp_ns;
            self.alert_kind = AlertKind::Low;
        }
        if high {
            self.last_error_ns = timestamp_ns;
            self.alert_kind = AlertKind::High;
        }
    }

    /// `YYYY-MM-DD HH:MM:SS` in UTC.
    pub fn last_error_time(&self) -> String {
        format_utc(self.last_error_ns)
    }

    pub fn report(&self) -> String {
        format!(
            "Last error: {} GMT - Type of error: {}\n",
            self.last_error_time(),
            self.alert_kind.label()
        )
    }
}

pub fn format_utc(timestamp_ns: u64) -> String {
    let secs = (timestamp_ns / 1_000_000_000) as i64;
    let nanos = (timestamp_ns % 1_000_000_000) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
