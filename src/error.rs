//! error.rs
//! Error kinds surfaced by the sampling engine and its configuration channel.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed configuration value. The previous value is kept.
    #[error("invalid value {value:?} for {attribute}: {reason}")]
    ConfigParse {
        attribute: &'static str,
        value: String,
        reason: String,
    },

    /// Bus/read failure in the hardware source for one sampler cycle.
    #[error("hardware read failed: {0}")]
    HardwareRead(String),

    /// Engine is stopping or stopped.
    #[error("engine shutdown in progress")]
    ShutdownInProgress,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("sample recorder: {0}")]
    Recorder(String),

    /// Byte buffer too small to hold or decode a sample record.
    #[error("sample record needs {expected} bytes, got {actual}")]
    Wire { expected: usize, actual: usize },
}

impl EngineError {
    pub(crate) fn parse(attribute: &'static str, value: &str, reason: impl Into<String>) -> Self {
        EngineError::ConfigParse {
            attribute,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
