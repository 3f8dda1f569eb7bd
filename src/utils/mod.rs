// Ambient support: startup settings and the CSV sample log.
pub mod recorder;
pub mod settings;
