//! # vouch-observability
//!
//! Structured Logging fuer Vouch via tracing-subscriber (Text oder JSON).
//! Ausgabe geht nach stderr, damit Befehlsantworten auf stdout sauber bleiben.

pub mod logging;

pub use logging::{log_format_gueltig, log_level_gueltig, logging_initialisieren, LogFormat};
