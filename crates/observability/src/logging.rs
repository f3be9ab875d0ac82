//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `VOUCH_LOG_LEVEL`: Filter (trace/debug/info/warn/error oder EnvFilter-Direktiven)
//! - `VOUCH_LOG_FORMAT`: Format (text/json)
//!
//! Umgebungsvariablen haben Vorrang vor der Konfigurationsdatei.

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "VOUCH_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "VOUCH_LOG_FORMAT";

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Unbekannte Werte fallen auf `Text` zurueck
    pub fn aus_str(format: &str) -> Self {
        match format {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Initialisiert das Logging-System.
///
/// `level` und `format` stammen aus der Konfiguration und werden von
/// `VOUCH_LOG_LEVEL` / `VOUCH_LOG_FORMAT` ueberschrieben. Ein ungueltiger
/// Filter faellt auf `info` zurueck. Mehrfacher Aufruf ist wirkungslos.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = filter_waehlen(std::env::var(ENV_LOG_LEVEL).ok(), level);
    let format = format_waehlen(std::env::var(ENV_LOG_FORMAT).ok(), format);

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    if ergebnis.is_err() {
        tracing::debug!("Logging war bereits initialisiert");
    }
}

fn filter_waehlen(aus_env: Option<String>, konfig: &str) -> EnvFilter {
    aus_env
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_new(konfig).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn format_waehlen(aus_env: Option<String>, konfig: &str) -> LogFormat {
    LogFormat::aus_str(aus_env.as_deref().unwrap_or(konfig))
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_gueltige_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level));
        }
    }

    #[test]
    fn log_level_ungueltige_werte() {
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("INFO")); // Gross-/Kleinschreibung
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn log_format_werte() {
        assert!(log_format_gueltig("text"));
        assert!(log_format_gueltig("json"));
        assert!(!log_format_gueltig("JSON"));
        assert!(!log_format_gueltig("xml"));
    }

    #[test]
    fn format_aus_umgebung_hat_vorrang() {
        assert_eq!(format_waehlen(Some("json".into()), "text"), LogFormat::Json);
        assert_eq!(format_waehlen(None, "json"), LogFormat::Json);
        assert_eq!(format_waehlen(None, "xml"), LogFormat::Text);
    }

    #[test]
    fn filter_aus_umgebung_hat_vorrang() {
        let filter = filter_waehlen(Some("vouch_commands=trace".into()), "warn");
        assert_eq!(filter.to_string(), "vouch_commands=trace");

        let filter = filter_waehlen(None, "debug");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn ungueltiger_filter_faellt_zurueck() {
        let filter = filter_waehlen(Some("vouch=laut".into()), "vouch=leise");
        assert_eq!(filter.to_string(), "info");
    }
}
