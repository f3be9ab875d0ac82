//! Vouch Shell – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet die
//! Eingabeschleife.

use anyhow::Result;
use vouch_observability::logging_initialisieren;
use vouch_shell::terminal::{self, TerminalPrompt, TerminalReply};
use vouch_shell::{config::VouchConfig, Shell, Steuerung};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("VOUCH_CONFIG").unwrap_or_else(|_| "vouch.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = VouchConfig::laden(&config_pfad)?;

    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Vouch Shell wird initialisiert"
    );

    let mut shell = Shell::starten(config).await?;
    let reply = TerminalReply;
    let prompt = TerminalPrompt;

    println!("Type /help for a list of commands, /quit to exit.");
    loop {
        terminal::aufforderung("> ");
        let Some(zeile) = terminal::zeile_lesen().await? else {
            break;
        };
        if shell.zeile_verarbeiten(&zeile, &reply, &prompt).await == Steuerung::Beenden {
            break;
        }
    }

    tracing::info!("Vouch Shell beendet");
    Ok(())
}
