//! Terminal-Kollaborateure: Antworten auf stdout, Passwoerter ohne Echo
//!
//! Blockierende Eingaben laufen ueber `spawn_blocking`, damit der
//! Tokio-Runtime-Thread frei bleibt. Zeilen werden nur auf Anforderung
//! gelesen; zwischen zwei Eingaben konsumiert niemand stdin.

use std::io::{self, Write};
use std::time::Duration;

use async_trait::async_trait;

use vouch_core::{
    Device, DialogDecision, PasswordRequest, Reply, Secret, ShortCode, UserPrompt,
    VerificationDialog, VerificationOutcome,
};

/// Liest eine Zeile von stdin; `None` bei EOF
pub async fn zeile_lesen() -> io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        let mut zeile = String::new();
        match io::stdin().read_line(&mut zeile)? {
            0 => Ok(None),
            _ => Ok(Some(zeile)),
        }
    })
    .await
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

/// Gibt die Eingabeaufforderung ohne Zeilenumbruch aus
pub fn aufforderung(text: &str) {
    print!("{text}");
    let _ = io::stdout().flush();
}

/// Antworten werden zeilenweise auf stdout ausgegeben
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalReply;

impl Reply for TerminalReply {
    fn reply(&self, text: &str) {
        println!("{text}");
    }
}

/// Passwort-Dialoge und Verifikations-Modal im Terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

async fn passwort_lesen(text: String) -> Option<String> {
    let ergebnis = tokio::task::spawn_blocking(move || rpassword::prompt_password(text)).await;
    match ergebnis {
        Ok(Ok(eingabe)) => Some(eingabe),
        Ok(Err(e)) => {
            tracing::debug!(fehler = %e, "Passwort-Eingabe abgebrochen");
            None
        }
        Err(e) => {
            tracing::warn!(fehler = %e, "Passwort-Eingabe fehlgeschlagen");
            None
        }
    }
}

fn eingabetext(request: &PasswordRequest<'_>) -> String {
    if request.placeholder.is_empty() {
        format!("{} - {}: ", request.title, request.label)
    } else {
        format!(
            "{} - {} (e.g. {}): ",
            request.title, request.label, request.placeholder
        )
    }
}

#[async_trait]
impl UserPrompt for TerminalPrompt {
    async fn ask_password(&self, request: PasswordRequest<'_>) -> Option<Secret> {
        let erste = passwort_lesen(eingabetext(&request)).await?;
        if request.confirm {
            let zweite = passwort_lesen(format!("Confirm {}: ", request.label)).await?;
            if erste != zweite {
                println!("Entries did not match");
                return None;
            }
        }
        Some(Secret::new(erste))
    }

    async fn open_uia_fallback(&self, stage: &str, session: &str) -> anyhow::Result<()> {
        println!(
            "Complete the {stage} authentication stage for session {session} in your browser, then press Enter"
        );
        zeile_lesen().await?;
        Ok(())
    }

    fn open_verification_dialog(
        &self,
        device: &Device,
        timeout: Duration,
    ) -> Box<dyn VerificationDialog> {
        println!(
            "Verifying {}/{} ({}), timeout {}s",
            device.user_id,
            device.device_id,
            device.name,
            timeout.as_secs()
        );
        Box::new(TerminalDialog)
    }
}

struct TerminalDialog;

/// Antwort auf die Kurzcode-Frage
fn entscheidung(eingabe: &str) -> DialogDecision {
    match eingabe.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => DialogDecision::Match,
        "n" | "no" => DialogDecision::Mismatch,
        _ => DialogDecision::Cancel,
    }
}

#[async_trait]
impl VerificationDialog for TerminalDialog {
    fn status(&mut self, text: &str) {
        println!("{text}");
    }

    async fn compare(&mut self, code: &ShortCode) -> DialogDecision {
        println!("{code}");
        aufforderung("Do the codes match? [y]es / [n]o / anything else cancels: ");
        match zeile_lesen().await {
            Ok(Some(zeile)) => entscheidung(&zeile),
            Ok(None) => DialogDecision::Cancel,
            Err(e) => {
                tracing::warn!(fehler = %e, "Eingabe im Verifikationsdialog fehlgeschlagen");
                DialogDecision::Cancel
            }
        }
    }

    fn close(&mut self, outcome: &VerificationOutcome) {
        match outcome {
            VerificationOutcome::Verified => println!("Verification finished"),
            VerificationOutcome::Cancelled(grund) => println!("Verification cancelled: {grund}"),
            VerificationOutcome::TimedOut => println!("Verification timed out"),
            VerificationOutcome::Failed(grund) => println!("Verification failed: {grund}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entscheidung_aus_eingabe() {
        assert_eq!(entscheidung("y\n"), DialogDecision::Match);
        assert_eq!(entscheidung(" YES "), DialogDecision::Match);
        assert_eq!(entscheidung("n"), DialogDecision::Mismatch);
        assert_eq!(entscheidung(""), DialogDecision::Cancel);
        assert_eq!(entscheidung("vielleicht"), DialogDecision::Cancel);
    }

    #[test]
    fn eingabetext_mit_und_ohne_platzhalter() {
        let mit = PasswordRequest {
            title: "Passphrase",
            label: "passphrase",
            placeholder: "correct horse battery staple",
            confirm: false,
        };
        assert_eq!(
            eingabetext(&mit),
            "Passphrase - passphrase (e.g. correct horse battery staple): "
        );
        let ohne = PasswordRequest {
            placeholder: "",
            ..mit
        };
        assert_eq!(eingabetext(&ohne), "Passphrase - passphrase: ");
    }
}
