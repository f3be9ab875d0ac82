//! Schluessel-Import/-Export und Zuruecksetzen der ausgehenden Sitzung
//!
//! Exportdateien werden nur fuer den Besitzer lesbar angelegt (0400).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use vouch_core::{
    CryptoEngine, CryptoError, EventBus, PasswordRequest, Secret, TrustStore, VouchEvent,
};

use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult, MitKontext};

/// Welche Sitzungen exportiert werden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportUmfang {
    Alle,
    AktuellerRaum,
}

/// Workflows rund um Gruppen-Sitzungen
pub struct KeyTransfer<S, C> {
    store: Arc<S>,
    crypto: Arc<C>,
    bus: Arc<dyn EventBus>,
}

impl<S, C> KeyTransfer<S, C>
where
    S: TrustStore,
    C: CryptoEngine,
{
    pub fn neu(store: Arc<S>, crypto: Arc<C>, bus: Arc<dyn EventBus>) -> Self {
        Self { store, crypto, bus }
    }

    /// `/reset-session`
    pub async fn sitzung_zuruecksetzen(&self, ctx: &CommandContext<'_>) -> CommandResult<()> {
        let room_id = ctx.room_id().cloned().ok_or_else(|| {
            CommandError::Usage("/reset-session can only be used in a room".into())
        })?;

        let entfernt = self
            .store
            .remove_outbound_group_session(&room_id)
            .await
            .mit_kontext("Failed to remove outbound group session")?;

        if entfernt {
            tracing::info!(room_id = %room_id, "Ausgehende Gruppen-Sitzung verworfen");
            ctx.antworten("Removed outbound group session for this room");
            self.bus
                .senden(VouchEvent::OutboundSessionDiscarded { room_id });
        } else {
            ctx.antworten("No outbound group session to remove for this room");
        }
        Ok(())
    }

    /// `/import <datei>`
    pub async fn importieren(
        &self,
        ctx: &CommandContext<'_>,
        orig_command: &str,
        pfad: &str,
    ) -> CommandResult<()> {
        let pfad = datei_pfad(orig_command, pfad)?;
        let daten = tokio::fs::read(&pfad)
            .await
            .mit_kontext(format!("Failed to read {}", pfad.display()))?;

        let passphrase = passphrase_abfragen(ctx, "Key import", false).await?;
        let import = match self.crypto.import_sessions(&passphrase, &daten) {
            Ok(import) => import,
            Err(e @ CryptoError::Entschluesselung(_)) => {
                return Err(CommandError::Verifikation(format!(
                    "Failed to import sessions: {e}"
                )))
            }
            Err(e) => return Err(e).mit_kontext("Failed to import sessions"),
        };
        let gesamt = import.gesamt();

        let mut importiert = 0usize;
        for session in import.sessions {
            if self
                .store
                .add_group_session(session)
                .await
                .mit_kontext("Failed to import sessions")?
            {
                importiert += 1;
            }
        }

        tracing::info!(
            importiert,
            gesamt,
            verworfen = import.verworfen,
            pfad = %pfad.display(),
            "Sitzungen importiert"
        );
        ctx.antworten(format!("Successfully imported {importiert}/{gesamt} sessions"));
        Ok(())
    }

    /// `/export <datei>` und `/export-room <datei>`
    pub async fn exportieren(
        &self,
        ctx: &CommandContext<'_>,
        orig_command: &str,
        pfad: &str,
        umfang: ExportUmfang,
    ) -> CommandResult<()> {
        let pfad = datei_pfad(orig_command, pfad)?;

        let sessions = match umfang {
            ExportUmfang::Alle => self.store.all_group_sessions().await,
            ExportUmfang::AktuellerRaum => {
                let room_id = ctx.room_id().ok_or_else(|| {
                    CommandError::Usage(format!("/{orig_command} can only be used in a room"))
                })?;
                self.store.group_sessions_for_room(room_id).await
            }
        }
        .mit_kontext("Failed to get sessions to export")?;

        let passphrase = passphrase_abfragen(ctx, "Key export", true).await?;
        let daten = self
            .crypto
            .export_sessions(&passphrase, &sessions)
            .mit_kontext("Failed to export sessions")?;

        nur_besitzer_schreiben(&pfad, &daten)
            .await
            .mit_kontext(format!("Failed to write sessions to {}", pfad.display()))?;

        tracing::info!(anzahl = sessions.len(), pfad = %pfad.display(), ?umfang, "Sitzungen exportiert");
        ctx.antworten(format!(
            "Successfully exported {} sessions to {}",
            sessions.len(),
            pfad.display()
        ));
        Ok(())
    }
}

async fn passphrase_abfragen(
    ctx: &CommandContext<'_>,
    title: &str,
    confirm: bool,
) -> CommandResult<Secret> {
    ctx.prompt
        .ask_password(PasswordRequest {
            title,
            label: "passphrase",
            placeholder: "",
            confirm,
        })
        .await
        .ok_or_else(|| CommandError::Abgebrochen("Passphrase entry cancelled".into()))
}

/// Pfadargument pruefen und absolut machen
fn datei_pfad(orig_command: &str, roh: &str) -> CommandResult<PathBuf> {
    let roh = roh.trim();
    if roh.is_empty() {
        return Err(CommandError::Usage(format!("Usage: /{orig_command} <file>")));
    }
    let pfad = Path::new(roh);
    if pfad.is_absolute() {
        return Ok(pfad.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(pfad))
        .mit_kontext("Failed to get absolute path")
}

async fn nur_besitzer_schreiben(pfad: &Path, daten: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut optionen = tokio::fs::OpenOptions::new();
    optionen.write(true).create(true).truncate(true);
    #[cfg(unix)]
    optionen.mode(0o400);

    let mut datei = optionen.open(pfad).await?;
    datei.write_all(daten).await?;
    datei.sync_all().await
}
