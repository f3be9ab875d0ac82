//! Befehls-Dispatcher
//!
//! Ordnet geparste Befehle den Workflows zu. Jeder Fehler wird genau einmal
//! als Antwort gemeldet.

use std::sync::Arc;
use std::time::Duration;

use vouch_core::{CryptoEngine, DeviceId, DirectoryClient, EventBus, TrustStore, UserId};

use crate::autocomplete::{phase, vervollstaendigen, Phase, Vervollstaendigung};
use crate::context::{CommandContext, RoomContext};
use crate::cross_signing::{self, CrossSigning};
use crate::device_trust::DeviceTrust;
use crate::error::{CommandError, CommandResult, FehlerKategorie};
use crate::key_export::{ExportUmfang, KeyTransfer};
use crate::parser::ParsedCommand;
use crate::secret_storage::{self, SecretStorage};
use crate::types::Command;
use crate::verification::VerificationRegistry;

/// Standard-Zeitlimit einer interaktiven Verifikation
pub const STANDARD_SAS_ZEITLIMIT: Duration = Duration::from_secs(120);

/// Einstellungen der Befehlsschicht
#[derive(Debug, Clone)]
pub struct CommandKonfig {
    pub sas_zeitlimit: Duration,
}

impl Default for CommandKonfig {
    fn default() -> Self {
        Self {
            sas_zeitlimit: STANDARD_SAS_ZEITLIMIT,
        }
    }
}

/// Ergebnis eines Dispatch-Aufrufs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ausfuehrung {
    Erledigt,
    /// Fehler wurde bereits als Antwort gemeldet
    Fehlgeschlagen(FehlerKategorie),
    /// Kein Befehl dieses Subsystems
    Unbekannt,
}

/// Zentraler Dispatcher mit allen Workflows
pub struct CommandDispatcher<S, D, C> {
    store: Arc<S>,
    geraete: DeviceTrust<S, D, C>,
    ssss: Arc<SecretStorage<D, C>>,
    cross_signing: CrossSigning<D, C>,
    schluessel: KeyTransfer<S, C>,
    verifikationen: Arc<VerificationRegistry>,
}

impl<S, D, C> CommandDispatcher<S, D, C>
where
    S: TrustStore,
    D: DirectoryClient,
    C: CryptoEngine,
{
    pub fn neu(
        store: Arc<S>,
        directory: Arc<D>,
        crypto: Arc<C>,
        bus: Arc<dyn EventBus>,
        konfig: CommandKonfig,
    ) -> Arc<Self> {
        let verifikationen = Arc::new(VerificationRegistry::neu());
        let ssss = Arc::new(SecretStorage::neu(directory.clone(), crypto.clone()));
        Arc::new(Self {
            geraete: DeviceTrust::neu(
                store.clone(),
                directory.clone(),
                crypto.clone(),
                bus.clone(),
                verifikationen.clone(),
                konfig.sas_zeitlimit,
            ),
            cross_signing: CrossSigning::neu(directory, crypto.clone(), ssss.clone()),
            schluessel: KeyTransfer::neu(store.clone(), crypto, bus),
            ssss,
            store,
            verifikationen,
        })
    }

    pub fn cross_signing(&self) -> &CrossSigning<D, C> {
        &self.cross_signing
    }

    pub fn verifikationen(&self) -> &VerificationRegistry {
        &self.verifikationen
    }

    /// Fuehrt einen Befehl aus und meldet Fehler als Antwort
    pub async fn ausfuehren(&self, cmd: &ParsedCommand, ctx: &CommandContext<'_>) -> Ausfuehrung {
        let Some(befehl) = Command::aus_name(&cmd.command) else {
            return Ausfuehrung::Unbekannt;
        };
        tracing::debug!(befehl = befehl.name(), args = cmd.args.len(), "Befehl wird ausgefuehrt");

        match self.befehl_ausfuehren(befehl, cmd, ctx).await {
            Ok(()) => Ausfuehrung::Erledigt,
            Err(e) => {
                let kategorie = e.kategorie();
                match kategorie {
                    FehlerKategorie::Intern | FehlerKategorie::Transport => {
                        tracing::warn!(befehl = befehl.name(), fehler = %e, "Befehl fehlgeschlagen")
                    }
                    _ => tracing::debug!(befehl = befehl.name(), ?kategorie, "Befehl abgelehnt"),
                }
                ctx.antworten(e.to_string());
                Ausfuehrung::Fehlgeschlagen(kategorie)
            }
        }
    }

    async fn befehl_ausfuehren(
        &self,
        befehl: Command,
        cmd: &ParsedCommand,
        ctx: &CommandContext<'_>,
    ) -> CommandResult<()> {
        match befehl {
            Command::GeraeteListe => {
                let user_id = cmd
                    .arg(0)
                    .ok_or_else(|| CommandError::Usage("Usage: /devices <user id>".into()))?;
                self.geraete.geraete_auflisten(ctx, &UserId::from(user_id)).await
            }
            Command::GeraetAnzeigen => {
                let (user_id, device_id) = geraete_argumente(befehl, cmd)?;
                self.geraete.geraet_anzeigen(ctx, &user_id, &device_id).await
            }
            Command::Verifizieren => {
                let (user_id, device_id) = geraete_argumente(befehl, cmd)?;
                let fingerprint = (cmd.args.len() > 2).then(|| cmd.args[2..].concat());
                self.geraete
                    .verifizieren(ctx, &user_id, &device_id, fingerprint.as_deref())
                    .await
            }
            Command::Entverifizieren => {
                let (user_id, device_id) = geraete_argumente(befehl, cmd)?;
                self.geraete.entverifizieren(ctx, &user_id, &device_id).await
            }
            Command::Sperren => {
                let (user_id, device_id) = geraete_argumente(befehl, cmd)?;
                self.geraete.sperren(ctx, &user_id, &device_id).await
            }
            Command::SitzungZuruecksetzen => self.schluessel.sitzung_zuruecksetzen(ctx).await,
            Command::SchluesselImport => {
                self.schluessel
                    .importieren(ctx, &cmd.orig_command, &cmd.raw_args)
                    .await
            }
            Command::SchluesselExport => {
                self.schluessel
                    .exportieren(ctx, &cmd.orig_command, &cmd.raw_args, ExportUmfang::Alle)
                    .await
            }
            Command::RaumSchluesselExport => {
                self.schluessel
                    .exportieren(
                        ctx,
                        &cmd.orig_command,
                        &cmd.raw_args,
                        ExportUmfang::AktuellerRaum,
                    )
                    .await
            }
            Command::SecretStorage => self.ssss_ausfuehren(cmd, ctx).await,
            Command::CrossSigning => self.cross_signing_ausfuehren(cmd, ctx).await,
        }
    }

    async fn ssss_ausfuehren(&self, cmd: &ParsedCommand, ctx: &CommandContext<'_>) -> CommandResult<()> {
        let unterbefehl = cmd.arg(0).map(str::to_lowercase);
        match unterbefehl.as_deref() {
            Some("status") => self.ssss.status(ctx, cmd.arg(1)).await,
            Some("generate") => {
                let als_standard = hat_flag(cmd, "--set-default");
                self.ssss
                    .generieren(ctx, &cmd.orig_command, als_standard)
                    .await
            }
            Some("set-default") => {
                let key_id = cmd.arg(1).ok_or_else(|| {
                    CommandError::Usage(format!("Usage: /{} set-default <key ID>", cmd.orig_command))
                })?;
                self.ssss.standard_setzen(ctx, key_id).await
            }
            _ => Err(CommandError::Usage(secret_storage::hilfe(&cmd.orig_command))),
        }
    }

    async fn cross_signing_ausfuehren(
        &self,
        cmd: &ParsedCommand,
        ctx: &CommandContext<'_>,
    ) -> CommandResult<()> {
        let unterbefehl = cmd.arg(0).map(str::to_lowercase);
        match unterbefehl.as_deref() {
            Some("status") => self.cross_signing.status(ctx).await,
            Some("generate") => {
                self.cross_signing
                    .generieren(ctx, hat_flag(cmd, "--force"))
                    .await
            }
            Some("fetch") => {
                self.cross_signing
                    .laden(ctx, hat_flag(cmd, "--save-to-disk"))
                    .await
            }
            Some("upload") => self.cross_signing.hochladen(ctx, &cmd.orig_command).await,
            _ => Err(CommandError::Usage(cross_signing::hilfe(&cmd.orig_command))),
        }
    }

    /// Vervollstaendigung einer Eingabezeile
    pub async fn autocomplete(
        &self,
        cmd: &ParsedCommand,
        room: Option<&RoomContext>,
    ) -> Vervollstaendigung {
        let mitglieder = room.map(|r| r.members.as_slice()).unwrap_or_default();
        let geraete = match (phase(cmd), cmd.arg(0)) {
            (Phase::Geraet, Some(user_id)) => {
                match self.store.devices(&UserId::from(user_id)).await {
                    Ok(geraete) => geraete,
                    Err(e) => {
                        tracing::debug!(fehler = %e, "Geraete fuer Autocomplete nicht ladbar");
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };
        vervollstaendigen(cmd, mitglieder, &geraete)
    }
}

fn geraete_argumente(befehl: Command, cmd: &ParsedCommand) -> CommandResult<(UserId, DeviceId)> {
    match (cmd.arg(0), cmd.arg(1)) {
        (Some(user_id), Some(device_id)) => Ok((user_id.into(), device_id.into())),
        _ => Err(CommandError::Usage(format!(
            "Usage: /{} <user id> <device id> [fingerprint]",
            befehl.name()
        ))),
    }
}

fn hat_flag(cmd: &ParsedCommand, flag: &str) -> bool {
    cmd.args
        .iter()
        .skip(1)
        .any(|a| a.eq_ignore_ascii_case(flag))
}
