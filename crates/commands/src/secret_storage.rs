//! Secret-Storage (SSSS): Status, Schluessel erzeugen, Standard setzen, entsperren

use std::sync::Arc;

use vouch_core::{
    CryptoEngine, CryptoError, DirectoryClient, DirectoryError, PasswordRequest, SsssKey,
    SsssKeyMetadata,
};

use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult, MitKontext};

/// Beispiel-Recovery-Key im Eingabefeld
const RECOVERY_KEY_PLATZHALTER: &str = "tDAK LMRH PiYE bdzi maCe xLX5 wV6P Nmfd c5mC wLef 15Fs VVSc";

const PASSPHRASE_PLATZHALTER: &str = "correct horse battery staple";

/// Hilfetext fuer `/ssss` ohne oder mit unbekanntem Subcommand
pub fn hilfe(orig_command: &str) -> String {
    format!(
        "Usage: /{orig_command} <subcommand> [...]\n\
         \n\
         Subcommands:\n\
         * status [key ID] - Check the status of your SSSS.\n\
         * generate [--set-default] - Generate a SSSS key and optionally set it as the default.\n\
         * set-default <key ID> - Set a SSSS key as the default."
    )
}

/// Workflows rund um den Secret-Storage
pub struct SecretStorage<D, C> {
    directory: Arc<D>,
    crypto: Arc<C>,
}

impl<D, C> SecretStorage<D, C>
where
    D: DirectoryClient,
    C: CryptoEngine,
{
    pub fn neu(directory: Arc<D>, crypto: Arc<C>) -> Self {
        Self { directory, crypto }
    }

    /// `/ssss status [key ID]`
    pub async fn status(&self, ctx: &CommandContext<'_>, key_id: Option<&str>) -> CommandResult<()> {
        let (key_id, kopf) = match key_id {
            Some(id) => (id.to_string(), "Key data found."),
            None => {
                let id = self
                    .directory
                    .default_ssss_key_id()
                    .await
                    .mit_kontext("Failed to get default key ID")?
                    .ok_or_else(|| {
                        CommandError::NichtGefunden("SSSS is not set up: no default key set".into())
                    })?;
                (id, "Default key is set.")
            }
        };

        let metadata = self
            .directory
            .ssss_key_metadata(&key_id)
            .await
            .mit_kontext("Failed to get key data")?;

        ctx.antworten(format!(
            "{kopf}\n  Key ID: {key_id}\n  Has passphrase: {}\n  Algorithm: {}",
            passphrase_beschreibung(&metadata),
            algorithmus_beschreibung(&metadata)
        ));
        Ok(())
    }

    /// `/ssss generate [--set-default]`
    ///
    /// Eine leere Passphrase erzeugt einen reinen Zufallsschluessel. Der
    /// Recovery-Key wird genau einmal angezeigt.
    pub async fn generieren(
        &self,
        ctx: &CommandContext<'_>,
        orig_command: &str,
        als_standard: bool,
    ) -> CommandResult<()> {
        let passphrase = ctx
            .prompt
            .ask_password(PasswordRequest {
                title: "Passphrase",
                label: "",
                placeholder: PASSPHRASE_PLATZHALTER,
                confirm: false,
            })
            .await
            .ok_or_else(|| CommandError::Abgebrochen("Passphrase entry cancelled".into()))?;

        let passphrase = (!passphrase.is_empty()).then_some(passphrase);
        let erzeugt = self
            .crypto
            .generate_ssss_key(passphrase.as_ref())
            .mit_kontext("Failed to generate new key")?;
        let key_id = erzeugt.key.id.clone();

        self.directory
            .set_ssss_key_metadata(&key_id, &erzeugt.key.metadata)
            .await
            .mit_kontext("Failed to upload key metadata")?;
        tracing::info!(key_id = %key_id, passphrase = passphrase.is_some(), "SSSS-Schluessel erzeugt");

        ctx.antworten(format!(
            "Successfully generated key {key_id}\nRecovery key: {}",
            erzeugt.recovery_key.expose()
        ));

        if als_standard {
            self.directory
                .set_default_ssss_key_id(&key_id)
                .await
                .mit_kontext("Failed to set key as default")?;
            ctx.antworten(format!("Successfully set key {key_id} as default"));
        } else {
            ctx.antworten(format!(
                "You can use `/{orig_command} set-default {key_id}` to set it as the default"
            ));
        }
        Ok(())
    }

    /// `/ssss set-default <key ID>`
    pub async fn standard_setzen(&self, ctx: &CommandContext<'_>, key_id: &str) -> CommandResult<()> {
        match self.directory.ssss_key_metadata(key_id).await {
            Ok(_) => {}
            Err(DirectoryError::NichtGefunden(_)) => {
                return Err(CommandError::NichtGefunden(
                    "Couldn't find key data on server".into(),
                ))
            }
            Err(e) => return Err(e).mit_kontext("Failed to fetch key data"),
        }

        self.directory
            .set_default_ssss_key_id(key_id)
            .await
            .mit_kontext("Failed to set key as default")?;
        tracing::info!(key_id, "SSSS-Standardschluessel gesetzt");
        ctx.antworten(format!("Successfully set key {key_id} as default"));
        Ok(())
    }

    /// Standard-SSSS-Schluessel per Passphrase oder Recovery-Key entsperren
    ///
    /// Hat der Schluessel eine PBKDF2-Passphrase, wird diese abgefragt,
    /// sonst der Recovery-Key.
    pub async fn entsperren(&self, ctx: &CommandContext<'_>) -> CommandResult<SsssKey> {
        let nicht_eingerichtet = || {
            CommandError::NichtGefunden(
                "SSSS not set up, use `/ssss generate --set-default` first".into(),
            )
        };

        let key_id = self
            .directory
            .default_ssss_key_id()
            .await
            .mit_kontext("Failed to fetch default SSSS key data")?
            .ok_or_else(nicht_eingerichtet)?;
        let metadata = match self.directory.ssss_key_metadata(&key_id).await {
            Ok(m) => m,
            Err(DirectoryError::NichtGefunden(_)) => return Err(nicht_eingerichtet()),
            Err(e) => return Err(e).mit_kontext("Failed to fetch default SSSS key data"),
        };

        if metadata.nutzt_pbkdf2_passphrase() {
            let passphrase = ctx
                .prompt
                .ask_password(PasswordRequest {
                    title: "Passphrase",
                    label: "",
                    placeholder: PASSPHRASE_PLATZHALTER,
                    confirm: false,
                })
                .await
                .ok_or_else(|| CommandError::Abgebrochen("Passphrase entry cancelled".into()))?;

            match self.crypto.verify_passphrase(&key_id, &metadata, &passphrase) {
                Ok(key) => Ok(key),
                Err(CryptoError::FalscherSchluessel) => {
                    Err(CommandError::Verifikation("Incorrect passphrase".into()))
                }
                Err(e) => Err(e).mit_kontext("Failed to get SSSS key"),
            }
        } else {
            let recovery_key = ctx
                .prompt
                .ask_password(PasswordRequest {
                    title: "Recovery key",
                    label: "",
                    placeholder: RECOVERY_KEY_PLATZHALTER,
                    confirm: false,
                })
                .await
                .ok_or_else(|| CommandError::Abgebrochen("Recovery key entry cancelled".into()))?;

            match self
                .crypto
                .verify_recovery_key(&key_id, &metadata, &recovery_key)
            {
                Ok(key) => Ok(key),
                Err(CryptoError::UngueltigerRecoveryKey(grund)) => {
                    tracing::debug!(grund = %grund, "Recovery-Key nicht dekodierbar");
                    Err(CommandError::Verifikation("Malformed recovery key".into()))
                }
                Err(CryptoError::FalscherSchluessel) => {
                    Err(CommandError::Verifikation("Incorrect recovery key".into()))
                }
                Err(e) => Err(e).mit_kontext("Failed to get SSSS key"),
            }
        }
    }
}

fn passphrase_beschreibung(metadata: &SsssKeyMetadata) -> String {
    match &metadata.passphrase {
        None => "no".to_string(),
        Some(p) => format!(
            "yes (alg={},bits={},iter={})",
            p.algorithm, p.bits, p.iterations
        ),
    }
}

fn algorithmus_beschreibung(metadata: &SsssKeyMetadata) -> String {
    if metadata.algorithmus_unterstuetzt() {
        metadata.algorithm.clone()
    } else {
        format!("{} (not supported!)", metadata.algorithm)
    }
}
