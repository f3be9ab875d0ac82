//! Cross-Signing: Status, generieren + veroeffentlichen, aus SSSS laden, in SSSS sichern
//!
//! Private Schluessel werden nach `generate` oder `fetch` im Speicher
//! gehalten und nie auf die Platte geschrieben.

use std::sync::Arc;

use parking_lot::RwLock;

use vouch_core::{
    CrossSigningKeySet, CryptoEngine, DirectoryClient, DirectoryError, KeyPair, SecretBytes,
};
use vouch_core::cross_signing::{SECRET_MASTER, SECRET_SELF_SIGNING, SECRET_USER_SIGNING};

use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult, MitKontext};
use crate::secret_storage::SecretStorage;
use crate::uia::mit_uia_hochladen;

/// Hilfetext fuer `/cross-signing` ohne oder mit unbekanntem Subcommand
pub fn hilfe(orig_command: &str) -> String {
    format!(
        "Usage: /{orig_command} <subcommand> [...]\n\
         \n\
         Subcommands:\n\
         * status\n    \
             Check the status of your own cross-signing keys.\n\
         * generate [--force]\n    \
             Generate and upload new cross-signing keys.\n    \
             This will prompt you to enter your account password.\n    \
             If you already have existing keys, --force is required.\n\
         * fetch [--save-to-disk]\n    \
             Fetch your cross-signing keys from SSSS and decrypt them.\n    \
             If --save-to-disk is specified, the keys are saved to disk.\n\
         * upload\n    \
             Upload your cross-signing keys to SSSS."
    )
}

/// Workflows rund um die eigenen Cross-Signing-Schluessel
pub struct CrossSigning<D, C> {
    directory: Arc<D>,
    crypto: Arc<C>,
    ssss: Arc<SecretStorage<D, C>>,
    /// Zuletzt erzeugter oder entsperrter Satz
    zwischenspeicher: RwLock<Option<Arc<CrossSigningKeySet>>>,
}

impl<D, C> CrossSigning<D, C>
where
    D: DirectoryClient,
    C: CryptoEngine,
{
    pub fn neu(directory: Arc<D>, crypto: Arc<C>, ssss: Arc<SecretStorage<D, C>>) -> Self {
        Self {
            directory,
            crypto,
            ssss,
            zwischenspeicher: RwLock::new(None),
        }
    }

    /// Aktuell zwischengespeicherter Schluesselsatz
    pub fn zwischengespeichert(&self) -> Option<Arc<CrossSigningKeySet>> {
        self.zwischenspeicher.read().clone()
    }

    /// `/cross-signing status`
    pub async fn status(&self, ctx: &CommandContext<'_>) -> CommandResult<()> {
        if let Some(keys) = self.zwischengespeichert() {
            ctx.antworten(format!(
                "Cross-signing is set up and private keys are cached\n{}",
                schluessel_zeilen(
                    &keys.master.public_key,
                    Some(&keys.user_signing.public_key),
                    &keys.self_signing.public_key
                )
            ));
            return Ok(());
        }

        let own = self.directory.own_identity().user_id.clone();
        let veroeffentlicht = self
            .directory
            .query_cross_signing_keys(&own)
            .await
            .mit_kontext("Failed to query own keys")?
            .auswerten()
            .ok_or_else(|| {
                CommandError::NichtGefunden("Didn't find published cross-signing keys".into())
            })?;

        ctx.antworten(format!(
            "Cross-signing is set up, but private keys are not cached\n{}",
            schluessel_zeilen(
                &veroeffentlicht.master,
                veroeffentlicht.user_signing.as_deref(),
                &veroeffentlicht.self_signing
            )
        ));
        Ok(())
    }

    /// `/cross-signing generate [--force]`
    pub async fn generieren(&self, ctx: &CommandContext<'_>, erzwingen: bool) -> CommandResult<()> {
        if !erzwingen {
            let own = self.directory.own_identity().user_id.clone();
            let vorhanden = match self.directory.query_cross_signing_keys(&own).await {
                Ok(keys) => keys.auswerten().is_some(),
                Err(DirectoryError::NichtGefunden(_)) => false,
                Err(e) => return Err(e).mit_kontext("Failed to query own keys"),
            };
            if vorhanden {
                return Err(CommandError::Usage(
                    "Found existing cross-signing keys. Use `--force` if you want to overwrite them."
                        .into(),
                ));
            }
        }

        let keys = self
            .crypto
            .generate_cross_signing_keys()
            .mit_kontext("Failed to generate cross-signing keys")?;
        let oeffentlich = keys.public_keys();

        mit_uia_hochladen(self.directory.as_ref(), ctx, &oeffentlich).await?;

        tracing::info!(master = %oeffentlich.master, "Cross-Signing-Schluessel veroeffentlicht");
        *self.zwischenspeicher.write() = Some(Arc::new(keys));
        ctx.antworten(format!(
            "Successfully generated and published cross-signing keys\n{}",
            schluessel_zeilen(
                &oeffentlich.master,
                Some(&oeffentlich.user_signing),
                &oeffentlich.self_signing
            )
        ));
        Ok(())
    }

    /// `/cross-signing fetch [--save-to-disk]`
    pub async fn laden(&self, ctx: &CommandContext<'_>, auf_platte: bool) -> CommandResult<()> {
        let ssss_key = self.ssss.entsperren(ctx).await?;

        let mut paare = Vec::with_capacity(3);
        for name in [SECRET_MASTER, SECRET_SELF_SIGNING, SECRET_USER_SIGNING] {
            let verschluesselt = match self.directory.secret(name).await {
                Ok(s) => s,
                Err(DirectoryError::NichtGefunden(_)) => {
                    return Err(CommandError::NichtGefunden(format!(
                        "Error fetching cross-signing keys: {name} is not stored in SSSS"
                    )))
                }
                Err(e) => return Err(e).mit_kontext("Error fetching cross-signing keys"),
            };
            let seed: SecretBytes = self
                .crypto
                .decrypt_secret(&ssss_key, name, &verschluesselt)
                .mit_kontext("Error fetching cross-signing keys")?;
            let paar: KeyPair = self
                .crypto
                .key_pair_from_seed(&seed)
                .mit_kontext("Error fetching cross-signing keys")?;
            paare.push(paar);
        }

        let mut paare = paare.into_iter();
        let (Some(master), Some(self_signing), Some(user_signing)) =
            (paare.next(), paare.next(), paare.next())
        else {
            return Err(CommandError::NichtGefunden(
                "Error fetching cross-signing keys: incomplete key set".into(),
            ));
        };
        *self.zwischenspeicher.write() = Some(Arc::new(CrossSigningKeySet {
            master,
            self_signing,
            user_signing,
        }));
        tracing::info!(key_id = %ssss_key.id, "Cross-Signing-Schluessel aus SSSS entsperrt");

        if auf_platte {
            ctx.antworten("Saving keys to disk is not yet implemented");
        }
        ctx.antworten("Successfully unlocked cross-signing keys");
        Ok(())
    }

    /// `/cross-signing upload`
    pub async fn hochladen(&self, ctx: &CommandContext<'_>, orig_command: &str) -> CommandResult<()> {
        let keys = self.zwischengespeichert().ok_or_else(|| {
            CommandError::NichtGefunden(format!(
                "Cross-signing keys not cached, use `/{orig_command} generate` first"
            ))
        })?;
        let ssss_key = self.ssss.entsperren(ctx).await?;

        for (name, paar) in keys.mit_secret_namen() {
            let verschluesselt = self
                .crypto
                .encrypt_secret(&ssss_key, name, &paar.seed)
                .mit_kontext("Failed to upload keys to SSSS")?;
            self.directory
                .set_secret(name, &verschluesselt)
                .await
                .mit_kontext("Failed to upload keys to SSSS")?;
        }

        tracing::info!(key_id = %ssss_key.id, "Cross-Signing-Schluessel in SSSS gesichert");
        ctx.antworten("Successfully uploaded cross-signing keys to SSSS");
        Ok(())
    }
}

fn schluessel_zeilen(master: &str, user_signing: Option<&str>, self_signing: &str) -> String {
    format!(
        "Master key: {master}\nUser signing key: {}\nSelf-signing key: {self_signing}",
        user_signing.unwrap_or("(not published)")
    )
}
