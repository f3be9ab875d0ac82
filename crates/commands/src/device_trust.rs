//! Geraete-Vertrauen: auflisten, anzeigen, verifizieren, entverifizieren, sperren
//!
//! Jede Vertrauensaenderung folgt der Reihenfolge
//! Zustand setzen -> im Store speichern -> `DevicesChanged` senden.
//! Schlaegt das Speichern fehl, wird kein Ereignis gesendet.

use std::sync::Arc;
use std::time::Duration;

use vouch_core::{
    CryptoEngine, Device, DeviceId, DirectoryClient, EventBus, TrustState, TrustStore, UserId,
    VerificationOutcome, VouchEvent,
};

use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult, MitKontext};
use crate::verification::{sas_durchfuehren, VerificationRegistry};

/// Workflows rund um den Vertrauenszustand einzelner Geraete
pub struct DeviceTrust<S, D, C> {
    store: Arc<S>,
    directory: Arc<D>,
    crypto: Arc<C>,
    bus: Arc<dyn EventBus>,
    registry: Arc<VerificationRegistry>,
    sas_zeitlimit: Duration,
}

impl<S, D, C> DeviceTrust<S, D, C>
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
        registry: Arc<VerificationRegistry>,
        sas_zeitlimit: Duration,
    ) -> Self {
        Self {
            store,
            directory,
            crypto,
            bus,
            registry,
            sas_zeitlimit,
        }
    }

    /// `/devices <user>`
    pub async fn geraete_auflisten(
        &self,
        ctx: &CommandContext<'_>,
        user_id: &UserId,
    ) -> CommandResult<()> {
        let mut geraete = self
            .store
            .devices(user_id)
            .await
            .mit_kontext("Failed to get device list")?;

        if geraete.is_empty() {
            ctx.antworten("Fetching device list from server...");
            geraete = self.geraeteliste_aktualisieren(user_id).await?;
        }
        if geraete.is_empty() {
            return Err(CommandError::NichtGefunden(format!(
                "No devices found for {user_id}"
            )));
        }

        let zeilen: Vec<String> = geraete
            .iter()
            .map(|d| {
                format!(
                    "{} ({}) - {}\n    Fingerprint: {}",
                    d.device_id,
                    d.name,
                    d.trust,
                    d.fingerprint()
                )
            })
            .collect();
        ctx.antworten(zeilen.join("\n"));
        Ok(())
    }

    /// `/device <user> <device>`
    pub async fn geraet_anzeigen(
        &self,
        ctx: &CommandContext<'_>,
        user_id: &UserId,
        device_id: &DeviceId,
    ) -> CommandResult<()> {
        let device = self.geraet_holen(user_id, device_id).await?;
        let art = if device.deleted { "Deleted device" } else { "Device" };
        ctx.antworten(format!(
            "{art} {} of {}\nFingerprint: {}\nIdentity key: {}\nDevice name: {}\nTrust state: {}",
            device.device_id,
            device.user_id,
            device.fingerprint(),
            device.identity_key,
            device.name,
            device.trust
        ));
        Ok(())
    }

    /// `/verify <user> <device> [fingerprint]`
    ///
    /// Ohne Fingerprint wird eine interaktive SAS-Verifikation gestartet.
    /// Der Fingerprint darf in Gruppen mit Leerzeichen angegeben werden.
    pub async fn verifizieren(
        &self,
        ctx: &CommandContext<'_>,
        user_id: &UserId,
        device_id: &DeviceId,
        fingerprint: Option<&str>,
    ) -> CommandResult<()> {
        let device = self.geraet_holen(user_id, device_id).await?;
        if device.trust == TrustState::Verified {
            ctx.antworten("That device is already verified");
            return Ok(());
        }
        if device.deleted {
            return Err(CommandError::Verifikation(format!(
                "Device {} of {} was deleted and can't be verified",
                device.device_id, device.user_id
            )));
        }

        match fingerprint {
            None => self.interaktiv_verifizieren(ctx, device).await,
            Some(fingerprint) => {
                if fingerprint != device.signing_key {
                    return Err(CommandError::Verifikation("Mismatching fingerprint".into()));
                }
                let aktion = if device.trust == TrustState::Blacklisted {
                    "unblacklisted and verified"
                } else {
                    "verified"
                };
                self.vertrauen_setzen(ctx, device, TrustState::Verified, aktion)
                    .await
            }
        }
    }

    /// `/unverify <user> <device>`
    pub async fn entverifizieren(
        &self,
        ctx: &CommandContext<'_>,
        user_id: &UserId,
        device_id: &DeviceId,
    ) -> CommandResult<()> {
        let device = self.geraet_holen(user_id, device_id).await?;
        if device.trust == TrustState::Unset {
            ctx.antworten("That device is already not verified");
            return Ok(());
        }
        let aktion = if device.trust == TrustState::Blacklisted {
            "unblacklisted"
        } else {
            "unverified"
        };
        self.vertrauen_setzen(ctx, device, TrustState::Unset, aktion)
            .await
    }

    /// `/blacklist <user> <device>`
    pub async fn sperren(
        &self,
        ctx: &CommandContext<'_>,
        user_id: &UserId,
        device_id: &DeviceId,
    ) -> CommandResult<()> {
        let device = self.geraet_holen(user_id, device_id).await?;
        if device.trust == TrustState::Blacklisted {
            ctx.antworten("That device is already blacklisted");
            return Ok(());
        }
        let aktion = if device.trust == TrustState::Verified {
            "unverified and blacklisted"
        } else {
            "blacklisted"
        };
        self.vertrauen_setzen(ctx, device, TrustState::Blacklisted, aktion)
            .await
    }

    /// Geraet aus dem Store laden, bei Bedarf die Liste vom Server holen
    async fn geraet_holen(&self, user_id: &UserId, device_id: &DeviceId) -> CommandResult<Device> {
        if let Some(device) = self
            .store
            .device(user_id, device_id)
            .await
            .mit_kontext("Failed to get device")?
        {
            return Ok(device);
        }

        tracing::debug!(user_id = %user_id, device_id = %device_id, "Geraet unbekannt, frage Server");
        self.geraeteliste_aktualisieren(user_id)
            .await?
            .into_iter()
            .find(|d| &d.device_id == device_id)
            .ok_or_else(|| {
                CommandError::NichtGefunden(format!(
                    "Failed to get device: device {device_id} of {user_id} not found"
                ))
            })
    }

    async fn geraeteliste_aktualisieren(&self, user_id: &UserId) -> CommandResult<Vec<Device>> {
        let geraete = self
            .directory
            .query_devices(user_id)
            .await
            .mit_kontext("Failed to fetch device list")?;
        tracing::debug!(user_id = %user_id, anzahl = geraete.len(), "Geraeteliste vom Server");
        self.store
            .put_devices(user_id, geraete)
            .await
            .mit_kontext("Failed to save device list")?;
        self.store
            .devices(user_id)
            .await
            .mit_kontext("Failed to get device list")
    }

    /// Zustand setzen, speichern, Abhaengige benachrichtigen
    async fn vertrauen_setzen(
        &self,
        ctx: &CommandContext<'_>,
        mut device: Device,
        neu: TrustState,
        aktion: &str,
    ) -> CommandResult<()> {
        self.registry.abbrechen(
            &device.user_id,
            &device.device_id,
            "trust state was changed manually",
        );

        let alt = device.trust;
        device.trust = neu;
        self.store
            .put_device(&device)
            .await
            .mit_kontext("Failed to save device")?;

        tracing::info!(
            user_id = %device.user_id,
            device_id = %device.device_id,
            alt = %alt,
            neu = %neu,
            "Vertrauenszustand geaendert"
        );
        ctx.antworten(format!("Successfully {aktion} {}", device.beschreibung()));
        self.bus.senden(VouchEvent::DevicesChanged {
            user_id: device.user_id.clone(),
        });
        Ok(())
    }

    async fn interaktiv_verifizieren(
        &self,
        ctx: &CommandContext<'_>,
        device: Device,
    ) -> CommandResult<()> {
        let mut kanal = self
            .crypto
            .start_sas(&device)
            .await
            .mit_kontext("Failed to start interactive verification")?;
        let mut dialog = ctx.prompt.open_verification_dialog(&device, self.sas_zeitlimit);
        let mut handle = self.registry.registrieren(&device.user_id, &device.device_id);
        tracing::info!(
            user_id = %device.user_id,
            device_id = %device.device_id,
            "Interaktive Verifikation gestartet"
        );

        let outcome = sas_durchfuehren(
            kanal.as_mut(),
            dialog.as_mut(),
            &mut handle,
            self.sas_zeitlimit,
        )
        .await;
        self.registry.entfernen(&handle);
        dialog.close(&outcome);

        let ergebnis = match &outcome {
            VerificationOutcome::Verified => {
                // Zustand kann sich waehrend der Verifikation geaendert haben
                let aktuell = self.geraet_holen(&device.user_id, &device.device_id).await?;
                let aktion = if aktuell.trust == TrustState::Blacklisted {
                    "unblacklisted and verified"
                } else {
                    "verified"
                };
                self.vertrauen_setzen(ctx, aktuell, TrustState::Verified, aktion)
                    .await
            }
            VerificationOutcome::Cancelled(grund) => Err(CommandError::Verifikation(format!(
                "Verification cancelled: {grund}"
            ))),
            VerificationOutcome::TimedOut => {
                Err(CommandError::Verifikation("Verification timed out".into()))
            }
            VerificationOutcome::Failed(grund) => Err(CommandError::Verifikation(format!(
                "Verification failed: {grund}"
            ))),
        };

        self.bus.senden(VouchEvent::VerificationFinished {
            user_id: device.user_id,
            device_id: device.device_id,
            outcome,
        });
        ergebnis
    }
}
