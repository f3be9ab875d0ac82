//! Interaktive SAS-Verifikation
//!
//! Zustandsautomat:
//! ```text
//! Gestartet -> Angenommen -> KurzcodeAngezeigt -> Bestaetigt -> Verifiziert
//!      \            \                \                 \
//!       +------------+----------------+-----------------+--> Abgebrochen
//! ```
//! Jede laufende Verifikation ist in der `VerificationRegistry` eingetragen.
//! Eine manuelle Vertrauensaenderung am selben Geraet bricht sie ab, die
//! zuletzt ausgefuehrte Aktion gewinnt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;

use vouch_core::{
    DeviceId, DialogDecision, SasAction, SasChannel, SasEvent, ShortCode, UserId,
    VerificationDialog, VerificationOutcome,
};

/// Zustand einer laufenden SAS-Verifikation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SasZustand {
    Gestartet,
    Angenommen,
    KurzcodeAngezeigt(ShortCode),
    Bestaetigt,
    Verifiziert,
    Abgebrochen(String),
}

impl SasZustand {
    pub fn ist_endzustand(&self) -> bool {
        matches!(self, Self::Verifiziert | Self::Abgebrochen(_))
    }

    /// Uebergang bei einem Ereignis des Gegenuebers
    ///
    /// `Err` bei einem Ereignis das im aktuellen Zustand nicht erlaubt ist.
    pub fn uebergang(self, ereignis: SasEvent) -> Result<Self, String> {
        match (self, ereignis) {
            (zustand, _) if zustand.ist_endzustand() => {
                Err(format!("verification already finished ({zustand:?})"))
            }
            (_, SasEvent::Cancelled { reason }) => Ok(Self::Abgebrochen(reason)),
            (Self::Gestartet, SasEvent::Accepted) => Ok(Self::Angenommen),
            (Self::Gestartet | Self::Angenommen, SasEvent::KeysExchanged(code)) => {
                Ok(Self::KurzcodeAngezeigt(code))
            }
            (Self::Bestaetigt, SasEvent::MacVerified) => Ok(Self::Verifiziert),
            (zustand, ereignis) => Err(format!(
                "unexpected event {} in state {}",
                ereignis_name(&ereignis),
                zustand.name()
            )),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Gestartet => "started",
            Self::Angenommen => "accepted",
            Self::KurzcodeAngezeigt(_) => "short code shown",
            Self::Bestaetigt => "confirmed",
            Self::Verifiziert => "verified",
            Self::Abgebrochen(_) => "cancelled",
        }
    }
}

fn ereignis_name(ereignis: &SasEvent) -> &'static str {
    match ereignis {
        SasEvent::Accepted => "accept",
        SasEvent::KeysExchanged(_) => "key",
        SasEvent::MacVerified => "mac",
        SasEvent::Cancelled { .. } => "cancel",
    }
}

/// Laufende Verifikationen, je Geraet hoechstens eine
#[derive(Default)]
pub struct VerificationRegistry {
    laufend: DashMap<(UserId, DeviceId), (u64, watch::Sender<Option<String>>)>,
    naechste_id: AtomicU64,
}

/// Eintrag einer laufenden Verifikation
pub struct VerificationHandle {
    schluessel: (UserId, DeviceId),
    id: u64,
    abbruch: watch::Receiver<Option<String>>,
}

impl VerificationRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Neue Verifikation eintragen, eine aeltere fuer dasselbe Geraet wird abgebrochen
    pub fn registrieren(&self, user_id: &UserId, device_id: &DeviceId) -> VerificationHandle {
        let id = self.naechste_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        let schluessel = (user_id.clone(), device_id.clone());
        if let Some((_, (_, alt))) = self.laufend.remove(&schluessel) {
            let _ = alt.send(Some("superseded by a new verification".into()));
        }
        self.laufend.insert(schluessel.clone(), (id, tx));
        VerificationHandle {
            schluessel,
            id,
            abbruch: rx,
        }
    }

    /// Laufende Verifikation eines Geraets abbrechen
    ///
    /// Gibt `true` zurueck wenn eine Verifikation lief.
    pub fn abbrechen(&self, user_id: &UserId, device_id: &DeviceId, grund: &str) -> bool {
        match self.laufend.remove(&(user_id.clone(), device_id.clone())) {
            Some((_, (_, tx))) => {
                tracing::info!(
                    user_id = %user_id,
                    device_id = %device_id,
                    grund,
                    "Laufende Verifikation abgebrochen"
                );
                let _ = tx.send(Some(grund.to_string()));
                true
            }
            None => false,
        }
    }

    /// Eintrag entfernen, sofern er noch zu diesem Handle gehoert
    pub fn entfernen(&self, handle: &VerificationHandle) {
        self.laufend
            .remove_if(&handle.schluessel, |_, (id, _)| *id == handle.id);
    }

    pub fn laeuft(&self, user_id: &UserId, device_id: &DeviceId) -> bool {
        self.laufend
            .contains_key(&(user_id.clone(), device_id.clone()))
    }
}

impl VerificationHandle {
    /// Wartet bis die Verifikation von aussen abgebrochen wird
    async fn abgebrochen(&mut self) -> String {
        loop {
            let grund = self.abbruch.borrow_and_update().as_ref().cloned();
            if let Some(grund) = grund {
                return grund;
            }
            if self.abbruch.changed().await.is_err() {
                return "verification was aborted".to_string();
            }
        }
    }
}

/// Fuehrt eine SAS-Verifikation bis zum Ende durch
///
/// Nach `zeitlimit` ohne Abschluss wird abgebrochen und dem Gegenueber
/// ein Cancel gesendet.
pub async fn sas_durchfuehren(
    kanal: &mut dyn SasChannel,
    dialog: &mut dyn VerificationDialog,
    handle: &mut VerificationHandle,
    zeitlimit: Duration,
) -> VerificationOutcome {
    let ergebnis =
        tokio::time::timeout(zeitlimit, sas_schritte(kanal, dialog, handle)).await;
    match ergebnis {
        Ok(Abschluss::Fertig(outcome)) => outcome,
        Ok(Abschluss::Abbrechen(grund)) => {
            if let Err(e) = kanal.send(SasAction::Cancel { reason: grund.clone() }).await {
                tracing::warn!(fehler = %e, "Cancel konnte nicht gesendet werden");
            }
            VerificationOutcome::Cancelled(grund)
        }
        Ok(Abschluss::Protokollfehler(grund)) => {
            if let Err(e) = kanal.send(SasAction::Cancel { reason: grund.clone() }).await {
                tracing::warn!(fehler = %e, "Cancel konnte nicht gesendet werden");
            }
            VerificationOutcome::Failed(grund)
        }
        Err(_) => {
            tracing::info!(?zeitlimit, "Verifikation: Zeitlimit erreicht");
            let _ = kanal
                .send(SasAction::Cancel {
                    reason: "timed out".into(),
                })
                .await;
            VerificationOutcome::TimedOut
        }
    }
}

enum Abschluss {
    Fertig(VerificationOutcome),
    /// Lokaler Abbruch, Gegenueber muss benachrichtigt werden
    Abbrechen(String),
    Protokollfehler(String),
}

async fn sas_schritte(
    kanal: &mut dyn SasChannel,
    dialog: &mut dyn VerificationDialog,
    handle: &mut VerificationHandle,
) -> Abschluss {
    let mut zustand = SasZustand::Gestartet;
    dialog.status("Waiting for the other device to accept the request");

    loop {
        let ereignis = tokio::select! {
            ereignis = kanal.next_event() => ereignis,
            grund = handle.abgebrochen() => return Abschluss::Abbrechen(grund),
        };
        let ereignis = match ereignis {
            Ok(e) => e,
            Err(e) => return Abschluss::Fertig(VerificationOutcome::Failed(e.to_string())),
        };
        tracing::debug!(event = ereignis_name(&ereignis), zustand = zustand.name(), "SAS-Ereignis");

        zustand = match zustand.uebergang(ereignis) {
            Ok(z) => z,
            Err(grund) => return Abschluss::Protokollfehler(grund),
        };

        match &zustand {
            SasZustand::Angenommen => dialog.status("Request accepted, exchanging keys"),
            SasZustand::KurzcodeAngezeigt(code) => {
                let entscheidung = tokio::select! {
                    e = dialog.compare(code) => e,
                    grund = handle.abgebrochen() => return Abschluss::Abbrechen(grund),
                };
                match entscheidung {
                    DialogDecision::Match => {
                        if let Err(e) = kanal.send(SasAction::ConfirmMatch).await {
                            return Abschluss::Fertig(VerificationOutcome::Failed(e.to_string()));
                        }
                        zustand = SasZustand::Bestaetigt;
                        dialog.status("Waiting for the other device to confirm");
                    }
                    DialogDecision::Mismatch => {
                        return Abschluss::Abbrechen("short codes did not match".into())
                    }
                    DialogDecision::Cancel => {
                        return Abschluss::Abbrechen("cancelled by user".into())
                    }
                }
            }
            SasZustand::Verifiziert => return Abschluss::Fertig(VerificationOutcome::Verified),
            SasZustand::Abgebrochen(grund) => {
                return Abschluss::Fertig(VerificationOutcome::Cancelled(grund.clone()))
            }
            SasZustand::Gestartet | SasZustand::Bestaetigt => {}
        }
    }
}
