//! Event-Bus Trait-Definitionen
//!
//! Ueber den Bus werden abhaengige Subsysteme nach Vertrauensaenderungen
//! benachrichtigt (z.B. um ausgehende Gruppen-Sitzungen zu verwerfen, die
//! mit einem jetzt gesperrten Geraet geteilt wurden).
//! Die Implementierung erfolgt in `vouch-store` via tokio-broadcast.

use crate::types::{DeviceId, RoomId, UserId};
use serde::{Deserialize, Serialize};

/// Ergebnis einer interaktiven Verifikation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationOutcome {
    Verified,
    Cancelled(String),
    TimedOut,
    Failed(String),
}

/// Alle Ereignisse die ueber den Event-Bus fliessen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VouchEvent {
    /// Geraeteliste oder Vertrauenszustand eines Benutzers hat sich geaendert
    DevicesChanged { user_id: UserId },
    /// Ausgehende Gruppen-Sitzung eines Raums wurde verworfen
    OutboundSessionDiscarded { room_id: RoomId },
    /// Interaktive Verifikation ist beendet
    VerificationFinished {
        user_id: UserId,
        device_id: DeviceId,
        outcome: VerificationOutcome,
    },
}

/// Trait fuer den Event-Bus
pub trait EventBus: Send + Sync + 'static {
    /// Sendet ein Ereignis an alle Abonnenten
    ///
    /// Gibt die Anzahl der Empfaenger zurueck (0 wenn niemand abonniert hat).
    fn senden(&self, event: VouchEvent) -> usize;

    /// Abonniert alle zukuenftigen Ereignisse
    fn abonnieren(&self) -> Box<dyn EventReceiver + Send>;
}

/// Empfaenger-Seite eines Event-Bus-Abonnements
pub trait EventReceiver {
    /// Liefert das naechste bereits vorliegende Ereignis, ohne zu blockieren
    fn try_empfangen(&mut self) -> Option<VouchEvent>;
}
