//! Event-Bus auf Basis von tokio-broadcast

use tokio::sync::broadcast::{self, error::TryRecvError};

use vouch_core::{EventBus, EventReceiver, VouchEvent};

const KAPAZITAET: usize = 256;

/// Broadcast-Bus: jeder Abonnent erhaelt jedes Ereignis ab Abo-Zeitpunkt
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    tx: broadcast::Sender<VouchEvent>,
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::neu()
    }
}

impl BroadcastEventBus {
    pub fn neu() -> Self {
        let (tx, _rx) = broadcast::channel(KAPAZITAET);
        Self { tx }
    }

    /// Empfaenger fuer asynchrones Warten auf Ereignisse
    pub fn receiver(&self) -> broadcast::Receiver<VouchEvent> {
        self.tx.subscribe()
    }
}

impl EventBus for BroadcastEventBus {
    fn senden(&self, event: VouchEvent) -> usize {
        tracing::trace!(?event, "Ereignis gesendet");
        // Ohne Abonnenten liefert send einen Fehler, das Ereignis verfaellt
        self.tx.send(event).unwrap_or(0)
    }

    fn abonnieren(&self) -> Box<dyn EventReceiver + Send> {
        Box::new(BroadcastReceiver {
            rx: self.tx.subscribe(),
        })
    }
}

struct BroadcastReceiver {
    rx: broadcast::Receiver<VouchEvent>,
}

impl EventReceiver for BroadcastReceiver {
    fn try_empfangen(&mut self) -> Option<VouchEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(verpasst)) => {
                    tracing::warn!(verpasst, "Event-Empfaenger ist zurueckgefallen");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ohne_abonnenten_null_empfaenger() {
        let bus = BroadcastEventBus::neu();
        let n = bus.senden(VouchEvent::DevicesChanged {
            user_id: "@a:x".into(),
        });
        assert_eq!(n, 0);
    }

    #[test]
    fn abonnent_erhaelt_ereignisse_in_reihenfolge() {
        let bus = BroadcastEventBus::neu();
        let mut rx = bus.abonnieren();
        bus.senden(VouchEvent::DevicesChanged {
            user_id: "@a:x".into(),
        });
        bus.senden(VouchEvent::OutboundSessionDiscarded {
            room_id: "!r:x".into(),
        });

        assert!(matches!(
            rx.try_empfangen(),
            Some(VouchEvent::DevicesChanged { .. })
        ));
        assert!(matches!(
            rx.try_empfangen(),
            Some(VouchEvent::OutboundSessionDiscarded { .. })
        ));
        assert!(rx.try_empfangen().is_none());
    }

    #[test]
    fn zurueckgefallener_empfaenger_liest_weiter() {
        let bus = BroadcastEventBus::neu();
        let mut rx = bus.abonnieren();
        for _ in 0..KAPAZITAET + 10 {
            bus.senden(VouchEvent::DevicesChanged {
                user_id: "@a:x".into(),
            });
        }
        let mut anzahl = 0;
        while rx.try_empfangen().is_some() {
            anzahl += 1;
        }
        assert_eq!(anzahl, KAPAZITAET);
    }
}
