//! In-Memory Trust-Store mit optionaler JSON-Persistenz
//!
//! Haelt Geraete, eingehende Gruppen-Sitzungen und die ausgehende Sitzung
//! pro Raum. Mit `laden` wird ein Schnappschuss-Pfad angegeben; danach wird
//! jede Aenderung sofort auf Disk geschrieben.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use vouch_core::{
    Device, DeviceId, GroupSession, RoomId, StoreResult, TrustStore, UserId,
};

use crate::snapshot;

/// Einziger akzeptierter Sitzungs-Algorithmus
pub const MEGOLM_ALGORITHM: &str = "m.megolm.v1.aes-sha2";

type SitzungsSchluessel = (RoomId, String, String);

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreSnapshot {
    #[serde(default)]
    devices: Vec<Device>,
    #[serde(default)]
    group_sessions: Vec<GroupSession>,
    /// Raum -> ID der ausgehenden Sitzung
    #[serde(default)]
    outbound_sessions: BTreeMap<RoomId, String>,
}

/// Trust-Store im Speicher
#[derive(Debug, Default)]
pub struct MemoryTrustStore {
    /// Geraete pro Benutzer (device_id -> Device)
    geraete: DashMap<UserId, BTreeMap<DeviceId, Device>>,
    eingehend: DashMap<SitzungsSchluessel, GroupSession>,
    ausgehend: DashMap<RoomId, String>,
    datei: Option<PathBuf>,
    /// Serialisiert Schnappschuss-Schreibvorgaenge
    schreib_sperre: tokio::sync::Mutex<()>,
}

impl MemoryTrustStore {
    /// Fluechtiger Store ohne Persistenz
    pub fn new() -> Self {
        Self::default()
    }

    /// Store mit Schnappschuss-Datei (wird angelegt falls nicht vorhanden)
    pub async fn laden(pfad: impl AsRef<Path>) -> StoreResult<Self> {
        let pfad = pfad.as_ref().to_path_buf();
        let snapshot: StoreSnapshot = snapshot::laden(&pfad).await?.unwrap_or_default();

        let store = Self {
            datei: Some(pfad),
            ..Self::default()
        };
        for device in snapshot.devices {
            store
                .geraete
                .entry(device.user_id.clone())
                .or_default()
                .insert(device.device_id.clone(), device);
        }
        for session in snapshot.group_sessions {
            store.eingehend.insert(session.schluessel(), session);
        }
        for (room_id, session_id) in snapshot.outbound_sessions {
            store.ausgehend.insert(room_id, session_id);
        }
        tracing::info!(
            benutzer = store.geraete.len(),
            sitzungen = store.eingehend.len(),
            "Trust-Store geladen"
        );
        Ok(store)
    }

    /// Registriert die ausgehende Sitzung eines Raums
    pub async fn outbound_session_setzen(
        &self,
        room_id: &RoomId,
        session_id: impl Into<String>,
    ) -> StoreResult<()> {
        self.ausgehend.insert(room_id.clone(), session_id.into());
        self.speichern().await
    }

    /// ID der ausgehenden Sitzung eines Raums
    pub fn outbound_session(&self, room_id: &RoomId) -> Option<String> {
        self.ausgehend.get(room_id).map(|s| s.value().clone())
    }

    async fn speichern(&self) -> StoreResult<()> {
        let Some(pfad) = &self.datei else {
            return Ok(());
        };
        let _sperre = self.schreib_sperre.lock().await;

        let mut snapshot = StoreSnapshot::default();
        for eintrag in self.geraete.iter() {
            snapshot.devices.extend(eintrag.value().values().cloned());
        }
        snapshot.devices.sort_by(|a, b| {
            (&a.user_id, &a.device_id).cmp(&(&b.user_id, &b.device_id))
        });
        snapshot.group_sessions = self.eingehend.iter().map(|e| e.value().clone()).collect();
        snapshot
            .group_sessions
            .sort_by(|a, b| a.schluessel().cmp(&b.schluessel()));
        snapshot.outbound_sessions = self
            .ausgehend
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        snapshot::schreiben(pfad, &snapshot).await?;
        Ok(())
    }
}

fn sitzung_gueltig(session: &GroupSession) -> bool {
    session.algorithm == MEGOLM_ALGORITHM
        && !session.session_id.is_empty()
        && !session.session_key.is_empty()
        && !session.sender_key.is_empty()
}

impl TrustStore for MemoryTrustStore {
    async fn device(&self, user_id: &UserId, device_id: &DeviceId) -> StoreResult<Option<Device>> {
        Ok(self
            .geraete
            .get(user_id)
            .and_then(|geraete| geraete.get(device_id).cloned()))
    }

    async fn devices(&self, user_id: &UserId) -> StoreResult<Vec<Device>> {
        Ok(self
            .geraete
            .get(user_id)
            .map(|geraete| geraete.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn put_devices(&self, user_id: &UserId, devices: Vec<Device>) -> StoreResult<()> {
        {
            let mut bekannt = self.geraete.entry(user_id.clone()).or_default();
            let mut neu = BTreeMap::new();
            for mut device in devices {
                if let Some(alt) = bekannt.get(&device.device_id) {
                    device.trust = alt.trust;
                }
                device.deleted = false;
                neu.insert(device.device_id.clone(), device);
            }
            // Nicht mehr gemeldete Geraete bleiben als geloescht sichtbar
            for (id, mut alt) in std::mem::take(&mut *bekannt) {
                if !neu.contains_key(&id) {
                    alt.deleted = true;
                    neu.insert(id, alt);
                }
            }
            *bekannt = neu;
        }
        tracing::debug!(user = %user_id, "Geraeteliste aktualisiert");
        self.speichern().await
    }

    async fn put_device(&self, device: &Device) -> StoreResult<()> {
        self.geraete
            .entry(device.user_id.clone())
            .or_default()
            .insert(device.device_id.clone(), device.clone());
        tracing::debug!(device = %device.beschreibung(), trust = %device.trust, "Geraet gespeichert");
        self.speichern().await
    }

    async fn all_group_sessions(&self) -> StoreResult<Vec<GroupSession>> {
        let mut sessions: Vec<GroupSession> =
            self.eingehend.iter().map(|e| e.value().clone()).collect();
        sessions.sort_by(|a, b| a.schluessel().cmp(&b.schluessel()));
        Ok(sessions)
    }

    async fn group_sessions_for_room(&self, room_id: &RoomId) -> StoreResult<Vec<GroupSession>> {
        let mut sessions: Vec<GroupSession> = self
            .eingehend
            .iter()
            .filter(|e| &e.key().0 == room_id)
            .map(|e| e.value().clone())
            .collect();
        sessions.sort_by(|a, b| a.schluessel().cmp(&b.schluessel()));
        Ok(sessions)
    }

    async fn add_group_session(&self, session: GroupSession) -> StoreResult<bool> {
        if !sitzung_gueltig(&session) {
            tracing::debug!(session_id = %session.session_id, "Ungueltige Sitzung abgelehnt");
            return Ok(false);
        }
        let eingefuegt = match self.eingehend.entry(session.schluessel()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(platz) => {
                platz.insert(session);
                true
            }
        };
        if eingefuegt {
            self.speichern().await?;
        }
        Ok(eingefuegt)
    }

    async fn remove_outbound_group_session(&self, room_id: &RoomId) -> StoreResult<bool> {
        let entfernt = self.ausgehend.remove(room_id).is_some();
        if entfernt {
            tracing::info!(room = %room_id, "Ausgehende Gruppen-Sitzung verworfen");
            self.speichern().await?;
        }
        Ok(entfernt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_core::TrustState;

    fn geraet(id: &str, name: &str) -> Device {
        Device {
            user_id: "@alice:example.org".into(),
            device_id: id.into(),
            name: name.into(),
            identity_key: format!("ik-{id}"),
            signing_key: format!("sk-{id}"),
            trust: TrustState::Unset,
            deleted: false,
        }
    }

    fn sitzung(raum: &str, id: &str) -> GroupSession {
        GroupSession {
            algorithm: MEGOLM_ALGORITHM.into(),
            room_id: raum.into(),
            sender_key: "curve".into(),
            session_id: id.into(),
            session_key: "key".into(),
            sender_claimed_keys: Default::default(),
            forwarding_curve25519_key_chain: vec![],
        }
    }

    #[tokio::test]
    async fn put_devices_behaelt_vertrauen() {
        let store = MemoryTrustStore::new();
        let user: UserId = "@alice:example.org".into();
        let mut a = geraet("AAAA", "Laptop");
        a.trust = TrustState::Verified;
        store.put_device(&a).await.unwrap();

        let mut vom_server = geraet("AAAA", "Laptop neu");
        vom_server.trust = TrustState::Unset;
        store
            .put_devices(&user, vec![vom_server, geraet("BBBB", "Handy")])
            .await
            .unwrap();

        let a = store.device(&user, &"AAAA".into()).await.unwrap().unwrap();
        assert_eq!(a.trust, TrustState::Verified);
        assert_eq!(a.name, "Laptop neu");
        assert_eq!(store.devices(&user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn verschwundene_geraete_werden_als_geloescht_markiert() {
        let store = MemoryTrustStore::new();
        let user: UserId = "@alice:example.org".into();
        store
            .put_devices(&user, vec![geraet("AAAA", "Laptop"), geraet("BBBB", "Handy")])
            .await
            .unwrap();
        store.put_devices(&user, vec![geraet("AAAA", "Laptop")]).await.unwrap();

        let b = store.device(&user, &"BBBB".into()).await.unwrap().unwrap();
        assert!(b.deleted);
        let a = store.device(&user, &"AAAA".into()).await.unwrap().unwrap();
        assert!(!a.deleted);
    }

    #[tokio::test]
    async fn unbekanntes_geraet() {
        let store = MemoryTrustStore::new();
        let gefunden = store
            .device(&"@bob:example.org".into(), &"XXXX".into())
            .await
            .unwrap();
        assert!(gefunden.is_none());
        assert!(store.devices(&"@bob:example.org".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn doppelte_sitzung_abgelehnt() {
        let store = MemoryTrustStore::new();
        assert!(store.add_group_session(sitzung("!r:x", "s1")).await.unwrap());
        assert!(!store.add_group_session(sitzung("!r:x", "s1")).await.unwrap());
        assert!(store.add_group_session(sitzung("!r:x", "s2")).await.unwrap());
        assert_eq!(store.all_group_sessions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn fremder_algorithmus_abgelehnt() {
        let store = MemoryTrustStore::new();
        let mut s = sitzung("!r:x", "s1");
        s.algorithm = "m.olm.v1.curve25519-aes-sha2".into();
        assert!(!store.add_group_session(s).await.unwrap());
        let mut leer = sitzung("!r:x", "s2");
        leer.session_key.clear();
        assert!(!store.add_group_session(leer).await.unwrap());
    }

    #[tokio::test]
    async fn sitzungen_pro_raum() {
        let store = MemoryTrustStore::new();
        store.add_group_session(sitzung("!a:x", "s1")).await.unwrap();
        store.add_group_session(sitzung("!b:x", "s2")).await.unwrap();
        store.add_group_session(sitzung("!a:x", "s3")).await.unwrap();

        let raum_a = store.group_sessions_for_room(&"!a:x".into()).await.unwrap();
        assert_eq!(raum_a.len(), 2);
        assert!(raum_a.iter().all(|s| s.room_id.as_str() == "!a:x"));
        assert!(store
            .group_sessions_for_room(&"!c:x".into())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn ausgehende_sitzung_entfernen() {
        let store = MemoryTrustStore::new();
        let raum: RoomId = "!r:x".into();
        assert!(!store.remove_outbound_group_session(&raum).await.unwrap());

        store.outbound_session_setzen(&raum, "out1").await.unwrap();
        assert_eq!(store.outbound_session(&raum).as_deref(), Some("out1"));
        assert!(store.remove_outbound_group_session(&raum).await.unwrap());
        assert!(store.outbound_session(&raum).is_none());
    }
}
