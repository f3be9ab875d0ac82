//! Exportierbare Gruppen-Sitzungen (eingehende Megolm-Sitzungen)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::RoomId;

/// Eine eingehende Gruppen-Sitzung im Exportformat
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSession {
    pub algorithm: String,
    pub room_id: RoomId,
    pub sender_key: String,
    pub session_id: String,
    /// Exportierter Sitzungsschluessel (Base64)
    pub session_key: String,
    #[serde(default)]
    pub sender_claimed_keys: BTreeMap<String, String>,
    #[serde(default)]
    pub forwarding_curve25519_key_chain: Vec<String>,
}

impl GroupSession {
    /// Eindeutiger Schluessel einer Sitzung im Store
    pub fn schluessel(&self) -> (RoomId, String, String) {
        (
            self.room_id.clone(),
            self.sender_key.clone(),
            self.session_id.clone(),
        )
    }
}

/// Ergebnis des Entschluesselns einer Exportdatei
#[derive(Debug, Default)]
pub struct SessionImport {
    pub sessions: Vec<GroupSession>,
    /// Eintraege die nicht als Sitzung lesbar waren
    pub verworfen: usize,
}

impl SessionImport {
    /// Anzahl aller Eintraege in der Datei
    pub fn gesamt(&self) -> usize {
        self.sessions.len() + self.verworfen
    }
}

impl std::fmt::Debug for GroupSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupSession")
            .field("algorithm", &self.algorithm)
            .field("room_id", &self.room_id)
            .field("sender_key", &self.sender_key)
            .field("session_id", &self.session_id)
            .field("session_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_ohne_sitzungsschluessel() {
        let s = GroupSession {
            algorithm: "m.megolm.v1.aes-sha2".into(),
            room_id: "!raum:example.org".into(),
            sender_key: "sender".into(),
            session_id: "sid".into(),
            session_key: "GEHEIM".into(),
            sender_claimed_keys: BTreeMap::new(),
            forwarding_curve25519_key_chain: vec![],
        };
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("GEHEIM"));
        assert!(dbg.contains("sid"));
    }

    #[test]
    fn fehlende_optionale_felder_beim_parsen() {
        let json = r#"{"algorithm":"m.megolm.v1.aes-sha2","room_id":"!r:x","sender_key":"k","session_id":"s","session_key":"sk"}"#;
        let s: GroupSession = serde_json::from_str(json).unwrap();
        assert!(s.sender_claimed_keys.is_empty());
        assert!(s.forwarding_curve25519_key_chain.is_empty());
    }
}
