//! Gemeinsame Identifikationstypen und Geraete-Datensaetze
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Benutzer-, Geraete- und Raum-IDs zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Benutzer-ID (z.B. `@alice:example.org`)
    UserId
);
string_id!(
    /// Geraete-ID (z.B. `ABCDEFGHIJ`)
    DeviceId
);
string_id!(
    /// Raum-ID (z.B. `!abc:example.org`)
    RoomId
);

/// Eigene Konto-Identitaet (Benutzer + aktuelles Geraet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnIdentity {
    pub user_id: UserId,
    pub device_id: DeviceId,
}

/// Vertrauenszustand eines Geraets
///
/// Wechselt nur durch explizite Aktionen (verify, unverify, blacklist,
/// abgeschlossene SAS-Verifikation), nie implizit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TrustState {
    #[default]
    Unset,
    Verified,
    Blacklisted,
    CrossSigningVerified,
}

impl std::fmt::Display for TrustState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Unset => "unverified",
            Self::Verified => "verified",
            Self::Blacklisted => "blacklisted",
            Self::CrossSigningVerified => "cross-signing verified",
        };
        f.write_str(text)
    }
}

/// Ein bekanntes Geraet eines Benutzers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub user_id: UserId,
    pub device_id: DeviceId,
    /// Anzeigename des Geraets
    pub name: String,
    /// Curve25519 Identitaetsschluessel (Base64)
    pub identity_key: String,
    /// Ed25519 Signaturschluessel (Base64)
    pub signing_key: String,
    pub trust: TrustState,
    /// Geraet wurde vom Besitzer entfernt (wird weiterhin angezeigt)
    #[serde(default)]
    pub deleted: bool,
}

impl Device {
    /// Fingerprint zur Anzeige: Signaturschluessel in Vierergruppen
    pub fn fingerprint(&self) -> String {
        let chars: Vec<char> = self.signing_key.chars().collect();
        chars
            .chunks(4)
            .map(|gruppe| gruppe.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Kurzform `user/device (name)` fuer Antworten
    pub fn beschreibung(&self) -> String {
        format!("{}/{} ({})", self.user_id, self.device_id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geraet(signing_key: &str) -> Device {
        Device {
            user_id: "@alice:example.org".into(),
            device_id: "ABCDEF".into(),
            name: "Laptop".into(),
            identity_key: "curve".into(),
            signing_key: signing_key.into(),
            trust: TrustState::Unset,
            deleted: false,
        }
    }

    #[test]
    fn fingerprint_in_vierergruppen() {
        let d = geraet("abcdefghij");
        assert_eq!(d.fingerprint(), "abcd efgh ij");
    }

    #[test]
    fn fingerprint_leerer_schluessel() {
        assert_eq!(geraet("").fingerprint(), "");
    }

    #[test]
    fn trust_state_anzeige() {
        assert_eq!(TrustState::Unset.to_string(), "unverified");
        assert_eq!(TrustState::Verified.to_string(), "verified");
        assert_eq!(TrustState::Blacklisted.to_string(), "blacklisted");
    }

    #[test]
    fn ids_sind_serde_transparent() {
        let uid = UserId::new("@bob:example.org");
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, "\"@bob:example.org\"");
        let uid2: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(uid, uid2);
    }

    #[test]
    fn beschreibung_format() {
        assert_eq!(geraet("x").beschreibung(), "@alice:example.org/ABCDEF (Laptop)");
    }
}
