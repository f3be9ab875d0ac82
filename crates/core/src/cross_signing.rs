//! Cross-Signing Schluesselsatz
//!
//! Ein Satz besteht aus Master-, Self-Signing- und User-Signing-Schluessel.
//! Lokal gecachte Saetze sind immer vollstaendig; veroeffentlichte Saetze
//! duerfen den User-Signing-Schluessel auslassen.

use serde::{Deserialize, Serialize};

use crate::secret::SecretBytes;

/// Namen der Geheimnisse im Secret-Storage
pub const SECRET_MASTER: &str = "m.cross_signing.master";
pub const SECRET_SELF_SIGNING: &str = "m.cross_signing.self_signing";
pub const SECRET_USER_SIGNING: &str = "m.cross_signing.user_signing";

/// Asymmetrisches Schluessel-Paar (Ed25519)
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// Oeffentlicher Schluessel (Base64 ohne Padding)
    pub public_key: String,
    /// Privater Seed (32 Bytes)
    pub seed: SecretBytes,
}

/// Vollstaendiger privater Cross-Signing Schluesselsatz
#[derive(Debug, Clone)]
pub struct CrossSigningKeySet {
    pub master: KeyPair,
    pub self_signing: KeyPair,
    pub user_signing: KeyPair,
}

impl CrossSigningKeySet {
    pub fn public_keys(&self) -> CrossSigningPublicKeys {
        CrossSigningPublicKeys {
            master: self.master.public_key.clone(),
            self_signing: self.self_signing.public_key.clone(),
            user_signing: self.user_signing.public_key.clone(),
        }
    }

    /// Paare von (Geheimnis-Name, Schluessel) fuer Secret-Storage
    pub fn mit_secret_namen(&self) -> [(&'static str, &KeyPair); 3] {
        [
            (SECRET_MASTER, &self.master),
            (SECRET_SELF_SIGNING, &self.self_signing),
            (SECRET_USER_SIGNING, &self.user_signing),
        ]
    }
}

/// Oeffentliche Teile eines vollstaendigen Satzes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossSigningPublicKeys {
    pub master: String,
    pub self_signing: String,
    pub user_signing: String,
}

/// Antwort einer Schluesselabfrage: jeder Schluessel kann fehlen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedCrossSigningKeys {
    pub master: Option<String>,
    pub self_signing: Option<String>,
    pub user_signing: Option<String>,
}

/// Ausgewertete veroeffentlichte Schluessel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPublishedKeys {
    pub master: String,
    pub self_signing: String,
    /// Fehlt bei teilweise veroeffentlichten Saetzen
    pub user_signing: Option<String>,
}

impl PublishedCrossSigningKeys {
    /// Wertet die Abfrage aus
    ///
    /// Ohne Master- oder Self-Signing-Schluessel gilt der Satz als nicht
    /// vorhanden. Ein fehlender User-Signing-Schluessel ist zulaessig.
    pub fn auswerten(&self) -> Option<ParsedPublishedKeys> {
        let master = self.master.clone()?;
        let self_signing = self.self_signing.clone()?;
        Some(ParsedPublishedKeys {
            master,
            self_signing,
            user_signing: self.user_signing.clone(),
        })
    }
}

impl From<CrossSigningPublicKeys> for PublishedCrossSigningKeys {
    fn from(k: CrossSigningPublicKeys) -> Self {
        Self {
            master: Some(k.master),
            self_signing: Some(k.self_signing),
            user_signing: Some(k.user_signing),
        }
    }
}
