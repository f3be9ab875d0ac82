//! Secret-Storage (SSSS) Schluessel und Metadaten
//!
//! Die Metadaten liegen als Account-Daten auf dem Server. Welcher Schluessel
//! der Standard ist, wird separat gespeichert und ist nicht Teil der
//! Metadaten selbst.

use serde::{Deserialize, Serialize};

use crate::secret::{Secret, SecretBytes};

/// Einziger unterstuetzter Verschluesselungsalgorithmus
pub const ALGORITHM_AES_HMAC_SHA2: &str = "m.secret_storage.v1.aes-hmac-sha2";

/// Passphrase-Ableitung per PBKDF2
pub const PASSPHRASE_ALGORITHM_PBKDF2: &str = "m.pbkdf2";

fn standard_bits() -> u32 {
    256
}

/// Parameter der Passphrase-Ableitung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassphraseInfo {
    pub algorithm: String,
    pub salt: String,
    pub iterations: u32,
    #[serde(default = "standard_bits")]
    pub bits: u32,
}

/// Oeffentliche Metadaten eines SSSS-Schluessels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsssKeyMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<PassphraseInfo>,
    /// Pruefwert-IV (Base64)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    /// Pruefwert-MAC (Base64), bestaetigt dass ein Schluessel passt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

impl SsssKeyMetadata {
    /// true wenn der Schluessel aus einer PBKDF2-Passphrase abgeleitet wurde
    pub fn nutzt_pbkdf2_passphrase(&self) -> bool {
        self.passphrase
            .as_ref()
            .is_some_and(|p| p.algorithm == PASSPHRASE_ALGORITHM_PBKDF2)
    }

    pub fn algorithmus_unterstuetzt(&self) -> bool {
        self.algorithm == ALGORITHM_AES_HMAC_SHA2
    }
}

/// Entsperrter SSSS-Schluessel (rohes Schluesselmaterial)
#[derive(Debug, Clone)]
pub struct SsssKey {
    pub id: String,
    pub metadata: SsssKeyMetadata,
    pub key: SecretBytes,
}

/// Ergebnis einer Schluessel-Generierung
///
/// Der Recovery-Key wird dem Benutzer genau einmal angezeigt und danach
/// verworfen.
#[derive(Debug)]
pub struct GeneratedSsssKey {
    pub key: SsssKey,
    pub recovery_key: Secret,
}

/// Ein mit einem SSSS-Schluessel verschluesseltes Geheimnis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSecret {
    pub key_id: String,
    /// Nonce (Base64)
    pub iv: String,
    /// Chiffretext inkl. Auth-Tag (Base64)
    pub ciphertext: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(passphrase: Option<PassphraseInfo>) -> SsssKeyMetadata {
        SsssKeyMetadata {
            name: None,
            algorithm: ALGORITHM_AES_HMAC_SHA2.into(),
            passphrase,
            iv: None,
            mac: None,
        }
    }

    #[test]
    fn pbkdf2_erkennung() {
        assert!(!metadata(None).nutzt_pbkdf2_passphrase());
        let pbkdf2 = PassphraseInfo {
            algorithm: PASSPHRASE_ALGORITHM_PBKDF2.into(),
            salt: "salz".into(),
            iterations: 10,
            bits: 256,
        };
        assert!(metadata(Some(pbkdf2.clone())).nutzt_pbkdf2_passphrase());

        let anderer = PassphraseInfo {
            algorithm: "m.scrypt".into(),
            ..pbkdf2
        };
        assert!(!metadata(Some(anderer)).nutzt_pbkdf2_passphrase());
    }

    #[test]
    fn bits_standardwert_beim_parsen() {
        let json = r#"{"algorithm":"m.pbkdf2","salt":"abc","iterations":5}"#;
        let info: PassphraseInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.bits, 256);
    }

    #[test]
    fn unbekannter_algorithmus() {
        let mut m = metadata(None);
        assert!(m.algorithmus_unterstuetzt());
        m.algorithm = "m.secret_storage.v2.foo".into();
        assert!(!m.algorithmus_unterstuetzt());
    }
}
