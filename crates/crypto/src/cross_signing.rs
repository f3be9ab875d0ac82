//! Cross-Signing Schluessel (Ed25519)
//!
//! Master-, Self-Signing- und User-Signing-Schluessel sind jeweils ein
//! Ed25519-Schluessel-Paar. Im Secret-Storage wird nur der 32-Byte-Seed
//! abgelegt; der oeffentliche Schluessel laesst sich daraus rekonstruieren.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use vouch_core::{CrossSigningKeySet, CryptoError, CryptoResult, KeyPair, SecretBytes};

/// Einzelner Cross-Signing Schluessel
pub struct SigningIdentity {
    signing_key: SigningKey,
}

impl SigningIdentity {
    /// Generiert ein neues Ed25519-Schluessel-Paar
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Stellt einen Schluessel aus seinem Seed wieder her
    pub fn from_seed(seed: &SecretBytes) -> CryptoResult<Self> {
        let bytes: &[u8; 32] = seed.as_bytes().try_into().map_err(|_| {
            CryptoError::UngueltigeDaten(format!(
                "cross-signing seed must be 32 bytes, got {}",
                seed.len()
            ))
        })?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(bytes),
        })
    }

    /// Oeffentlicher Schluessel (Base64 ohne Padding)
    pub fn public_key(&self) -> String {
        STANDARD_NO_PAD.encode(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.signing_key.sign(data).to_bytes().to_vec()
    }

    /// Verifiziert eine Signatur gegen einen Base64-kodierten Schluessel
    pub fn verify(data: &[u8], signature_bytes: &[u8], public_key: &str) -> bool {
        let Ok(key_bytes) = STANDARD_NO_PAD.decode(public_key) else {
            return false;
        };
        let Ok(key_array) = <[u8; 32]>::try_from(key_bytes.as_slice()) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&key_array) else {
            return false;
        };
        let Ok(sig_array) = signature_bytes.try_into() else {
            return false;
        };
        let signature = Signature::from_bytes(sig_array);
        verifying_key.verify(data, &signature).is_ok()
    }

    pub fn key_pair(&self) -> KeyPair {
        KeyPair {
            public_key: self.public_key(),
            seed: SecretBytes::new(self.signing_key.to_bytes().to_vec()),
        }
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningIdentity {{ public_key: {} }}", self.public_key())
    }
}

/// Erzeugt einen vollstaendigen Satz aus drei unabhaengigen Schluesseln
pub fn schluesselsatz_generieren() -> CrossSigningKeySet {
    CrossSigningKeySet {
        master: SigningIdentity::generate().key_pair(),
        self_signing: SigningIdentity::generate().key_pair(),
        user_signing: SigningIdentity::generate().key_pair(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satz_enthaelt_drei_verschiedene_schluessel() {
        let satz = schluesselsatz_generieren();
        let public = satz.public_keys();
        assert_ne!(public.master, public.self_signing);
        assert_ne!(public.master, public.user_signing);
        assert_ne!(public.self_signing, public.user_signing);
        assert_eq!(satz.master.seed.len(), 32);
    }

    #[test]
    fn seed_roundtrip() {
        let identity = SigningIdentity::generate();
        let paar = identity.key_pair();
        let restored = SigningIdentity::from_seed(&paar.seed).unwrap();
        assert_eq!(restored.public_key(), paar.public_key);
    }

    #[test]
    fn ungueltige_seed_laenge() {
        let err = SigningIdentity::from_seed(&SecretBytes::new(vec![0u8; 31])).unwrap_err();
        assert!(matches!(err, CryptoError::UngueltigeDaten(_)));
    }

    #[test]
    fn signieren_und_verifizieren() {
        let identity = SigningIdentity::generate();
        let data = b"Geraeteschluessel";
        let signature = identity.sign(data);
        assert_eq!(signature.len(), 64);
        assert!(SigningIdentity::verify(data, &signature, &identity.public_key()));
        assert!(!SigningIdentity::verify(b"anders", &signature, &identity.public_key()));
    }

    #[test]
    fn verschiedene_keys_ablehnen() {
        let id1 = SigningIdentity::generate();
        let id2 = SigningIdentity::generate();
        let sig = id1.sign(b"Testdaten");
        assert!(!SigningIdentity::verify(b"Testdaten", &sig, &id2.public_key()));
    }

    #[test]
    fn debug_ohne_seed() {
        let identity = SigningIdentity::generate();
        let dbg = format!("{identity:?}");
        assert!(dbg.contains(&identity.public_key()));
    }
}
