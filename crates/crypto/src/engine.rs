//! Software-Implementierung der Krypto-Engine

use vouch_core::{
    CrossSigningKeySet, CryptoEngine, CryptoError, CryptoResult, Device, EncryptedSecret,
    GeneratedSsssKey, GroupSession, KeyPair, SasChannel, Secret, SecretBytes, SessionImport,
    SsssKey, SsssKeyMetadata,
};

use crate::cross_signing::{schluesselsatz_generieren, SigningIdentity};
use crate::kdf::Argon2Parameter;
use crate::{export, recovery_key, ssss};

/// Standard-Iterationen fuer neue Passphrase-Schluessel
pub const STANDARD_PBKDF2_ITERATIONEN: u32 = 500_000;

/// Lokale Krypto-Engine ohne Geraete-Transport
///
/// Interaktive SAS-Verifikation braucht einen to-device Kanal zum
/// Gegenueber und wird daher nicht unterstuetzt.
#[derive(Debug, Clone)]
pub struct SoftwareCryptoEngine {
    pbkdf2_iterationen: u32,
    export_parameter: Argon2Parameter,
}

impl Default for SoftwareCryptoEngine {
    fn default() -> Self {
        Self {
            pbkdf2_iterationen: STANDARD_PBKDF2_ITERATIONEN,
            export_parameter: Argon2Parameter::default(),
        }
    }
}

impl SoftwareCryptoEngine {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Iterationen fuer neu erzeugte Passphrase-Schluessel
    pub fn mit_pbkdf2_iterationen(mut self, iterationen: u32) -> Self {
        self.pbkdf2_iterationen = iterationen;
        self
    }

    /// Argon2-Parameter fuer neue Exportdateien
    pub fn mit_export_parametern(mut self, parameter: Argon2Parameter) -> Self {
        self.export_parameter = parameter;
        self
    }
}

impl CryptoEngine for SoftwareCryptoEngine {
    fn generate_ssss_key(&self, passphrase: Option<&Secret>) -> CryptoResult<GeneratedSsssKey> {
        let key = ssss::schluessel_erzeugen(passphrase, self.pbkdf2_iterationen)?;
        let recovery_key = recovery_key::kodieren(&key.key)?;
        tracing::debug!(key_id = %key.id, passphrase = passphrase.is_some(), "SSSS-Schluessel erzeugt");
        Ok(GeneratedSsssKey { key, recovery_key })
    }

    fn verify_passphrase(
        &self,
        key_id: &str,
        metadata: &SsssKeyMetadata,
        passphrase: &Secret,
    ) -> CryptoResult<SsssKey> {
        let key = ssss::aus_passphrase(metadata, passphrase)?;
        ssss::schluessel_pruefen(key_id, metadata, key)
    }

    fn verify_recovery_key(
        &self,
        key_id: &str,
        metadata: &SsssKeyMetadata,
        recovery_key: &Secret,
    ) -> CryptoResult<SsssKey> {
        let key = recovery_key::dekodieren(recovery_key)?;
        ssss::schluessel_pruefen(key_id, metadata, key)
    }

    fn encrypt_secret(
        &self,
        key: &SsssKey,
        name: &str,
        plaintext: &SecretBytes,
    ) -> CryptoResult<EncryptedSecret> {
        ssss::geheimnis_verschluesseln(key, name, plaintext)
    }

    fn decrypt_secret(
        &self,
        key: &SsssKey,
        name: &str,
        secret: &EncryptedSecret,
    ) -> CryptoResult<SecretBytes> {
        ssss::geheimnis_entschluesseln(key, name, secret)
    }

    fn generate_cross_signing_keys(&self) -> CryptoResult<CrossSigningKeySet> {
        Ok(schluesselsatz_generieren())
    }

    fn key_pair_from_seed(&self, seed: &SecretBytes) -> CryptoResult<KeyPair> {
        Ok(SigningIdentity::from_seed(seed)?.key_pair())
    }

    fn export_sessions(&self, passphrase: &Secret, sessions: &[GroupSession]) -> CryptoResult<Vec<u8>> {
        export::exportieren(passphrase, sessions, self.export_parameter)
    }

    fn import_sessions(&self, passphrase: &Secret, data: &[u8]) -> CryptoResult<SessionImport> {
        export::importieren(passphrase, data)
    }

    async fn start_sas(&self, device: &Device) -> CryptoResult<Box<dyn SasChannel>> {
        tracing::warn!(device = %device.beschreibung(), "SAS ohne Geraete-Transport angefragt");
        Err(CryptoError::NichtUnterstuetzt(
            "interactive verification needs a to-device transport".into(),
        ))
    }
}
