//! Fehlertypen der Kollaborateure
//!
//! Jeder Kollaborateur (Trust-Store, Verzeichnis, Krypto-Engine) liefert
//! einen eigenen Fehler-Enum. Die Befehlsschicht ordnet diese in ihre
//! Taxonomie ein (nicht gefunden, Verifikation, Transport, ...).
//!
//! Die Anzeigetexte landen unveraendert in Antworten an den Benutzer.

use thiserror::Error;

use crate::uia::UiaChallenge;

/// Fehler des persistenten Trust-Stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("serialization failed: {0}")]
    Serialisierung(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fehler des Verzeichnis-Clients (Homeserver)
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Entspricht `M_NOT_FOUND` – erwarteter, meldbarer Zustand
    #[error("not found: {0}")]
    NichtGefunden(String),

    /// Der Server verlangt (weitere) interaktive Authentifizierung
    #[error("user-interactive authentication required")]
    UiaErforderlich(UiaChallenge),

    #[error("authentication failed: {0}")]
    AuthFehlgeschlagen(String),

    #[error("request failed: {0}")]
    Transport(String),
}

impl DirectoryError {
    pub fn ist_nicht_gefunden(&self) -> bool {
        matches!(self, Self::NichtGefunden(_))
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Fehler der Krypto-Engine
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Passphrase oder Recovery-Key passt nicht zu den Schluessel-Metadaten
    #[error("incorrect SSSS key")]
    FalscherSchluessel,

    /// Recovery-Key ist syntaktisch ungueltig (Base58, Praefix, Paritaet)
    #[error("invalid recovery key: {0}")]
    UngueltigerRecoveryKey(String),

    #[error("key generation failed: {0}")]
    SchluesselGenerierung(String),

    #[error("encryption failed: {0}")]
    Verschluesselung(String),

    #[error("decryption failed: {0}")]
    Entschluesselung(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid data: {0}")]
    UngueltigeDaten(String),

    #[error("unsupported: {0}")]
    NichtUnterstuetzt(String),

    #[error("verification failed: {0}")]
    Verifikation(String),

    #[error("serialization failed: {0}")]
    Serialisierung(#[from] serde_json::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
