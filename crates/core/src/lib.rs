//! vouch-core – Gemeinsame Typen, Kollaborateur-Traits und Fehlertypen
//!
//! Dieses Crate stellt die Bausteine bereit, die zwischen der
//! Befehlsschicht (`vouch-commands`) und den externen Kollaborateuren
//! (Krypto-Engine, Verzeichnis/Homeserver, Trust-Store, UI) geteilt werden.
//!
//! ## Module
//! - `types` - ID-Newtypes, `Device`, `TrustState`
//! - `secret` - Geheimnis-Container (werden beim Drop genullt)
//! - `ssss` - Secret-Storage Schluessel und Metadaten
//! - `cross_signing` - Cross-Signing Schluesselsatz
//! - `session` - Exportierbare Gruppen-Sitzungen
//! - `uia` - User-Interactive-Authentication Typen
//! - `sas` - Ereignisse und Kurzcodes der SAS-Verifikation
//! - `traits` - Kollaborateur-Schnittstellen
//! - `event` - Event-Bus
//! - `error` - Fehlertypen der Kollaborateure

pub mod cross_signing;
pub mod error;
pub mod event;
pub mod sas;
pub mod secret;
pub mod session;
pub mod ssss;
pub mod traits;
pub mod types;
pub mod uia;

// Re-Exporte fuer bequemen Zugriff
pub use cross_signing::{
    CrossSigningKeySet, CrossSigningPublicKeys, KeyPair, ParsedPublishedKeys,
    PublishedCrossSigningKeys,
};
pub use error::{
    CryptoError, CryptoResult, DirectoryError, DirectoryResult, StoreError, StoreResult,
};
pub use event::{EventBus, EventReceiver, VerificationOutcome, VouchEvent};
pub use sas::{DialogDecision, SasAction, SasEvent, ShortCode};
pub use secret::{Secret, SecretBytes};
pub use session::{GroupSession, SessionImport};
pub use ssss::{
    EncryptedSecret, GeneratedSsssKey, PassphraseInfo, SsssKey, SsssKeyMetadata,
    ALGORITHM_AES_HMAC_SHA2, PASSPHRASE_ALGORITHM_PBKDF2,
};
pub use traits::{
    CryptoEngine, DirectoryClient, PasswordRequest, Reply, SasChannel, TrustStore, UserPrompt,
    VerificationDialog,
};
pub use types::{Device, DeviceId, OwnIdentity, RoomId, TrustState, UserId};
pub use uia::{AuthData, StageCredential, UiaChallenge, UiaFlow, AUTH_TYPE_PASSWORD};
