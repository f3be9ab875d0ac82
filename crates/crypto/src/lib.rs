//! # vouch-crypto
//!
//! Software-Krypto-Engine fuer Vouch.
//!
//! ## Module
//! - `engine` - `SoftwareCryptoEngine` (implementiert `vouch_core::CryptoEngine`)
//! - `ssss` - Secret-Storage Schluessel, Pruefwert und Geheimnisse
//! - `recovery_key` - Base58-Kodierung des Recovery-Keys
//! - `cross_signing` - Ed25519 Cross-Signing Schluessel
//! - `export` - Passphrase-geschuetzter Sitzungs-Export
//! - `kdf` - HKDF, PBKDF2, Argon2id und Zufallswerte

pub mod cross_signing;
pub mod engine;
pub mod export;
pub mod kdf;
pub mod recovery_key;
pub mod ssss;

// Bequeme Re-Exports
pub use cross_signing::{schluesselsatz_generieren, SigningIdentity};
pub use engine::{SoftwareCryptoEngine, STANDARD_PBKDF2_ITERATIONEN};
pub use export::{ARMOR_BEGIN, ARMOR_END};
pub use kdf::{
    argon2_derive, hkdf_derive, pbkdf2_derive, Argon2Parameter, MAX_PBKDF2_ITERATIONEN,
};
