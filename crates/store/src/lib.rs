//! # vouch-store
//!
//! Lokale Implementierungen der Kollaborateure aus `vouch-core`.
//!
//! ## Module
//! - `trust_store` - Geraete und Gruppen-Sitzungen (`MemoryTrustStore`)
//! - `directory` - Homeserver-Ersatz mit Account-Daten und UIA (`LocalDirectory`)
//! - `bus` - Event-Bus via tokio-broadcast
//! - `password` - Argon2id-Hash des Konto-Passworts
//! - `snapshot` - JSON-Persistenz

pub mod bus;
pub mod directory;
pub mod password;
pub mod snapshot;
pub mod trust_store;

pub use bus::BroadcastEventBus;
pub use directory::LocalDirectory;
pub use trust_store::{MemoryTrustStore, MEGOLM_ALGORITHM};
