//! # vouch-commands
//!
//! Befehlsschicht fuer E2EE-Vertrauensverwaltung: Geraete verifizieren
//! und sperren, Secret-Storage, Cross-Signing, Schluessel-Export.
//!
//! ## Module
//! - `parser` - Zeilen-Parser fuer Slash-Befehle
//! - `types` - Befehls-Enum inkl. Aliasse
//! - `dispatcher` - Zuordnung Befehl -> Workflow, Fehler als Antwort
//! - `device_trust` - verify / unverify / blacklist / devices / device
//! - `verification` - SAS-Zustandsautomat und laufende Verifikationen
//! - `secret_storage` - `/ssss` und Entsperren des Standardschluessels
//! - `cross_signing` - `/cross-signing` inkl. UIA
//! - `key_export` - import / export / export-room / reset-session
//! - `autocomplete` - Vervollstaendigung von Benutzer- und Geraete-IDs
//! - `error` - Fehler-Taxonomie

pub mod autocomplete;
pub mod context;
pub mod cross_signing;
pub mod device_trust;
pub mod dispatcher;
pub mod error;
pub mod key_export;
pub mod parser;
pub mod secret_storage;
pub mod types;
pub mod uia;
pub mod verification;

pub use autocomplete::Vervollstaendigung;
pub use context::{CommandContext, RoomContext, RoomMember};
pub use dispatcher::{Ausfuehrung, CommandDispatcher, CommandKonfig, STANDARD_SAS_ZEITLIMIT};
pub use error::{CommandError, CommandResult, FehlerKategorie};
pub use parser::{parse_line, ParsedCommand};
pub use types::Command;
pub use verification::{SasZustand, VerificationRegistry};
