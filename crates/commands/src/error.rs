//! Fehlertypen fuer die Vouch-Befehle
//!
//! Jeder Fehler beendet genau einen Befehlsaufruf. Der Dispatcher sendet
//! den Anzeigetext als einzige Antwort an den Benutzer.

use thiserror::Error;

use vouch_core::{CryptoError, DirectoryError, StoreError};

/// Fehlerklasse fuer Aufrufer und Tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FehlerKategorie {
    /// Fehlende oder ungueltige Argumente
    Usage,
    /// Geraet, Schluessel-Metadaten oder veroeffentlichte Schluessel fehlen
    NotFound,
    /// Benutzer hat eine Eingabe abgebrochen
    Cancelled,
    /// Falsche Passphrase, ungueltiger Recovery-Key, abweichender Fingerprint
    Verification,
    /// Netzwerk- oder Serverfehler
    Transport,
    /// Nicht unterstuetzte Stufe, Algorithmus oder Option
    Unsupported,
    /// Lokaler Speicher, Dateisystem oder Krypto-Engine
    Intern,
}

/// Alle moeglichen Fehler eines Befehls
#[derive(Debug, Error)]
pub enum CommandError {
    /// Anzeigetext ist die Usage-Zeile bzw. der Hilfetext
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    NichtGefunden(String),

    #[error("{0}")]
    Abgebrochen(String),

    #[error("{0}")]
    Verifikation(String),

    #[error("{kontext}: {quelle}")]
    Transport {
        kontext: String,
        quelle: DirectoryError,
    },

    #[error("{0}")]
    NichtUnterstuetzt(String),

    #[error("{kontext}: {quelle}")]
    Store { kontext: String, quelle: StoreError },

    #[error("{kontext}: {quelle}")]
    Krypto { kontext: String, quelle: CryptoError },

    #[error("{kontext}: {quelle}")]
    Io {
        kontext: String,
        quelle: std::io::Error,
    },
}

pub type CommandResult<T> = Result<T, CommandError>;

impl CommandError {
    pub fn kategorie(&self) -> FehlerKategorie {
        match self {
            Self::Usage(_) => FehlerKategorie::Usage,
            Self::NichtGefunden(_) => FehlerKategorie::NotFound,
            Self::Transport { quelle, .. } if quelle.ist_nicht_gefunden() => {
                FehlerKategorie::NotFound
            }
            Self::Abgebrochen(_) => FehlerKategorie::Cancelled,
            Self::Verifikation(_) => FehlerKategorie::Verification,
            Self::Transport { .. } => FehlerKategorie::Transport,
            Self::NichtUnterstuetzt(_) => FehlerKategorie::Unsupported,
            Self::Krypto {
                quelle: CryptoError::NichtUnterstuetzt(_),
                ..
            } => FehlerKategorie::Unsupported,
            Self::Store { .. } | Self::Krypto { .. } | Self::Io { .. } => FehlerKategorie::Intern,
        }
    }
}

/// Haengt einen Kontext-Text an Kollaborateur-Fehler an
pub trait MitKontext<T> {
    fn mit_kontext(self, kontext: impl Into<String>) -> CommandResult<T>;
}

impl<T> MitKontext<T> for Result<T, DirectoryError> {
    fn mit_kontext(self, kontext: impl Into<String>) -> CommandResult<T> {
        self.map_err(|quelle| CommandError::Transport {
            kontext: kontext.into(),
            quelle,
        })
    }
}

impl<T> MitKontext<T> for Result<T, StoreError> {
    fn mit_kontext(self, kontext: impl Into<String>) -> CommandResult<T> {
        self.map_err(|quelle| CommandError::Store {
            kontext: kontext.into(),
            quelle,
        })
    }
}

impl<T> MitKontext<T> for Result<T, CryptoError> {
    fn mit_kontext(self, kontext: impl Into<String>) -> CommandResult<T> {
        self.map_err(|quelle| CommandError::Krypto {
            kontext: kontext.into(),
            quelle,
        })
    }
}

impl<T> MitKontext<T> for Result<T, std::io::Error> {
    fn mit_kontext(self, kontext: impl Into<String>) -> CommandResult<T> {
        self.map_err(|quelle| CommandError::Io {
            kontext: kontext.into(),
            quelle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anzeigetext_mit_kontext() {
        let r: Result<(), DirectoryError> = Err(DirectoryError::Transport("timeout".into()));
        let e = r.mit_kontext("Failed to query own keys").unwrap_err();
        assert_eq!(e.to_string(), "Failed to query own keys: request failed: timeout");
        assert_eq!(e.kategorie(), FehlerKategorie::Transport);
    }

    #[test]
    fn nicht_gefunden_vom_server() {
        let r: Result<(), DirectoryError> = Err(DirectoryError::NichtGefunden("key".into()));
        let e = r.mit_kontext("Failed to get key data").unwrap_err();
        assert_eq!(e.kategorie(), FehlerKategorie::NotFound);
    }

    #[test]
    fn kategorien() {
        assert_eq!(
            CommandError::Usage("Usage: /devices <user id>".into()).kategorie(),
            FehlerKategorie::Usage
        );
        assert_eq!(
            CommandError::Abgebrochen("Passphrase entry cancelled".into()).kategorie(),
            FehlerKategorie::Cancelled
        );
        let krypto: Result<(), CryptoError> =
            Err(CryptoError::NichtUnterstuetzt("sas".into()));
        assert_eq!(
            krypto.mit_kontext("x").unwrap_err().kategorie(),
            FehlerKategorie::Unsupported
        );
        let store: Result<(), StoreError> = Err(StoreError::Backend("disk full".into()));
        let e = store.mit_kontext("Failed to save device").unwrap_err();
        assert_eq!(e.to_string(), "Failed to save device: storage backend failure: disk full");
        assert_eq!(e.kategorie(), FehlerKategorie::Intern);
    }
}
