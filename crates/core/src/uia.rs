//! User-Interactive-Authentication (UIA)
//!
//! Der Server kann privilegierte Aktionen (z.B. Veroeffentlichen der
//! Cross-Signing-Schluessel) mit einer Challenge beantworten. Der Client
//! muss dann einen der angebotenen Flows abschliessen.

use serde::{Deserialize, Serialize};

use crate::secret::Secret;
use crate::types::UserId;

/// Passwort-basierte Stufe
pub const AUTH_TYPE_PASSWORD: &str = "m.login.password";

/// Ein vom Server angebotener Flow (Folge von Stufen)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiaFlow {
    pub stages: Vec<String>,
}

/// Challenge des Servers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiaChallenge {
    pub session: String,
    pub flows: Vec<UiaFlow>,
    #[serde(default)]
    pub completed: Vec<String>,
}

impl UiaChallenge {
    /// true wenn ein Flow genau aus der angegebenen Stufe besteht
    pub fn hat_einstufigen_flow(&self, stufe: &str) -> bool {
        self.flows
            .iter()
            .any(|f| f.stages.len() == 1 && f.stages[0] == stufe)
    }

    /// Erste Stufe eines beliebigen einstufigen Flows
    pub fn erste_einzelstufe(&self) -> Option<&str> {
        self.flows
            .iter()
            .find(|f| f.stages.len() == 1)
            .map(|f| f.stages[0].as_str())
    }
}

/// Ergebnis des Authentifizierungs-Callbacks fuer eine Stufe
#[derive(Debug)]
pub enum StageCredential {
    Password { session: String, password: Secret },
    Fallback { session: String, stage: String },
    /// Abbruch oder keine unterstuetzte Stufe
    KeinNachweis,
}

/// An den Server gesendete Authentifizierungsdaten
#[derive(Debug, Clone)]
pub enum AuthData {
    Password {
        session: String,
        user: UserId,
        password: Secret,
    },
    Fallback {
        session: String,
        stage: String,
    },
}

impl AuthData {
    pub fn session(&self) -> &str {
        match self {
            Self::Password { session, .. } | Self::Fallback { session, .. } => session,
        }
    }
}
