//! Shell-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass die Shell ohne Konfigurationsdatei
//! lauffaehig ist.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use vouch_commands::{CommandKonfig, RoomContext, RoomMember};
use vouch_core::OwnIdentity;
use vouch_crypto::{Argon2Parameter, MAX_PBKDF2_ITERATIONEN, STANDARD_PBKDF2_ITERATIONEN};
use vouch_observability::{log_format_gueltig, log_level_gueltig};

/// Vollstaendige Shell-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VouchConfig {
    /// Eigenes Konto
    pub konto: KontoEinstellungen,
    /// Ablage der Schnappschuss-Dateien
    pub daten: DatenEinstellungen,
    /// Interaktive Verifikation
    pub verifikation: VerifikationsEinstellungen,
    /// Secret Storage
    pub ssss: SsssEinstellungen,
    /// Schluessel-Export
    pub export: ExportEinstellungen,
    /// Raum beim Start (fuer raumbezogene Befehle)
    pub raum: RaumEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Eigenes Konto
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KontoEinstellungen {
    pub user_id: String,
    pub device_id: String,
    /// Anzeigename des eigenen Geraets
    pub geraetename: String,
    /// Argon2 PHC-Hash des Konto-Passworts; aktiviert die Passwort-UIA
    pub passwort_hash: Option<String>,
}

impl Default for KontoEinstellungen {
    fn default() -> Self {
        Self {
            user_id: "@me:localhost".into(),
            device_id: "VOUCHSHELL".into(),
            geraetename: "vouch shell".into(),
            passwort_hash: None,
        }
    }
}

/// Ablage der Schnappschuss-Dateien
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenEinstellungen {
    /// Verzeichnis fuer Trust-Store und lokales Verzeichnis
    pub verzeichnis: PathBuf,
}

impl Default for DatenEinstellungen {
    fn default() -> Self {
        Self {
            verzeichnis: PathBuf::from("vouch-data"),
        }
    }
}

/// Interaktive Verifikation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifikationsEinstellungen {
    /// Zeitlimit einer SAS-Verifikation in Sekunden
    pub sas_timeout_secs: u64,
}

impl Default for VerifikationsEinstellungen {
    fn default() -> Self {
        Self {
            sas_timeout_secs: 120,
        }
    }
}

/// Secret Storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SsssEinstellungen {
    /// PBKDF2-Iterationen fuer neue Passphrase-Schluessel
    pub pbkdf2_iterationen: u32,
}

impl Default for SsssEinstellungen {
    fn default() -> Self {
        Self {
            pbkdf2_iterationen: STANDARD_PBKDF2_ITERATIONEN,
        }
    }
}

/// Argon2-Parameter fuer Exportdateien
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportEinstellungen {
    pub argon2_speicher_kib: u32,
    pub argon2_iterationen: u32,
}

impl Default for ExportEinstellungen {
    fn default() -> Self {
        let standard = Argon2Parameter::default();
        Self {
            argon2_speicher_kib: standard.speicher_kib,
            argon2_iterationen: standard.iterationen,
        }
    }
}

/// Raum beim Start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RaumEinstellungen {
    pub id: Option<String>,
    /// Benutzer-IDs der Mitglieder (fuer Autocomplete)
    pub mitglieder: Vec<String>,
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl VouchConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str::<Self>(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Konfigurationsdatei '{pfad}' nicht lesbar"))
            }
        };
        config.validieren()?;
        Ok(config)
    }

    /// Prueft Werte die serde allein nicht abdeckt
    pub fn validieren(&self) -> anyhow::Result<()> {
        if !self.konto.user_id.starts_with('@') || !self.konto.user_id.contains(':') {
            bail!("ungueltige Benutzer-ID '{}'", self.konto.user_id);
        }
        if self.konto.device_id.is_empty() {
            bail!("Geraete-ID darf nicht leer sein");
        }
        if self.verifikation.sas_timeout_secs == 0 {
            bail!("sas_timeout_secs muss groesser als 0 sein");
        }
        let iterationen = self.ssss.pbkdf2_iterationen;
        if iterationen == 0 || iterationen > MAX_PBKDF2_ITERATIONEN {
            bail!("pbkdf2_iterationen muss zwischen 1 und {MAX_PBKDF2_ITERATIONEN} liegen");
        }
        if !self.export_parameter().innerhalb_grenzen() {
            bail!("Argon2-Parameter fuer den Export ausserhalb der Grenzen");
        }
        if !log_level_gueltig(&self.logging.level) {
            bail!("ungueltiges Log-Level '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!("ungueltiges Log-Format '{}'", self.logging.format);
        }
        Ok(())
    }

    pub fn own_identity(&self) -> OwnIdentity {
        OwnIdentity {
            user_id: self.konto.user_id.as_str().into(),
            device_id: self.konto.device_id.as_str().into(),
        }
    }

    pub fn command_konfig(&self) -> CommandKonfig {
        CommandKonfig {
            sas_zeitlimit: Duration::from_secs(self.verifikation.sas_timeout_secs),
        }
    }

    pub fn export_parameter(&self) -> Argon2Parameter {
        Argon2Parameter {
            speicher_kib: self.export.argon2_speicher_kib,
            iterationen: self.export.argon2_iterationen,
            ..Argon2Parameter::default()
        }
    }

    /// Pfad des Trust-Store-Schnappschusses
    pub fn store_pfad(&self) -> PathBuf {
        self.daten.verzeichnis.join("trust-store.json")
    }

    /// Pfad des Verzeichnis-Schnappschusses
    pub fn verzeichnis_pfad(&self) -> PathBuf {
        self.daten.verzeichnis.join("directory.json")
    }

    /// Raumkontext fuer eine Raum-ID mit den konfigurierten Mitgliedern
    pub fn raum_kontext(&self, room_id: &str) -> RoomContext {
        let mitglieder = self
            .raum
            .mitglieder
            .iter()
            .map(|id| RoomMember {
                user_id: id.as_str().into(),
                display_name: None,
            })
            .collect();
        RoomContext::neu(room_id.into(), mitglieder)
    }
}
