//! Befehls-Typen
//!
//! Jeder Slash-Befehl des Subsystems inkl. Aliasse.

/// Alle unterstuetzten Befehle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `/devices <user>` – Geraete eines Benutzers auflisten
    GeraeteListe,
    /// `/device <user> <device>` – Details eines Geraets
    GeraetAnzeigen,
    /// `/verify <user> <device> [fingerprint]`
    Verifizieren,
    /// `/unverify <user> <device>`
    Entverifizieren,
    /// `/blacklist <user> <device>`
    Sperren,
    /// `/reset-session` – ausgehende Gruppen-Sitzung des Raums verwerfen
    SitzungZuruecksetzen,
    /// `/import <datei>`
    SchluesselImport,
    /// `/export <datei>` – alle Sitzungen
    SchluesselExport,
    /// `/export-room <datei>` – Sitzungen des aktuellen Raums
    RaumSchluesselExport,
    /// `/ssss <subcommand>`
    SecretStorage,
    /// `/cross-signing <subcommand>`
    CrossSigning,
}

/// (Name, Befehl) – Aliasse zeigen auf denselben Befehl
const NAMEN: &[(&str, Command)] = &[
    ("devices", Command::GeraeteListe),
    ("device", Command::GeraetAnzeigen),
    ("verify", Command::Verifizieren),
    ("unverify", Command::Entverifizieren),
    ("blacklist", Command::Sperren),
    ("reset-session", Command::SitzungZuruecksetzen),
    ("import", Command::SchluesselImport),
    ("import-keys", Command::SchluesselImport),
    ("export", Command::SchluesselExport),
    ("export-keys", Command::SchluesselExport),
    ("export-room", Command::RaumSchluesselExport),
    ("export-room-keys", Command::RaumSchluesselExport),
    ("ssss", Command::SecretStorage),
    ("cross-signing", Command::CrossSigning),
    ("cs", Command::CrossSigning),
];

impl Command {
    /// Befehl anhand des (kleingeschriebenen) Namens suchen
    pub fn aus_name(name: &str) -> Option<Self> {
        NAMEN.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
    }

    /// Kanonischer Name
    pub fn name(&self) -> &'static str {
        match self {
            Self::GeraeteListe => "devices",
            Self::GeraetAnzeigen => "device",
            Self::Verifizieren => "verify",
            Self::Entverifizieren => "unverify",
            Self::Sperren => "blacklist",
            Self::SitzungZuruecksetzen => "reset-session",
            Self::SchluesselImport => "import",
            Self::SchluesselExport => "export",
            Self::RaumSchluesselExport => "export-room",
            Self::SecretStorage => "ssss",
            Self::CrossSigning => "cross-signing",
        }
    }

    /// Alle registrierten Namen inkl. Aliasse
    pub fn alle_namen() -> impl Iterator<Item = &'static str> {
        NAMEN.iter().map(|(n, _)| *n)
    }

    /// Befehle deren Argumente `<user id> <device id>` sind
    pub fn hat_geraete_argumente(&self) -> bool {
        matches!(
            self,
            Self::GeraeteListe
                | Self::GeraetAnzeigen
                | Self::Verifizieren
                | Self::Entverifizieren
                | Self::Sperren
        )
    }
}
