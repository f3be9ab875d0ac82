//! Ereignisse und Kurzcodes der SAS-Verifikation
//!
//! Das Protokoll selbst (Schluesselaustausch, MAC-Berechnung) liegt in der
//! Krypto-Engine. Die Befehlsschicht sieht nur diese Ereignisse und treibt
//! damit ihren Zustandsautomaten.

/// Vom Gegenueber bzw. der Engine gemeldetes Ereignis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SasEvent {
    /// Gegenueber hat die Anfrage angenommen
    Accepted,
    /// Schluessel ausgetauscht, Kurzcode steht zum Vergleich bereit
    KeysExchanged(ShortCode),
    /// MAC des Gegenuebers empfangen und geprueft
    MacVerified,
    /// Gegenueber oder Engine hat abgebrochen
    Cancelled { reason: String },
}

/// Von der Befehlsschicht gesendete Aktion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SasAction {
    /// Kurzcode stimmt ueberein, eigene MAC senden
    ConfirmMatch,
    Cancel { reason: String },
}

/// Entscheidung des Benutzers im Verifikations-Dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogDecision {
    Match,
    Mismatch,
    Cancel,
}

/// Vergleichbarer Kurzcode (Emoji oder Dezimal)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortCode {
    /// (Emoji, Beschreibung)
    Emoji(Vec<(String, String)>),
    Decimal(u16, u16, u16),
}

impl std::fmt::Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Emoji(emojis) => {
                let teile: Vec<String> = emojis
                    .iter()
                    .map(|(emoji, name)| format!("{emoji} ({name})"))
                    .collect();
                f.write_str(&teile.join("  "))
            }
            Self::Decimal(a, b, c) => write!(f, "{a} {b} {c}"),
        }
    }
}
