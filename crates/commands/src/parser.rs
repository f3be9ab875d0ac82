//! Zeilen-Parser fuer Slash-Befehle
//!
//! Format: `/befehl arg1 arg2 ...`
//! Der Befehlsname wird kleingeschrieben, der Originalname bleibt fuer
//! Usage- und Hilfetexte erhalten.

/// Ein geparster Befehl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Kleingeschriebener Befehlsname ohne `/`
    pub command: String,
    /// Befehlsname wie eingegeben
    pub orig_command: String,
    /// Leerzeichen-getrennte Argumente
    pub args: Vec<String>,
    /// Alles nach dem Befehlsnamen, fuehrende Leerzeichen entfernt
    pub raw_args: String,
}

impl ParsedCommand {
    /// true wenn die Eingabe mit Leerzeichen endet (Autocomplete)
    pub fn endet_mit_leerzeichen(&self) -> bool {
        self.raw_args.ends_with(char::is_whitespace)
    }

    /// Argument an Position `index`
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Parst eine Eingabezeile, `None` wenn sie kein Befehl ist
pub fn parse_line(line: &str) -> Option<ParsedCommand> {
    let line = line.trim_start();
    let rest = line.strip_prefix('/')?;
    let rest = rest.trim_end_matches(['\r', '\n']);

    let (name, raw_args) = match rest.find(char::is_whitespace) {
        Some(pos) => (&rest[..pos], rest[pos..].trim_start()),
        None => (rest, ""),
    };
    if name.is_empty() {
        return None;
    }

    Some(ParsedCommand {
        command: name.to_lowercase(),
        orig_command: name.to_string(),
        args: raw_args.split_whitespace().map(String::from).collect(),
        raw_args: raw_args.to_string(),
    })
}
