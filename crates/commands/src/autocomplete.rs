//! Autocomplete fuer `<user id> <device id>` Argumente
//!
//! Reine Funktion: Raummitglieder und bekannte Geraete werden vom Aufrufer
//! uebergeben.

use vouch_core::Device;

use crate::context::RoomMember;
use crate::parser::ParsedCommand;
use crate::types::Command;

/// Ergebnis einer Vervollstaendigung
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vervollstaendigung {
    /// Kandidaten zur Anzeige (leer bei eindeutigem Treffer)
    pub kandidaten: Vec<String>,
    /// Ersetzte Eingabezeile, nur bei genau einem Treffer
    pub neuer_text: Option<String>,
}

impl Vervollstaendigung {
    fn keine() -> Self {
        Self::default()
    }
}

/// Phase der Vervollstaendigung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Benutzer,
    Geraet,
    Keine,
}

/// Bestimmt welches Argument vervollstaendigt wird
pub fn phase(cmd: &ParsedCommand) -> Phase {
    let Some(befehl) = Command::aus_name(&cmd.command) else {
        return Phase::Keine;
    };
    if !befehl.hat_geraete_argumente() {
        return Phase::Keine;
    }
    match cmd.args.len() {
        0 => Phase::Keine,
        1 if !cmd.endet_mit_leerzeichen() => Phase::Benutzer,
        _ if befehl == Command::GeraeteListe => Phase::Keine,
        _ => Phase::Geraet,
    }
}

/// Vervollstaendigt die Eingabe
///
/// `geraete` sind die lokal bekannten Geraete des ersten Arguments und
/// werden nur in der Geraete-Phase betrachtet.
pub fn vervollstaendigen(
    cmd: &ParsedCommand,
    mitglieder: &[RoomMember],
    geraete: &[Device],
) -> Vervollstaendigung {
    match phase(cmd) {
        Phase::Benutzer => benutzer_vervollstaendigen(cmd, mitglieder),
        Phase::Geraet => geraet_vervollstaendigen(cmd, geraete),
        Phase::Keine => Vervollstaendigung::keine(),
    }
}

/// Treffer: Praefix der User-ID (mit oder ohne `@`) oder des Anzeigenamens
fn benutzer_passt(mitglied: &RoomMember, eingabe: &str) -> bool {
    let eingabe = eingabe.to_lowercase();
    let user_id = mitglied.user_id.as_str().to_lowercase();
    user_id.starts_with(&eingabe)
        || user_id
            .strip_prefix('@')
            .is_some_and(|ohne| ohne.starts_with(&eingabe))
        || mitglied
            .display_name
            .as_ref()
            .is_some_and(|name| name.to_lowercase().starts_with(&eingabe))
}

fn benutzer_vervollstaendigen(cmd: &ParsedCommand, mitglieder: &[RoomMember]) -> Vervollstaendigung {
    let eingabe = cmd.args[0].as_str();
    let treffer: Vec<&RoomMember> = mitglieder
        .iter()
        .filter(|m| benutzer_passt(m, eingabe))
        .collect();

    match treffer.as_slice() {
        [einziger] => Vervollstaendigung {
            kandidaten: Vec::new(),
            neuer_text: Some(format!("/{} {} ", cmd.orig_command, einziger.user_id)),
        },
        _ => Vervollstaendigung {
            kandidaten: treffer.iter().map(|m| m.user_id.to_string()).collect(),
            neuer_text: None,
        },
    }
}

fn geraet_vervollstaendigen(cmd: &ParsedCommand, geraete: &[Device]) -> Vervollstaendigung {
    let treffer: Vec<&Device> = match cmd.args.get(1) {
        None => geraete.iter().collect(),
        Some(eingabe) => {
            let eingabe = eingabe.to_uppercase();
            // Vollstaendige ID: nichts mehr zu tun
            if geraete
                .iter()
                .any(|d| d.device_id.as_str().to_uppercase() == eingabe)
            {
                return Vervollstaendigung::keine();
            }
            geraete
                .iter()
                .filter(|d| {
                    d.device_id.as_str().to_uppercase().starts_with(&eingabe)
                        || d.name.to_uppercase().starts_with(&eingabe)
                })
                .collect()
        }
    };

    let kandidaten: Vec<String> = treffer
        .iter()
        .map(|d| format!("{} ({})", d.device_id, d.name))
        .collect();
    let neuer_text = match treffer.as_slice() {
        [einziges] => Some(format!(
            "/{} {} {} ",
            cmd.orig_command, cmd.args[0], einziges.device_id
        )),
        _ => None,
    };
    Vervollstaendigung {
        kandidaten,
        neuer_text,
    }
}
