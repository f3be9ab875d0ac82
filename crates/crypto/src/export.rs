//! Passphrase-geschuetzter Export von Gruppen-Sitzungen
//!
//! ## Dateiformat
//! ```text
//! -----BEGIN MEGOLM SESSION DATA-----
//! base64( [version(1)] [m_cost(4)] [t_cost(4)] [p_cost(4)] [salt(16)] [nonce(12)] [ciphertext] )
//! -----END MEGOLM SESSION DATA-----
//! ```
//! Der Schluessel wird per Argon2id aus der Passphrase abgeleitet, die
//! Sitzungen (JSON-Array) mit AES-256-GCM verschluesselt. Der Kopf bis
//! einschliesslich Salt ist als AAD gebunden.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use vouch_core::{CryptoError, CryptoResult, GroupSession, Secret, SecretBytes, SessionImport};

use crate::kdf::{argon2_derive, zufalls_bytes, Argon2Parameter};

pub const ARMOR_BEGIN: &str = "-----BEGIN MEGOLM SESSION DATA-----";
pub const ARMOR_END: &str = "-----END MEGOLM SESSION DATA-----";

const VERSION: u8 = 1;
const KOPF_LAENGE: usize = 1 + 4 + 4 + 4 + 16;
const NONCE_LAENGE: usize = 12;
const ZEILEN_BREITE: usize = 76;

/// Verschluesselt Sitzungen in das Exportformat
pub fn exportieren(
    passphrase: &Secret,
    sessions: &[GroupSession],
    parameter: Argon2Parameter,
) -> CryptoResult<Vec<u8>> {
    let klartext = SecretBytes::new(serde_json::to_vec(sessions)?);

    let salt = zufalls_bytes::<16>();
    let mut kopf = Vec::with_capacity(KOPF_LAENGE);
    kopf.push(VERSION);
    kopf.extend_from_slice(&parameter.speicher_kib.to_be_bytes());
    kopf.extend_from_slice(&parameter.iterationen.to_be_bytes());
    kopf.extend_from_slice(&parameter.parallelitaet.to_be_bytes());
    kopf.extend_from_slice(&salt);

    let key = argon2_derive(passphrase.expose().as_bytes(), &salt, parameter)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = zufalls_bytes::<NONCE_LAENGE>();
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: klartext.as_bytes(),
                aad: &kopf,
            },
        )
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    let mut roh = kopf;
    roh.extend_from_slice(&nonce);
    roh.extend_from_slice(&ciphertext);

    let kodiert = STANDARD.encode(&roh);
    let mut out = String::with_capacity(kodiert.len() + 128);
    out.push_str(ARMOR_BEGIN);
    out.push('\n');
    for zeile in kodiert.as_bytes().chunks(ZEILEN_BREITE) {
        out.push_str(&String::from_utf8_lossy(zeile));
        out.push('\n');
    }
    out.push_str(ARMOR_END);
    out.push('\n');
    Ok(out.into_bytes())
}

/// Entschluesselt eine Exportdatei
///
/// Eintraege die nicht als Sitzung lesbar sind, werden gezaehlt statt den
/// ganzen Import abzubrechen. Eine falsche Passphrase ergibt
/// `CryptoError::Entschluesselung`.
pub fn importieren(passphrase: &Secret, data: &[u8]) -> CryptoResult<SessionImport> {
    let roh = armor_entfernen(data)?;
    if roh.len() < KOPF_LAENGE + NONCE_LAENGE {
        return Err(CryptoError::UngueltigeDaten("export file is truncated".into()));
    }
    if roh[0] != VERSION {
        return Err(CryptoError::NichtUnterstuetzt(format!(
            "export format version {}",
            roh[0]
        )));
    }

    let (kopf, rest) = roh.split_at(KOPF_LAENGE);
    let parameter = Argon2Parameter {
        speicher_kib: u32_lesen(&kopf[1..5]),
        iterationen: u32_lesen(&kopf[5..9]),
        parallelitaet: u32_lesen(&kopf[9..13]),
    };
    if !parameter.innerhalb_grenzen() {
        return Err(CryptoError::UngueltigeDaten(
            "export file parameters out of range".into(),
        ));
    }
    let salt = &kopf[13..KOPF_LAENGE];
    let (nonce, ciphertext) = rest.split_at(NONCE_LAENGE);

    let key = argon2_derive(passphrase.expose().as_bytes(), salt, parameter)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let klartext = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: kopf,
            },
        )
        .map(SecretBytes::new)
        .map_err(|_| {
            CryptoError::Entschluesselung("wrong passphrase or corrupted file".into())
        })?;

    let eintraege: Vec<serde_json::Value> = serde_json::from_slice(klartext.as_bytes())?;
    let mut ergebnis = SessionImport::default();
    for eintrag in eintraege {
        match serde_json::from_value::<GroupSession>(eintrag) {
            Ok(session) => ergebnis.sessions.push(session),
            Err(e) => {
                tracing::debug!(fehler = %e, "Exporteintrag uebersprungen");
                ergebnis.verworfen += 1;
            }
        }
    }
    Ok(ergebnis)
}

fn armor_entfernen(data: &[u8]) -> CryptoResult<Vec<u8>> {
    let text = std::str::from_utf8(data)
        .map_err(|_| CryptoError::UngueltigeDaten("export file is not text".into()))?;

    let mut zeilen = text.lines().map(str::trim).skip_while(|z| z.is_empty());
    if zeilen.next() != Some(ARMOR_BEGIN) {
        return Err(CryptoError::UngueltigeDaten("missing export header".into()));
    }

    let mut kodiert = String::new();
    let mut ende_gefunden = false;
    for zeile in zeilen {
        if zeile == ARMOR_END {
            ende_gefunden = true;
            break;
        }
        kodiert.push_str(zeile);
    }
    if !ende_gefunden {
        return Err(CryptoError::UngueltigeDaten("missing export footer".into()));
    }

    STANDARD
        .decode(kodiert)
        .map_err(|e| CryptoError::UngueltigeDaten(format!("export body: {e}")))
}

fn u32_lesen(bytes: &[u8]) -> u32 {
    let mut puffer = [0u8; 4];
    puffer.copy_from_slice(bytes);
    u32::from_be_bytes(puffer)
}
