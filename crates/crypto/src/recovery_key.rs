//! Recovery-Key Kodierung
//!
//! ## Format
//! ```text
//! base58( [0x8B, 0x01] [schluessel(32)] [paritaet(1)] )
//! ```
//! Die Paritaet ist das XOR aller vorherigen Bytes. Zur Anzeige wird der
//! Text in Vierergruppen getrennt; beim Dekodieren wird jeder Leerraum
//! ignoriert.

use vouch_core::{CryptoError, CryptoResult, Secret, SecretBytes};

const PRAEFIX: [u8; 2] = [0x8B, 0x01];
const SCHLUESSEL_LAENGE: usize = 32;
const GESAMT_LAENGE: usize = PRAEFIX.len() + SCHLUESSEL_LAENGE + 1;

/// Kodiert einen 32-Byte-Schluessel als lesbaren Recovery-Key
pub fn kodieren(key: &SecretBytes) -> CryptoResult<Secret> {
    if key.len() != SCHLUESSEL_LAENGE {
        return Err(CryptoError::UngueltigeDaten(format!(
            "recovery key material must be {SCHLUESSEL_LAENGE} bytes, got {}",
            key.len()
        )));
    }

    let mut roh = Vec::with_capacity(GESAMT_LAENGE);
    roh.extend_from_slice(&PRAEFIX);
    roh.extend_from_slice(key.as_bytes());
    roh.push(paritaet(&roh));
    let roh = SecretBytes::new(roh);
    let kodiert = Secret::new(bs58::encode(roh.as_bytes()).into_string());

    let gruppiert = kodiert
        .expose()
        .as_bytes()
        .chunks(4)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Secret::new(gruppiert))
}

/// Dekodiert einen Recovery-Key zurueck in das rohe Schluesselmaterial
pub fn dekodieren(recovery_key: &Secret) -> CryptoResult<SecretBytes> {
    let kompakt: String = recovery_key
        .expose()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let bytes = bs58::decode(&kompakt)
        .into_vec()
        .map(SecretBytes::new)
        .map_err(|e| CryptoError::UngueltigerRecoveryKey(e.to_string()))?;
    let roh = bytes.as_bytes();

    if roh.len() != GESAMT_LAENGE {
        return Err(CryptoError::UngueltigerRecoveryKey(format!(
            "unexpected length {}",
            roh.len()
        )));
    }
    if roh[..PRAEFIX.len()] != PRAEFIX {
        return Err(CryptoError::UngueltigerRecoveryKey("unexpected prefix".into()));
    }
    if paritaet(roh) != 0 {
        return Err(CryptoError::UngueltigerRecoveryKey("parity check failed".into()));
    }

    Ok(SecretBytes::new(
        roh[PRAEFIX.len()..PRAEFIX.len() + SCHLUESSEL_LAENGE].to_vec(),
    ))
}

fn paritaet(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}
