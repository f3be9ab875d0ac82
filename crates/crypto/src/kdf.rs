//! Schluesselableitung und Zufallswerte
//!
//! - HKDF-SHA256 fuer Teilschluessel aus SSSS-Schluesseln
//! - PBKDF2-HMAC-SHA512 fuer Passphrasen im Secret-Storage
//! - Argon2id fuer passphrase-geschuetzte Exportdateien

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use sha2::{Sha256, Sha512};

use vouch_core::{CryptoError, CryptoResult, SecretBytes};

/// HKDF-basierte Key Derivation (allgemein verwendbar)
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> CryptoResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(okm)
}

/// Obergrenze fuer PBKDF2-Iterationen aus fremden Metadaten
pub const MAX_PBKDF2_ITERATIONEN: u32 = 10_000_000;

/// Obergrenze fuer die abgeleitete Schluessellaenge
pub const MAX_PBKDF2_BITS: u32 = 512;

/// Leitet `bits / 8` Bytes aus einer Passphrase ab (PBKDF2-HMAC-SHA512)
pub fn pbkdf2_derive(
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
    bits: u32,
) -> CryptoResult<SecretBytes> {
    if iterations == 0 {
        return Err(CryptoError::KeyDerivation(
            "PBKDF2 needs at least one iteration".into(),
        ));
    }
    if iterations > MAX_PBKDF2_ITERATIONEN {
        return Err(CryptoError::KeyDerivation(format!(
            "PBKDF2 iteration count {iterations} exceeds {MAX_PBKDF2_ITERATIONEN}"
        )));
    }
    if bits == 0 || bits % 8 != 0 || bits > MAX_PBKDF2_BITS {
        return Err(CryptoError::KeyDerivation(format!(
            "unsupported key size of {bits} bits"
        )));
    }
    let mut out = vec![0u8; (bits / 8) as usize];
    pbkdf2::pbkdf2_hmac::<Sha512>(passphrase, salt, iterations, &mut out);
    Ok(SecretBytes::new(out))
}

/// Argon2id-Parameter fuer Exportdateien
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Parameter {
    /// Speicherkosten in KiB
    pub speicher_kib: u32,
    pub iterationen: u32,
    pub parallelitaet: u32,
}

impl Default for Argon2Parameter {
    fn default() -> Self {
        Self {
            speicher_kib: 65536,
            iterationen: 3,
            parallelitaet: 1,
        }
    }
}

impl Argon2Parameter {
    /// 1 GiB
    pub const MAX_SPEICHER_KIB: u32 = 1024 * 1024;
    pub const MAX_ITERATIONEN: u32 = 64;
    pub const MAX_PARALLELITAET: u32 = 16;

    /// Parameter aus Exportdateien werden nur innerhalb dieser Grenzen benutzt
    pub fn innerhalb_grenzen(&self) -> bool {
        self.speicher_kib <= Self::MAX_SPEICHER_KIB
            && self.iterationen <= Self::MAX_ITERATIONEN
            && self.parallelitaet <= Self::MAX_PARALLELITAET
    }
}

/// Leitet einen 32-Byte-Schluessel per Argon2id ab
pub fn argon2_derive(
    passphrase: &[u8],
    salt: &[u8],
    parameter: Argon2Parameter,
) -> CryptoResult<SecretBytes> {
    if !parameter.innerhalb_grenzen() {
        return Err(CryptoError::KeyDerivation(format!(
            "Argon2 parameters out of range: {parameter:?}"
        )));
    }
    let params = Params::new(
        parameter.speicher_kib,
        parameter.iterationen,
        parameter.parallelitaet,
        Some(32),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut out = vec![0u8; 32];
    argon2
        .hash_password_into(passphrase, salt, &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(SecretBytes::new(out))
}

/// Zufaellige Bytes aus dem OS-Zufallsgenerator
pub fn zufalls_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Zufaellige alphanumerische Kennung (Schluessel-IDs, Salze)
pub fn zufalls_kennung(laenge: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(laenge)
        .map(char::from)
        .collect()
}
