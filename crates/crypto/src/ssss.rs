//! Secret-Storage Primitive (aes-hmac-sha2)
//!
//! ## Pruefwert eines Schluessels
//! ```text
//! hmac_key = HKDF-SHA256(ikm = schluessel, salt = 0^32, info = "")[32..64]
//! mac      = HMAC-SHA256(hmac_key, iv(16) || 0^32)
//! ```
//! Passt der MAC zu den Metadaten, ist der Schluessel korrekt.
//!
//! ## Geheimnisse
//! Jedes Geheimnis wird mit einem per HKDF (info = Geheimnis-Name)
//! abgeleiteten AES-256-GCM-Schluessel verschluesselt.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use vouch_core::{
    CryptoError, CryptoResult, EncryptedSecret, PassphraseInfo, Secret, SecretBytes, SsssKey,
    SsssKeyMetadata, ALGORITHM_AES_HMAC_SHA2, PASSPHRASE_ALGORITHM_PBKDF2,
};

use crate::kdf::{hkdf_derive, pbkdf2_derive, zufalls_bytes, zufalls_kennung};

type HmacSha256 = Hmac<Sha256>;

const HKDF_SALT: [u8; 32] = [0u8; 32];
const KENNUNGS_LAENGE: usize = 32;

/// Frisches Schluesselmaterial samt Metadaten
pub(crate) fn schluessel_erzeugen(
    passphrase: Option<&Secret>,
    pbkdf2_iterationen: u32,
) -> CryptoResult<SsssKey> {
    let (key, passphrase_info) = match passphrase {
        Some(passphrase) => {
            let info = PassphraseInfo {
                algorithm: PASSPHRASE_ALGORITHM_PBKDF2.into(),
                salt: zufalls_kennung(KENNUNGS_LAENGE),
                iterations: pbkdf2_iterationen,
                bits: 256,
            };
            let key = pbkdf2_derive(
                passphrase.expose().as_bytes(),
                info.salt.as_bytes(),
                info.iterations,
                info.bits,
            )?;
            (key, Some(info))
        }
        None => (SecretBytes::new(zufalls_bytes::<32>().to_vec()), None),
    };

    let iv = zufalls_bytes::<16>();
    let mac = pruefwert(&key, &iv)?;

    Ok(SsssKey {
        id: zufalls_kennung(KENNUNGS_LAENGE),
        metadata: SsssKeyMetadata {
            name: None,
            algorithm: ALGORITHM_AES_HMAC_SHA2.into(),
            passphrase: passphrase_info,
            iv: Some(STANDARD_NO_PAD.encode(iv)),
            mac: Some(STANDARD_NO_PAD.encode(mac)),
        },
        key,
    })
}

/// Leitet den Schluessel aus einer Passphrase ab (ohne Pruefung)
pub(crate) fn aus_passphrase(
    metadata: &SsssKeyMetadata,
    passphrase: &Secret,
) -> CryptoResult<SecretBytes> {
    let info = match &metadata.passphrase {
        Some(info) if info.algorithm == PASSPHRASE_ALGORITHM_PBKDF2 => info,
        Some(info) => {
            return Err(CryptoError::NichtUnterstuetzt(format!(
                "passphrase algorithm {}",
                info.algorithm
            )))
        }
        None => {
            return Err(CryptoError::NichtUnterstuetzt(
                "key has no passphrase".into(),
            ))
        }
    };
    pbkdf2_derive(
        passphrase.expose().as_bytes(),
        info.salt.as_bytes(),
        info.iterations,
        info.bits,
    )
}

/// Prueft Schluesselmaterial gegen den Pruefwert der Metadaten
///
/// Schluessel ohne gespeicherten Pruefwert werden akzeptiert.
pub(crate) fn schluessel_pruefen(
    key_id: &str,
    metadata: &SsssKeyMetadata,
    key: SecretBytes,
) -> CryptoResult<SsssKey> {
    if !metadata.algorithmus_unterstuetzt() {
        return Err(CryptoError::NichtUnterstuetzt(format!(
            "key algorithm {}",
            metadata.algorithm
        )));
    }

    if let (Some(iv), Some(mac)) = (&metadata.iv, &metadata.mac) {
        let iv = STANDARD_NO_PAD
            .decode(iv.trim_end_matches('='))
            .map_err(|e| CryptoError::UngueltigeDaten(format!("key check IV: {e}")))?;
        let mac = STANDARD_NO_PAD
            .decode(mac.trim_end_matches('='))
            .map_err(|e| CryptoError::UngueltigeDaten(format!("key check MAC: {e}")))?;

        let mut pruefer = pruefwert_mac(&key, &iv)?;
        pruefer.update(&[0u8; 32]);
        pruefer
            .verify_slice(&mac)
            .map_err(|_| CryptoError::FalscherSchluessel)?;
    }

    Ok(SsssKey {
        id: key_id.to_string(),
        metadata: metadata.clone(),
        key,
    })
}

/// Verschluesselt ein Geheimnis fuer den Secret-Storage
pub(crate) fn geheimnis_verschluesseln(
    key: &SsssKey,
    name: &str,
    plaintext: &SecretBytes,
) -> CryptoResult<EncryptedSecret> {
    let cipher = geheimnis_cipher(key, name)?;
    let nonce = zufalls_bytes::<12>();
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext.as_bytes(),
                aad: name.as_bytes(),
            },
        )
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    Ok(EncryptedSecret {
        key_id: key.id.clone(),
        iv: STANDARD_NO_PAD.encode(nonce),
        ciphertext: STANDARD_NO_PAD.encode(ciphertext),
    })
}

/// Entschluesselt ein Geheimnis aus dem Secret-Storage
pub(crate) fn geheimnis_entschluesseln(
    key: &SsssKey,
    name: &str,
    secret: &EncryptedSecret,
) -> CryptoResult<SecretBytes> {
    if secret.key_id != key.id {
        return Err(CryptoError::Entschluesselung(format!(
            "{name} is encrypted with key {}, not {}",
            secret.key_id, key.id
        )));
    }

    let nonce = STANDARD_NO_PAD
        .decode(secret.iv.trim_end_matches('='))
        .map_err(|e| CryptoError::UngueltigeDaten(format!("secret IV: {e}")))?;
    if nonce.len() != 12 {
        return Err(CryptoError::UngueltigeDaten(format!(
            "secret IV must be 12 bytes, got {}",
            nonce.len()
        )));
    }
    let ciphertext = STANDARD_NO_PAD
        .decode(secret.ciphertext.trim_end_matches('='))
        .map_err(|e| CryptoError::UngueltigeDaten(format!("secret ciphertext: {e}")))?;

    let cipher = geheimnis_cipher(key, name)?;
    cipher
        .decrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: &ciphertext,
                aad: name.as_bytes(),
            },
        )
        .map(SecretBytes::new)
        .map_err(|_| CryptoError::Entschluesselung(format!("{name} could not be decrypted")))
}

fn geheimnis_cipher(key: &SsssKey, name: &str) -> CryptoResult<Aes256Gcm> {
    let aes_key = SecretBytes::new(hkdf_derive(
        key.key.as_bytes(),
        &HKDF_SALT,
        name.as_bytes(),
        32,
    )?);
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(aes_key.as_bytes())))
}

fn pruefwert_mac(key: &SecretBytes, iv: &[u8]) -> CryptoResult<HmacSha256> {
    let teilschluessel = SecretBytes::new(hkdf_derive(key.as_bytes(), &HKDF_SALT, b"", 64)?);
    let mut mac = <HmacSha256 as Mac>::new_from_slice(&teilschluessel.as_bytes()[32..])
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    mac.update(iv);
    Ok(mac)
}

fn pruefwert(key: &SecretBytes, iv: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut mac = pruefwert_mac(key, iv)?;
    mac.update(&[0u8; 32]);
    Ok(mac.finalize().into_bytes().to_vec())
}
