//! Konto-Passwort fuer die Authentifizierung von Uploads (Argon2id)
//!
//! Das lokale Verzeichnis speichert nur den PHC-String; das Klartext-
//! Passwort verlaesst den `Secret`-Container nie.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use vouch_core::{DirectoryError, DirectoryResult, Secret};

/// Hasht ein Passwort mit Argon2id und einem zufaelligen Salt
///
/// Gibt den PHC-String zurueck (inkl. Algorithmus, Parameter und Salt).
pub fn passwort_hashen(passwort: &Secret) -> DirectoryResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(passwort.expose().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DirectoryError::AuthFehlgeschlagen(format!("password hashing: {e}")))
}

/// Verifiziert ein Passwort gegen einen gespeicherten PHC-Hash
pub fn passwort_verifizieren(passwort: &Secret, hash: &str) -> DirectoryResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| DirectoryError::AuthFehlgeschlagen(format!("invalid password hash: {e}")))?;

    match Argon2::default().verify_password(passwort.expose().as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DirectoryError::AuthFehlgeschlagen(e.to_string())),
    }
}
