//! Lokales Verzeichnis (Homeserver-Ersatz fuer den Einzelplatz-Betrieb)
//!
//! Haelt Geraetelisten, veroeffentlichte Cross-Signing-Schluessel und die
//! Secret-Storage Account-Daten des eigenen Kontos. Ist ein Konto-Passwort
//! hinterlegt, verlangt der Upload von Cross-Signing-Schluesseln eine
//! Passwort-Authentifizierung (`m.login.password`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dashmap::DashSet;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use vouch_core::{
    AuthData, CrossSigningPublicKeys, Device, DirectoryClient, DirectoryError, DirectoryResult,
    EncryptedSecret, OwnIdentity, PublishedCrossSigningKeys, Secret, SsssKeyMetadata,
    UiaChallenge, UiaFlow, UserId, AUTH_TYPE_PASSWORD,
};

use crate::password::{passwort_hashen, passwort_verifizieren};
use crate::snapshot;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct DirectorySnapshot {
    #[serde(default)]
    devices: BTreeMap<UserId, Vec<Device>>,
    #[serde(default)]
    cross_signing: BTreeMap<UserId, PublishedCrossSigningKeys>,
    #[serde(default)]
    default_ssss_key: Option<String>,
    #[serde(default)]
    ssss_keys: BTreeMap<String, SsssKeyMetadata>,
    #[serde(default)]
    secrets: BTreeMap<String, EncryptedSecret>,
    /// PHC-String des Konto-Passworts
    #[serde(default)]
    password_hash: Option<String>,
}

/// Verzeichnis im Speicher mit optionaler JSON-Persistenz
#[derive(Debug)]
pub struct LocalDirectory {
    own: OwnIdentity,
    zustand: RwLock<DirectorySnapshot>,
    /// Offene UIA-Sitzungen
    uia_sitzungen: DashSet<String>,
    datei: Option<PathBuf>,
    schreib_sperre: tokio::sync::Mutex<()>,
}

fn transport(e: std::io::Error) -> DirectoryError {
    DirectoryError::Transport(e.to_string())
}

impl LocalDirectory {
    /// Fluechtiges Verzeichnis ohne Persistenz
    pub fn new(own: OwnIdentity) -> Self {
        Self {
            own,
            zustand: RwLock::new(DirectorySnapshot::default()),
            uia_sitzungen: DashSet::new(),
            datei: None,
            schreib_sperre: tokio::sync::Mutex::new(()),
        }
    }

    /// Verzeichnis mit Schnappschuss-Datei
    pub async fn laden(own: OwnIdentity, pfad: impl AsRef<Path>) -> DirectoryResult<Self> {
        let pfad = pfad.as_ref().to_path_buf();
        let zustand: DirectorySnapshot = snapshot::laden(&pfad)
            .await
            .map_err(transport)?
            .unwrap_or_default();
        tracing::info!(
            path = %pfad.display(),
            ssss_schluessel = zustand.ssss_keys.len(),
            geheimnisse = zustand.secrets.len(),
            "Verzeichnis geladen"
        );
        Ok(Self {
            zustand: RwLock::new(zustand),
            datei: Some(pfad),
            ..Self::new(own)
        })
    }

    /// Hinterlegt das Konto-Passwort; danach verlangen Uploads UIA
    pub async fn passwort_setzen(&self, passwort: &Secret) -> DirectoryResult<()> {
        let hash = passwort_hashen(passwort)?;
        self.zustand.write().password_hash = Some(hash);
        self.speichern().await
    }

    /// Uebernimmt einen bereits berechneten PHC-Hash (z.B. aus der Konfiguration)
    pub async fn passwort_hash_setzen(&self, hash: &str) -> DirectoryResult<()> {
        argon2::PasswordHash::new(hash).map_err(|e| {
            DirectoryError::AuthFehlgeschlagen(format!("invalid password hash: {e}"))
        })?;
        self.zustand.write().password_hash = Some(hash.to_string());
        self.speichern().await
    }

    /// Veroeffentlicht die Geraeteliste eines Benutzers
    pub async fn geraete_veroeffentlichen(
        &self,
        user_id: &UserId,
        devices: Vec<Device>,
    ) -> DirectoryResult<()> {
        self.zustand.write().devices.insert(user_id.clone(), devices);
        self.speichern().await
    }

    /// Stellt sicher dass das eigene Geraet in der Geraeteliste steht
    pub async fn eigenes_geraet_registrieren(&self, name: &str) -> DirectoryResult<()> {
        {
            let mut zustand = self.zustand.write();
            let geraete = zustand.devices.entry(self.own.user_id.clone()).or_default();
            if geraete.iter().any(|d| d.device_id == self.own.device_id) {
                return Ok(());
            }
            geraete.push(Device {
                user_id: self.own.user_id.clone(),
                device_id: self.own.device_id.clone(),
                name: name.to_string(),
                identity_key: String::new(),
                signing_key: String::new(),
                trust: Default::default(),
                deleted: false,
            });
        }
        self.speichern().await
    }

    fn neue_challenge(&self) -> UiaChallenge {
        let session = uuid::Uuid::new_v4().to_string();
        self.uia_sitzungen.insert(session.clone());
        UiaChallenge {
            session,
            flows: vec![UiaFlow {
                stages: vec![AUTH_TYPE_PASSWORD.to_string()],
            }],
            completed: vec![],
        }
    }

    fn authentifizieren(&self, hash: &str, auth: Option<&AuthData>) -> DirectoryResult<()> {
        match auth {
            None => Err(DirectoryError::UiaErforderlich(self.neue_challenge())),
            Some(AuthData::Password {
                session,
                user,
                password,
            }) => {
                if self.uia_sitzungen.remove(session).is_none() {
                    return Err(DirectoryError::AuthFehlgeschlagen(
                        "unknown authentication session".into(),
                    ));
                }
                if user != &self.own.user_id {
                    return Err(DirectoryError::AuthFehlgeschlagen(format!(
                        "cannot authenticate as {user}"
                    )));
                }
                if !passwort_verifizieren(password, hash)? {
                    tracing::warn!(user = %user, "UIA mit falschem Passwort");
                    return Err(DirectoryError::AuthFehlgeschlagen("invalid password".into()));
                }
                Ok(())
            }
            Some(AuthData::Fallback { stage, .. }) => Err(DirectoryError::AuthFehlgeschlagen(
                format!("stage {stage} is not offered"),
            )),
        }
    }

    async fn speichern(&self) -> DirectoryResult<()> {
        let Some(pfad) = &self.datei else {
            return Ok(());
        };
        let _sperre = self.schreib_sperre.lock().await;
        let zustand = self.zustand.read().clone();
        snapshot::schreiben(pfad, &zustand).await.map_err(transport)
    }
}

impl DirectoryClient for LocalDirectory {
    fn own_identity(&self) -> &OwnIdentity {
        &self.own
    }

    async fn query_devices(&self, user_id: &UserId) -> DirectoryResult<Vec<Device>> {
        Ok(self
            .zustand
            .read()
            .devices
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_cross_signing_keys(
        &self,
        user_id: &UserId,
    ) -> DirectoryResult<PublishedCrossSigningKeys> {
        Ok(self
            .zustand
            .read()
            .cross_signing
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upload_cross_signing_keys(
        &self,
        keys: &CrossSigningPublicKeys,
        auth: Option<&AuthData>,
    ) -> DirectoryResult<()> {
        let hash = self.zustand.read().password_hash.clone();
        if let Some(hash) = hash {
            self.authentifizieren(&hash, auth)?;
        }

        self.zustand
            .write()
            .cross_signing
            .insert(self.own.user_id.clone(), keys.clone().into());
        tracing::info!(user = %self.own.user_id, "Cross-Signing-Schluessel veroeffentlicht");
        self.speichern().await
    }

    async fn default_ssss_key_id(&self) -> DirectoryResult<Option<String>> {
        Ok(self.zustand.read().default_ssss_key.clone())
    }

    async fn set_default_ssss_key_id(&self, key_id: &str) -> DirectoryResult<()> {
        self.zustand.write().default_ssss_key = Some(key_id.to_string());
        self.speichern().await
    }

    async fn ssss_key_metadata(&self, key_id: &str) -> DirectoryResult<SsssKeyMetadata> {
        self.zustand
            .read()
            .ssss_keys
            .get(key_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NichtGefunden(format!("SSSS key {key_id}")))
    }

    async fn set_ssss_key_metadata(
        &self,
        key_id: &str,
        metadata: &SsssKeyMetadata,
    ) -> DirectoryResult<()> {
        self.zustand
            .write()
            .ssss_keys
            .insert(key_id.to_string(), metadata.clone());
        self.speichern().await
    }

    async fn secret(&self, name: &str) -> DirectoryResult<EncryptedSecret> {
        self.zustand
            .read()
            .secrets
            .get(name)
            .cloned()
            .ok_or_else(|| DirectoryError::NichtGefunden(format!("secret {name}")))
    }

    async fn set_secret(&self, name: &str, secret: &EncryptedSecret) -> DirectoryResult<()> {
        self.zustand
            .write()
            .secrets
            .insert(name.to_string(), secret.clone());
        self.speichern().await
    }
}
