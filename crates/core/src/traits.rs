//! Kollaborateur-Schnittstellen
//!
//! Die Befehlsschicht bekommt jede Faehigkeit als typisierte Abhaengigkeit
//! bei der Konstruktion injiziert. Store, Verzeichnis und Krypto-Engine
//! werden generisch eingebunden (wie die Repository-Traits); UI-seitige
//! Kollaborateure pro Befehl als Trait-Objekt.

use std::time::Duration;

use async_trait::async_trait;

use crate::cross_signing::{CrossSigningKeySet, CrossSigningPublicKeys, KeyPair, PublishedCrossSigningKeys};
use crate::error::{CryptoResult, DirectoryResult, StoreResult};
use crate::event::VerificationOutcome;
use crate::sas::{DialogDecision, SasAction, SasEvent, ShortCode};
use crate::secret::{Secret, SecretBytes};
use crate::session::{GroupSession, SessionImport};
use crate::ssss::{EncryptedSecret, GeneratedSsssKey, SsssKey, SsssKeyMetadata};
use crate::types::{Device, DeviceId, OwnIdentity, RoomId, UserId};
use crate::uia::AuthData;

/// Persistenter Speicher fuer Geraete und Gruppen-Sitzungen
#[allow(async_fn_in_trait)]
pub trait TrustStore: Send + Sync {
    /// Ein Geraet aus dem lokalen Cache laden
    async fn device(&self, user_id: &UserId, device_id: &DeviceId) -> StoreResult<Option<Device>>;

    /// Alle lokal bekannten Geraete eines Benutzers
    async fn devices(&self, user_id: &UserId) -> StoreResult<Vec<Device>>;

    /// Geraeteliste eines Benutzers ersetzen (nach Abfrage beim Server)
    ///
    /// Bereits bekannte Vertrauenszustaende bleiben erhalten.
    async fn put_devices(&self, user_id: &UserId, devices: Vec<Device>) -> StoreResult<()>;

    /// Ein einzelnes Geraet speichern
    async fn put_device(&self, device: &Device) -> StoreResult<()>;

    async fn all_group_sessions(&self) -> StoreResult<Vec<GroupSession>>;

    async fn group_sessions_for_room(&self, room_id: &RoomId) -> StoreResult<Vec<GroupSession>>;

    /// Eine eingehende Gruppen-Sitzung hinzufuegen
    ///
    /// Gibt `false` zurueck wenn die Sitzung abgelehnt wurde (Duplikat,
    /// unbekannter Algorithmus, beschaedigte Daten).
    async fn add_group_session(&self, session: GroupSession) -> StoreResult<bool>;

    /// Ausgehende Gruppen-Sitzung eines Raums entfernen
    ///
    /// Gibt `false` zurueck wenn keine Sitzung existierte.
    async fn remove_outbound_group_session(&self, room_id: &RoomId) -> StoreResult<bool>;
}

/// Zugriff auf den Homeserver (Schluesselabfragen, Account-Daten, Uploads)
#[allow(async_fn_in_trait)]
pub trait DirectoryClient: Send + Sync {
    /// Eigenes Konto (Benutzer + Geraet)
    fn own_identity(&self) -> &OwnIdentity;

    async fn query_devices(&self, user_id: &UserId) -> DirectoryResult<Vec<Device>>;

    async fn query_cross_signing_keys(
        &self,
        user_id: &UserId,
    ) -> DirectoryResult<PublishedCrossSigningKeys>;

    /// Cross-Signing-Schluessel veroeffentlichen
    ///
    /// Schlaegt mit `DirectoryError::UiaErforderlich` fehl, solange der
    /// Server weitere Authentifizierung verlangt.
    async fn upload_cross_signing_keys(
        &self,
        keys: &CrossSigningPublicKeys,
        auth: Option<&AuthData>,
    ) -> DirectoryResult<()>;

    /// ID des Standard-SSSS-Schluessels, `None` wenn keiner gesetzt ist
    async fn default_ssss_key_id(&self) -> DirectoryResult<Option<String>>;

    async fn set_default_ssss_key_id(&self, key_id: &str) -> DirectoryResult<()>;

    /// Metadaten eines SSSS-Schluessels (`NichtGefunden` wenn unbekannt)
    async fn ssss_key_metadata(&self, key_id: &str) -> DirectoryResult<SsssKeyMetadata>;

    async fn set_ssss_key_metadata(
        &self,
        key_id: &str,
        metadata: &SsssKeyMetadata,
    ) -> DirectoryResult<()>;

    /// Verschluesseltes Geheimnis (`NichtGefunden` wenn unbekannt)
    async fn secret(&self, name: &str) -> DirectoryResult<EncryptedSecret>;

    async fn set_secret(&self, name: &str, secret: &EncryptedSecret) -> DirectoryResult<()>;
}

/// Kryptografische Primitive (SSSS, Cross-Signing, Schluessel-Export, SAS)
#[allow(async_fn_in_trait)]
pub trait CryptoEngine: Send + Sync {
    /// Neuen SSSS-Schluessel erzeugen, optional aus einer Passphrase abgeleitet
    fn generate_ssss_key(&self, passphrase: Option<&Secret>) -> CryptoResult<GeneratedSsssKey>;

    /// Passphrase gegen die Metadaten pruefen und den Schluessel ableiten
    ///
    /// `CryptoError::FalscherSchluessel` bei falscher Passphrase.
    fn verify_passphrase(
        &self,
        key_id: &str,
        metadata: &SsssKeyMetadata,
        passphrase: &Secret,
    ) -> CryptoResult<SsssKey>;

    /// Recovery-Key dekodieren und gegen die Metadaten pruefen
    ///
    /// `CryptoError::UngueltigerRecoveryKey` bei syntaktisch ungueltiger
    /// Eingabe, `CryptoError::FalscherSchluessel` wenn er nicht passt.
    fn verify_recovery_key(
        &self,
        key_id: &str,
        metadata: &SsssKeyMetadata,
        recovery_key: &Secret,
    ) -> CryptoResult<SsssKey>;

    fn encrypt_secret(
        &self,
        key: &SsssKey,
        name: &str,
        plaintext: &SecretBytes,
    ) -> CryptoResult<EncryptedSecret>;

    fn decrypt_secret(
        &self,
        key: &SsssKey,
        name: &str,
        secret: &EncryptedSecret,
    ) -> CryptoResult<SecretBytes>;

    fn generate_cross_signing_keys(&self) -> CryptoResult<CrossSigningKeySet>;

    /// Schluessel-Paar aus einem gespeicherten Seed wiederherstellen
    fn key_pair_from_seed(&self, seed: &SecretBytes) -> CryptoResult<KeyPair>;

    /// Sitzungen passphrase-geschuetzt serialisieren
    fn export_sessions(&self, passphrase: &Secret, sessions: &[GroupSession]) -> CryptoResult<Vec<u8>>;

    /// Exportdatei entschluesseln und deserialisieren
    fn import_sessions(&self, passphrase: &Secret, data: &[u8]) -> CryptoResult<SessionImport>;

    /// SAS-Verifikation mit einem Geraet starten
    async fn start_sas(&self, device: &Device) -> CryptoResult<Box<dyn SasChannel>>;
}

/// Transportkanal einer laufenden SAS-Verifikation
#[async_trait]
pub trait SasChannel: Send {
    async fn next_event(&mut self) -> CryptoResult<SasEvent>;

    async fn send(&mut self, action: SasAction) -> CryptoResult<()>;
}

/// Parameter einer Passwort-Abfrage
#[derive(Debug, Clone, Copy)]
pub struct PasswordRequest<'a> {
    pub title: &'a str,
    pub label: &'a str,
    pub placeholder: &'a str,
    /// Eingabe muss zweimal bestaetigt werden
    pub confirm: bool,
}

/// Benutzer-Interaktion (Passwort-Dialoge, Browser-Fallback, Verifikations-Modal)
#[async_trait]
pub trait UserPrompt: Send + Sync {
    /// `None` bedeutet: Dialog wurde abgebrochen
    async fn ask_password(&self, request: PasswordRequest<'_>) -> Option<Secret>;

    /// Externen Browser-Flow fuer eine UIA-Stufe durchlaufen
    async fn open_uia_fallback(&self, stage: &str, session: &str) -> anyhow::Result<()>;

    fn open_verification_dialog(
        &self,
        device: &Device,
        timeout: Duration,
    ) -> Box<dyn VerificationDialog>;
}

/// Modal einer laufenden interaktiven Verifikation
#[async_trait]
pub trait VerificationDialog: Send {
    fn status(&mut self, text: &str);

    /// Kurzcode anzeigen und Entscheidung des Benutzers abwarten
    async fn compare(&mut self, code: &ShortCode) -> DialogDecision;

    fn close(&mut self, outcome: &VerificationOutcome);
}

/// Antwortkanal eines Befehls (eine Nachricht pro Aufruf)
pub trait Reply: Send + Sync {
    fn reply(&self, text: &str);
}
