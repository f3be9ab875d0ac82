//! Gemeinsame Test-Doubles fuer die Integrationstests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vouch_commands::{
    parse_line, Ausfuehrung, CommandContext, CommandDispatcher, CommandKonfig, RoomContext,
};
use vouch_core::{
    CrossSigningKeySet, CryptoEngine, CryptoError, CryptoResult, Device, DeviceId, DialogDecision,
    EncryptedSecret, EventBus, EventReceiver, GeneratedSsssKey, GroupSession, KeyPair,
    OwnIdentity, PasswordRequest, Reply, RoomId, SasAction, SasChannel, SasEvent, Secret,
    SecretBytes, SessionImport, ShortCode, SsssKey, SsssKeyMetadata, StoreError, StoreResult,
    TrustState, TrustStore, UserId, UserPrompt, VerificationDialog, VerificationOutcome,
    VouchEvent,
};
use vouch_crypto::{Argon2Parameter, SoftwareCryptoEngine};
use vouch_store::{BroadcastEventBus, LocalDirectory, MemoryTrustStore, MEGOLM_ALGORITHM};

pub const ALICE: &str = "@alice:example.org";
pub const BOB: &str = "@bob:example.org";

// --- Antworten ---

/// Sammelt alle Antworten eines Aufrufs
#[derive(Default)]
pub struct Antworten(Mutex<Vec<String>>);

impl Reply for Antworten {
    fn reply(&self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }
}

impl Antworten {
    pub fn alle(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

// --- Prompt ---

/// Prompt mit vorgegebenen Eingaben; leere Warteschlange = Abbruch
pub struct SkriptPrompt {
    eingaben: Mutex<VecDeque<Option<Secret>>>,
    anfragen: Mutex<Vec<(String, bool)>>,
    fallback: Mutex<Vec<(String, String)>>,
    fallback_ok: bool,
    entscheidung: DialogDecision,
    pub dialog_ergebnis: Arc<Mutex<Option<VerificationOutcome>>>,
}

impl SkriptPrompt {
    pub fn neu(eingaben: &[Option<&str>]) -> Self {
        Self {
            eingaben: Mutex::new(eingaben.iter().map(|e| e.map(Secret::from)).collect()),
            anfragen: Mutex::new(Vec::new()),
            fallback: Mutex::new(Vec::new()),
            fallback_ok: true,
            entscheidung: DialogDecision::Match,
            dialog_ergebnis: Arc::new(Mutex::new(None)),
        }
    }

    pub fn leer() -> Self {
        Self::neu(&[])
    }

    pub fn mit_entscheidung(mut self, entscheidung: DialogDecision) -> Self {
        self.entscheidung = entscheidung;
        self
    }

    pub fn mit_fehlerhaftem_fallback(mut self) -> Self {
        self.fallback_ok = false;
        self
    }

    /// Titel aller Passwort-Abfragen mit confirm-Flag
    pub fn anfragen(&self) -> Vec<(String, bool)> {
        self.anfragen.lock().unwrap().clone()
    }

    pub fn fallback_aufrufe(&self) -> Vec<(String, String)> {
        self.fallback.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserPrompt for SkriptPrompt {
    async fn ask_password(&self, request: PasswordRequest<'_>) -> Option<Secret> {
        self.anfragen
            .lock()
            .unwrap()
            .push((request.title.to_string(), request.confirm));
        self.eingaben.lock().unwrap().pop_front().flatten()
    }

    async fn open_uia_fallback(&self, stage: &str, session: &str) -> anyhow::Result<()> {
        self.fallback
            .lock()
            .unwrap()
            .push((stage.to_string(), session.to_string()));
        if self.fallback_ok {
            Ok(())
        } else {
            anyhow::bail!("browser could not be opened")
        }
    }

    fn open_verification_dialog(
        &self,
        _device: &Device,
        _timeout: Duration,
    ) -> Box<dyn VerificationDialog> {
        Box::new(TestDialog {
            entscheidung: self.entscheidung,
            ergebnis: self.dialog_ergebnis.clone(),
        })
    }
}

struct TestDialog {
    entscheidung: DialogDecision,
    ergebnis: Arc<Mutex<Option<VerificationOutcome>>>,
}

#[async_trait]
impl VerificationDialog for TestDialog {
    fn status(&mut self, _text: &str) {}

    async fn compare(&mut self, _code: &ShortCode) -> DialogDecision {
        self.entscheidung
    }

    fn close(&mut self, outcome: &VerificationOutcome) {
        *self.ergebnis.lock().unwrap() = Some(outcome.clone());
    }
}

// --- Krypto ---

/// Software-Engine mit skriptbarem SAS-Kanal
pub struct TestCrypto {
    engine: SoftwareCryptoEngine,
    sas_ereignisse: Mutex<Option<Vec<SasEvent>>>,
    pub sas_gesendet: Arc<Mutex<Vec<SasAction>>>,
    cross_signing_erzeugt: AtomicUsize,
}

impl TestCrypto {
    pub fn neu() -> Self {
        Self {
            engine: SoftwareCryptoEngine::neu()
                .mit_pbkdf2_iterationen(1000)
                .mit_export_parametern(Argon2Parameter {
                    speicher_kib: 64,
                    iterationen: 1,
                    parallelitaet: 1,
                }),
            sas_ereignisse: Mutex::new(None),
            sas_gesendet: Arc::new(Mutex::new(Vec::new())),
            cross_signing_erzeugt: AtomicUsize::new(0),
        }
    }

    /// Wie oft ein Cross-Signing-Schluesselsatz erzeugt wurde
    pub fn cross_signing_erzeugt(&self) -> usize {
        self.cross_signing_erzeugt.load(Ordering::SeqCst)
    }

    /// Ereignisse des naechsten SAS-Kanals; danach wartet er endlos
    pub fn sas_skript(&self, ereignisse: Vec<SasEvent>) {
        *self.sas_ereignisse.lock().unwrap() = Some(ereignisse);
    }
}

struct SkriptKanal {
    ereignisse: VecDeque<SasEvent>,
    gesendet: Arc<Mutex<Vec<SasAction>>>,
}

#[async_trait]
impl SasChannel for SkriptKanal {
    async fn next_event(&mut self) -> CryptoResult<SasEvent> {
        match self.ereignisse.pop_front() {
            Some(e) => Ok(e),
            None => std::future::pending().await,
        }
    }

    async fn send(&mut self, action: SasAction) -> CryptoResult<()> {
        self.gesendet.lock().unwrap().push(action);
        Ok(())
    }
}

impl CryptoEngine for TestCrypto {
    fn generate_ssss_key(&self, passphrase: Option<&Secret>) -> CryptoResult<GeneratedSsssKey> {
        self.engine.generate_ssss_key(passphrase)
    }

    fn verify_passphrase(
        &self,
        key_id: &str,
        metadata: &SsssKeyMetadata,
        passphrase: &Secret,
    ) -> CryptoResult<SsssKey> {
        self.engine.verify_passphrase(key_id, metadata, passphrase)
    }

    fn verify_recovery_key(
        &self,
        key_id: &str,
        metadata: &SsssKeyMetadata,
        recovery_key: &Secret,
    ) -> CryptoResult<SsssKey> {
        self.engine.verify_recovery_key(key_id, metadata, recovery_key)
    }

    fn encrypt_secret(
        &self,
        key: &SsssKey,
        name: &str,
        plaintext: &SecretBytes,
    ) -> CryptoResult<EncryptedSecret> {
        self.engine.encrypt_secret(key, name, plaintext)
    }

    fn decrypt_secret(
        &self,
        key: &SsssKey,
        name: &str,
        secret: &EncryptedSecret,
    ) -> CryptoResult<SecretBytes> {
        self.engine.decrypt_secret(key, name, secret)
    }

    fn generate_cross_signing_keys(&self) -> CryptoResult<CrossSigningKeySet> {
        self.cross_signing_erzeugt.fetch_add(1, Ordering::SeqCst);
        self.engine.generate_cross_signing_keys()
    }

    fn key_pair_from_seed(&self, seed: &SecretBytes) -> CryptoResult<KeyPair> {
        self.engine.key_pair_from_seed(seed)
    }

    fn export_sessions(&self, passphrase: &Secret, sessions: &[GroupSession]) -> CryptoResult<Vec<u8>> {
        self.engine.export_sessions(passphrase, sessions)
    }

    fn import_sessions(&self, passphrase: &Secret, data: &[u8]) -> CryptoResult<SessionImport> {
        self.engine.import_sessions(passphrase, data)
    }

    async fn start_sas(&self, device: &Device) -> CryptoResult<Box<dyn SasChannel>> {
        match self.sas_ereignisse.lock().unwrap().take() {
            Some(ereignisse) => Ok(Box::new(SkriptKanal {
                ereignisse: ereignisse.into(),
                gesendet: self.sas_gesendet.clone(),
            })),
            None => Err(CryptoError::NichtUnterstuetzt(format!(
                "no verification transport for {}",
                device.device_id
            ))),
        }
    }
}

// --- Store ---

/// Trust-Store dessen Schreibzugriffe gezielt fehlschlagen koennen
#[derive(Default)]
pub struct TestStore {
    pub inner: MemoryTrustStore,
    speichern_schlaegt_fehl: AtomicBool,
}

impl TestStore {
    pub fn speichern_fehlschlagen(&self, aktiv: bool) {
        self.speichern_schlaegt_fehl.store(aktiv, Ordering::SeqCst);
    }
}

impl TrustStore for TestStore {
    async fn device(&self, user_id: &UserId, device_id: &DeviceId) -> StoreResult<Option<Device>> {
        self.inner.device(user_id, device_id).await
    }

    async fn devices(&self, user_id: &UserId) -> StoreResult<Vec<Device>> {
        self.inner.devices(user_id).await
    }

    async fn put_devices(&self, user_id: &UserId, devices: Vec<Device>) -> StoreResult<()> {
        self.inner.put_devices(user_id, devices).await
    }

    async fn put_device(&self, device: &Device) -> StoreResult<()> {
        if self.speichern_schlaegt_fehl.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.inner.put_device(device).await
    }

    async fn all_group_sessions(&self) -> StoreResult<Vec<GroupSession>> {
        self.inner.all_group_sessions().await
    }

    async fn group_sessions_for_room(&self, room_id: &RoomId) -> StoreResult<Vec<GroupSession>> {
        self.inner.group_sessions_for_room(room_id).await
    }

    async fn add_group_session(&self, session: GroupSession) -> StoreResult<bool> {
        self.inner.add_group_session(session).await
    }

    async fn remove_outbound_group_session(&self, room_id: &RoomId) -> StoreResult<bool> {
        self.inner.remove_outbound_group_session(room_id).await
    }
}

// --- Umgebung ---

pub type TestDispatcher = CommandDispatcher<TestStore, LocalDirectory, TestCrypto>;

/// Dispatcher mit lokalen Kollaborateuren
pub struct Umgebung {
    pub store: Arc<TestStore>,
    pub directory: Arc<LocalDirectory>,
    pub crypto: Arc<TestCrypto>,
    pub bus: Arc<BroadcastEventBus>,
    pub dispatcher: Arc<TestDispatcher>,
}

impl Umgebung {
    pub fn neu() -> Self {
        Self::mit_konfig(CommandKonfig::default())
    }

    pub fn mit_konfig(konfig: CommandKonfig) -> Self {
        let directory = Arc::new(LocalDirectory::new(OwnIdentity {
            user_id: ALICE.into(),
            device_id: "ALICEDEV".into(),
        }));
        Self::mit_verzeichnis(directory, konfig)
    }

    /// Gleiches Verzeichnis, frischer Dispatcher (leerer Cache)
    pub fn mit_verzeichnis(directory: Arc<LocalDirectory>, konfig: CommandKonfig) -> Self {
        let store = Arc::new(TestStore::default());
        let crypto = Arc::new(TestCrypto::neu());
        let bus = Arc::new(BroadcastEventBus::neu());
        let dispatcher = CommandDispatcher::neu(
            store.clone(),
            directory.clone(),
            crypto.clone(),
            bus.clone() as Arc<dyn EventBus>,
            konfig,
        );
        Self {
            store,
            directory,
            crypto,
            bus,
            dispatcher,
        }
    }

    /// Fuehrt eine Zeile aus, ohne Raum
    pub async fn ausfuehren(&self, zeile: &str, prompt: &SkriptPrompt) -> (Ausfuehrung, Vec<String>) {
        self.ausfuehren_in(zeile, prompt, None).await
    }

    pub async fn ausfuehren_in(
        &self,
        zeile: &str,
        prompt: &SkriptPrompt,
        raum: Option<&RoomContext>,
    ) -> (Ausfuehrung, Vec<String>) {
        let cmd = parse_line(zeile).expect("keine Befehlszeile");
        let antworten = Antworten::default();
        let mut ctx = CommandContext::neu(&antworten, prompt);
        if let Some(raum) = raum {
            ctx = ctx.mit_raum(raum);
        }
        let ergebnis = self.dispatcher.ausfuehren(&cmd, &ctx).await;
        (ergebnis, antworten.alle())
    }

    /// Bob mit zwei Geraeten beim Server veroeffentlichen
    pub async fn bob_veroeffentlichen(&self) {
        self.directory
            .geraete_veroeffentlichen(
                &BOB.into(),
                vec![geraet(BOB, "BOB1", "Laptop"), geraet(BOB, "BOB2", "Phone")],
            )
            .await
            .unwrap();
    }

    pub async fn trust(&self, user: &str, device: &str) -> TrustState {
        self.store
            .device(&user.into(), &device.into())
            .await
            .unwrap()
            .expect("Geraet fehlt im Store")
            .trust
    }
}

pub fn geraet(user: &str, id: &str, name: &str) -> Device {
    Device {
        user_id: user.into(),
        device_id: id.into(),
        name: name.into(),
        identity_key: format!("curve-{id}"),
        signing_key: format!("ed25519{id}signingkey"),
        trust: TrustState::Unset,
        deleted: false,
    }
}

pub fn sitzung(raum: &str, id: &str) -> GroupSession {
    GroupSession {
        algorithm: MEGOLM_ALGORITHM.into(),
        room_id: raum.into(),
        sender_key: "curve-sender".into(),
        session_id: id.into(),
        session_key: format!("AQAAAA{id}"),
        sender_claimed_keys: Default::default(),
        forwarding_curve25519_key_chain: vec![],
    }
}

/// Alle bisher gesendeten Ereignisse eines Abonnements
pub fn ereignisse(rx: &mut Box<dyn EventReceiver + Send>) -> Vec<VouchEvent> {
    let mut alle = Vec::new();
    while let Some(e) = rx.try_empfangen() {
        alle.push(e);
    }
    alle
}
