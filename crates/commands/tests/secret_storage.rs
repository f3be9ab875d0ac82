//! Integrationstests: `/ssss status|generate|set-default`

mod common;

use common::*;
use vouch_commands::{Ausfuehrung, FehlerKategorie};
use vouch_core::DirectoryClient;

/// Key-ID aus "Successfully generated key <id>\nRecovery key: ..."
fn key_id(antwort: &str) -> String {
    antwort
        .lines()
        .next()
        .and_then(|z| z.strip_prefix("Successfully generated key "))
        .expect("unerwartete Antwort")
        .to_string()
}

#[tokio::test]
async fn status_ohne_standardschluessel() {
    let u = Umgebung::neu();
    let (ergebnis, antworten) = u.ausfuehren("/ssss status", &SkriptPrompt::leer()).await;
    assert_eq!(ergebnis, Ausfuehrung::Fehlgeschlagen(FehlerKategorie::NotFound));
    assert_eq!(antworten, vec!["SSSS is not set up: no default key set"]);
}

#[tokio::test]
async fn generieren_ohne_standard_gibt_hinweis() {
    let u = Umgebung::neu();
    let prompt = SkriptPrompt::neu(&[Some("geheim")]);

    let (ergebnis, antworten) = u.ausfuehren("/SSSS generate", &prompt).await;
    assert_eq!(ergebnis, Ausfuehrung::Erledigt);
    assert_eq!(antworten.len(), 2);
    let id = key_id(&antworten[0]);
    assert!(antworten[0].contains("\nRecovery key: "));
    assert_eq!(
        antworten[1],
        format!("You can use `/SSSS set-default {id}` to set it as the default")
    );
    assert_eq!(prompt.anfragen(), vec![("Passphrase".to_string(), false)]);
    assert_eq!(u.directory.default_ssss_key_id().await.unwrap(), None);
    assert!(u.directory.ssss_key_metadata(&id).await.is_ok());
}

#[tokio::test]
async fn generieren_als_standard_und_status() {
    let u = Umgebung::neu();
    let (_, antworten) = u
        .ausfuehren("/ssss generate --set-default", &SkriptPrompt::neu(&[Some("geheim")]))
        .await;
    let id = key_id(&antworten[0]);
    assert_eq!(antworten[1], format!("Successfully set key {id} as default"));

    let (ergebnis, antworten) = u.ausfuehren("/ssss status", &SkriptPrompt::leer()).await;
    assert_eq!(ergebnis, Ausfuehrung::Erledigt);
    assert_eq!(
        antworten,
        vec![format!(
            "Default key is set.\n  Key ID: {id}\n  Has passphrase: yes (alg=m.pbkdf2,bits=256,iter=1000)\n  Algorithm: m.secret_storage.v1.aes-hmac-sha2"
        )]
    );
}

#[tokio::test]
async fn leere_passphrase_erzeugt_zufallsschluessel() {
    let u = Umgebung::neu();
    let (_, antworten) = u
        .ausfuehren("/ssss generate --set-default", &SkriptPrompt::neu(&[Some("")]))
        .await;
    let id = key_id(&antworten[0]);

    let (_, antworten) = u
        .ausfuehren(&format!("/ssss status {id}"), &SkriptPrompt::leer())
        .await;
    assert!(antworten[0].contains("Has passphrase: no"));
}

#[tokio::test]
async fn abbruch_der_passphrase() {
    let u = Umgebung::neu();
    let (ergebnis, antworten) = u.ausfuehren("/ssss generate", &SkriptPrompt::neu(&[None])).await;
    assert_eq!(ergebnis, Ausfuehrung::Fehlgeschlagen(FehlerKategorie::Cancelled));
    assert_eq!(antworten, vec!["Passphrase entry cancelled"]);
}

#[tokio::test]
async fn standard_setzen() {
    let u = Umgebung::neu();
    let (_, antworten) = u
        .ausfuehren("/ssss generate", &SkriptPrompt::neu(&[Some("geheim")]))
        .await;
    let id = key_id(&antworten[0]);

    let (ergebnis, antworten) = u
        .ausfuehren(&format!("/ssss set-default {id}"), &SkriptPrompt::leer())
        .await;
    assert_eq!(ergebnis, Ausfuehrung::Erledigt);
    assert_eq!(antworten, vec![format!("Successfully set key {id} as default")]);
    assert_eq!(u.directory.default_ssss_key_id().await.unwrap(), Some(id));
}

#[tokio::test]
async fn standard_setzen_unbekannter_schluessel() {
    let u = Umgebung::neu();
    let (ergebnis, antworten) = u
        .ausfuehren("/ssss set-default GIBTESNICHT", &SkriptPrompt::leer())
        .await;
    assert_eq!(ergebnis, Ausfuehrung::Fehlgeschlagen(FehlerKategorie::NotFound));
    assert_eq!(antworten, vec!["Couldn't find key data on server"]);
    assert_eq!(u.directory.default_ssss_key_id().await.unwrap(), None);

    let (_, antworten) = u.ausfuehren("/ssss set-default", &SkriptPrompt::leer()).await;
    assert_eq!(antworten, vec!["Usage: /ssss set-default <key ID>"]);
}

#[tokio::test]
async fn unbekannter_unterbefehl_zeigt_hilfe() {
    let u = Umgebung::neu();
    let (ergebnis, antworten) = u.ausfuehren("/ssss", &SkriptPrompt::leer()).await;
    assert_eq!(ergebnis, Ausfuehrung::Fehlgeschlagen(FehlerKategorie::Usage));
    assert!(antworten[0].starts_with("Usage: /ssss <subcommand> [...]"));

    let (_, antworten) = u.ausfuehren("/ssss loeschen", &SkriptPrompt::leer()).await;
    assert!(antworten[0].contains("* status [key ID] - Check the status of your SSSS."));
}
