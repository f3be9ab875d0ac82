//! Integrationstests: import / export / export-room / reset-session

mod common;

use common::*;
use vouch_commands::{Ausfuehrung, FehlerKategorie, RoomContext};
use vouch_core::{EventBus, TrustStore, VouchEvent};

const RAUM: &str = "!raum:example.org";

async fn mit_sitzungen() -> Umgebung {
    let u = Umgebung::neu();
    for s in [sitzung(RAUM, "s1"), sitzung(RAUM, "s2"), sitzung("!anders:example.org", "s3")] {
        assert!(u.store.add_group_session(s).await.unwrap());
    }
    u
}

fn raum() -> RoomContext {
    RoomContext::neu(RAUM.into(), vec![])
}

#[tokio::test]
async fn export_und_import_in_neuen_store() {
    let u = mit_sitzungen().await;
    let dir = tempfile::tempdir().unwrap();
    let pfad = dir.path().join("keys.txt");
    let zeile = format!("/export {}", pfad.display());

    let prompt = SkriptPrompt::neu(&[Some("export-pass")]);
    let (ergebnis, antworten) = u.ausfuehren(&zeile, &prompt).await;
    assert_eq!(ergebnis, Ausfuehrung::Erledigt);
    assert_eq!(
        antworten,
        vec![format!("Successfully exported 3 sessions to {}", pfad.display())]
    );
    assert_eq!(prompt.anfragen(), vec![("Key export".to_string(), true)]);
    let inhalt = std::fs::read_to_string(&pfad).unwrap();
    assert!(inhalt.starts_with("-----BEGIN MEGOLM SESSION DATA-----"));

    let ziel = Umgebung::neu();
    let import = format!("/import {}", pfad.display());
    let prompt = SkriptPrompt::neu(&[Some("export-pass")]);
    let (ergebnis, antworten) = ziel.ausfuehren(&import, &prompt).await;
    assert_eq!(ergebnis, Ausfuehrung::Erledigt);
    assert_eq!(antworten, vec!["Successfully imported 3/3 sessions"]);
    assert_eq!(prompt.anfragen(), vec![("Key import".to_string(), false)]);
    assert_eq!(ziel.store.all_group_sessions().await.unwrap().len(), 3);

    // Duplikate werden nicht erneut gezaehlt
    let (_, antworten) = ziel
        .ausfuehren(&import, &SkriptPrompt::neu(&[Some("export-pass")]))
        .await;
    assert_eq!(antworten, vec!["Successfully imported 0/3 sessions"]);
}

#[cfg(unix)]
#[tokio::test]
async fn exportdatei_ist_nur_fuer_besitzer_lesbar() {
    use std::os::unix::fs::PermissionsExt;

    let u = mit_sitzungen().await;
    let dir = tempfile::tempdir().unwrap();
    let pfad = dir.path().join("keys.txt");
    u.ausfuehren(
        &format!("/export-keys {}", pfad.display()),
        &SkriptPrompt::neu(&[Some("pw")]),
    )
    .await;
    let modus = std::fs::metadata(&pfad).unwrap().permissions().mode();
    assert_eq!(modus & 0o777, 0o400);
}

#[tokio::test]
async fn import_mit_falscher_passphrase() {
    let u = mit_sitzungen().await;
    let dir = tempfile::tempdir().unwrap();
    let pfad = dir.path().join("keys.txt");
    u.ausfuehren(
        &format!("/export {}", pfad.display()),
        &SkriptPrompt::neu(&[Some("richtig")]),
    )
    .await;

    let ziel = Umgebung::neu();
    let (ergebnis, antworten) = ziel
        .ausfuehren(
            &format!("/import {}", pfad.display()),
            &SkriptPrompt::neu(&[Some("falsch")]),
        )
        .await;
    assert_eq!(ergebnis, Ausfuehrung::Fehlgeschlagen(FehlerKategorie::Verification));
    assert_eq!(
        antworten,
        vec!["Failed to import sessions: decryption failed: wrong passphrase or corrupted file"]
    );
    assert!(ziel.store.all_group_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn import_fehlende_datei() {
    let u = Umgebung::neu();
    let dir = tempfile::tempdir().unwrap();
    let pfad = dir.path().join("gibt-es-nicht.txt");
    let prompt = SkriptPrompt::neu(&[Some("pw")]);

    let (ergebnis, antworten) = u.ausfuehren(&format!("/import {}", pfad.display()), &prompt).await;
    assert_eq!(ergebnis, Ausfuehrung::Fehlgeschlagen(FehlerKategorie::Intern));
    assert!(antworten[0].starts_with(&format!("Failed to read {}: ", pfad.display())));
    // Ohne lesbare Datei wird keine Passphrase abgefragt
    assert!(prompt.anfragen().is_empty());
}

#[tokio::test]
async fn import_ohne_pfad_und_abbruch() {
    let u = Umgebung::neu();
    let (ergebnis, antworten) = u.ausfuehren("/import", &SkriptPrompt::leer()).await;
    assert_eq!(ergebnis, Ausfuehrung::Fehlgeschlagen(FehlerKategorie::Usage));
    assert_eq!(antworten, vec!["Usage: /import <file>"]);

    let dir = tempfile::tempdir().unwrap();
    let pfad = dir.path().join("keys.txt");
    std::fs::write(&pfad, "irrelevant").unwrap();
    let (ergebnis, antworten) = u
        .ausfuehren(&format!("/import {}", pfad.display()), &SkriptPrompt::neu(&[None]))
        .await;
    assert_eq!(ergebnis, Ausfuehrung::Fehlgeschlagen(FehlerKategorie::Cancelled));
    assert_eq!(antworten, vec!["Passphrase entry cancelled"]);
}

#[tokio::test]
async fn raum_export_nur_mit_raum() {
    let u = mit_sitzungen().await;
    let dir = tempfile::tempdir().unwrap();
    let pfad = dir.path().join("raum.txt");
    let zeile = format!("/export-room {}", pfad.display());

    let (ergebnis, antworten) = u.ausfuehren(&zeile, &SkriptPrompt::neu(&[Some("pw")])).await;
    assert_eq!(ergebnis, Ausfuehrung::Fehlgeschlagen(FehlerKategorie::Usage));
    assert_eq!(antworten, vec!["/export-room can only be used in a room"]);

    let raum = raum();
    let (ergebnis, antworten) = u
        .ausfuehren_in(&zeile, &SkriptPrompt::neu(&[Some("pw")]), Some(&raum))
        .await;
    assert_eq!(ergebnis, Ausfuehrung::Erledigt);
    assert_eq!(
        antworten,
        vec![format!("Successfully exported 2 sessions to {}", pfad.display())]
    );
}

#[tokio::test]
async fn ausgehende_sitzung_zuruecksetzen() {
    let u = Umgebung::neu();
    u.store
        .inner
        .outbound_session_setzen(&RAUM.into(), "out-1")
        .await
        .unwrap();
    let mut rx = u.bus.abonnieren();
    let raum = raum();

    let (ergebnis, antworten) = u
        .ausfuehren_in("/reset-session", &SkriptPrompt::leer(), Some(&raum))
        .await;
    assert_eq!(ergebnis, Ausfuehrung::Erledigt);
    assert_eq!(antworten, vec!["Removed outbound group session for this room"]);
    assert_eq!(u.store.inner.outbound_session(&RAUM.into()), None);
    assert_eq!(
        ereignisse(&mut rx),
        vec![VouchEvent::OutboundSessionDiscarded { room_id: RAUM.into() }]
    );

    // Ohne Sitzung kein Fehler
    let (ergebnis, antworten) = u
        .ausfuehren_in("/reset-session", &SkriptPrompt::leer(), Some(&raum))
        .await;
    assert_eq!(ergebnis, Ausfuehrung::Erledigt);
    assert_eq!(antworten, vec!["No outbound group session to remove for this room"]);
    assert!(ereignisse(&mut rx).is_empty());

    let (ergebnis, _) = u.ausfuehren("/reset-session", &SkriptPrompt::leer()).await;
    assert_eq!(ergebnis, Ausfuehrung::Fehlgeschlagen(FehlerKategorie::Usage));
}
