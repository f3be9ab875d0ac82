//! vouch-shell – Bibliotheks-Root
//!
//! Baut aus der Konfiguration die lokalen Kollaborateure und den
//! Befehls-Dispatcher zusammen und verarbeitet Eingabezeilen.

pub mod config;
pub mod terminal;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;

use vouch_commands::{
    parse_line, Ausfuehrung, Command, CommandContext, CommandDispatcher, RoomContext,
};
use vouch_core::{EventBus, Reply, UserPrompt};
use vouch_crypto::SoftwareCryptoEngine;
use vouch_store::{BroadcastEventBus, LocalDirectory, MemoryTrustStore};

use config::VouchConfig;

pub type ShellDispatcher = CommandDispatcher<MemoryTrustStore, LocalDirectory, SoftwareCryptoEngine>;

/// Was die Eingabeschleife nach einer Zeile tun soll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steuerung {
    Weiter,
    Beenden,
}

/// Haelt den Shell-Zustand zusammen
pub struct Shell {
    config: VouchConfig,
    dispatcher: Arc<ShellDispatcher>,
    bus: Arc<BroadcastEventBus>,
    raum: Option<RoomContext>,
}

impl Shell {
    /// Laedt Trust-Store und Verzeichnis und erstellt den Dispatcher
    pub async fn starten(config: VouchConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.daten.verzeichnis)
            .await
            .with_context(|| {
                format!(
                    "Datenverzeichnis '{}' nicht anlegbar",
                    config.daten.verzeichnis.display()
                )
            })?;

        let store = MemoryTrustStore::laden(config.store_pfad())
            .await
            .context("Trust-Store nicht ladbar")?;
        let directory = LocalDirectory::laden(config.own_identity(), config.verzeichnis_pfad())
            .await
            .context("Verzeichnis nicht ladbar")?;
        if let Some(hash) = &config.konto.passwort_hash {
            directory
                .passwort_hash_setzen(hash)
                .await
                .context("Passwort-Hash aus der Konfiguration ungueltig")?;
        }
        directory
            .eigenes_geraet_registrieren(&config.konto.geraetename)
            .await
            .context("Eigenes Geraet nicht registrierbar")?;

        let crypto = SoftwareCryptoEngine::neu()
            .mit_pbkdf2_iterationen(config.ssss.pbkdf2_iterationen)
            .mit_export_parametern(config.export_parameter());
        let bus = Arc::new(BroadcastEventBus::neu());
        ereignisse_protokollieren(&bus);

        let dispatcher = CommandDispatcher::neu(
            Arc::new(store),
            Arc::new(directory),
            Arc::new(crypto),
            bus.clone() as Arc<dyn EventBus>,
            config.command_konfig(),
        );
        let raum = config.raum.id.as_deref().map(|id| config.raum_kontext(id));

        tracing::info!(
            user_id = %config.konto.user_id,
            device_id = %config.konto.device_id,
            daten = %config.daten.verzeichnis.display(),
            "Shell gestartet"
        );
        Ok(Self {
            config,
            dispatcher,
            bus,
            raum,
        })
    }

    pub fn bus(&self) -> &BroadcastEventBus {
        &self.bus
    }

    pub fn raum(&self) -> Option<&RoomContext> {
        self.raum.as_ref()
    }

    /// Verarbeitet eine Eingabezeile
    ///
    /// - `/befehl ...` wird ausgefuehrt
    /// - `?/befehl ...` zeigt die Vervollstaendigung
    pub async fn zeile_verarbeiten(
        &mut self,
        zeile: &str,
        reply: &dyn Reply,
        prompt: &dyn UserPrompt,
    ) -> Steuerung {
        let zeile = zeile.trim_end_matches(['\r', '\n']);
        if zeile.trim().is_empty() {
            return Steuerung::Weiter;
        }
        if let Some(rest) = zeile.trim_start().strip_prefix('?') {
            self.vervollstaendigen(rest, reply).await;
            return Steuerung::Weiter;
        }
        let Some(cmd) = parse_line(zeile) else {
            reply.reply("Commands start with `/`. Type /help for a list of commands.");
            return Steuerung::Weiter;
        };

        match cmd.command.as_str() {
            "quit" | "exit" => return Steuerung::Beenden,
            "help" => reply.reply(&hilfe()),
            "room" => self.raum_wechseln(cmd.arg(0), reply),
            _ => {
                let ctx = CommandContext::neu(reply, prompt);
                let ctx = match &self.raum {
                    Some(raum) => ctx.mit_raum(raum),
                    None => ctx,
                };
                if self.dispatcher.ausfuehren(&cmd, &ctx).await == Ausfuehrung::Unbekannt {
                    reply.reply(&format!(
                        "Unknown command /{}. Type /help for a list of commands.",
                        cmd.orig_command
                    ));
                }
            }
        }
        Steuerung::Weiter
    }

    async fn vervollstaendigen(&self, zeile: &str, reply: &dyn Reply) {
        let Some(cmd) = parse_line(zeile) else {
            return;
        };
        let ergebnis = self.dispatcher.autocomplete(&cmd, self.raum.as_ref()).await;
        if let Some(neu) = ergebnis.neuer_text {
            reply.reply(&neu);
        } else if !ergebnis.kandidaten.is_empty() {
            reply.reply(&ergebnis.kandidaten.join("\n"));
        }
    }

    fn raum_wechseln(&mut self, room_id: Option<&str>, reply: &dyn Reply) {
        match room_id {
            Some(id) => {
                self.raum = Some(self.config.raum_kontext(id));
                reply.reply(&format!("Now in room {id}"));
            }
            None => {
                self.raum = None;
                reply.reply("Left room");
            }
        }
    }
}

fn hilfe() -> String {
    let mut zeilen = vec!["Available commands:".to_string()];
    zeilen.extend(Command::alle_namen().map(|name| format!("  /{name}")));
    zeilen.push("  /room [room ID] - Enter a room, or leave it without argument".into());
    zeilen.push("  /help, /quit".into());
    zeilen.push("Prefix a command with `?` to autocomplete it.".into());
    zeilen.join("\n")
}

/// Protokolliert alle Bus-Ereignisse im Hintergrund
fn ereignisse_protokollieren(bus: &BroadcastEventBus) {
    let mut rx = bus.receiver();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => tracing::info!(?event, "Ereignis"),
                Err(RecvError::Lagged(verpasst)) => {
                    tracing::warn!(verpasst, "Ereignis-Protokoll ist zurueckgefallen");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
