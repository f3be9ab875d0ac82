//! Aufruf-Kontext eines Befehls

use vouch_core::{Reply, RoomId, UserId, UserPrompt};

/// Mitglied des aktuellen Raums (fuer Autocomplete)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMember {
    pub user_id: UserId,
    pub display_name: Option<String>,
}

/// Raum in dem der Befehl eingegeben wurde
#[derive(Debug, Clone, Default)]
pub struct RoomContext {
    pub room_id: Option<RoomId>,
    pub members: Vec<RoomMember>,
}

impl RoomContext {
    pub fn neu(room_id: RoomId, members: Vec<RoomMember>) -> Self {
        Self {
            room_id: Some(room_id),
            members,
        }
    }
}

/// UI-seitige Kollaborateure eines einzelnen Aufrufs
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub reply: &'a dyn Reply,
    pub prompt: &'a dyn UserPrompt,
    pub room: Option<&'a RoomContext>,
}

impl<'a> CommandContext<'a> {
    pub fn neu(reply: &'a dyn Reply, prompt: &'a dyn UserPrompt) -> Self {
        Self {
            reply,
            prompt,
            room: None,
        }
    }

    pub fn mit_raum(mut self, room: &'a RoomContext) -> Self {
        self.room = Some(room);
        self
    }

    /// Antwort senden, abschliessende Zeilenumbrueche werden entfernt
    pub fn antworten(&self, text: impl AsRef<str>) {
        self.reply.reply(text.as_ref().trim_end_matches('\n'));
    }

    /// ID des aktuellen Raums
    pub fn room_id(&self) -> Option<&RoomId> {
        self.room.and_then(|r| r.room_id.as_ref())
    }
}
