//! User-Interactive-Authentication fuer privilegierte Uploads
//!
//! Passwort-Stufen werden direkt abgefragt, alle anderen einstufigen
//! Flows laufen ueber den Browser-Fallback.

use vouch_core::{
    AuthData, CrossSigningPublicKeys, DirectoryClient, DirectoryError, PasswordRequest,
    StageCredential, UiaChallenge, AUTH_TYPE_PASSWORD,
};

use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult, MitKontext};

/// Maximale Anzahl Challenge-Runden pro Upload
const MAX_RUNDEN: usize = 5;

/// Schluessel hochladen und Challenges des Servers beantworten
pub async fn mit_uia_hochladen<D: DirectoryClient>(
    directory: &D,
    ctx: &CommandContext<'_>,
    keys: &CrossSigningPublicKeys,
) -> CommandResult<()> {
    let mut auth: Option<AuthData> = None;

    for runde in 1..=MAX_RUNDEN {
        match directory.upload_cross_signing_keys(keys, auth.as_ref()).await {
            Ok(()) => return Ok(()),
            Err(DirectoryError::UiaErforderlich(challenge)) => {
                tracing::debug!(
                    runde,
                    session = %challenge.session,
                    flows = challenge.flows.len(),
                    "Server verlangt Authentifizierung"
                );
                auth = Some(match stufe_authentifizieren(ctx, &challenge).await? {
                    StageCredential::Password { session, password } => AuthData::Password {
                        session,
                        user: directory.own_identity().user_id.clone(),
                        password,
                    },
                    StageCredential::Fallback { session, stage } => {
                        AuthData::Fallback { session, stage }
                    }
                    StageCredential::KeinNachweis => {
                        return Err(CommandError::Abgebrochen("Password entry cancelled".into()))
                    }
                });
            }
            Err(DirectoryError::AuthFehlgeschlagen(grund)) => {
                return Err(CommandError::Verifikation(format!(
                    "Authentication failed: {grund}"
                )))
            }
            Err(e) => return Err(e).mit_kontext("Failed to publish cross-signing keys"),
        }
    }

    tracing::warn!(runden = MAX_RUNDEN, "UIA nicht abgeschlossen");
    Err(CommandError::Verifikation(
        "Authentication failed: server kept requesting authentication".into(),
    ))
}

/// Nachweis fuer eine Challenge beschaffen
///
/// `KeinNachweis` wenn der Benutzer die Passwort-Eingabe abbricht.
async fn stufe_authentifizieren(
    ctx: &CommandContext<'_>,
    challenge: &UiaChallenge,
) -> CommandResult<StageCredential> {
    if challenge.hat_einstufigen_flow(AUTH_TYPE_PASSWORD) {
        let passwort = ctx
            .prompt
            .ask_password(PasswordRequest {
                title: "Account password",
                label: "",
                placeholder: "correct horse battery staple",
                confirm: false,
            })
            .await;
        return Ok(match passwort {
            Some(password) => StageCredential::Password {
                session: challenge.session.clone(),
                password,
            },
            None => StageCredential::KeinNachweis,
        });
    }

    let stufe = challenge.erste_einzelstufe().ok_or_else(|| {
        CommandError::NichtUnterstuetzt("No supported authentication mechanisms found".into())
    })?;

    ctx.antworten("Opening browser for authentication");
    ctx.prompt
        .open_uia_fallback(stufe, &challenge.session)
        .await
        .map_err(|e| CommandError::Verifikation(format!("Authentication failed: {e}")))?;

    Ok(StageCredential::Fallback {
        session: challenge.session.clone(),
        stage: stufe.to_string(),
    })
}
