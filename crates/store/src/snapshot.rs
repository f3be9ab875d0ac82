//! JSON-Schnappschuesse auf Disk
//!
//! Store und Verzeichnis halten ihren Zustand im Speicher und schreiben
//! nach jeder Aenderung einen vollstaendigen Schnappschuss. Geschrieben
//! wird in eine temporaere Datei, die danach umbenannt wird.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Laedt einen Schnappschuss, `None` wenn die Datei nicht existiert
pub async fn laden<T: DeserializeOwned>(pfad: &Path) -> std::io::Result<Option<T>> {
    match tokio::fs::read(pfad).await {
        Ok(data) => {
            let wert = serde_json::from_slice(&data)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            tracing::debug!(path = %pfad.display(), bytes = data.len(), "Schnappschuss geladen");
            Ok(Some(wert))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Schreibt einen Schnappschuss atomar
pub async fn schreiben<T: Serialize>(pfad: &Path, wert: &T) -> std::io::Result<()> {
    let data = serde_json::to_vec_pretty(wert)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    // Elternverzeichnis anlegen falls noetig
    if let Some(parent) = pfad.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = tmp_pfad(pfad);
    tokio::fs::write(&tmp, &data).await?;
    tokio::fs::rename(&tmp, pfad).await?;
    tracing::debug!(path = %pfad.display(), bytes = data.len(), "Schnappschuss gespeichert");
    Ok(())
}

fn tmp_pfad(pfad: &Path) -> PathBuf {
    let mut name = pfad.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    pfad.with_file_name(name)
}
