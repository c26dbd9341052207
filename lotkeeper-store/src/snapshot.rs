use std::path::Path;

use lotkeeper_core::{LotError, LotResult};
use tracing::{info, warn};

use crate::{LotData, MemoryStore};

/// Read a snapshot file. A missing file is not an error.
pub async fn load(path: &Path) -> LotResult<Option<LotData>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No snapshot at {}, starting empty", path.display());
            return Ok(None);
        }
        Err(e) => return Err(LotError::Storage(format!("read {}: {}", path.display(), e))),
    };

    let data: LotData = serde_json::from_slice(&bytes)
        .map_err(|e| LotError::Storage(format!("parse {}: {}", path.display(), e)))?;

    info!(
        "Loaded snapshot from {}: {} spots, {} tickets, {} sessions",
        path.display(),
        data.spots.len(),
        data.tickets.len(),
        data.sessions.len()
    );
    Ok(Some(data))
}

/// Write through a temp file and rename, so a crash never leaves a torn snapshot.
pub async fn save(path: &Path, data: &LotData) -> LotResult<()> {
    let json = serde_json::to_vec_pretty(data)
        .map_err(|e| LotError::Storage(format!("encode snapshot: {}", e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LotError::Storage(format!("create {}: {}", parent.display(), e)))?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| LotError::Storage(format!("write {}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| LotError::Storage(format!("rename {}: {}", tmp.display(), e)))?;

    Ok(())
}

/// Restore the store from disk if a snapshot exists
pub async fn restore(store: &MemoryStore, path: &Path) -> LotResult<bool> {
    match load(path).await? {
        Some(data) => {
            store.import(data).await;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub async fn persist(store: &MemoryStore, path: &Path) -> LotResult<()> {
    let data = store.export().await;
    if let Err(e) = save(path, &data).await {
        warn!("Snapshot failed: {}", e);
        return Err(e);
    }
    Ok(())
}
