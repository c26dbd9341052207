use std::path::PathBuf;
use std::sync::Arc;

use lotkeeper_store::{snapshot, MemoryStore};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

/// Periodically writes the store to its snapshot file.
pub fn start_snapshot_worker(
    store: Arc<MemoryStore>,
    path: PathBuf,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Snapshot worker started, writing {} every {:?}", path.display(), every);

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; the state was just loaded.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match snapshot::persist(&store, &path).await {
                Ok(()) => debug!("Snapshot written to {}", path.display()),
                Err(e) => error!("Snapshot worker failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotkeeper_core::SpotRepository;
    use lotkeeper_shared::{ParkingSpot, VehicleType};

    #[tokio::test]
    async fn test_worker_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lot.json");
        let store = Arc::new(MemoryStore::new());
        store
            .save_spot(&ParkingSpot::new("A", 1, VehicleType::Car, None))
            .await
            .unwrap();

        let handle = start_snapshot_worker(store, path.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();

        let restored = snapshot::load(&path).await.unwrap().unwrap();
        assert_eq!(restored.spots.len(), 1);
    }
}
