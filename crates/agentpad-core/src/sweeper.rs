//! Background TTL sweep
//!
//! Periodically calls [`SessionStore::cleanup`] for backends without native
//! expiry. The task stops when its cancellation token fires.

use crate::store::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Spawn the sweep loop.
///
/// The first sweep runs one `interval` after spawning. Failed sweeps are
/// logged and retried on the next tick.
pub fn spawn_sweeper(
    store: Arc<SessionStore>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "Session sweeper started");
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Session sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match store.cleanup().await {
                        Ok(0) => debug!("Sweep found no expired sessions"),
                        Ok(removed) => info!(removed, "Expired sessions swept"),
                        Err(e) => error!(error = %e, "Session sweep failed"),
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, StorageBackend};

    #[tokio::test]
    async fn test_sweeper_evicts_and_stops() {
        let backend = Arc::new(MemoryBackend::new(Duration::from_millis(20)).unwrap());
        let store = Arc::new(SessionStore::new(backend.clone()));
        store.create_session(None).await.unwrap();

        let cancel = CancellationToken::new();
        let handle = spawn_sweeper(store.clone(), Duration::from_millis(10), cancel.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;

        // Sweep physically removed the entry, so a fresh sweep has nothing to do
        assert_eq!(backend.sweep_expired().await.unwrap(), 0);
        assert_eq!(store.session_count().await.unwrap(), 0);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_before_first_tick() {
        let backend = Arc::new(MemoryBackend::new(Duration::from_secs(60)).unwrap());
        let store = Arc::new(SessionStore::new(backend));
        let cancel = CancellationToken::new();
        let handle = spawn_sweeper(store, Duration::from_secs(3600), cancel.clone());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
