//! User-initiated resync with a single-flight guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::error::SyncError;

/// Asks the remote side to refresh its published snapshot.
#[async_trait]
pub trait SyncEndpoint: Send + Sync {
    async fn request_refresh(&self) -> Result<(), SyncError>;
}

pub struct SyncTrigger {
    endpoint: Arc<dyn SyncEndpoint>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path, including cancellation.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncTrigger {
    pub fn new(endpoint: Arc<dyn SyncEndpoint>) -> Self {
        Self {
            endpoint,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Fires one refresh request. A concurrent call is refused with
    /// [`SyncError::InFlight`] rather than queued.
    pub async fn trigger(&self) -> Result<(), SyncError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("sync already in flight");
            return Err(SyncError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        tracing::info!("sync requested");
        match self.endpoint.request_refresh().await {
            Ok(()) => {
                tracing::info!("sync accepted by remote");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "sync failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct GatedEndpoint {
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SyncEndpoint for GatedEndpoint {
        async fn request_refresh(&self) -> Result<(), SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(())
        }
    }

    struct DownEndpoint;

    #[async_trait]
    impl SyncEndpoint for DownEndpoint {
        async fn request_refresh(&self) -> Result<(), SyncError> {
            Err(SyncError::Unreachable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn second_trigger_is_refused_while_first_runs() {
        let endpoint = Arc::new(GatedEndpoint::default());
        let trigger = SyncTrigger::new(endpoint.clone());

        let first = trigger.trigger();
        let second = async {
            tokio::task::yield_now().await;
            let refused = trigger.trigger().await;
            endpoint.release.notify_one();
            refused
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(SyncError::InFlight)));
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
        assert!(!trigger.is_in_flight());
    }

    #[tokio::test]
    async fn failure_clears_the_flag() {
        let trigger = SyncTrigger::new(Arc::new(DownEndpoint));

        assert!(matches!(trigger.trigger().await, Err(SyncError::Unreachable(_))));
        assert!(!trigger.is_in_flight());
        assert!(matches!(trigger.trigger().await, Err(SyncError::Unreachable(_))));
    }
}
