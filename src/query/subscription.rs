use std::marker::PhantomData;

use tokio::sync::watch;

use crate::query::state::RawState;
use crate::query::{CacheKey, QueryClient, QueryState, QueryStatus};

struct Attached {
    client: QueryClient,
    key: CacheKey,
    slot_id: u64,
    rx: watch::Receiver<RawState>,
}

/// A live view of one cache entry, held by whatever renders it.
///
/// Dropping the subscription unsubscribes. To follow a key change, assign a
/// new subscription over the old one: the old key is released and the new key
/// is fetched if needed.
///
/// A disabled subscription (unmet precondition such as an empty search query)
/// never touches the cache and always reports `Idle`.
pub struct Subscription<T> {
    attached: Option<Attached>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Subscription<T> {
    pub(crate) fn active(
        client: QueryClient,
        key: CacheKey,
        slot_id: u64,
        rx: watch::Receiver<RawState>,
    ) -> Self {
        Self {
            attached: Some(Attached {
                client,
                key,
                slot_id,
                rx,
            }),
            _marker: PhantomData,
        }
    }

    pub fn disabled() -> Self {
        Self {
            attached: None,
            _marker: PhantomData,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.attached.is_some()
    }

    pub fn key(&self) -> Option<&CacheKey> {
        self.attached.as_ref().map(|a| &a.key)
    }

    pub fn state(&self) -> QueryState<T> {
        match &self.attached {
            Some(attached) => attached.rx.borrow().typed(&attached.key),
            None => QueryState::idle(),
        }
    }

    /// Wait for the next state change. Returns false when disabled or when
    /// the entry has been removed from the cache.
    pub async fn changed(&mut self) -> bool {
        match &mut self.attached {
            Some(attached) => attached.rx.changed().await.is_ok(),
            None => false,
        }
    }

    /// Wait until the entry is no longer loading and return its state.
    pub async fn settled(&mut self) -> QueryState<T> {
        if let Some(attached) = &mut self.attached {
            // An error means the entry was removed; report what we last saw.
            let _ = attached
                .rx
                .wait_for(|state| !matches!(state.status, QueryStatus::Loading))
                .await;
        }
        self.state()
    }

    /// Re-run the loader for this key.
    pub fn refresh(&self) {
        if let Some(attached) = &self.attached {
            attached.client.refresh(&attached.key);
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(attached) = self.attached.take() {
            attached.client.detach(&attached.key, attached.slot_id);
        }
    }
}
