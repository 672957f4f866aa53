//! Session-wide data shared by every page: ads, navigation categories and
//! ticker headlines.
//!
//! [`AppState`] is constructed explicitly and handed to whoever needs it; it
//! loads once through [`AppState::init`] and lives for the session. It does
//! not go through the query cache.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{error, info};

use crate::app::{ApiError, ApiResult};
use crate::domain::{normalize_headlines, Ad, Article, Category};
use crate::fetcher::NewsApi;
use crate::query::QueryStatus;
use crate::resources::DEFAULT_HEADLINES_LIMIT;

/// One independently loaded list.
#[derive(Debug, Clone)]
pub struct Resource<T> {
    pub items: Vec<T>,
    pub is_loading: bool,
    pub error: Option<ApiError>,
    pub loaded_at: Option<DateTime<Utc>>,
    issued: u64,
    resolved: u64,
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            error: None,
            loaded_at: None,
            issued: 0,
            resolved: 0,
        }
    }
}

impl<T> Resource<T> {
    pub fn status(&self) -> QueryStatus {
        if self.is_loading {
            QueryStatus::Loading
        } else if self.error.is_some() {
            QueryStatus::Error
        } else if self.loaded_at.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Idle
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GlobalSnapshot {
    pub ads: Resource<Ad>,
    pub categories: Resource<Category>,
    pub headlines: Resource<Article>,
}

/// What to do with the current items when a refresh fails.
#[derive(Clone, Copy)]
enum OnError {
    Keep,
    Clear,
}

pub struct AppState {
    api: NewsApi,
    tx: watch::Sender<GlobalSnapshot>,
    headlines_limit: usize,
}

impl AppState {
    pub fn new(api: NewsApi) -> Self {
        let (tx, _) = watch::channel(GlobalSnapshot::default());
        Self {
            api,
            tx,
            headlines_limit: DEFAULT_HEADLINES_LIMIT,
        }
    }

    pub fn with_headlines_limit(mut self, limit: usize) -> Self {
        self.headlines_limit = limit;
        self
    }

    /// Load ads, categories and headlines concurrently. A failure in one
    /// leaves the others untouched.
    pub async fn init(&self) {
        tokio::join!(
            self.refresh_ads(),
            self.refresh_categories(),
            self.refresh_headlines()
        );
    }

    pub async fn refresh_ads(&self) {
        info!("fetching ads");
        self.refresh("ads", |s| &mut s.ads, OnError::Keep, self.api.ads())
            .await;
    }

    pub async fn refresh_categories(&self) {
        info!("fetching categories");
        self.refresh(
            "categories",
            |s| &mut s.categories,
            OnError::Keep,
            self.api.categories(),
        )
        .await;
    }

    pub async fn refresh_headlines(&self) {
        info!("fetching headlines");
        let api = self.api.clone();
        let limit = self.headlines_limit;
        let fetch = async move { api.articles_raw(limit).await.map(normalize_headlines) };
        self.refresh("headlines", |s| &mut s.headlines, OnError::Clear, fetch)
            .await;
    }

    async fn refresh<T, Fut>(
        &self,
        label: &'static str,
        select: fn(&mut GlobalSnapshot) -> &mut Resource<T>,
        on_error: OnError,
        fetch: Fut,
    ) where
        Fut: std::future::Future<Output = ApiResult<Vec<T>>>,
    {
        let mut seq = 0;
        self.tx.send_modify(|s| {
            let resource = select(s);
            resource.issued += 1;
            seq = resource.issued;
            resource.is_loading = true;
        });

        let outcome = fetch.await;
        if let Err(err) = &outcome {
            error!(resource = label, error = %err, "refresh failed");
        }

        self.tx.send_modify(|s| {
            let resource = select(s);
            // A later refresh already landed.
            if seq <= resource.resolved {
                return;
            }
            resource.resolved = seq;
            resource.is_loading = seq < resource.issued;

            match outcome {
                Ok(items) => {
                    resource.items = items;
                    resource.error = None;
                    resource.loaded_at = Some(Utc::now());
                }
                Err(err) => {
                    if let OnError::Clear = on_error {
                        resource.items.clear();
                    }
                    resource.error = Some(err);
                }
            }
        });
    }

    pub fn snapshot(&self) -> GlobalSnapshot {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every change.
    pub fn watch(&self) -> watch::Receiver<GlobalSnapshot> {
        self.tx.subscribe()
    }

    pub fn ads(&self) -> Vec<Ad> {
        self.tx.borrow().ads.items.clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.tx.borrow().categories.items.clone()
    }

    pub fn headlines(&self) -> Vec<Article> {
        self.tx.borrow().headlines.items.clone()
    }

    pub fn is_ads_loading(&self) -> bool {
        self.tx.borrow().ads.is_loading
    }

    pub fn is_categories_loading(&self) -> bool {
        self.tx.borrow().categories.is_loading
    }

    pub fn is_headlines_loading(&self) -> bool {
        self.tx.borrow().headlines.is_loading
    }

    /// Drop all loaded data and flags.
    pub fn reset(&self) {
        self.tx.send_replace(GlobalSnapshot::default());
    }
}
