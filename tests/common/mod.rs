#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use newsdesk::app::{ApiError, ApiResult};
use newsdesk::fetcher::{Endpoint, Fetcher, RequestOptions};

/// In-memory fetcher keyed by endpoint path. Records every request it sees.
#[derive(Default)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn route(self, path: &str, body: Value) -> Self {
        self.routes.lock().unwrap().insert(path.to_string(), body);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Endpoints requested so far, as `/path?query`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn request(&self, endpoint: &Endpoint, _options: RequestOptions) -> ApiResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(endpoint.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let path = format!("/{}", endpoint.segments().join("/"));
        let body = self.routes.lock().unwrap().get(&path).cloned();
        body.ok_or_else(|| ApiError::Http {
            status: 404,
            message: "Not found".into(),
        })
    }
}

pub fn shared(fetcher: FakeFetcher) -> Arc<FakeFetcher> {
    Arc::new(fetcher)
}
