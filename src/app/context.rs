use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher, NewsApi};
use crate::query::QueryClient;
use crate::resources::NewsQueries;
use crate::state::AppState;

/// Everything a page needs, built once at startup and passed down.
pub struct AppContext {
    pub config: Config,
    pub api: NewsApi,
    pub queries: NewsQueries,
    pub app_state: Arc<AppState>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.api)?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Wire the context around a caller-supplied transport.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let api = NewsApi::new(fetcher);
        let client = QueryClient::new(config.cache.clone());
        let queries = NewsQueries::new(client, api.clone());
        let app_state = Arc::new(AppState::new(api.clone()));

        Self {
            config,
            api,
            queries,
            app_state,
        }
    }
}
