use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::app::{ApiError, ApiResult};
use crate::domain::{Ad, Article, Author, Category};
use crate::fetcher::{Endpoint, Fetcher};

/// Paged listing envelope returned by `/articles`.
#[derive(Debug, Deserialize)]
struct ArticlePage {
    articles: Vec<Article>,
}

/// Typed accessors for every REST endpoint the front-end consumes.
#[derive(Clone)]
pub struct NewsApi {
    fetcher: Arc<dyn Fetcher>,
}

impl NewsApi {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    /// GET an endpoint and decode the JSON body into `T`.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> ApiResult<T> {
        let value = self.fetcher.get_json(endpoint).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::Parse(format!("unexpected payload from {}: {}", endpoint, e)))
    }

    /// `/articles?limit=N` as returned by the server, before any unwrapping.
    pub async fn articles_raw(&self, limit: usize) -> ApiResult<Value> {
        self.fetcher
            .get_json(&Endpoint::path("/articles").query("limit", limit))
            .await
    }

    pub async fn latest_articles(&self, limit: usize) -> ApiResult<Vec<Article>> {
        let page: ArticlePage = self
            .get(&Endpoint::path("/articles").query("limit", limit))
            .await?;
        Ok(page.articles)
    }

    pub async fn trending_articles(&self, limit: usize) -> ApiResult<Vec<Article>> {
        let endpoint = Endpoint::path("/articles")
            .query("limit", limit)
            .query("sort", "views");
        let page: ArticlePage = self.get(&endpoint).await?;
        Ok(page.articles)
    }

    pub async fn featured_articles(&self) -> ApiResult<Vec<Article>> {
        self.get(&Endpoint::path("/articles/featured")).await
    }

    pub async fn articles_by_category(&self, category: &str, limit: usize) -> ApiResult<Vec<Article>> {
        let endpoint = Endpoint::path("/articles/category")
            .segment(category)
            .query("limit", limit);
        self.get(&endpoint).await
    }

    pub async fn articles_by_subcategory(
        &self,
        category: &str,
        subcategory: &str,
        limit: usize,
    ) -> ApiResult<Vec<Article>> {
        let endpoint = Endpoint::path("/articles/subcategory")
            .segment(category)
            .segment(subcategory)
            .query("limit", limit);
        self.get(&endpoint).await
    }

    /// Single article by its `category/subcategory/slug-id` path.
    pub async fn article(&self, seo_path: &str) -> ApiResult<Article> {
        let endpoint = seo_path
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(Endpoint::path("/articles"), |endpoint, s| endpoint.segment(s));
        self.get(&endpoint).await
    }

    pub async fn search_articles(&self, query: &str, limit: usize) -> ApiResult<Vec<Article>> {
        let endpoint = Endpoint::path("/articles/search")
            .query("q", query)
            .query("limit", limit);
        self.get(&endpoint).await
    }

    pub async fn articles_by_author(&self, author_id: &str, limit: usize) -> ApiResult<Vec<Article>> {
        let endpoint = Endpoint::path("/articles/author")
            .segment(author_id)
            .query("limit", limit);
        self.get(&endpoint).await
    }

    pub async fn articles_by_tag(&self, tag: &str, limit: usize) -> ApiResult<Vec<Article>> {
        let endpoint = Endpoint::path("/articles/tag")
            .segment(tag)
            .query("limit", limit);
        self.get(&endpoint).await
    }

    /// Categories with their nested subcategories.
    pub async fn categories(&self) -> ApiResult<Vec<Category>> {
        self.get(&Endpoint::path("/categories/full")).await
    }

    pub async fn author(&self, author_id: &str) -> ApiResult<Author> {
        self.get(&Endpoint::path("/authors").segment(author_id)).await
    }

    pub async fn ads(&self) -> ApiResult<Vec<Ad>> {
        self.get(&Endpoint::path("/ads")).await
    }
}
