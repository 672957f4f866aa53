//! One accessor per remote resource, each bound to a cache key and a loader.
//!
//! Accessors with a required parameter (search query, tag, author id, article
//! path) return a disabled [`Subscription`] while that parameter is empty, and
//! no request is made.

use std::future::Future;

use crate::app::ApiResult;
use crate::cache_key;
use crate::domain::{Article, Author, Category};
use crate::fetcher::NewsApi;
use crate::query::{CacheKey, QueryClient, Subscription};

pub const DEFAULT_HEADLINES_LIMIT: usize = 10;
pub const DEFAULT_FEATURED_LIMIT: usize = 5;
pub const DEFAULT_TRENDING_LIMIT: usize = 5;
pub const DEFAULT_LIST_LIMIT: usize = 20;
pub const DEFAULT_RELATED_LIMIT: usize = 4;

#[derive(Clone)]
pub struct NewsQueries {
    client: QueryClient,
    api: NewsApi,
}

impl NewsQueries {
    pub fn new(client: QueryClient, api: NewsApi) -> Self {
        Self { client, api }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    fn query<T, F, Fut>(&self, key: CacheKey, load: F) -> Subscription<T>
    where
        T: Send + Sync + 'static,
        F: Fn(NewsApi) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let api = self.api.clone();
        self.client.subscribe(key, move || load(api.clone()))
    }

    pub fn top_headlines(&self, limit: usize) -> Subscription<Vec<Article>> {
        self.query(
            cache_key!["articles", "top-headlines", limit],
            move |api| async move { api.latest_articles(limit).await },
        )
    }

    /// The featured endpoint takes no limit; `limit` only distinguishes keys.
    pub fn featured_articles(&self, limit: usize) -> Subscription<Vec<Article>> {
        self.query(
            cache_key!["articles", "featured", limit],
            |api| async move { api.featured_articles().await },
        )
    }

    pub fn trending_articles(&self, limit: usize) -> Subscription<Vec<Article>> {
        self.query(
            cache_key!["articles", "trending", limit],
            move |api| async move { api.trending_articles(limit).await },
        )
    }

    pub fn articles_by_category(&self, category: &str, limit: usize) -> Subscription<Vec<Article>> {
        let category = category.to_string();
        self.query(
            cache_key!["articles", "category", category.as_str(), limit],
            move |api| {
                let category = category.clone();
                async move { api.articles_by_category(&category, limit).await }
            },
        )
    }

    pub fn articles_by_subcategory(
        &self,
        category: &str,
        subcategory: &str,
        limit: usize,
    ) -> Subscription<Vec<Article>> {
        let category = category.to_string();
        let subcategory = subcategory.to_string();
        self.query(
            cache_key![
                "articles",
                "subcategory",
                category.as_str(),
                subcategory.as_str(),
                limit
            ],
            move |api| {
                let category = category.clone();
                let subcategory = subcategory.clone();
                async move {
                    api.articles_by_subcategory(&category, &subcategory, limit)
                        .await
                }
            },
        )
    }

    /// Single article by `category/subcategory/slug-id`.
    pub fn article(&self, seo_path: &str) -> Subscription<Article> {
        let seo_path = seo_path.trim_matches('/').to_string();
        if seo_path.is_empty() {
            return Subscription::disabled();
        }

        self.query(
            cache_key!["articles", "single", seo_path.as_str()],
            move |api| {
                let seo_path = seo_path.clone();
                async move { api.article(&seo_path).await }
            },
        )
    }

    pub fn search_articles(&self, query: &str, limit: usize) -> Subscription<Vec<Article>> {
        if query.trim().is_empty() {
            return Subscription::disabled();
        }

        let query = query.to_string();
        self.query(
            cache_key!["articles", "search", query.as_str(), limit],
            move |api| {
                let query = query.clone();
                async move { api.search_articles(&query, limit).await }
            },
        )
    }

    /// Other articles from the same category as `article`, excluding it.
    ///
    /// Asks for one extra item so the list is still full after the source
    /// article is filtered out.
    pub fn related_articles(&self, article: &Article, limit: usize) -> Subscription<Vec<Article>> {
        let Some(category_id) = article.category_id().map(String::from) else {
            return Subscription::disabled();
        };

        let source_id = article.id.clone();
        self.query(
            cache_key!["articles", "related", source_id.as_str(), limit],
            move |api| {
                let category_id = category_id.clone();
                let source_id = source_id.clone();
                async move {
                    let articles = api
                        .articles_by_category(&category_id, related_fetch_limit(limit))
                        .await?;
                    Ok(exclude_and_truncate(articles, &source_id, limit))
                }
            },
        )
    }

    pub fn categories(&self) -> Subscription<Vec<Category>> {
        self.query(cache_key!["categories", "full"], |api| async move {
            api.categories().await
        })
    }

    pub fn author_info(&self, author_id: &str) -> Subscription<Author> {
        if author_id.is_empty() {
            return Subscription::disabled();
        }

        let author_id = author_id.to_string();
        self.query(cache_key!["authors", author_id.as_str()], move |api| {
            let author_id = author_id.clone();
            async move { api.author(&author_id).await }
        })
    }

    pub fn author_articles(&self, author_id: &str, limit: usize) -> Subscription<Vec<Article>> {
        if author_id.is_empty() {
            return Subscription::disabled();
        }

        let author_id = author_id.to_string();
        self.query(
            cache_key!["articles", "author", author_id.as_str(), limit],
            move |api| {
                let author_id = author_id.clone();
                async move { api.articles_by_author(&author_id, limit).await }
            },
        )
    }

    pub fn articles_by_tag(&self, tag: &str, limit: usize) -> Subscription<Vec<Article>> {
        if tag.is_empty() {
            return Subscription::disabled();
        }

        let tag = tag.to_string();
        self.query(
            cache_key!["articles", "tag", tag.as_str(), limit],
            move |api| {
                let tag = tag.clone();
                async move { api.articles_by_tag(&tag, limit).await }
            },
        )
    }
}

fn related_fetch_limit(limit: usize) -> usize {
    limit.saturating_add(1)
}

fn exclude_and_truncate(articles: Vec<Article>, source_id: &str, limit: usize) -> Vec<Article> {
    articles
        .into_iter()
        .filter(|a| a.id != source_id)
        .take(limit)
        .collect()
}
