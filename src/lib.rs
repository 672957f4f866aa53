//! # newsdesk
//!
//! Data layer for a news portal front-end, with a terminal front-end on top.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → NewsApi → NewsQueries → QueryClient → Subscription → page
//!                   ↘ AppState (ads, categories, headlines)
//! ```
//!
//! - [`fetcher`]: JSON-over-HTTP client for the portal's REST API
//! - [`query`]: keyed cache that deduplicates concurrent requests
//! - [`resources`]: one accessor per remote resource
//! - [`state`]: session-wide ads, categories and headlines
//!
//! ## Quick Start
//!
//! ```bash
//! # Front page
//! newsdesk home
//!
//! # One article by its path
//! newsdesk article national/politics/budget-2024-64f1
//!
//! # Search against another server
//! newsdesk --base-url https://news.example.com/api search india
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires config, fetcher, query client and
/// app state together.
pub mod app;

/// Command-line interface using clap.
///
/// One subcommand per page: `home`, `article`, `category`, `subcategory`,
/// `search`, `author`, `tag`, `categories`, `ads`.
pub mod cli;

/// Configuration loaded from `~/.config/newsdesk/config.toml`.
pub mod config;

/// Date formatting and ad rotation.
pub mod display;

/// Content models as served by the API.
///
/// - [`Article`](domain::Article) with its category, subcategory and author refs
/// - [`Category`](domain::Category), [`Author`](domain::Author), [`Ad`](domain::Ad)
pub mod domain;

/// HTTP transport.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for JSON requests
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`NewsApi`](fetcher::NewsApi): typed endpoint helpers
pub mod fetcher;

pub mod query;

pub mod resources;

pub mod state;
