pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::resources::DEFAULT_LIST_LIMIT;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Read the news portal from the terminal", long_about = None)]
pub struct Cli {
    /// API base URL (overrides config and NEWSDESK_API_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Path to an alternate config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Front page: featured, trending and latest stories
    Home,
    /// Show a single article
    Article {
        /// Article path as `category/subcategory/slug-id`
        seo_path: String,

        /// Open the original source in a browser
        #[arg(long)]
        open: bool,
    },
    /// Articles in a category
    Category {
        slug: String,

        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// Articles in a subcategory
    Subcategory {
        category: String,
        subcategory: String,

        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// Full-text search
    Search {
        query: String,

        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// Author profile and their articles
    Author {
        id: String,

        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// Articles with a tag
    Tag {
        tag: String,

        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// List categories and their subcategories
    Categories,
    /// List the current ads
    Ads,
}
