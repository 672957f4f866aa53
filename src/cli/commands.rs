use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::Utc;
use tracing::warn;

use crate::app::{AppContext, Result};
use crate::display::{format_published, AdRotation, DateStyle};
use crate::domain::{Article, Author, Category};
use crate::query::QueryState;
use crate::resources::{
    DEFAULT_FEATURED_LIMIT, DEFAULT_HEADLINES_LIMIT, DEFAULT_RELATED_LIMIT,
    DEFAULT_TRENDING_LIMIT,
};

/// Categories shown as sections on the front page.
const HOME_SECTIONS: usize = 4;
const SECTION_LIMIT: usize = 4;

/// Front-page sections; categories without a slug have no listing endpoint.
fn section_categories(categories: &[Category]) -> impl Iterator<Item = &Category> {
    categories
        .iter()
        .filter(|c| !c.slug.is_empty())
        .take(HOME_SECTIONS)
}

pub async fn home(ctx: &AppContext) -> Result<()> {
    ctx.app_state.init().await;

    // Subscribe everything first so the requests overlap.
    let mut featured = ctx.queries.featured_articles(DEFAULT_FEATURED_LIMIT);
    let mut trending = ctx.queries.trending_articles(DEFAULT_TRENDING_LIMIT);
    let mut latest = ctx.queries.top_headlines(DEFAULT_HEADLINES_LIMIT);

    let categories = ctx.app_state.categories();
    let mut sections: Vec<_> = section_categories(&categories)
        .map(|c| (c.name.clone(), ctx.queries.articles_by_category(&c.slug, SECTION_LIMIT)))
        .collect();

    let style = ctx.config.display.date_style;

    let headlines = ctx.app_state.headlines();
    if !headlines.is_empty() {
        let ticker: Vec<_> = headlines.iter().map(Article::display_title).collect();
        println!("BREAKING: {}\n", ticker.join("  |  "));
    }

    print_ad(ctx);

    println!("== Featured ==");
    print_list(&featured.settled().await, style, "No featured stories.");

    println!("\n== Trending ==");
    print_list(&trending.settled().await, style, "Nothing trending right now.");

    println!("\n== Latest ==");
    print_list(&latest.settled().await, style, "No articles yet.");

    for (name, sub) in sections.iter_mut() {
        println!("\n== {} ==", name);
        print_list(&sub.settled().await, style, "No articles found in this category.");
    }

    Ok(())
}

pub async fn article(ctx: &AppContext, seo_path: &str, open: bool) -> Result<()> {
    let mut sub = ctx.queries.article(seo_path);
    let state = sub.settled().await;

    let Some(article) = state.data() else {
        if let Some(err) = state.error.as_ref().filter(|e| !e.is_not_found()) {
            warn!(path = seo_path, error = %err, "article failed to load");
        }
        println!("Article not found");
        return Ok(());
    };

    let style = ctx.config.display.date_style;
    print!("{}", render_article(article, style));

    let mut related = ctx.queries.related_articles(article, DEFAULT_RELATED_LIMIT);
    let related = related.settled().await;
    if related.data().is_some_and(|r| !r.is_empty()) {
        println!("\n== Related ==");
        print_list(&related, style, "");
    }

    if open {
        match article.source_url.as_deref() {
            Some(url) => {
                if let Err(e) = open::that(url) {
                    warn!(url, error = %e, "failed to open browser");
                    println!("Could not open {}", url);
                }
            }
            None => println!("No source link for this article"),
        }
    }

    Ok(())
}

pub async fn category(ctx: &AppContext, slug: &str, limit: usize) -> Result<()> {
    let mut sub = ctx.queries.articles_by_category(slug, limit);
    println!("== {} ==", slug);
    print_list(
        &sub.settled().await,
        ctx.config.display.date_style,
        "No articles found in this category.",
    );
    Ok(())
}

pub async fn subcategory(ctx: &AppContext, category: &str, subcategory: &str, limit: usize) -> Result<()> {
    let mut sub = ctx.queries.articles_by_subcategory(category, subcategory, limit);
    println!("== {} / {} ==", category, subcategory);
    print_list(
        &sub.settled().await,
        ctx.config.display.date_style,
        "No articles found in this subcategory.",
    );
    Ok(())
}

pub async fn search(ctx: &AppContext, query: &str, limit: usize) -> Result<()> {
    let mut sub = ctx.queries.search_articles(query, limit);
    if !sub.is_enabled() {
        println!("Enter a search term");
        return Ok(());
    }

    let state = sub.settled().await;
    let count = state.data().map_or(0, Vec::len);
    println!("{} results for \"{}\"", count, query.trim());
    print_list(&state, ctx.config.display.date_style, "No results found");
    Ok(())
}

pub async fn author(ctx: &AppContext, id: &str, limit: usize) -> Result<()> {
    let mut info = ctx.queries.author_info(id);
    let mut articles = ctx.queries.author_articles(id, limit);

    let info = info.settled().await;
    let Some(author) = info.data() else {
        println!("Author not found");
        return Ok(());
    };

    print!("{}", render_author(author));
    println!("\n== Articles ==");
    print_list(
        &articles.settled().await,
        ctx.config.display.date_style,
        "No articles published yet.",
    );
    Ok(())
}

pub async fn tag(ctx: &AppContext, tag: &str, limit: usize) -> Result<()> {
    let mut sub = ctx.queries.articles_by_tag(tag, limit);
    println!("== #{} ==", tag);
    print_list(
        &sub.settled().await,
        ctx.config.display.date_style,
        "No articles found with this tag.",
    );
    Ok(())
}

pub async fn categories(ctx: &AppContext) -> Result<()> {
    let mut sub = ctx.queries.categories();
    let state = sub.settled().await;

    match state.data() {
        Some(categories) if !categories.is_empty() => print!("{}", render_categories(categories)),
        _ => {
            log_error(&state);
            println!("No categories");
        }
    }
    Ok(())
}

pub async fn ads(ctx: &AppContext) -> Result<()> {
    ctx.app_state.refresh_ads().await;
    let ads = ctx.app_state.ads();

    if ads.is_empty() {
        println!("No ads");
        return Ok(());
    }

    let (width, height) = ctx.config.display.ad_variant.dimensions();
    println!("{} ads ({}x{} slot)", ads.len(), width, height);
    for ad in &ads {
        println!("  {} {}", ad.label(), ad.link.as_deref().unwrap_or(""));
    }
    Ok(())
}

fn print_ad(ctx: &AppContext) {
    let rotation = AdRotation::new(
        ctx.app_state.ads(),
        rotation_seed(),
        ctx.config.display.ad_interval(),
    );
    if let Some(ad) = rotation.current(Duration::ZERO) {
        println!("[AD] {}\n", ad.label());
    }
}

/// Varies the first ad between runs.
fn rotation_seed() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

fn print_list(state: &QueryState<Vec<Article>>, style: DateStyle, empty: &str) {
    log_error(state);
    match state.data() {
        Some(articles) if !articles.is_empty() => print!("{}", render_list(articles, style)),
        _ => println!("{}", empty),
    }
}

fn log_error<T>(state: &QueryState<T>) {
    if let Some(err) = &state.error {
        warn!(error = %err, "query failed");
    }
}

fn published(article: &Article, style: DateStyle) -> Option<String> {
    article
        .published_at
        .or(article.created_at)
        .map(|d| format_published(d, Utc::now(), style))
}

fn render_list(articles: &[Article], style: DateStyle) -> String {
    let mut out = String::new();
    for article in articles {
        let date = published(article, style).unwrap_or_default();
        out.push_str(&format!("{:>12}  {}\n", date, article.display_title()));
        if let Some(path) = article.seo_path() {
            out.push_str(&format!("{:>12}  {}\n", "", path));
        }
    }
    out
}

fn render_article(article: &Article, style: DateStyle) -> String {
    let mut out = format!("{}\n", article.display_title());

    let mut meta = Vec::new();
    if let Some(name) = article.author_name() {
        meta.push(format!("By {}", name));
    }
    if let Some(date) = published(article, style) {
        meta.push(date);
    }
    if let Some(source) = &article.source_name {
        meta.push(source.clone());
    }
    if !meta.is_empty() {
        out.push_str(&format!("{}\n", meta.join(" | ")));
    }

    out.push_str(&format!("\n{}\n", article.display_content()));

    if !article.tags.is_empty() {
        let tags: Vec<_> = article.tags.iter().map(|t| format!("#{}", t)).collect();
        out.push_str(&format!("\n{}\n", tags.join(" ")));
    }
    out
}

fn render_author(author: &Author) -> String {
    let mut out = format!("{}\n{}\n", author.name, author.display_bio());
    out.push_str(&format!("Articles: {}\n", author.article_count));
    for (network, url) in author.social_links.iter() {
        out.push_str(&format!("  {}: {}\n", network, url));
    }
    out
}

fn render_categories(categories: &[Category]) -> String {
    let mut out = String::new();
    for category in categories {
        out.push_str(&format!("{} ({})\n", category.name, category.slug));
        for sub in &category.subcategories {
            out.push_str(&format!("  - {} ({}/{})\n", sub.name, category.slug, sub.slug));
        }
    }
    out
}
