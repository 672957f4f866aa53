use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsdesk::app::AppContext;
use newsdesk::cli::{commands, Cli, Commands};
use newsdesk::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so page output stays clean
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let config = config.with_base_url_override(cli.base_url);
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Home => commands::home(&ctx).await?,
        Commands::Article { seo_path, open } => commands::article(&ctx, &seo_path, open).await?,
        Commands::Category { slug, limit } => commands::category(&ctx, &slug, limit).await?,
        Commands::Subcategory {
            category,
            subcategory,
            limit,
        } => commands::subcategory(&ctx, &category, &subcategory, limit).await?,
        Commands::Search { query, limit } => commands::search(&ctx, &query, limit).await?,
        Commands::Author { id, limit } => commands::author(&ctx, &id, limit).await?,
        Commands::Tag { tag, limit } => commands::tag(&ctx, &tag, limit).await?,
        Commands::Categories => commands::categories(&ctx).await?,
        Commands::Ads => commands::ads(&ctx).await?,
    }

    Ok(())
}
