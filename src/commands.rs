use crate::IntoReport;
use crate::cli::{CacheCommand, Command};
use crate::output;
use std::collections::HashSet;
use std::sync::Arc;
use tome_cache::{Database, MetadataCache, RecentSearches};
use tome_catalog::{OpenLibrary, SearchField};
use tome_config::Config;
use tome_search::SearchPipeline;

pub(crate) async fn run(command: Command, config: &Config) -> miette::Result<()> {
    let db = Database::connect(&config.cache.path).await.into_report()?;
    let result = match command {
        Command::Search { recent: true, .. } => {
            list_recent(&db).await;
            Ok(())
        },
        Command::Search { clear_recent: true, .. } => {
            RecentSearches::from(&db).clear().await;
            Ok(())
        },
        Command::Search { query, by, all, .. } => {
            search(config, &db, &query.join(" "), by.into(), all || config.search.show_derivative).await
        },
        Command::Details { book } => details(config, &db, &book).await,
        Command::Favorites { books } => {
            favorites(config, &db, &books).await;
            Ok(())
        },
        Command::Cache { command: CacheCommand::Sweep } => {
            sweep(config, &db).await;
            Ok(())
        },
    };
    db.close().await;
    result
}

fn cache(config: &Config, db: &Database) -> MetadataCache {
    MetadataCache::from(db).with_ttl(config.cache.ttl())
}

fn pipeline(config: &Config, db: &Database) -> miette::Result<SearchPipeline> {
    let catalog = OpenLibrary::builder()
        .base_url(&config.catalog.base_url)
        .covers_url(&config.catalog.covers_url)
        .user_agent(&config.catalog.user_agent)
        .limit(config.catalog.limit)
        .build()
        .into_report()?;
    Ok(SearchPipeline::new(Arc::new(catalog), cache(config, db)))
}

async fn search(
    config: &Config,
    db: &Database,
    query: &str,
    field: SearchField,
    show_derivative: bool,
) -> miette::Result<()> {
    let pipeline = pipeline(config, db)?;
    RecentSearches::from(db).add(query).await;
    let results = pipeline.search(field, query).await.into_report()?;
    if results.original.is_empty() {
        println!("No books found for \"{query}\"");
    }
    for entry in &results.original {
        println!("{}", output::summary(entry));
    }
    if !results.derivative.is_empty() {
        if show_derivative {
            println!("\nSummaries, guides and other derivative works:");
            for entry in &results.derivative {
                println!("{}", output::summary(entry));
            }
        } else {
            println!("\n{} derivative works hidden (use --all to show)", results.derivative.len());
        }
    }
    pipeline.settle().await;
    Ok(())
}

async fn list_recent(db: &Database) {
    let recent = RecentSearches::from(db).list().await;
    if recent.is_empty() {
        println!("No recent searches");
    }
    for query in recent {
        println!("{query}");
    }
}

async fn details(config: &Config, db: &Database, book: &str) -> miette::Result<()> {
    let pipeline = pipeline(config, db)?;
    let key = output::resolve_key(book);
    match pipeline.details(&key).await.into_report()? {
        Some(entry) => println!("{}", output::details(&entry)),
        None => miette::bail!("Book not found: {key}"),
    }
    Ok(())
}

async fn favorites(config: &Config, db: &Database, books: &[String]) {
    let mut seen = HashSet::new();
    let keys: Vec<String> =
        books.iter().map(|book| output::resolve_key(book)).filter(|key| seen.insert(key.clone())).collect();
    let found = cache(config, db).get_ordered(&keys).await;
    for entry in &found {
        println!("{}", output::summary(entry));
    }
    let missing = keys.len() - found.len();
    if missing > 0 {
        println!("{missing} not cached yet; look them up with `tome details` first");
    }
}

async fn sweep(config: &Config, db: &Database) {
    let removed = cache(config, db).sweep_expired().await;
    println!("Removed {removed} expired entries");
}
