//! # Favourites Reporter
//!
//! Terminal view of the admin favourites page and catalog.
//!
//! ## Sources
//! - Hosted backend: `BACKEND_URL` + `BACKEND_KEY`, same as the admin service.
//! - Seed file: `--seed path.json`, the in-memory backend's seed format. Handy for
//!   checking a report against fixed data.
//!
//! ## Output
//! - Plain text tables by default, `--json` prints what `/favourites` and `/catalog` return.
use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use catalog::{
    CatalogRepository, CatalogTree, FavouriteReport, group_by_category,
    memory::MemoryRepository, remote::RestRepository,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

pub mod utils;

use utils::{render_catalog, render_favourites};

pub enum Source {
    Remote {
        url: String,
        key: String,
        bucket: String,
    },
    Seed(PathBuf),
}

impl Source {
    pub fn open(&self) -> Result<Box<dyn CatalogRepository>> {
        let repository: Box<dyn CatalogRepository> = match self {
            Source::Remote { url, key, bucket } => {
                info!("Reading from {url}");
                Box::new(RestRepository::new(url, key, bucket)?)
            }
            Source::Seed(path) => {
                info!("Reading seed {}", path.display());
                Box::new(
                    MemoryRepository::from_seed_file(path)
                        .with_context(|| format!("loading seed {}", path.display()))?,
                )
            }
        };

        Ok(repository)
    }
}

pub fn source(
    seed: Option<PathBuf>,
    url: Option<String>,
    key: Option<String>,
    bucket: String,
) -> Result<Source> {
    if let Some(seed) = seed {
        return Ok(Source::Seed(seed));
    }

    match (url, key) {
        (Some(url), Some(key)) => Ok(Source::Remote { url, key, bucket }),
        _ => bail!("set BACKEND_URL and BACKEND_KEY, or pass --seed"),
    }
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {msg}",
    )?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));

    Ok(pb)
}

pub async fn favourites(repository: &dyn CatalogRepository) -> Result<FavouriteReport> {
    let pb = spinner("Fetching favourites")?;
    let records = repository.list_favourites().await;
    pb.finish_and_clear();

    // no partial report on a failed fetch
    let records = records.context("fetching favourites")?;
    info!("Loaded {} favourite rows", records.len());

    Ok(FavouriteReport::build(&records))
}

pub async fn catalog(repository: &dyn CatalogRepository) -> Result<CatalogTree> {
    let pb = spinner("Fetching catalog")?;
    let fetched = tokio::try_join!(
        repository.list_categories(),
        repository.list_menu_items(None)
    );
    pb.finish_and_clear();

    let (categories, items) = fetched.context("fetching catalog")?;
    info!("Loaded {} categories, {} menu items", categories.len(), items.len());

    Ok(group_by_category(categories, items))
}

pub async fn print_favourites(repository: &dyn CatalogRepository, json: bool) -> Result<()> {
    let report = favourites(repository).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_favourites(&report));
    }

    Ok(())
}

pub async fn print_catalog(repository: &dyn CatalogRepository, json: bool) -> Result<()> {
    let tree = catalog(repository).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        print!("{}", render_catalog(&tree));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SEED: &str = r#"{
        "categories": [{ "id": "c1", "name": "Tea" }],
        "menu_items": [
            { "id": "m1", "category_id": "c1", "name": "bubble-tea", "price": 9 },
            { "id": "m2", "category_id": "c1", "name": "milk-tea", "price": 7 }
        ],
        "users": [
            { "id": "u1", "username": "alice", "email": "alice@example.com", "password": "a" },
            { "id": "u2", "username": "bob", "email": "bob@example.com", "password": "b" }
        ],
        "favourites": [
            { "id": "f1", "menu_item_id": "m2", "user_id": "u1" },
            { "id": "f2", "menu_item_id": "m1", "user_id": "u1" },
            { "id": "f3", "menu_item_id": "m1", "user_id": "u2" },
            { "id": "f4", "menu_item_id": "deleted", "user_id": "u2" }
        ]
    }"#;

    fn seeded() -> (tempfile::NamedTempFile, Box<dyn CatalogRepository>) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();
        let repository = Source::Seed(file.path().to_path_buf()).open().unwrap();

        (file, repository)
    }

    #[test]
    fn test_source_selection() {
        assert!(matches!(
            source(Some("seed.json".into()), None, None, "menu-images".into()),
            Ok(Source::Seed(_))
        ));
        assert!(matches!(
            source(None, Some("https://x.example".into()), Some("k".into()), "b".into()),
            Ok(Source::Remote { .. })
        ));
        assert!(source(None, Some("https://x.example".into()), None, "b".into()).is_err());
    }

    #[tokio::test]
    async fn test_favourites_from_seed() {
        let (_file, repository) = seeded();
        let report = favourites(repository.as_ref()).await.unwrap();

        assert_eq!(report.stats.total_items, 2);
        assert_eq!(report.stats.total_favourites, 3);
        assert_eq!(report.stats.most_popular, "bubble-tea");
        assert_eq!(report.summaries[0].favouriting_users, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_catalog_from_seed() {
        let (_file, repository) = seeded();
        let tree = catalog(repository.as_ref()).await.unwrap();

        assert_eq!(tree.sections.len(), 1);
        assert_eq!(tree.item_count(), 2);
    }
}
