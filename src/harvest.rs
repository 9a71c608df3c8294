//! The harvest module downloads the pages listed in a company's sitemap.xml
//! and stores their readable content in a local database.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use scraper::Selector as ScraperSelector;
use sitemap::structs::{LastMod, UrlEntry};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::TextBy;
use crate::constants::USER_AGENT;
use crate::parse::extract_article;
use crate::sitemap::extract_sitemap_url_entries;
use crate::storage::{Page, Storage, site_of};

/// Tunables of a harvest run.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Delay between page requests in milliseconds.
    pub delay: u64,
    /// Maximum number of pages fetched in one run.
    pub max_pages: usize,
    /// Text extraction method.
    pub text_by: TextBy,
    /// CSS selector limiting the HTML subset the text is extracted from.
    pub selector: Option<ScraperSelector>,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            delay: 1000,
            max_pages: 50,
            text_by: TextBy::default(),
            selector: None,
        }
    }
}

/// Harvests a website using its sitemap and saves pages to a local database.
///
/// Only pages hosted on the sitemap's host are fetched. Pages whose sitemap
/// lastmod equals the stored one are skipped.
///
/// # Arguments
///
/// * `sitemap_url` - The URL of the sitemap to harvest
/// * `db_path` - Path to the database where pages will be stored
/// * `options` - Delay, page limit and extraction settings
///
/// # Returns
///
/// Returns the number of stored pages
///
/// # Errors
///
/// Returns an error if:
/// * The sitemap URL has no host
/// * The sitemap cannot be downloaded
/// * Database operations fail
pub async fn harvest(
    sitemap_url: &Url,
    db_path: &str,
    options: &HarvestOptions,
) -> Result<usize> {
    let storage = Storage::new(db_path)?;
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(3))
        .build()?;

    let site = site_of(sitemap_url)?;
    let sitemap_entries = extract_sitemap_url_entries(&client, sitemap_url.as_str()).await?;
    let sitemap_entries = same_site_entries(sitemap_entries, &site);
    let sitemap_entries_count = sitemap_entries.len();
    let lastmods: HashMap<String, DateTime<Utc>> = sitemap_entries
        .iter()
        .filter_map(|(url, entry)| match &entry.lastmod {
            LastMod::DateTime(lastmod) => Some((url.clone(), lastmod.with_timezone(&Utc))),
            LastMod::None | LastMod::ParseErr(_) => None,
        })
        .collect();

    let mut harvest_urls = if storage.new {
        let mut urls: Vec<String> = sitemap_entries.into_keys().collect();
        urls.sort();
        urls
    } else {
        storage.resolve_modified(sitemap_entries)?
    };
    harvest_urls.truncate(options.max_pages);

    info!(
        "Sitemap entries of {site}: {}/{} (to harvest/all)",
        harvest_urls.len(),
        sitemap_entries_count
    );

    let mut stored = 0;
    for (index, url) in harvest_urls.iter().enumerate() {
        if index > 0 && options.delay > 0 {
            tokio::time::sleep(Duration::from_millis(options.delay)).await;
        }

        match harvest_page(&client, url, options).await {
            Ok(Some(article)) => {
                let lastmod = lastmods.get(url).copied();
                let page = Page::from_article(Url::parse(url)?, lastmod, article)?;
                storage.upsert_page(&page)?;
                stored += 1;
            }
            Ok(None) => {}
            Err(harvest_error) => error!("Error harvesting {url}: {harvest_error:#}"),
        }
    }

    info!("Harvested {stored} pages of {site}");
    Ok(stored)
}

/// Fetches one page and extracts its article. Returns `None` when the server
/// answers with a non-success status.
async fn harvest_page(
    client: &reqwest::Client,
    url: &str,
    options: &HarvestOptions,
) -> Result<Option<crate::parse::PageArticle>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Unable to fetch {url}"))?;
    let status = response.status();
    info!("Fetched {url} with {status}");

    if !status.is_success() {
        warn!("Skipping {url} as {status}");
        return Ok(None);
    }

    let html = response.text().await?;
    let article = extract_article(&html, &options.text_by, options.selector.as_ref())?;

    Ok(Some(article))
}

/// Drops sitemap entries hosted outside `site`.
fn same_site_entries(entries: HashMap<String, UrlEntry>, site: &str) -> HashMap<String, UrlEntry> {
    entries
        .into_iter()
        .filter(|(url, _)| {
            Url::parse(url)
                .ok()
                .and_then(|url| site_of(&url).ok())
                .is_some_and(|host| host == site)
        })
        .collect()
}
