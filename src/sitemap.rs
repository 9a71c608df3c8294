use std::collections::HashMap;

use anyhow::{Context, Result};
use log::{debug, warn};
use sitemap::{
    reader::{SiteMapEntity, SiteMapReader},
    structs::{Location, UrlEntry},
};

/// Extracts URL entries from a sitemap.
///
/// Nested sitemaps referenced by a sitemap index are followed. Entities the
/// reader fails to parse are skipped.
///
/// # Arguments
///
/// * `client` - HTTP client used to download sitemaps.
/// * `sitemap_url` - URL of the root sitemap.
///
/// # Returns
///
/// A `HashMap` from page URL to its sitemap entry.
///
/// # Errors
///
/// This function will return an error if a sitemap cannot be downloaded.
pub async fn extract_sitemap_url_entries(
    client: &reqwest::Client,
    sitemap_url: &str,
) -> Result<HashMap<String, UrlEntry>> {
    let mut entries = HashMap::new();
    let mut sitemaps_to_process = vec![sitemap_url.to_string()];
    let mut seen_sitemaps = Vec::new();

    while let Some(current_sitemap) = sitemaps_to_process.pop() {
        if seen_sitemaps.contains(&current_sitemap) {
            continue;
        }
        debug!("Reading sitemap {current_sitemap}");

        let response = client
            .get(&current_sitemap)
            .send()
            .await
            .with_context(|| format!("Unable to fetch sitemap {current_sitemap}"))?
            .error_for_status()?;
        let content = response.bytes().await?;
        seen_sitemaps.push(current_sitemap);

        for entity in SiteMapReader::new(&*content) {
            match entity {
                SiteMapEntity::Url(url_entry) => {
                    if let Location::Url(ref url) = url_entry.loc {
                        entries.insert(url.to_string(), url_entry);
                    }
                }
                SiteMapEntity::SiteMap(sitemap_entry) => {
                    if let Location::Url(ref url) = sitemap_entry.loc {
                        sitemaps_to_process.push(url.to_string());
                    }
                }
                SiteMapEntity::Err(err) => warn!("Skipping sitemap entity: {err:?}"),
            }
        }
    }

    Ok(entries)
}
