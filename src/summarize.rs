//! The summarize module turns the harvested pages of each site into a company
//! summary and stores it in the database.

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, error, info};

use crate::SummarizeTarget;
use crate::error::SummaryError;
use crate::generator::SummaryGenerator;
use crate::storage::{Company, Page, Storage};

/// Summarizes the companies selected by `target` from the database at
/// `db_path`.
///
/// # Arguments
///
/// * `db_path` - Path to the database containing harvested pages
/// * `generator` - Summary generator used for every company
/// * `target` - Which sites to summarize
/// * `char_limit` - Maximum number of characters of page content per company
///
/// # Returns
///
/// Returns the number of stored summaries
///
/// # Errors
///
/// Returns an error if:
/// * Database operations fail
/// * The service rejects the credential or the rate limit is exhausted
pub async fn summarize(
    db_path: &str,
    generator: &SummaryGenerator,
    target: SummarizeTarget,
    char_limit: usize,
) -> Result<u32> {
    let storage = Storage::new(db_path)?;

    let sites = match &target {
        SummarizeTarget::Unsummarized => {
            info!("Summarizing companies from {db_path} that haven't been summarized yet...");
            storage.unsummarized_sites()?
        }
        SummarizeTarget::All => {
            info!("Summarizing ALL companies from {db_path}...");
            storage.list_sites()?
        }
        SummarizeTarget::Site { site } => {
            info!("Summarizing company {site} from {db_path}...");
            vec![site.clone()]
        }
    };

    let total_processed = summarize_sites(&storage, generator, &sites, char_limit).await?;

    if total_processed == 0 {
        match &target {
            SummarizeTarget::Unsummarized => {
                info!("No companies to summarize. All sites already have summaries.");
            }
            SummarizeTarget::All => info!("No harvested sites in the database."),
            SummarizeTarget::Site { site } => info!("No summary stored for {site}."),
        }
    } else {
        info!("Summarized {total_processed} companies");
    }

    Ok(total_processed)
}

/// Generates and stores a summary for each of `sites`.
///
/// Sites without harvested pages are skipped. Transport and malformed-response
/// failures are logged and the site is skipped; authentication and rate-limit
/// failures stop the run since later requests would fail the same way.
///
/// # Errors
///
/// Returns an error if database operations fail or the run is stopped by an
/// authentication or rate-limit failure.
pub async fn summarize_sites(
    storage: &Storage,
    generator: &SummaryGenerator,
    sites: &[String],
    char_limit: usize,
) -> Result<u32> {
    let mut processed = 0;

    for site in sites {
        let pages = storage.site_pages(site)?;
        if pages.is_empty() {
            debug!("No pages harvested for {site}");
            continue;
        }

        let content = compose_site_content(&pages, char_limit);
        let summary = match generator.generate_summary(&content).await {
            Ok(summary) => summary,
            Err(
                summary_error @ (SummaryError::Transport(_) | SummaryError::MalformedResponse(_)),
            ) => {
                error!("Skipping {site}: {summary_error}");
                continue;
            }
            Err(summary_error) => {
                return Err(summary_error).with_context(|| format!("Stopped at {site}"));
            }
        };

        storage.upsert_company(&Company {
            site: site.clone(),
            summary,
            summarized_at: Utc::now(),
        })?;
        processed += 1;
        debug!("Summarized company: {site}");
    }

    Ok(processed)
}

/// Joins the pages of a site into the content sent to the model.
///
/// Each page becomes a `## {title or url}` heading followed by its text. The
/// result holds at most `char_limit` characters.
#[must_use]
pub fn compose_site_content(pages: &[Page], char_limit: usize) -> String {
    pages
        .iter()
        .filter(|page| !page.text.trim().is_empty())
        .map(|page| {
            format!(
                "## {}\n{}",
                page.title.as_deref().unwrap_or(page.url.as_str()),
                page.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
        .chars()
        .take(char_limit)
        .collect()
}
