//! The storage module keeps harvested pages and generated company summaries
//! in a local SQLite database.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use sitemap::structs::LastMod;
use std::sync::{Arc, Mutex};
use url::Url;

use crate::parse::PageArticle;

/// Storage provides database operations for pages and company summaries.
pub struct Storage {
    /// The underlying SQLite connection wrapped in Arc<Mutex<>> to make it thread-safe
    conn: Arc<Mutex<Connection>>,
    /// Indicates whether the database file did not exist before opening
    pub new: bool,
}

impl Storage {
    /// Opens (or creates) the database at the specified path.
    ///
    /// `":memory:"` opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot be created
    pub fn new(database_path: &str) -> Result<Self> {
        let new = !std::path::Path::new(database_path)
            .try_exists()
            .unwrap_or(false);
        let conn = Connection::open(database_path)
            .with_context(|| format!("Unable to open database {database_path}"))?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            new,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS pages (
                url TEXT PRIMARY KEY,
                site TEXT NOT NULL,
                harvested_at INTEGER NOT NULL,
                lastmod INTEGER NULL,
                title TEXT NULL,
                text TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS pages_site ON pages (site);
            CREATE TABLE IF NOT EXISTS companies (
                site TEXT PRIMARY KEY,
                summary TEXT NOT NULL,
                summarized_at INTEGER NOT NULL
            );",
        )?;

        Ok(())
    }

    /// Adds or updates a page.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn upsert_page(&self, page: &Page) -> Result<()> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO pages (url, site, harvested_at, lastmod, title, text) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                page.url.as_str(),
                page.site,
                page.harvested_at.timestamp(),
                page.lastmod.map(|lastmod| lastmod.timestamp()),
                page.title,
                page.text,
            ],
        )?;

        Ok(())
    }

    /// Gets all data of a page.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails or the stored row is invalid
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn get_page(&self, url: &str) -> Result<Option<Page>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let page_row = conn
            .query_row(
                "SELECT url, site, harvested_at, lastmod, title, text FROM pages WHERE url = ?1",
                [url],
                PageRow::from_row,
            )
            .optional()
            .map_err(|e| anyhow::anyhow!("Unable to fetch page row: {e}"))?;

        page_row.map(Page::try_from).transpose()
    }

    /// Returns all pages of a site ordered by URL.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails or a stored row is invalid
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn site_pages(&self, site: &str) -> Result<Vec<Page>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT url, site, harvested_at, lastmod, title, text FROM pages WHERE site = ?1 ORDER BY url ASC",
        )?;
        let rows: Result<Vec<PageRow>, rusqlite::Error> =
            stmt.query_map([site], PageRow::from_row)?.collect();

        rows?.into_iter().map(Page::try_from).collect()
    }

    /// Returns the distinct sites that have harvested pages.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn list_sites(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare("SELECT DISTINCT site FROM pages ORDER BY site ASC")?;
        let sites: Result<Vec<String>, rusqlite::Error> =
            stmt.query_map([], |row| row.get(0))?.collect();

        sites.map_err(|e| e.into())
    }

    /// Returns the sites that have harvested pages but no company summary.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn unsummarized_sites(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT DISTINCT site FROM pages
             WHERE site NOT IN (SELECT site FROM companies WHERE summary != '')
             ORDER BY site ASC",
        )?;
        let sites: Result<Vec<String>, rusqlite::Error> =
            stmt.query_map([], |row| row.get(0))?.collect();

        sites.map_err(|e| e.into())
    }

    /// Filters the sitemap entries down to URLs that need harvesting: URLs
    /// absent from the database and URLs whose sitemap lastmod differs from
    /// the stored one.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub fn resolve_modified(
        &self,
        sitemap_entries: std::collections::HashMap<String, sitemap::structs::UrlEntry>,
    ) -> Result<Vec<String>> {
        let mut harvestable_urls = Vec::new();
        for (url, sitemap_entry) in sitemap_entries {
            if self.should_harvest(&url, &sitemap_entry.lastmod)? {
                harvestable_urls.push(url);
            }
        }
        harvestable_urls.sort();

        Ok(harvestable_urls)
    }

    /// Determines if a URL should be harvested based on its sitemap lastmod.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub fn should_harvest(&self, url: &str, lastmod: &LastMod) -> Result<bool> {
        let stored = match self.get_lastmod(url)? {
            Some(stored) => stored,
            // Not harvested yet.
            None => return Ok(true),
        };

        Ok(match lastmod {
            LastMod::DateTime(lastmod) => stored != Some(lastmod.timestamp()),
            // Unknown freshness, harvest again.
            LastMod::None | LastMod::ParseErr(_) => true,
        })
    }

    /// Gets the stored lastmod of a URL.
    ///
    /// The outer option is `None` when the URL is unknown, the inner one when
    /// the sitemap carried no lastmod.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn get_lastmod(&self, url: &str) -> Result<Option<Option<i64>>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let lastmod = conn
            .query_row("SELECT lastmod FROM pages WHERE url = ?1", [url], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(lastmod)
    }

    /// Stores the summary of a company, replacing a previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn upsert_company(&self, company: &Company) -> Result<()> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO companies (site, summary, summarized_at) VALUES (?1, ?2, ?3)",
            params![
                company.site,
                company.summary,
                company.summarized_at.timestamp()
            ],
        )?;

        Ok(())
    }

    /// Gets the company summary of a site.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails or the stored row is invalid
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn get_company(&self, site: &str) -> Result<Option<Company>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let row = conn
            .query_row(
                "SELECT site, summary, summarized_at FROM companies WHERE site = ?1",
                [site],
                CompanyRow::from_row,
            )
            .optional()?;

        row.map(Company::try_from).transpose()
    }

    /// Returns all company summaries ordered by site.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails or a stored row is invalid
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn list_companies(&self) -> Result<Vec<Company>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt =
            conn.prepare("SELECT site, summary, summarized_at FROM companies ORDER BY site ASC")?;
        let rows: Result<Vec<CompanyRow>, rusqlite::Error> =
            stmt.query_map([], CompanyRow::from_row)?.collect();

        rows?.into_iter().map(Company::try_from).collect()
    }
}

/// Represents a page stored in the database
#[derive(Debug)]
struct PageRow {
    url: String,
    site: String,
    harvested_at: i64,
    lastmod: Option<i64>,
    title: Option<String>,
    text: String,
}

impl PageRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            site: row.get(1)?,
            harvested_at: row.get(2)?,
            lastmod: row.get(3)?,
            title: row.get(4)?,
            text: row.get(5)?,
        })
    }
}

/// A harvested webpage.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub url: Url,
    /// Host the page belongs to; pages are grouped into companies by it.
    pub site: String,
    pub harvested_at: DateTime<Utc>,
    pub lastmod: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub text: String,
}

impl Page {
    /// Builds a page harvested now from an extracted article.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL has no host
    pub fn from_article(
        url: Url,
        lastmod: Option<DateTime<Utc>>,
        article: PageArticle,
    ) -> Result<Self> {
        let site = site_of(&url)?;

        Ok(Self {
            url,
            site,
            harvested_at: Utc::now(),
            lastmod,
            title: article.title,
            text: article.text,
        })
    }
}

impl TryFrom<PageRow> for Page {
    type Error = anyhow::Error;

    fn try_from(page_row: PageRow) -> Result<Self> {
        Ok(Page {
            url: Url::parse(&page_row.url)?,
            site: page_row.site,
            harvested_at: DateTime::from_timestamp_secs(page_row.harvested_at)
                .context("Unable to initialize harvested_at from database")?,
            lastmod: page_row
                .lastmod
                .map(|lastmod| {
                    DateTime::from_timestamp_secs(lastmod)
                        .context("Unable to initialize lastmod from database")
                })
                .transpose()?,
            title: page_row.title,
            text: page_row.text,
        })
    }
}

#[derive(Debug)]
struct CompanyRow {
    site: String,
    summary: String,
    summarized_at: i64,
}

impl CompanyRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            site: row.get(0)?,
            summary: row.get(1)?,
            summarized_at: row.get(2)?,
        })
    }
}

/// A company summary generated from the pages of one site.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Company {
    pub site: String,
    pub summary: String,
    pub summarized_at: DateTime<Utc>,
}

impl TryFrom<CompanyRow> for Company {
    type Error = anyhow::Error;

    fn try_from(row: CompanyRow) -> Result<Self> {
        Ok(Company {
            site: row.site,
            summary: row.summary,
            summarized_at: DateTime::from_timestamp_secs(row.summarized_at)
                .context("Unable to initialize summarized_at from database")?,
        })
    }
}

/// Returns the site key (host) of a URL.
///
/// # Errors
///
/// Returns an error if the URL has no host
pub fn site_of(url: &Url) -> Result<String> {
    url.host_str()
        .map(str::to_lowercase)
        .with_context(|| format!("URL {url} has no host"))
}
