use chrono::DateTime;
use mockito::{Mock, Server, ServerGuard};
use sitemap_harvester::storage::Storage;
use sitemap_harvester::{HarvestOptions, TextBy, harvest};
use spectral::prelude::*;
use url::Url;

fn page_html(title: &str, text: &str) -> String {
    format!("<html><head><title>{title}</title></head><body><main><p>{text}</p></main></body></html>")
}

/// Mocks of the company site, with the number of hits each one expects.
struct CompanySite {
    server: ServerGuard,
    sitemap: Mock,
    about: Mock,
    products: Mock,
    missing: Mock,
}

impl CompanySite {
    /// Serves a sitemap listing two pages on the mock host, one missing page
    /// and one page on another host.
    async fn start(
        sitemap_hits: usize,
        about_hits: usize,
        products_hits: usize,
        missing_hits: usize,
    ) -> Self {
        let mut server = Server::new_async().await;
        let base = server.url();
        let sitemap_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/about</loc><lastmod>2024-01-15T00:00:00+00:00</lastmod></url>
  <url><loc>{base}/products</loc></url>
  <url><loc>{base}/missing</loc></url>
  <url><loc>http://partner.example/offer</loc></url>
</urlset>"#
        );

        let sitemap = server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(sitemap_xml)
            .expect(sitemap_hits)
            .create_async()
            .await;
        let about = server
            .mock("GET", "/about")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(page_html("About Acme", "Acme sells widgets to businesses."))
            .expect(about_hits)
            .create_async()
            .await;
        let products = server
            .mock("GET", "/products")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(page_html("Products", "Widgets, gadgets and gizmos."))
            .expect(products_hits)
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(missing_hits)
            .create_async()
            .await;

        Self {
            server,
            sitemap,
            about,
            products,
            missing,
        }
    }

    fn url(&self) -> String {
        self.server.url()
    }

    fn sitemap_url(&self) -> Url {
        Url::parse(&format!("{}/sitemap.xml", self.url())).expect("Valid URL")
    }

    async fn assert_hits(&self) {
        self.sitemap.assert_async().await;
        self.about.assert_async().await;
        self.products.assert_async().await;
        self.missing.assert_async().await;
    }
}

fn options(max_pages: usize) -> HarvestOptions {
    HarvestOptions {
        delay: 0,
        max_pages,
        text_by: TextBy::FastHtml2Md,
        selector: None,
    }
}

#[tokio::test]
async fn stores_same_host_pages_and_skips_failures() {
    let site = CompanySite::start(1, 1, 1, 1).await;
    let dir = tempfile::tempdir().expect("Temporary directory");
    let db_path = dir.path().join("pages.db");
    let db_path = db_path.to_str().expect("UTF-8 path");

    let stored = harvest(&site.sitemap_url(), db_path, &options(10))
        .await
        .expect("Harvest");

    let base = site.url();
    let storage = Storage::new(db_path).expect("Database");
    let about = storage
        .get_page(&format!("{base}/about"))
        .expect("Query")
        .expect("Stored page");

    assert_that(&stored).is_equal_to(2);
    assert_that(&about.site.as_str()).is_equal_to("127.0.0.1");
    assert_that(&about.title).is_equal_to(Some("About Acme".to_owned()));
    assert_that(&about.text.contains("Acme sells widgets to businesses.")).is_true();
    assert_that(&about.lastmod).is_equal_to(DateTime::from_timestamp_secs(1_705_276_800));
    assert_that(
        &storage
            .get_page(&format!("{base}/products"))
            .expect("Query")
            .and_then(|page| page.lastmod),
    )
    .is_none();
    assert_that(&storage.get_page(&format!("{base}/missing")).expect("Query")).is_none();
    assert_that(&storage.get_page("http://partner.example/offer").expect("Query")).is_none();
    assert_that(&storage.list_sites().expect("Query")).is_equal_to(vec!["127.0.0.1".to_owned()]);
    site.assert_hits().await;
}

#[tokio::test]
async fn max_pages_limits_fetched_pages() {
    let site = CompanySite::start(1, 1, 0, 0).await;
    let dir = tempfile::tempdir().expect("Temporary directory");
    let db_path = dir.path().join("pages.db");
    let db_path = db_path.to_str().expect("UTF-8 path");

    let stored = harvest(&site.sitemap_url(), db_path, &options(1))
        .await
        .expect("Harvest");

    assert_that(&stored).is_equal_to(1);
    site.assert_hits().await;
}

#[tokio::test]
async fn unchanged_pages_are_not_fetched_again() {
    let site = CompanySite::start(2, 1, 2, 2).await;
    let dir = tempfile::tempdir().expect("Temporary directory");
    let db_path = dir.path().join("pages.db");
    let db_path = db_path.to_str().expect("UTF-8 path");

    harvest(&site.sitemap_url(), db_path, &options(10))
        .await
        .expect("First harvest");
    harvest(&site.sitemap_url(), db_path, &options(10))
        .await
        .expect("Second harvest");

    site.assert_hits().await;
}
