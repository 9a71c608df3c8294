use chrono::DateTime;
use sitemap_harvester::export::render;
use sitemap_harvester::storage::Company;
use sitemap_harvester::ExportFormat;
use spectral::prelude::*;

fn companies() -> Vec<Company> {
    vec![Company {
        site: "acme.example".to_owned(),
        summary: "Acme sells widgets.".to_owned(),
        summarized_at: DateTime::from_timestamp_secs(0).expect("Valid timestamp"),
    }]
}

#[test]
fn markdown_links_each_site() {
    let rendered = render(&companies(), ExportFormat::Markdown).expect("Rendered");

    assert_that(&rendered)
        .is_equal_to("## [acme.example](https://acme.example)\nAcme sells widgets.\n\n".to_owned());
}

#[test]
fn json_lists_company_records() {
    let rendered = render(&companies(), ExportFormat::Json).expect("Rendered");
    let value: serde_json::Value = serde_json::from_str(&rendered).expect("Valid JSON");

    assert_that(&value[0]["site"].as_str()).is_equal_to(Some("acme.example"));
    assert_that(&value[0]["summary"].as_str()).is_equal_to(Some("Acme sells widgets."));
    assert_that(&value[0]["summarized_at"].as_str()).is_equal_to(Some("1970-01-01T00:00:00Z"));
}

#[test]
fn format_parses_aliases() {
    assert_that(&"md".parse::<ExportFormat>()).is_equal_to(Ok(ExportFormat::Markdown));
    assert_that(&"JSON".parse::<ExportFormat>()).is_equal_to(Ok(ExportFormat::Json));
    assert_that(&"xml".parse::<ExportFormat>().is_err()).is_true();
}
