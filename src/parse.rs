use crate::TextBy;
use crate::constants::BLANK_LINES_COLLAPSER;

use anyhow::Result;
use dom_smoothie::{Article, CandidateSelectMode, Config, Readability, TextMode};
use html2md;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector as ScraperSelector};

static BLANK_LINES_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(BLANK_LINES_COLLAPSER).expect("Failed to compile BLANK_LINES_COLLAPSER regex")
});

/// Readable part of a harvested webpage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageArticle {
    /// The title of the page, if available.
    pub title: Option<String>,
    /// The text content of the page.
    pub text: String,
}

/// Extracts an article from the given HTML content.
///
/// # Arguments
///
/// * `html` - The HTML content of the webpage.
/// * `text_by` - The method to use for text extraction (dom_smoothie or fast_html2md).
/// * `selector` - An optional CSS selector to limit the HTML subset from which content is extracted.
///
/// # Errors
///
/// This function will return an error if the readability parser cannot
/// extract an article from the HTML content.
pub fn extract_article(
    html: &str,
    text_by: &TextBy,
    selector: Option<&ScraperSelector>,
) -> Result<PageArticle> {
    let title = parse_title(html);
    let selected_html = match selector {
        Some(sel) => Html::parse_document(html)
            .select(sel)
            .map(|el| el.html())
            .collect::<Vec<String>>()
            .join("\n"),
        None => html.to_owned(),
    };

    let text = match text_by {
        TextBy::DomSmoothie => {
            let config = Config {
                text_mode: TextMode::Markdown,
                candidate_select_mode: CandidateSelectMode::DomSmoothie,
                ..Default::default()
            };

            let mut readability = Readability::new(selected_html.as_str(), None, Some(config))?;
            let article: Article = readability.parse()?;
            article.text_content.to_string()
        }
        TextBy::FastHtml2Md => html2md::parse_html(&selected_html, false),
    };

    Ok(PageArticle {
        title,
        text: normalize_text(&text),
    })
}

/// Collapses runs of blank lines and trims the text.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    BLANK_LINES_REGEX
        .replace_all(text, "\n\n")
        .trim()
        .to_owned()
}

/// Parses the title from HTML content, falling back to the first heading.
#[must_use]
pub fn parse_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    ["title", "h1", "h2"].into_iter().find_map(|tag| {
        let selector = ScraperSelector::parse(tag).ok()?;
        let element = document.select(&selector).next()?;
        let text = element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        (!text.is_empty()).then_some(text)
    })
}
