//! The sitemap-harvester library harvests company websites through their
//! sitemap.xml and summarizes each company with a chat-completion model.

pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod generator;
pub mod harvest;
pub mod openai;
pub mod parse;
pub mod sitemap;
pub mod storage;
pub mod summarize;

/// Enum representing the text extraction method.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum TextBy {
    /// Use dom_smoothie for text extraction
    #[default]
    DomSmoothie,
    /// Use fast_html2md for text extraction
    FastHtml2Md,
}

impl std::str::FromStr for TextBy {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "dom_smoothie" => Ok(TextBy::DomSmoothie),
            "fast_html2md" => Ok(TextBy::FastHtml2Md),
            _ => Err(format!("Invalid text extraction method: {}", input)),
        }
    }
}

/// Enum representing the companies to summarize.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum SummarizeTarget {
    /// All harvested sites with no summary.
    #[default]
    Unsummarized,
    /// All harvested sites.
    All,
    /// One site, given by its host.
    Site { site: String },
}

impl From<&str> for SummarizeTarget {
    fn from(value: &str) -> Self {
        match value {
            "unsummarized" => Self::Unsummarized,
            "all" => Self::All,
            site => Self::Site {
                site: site.to_lowercase(),
            },
        }
    }
}

pub use config::SummaryConfig;
pub use error::SummaryError;
pub use export::{ExportFormat, export};
pub use generator::SummaryGenerator;
pub use harvest::{HarvestOptions, harvest};
pub use summarize::summarize;
