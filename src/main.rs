//! sitemap-harvester is a CLI tool that harvests company websites using
//! sitemap.xml and summarizes every company with an LLM.
//!
//! The tool has four commands:
//! 1. `harvest` - Fetches the pages listed in a sitemap and saves them to a local database
//! 2. `summarize` - Generates company summaries from harvested pages
//! 3. `export` - Writes company summaries to a file
//! 4. `summary` - Summarizes a single file or stdin and prints the result

use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Builder;
use log::{LevelFilter, debug, warn};
use scraper::Selector as ScraperSelector;
use url::Url;

use sitemap_harvester::{
    ExportFormat, HarvestOptions, SummarizeTarget, SummaryConfig, SummaryGenerator, TextBy,
    constants::{DEFAULT_CONTENT_CHAR_LIMIT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE},
    export, harvest, summarize,
};

/// A CLI tool to harvest company websites and summarize them
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command to execute
    #[command(subcommand)]
    command: Command,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", global = true, default_value_t = 2)]
    verbose: u8,
}

/// Chat-completion settings; the credential comes from `OPENAI_API_KEY`.
#[derive(Args)]
struct ModelArgs {
    /// Model identifier
    #[arg(long, short, default_value = DEFAULT_MODEL)]
    model: String,
    /// Alternative API endpoint
    #[arg(long)]
    base_url: Option<String>,
    /// Maximum number of generated tokens
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,
    /// Sampling temperature
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,
}

#[derive(Subcommand)]
enum Command {
    /// Harvest a website using its sitemap and save pages to a local database
    Harvest {
        /// The sitemap URL to harvest
        url: String,
        /// Path to database file to store pages data
        db: String,
        /// Delay between requests in milliseconds
        #[arg(long, short, default_value_t = 1000)]
        delay: u64,
        /// Maximum number of pages to fetch
        #[arg(long, default_value_t = 50)]
        max_pages: usize,
        /// Text extraction method: "dom_smoothie" (default) or "fast_html2md"
        #[arg(long, default_value = "dom_smoothie")]
        text_by: TextBy,
        /// CSS selector to limit the HTML subset from which content is extracted (optional)
        #[arg(long, short)]
        selector: Option<String>,
    },
    /// Summarize harvested companies and store the summaries in the database
    Summarize {
        /// Path to database file to read pages from
        db: String,
        /// Target to summarize: "unsummarized", "all" or a site host
        #[arg(long, short = 't', default_value = "unsummarized")]
        target: SummarizeTarget,
        /// Maximum number of content characters sent per company
        #[arg(long, default_value_t = DEFAULT_CONTENT_CHAR_LIMIT)]
        char_limit: usize,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Write stored company summaries to a file
    Export {
        /// Path to database file to read summaries from
        db: String,
        /// Path to output file
        output_file: String,
        /// Output format: "markdown" (default) or "json"
        #[arg(long, short, default_value = "markdown")]
        format: ExportFormat,
    },
    /// Summarize the content of a file (stdin when omitted) and print it
    Summary {
        /// Path to a text file
        file: Option<String>,
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    load_dotenv();

    match cli.command {
        Command::Harvest {
            url,
            db,
            delay,
            max_pages,
            text_by,
            selector,
        } => {
            let options = HarvestOptions {
                delay,
                max_pages,
                text_by,
                selector: parse_selector(selector)?,
            };
            let sitemap_url =
                Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid sitemap url: {}", e))?;
            harvest(&sitemap_url, &db, &options).await.map(|_| ())
        }
        Command::Summarize {
            db,
            target,
            char_limit,
            model,
        } => {
            let generator = build_generator(model);
            summarize(&db, &generator, target, char_limit)
                .await
                .map(|_| ())
        }
        Command::Export {
            db,
            output_file,
            format,
        } => export(&db, &output_file, format).map(|_| ()),
        Command::Summary { file, model } => handle_summary_command(file, model).await,
    }
}

fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment variables from {}", path.display()),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to load .env file: {e}"),
    }
}

fn parse_selector(selector_query: Option<String>) -> Result<Option<ScraperSelector>> {
    selector_query
        .map(|query| {
            ScraperSelector::parse(&query)
                .map_err(|e| anyhow::anyhow!("Invalid CSS selector: {}", e))
        })
        .transpose()
}

fn build_generator(model: ModelArgs) -> SummaryGenerator {
    let config = SummaryConfig::from_env()
        .with_model(model.model)
        .with_max_tokens(model.max_tokens)
        .with_temperature(model.temperature);
    let config = match model.base_url {
        Some(base_url) => config.with_base_url(base_url),
        None => config,
    };

    SummaryGenerator::from_config(&config)
}

async fn handle_summary_command(file: Option<String>, model: ModelArgs) -> Result<()> {
    let content = match file {
        Some(file) => {
            fs::read_to_string(&file).with_context(|| format!("Failed to read file: {file}"))?
        }
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            content
        }
    };

    let generator = build_generator(model);
    let summary = generator.generate_summary(&content).await?;
    println!("{summary}");

    Ok(())
}
