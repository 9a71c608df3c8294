//! The export module writes stored company summaries to a file.

use anyhow::{Context, Result};
use log::info;
use std::fs::OpenOptions;
use std::io::Write;

use crate::storage::{Company, Storage};

/// Output format of an export.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ExportFormat {
    /// One `##` section per company.
    #[default]
    Markdown,
    /// A JSON array of company records.
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid export format: {input}")),
        }
    }
}

/// Writes every stored company summary to `output_path`, replacing the file.
///
/// # Returns
///
/// Returns the number of exported companies
///
/// # Errors
///
/// Returns an error if:
/// * Database operations fail
/// * File operations fail
pub fn export(db_path: &str, output_path: &str, format: ExportFormat) -> Result<usize> {
    let storage = Storage::new(db_path)?;

    info!("Exporting companies from database {db_path} to {output_path}...");

    let companies = storage.list_companies()?;
    let rendered = render(&companies, format)?;

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(output_path)
        .with_context(|| format!("Unable to open {output_path}"))?;
    file.write_all(rendered.as_bytes())?;

    info!("Exported {} companies to {output_path}", companies.len());
    Ok(companies.len())
}

/// Renders companies in the given format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn render(companies: &[Company], format: ExportFormat) -> Result<String> {
    Ok(match format {
        ExportFormat::Markdown => companies
            .iter()
            .map(|company| {
                format!(
                    "## [{site}](https://{site})\n{}\n\n",
                    company.summary,
                    site = company.site
                )
            })
            .collect(),
        ExportFormat::Json => serde_json::to_string_pretty(companies)?,
    })
}
