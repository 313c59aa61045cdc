//! `kindgen status` — which templates the next `generate` would expand.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use kindgen_sync::{status, StatusEntry, TemplateStatus};

use super::ManifestArg;

/// Arguments for `kindgen status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub manifest: ManifestArg,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let (manifest, registry) = self.manifest.load_with_registry()?;
        let entries = status(&manifest, &registry).context("status check failed")?;

        if self.json {
            print_json(&entries)?;
            return Ok(());
        }
        print_table(&entries);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusReportJson<'a> {
    summary: StatusSummaryJson,
    templates: &'a [StatusEntry],
}

#[derive(Serialize)]
struct StatusSummaryJson {
    templates: usize,
    needs_generate: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "template")]
    template: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn needs_generate(entries: &[StatusEntry]) -> usize {
    entries
        .iter()
        .filter(|e| !matches!(e.status, TemplateStatus::Current))
        .count()
}

fn print_json(entries: &[StatusEntry]) -> Result<()> {
    let payload = StatusReportJson {
        summary: StatusSummaryJson {
            templates: entries.len(),
            needs_generate: needs_generate(entries),
        },
        templates: entries,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(entries: &[StatusEntry]) {
    let pending = needs_generate(entries);
    println!(
        "kindgen v{} | {} templates | {} need generate",
        env!("CARGO_PKG_VERSION"),
        entries.len(),
        pending,
    );
    if entries.is_empty() {
        println!("No templates declared.");
        return;
    }

    let rows: Vec<StatusTableRow> = entries
        .iter()
        .map(|entry| StatusTableRow {
            template: entry.name.to_string(),
            status: format!("{} {}", status_indicator(&entry.status), status_label(&entry.status)),
            detail: status_detail(entry),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if pending > 0 {
        println!("Run 'kindgen generate' to update generated sources.");
    }
}

fn status_label(status: &TemplateStatus) -> &'static str {
    match status {
        TemplateStatus::NeverGenerated => "NEVER GENERATED",
        TemplateStatus::Changed => "CHANGED",
        TemplateStatus::MissingOutputs { .. } => "MISSING OUTPUTS",
        TemplateStatus::Current => "CURRENT",
    }
}

fn status_indicator(status: &TemplateStatus) -> String {
    match status {
        TemplateStatus::NeverGenerated => "■".bright_black().bold().to_string(),
        TemplateStatus::Changed => "■".yellow().bold().to_string(),
        TemplateStatus::MissingOutputs { .. } => "■".red().bold().to_string(),
        TemplateStatus::Current => "■".green().bold().to_string(),
    }
}

fn status_detail(entry: &StatusEntry) -> String {
    match &entry.status {
        TemplateStatus::NeverGenerated => format!("{} has no digest yet", entry.identity),
        TemplateStatus::Changed => format!("{} edited since last run", entry.identity),
        TemplateStatus::MissingOutputs { files } => format!("{} missing", summarize_files(files)),
        TemplateStatus::Current => "up to date".to_string(),
    }
}

fn summarize_files(files: &[PathBuf]) -> String {
    let mut names: Vec<String> = files
        .iter()
        .take(2)
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    if files.len() > 2 {
        names.push(format!("+{} more", files.len() - 2));
    }
    names.join(", ")
}
