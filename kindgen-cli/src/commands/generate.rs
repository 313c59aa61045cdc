//! `kindgen generate` — expand changed templates and write the outputs.

use anyhow::{Context, Result};
use clap::Args;

use kindgen_sync::{clean, generate, FormatOutcome, GenerateOptions, GenerateReport, TemplateOutcome, WriteResult};

use super::ManifestArg;

/// Arguments for `kindgen generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub manifest: ManifestArg,

    /// Delete generated sources and the cache first, then generate everything.
    #[arg(long, conflicts_with = "dry_run")]
    pub clean: bool,

    /// Regenerate every template, changed or not.
    #[arg(long)]
    pub force: bool,

    /// Show what would be written without writing any files.
    #[arg(long)]
    pub dry_run: bool,

    /// Fail if the digest cache is unreadable instead of regenerating.
    #[arg(long)]
    pub strict_cache: bool,

    /// Skip the formatter configured in the manifest.
    #[arg(long)]
    pub no_format: bool,
}

impl GenerateArgs {
    pub fn run(self) -> Result<()> {
        let (manifest, registry) = self.manifest.load_with_registry()?;

        if self.clean {
            clean(&manifest).context("clean failed")?;
        }

        let options = GenerateOptions {
            dry_run: self.dry_run,
            force: self.force,
            strict_cache: self.strict_cache,
            format: !self.no_format,
        };
        let report = generate(&manifest, &registry, options).context("generation failed")?;
        print_report(&report, self.dry_run);
        Ok(())
    }
}

fn print_report(report: &GenerateReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if report.is_noop() {
        println!("{prefix}✓ no template changed, nothing to do");
        return;
    }

    println!(
        "{prefix}✓ {} template(s) expanded, {} unchanged, {} file(s) {}",
        report.generated_count(),
        report.templates.len() - report.generated_count(),
        report.writes.len(),
        if dry_run { "would be written" } else { "written" },
    );
    for template in &report.templates {
        match &template.outcome {
            TemplateOutcome::Generated { files } => println!("  ✎  {} ({} file(s))", template.name, files.len()),
            TemplateOutcome::Unchanged => println!("  ·  {}", template.name),
        }
    }
    if dry_run {
        for write in &report.writes {
            if let WriteResult::WouldWrite { path } = write {
                println!("  ~  {}", path.display());
            }
        }
    }
    if let FormatOutcome::Failed { reason } = &report.format {
        println!("  !  formatter skipped: {reason}");
    }
}
