//! `kindgen diff <template>` — show unified diffs for what generate would write.

use anyhow::{Context, Result};
use clap::Args;

use kindgen_core::TemplateName;
use kindgen_sync::diff_template;

use super::ManifestArg;

/// Arguments for `kindgen diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Template name to diff.
    pub template: String,

    #[command(flatten)]
    pub manifest: ManifestArg,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let (manifest, registry) = self.manifest.load_with_registry()?;
        let name = TemplateName::from(self.template.as_str());

        let diffs = diff_template(&manifest, &registry, &name)
            .with_context(|| format!("diff failed for '{name}'"))?;

        if diffs.is_empty() {
            println!("No differences for '{name}'.");
            return Ok(());
        }

        if let Some(formatter) = &manifest.formatter {
            println!(
                "note: comparing unformatted output; changes made by '{}' appear as differences",
                formatter.command
            );
        }
        for diff in diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }
        Ok(())
    }
}
