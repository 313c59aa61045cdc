//! `kindgen clean` — delete generated sources and the digest cache.

use anyhow::{Context, Result};
use clap::Args;

use kindgen_sync::clean;

use super::ManifestArg;

/// Arguments for `kindgen clean`.
#[derive(Args, Debug)]
pub struct CleanArgs {
    #[command(flatten)]
    pub manifest: ManifestArg,
}

impl CleanArgs {
    pub fn run(self) -> Result<()> {
        let manifest = self.manifest.load()?;
        let report = clean(&manifest).context("clean failed")?;

        if report.removed_output_dir.is_none() && report.removed_cache.is_none() {
            println!("✓ nothing to clean");
        }
        for path in [&report.removed_output_dir, &report.removed_cache].into_iter().flatten() {
            println!("✓ removed {}", path.display());
        }
        Ok(())
    }
}
