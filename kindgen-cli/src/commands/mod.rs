pub mod clean;
pub mod diff;
pub mod generate;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use kindgen_core::{Manifest, MANIFEST_FILE_NAME};
use kindgen_expander::Registry;

/// `--manifest` option shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ManifestArg {
    /// Path to the project manifest.
    #[arg(long, short = 'm', value_name = "PATH", default_value = MANIFEST_FILE_NAME)]
    pub manifest: PathBuf,
}

impl ManifestArg {
    pub fn load(&self) -> Result<Manifest> {
        Manifest::load_at(&self.manifest)
            .with_context(|| format!("failed to load manifest {}", self.manifest.display()))
    }

    pub fn load_with_registry(&self) -> Result<(Manifest, Registry)> {
        let manifest = self.load()?;
        let registry = Registry::from_manifest(&manifest)
            .with_context(|| format!("invalid templates in {}", self.manifest.display()))?;
        Ok((manifest, registry))
    }
}
