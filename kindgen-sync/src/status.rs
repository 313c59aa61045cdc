//! Read-only view of what a `generate` run would do.

use std::path::PathBuf;

use serde::Serialize;

use kindgen_core::{Manifest, TemplateName};
use kindgen_expander::Registry;

use crate::error::GenError;
use crate::hash_store;
use crate::pipeline::{plan_outputs, read_source};

/// Generation state of one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TemplateStatus {
    /// No digest recorded; the next run expands it.
    NeverGenerated,
    /// Source differs from the recorded digest.
    Changed,
    /// Digest is current but some declared outputs are absent.
    MissingOutputs { files: Vec<PathBuf> },
    /// Digest is current and every output exists.
    Current,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub name: TemplateName,
    pub identity: String,
    #[serde(flatten)]
    pub status: TemplateStatus,
}

/// Status of every registered template, in registration order.
pub fn status(manifest: &Manifest, registry: &Registry) -> Result<Vec<StatusEntry>, GenError> {
    let record = hash_store::load_at(&manifest.cache_path(), false)?;
    let mut plan = plan_outputs(manifest, registry)?;

    let mut entries = Vec::with_capacity(registry.len());
    for spec in registry.templates() {
        let source = read_source(spec)?;
        let status = match record.templates.get(&spec.identity) {
            None => TemplateStatus::NeverGenerated,
            Some(stored) if *stored != source.digest => TemplateStatus::Changed,
            Some(_) => {
                let missing: Vec<PathBuf> = plan
                    .remove(&spec.name)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|path| !path.exists())
                    .collect();
                if missing.is_empty() {
                    TemplateStatus::Current
                } else {
                    TemplateStatus::MissingOutputs { files: missing }
                }
            }
        };
        entries.push(StatusEntry {
            name: spec.name.clone(),
            identity: spec.identity.clone(),
            status,
        });
    }
    Ok(entries)
}
