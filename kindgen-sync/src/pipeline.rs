//! Generation pipeline entrypoints used by the CLI.
//!
//! `generate`: load cache → digest templates → expand changed ones in
//! memory → write outputs → format → save cache. Nothing is written until
//! every required expansion has succeeded, and the cache is saved only at
//! the very end.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use kindgen_core::{Manifest, TemplateName};
use kindgen_expander::{Expander, Registry, Rendered, TemplateSpec};

use crate::error::{io_err, GenError};
use crate::format::{format_files, FormatOutcome};
use crate::hash_store::{self, digest_bytes, DigestRecord};
use crate::writer::{atomic_write, WriteResult};

// ---------------------------------------------------------------------------
// Options / report
// ---------------------------------------------------------------------------

/// Switches for one [`generate`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerateOptions {
    /// Expand everything required but write nothing; the cache is untouched.
    pub dry_run: bool,
    /// Treat every template as changed.
    pub force: bool,
    /// Fail instead of cold-starting when the cache is unusable.
    pub strict_cache: bool,
    /// Run the manifest's formatter over written files.
    pub format: bool,
}

/// Per-template result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOutcome {
    Generated { files: Vec<PathBuf> },
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateReport {
    pub name: TemplateName,
    pub outcome: TemplateOutcome,
}

/// Summary of a [`generate`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub templates: Vec<TemplateReport>,
    pub writes: Vec<WriteResult>,
    pub format: FormatOutcome,
    pub cache_saved: bool,
}

impl GenerateReport {
    pub fn generated_count(&self) -> usize {
        self.templates
            .iter()
            .filter(|t| matches!(t.outcome, TemplateOutcome::Generated { .. }))
            .count()
    }

    /// `true` when no template needed expansion.
    pub fn is_noop(&self) -> bool {
        self.generated_count() == 0
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Template source bytes and their digest.
pub(crate) struct Source {
    pub text: String,
    pub digest: String,
}

pub(crate) fn read_source(spec: &TemplateSpec) -> Result<Source, GenError> {
    let path = &spec.source;
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    let digest = digest_bytes(&bytes);
    let text = String::from_utf8(bytes).map_err(|e| io_err(path, std::io::Error::new(ErrorKind::InvalidData, e)))?;
    Ok(Source { text, digest })
}

/// Absolute output path of every tuple of every template, checked for
/// collisions within and across templates.
pub(crate) fn plan_outputs(
    manifest: &Manifest,
    registry: &Registry,
) -> Result<BTreeMap<TemplateName, Vec<PathBuf>>, GenError> {
    let output_dir = manifest.output_dir_path();
    let mut owners: BTreeMap<PathBuf, &TemplateName> = BTreeMap::new();
    let mut plan = BTreeMap::new();
    for spec in registry.templates() {
        let mut paths = Vec::with_capacity(spec.tuples.len());
        for (_, relative) in spec.planned_outputs()? {
            let path = output_dir.join(relative);
            if let Some(first) = owners.insert(path.clone(), &spec.name) {
                return Err(GenError::OutputCollision {
                    path,
                    first: first.clone(),
                    second: spec.name.clone(),
                });
            }
            paths.push(path);
        }
        plan.insert(spec.name.clone(), paths);
    }
    Ok(plan)
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

/// Expand every changed template of `registry` and write the outputs.
///
/// On any failure the run aborts before the cache is touched; the error
/// names the failing template and binding tuple.
pub fn generate(manifest: &Manifest, registry: &Registry, options: GenerateOptions) -> Result<GenerateReport, GenError> {
    let cache_path = manifest.cache_path();
    let record = hash_store::load_at(&cache_path, options.strict_cache)?;
    plan_outputs(manifest, registry)?;

    let expander = Expander::new(manifest.substitution);
    let output_dir = manifest.output_dir_path();
    let mut digests = hash_store::Digests::new();
    let mut reports = Vec::with_capacity(registry.len());
    let mut pending: Vec<Rendered> = Vec::new();

    for spec in registry.templates() {
        let source = read_source(spec)?;
        let changed = options.force || record.is_changed(&spec.identity, &source.digest);
        digests.insert(spec.identity.clone(), source.digest);
        if !changed {
            debug!("unchanged: {}", spec.name);
            reports.push(TemplateReport {
                name: spec.name.clone(),
                outcome: TemplateOutcome::Unchanged,
            });
            continue;
        }

        info!("Expanding {} ({} tuple(s))", spec.name, spec.tuples.len());
        let rendered = spec.render(&source.text, &expander)?;
        reports.push(TemplateReport {
            name: spec.name.clone(),
            outcome: TemplateOutcome::Generated {
                files: rendered.iter().map(|r| output_dir.join(&r.path)).collect(),
            },
        });
        pending.extend(rendered);
    }

    let mut report = GenerateReport {
        templates: reports,
        writes: Vec::new(),
        format: FormatOutcome::Skipped,
        cache_saved: false,
    };
    if report.is_noop() {
        info!("No template changed, nothing to do.");
        return Ok(report);
    }

    for rendered in &pending {
        let path = output_dir.join(&rendered.path);
        report.writes.push(atomic_write(&path, &rendered.content, options.dry_run)?);
    }
    if options.dry_run {
        return Ok(report);
    }

    if options.format {
        if let Some(formatter) = &manifest.formatter {
            let written: Vec<PathBuf> = report.writes.iter().map(|w| w.path().to_path_buf()).collect();
            report.format = format_files(formatter, &manifest.root, &written);
        }
    }

    hash_store::save_at(
        &cache_path,
        &DigestRecord {
            generated_at: Utc::now(),
            templates: digests,
        },
    )?;
    report.cache_saved = true;
    info!(
        "Generated {} file(s) from {} template(s)",
        report.writes.len(),
        report.generated_count()
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// clean
// ---------------------------------------------------------------------------

/// What [`clean`] removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CleanReport {
    pub removed_output_dir: Option<PathBuf>,
    pub removed_cache: Option<PathBuf>,
}

/// Delete the output directory tree and the digest cache.
///
/// Refuses when the output directory is the manifest directory (or one of
/// its ancestors) or contains the template directory.
pub fn clean(manifest: &Manifest) -> Result<CleanReport, GenError> {
    let output_dir = manifest.output_dir_path();
    let cache_path = manifest.cache_path();
    let mut report = CleanReport::default();
    info!("Cleaning generated sources...");

    if output_dir.exists() {
        let out = canonical(&output_dir)?;
        if canonical(&manifest.root)?.starts_with(&out) {
            return Err(GenError::CleanRefused {
                path: output_dir,
                reason: "output directory contains the manifest directory",
            });
        }
        let template_dir = manifest.template_dir_path();
        if template_dir.exists() && canonical(&template_dir)?.starts_with(&out) {
            return Err(GenError::CleanRefused {
                path: output_dir,
                reason: "output directory contains the template directory",
            });
        }
    }

    match std::fs::remove_file(&cache_path) {
        Ok(()) => report.removed_cache = Some(cache_path),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(&cache_path, e)),
    }
    match std::fs::remove_dir_all(&output_dir) {
        Ok(()) => report.removed_output_dir = Some(output_dir),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(&output_dir, e)),
    }
    Ok(report)
}

fn canonical(path: &Path) -> Result<PathBuf, GenError> {
    std::fs::canonicalize(path).map_err(|e| io_err(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
