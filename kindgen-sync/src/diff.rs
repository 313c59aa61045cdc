//! Unified diff support for `kindgen diff`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use kindgen_core::{Manifest, TemplateName};
use kindgen_expander::{Expander, Registry};

use crate::error::{io_err, GenError};
use crate::pipeline::read_source;

/// A single rendered file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Expand every tuple of `name` in memory and compare with the files on
/// disk. Outputs identical to disk are omitted. No files are written.
///
/// The formatter is not run, so when the manifest configures one the
/// comparison is against unformatted text and formatting changes show up
/// as differences.
pub fn diff_template(manifest: &Manifest, registry: &Registry, name: &TemplateName) -> Result<Vec<FileDiff>, GenError> {
    let spec = registry
        .get(name)
        .ok_or_else(|| GenError::UnknownTemplate(name.clone()))?;
    let source = read_source(spec)?;
    let expander = Expander::new(manifest.substitution);
    let output_dir = manifest.output_dir_path();

    let mut diffs = Vec::new();
    for rendered in spec.render(&source.text, &expander)? {
        let path = output_dir.join(&rendered.path);
        let existing = read_existing_or_empty(&path)?;
        if existing == rendered.content {
            continue;
        }

        let old_header = format!("a/{}", rendered.path.display());
        let new_header = format!("b/{}", rendered.path.display());
        let unified = TextDiff::from_lines(&existing, &rendered.content)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();

        diffs.push(FileDiff {
            path,
            unified_diff: unified,
        });
    }
    Ok(diffs)
}

fn read_existing_or_empty(path: &Path) -> Result<String, GenError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content.replace("\r\n", "\n")),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use kindgen_core::{BindingTuple, Flavor, Kind};
    use kindgen_expander::{ExpandError, TemplateSpec};
    use tempfile::TempDir;

    use super::*;
    use crate::{generate, GenerateOptions};

    fn setup(tmp: &TempDir) -> (Manifest, Registry) {
        let manifest = Manifest::new(tmp.path(), "template", "gen");
        fs::create_dir_all(manifest.template_dir_path()).unwrap();
        fs::write(
            manifest.template_dir_path().join("W.t"),
            "class W {\n    PRIMITIVE_TYPE w;\n}\n",
        )
        .unwrap();
        let mut registry = Registry::new();
        registry
            .register(TemplateSpec::new(
                "W",
                manifest.template_dir_path().join("W.t"),
                Flavor::Element,
                vec![BindingTuple::single(Kind::Int)],
                |_: &BindingTuple| Ok::<_, ExpandError>(PathBuf::from("W.java")),
            ))
            .unwrap();
        (manifest, registry)
    }

    #[test]
    fn no_diffs_after_generate() {
        let tmp = TempDir::new().unwrap();
        let (manifest, registry) = setup(&tmp);
        generate(&manifest, &registry, GenerateOptions::default()).unwrap();
        let diffs = diff_template(&manifest, &registry, &TemplateName::from("W")).unwrap();
        assert!(diffs.is_empty(), "{diffs:?}");
    }

    #[test]
    fn template_edit_produces_unified_diff() {
        let tmp = TempDir::new().unwrap();
        let (manifest, registry) = setup(&tmp);
        generate(&manifest, &registry, GenerateOptions::default()).unwrap();
        fs::write(
            manifest.template_dir_path().join("W.t"),
            "class W {\n    PRIMITIVE_TYPE weight;\n}\n",
        )
        .unwrap();

        let diffs = diff_template(&manifest, &registry, &TemplateName::from("W")).unwrap();
        assert_eq!(diffs.len(), 1);
        let diff = &diffs[0].unified_diff;
        assert!(diff.contains("--- a/W.java"), "{diff}");
        assert!(diff.contains("+++ b/W.java"), "{diff}");
        assert!(diff.contains("-    int w;"), "{diff}");
        assert!(diff.contains("+    int weight;"), "{diff}");
        assert_eq!(fs::read_to_string(tmp.path().join("gen/W.java")).unwrap(), "class W {\n    int w;\n}\n");
    }

    #[test]
    fn unknown_template_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let (manifest, registry) = setup(&tmp);
        let err = diff_template(&manifest, &registry, &TemplateName::from("Nope")).unwrap_err();
        assert!(matches!(err, GenError::UnknownTemplate(_)), "got {err:?}");
    }
}
