//! YAML manifest declaring the templates of a generation project.
//!
//! # Layout
//!
//! ```text
//! <project>/
//!   kindgen.yaml              (this manifest)
//!   <template_dir>/
//!     <Name><template_extension>
//!   <output_dir>/
//!     .gen/hashes.json        (default digest cache location)
//! ```
//!
//! Every relative path in the manifest is resolved against the directory
//! containing the manifest file, never against the process working
//! directory.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{invalid_template, io_err, ManifestError};
use crate::types::{BindingTuple, Flavor, Kind, TemplateName};

/// Default manifest file name looked up by the CLI.
pub const MANIFEST_FILE_NAME: &str = "kindgen.yaml";

const DEFAULT_TEMPLATE_EXTENSION: &str = ".java.template";
const DEFAULT_CHUNK_SIZE: usize = 50;

fn default_template_extension() -> String {
    DEFAULT_TEMPLATE_EXTENSION.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Strategy used to replace constant names with their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionMode {
    /// Single left-to-right scan, longest name wins, no re-scan of output.
    #[default]
    LongestMatch,
    /// Reverse-lexicographic global replace, one name at a time.
    Legacy,
}

/// External source formatter run over freshly generated files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Maximum number of files passed to one formatter invocation.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

// ---------------------------------------------------------------------------
// Template declarations
// ---------------------------------------------------------------------------

/// The binding tuples of a declaration, as written in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TupleSet {
    /// Keyword form. Only `all` is recognised.
    Keyword(String),
    List(Vec<TupleEntry>),
}

/// One tuple: a bare kind for single-axis flavors, or a list of kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TupleEntry {
    Single(Kind),
    Many(Vec<Kind>),
}

impl TupleEntry {
    fn to_tuple(&self) -> BindingTuple {
        match self {
            TupleEntry::Single(kind) => BindingTuple::single(*kind),
            TupleEntry::Many(kinds) => BindingTuple(kinds.clone()),
        }
    }
}

/// A single template and the instantiations generated from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDecl {
    pub name: TemplateName,
    /// Template file relative to `template_dir`. Defaults to
    /// `<name><template_extension>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub flavor: Flavor,
    pub tuples: TupleSet,
    /// Extra constants; values are tera patterns rendered per tuple.
    #[serde(default)]
    pub constants: BTreeMap<String, String>,
    /// Extra macros; values are `$0`/`$1` argument patterns.
    #[serde(default)]
    pub macros: BTreeMap<String, String>,
    /// Output path relative to `output_dir`; a tera pattern rendered per tuple.
    pub output: String,
}

impl TemplateDecl {
    /// Expand and validate the declared tuples.
    ///
    /// Rejects empty sets, wrong arity, duplicate tuples and [`Kind::Void`]
    /// anywhere but the value axis of a key/value tuple.
    pub fn binding_tuples(&self) -> Result<Vec<BindingTuple>, ManifestError> {
        let arity = self.flavor.arity();
        let tuples: Vec<BindingTuple> = match &self.tuples {
            TupleSet::Keyword(word) if word == "all" => {
                if arity != 1 {
                    return Err(invalid_template(
                        &self.name,
                        format!("`tuples: all` needs a single-axis flavor, not {}", self.flavor),
                    ));
                }
                Kind::all().iter().map(|k| BindingTuple::single(*k)).collect()
            }
            TupleSet::Keyword(word) => {
                return Err(invalid_template(
                    &self.name,
                    format!("unknown tuples keyword '{word}'; expected `all` or a list"),
                ));
            }
            TupleSet::List(entries) => entries.iter().map(TupleEntry::to_tuple).collect(),
        };

        if tuples.is_empty() {
            return Err(invalid_template(&self.name, "no binding tuples declared"));
        }

        let mut seen = BTreeSet::new();
        for tuple in &tuples {
            if tuple.len() != arity {
                return Err(invalid_template(
                    &self.name,
                    format!(
                        "tuple {tuple} has {} kind(s), flavor {} needs {arity}",
                        tuple.len(),
                        self.flavor
                    ),
                ));
            }
            let void_outside_value_axis = tuple
                .kinds()
                .iter()
                .enumerate()
                .any(|(axis, kind)| *kind == Kind::Void && !(self.flavor == Flavor::KeyValue && axis == 1));
            if void_outside_value_axis {
                return Err(invalid_template(
                    &self.name,
                    format!("tuple {tuple}: Void is only allowed as the value of a key_value tuple"),
                ));
            }
            if !seen.insert(tuple.clone()) {
                return Err(invalid_template(&self.name, format!("duplicate tuple {tuple}")));
            }
        }
        Ok(tuples)
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Root of a kindgen YAML manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Directory the manifest was loaded from; relative paths resolve here.
    #[serde(skip)]
    pub root: PathBuf,
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Digest cache location. Defaults to `<output_dir>/.gen/hashes.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,
    #[serde(default = "default_template_extension")]
    pub template_extension: String,
    #[serde(default)]
    pub substitution: SubstitutionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatter: Option<FormatterConfig>,
    #[serde(default)]
    pub templates: Vec<TemplateDecl>,
}

impl Manifest {
    /// An empty manifest rooted at `root`, for building registries in code.
    pub fn new(root: impl Into<PathBuf>, template_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Manifest {
            root: root.into(),
            template_dir: template_dir.into(),
            output_dir: output_dir.into(),
            cache: None,
            template_extension: default_template_extension(),
            substitution: SubstitutionMode::default(),
            formatter: None,
            templates: Vec::new(),
        }
    }

    /// Load and validate the manifest at `path`.
    ///
    /// Returns `ManifestError::NotFound` if absent,
    /// `ManifestError::Parse` (with path + line context) if malformed YAML.
    pub fn load_at(path: &Path) -> Result<Manifest, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let mut manifest: Manifest = serde_yaml::from_str(&contents).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        manifest.root = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check every declaration; called by [`Manifest::load_at`].
    pub fn validate(&self) -> Result<(), ManifestError> {
        if let Some(formatter) = &self.formatter {
            if formatter.command.trim().is_empty() {
                return Err(ManifestError::Invalid("formatter.command is empty".into()));
            }
            if formatter.chunk_size == 0 {
                return Err(ManifestError::Invalid("formatter.chunk_size must be at least 1".into()));
            }
        }

        let mut names = BTreeSet::new();
        for decl in &self.templates {
            if !names.insert(decl.name.clone()) {
                return Err(invalid_template(&decl.name, "declared more than once"));
            }
            if decl.output.trim().is_empty() {
                return Err(invalid_template(&decl.name, "output pattern is empty"));
            }
            decl.binding_tuples()?;
        }
        Ok(())
    }

    /// Resolve `path` against the manifest directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn template_dir_path(&self) -> PathBuf {
        self.resolve(&self.template_dir)
    }

    pub fn output_dir_path(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }

    pub fn cache_path(&self) -> PathBuf {
        match &self.cache {
            Some(cache) => self.resolve(cache),
            None => self.output_dir_path().join(".gen").join("hashes.json"),
        }
    }

    /// Cache identity of a template: its file name relative to `template_dir`.
    pub fn template_file(&self, decl: &TemplateDecl) -> String {
        match &decl.file {
            Some(file) => file.replace('\\', "/"),
            None => format!("{}{}", decl.name, self.template_extension),
        }
    }

    pub fn template_path(&self, decl: &TemplateDecl) -> PathBuf {
        self.template_dir_path().join(self.template_file(decl))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
