//! Template registry — what to instantiate, how to configure it, where to
//! write it.
//!
//! A [`Registry`] is an explicit value built by the caller, either in code
//! with [`TemplateSpec`] or from a manifest with [`Registry::from_manifest`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use kindgen_core::{key_value_prefix, BindingTuple, Flavor, Kind, Manifest, TemplateDecl, TemplateName};

use crate::engine::Expander;
use crate::environment::Environment;
use crate::error::{ExpandError, RegistryError};
use crate::kinds::base_environment;
use crate::macros::MacroDef;

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Adds instantiation-specific constants and macros to a base environment.
pub trait Configure: Send + Sync {
    fn configure(&self, tuple: &BindingTuple, env: &mut Environment) -> Result<(), ExpandError>;
}

impl<F> Configure for F
where
    F: Fn(&BindingTuple, &mut Environment) -> Result<(), ExpandError> + Send + Sync,
{
    fn configure(&self, tuple: &BindingTuple, env: &mut Environment) -> Result<(), ExpandError> {
        self(tuple, env)
    }
}

/// Maps a tuple to its output path, relative to the output directory.
pub trait OutputPath: Send + Sync {
    fn path_for(&self, tuple: &BindingTuple) -> Result<PathBuf, ExpandError>;
}

impl<F> OutputPath for F
where
    F: Fn(&BindingTuple) -> Result<PathBuf, ExpandError> + Send + Sync,
{
    fn path_for(&self, tuple: &BindingTuple) -> Result<PathBuf, ExpandError> {
        self(tuple)
    }
}

struct NoConfigure;

impl Configure for NoConfigure {
    fn configure(&self, _tuple: &BindingTuple, _env: &mut Environment) -> Result<(), ExpandError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TemplateSpec
// ---------------------------------------------------------------------------

/// One expanded output of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub tuple: BindingTuple,
    /// Relative to the output directory.
    pub path: PathBuf,
    pub content: String,
}

/// A registered template and the instantiations generated from it.
pub struct TemplateSpec {
    pub name: TemplateName,
    /// Cache identity; the template file relative to the template directory.
    pub identity: String,
    /// Template file on disk.
    pub source: PathBuf,
    pub flavor: Flavor,
    pub tuples: Vec<BindingTuple>,
    configure: Box<dyn Configure>,
    output: Box<dyn OutputPath>,
}

impl fmt::Debug for TemplateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSpec")
            .field("name", &self.name)
            .field("identity", &self.identity)
            .field("source", &self.source)
            .field("flavor", &self.flavor)
            .field("tuples", &self.tuples)
            .finish_non_exhaustive()
    }
}

impl TemplateSpec {
    /// A template with no extra configuration. The identity defaults to the
    /// source file name.
    pub fn new(
        name: impl Into<TemplateName>,
        source: impl Into<PathBuf>,
        flavor: Flavor,
        tuples: Vec<BindingTuple>,
        output: impl OutputPath + 'static,
    ) -> Self {
        let source = source.into();
        let identity = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        TemplateSpec {
            name: name.into(),
            identity,
            source,
            flavor,
            tuples,
            configure: Box::new(NoConfigure),
            output: Box::new(output),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_configure(mut self, configure: impl Configure + 'static) -> Self {
        self.configure = Box::new(configure);
        self
    }

    /// Base environment for `tuple` with this template's configuration applied.
    pub fn environment_for(&self, tuple: &BindingTuple) -> Result<Environment, ExpandError> {
        let mut env = base_environment(self.flavor, tuple);
        self.configure.configure(tuple, &mut env)?;
        Ok(env)
    }

    pub fn path_for(&self, tuple: &BindingTuple) -> Result<PathBuf, ExpandError> {
        self.output.path_for(tuple)
    }

    /// Output path of every tuple, checked for collisions before anything
    /// is expanded.
    pub fn planned_outputs(&self) -> Result<Vec<(BindingTuple, PathBuf)>, RegistryError> {
        let mut seen: BTreeMap<PathBuf, &BindingTuple> = BTreeMap::new();
        let mut planned = Vec::with_capacity(self.tuples.len());
        for tuple in &self.tuples {
            let path = self.path_for(tuple).map_err(|source| self.failed(tuple, source))?;
            if let Some(first) = seen.insert(path.clone(), tuple) {
                return Err(RegistryError::OutputCollision {
                    template: self.name.clone(),
                    path,
                    first: first.clone(),
                    second: tuple.clone(),
                });
            }
            planned.push((tuple.clone(), path));
        }
        Ok(planned)
    }

    /// Expand `text` once per tuple.
    pub fn render(&self, text: &str, expander: &Expander) -> Result<Vec<Rendered>, RegistryError> {
        let planned = self.planned_outputs()?;
        let mut rendered = Vec::with_capacity(planned.len());
        for (tuple, path) in planned {
            debug!(template = %self.name, %tuple, path = %path.display(), "expanding");
            let content = self
                .environment_for(&tuple)
                .and_then(|env| expander.expand(text, &env))
                .map_err(|source| self.failed(&tuple, source))?;
            rendered.push(Rendered { tuple, path, content });
        }
        Ok(rendered)
    }

    fn failed(&self, tuple: &BindingTuple, source: ExpandError) -> RegistryError {
        RegistryError::Instantiation {
            template: self.name.clone(),
            tuple: tuple.clone(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Every template of a project, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    templates: Vec<TemplateSpec>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template; names must be unique.
    pub fn register(&mut self, spec: TemplateSpec) -> Result<(), RegistryError> {
        if self.get(&spec.name).is_some() {
            return Err(RegistryError::DuplicateTemplate(spec.name));
        }
        self.templates.push(spec);
        Ok(())
    }

    pub fn templates(&self) -> &[TemplateSpec] {
        &self.templates
    }

    pub fn get(&self, name: &TemplateName) -> Option<&TemplateSpec> {
        self.templates.iter().find(|t| &t.name == name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Build a registry from manifest declarations.
    pub fn from_manifest(manifest: &Manifest) -> Result<Registry, RegistryError> {
        let mut registry = Registry::new();
        for decl in &manifest.templates {
            registry.register(spec_from_decl(manifest, decl)?)?;
        }
        Ok(registry)
    }
}

// ---------------------------------------------------------------------------
// Manifest-declared templates
// ---------------------------------------------------------------------------

/// Tera context for constant and output patterns.
#[derive(Serialize)]
struct PatternContext<'a> {
    kinds: Vec<&'static str>,
    kind: &'static str,
    key: Option<&'static str>,
    value: Option<&'static str>,
    prefix: String,
    env: &'a BTreeMap<String, String>,
}

impl<'a> PatternContext<'a> {
    fn new(flavor: Flavor, tuple: &BindingTuple, env: &'a BTreeMap<String, String>) -> Self {
        let first = tuple.first().unwrap_or(Kind::Obj);
        let (key, value) = match flavor {
            Flavor::Element => (None, None),
            Flavor::Key => (Some(first), None),
            Flavor::Value => (None, Some(first)),
            Flavor::KeyValue => (Some(first), tuple.second()),
        };
        let prefix = match (key, value) {
            (Some(k), Some(v)) => key_value_prefix(k, v),
            _ => first.to_string(),
        };
        PatternContext {
            kinds: tuple.kinds().iter().map(Kind::as_str).collect(),
            kind: first.as_str(),
            key: key.map(|k| k.as_str()),
            value: value.map(|v| v.as_str()),
            prefix,
            env,
        }
    }

    fn render(&self, pattern: &str) -> Result<String, ExpandError> {
        let pattern_err = |source: tera::Error| ExpandError::Pattern {
            pattern: pattern.to_string(),
            source,
        };
        let ctx = Context::from_serialize(self).map_err(pattern_err)?;
        Tera::one_off(pattern, &ctx, false).map_err(pattern_err)
    }
}

struct DeclConfigure {
    flavor: Flavor,
    constants: BTreeMap<String, String>,
    macros: BTreeMap<String, String>,
}

impl Configure for DeclConfigure {
    fn configure(&self, tuple: &BindingTuple, env: &mut Environment) -> Result<(), ExpandError> {
        // Patterns see the base environment, not each other's output.
        let base = env.constants.clone();
        let ctx = PatternContext::new(self.flavor, tuple, &base);
        for (name, pattern) in &self.constants {
            env.set(name.clone(), ctx.render(pattern)?);
        }
        for (name, pattern) in &self.macros {
            env.define(name.clone(), MacroDef::pattern(pattern.clone()));
        }
        Ok(())
    }
}

struct DeclOutput {
    flavor: Flavor,
    pattern: String,
}

impl OutputPath for DeclOutput {
    fn path_for(&self, tuple: &BindingTuple) -> Result<PathBuf, ExpandError> {
        let base = base_environment(self.flavor, tuple);
        let rendered = PatternContext::new(self.flavor, tuple, &base.constants).render(&self.pattern)?;
        Ok(Path::new(rendered.trim()).to_path_buf())
    }
}

fn spec_from_decl(manifest: &Manifest, decl: &TemplateDecl) -> Result<TemplateSpec, RegistryError> {
    let tuples = decl.binding_tuples()?;
    let spec = TemplateSpec::new(
        decl.name.clone(),
        manifest.template_path(decl),
        decl.flavor,
        tuples,
        DeclOutput {
            flavor: decl.flavor,
            pattern: decl.output.clone(),
        },
    )
    .with_identity(manifest.template_file(decl))
    .with_configure(DeclConfigure {
        flavor: decl.flavor,
        constants: decl.constants.clone(),
        macros: decl.macros.clone(),
    });
    Ok(spec)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
