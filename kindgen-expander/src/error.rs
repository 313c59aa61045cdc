//! Error types for kindgen-expander.

use std::path::PathBuf;

use thiserror::Error;

use kindgen_core::{BindingTuple, ManifestError, TemplateName};

/// Errors raised while expanding one template text for one environment.
#[derive(Debug, Error)]
pub enum ExpandError {
    /// Malformed `#if` / `#elif` / `#else` / `#endif` nesting.
    #[error("line {line}: {message}")]
    Structure { line: usize, message: String },

    /// A directive whose condition expression does not parse.
    #[error("line {line}: invalid condition `{expr}`: {message}")]
    ConditionSyntax {
        line: usize,
        expr: String,
        message: String,
    },

    /// A condition referenced a name missing from the environment.
    #[error("undefined symbol `{name}`")]
    UndefinedSymbol { name: String },

    /// A macro name not followed by a well-formed argument list.
    #[error("malformed call to macro `{name}` at byte {offset}: {reason}")]
    MalformedMacroCall {
        name: String,
        offset: usize,
        reason: &'static str,
    },

    /// A macro invoked with the wrong number of arguments.
    #[error("macro `{name}` takes {expected} argument(s), got {found}")]
    MacroArity {
        name: String,
        expected: usize,
        found: usize,
    },

    /// A macro kept producing calls to itself.
    #[error("macro `{name}` still expanding after {passes} passes")]
    MacroRecursion { name: String, passes: usize },

    /// A manifest pattern (constant value or output path) failed to render.
    #[error("pattern `{pattern}` failed to render: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: tera::Error,
    },
}

/// Errors raised while planning or instantiating registry templates.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two tuples of one template map to the same output path.
    #[error("template '{template}': tuples {first} and {second} both write {path}")]
    OutputCollision {
        template: TemplateName,
        path: PathBuf,
        first: BindingTuple,
        second: BindingTuple,
    },

    /// Expansion of one (template, tuple) pair failed.
    #[error("template '{template}' {tuple}: {source}")]
    Instantiation {
        template: TemplateName,
        tuple: BindingTuple,
        #[source]
        source: ExpandError,
    },

    /// A template with this name is already registered.
    #[error("template '{0}' is registered more than once")]
    DuplicateTemplate(TemplateName),

    /// The manifest the registry was built from is invalid.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

pub(crate) fn structure(line: usize, message: impl Into<String>) -> ExpandError {
    ExpandError::Structure {
        line,
        message: message.into(),
    }
}
