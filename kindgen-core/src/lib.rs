//! kindgen core library — domain types, manifest loading, errors.
//!
//! - [`types`] — kinds, flavors, binding tuples
//! - [`manifest`] — the YAML project manifest
//! - [`error`] — [`ManifestError`]

pub mod error;
pub mod manifest;
pub mod types;

pub use error::ManifestError;
pub use manifest::{FormatterConfig, Manifest, SubstitutionMode, TemplateDecl, TupleEntry, TupleSet, MANIFEST_FILE_NAME};
pub use types::{key_value_prefix, BindingTuple, Flavor, Kind, TemplateName};
