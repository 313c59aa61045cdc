//! # kindgen-sync
//!
//! Digest-gated incremental generation.
//!
//! Call [`generate`] to expand every changed template of a manifest and
//! write the results, [`clean`] to remove generated output, [`status`] to
//! inspect what a run would do and [`diff_template`] to preview one template.

pub mod diff;
pub mod error;
pub mod format;
pub mod hash_store;
pub mod pipeline;
pub mod status;
pub mod writer;

pub use diff::{diff_template, FileDiff};
pub use error::GenError;
pub use format::FormatOutcome;
pub use pipeline::{clean, generate, CleanReport, GenerateOptions, GenerateReport, TemplateOutcome, TemplateReport};
pub use status::{status, StatusEntry, TemplateStatus};
pub use writer::WriteResult;
