//! # kindgen-expander
//!
//! Turns one template text plus one environment into one concrete source
//! file, and declares which environments each template is expanded for.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kindgen_core::{BindingTuple, Flavor, Kind};
//! use kindgen_expander::{ExpandError, Expander, Registry, TemplateSpec};
//! use std::path::PathBuf;
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(TemplateSpec::new(
//!         "Weights",
//!         "template/Weights.java.template",
//!         Flavor::Element,
//!         vec![BindingTuple::single(Kind::Int)],
//!         |t: &BindingTuple| Ok::<_, ExpandError>(PathBuf::from(format!("Weights{}.java", t.kinds()[0]))),
//!     ))
//!     .unwrap();
//! let spec = &registry.templates()[0];
//! let text = std::fs::read_to_string(&spec.source).unwrap();
//! for out in spec.render(&text, &Expander::default()).unwrap() {
//!     println!("{}: {} bytes", out.path.display(), out.content.len());
//! }
//! ```

pub mod blocks;
pub mod condition;
pub mod engine;
pub mod environment;
pub mod error;
pub mod kinds;
pub mod macros;
pub mod registry;
pub mod substitute;

pub use blocks::{parse, Arm, Block, BlockTree, Chain};
pub use condition::Expr;
pub use engine::Expander;
pub use environment::Environment;
pub use error::{ExpandError, RegistryError};
pub use kinds::base_environment;
pub use macros::{expand_macros, MacroDef};
pub use registry::{Configure, OutputPath, Registry, Rendered, TemplateSpec};
pub use substitute::substitute;
