//! The expansion pipeline for a single template text.

use kindgen_core::SubstitutionMode;

use crate::blocks;
use crate::environment::Environment;
use crate::error::ExpandError;
use crate::macros::expand_macros;
use crate::substitute::substitute;

/// Runs parse → resolve → substitute → macro expansion.
///
/// Stateless apart from the substitution strategy; reuse one value for every
/// instantiation of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expander {
    mode: SubstitutionMode,
}

impl Expander {
    pub fn new(mode: SubstitutionMode) -> Self {
        Expander { mode }
    }

    pub fn mode(&self) -> SubstitutionMode {
        self.mode
    }

    /// Expand `text` against `env`.
    pub fn expand(&self, text: &str, env: &Environment) -> Result<String, ExpandError> {
        let tree = blocks::parse(text)?;
        let resolved = tree.resolve(&env.constants)?;
        let substituted = substitute(&resolved, &env.constants, self.mode);
        expand_macros(&substituted, &env.macros)
    }
}
