//! Per-instantiation environment: constants plus macro strategies.

use std::collections::BTreeMap;

use crate::macros::MacroDef;

/// Bindings visible to one expansion.
///
/// Constants feed both condition evaluation and substitution; macros feed
/// the macro expander. Both maps are ordered so every pass is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub constants: BTreeMap<String, String>,
    pub macros: BTreeMap<String, MacroDef>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a constant.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    /// Insert or overwrite a macro.
    pub fn define(&mut self, name: impl Into<String>, def: MacroDef) -> &mut Self {
        self.macros.insert(name.into(), def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.constants.get(name).map(String::as_str)
    }

    /// Rewrite every occurrence of `from` inside constant and macro names.
    pub fn rename(self, from: &str, to: &str) -> Self {
        let rename = |name: String| name.replace(from, to);
        Environment {
            constants: self
                .constants
                .into_iter()
                .map(|(k, v)| (rename(k), v))
                .collect(),
            macros: self
                .macros
                .into_iter()
                .map(|(k, v)| (rename(k), v))
                .collect(),
        }
    }

    /// Merge `other` into `self`; entries of `other` win.
    pub fn extend(&mut self, other: Environment) {
        self.constants.extend(other.constants);
        self.macros.extend(other.macros);
    }
}
