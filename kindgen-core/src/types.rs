//! Domain types for kindgen.
//!
//! A template is instantiated once per [`BindingTuple`]; each axis of the
//! tuple holds a [`Kind`]. The template's [`Flavor`] fixes how many axes a
//! tuple has and which constant names the kind tables are exposed under.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a template declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateName(pub String);

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TemplateName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TemplateName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// A scalar or reference specialization a template is instantiated over.
///
/// Deserialized through [`FromStr`], so manifests may spell kinds in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Kind {
    Obj,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Bool,
    Char,
    /// Absent value; only legal on the value axis of a key/value tuple.
    Void,
}

impl Kind {
    /// Every kind except [`Kind::Void`], in declaration order.
    pub fn all() -> &'static [Kind] {
        &[
            Kind::Obj,
            Kind::Byte,
            Kind::Short,
            Kind::Int,
            Kind::Long,
            Kind::Float,
            Kind::Double,
            Kind::Bool,
            Kind::Char,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Obj => "Obj",
            Kind::Byte => "Byte",
            Kind::Short => "Short",
            Kind::Int => "Int",
            Kind::Long => "Long",
            Kind::Float => "Float",
            Kind::Double => "Double",
            Kind::Bool => "Bool",
            Kind::Char => "Char",
            Kind::Void => "Void",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::all()
            .iter()
            .chain(std::iter::once(&Kind::Void))
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| {
                format!(
                    "unknown kind '{s}'; expected one of: Obj, Byte, Short, Int, Long, Float, Double, Bool, Char, Void"
                )
            })
    }
}

impl TryFrom<String> for Kind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// How a template's binding tuple maps onto the kind tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    /// One axis; kind constants without the `KEY_` infix (`PRIMITIVE_TYPE`).
    #[default]
    Element,
    /// One axis; `KEY_`-named constants.
    Key,
    /// One axis; `VALUE_`-named constants.
    Value,
    /// Two axes (key, value); both constant families plus pair helpers.
    KeyValue,
}

impl Flavor {
    /// Number of kinds in every binding tuple of this flavor.
    pub fn arity(&self) -> usize {
        match self {
            Flavor::KeyValue => 2,
            Flavor::Element | Flavor::Key | Flavor::Value => 1,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Element => write!(f, "element"),
            Flavor::Key => write!(f, "key"),
            Flavor::Value => write!(f, "value"),
            Flavor::KeyValue => write!(f, "key_value"),
        }
    }
}

// ---------------------------------------------------------------------------
// Binding tuples
// ---------------------------------------------------------------------------

/// Ordered kind choices selecting one instantiation of a template.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BindingTuple(pub Vec<Kind>);

impl BindingTuple {
    pub fn single(kind: Kind) -> Self {
        Self(vec![kind])
    }

    pub fn pair(key: Kind, value: Kind) -> Self {
        Self(vec![key, value])
    }

    pub fn kinds(&self) -> &[Kind] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First axis (the key, or the only kind).
    pub fn first(&self) -> Option<Kind> {
        self.0.first().copied()
    }

    /// Second axis (the value of a key/value tuple).
    pub fn second(&self) -> Option<Kind> {
        self.0.get(1).copied()
    }
}

impl fmt::Display for BindingTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            kind.fmt(f)?;
        }
        f.write_str(")")
    }
}

/// Class-name prefix shared by key/value instantiations: `IntInt`, or just
/// `Int` when the value axis is [`Kind::Void`].
pub fn key_value_prefix(key: Kind, value: Kind) -> String {
    if value == Kind::Void {
        key.to_string()
    } else {
        format!("{key}{value}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
