//! Macro-style call expansion.
//!
//! A macro call is a registered name immediately followed by a parenthesised,
//! comma-separated argument list. Parentheses nest; only commas at depth 1
//! separate arguments, so `FOO(a, BAR(b, c), d)` passes `a`, `BAR(b, c)` and
//! `d` to `FOO`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ExpandError;

/// Upper bound on repeated passes for one macro name.
pub const MAX_PASSES: usize = 64;

/// Closure signature for [`MacroDef::Custom`].
pub type MacroFn = Arc<dyn Fn(&[String]) -> String + Send + Sync>;

/// How a macro call is turned into replacement text.
#[derive(Clone)]
pub enum MacroDef {
    /// `M(x)` → `x`
    Identity,
    /// `M(x)` → `{prefix}x{suffix}`
    Wrap { prefix: String, suffix: String },
    /// `M(a, b, …)` → `{function}(a, b, …)`
    Call { function: String },
    /// `M(a, b)` → `a {operator} b`
    Infix { operator: String },
    /// `M(a, b)` → `{function}(a, b) {operator} 0`
    CompareWith { function: String, operator: String },
    /// `$0`, `$1`, … replaced by the arguments; `$$` is a literal `$`.
    Pattern { pattern: String },
    /// Arbitrary code; any number of arguments.
    Custom(MacroFn),
}

impl fmt::Debug for MacroDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroDef::Identity => f.write_str("Identity"),
            MacroDef::Wrap { prefix, suffix } => f
                .debug_struct("Wrap")
                .field("prefix", prefix)
                .field("suffix", suffix)
                .finish(),
            MacroDef::Call { function } => f.debug_struct("Call").field("function", function).finish(),
            MacroDef::Infix { operator } => f.debug_struct("Infix").field("operator", operator).finish(),
            MacroDef::CompareWith { function, operator } => f
                .debug_struct("CompareWith")
                .field("function", function)
                .field("operator", operator)
                .finish(),
            MacroDef::Pattern { pattern } => f.debug_struct("Pattern").field("pattern", pattern).finish(),
            MacroDef::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl MacroDef {
    pub fn wrap(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        MacroDef::Wrap {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn call(function: impl Into<String>) -> Self {
        MacroDef::Call {
            function: function.into(),
        }
    }

    pub fn infix(operator: impl Into<String>) -> Self {
        MacroDef::Infix {
            operator: operator.into(),
        }
    }

    pub fn compare_with(function: impl Into<String>, operator: impl Into<String>) -> Self {
        MacroDef::CompareWith {
            function: function.into(),
            operator: operator.into(),
        }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        MacroDef::Pattern {
            pattern: pattern.into(),
        }
    }

    pub fn custom(f: impl Fn(&[String]) -> String + Send + Sync + 'static) -> Self {
        MacroDef::Custom(Arc::new(f))
    }

    /// Produce the replacement text for one call of macro `name`.
    pub fn expand(&self, name: &str, args: &[String]) -> Result<String, ExpandError> {
        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(ExpandError::MacroArity {
                    name: name.to_string(),
                    expected,
                    found: args.len(),
                })
            }
        };
        match self {
            MacroDef::Identity => {
                arity(1)?;
                Ok(args[0].clone())
            }
            MacroDef::Wrap { prefix, suffix } => {
                arity(1)?;
                Ok(format!("{prefix}{}{suffix}", args[0]))
            }
            MacroDef::Call { function } => Ok(format!("{function}({})", args.join(", "))),
            MacroDef::Infix { operator } => {
                arity(2)?;
                Ok(format!("{} {operator} {}", args[0], args[1]))
            }
            MacroDef::CompareWith { function, operator } => {
                arity(2)?;
                Ok(format!("{function}({}, {}) {operator} 0", args[0], args[1]))
            }
            MacroDef::Pattern { pattern } => {
                arity(pattern_arity(pattern))?;
                Ok(fill_pattern(pattern, args))
            }
            MacroDef::Custom(f) => Ok(f(args)),
        }
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

enum Piece<'a> {
    Text(&'a str),
    Arg(usize),
}

fn pattern_pieces(pattern: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let bytes = pattern.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'$') {
            pieces.push(Piece::Text(&pattern[literal_start..=i]));
            i += 2;
            literal_start = i;
            continue;
        }
        let digits_end = (i + 1..bytes.len())
            .find(|&j| !bytes[j].is_ascii_digit())
            .unwrap_or(bytes.len());
        if digits_end == i + 1 {
            i += 1;
            continue;
        }
        pieces.push(Piece::Text(&pattern[literal_start..i]));
        // Digits only, so the parse cannot fail short of overflow.
        let index = pattern[i + 1..digits_end].parse().unwrap_or(usize::MAX);
        pieces.push(Piece::Arg(index));
        i = digits_end;
        literal_start = i;
    }
    pieces.push(Piece::Text(&pattern[literal_start..]));
    pieces
}

fn pattern_arity(pattern: &str) -> usize {
    pattern_pieces(pattern)
        .iter()
        .filter_map(|p| match p {
            Piece::Arg(i) => Some(i.saturating_add(1)),
            Piece::Text(_) => None,
        })
        .max()
        .unwrap_or(0)
}

fn fill_pattern(pattern: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(pattern.len());
    for piece in pattern_pieces(pattern) {
        match piece {
            Piece::Text(t) => out.push_str(t),
            Piece::Arg(i) => out.push_str(args.get(i).map(String::as_str).unwrap_or_default()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Call scanning
// ---------------------------------------------------------------------------

/// Parse the argument list of a call to `name` whose `(` is expected at
/// byte `open`. Returns the trimmed arguments and the byte just past `)`.
pub fn parse_call_args(text: &str, name: &str, open: usize) -> Result<(Vec<String>, usize), ExpandError> {
    let call_start = open.saturating_sub(name.len());
    if !text[open..].starts_with('(') {
        return Err(ExpandError::MalformedMacroCall {
            name: name.to_string(),
            offset: call_start,
            reason: "name is not followed by `(`",
        });
    }

    let body_start = open + 1;
    let mut depth = 1usize;
    let mut args = Vec::new();
    let mut arg_start = body_start;
    for (i, c) in text[body_start..].char_indices() {
        let pos = body_start + i;
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    args.push(text[arg_start..pos].trim().to_string());
                    if args.len() == 1 && args[0].is_empty() {
                        args.clear();
                    }
                    return Ok((args, pos + 1));
                }
            }
            ',' if depth == 1 => {
                args.push(text[arg_start..pos].trim().to_string());
                arg_start = pos + 1;
            }
            _ => {}
        }
    }

    Err(ExpandError::MalformedMacroCall {
        name: name.to_string(),
        offset: call_start,
        reason: "unbalanced parentheses before end of text",
    })
}

/// One left-to-right pass for `name`; spliced output is not re-scanned.
fn expand_pass(text: &str, name: &str, def: &MacroDef) -> Result<(String, usize), ExpandError> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut count = 0;
    while let Some(found) = text[cursor..].find(name) {
        let begin = cursor + found;
        let (args, end) = parse_call_args(text, name, begin + name.len())?;
        out.push_str(&text[cursor..begin]);
        out.push_str(&def.expand(name, &args)?);
        cursor = end;
        count += 1;
    }
    out.push_str(&text[cursor..]);
    Ok((out, count))
}

/// Expand every registered macro in `text`.
///
/// Names are processed in reverse lexicographic order. Each name is expanded
/// pass after pass until a pass finds no call, so calls nested inside the
/// arguments of the same macro are expanded too. The whole sweep over all
/// names repeats until a sweep expands nothing, so a macro may emit calls to
/// names that sort after it. Up to [`MAX_PASSES`] productive passes per name
/// and sweeps are allowed; one more fails with
/// [`ExpandError::MacroRecursion`].
pub fn expand_macros(text: &str, macros: &BTreeMap<String, MacroDef>) -> Result<String, ExpandError> {
    let mut current = text.to_string();
    let mut sweeps = 0;
    loop {
        let mut last_expanded: Option<&str> = None;
        for (name, def) in macros.iter().rev() {
            if name.is_empty() {
                continue;
            }
            if expand_name(&mut current, name, def)? {
                last_expanded = Some(name.as_str());
            }
        }
        let Some(name) = last_expanded else {
            return Ok(current);
        };
        if sweeps == MAX_PASSES {
            return Err(ExpandError::MacroRecursion {
                name: name.to_string(),
                passes: sweeps + 1,
            });
        }
        sweeps += 1;
    }
}

/// Repeat passes for `name` until one finds no call. Returns whether any
/// call was expanded.
fn expand_name(current: &mut String, name: &str, def: &MacroDef) -> Result<bool, ExpandError> {
    let mut passes = 0;
    loop {
        let (next, expanded) = expand_pass(current, name, def)?;
        if expanded == 0 {
            return Ok(passes > 0);
        }
        if passes == MAX_PASSES {
            return Err(ExpandError::MacroRecursion {
                name: name.to_string(),
                passes: passes + 1,
            });
        }
        *current = next;
        passes += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
