//! Conditional block parsing and resolution.
//!
//! Directive lines must start at column 0:
//!
//! | Directive      | Meaning                                    |
//! |----------------|--------------------------------------------|
//! | `#if <expr>`   | open a chain with its first arm            |
//! | `#elif <expr>` | close the current arm, open a sibling arm  |
//! | `#else`        | close the current arm, open the final arm  |
//! | `#endif`       | close the chain                            |
//!
//! Every other line is literal text. Parsing uses an explicit stack of open
//! chains, so nesting depth is bounded only by memory.

use std::collections::BTreeMap;

use crate::condition::Expr;
use crate::error::{structure, ExpandError};

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// One node of a block tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Line(String),
    Conditional(Chain),
}

/// An `#if … #endif` chain. Arms are checked in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub arms: Vec<Arm>,
}

/// One arm of a chain; `condition` is `None` for `#else`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
    pub condition: Option<Expr>,
    pub body: Vec<Block>,
    /// 1-based line of the directive that opened this arm.
    pub line: usize,
}

/// Root container of a parsed template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockTree {
    pub blocks: Vec<Block>,
}

// ---------------------------------------------------------------------------
// Directives
// ---------------------------------------------------------------------------

enum Directive<'a> {
    If(&'a str),
    Elif(&'a str),
    Else,
    Endif,
}

/// `rest` is what follows a directive keyword; it must be empty or start
/// with whitespace so `#ifdef` or `#endif_marker` stay literal.
fn keyword_tail<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn classify(line: &str) -> Option<Directive<'_>> {
    if !line.starts_with('#') {
        return None;
    }
    if let Some(expr) = keyword_tail(line, "#if") {
        return Some(Directive::If(expr));
    }
    if let Some(expr) = keyword_tail(line, "#elif") {
        return Some(Directive::Elif(expr));
    }
    if keyword_tail(line, "#else").is_some() {
        return Some(Directive::Else);
    }
    if keyword_tail(line, "#endif").is_some() {
        return Some(Directive::Endif);
    }
    None
}

fn parse_condition(src: &str, line: usize) -> Result<Expr, ExpandError> {
    Expr::parse(src).map_err(|e| ExpandError::ConditionSyntax {
        line,
        expr: src.to_string(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct OpenChain {
    arms: Vec<Arm>,
    opened_at: usize,
    has_else: bool,
}

fn push_block(root: &mut Vec<Block>, stack: &mut [OpenChain], block: Block) {
    match stack.last_mut().and_then(|open| open.arms.last_mut()) {
        Some(arm) => arm.body.push(block),
        None => root.push(block),
    }
}

/// Parse template text into a [`BlockTree`].
///
/// Fails with [`ExpandError::Structure`] on unmatched or misplaced
/// directives and [`ExpandError::ConditionSyntax`] on unparsable conditions.
pub fn parse(text: &str) -> Result<BlockTree, ExpandError> {
    let mut root = Vec::new();
    let mut stack: Vec<OpenChain> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        match classify(line) {
            None => push_block(&mut root, &mut stack, Block::Line(line.to_string())),
            Some(Directive::If(src)) => {
                let condition = parse_condition(src, lineno)?;
                stack.push(OpenChain {
                    arms: vec![Arm {
                        condition: Some(condition),
                        body: Vec::new(),
                        line: lineno,
                    }],
                    opened_at: lineno,
                    has_else: false,
                });
            }
            Some(Directive::Elif(src)) => {
                let Some(open) = stack.last_mut() else {
                    return Err(structure(lineno, "#elif without matching #if"));
                };
                if open.has_else {
                    return Err(structure(lineno, "#elif after #else"));
                }
                let condition = parse_condition(src, lineno)?;
                open.arms.push(Arm {
                    condition: Some(condition),
                    body: Vec::new(),
                    line: lineno,
                });
            }
            Some(Directive::Else) => {
                let Some(open) = stack.last_mut() else {
                    return Err(structure(lineno, "#else without matching #if"));
                };
                if open.has_else {
                    return Err(structure(lineno, "duplicate #else"));
                }
                open.has_else = true;
                open.arms.push(Arm {
                    condition: None,
                    body: Vec::new(),
                    line: lineno,
                });
            }
            Some(Directive::Endif) => {
                let Some(open) = stack.pop() else {
                    return Err(structure(lineno, "#endif without matching #if"));
                };
                push_block(
                    &mut root,
                    &mut stack,
                    Block::Conditional(Chain { arms: open.arms }),
                );
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(structure(open.opened_at, "#if is never closed by #endif"));
    }
    Ok(BlockTree { blocks: root })
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

impl BlockTree {
    /// Flatten the tree into text, keeping only the first matching arm of
    /// each chain. The result always ends with a newline.
    pub fn resolve(&self, constants: &BTreeMap<String, String>) -> Result<String, ExpandError> {
        let mut lines = Vec::new();
        collect_lines(&self.blocks, constants, &mut lines)?;
        let mut text = lines.join("\n");
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }
}

fn collect_lines<'a>(
    blocks: &'a [Block],
    constants: &BTreeMap<String, String>,
    out: &mut Vec<&'a str>,
) -> Result<(), ExpandError> {
    for block in blocks {
        match block {
            Block::Line(line) => out.push(line),
            Block::Conditional(chain) => {
                for arm in &chain.arms {
                    let taken = match &arm.condition {
                        None => true,
                        Some(cond) => cond.evaluate(constants)?,
                    };
                    if taken {
                        collect_lines(&arm.body, constants, out)?;
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolve(text: &str, pairs: &[(&str, &str)]) -> String {
        parse(text)
            .expect("parse")
            .resolve(&env(pairs))
            .expect("resolve")
    }

    const CHAIN: &str = "head\n#if T == \"a\"\nA\n#elif T == \"b\"\nB\n#elif T != \"z\"\nNOT_Z\n#else\nZ\n#endif\ntail\n";

    #[test]
    fn plain_text_passes_through_with_trailing_newline() {
        assert_eq!(resolve("a\nb\n", &[]), "a\nb\n");
        assert_eq!(resolve("a\nb", &[]), "a\nb\n");
        assert_eq!(resolve("", &[]), "\n");
    }

    #[test]
    fn first_true_arm_wins() {
        assert_eq!(resolve(CHAIN, &[("T", "a")]), "head\nA\ntail\n");
        assert_eq!(resolve(CHAIN, &[("T", "b")]), "head\nB\ntail\n");
        assert_eq!(resolve(CHAIN, &[("T", "q")]), "head\nNOT_Z\ntail\n");
        assert_eq!(resolve(CHAIN, &[("T", "z")]), "head\nZ\ntail\n");
    }

    #[test]
    fn chain_without_else_may_emit_nothing() {
        let text = "#if X\nyes\n#endif\n";
        assert_eq!(resolve(text, &[("X", "")]), "\n");
        assert_eq!(resolve(text, &[("X", "1")]), "yes\n");
    }

    #[test]
    fn later_arms_are_not_evaluated_after_a_match() {
        // MISSING would raise UndefinedSymbol if the #elif were evaluated.
        let text = "#if X == \"1\"\none\n#elif MISSING\nother\n#endif\n";
        assert_eq!(resolve(text, &[("X", "1")]), "one\n");
    }

    #[test]
    fn nested_chains_resolve_independently() {
        let text = "#if A\n#if B\nab\n#else\na_only\n#endif\n#else\nnone\n#endif\n";
        assert_eq!(resolve(text, &[("A", "1"), ("B", "1")]), "ab\n");
        assert_eq!(resolve(text, &[("A", "1"), ("B", "")]), "a_only\n");
        assert_eq!(resolve(text, &[("A", ""), ("B", "1")]), "none\n");
    }

    #[test]
    fn parse_builds_one_chain_with_three_arms() {
        let tree = parse("#if A\nx\n#elif B\ny\n#else\nz\n#endif\n").expect("parse");
        assert_eq!(tree.blocks.len(), 1);
        let Block::Conditional(chain) = &tree.blocks[0] else {
            panic!("expected conditional");
        };
        assert_eq!(chain.arms.len(), 3);
        assert!(chain.arms[2].condition.is_none());
        assert_eq!(chain.arms[1].line, 3);
    }

    #[test]
    fn directive_like_lines_stay_literal() {
        let text = "#ifdef FOO\n  #if indented\n#endif_marker\n#include <x>\n";
        assert_eq!(resolve(text, &[]), text);
    }

    #[test]
    fn crlf_input_is_normalised() {
        assert_eq!(resolve("a\r\n#if X\r\nb\r\n#endif\r\n", &[("X", "1")]), "a\nb\n");
    }

    #[test]
    fn structure_errors_carry_line_numbers() {
        let cases = [
            ("#endif\n", 1, "#endif without"),
            ("x\n#else\n", 2, "#else without"),
            ("#elif A\n", 1, "#elif without"),
            ("#if A\n#else\n#elif B\n#endif\n", 3, "#elif after #else"),
            ("#if A\n#else\n#else\n#endif\n", 3, "duplicate #else"),
            ("a\n#if A\nb\n", 2, "never closed"),
        ];
        for (text, line, fragment) in cases {
            match parse(text) {
                Err(ExpandError::Structure { line: got, message }) => {
                    assert_eq!(got, line, "line for {text:?}");
                    assert!(message.contains(fragment), "message {message:?} for {text:?}");
                }
                other => panic!("expected structure error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn bad_condition_is_a_syntax_error() {
        let err = parse("ok\n#if A ==\nx\n#endif\n").unwrap_err();
        assert!(matches!(err, ExpandError::ConditionSyntax { line: 2, .. }), "got {err:?}");
        let err = parse("#if\nx\n#endif\n").unwrap_err();
        assert!(matches!(err, ExpandError::ConditionSyntax { line: 1, .. }), "got {err:?}");
    }
}
