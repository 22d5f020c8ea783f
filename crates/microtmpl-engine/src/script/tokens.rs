// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Token stream of a parsed script.
//!
//! The syntax tree already fixes where every literal and comment lies, so the
//! remaining text between them only holds words and punctuators.

use serde::Serialize;

use crate::span::Span;
use crate::traverse::{traverse, EnterFn, VisitAction};

use super::ast::{script_visitor_keys, LiteralValue, Node, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptToken {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl ScriptToken {
    pub fn is_punctuator(&self, value: &str) -> bool {
        self.kind == TokenKind::Punctuator && self.value == value
    }

    pub fn is_keyword(&self, value: &str) -> bool {
        self.kind == TokenKind::Keyword && self.value == value
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Punctuator,
    Numeric,
    String,
    Template,
    RegularExpression,
    Boolean,
    Null,
    LineComment,
    BlockComment,
    /// Open or close delimiter of a template tag; never part of a script.
    TagDelimiter,
}

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "export",
    "extends",
    "finally",
    "for",
    "function",
    "if",
    "import",
    "in",
    "instanceof",
    "let",
    "new",
    "return",
    "super",
    "switch",
    "this",
    "throw",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
];

/// Longest first, so the first prefix match is the maximal munch.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "<<", ">>", "**", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".",
];

/// Comment token for `span`, with the delimiters stripped from its value.
///
/// Accepts either the full comment range or the range of its content.
pub(super) fn comment(text: &str, span: Span) -> ScriptToken {
    let full = if text[span.start..].starts_with("//") || text[span.start..].starts_with("/*") {
        span
    } else if text[..span.start].ends_with("/*") {
        Span::new(span.start - 2, (span.end + 2).min(text.len()))
    } else {
        Span::new(span.start.saturating_sub(2), span.end)
    };
    let raw = &text[full.start..full.end];
    let (kind, value) = match raw.strip_prefix("/*") {
        Some(rest) => (
            TokenKind::BlockComment,
            rest.strip_suffix("*/").unwrap_or(rest),
        ),
        None => (TokenKind::LineComment, raw.get(2..).unwrap_or_default()),
    };
    ScriptToken {
        kind,
        value: value.to_string(),
        span: full,
    }
}

/// Splits `text` into tokens, taking literal ranges from `ast` and skipping
/// `comments`.
pub(super) fn collect(text: &str, ast: &Node, comments: &[ScriptToken]) -> Vec<ScriptToken> {
    let mut atoms = literal_ranges(ast);
    atoms.extend(comments.iter().map(|comment| (comment.span, comment.kind)));
    atoms.sort_by_key(|(span, _)| span.start);
    let mut atoms = atoms.into_iter().peekable();

    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        while atoms.next_if(|(span, _)| span.start < pos).is_some() {}
        let limit = atoms.peek().map_or(text.len(), |(span, _)| span.start);
        if pos == limit {
            if let Some((span, kind)) = atoms.next() {
                if !matches!(kind, TokenKind::LineComment | TokenKind::BlockComment) {
                    tokens.push(token(text, kind, span));
                }
                pos = pos.max(span.end);
            }
            continue;
        }

        let rest = &text[pos..limit];
        let Some(ch) = rest.chars().next() else {
            break;
        };
        if ch.is_whitespace() || ch == '\u{feff}' {
            pos += ch.len_utf8();
            continue;
        }
        let (kind, len) = match ch {
            '"' | '\'' => (TokenKind::String, quoted_len(rest, ch)),
            '0'..='9' => (TokenKind::Numeric, word_len(rest)),
            c if is_identifier_start(c) => {
                let len = word_len(rest);
                (word_kind(&rest[..len]), len)
            }
            _ => (TokenKind::Punctuator, punctuator_len(rest)),
        };
        tokens.push(token(text, kind, Span::new(pos, pos + len)));
        pos += len;
    }
    tokens
}

fn literal_ranges(ast: &Node) -> Vec<(Span, TokenKind)> {
    let mut ranges = Vec::new();
    let mut visitor = EnterFn(|node: &Node, _parent: Option<&Node>| {
        let kind = match &node.kind {
            NodeKind::Literal { value, .. } => match value {
                LiteralValue::String(_) => TokenKind::String,
                LiteralValue::Number(_) => TokenKind::Numeric,
                LiteralValue::Boolean(_) => TokenKind::Boolean,
                LiteralValue::Null => TokenKind::Null,
                LiteralValue::Regex { .. } => TokenKind::RegularExpression,
            },
            NodeKind::TemplateLiteral { .. } => TokenKind::Template,
            _ => return VisitAction::Continue,
        };
        ranges.push((node.span, kind));
        VisitAction::Continue
    });
    traverse(ast, script_visitor_keys(), &mut visitor);
    ranges
}

fn token(text: &str, kind: TokenKind, span: Span) -> ScriptToken {
    ScriptToken {
        kind,
        value: text[span.start..span.end].to_string(),
        span,
    }
}

fn word_kind(word: &str) -> TokenKind {
    match word {
        "true" | "false" => TokenKind::Boolean,
        "null" => TokenKind::Null,
        _ if KEYWORDS.contains(&word) => TokenKind::Keyword,
        _ => TokenKind::Identifier,
    }
}

fn word_len(rest: &str) -> usize {
    rest.char_indices()
        .skip(1)
        .find(|(_, ch)| !is_identifier_part(*ch))
        .map_or(rest.len(), |(idx, _)| idx)
}

fn quoted_len(rest: &str, quote: char) -> usize {
    let mut escaped = false;
    for (idx, ch) in rest.char_indices().skip(1) {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            _ if ch == quote => return idx + 1,
            _ => {}
        }
    }
    rest.len()
}

fn punctuator_len(rest: &str) -> usize {
    PUNCTUATORS
        .iter()
        .find(|candidate| rest.starts_with(*candidate))
        .map_or_else(|| rest.chars().next().map_or(1, char::len_utf8), |p| p.len())
}

fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch == '\\' || ch == '#' || ch.is_alphabetic()
}

fn is_identifier_part(ch: char) -> bool {
    matches!(ch, '_' | '$' | '\\' | '\u{200c}' | '\u{200d}') || ch.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{EmbeddedScriptParser, ScriptParser};

    fn kinds(input: &str) -> Vec<(TokenKind, String)> {
        let program = EmbeddedScriptParser.parse(input).unwrap();
        program.tokens.into_iter().map(|t| (t.kind, t.value)).collect()
    }

    #[test]
    fn punctuators_use_maximal_munch() {
        let tokens = kinds("a !== b; c >>>= d?.e");
        let values: Vec<_> = tokens.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, vec!["a", "!==", "b", ";", "c", ">>>=", "d", "?.", "e"]);
    }

    #[test]
    fn literals_come_from_the_syntax_tree() {
        let tokens = kinds("x = a / b / c; y = /re\\/g/gi.test(s) ? 'it\\'s' : `t${x}`");
        let divisions = tokens
            .iter()
            .filter(|(kind, value)| *kind == TokenKind::Punctuator && value == "/")
            .count();
        assert_eq!(divisions, 2);
        assert!(tokens.contains(&(TokenKind::String, "'it\\'s'".to_string())));
        assert!(tokens.contains(&(TokenKind::RegularExpression, "/re\\/g/gi".to_string())));
        assert!(tokens.contains(&(TokenKind::Template, "`t${x}`".to_string())));
    }

    #[test]
    fn optional_chaining_does_not_swallow_a_decimal() {
        let tokens = kinds("a?.5:1");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Identifier, "a".to_string()),
                (TokenKind::Punctuator, "?".to_string()),
                (TokenKind::Numeric, ".5".to_string()),
                (TokenKind::Punctuator, ":".to_string()),
                (TokenKind::Numeric, "1".to_string()),
            ]
        );
    }

    #[test]
    fn comments_are_split_off_with_inner_values() {
        let program = EmbeddedScriptParser
            .parse("a // line\n/* block */ b")
            .unwrap();
        let values: Vec<_> = program.tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["a", "b"]);
        let comments: Vec<_> = program
            .comments
            .iter()
            .map(|c| (c.kind, c.value.as_str(), c.span))
            .collect();
        assert_eq!(
            comments,
            vec![
                (TokenKind::LineComment, " line", Span::new(2, 9)),
                (TokenKind::BlockComment, " block ", Span::new(10, 21)),
            ]
        );
    }

    #[test]
    fn words_are_classified() {
        let tokens = kinds("if (this.x instanceof Y) { void 0 } else null");
        let keywords: Vec<_> = tokens
            .iter()
            .filter(|(kind, _)| *kind == TokenKind::Keyword)
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(keywords, vec!["if", "this", "instanceof", "void", "else"]);
        assert_eq!(tokens.last(), Some(&(TokenKind::Null, "null".to_string())));
    }
}
