// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Script side of a template: the parser for the code inside template tags.
//!
//! The parser consumes the micro script view built by
//! [`crate::embed::build_micro_script`], so every span it reports is a byte
//! range of the original document. Syntax is checked by `oxc_parser`; the
//! result is lowered into an owned ESTree-shaped tree plus token and comment
//! streams.

pub mod ast;
mod lower;
pub mod tokens;

pub use ast::{
    script_visitor_keys, DeclarationKind, LiteralValue, Node, NodeId, NodeKind, PropertyKind,
};
pub use tokens::{ScriptToken, TokenKind};

use oxc_allocator::Allocator;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;

use crate::error::Error;
use crate::span::Span;

/// Brackets nested deeper than this are rejected before parsing.
const MAX_BRACKET_DEPTH: usize = 64;

/// Parsed script: syntax tree plus the token and comment streams.
#[derive(Debug, Clone)]
pub struct ScriptProgram {
    pub ast: Node,
    pub tokens: Vec<ScriptToken>,
    pub comments: Vec<ScriptToken>,
}

impl ScriptProgram {
    /// Tokens lying entirely inside `span`.
    pub fn tokens_in(&self, span: Span) -> &[ScriptToken] {
        slice_within(&self.tokens, span)
    }

    /// Comments lying entirely inside `span`.
    pub fn comments_in(&self, span: Span) -> &[ScriptToken] {
        slice_within(&self.comments, span)
    }
}

fn slice_within(tokens: &[ScriptToken], span: Span) -> &[ScriptToken] {
    let start = tokens.partition_point(|token| token.span.start < span.start);
    let end = tokens.partition_point(|token| token.span.end <= span.end);
    &tokens[start..end.max(start)]
}

/// Parser seam for the script language embedded in template tags.
pub trait ScriptParser {
    fn parse(&self, text: &str) -> Result<ScriptProgram, Error>;
}

/// Default parser: sloppy-mode ECMAScript as a compiled template function body
/// would see it, so a top-level `return` is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedScriptParser;

impl ScriptParser for EmbeddedScriptParser {
    fn parse(&self, text: &str) -> Result<ScriptProgram, Error> {
        check_bracket_depth(text)?;

        let allocator = Allocator::default();
        let options = ParseOptions {
            allow_return_outside_function: true,
            preserve_parens: false,
            ..ParseOptions::default()
        };
        let ret = Parser::new(&allocator, text, SourceType::cjs())
            .with_options(options)
            .parse();
        if let Some(diagnostic) = ret.errors.first() {
            let span = diagnostic
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| Span::new(label.offset(), label.offset() + label.len()));
            return Err(Error::script(diagnostic.message.to_string(), span));
        }
        if ret.panicked {
            return Err(Error::script("script parser gave up", None));
        }

        let ast = lower::Lowering::new(text).program(&ret.program)?;
        let comments: Vec<ScriptToken> = ret
            .program
            .comments
            .iter()
            .map(|comment| {
                let span = Span::new(comment.span.start as usize, comment.span.end as usize);
                tokens::comment(text, span)
            })
            .collect();
        let tokens = tokens::collect(text, &ast, &comments);
        Ok(ScriptProgram {
            ast,
            tokens,
            comments,
        })
    }
}

/// Rejects bracket nesting the parser would have to recurse through.
///
/// String literals and comments are skipped; regular expressions are not, so
/// brackets inside them count.
fn check_bracket_depth(text: &str) -> Result<(), Error> {
    let mut depth = 0usize;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '(' | '[' | '{' => {
                depth += 1;
                if depth > MAX_BRACKET_DEPTH {
                    return Err(Error::script_with_span(
                        format!("brackets nested deeper than {MAX_BRACKET_DEPTH} levels"),
                        Span::new(idx, idx + 1),
                    ));
                }
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '"' | '\'' => {
                let mut escaped = false;
                for (_, inner) in chars.by_ref() {
                    match inner {
                        _ if escaped => escaped = false,
                        '\\' => escaped = true,
                        '\n' | '\r' => break,
                        _ if inner == ch => break,
                        _ => {}
                    }
                }
            }
            '/' if chars.next_if(|(_, next)| *next == '/').is_some() => {
                while chars.next_if(|(_, next)| !matches!(*next, '\n' | '\r')).is_some() {}
            }
            '/' if chars.next_if(|(_, next)| *next == '*').is_some() => {
                let mut star = false;
                for (_, inner) in chars.by_ref() {
                    if star && inner == '/' {
                        break;
                    }
                    star = inner == '*';
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::build_micro_script;
    use crate::traverse::TreeNode;
    use crate::tags::{tokenize, TemplateSettings};

    #[test]
    fn parses_the_micro_script_of_a_template() {
        let source = "<% var items = list || [] %>\n<ul><% items.forEach(function (item) { %>\n  <li><%- item.name %></li>\n<% }) %></ul>";
        let tags = tokenize(source, &TemplateSettings::default()).unwrap();
        let script = build_micro_script(source, &tags);
        let program = EmbeddedScriptParser.parse(&script).unwrap();
        let NodeKind::Program { body } = &program.ast.kind else {
            panic!("expected program");
        };
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].text(source), "var items = list || []");

        let escape = tags[2];
        let inner: Vec<_> = program
            .tokens_in(escape.code)
            .iter()
            .map(|token| token.value.as_str())
            .collect();
        assert_eq!(inner, vec!["item", ".", "name"]);
    }

    #[test]
    fn script_errors_point_into_the_original_document() {
        let source = "<p><% if (a { %>x<% } %></p>";
        let tags = tokenize(source, &TemplateSettings::default()).unwrap();
        let script = build_micro_script(source, &tags);
        let err = EmbeddedScriptParser.parse(&script).unwrap_err();
        let span = err.span().unwrap();
        assert!(tags[0].code.encloses(span), "{span} outside the tag");
        assert!(err.to_string().starts_with("script error: "));
    }

    #[test]
    fn template_bodies_may_return_early() {
        let program = EmbeddedScriptParser.parse("if (!items) return;\nlist(items)").unwrap();
        let NodeKind::Program { body } = &program.ast.kind else {
            panic!("expected program");
        };
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].node_type(), "IfStatement");
    }

    #[test]
    fn leading_strings_stay_expression_statements() {
        let source = "   'use strict' \n   x \n";
        let program = EmbeddedScriptParser.parse(source).unwrap();
        let NodeKind::Program { body } = &program.ast.kind else {
            panic!("expected program");
        };
        assert_eq!(body.len(), 2);
        let NodeKind::ExpressionStatement { expression } = &body[0].kind else {
            panic!("expected expression statement");
        };
        assert_eq!(expression.text(source), "'use strict'");
        assert_eq!(program.tokens[0].kind, TokenKind::String);
    }

    #[test]
    fn deep_brackets_are_an_error_not_a_crash() {
        let nested = |depth: usize| format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
        assert!(EmbeddedScriptParser.parse(&nested(MAX_BRACKET_DEPTH)).is_ok());

        let err = EmbeddedScriptParser.parse(&nested(10_000)).unwrap_err();
        assert_eq!(
            err.message(),
            format!("brackets nested deeper than {MAX_BRACKET_DEPTH} levels")
        );
        assert_eq!(err.span(), Some(Span::new(MAX_BRACKET_DEPTH, MAX_BRACKET_DEPTH + 1)));
    }

    #[test]
    fn brackets_in_strings_and_comments_do_not_count() {
        let source = format!(
            "x = '{0}' + \"{0}\" // {0}\n/* {0} */ y",
            "(".repeat(MAX_BRACKET_DEPTH * 2)
        );
        assert!(EmbeddedScriptParser.parse(&source).is_ok());
    }
}
