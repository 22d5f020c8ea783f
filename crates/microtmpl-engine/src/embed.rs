// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Offset-preserving rewrites of a template document.
//!
//! Every function here returns a string with exactly the byte length of its
//! input. Blanked characters become as many spaces as their UTF-8 width and
//! line terminators stay where they are, so offsets and line numbers computed
//! on a view are valid for the original document.

use crate::source::is_line_terminator;
use crate::span::Span;
use crate::tags::{TagKind, TemplateTag};

/// Replaces every non line-terminator character with spaces.
pub fn blank(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_blank(&mut out, text);
    out
}

fn push_blank(out: &mut String, text: &str) {
    for ch in text.chars() {
        if is_line_terminator(ch) {
            out.push(ch);
        } else {
            push_spaces(out, ch.len_utf8());
        }
    }
}

fn push_spaces(out: &mut String, count: usize) {
    out.extend(std::iter::repeat(' ').take(count));
}

fn has_line_break(text: &str) -> bool {
    text.chars().any(is_line_terminator)
}

/// Byte length of the first `count` chars of `text`, or `None` when the text
/// is shorter.
fn prefix_len(text: &str, count: usize) -> Option<usize> {
    if count == 0 {
        return Some(0);
    }
    text.char_indices()
        .nth(count)
        .map(|(idx, _)| idx)
        .or_else(|| (text.chars().count() == count).then_some(text.len()))
}

fn suffix_start(text: &str, count: usize) -> Option<usize> {
    if count == 0 {
        return Some(text.len());
    }
    text.char_indices().rev().nth(count - 1).map(|(idx, _)| idx)
}

/// Splits `text` into `(head, middle, tail)` where head holds `head_chars`
/// chars and tail `tail_chars`, provided none of them contain a line break.
fn split_edges(text: &str, head_chars: usize, tail_chars: usize) -> Option<(&str, &str, &str)> {
    if text.chars().count() < head_chars + tail_chars {
        return None;
    }
    let head_end = prefix_len(text, head_chars)?;
    let tail_start = suffix_start(text, tail_chars)?;
    if tail_start < head_end {
        return None;
    }
    let (head, tail) = (&text[..head_end], &text[tail_start..]);
    if has_line_break(head) || has_line_break(tail) {
        return None;
    }
    Some((head, &text[head_end..tail_start], tail))
}

/// Writes `marker` followed by spaces so the result spans `text.len()` bytes.
fn push_padded_marker(out: &mut String, marker: &str, text: &str) {
    out.push_str(marker);
    push_spaces(out, text.len() - marker.len());
}

fn push_marker_padded_left(out: &mut String, marker: &str, text: &str) {
    push_spaces(out, text.len() - marker.len());
    out.push_str(marker);
}

/// `/*` + blanked inner + `*/`, so a tag becomes one block comment token.
fn comment_tag(out: &mut String, text: &str, head_chars: usize, lead: &str) -> bool {
    let Some((head, middle, tail)) = split_edges(text, head_chars, 2) else {
        return false;
    };
    let marker = format!("{lead}/*");
    if head.len() < marker.len() || tail.len() < 2 {
        return false;
    }
    push_padded_marker(out, &marker, head);
    push_blank(out, middle);
    push_marker_padded_left(out, "*/", tail);
    true
}

fn embed_evaluate(out: &mut String, text: &str) {
    if !comment_tag(out, text, 2, "") {
        push_blank(out, text);
    }
}

fn embed_output(out: &mut String, text: &str, code: &str) {
    if !has_line_break(code) {
        out.extend(std::iter::repeat('_').take(text.len()));
        return;
    }
    if comment_tag(out, text, 3, "_") {
        return;
    }
    let mut forced = false;
    for ch in text.chars() {
        if is_line_terminator(ch) {
            out.push(ch);
        } else if !forced && !ch.is_whitespace() {
            forced = true;
            out.push('_');
            push_spaces(out, ch.len_utf8() - 1);
        } else {
            push_spaces(out, ch.len_utf8());
        }
    }
}

/// Builds the template view: every tag is replaced by a same-length fragment
/// that is neutral script syntax, so inline `<script>` bodies and attribute
/// values stay parseable. Tags touching a `striped` range are blanked.
pub fn embed_interpolations(text: &str, tags: &[TemplateTag], striped: &[Span]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for tag in tags {
        out.push_str(&text[cursor..tag.span.start]);
        let tag_text = tag.text(text);
        if striped.iter().any(|range| range.intersects(tag.span)) {
            push_blank(&mut out, tag_text);
        } else {
            match tag.kind {
                TagKind::Evaluate => embed_evaluate(&mut out, tag_text),
                TagKind::Interpolate | TagKind::Escape => {
                    embed_output(&mut out, tag_text, tag.code_text(text));
                }
            }
        }
        cursor = tag.span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Blanks the given ranges of `text`, leaving everything else untouched.
pub fn blank_ranges(text: &str, ranges: &[Span]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for range in ranges {
        let start = range.start.max(cursor).min(text.len());
        let end = range.end.min(text.len());
        if end <= start {
            continue;
        }
        out.push_str(&text[cursor..start]);
        push_blank(&mut out, &text[start..end]);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Builds the script view consumed by the script parser.
///
/// Text outside tags is blanked and tag code is kept verbatim. Every close
/// delimiter starts a new line, so a trailing line comment or a statement
/// without semicolon never runs into the next tag. Output tags become an
/// expression statement of their own: the last byte of the open delimiter
/// becomes `;` and the close delimiter holds the terminating `;`, so
/// `<%= x %>` turns into `  ; x \n;`.
///
/// The leading `;` ends a dangling statement head the way the compiled
/// lodash template does, where the evaluate code is followed by `;`: in
/// `<% if (a) %><%= x %>` the `if` gets an empty body.
pub fn build_micro_script(text: &str, tags: &[TemplateTag]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for tag in tags {
        push_blank(&mut out, &text[cursor..tag.span.start]);
        let open = tag.open_text(text);
        let close = tag.close_text(text);
        if tag.kind.is_output() {
            push_with_suffix(&mut out, open, ";");
        } else {
            push_blank(&mut out, open);
        }
        out.push_str(tag.code_text(text));
        push_close_delimiter(&mut out, close, tag.kind.is_output());
        cursor = tag.span.end;
    }
    push_blank(&mut out, &text[cursor..]);
    out
}

fn push_close_delimiter(out: &mut String, delimiter: &str, terminate: bool) {
    let mut chars = delimiter.chars();
    let Some(first) = chars.next() else {
        return;
    };
    if is_line_terminator(first) {
        out.push(first);
    } else {
        out.push('\n');
        push_spaces(out, first.len_utf8() - 1);
    }
    let rest = chars.as_str();
    match rest.chars().next() {
        Some(second) if terminate && !is_line_terminator(second) => {
            out.push(';');
            push_spaces(out, second.len_utf8() - 1);
            push_blank(out, &rest[second.len_utf8()..]);
        }
        _ => push_blank(out, rest),
    }
}

/// Blanks `delimiter` and overwrites its trailing bytes with `marker` when
/// the delimiter is long enough.
fn push_with_suffix(out: &mut String, delimiter: &str, marker: &str) {
    if delimiter.len() >= marker.len() && !has_line_break(delimiter) {
        push_marker_padded_left(out, marker, delimiter);
    } else {
        push_blank(out, delimiter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{tokenize, TemplateSettings};

    fn tags(src: &str) -> Vec<TemplateTag> {
        tokenize(src, &TemplateSettings::default()).unwrap()
    }

    fn assert_offsets_preserved(original: &str, view: &str, tags: &[TemplateTag]) {
        assert_eq!(original.len(), view.len());
        for (idx, byte) in original.bytes().enumerate() {
            if tags.iter().any(|tag| tag.span.contains(idx)) {
                continue;
            }
            assert_eq!(view.as_bytes()[idx], byte, "byte {idx} changed");
        }
    }

    #[test]
    fn evaluate_tags_become_comments_or_whitespace() {
        let src = "<div><% if (a) { %>x</div><%\n} %>";
        let tags = tags(src);
        let view = embed_interpolations(src, &tags, &[]);
        assert_eq!(view, "<div>/*          */x</div>/*\n  */");
        assert_offsets_preserved(src, &view, &tags);
    }

    #[test]
    fn single_line_output_tags_become_identifiers() {
        let src = "<script>var a = <%= value %>;</script>";
        let tags = tags(src);
        let view = embed_interpolations(src, &tags, &[]);
        assert_eq!(view, "<script>var a = ____________;</script>");
    }

    #[test]
    fn multi_line_output_tags_stay_a_single_expression() {
        let src = "<%= foo(\n a) %>|<%=\nfoo %>";
        let tags = tags(src);
        let view = embed_interpolations(src, &tags, &[]);
        assert_eq!(view, "_/*     \n    */|_/*\n    */");
        assert_offsets_preserved(src, &view, &tags);
    }

    #[test]
    fn output_tags_with_broken_delimiters_fall_back_to_one_identifier() {
        let mut out = String::new();
        embed_output(&mut out, "{{\n a.b\n}}", "\n a.b\n");
        assert_eq!(out, "_ \n    \n  ");
    }

    #[test]
    fn striped_tags_are_blanked() {
        let src = "<%= a %>b";
        let tags = tags(src);
        let view = embed_interpolations(src, &tags, &[Span::new(2, 4)]);
        assert_eq!(view, "        b");
    }

    #[test]
    fn multibyte_text_keeps_byte_length() {
        let src = "<% é %>ü<%= ß\n %>";
        let tags = tags(src);
        let view = embed_interpolations(src, &tags, &[]);
        assert_eq!(view.len(), src.len());
        assert!(view.contains('ü'));
        let blanked = blank_ranges(src, &[Span::new(8, 10)]);
        assert_eq!(blanked.len(), src.len());
        assert!(!blanked.contains('ü'));
    }

    #[test]
    fn micro_script_keeps_code_and_separates_output_statements() {
        let src = "<p><% if (a) { %><%= a %><% } %></p>";
        let tags = tags(src);
        let script = build_micro_script(src, &tags);
        assert_eq!(script, "      if (a) { \n   ; a \n;   } \n     ");
        assert_eq!(script.len(), src.len());
    }

    #[test]
    fn micro_script_breaks_the_line_after_every_tag() {
        let src = "<% // note %><% x(); %>";
        let script = build_micro_script(src, &tags(src));
        assert_eq!(script, "   // note \n    x(); \n ");
    }

    #[test]
    fn braceless_statement_heads_get_an_empty_body() {
        use crate::script::{EmbeddedScriptParser, NodeKind, ScriptParser};

        let src = "<% if (a) %><%= x %>";
        let script = build_micro_script(src, &tags(src));
        assert_eq!(script, "   if (a) \n   ; x \n;");
        let program = EmbeddedScriptParser.parse(&script).unwrap();
        let NodeKind::Program { body } = &program.ast.kind else {
            panic!("expected program");
        };
        let NodeKind::IfStatement { consequent, .. } = &body[0].kind else {
            panic!("expected if");
        };
        assert_eq!(consequent.kind, NodeKind::EmptyStatement);
        assert_eq!(body[1].text(src), "x %>");

        let src = "<% for (var i = 0; i < n; i++) %><%= i %>";
        let program = EmbeddedScriptParser
            .parse(&build_micro_script(src, &tags(src)))
            .unwrap();
        let NodeKind::Program { body } = &program.ast.kind else {
            panic!("expected program");
        };
        let NodeKind::ForStatement { body: loop_body, .. } = &body[0].kind else {
            panic!("expected for");
        };
        assert_eq!(loop_body.kind, NodeKind::EmptyStatement);

        // With the `if` already closed, `else` has nothing to attach to.
        let src = "<% if (a) %><%= x %><% else %><%= y %>";
        let err = EmbeddedScriptParser
            .parse(&build_micro_script(src, &tags(src)))
            .unwrap_err();
        let span = err.span().unwrap();
        assert!(src[span.start..].starts_with("else"), "error at {span}");
    }
}
