// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Template tag discovery.
//!
//! A document is scanned left to right for the three tag kinds configured in
//! [`TemplateSettings`]. Each pattern matches a full tag (delimiters included)
//! and captures the inner code in group 1, mirroring lodash's
//! `_.templateSettings`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::span::Span;

/// Kind of a template tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TagKind {
    /// `<% code %>`: statements, no output.
    Evaluate,
    /// `<%= expr %>`: raw output.
    Interpolate,
    /// `<%- expr %>`: HTML-escaped output.
    Escape,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Evaluate => "evaluate",
            TagKind::Interpolate => "interpolate",
            TagKind::Escape => "escape",
        }
    }

    /// Interpolate and escape tags both emit the value of an expression.
    pub fn is_output(&self) -> bool {
        matches!(self, TagKind::Interpolate | TagKind::Escape)
    }
}

/// One template tag with its delimiter and code sub-ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateTag {
    pub kind: TagKind,
    pub span: Span,
    pub open: Span,
    pub close: Span,
    pub code: Span,
}

impl TemplateTag {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.start..self.span.end]
    }

    pub fn open_text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.open.start..self.open.end]
    }

    pub fn close_text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.close.start..self.close.end]
    }

    pub fn code_text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.code.start..self.code.end]
    }
}

/// Configured form of a single tag pattern: a regex source string or an
/// `[open, close]` delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternConfig {
    Source(String),
    Delimiters(String, String),
}

/// The `templateSettings` configuration block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TemplateSettingsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluate: Option<PatternConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolate: Option<PatternConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escape: Option<PatternConfig>,
}

/// Compiled tag pattern.
#[derive(Debug, Clone)]
pub struct TagPattern {
    regex: Regex,
    opener: Option<String>,
}

impl TagPattern {
    /// Compiles a regex source. The pattern must declare a capture group for
    /// the inner code.
    pub fn from_source(source: &str) -> Result<Self, Error> {
        let regex = Regex::new(source).map_err(|err| {
            Error::config_with_source(format!("invalid tag pattern `{source}`"), err)
        })?;
        if regex.captures_len() < 2 {
            return Err(Error::config(format!(
                "tag pattern `{source}` must capture the tag code in group 1"
            )));
        }
        Ok(Self {
            opener: literal_prefix(source),
            regex,
        })
    }

    /// Builds a pattern from literal delimiters, e.g. `["<%", "%>"]`.
    pub fn from_delimiters(open: &str, close: &str) -> Result<Self, Error> {
        if open.is_empty() || close.is_empty() {
            return Err(Error::config("tag delimiters must not be empty"));
        }
        let source = format!(
            r"{}([\s\S]*?){}",
            regex::escape(open),
            regex::escape(close)
        );
        let regex = Regex::new(&source).map_err(|err| {
            Error::config_with_source(format!("invalid tag delimiters `{open}` `{close}`"), err)
        })?;
        Ok(Self {
            regex,
            opener: Some(open.to_string()),
        })
    }

    fn from_config(config: &PatternConfig) -> Result<Self, Error> {
        match config {
            PatternConfig::Source(source) => Self::from_source(source),
            PatternConfig::Delimiters(open, close) => Self::from_delimiters(open, close),
        }
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Literal text every match of this pattern starts with, when known.
    pub fn opener(&self) -> Option<&str> {
        self.opener.as_deref()
    }
}

/// The three compiled tag patterns used to scan a document.
#[derive(Debug, Clone)]
pub struct TemplateSettings {
    pub evaluate: TagPattern,
    pub interpolate: TagPattern,
    pub escape: TagPattern,
}

static DEFAULT_SETTINGS: Lazy<TemplateSettings> = Lazy::new(|| TemplateSettings {
    evaluate: default_pattern(r"<%([\s\S]*?)%>", "<%"),
    interpolate: default_pattern(r"<%=([\s\S]*?)%>", "<%="),
    escape: default_pattern(r"<%-([\s\S]*?)%>", "<%-"),
});

fn default_pattern(source: &str, opener: &str) -> TagPattern {
    TagPattern {
        regex: Regex::new(source).expect("default tag pattern compiles"),
        opener: Some(opener.to_string()),
    }
}

impl Default for TemplateSettings {
    fn default() -> Self {
        DEFAULT_SETTINGS.clone()
    }
}

impl TemplateSettings {
    /// Validates and compiles a configuration block; missing entries keep
    /// their lodash defaults.
    pub fn from_config(config: &TemplateSettingsConfig) -> Result<Self, Error> {
        let mut settings = Self::default();
        if let Some(evaluate) = &config.evaluate {
            settings.evaluate = TagPattern::from_config(evaluate)?;
        }
        if let Some(interpolate) = &config.interpolate {
            settings.interpolate = TagPattern::from_config(interpolate)?;
        }
        if let Some(escape) = &config.escape {
            settings.escape = TagPattern::from_config(escape)?;
        }
        Ok(settings)
    }

    /// Patterns in lodash's alternation order; earlier entries win ties.
    fn ordered(&self) -> [(TagKind, &TagPattern); 3] {
        [
            (TagKind::Escape, &self.escape),
            (TagKind::Interpolate, &self.interpolate),
            (TagKind::Evaluate, &self.evaluate),
        ]
    }

    fn next_tag(&self, text: &str, from: usize) -> Option<TemplateTag> {
        let mut best: Option<TemplateTag> = None;
        for (kind, pattern) in self.ordered() {
            let Some(captures) = pattern.regex.captures_at(text, from) else {
                continue;
            };
            let Some(whole) = captures.get(0) else {
                continue;
            };
            if best.is_some_and(|tag| tag.span.start <= whole.start()) {
                continue;
            }
            let span = Span::new(whole.start(), whole.end());
            let code = captures
                .get(1)
                .map_or(Span::new(whole.end(), whole.end()), |m| {
                    Span::new(m.start(), m.end())
                });
            best = Some(TemplateTag {
                kind,
                span,
                open: Span::new(span.start, code.start),
                close: Span::new(code.end, span.end),
                code,
            });
        }
        best
    }

    fn find_opener(&self, text: &str) -> Option<usize> {
        self.ordered()
            .iter()
            .filter_map(|(_, pattern)| pattern.opener())
            .filter_map(|opener| text.find(opener))
            .min()
    }
}

/// Scans `text` for template tags.
///
/// Tags are returned in document order and never overlap. An opening
/// delimiter without a matching closer is reported as [`Error::Tag`].
pub fn tokenize(text: &str, settings: &TemplateSettings) -> Result<Vec<TemplateTag>, Error> {
    let mut tags = Vec::new();
    let mut cursor = 0usize;

    while cursor <= text.len() {
        let next = settings.next_tag(text, cursor);
        let gap_end = next.map_or(text.len(), |tag| tag.span.start);
        if let Some(pos) = settings.find_opener(&text[cursor..gap_end]) {
            return Err(Error::tag_with_span(
                "unterminated template tag",
                Span::new(cursor + pos, text.len()),
            ));
        }

        let Some(tag) = next else {
            break;
        };
        if tag.span.is_empty() {
            return Err(Error::tag_with_span(
                "tag pattern matched an empty string",
                tag.span,
            ));
        }
        cursor = tag.span.end;
        tags.push(tag);
    }

    Ok(tags)
}

/// Extracts the literal text a regex source starts with (`<%` for
/// `<%([\s\S]*?)%>`, `{{` for `\{\{(.+?)\}\}`).
fn literal_prefix(source: &str) -> Option<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::new();
    let mut idx = 0usize;
    while idx < chars.len() {
        let ch = chars[idx];
        let (literal, width) = match ch {
            '\\' => match chars.get(idx + 1) {
                Some(next) if next.is_ascii_punctuation() => (*next, 2),
                _ => break,
            },
            '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' => break,
            other => (other, 1),
        };
        if matches!(chars.get(idx + width), Some('?' | '*' | '{')) {
            break;
        }
        out.push(literal);
        idx += width;
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tags: &[TemplateTag]) -> Vec<TagKind> {
        tags.iter().map(|tag| tag.kind).collect()
    }

    #[test]
    fn finds_all_three_kinds_in_order() {
        let src = "<div><% if (a) { %><%= a %><%- b %><% } %></div>";
        let tags = tokenize(src, &TemplateSettings::default()).unwrap();
        assert_eq!(
            kinds(&tags),
            vec![
                TagKind::Evaluate,
                TagKind::Interpolate,
                TagKind::Escape,
                TagKind::Evaluate
            ]
        );
        let interpolate = tags[1];
        assert_eq!(interpolate.open_text(src), "<%=");
        assert_eq!(interpolate.code_text(src), " a ");
        assert_eq!(interpolate.close_text(src), "%>");
    }

    #[test]
    fn empty_tags_are_tags() {
        let tags = tokenize("<%%><%    %>", &TemplateSettings::default()).unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags[0].code.is_empty());
        assert_eq!(tags[1].code.len(), 4);
    }

    #[test]
    fn gaps_and_tags_reassemble_the_document() {
        let src = "a<%= x %>b\n<% y() %>\n<%- z %>";
        let tags = tokenize(src, &TemplateSettings::default()).unwrap();
        let mut rebuilt = String::new();
        let mut cursor = 0;
        for tag in &tags {
            rebuilt.push_str(&src[cursor..tag.span.start]);
            rebuilt.push_str(tag.text(src));
            cursor = tag.span.end;
        }
        rebuilt.push_str(&src[cursor..]);
        assert_eq!(rebuilt, src);
    }

    #[test]
    fn unterminated_tag_is_reported() {
        let err = tokenize("<p><%= name </p>", &TemplateSettings::default()).unwrap_err();
        match err {
            Error::Tag { span, .. } => assert_eq!(span, Some(Span::new(3, 16))),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn delimiter_pairs_and_regex_sources_configure_patterns() {
        let config: TemplateSettingsConfig = serde_json::from_value(serde_json::json!({
            "interpolate": ["{{", "}}"],
            "evaluate": r"\{%([\s\S]+?)%\}"
        }))
        .unwrap();
        let settings = TemplateSettings::from_config(&config).unwrap();
        assert_eq!(settings.evaluate.opener(), Some("{%"));
        let tags = tokenize("{% if (a) { %}{{ a }}{% } %}", &settings).unwrap();
        assert_eq!(
            kinds(&tags),
            vec![TagKind::Evaluate, TagKind::Interpolate, TagKind::Evaluate]
        );
    }

    #[test]
    fn invalid_regex_is_a_config_error() {
        let config = TemplateSettingsConfig {
            evaluate: Some(PatternConfig::Source("<%(".into())),
            ..TemplateSettingsConfig::default()
        };
        assert!(matches!(
            TemplateSettings::from_config(&config),
            Err(Error::Config { .. })
        ));

        let no_group = TemplateSettingsConfig {
            escape: Some(PatternConfig::Source("<%-.*?%>".into())),
            ..TemplateSettingsConfig::default()
        };
        assert!(matches!(
            TemplateSettings::from_config(&no_group),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn literal_prefix_stops_at_optional_chars() {
        assert_eq!(literal_prefix(r"<%=([\s\S]*?)%>").as_deref(), Some("<%="));
        assert_eq!(literal_prefix(r"<%-?x").as_deref(), Some("<%"));
        assert_eq!(literal_prefix(r"(a)").as_deref(), None);
    }
}
