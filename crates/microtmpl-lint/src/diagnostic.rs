// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fmt;

use microtmpl_engine::{SourceIndex, Span};
use serde::{Deserialize, Serialize};

/// How a rule's findings are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Off,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Off => "off",
            Severity::Warn => "warning",
            Severity::Error => "error",
        })
    }
}

/// 1-based line and column (columns count chars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub(crate) fn at(index: &SourceIndex, offset: usize) -> Self {
        let location = index.location(offset);
        Self {
            line: location.line,
            column: location.column + 1,
        }
    }
}

/// Replacement of `span` with `replacement` in the original document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fix {
    pub span: Span,
    pub replacement: String,
}

impl Fix {
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            span: Span::new(offset, offset),
            replacement: text.into(),
        }
    }

    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            replacement: text.into(),
        }
    }

    pub fn remove(span: Span) -> Self {
        Self::replace(span, "")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub rule: &'static str,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub start: Position,
    pub end: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}  {}  {}  {}",
            self.start.line, self.start.column, self.severity, self.message, self.rule
        )
    }
}

/// Orders diagnostics by position and drops exact duplicates, which appear
/// when several template views report the same finding.
pub(crate) fn normalize(diagnostics: &mut Vec<Diagnostic>) {
    diagnostics.sort_by(|a, b| {
        (a.span.start, a.span.end, a.rule, &a.message).cmp(&(
            b.span.start,
            b.span.end,
            b.rule,
            &b.message,
        ))
    });
    diagnostics.dedup();
}

/// Applies non-overlapping fixes in document order. A fix starting at or
/// before the end of the previously applied one is skipped.
pub(crate) fn apply_fixes(source: &str, diagnostics: &[Diagnostic]) -> (String, usize) {
    let mut fixes: Vec<&Fix> = diagnostics
        .iter()
        .filter_map(|diagnostic| diagnostic.fix.as_ref())
        .collect();
    fixes.sort_by_key(|fix| (fix.span.start, fix.span.end));

    let mut output = String::with_capacity(source.len());
    let mut cursor = 0usize;
    let mut last_end: Option<usize> = None;
    let mut applied = 0usize;
    for fix in fixes {
        if last_end.is_some_and(|end| fix.span.start <= end) || fix.span.end > source.len() {
            continue;
        }
        output.push_str(&source[cursor..fix.span.start]);
        output.push_str(&fix.replacement);
        cursor = fix.span.end;
        last_end = Some(fix.span.end);
        applied += 1;
    }
    output.push_str(&source[cursor..]);
    (output, applied)
}
