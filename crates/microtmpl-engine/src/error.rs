// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::span::Span;
use thiserror::Error;

/// Failure raised while scanning tags, parsing tag code, reading settings or
/// resolving branches.
///
/// Tag, script and branch errors point at a byte range of the original
/// document when one is known. Configuration errors never do; they may wrap
/// the deserializer error instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Template tag syntax (unterminated tag, malformed delimiters).
    #[error("template tag error: {message}")]
    Tag { message: String, span: Option<Span> },
    /// Syntax error inside the embedded script code.
    #[error("script error: {message}")]
    Script { message: String, span: Option<Span> },
    /// Invalid `templateSettings` or lint configuration.
    #[error("configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// The script AST violates the shape the branch engine relies on.
    #[error("branch analysis error: {message}")]
    Branch { message: String, span: Option<Span> },
}

impl Error {
    pub fn tag(message: impl Into<String>, span: Option<Span>) -> Self {
        Error::Tag {
            message: message.into(),
            span,
        }
    }

    pub fn tag_with_span(message: impl Into<String>, span: Span) -> Self {
        Self::tag(message, Some(span))
    }

    pub fn script(message: impl Into<String>, span: Option<Span>) -> Self {
        Error::Script {
            message: message.into(),
            span,
        }
    }

    pub fn script_with_span(message: impl Into<String>, span: Span) -> Self {
        Self::script(message, Some(span))
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn branch_with_span(message: impl Into<String>, span: Span) -> Self {
        Error::Branch {
            message: message.into(),
            span: Some(span),
        }
    }

    /// Message without the category prefix used by `Display`.
    pub fn message(&self) -> &str {
        match self {
            Error::Tag { message, .. }
            | Error::Script { message, .. }
            | Error::Config { message, .. }
            | Error::Branch { message, .. } => message,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Tag { span, .. } | Error::Script { span, .. } | Error::Branch { span, .. } => {
                *span
            }
            Error::Config { .. } => None,
        }
    }
}
