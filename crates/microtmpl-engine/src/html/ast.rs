// SPDX-License-Identifier: Apache-2.0 OR MIT
use once_cell::sync::Lazy;
use serde::Serialize;
use smallvec::smallvec;

use crate::span::Span;
use crate::traverse::{Children, TreeNode, VisitorKeys};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlNode {
    pub span: Span,
    pub kind: HtmlNodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNodeKind {
    Document {
        children: Vec<HtmlNode>,
    },
    Element {
        /// Lower-cased tag name.
        name: String,
        start_tag: Span,
        attributes: Vec<HtmlNode>,
        children: Vec<HtmlNode>,
        /// `None` for void, self-closing and unclosed elements.
        end_tag: Option<Span>,
    },
    Attribute {
        name: String,
        name_span: Span,
        /// Unquoted value; `None` for valueless attributes.
        value: Option<String>,
        value_span: Option<Span>,
    },
    Text,
    Comment,
    Doctype,
}

impl HtmlNode {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.start..self.span.end]
    }

    pub fn element_name(&self) -> Option<&str> {
        match &self.kind {
            HtmlNodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self) -> &[HtmlNode] {
        match &self.kind {
            HtmlNodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn children(&self) -> &[HtmlNode] {
        match &self.kind {
            HtmlNodeKind::Document { children } | HtmlNodeKind::Element { children, .. } => {
                children
            }
            _ => &[],
        }
    }
}

impl TreeNode for HtmlNode {
    fn node_type(&self) -> &'static str {
        match self.kind {
            HtmlNodeKind::Document { .. } => "Document",
            HtmlNodeKind::Element { .. } => "Element",
            HtmlNodeKind::Attribute { .. } => "Attribute",
            HtmlNodeKind::Text => "Text",
            HtmlNodeKind::Comment => "Comment",
            HtmlNodeKind::Doctype => "Doctype",
        }
    }

    fn span(&self) -> Span {
        self.span
    }

    fn child(&self, key: &str) -> Children<'_, Self> {
        match key {
            "children" => Children::Many(self.children().iter().map(Some).collect()),
            "attributes" => Children::Many(self.attributes().iter().map(Some).collect()),
            _ => Children::Many(smallvec![]),
        }
    }
}

/// Problem found while parsing; the parser always recovers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlIssue {
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDocument {
    pub root: HtmlNode,
    pub issues: Vec<HtmlIssue>,
}

static HTML_VISITOR_KEYS: Lazy<VisitorKeys> = Lazy::new(|| {
    VisitorKeys::from_entries(&[
        ("Document", &["children"]),
        ("Element", &["attributes", "children"]),
    ])
});

pub fn html_visitor_keys() -> &'static VisitorKeys {
    &HTML_VISITOR_KEYS
}
