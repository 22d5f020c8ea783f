// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Tolerant HTML parser for the template views of a document.

mod ast;
mod parser;

pub use ast::{html_visitor_keys, HtmlDocument, HtmlIssue, HtmlNode, HtmlNodeKind};
pub use parser::parse_html;
