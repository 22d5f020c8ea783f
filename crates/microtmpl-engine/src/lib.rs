#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Offset-preserving analysis of HTML documents with embedded lodash-style
//! micro-template tags (`<% %>`, `<%= %>`, `<%- %>`).
//!
//! The document is never rendered. Instead, same-length views of it are
//! built: a script view holding only the tag code, parsed into a syntax
//! tree, and template views in which tags become neutral text so the HTML
//! around them can be parsed. Every offset reported by any view is a byte
//! offset of the original document. [`MicroTemplateService`] bundles all of
//! it for one document.

pub mod branch;
pub mod condition;
pub mod embed;
mod error;
pub mod html;
pub mod script;
mod service;
mod source;
mod span;
pub mod tags;
pub mod telemetry;
pub mod traverse;

pub use branch::{BranchAwareTemplateEngine, BranchContext, PathCoveredTemplate};
pub use condition::{Condition, ConditionCache};
pub use error::Error;
pub use html::{HtmlDocument, HtmlIssue, HtmlNode, HtmlNodeKind};
pub use script::{
    EmbeddedScriptParser, Node, NodeKind, ScriptParser, ScriptProgram, ScriptToken, TokenKind,
};
pub use service::{DocumentVisitor, MicroTemplateService, TagTokensInfo, TagVisitor};
pub use source::{is_line_terminator, Location, SourceIndex};
pub use span::{merge_spans, Span};
pub use tags::{
    tokenize, PatternConfig, TagKind, TagPattern, TemplateSettings, TemplateSettingsConfig,
    TemplateTag,
};
pub use traverse::{traverse, TraversalOutcome, TreeNode, VisitAction, Visitor, VisitorKeys};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_preserve_document_length() {
        let source = "<ul>\r\n<% items.forEach(function (item) { %>\u{2028}<li>√ <%- item %></li><% }) %>\n</ul>";
        let service = MicroTemplateService::new(source, &TemplateSettings::default());
        assert!(service.parse_errors().is_empty());
        assert_eq!(service.micro_script().len(), source.len());
        assert_eq!(service.template_view().len(), source.len());
        for template in service.all_templates() {
            assert_eq!(template.template().len(), source.len());
        }
    }

    #[test]
    fn custom_delimiters_are_honoured() {
        let config: TemplateSettingsConfig = serde_json::from_str(
            r#"{ "interpolate": ["{{", "}}"], "evaluate": "\\{%([\\s\\S]+?)%\\}" }"#,
        )
        .unwrap();
        let settings = TemplateSettings::from_config(&config).unwrap();
        let service = MicroTemplateService::new("<b>{{ name }}</b>{% x() %}", &settings);
        let kinds: Vec<_> = service
            .template_tags()
            .iter()
            .map(|tag| tag.kind)
            .collect();
        assert_eq!(kinds, vec![TagKind::Interpolate, TagKind::Evaluate]);
    }
}
