// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::HashSet;

use microtmpl_engine::traverse::VisitAction;
use microtmpl_engine::{
    DocumentVisitor, HtmlNode, HtmlNodeKind, PathCoveredTemplate, Span, TemplateTag,
};

use crate::context::RuleContext;
use crate::diagnostic::Severity;
use crate::rule::{Rule, RuleMeta};

static META: RuleMeta = RuleMeta {
    name: "no-duplicate-attributes",
    description: "Disallow duplicate attributes on an element in any branch",
    fixable: false,
    default_severity: Severity::Error,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDuplicateAttributes;

struct Duplicates<'a> {
    tags: &'a [TemplateTag],
    found: Vec<(Span, String)>,
}

impl DocumentVisitor for Duplicates<'_> {
    fn enter(
        &mut self,
        node: &HtmlNode,
        _parent: Option<&HtmlNode>,
        _template: &PathCoveredTemplate,
    ) -> VisitAction {
        let mut seen = HashSet::new();
        for attribute in node.attributes() {
            let HtmlNodeKind::Attribute {
                name, name_span, ..
            } = &attribute.kind
            else {
                continue;
            };
            // Names produced by a template tag are placeholders, not real names.
            if self.tags.iter().any(|tag| tag.span.intersects(*name_span)) {
                continue;
            }
            if !seen.insert(name.as_str()) {
                self.found.push((*name_span, name.clone()));
            }
        }
        VisitAction::Continue
    }
}

impl Rule for NoDuplicateAttributes {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn check(&self, ctx: &mut RuleContext<'_>) {
        let service = ctx.service();
        let mut visitor = Duplicates {
            tags: service.template_tags(),
            found: Vec::new(),
        };
        service.traverse_document_nodes(&mut visitor);
        for (span, name) in visitor.found {
            ctx.report(span, format!("Duplicate attribute `{name}`"));
        }
    }
}
