// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::context::RuleContext;
use crate::diagnostic::Severity;
use crate::rule::{Rule, RuleMeta};

static META: RuleMeta = RuleMeta {
    name: "html-end-tag-match",
    description: "Require matching end tags in every branch of the template",
    fixable: false,
    default_severity: Severity::Error,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEndTagMatch;

impl Rule for HtmlEndTagMatch {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn check(&self, ctx: &mut RuleContext<'_>) {
        for template in ctx.service().all_templates() {
            for issue in &template.document().issues {
                ctx.report(issue.span, issue.message.clone());
            }
        }
    }
}
