// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::context::RuleContext;
use crate::diagnostic::Severity;
use crate::rule::{Rule, RuleMeta};

static META: RuleMeta = RuleMeta {
    name: "no-empty-template-tag",
    description: "Disallow template tags without code",
    fixable: false,
    default_severity: Severity::Warn,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoEmptyTemplateTag;

impl Rule for NoEmptyTemplateTag {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn check(&self, ctx: &mut RuleContext<'_>) {
        let source = ctx.source();
        for tag in ctx.service().template_tags() {
            if tag.code_text(source).trim().is_empty() {
                ctx.report(tag.span, "Empty micro-template interpolation");
            }
        }
    }
}
