// SPDX-License-Identifier: Apache-2.0 OR MIT
use microtmpl_engine::TagKind;

use crate::context::RuleContext;
use crate::diagnostic::Severity;
use crate::rule::{Rule, RuleMeta};

static META: RuleMeta = RuleMeta {
    name: "prefer-escape-template-interpolations",
    description: "Prefer HTML-escaping escape tags over raw interpolate tags",
    fixable: false,
    default_severity: Severity::Off,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PreferEscapeTemplateInterpolations;

impl Rule for PreferEscapeTemplateInterpolations {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn check(&self, ctx: &mut RuleContext<'_>) {
        let source = ctx.source();
        for tag in ctx.service().template_tags() {
            if tag.kind == TagKind::Interpolate {
                let message = format!(
                    "Expected an escape tag instead of `{}`",
                    tag.open_text(source)
                );
                ctx.report(tag.open, message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{messages, run};
    use serde_json::Value;

    #[test]
    fn reports_interpolate_tags() {
        let diagnostics = run(
            &PreferEscapeTemplateInterpolations,
            "<%= raw %><%- safe %><% code() %>",
            &Value::Null,
        );
        assert_eq!(
            messages(&diagnostics),
            vec!["Expected an escape tag instead of `<%=`"]
        );
    }
}
