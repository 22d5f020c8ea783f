// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::context::RuleContext;
use crate::diagnostic::{Fix, Severity};
use crate::rule::{Rule, RuleMeta};

static META: RuleMeta = RuleMeta {
    name: "no-semi-in-template-interpolation",
    description: "Disallow trailing semicolons in interpolate and escape tags",
    fixable: true,
    default_severity: Severity::Warn,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoSemiInTemplateInterpolation;

impl Rule for NoSemiInTemplateInterpolation {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn check(&self, ctx: &mut RuleContext<'_>) {
        let service = ctx.service();
        for tag in service.template_tags().iter().filter(|tag| tag.kind.is_output()) {
            let Some(info) = service.tag_tokens_info(tag) else {
                continue;
            };
            for token in info
                .tokens
                .iter()
                .rev()
                .take_while(|token| token.is_punctuator(";"))
            {
                ctx.report_with_fix(
                    token.span,
                    "Unexpected semicolon in template interpolation",
                    Fix::remove(token.span),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run;
    use microtmpl_engine::Span;
    use serde_json::Value;

    #[test]
    fn reports_trailing_semicolons_only() {
        let source = "<%= a; %><%- 'x;' %><% b; %><%= c;; %>";
        let diagnostics = run(&NoSemiInTemplateInterpolation, source, &Value::Null);
        let spans: Vec<Span> = diagnostics.iter().map(|d| d.span).collect();
        assert_eq!(spans, vec![Span::new(5, 6), Span::new(34, 35), Span::new(33, 34)]);
        assert!(diagnostics.iter().all(|d| d.fix.is_some()));
    }
}
