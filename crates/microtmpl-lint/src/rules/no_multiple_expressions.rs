// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::context::RuleContext;
use crate::diagnostic::Severity;
use crate::rule::{Rule, RuleMeta};

static META: RuleMeta = RuleMeta {
    name: "no-multiple-expressions-in-interpolation",
    description: "Require interpolate and escape tags to hold exactly one expression",
    fixable: false,
    default_severity: Severity::Error,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoMultipleExpressionsInInterpolation;

impl Rule for NoMultipleExpressionsInInterpolation {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn check(&self, ctx: &mut RuleContext<'_>) {
        let service = ctx.service();
        if service.script_program().is_none() {
            return;
        }
        let source = ctx.source();
        for tag in service.template_tags() {
            if !tag.kind.is_output() || tag.code_text(source).trim().is_empty() {
                continue;
            }
            if service.expression_statement(tag).is_none() {
                ctx.report(
                    tag.code,
                    format!(
                        "Expected a single expression in `{}` interpolation",
                        tag.open_text(source)
                    ),
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
    fn reports_statements_and_sequences_of_statements() {
        let source = "<%= a; b %><%- a, b %><%= c; %><%= if (x) y %><%  %><% x(); y() %>";
        let diagnostics = run(&NoMultipleExpressionsInInterpolation, source, &Value::Null);
        let spans: Vec<Span> = diagnostics.iter().map(|d| d.span).collect();
        assert_eq!(spans, vec![Span::new(3, 9), Span::new(34, 44)]);
    }

    #[test]
    fn silent_when_the_script_does_not_parse() {
        let diagnostics = run(
            &NoMultipleExpressionsInInterpolation,
            "<%= a; b %><% if ( %>",
            &Value::Null,
        );
        assert!(diagnostics.is_empty());
    }
}
