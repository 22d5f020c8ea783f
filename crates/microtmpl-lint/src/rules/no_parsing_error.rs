// SPDX-License-Identifier: Apache-2.0 OR MIT
use microtmpl_engine::Span;

use crate::context::RuleContext;
use crate::diagnostic::Severity;
use crate::rule::{Rule, RuleMeta};

static META: RuleMeta = RuleMeta {
    name: "no-parsing-error",
    description: "Report template tag and script syntax errors",
    fixable: false,
    default_severity: Severity::Error,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoParsingError;

impl Rule for NoParsingError {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn check(&self, ctx: &mut RuleContext<'_>) {
        for err in ctx.service().parse_errors() {
            let span = err.span().unwrap_or(Span::new(0, 0));
            ctx.report(span, format!("Parsing error: {}", err.message()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{messages, run};
    use serde_json::Value;

    #[test]
    fn reports_tag_and_script_errors() {
        let diagnostics = run(&NoParsingError, "<p><% x %><%= </p>", &Value::Null);
        assert_eq!(
            messages(&diagnostics),
            vec!["Parsing error: unterminated template tag"]
        );
        assert_eq!(diagnostics[0].span.start, 10);

        let diagnostics = run(&NoParsingError, "<% if (a { %><% } %>", &Value::Null);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.starts_with("Parsing error: "));

        assert!(run(&NoParsingError, "<%= ok %>", &Value::Null).is_empty());
    }
}
