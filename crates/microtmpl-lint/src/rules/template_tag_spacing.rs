// SPDX-License-Identifier: Apache-2.0 OR MIT
use microtmpl_engine::{is_line_terminator, Error, Span, TemplateTag};
use serde::Deserialize;
use serde_json::Value;

use crate::context::RuleContext;
use crate::diagnostic::{Fix, Severity};
use crate::rule::{Rule, RuleMeta};

static META: RuleMeta = RuleMeta {
    name: "template-tag-spacing",
    description: "Enforce consistent spacing inside template tag delimiters",
    fixable: true,
    default_severity: Severity::Warn,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Spacing {
    #[default]
    Always,
    Never,
}

fn spacing(options: &Value) -> Result<Spacing, Error> {
    if options.is_null() {
        return Ok(Spacing::default());
    }
    Spacing::deserialize(options).map_err(|err| {
        Error::config_with_source(
            "template-tag-spacing expects \"always\" or \"never\"",
            err,
        )
    })
}

/// `<%= value %>` rather than `<%=value%>` (or the reverse with `"never"`).
/// Whitespace containing a line break is always accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateTagSpacing;

impl Rule for TemplateTagSpacing {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn validate_options(&self, options: &Value) -> Result<(), Error> {
        spacing(options).map(|_| ())
    }

    fn check(&self, ctx: &mut RuleContext<'_>) {
        let Ok(spacing) = spacing(ctx.options()) else {
            return;
        };
        let source = ctx.source();
        for tag in ctx.service().template_tags() {
            let code = tag.code_text(source);
            if code.trim().is_empty() {
                continue;
            }
            let leading = code.len() - code.trim_start().len();
            let trailing = code.len() - code.trim_end().len();
            let before = Span::new(tag.code.start, tag.code.start + leading);
            let after = Span::new(tag.code.end - trailing, tag.code.end);
            match spacing {
                Spacing::Always => {
                    let message = format!("Expected 1 space after `{}`", tag.open_text(source));
                    expect_one_space(ctx, tag.open, before, &message);
                    let message = format!("Expected 1 space before `{}`", tag.close_text(source));
                    expect_one_space(ctx, tag.close, after, &message);
                }
                Spacing::Never => expect_no_space(ctx, tag, before, after),
            }
        }
    }
}

fn expect_one_space(ctx: &mut RuleContext<'_>, delimiter: Span, gap: Span, message: &str) {
    let text = &ctx.source()[gap.start..gap.end];
    if gap.is_empty() {
        ctx.report_with_fix(delimiter, message, Fix::insert(gap.start, " "));
    } else if text != " " && !text.chars().any(is_line_terminator) {
        ctx.report_with_fix(gap, message, Fix::replace(gap, " "));
    }
}

fn expect_no_space(ctx: &mut RuleContext<'_>, tag: &TemplateTag, before: Span, after: Span) {
    let source = ctx.source();
    let breaks = |span: Span| source[span.start..span.end].chars().any(is_line_terminator);
    if !before.is_empty() && !breaks(before) {
        let message = format!("Expected no space after `{}`", tag.open_text(source));
        ctx.report_with_fix(before, message, Fix::remove(before));
    }
    if !after.is_empty() && !breaks(after) {
        let message = format!("Expected no space before `{}`", tag.close_text(source));
        ctx.report_with_fix(after, message, Fix::remove(after));
    }
}
