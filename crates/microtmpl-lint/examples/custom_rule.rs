// SPDX-License-Identifier: Apache-2.0 OR MIT
use microtmpl_lint::{
    builtin_rules, Fix, LintConfig, Linter, Rule, RuleContext, RuleMeta, RuleRegistry, Severity,
    TagKind,
};

/// Rewrites `<%= x %>` into `<%- x %>`.
struct EscapeEverything;

static META: RuleMeta = RuleMeta {
    name: "escape-everything",
    description: "Replace interpolate tags with escape tags",
    fixable: true,
    default_severity: Severity::Warn,
};

impl Rule for EscapeEverything {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn check(&self, ctx: &mut RuleContext<'_>) {
        for tag in ctx.service().template_tags() {
            if tag.kind == TagKind::Interpolate && tag.open_text(ctx.source()) == "<%=" {
                ctx.report_with_fix(tag.open, "Use `<%-`", Fix::replace(tag.open, "<%-"));
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = RuleRegistry::builder();
    builder.extend(&builtin_rules()).register(EscapeEverything);
    let registry = builder.build();

    let linter = Linter::new(&registry, &LintConfig::default())?;
    let source = "<h1><%= title %></h1>\n<p><%=body%></p>\n";
    for diagnostic in linter.lint("inline", source).diagnostics {
        println!("{diagnostic}");
    }
    let fixed = linter.fix("inline", source);
    println!("applied {} fixes:\n{}", fixed.applied, fixed.output);
    Ok(())
}
