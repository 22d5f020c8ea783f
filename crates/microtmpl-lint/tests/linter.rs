// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::io::Write;
use std::sync::Arc;
use std::thread;

use microtmpl_lint::{
    builtin_rules, LintConfig, LintError, Linter, Rule, RuleContext, RuleMeta, RuleRegistry,
    Severity, TagKind,
};

struct NoEvaluateTags;

static NO_EVALUATE: RuleMeta = RuleMeta {
    name: "no-evaluate-tags",
    description: "Disallow evaluate tags",
    fixable: false,
    default_severity: Severity::Error,
};

impl Rule for NoEvaluateTags {
    fn meta(&self) -> &'static RuleMeta {
        &NO_EVALUATE
    }

    fn check(&self, ctx: &mut RuleContext<'_>) {
        for tag in ctx.service().template_tags() {
            if tag.kind == TagKind::Evaluate {
                ctx.report(tag.span, "Unexpected evaluate tag");
            }
        }
    }
}

#[test]
fn lints_files_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "<ul>\n  <li><%=item%></li>\n</ul>\n").expect("write template");

    let linter = Linter::new(&builtin_rules(), &LintConfig::default()).expect("default config");
    let report = linter.lint_path(file.path()).expect("lint file");
    assert_eq!(report.name, file.path().display().to_string());
    assert_eq!(report.warning_count(), 2);
    assert_eq!(report.error_count(), 0);
    assert_eq!(report.diagnostics[0].start.line, 2);
    assert_eq!(report.diagnostics[0].start.column, 7);

    let missing = file.path().with_extension("missing");
    let err = linter.lint_path(&missing).unwrap_err();
    assert!(matches!(err, LintError::Io { .. }));
    assert!(err.to_string().contains("failed to read"));
}

#[test]
fn custom_rules_join_the_builtin_registry() {
    let mut builder = RuleRegistry::builder();
    builder.extend(&builtin_rules()).register(NoEvaluateTags);
    let registry = builder.build();
    assert!(registry.rule_names().contains(&"no-evaluate-tags"));

    let config = LintConfig::from_json(
        r#"{ "rules": { "template-tag-spacing": "off", "no-empty-template-tag": "off" } }"#,
    )
    .expect("config");
    let linter = Linter::new(&registry, &config).expect("linter");
    assert!(linter.enabled_rules().contains(&"no-evaluate-tags"));
    assert!(!linter.enabled_rules().contains(&"template-tag-spacing"));

    let report = linter.lint("inline", "<% if (a) { %><b><%- a %></b><% } %>");
    let rules: Vec<&str> = report.diagnostics.iter().map(|d| d.rule).collect();
    assert_eq!(rules, vec!["no-evaluate-tags", "no-evaluate-tags"]);
    assert_eq!(report.error_count(), 2);
}

#[test]
fn fixes_converge_and_keep_unfixable_findings() {
    let linter = Linter::new(&builtin_rules(), &LintConfig::default()).expect("linter");
    let result = linter.fix("inline", "<%=a;%><%    %>");
    assert_eq!(result.output, "<%= a %><%    %>");
    assert!(result.applied >= 3);
    let rules: Vec<&str> = result.diagnostics.iter().map(|d| d.rule).collect();
    assert_eq!(rules, vec!["no-empty-template-tag"]);
}

#[test]
fn one_linter_serves_many_threads() {
    let linter = Arc::new(Linter::new(&builtin_rules(), &LintConfig::default()).expect("linter"));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let linter = Arc::clone(&linter);
            thread::spawn(move || {
                let source = format!("<p><%= value{i} %></p>");
                linter.lint("thread", &source).diagnostics.len()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("thread panicked"), 0);
    }
}
