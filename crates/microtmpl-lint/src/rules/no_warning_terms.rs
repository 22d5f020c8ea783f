// SPDX-License-Identifier: Apache-2.0 OR MIT
use microtmpl_engine::Error;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::context::RuleContext;
use crate::diagnostic::Severity;
use crate::rule::{Rule, RuleMeta};

static META: RuleMeta = RuleMeta {
    name: "no-warning-terms",
    description: "Disallow warning terms such as TODO in template comments",
    fixable: false,
    default_severity: Severity::Off,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TermLocation {
    #[default]
    Start,
    Anywhere,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct WarningTermsOptions {
    terms: Vec<String>,
    location: TermLocation,
}

impl Default for WarningTermsOptions {
    fn default() -> Self {
        Self {
            terms: vec!["todo".into(), "fixme".into(), "xxx".into()],
            location: TermLocation::Start,
        }
    }
}

impl WarningTermsOptions {
    fn from_value(options: &Value) -> Result<Self, Error> {
        if options.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(options)
            .map_err(|err| Error::config_with_source("invalid no-warning-terms options", err))
    }

    fn matchers(&self) -> Result<Vec<(&str, Regex)>, Error> {
        self.terms
            .iter()
            .map(|term| {
                let escaped = regex::escape(term);
                let suffix = if term.ends_with(|c: char| c.is_alphanumeric() || c == '_') {
                    r"\b"
                } else {
                    ""
                };
                let pattern = match self.location {
                    TermLocation::Start => format!(r"(?i)^[\s*]*{escaped}{suffix}"),
                    TermLocation::Anywhere => {
                        let prefix = if term.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
                            r"\b"
                        } else {
                            ""
                        };
                        format!(r"(?i){prefix}{escaped}{suffix}")
                    }
                };
                Regex::new(&pattern)
                    .map(|regex| (term.as_str(), regex))
                    .map_err(|err| Error::config_with_source(format!("invalid term `{term}`"), err))
            })
            .collect()
    }
}

/// Reports comments inside template tags that contain warning terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWarningTerms;

impl Rule for NoWarningTerms {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn validate_options(&self, options: &Value) -> Result<(), Error> {
        WarningTermsOptions::from_value(options)?.matchers().map(|_| ())
    }

    fn check(&self, ctx: &mut RuleContext<'_>) {
        let Ok(options) = WarningTermsOptions::from_value(ctx.options()) else {
            return;
        };
        let Ok(matchers) = options.matchers() else {
            return;
        };
        let service = ctx.service();
        for tag in service.template_tags() {
            let Some(info) = service.tag_tokens_info(tag) else {
                continue;
            };
            for comment in info.comments {
                if let Some((term, _)) = matchers
                    .iter()
                    .find(|(_, regex)| regex.is_match(&comment.value))
                {
                    ctx.report(comment.span, format!("Unexpected '{term}' comment."));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{messages, run};
    use serde_json::json;

    const SOURCE: &str =
        "<% // TODO: tidy %><%= a /* fixme later */ %><% /* note: todo */ %><%- b // xxxl %>";

    #[test]
    fn default_terms_at_comment_start() {
        let diagnostics = run(&NoWarningTerms, SOURCE, &Value::Null);
        assert_eq!(
            messages(&diagnostics),
            vec!["Unexpected 'todo' comment.", "Unexpected 'fixme' comment."]
        );
        assert_eq!(&SOURCE[diagnostics[0].span.start..diagnostics[0].span.end], "// TODO: tidy ");
    }

    #[test]
    fn anywhere_and_custom_terms() {
        let diagnostics = run(
            &NoWarningTerms,
            SOURCE,
            &json!({ "terms": ["todo", "xxx"], "location": "anywhere" }),
        );
        assert_eq!(
            messages(&diagnostics),
            vec!["Unexpected 'todo' comment.", "Unexpected 'todo' comment."]
        );
    }

    #[test]
    fn rejects_unknown_options() {
        assert!(NoWarningTerms
            .validate_options(&json!({ "location": "end" }))
            .is_err());
        assert!(NoWarningTerms
            .validate_options(&json!({ "words": [] }))
            .is_err());
    }
}
