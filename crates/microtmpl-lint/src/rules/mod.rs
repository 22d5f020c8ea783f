// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Built-in rules.

mod html_end_tag_match;
mod no_duplicate_attributes;
mod no_empty_template_tag;
mod no_multiple_expressions;
mod no_parsing_error;
mod no_semi_in_interpolation;
mod no_warning_terms;
mod prefer_escape;
mod template_tag_spacing;

pub use html_end_tag_match::HtmlEndTagMatch;
pub use no_duplicate_attributes::NoDuplicateAttributes;
pub use no_empty_template_tag::NoEmptyTemplateTag;
pub use no_multiple_expressions::NoMultipleExpressionsInInterpolation;
pub use no_parsing_error::NoParsingError;
pub use no_semi_in_interpolation::NoSemiInTemplateInterpolation;
pub use no_warning_terms::NoWarningTerms;
pub use prefer_escape::PreferEscapeTemplateInterpolations;
pub use template_tag_spacing::TemplateTagSpacing;

use crate::registry::{RuleRegistry, RuleRegistryBuilder};

/// Builds a registry holding every built-in rule.
pub fn builtin_rules() -> RuleRegistry {
    let mut builder = RuleRegistryBuilder::new();
    install_builtin_rules(&mut builder);
    builder.build()
}

/// Installs the built-in rules into an existing registry builder.
pub fn install_builtin_rules(builder: &mut RuleRegistryBuilder) {
    builder
        .register(HtmlEndTagMatch)
        .register(NoDuplicateAttributes)
        .register(NoEmptyTemplateTag)
        .register(NoMultipleExpressionsInInterpolation)
        .register(NoParsingError)
        .register(NoSemiInTemplateInterpolation)
        .register(NoWarningTerms)
        .register(PreferEscapeTemplateInterpolations)
        .register(TemplateTagSpacing);
}

#[cfg(test)]
pub(crate) mod test_support {
    use microtmpl_engine::{MicroTemplateService, TemplateSettings};
    use serde_json::Value;

    use crate::context::RuleContext;
    use crate::diagnostic::{Diagnostic, Severity};
    use crate::rule::Rule;

    /// Runs a single rule over `source` with default tag settings.
    pub(crate) fn run(rule: &dyn Rule, source: &str, options: &Value) -> Vec<Diagnostic> {
        let service = MicroTemplateService::new(source, &TemplateSettings::default());
        let mut ctx = RuleContext::new(rule.meta().name, Severity::Error, options, &service);
        rule.check(&mut ctx);
        ctx.into_diagnostics()
    }

    pub(crate) fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics
            .iter()
            .map(|diagnostic| diagnostic.message.as_str())
            .collect()
    }
}
