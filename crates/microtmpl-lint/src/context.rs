// SPDX-License-Identifier: Apache-2.0 OR MIT
use microtmpl_engine::{MicroTemplateService, Span};
use serde_json::Value;

use crate::diagnostic::{Diagnostic, Fix, Position, Severity};

/// What a rule sees while checking one document.
pub struct RuleContext<'a> {
    rule: &'static str,
    severity: Severity,
    options: &'a Value,
    service: &'a MicroTemplateService,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> RuleContext<'a> {
    pub(crate) fn new(
        rule: &'static str,
        severity: Severity,
        options: &'a Value,
        service: &'a MicroTemplateService,
    ) -> Self {
        Self {
            rule,
            severity,
            options,
            service,
            diagnostics: Vec::new(),
        }
    }

    pub fn service(&self) -> &'a MicroTemplateService {
        self.service
    }

    pub fn source(&self) -> &'a str {
        self.service.source()
    }

    /// Options from the configuration, `Value::Null` when none were given.
    pub fn options(&self) -> &'a Value {
        self.options
    }

    pub fn report(&mut self, span: Span, message: impl Into<String>) {
        self.push(span, message.into(), None);
    }

    pub fn report_with_fix(&mut self, span: Span, message: impl Into<String>, fix: Fix) {
        self.push(span, message.into(), Some(fix));
    }

    fn push(&mut self, span: Span, message: String, fix: Option<Fix>) {
        let index = self.service.source_index();
        self.diagnostics.push(Diagnostic {
            rule: self.rule,
            severity: self.severity,
            message,
            span,
            start: Position::at(index, span.start),
            end: Position::at(index, span.end),
            fix,
        });
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
