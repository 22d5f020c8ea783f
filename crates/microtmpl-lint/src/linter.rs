// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fs;
use std::path::Path;
use std::sync::Arc;

use microtmpl_engine::{Error, MicroTemplateService, TemplateSettings};
use serde::Serialize;
use serde_json::Value;

use crate::config::LintConfig;
use crate::context::RuleContext;
use crate::diagnostic::{apply_fixes, normalize, Diagnostic, Severity};
use crate::error::LintError;
use crate::registry::RuleRegistry;
use crate::rule::Rule;

const MAX_FIX_PASSES: usize = 10;

/// Result of linting one document.
#[derive(Debug, Clone, Serialize)]
pub struct LintReport {
    pub name: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl LintReport {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warn)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == severity)
            .count()
    }
}

/// Result of [`Linter::fix`].
#[derive(Debug, Clone, Serialize)]
pub struct FixResult {
    pub output: String,
    /// Number of fixes applied over all passes.
    pub applied: usize,
    /// Diagnostics still reported for `output`.
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone)]
struct ActiveRule {
    rule: Arc<dyn Rule>,
    severity: Severity,
    options: Value,
}

/// Runs the enabled rules of a registry over documents.
///
/// A linter is `Send + Sync`; each call builds its own per-document
/// [`MicroTemplateService`].
#[derive(Clone)]
pub struct Linter {
    settings: TemplateSettings,
    rules: Vec<ActiveRule>,
}

impl std::fmt::Debug for Linter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.rules.iter().map(|active| active.rule.meta().name).collect();
        f.debug_struct("Linter").field("rules", &names).finish()
    }
}

impl Linter {
    /// Validates `config` against `registry`: tag patterns must compile,
    /// configured rules must exist and accept their options.
    pub fn new(registry: &RuleRegistry, config: &LintConfig) -> Result<Self, Error> {
        let settings = config.template_settings()?;
        if let Some(unknown) = config
            .rules
            .keys()
            .find(|name| registry.get(name).is_none())
        {
            return Err(Error::config(format!("unknown rule `{unknown}`")));
        }

        let mut rules = Vec::new();
        for rule in registry.rules() {
            let meta = rule.meta();
            let (severity, options) = match config.rules.get(meta.name) {
                Some(setting) => (setting.severity(), setting.options().clone()),
                None => (meta.default_severity, Value::Null),
            };
            if severity == Severity::Off {
                continue;
            }
            rule.validate_options(&options)?;
            rules.push(ActiveRule {
                rule: Arc::clone(rule),
                severity,
                options,
            });
        }
        Ok(Self { settings, rules })
    }

    /// Names of the rules that run, in name order.
    pub fn enabled_rules(&self) -> Vec<&'static str> {
        self.rules.iter().map(|active| active.rule.meta().name).collect()
    }

    pub fn lint(&self, name: &str, source: &str) -> LintReport {
        let service = MicroTemplateService::new(source, &self.settings);
        let mut diagnostics = Vec::new();
        for active in &self.rules {
            let meta = active.rule.meta();
            let mut ctx = RuleContext::new(meta.name, active.severity, &active.options, &service);
            active.rule.check(&mut ctx);
            let found = ctx.into_diagnostics();
            tracing::debug!(
                rule = meta.name,
                document = name,
                diagnostics = found.len(),
                "rule finished"
            );
            diagnostics.extend(found);
        }
        normalize(&mut diagnostics);
        LintReport {
            name: name.to_string(),
            diagnostics,
        }
    }

    pub fn lint_path(&self, path: impl AsRef<Path>) -> Result<LintReport, LintError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| LintError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.lint(&path.display().to_string(), &source))
    }

    /// Applies fixes repeatedly until none is left or the pass limit is hit.
    pub fn fix(&self, name: &str, source: &str) -> FixResult {
        let mut output = source.to_string();
        let mut applied = 0usize;
        let mut report = self.lint(name, &output);
        for _ in 0..MAX_FIX_PASSES {
            let (fixed, count) = apply_fixes(&output, &report.diagnostics);
            if count == 0 {
                break;
            }
            applied += count;
            output = fixed;
            report = self.lint(name, &output);
        }
        if applied > 0 {
            tracing::debug!(document = name, applied, "applied fixes");
        }
        FixResult {
            output,
            applied,
            diagnostics: report.diagnostics,
        }
    }
}
