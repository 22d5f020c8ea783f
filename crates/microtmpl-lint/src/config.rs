// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::BTreeMap;

use microtmpl_engine::{Error, TemplateSettings, TemplateSettingsConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostic::Severity;

static NO_OPTIONS: Value = Value::Null;

/// Lint configuration, usually read from JSON:
///
/// ```json
/// {
///   "templateSettings": { "interpolate": ["{{", "}}"] },
///   "rules": {
///     "template-tag-spacing": ["error", "never"],
///     "prefer-escape-template-interpolations": "warn"
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LintConfig {
    #[serde(default)]
    pub template_settings: TemplateSettingsConfig,
    #[serde(default)]
    pub rules: BTreeMap<String, RuleSetting>,
}

/// `"warn"` or `["warn", options]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSetting {
    Severity(Severity),
    WithOptions(Severity, Value),
}

impl RuleSetting {
    pub fn severity(&self) -> Severity {
        match self {
            RuleSetting::Severity(severity) | RuleSetting::WithOptions(severity, _) => *severity,
        }
    }

    pub fn options(&self) -> &Value {
        match self {
            RuleSetting::Severity(_) => &NO_OPTIONS,
            RuleSetting::WithOptions(_, options) => options,
        }
    }
}

impl LintConfig {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text)
            .map_err(|err| Error::config_with_source("invalid lint configuration", err))
    }

    /// Compiles the tag patterns; invalid regexes are rejected here, before
    /// any document is processed.
    pub fn template_settings(&self) -> Result<TemplateSettings, Error> {
        TemplateSettings::from_config(&self.template_settings)
    }

    /// Sets the severity of `rule`, keeping configured options.
    pub fn set_severity(&mut self, rule: &str, severity: Severity) -> &mut Self {
        let setting = match self.rules.remove(rule) {
            Some(RuleSetting::WithOptions(_, options)) => {
                RuleSetting::WithOptions(severity, options)
            }
            _ => RuleSetting::Severity(severity),
        };
        self.rules.insert(rule.to_string(), setting);
        self
    }
}
