// SPDX-License-Identifier: Apache-2.0 OR MIT
use microtmpl_engine::Error;
use serde_json::Value;

use crate::context::RuleContext;
use crate::diagnostic::Severity;

/// Static description of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub fixable: bool,
    /// Severity used when the configuration does not mention the rule.
    pub default_severity: Severity,
}

/// A lint rule. Rules are stateless and shared between threads; per-document
/// state lives in the [`RuleContext`].
pub trait Rule: Send + Sync {
    fn meta(&self) -> &'static RuleMeta;

    /// Rejects options the rule cannot interpret. Called once when the
    /// linter is configured.
    fn validate_options(&self, _options: &Value) -> Result<(), Error> {
        Ok(())
    }

    fn check(&self, ctx: &mut RuleContext<'_>);
}
