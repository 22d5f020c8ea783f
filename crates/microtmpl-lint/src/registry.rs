// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::rule::Rule;

/// Registry that maps rule names to rule implementations.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    map: Arc<BTreeMap<&'static str, Arc<dyn Rule>>>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rule_names())
            .finish()
    }
}

impl RuleRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a new builder for constructing registries.
    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder::new()
    }

    /// Fetches a rule by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Rule>> {
        self.map.get(name).cloned()
    }

    /// Reports whether the registry contains no rules.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Registered rule names in sorted order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.map.keys().copied().collect()
    }

    /// Rules in name order.
    pub fn rules(&self) -> impl Iterator<Item = &Arc<dyn Rule>> + '_ {
        self.map.values()
    }
}

/// Helper for constructing registries before freezing them into an immutable map.
#[derive(Default)]
pub struct RuleRegistryBuilder {
    map: BTreeMap<&'static str, Arc<dyn Rule>>,
}

impl RuleRegistryBuilder {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule under its own name, replacing any rule of that name.
    pub fn register<R>(&mut self, rule: R) -> &mut Self
    where
        R: Rule + 'static,
    {
        let name = rule.meta().name;
        self.map.insert(name, Arc::new(rule));
        self
    }

    /// Extends the builder with all rules from another registry.
    pub fn extend(&mut self, other: &RuleRegistry) -> &mut Self {
        for (name, rule) in other.map.iter() {
            self.map.insert(*name, Arc::clone(rule));
        }
        self
    }

    /// Finalises the builder into an immutable registry.
    pub fn build(self) -> RuleRegistry {
        RuleRegistry {
            map: Arc::new(self.map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RuleContext;
    use crate::diagnostic::Severity;
    use crate::rule::RuleMeta;

    struct Noop;

    static NOOP: RuleMeta = RuleMeta {
        name: "noop",
        description: "does nothing",
        fixable: false,
        default_severity: Severity::Warn,
    };

    impl Rule for Noop {
        fn meta(&self) -> &'static RuleMeta {
            &NOOP
        }

        fn check(&self, _ctx: &mut RuleContext<'_>) {}
    }

    #[test]
    fn builder_extends_and_freezes() {
        let mut base = RuleRegistry::builder();
        base.register(Noop);
        let base = base.build();

        let mut builder = RuleRegistryBuilder::new();
        builder.extend(&base);
        let registry = builder.build();
        assert_eq!(registry.rule_names(), vec!["noop"]);
        assert!(registry.get("noop").is_some());
        assert!(registry.get("missing").is_none());
        assert!(RuleRegistry::empty().is_empty());
    }

    #[test]
    fn registries_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleRegistry>();
    }
}
