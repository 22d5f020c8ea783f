#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Lint rules for HTML documents with embedded lodash-style micro-template
//! tags, built on [`microtmpl_engine`].
//!
//! A [`Linter`] is configured once from a [`RuleRegistry`] and a
//! [`LintConfig`], then runs every enabled rule over each document it is
//! given:
//!
//! ```
//! use microtmpl_lint::{builtin_rules, LintConfig, Linter};
//!
//! let config = LintConfig::from_json(r#"{ "rules": { "template-tag-spacing": "error" } }"#)?;
//! let linter = Linter::new(&builtin_rules(), &config)?;
//! let report = linter.lint("inline", "<p><%=name%></p>");
//! assert_eq!(report.error_count(), 2);
//! assert_eq!(linter.fix("inline", "<p><%=name%></p>").output, "<p><%= name %></p>");
//! # Ok::<(), microtmpl_lint::Error>(())
//! ```

mod config;
mod context;
mod diagnostic;
mod error;
mod linter;
mod registry;
mod rule;
pub mod rules;

pub use config::{LintConfig, RuleSetting};
pub use context::RuleContext;
pub use diagnostic::{Diagnostic, Fix, Position, Severity};
pub use error::LintError;
pub use linter::{FixResult, LintReport, Linter};
pub use registry::{RuleRegistry, RuleRegistryBuilder};
pub use rule::{Rule, RuleMeta};
pub use rules::{builtin_rules, install_builtin_rules};

pub use microtmpl_engine::{
    DocumentVisitor, Error, HtmlNode, HtmlNodeKind, MicroTemplateService, PathCoveredTemplate,
    Span, TagKind, TagVisitor, TemplateSettings, TemplateTag, VisitAction,
};
