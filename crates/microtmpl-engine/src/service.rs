// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Per-document facade over the tag index, the script program and the
//! branch-aware template views.

use std::collections::HashSet;
use std::rc::Rc;
use std::time::Instant;

use crate::branch::{BranchAwareTemplateEngine, BranchContext, PathCoveredTemplate};
use crate::condition::ConditionCache;
use crate::embed::{build_micro_script, embed_interpolations};
use crate::error::Error;
use crate::html::{html_visitor_keys, HtmlNode};
use crate::script::{
    script_visitor_keys, EmbeddedScriptParser, Node, NodeKind, ScriptParser, ScriptProgram,
    ScriptToken, TokenKind,
};
use crate::source::{Location, SourceIndex};
use crate::span::Span;
use crate::tags::{tokenize, TagKind, TemplateSettings, TemplateTag};
use crate::telemetry;
use crate::traverse::{traverse, TraversalOutcome, TreeNode, VisitAction, Visitor};

/// Callbacks for [`MicroTemplateService::traverse_micro_templates`].
pub trait TagVisitor {
    fn evaluate(&mut self, _tag: &TemplateTag) {}
    fn interpolate(&mut self, _tag: &TemplateTag) {}
    fn escape(&mut self, _tag: &TemplateTag) {}
}

/// Callbacks for [`MicroTemplateService::traverse_document_nodes`].
pub trait DocumentVisitor {
    fn enter(
        &mut self,
        _node: &HtmlNode,
        _parent: Option<&HtmlNode>,
        _template: &PathCoveredTemplate,
    ) -> VisitAction {
        VisitAction::Continue
    }

    fn leave(
        &mut self,
        _node: &HtmlNode,
        _parent: Option<&HtmlNode>,
        _template: &PathCoveredTemplate,
    ) {
    }
}

/// Delimiters and inner script tokens of one tag.
#[derive(Debug, Clone)]
pub struct TagTokensInfo<'a> {
    pub open: ScriptToken,
    pub tokens: &'a [ScriptToken],
    pub comments: &'a [ScriptToken],
    pub close: ScriptToken,
}

/// Analysis session for one document.
///
/// Construction never fails: tag and script syntax errors are kept and
/// exposed through [`parse_errors`](Self::parse_errors), and a branch tree
/// the engine cannot follow degrades to a single template view.
#[derive(Debug)]
pub struct MicroTemplateService {
    index: SourceIndex,
    engine: BranchAwareTemplateEngine,
    micro_script: String,
    script: Option<ScriptProgram>,
    errors: Vec<Error>,
    branch_error: Option<Error>,
}

impl MicroTemplateService {
    pub fn new(source: &str, settings: &TemplateSettings) -> Self {
        Self::with_parser(source, settings, &EmbeddedScriptParser)
    }

    pub fn with_parser<P>(source: &str, settings: &TemplateSettings, parser: &P) -> Self
    where
        P: ScriptParser + ?Sized,
    {
        let started = Instant::now();
        let mut errors = Vec::new();
        let tags = match tokenize(source, settings) {
            Ok(tags) => tags,
            Err(err) => {
                errors.push(err);
                Vec::new()
            }
        };
        let micro_script = build_micro_script(source, &tags);
        let script = if errors.is_empty() {
            match parser.parse(&micro_script) {
                Ok(program) => Some(program),
                Err(err) => {
                    tracing::debug!(error = %err, "template script failed to parse");
                    errors.push(err);
                    None
                }
            }
        } else {
            None
        };

        let mut branch_error = None;
        let context = match &script {
            Some(program) => {
                match BranchContext::build(&program.ast, source, &mut ConditionCache::new()) {
                    Ok(context) => context,
                    Err(err) => {
                        tracing::warn!(
                            error = %err,
                            "branch analysis failed; falling back to a single template view"
                        );
                        branch_error = Some(err);
                        BranchContext::default()
                    }
                }
            }
            None => BranchContext::default(),
        };

        telemetry::record_parse(source.len(), tags.len(), started.elapsed(), errors.is_empty());
        Self {
            index: SourceIndex::new(source),
            engine: BranchAwareTemplateEngine::new(source, tags, context),
            micro_script,
            script,
            errors,
            branch_error,
        }
    }

    pub fn source(&self) -> &str {
        self.engine.source()
    }

    /// Every template tag, in document order.
    pub fn template_tags(&self) -> &[TemplateTag] {
        self.engine.tags()
    }

    pub fn traverse_micro_templates<V>(&self, visitor: &mut V)
    where
        V: TagVisitor + ?Sized,
    {
        for tag in self.template_tags() {
            match tag.kind {
                TagKind::Evaluate => visitor.evaluate(tag),
                TagKind::Interpolate => visitor.interpolate(tag),
                TagKind::Escape => visitor.escape(tag),
            }
        }
    }

    /// Delimiter tokens plus the script tokens and comments inside `tag`.
    /// `None` when the script could not be parsed.
    pub fn tag_tokens_info(&self, tag: &TemplateTag) -> Option<TagTokensInfo<'_>> {
        let program = self.script.as_ref()?;
        let source = self.source();
        Some(TagTokensInfo {
            open: delimiter_token(source, tag.open),
            tokens: program.tokens_in(tag.code),
            comments: program.comments_in(tag.code),
            close: delimiter_token(source, tag.close),
        })
    }

    /// The expression statement making up the whole code of `tag`, if the
    /// code is exactly one expression.
    pub fn expression_statement(&self, tag: &TemplateTag) -> Option<&Node> {
        let program = self.script.as_ref()?;
        let mut collector = TagStatements {
            tag: tag.span,
            statements: Vec::new(),
        };
        traverse(&program.ast, script_visitor_keys(), &mut collector);
        match collector.statements.as_slice() {
            [statement] if matches!(statement.kind, NodeKind::ExpressionStatement { .. }) => {
                Some(*statement)
            }
            _ => None,
        }
    }

    pub fn path_covered_template(&self, offset: usize) -> Rc<PathCoveredTemplate> {
        self.engine.path_covered_template(offset)
    }

    pub fn all_templates(&self) -> Vec<Rc<PathCoveredTemplate>> {
        self.engine.all_templates()
    }

    /// The whole document as one template view, branches ignored.
    pub fn template_view(&self) -> String {
        embed_interpolations(self.source(), self.template_tags(), &[])
    }

    /// Walks the HTML tree of every distinct template. Nodes already seen in
    /// an earlier template with the same type, span and text are skipped
    /// together with their subtree.
    pub fn traverse_document_nodes<V>(&self, visitor: &mut V) -> TraversalOutcome
    where
        V: DocumentVisitor + ?Sized,
    {
        let mut seen = HashSet::new();
        for template in self.all_templates() {
            let mut dedup = DedupVisitor {
                inner: &mut *visitor,
                template: &template,
                seen: &mut seen,
                forwarded: Vec::new(),
            };
            let document = template.document();
            if traverse(&document.root, html_visitor_keys(), &mut dedup) == TraversalOutcome::Broken
            {
                return TraversalOutcome::Broken;
            }
        }
        TraversalOutcome::Completed
    }

    pub fn location(&self, offset: usize) -> Location {
        self.index.location(offset)
    }

    pub fn offset(&self, location: Location) -> usize {
        self.index.offset(location)
    }

    pub fn source_index(&self) -> &SourceIndex {
        &self.index
    }

    /// Script view handed to the script parser.
    pub fn micro_script(&self) -> &str {
        &self.micro_script
    }

    pub fn script_program(&self) -> Option<&ScriptProgram> {
        self.script.as_ref()
    }

    /// Tag and script syntax errors, at most one of each.
    pub fn parse_errors(&self) -> &[Error] {
        &self.errors
    }

    /// Why branch analysis was abandoned, if it was.
    pub fn branch_error(&self) -> Option<&Error> {
        self.branch_error.as_ref()
    }
}

fn delimiter_token(source: &str, span: Span) -> ScriptToken {
    ScriptToken {
        kind: TokenKind::TagDelimiter,
        value: source[span.start..span.end].to_string(),
        span,
    }
}

/// Top-most non-empty statements lying inside one tag.
struct TagStatements<'a> {
    tag: Span,
    statements: Vec<&'a Node>,
}

impl<'a> Visitor<'a, Node> for TagStatements<'a> {
    fn enter(&mut self, node: &'a Node, _parent: Option<&'a Node>) -> VisitAction {
        if !node.span.intersects(self.tag) {
            return VisitAction::Skip;
        }
        if node.is_statement() && self.tag.encloses(node.span) {
            if !matches!(node.kind, NodeKind::EmptyStatement) {
                self.statements.push(node);
            }
            return VisitAction::Skip;
        }
        VisitAction::Continue
    }
}

type SeenKey = (&'static str, Span, String);

struct DedupVisitor<'v, 't, V: ?Sized> {
    inner: &'v mut V,
    template: &'t PathCoveredTemplate,
    seen: &'v mut HashSet<SeenKey>,
    /// One entry per entered node: whether `enter` reached `inner`.
    forwarded: Vec<bool>,
}

impl<'a, V> Visitor<'a, HtmlNode> for DedupVisitor<'_, '_, V>
where
    V: DocumentVisitor + ?Sized,
{
    fn enter(&mut self, node: &'a HtmlNode, parent: Option<&'a HtmlNode>) -> VisitAction {
        let key = (
            node.node_type(),
            node.span,
            node.text(self.template.template()).to_string(),
        );
        if !self.seen.insert(key) {
            self.forwarded.push(false);
            return VisitAction::Skip;
        }
        self.forwarded.push(true);
        self.inner.enter(node, parent, self.template)
    }

    fn leave(&mut self, node: &'a HtmlNode, parent: Option<&'a HtmlNode>) {
        if self.forwarded.pop().unwrap_or(false) {
            self.inner.leave(node, parent, self.template);
        }
    }
}
