// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Branch-aware reconstruction of the document's template views.
//!
//! A document like `<% if (a) { %>A<% } else { %>B<% } %>` never renders `A`
//! and `B` together, so analysing the HTML of the whole file would mix
//! mutually exclusive branches. The engine builds, for a target offset, a
//! view in which every branch not on the path to the target is blanked
//! ("striped"), choosing the remaining branches consistently with the
//! conditions already assumed along the path.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use once_cell::unsync::OnceCell;

use crate::condition::{Condition, ConditionCache};
use crate::embed::{blank_ranges, embed_interpolations};
use crate::error::Error;
use crate::html::{parse_html, HtmlDocument};
use crate::script::{script_visitor_keys, Node, NodeKind};
use crate::span::{merge_spans, Span};
use crate::tags::TemplateTag;
use crate::telemetry;
use crate::traverse::{traverse, EnterFn, VisitAction};

/// An `if` statement with an `else` branch.
#[derive(Debug, Clone)]
pub struct IfBranch {
    pub span: Span,
    pub consequent: Span,
    pub alternate: Span,
    /// Conditions holding whenever the consequent runs.
    pub when_true: Rc<[Rc<Condition>]>,
    /// Conditions holding whenever the alternate runs.
    pub when_false: Rc<[Rc<Condition>]>,
}

/// A `switch` statement with at least two cases.
#[derive(Debug, Clone)]
pub struct SwitchBranch {
    pub span: Span,
    /// Fallthrough groups in document order; adjacent and disjoint.
    pub groups: Vec<Span>,
}

impl SwitchBranch {
    fn group_for(&self, offset: usize) -> usize {
        self.groups
            .iter()
            .position(|group| group.contains(offset))
            .unwrap_or(0)
    }
}

/// Every branching statement of a script, in document order.
#[derive(Debug, Clone, Default)]
pub struct BranchContext {
    ifs: Vec<IfBranch>,
    switches: Vec<SwitchBranch>,
}

impl BranchContext {
    pub fn build(program: &Node, source: &str, cache: &mut ConditionCache) -> Result<Self, Error> {
        let mut context = Self::default();
        let mut failure = None;
        let mut visitor = EnterFn(|node: &Node, _parent: Option<&Node>| {
            let result = match &node.kind {
                NodeKind::IfStatement {
                    test,
                    consequent,
                    alternate,
                } => if_branch(node, test, consequent, alternate.as_deref(), source, cache)
                    .map(|branch| context.ifs.extend(branch)),
                NodeKind::SwitchStatement { cases, .. } => {
                    switch_branch(node, cases).map(|branch| context.switches.extend(branch))
                }
                _ => Ok(()),
            };
            match result {
                Ok(()) => VisitAction::Continue,
                Err(err) => {
                    failure = Some(err);
                    VisitAction::Break
                }
            }
        });
        traverse(program, script_visitor_keys(), &mut visitor);
        match failure {
            Some(err) => Err(err),
            None => Ok(context),
        }
    }

    pub fn ifs(&self) -> &[IfBranch] {
        &self.ifs
    }

    pub fn switches(&self) -> &[SwitchBranch] {
        &self.switches
    }

    pub fn is_empty(&self) -> bool {
        self.ifs.is_empty() && self.switches.is_empty()
    }
}

fn if_branch(
    node: &Node,
    test: &Node,
    consequent: &Node,
    alternate: Option<&Node>,
    source: &str,
    cache: &mut ConditionCache,
) -> Result<Option<IfBranch>, Error> {
    if !consequent.is_statement() {
        return Err(Error::branch_with_span(
            "if consequent is not a statement",
            consequent.span,
        ));
    }
    let Some(alternate) = alternate else {
        return Ok(None);
    };
    if !alternate.is_statement() {
        return Err(Error::branch_with_span(
            "if alternate is not a statement",
            alternate.span,
        ));
    }
    Ok(Some(IfBranch {
        span: node.span,
        consequent: consequent.span,
        alternate: alternate.span,
        when_true: cache.conditions_for_truthy(test, source),
        when_false: cache.conditions_for_falsy(test, source),
    }))
}

fn switch_branch(node: &Node, cases: &[Node]) -> Result<Option<SwitchBranch>, Error> {
    let mut starts = Vec::new();
    let mut open = false;
    for case in cases {
        let NodeKind::SwitchCase { consequent, .. } = &case.kind else {
            return Err(Error::branch_with_span(
                "switch case is not a SwitchCase",
                case.span,
            ));
        };
        if !open {
            starts.push(case.span.start);
            open = true;
        }
        if consequent.iter().any(contains_break) {
            open = false;
        }
    }
    if cases.len() < 2 {
        return Ok(None);
    }
    let groups = starts
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let end = starts.get(index + 1).copied().unwrap_or(node.span.end);
            Span::new(start, end)
        })
        .collect();
    Ok(Some(SwitchBranch {
        span: node.span,
        groups,
    }))
}

fn contains_break(node: &Node) -> bool {
    match &node.kind {
        NodeKind::BreakStatement { .. } => true,
        NodeKind::BlockStatement { body } => body.iter().any(contains_break),
        _ => false,
    }
}

/// One reconstructed view of the document.
#[derive(Debug)]
pub struct PathCoveredTemplate {
    template: String,
    striped_ranges: Vec<Span>,
    document: OnceCell<HtmlDocument>,
}

impl PathCoveredTemplate {
    fn new(template: String, striped_ranges: Vec<Span>) -> Self {
        Self {
            template,
            striped_ranges,
            document: OnceCell::new(),
        }
    }

    /// Same length as the source; striped ranges are blanked and tags are
    /// replaced by neutral script text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Sorted, merged ranges blanked in this view.
    pub fn striped_ranges(&self) -> &[Span] {
        &self.striped_ranges
    }

    pub fn is_striped(&self, offset: usize) -> bool {
        self.striped_ranges.iter().any(|range| range.contains(offset))
    }

    /// HTML tree of the view, parsed on first use.
    pub fn document(&self) -> &HtmlDocument {
        self.document.get_or_init(|| parse_html(&self.template))
    }
}

/// Builds and memoizes path-covered templates for one document.
#[derive(Debug)]
pub struct BranchAwareTemplateEngine {
    source: String,
    tags: Vec<TemplateTag>,
    context: BranchContext,
    store: RefCell<Vec<Rc<PathCoveredTemplate>>>,
}

impl BranchAwareTemplateEngine {
    pub fn new(source: impl Into<String>, tags: Vec<TemplateTag>, context: BranchContext) -> Self {
        Self {
            source: source.into(),
            tags,
            context,
            store: RefCell::new(Vec::new()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tags(&self) -> &[TemplateTag] {
        &self.tags
    }

    pub fn context(&self) -> &BranchContext {
        &self.context
    }

    /// The whole document as one view, ignoring branches.
    pub fn single_view(&self) -> PathCoveredTemplate {
        PathCoveredTemplate::new(
            embed_interpolations(&self.source, &self.tags, &[]),
            Vec::new(),
        )
    }

    /// View in which `target` is reachable and every branch off its path is
    /// striped. Repeated queries return the same instance.
    pub fn path_covered_template(&self, target: usize) -> Rc<PathCoveredTemplate> {
        let started = Instant::now();
        if let Some(found) = self
            .store
            .borrow()
            .iter()
            .find(|template| !template.is_striped(target))
        {
            telemetry::record_branch_resolution(target, started.elapsed(), true);
            return Rc::clone(found);
        }

        let mut striped: Vec<Span> = Vec::new();
        let mut falsy: Vec<Rc<Condition>> = Vec::new();
        let enclosed = |striped: &[Span], span: Span| striped.iter().any(|s| s.encloses(span));

        let mut outside = Vec::new();
        for branch in &self.context.ifs {
            if branch.consequent.contains(target) {
                striped.push(branch.alternate);
                assume_false(&mut falsy, &branch.when_true);
            } else if branch.alternate.contains(target) {
                striped.push(branch.consequent);
                assume_false(&mut falsy, &branch.when_false);
            } else {
                outside.push(branch);
            }
        }

        for switch in &self.context.switches {
            if enclosed(&striped, switch.span) {
                continue;
            }
            let keep = switch.group_for(target);
            striped.extend(
                switch
                    .groups
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| *index != keep)
                    .map(|(_, group)| *group),
            );
        }

        for branch in outside {
            if enclosed(&striped, branch.span) {
                continue;
            }
            let unreachable = branch
                .when_true
                .iter()
                .any(|condition| falsy.iter().any(|known| known.same_constraint(condition)));
            if unreachable {
                striped.push(branch.consequent);
                assume_false(&mut falsy, &branch.when_false);
            } else {
                striped.push(branch.alternate);
                assume_false(&mut falsy, &branch.when_true);
            }
        }

        let striped = merge_spans(striped);
        let blanked = blank_ranges(&self.source, &striped);
        let template = embed_interpolations(&blanked, &self.tags, &striped);
        tracing::debug!(
            offset = target,
            striped = striped.len(),
            "built path-covered template"
        );
        let template = Rc::new(PathCoveredTemplate::new(template, striped));
        self.store.borrow_mut().push(Rc::clone(&template));
        telemetry::record_branch_resolution(target, started.elapsed(), false);
        template
    }

    /// Every distinct view needed to cover all branches, starting from the
    /// top of the document.
    pub fn all_templates(&self) -> Vec<Rc<PathCoveredTemplate>> {
        let mut templates: Vec<Rc<PathCoveredTemplate>> = Vec::new();
        let mut offset = 0usize;
        loop {
            let template = self.path_covered_template(offset);
            let next = template
                .striped_ranges()
                .iter()
                .map(|range| range.start)
                .filter(|&start| start > offset)
                .min();
            if !templates
                .iter()
                .any(|known| known.template() == template.template())
            {
                templates.push(template);
            }
            match next {
                Some(next) => offset = next,
                None => break,
            }
        }
        tracing::debug!(count = templates.len(), "collected path-covered templates");
        templates
    }
}

/// Records that every condition in `holding` is true, i.e. its negation is
/// known to be false.
fn assume_false(falsy: &mut Vec<Rc<Condition>>, holding: &[Rc<Condition>]) {
    falsy.extend(holding.iter().map(|condition| condition.not()));
}
