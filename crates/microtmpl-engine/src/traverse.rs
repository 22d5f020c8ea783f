// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Generic depth-first traversal driven by visitor-key tables.
//!
//! A visitor-key table maps a node type name to the ordered list of child
//! fields that should be descended into. Node types without an entry are
//! treated as leaves, so a table can deliberately ignore parts of a tree.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::span::Span;

/// Children reachable through one child key.
pub enum Children<'a, N> {
    None,
    One(&'a N),
    /// Array-valued field; holes (`None`) are skipped by the traversal.
    Many(SmallVec<[Option<&'a N>; 4]>),
}

/// Tree shapes the traversal can walk.
pub trait TreeNode: Sized {
    fn node_type(&self) -> &'static str;
    fn span(&self) -> Span;
    fn child(&self, key: &str) -> Children<'_, Self>;
}

/// Node type name → ordered child field names.
#[derive(Debug, Clone, Default)]
pub struct VisitorKeys {
    map: HashMap<&'static str, &'static [&'static str]>,
}

impl VisitorKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[(&'static str, &'static [&'static str])]) -> Self {
        Self {
            map: entries.iter().copied().collect(),
        }
    }

    pub fn insert(&mut self, node_type: &'static str, keys: &'static [&'static str]) -> &mut Self {
        self.map.insert(node_type, keys);
        self
    }

    pub fn keys(&self, node_type: &str) -> &'static [&'static str] {
        self.map.get(node_type).copied().unwrap_or(&[])
    }
}

/// Instruction returned from [`Visitor::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitAction {
    #[default]
    Continue,
    /// Do not descend into the current node's children.
    Skip,
    /// Abort the whole traversal.
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOutcome {
    Completed,
    Broken,
}

pub trait Visitor<'a, N: TreeNode + 'a> {
    fn enter(&mut self, _node: &'a N, _parent: Option<&'a N>) -> VisitAction {
        VisitAction::Continue
    }

    fn leave(&mut self, _node: &'a N, _parent: Option<&'a N>) {}
}

/// Closure adapter with both `enter` and `leave` callbacks.
pub struct FnVisitor<E, L> {
    enter: E,
    leave: L,
}

impl<E, L> FnVisitor<E, L> {
    pub fn new(enter: E, leave: L) -> Self {
        Self { enter, leave }
    }
}

impl<'a, N, E, L> Visitor<'a, N> for FnVisitor<E, L>
where
    N: TreeNode + 'a,
    E: FnMut(&'a N, Option<&'a N>) -> VisitAction,
    L: FnMut(&'a N, Option<&'a N>),
{
    fn enter(&mut self, node: &'a N, parent: Option<&'a N>) -> VisitAction {
        (self.enter)(node, parent)
    }

    fn leave(&mut self, node: &'a N, parent: Option<&'a N>) {
        (self.leave)(node, parent);
    }
}

/// Closure adapter for traversals that only need `enter`.
pub struct EnterFn<E>(pub E);

impl<'a, N, E> Visitor<'a, N> for EnterFn<E>
where
    N: TreeNode + 'a,
    E: FnMut(&'a N, Option<&'a N>) -> VisitAction,
{
    fn enter(&mut self, node: &'a N, parent: Option<&'a N>) -> VisitAction {
        (self.0)(node, parent)
    }
}

enum Step<'a, N> {
    Enter(&'a N, Option<&'a N>),
    Leave(&'a N, Option<&'a N>),
}

/// Walks `root` depth first: pre-order `enter`, post-order `leave`.
///
/// The walk keeps its own stack, so tree depth is bounded by memory rather
/// than by the thread's call stack.
pub fn traverse<'a, N, V>(root: &'a N, keys: &VisitorKeys, visitor: &mut V) -> TraversalOutcome
where
    N: TreeNode + 'a,
    V: Visitor<'a, N> + ?Sized,
{
    let mut stack = vec![Step::Enter(root, None)];
    let mut children: Vec<&'a N> = Vec::new();
    while let Some(step) = stack.pop() {
        match step {
            Step::Leave(node, parent) => visitor.leave(node, parent),
            Step::Enter(node, parent) => match visitor.enter(node, parent) {
                VisitAction::Break => return TraversalOutcome::Broken,
                VisitAction::Skip => stack.push(Step::Leave(node, parent)),
                VisitAction::Continue => {
                    stack.push(Step::Leave(node, parent));
                    children.clear();
                    for key in keys.keys(node.node_type()) {
                        match node.child(key) {
                            Children::None => {}
                            Children::One(child) => children.push(child),
                            Children::Many(many) => children.extend(many.into_iter().flatten()),
                        }
                    }
                    stack.extend(
                        children
                            .drain(..)
                            .rev()
                            .map(|child| Step::Enter(child, Some(node))),
                    );
                }
            },
        }
    }
    TraversalOutcome::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use std::cell::RefCell;

    struct TestNode {
        kind: &'static str,
        span: Span,
        items: Vec<Option<TestNode>>,
        extra: Option<Box<TestNode>>,
    }

    impl TestNode {
        fn leaf(kind: &'static str, start: usize) -> Self {
            Self {
                kind,
                span: Span::new(start, start + 1),
                items: Vec::new(),
                extra: None,
            }
        }
    }

    impl TreeNode for TestNode {
        fn node_type(&self) -> &'static str {
            self.kind
        }

        fn span(&self) -> Span {
            self.span
        }

        fn child(&self, key: &str) -> Children<'_, Self> {
            match key {
                "items" => Children::Many(self.items.iter().map(Option::as_ref).collect()),
                "extra" => self
                    .extra
                    .as_deref()
                    .map_or(Children::None, Children::One),
                _ => Children::Many(smallvec![]),
            }
        }
    }

    fn sample() -> TestNode {
        TestNode {
            kind: "Root",
            span: Span::new(0, 10),
            items: vec![
                Some(TestNode {
                    kind: "Group",
                    span: Span::new(1, 4),
                    items: vec![Some(TestNode::leaf("Leaf", 2))],
                    extra: None,
                }),
                None,
                Some(TestNode::leaf("Unknown", 5)),
            ],
            extra: Some(Box::new(TestNode::leaf("Leaf", 8))),
        }
    }

    fn keys() -> VisitorKeys {
        VisitorKeys::from_entries(&[("Root", &["items", "extra"]), ("Group", &["items"])])
    }

    #[test]
    fn visits_in_pre_and_post_order() {
        let root = sample();
        let events = RefCell::new(Vec::new());
        let mut visitor = FnVisitor::new(
            |node: &TestNode, _parent: Option<&TestNode>| {
                events.borrow_mut().push(format!("enter {}", node.kind));
                VisitAction::Continue
            },
            |node: &TestNode, _parent: Option<&TestNode>| {
                events.borrow_mut().push(format!("leave {}", node.kind));
            },
        );
        let outcome = traverse(&root, &keys(), &mut visitor);
        assert_eq!(outcome, TraversalOutcome::Completed);
        assert_eq!(
            events.into_inner(),
            vec![
                "enter Root",
                "enter Group",
                "enter Leaf",
                "leave Leaf",
                "leave Group",
                "enter Unknown",
                "leave Unknown",
                "enter Leaf",
                "leave Leaf",
                "leave Root",
            ]
        );
    }

    #[test]
    fn skip_and_break_control_descent() {
        let root = sample();
        let mut seen = Vec::new();
        let mut visitor = EnterFn(|node: &TestNode, _parent: Option<&TestNode>| {
            seen.push(node.span.start);
            match node.kind {
                "Group" => VisitAction::Skip,
                "Unknown" => VisitAction::Break,
                _ => VisitAction::Continue,
            }
        });
        let outcome = traverse(&root, &keys(), &mut visitor);
        assert_eq!(outcome, TraversalOutcome::Broken);
        assert_eq!(seen, vec![0, 1, 5]);
    }

    #[test]
    fn deep_trees_do_not_exhaust_the_call_stack() {
        let mut root = TestNode::leaf("Leaf", 0);
        for depth in 1..=100_000 {
            root = TestNode {
                kind: "Group",
                span: Span::new(0, depth),
                items: vec![Some(root)],
                extra: None,
            };
        }
        let mut entered = 0usize;
        let mut left = 0usize;
        let mut visitor = FnVisitor::new(
            |_node: &TestNode, _parent: Option<&TestNode>| {
                entered += 1;
                VisitAction::Continue
            },
            |_node: &TestNode, _parent: Option<&TestNode>| left += 1,
        );
        let outcome = traverse(&root, &keys(), &mut visitor);
        drop(visitor);
        assert_eq!(outcome, TraversalOutcome::Completed);
        assert_eq!(entered, 100_001);
        assert_eq!(left, 100_001);

        // Dropping a deeply nested Box/Vec chain recurses; unwind it by hand.
        let mut next = Some(root);
        while let Some(mut node) = next {
            next = node.items.pop().flatten();
        }
    }
}
