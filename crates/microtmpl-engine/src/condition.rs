// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Syntactic reasoning about branch conditions.
//!
//! A [`Condition`] stands for "this expression is truthy" (or, negated,
//! falsy) and is represented by a small set of normalized source strings.
//! Two conditions describe the same constraint when their sets intersect.
//! Only a handful of rewrites are known: operand swapping and operator
//! inversion for comparisons, `!` and `Boolean(...)`. Anything else is
//! compared as whitespace-free source text, so `a+1` and `1+a` differ.

use std::collections::HashMap;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use smallvec::{smallvec, SmallVec};

use crate::script::{Node, NodeId, NodeKind};

/// Shape of a condition, shared by a condition and its negation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionForm {
    Simple {
        text: String,
    },
    Comparison {
        left: String,
        operator: &'static str,
        right: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Direct,
    Negated,
}

impl Polarity {
    fn flip(self) -> Self {
        match self {
            Polarity::Direct => Polarity::Negated,
            Polarity::Negated => Polarity::Direct,
        }
    }
}

#[derive(Debug)]
pub struct Condition {
    form: Rc<ConditionForm>,
    polarity: Polarity,
    expressions: SmallVec<[String; 2]>,
    negation: OnceCell<Rc<Condition>>,
}

impl Condition {
    pub fn simple(text: &str) -> Rc<Self> {
        let form = ConditionForm::Simple {
            text: strip_whitespace(text),
        };
        Rc::new(Self::with_polarity(Rc::new(form), Polarity::Direct))
    }

    /// `None` when `operator` is not one of the comparison operators.
    pub fn comparison(left: &str, operator: &str, right: &str) -> Option<Rc<Self>> {
        let operator = comparison_operator(operator)?;
        let form = ConditionForm::Comparison {
            left: strip_whitespace(left),
            operator,
            right: strip_whitespace(right),
        };
        Some(Rc::new(Self::with_polarity(
            Rc::new(form),
            Polarity::Direct,
        )))
    }

    fn with_polarity(form: Rc<ConditionForm>, polarity: Polarity) -> Self {
        let expressions = match (&*form, polarity) {
            (ConditionForm::Simple { text }, Polarity::Direct) => smallvec![text.clone()],
            (ConditionForm::Simple { text }, Polarity::Negated) => smallvec![format!("!({text})")],
            (
                ConditionForm::Comparison {
                    left,
                    operator,
                    right,
                },
                polarity,
            ) => {
                let operator = match polarity {
                    Polarity::Direct => *operator,
                    Polarity::Negated => inverse(operator),
                };
                smallvec![
                    format!("{left}{operator}{right}"),
                    format!("{right}{}{left}", mirror(operator)),
                ]
            }
        };
        Self {
            form,
            polarity,
            expressions,
            negation: OnceCell::new(),
        }
    }

    pub fn form(&self) -> &ConditionForm {
        &self.form
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Normalized source strings that all express this condition.
    pub fn expressions(&self) -> &[String] {
        &self.expressions
    }

    /// The opposite condition; computed once and shared.
    pub fn not(&self) -> Rc<Condition> {
        self.negation
            .get_or_init(|| {
                Rc::new(Self::with_polarity(
                    Rc::clone(&self.form),
                    self.polarity.flip(),
                ))
            })
            .clone()
    }

    pub fn same_constraint(&self, other: &Condition) -> bool {
        self.expressions
            .iter()
            .any(|expression| other.expressions.contains(expression))
    }
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_whitespace()).collect()
}

fn comparison_operator(operator: &str) -> Option<&'static str> {
    ["<", "<=", ">", ">=", "==", "!=", "===", "!=="]
        .into_iter()
        .find(|candidate| *candidate == operator)
}

/// Operator that holds after swapping the operands.
fn mirror(operator: &str) -> &'static str {
    match operator {
        "<" => ">",
        "<=" => ">=",
        ">" => "<",
        ">=" => "<=",
        "==" => "==",
        "!=" => "!=",
        "===" => "===",
        _ => "!==",
    }
}

/// Operator that holds when the comparison is false.
fn inverse(operator: &str) -> &'static str {
    match operator {
        "<" => ">=",
        "<=" => ">",
        ">" => "<=",
        ">=" => "<",
        "==" => "!=",
        "!=" => "==",
        "===" => "!==",
        _ => "===",
    }
}

fn negated_operand(node: &Node) -> Option<&Node> {
    match &node.kind {
        NodeKind::UnaryExpression {
            operator: "!",
            argument,
        } => Some(&**argument),
        _ => None,
    }
}

/// The argument of a `Boolean(x)` call.
fn boolean_argument(node: &Node) -> Option<&Node> {
    match &node.kind {
        NodeKind::CallExpression {
            callee, arguments, ..
        } if callee.identifier_name() == Some("Boolean") && arguments.len() == 1 => {
            let argument = &arguments[0];
            (!matches!(argument.kind, NodeKind::SpreadElement { .. })).then_some(argument)
        }
        _ => None,
    }
}

/// Per-document memo of conditions, keyed by node id.
#[derive(Debug, Default)]
pub struct ConditionCache {
    conditions: HashMap<NodeId, Rc<Condition>>,
    truthy: HashMap<NodeId, Rc<[Rc<Condition>]>>,
    falsy: HashMap<NodeId, Rc<[Rc<Condition>]>>,
}

impl ConditionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Condition stating that `node` is truthy.
    pub fn condition(&mut self, node: &Node, source: &str) -> Rc<Condition> {
        if let Some(found) = self.conditions.get(&node.id) {
            return Rc::clone(found);
        }
        let condition = if let Some(operand) = negated_operand(node) {
            self.condition(operand, source).not()
        } else if let Some(argument) = boolean_argument(node) {
            self.condition(argument, source)
        } else {
            match &node.kind {
                NodeKind::BinaryExpression {
                    operator,
                    left,
                    right,
                } => Condition::comparison(left.text(source), operator, right.text(source))
                    .unwrap_or_else(|| Condition::simple(node.text(source))),
                _ => Condition::simple(node.text(source)),
            }
        };
        self.conditions.insert(node.id, Rc::clone(&condition));
        condition
    }

    /// Every condition known to hold when `node` is truthy.
    pub fn conditions_for_truthy(&mut self, node: &Node, source: &str) -> Rc<[Rc<Condition>]> {
        if let Some(found) = self.truthy.get(&node.id) {
            return Rc::clone(found);
        }
        let conditions: Rc<[Rc<Condition>]> = if let Some(operand) = negated_operand(node) {
            self.conditions_for_falsy(operand, source)
        } else if let Some(argument) = boolean_argument(node) {
            self.conditions_for_truthy(argument, source)
        } else {
            let mut conditions = Vec::new();
            if let NodeKind::LogicalExpression {
                operator: "&&",
                left,
                right,
            } = &node.kind
            {
                conditions.extend(self.conditions_for_truthy(left, source).iter().cloned());
                conditions.extend(self.conditions_for_truthy(right, source).iter().cloned());
            }
            conditions.push(self.condition(node, source));
            conditions.into()
        };
        self.truthy.insert(node.id, Rc::clone(&conditions));
        conditions
    }

    /// Every condition known to hold when `node` is falsy.
    pub fn conditions_for_falsy(&mut self, node: &Node, source: &str) -> Rc<[Rc<Condition>]> {
        if let Some(found) = self.falsy.get(&node.id) {
            return Rc::clone(found);
        }
        let conditions: Rc<[Rc<Condition>]> = if let Some(operand) = negated_operand(node) {
            self.conditions_for_truthy(operand, source)
        } else if let Some(argument) = boolean_argument(node) {
            self.conditions_for_falsy(argument, source)
        } else {
            let mut conditions = Vec::new();
            if let NodeKind::LogicalExpression {
                operator: "||",
                left,
                right,
            } = &node.kind
            {
                conditions.extend(self.conditions_for_falsy(left, source).iter().cloned());
                conditions.extend(self.conditions_for_falsy(right, source).iter().cloned());
            }
            conditions.push(self.condition(node, source).not());
            conditions.into()
        };
        self.falsy.insert(node.id, Rc::clone(&conditions));
        conditions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{EmbeddedScriptParser, ScriptParser};

    /// Test of the first `if` in `source`.
    fn if_test(source: &str) -> Node {
        let program = EmbeddedScriptParser.parse(source).unwrap();
        let NodeKind::Program { body } = program.ast.kind else {
            panic!("expected program");
        };
        match body.into_iter().next().map(|node| node.kind) {
            Some(NodeKind::IfStatement { test, .. }) => *test,
            other => panic!("expected if statement, got {other:?}"),
        }
    }

    fn sorted(condition: &Condition) -> Vec<String> {
        let mut expressions = condition.expressions().to_vec();
        expressions.sort();
        expressions
    }

    #[test]
    fn comparisons_produce_both_operand_orders() {
        let source = "if (a < b) {}";
        let test = if_test(source);
        let mut cache = ConditionCache::new();
        let condition = cache.condition(&test, source);
        assert_eq!(sorted(&condition), vec!["a<b", "b>a"]);
        assert_eq!(sorted(&condition.not()), vec!["a>=b", "b<=a"]);
    }

    #[test]
    fn simple_conditions_strip_whitespace() {
        let source = "if (foo( x ,  y ).bar) {}";
        let test = if_test(source);
        let condition = ConditionCache::new().condition(&test, source);
        assert_eq!(condition.expressions(), ["foo(x,y).bar"]);
        assert_eq!(condition.not().expressions(), ["!(foo(x,y).bar)"]);
    }

    #[test]
    fn negation_is_an_involution() {
        for source in [
            "if (a) {}",
            "if (!a) {}",
            "if (a === b) {}",
            "if (x + 1 > y) {}",
            "if (Boolean(a != b)) {}",
        ] {
            let test = if_test(source);
            let condition = ConditionCache::new().condition(&test, source);
            assert_eq!(sorted(&condition.not().not()), sorted(&condition), "{source}");
        }
    }

    #[test]
    fn not_and_boolean_are_normalized() {
        let source = "if (!Boolean(a >= b)) {}";
        let test = if_test(source);
        let mut cache = ConditionCache::new();
        let condition = cache.condition(&test, source);
        let direct = Condition::comparison("a", "<", "b").unwrap();
        assert!(condition.same_constraint(&direct));
        assert_eq!(condition.polarity(), Polarity::Negated);
    }

    #[test]
    fn truthy_distributes_over_and_falsy_over_or() {
        let source = "if (a && (b || c)) {}";
        let test = if_test(source);
        let mut cache = ConditionCache::new();

        let truthy: Vec<_> = cache
            .conditions_for_truthy(&test, source)
            .iter()
            .map(|c| c.expressions()[0].clone())
            .collect();
        assert_eq!(truthy, vec!["a", "b||c", "a&&(b||c)"]);

        let source = "if (!a || b) {}";
        let test = if_test(source);
        let mut cache = ConditionCache::new();
        let falsy: Vec<_> = cache
            .conditions_for_falsy(&test, source)
            .iter()
            .map(|c| c.expressions()[0].clone())
            .collect();
        assert_eq!(falsy, vec!["a", "!(b)", "!(!a||b)"]);
    }

    #[test]
    fn memoizes_per_node_and_polarity() {
        let source = "if (a == b) {}";
        let test = if_test(source);
        let mut cache = ConditionCache::new();
        let first = cache.conditions_for_truthy(&test, source);
        let second = cache.conditions_for_truthy(&test, source);
        assert!(Rc::ptr_eq(&first, &second));
        let condition = cache.condition(&test, source);
        assert!(Rc::ptr_eq(&condition.not(), &condition.not()));
        assert!(Rc::ptr_eq(&first[0], &condition));
    }

    #[test]
    fn equivalence_is_syntactic() {
        let left = Condition::simple("a + 1");
        let right = Condition::simple("1 + a");
        assert!(!left.same_constraint(&right));
    }
}
