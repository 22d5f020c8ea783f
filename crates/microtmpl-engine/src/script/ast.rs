// SPDX-License-Identifier: Apache-2.0 OR MIT
//! ESTree-shaped syntax tree for template script code.
//!
//! The tree is owned and detached from the parser's arena, so services can
//! keep it after parsing. Constructs the lint layer never inspects, such as
//! classes and destructuring patterns, are kept as [`NodeKind::Other`] leaves.

use once_cell::sync::Lazy;
use smallvec::smallvec;

use crate::span::Span;
use crate::traverse::{Children, TreeNode, VisitorKeys};

/// Identifier of a node, unique within one parsed program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub span: Span,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(String),
    Boolean(bool),
    Null,
    Regex { pattern: String, flags: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Program {
        body: Vec<Node>,
    },
    ExpressionStatement {
        expression: Box<Node>,
    },
    BlockStatement {
        body: Vec<Node>,
    },
    EmptyStatement,
    VariableDeclaration {
        kind: DeclarationKind,
        declarations: Vec<Node>,
    },
    VariableDeclarator {
        id: Box<Node>,
        init: Option<Box<Node>>,
    },
    FunctionDeclaration {
        id: Option<Box<Node>>,
        params: Vec<Node>,
        body: Box<Node>,
    },
    IfStatement {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },
    SwitchStatement {
        discriminant: Box<Node>,
        cases: Vec<Node>,
    },
    SwitchCase {
        test: Option<Box<Node>>,
        consequent: Vec<Node>,
    },
    ForStatement {
        init: Option<Box<Node>>,
        test: Option<Box<Node>>,
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForInStatement {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
    },
    ForOfStatement {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
    },
    WhileStatement {
        test: Box<Node>,
        body: Box<Node>,
    },
    DoWhileStatement {
        body: Box<Node>,
        test: Box<Node>,
    },
    TryStatement {
        block: Box<Node>,
        handler: Option<Box<Node>>,
        finalizer: Option<Box<Node>>,
    },
    CatchClause {
        param: Option<Box<Node>>,
        body: Box<Node>,
    },
    BreakStatement {
        label: Option<Box<Node>>,
    },
    ContinueStatement {
        label: Option<Box<Node>>,
    },
    ReturnStatement {
        argument: Option<Box<Node>>,
    },
    ThrowStatement {
        argument: Box<Node>,
    },
    LabeledStatement {
        label: Box<Node>,
        body: Box<Node>,
    },
    WithStatement {
        object: Box<Node>,
        body: Box<Node>,
    },
    DebuggerStatement,
    Identifier {
        name: String,
    },
    Literal {
        value: LiteralValue,
        raw: String,
    },
    TemplateLiteral {
        raw: String,
    },
    TaggedTemplateExpression {
        tag: Box<Node>,
        quasi: Box<Node>,
    },
    ThisExpression,
    ArrayExpression {
        elements: Vec<Option<Node>>,
    },
    ObjectExpression {
        properties: Vec<Node>,
    },
    Property {
        key: Box<Node>,
        value: Box<Node>,
        kind: PropertyKind,
        computed: bool,
        shorthand: bool,
        method: bool,
    },
    SpreadElement {
        argument: Box<Node>,
    },
    RestElement {
        argument: Box<Node>,
    },
    AssignmentPattern {
        left: Box<Node>,
        right: Box<Node>,
    },
    FunctionExpression {
        id: Option<Box<Node>>,
        params: Vec<Node>,
        body: Box<Node>,
    },
    ArrowFunctionExpression {
        params: Vec<Node>,
        body: Box<Node>,
        expression: bool,
    },
    UnaryExpression {
        operator: &'static str,
        argument: Box<Node>,
    },
    UpdateExpression {
        operator: &'static str,
        prefix: bool,
        argument: Box<Node>,
    },
    BinaryExpression {
        operator: &'static str,
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalExpression {
        operator: &'static str,
        left: Box<Node>,
        right: Box<Node>,
    },
    AssignmentExpression {
        operator: &'static str,
        left: Box<Node>,
        right: Box<Node>,
    },
    ConditionalExpression {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
        optional: bool,
    },
    NewExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
        optional: bool,
    },
    SequenceExpression {
        expressions: Vec<Node>,
    },
    /// Leaf standing in for a construct without its own variant.
    Other {
        node_type: &'static str,
    },
}

impl Node {
    pub fn new(id: NodeId, span: Span, kind: NodeKind) -> Self {
        Self { id, span, kind }
    }

    /// Source text covered by the node.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.start..self.span.end]
    }

    /// Statements and declarations, the nodes a statement list can hold.
    pub fn is_statement(&self) -> bool {
        let name = self.node_type();
        name.ends_with("Statement") || name.ends_with("Declaration")
    }

    pub fn is_expression(&self) -> bool {
        !self.is_statement()
            && !matches!(
                self.kind,
                NodeKind::Program { .. }
                    | NodeKind::SwitchCase { .. }
                    | NodeKind::CatchClause { .. }
                    | NodeKind::VariableDeclarator { .. }
                    | NodeKind::Property { .. }
                    | NodeKind::SpreadElement { .. }
                    | NodeKind::RestElement { .. }
                    | NodeKind::AssignmentPattern { .. }
            )
            && !matches!(self.kind, NodeKind::Other { node_type } if node_type.ends_with("Pattern"))
    }

    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }
}

fn one(node: &Node) -> Children<'_, Node> {
    Children::One(node)
}

fn maybe(node: &Option<Box<Node>>) -> Children<'_, Node> {
    node.as_deref().map_or(Children::None, Children::One)
}

fn many(nodes: &[Node]) -> Children<'_, Node> {
    Children::Many(nodes.iter().map(Some).collect())
}

impl TreeNode for Node {
    fn node_type(&self) -> &'static str {
        match &self.kind {
            NodeKind::Program { .. } => "Program",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::BlockStatement { .. } => "BlockStatement",
            NodeKind::EmptyStatement => "EmptyStatement",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::VariableDeclarator { .. } => "VariableDeclarator",
            NodeKind::FunctionDeclaration { .. } => "FunctionDeclaration",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::SwitchStatement { .. } => "SwitchStatement",
            NodeKind::SwitchCase { .. } => "SwitchCase",
            NodeKind::ForStatement { .. } => "ForStatement",
            NodeKind::ForInStatement { .. } => "ForInStatement",
            NodeKind::ForOfStatement { .. } => "ForOfStatement",
            NodeKind::WhileStatement { .. } => "WhileStatement",
            NodeKind::DoWhileStatement { .. } => "DoWhileStatement",
            NodeKind::TryStatement { .. } => "TryStatement",
            NodeKind::CatchClause { .. } => "CatchClause",
            NodeKind::BreakStatement { .. } => "BreakStatement",
            NodeKind::ContinueStatement { .. } => "ContinueStatement",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::ThrowStatement { .. } => "ThrowStatement",
            NodeKind::LabeledStatement { .. } => "LabeledStatement",
            NodeKind::WithStatement { .. } => "WithStatement",
            NodeKind::DebuggerStatement => "DebuggerStatement",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::TemplateLiteral { .. } => "TemplateLiteral",
            NodeKind::TaggedTemplateExpression { .. } => "TaggedTemplateExpression",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::ArrayExpression { .. } => "ArrayExpression",
            NodeKind::ObjectExpression { .. } => "ObjectExpression",
            NodeKind::Property { .. } => "Property",
            NodeKind::SpreadElement { .. } => "SpreadElement",
            NodeKind::RestElement { .. } => "RestElement",
            NodeKind::AssignmentPattern { .. } => "AssignmentPattern",
            NodeKind::FunctionExpression { .. } => "FunctionExpression",
            NodeKind::ArrowFunctionExpression { .. } => "ArrowFunctionExpression",
            NodeKind::UnaryExpression { .. } => "UnaryExpression",
            NodeKind::UpdateExpression { .. } => "UpdateExpression",
            NodeKind::BinaryExpression { .. } => "BinaryExpression",
            NodeKind::LogicalExpression { .. } => "LogicalExpression",
            NodeKind::AssignmentExpression { .. } => "AssignmentExpression",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::NewExpression { .. } => "NewExpression",
            NodeKind::MemberExpression { .. } => "MemberExpression",
            NodeKind::SequenceExpression { .. } => "SequenceExpression",
            NodeKind::Other { node_type } => *node_type,
        }
    }

    fn span(&self) -> Span {
        self.span
    }

    fn child(&self, key: &str) -> Children<'_, Self> {
        match (&self.kind, key) {
            (NodeKind::Program { body }, "body") | (NodeKind::BlockStatement { body }, "body") => {
                many(body)
            }
            (NodeKind::ExpressionStatement { expression }, "expression") => one(expression),
            (NodeKind::VariableDeclaration { declarations, .. }, "declarations") => {
                many(declarations)
            }
            (NodeKind::VariableDeclarator { id, .. }, "id") => one(id),
            (NodeKind::VariableDeclarator { init, .. }, "init") => maybe(init),
            (NodeKind::FunctionDeclaration { id, .. }, "id")
            | (NodeKind::FunctionExpression { id, .. }, "id") => maybe(id),
            (NodeKind::FunctionDeclaration { params, .. }, "params")
            | (NodeKind::FunctionExpression { params, .. }, "params")
            | (NodeKind::ArrowFunctionExpression { params, .. }, "params") => many(params),
            (NodeKind::FunctionDeclaration { body, .. }, "body")
            | (NodeKind::FunctionExpression { body, .. }, "body")
            | (NodeKind::ArrowFunctionExpression { body, .. }, "body") => one(body),
            (NodeKind::IfStatement { test, .. }, "test")
            | (NodeKind::ConditionalExpression { test, .. }, "test")
            | (NodeKind::WhileStatement { test, .. }, "test")
            | (NodeKind::DoWhileStatement { test, .. }, "test") => one(test),
            (NodeKind::IfStatement { consequent, .. }, "consequent")
            | (NodeKind::ConditionalExpression { consequent, .. }, "consequent") => one(consequent),
            (NodeKind::IfStatement { alternate, .. }, "alternate") => maybe(alternate),
            (NodeKind::ConditionalExpression { alternate, .. }, "alternate") => one(alternate),
            (NodeKind::SwitchStatement { discriminant, .. }, "discriminant") => one(discriminant),
            (NodeKind::SwitchStatement { cases, .. }, "cases") => many(cases),
            (NodeKind::SwitchCase { test, .. }, "test")
            | (NodeKind::ForStatement { test, .. }, "test") => maybe(test),
            (NodeKind::SwitchCase { consequent, .. }, "consequent") => many(consequent),
            (NodeKind::ForStatement { init, .. }, "init") => maybe(init),
            (NodeKind::ForStatement { update, .. }, "update") => maybe(update),
            (NodeKind::ForStatement { body, .. }, "body")
            | (NodeKind::LabeledStatement { body, .. }, "body")
            | (NodeKind::WithStatement { body, .. }, "body")
            | (NodeKind::ForInStatement { body, .. }, "body")
            | (NodeKind::ForOfStatement { body, .. }, "body")
            | (NodeKind::WhileStatement { body, .. }, "body")
            | (NodeKind::DoWhileStatement { body, .. }, "body")
            | (NodeKind::CatchClause { body, .. }, "body") => one(body),
            (NodeKind::ForInStatement { left, .. }, "left")
            | (NodeKind::ForOfStatement { left, .. }, "left")
            | (NodeKind::AssignmentPattern { left, .. }, "left")
            | (NodeKind::BinaryExpression { left, .. }, "left")
            | (NodeKind::LogicalExpression { left, .. }, "left")
            | (NodeKind::AssignmentExpression { left, .. }, "left") => one(left),
            (NodeKind::ForInStatement { right, .. }, "right")
            | (NodeKind::ForOfStatement { right, .. }, "right")
            | (NodeKind::AssignmentPattern { right, .. }, "right")
            | (NodeKind::BinaryExpression { right, .. }, "right")
            | (NodeKind::LogicalExpression { right, .. }, "right")
            | (NodeKind::AssignmentExpression { right, .. }, "right") => one(right),
            (NodeKind::TryStatement { block, .. }, "block") => one(block),
            (NodeKind::TryStatement { handler, .. }, "handler") => maybe(handler),
            (NodeKind::TryStatement { finalizer, .. }, "finalizer") => maybe(finalizer),
            (NodeKind::CatchClause { param, .. }, "param") => maybe(param),
            (NodeKind::LabeledStatement { label, .. }, "label") => one(label),
            (NodeKind::WithStatement { object, .. }, "object") => one(object),
            (NodeKind::BreakStatement { label }, "label")
            | (NodeKind::ContinueStatement { label }, "label") => maybe(label),
            (NodeKind::ReturnStatement { argument }, "argument") => maybe(argument),
            (NodeKind::ThrowStatement { argument }, "argument")
            | (NodeKind::SpreadElement { argument }, "argument")
            | (NodeKind::RestElement { argument }, "argument")
            | (NodeKind::UnaryExpression { argument, .. }, "argument")
            | (NodeKind::UpdateExpression { argument, .. }, "argument") => one(argument),
            (NodeKind::TaggedTemplateExpression { tag, .. }, "tag") => one(tag),
            (NodeKind::TaggedTemplateExpression { quasi, .. }, "quasi") => one(quasi),
            (NodeKind::ArrayExpression { elements }, "elements") => {
                Children::Many(elements.iter().map(Option::as_ref).collect())
            }
            (NodeKind::ObjectExpression { properties }, "properties") => many(properties),
            (NodeKind::Property { key, .. }, "key") => one(key),
            (NodeKind::Property { value, .. }, "value") => one(value),
            (NodeKind::CallExpression { callee, .. }, "callee")
            | (NodeKind::NewExpression { callee, .. }, "callee") => one(callee),
            (NodeKind::CallExpression { arguments, .. }, "arguments")
            | (NodeKind::NewExpression { arguments, .. }, "arguments") => many(arguments),
            (NodeKind::MemberExpression { object, .. }, "object") => one(object),
            (NodeKind::MemberExpression { property, .. }, "property") => one(property),
            (NodeKind::SequenceExpression { expressions }, "expressions") => many(expressions),
            _ => Children::Many(smallvec![]),
        }
    }
}

static SCRIPT_VISITOR_KEYS: Lazy<VisitorKeys> = Lazy::new(|| {
    VisitorKeys::from_entries(&[
        ("Program", &["body"]),
        ("ExpressionStatement", &["expression"]),
        ("BlockStatement", &["body"]),
        ("VariableDeclaration", &["declarations"]),
        ("VariableDeclarator", &["id", "init"]),
        ("FunctionDeclaration", &["id", "params", "body"]),
        ("IfStatement", &["test", "consequent", "alternate"]),
        ("SwitchStatement", &["discriminant", "cases"]),
        ("SwitchCase", &["test", "consequent"]),
        ("ForStatement", &["init", "test", "update", "body"]),
        ("ForInStatement", &["left", "right", "body"]),
        ("ForOfStatement", &["left", "right", "body"]),
        ("WhileStatement", &["test", "body"]),
        ("DoWhileStatement", &["body", "test"]),
        ("TryStatement", &["block", "handler", "finalizer"]),
        ("CatchClause", &["param", "body"]),
        ("BreakStatement", &["label"]),
        ("ContinueStatement", &["label"]),
        ("ReturnStatement", &["argument"]),
        ("ThrowStatement", &["argument"]),
        ("LabeledStatement", &["label", "body"]),
        ("WithStatement", &["object", "body"]),
        ("TaggedTemplateExpression", &["tag", "quasi"]),
        ("ArrayExpression", &["elements"]),
        ("ObjectExpression", &["properties"]),
        ("Property", &["key", "value"]),
        ("SpreadElement", &["argument"]),
        ("RestElement", &["argument"]),
        ("AssignmentPattern", &["left", "right"]),
        ("FunctionExpression", &["id", "params", "body"]),
        ("ArrowFunctionExpression", &["params", "body"]),
        ("UnaryExpression", &["argument"]),
        ("UpdateExpression", &["argument"]),
        ("BinaryExpression", &["left", "right"]),
        ("LogicalExpression", &["left", "right"]),
        ("AssignmentExpression", &["left", "right"]),
        ("ConditionalExpression", &["test", "consequent", "alternate"]),
        ("CallExpression", &["callee", "arguments"]),
        ("NewExpression", &["callee", "arguments"]),
        ("MemberExpression", &["object", "property"]),
        ("SequenceExpression", &["expressions"]),
    ])
});

/// Visitor keys for every node type produced by the script parser.
pub fn script_visitor_keys() -> &'static VisitorKeys {
    &SCRIPT_VISITOR_KEYS
}
