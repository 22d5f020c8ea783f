// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Lowers the oxc syntax tree into the owned [`Node`] tree.

use oxc_ast::ast::{
    Argument, ArrayExpressionElement, AssignmentTarget, BindingPattern, BindingPatternKind,
    BlockStatement, CallExpression, ChainElement, ComputedMemberExpression, Expression,
    ForStatementInit, ForStatementLeft, FormalParameters, Function, FunctionBody,
    ObjectPropertyKind, Program, PropertyKey, SimpleAssignmentTarget, Statement,
    StaticMemberExpression, StringLiteral, VariableDeclaration, VariableDeclarationKind,
};
use oxc_ast::ast::PropertyKind as SourcePropertyKind;
use oxc_span::GetSpan;

use crate::error::Error;
use crate::span::Span;

use super::ast::{DeclarationKind, LiteralValue, Node, NodeId, NodeKind, PropertyKind};

/// Statements and expressions nested deeper than this are rejected.
pub(super) const MAX_DEPTH: usize = 256;

type Lowered = Result<Node, Error>;

pub(super) struct Lowering<'s> {
    source: &'s str,
    next_id: u32,
    depth: usize,
}

fn span_of(span: oxc_span::Span) -> Span {
    Span::new(span.start as usize, span.end as usize)
}

impl<'s> Lowering<'s> {
    pub(super) fn new(source: &'s str) -> Self {
        Self {
            source,
            next_id: 0,
            depth: 0,
        }
    }

    pub(super) fn program(mut self, program: &Program<'_>) -> Lowered {
        let mut body = Vec::with_capacity(program.directives.len() + program.body.len());
        for directive in &program.directives {
            body.push(self.directive(directive.span, &directive.expression));
        }
        body.extend(self.statements(&program.body)?);
        let span = Span::new(0, self.source.len());
        Ok(self.node_at(span, NodeKind::Program { body }))
    }

    // statements

    fn statements(&mut self, statements: &[Statement<'_>]) -> Result<Vec<Node>, Error> {
        statements.iter().map(|stmt| self.statement(stmt)).collect()
    }

    fn statement(&mut self, statement: &Statement<'_>) -> Lowered {
        self.enter(statement.span())?;
        let node = self.statement_kind(statement);
        self.depth -= 1;
        node
    }

    fn statement_kind(&mut self, statement: &Statement<'_>) -> Lowered {
        let kind = match statement {
            Statement::ExpressionStatement(stmt) => NodeKind::ExpressionStatement {
                expression: self.boxed(&stmt.expression)?,
            },
            Statement::BlockStatement(block) => return self.block(block),
            Statement::EmptyStatement(_) => NodeKind::EmptyStatement,
            Statement::DebuggerStatement(_) => NodeKind::DebuggerStatement,
            Statement::VariableDeclaration(decl) => return self.variable_declaration(decl),
            Statement::FunctionDeclaration(function) => {
                let (id, params, body) = self.function(function)?;
                NodeKind::FunctionDeclaration { id, params, body }
            }
            Statement::IfStatement(stmt) => NodeKind::IfStatement {
                test: self.boxed(&stmt.test)?,
                consequent: Box::new(self.statement(&stmt.consequent)?),
                alternate: match &stmt.alternate {
                    Some(alternate) => Some(Box::new(self.statement(alternate)?)),
                    None => None,
                },
            },
            Statement::SwitchStatement(stmt) => {
                let discriminant = self.boxed(&stmt.discriminant)?;
                let mut cases = Vec::with_capacity(stmt.cases.len());
                for case in &stmt.cases {
                    let test = self.optional(case.test.as_ref())?;
                    let consequent = self.statements(&case.consequent)?;
                    cases.push(self.node(case.span, NodeKind::SwitchCase { test, consequent }));
                }
                NodeKind::SwitchStatement {
                    discriminant,
                    cases,
                }
            }
            Statement::ForStatement(stmt) => {
                let init = match &stmt.init {
                    None => None,
                    Some(ForStatementInit::VariableDeclaration(decl)) => {
                        Some(Box::new(self.variable_declaration(decl)?))
                    }
                    Some(init) => match init.as_expression() {
                        Some(expr) => Some(self.boxed(expr)?),
                        None => Some(Box::new(self.other(init.span(), "Expression"))),
                    },
                };
                NodeKind::ForStatement {
                    init,
                    test: self.optional(stmt.test.as_ref())?,
                    update: self.optional(stmt.update.as_ref())?,
                    body: Box::new(self.statement(&stmt.body)?),
                }
            }
            Statement::ForInStatement(stmt) => NodeKind::ForInStatement {
                left: Box::new(self.for_left(&stmt.left)?),
                right: self.boxed(&stmt.right)?,
                body: Box::new(self.statement(&stmt.body)?),
            },
            Statement::ForOfStatement(stmt) => NodeKind::ForOfStatement {
                left: Box::new(self.for_left(&stmt.left)?),
                right: self.boxed(&stmt.right)?,
                body: Box::new(self.statement(&stmt.body)?),
            },
            Statement::WhileStatement(stmt) => NodeKind::WhileStatement {
                test: self.boxed(&stmt.test)?,
                body: Box::new(self.statement(&stmt.body)?),
            },
            Statement::DoWhileStatement(stmt) => NodeKind::DoWhileStatement {
                body: Box::new(self.statement(&stmt.body)?),
                test: self.boxed(&stmt.test)?,
            },
            Statement::TryStatement(stmt) => {
                let block = Box::new(self.block(&stmt.block)?);
                let handler = match &stmt.handler {
                    Some(handler) => {
                        let param = match &handler.param {
                            Some(param) => Some(Box::new(self.binding(&param.pattern)?)),
                            None => None,
                        };
                        let body = Box::new(self.block(&handler.body)?);
                        Some(Box::new(
                            self.node(handler.span, NodeKind::CatchClause { param, body }),
                        ))
                    }
                    None => None,
                };
                let finalizer = match &stmt.finalizer {
                    Some(finalizer) => Some(Box::new(self.block(finalizer)?)),
                    None => None,
                };
                NodeKind::TryStatement {
                    block,
                    handler,
                    finalizer,
                }
            }
            Statement::BreakStatement(stmt) => NodeKind::BreakStatement {
                label: stmt
                    .label
                    .as_ref()
                    .map(|label| Box::new(self.identifier(label.span, &label.name))),
            },
            Statement::ContinueStatement(stmt) => NodeKind::ContinueStatement {
                label: stmt
                    .label
                    .as_ref()
                    .map(|label| Box::new(self.identifier(label.span, &label.name))),
            },
            Statement::ReturnStatement(stmt) => NodeKind::ReturnStatement {
                argument: self.optional(stmt.argument.as_ref())?,
            },
            Statement::ThrowStatement(stmt) => NodeKind::ThrowStatement {
                argument: self.boxed(&stmt.argument)?,
            },
            Statement::LabeledStatement(stmt) => NodeKind::LabeledStatement {
                label: Box::new(self.identifier(stmt.label.span, &stmt.label.name)),
                body: Box::new(self.statement(&stmt.body)?),
            },
            Statement::WithStatement(stmt) => NodeKind::WithStatement {
                object: self.boxed(&stmt.object)?,
                body: Box::new(self.statement(&stmt.body)?),
            },
            Statement::ClassDeclaration(class) => {
                return Ok(self.other(class.span, "ClassDeclaration"));
            }
            other => return Ok(self.other(other.span(), "Statement")),
        };
        Ok(self.node(statement.span(), kind))
    }

    fn block(&mut self, block: &BlockStatement<'_>) -> Lowered {
        let body = self.statements(&block.body)?;
        Ok(self.node(block.span, NodeKind::BlockStatement { body }))
    }

    fn variable_declaration(&mut self, decl: &VariableDeclaration<'_>) -> Lowered {
        let kind = match decl.kind {
            VariableDeclarationKind::Var => DeclarationKind::Var,
            VariableDeclarationKind::Let => DeclarationKind::Let,
            _ => DeclarationKind::Const,
        };
        let mut declarations = Vec::with_capacity(decl.declarations.len());
        for declarator in &decl.declarations {
            let id = Box::new(self.binding(&declarator.id)?);
            let init = self.optional(declarator.init.as_ref())?;
            let declarator = self.node(declarator.span, NodeKind::VariableDeclarator { id, init });
            declarations.push(declarator);
        }
        Ok(self.node(decl.span, NodeKind::VariableDeclaration { kind, declarations }))
    }

    fn for_left(&mut self, left: &ForStatementLeft<'_>) -> Lowered {
        match left {
            ForStatementLeft::VariableDeclaration(decl) => self.variable_declaration(decl),
            ForStatementLeft::AssignmentTargetIdentifier(id) => {
                Ok(self.identifier(id.span, &id.name))
            }
            ForStatementLeft::StaticMemberExpression(member) => self.static_member(member),
            ForStatementLeft::ComputedMemberExpression(member) => self.computed_member(member),
            other => Ok(self.other(other.span(), "Pattern")),
        }
    }

    /// A directive prologue entry, shaped as ESTree does: a string statement.
    fn directive(&mut self, span: oxc_span::Span, literal: &StringLiteral<'_>) -> Node {
        let expression = Box::new(self.string_literal(literal));
        self.node(span, NodeKind::ExpressionStatement { expression })
    }

    // functions and bindings

    fn function(
        &mut self,
        function: &Function<'_>,
    ) -> Result<(Option<Box<Node>>, Vec<Node>, Box<Node>), Error> {
        let id = function
            .id
            .as_ref()
            .map(|id| Box::new(self.identifier(id.span, &id.name)));
        let params = self.params(&function.params)?;
        let body = match &function.body {
            Some(body) => self.function_body(body)?,
            None => self.node(function.span, NodeKind::BlockStatement { body: Vec::new() }),
        };
        Ok((id, params, Box::new(body)))
    }

    fn function_body(&mut self, body: &FunctionBody<'_>) -> Lowered {
        let mut statements = Vec::with_capacity(body.directives.len() + body.statements.len());
        for directive in &body.directives {
            statements.push(self.directive(directive.span, &directive.expression));
        }
        statements.extend(self.statements(&body.statements)?);
        Ok(self.node(body.span, NodeKind::BlockStatement { body: statements }))
    }

    fn params(&mut self, params: &FormalParameters<'_>) -> Result<Vec<Node>, Error> {
        let mut nodes = Vec::with_capacity(params.items.len() + 1);
        for param in &params.items {
            nodes.push(self.binding(&param.pattern)?);
        }
        if let Some(rest) = &params.rest {
            let argument = Box::new(self.binding(&rest.argument)?);
            nodes.push(self.node(rest.span, NodeKind::RestElement { argument }));
        }
        Ok(nodes)
    }

    fn binding(&mut self, pattern: &BindingPattern<'_>) -> Lowered {
        match &pattern.kind {
            BindingPatternKind::BindingIdentifier(id) => Ok(self.identifier(id.span, &id.name)),
            BindingPatternKind::AssignmentPattern(assign) => {
                let left = Box::new(self.binding(&assign.left)?);
                let right = self.boxed(&assign.right)?;
                Ok(self.node(assign.span, NodeKind::AssignmentPattern { left, right }))
            }
            BindingPatternKind::ObjectPattern(object) => {
                Ok(self.other(object.span, "ObjectPattern"))
            }
            BindingPatternKind::ArrayPattern(array) => Ok(self.other(array.span, "ArrayPattern")),
        }
    }

    // expressions

    fn boxed(&mut self, expr: &Expression<'_>) -> Result<Box<Node>, Error> {
        self.expression(expr).map(Box::new)
    }

    fn optional(&mut self, expr: Option<&Expression<'_>>) -> Result<Option<Box<Node>>, Error> {
        expr.map(|expr| self.boxed(expr)).transpose()
    }

    fn expression(&mut self, expr: &Expression<'_>) -> Lowered {
        self.enter(expr.span())?;
        let node = self.expression_kind(expr);
        self.depth -= 1;
        node
    }

    fn expression_kind(&mut self, expr: &Expression<'_>) -> Lowered {
        let kind = match expr {
            Expression::BooleanLiteral(lit) => {
                self.literal(lit.span, LiteralValue::Boolean(lit.value))
            }
            Expression::NullLiteral(lit) => self.literal(lit.span, LiteralValue::Null),
            Expression::NumericLiteral(lit) => {
                let raw = self.text(lit.span).to_string();
                self.literal(lit.span, LiteralValue::Number(raw))
            }
            Expression::BigIntLiteral(lit) => {
                let raw = self.text(lit.span).to_string();
                self.literal(lit.span, LiteralValue::Number(raw))
            }
            Expression::StringLiteral(lit) => return Ok(self.string_literal(lit)),
            Expression::RegExpLiteral(lit) => {
                let raw = self.text(lit.span);
                let close = raw.rfind('/').unwrap_or(raw.len());
                let value = LiteralValue::Regex {
                    pattern: raw.get(1..close).unwrap_or_default().to_string(),
                    flags: raw.get(close + 1..).unwrap_or_default().to_string(),
                };
                self.literal(lit.span, value)
            }
            Expression::TemplateLiteral(lit) => NodeKind::TemplateLiteral {
                raw: self.text(lit.span).to_string(),
            },
            Expression::Identifier(id) => return Ok(self.identifier(id.span, &id.name)),
            Expression::ThisExpression(_) => NodeKind::ThisExpression,
            Expression::ArrayExpression(array) => {
                let mut elements = Vec::with_capacity(array.elements.len());
                for element in &array.elements {
                    elements.push(match element {
                        ArrayExpressionElement::Elision(_) => None,
                        ArrayExpressionElement::SpreadElement(spread) => {
                            let argument = self.boxed(&spread.argument)?;
                            Some(self.node(spread.span, NodeKind::SpreadElement { argument }))
                        }
                        other => match other.as_expression() {
                            Some(expr) => Some(self.expression(expr)?),
                            None => Some(self.other(other.span(), "Expression")),
                        },
                    });
                }
                NodeKind::ArrayExpression { elements }
            }
            Expression::ObjectExpression(object) => {
                let mut properties = Vec::with_capacity(object.properties.len());
                for property in &object.properties {
                    properties.push(match property {
                        ObjectPropertyKind::ObjectProperty(prop) => {
                            let key = Box::new(self.property_key(&prop.key)?);
                            let value = self.boxed(&prop.value)?;
                            let kind = match prop.kind {
                                SourcePropertyKind::Init => PropertyKind::Init,
                                SourcePropertyKind::Get => PropertyKind::Get,
                                SourcePropertyKind::Set => PropertyKind::Set,
                            };
                            self.node(
                                prop.span,
                                NodeKind::Property {
                                    key,
                                    value,
                                    kind,
                                    computed: prop.computed,
                                    shorthand: prop.shorthand,
                                    method: prop.method,
                                },
                            )
                        }
                        ObjectPropertyKind::SpreadProperty(spread) => {
                            let argument = self.boxed(&spread.argument)?;
                            self.node(spread.span, NodeKind::SpreadElement { argument })
                        }
                    });
                }
                NodeKind::ObjectExpression { properties }
            }
            Expression::FunctionExpression(function) => {
                let (id, params, body) = self.function(function)?;
                NodeKind::FunctionExpression { id, params, body }
            }
            Expression::ArrowFunctionExpression(arrow) => {
                let params = self.params(&arrow.params)?;
                let body = match arrow.body.statements.first() {
                    Some(Statement::ExpressionStatement(stmt)) if arrow.expression => {
                        self.expression(&stmt.expression)?
                    }
                    _ => self.function_body(&arrow.body)?,
                };
                NodeKind::ArrowFunctionExpression {
                    params,
                    body: Box::new(body),
                    expression: arrow.expression,
                }
            }
            Expression::UnaryExpression(unary) => NodeKind::UnaryExpression {
                operator: unary.operator.as_str(),
                argument: self.boxed(&unary.argument)?,
            },
            Expression::UpdateExpression(update) => NodeKind::UpdateExpression {
                operator: update.operator.as_str(),
                prefix: update.prefix,
                argument: Box::new(self.simple_target(&update.argument)?),
            },
            Expression::BinaryExpression(binary) => NodeKind::BinaryExpression {
                operator: binary.operator.as_str(),
                left: self.boxed(&binary.left)?,
                right: self.boxed(&binary.right)?,
            },
            Expression::LogicalExpression(logical) => NodeKind::LogicalExpression {
                operator: logical.operator.as_str(),
                left: self.boxed(&logical.left)?,
                right: self.boxed(&logical.right)?,
            },
            Expression::AssignmentExpression(assign) => NodeKind::AssignmentExpression {
                operator: assign.operator.as_str(),
                left: Box::new(self.assignment_target(&assign.left)?),
                right: self.boxed(&assign.right)?,
            },
            Expression::ConditionalExpression(cond) => NodeKind::ConditionalExpression {
                test: self.boxed(&cond.test)?,
                consequent: self.boxed(&cond.consequent)?,
                alternate: self.boxed(&cond.alternate)?,
            },
            Expression::CallExpression(call) => return self.call(call),
            Expression::NewExpression(new) => NodeKind::NewExpression {
                callee: self.boxed(&new.callee)?,
                arguments: self.arguments(&new.arguments)?,
            },
            Expression::StaticMemberExpression(member) => return self.static_member(member),
            Expression::ComputedMemberExpression(member) => return self.computed_member(member),
            Expression::PrivateFieldExpression(member) => NodeKind::MemberExpression {
                object: self.boxed(&member.object)?,
                property: Box::new(self.other(member.field.span, "PrivateIdentifier")),
                computed: false,
                optional: member.optional,
            },
            Expression::ChainExpression(chain) => {
                return match &chain.expression {
                    ChainElement::CallExpression(call) => self.call(call),
                    ChainElement::StaticMemberExpression(member) => self.static_member(member),
                    ChainElement::ComputedMemberExpression(member) => {
                        self.computed_member(member)
                    }
                    other => Ok(self.other(other.span(), "ChainExpression")),
                }
            }
            Expression::ParenthesizedExpression(paren) => {
                return self.expression(&paren.expression);
            }
            Expression::SequenceExpression(sequence) => {
                let mut expressions = Vec::with_capacity(sequence.expressions.len());
                for expr in &sequence.expressions {
                    expressions.push(self.expression(expr)?);
                }
                NodeKind::SequenceExpression { expressions }
            }
            Expression::TaggedTemplateExpression(tagged) => {
                let tag = self.boxed(&tagged.tag)?;
                let raw = self.text(tagged.quasi.span).to_string();
                let quasi = self.node(tagged.quasi.span, NodeKind::TemplateLiteral { raw });
                NodeKind::TaggedTemplateExpression {
                    tag,
                    quasi: Box::new(quasi),
                }
            }
            Expression::AwaitExpression(_) => NodeKind::Other {
                node_type: "AwaitExpression",
            },
            Expression::YieldExpression(_) => NodeKind::Other {
                node_type: "YieldExpression",
            },
            Expression::ClassExpression(_) => NodeKind::Other {
                node_type: "ClassExpression",
            },
            _ => NodeKind::Other {
                node_type: "Expression",
            },
        };
        Ok(self.node(expr.span(), kind))
    }

    fn call(&mut self, call: &CallExpression<'_>) -> Lowered {
        let callee = self.boxed(&call.callee)?;
        let arguments = self.arguments(&call.arguments)?;
        Ok(self.node(
            call.span,
            NodeKind::CallExpression {
                callee,
                arguments,
                optional: call.optional,
            },
        ))
    }

    fn arguments(&mut self, arguments: &[Argument<'_>]) -> Result<Vec<Node>, Error> {
        let mut nodes = Vec::with_capacity(arguments.len());
        for argument in arguments {
            nodes.push(match argument {
                Argument::SpreadElement(spread) => {
                    let argument = self.boxed(&spread.argument)?;
                    self.node(spread.span, NodeKind::SpreadElement { argument })
                }
                other => match other.as_expression() {
                    Some(expr) => self.expression(expr)?,
                    None => self.other(other.span(), "Expression"),
                },
            });
        }
        Ok(nodes)
    }

    fn static_member(&mut self, member: &StaticMemberExpression<'_>) -> Lowered {
        let object = self.boxed(&member.object)?;
        let property = Box::new(self.identifier(member.property.span, &member.property.name));
        Ok(self.node(
            member.span,
            NodeKind::MemberExpression {
                object,
                property,
                computed: false,
                optional: member.optional,
            },
        ))
    }

    fn computed_member(&mut self, member: &ComputedMemberExpression<'_>) -> Lowered {
        let object = self.boxed(&member.object)?;
        let property = self.boxed(&member.expression)?;
        Ok(self.node(
            member.span,
            NodeKind::MemberExpression {
                object,
                property,
                computed: true,
                optional: member.optional,
            },
        ))
    }

    fn property_key(&mut self, key: &PropertyKey<'_>) -> Lowered {
        match key {
            PropertyKey::StaticIdentifier(id) => Ok(self.identifier(id.span, &id.name)),
            PropertyKey::PrivateIdentifier(id) => Ok(self.other(id.span, "PrivateIdentifier")),
            other => match other.as_expression() {
                Some(expr) => self.expression(expr),
                None => Ok(self.other(other.span(), "Expression")),
            },
        }
    }

    fn assignment_target(&mut self, target: &AssignmentTarget<'_>) -> Lowered {
        match target {
            AssignmentTarget::AssignmentTargetIdentifier(id) => {
                Ok(self.identifier(id.span, &id.name))
            }
            AssignmentTarget::StaticMemberExpression(member) => self.static_member(member),
            AssignmentTarget::ComputedMemberExpression(member) => self.computed_member(member),
            AssignmentTarget::ArrayAssignmentTarget(array) => {
                Ok(self.other(array.span, "ArrayPattern"))
            }
            AssignmentTarget::ObjectAssignmentTarget(object) => {
                Ok(self.other(object.span, "ObjectPattern"))
            }
            other => Ok(self.other(other.span(), "Expression")),
        }
    }

    fn simple_target(&mut self, target: &SimpleAssignmentTarget<'_>) -> Lowered {
        match target {
            SimpleAssignmentTarget::AssignmentTargetIdentifier(id) => {
                Ok(self.identifier(id.span, &id.name))
            }
            SimpleAssignmentTarget::StaticMemberExpression(member) => self.static_member(member),
            SimpleAssignmentTarget::ComputedMemberExpression(member) => {
                self.computed_member(member)
            }
            other => Ok(self.other(other.span(), "Expression")),
        }
    }

    // leaves

    fn string_literal(&mut self, lit: &StringLiteral<'_>) -> Node {
        let kind = self.literal(lit.span, LiteralValue::String(lit.value.to_string()));
        self.node(lit.span, kind)
    }

    fn literal(&self, span: oxc_span::Span, value: LiteralValue) -> NodeKind {
        NodeKind::Literal {
            value,
            raw: self.text(span).to_string(),
        }
    }

    fn identifier(&mut self, span: oxc_span::Span, name: &str) -> Node {
        self.node(
            span,
            NodeKind::Identifier {
                name: name.to_string(),
            },
        )
    }

    fn other(&mut self, span: oxc_span::Span, node_type: &'static str) -> Node {
        self.node(span, NodeKind::Other { node_type })
    }

    fn text(&self, span: oxc_span::Span) -> &'s str {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default()
    }

    fn enter(&mut self, span: oxc_span::Span) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::script_with_span(
                format!("script nesting exceeds {MAX_DEPTH} levels"),
                span_of(span),
            ));
        }
        Ok(())
    }

    fn node(&mut self, span: oxc_span::Span, kind: NodeKind) -> Node {
        self.node_at(span_of(span), kind)
    }

    fn node_at(&mut self, span: Span, kind: NodeKind) -> Node {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        Node::new(id, span, kind)
    }
}
