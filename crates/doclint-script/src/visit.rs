//! Tree walking.
//!
//! Implement [`Visitor`] and override the hooks you care about; call the
//! matching `walk_*` function from an override to keep descending.

use crate::ast::{
    ArrowBody, ExprKind, Expression, ForInit, Function, ObjectMember, Program, PropertyKey,
    Statement, StmtKind, VarDecl,
};

/// Visitor over statements and expressions, in source order.
///
/// The `'ast` lifetime lets implementations keep references to the nodes
/// they see.
pub trait Visitor<'ast> {
    fn visit_statement(&mut self, stmt: &'ast Statement) {
        walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &'ast Expression) {
        walk_expression(self, expr);
    }
}

/// Visit every top-level statement of a program.
pub fn walk_program<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, program: &'ast Program) {
    for stmt in &program.body {
        visitor.visit_statement(stmt);
    }
}

pub fn walk_statement<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, stmt: &'ast Statement) {
    match &stmt.kind {
        StmtKind::Expression(expr) | StmtKind::Throw(expr) => visitor.visit_expression(expr),
        StmtKind::VarDecl(decl) => walk_var_decl(visitor, decl),
        StmtKind::Function(function) => walk_function(visitor, function),
        StmtKind::Return(arg) => {
            if let Some(arg) = arg {
                visitor.visit_expression(arg);
            }
        }
        StmtKind::If {
            test,
            consequent,
            alternate,
        } => {
            visitor.visit_expression(test);
            visitor.visit_statement(consequent);
            if let Some(alternate) = alternate {
                visitor.visit_statement(alternate);
            }
        }
        StmtKind::For {
            init,
            test,
            update,
            body,
        } => {
            if let Some(init) = init {
                walk_for_init(visitor, init);
            }
            if let Some(test) = test {
                visitor.visit_expression(test);
            }
            if let Some(update) = update {
                visitor.visit_expression(update);
            }
            visitor.visit_statement(body);
        }
        StmtKind::ForIn {
            left, right, body, ..
        } => {
            walk_for_init(visitor, left);
            visitor.visit_expression(right);
            visitor.visit_statement(body);
        }
        StmtKind::While { test, body } | StmtKind::DoWhile { body, test } => {
            visitor.visit_expression(test);
            visitor.visit_statement(body);
        }
        StmtKind::Block(body) => walk_statements(visitor, body),
        StmtKind::Try {
            block,
            handler,
            finalizer,
        } => {
            walk_statements(visitor, block);
            if let Some(handler) = handler {
                if let Some(param) = &handler.param {
                    visitor.visit_expression(param);
                }
                walk_statements(visitor, &handler.body);
            }
            if let Some(finalizer) = finalizer {
                walk_statements(visitor, finalizer);
            }
        }
        StmtKind::Switch {
            discriminant,
            cases,
        } => {
            visitor.visit_expression(discriminant);
            for case in cases {
                if let Some(test) = &case.test {
                    visitor.visit_expression(test);
                }
                walk_statements(visitor, &case.body);
            }
        }
        StmtKind::Labeled { body, .. } => visitor.visit_statement(body),
        StmtKind::Break(_) | StmtKind::Continue(_) | StmtKind::Empty | StmtKind::Debugger => {}
    }
}

pub fn walk_expression<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    expr: &'ast Expression,
) {
    match &expr.kind {
        ExprKind::Number(_)
        | ExprKind::String(_)
        | ExprKind::Template(_)
        | ExprKind::Regex { .. }
        | ExprKind::Boolean(_)
        | ExprKind::Null
        | ExprKind::Identifier(_)
        | ExprKind::This => {}
        ExprKind::Array(items) => {
            for item in items.iter().flatten() {
                visitor.visit_expression(item);
            }
        }
        ExprKind::Object(members) => {
            for member in members {
                match member {
                    ObjectMember::Property(prop) => {
                        if let PropertyKey::Computed(key) = &prop.key {
                            visitor.visit_expression(key);
                        }
                        visitor.visit_expression(&prop.value);
                    }
                    ObjectMember::Spread(arg) => visitor.visit_expression(arg),
                }
            }
        }
        ExprKind::Function(function) => walk_function(visitor, function),
        ExprKind::Arrow { params, body } => {
            for param in params {
                visitor.visit_expression(param);
            }
            match body {
                ArrowBody::Expression(body) => visitor.visit_expression(body),
                ArrowBody::Block(body) => walk_statements(visitor, body),
            }
        }
        ExprKind::Unary { operand, .. } | ExprKind::Update { operand, .. } => {
            visitor.visit_expression(operand);
        }
        ExprKind::Spread(arg) => visitor.visit_expression(arg),
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expression(left);
            visitor.visit_expression(right);
        }
        ExprKind::Assignment { target, value, .. } => {
            visitor.visit_expression(target);
            visitor.visit_expression(value);
        }
        ExprKind::Ternary {
            condition,
            consequent,
            alternate,
        } => {
            visitor.visit_expression(condition);
            visitor.visit_expression(consequent);
            visitor.visit_expression(alternate);
        }
        ExprKind::Member {
            object,
            property,
            computed,
            ..
        } => {
            visitor.visit_expression(object);
            if *computed {
                visitor.visit_expression(property);
            }
        }
        ExprKind::Call {
            callee, arguments, ..
        }
        | ExprKind::New { callee, arguments } => {
            visitor.visit_expression(callee);
            for arg in arguments {
                visitor.visit_expression(arg);
            }
        }
        ExprKind::Sequence(items) => {
            for item in items {
                visitor.visit_expression(item);
            }
        }
    }
}

fn walk_statements<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, body: &'ast [Statement]) {
    for stmt in body {
        visitor.visit_statement(stmt);
    }
}

fn walk_function<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, function: &'ast Function) {
    for param in &function.params {
        visitor.visit_expression(param);
    }
    walk_statements(visitor, &function.body);
}

fn walk_var_decl<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, decl: &'ast VarDecl) {
    for declarator in &decl.declarations {
        visitor.visit_expression(&declarator.target);
        if let Some(init) = &declarator.init {
            visitor.visit_expression(init);
        }
    }
}

fn walk_for_init<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, init: &'ast ForInit) {
    match init {
        ForInit::VarDecl(decl) => walk_var_decl(visitor, decl),
        ForInit::Expression(expr) => visitor.visit_expression(expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_program;
    use pretty_assertions::assert_eq;

    /// Collects the names of called functions and methods.
    #[derive(Default)]
    struct Calls<'ast> {
        names: Vec<&'ast str>,
    }

    impl<'ast> Visitor<'ast> for Calls<'ast> {
        fn visit_expression(&mut self, expr: &'ast Expression) {
            if let ExprKind::Call { callee, .. } = &expr.kind {
                let name = match &callee.kind {
                    ExprKind::Identifier(name) => Some(name.as_str()),
                    ExprKind::Member { property, .. } => match &property.kind {
                        ExprKind::Identifier(name) => Some(name.as_str()),
                        _ => None,
                    },
                    _ => None,
                };
                self.names.extend(name);
            }
            walk_expression(self, expr);
        }
    }

    #[test]
    fn test_visits_nested_calls_in_source_order() {
        let program = parse_program(
            "$(function () {\n\
               var g = $('#g').kendoGrid({ change: function () { refresh(); } });\n\
               for (var i = 0; i < n(); i++) { try { a() } catch (e) { b(e) } }\n\
               x = y ? c() : [d(), { k: e() }];\n\
             });",
        )
        .unwrap();
        let mut calls = Calls::default();
        walk_program(&mut calls, &program);
        assert_eq!(
            calls.names,
            vec!["$", "kendoGrid", "$", "refresh", "n", "a", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn test_non_computed_member_property_is_not_visited() {
        struct Idents(Vec<String>);
        impl<'ast> Visitor<'ast> for Idents {
            fn visit_expression(&mut self, expr: &'ast Expression) {
                if let ExprKind::Identifier(name) = &expr.kind {
                    self.0.push(name.clone());
                }
                walk_expression(self, expr);
            }
        }

        let program = parse_program("a.b[c];").unwrap();
        let mut idents = Idents(Vec::new());
        walk_program(&mut idents, &program);
        assert_eq!(idents.0, vec!["a", "c"]);
    }
}
