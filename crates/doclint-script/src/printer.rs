//! Canonical printer.
//!
//! Renders trees back to script text in one fixed layout: double-quoted
//! strings, minimal parentheses, `{ a: 1 }` objects and four-space block
//! indentation. Two sources that differ only in formatting print the same.

use crate::ast::{
    ArrowBody, AssignOp, BinaryOp, ExprKind, Expression, ForInit, Function, ObjectMember,
    ObjectProperty, Program, PropertyKey, PropertyKind, Statement, StmtKind, UnaryOp, UpdateOp,
    VarDecl,
};
use crate::lexer::{is_identifier_part, is_identifier_start};

/// Print an expression.
pub fn print(expr: &Expression) -> String {
    Printer::default().expression(expr, 0)
}

/// Print a script, one top-level statement per line.
pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::default();
    program
        .body
        .iter()
        .map(|stmt| printer.statement(stmt))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a number the way script source writes it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        String::from(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// Binding strength, loosest first.
const SEQUENCE: u8 = 1;
const ASSIGN: u8 = 2;
const CONDITIONAL: u8 = 3;
const BINARY_BASE: u8 = 3;
const UNARY: u8 = 15;
const POSTFIX: u8 = 16;
const CALL: u8 = 17;
const MEMBER: u8 = 18;
const PRIMARY: u8 = 20;

fn precedence(expr: &Expression) -> u8 {
    match &expr.kind {
        ExprKind::Sequence(_) => SEQUENCE,
        ExprKind::Assignment { .. } | ExprKind::Arrow { .. } | ExprKind::Spread(_) => ASSIGN,
        ExprKind::Ternary { .. } => CONDITIONAL,
        ExprKind::Binary { op, .. } => BINARY_BASE + binary_precedence(*op),
        ExprKind::Unary { .. } => UNARY,
        ExprKind::Update { prefix: true, .. } => UNARY,
        ExprKind::Update { prefix: false, .. } => POSTFIX,
        ExprKind::Call { .. } => CALL,
        ExprKind::Member { .. } | ExprKind::New { .. } => MEMBER,
        _ => PRIMARY,
    }
}

fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or | BinaryOp::NullishCoalescing => 1,
        BinaryOp::And => 2,
        BinaryOp::BitOr => 3,
        BinaryOp::BitXor => 4,
        BinaryOp::BitAnd => 5,
        BinaryOp::Eq | BinaryOp::Neq | BinaryOp::StrictEq | BinaryOp::StrictNeq => 6,
        BinaryOp::Lt
        | BinaryOp::Gt
        | BinaryOp::Lte
        | BinaryOp::Gte
        | BinaryOp::In
        | BinaryOp::Instanceof => 7,
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => 8,
        BinaryOp::Add | BinaryOp::Sub => 9,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 10,
        BinaryOp::Exp => 11,
    }
}

#[derive(Default)]
struct Printer {
    indent: usize,
}

impl Printer {
    /// Render `expr`, parenthesized if it binds looser than `min`.
    fn expression(&mut self, expr: &Expression, min: u8) -> String {
        let text = self.render(expr);
        if precedence(expr) < min {
            format!("({text})")
        } else {
            text
        }
    }

    fn render(&mut self, expr: &Expression) -> String {
        match &expr.kind {
            ExprKind::Number(n) => format_number(*n),
            ExprKind::String(s) => quote(s),
            ExprKind::Template(raw) => format!("`{raw}`"),
            ExprKind::Regex { pattern, flags } => format!("/{pattern}/{flags}"),
            ExprKind::Boolean(b) => b.to_string(),
            ExprKind::Null => "null".into(),
            ExprKind::Identifier(name) => name.clone(),
            ExprKind::This => "this".into(),
            ExprKind::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Some(item) => self.expression(item, ASSIGN),
                        None => String::new(),
                    })
                    .collect();
                let trailing_hole = matches!(items.last(), Some(None));
                format!("[{}{}]", parts.join(", "), if trailing_hole { "," } else { "" })
            }
            ExprKind::Object(members) => {
                if members.is_empty() {
                    return "{}".into();
                }
                let parts: Vec<String> = members
                    .iter()
                    .map(|member| match member {
                        ObjectMember::Property(prop) => self.property(prop),
                        ObjectMember::Spread(arg) => {
                            format!("...{}", self.expression(arg, ASSIGN))
                        }
                    })
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
            ExprKind::Function(function) => self.function(function),
            ExprKind::Arrow { params, body } => {
                let params = self.params(params);
                let body = match body {
                    ArrowBody::Expression(body) => {
                        let text = self.expression(body, ASSIGN);
                        if matches!(body.kind, ExprKind::Object(_)) {
                            format!("({text})")
                        } else {
                            text
                        }
                    }
                    ArrowBody::Block(body) => self.block(body),
                };
                format!("({params}) => {body}")
            }
            ExprKind::Unary { op, operand } => {
                let operand_text = self.expression(operand, UNARY);
                let op_text = unary_op_to_js(*op);
                let needs_space = op_text.chars().all(char::is_alphabetic)
                    || (matches!(op, UnaryOp::Neg) && operand_text.starts_with('-'))
                    || (matches!(op, UnaryOp::Plus) && operand_text.starts_with('+'));
                if needs_space {
                    format!("{op_text} {operand_text}")
                } else {
                    format!("{op_text}{operand_text}")
                }
            }
            ExprKind::Update {
                op,
                prefix,
                operand,
            } => {
                let op_text = match op {
                    UpdateOp::Increment => "++",
                    UpdateOp::Decrement => "--",
                };
                if *prefix {
                    format!("{op_text}{}", self.expression(operand, UNARY))
                } else {
                    format!("{}{op_text}", self.expression(operand, CALL))
                }
            }
            ExprKind::Binary { left, op, right } => {
                let prec = BINARY_BASE + binary_precedence(*op);
                let (left_min, right_min) = if *op == BinaryOp::Exp {
                    (prec + 1, prec)
                } else {
                    (prec, prec + 1)
                };
                format!(
                    "{} {} {}",
                    self.expression(left, left_min),
                    binary_op_to_js(*op),
                    self.expression(right, right_min),
                )
            }
            ExprKind::Assignment { target, op, value } => format!(
                "{} {} {}",
                self.expression(target, CALL),
                assign_op_to_js(*op),
                self.expression(value, ASSIGN),
            ),
            ExprKind::Ternary {
                condition,
                consequent,
                alternate,
            } => format!(
                "{} ? {} : {}",
                self.expression(condition, CONDITIONAL + 1),
                self.expression(consequent, ASSIGN),
                self.expression(alternate, ASSIGN),
            ),
            ExprKind::Member {
                object,
                property,
                computed,
                optional,
            } => {
                let mut object_text = self.expression(object, CALL);
                if matches!(object.kind, ExprKind::Number(_)) && !computed {
                    object_text = format!("({object_text})");
                }
                match (*computed, *optional) {
                    (true, true) => format!("{object_text}?.[{}]", self.expression(property, 0)),
                    (true, false) => format!("{object_text}[{}]", self.expression(property, 0)),
                    (false, true) => format!("{object_text}?.{}", self.render(property)),
                    (false, false) => format!("{object_text}.{}", self.render(property)),
                }
            }
            ExprKind::Call {
                callee,
                arguments,
                optional,
            } => format!(
                "{}{}({})",
                self.expression(callee, CALL),
                if *optional { "?." } else { "" },
                self.arguments(arguments),
            ),
            ExprKind::New { callee, arguments } => format!(
                "new {}({})",
                self.expression(callee, MEMBER),
                self.arguments(arguments),
            ),
            ExprKind::Sequence(items) => items
                .iter()
                .map(|item| self.expression(item, ASSIGN))
                .collect::<Vec<_>>()
                .join(", "),
            ExprKind::Spread(arg) => format!("...{}", self.expression(arg, ASSIGN)),
        }
    }

    fn arguments(&mut self, arguments: &[Expression]) -> String {
        arguments
            .iter()
            .map(|arg| self.expression(arg, ASSIGN))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn params(&mut self, params: &[Expression]) -> String {
        self.arguments(params)
    }

    fn property(&mut self, prop: &ObjectProperty) -> String {
        let key = self.property_key(&prop.key);
        match prop.kind {
            PropertyKind::Init if prop.shorthand => match &prop.value.kind {
                ExprKind::Assignment { value, .. } => {
                    format!("{key} = {}", self.expression(value, ASSIGN))
                }
                _ => key,
            },
            PropertyKind::Init => format!("{key}: {}", self.expression(&prop.value, ASSIGN)),
            PropertyKind::Get | PropertyKind::Set | PropertyKind::Method => {
                let prefix = match prop.kind {
                    PropertyKind::Get => "get ",
                    PropertyKind::Set => "set ",
                    _ => "",
                };
                match &prop.value.kind {
                    ExprKind::Function(function) => format!(
                        "{prefix}{key}({}) {}",
                        self.params(&function.params),
                        self.block(&function.body),
                    ),
                    _ => format!("{key}: {}", self.expression(&prop.value, ASSIGN)),
                }
            }
        }
    }

    fn property_key(&mut self, key: &PropertyKey) -> String {
        match key {
            PropertyKey::Identifier(name) => name.clone(),
            PropertyKey::String(s) if is_identifier_name(s) => s.clone(),
            PropertyKey::String(s) => quote(s),
            PropertyKey::Number(n) => format_number(*n),
            PropertyKey::Computed(expr) => format!("[{}]", self.expression(expr, ASSIGN)),
        }
    }

    fn function(&mut self, function: &Function) -> String {
        let name = function
            .name
            .as_ref()
            .map(|n| format!(" {n}"))
            .unwrap_or_default();
        format!(
            "function{name}({}) {}",
            self.params(&function.params),
            self.block(&function.body),
        )
    }

    fn block(&mut self, body: &[Statement]) -> String {
        if body.is_empty() {
            return "{}".into();
        }
        self.indent += 1;
        let lines: Vec<String> = body
            .iter()
            .map(|stmt| format!("{}{}", self.pad(), self.statement(stmt)))
            .collect();
        self.indent -= 1;
        format!("{{\n{}\n{}}}", lines.join("\n"), self.pad())
    }

    fn pad(&self) -> String {
        "    ".repeat(self.indent)
    }

    fn statement(&mut self, stmt: &Statement) -> String {
        match &stmt.kind {
            StmtKind::Expression(expr) => {
                let text = self.expression(expr, 0);
                if text.starts_with('{') || text.starts_with("function") {
                    format!("({text});")
                } else {
                    format!("{text};")
                }
            }
            StmtKind::VarDecl(decl) => format!("{};", self.var_decl(decl)),
            StmtKind::Function(function) => self.function(function),
            StmtKind::Return(None) => "return;".into(),
            StmtKind::Return(Some(arg)) => format!("return {};", self.expression(arg, 0)),
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                let mut text = format!(
                    "if ({}) {}",
                    self.expression(test, 0),
                    self.statement(consequent)
                );
                if let Some(alternate) = alternate {
                    text.push_str(" else ");
                    text.push_str(&self.statement(alternate));
                }
                text
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                let init = init
                    .as_ref()
                    .map(|init| self.for_init(init))
                    .unwrap_or_default();
                let test = test
                    .as_ref()
                    .map(|test| format!(" {}", self.expression(test, 0)))
                    .unwrap_or_default();
                let update = update
                    .as_ref()
                    .map(|update| format!(" {}", self.expression(update, 0)))
                    .unwrap_or_default();
                format!("for ({init};{test};{update}) {}", self.statement(body))
            }
            StmtKind::ForIn {
                left,
                right,
                body,
                of,
            } => format!(
                "for ({} {} {}) {}",
                self.for_init(left),
                if *of { "of" } else { "in" },
                self.expression(right, 0),
                self.statement(body),
            ),
            StmtKind::While { test, body } => {
                format!("while ({}) {}", self.expression(test, 0), self.statement(body))
            }
            StmtKind::DoWhile { body, test } => {
                format!("do {} while ({});", self.statement(body), self.expression(test, 0))
            }
            StmtKind::Block(body) => self.block(body),
            StmtKind::Break(label) => jump("break", label.as_deref()),
            StmtKind::Continue(label) => jump("continue", label.as_deref()),
            StmtKind::Throw(arg) => format!("throw {};", self.expression(arg, 0)),
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                let mut text = format!("try {}", self.block(block));
                if let Some(handler) = handler {
                    text.push_str(" catch ");
                    if let Some(param) = &handler.param {
                        text.push_str(&format!("({}) ", self.expression(param, 0)));
                    }
                    text.push_str(&self.block(&handler.body));
                }
                if let Some(finalizer) = finalizer {
                    text.push_str(" finally ");
                    text.push_str(&self.block(finalizer));
                }
                text
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                let head = format!("switch ({}) {{", self.expression(discriminant, 0));
                self.indent += 1;
                let mut lines = vec![head];
                for case in cases {
                    let label = match &case.test {
                        Some(test) => format!("case {}:", self.expression(test, 0)),
                        None => "default:".into(),
                    };
                    lines.push(format!("{}{label}", self.pad()));
                    self.indent += 1;
                    for stmt in &case.body {
                        let text = self.statement(stmt);
                        lines.push(format!("{}{text}", self.pad()));
                    }
                    self.indent -= 1;
                }
                self.indent -= 1;
                lines.push(format!("{}}}", self.pad()));
                lines.join("\n")
            }
            StmtKind::Labeled { label, body } => format!("{label}: {}", self.statement(body)),
            StmtKind::Empty => ";".into(),
            StmtKind::Debugger => "debugger;".into(),
        }
    }

    fn var_decl(&mut self, decl: &VarDecl) -> String {
        let parts: Vec<String> = decl
            .declarations
            .iter()
            .map(|d| match &d.init {
                Some(init) => format!(
                    "{} = {}",
                    self.expression(&d.target, 0),
                    self.expression(init, ASSIGN)
                ),
                None => self.expression(&d.target, 0),
            })
            .collect();
        format!("{} {}", decl.kind.as_str(), parts.join(", "))
    }

    fn for_init(&mut self, init: &ForInit) -> String {
        match init {
            ForInit::VarDecl(decl) => self.var_decl(decl),
            ForInit::Expression(expr) => self.expression(expr, 0),
        }
    }
}

fn jump(keyword: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{keyword} {label};"),
        None => format!("{keyword};"),
    }
}

/// Double-quoted string literal.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_identifier_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_identifier_start) && chars.all(is_identifier_part)
}

fn binary_op_to_js(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Exp => "**",
        BinaryOp::Eq => "==",
        BinaryOp::Neq => "!=",
        BinaryOp::StrictEq => "===",
        BinaryOp::StrictNeq => "!==",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::Lte => "<=",
        BinaryOp::Gte => ">=",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
        BinaryOp::UShr => ">>>",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::NullishCoalescing => "??",
        BinaryOp::In => "in",
        BinaryOp::Instanceof => "instanceof",
    }
}

fn unary_op_to_js(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Not => "!",
        UnaryOp::Neg => "-",
        UnaryOp::Plus => "+",
        UnaryOp::BitNot => "~",
        UnaryOp::Typeof => "typeof",
        UnaryOp::Void => "void",
        UnaryOp::Delete => "delete",
    }
}

fn assign_op_to_js(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
        AssignOp::ModAssign => "%=",
        AssignOp::ExpAssign => "**=",
        AssignOp::ShlAssign => "<<=",
        AssignOp::ShrAssign => ">>=",
        AssignOp::UShrAssign => ">>>=",
        AssignOp::BitAndAssign => "&=",
        AssignOp::BitOrAssign => "|=",
        AssignOp::BitXorAssign => "^=",
        AssignOp::AndAssign => "&&=",
        AssignOp::OrAssign => "||=",
        AssignOp::NullishAssign => "??=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_expression, parse_program};
    use pretty_assertions::assert_eq;

    fn reprint(source: &str) -> String {
        print(&parse_expression(source).unwrap())
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_strings_are_double_quoted() {
        assert_eq!(reprint("'none'"), "\"none\"");
        assert_eq!(reprint(r#"'say "hi"\n'"#), r#""say \"hi\"\n""#);
    }

    #[test]
    fn test_formatting_differences_vanish() {
        assert_eq!(reprint("{a:1,'b':[1,2 ,3]}"), reprint("{ a: 1, b: [1, 2, 3] }"));
        assert_eq!(reprint("{a:1,'b':[1,2 ,3]}"), "{ a: 1, b: [1, 2, 3] }");
        assert_eq!(reprint("0x10"), "16");
        assert_eq!(reprint("{ 'page-size': 10 }"), "{ \"page-size\": 10 }");
    }

    #[test]
    fn test_minimal_parentheses() {
        assert_eq!(reprint("(a + b) * c"), "(a + b) * c");
        assert_eq!(reprint("a + (b * c)"), "a + b * c");
        assert_eq!(reprint("a - (b - c)"), "a - (b - c)");
        assert_eq!(reprint("(a ** b) ** c"), "(a ** b) ** c");
        assert_eq!(reprint("- (-x)"), "- -x");
        assert_eq!(reprint("new (f())()"), "new (f())()");
        assert_eq!(
            print_program(&parse_program("(function () {})()").unwrap()),
            "(function() {}());"
        );
    }

    #[test]
    fn test_functions_and_arrows() {
        assert_eq!(reprint("x => ({ a: x })"), "(x) => ({ a: x })");
        assert_eq!(
            reprint("function (e) { e.preventDefault() }"),
            "function(e) {\n    e.preventDefault();\n}"
        );
    }

    #[test]
    fn test_members_and_calls() {
        assert_eq!(
            reprint("$( '#grid' ).kendoGrid( { sortable : true } )"),
            "$(\"#grid\").kendoGrid({ sortable: true })"
        );
        assert_eq!(reprint("a?.[0]?.b"), "a?.[0]?.b");
    }

    #[test]
    fn test_print_program() {
        let program = parse_program("var a=1\nif(a){b()}else c()\nfor(var i=0;i<2;i++);").unwrap();
        assert_eq!(
            print_program(&program),
            "var a = 1;\nif (a) {\n    b();\n} else c();\nfor (var i = 0; i < 2; i++) ;"
        );
    }

    #[test]
    fn test_print_is_stable() {
        let source = "switch (x) { case 1: y = { a: [1, , 2] }; break; default: z() }";
        let once = print_program(&parse_program(source).unwrap());
        let twice = print_program(&parse_program(&once).unwrap());
        assert_eq!(once, twice);
    }
}
