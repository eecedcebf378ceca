//! Script parser.
//!
//! Recursive descent over the token stream from [`crate::lexer`], with
//! precedence climbing for binary operators. Automatic semicolon insertion
//! follows the usual rule: a statement may end at a line break, before `}`
//! or at end of input.

use doclint_markup::{Position, Span};

use crate::ast::{
    ArrowBody, AssignOp, BinaryOp, CatchClause, ExprKind, Expression, ForInit, Function,
    ObjectMember, ObjectProperty, Program, PropertyKey, PropertyKind, Statement, StmtKind,
    SwitchCase, UnaryOp, UpdateOp, VarDecl, VarDeclarator, VarKind,
};
use crate::lexer::{Lexer, Token, TokenKind, TokenValue};
use crate::SyntaxError;

/// Words that cannot be used as identifiers.
const RESERVED: &[&str] = &[
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "export",
    "extends",
    "finally",
    "for",
    "function",
    "if",
    "import",
    "in",
    "instanceof",
    "new",
    "return",
    "super",
    "switch",
    "this",
    "throw",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
];

fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

/// Nesting budget shared by recursive descent and operator chains. It
/// bounds both the parser's stack use and the depth of the tree it builds.
const NESTING_BUDGET: usize = 1024;
/// Spent on every recursive descent (statement, assignment, operand).
const NEST_COST: usize = 8;
/// Spent on each link of an operator, member or call chain.
const CHAIN_COST: usize = 2;

/// Script parser.
pub struct Parser<'a> {
    source: &'a str,
    origin: Position,
    tokens: Vec<Token>,
    pos: usize,
    /// `in` is not a binary operator inside a `for` head.
    no_in: bool,
    prev_end: Position,
    /// Nesting budget spent so far.
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Tokenize `source` and create a parser over it.
    pub fn new(source: &'a str) -> Result<Self, SyntaxError> {
        Self::with_origin(source, Position::START)
    }

    /// Like [`Parser::new`], for text that starts at `origin` in an
    /// enclosing document. Every span and error position is reported in
    /// the enclosing document's coordinates.
    pub fn with_origin(source: &'a str, origin: Position) -> Result<Self, SyntaxError> {
        Ok(Self {
            source,
            origin,
            tokens: Lexer::tokenize_at(source, origin)?,
            pos: 0,
            no_in: false,
            prev_end: origin,
            depth: 0,
        })
    }

    /// Parse a complete script.
    pub fn parse_program(source: &str) -> Result<Program, SyntaxError> {
        let mut parser = Parser::new(source)?;
        let mut body = Vec::new();
        while !parser.is_at_end() {
            body.push(parser.parse_statement()?);
        }
        Ok(Program {
            body,
            span: Span::new(Position::START, parser.peek().span.end),
        })
    }

    /// Parse a single expression; anything after it is an error.
    pub fn parse_expression(source: &str) -> Result<Expression, SyntaxError> {
        Self::parse_expression_at(source, Position::START)
    }

    /// Parse a single expression found at `origin` in an enclosing document.
    pub fn parse_expression_at(source: &str, origin: Position) -> Result<Expression, SyntaxError> {
        let mut parser = Parser::with_origin(source, origin)?;
        let expr = parser.parse_sequence()?;
        if !parser.is_at_end() {
            return Err(parser.unexpected());
        }
        Ok(expr)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        self.nest(NEST_COST)?;
        let start = self.start();
        let kind = match self.peek_kind() {
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::Semicolon => {
                self.advance();
                StmtKind::Empty
            }
            TokenKind::Identifier => self.parse_word_statement()?,
            _ => self.parse_expression_statement()?,
        };
        self.leave(NEST_COST);
        Ok(Statement {
            kind,
            span: self.finish(start),
        })
    }

    /// Statements introduced by a keyword, labels, and expression
    /// statements that start with an identifier.
    fn parse_word_statement(&mut self) -> Result<StmtKind, SyntaxError> {
        let word = self.peek().word().unwrap_or_default().to_string();
        let next_kind = self.peek_at(1).kind;
        let async_function =
            self.peek_at(1).is_word("function") && !self.peek_at(1).newline_before;

        let kind = match word.as_str() {
            "var" | "const" => self.parse_var_statement()?,
            "let" if self.is_var_decl_start() => self.parse_var_statement()?,
            "function" => {
                self.advance();
                StmtKind::Function(self.parse_function_rest(true)?)
            }
            "async" if async_function => {
                self.advance();
                self.advance();
                StmtKind::Function(self.parse_function_rest(true)?)
            }
            "if" => {
                self.advance();
                let test = self.parse_paren_expression()?;
                let consequent = Box::new(self.parse_statement()?);
                let alternate = if self.eat_word("else") {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                StmtKind::If {
                    test,
                    consequent,
                    alternate,
                }
            }
            "for" => self.parse_for()?,
            "while" => {
                self.advance();
                let test = self.parse_paren_expression()?;
                let body = Box::new(self.parse_statement()?);
                StmtKind::While { test, body }
            }
            "do" => {
                self.advance();
                let body = Box::new(self.parse_statement()?);
                self.expect_word("while")?;
                let test = self.parse_paren_expression()?;
                self.eat(TokenKind::Semicolon);
                StmtKind::DoWhile { body, test }
            }
            "return" => {
                self.advance();
                let argument = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_sequence()?)
                };
                self.consume_semicolon()?;
                StmtKind::Return(argument)
            }
            "break" | "continue" => {
                self.advance();
                let label = match self.peek().word() {
                    Some(label) if !self.peek().newline_before && !is_reserved(label) => {
                        let label = label.to_string();
                        self.advance();
                        Some(label)
                    }
                    _ => None,
                };
                self.consume_semicolon()?;
                if word == "break" {
                    StmtKind::Break(label)
                } else {
                    StmtKind::Continue(label)
                }
            }
            "throw" => {
                self.advance();
                if self.peek().newline_before {
                    return Err(SyntaxError::new("Illegal newline after throw", self.start()));
                }
                let argument = self.parse_sequence()?;
                self.consume_semicolon()?;
                StmtKind::Throw(argument)
            }
            "try" => self.parse_try()?,
            "switch" => self.parse_switch()?,
            "debugger" => {
                self.advance();
                self.consume_semicolon()?;
                StmtKind::Debugger
            }
            _ if next_kind == TokenKind::Colon && !is_reserved(&word) => {
                self.advance();
                self.advance();
                StmtKind::Labeled {
                    label: word.clone(),
                    body: Box::new(self.parse_statement()?),
                }
            }
            _ => self.parse_expression_statement()?,
        };
        Ok(kind)
    }

    fn parse_expression_statement(&mut self) -> Result<StmtKind, SyntaxError> {
        let expr = self.parse_sequence()?;
        self.consume_semicolon()?;
        Ok(StmtKind::Expression(expr))
    }

    fn parse_var_statement(&mut self) -> Result<StmtKind, SyntaxError> {
        let decl = self.parse_var_decl()?;
        self.consume_semicolon()?;
        Ok(StmtKind::VarDecl(decl))
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl, SyntaxError> {
        let kind = match self.peek().word() {
            Some("let") => VarKind::Let,
            Some("const") => VarKind::Const,
            _ => VarKind::Var,
        };
        self.advance();

        let mut declarations = Vec::new();
        loop {
            let target = self.parse_binding_target()?;
            let init = if self.eat(TokenKind::Eq) {
                Some(self.parse_assign()?)
            } else {
                None
            };
            declarations.push(VarDeclarator { target, init });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(VarDecl { kind, declarations })
    }

    fn is_var_decl_start(&self) -> bool {
        match self.peek().word() {
            Some("var" | "const") => true,
            Some("let") => matches!(
                self.peek_at(1).kind,
                TokenKind::Identifier | TokenKind::LBracket | TokenKind::LBrace
            ),
            _ => false,
        }
    }

    fn parse_for(&mut self) -> Result<StmtKind, SyntaxError> {
        self.advance(); // consume `for`
        self.expect(TokenKind::LParen)?;

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else {
            self.no_in = true;
            let init = if self.is_var_decl_start() {
                self.parse_var_decl().map(ForInit::VarDecl)
            } else {
                self.parse_sequence().map(ForInit::Expression)
            };
            self.no_in = false;
            Some(init?)
        };

        let init = match init {
            Some(left) if self.check_word("in") || self.check_word("of") => {
                let of = self.check_word("of");
                self.advance();
                let right = if of {
                    self.parse_assign()?
                } else {
                    self.parse_sequence()?
                };
                self.expect(TokenKind::RParen)?;
                let body = Box::new(self.parse_statement()?);
                return Ok(StmtKind::ForIn {
                    left,
                    right,
                    body,
                    of,
                });
            }
            init => init,
        };

        self.expect(TokenKind::Semicolon)?;
        let test = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_sequence()?)
        };
        self.expect(TokenKind::Semicolon)?;
        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_sequence()?)
        };
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);

        Ok(StmtKind::For {
            init,
            test,
            update,
            body,
        })
    }

    fn parse_try(&mut self) -> Result<StmtKind, SyntaxError> {
        self.advance(); // consume `try`
        let block = self.parse_block()?;

        let handler = if self.eat_word("catch") {
            let param = if self.eat(TokenKind::LParen) {
                let param = self.parse_binding_target()?;
                self.expect(TokenKind::RParen)?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.eat_word("finally") {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(SyntaxError::new(
                "Missing catch or finally clause",
                self.start(),
            ));
        }

        Ok(StmtKind::Try {
            block,
            handler,
            finalizer,
        })
    }

    fn parse_switch(&mut self) -> Result<StmtKind, SyntaxError> {
        self.advance(); // consume `switch`
        let discriminant = self.parse_paren_expression()?;
        self.expect(TokenKind::LBrace)?;

        let mut cases = Vec::new();
        while !self.eat(TokenKind::RBrace) {
            let test = if self.eat_word("case") {
                Some(self.parse_sequence()?)
            } else if self.eat_word("default") {
                None
            } else {
                return Err(self.unexpected());
            };
            self.expect(TokenKind::Colon)?;

            let mut body = Vec::new();
            while !self.check(TokenKind::RBrace)
                && !self.check_word("case")
                && !self.check_word("default")
            {
                if self.is_at_end() {
                    return Err(self.unexpected());
                }
                body.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, body });
        }

        Ok(StmtKind::Switch {
            discriminant,
            cases,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn parse_paren_expression(&mut self) -> Result<Expression, SyntaxError> {
        self.expect(TokenKind::LParen)?;
        let expr = self.allow_in(Self::parse_sequence)?;
        self.expect(TokenKind::RParen)?;
        Ok(expr)
    }

    // =========================================================================
    // Functions and bindings
    // =========================================================================

    /// Everything after the `function` keyword.
    fn parse_function_rest(&mut self, require_name: bool) -> Result<Function, SyntaxError> {
        self.eat(TokenKind::Star);
        let name = if self.check(TokenKind::Identifier) {
            match self.parse_identifier()?.kind {
                ExprKind::Identifier(name) => Some(name),
                _ => None,
            }
        } else if require_name {
            return Err(self.unexpected());
        } else {
            None
        };
        let params = self.parse_params()?;
        let body = self.parse_function_body()?;
        Ok(Function { name, params, body })
    }

    fn parse_params(&mut self) -> Result<Vec<Expression>, SyntaxError> {
        self.expect(TokenKind::LParen)?;
        let params = self.allow_in(|p| {
            let mut params = Vec::new();
            while !p.check(TokenKind::RParen) {
                let start = p.start();
                let param = if p.eat(TokenKind::Ellipsis) {
                    let target = p.parse_binding_target()?;
                    Expression {
                        kind: ExprKind::Spread(Box::new(target)),
                        span: p.finish(start),
                    }
                } else {
                    p.parse_binding_element()?
                };
                params.push(param);
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            Ok(params)
        })?;
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_function_body(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        self.allow_in(Self::parse_block)
    }

    /// A binding target with an optional `= default`.
    fn parse_binding_element(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        let target = self.parse_binding_target()?;
        if !self.eat(TokenKind::Eq) {
            return Ok(target);
        }
        let value = self.parse_assign()?;
        Ok(Expression {
            kind: ExprKind::Assignment {
                target: Box::new(target),
                op: AssignOp::Assign,
                value: Box::new(value),
            },
            span: self.finish(start),
        })
    }

    fn parse_binding_target(&mut self) -> Result<Expression, SyntaxError> {
        match self.peek_kind() {
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LBracket => self.parse_array(),
            _ => self.parse_identifier(),
        }
    }

    fn parse_identifier(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        match self.peek().word() {
            Some(word) if !is_reserved(word) => {
                let name = word.to_string();
                self.advance();
                Ok(Expression {
                    kind: ExprKind::Identifier(name),
                    span: self.finish(start),
                })
            }
            _ => Err(self.unexpected()),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_sequence(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        let first = self.parse_assign()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            items.push(self.parse_assign()?);
        }
        Ok(Expression {
            kind: ExprKind::Sequence(items),
            span: self.finish(start),
        })
    }

    fn parse_assign(&mut self) -> Result<Expression, SyntaxError> {
        self.nest(NEST_COST)?;
        if let Some(arrow) = self.try_parse_arrow()? {
            self.leave(NEST_COST);
            return Ok(arrow);
        }

        let start = self.start();
        let left = self.parse_conditional()?;
        let Some(op) = assign_op(self.peek_kind()) else {
            self.leave(NEST_COST);
            return Ok(left);
        };

        let is_target = match &left.kind {
            ExprKind::Identifier(_) | ExprKind::Member { .. } => true,
            ExprKind::Object(_) | ExprKind::Array(_) => op == AssignOp::Assign,
            _ => false,
        };
        if !is_target {
            return Err(SyntaxError::new("Assigning to rvalue", left.span.start));
        }

        self.advance();
        let value = self.parse_assign()?;
        self.leave(NEST_COST);
        Ok(Expression {
            kind: ExprKind::Assignment {
                target: Box::new(left),
                op,
                value: Box::new(value),
            },
            span: self.finish(start),
        })
    }

    /// Parse an arrow function if one starts here.
    fn try_parse_arrow(&mut self) -> Result<Option<Expression>, SyntaxError> {
        let start = self.start();
        let is_async = self.peek().is_word("async")
            && !self.peek_at(1).newline_before
            && self.arrow_ahead(1);
        if !is_async && !self.arrow_ahead(0) {
            return Ok(None);
        }
        if is_async {
            self.advance();
        }

        let params = if self.check(TokenKind::Identifier) {
            vec![self.parse_identifier()?]
        } else {
            self.parse_params()?
        };
        self.expect(TokenKind::Arrow)?;

        let body = if self.check(TokenKind::LBrace) {
            ArrowBody::Block(self.parse_function_body()?)
        } else {
            ArrowBody::Expression(Box::new(self.parse_assign()?))
        };

        Ok(Some(Expression {
            kind: ExprKind::Arrow { params, body },
            span: self.finish(start),
        }))
    }

    /// `x =>` or `( ... ) =>` starting `at` tokens ahead.
    fn arrow_ahead(&self, at: usize) -> bool {
        let close = match self.peek_at(at).kind {
            TokenKind::Identifier => at,
            TokenKind::LParen => match self.matching_close(at) {
                Some(close) => close,
                None => return false,
            },
            _ => return false,
        };
        let arrow = self.peek_at(close + 1);
        arrow.kind == TokenKind::Arrow && !arrow.newline_before
    }

    /// Index (relative to the cursor) of the bracket closing the one at `at`.
    fn matching_close(&self, at: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = at;
        loop {
            match self.peek_at(i).kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
            i += 1;
        }
    }

    fn parse_conditional(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        let condition = self.parse_binary(0)?;
        if !self.eat(TokenKind::Question) {
            return Ok(condition);
        }

        let consequent = self.allow_in(Self::parse_assign)?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.parse_assign()?;
        Ok(Expression {
            kind: ExprKind::Ternary {
                condition: Box::new(condition),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            span: self.finish(start),
        })
    }

    /// Precedence climbing; `min_prec` is the precedence of the operator
    /// to the left.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expression, SyntaxError> {
        self.nest(NEST_COST)?;
        let start = self.start();
        let mut left = self.parse_unary()?;

        let mut links = 0;
        while let Some((op, prec)) = self.binary_op() {
            if prec <= min_prec {
                break;
            }
            self.nest(CHAIN_COST)?;
            links += 1;
            self.advance();
            // `**` is right-associative.
            let right = if op == BinaryOp::Exp {
                self.parse_binary(prec - 1)?
            } else {
                self.parse_binary(prec)?
            };
            left = Expression {
                kind: ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span: self.finish(start),
            };
        }

        self.leave(NEST_COST + links * CHAIN_COST);
        Ok(left)
    }

    fn binary_op(&self) -> Option<(BinaryOp, u8)> {
        let op = match self.peek_kind() {
            TokenKind::Or => (BinaryOp::Or, 1),
            TokenKind::QuestionQuestion => (BinaryOp::NullishCoalescing, 1),
            TokenKind::And => (BinaryOp::And, 2),
            TokenKind::Pipe => (BinaryOp::BitOr, 3),
            TokenKind::Caret => (BinaryOp::BitXor, 4),
            TokenKind::Amp => (BinaryOp::BitAnd, 5),
            TokenKind::EqEq => (BinaryOp::Eq, 6),
            TokenKind::NotEq => (BinaryOp::Neq, 6),
            TokenKind::StrictEq => (BinaryOp::StrictEq, 6),
            TokenKind::StrictNotEq => (BinaryOp::StrictNeq, 6),
            TokenKind::Lt => (BinaryOp::Lt, 7),
            TokenKind::Gt => (BinaryOp::Gt, 7),
            TokenKind::Lte => (BinaryOp::Lte, 7),
            TokenKind::Gte => (BinaryOp::Gte, 7),
            TokenKind::Identifier if self.check_word("instanceof") => (BinaryOp::Instanceof, 7),
            TokenKind::Identifier if self.check_word("in") && !self.no_in => (BinaryOp::In, 7),
            TokenKind::Shl => (BinaryOp::Shl, 8),
            TokenKind::Shr => (BinaryOp::Shr, 8),
            TokenKind::UShr => (BinaryOp::UShr, 8),
            TokenKind::Plus => (BinaryOp::Add, 9),
            TokenKind::Minus => (BinaryOp::Sub, 9),
            TokenKind::Star => (BinaryOp::Mul, 10),
            TokenKind::Slash => (BinaryOp::Div, 10),
            TokenKind::Percent => (BinaryOp::Mod, 10),
            TokenKind::StarStar => (BinaryOp::Exp, 11),
            _ => return None,
        };
        Some(op)
    }

    fn parse_unary(&mut self) -> Result<Expression, SyntaxError> {
        self.nest(NEST_COST)?;
        let start = self.start();
        let op = match self.peek_kind() {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Identifier => match self.peek().word() {
                Some("typeof") => Some(UnaryOp::Typeof),
                Some("void") => Some(UnaryOp::Void),
                Some("delete") => Some(UnaryOp::Delete),
                _ => None,
            },
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            self.leave(NEST_COST);
            return Ok(Expression {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span: self.finish(start),
            });
        }

        let update = match self.peek_kind() {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance();
            let operand = self.parse_unary()?;
            self.leave(NEST_COST);
            return Ok(Expression {
                kind: ExprKind::Update {
                    op,
                    prefix: true,
                    operand: Box::new(operand),
                },
                span: self.finish(start),
            });
        }

        let expr = self.parse_postfix()?;
        self.leave(NEST_COST);
        Ok(expr)
    }

    fn parse_postfix(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        let expr = self.parse_call_member()?;

        let op = match self.peek_kind() {
            TokenKind::PlusPlus => UpdateOp::Increment,
            TokenKind::MinusMinus => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        if self.peek().newline_before {
            return Ok(expr);
        }
        self.advance();
        Ok(Expression {
            kind: ExprKind::Update {
                op,
                prefix: false,
                operand: Box::new(expr),
            },
            span: self.finish(start),
        })
    }

    fn parse_call_member(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        let mut expr = if self.check_word("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        let mut links = 0;
        loop {
            if matches!(
                self.peek_kind(),
                TokenKind::Dot | TokenKind::OptionalChain | TokenKind::LBracket | TokenKind::LParen
            ) {
                self.nest(CHAIN_COST)?;
                links += 1;
            }
            let kind = match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_property_name()?;
                    member(expr, property, false, false)
                }
                TokenKind::OptionalChain => {
                    self.advance();
                    match self.peek_kind() {
                        TokenKind::LParen => ExprKind::Call {
                            callee: Box::new(expr),
                            arguments: self.parse_arguments()?,
                            optional: true,
                        },
                        TokenKind::LBracket => {
                            self.advance();
                            let property = self.allow_in(Self::parse_sequence)?;
                            self.expect(TokenKind::RBracket)?;
                            member(expr, property, true, true)
                        }
                        _ => {
                            let property = self.parse_property_name()?;
                            member(expr, property, false, true)
                        }
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let property = self.allow_in(Self::parse_sequence)?;
                    self.expect(TokenKind::RBracket)?;
                    member(expr, property, true, false)
                }
                TokenKind::LParen => ExprKind::Call {
                    callee: Box::new(expr),
                    arguments: self.parse_arguments()?,
                    optional: false,
                },
                _ => break,
            };
            expr = Expression {
                kind,
                span: self.finish(start),
            };
        }

        self.leave(links * CHAIN_COST);
        Ok(expr)
    }

    fn parse_new(&mut self) -> Result<Expression, SyntaxError> {
        self.nest(NEST_COST)?;
        let start = self.start();
        self.advance(); // consume `new`

        // `new.target`
        if self.eat(TokenKind::Dot) {
            let object = Expression {
                kind: ExprKind::Identifier("new".into()),
                span: self.finish(start),
            };
            let property = self.parse_property_name()?;
            self.leave(NEST_COST);
            return Ok(Expression {
                kind: member(object, property, false, false),
                span: self.finish(start),
            });
        }

        let mut callee = if self.check_word("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        let mut links = 0;
        loop {
            if matches!(self.peek_kind(), TokenKind::Dot | TokenKind::LBracket) {
                self.nest(CHAIN_COST)?;
                links += 1;
            }
            let kind = match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_property_name()?;
                    member(callee, property, false, false)
                }
                TokenKind::LBracket => {
                    self.advance();
                    let property = self.allow_in(Self::parse_sequence)?;
                    self.expect(TokenKind::RBracket)?;
                    member(callee, property, true, false)
                }
                _ => break,
            };
            callee = Expression {
                kind,
                span: self.finish(start),
            };
        }

        let arguments = if self.check(TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        self.leave(NEST_COST + links * CHAIN_COST);
        Ok(Expression {
            kind: ExprKind::New {
                callee: Box::new(callee),
                arguments,
            },
            span: self.finish(start),
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, SyntaxError> {
        self.expect(TokenKind::LParen)?;
        let arguments = self.allow_in(|p| {
            let mut arguments = Vec::new();
            while !p.check(TokenKind::RParen) {
                arguments.push(p.parse_spread_or_assign()?);
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            Ok(arguments)
        })?;
        self.expect(TokenKind::RParen)?;
        Ok(arguments)
    }

    fn parse_spread_or_assign(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        if !self.eat(TokenKind::Ellipsis) {
            return self.parse_assign();
        }
        let argument = self.parse_assign()?;
        Ok(Expression {
            kind: ExprKind::Spread(Box::new(argument)),
            span: self.finish(start),
        })
    }

    /// The name after `.`; keywords are allowed here.
    fn parse_property_name(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        let name = match &self.peek().value {
            TokenValue::Identifier(name) => name.clone(),
            TokenValue::Boolean(b) => b.to_string(),
            TokenValue::None if self.check(TokenKind::Null) => "null".to_string(),
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(Expression {
            kind: ExprKind::Identifier(name),
            span: self.finish(start),
        })
    }

    fn parse_primary(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        let token = self.peek().clone();

        let kind = match token.value {
            TokenValue::Number(n) => ExprKind::Number(n),
            TokenValue::String(s) => ExprKind::String(s),
            TokenValue::Template(raw) => ExprKind::Template(raw),
            TokenValue::Regex { pattern, flags } => ExprKind::Regex { pattern, flags },
            TokenValue::Boolean(b) => ExprKind::Boolean(b),
            TokenValue::None if token.kind == TokenKind::Null => ExprKind::Null,
            TokenValue::Identifier(word) => match word.as_str() {
                "this" => ExprKind::This,
                "function" => {
                    self.advance();
                    let function = self.parse_function_rest(false)?;
                    return Ok(Expression {
                        kind: ExprKind::Function(Box::new(function)),
                        span: self.finish(start),
                    });
                }
                "async"
                    if self.peek_at(1).is_word("function") && !self.peek_at(1).newline_before =>
                {
                    self.advance();
                    self.advance();
                    let function = self.parse_function_rest(false)?;
                    return Ok(Expression {
                        kind: ExprKind::Function(Box::new(function)),
                        span: self.finish(start),
                    });
                }
                w if is_reserved(w) => return Err(self.unexpected()),
                _ => ExprKind::Identifier(word.clone()),
            },
            TokenValue::None => match token.kind {
                TokenKind::LParen => {
                    self.advance();
                    let expr = self.allow_in(Self::parse_sequence)?;
                    self.expect(TokenKind::RParen)?;
                    return Ok(expr);
                }
                TokenKind::LBracket => return self.parse_array(),
                TokenKind::LBrace => return self.parse_object(),
                _ => return Err(self.unexpected()),
            },
        };

        self.advance();
        Ok(Expression {
            kind,
            span: self.finish(start),
        })
    }

    fn parse_array(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        self.expect(TokenKind::LBracket)?;

        let items = self.allow_in(|p| {
            let mut items = Vec::new();
            while !p.check(TokenKind::RBracket) {
                if p.eat(TokenKind::Comma) {
                    items.push(None);
                    continue;
                }
                items.push(Some(p.parse_spread_or_assign()?));
                if !p.check(TokenKind::RBracket) {
                    p.expect(TokenKind::Comma)?;
                }
            }
            Ok(items)
        })?;
        self.expect(TokenKind::RBracket)?;

        Ok(Expression {
            kind: ExprKind::Array(items),
            span: self.finish(start),
        })
    }

    fn parse_object(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        self.expect(TokenKind::LBrace)?;

        let members = self.allow_in(|p| {
            let mut members = Vec::new();
            while !p.check(TokenKind::RBrace) {
                members.push(p.parse_object_member()?);
                if !p.check(TokenKind::RBrace) {
                    p.expect(TokenKind::Comma)?;
                }
            }
            Ok(members)
        })?;
        self.expect(TokenKind::RBrace)?;

        Ok(Expression {
            kind: ExprKind::Object(members),
            span: self.finish(start),
        })
    }

    fn parse_object_member(&mut self) -> Result<ObjectMember, SyntaxError> {
        let start = self.start();

        if self.eat(TokenKind::Ellipsis) {
            return Ok(ObjectMember::Spread(self.parse_assign()?));
        }

        let next_is_key = is_property_key_start(self.peek_at(1).kind);
        let accessor = match self.peek().word() {
            Some("get") if next_is_key => Some(PropertyKind::Get),
            Some("set") if next_is_key => Some(PropertyKind::Set),
            Some("async") if next_is_key && !self.peek_at(1).newline_before => {
                Some(PropertyKind::Method)
            }
            _ => None,
        };
        if let Some(kind) = accessor {
            self.advance();
            let key = self.parse_property_key()?;
            let value = self.parse_method_value()?;
            return Ok(ObjectMember::Property(ObjectProperty {
                key,
                value,
                kind,
                shorthand: false,
                span: self.finish(start),
            }));
        }

        let generator = self.eat(TokenKind::Star);
        let key_token = self.peek().clone();
        let key = self.parse_property_key()?;

        let (value, kind, shorthand) = match self.peek_kind() {
            TokenKind::Colon if !generator => {
                self.advance();
                (self.parse_assign()?, PropertyKind::Init, false)
            }
            TokenKind::LParen => (self.parse_method_value()?, PropertyKind::Method, false),
            TokenKind::Comma | TokenKind::RBrace | TokenKind::Eq
                if !generator
                    && key_token.kind == TokenKind::Identifier
                    && key_token.word().is_some_and(|w| !is_reserved(w)) =>
            {
                let name = key_token.word().unwrap_or_default().to_string();
                let mut value = Expression {
                    kind: ExprKind::Identifier(name),
                    span: key_token.span,
                };
                // `{ a = 1 } = obj`
                if self.eat(TokenKind::Eq) {
                    let default = self.parse_assign()?;
                    value = Expression {
                        kind: ExprKind::Assignment {
                            target: Box::new(value),
                            op: AssignOp::Assign,
                            value: Box::new(default),
                        },
                        span: self.finish(start),
                    };
                }
                (value, PropertyKind::Init, true)
            }
            _ => return Err(self.unexpected()),
        };

        Ok(ObjectMember::Property(ObjectProperty {
            key,
            value,
            kind,
            shorthand,
            span: self.finish(start),
        }))
    }

    fn parse_property_key(&mut self) -> Result<PropertyKey, SyntaxError> {
        let key = match &self.peek().value {
            TokenValue::Identifier(name) => PropertyKey::Identifier(name.clone()),
            TokenValue::Boolean(b) => PropertyKey::Identifier(b.to_string()),
            TokenValue::None if self.check(TokenKind::Null) => {
                PropertyKey::Identifier("null".into())
            }
            TokenValue::String(s) => PropertyKey::String(s.clone()),
            TokenValue::Number(n) => PropertyKey::Number(*n),
            TokenValue::None if self.check(TokenKind::LBracket) => {
                self.advance();
                let expr = self.allow_in(Self::parse_assign)?;
                self.expect(TokenKind::RBracket)?;
                return Ok(PropertyKey::Computed(Box::new(expr)));
            }
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(key)
    }

    /// `(params) { body }` of a method or accessor, as a function expression.
    fn parse_method_value(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.start();
        let params = self.parse_params()?;
        let body = self.parse_function_body()?;
        Ok(Expression {
            kind: ExprKind::Function(Box::new(Function {
                name: None,
                params,
                body,
            })),
            span: self.finish(start),
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn allow_in<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = saved;
        result
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// The token `n` ahead of the cursor; `Eof` past the end.
    fn peek_at(&self, n: usize) -> &Token {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) {
        let end = self.peek().span.end;
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.prev_end = end;
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), SyntaxError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn check_word(&self, word: &str) -> bool {
        self.peek().is_word(word)
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<(), SyntaxError> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn at_statement_end(&self) -> bool {
        self.check(TokenKind::Semicolon)
            || self.check(TokenKind::RBrace)
            || self.is_at_end()
            || self.peek().newline_before
    }

    fn consume_semicolon(&mut self) -> Result<(), SyntaxError> {
        if self.eat(TokenKind::Semicolon) || self.at_statement_end() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn start(&self) -> Position {
        self.peek().span.start
    }

    /// Spend `cost` of the nesting budget. A parse that fails here is
    /// abandoned, so only successful paths give the budget back.
    fn nest(&mut self, cost: usize) -> Result<(), SyntaxError> {
        self.depth += cost;
        if self.depth > NESTING_BUDGET {
            return Err(SyntaxError::new("Expression nested too deeply", self.start()));
        }
        Ok(())
    }

    fn leave(&mut self, cost: usize) {
        self.depth -= cost;
    }

    fn finish(&self, start: Position) -> Span {
        Span::new(start, self.prev_end)
    }

    fn unexpected(&self) -> SyntaxError {
        let token = self.peek();
        let message = match token.word() {
            _ if token.kind == TokenKind::Eof => "Unexpected end of input".to_string(),
            Some(word) if is_reserved(word) => format!("Unexpected keyword '{word}'"),
            _ => {
                let text = self
                    .source
                    .get(
                        token.span.start.offset - self.origin.offset
                            ..token.span.end.offset - self.origin.offset,
                    )
                    .unwrap_or_default();
                format!("Unexpected token '{text}'")
            }
        };
        SyntaxError::new(message, token.span.start)
    }
}

fn member(object: Expression, property: Expression, computed: bool, optional: bool) -> ExprKind {
    ExprKind::Member {
        object: Box::new(object),
        property: Box::new(property),
        computed,
        optional,
    }
}

fn is_property_key_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::String
            | TokenKind::Number
            | TokenKind::Boolean
            | TokenKind::Null
            | TokenKind::LBracket
    )
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::AddAssign,
        TokenKind::MinusEq => AssignOp::SubAssign,
        TokenKind::StarEq => AssignOp::MulAssign,
        TokenKind::SlashEq => AssignOp::DivAssign,
        TokenKind::PercentEq => AssignOp::ModAssign,
        TokenKind::StarStarEq => AssignOp::ExpAssign,
        TokenKind::ShlEq => AssignOp::ShlAssign,
        TokenKind::ShrEq => AssignOp::ShrAssign,
        TokenKind::UShrEq => AssignOp::UShrAssign,
        TokenKind::AmpEq => AssignOp::BitAndAssign,
        TokenKind::PipeEq => AssignOp::BitOrAssign,
        TokenKind::CaretEq => AssignOp::BitXorAssign,
        TokenKind::AndEq => AssignOp::AndAssign,
        TokenKind::OrEq => AssignOp::OrAssign,
        TokenKind::QuestionQuestionEq => AssignOp::NullishAssign,
        _ => return None,
    };
    Some(op)
}
