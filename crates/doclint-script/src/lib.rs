//! doclint script front end
//!
//! Parses page scripts and configuration values into a syntax tree, walks
//! that tree, and prints it back in a canonical form. Positions use
//! [`doclint_markup::Position`] so script diagnostics can be mapped into
//! the enclosing markup document.
//!
//! # Example
//!
//! ```
//! use doclint_script::{parse_expression, print};
//!
//! let expr = parse_expression("{sortable:true,'pageSize':10}").unwrap();
//! assert_eq!(print(&expr), "{ sortable: true, pageSize: 10 }");
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod visit;

pub use ast::{ExprKind, Expression, ObjectMember, ObjectProperty, Program, PropertyKey};
pub use parser::Parser;
pub use printer::{format_number, print, print_program};
pub use visit::{walk_expression, walk_program, walk_statement, Visitor};

use doclint_markup::Position;

/// A script that could not be parsed, with the position of the problem.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} ({line}:{column})")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl SyntaxError {
    /// An error reported at `at`.
    pub fn new(message: impl Into<String>, at: Position) -> Self {
        Self {
            message: message.into(),
            line: at.line,
            column: at.column,
            offset: at.offset,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }
}

/// Parse a single expression, such as a configuration value.
pub fn parse_expression(source: &str) -> Result<Expression, SyntaxError> {
    Parser::parse_expression(source)
}

/// Parse an expression embedded in a larger document at `origin`, such as
/// a markup attribute value. Positions come out in the document's
/// coordinates.
pub fn parse_expression_at(source: &str, origin: Position) -> Result<Expression, SyntaxError> {
    Parser::parse_expression_at(source, origin)
}

/// Parse a complete script.
pub fn parse_program(source: &str) -> Result<Program, SyntaxError> {
    Parser::parse_program(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = parse_program("var = 1").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected token '=' (1:5)");
        assert_eq!(err.position(), Position::new(1, 5, 4));
    }
}
