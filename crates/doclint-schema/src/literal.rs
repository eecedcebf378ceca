//! Configuration values as the validator sees them.

use doclint_markup::Position;
use doclint_script::ast::UnaryOp;
use doclint_script::{ExprKind, Expression, ObjectMember, PropertyKey};

/// The literal shape of a configuration value.
///
/// Anything that is not written as a literal (a variable, a call, a
/// ternary) is [`ConfigLiteral::Unresolved`] and accepted by every type.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLiteral<'a> {
    String(&'a str),
    Number(f64),
    Boolean(bool),
    /// A regular expression literal. No documented type accepts one.
    Regex,
    Array(&'a [Option<Expression>]),
    Object(Vec<ConfigEntry<'a>>),
    Function,
    Unresolved,
}

impl<'a> ConfigLiteral<'a> {
    /// Reduce an expression to the shape type checks look at.
    pub fn classify(expr: &'a Expression) -> Self {
        match &expr.kind {
            ExprKind::String(s) => ConfigLiteral::String(s),
            ExprKind::Template(raw) if !raw.contains("${") => ConfigLiteral::String(raw),
            ExprKind::Number(n) => ConfigLiteral::Number(*n),
            ExprKind::Unary {
                op: op @ (UnaryOp::Neg | UnaryOp::Plus),
                operand,
            } => match operand.kind {
                ExprKind::Number(n) if *op == UnaryOp::Neg => ConfigLiteral::Number(-n),
                ExprKind::Number(n) => ConfigLiteral::Number(n),
                _ => ConfigLiteral::Unresolved,
            },
            ExprKind::Boolean(b) => ConfigLiteral::Boolean(*b),
            ExprKind::Regex { .. } => ConfigLiteral::Regex,
            ExprKind::Array(items) => ConfigLiteral::Array(items),
            ExprKind::Object(_) => ConfigLiteral::Object(ConfigEntry::from_object(expr)),
            ExprKind::Function(_) | ExprKind::Arrow { .. } => ConfigLiteral::Function,
            _ => ConfigLiteral::Unresolved,
        }
    }

    /// Whether the value has a shape types can be checked against.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ConfigLiteral::Unresolved)
    }
}

/// One `key: value` pair of a configuration object.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry<'a> {
    pub key: String,
    pub value: &'a Expression,
    /// Where the key starts; "not found" and default-value diagnostics
    /// point here.
    pub position: Position,
    /// Length of the key text.
    pub length: usize,
}

impl<'a> ConfigEntry<'a> {
    /// An entry whose length defaults to the key's.
    pub fn new(key: impl Into<String>, value: &'a Expression, position: Position) -> Self {
        let key = key.into();
        Self {
            length: key.len(),
            key,
            value,
            position,
        }
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// The named properties of an object literal, in source order. Spreads
    /// and computed keys cannot be checked and are skipped. Anything other
    /// than an object literal has no entries.
    pub fn from_object(expr: &'a Expression) -> Vec<Self> {
        let ExprKind::Object(members) = &expr.kind else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|member| match member {
                ObjectMember::Property(prop) => {
                    let key = prop.key.name()?;
                    let length = match &prop.key {
                        PropertyKey::String(_) => key.len() + 2,
                        _ => key.len(),
                    };
                    Some(ConfigEntry::new(key, &prop.value, prop.span.start).with_length(length))
                }
                ObjectMember::Spread(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doclint_script::parse_expression;
    use pretty_assertions::assert_eq;

    fn kind(source: &str) -> String {
        let expr = parse_expression(source).unwrap();
        match ConfigLiteral::classify(&expr) {
            ConfigLiteral::String(s) => format!("string {s}"),
            ConfigLiteral::Number(n) => format!("number {n}"),
            ConfigLiteral::Boolean(b) => format!("boolean {b}"),
            ConfigLiteral::Regex => "regex".to_string(),
            ConfigLiteral::Array(items) => format!("array of {}", items.len()),
            ConfigLiteral::Object(entries) => format!("object of {}", entries.len()),
            ConfigLiteral::Function => "function".to_string(),
            ConfigLiteral::Unresolved => "unresolved".to_string(),
        }
    }

    #[test]
    fn test_classify_literals() {
        assert_eq!(kind("'grid'"), "string grid");
        assert_eq!(kind("`row`"), "string row");
        assert_eq!(kind("42"), "number 42");
        assert_eq!(kind("-1.5"), "number -1.5");
        assert_eq!(kind("false"), "boolean false");
        assert_eq!(kind("/^a/i"), "regex");
        assert_eq!(kind("[1, , 3]"), "array of 3");
        assert_eq!(kind("{ a: 1, b: 2 }"), "object of 2");
        assert_eq!(kind("function (e) {}"), "function");
        assert_eq!(kind("e => e.sender"), "function");
    }

    #[test]
    fn test_classify_expressions_as_unresolved() {
        assert_eq!(kind("pageSize"), "unresolved");
        assert_eq!(kind("null"), "unresolved");
        assert_eq!(kind("`${a}px`"), "unresolved");
        assert_eq!(kind("a ? 1 : 2"), "unresolved");
        assert_eq!(kind("-x"), "unresolved");
        assert_eq!(kind("getOptions()"), "unresolved");
    }

    #[test]
    fn test_entries_from_object() {
        let expr = parse_expression("{ height: 400, 'page-size': 10, [k]: 1, ...rest, 5: 'x' }").unwrap();
        let entries = ConfigEntry::from_object(&expr);
        let keys: Vec<_> = entries.iter().map(|e| (e.key.as_str(), e.length)).collect();
        assert_eq!(keys, vec![("height", 6), ("page-size", 11), ("5", 1)]);
        assert_eq!(entries[0].position, Position::new(1, 3, 2));
        assert_eq!(entries[0].value.span.start, Position::new(1, 11, 10));
    }

    #[test]
    fn test_entries_from_non_object() {
        let expr = parse_expression("[1]").unwrap();
        assert!(ConfigEntry::from_object(&expr).is_empty());
    }
}
