//! Script lexer.
//!
//! Produces the whole token stream up front. A `/` starts a regular
//! expression or is a division depending on the token before it, and a
//! template literal (including its `${...}` parts) is kept as one token.
//! Keywords come out as [`TokenKind::Identifier`]; the parser decides what
//! they mean in context.
//!
//! # Examples
//!
//! ```
//! use doclint_script::lexer::{Lexer, TokenKind};
//!
//! let tokens = Lexer::tokenize("count + 1").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Identifier);
//! assert_eq!(tokens[1].kind, TokenKind::Plus);
//! assert_eq!(tokens[2].kind, TokenKind::Number);
//! ```

use doclint_markup::{Position, Span};

use crate::SyntaxError;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub value: TokenValue,
    /// A line break separates this token from the one before it.
    pub newline_before: bool,
}

impl Token {
    /// The identifier or keyword text, if this is a word token.
    pub fn word(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this is the identifier or keyword `word`.
    pub fn is_word(&self, word: &str) -> bool {
        self.word() == Some(word)
    }
}

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Number,
    String,
    Template,
    Regex,
    Boolean,
    Null,

    // Identifiers & keywords
    Identifier,

    // Arithmetic
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,

    // Comparison
    EqEq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    Lte,
    Gte,

    // Bitwise
    Shl,
    Shr,
    UShr,
    Amp,
    Pipe,
    Caret,
    Tilde,

    // Logical
    And,
    Or,
    Not,
    QuestionQuestion,

    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    StarStarEq,
    SlashEq,
    PercentEq,
    ShlEq,
    ShrEq,
    UShrEq,
    AmpEq,
    PipeEq,
    CaretEq,
    AndEq,
    OrEq,
    QuestionQuestionEq,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Punctuation
    Dot,
    Ellipsis,
    Comma,
    Colon,
    Semicolon,
    Question,
    OptionalChain,
    Arrow,

    // End of input
    Eof,
}

/// The value carried by a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    Number(f64),
    String(String),
    Boolean(bool),
    Identifier(String),
    /// Raw text between the backticks.
    Template(String),
    Regex {
        pattern: String,
        flags: String,
    },
}

/// Longest first, so the first match wins.
const PUNCTUATORS: &[(&str, TokenKind)] = &[
    (">>>=", TokenKind::UShrEq),
    ("...", TokenKind::Ellipsis),
    ("===", TokenKind::StrictEq),
    ("!==", TokenKind::StrictNotEq),
    ("**=", TokenKind::StarStarEq),
    ("<<=", TokenKind::ShlEq),
    (">>=", TokenKind::ShrEq),
    (">>>", TokenKind::UShr),
    ("&&=", TokenKind::AndEq),
    ("||=", TokenKind::OrEq),
    ("??=", TokenKind::QuestionQuestionEq),
    ("=>", TokenKind::Arrow),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    ("<=", TokenKind::Lte),
    (">=", TokenKind::Gte),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
    ("??", TokenKind::QuestionQuestion),
    ("?.", TokenKind::OptionalChain),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("+=", TokenKind::PlusEq),
    ("-=", TokenKind::MinusEq),
    ("*=", TokenKind::StarEq),
    ("/=", TokenKind::SlashEq),
    ("%=", TokenKind::PercentEq),
    ("&=", TokenKind::AmpEq),
    ("|=", TokenKind::PipeEq),
    ("^=", TokenKind::CaretEq),
    ("**", TokenKind::StarStar),
    ("<<", TokenKind::Shl),
    (">>", TokenKind::Shr),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    ("!", TokenKind::Not),
    ("=", TokenKind::Eq),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    (".", TokenKind::Dot),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    ("?", TokenKind::Question),
];

/// Keywords after which a `/` begins a regular expression.
const REGEX_AFTER_WORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\u{200c}' || c == '\u{200d}'
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Deepest template literal nesting (`` `${`${...}`}` ``) accepted.
const MAX_TEMPLATE_DEPTH: usize = 64;

/// Script lexer.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    offset: usize,
    newline_before: bool,
    /// Only whitespace and comments seen since the last line break.
    line_start: bool,
    prev: Option<TokenKind>,
    prev_word_allows_regex: bool,
    template_depth: usize,
}

impl Lexer {
    /// Create a new lexer for the given source.
    pub fn new(source: &str) -> Self {
        Self::with_origin(source, Position::START)
    }

    /// Create a lexer whose positions continue from `origin`, for text
    /// embedded in a larger document.
    pub fn with_origin(source: &str, origin: Position) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: origin.line,
            column: origin.column,
            offset: origin.offset,
            newline_before: false,
            line_start: true,
            prev: None,
            prev_word_allows_regex: false,
            template_depth: 0,
        }
    }

    /// Tokenize the entire source. The last token is always `Eof`.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
        Self::tokenize_at(source, Position::START)
    }

    /// Tokenize text that starts at `origin` in its enclosing document.
    pub fn tokenize_at(source: &str, origin: Position) -> Result<Vec<Token>, SyntaxError> {
        let mut lexer = Lexer::with_origin(source, origin);
        let mut tokens = Vec::new();

        loop {
            let token = lexer.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Read the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_trivia()?;

        let start = self.position();
        let token = match self.peek_at(0) {
            None => self.token(TokenKind::Eof, start, TokenValue::None),
            Some(ch) if ch.is_ascii_digit() => self.read_number(start)?,
            Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(start)?
            }
            Some('"' | '\'') => self.read_string(start)?,
            Some('`') => self.read_template(start)?,
            Some('/') if self.regex_allowed() => self.read_regex(start)?,
            Some(ch) if is_identifier_start(ch) => self.read_word(start)?,
            Some('\\') if self.peek_at(1) == Some('u') => self.read_word(start)?,
            Some(ch) => self.read_punctuator(ch, start)?,
        };

        self.prev = Some(token.kind);
        self.newline_before = false;
        self.line_start = false;
        Ok(token)
    }

    // --- Trivia ---

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        while let Some(ch) = self.peek_at(0) {
            if is_line_terminator(ch) {
                self.advance();
                self.newline_before = true;
                self.line_start = true;
            } else if ch.is_whitespace() {
                self.advance();
            } else if self.starts_with("//")
                || self.starts_with("<!--")
                || (self.line_start && self.starts_with("-->"))
            {
                while self.peek_at(0).is_some_and(|c| !is_line_terminator(c)) {
                    self.advance();
                }
            } else if self.starts_with("/*") {
                let start = self.position();
                self.advance_n(2);
                loop {
                    if self.is_at_end() {
                        return Err(SyntaxError::new("Unterminated comment", start));
                    }
                    if self.starts_with("*/") {
                        self.advance_n(2);
                        break;
                    }
                    if is_line_terminator(self.current()) {
                        self.newline_before = true;
                        self.line_start = true;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn regex_allowed(&self) -> bool {
        match self.prev {
            None => true,
            Some(TokenKind::Identifier) => self.prev_word_allows_regex,
            Some(
                TokenKind::Number
                | TokenKind::String
                | TokenKind::Template
                | TokenKind::Regex
                | TokenKind::Boolean
                | TokenKind::Null
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus,
            ) => false,
            Some(_) => true,
        }
    }

    // --- Literals ---

    fn read_number(&mut self, start: Position) -> Result<Token, SyntaxError> {
        let radix = match (self.peek_at(0), self.peek_at(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('o' | 'O')) => Some(8),
            (Some('0'), Some('b' | 'B')) => Some(2),
            _ => None,
        };

        let value = if let Some(radix) = radix {
            self.advance_n(2);
            let digits = self.take_while(|c| c.is_digit(radix) || c == '_');
            if digits.is_empty() {
                return Err(SyntaxError::new(
                    format!("Expected number in radix {radix}"),
                    start,
                ));
            }
            fold_digits(&digits, radix)
        } else {
            let mut text = self.take_while(|c| c.is_ascii_digit());
            if self.peek_at(0) == Some('.') {
                self.advance();
                text.push('.');
                text.push_str(&self.take_while(|c| c.is_ascii_digit()));
            }
            if let Some(e @ ('e' | 'E')) = self.peek_at(0) {
                self.advance();
                text.push(e);
                if let Some(sign @ ('+' | '-')) = self.peek_at(0) {
                    self.advance();
                    text.push(sign);
                }
                let exponent = self.take_while(|c| c.is_ascii_digit());
                if exponent.is_empty() {
                    return Err(SyntaxError::new("Invalid number", start));
                }
                text.push_str(&exponent);
            }

            let legacy_octal = text.len() > 1
                && text.starts_with('0')
                && text.chars().all(|c| ('0'..='7').contains(&c));
            if legacy_octal {
                fold_digits(&text, 8)
            } else {
                text.parse::<f64>()
                    .map_err(|_| SyntaxError::new(format!("Invalid number: '{text}'"), start))?
            }
        };

        if self.peek_at(0).is_some_and(is_identifier_start) {
            return Err(SyntaxError::new(
                "Identifier directly after number",
                self.position(),
            ));
        }

        Ok(self.token(TokenKind::Number, start, TokenValue::Number(value)))
    }

    fn read_string(&mut self, start: Position) -> Result<Token, SyntaxError> {
        let quote = self.current();
        self.advance(); // skip opening quote

        let mut value = String::new();
        loop {
            match self.peek_at(0) {
                None | Some('\n') => {
                    return Err(SyntaxError::new("Unterminated string constant", start));
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    self.read_escape(&mut value, start)?;
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        Ok(self.token(TokenKind::String, start, TokenValue::String(value)))
    }

    /// Decode one escape sequence; the backslash is already consumed.
    fn read_escape(&mut self, value: &mut String, start: Position) -> Result<(), SyntaxError> {
        let Some(escape) = self.peek_at(0) else {
            return Err(SyntaxError::new("Unterminated string constant", start));
        };
        let at = self.position();
        self.advance();
        match escape {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' if !self.peek_at(0).is_some_and(|c| c.is_ascii_digit()) => value.push('\0'),
            'x' => value.push(self.read_hex_escape(2, at)?),
            'u' if self.peek_at(0) == Some('{') => {
                self.advance();
                let digits = self.take_while(|c| c.is_ascii_hexdigit());
                if self.peek_at(0) != Some('}') {
                    return Err(SyntaxError::new("Bad character escape sequence", at));
                }
                self.advance();
                value.push(decode_code_point(&digits).ok_or_else(|| {
                    SyntaxError::new("Bad character escape sequence", at)
                })?);
            }
            'u' => value.push(self.read_hex_escape(4, at)?),
            // Line continuation.
            '\r' => {
                if self.peek_at(0) == Some('\n') {
                    self.advance();
                }
            }
            '\n' => {}
            other => value.push(other),
        }
        Ok(())
    }

    fn read_hex_escape(&mut self, len: usize, at: Position) -> Result<char, SyntaxError> {
        let mut digits = String::new();
        for _ in 0..len {
            match self.peek_at(0) {
                Some(c) if c.is_ascii_hexdigit() => {
                    digits.push(c);
                    self.advance();
                }
                _ => return Err(SyntaxError::new("Bad character escape sequence", at)),
            }
        }
        decode_code_point(&digits)
            .ok_or_else(|| SyntaxError::new("Bad character escape sequence", at))
    }

    fn read_template(&mut self, start: Position) -> Result<Token, SyntaxError> {
        self.advance(); // skip opening backtick
        let mut raw = String::new();
        self.read_template_body(&mut raw, start)?;
        Ok(self.token(TokenKind::Template, start, TokenValue::Template(raw)))
    }

    /// Copy template text up to the closing backtick, which is consumed
    /// but not copied.
    fn read_template_body(&mut self, raw: &mut String, start: Position) -> Result<(), SyntaxError> {
        loop {
            let Some(c) = self.peek_at(0) else {
                return Err(SyntaxError::new("Unterminated template", start));
            };
            match c {
                '`' => {
                    self.advance();
                    return Ok(());
                }
                '\\' => {
                    raw.push(c);
                    self.advance();
                    if let Some(escaped) = self.peek_at(0) {
                        raw.push(escaped);
                        self.advance();
                    }
                }
                '$' if self.peek_at(1) == Some('{') => {
                    raw.push_str("${");
                    self.advance_n(2);
                    self.read_template_substitution(raw, start)?;
                }
                _ => {
                    raw.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Copy a `${...}` body including its closing brace.
    fn read_template_substitution(
        &mut self,
        raw: &mut String,
        start: Position,
    ) -> Result<(), SyntaxError> {
        let mut depth = 1usize;
        loop {
            let Some(c) = self.peek_at(0) else {
                return Err(SyntaxError::new("Unterminated template", start));
            };
            match c {
                '`' => {
                    if self.template_depth == MAX_TEMPLATE_DEPTH {
                        return Err(SyntaxError::new("Template nested too deeply", self.position()));
                    }
                    raw.push('`');
                    self.advance();
                    self.template_depth += 1;
                    self.read_template_body(raw, start)?;
                    self.template_depth -= 1;
                    raw.push('`');
                    continue;
                }
                '"' | '\'' => {
                    raw.push(c);
                    self.advance();
                    while let Some(inner) = self.peek_at(0) {
                        raw.push(inner);
                        self.advance();
                        if inner == '\\' {
                            if let Some(escaped) = self.peek_at(0) {
                                raw.push(escaped);
                                self.advance();
                            }
                        } else if inner == c || inner == '\n' {
                            break;
                        }
                    }
                    continue;
                }
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        raw.push('}');
                        self.advance();
                        return Ok(());
                    }
                }
                _ => {}
            }
            raw.push(c);
            self.advance();
        }
    }

    fn read_regex(&mut self, start: Position) -> Result<Token, SyntaxError> {
        self.advance(); // skip opening slash

        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            match self.peek_at(0) {
                None | Some('\n') => {
                    return Err(SyntaxError::new("Unterminated regular expression", start));
                }
                Some('\\') => {
                    pattern.push('\\');
                    self.advance();
                    match self.peek_at(0) {
                        None | Some('\n') => {
                            return Err(SyntaxError::new(
                                "Unterminated regular expression",
                                start,
                            ));
                        }
                        Some(c) => {
                            pattern.push(c);
                            self.advance();
                        }
                    }
                }
                Some('/') if !in_class => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    if c == '[' {
                        in_class = true;
                    } else if c == ']' {
                        in_class = false;
                    }
                    pattern.push(c);
                    self.advance();
                }
            }
        }

        let flags = self.take_while(is_identifier_part);
        Ok(self.token(
            TokenKind::Regex,
            start,
            TokenValue::Regex { pattern, flags },
        ))
    }

    /// An identifier or keyword. `\uXXXX` and `\u{...}` escapes are
    /// decoded; an escaped word is always an identifier.
    fn read_word(&mut self, start: Position) -> Result<Token, SyntaxError> {
        let mut word = String::new();
        let mut escaped = false;
        while let Some(c) = self.peek_at(0) {
            if c == '\\' && self.peek_at(1) == Some('u') {
                let at = self.position();
                self.advance();
                let mut decoded = String::new();
                self.read_escape(&mut decoded, start)?;
                let valid = decoded.chars().next().is_some_and(|ch| {
                    if word.is_empty() {
                        is_identifier_start(ch)
                    } else {
                        is_identifier_part(ch)
                    }
                });
                if !valid {
                    return Err(SyntaxError::new("Invalid Unicode escape sequence", at));
                }
                word.push_str(&decoded);
                escaped = true;
            } else if is_identifier_part(c) {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }
        self.prev_word_allows_regex = !escaped && REGEX_AFTER_WORDS.contains(&word.as_str());

        if escaped {
            return Ok(self.token(TokenKind::Identifier, start, TokenValue::Identifier(word)));
        }
        Ok(match word.as_str() {
            "true" => self.token(TokenKind::Boolean, start, TokenValue::Boolean(true)),
            "false" => self.token(TokenKind::Boolean, start, TokenValue::Boolean(false)),
            "null" => self.token(TokenKind::Null, start, TokenValue::None),
            _ => self.token(TokenKind::Identifier, start, TokenValue::Identifier(word)),
        })
    }

    fn read_punctuator(&mut self, ch: char, start: Position) -> Result<Token, SyntaxError> {
        for &(text, kind) in PUNCTUATORS {
            if !self.starts_with(text) {
                continue;
            }
            // `a?.5:b` is a conditional, not optional chaining.
            if kind == TokenKind::OptionalChain
                && self.peek_at(2).is_some_and(|c| c.is_ascii_digit())
            {
                continue;
            }
            self.advance_n(text.len());
            return Ok(self.token(kind, start, TokenValue::None));
        }

        Err(SyntaxError::new(format!("Unexpected character '{ch}'"), start))
    }

    // --- Private helpers ---

    fn token(&self, kind: TokenKind, start: Position, value: TokenValue) -> Token {
        Token {
            kind,
            span: Span::new(start, self.position()),
            value,
            newline_before: self.newline_before,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn current(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek_at(0) {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.advance();
        }
        out
    }

    fn advance(&mut self) {
        let ch = self.chars[self.pos];
        self.pos += 1;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

fn fold_digits(digits: &str, radix: u32) -> f64 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d))
}

fn decode_code_point(hex: &str) -> Option<char> {
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(source: &str) -> Vec<Token> {
        Lexer::tokenize(source).unwrap()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    // --- Basic tokens ---

    #[test]
    fn test_numbers() {
        let values: Vec<TokenValue> = ["42", "2.75", ".5", "1e3", "0xff", "0b101", "017"]
            .iter()
            .map(|s| tokenize(s)[0].value.clone())
            .collect();
        assert_eq!(
            values,
            vec![
                TokenValue::Number(42.0),
                TokenValue::Number(2.75),
                TokenValue::Number(0.5),
                TokenValue::Number(1000.0),
                TokenValue::Number(255.0),
                TokenValue::Number(5.0),
                TokenValue::Number(15.0),
            ]
        );
    }

    #[test]
    fn test_string_quotes_and_escapes() {
        assert_eq!(tokenize("'hello'")[0].value, TokenValue::String("hello".into()));
        assert_eq!(tokenize("\"world\"")[0].value, TokenValue::String("world".into()));
        assert_eq!(
            tokenize(r#"'a\nb\'c\x41B'"#)[0].value,
            TokenValue::String("a\nb'cAB".into())
        );
    }

    #[test]
    fn test_keywords_are_identifiers() {
        let tokens = tokenize("return typeof x");
        assert!(tokens[0].is_word("return"));
        assert!(tokens[1].is_word("typeof"));
        assert_eq!(tokens[2].word(), Some("x"));
    }

    #[test]
    fn test_literal_words() {
        assert_eq!(
            kinds("true false null"),
            vec![
                TokenKind::Boolean,
                TokenKind::Boolean,
                TokenKind::Null,
                TokenKind::Eof,
            ]
        );
    }

    // --- Operators ---

    #[test]
    fn test_longest_match() {
        assert_eq!(
            kinds("a >>>= b === c ?? d ... e"),
            vec![
                TokenKind::Identifier,
                TokenKind::UShrEq,
                TokenKind::Identifier,
                TokenKind::StrictEq,
                TokenKind::Identifier,
                TokenKind::QuestionQuestion,
                TokenKind::Identifier,
                TokenKind::Ellipsis,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_optional_chain_versus_conditional() {
        assert_eq!(
            kinds("a?.b"),
            vec![
                TokenKind::Identifier,
                TokenKind::OptionalChain,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("a?.5:b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Question,
                TokenKind::Number,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_arrow() {
        assert_eq!(
            kinds("(x) => x + 1"),
            vec![
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    // --- Regex and division ---

    #[test]
    fn test_regex_after_operator() {
        let tokens = tokenize("x = /a[/]b/gi");
        assert_eq!(tokens[2].kind, TokenKind::Regex);
        assert_eq!(
            tokens[2].value,
            TokenValue::Regex {
                pattern: "a[/]b".into(),
                flags: "gi".into(),
            }
        );
    }

    #[test]
    fn test_division_after_operand() {
        assert_eq!(
            kinds("a / b / c"),
            vec![
                TokenKind::Identifier,
                TokenKind::Slash,
                TokenKind::Identifier,
                TokenKind::Slash,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("(a) / 2")[3], TokenKind::Slash);
    }

    #[test]
    fn test_regex_after_keyword() {
        assert_eq!(kinds("return /x/")[1], TokenKind::Regex);
    }

    // --- Templates ---

    #[test]
    fn test_template_is_one_token() {
        let tokens = tokenize("`a ${ {b: `c`}.b } d` + 1");
        assert_eq!(tokens[0].kind, TokenKind::Template);
        assert_eq!(
            tokens[0].value,
            TokenValue::Template("a ${ {b: `c`}.b } d".into())
        );
        assert_eq!(tokens[1].kind, TokenKind::Plus);
    }

    // --- Comments and line breaks ---

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("a // one\n/* two\n */ b <!-- three\n--> four\nc"),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_newline_before() {
        let tokens = tokenize("a\nb c /*\n*/ d");
        let flags: Vec<bool> = tokens.iter().map(|t| t.newline_before).collect();
        assert_eq!(flags, vec![false, true, false, true, false]);
    }

    // --- Error handling ---

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::tokenize("x = 'hello").unwrap_err();
        assert_eq!(err.message, "Unterminated string constant");
        assert_eq!((err.line, err.column), (1, 5));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = Lexer::tokenize("a /* b").unwrap_err();
        assert_eq!(err.message, "Unterminated comment");
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::tokenize("count # 5").unwrap_err();
        assert_eq!(err.message, "Unexpected character '#'");
        assert_eq!(err.column, 7);
    }

    #[test]
    fn test_identifier_after_number() {
        assert!(Lexer::tokenize("3in").is_err());
    }

    #[test]
    fn test_empty_input() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    // --- Span tracking ---

    #[test]
    fn test_span_tracking() {
        let tokens = tokenize("a +\n  bé");
        assert_eq!(tokens[0].span.start, Position::new(1, 1, 0));
        assert_eq!(tokens[1].span.start, Position::new(1, 3, 2));
        assert_eq!(tokens[2].span.start, Position::new(2, 3, 6));
        assert_eq!(tokens[2].span.end, Position::new(2, 5, 9));
    }

    // --- Unicode ---

    #[test]
    fn test_unicode_line_terminators() {
        for source in ["a\u{2028}b", "a\u{2029}b", "a\rb", "a // note\u{2028}b"] {
            let tokens = tokenize(source);
            let flags: Vec<bool> = tokens.iter().map(|t| t.newline_before).collect();
            assert_eq!(flags, vec![false, true, false], "{source:?}");
        }
    }

    #[test]
    fn test_identifier_escapes() {
        let tokens = tokenize("caf\\u00e9 \\u{62}ar \\u0069f");
        let words: Vec<Option<&str>> = tokens.iter().map(Token::word).collect();
        assert_eq!(words, vec![Some("café"), Some("bar"), Some("if"), None]);
        assert_eq!(tokens[0].span.end, Position::new(1, 10, 9));

        let err = Lexer::tokenize("a\\u0020b").unwrap_err();
        assert_eq!(err.message, "Invalid Unicode escape sequence");
        assert_eq!(err.column, 2);
        assert!(Lexer::tokenize("\\u12").is_err());
    }

    #[test]
    fn test_template_nesting_limit() {
        let nested = |depth: usize| format!("{}x{}", "`${".repeat(depth), "}`".repeat(depth));
        assert_eq!(kinds(&nested(10)), vec![TokenKind::Template, TokenKind::Eof]);

        let err = Lexer::tokenize(&nested(10_000)).unwrap_err();
        assert_eq!(err.message, "Template nested too deeply");
    }
}
