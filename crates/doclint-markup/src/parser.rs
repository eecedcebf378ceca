use std::borrow::Cow;

use crate::node::{
    is_void_element, Attribute, CharRef, Document, Element, EntityRef, Node, Position, RawText,
    Span, Text, ROOT_NAME,
};
use crate::MarkupError;

const WHITESPACE: &[char] = &[
    ' ', '\u{a0}', '\n', '\r', '\t', '\u{c}', '\u{b}', '\u{200b}', '\u{180e}', '\u{2000}',
    '\u{2001}', '\u{2002}', '\u{2003}', '\u{2004}', '\u{2005}', '\u{2006}', '\u{2007}',
    '\u{2008}', '\u{2009}', '\u{200a}', '\u{202f}', '\u{205f}', '\u{3000}',
];

/// Deepest element nesting kept in the tree, root included. Elements
/// opened past it are attached to the deepest element without children of
/// their own.
pub const MAX_DEPTH: usize = 256;

/// Parser switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Apply HTML rules: void elements get no body, `script` and `style`
    /// bodies are raw text. With `false` every tag nests the same way.
    pub html: bool,
    /// Blank out `<% ... %>` blocks before parsing. Each block becomes a
    /// `/* ... */` run of the same length so positions are unaffected.
    pub asp: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            html: true,
            asp: false,
        }
    }
}

/// Parse markup with default options.
pub fn parse(source: &str) -> Document {
    parse_with_options(source, ParseOptions::default())
}

/// Parse markup. Never fails: problems are reported in `Document::errors`.
pub fn parse_with_options(source: &str, options: ParseOptions) -> Document {
    let source = if options.asp {
        blank_asp_blocks(source)
    } else {
        Cow::Borrowed(source)
    };
    Parser::new(&source, options).run()
}

/// Saved cursor state, for lookahead that may have to be undone.
#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: usize,
    column: usize,
    offset: usize,
}

/// Markup parser.
///
/// Walks a `Vec<char>` with a single forward cursor, keeping line, column
/// and byte offset current on every character. Open elements live on an
/// explicit stack whose bottom is the synthetic root.
pub struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    offset: usize,
    options: ParseOptions,
    stack: Vec<Element>,
    errors: Vec<MarkupError>,
    text: String,
    text_start: Position,
    /// Open elements flattened at [`MAX_DEPTH`] whose close tags are
    /// still to come.
    flattened: usize,
}

impl Parser {
    pub fn new(source: &str, options: ParseOptions) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            offset: 0,
            options,
            stack: vec![Element::new(ROOT_NAME, Position::START)],
            errors: Vec::new(),
            text: String::new(),
            text_start: Position::START,
            flattened: 0,
        }
    }

    /// Consume the whole input and build the document.
    pub fn run(mut self) -> Document {
        while !self.is_at_end() {
            if self.looking_at("</") {
                self.close_tag();
            } else if self.looking_at("<!--") {
                self.maybe(Self::read_comment);
            } else if self.looking_at("<![CDATA[") {
                self.maybe(Self::read_cdata);
            } else if self.looking_at("<!") {
                self.maybe(Self::read_declaration);
            } else if self.looking_at("<") {
                self.open_tag();
            } else if self.looking_at("&") {
                self.maybe(Self::read_entity);
            } else {
                self.take_text_char();
            }
        }

        let end = self.position();
        self.flush_text(end);

        // Whatever is still open ran to end of input.
        while self.stack.len() > 1 {
            let mut element = self.pop();
            element.unclosed = true;
            element.span.end = end;
            self.push_node(Node::Element(element));
        }

        let mut root = self.pop();
        root.span.end = end;
        Document {
            root,
            errors: self.errors,
        }
    }

    // =========================================================================
    // Tags
    // =========================================================================

    fn open_tag(&mut self) {
        let start = self.mark();
        self.advance(); // skip <
        let Some(name) = self.read_name() else {
            self.text_push_from(start, "<");
            return;
        };

        // Definitely a tag from here on.
        let start = Self::position_of(start);
        self.flush_text(start);

        let mut element = Element::new(name, start);
        let mut terminated = false;

        self.skip_whitespace();
        while !self.is_at_end() {
            if self.looking_at("/>") {
                self.advance_n(2);
                element.self_closing = true;
                terminated = true;
                break;
            }
            if self.looking_at(">") {
                self.advance();
                terminated = true;
                break;
            }
            match self.read_attribute() {
                Some(attribute) => element.attributes.push(attribute),
                None => self.advance(),
            }
            self.skip_whitespace();
        }

        element.span.end = self.position();
        if !terminated {
            self.error(format!("Unterminated open tag <{}>", element.name), start);
        }

        if element.self_closing {
            self.push_node(Node::Element(element));
            return;
        }

        if self.options.html {
            if is_void_element(&element.name) {
                self.push_node(Node::Element(element));
                return;
            }
            if element.name.eq_ignore_ascii_case("script")
                || element.name.eq_ignore_ascii_case("style")
            {
                self.read_raw_body(&mut element);
                self.push_node(Node::Element(element));
                return;
            }
        }

        if self.stack.len() == MAX_DEPTH {
            if self.flattened == 0 {
                self.error(
                    format!("Elements nested deeper than {} levels", MAX_DEPTH - 1),
                    start,
                );
            }
            self.flattened += 1;
            self.push_node(Node::Element(element));
            return;
        }

        self.stack.push(element);
    }

    fn close_tag(&mut self) {
        let start_mark = self.mark();
        self.advance_n(2); // skip </
        let Some(name) = self.read_name() else {
            self.text_push_from(start_mark, "</");
            return;
        };

        let start = Self::position_of(start_mark);
        self.flush_text(start);
        self.skip_to_tag_end();
        let end = self.position();

        if self.flattened > 0 {
            // Pairs with an element opened past the depth limit.
            self.flattened -= 1;
        } else if self.stack.len() > 1 {
            let mut open = self.pop();
            if !self.names_match(&open.name, &name) {
                // Assume the open element's own close tag is missing.
                self.error(
                    format!(
                        "Misplaced close tag </{}>[{}] (should be </{}> for <{}>[{}])",
                        name, start, open.name, open.name, open.span.start
                    ),
                    start,
                );
                open.unclosed = true;
            }
            open.span.end = end;
            self.push_node(Node::Element(open));
        } else {
            self.error(
                format!("Unexpected close tag </{name}>[{start}] with no open element"),
                start,
            );
        }
    }

    /// Consume the rest of a close tag up to and including `>`.
    fn skip_to_tag_end(&mut self) {
        while !self.is_at_end() && self.peek() != '>' {
            let ch = self.peek();
            if !is_whitespace(ch) {
                let at = self.position();
                self.error(format!("Unexpected character in close tag: {ch}"), at);
            }
            self.advance();
        }
        self.advance(); // skip >
    }

    /// Read a `script` or `style` body without tokenizing it.
    fn read_raw_body(&mut self, element: &mut Element) {
        let close = format!("</{}", element.name);
        let start = self.position();
        let mut text = String::new();
        while !self.is_at_end() && !self.looking_at_ignore_case(&close) {
            text.push(self.peek());
            self.advance();
        }
        let raw = RawText {
            text,
            span: Span::new(start, self.position()),
        };

        if self.is_at_end() {
            self.error(
                format!("Missing close tag for <{}>", element.name),
                element.span.start,
            );
            element.unclosed = true;
        } else {
            self.advance_n(close.chars().count());
            self.skip_to_tag_end();
        }
        element.span.end = self.position();

        if element.name.eq_ignore_ascii_case("script") {
            element.children.push(Node::Script(raw));
        } else {
            element.children.push(Node::Style(raw));
        }
    }

    fn read_attribute(&mut self) -> Option<Attribute> {
        let start = self.position();
        let name = self.read_name()?;
        let name_span = Span::new(start, self.position());
        self.skip_whitespace();

        if !self.looking_at("=") {
            return Some(Attribute {
                name,
                value: None,
                name_span,
                value_span: None,
                quote: None,
            });
        }

        self.advance(); // skip =
        self.skip_whitespace();
        let (value, value_span, quote) = self.read_attribute_value();
        Some(Attribute {
            name,
            value: Some(value),
            name_span,
            value_span: Some(value_span),
            quote,
        })
    }

    fn read_attribute_value(&mut self) -> (String, Span, Option<char>) {
        let quote = self.peek();
        if quote == '"' || quote == '\'' {
            self.advance();
            let start = self.position();
            let mut value = String::new();
            while !self.is_at_end() && self.peek() != quote {
                if self.peek() == '<' {
                    let at = self.position();
                    self.error("Misplaced < character in string".into(), at);
                }
                value.push(self.peek());
                self.advance();
            }
            let span = Span::new(start, self.position());
            if self.is_at_end() {
                self.error("Unterminated attribute value".into(), start);
            } else {
                self.advance(); // closing quote
            }
            return (value, span, Some(quote));
        }

        let start = self.position();
        let mut value = String::new();
        while !self.is_at_end() {
            let ch = self.peek();
            if is_whitespace(ch) || ch == '<' || ch == '>' {
                break;
            }
            // `/>` ends the tag, a lone `/` belongs to the value.
            if ch == '/' && self.peek_next() == Some('>') {
                break;
            }
            value.push(ch);
            self.advance();
        }
        (value, Span::new(start, self.position()), None)
    }

    // =========================================================================
    // Other node kinds
    // =========================================================================

    /// Run a reader at the cursor. On success the pending text is flushed
    /// and the node emitted; otherwise the cursor is restored and one
    /// character is taken as text.
    fn maybe(&mut self, reader: fn(&mut Self, Mark) -> Option<Node>) {
        let start = self.mark();
        match reader(self, start) {
            Some(node) => {
                self.flush_text(Self::position_of(start));
                self.push_node(node);
            }
            None => {
                self.restore(start);
                self.take_text_char();
            }
        }
    }

    fn read_comment(&mut self, start: Mark) -> Option<Node> {
        self.advance_n(4); // skip <!--
        let value = self.read_until("-->", "Unterminated comment", start);
        Some(Node::Comment(Text {
            value,
            span: self.span_from(start),
        }))
    }

    fn read_cdata(&mut self, start: Mark) -> Option<Node> {
        self.advance_n(9); // skip <![CDATA[
        let value = self.read_until("]]>", "Unterminated CDATA section", start);
        Some(Node::CData(Text {
            value,
            span: self.span_from(start),
        }))
    }

    fn read_declaration(&mut self, start: Mark) -> Option<Node> {
        self.advance_n(2); // skip <!
        let value = self.read_until(">", "Unterminated declaration", start);
        Some(Node::Declaration(Text {
            value,
            span: self.span_from(start),
        }))
    }

    fn read_entity(&mut self, start: Mark) -> Option<Node> {
        self.advance(); // skip &
        if self.looking_at("#") {
            self.advance();
            let hex = self.looking_at("x");
            if hex {
                self.advance();
            }
            let mut digits = String::new();
            while !self.is_at_end()
                && (if hex {
                    self.peek().is_ascii_hexdigit()
                } else {
                    self.peek().is_ascii_digit()
                })
            {
                digits.push(self.peek());
                self.advance();
            }
            if digits.is_empty() || !self.looking_at(";") {
                return None;
            }
            self.advance(); // skip ;
            let code = u32::from_str_radix(&digits, if hex { 16 } else { 10 }).ok()?;
            let raw = if hex { format!("x{digits}") } else { digits };
            return Some(Node::CharRef(CharRef {
                raw,
                code,
                span: self.span_from(start),
            }));
        }

        let name = self.read_name()?;
        if !self.looking_at(";") {
            return None;
        }
        self.advance(); // skip ;
        Some(Node::EntityRef(EntityRef {
            name,
            span: self.span_from(start),
        }))
    }

    /// Read up to `terminator`, consuming it. Reaching end of input first
    /// records `message` against `start`.
    fn read_until(&mut self, terminator: &str, message: &str, start: Mark) -> String {
        let mut value = String::new();
        while !self.is_at_end() && !self.looking_at(terminator) {
            value.push(self.peek());
            self.advance();
        }
        if self.is_at_end() {
            self.error(message.to_string(), Self::position_of(start));
        } else {
            self.advance_n(terminator.chars().count());
        }
        value
    }

    // =========================================================================
    // Text runs and tree building
    // =========================================================================

    fn take_text_char(&mut self) {
        if self.text.is_empty() {
            self.text_start = self.position();
        }
        self.text.push(self.peek());
        self.advance();
    }

    /// Append already-consumed characters that turned out to be text.
    fn text_push_from(&mut self, start: Mark, consumed: &str) {
        if self.text.is_empty() {
            self.text_start = Self::position_of(start);
        }
        self.text.push_str(consumed);
    }

    /// Emit the pending text run, ending at `end`.
    fn flush_text(&mut self, end: Position) {
        if self.text.is_empty() {
            return;
        }
        let value = std::mem::take(&mut self.text);
        let span = Span::new(self.text_start, end);
        self.push_node(Node::Text(Text { value, span }));
    }

    fn push_node(&mut self, node: Node) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
        }
    }

    fn pop(&mut self) -> Element {
        self.stack
            .pop()
            .unwrap_or_else(|| Element::new(ROOT_NAME, Position::START))
    }

    fn names_match(&self, open: &str, close: &str) -> bool {
        if self.options.html {
            open.eq_ignore_ascii_case(close)
        } else {
            open == close
        }
    }

    // =========================================================================
    // Cursor helpers
    // =========================================================================

    fn read_name(&mut self) -> Option<String> {
        if self.is_at_end() || !is_name_start_char(self.peek()) {
            return None;
        }
        let mut name = String::new();
        while !self.is_at_end() && is_name_char(self.peek()) {
            name.push(self.peek());
            self.advance();
        }
        Some(name)
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && is_whitespace(self.peek()) {
            self.advance();
        }
    }

    fn looking_at(&self, s: &str) -> bool {
        let mut i = self.pos;
        for expected in s.chars() {
            match self.chars.get(i) {
                Some(&ch) if ch == expected => i += 1,
                _ => return false,
            }
        }
        true
    }

    fn looking_at_ignore_case(&self, s: &str) -> bool {
        let mut i = self.pos;
        for expected in s.chars() {
            match self.chars.get(i) {
                Some(ch) if ch.eq_ignore_ascii_case(&expected) => i += 1,
                _ => return false,
            }
        }
        true
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.pos]
        }
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        if self.is_at_end() {
            return;
        }
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

    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    fn restore(&mut self, mark: Mark) {
        self.pos = mark.pos;
        self.line = mark.line;
        self.column = mark.column;
        self.offset = mark.offset;
    }

    fn position_of(mark: Mark) -> Position {
        Position::new(mark.line, mark.column, mark.offset)
    }

    fn span_from(&self, start: Mark) -> Span {
        Span::new(Self::position_of(start), self.position())
    }

    fn error(&mut self, message: String, position: Position) {
        self.errors.push(MarkupError { message, position });
    }
}

fn is_whitespace(ch: char) -> bool {
    WHITESPACE.contains(&ch)
}

fn is_name_start_char(ch: char) -> bool {
    matches!(ch,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}')
}

fn is_name_char(ch: char) -> bool {
    is_name_start_char(ch)
        || matches!(ch,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

/// Replace each single-line `<% ... %>` block with `/* ... */`, blanking
/// characters that would confuse the markup parser. Lengths are preserved.
fn blank_asp_blocks(source: &str) -> Cow<'_, str> {
    if !source.contains("<%") {
        return Cow::Borrowed(source);
    }
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(open) = rest.find("<%") {
        let body_start = open + 2;
        let line_end = rest[body_start..]
            .find('\n')
            .map_or(rest.len(), |i| body_start + i);
        match rest[body_start..line_end].find("%>") {
            Some(close) => {
                let body = &rest[body_start..body_start + close];
                out.push_str(&rest[..open]);
                out.push_str("/*");
                out.extend(body.chars().map(|c| match c {
                    '<' | '&' | '>' | '\'' | '"' => ' ',
                    c => c,
                }));
                out.push_str("*/");
                rest = &rest[body_start + close + 2..];
            }
            None => {
                out.push_str(&rest[..body_start]);
                rest = &rest[body_start..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn children(source: &str) -> Vec<Node> {
        parse(source).root.children
    }

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(el) => el,
            other => panic!("Expected Element, got {other:?}"),
        }
    }

    fn messages(doc: &Document) -> Vec<String> {
        doc.errors.iter().map(|e| e.message.clone()).collect()
    }

    // =========================================================================
    // Well-formed input
    // =========================================================================

    #[test]
    fn test_empty_document() {
        let doc = parse("");
        assert_eq!(doc.root.name, ROOT_NAME);
        assert!(doc.root.children.is_empty());
        assert!(doc.errors.is_empty());
    }

    #[test]
    fn test_plain_text() {
        let nodes = children("hello world");
        assert_eq!(nodes.len(), 1);
        match &nodes[0] {
            Node::Text(t) => {
                assert_eq!(t.value, "hello world");
                assert_eq!(t.span.start, Position::new(1, 1, 0));
                assert_eq!(t.span.end, Position::new(1, 12, 11));
            }
            other => panic!("Expected Text, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_elements() {
        let doc = parse("<div><span>hi</span><p></p></div>");
        assert!(doc.errors.is_empty());
        let div = element(&doc.root.children[0]);
        assert_eq!(div.name, "div");
        assert!(!div.unclosed);
        assert_eq!(div.elements().map(|e| e.name.as_str()).collect::<Vec<_>>(), vec!["span", "p"]);
        let span = div.elements().next().unwrap();
        assert!(matches!(&span.children[0], Node::Text(t) if t.value == "hi"));
    }

    #[test]
    fn test_element_span_covers_close_tag() {
        let doc = parse("<b>x</b>");
        let b = element(&doc.root.children[0]);
        assert_eq!(b.span.start, Position::new(1, 1, 0));
        assert_eq!(b.span.end, Position::new(1, 9, 8));
    }

    #[test]
    fn test_text_flushed_before_tags() {
        let nodes = children("a<br>b");
        assert_eq!(nodes.len(), 3);
        assert!(matches!(&nodes[0], Node::Text(t) if t.value == "a"));
        assert!(matches!(&nodes[1], Node::Element(e) if e.name == "br"));
        assert!(matches!(&nodes[2], Node::Text(t) if t.value == "b"));
    }

    #[test]
    fn test_void_element_has_no_children() {
        let doc = parse("<div><input type=\"text\">after</div>");
        let div = element(&doc.root.children[0]);
        let input = element(&div.children[0]);
        assert_eq!(input.name, "input");
        assert!(input.children.is_empty());
        assert!(matches!(&div.children[1], Node::Text(t) if t.value == "after"));
        assert!(doc.errors.is_empty());
    }

    #[test]
    fn test_self_closing() {
        let doc = parse("<widget a=\"1\"/><next></next>");
        let widget = element(&doc.root.children[0]);
        assert!(widget.self_closing);
        assert_eq!(widget.attributes.len(), 1);
        assert_eq!(element(&doc.root.children[1]).name, "next");
    }

    #[test]
    fn test_line_and_column_tracking() {
        let doc = parse("<div>\n  <span></span>\n</div>");
        let div = element(&doc.root.children[0]);
        let span = div.elements().next().unwrap();
        assert_eq!(span.span.start, Position::new(2, 3, 8));
    }

    #[test]
    fn test_byte_offsets_count_utf8() {
        let doc = parse("é<b></b>");
        let b = element(&doc.root.children[1]);
        assert_eq!(b.span.start, Position::new(1, 2, 2));
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_attribute_positions() {
        let doc = parse("<div data-role=\"grid\" hidden x=bare>");
        let div = element(&doc.root.children[0]);
        assert_eq!(div.attributes.len(), 3);

        let role = &div.attributes[0];
        assert_eq!(role.name, "data-role");
        assert_eq!(role.value.as_deref(), Some("grid"));
        assert_eq!(role.name_span.start, Position::new(1, 6, 5));
        assert_eq!(role.quote, Some('"'));
        // Value position lands inside the quotes.
        assert_eq!(role.value_span.unwrap().start, Position::new(1, 17, 16));

        let hidden = &div.attributes[1];
        assert_eq!(hidden.name, "hidden");
        assert!(hidden.value.is_none());

        let bare = &div.attributes[2];
        assert_eq!(bare.value.as_deref(), Some("bare"));
        assert_eq!(bare.quote, None);
        assert_eq!(bare.value_span.unwrap().start, Position::new(1, 32, 31));
    }

    #[test]
    fn test_attribute_with_spaces_around_equals() {
        let doc = parse("<a href = 'x'>");
        let a = element(&doc.root.children[0]);
        assert_eq!(a.attribute("href").unwrap().value.as_deref(), Some("x"));
        assert_eq!(a.attribute("href").unwrap().quote, Some('\''));
    }

    #[test]
    fn test_misplaced_lt_in_attribute_value() {
        let doc = parse("<a title=\"a<b\"></a>");
        assert_eq!(messages(&doc), vec!["Misplaced < character in string"]);
        assert_eq!(doc.errors[0].position, Position::new(1, 12, 11));
    }

    // =========================================================================
    // Script and style
    // =========================================================================

    #[test]
    fn test_script_body_is_raw() {
        let doc = parse("<script>if (a < b && c) { x('</div>'); }</script><p></p>");
        assert!(doc.errors.is_empty());
        let script = element(&doc.root.children[0]);
        let raw = script.raw_text().unwrap();
        assert_eq!(raw.text, "if (a < b && c) { x('</div>'); }");
        assert_eq!(raw.span.start, Position::new(1, 9, 8));
        assert!(matches!(&script.children[0], Node::Script(_)));
        assert_eq!(element(&doc.root.children[1]).name, "p");
    }

    #[test]
    fn test_style_body_is_raw() {
        let doc = parse("<style>a > b { color: red }</style>");
        let style = element(&doc.root.children[0]);
        assert!(matches!(&style.children[0], Node::Style(r) if r.text == "a > b { color: red }"));
    }

    #[test]
    fn test_script_body_position_on_later_line() {
        let doc = parse("<p></p>\n<script type=\"text/x-template\">\n<div></div></script>");
        let script = element(&doc.root.children[2]);
        assert_eq!(script.raw_text().unwrap().span.start, Position::new(2, 32, 39));
    }

    #[test]
    fn test_unterminated_script() {
        let doc = parse("<script>var a = 1;");
        assert_eq!(messages(&doc), vec!["Missing close tag for <script>"]);
        let script = element(&doc.root.children[0]);
        assert!(script.unclosed);
        assert_eq!(script.raw_text().unwrap().text, "var a = 1;");
    }

    #[test]
    fn test_xml_mode_nests_script() {
        let options = ParseOptions {
            html: false,
            asp: false,
        };
        let doc = parse_with_options("<script><b></b></script>", options);
        let script = element(&doc.root.children[0]);
        assert_eq!(element(&script.children[0]).name, "b");
    }

    // =========================================================================
    // Comments, CDATA, declarations, entities
    // =========================================================================

    #[test]
    fn test_comment_cdata_declaration() {
        let nodes = children("<!DOCTYPE html><!-- note --><![CDATA[<raw>]]>");
        assert!(matches!(&nodes[0], Node::Declaration(t) if t.value == "DOCTYPE html"));
        assert!(matches!(&nodes[1], Node::Comment(t) if t.value == " note "));
        assert!(matches!(&nodes[2], Node::CData(t) if t.value == "<raw>"));
    }

    #[test]
    fn test_unterminated_comment() {
        let doc = parse("a<!-- open");
        assert_eq!(messages(&doc), vec!["Unterminated comment"]);
        assert!(matches!(&doc.root.children[1], Node::Comment(t) if t.value == " open"));
    }

    #[test]
    fn test_char_references() {
        let nodes = children("a&#160;b&#x41;");
        assert!(matches!(&nodes[1], Node::CharRef(c) if c.raw == "160" && c.code == 160));
        assert!(matches!(&nodes[3], Node::CharRef(c) if c.raw == "x41" && c.code == 0x41));
    }

    #[test]
    fn test_entity_reference() {
        let nodes = children("x&nbsp;y");
        assert_eq!(nodes.len(), 3);
        assert!(matches!(&nodes[1], Node::EntityRef(e) if e.name == "nbsp"));
    }

    #[test]
    fn test_bare_ampersand_is_text() {
        let doc = parse("Tom & Jerry &amp Co &#;");
        assert!(doc.errors.is_empty());
        assert_eq!(doc.root.children.len(), 1);
        assert!(matches!(&doc.root.children[0], Node::Text(t) if t.value == "Tom & Jerry &amp Co &#;"));
    }

    #[test]
    fn test_lt_without_name_is_text() {
        let doc = parse("1 < 2 </ 3");
        assert!(doc.errors.is_empty());
        assert!(matches!(&doc.root.children[0], Node::Text(t) if t.value == "1 < 2 </ 3"));
    }

    // =========================================================================
    // Malformed input
    // =========================================================================

    #[test]
    fn test_stray_close_tag_is_ignored() {
        let doc = parse("</div>text");
        assert_eq!(
            messages(&doc),
            vec!["Unexpected close tag </div>[1:1] with no open element"]
        );
        assert_eq!(doc.root.children.len(), 1);
        assert!(matches!(&doc.root.children[0], Node::Text(t) if t.value == "text"));
    }

    #[test]
    fn test_mismatched_close_tag_pops() {
        let doc = parse("<div><span></div></span>");
        assert_eq!(
            messages(&doc),
            vec![
                "Misplaced close tag </div>[1:12] (should be </span> for <span>[1:6])",
                "Misplaced close tag </span>[1:18] (should be </div> for <div>[1:1])",
            ]
        );
        let div = element(&doc.root.children[0]);
        let span = element(&div.children[0]);
        assert!(span.unclosed);
        assert!(div.unclosed);
    }

    #[test]
    fn test_unclosed_elements_at_eof() {
        let doc = parse("<ul><li>one<li>two");
        assert!(doc.errors.is_empty());
        let ul = element(&doc.root.children[0]);
        assert!(ul.unclosed);
        let first = element(&ul.children[0]);
        assert_eq!(first.name, "li");
        // The second <li> nests inside the first: no implied closing.
        assert_eq!(element(&first.children[1]).name, "li");
    }

    #[test]
    fn test_unterminated_open_tag() {
        let doc = parse("<div class=\"a\"");
        assert_eq!(messages(&doc), vec!["Unterminated open tag <div>"]);
        let div = element(&doc.root.children[0]);
        assert_eq!(div.attributes.len(), 1);
        assert!(div.unclosed);
    }

    #[test]
    fn test_unexpected_character_in_close_tag() {
        let doc = parse("<b></b x>");
        assert_eq!(messages(&doc), vec!["Unexpected character in close tag: x"]);
        assert!(!element(&doc.root.children[0]).unclosed);
    }

    #[test]
    fn test_close_tag_sequences_never_panic() {
        for source in ["</a></b></c>", "<a></b></c>", "<a><b></a></b>", "</", "<", "<a", "<a></"] {
            let doc = parse(source);
            assert_eq!(doc.root.name, ROOT_NAME, "{source}");
        }
        assert!(!parse("<a></b></c>").errors.is_empty());
    }

    #[test]
    fn test_fully_closed_document_unwinds_to_root() {
        let doc = parse("<a><b>x</b><br><c><!-- y --><d/></c></a><e>&amp;</e>");
        assert!(doc.errors.is_empty());

        let mut pending: Vec<&Element> = doc.root.elements().collect();
        let mut seen = 0;
        while let Some(el) = pending.pop() {
            assert!(!el.unclosed, "<{}> left open", el.name);
            seen += 1;
            pending.extend(el.elements());
        }
        assert_eq!(seen, 6);
        assert_eq!(doc.root.elements().map(|el| el.name.as_str()).collect::<Vec<_>>(), vec!["a", "e"]);
    }

    // =========================================================================
    // Depth limit
    // =========================================================================

    fn depth(element: &Element) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(element, 0)];
        while let Some((el, d)) = pending.pop() {
            deepest = deepest.max(d);
            pending.extend(el.elements().map(|child| (child, d + 1)));
        }
        deepest
    }

    #[test]
    fn test_unclosed_nesting_is_flattened() {
        let doc = parse(&"<div>".repeat(50_000));
        assert_eq!(depth(&doc.root), MAX_DEPTH);
        assert_eq!(messages(&doc), vec!["Elements nested deeper than 255 levels"]);
        assert_eq!(doc.errors[0].position, Position::new(1, 1276, 1275));
    }

    #[test]
    fn test_closed_nesting_past_the_limit() {
        let n = 20_000;
        let doc = parse(&format!("{}x{}<p></p>", "<div>".repeat(n), "</div>".repeat(n)));
        assert_eq!(messages(&doc), vec!["Elements nested deeper than 255 levels"]);
        assert_eq!(depth(&doc.root), MAX_DEPTH);
        let names: Vec<&str> = doc.root.elements().map(|el| el.name.as_str()).collect();
        assert_eq!(names, vec!["div", "p"]);
    }

    // =========================================================================
    // ASP blocks
    // =========================================================================

    #[test]
    fn test_asp_blocks_are_blanked() {
        assert_eq!(blank_asp_blocks("<p><%= a < b %></p>"), "<p>/*= a   b */</p>");
    }

    #[test]
    fn test_asp_option_preserves_positions() {
        let options = ParseOptions {
            html: true,
            asp: true,
        };
        let doc = parse_with_options("<% if (x < 1) %><div></div>", options);
        assert!(doc.errors.is_empty());
        let div = element(&doc.root.children[1]);
        assert_eq!(div.span.start, Position::new(1, 17, 16));
    }
}
