/// A point in source text.
///
/// `line` and `column` are 1-based and count characters; `offset` is the
/// 0-based byte offset into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    /// The first character of any source text.
    pub const START: Position = Position {
        line: 1,
        column: 1,
        offset: 0,
    };

    /// A position from 1-based line and column and a byte offset.
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Map a position local to an embedded region onto the enclosing text,
    /// where `origin` is the position of the region's first character in
    /// that enclosing text.
    ///
    /// Only the first line of a region is shifted horizontally; later lines
    /// start at column 1 in both coordinate spaces.
    pub fn translate(self, origin: Position) -> Position {
        if self.line == 1 {
            Position {
                line: origin.line,
                column: self.column + origin.column - 1,
                offset: self.offset + origin.offset,
            }
        } else {
            Position {
                line: self.line + origin.line - 1,
                column: self.column,
                offset: self.offset + origin.offset,
            }
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Start (inclusive) and end (exclusive) of a node in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// The range from `start` up to `end`.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// A parsed markup document.
///
/// `root` is a synthetic element named [`ROOT_NAME`] holding the top-level
/// nodes. `errors` lists everything the parser had to recover from.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
    pub errors: Vec<crate::MarkupError>,
}

/// Name given to the synthetic root element.
pub const ROOT_NAME: &str = "#document";

/// A node in the markup tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(Text),
    Comment(Text),
    CData(Text),
    /// `<!DOCTYPE html>` and friends; `value` excludes the `<!` and `>`.
    Declaration(Text),
    /// `&#160;` or `&#xA0;`
    CharRef(CharRef),
    /// `&nbsp;`
    EntityRef(EntityRef),
    /// Raw body of a `<script>` element.
    Script(RawText),
    /// Raw body of a `<style>` element.
    Style(RawText),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Element(el) => el.span,
            Node::Text(t) | Node::Comment(t) | Node::CData(t) | Node::Declaration(t) => t.span,
            Node::CharRef(c) => c.span,
            Node::EntityRef(e) => e.span,
            Node::Script(r) | Node::Style(r) => r.span,
        }
    }

    /// The element, if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    /// Written as `<name/>`.
    pub self_closing: bool,
    /// No matching close tag was seen: the element ran to end of input or
    /// was popped by a misplaced close tag.
    pub unclosed: bool,
    pub span: Span,
}

impl Element {
    /// An open element with no attributes or children.
    pub fn new(name: impl Into<String>, start: Position) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
            unclosed: false,
            span: Span::new(start, start),
        }
    }

    /// First attribute with exactly this name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Child elements, skipping text and other node kinds.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Body of a `<script>` or `<style>` element.
    pub fn raw_text(&self) -> Option<&RawText> {
        self.children.iter().find_map(|node| match node {
            Node::Script(raw) | Node::Style(raw) => Some(raw),
            _ => None,
        })
    }
}

/// `name` or `name=value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    pub name_span: Span,
    /// Span of the value text. For quoted values this excludes the quotes.
    pub value_span: Option<Span>,
    /// The quote character around the value, if any.
    pub quote: Option<char>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharRef {
    /// Text between `&#` and `;`, e.g. `160` or `xA0`.
    pub raw: String,
    pub code: u32,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityRef {
    pub name: String,
    pub span: Span,
}

/// Unparsed element body. `span.start` is where the body begins in the
/// enclosing document, which is the origin for positions found inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawText {
    pub text: String,
    pub span: Span,
}

/// HTML elements that never have content.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Check if a tag name is a void element (case-insensitive).
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}
