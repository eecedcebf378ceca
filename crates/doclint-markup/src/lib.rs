//! doclint markup parser
//!
//! Builds a position-annotated tree from HTML-like text. Parsing never
//! fails: unmatched close tags, unterminated constructs and stray
//! characters are recorded in [`Document::errors`] and the tree is kept
//! as close to the author's intent as a single forward pass allows.
//!
//! `script` and `style` bodies are kept as raw text with their exact start
//! position so callers can parse them again with another front end.
//!
//! # Example
//!
//! ```
//! use doclint_markup::{parse, Node};
//!
//! let doc = parse("<div data-role=\"grid\"></div>");
//! assert!(doc.errors.is_empty());
//! assert!(matches!(&doc.root.children[0], Node::Element(el) if el.name == "div"));
//! ```

pub mod html;
pub mod node;
pub mod parser;

pub use html::to_html;
pub use node::{
    is_void_element, Attribute, CharRef, Document, Element, EntityRef, Node, Position, RawText,
    Span, Text, ROOT_NAME,
};
pub use parser::{parse, parse_with_options, ParseOptions, Parser, MAX_DEPTH};

/// A problem the parser recovered from.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at {position}")]
pub struct MarkupError {
    pub message: String,
    pub position: Position,
}
