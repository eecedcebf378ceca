//! Markup serializer.
//!
//! Writes a parsed tree back out as markup. Text, comments and raw bodies
//! are emitted as they appeared in the source. Quoted attribute values keep
//! their original quote; bare values are written double-quoted.

use crate::node::{is_void_element, Attribute, Element, Node, ROOT_NAME};

/// Serialize an element. The synthetic root emits only its children.
pub fn to_html(element: &Element) -> String {
    let mut out = String::new();
    if element.name == ROOT_NAME {
        for node in &element.children {
            generate_node(node, &mut out);
        }
    } else {
        generate_element(element, &mut out);
    }
    out
}

fn generate_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => generate_element(el, out),
        Node::Text(t) => out.push_str(&t.value),
        Node::Comment(t) => {
            out.push_str("<!--");
            out.push_str(&t.value);
            out.push_str("-->");
        }
        Node::CData(t) => {
            out.push_str("<![CDATA[");
            out.push_str(&t.value);
            out.push_str("]]>");
        }
        Node::Declaration(t) => {
            out.push_str("<!");
            out.push_str(&t.value);
            out.push('>');
        }
        Node::CharRef(c) => out.push_str(&format!("&#{};", c.raw)),
        Node::EntityRef(e) => out.push_str(&format!("&{};", e.name)),
        Node::Script(raw) | Node::Style(raw) => out.push_str(&raw.text),
    }
}

fn generate_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for attr in &el.attributes {
        out.push(' ');
        generate_attribute(attr, out);
    }

    if el.self_closing {
        out.push_str("/>");
        return;
    }
    out.push('>');

    if is_void_element(&el.name) && el.children.is_empty() {
        return;
    }

    for child in &el.children {
        generate_node(child, out);
    }

    if !el.unclosed {
        out.push_str(&format!("</{}>", el.name));
    }
}

fn generate_attribute(attr: &Attribute, out: &mut String) {
    out.push_str(&attr.name);
    if let Some(value) = &attr.value {
        // Keep the value verbatim; pick a quote it does not contain.
        let quote = match attr.quote {
            Some(q) if !value.contains(q) => q,
            _ if value.contains('"') => '\'',
            _ => '"',
        };
        out.push('=');
        out.push(quote);
        out.push_str(value);
        out.push(quote);
    }
}
