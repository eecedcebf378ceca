//! Components declared in markup and embedded regions.
//!
//! An element whose role attribute names a component is configured by its
//! other `data-*` attributes: `data-page-size="10"` sets `pageSize`. Each
//! value is parsed as a script expression, so `data-sortable="true"` is a
//! boolean and `data-columns="[{ field: 'name' }]"` an array.
//!
//! `<script>` bodies are linted as scripts, and templates
//! (`type="text/x-kendo-template"`) as markup, recursively. Their
//! diagnostics are moved into the enclosing document's coordinates.

use doclint_markup::{parse_with_options, Attribute, Element, ParseOptions, Position, RawText};
use doclint_schema::{ConfigEntry, Diagnostic, Validator};
use doclint_script::{parse_expression_at, Expression};

use crate::Linter;

/// Deepest template-in-template nesting that is linted.
pub(crate) const MAX_TEMPLATE_DEPTH: usize = 4;

/// How the body of a `<script>` element is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Embedded {
    Script,
    Template,
}

/// `None` for a `<script>` whose type is neither a script nor a template,
/// or that loads a typed script through `src`. Such elements are plain
/// elements.
pub(crate) fn embedded_kind(script: &Element) -> Option<Embedded> {
    let content_type = script
        .attribute("type")
        .map(|a| a.value.as_deref().unwrap_or_default().to_ascii_lowercase());
    match content_type.as_deref() {
        None => Some(Embedded::Script),
        Some(t) if t.contains("javascript") && script.attribute("src").is_none() => {
            Some(Embedded::Script)
        }
        Some(t) if t.contains("template") => Some(Embedded::Template),
        _ => None,
    }
}

impl Linter<'_> {
    /// Diagnostics for a markup document, in its own coordinates and
    /// without a file name.
    pub(crate) fn check_markup(&self, text: &str) -> Vec<Diagnostic> {
        self.check_document(text, 0)
    }

    /// `templates` counts the templates enclosing `text`.
    fn check_document(&self, text: &str, templates: usize) -> Vec<Diagnostic> {
        let options = ParseOptions {
            asp: self.config.asp,
            ..ParseOptions::default()
        };
        let document = parse_with_options(text, options);

        let mut diagnostics: Vec<Diagnostic> = document
            .errors
            .iter()
            .map(|e| Diagnostic::warning(e.message.clone()).at(e.position))
            .collect();
        diagnostics.extend(self.check_element(&document.root, templates));
        diagnostics
    }

    fn check_element(&self, element: &Element, templates: usize) -> Vec<Diagnostic> {
        if element.name.eq_ignore_ascii_case("style") {
            return Vec::new();
        }
        if element.name.eq_ignore_ascii_case("script") {
            if let Some(kind) = embedded_kind(element) {
                return element
                    .raw_text()
                    .map(|body| self.check_embedded(kind, body, templates))
                    .unwrap_or_default();
            }
        }

        let mut diagnostics = Vec::new();
        if let Some(role) = element.attribute(&self.config.role_attribute) {
            diagnostics.extend(self.check_role(element, role));
        }
        for child in element.elements() {
            diagnostics.extend(self.check_element(child, templates));
        }
        diagnostics
    }

    /// Lint a script body as a script or a template body as markup.
    fn check_embedded(&self, kind: Embedded, body: &RawText, templates: usize) -> Vec<Diagnostic> {
        let line = body.span.start.line;
        let diagnostics = match kind {
            Embedded::Script => {
                tracing::trace!(line, "entering embedded script");
                self.check_script(&body.text)
            }
            Embedded::Template if templates == MAX_TEMPLATE_DEPTH => {
                tracing::debug!(line, "template nested too deeply, skipped");
                vec![Diagnostic::warning(format!(
                    "Templates nested deeper than {MAX_TEMPLATE_DEPTH} levels are not checked"
                ))
                .at(Position::START)]
            }
            Embedded::Template => {
                tracing::trace!(line, "entering template");
                self.check_document(&body.text, templates + 1)
            }
        };
        translated(body, diagnostics)
    }

    fn check_role(&self, element: &Element, role: &Attribute) -> Vec<Diagnostic> {
        let name = role.value.as_deref().unwrap_or_default();
        let Some(component) = self.schema.resolve_ui(name, &self.config.namespace) else {
            return vec![Diagnostic::error(format!(
                "Could not find component specified in {}: {name}",
                self.config.role_attribute
            ))
            .at(role.name_span.start)
            .with_length(name.len())];
        };
        tracing::trace!(component = %component.id, line = role.name_span.start.line, "checking element");

        let mut diagnostics = Vec::new();
        let mut options: Vec<(String, &Attribute, Expression)> = Vec::new();
        for (i, attr) in element.attributes.iter().enumerate() {
            let Some(option) = attr.name.strip_prefix(self.config.data_prefix.as_str()) else {
                continue;
            };
            if attr.name == self.config.role_attribute || attr.name == self.config.bind_attribute {
                continue;
            }
            // A bare `data-foo` means `true`.
            let text = attr.value.as_deref().unwrap_or("true");
            let origin = attr.value_span.map_or(attr.name_span.start, |span| span.start);
            match parse_expression_at(text, origin) {
                Ok(value) => options.push((camel_case(option), attr, value)),
                Err(err) => {
                    tracing::debug!(attribute = %attr.name, error = %err, "attribute value does not parse");
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "Cannot parse expression {text} (in attribute {i})"
                        ))
                        .at(origin)
                        .with_length(text.len()),
                    );
                }
            }
        }

        let entries: Vec<ConfigEntry<'_>> = options
            .iter()
            .map(|(key, attr, value)| {
                ConfigEntry::new(key.as_str(), value, attr.name_span.start)
                    .with_length(attr.name.len())
            })
            .collect();
        diagnostics.extend(Validator::new(self.schema).check_component(component, &entries));
        diagnostics
    }
}

fn translated(body: &RawText, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| d.translate(body.span.start))
        .collect()
}

/// `page-size` becomes `pageSize`; only lowercase letters after a hyphen
/// are folded.
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '-' {
            if let Some(next) = chars.next_if(char::is_ascii_lowercase) {
                out.push(next.to_ascii_uppercase());
                continue;
            }
        }
        out.push(ch);
    }
    out
}
