//! Component calls in scripts: `$("#grid").kendoGrid({ ... })`.

use doclint_markup::Span;
use doclint_schema::{ConfigEntry, Diagnostic, Validator};
use doclint_script::{parse_program, walk_expression, walk_program, ExprKind, Expression, Visitor};

use crate::Linter;

/// A prefixed method call whose first argument is an object literal.
#[derive(Debug)]
struct CallSite<'ast> {
    /// Method name with the prefix removed, e.g. `Grid`.
    component: &'ast str,
    /// Span of the method name.
    method: Span,
    config: &'ast Expression,
}

struct CallSites<'p, 'ast> {
    prefix: &'p str,
    found: Vec<CallSite<'ast>>,
}

impl<'ast> Visitor<'ast> for CallSites<'_, 'ast> {
    fn visit_expression(&mut self, expr: &'ast Expression) {
        if let ExprKind::Call {
            callee, arguments, ..
        } = &expr.kind
        {
            if let (Some((component, method)), Some(config)) =
                (prefixed_method(callee, self.prefix), arguments.first())
            {
                if matches!(config.kind, ExprKind::Object(_)) {
                    self.found.push(CallSite {
                        component,
                        method,
                        config,
                    });
                }
            }
        }
        walk_expression(self, expr);
    }
}

/// For a callee like `x.kendoGrid`, the component name after `prefix` and
/// the span of the method name. Computed members (`x["kendoGrid"]`) and
/// the bare prefix do not count.
pub(crate) fn prefixed_method<'ast>(callee: &'ast Expression, prefix: &str) -> Option<(&'ast str, Span)> {
    let ExprKind::Member {
        property,
        computed: false,
        ..
    } = &callee.kind
    else {
        return None;
    };
    let ExprKind::Identifier(name) = &property.kind else {
        return None;
    };
    name.strip_prefix(prefix)
        .filter(|component| !component.is_empty())
        .map(|component| (component, property.span))
}

impl Linter<'_> {
    /// Diagnostics for a script, in the script's own coordinates and
    /// without a file name.
    pub(crate) fn check_script(&self, text: &str) -> Vec<Diagnostic> {
        let program = match parse_program(text) {
            Ok(program) => program,
            Err(err) => {
                tracing::debug!(error = %err, "script does not parse");
                return vec![Diagnostic::error(err.message.clone()).at(err.position())];
            }
        };

        let mut sites = CallSites {
            prefix: &self.config.method_prefix,
            found: Vec::new(),
        };
        walk_program(&mut sites, &program);

        let validator = Validator::new(self.schema);
        let mut diagnostics = Vec::new();
        for site in sites.found {
            match self.schema.resolve_ui(site.component, &self.config.namespace) {
                Some(component) => {
                    tracing::trace!(component = %component.id, line = site.method.start.line, "checking call site");
                    let entries = ConfigEntry::from_object(site.config);
                    diagnostics.extend(validator.check_component(component, &entries));
                }
                None => diagnostics.push(
                    Diagnostic::error(format!("Could not find component: {}", site.component))
                        .at(site.method.start)
                        .with_length(site.method.end.offset - site.method.start.offset),
                ),
            }
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doclint_markup::Position;
    use doclint_schema::{ComponentSchema, OptionDescriptor, SchemaModel, Severity};
    use pretty_assertions::assert_eq;

    fn schema() -> SchemaModel {
        SchemaModel::builder()
            .component(
                ComponentSchema::new("kendo.ui.Widget")
                    .with_option(OptionDescriptor::new("size", &["String"]))
                    .with_option(OptionDescriptor::new("animation", &["Boolean", "Object"]))
                    .with_option(OptionDescriptor::new("animation.duration", &["Number"]))
                    .with_option(OptionDescriptor::new("effect", &["String"]).with_default("\"none\""))
                    .with_event("change"),
            )
            .build()
            .unwrap()
    }

    fn lint(source: &str) -> Vec<Diagnostic> {
        let schema = schema();
        Linter::new(&schema).lint_script(source, "app.js")
    }

    #[test]
    fn test_bad_type_at_call_site() {
        let diags = lint("x.kendoWidget({size: 10})");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Bad type for option size. Accepted: String");
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].position, Some(Position::new(1, 22, 21)));
        assert_eq!(diags[0].filename.as_deref(), Some("app.js"));
    }

    #[test]
    fn test_sub_option_only() {
        let diags = lint("x.kendoWidget({animation:{duration:\"x\"}})");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("animation.duration"));
    }

    #[test]
    fn test_default_value() {
        let diags = lint("x.kendoWidget({effect: \"none\"})");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(lint("x.kendoWidget({effect: \"fade\"})").is_empty());
    }

    #[test]
    fn test_component_name_is_case_insensitive() {
        assert!(lint("$('#w').kendowidget({ size: 'big' });").is_empty());
    }

    #[test]
    fn test_unknown_component_points_at_method() {
        let diags = lint("$(function () {\n    $('#g').kendoGrid({ sortable: true });\n});");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Could not find component: Grid");
        assert_eq!(diags[0].position, Some(Position::new(2, 13, 28)));
        assert_eq!(diags[0].length, Some(9));
    }

    #[test]
    fn test_calls_without_object_literal_are_ignored() {
        assert!(lint("x.kendoGrid(options); x.kendoGrid(); x['kendoGrid']({ a: 1 }); x.kendo({ a: 1 });").is_empty());
    }

    #[test]
    fn test_nested_calls_are_found() {
        let diags = lint(
            "x.kendoWidget({ change: function () { y.kendoWidget({ size: 1 }); } });",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Bad type for option size. Accepted: String");
    }

    #[test]
    fn test_syntax_error() {
        let diags = lint("var a = ;");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Unexpected token ';'");
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].position, Some(Position::new(1, 9, 8)));
    }

    #[test]
    fn test_prefixed_method() {
        let expr = doclint_script::parse_expression("a.b.kendoTabStrip").unwrap();
        let (name, span) = prefixed_method(&expr, "kendo").unwrap();
        assert_eq!(name, "TabStrip");
        assert_eq!(span.start, Position::new(1, 5, 4));
    }
}
