//! Which components a set of pages and scripts uses, for building a
//! trimmed library bundle.

use doclint_markup::{parse_with_options, Element, ParseOptions};
use doclint_script::{parse_program, walk_expression, walk_program, ExprKind, Expression, Visitor};
use serde::Serialize;

use crate::config::LintConfig;
use crate::markup::{embedded_kind, Embedded, MAX_TEMPLATE_DEPTH};
use crate::script::prefixed_method;

/// Components found by [`detect`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    /// Component names as first written (`Grid`, `grid`), without
    /// repeats, compared ignoring case.
    pub components: Vec<String>,
    /// A `kendo.bind(...)` call was seen, so the binder is needed.
    pub uses_binder: bool,
}

impl UsageReport {
    fn add(&mut self, name: &str) {
        if !self.components.iter().any(|c| c.eq_ignore_ascii_case(name)) {
            self.components.push(name.to_string());
        }
    }
}

/// Collect the components used by scripted calls in `scripts` and by role
/// attributes in `markups`, including scripts and templates embedded in
/// the markup. Sources that do not parse are skipped.
pub fn detect<'a>(
    scripts: impl IntoIterator<Item = &'a str>,
    markups: impl IntoIterator<Item = &'a str>,
    config: &LintConfig,
) -> UsageReport {
    let mut report = UsageReport::default();
    for script in scripts {
        scan_script(script, config, &mut report);
    }
    for markup in markups {
        scan_markup(markup, config, 0, &mut report);
    }
    tracing::debug!(components = report.components.len(), uses_binder = report.uses_binder, "usage detected");
    report
}

struct Usage<'c> {
    config: &'c LintConfig,
    report: &'c mut UsageReport,
}

impl<'ast> Visitor<'ast> for Usage<'_> {
    fn visit_expression(&mut self, expr: &'ast Expression) {
        if let ExprKind::Call { callee, .. } = &expr.kind {
            if let Some((component, _)) = prefixed_method(callee, &self.config.method_prefix) {
                self.report.add(component);
            }
            if is_bind_call(callee, self.config.namespace_root()) {
                self.report.uses_binder = true;
            }
        }
        walk_expression(self, expr);
    }
}

/// `kendo.bind`
fn is_bind_call(callee: &Expression, root: &str) -> bool {
    let ExprKind::Member {
        object,
        property,
        computed: false,
        ..
    } = &callee.kind
    else {
        return false;
    };
    matches!(&object.kind, ExprKind::Identifier(name) if name == root)
        && matches!(&property.kind, ExprKind::Identifier(name) if name == "bind")
}

fn scan_script(text: &str, config: &LintConfig, report: &mut UsageReport) {
    match parse_program(text) {
        Ok(program) => walk_program(&mut Usage { config, report }, &program),
        Err(err) => tracing::debug!(error = %err, "skipping script that does not parse"),
    }
}

/// `templates` counts the templates enclosing `text`.
fn scan_markup(text: &str, config: &LintConfig, templates: usize, report: &mut UsageReport) {
    let options = ParseOptions {
        asp: config.asp,
        ..ParseOptions::default()
    };
    let document = parse_with_options(text, options);
    scan_element(&document.root, config, templates, report);
}

fn scan_element(element: &Element, config: &LintConfig, templates: usize, report: &mut UsageReport) {
    if element.name.eq_ignore_ascii_case("script") {
        if let Some(kind) = embedded_kind(element) {
            let Some(body) = element.raw_text() else {
                return;
            };
            match kind {
                Embedded::Script => scan_script(&body.text, config, report),
                Embedded::Template if templates == MAX_TEMPLATE_DEPTH => {
                    tracing::debug!(line = body.span.start.line, "template nested too deeply, skipped");
                }
                Embedded::Template => scan_markup(&body.text, config, templates + 1, report),
            }
            return;
        }
    }

    if let Some(role) = element
        .attribute(&config.role_attribute)
        .and_then(|a| a.value.as_deref())
    {
        report.add(role);
    }
    for child in element.elements() {
        scan_element(child, config, templates, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_scripts() {
        let report = detect(
            [
                "$('#a').kendoGrid(); $('#b').kendoDropDownList({}); x.kendoGrid(opts);",
                "kendo.bind(document.body, viewModel);",
            ],
            NONE,
            &LintConfig::default(),
        );
        assert_eq!(
            report,
            UsageReport {
                components: vec!["Grid".to_string(), "DropDownList".to_string()],
                uses_binder: true,
            }
        );
    }

    #[test]
    fn test_markup_and_embedded_regions() {
        let page = r#"<div data-role="window">
  <ul data-role="grid"></ul>
  <script>$('#m').kendoMenu();</script>
  <script type="text/x-kendo-template"><span data-role="ListView"></span></script>
  <script type="text/json">{ "kendoChart": 1 }</script>
</div>"#;
        let report = detect(NONE, [page], &LintConfig::default());
        assert_eq!(report.components, vec!["window", "grid", "Menu", "ListView"]);
        assert!(!report.uses_binder);
    }

    #[test]
    fn test_repeats_ignore_case() {
        let report = detect(["a.kendoGrid()"], [r#"<p data-role="grid"></p>"#], &LintConfig::default());
        assert_eq!(report.components, vec!["Grid"]);
    }

    #[test]
    fn test_unparseable_script_is_skipped() {
        let report = detect(["var = ;", "y.kendoSlider()"], NONE, &LintConfig::default());
        assert_eq!(report.components, vec!["Slider"]);
    }

    #[test]
    fn test_script_types_match_linting() {
        let page = r#"<script type="text/javascript" src="grid.js">x.kendoGrid()</script>
<script type="text/json" data-role="chart">x.kendoMenu()</script>"#;
        let report = detect(NONE, [page], &LintConfig::default());
        assert_eq!(report.components, vec!["chart"]);
    }

    #[test]
    fn test_deep_templates_are_bounded() {
        let page = format!(
            "{}<b data-role=\"chart\"></b>",
            r#"<script type="text/x-template">"#.repeat(20_000)
        );
        let report = detect(NONE, [page.as_str()], &LintConfig::default());
        assert!(report.components.is_empty());

        let page = format!("{}<b data-role=\"chart\"></b>", r#"<script type="text/x-template">"#.repeat(4));
        assert_eq!(detect(NONE, [page.as_str()], &LintConfig::default()).components, vec!["chart"]);
    }

    #[test]
    fn test_other_namespace() {
        let config = LintConfig::from_json(r#"{ "namespace": "acme.ui.", "methodPrefix": "acme" }"#).unwrap();
        let report = detect(["$(x).acmeTree(); acme.bind(x); kendo.bind(y);"], NONE, &config);
        assert_eq!(report.components, vec!["Tree"]);
        assert!(report.uses_binder);
    }
}
