//! Checking configuration objects against component schemas.

use doclint_script::{parse_expression, print};

use crate::diagnostic::Diagnostic;
use crate::literal::{ConfigEntry, ConfigLiteral};
use crate::model::{ComponentSchema, OptionDescriptor, SchemaModel, TypeTag};

/// Validates configuration entries against a [`SchemaModel`].
///
/// Every check returns its own diagnostics; nothing is written to the
/// schema.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'s> {
    schema: &'s SchemaModel,
}

impl<'s> Validator<'s> {
    /// A validator resolving schema references against `schema`.
    pub fn new(schema: &'s SchemaModel) -> Self {
        Self { schema }
    }

    /// Check every entry of a component's configuration object.
    pub fn check_component(
        &self,
        component: &ComponentSchema,
        entries: &[ConfigEntry<'_>],
    ) -> Vec<Diagnostic> {
        entries
            .iter()
            .flat_map(|entry| self.check_option(component, None, entry))
            .collect()
    }

    /// Check one entry. `scope` is the list of sub-options the entry
    /// belongs to; `None` means the component's own options and events.
    pub fn check_option(
        &self,
        component: &ComponentSchema,
        scope: Option<&[OptionDescriptor]>,
        entry: &ConfigEntry<'_>,
    ) -> Vec<Diagnostic> {
        let descriptor = match scope {
            Some(list) => list.iter().find(|o| o.name == entry.key),
            None => component.option(&entry.key),
        };
        let Some(descriptor) = descriptor else {
            return vec![Diagnostic::error(format!("Option {} not found", entry.key))
                .at(entry.position)
                .with_length(entry.length)];
        };

        let mut diagnostics = Vec::new();
        let literal = ConfigLiteral::classify(entry.value);
        if !descriptor.accepted_types.is_empty() && literal.is_resolved() {
            match self.check_type(component, descriptor, &literal) {
                Some(nested) => diagnostics.extend(nested),
                None => {
                    let span = entry.value.span;
                    return vec![Diagnostic::error(format!(
                        "Bad type for option {}. Accepted: {}",
                        descriptor.display_name(),
                        descriptor.accepted_types_list()
                    ))
                    .at(span.start)
                    .with_length(span.end.offset.saturating_sub(span.start.offset))];
                }
            }
        }

        if let Some(default) = &descriptor.default_literal {
            diagnostics.extend(check_default(descriptor, default, entry));
        }
        diagnostics
    }

    /// Match a literal against the accepted types, first match wins.
    /// `None` means no type matched; otherwise the diagnostics from
    /// checking inside a matched object.
    fn check_type(
        &self,
        component: &ComponentSchema,
        descriptor: &OptionDescriptor,
        literal: &ConfigLiteral<'_>,
    ) -> Option<Vec<Diagnostic>> {
        for tag in &descriptor.accepted_types {
            match (tag, literal) {
                (TypeTag::Array, ConfigLiteral::Array(_))
                | (TypeTag::String | TypeTag::Selector, ConfigLiteral::String(_))
                | (TypeTag::Number, ConfigLiteral::Number(_))
                | (TypeTag::Boolean, ConfigLiteral::Boolean(_))
                | (TypeTag::Function, ConfigLiteral::Function) => return Some(Vec::new()),
                (TypeTag::Object, ConfigLiteral::Object(entries)) => {
                    return Some(self.check_object(component, descriptor, entries));
                }
                _ => {}
            }
        }
        None
    }

    /// Check the entries of a value that matched `Object`: against the
    /// component the type union refers to, if any, otherwise against the
    /// option's own sub-options. A schema reference alone never matches.
    fn check_object(
        &self,
        component: &ComponentSchema,
        descriptor: &OptionDescriptor,
        entries: &[ConfigEntry<'_>],
    ) -> Vec<Diagnostic> {
        let schema_ref = descriptor.accepted_types.iter().find_map(|tag| match tag {
            TypeTag::ObjectWithSchemaRef(id) => Some(id.as_str()),
            _ => None,
        });

        if let Some(id) = schema_ref {
            match self.schema.get(id) {
                Some(target) => return self.check_component(target, entries),
                None => tracing::debug!(
                    option = descriptor.display_name(),
                    schema = id,
                    "referenced schema missing, checking sub-options"
                ),
            }
        }

        if descriptor.sub.is_empty() {
            return Vec::new();
        }
        entries
            .iter()
            .flat_map(|entry| self.check_option(component, Some(&descriptor.sub), entry))
            .collect()
    }
}

/// Warn when a value prints the same as the documented default.
fn check_default(
    descriptor: &OptionDescriptor,
    default: &str,
    entry: &ConfigEntry<'_>,
) -> Option<Diagnostic> {
    let expected = match parse_expression(default) {
        Ok(expr) => print(&expr),
        Err(err) => {
            tracing::debug!(
                option = descriptor.display_name(),
                default,
                error = %err,
                "default value does not parse"
            );
            return None;
        }
    };
    if expected != print(entry.value) {
        return None;
    }
    Some(
        Diagnostic::warning(format!(
            "Passed value for option {} is the same as default value: {expected}",
            descriptor.display_name()
        ))
        .at(entry.position)
        .with_length(entry.length),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;
    use doclint_markup::Position;
    use doclint_script::Expression;
    use pretty_assertions::assert_eq;

    fn schema() -> SchemaModel {
        SchemaModel::builder()
            .component(
                ComponentSchema::new("kendo.ui.Widget")
                    .with_option(OptionDescriptor::new("size", &["String"]))
                    .with_option(OptionDescriptor::new("animation", &["Boolean", "Object"]))
                    .with_option(OptionDescriptor::new("animation.duration", &["Number"]))
                    .with_option(OptionDescriptor::new("effect", &["String"]).with_default("\"none\""))
                    .with_option(OptionDescriptor::new("height", &["Number", "String"]))
                    .with_option(OptionDescriptor::new("template", &["String", "Function"]))
                    .with_option(OptionDescriptor::new("columns", &["Array"]))
                    .with_option(OptionDescriptor::new("position", &["Object"]).with_default("{ top: 0 }"))
                    .with_option(OptionDescriptor::new("culture", &["Date"]))
                    .with_option(OptionDescriptor::new("broken", &["String"]).with_default("{"))
                    .with_option(OptionDescriptor::new(
                        "dataSource",
                        &["Object", "Array", "kendo.data.DataSource"],
                    ))
                    .with_option(OptionDescriptor::new("remote", &["Object", "kendo.data.Missing"]))
                    .with_option(OptionDescriptor::new("source", &["kendo.data.DataSource"]))
                    .with_option(OptionDescriptor::new("remote.url", &["String"]))
                    .with_event("change"),
            )
            .component(
                ComponentSchema::new("kendo.data.DataSource")
                    .with_option(OptionDescriptor::new("pageSize", &["Number"]))
                    .with_option(OptionDescriptor::new("serverPaging", &["Boolean"]).with_default("false")),
            )
            .build()
            .unwrap()
    }

    fn check(config: &str) -> Vec<Diagnostic> {
        let schema = schema();
        let value: Expression = parse_expression(config).unwrap();
        let widget = schema.get("kendo.ui.Widget").unwrap();
        Validator::new(&schema).check_component(widget, &ConfigEntry::from_object(&value))
    }

    fn messages(config: &str) -> Vec<String> {
        check(config).into_iter().map(|d| d.message).collect()
    }

    #[test]
    fn test_bad_type_lists_accepted_types() {
        let diags = check("{size: 10}");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Bad type for option size. Accepted: String");
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].position, Some(Position::new(1, 8, 7)));
        assert_eq!(diags[0].length, Some(2));
    }

    #[test]
    fn test_nested_sub_option_type() {
        let diags = check("{animation:{duration:\"x\"}}");
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].message,
            "Bad type for option animation.duration. Accepted: Number"
        );
        assert_eq!(diags[0].position, Some(Position::new(1, 22, 21)));
    }

    #[test]
    fn test_unknown_sub_option() {
        assert_eq!(
            messages("{animation: {duration: 200, easing: 'swing'}}"),
            vec!["Option easing not found"]
        );
        assert!(messages("{animation: false}").is_empty());
    }

    #[test]
    fn test_default_redundancy() {
        let diags = check("{effect: \"none\"}");
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].message,
            "Passed value for option effect is the same as default value: \"none\""
        );
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].position, Some(Position::new(1, 2, 1)));
        assert_eq!(diags[0].length, Some(6));

        assert!(check("{effect: \"fade\"}").is_empty());
        assert_eq!(check("{effect: 'none'}").len(), 1);
    }

    #[test]
    fn test_default_compares_printed_form() {
        assert_eq!(check("{position: {'top':0}}").len(), 1);
        assert!(check("{position: {top: 1}}").is_empty());
    }

    #[test]
    fn test_unparseable_default_is_skipped() {
        assert!(check("{broken: '{'}").is_empty());
    }

    #[test]
    fn test_unknown_option_does_not_stop_siblings() {
        assert_eq!(
            messages("{sise: 'x', size: 1, heigth: 2}"),
            vec![
                "Option sise not found",
                "Bad type for option size. Accepted: String",
                "Option heigth not found",
            ]
        );
    }

    #[test]
    fn test_unknown_option_position_is_key() {
        let diags = check("{\n  pageSiz: 10\n}");
        assert_eq!(diags[0].position, Some(Position::new(2, 3, 4)));
        assert_eq!(diags[0].length, Some(7));
    }

    #[test]
    fn test_type_unions() {
        assert!(check("{height: 400, template: '#= name #', columns: []}").is_empty());
        assert!(check("{height: '50%', template: function (item) { return item; }}").is_empty());
        assert!(check("{template: (item) => item.name}").is_empty());
        assert_eq!(
            messages("{columns: {}}"),
            vec!["Bad type for option columns. Accepted: Array"]
        );
        assert_eq!(
            messages("{height: /x/}"),
            vec!["Bad type for option height. Accepted: Number, String"]
        );
    }

    #[test]
    fn test_unresolved_values_are_accepted() {
        assert!(check("{size: mySize, height: a + b, columns: null, template: tpl()}").is_empty());
    }

    #[test]
    fn test_named_type_rejects_literals() {
        assert_eq!(
            messages("{culture: 'en-US'}"),
            vec!["Bad type for option culture. Accepted: Date"]
        );
        assert!(check("{culture: new Date()}").is_empty());
    }

    #[test]
    fn test_events_are_options() {
        assert!(check("{change: function (e) {}}").is_empty());
        assert_eq!(
            messages("{change: 'onChange'}"),
            vec!["Bad type for option change. Accepted: Function"]
        );
    }

    #[test]
    fn test_schema_reference_delegates() {
        assert_eq!(
            messages("{dataSource: {pageSize: 'ten', serverPaging: false, transport: {}}}"),
            vec![
                "Bad type for option pageSize. Accepted: Number",
                "Passed value for option serverPaging is the same as default value: false",
                "Option transport not found",
            ]
        );
        assert!(check("{dataSource: [1, 2]}").is_empty());
    }

    #[test]
    fn test_schema_reference_alone_is_not_an_object_type() {
        let diags = check("{source: {pageSize: 1}}");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Bad type for option source. Accepted: kendo.data.DataSource");
        assert_eq!(diags[0].position, Some(Position::new(1, 10, 9)));
        assert!(check("{source: dataSource}").is_empty());
    }

    #[test]
    fn test_missing_schema_reference_falls_back_to_sub() {
        assert_eq!(
            messages("{remote: {url: 1}}"),
            vec!["Bad type for option remote.url. Accepted: String"]
        );
    }

    #[test]
    fn test_scoped_lookup_ignores_top_level() {
        let schema = schema();
        let widget = schema.get("kendo.ui.Widget").unwrap();
        let value = parse_expression("{size: 'x'}").unwrap();
        let entries = ConfigEntry::from_object(&value);
        let scope: Vec<OptionDescriptor> = Vec::new();
        let diags = Validator::new(&schema).check_option(widget, Some(scope.as_slice()), &entries[0]);
        assert_eq!(diags[0].message, "Option size not found");
    }
}
