//! Component schemas as read from the API documentation.

use std::collections::HashMap;
use std::fmt;

/// One entry of an option's accepted type union.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Array,
    String,
    /// A CSS selector, written as a string.
    Selector,
    Number,
    Boolean,
    Function,
    Object,
    /// Refers to another component's schema, such as
    /// `kendo.data.DataSource`. An `Object` in the same union is checked
    /// against that schema; the reference alone accepts no literal.
    ObjectWithSchemaRef(String),
    /// A documented type no literal can have, such as `Date` or `jQuery`.
    Named(String),
}

impl TypeTag {
    /// Map a documented type name onto a tag.
    pub fn parse(name: &str) -> Self {
        match name {
            "Array" => TypeTag::Array,
            "String" => TypeTag::String,
            "Selector" => TypeTag::Selector,
            "Number" => TypeTag::Number,
            "Boolean" => TypeTag::Boolean,
            "Function" => TypeTag::Function,
            "Object" => TypeTag::Object,
            _ if name.contains('.') => TypeTag::ObjectWithSchemaRef(name.to_string()),
            _ => TypeTag::Named(name.to_string()),
        }
    }

    /// The documented spelling.
    pub fn name(&self) -> &str {
        match self {
            TypeTag::Array => "Array",
            TypeTag::String => "String",
            TypeTag::Selector => "Selector",
            TypeTag::Number => "Number",
            TypeTag::Boolean => "Boolean",
            TypeTag::Function => "Function",
            TypeTag::Object => "Object",
            TypeTag::ObjectWithSchemaRef(id) | TypeTag::Named(id) => id,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configuration option, event, or field.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDescriptor {
    pub name: String,
    /// Dotted name the option was documented under, when it was nested
    /// under its parent (`animation.open` becomes `open` with this set).
    pub original_name: Option<String>,
    pub accepted_types: Vec<TypeTag>,
    /// Default value as a script literal, e.g. `"none"` or `{ width: 100 }`.
    pub default_literal: Option<String>,
    pub sub: Vec<OptionDescriptor>,
}

impl OptionDescriptor {
    /// An option accepting the given documented type names.
    pub fn new(name: impl Into<String>, types: &[&str]) -> Self {
        Self {
            name: name.into(),
            original_name: None,
            accepted_types: types.iter().map(|t| TypeTag::parse(t)).collect(),
            default_literal: None,
            sub: Vec::new(),
        }
    }

    /// An event handler option.
    pub fn event(name: impl Into<String>) -> Self {
        Self::new(name, &["Function"])
    }

    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        self.default_literal = Some(literal.into());
        self
    }

    /// Nest a sub-option under this one.
    pub fn with_sub(mut self, option: OptionDescriptor) -> Self {
        self.sub.push(option);
        self
    }

    /// The name diagnostics use: the documented dotted form if there is one.
    pub fn display_name(&self) -> &str {
        self.original_name.as_deref().unwrap_or(&self.name)
    }

    /// Accepted types joined for messages, e.g. `String, Function`.
    pub fn accepted_types_list(&self) -> String {
        self.accepted_types
            .iter()
            .map(TypeTag::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub name: String,
    pub args: Vec<OptionDescriptor>,
}

impl MethodDescriptor {
    /// A method taking `args` in order.
    pub fn new(name: impl Into<String>, args: Vec<OptionDescriptor>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Everything documented about one component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSchema {
    /// Full documented id, e.g. `kendo.ui.Grid`.
    pub id: String,
    /// Display name; the id when the documentation gives none.
    pub name: String,
    pub options: Vec<OptionDescriptor>,
    pub events: Vec<OptionDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub fields: Vec<OptionDescriptor>,
}

impl ComponentSchema {
    /// An empty schema whose display name is its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            options: Vec::new(),
            events: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: OptionDescriptor) -> Self {
        self.options.push(option);
        self
    }

    /// Add an event, configured as a `Function` option.
    pub fn with_event(mut self, name: impl Into<String>) -> Self {
        self.events.push(OptionDescriptor::event(name));
        self
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_field(mut self, field: OptionDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// A top-level configuration option, falling back to events, which are
    /// configured the same way.
    pub fn option(&self, name: &str) -> Option<&OptionDescriptor> {
        self.options
            .iter()
            .chain(&self.events)
            .find(|o| o.name == name)
    }
}

/// All known components, keyed by id, in documentation order.
///
/// Built once, then only read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaModel {
    components: Vec<ComponentSchema>,
    index: HashMap<String, usize>,
}

impl SchemaModel {
    pub(crate) fn from_components(components: Vec<ComponentSchema>) -> Self {
        let index = components
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self { components, index }
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components in documentation order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentSchema> {
        self.components.iter()
    }

    /// Exact lookup by id.
    pub fn get(&self, id: &str) -> Option<&ComponentSchema> {
        self.index.get(id).map(|&i| &self.components[i])
    }

    /// Lookup by id, ignoring case.
    pub fn get_ci(&self, id: &str) -> Option<&ComponentSchema> {
        self.get(id).or_else(|| {
            let id = id.to_lowercase();
            self.components.iter().find(|c| c.id.to_lowercase() == id)
        })
    }

    /// First component whose id ends with `name`, ignoring case, where the
    /// match starts the id or follows a `.`: `grid` finds `kendo.ui.Grid`
    /// but not `kendo.ui.TreeGrid`.
    pub fn find_by_suffix_ci(&self, name: &str) -> Option<&ComponentSchema> {
        let name = name.to_lowercase();
        if name.is_empty() {
            return None;
        }
        self.components.iter().find(|c| {
            let id = c.id.to_lowercase();
            id.strip_suffix(&name)
                .is_some_and(|head| head.is_empty() || head.ends_with('.'))
        })
    }

    /// Resolve a short component name used in a page (`Grid`, `grid`)
    /// within `namespace` (`kendo.ui.`).
    pub fn resolve_ui(&self, name: &str, namespace: &str) -> Option<&ComponentSchema> {
        self.get_ci(&format!("{namespace}{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn model() -> SchemaModel {
        SchemaModel::from_components(vec![
            ComponentSchema::new("kendo.ui.TreeGrid"),
            ComponentSchema::new("kendo.ui.Grid"),
            ComponentSchema::new("kendo.data.DataSource"),
        ])
    }

    #[test]
    fn test_type_tag_parse() {
        assert_eq!(TypeTag::parse("Selector"), TypeTag::Selector);
        assert_eq!(
            TypeTag::parse("kendo.data.DataSource"),
            TypeTag::ObjectWithSchemaRef("kendo.data.DataSource".to_string())
        );
        assert_eq!(TypeTag::parse("Date"), TypeTag::Named("Date".to_string()));
        assert_eq!(TypeTag::parse("Date").to_string(), "Date");
    }

    #[test]
    fn test_accepted_types_list() {
        let op = OptionDescriptor::new("dataSource", &["Object", "Array", "kendo.data.DataSource"]);
        assert_eq!(op.accepted_types_list(), "Object, Array, kendo.data.DataSource");
    }

    #[test]
    fn test_exact_and_case_insensitive_lookup() {
        let model = model();
        assert_eq!(model.get("kendo.ui.Grid").map(|c| c.id.as_str()), Some("kendo.ui.Grid"));
        assert!(model.get("kendo.ui.grid").is_none());
        assert_eq!(
            model.get_ci("KENDO.UI.GRID").map(|c| c.id.as_str()),
            Some("kendo.ui.Grid")
        );
    }

    #[test]
    fn test_suffix_lookup_respects_segment_boundary() {
        let model = model();
        assert_eq!(
            model.find_by_suffix_ci("grid").map(|c| c.id.as_str()),
            Some("kendo.ui.Grid")
        );
        assert_eq!(
            model.find_by_suffix_ci("data.datasource").map(|c| c.id.as_str()),
            Some("kendo.data.DataSource")
        );
        assert!(model.find_by_suffix_ci("rid").is_none());
        assert!(model.find_by_suffix_ci("").is_none());
    }

    #[test]
    fn test_resolve_ui() {
        let model = model();
        assert_eq!(
            model.resolve_ui("treegrid", "kendo.ui.").map(|c| c.id.as_str()),
            Some("kendo.ui.TreeGrid")
        );
        assert!(model.resolve_ui("Chart", "kendo.ui.").is_none());
    }

    #[test]
    fn test_option_falls_back_to_events() {
        let grid = ComponentSchema::new("kendo.ui.Grid")
            .with_option(OptionDescriptor::new("sortable", &["Boolean"]))
            .with_event("change");
        assert!(grid.option("sortable").is_some());
        assert_eq!(
            grid.option("change").map(|o| o.accepted_types.clone()),
            Some(vec![TypeTag::Function])
        );
        assert!(grid.option("missing").is_none());
    }

    #[test]
    fn test_display_name_prefers_original() {
        let mut op = OptionDescriptor::new("open", &["Object"]);
        assert_eq!(op.display_name(), "open");
        op.original_name = Some("animation.open".to_string());
        assert_eq!(op.display_name(), "animation.open");
    }
}
