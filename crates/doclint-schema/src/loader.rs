//! Building a [`SchemaModel`] from the documentation pipeline's JSON or
//! from code.
//!
//! The JSON maps each component id to its documented members:
//!
//! ```json
//! {
//!   "kendo.ui.Grid": {
//!     "name": "kendo.ui.Grid",
//!     "config": [{ "name": "pageable", "type": ["Boolean", "Object"], "default": "false" }],
//!     "events": [{ "name": "change" }],
//!     "methods": [{ "name": "refresh", "args": [] }],
//!     "fields": []
//!   }
//! }
//! ```
//!
//! Options documented under dotted names (`pageable.pageSize`) are moved
//! under their parent option while loading.

use serde::Deserialize;

use crate::model::{ComponentSchema, MethodDescriptor, OptionDescriptor, SchemaModel, TypeTag};
use crate::SchemaError;

#[derive(Debug, Deserialize)]
struct RawComponent {
    name: Option<String>,
    #[serde(default)]
    config: Vec<RawOption>,
    #[serde(default)]
    events: Vec<RawMethod>,
    #[serde(default)]
    methods: Vec<RawMethod>,
    #[serde(default)]
    fields: Vec<RawOption>,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    name: String,
    #[serde(rename = "type", default)]
    types: Vec<String>,
    default: Option<String>,
    #[serde(default)]
    sub: Vec<RawOption>,
    orig: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMethod {
    name: String,
    #[serde(default)]
    args: Vec<RawOption>,
}

impl From<RawOption> for OptionDescriptor {
    fn from(raw: RawOption) -> Self {
        OptionDescriptor {
            name: raw.name,
            original_name: raw.orig,
            accepted_types: raw.types.iter().map(|t| TypeTag::parse(t)).collect(),
            default_literal: raw.default,
            sub: raw.sub.into_iter().map(OptionDescriptor::from).collect(),
        }
    }
}

impl RawComponent {
    fn into_schema(self, id: String) -> ComponentSchema {
        ComponentSchema {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            options: self.config.into_iter().map(OptionDescriptor::from).collect(),
            events: self
                .events
                .into_iter()
                .map(|e| OptionDescriptor::event(e.name))
                .collect(),
            methods: self
                .methods
                .into_iter()
                .map(|m| {
                    MethodDescriptor::new(
                        m.name,
                        m.args.into_iter().map(OptionDescriptor::from).collect(),
                    )
                })
                .collect(),
            fields: self.fields.into_iter().map(OptionDescriptor::from).collect(),
        }
    }
}

impl SchemaModel {
    /// Load the documentation pipeline's JSON output.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let raw: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(text).map_err(|e| SchemaError::Json(e.to_string()))?;

        let mut builder = SchemaModel::builder();
        for (id, value) in raw {
            let component: RawComponent =
                serde_json::from_value(value).map_err(|e| SchemaError::Component {
                    id: id.clone(),
                    message: e.to_string(),
                })?;
            builder = builder.component(component.into_schema(id));
        }
        builder.build()
    }

    /// Start building a model by hand.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }
}

/// Collects components, then nests dotted options and indexes them.
///
/// ```
/// use doclint_schema::{ComponentSchema, OptionDescriptor, SchemaModel};
///
/// let schema = SchemaModel::builder()
///     .component(
///         ComponentSchema::new("kendo.ui.Grid")
///             .with_option(OptionDescriptor::new("pageable", &["Boolean", "Object"]))
///             .with_option(OptionDescriptor::new("pageable.pageSize", &["Number"])),
///     )
///     .build()
///     .unwrap();
/// let grid = schema.get("kendo.ui.Grid").unwrap();
/// assert_eq!(grid.options.len(), 1);
/// assert_eq!(grid.options[0].sub[0].name, "pageSize");
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    components: Vec<ComponentSchema>,
}

impl SchemaBuilder {
    pub fn component(mut self, component: ComponentSchema) -> Self {
        self.components.push(component);
        self
    }

    /// Nest dotted options and index the components. Fails on a
    /// duplicate id.
    pub fn build(mut self) -> Result<SchemaModel, SchemaError> {
        for (i, component) in self.components.iter().enumerate() {
            if self.components[..i].iter().any(|c| c.id == component.id) {
                return Err(SchemaError::DuplicateComponent(component.id.clone()));
            }
        }

        for component in &mut self.components {
            let nested = nest_dotted_options(component);
            if nested > 0 {
                tracing::debug!(component = %component.id, nested, "nested dotted options");
            }
        }

        tracing::debug!(components = self.components.len(), "schema loaded");
        Ok(SchemaModel::from_components(self.components))
    }
}

/// Move every option named `parent.child` under its parent option, if the
/// component has one, renaming it to `child` and keeping the dotted name
/// as its original name. Options are visited last to first so a chain
/// like `a.b.c` lands under `a.b` before `a.b` moves under `a`. Returns
/// the number of options moved.
fn nest_dotted_options(component: &mut ComponentSchema) -> usize {
    let mut moved = 0;
    let mut i = component.options.len();
    while i > 0 {
        i -= 1;
        let Some((parent, child)) = split_dotted(&component.options[i].name) else {
            continue;
        };
        let (parent, child) = (parent.to_string(), child.to_string());

        let in_options = component.options.iter().position(|o| o.name == parent);
        let in_events = component.events.iter().position(|o| o.name == parent);
        let slot = match (in_options, in_events) {
            (Some(j), _) if j > i => Slot::Option(j - 1),
            (Some(j), _) => Slot::Option(j),
            (None, Some(j)) => Slot::Event(j),
            (None, None) => continue,
        };

        let mut option = component.options.remove(i);
        option.original_name = Some(std::mem::replace(&mut option.name, child));
        let target = match slot {
            Slot::Option(j) => &mut component.options[j],
            Slot::Event(j) => &mut component.events[j],
        };
        // Later siblings were inserted first; inserting at the front keeps
        // documentation order.
        target.sub.insert(0, option);
        moved += 1;
    }
    moved
}

enum Slot {
    Option(usize),
    Event(usize),
}

/// `a.b.c` splits into `a.b` and `c`; both halves must be non-empty.
fn split_dotted(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once('.')
        .filter(|(parent, child)| !parent.is_empty() && !child.is_empty())
}
