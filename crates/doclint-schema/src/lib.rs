//! doclint component schemas
//!
//! Holds what the API documentation says about each component (its
//! configuration options with their accepted types and defaults, events,
//! methods and fields) and checks configuration objects written in pages
//! against it.
//!
//! # Example
//!
//! ```
//! use doclint_schema::{ComponentSchema, ConfigEntry, OptionDescriptor, SchemaModel, Validator};
//!
//! let schema = SchemaModel::builder()
//!     .component(
//!         ComponentSchema::new("kendo.ui.Grid")
//!             .with_option(OptionDescriptor::new("height", &["Number", "String"])),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let config = doclint_script::parse_expression("{ height: true }").unwrap();
//! let grid = schema.get("kendo.ui.Grid").unwrap();
//! let diagnostics = Validator::new(&schema).check_component(grid, &ConfigEntry::from_object(&config));
//! assert_eq!(
//!     diagnostics[0].message,
//!     "Bad type for option height. Accepted: Number, String"
//! );
//! ```

pub mod diagnostic;
pub mod literal;
pub mod loader;
pub mod model;
pub mod search;
pub mod validate;

pub use diagnostic::{Diagnostic, Severity};
pub use literal::{ConfigEntry, ConfigLiteral};
pub use loader::SchemaBuilder;
pub use model::{ComponentSchema, MethodDescriptor, OptionDescriptor, SchemaModel, TypeTag};
pub use search::{Member, SearchError, SearchHit};
pub use validate::Validator;

/// A schema that could not be loaded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema error: {0}")]
    Json(String),
    #[error("Schema error in component {id}: {message}")]
    Component { id: String, message: String },
    #[error("Schema error: component {0} is defined twice")]
    DuplicateComponent(String),
}
