//! doclint
//!
//! Checks how pages and scripts configure library components against the
//! components' API documentation. Components are found in two places:
//!
//! - scripted calls such as `$("#grid").kendoGrid({ pageSize: 10 })`
//! - markup such as `<div data-role="grid" data-page-size="10">`
//!
//! Each configuration object is validated against the component's
//! [`SchemaModel`]: unknown options, values of the wrong type, and values
//! equal to the documented default are reported. Scripts and templates
//! embedded in markup are checked too, with positions reported in the
//! enclosing document.
//!
//! # Example
//!
//! ```
//! use doclint::{ComponentSchema, Linter, OptionDescriptor, SchemaModel};
//!
//! let schema = SchemaModel::builder()
//!     .component(
//!         ComponentSchema::new("kendo.ui.Grid")
//!             .with_option(OptionDescriptor::new("pageSize", &["Number"])),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let linter = Linter::new(&schema);
//! let diagnostics = linter.lint_markup(
//!     r#"<div data-role="grid" data-page-size="'10'"></div>"#,
//!     "index.html",
//! );
//! assert_eq!(
//!     diagnostics[0].to_string(),
//!     "index.html:1:39: error: Bad type for option pageSize. Accepted: Number"
//! );
//! ```

pub mod config;
mod markup;
mod script;
pub mod usage;

pub use config::LintConfig;
pub use doclint_schema::{
    ComponentSchema, Diagnostic, MethodDescriptor, OptionDescriptor, SchemaError, SchemaModel,
    Severity,
};
pub use usage::{detect, UsageReport};

/// A lint configuration that could not be loaded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Config error: {message}")]
pub struct ConfigError {
    pub message: String,
}

/// Lints sources against a shared, read-only schema.
///
/// A `Linter` holds no per-file state, so one value can lint any number of
/// files, and several can share a schema across threads.
#[derive(Debug, Clone)]
pub struct Linter<'s> {
    schema: &'s SchemaModel,
    config: LintConfig,
}

impl<'s> Linter<'s> {
    /// A linter with the default configuration.
    pub fn new(schema: &'s SchemaModel) -> Self {
        Self::with_config(schema, LintConfig::default())
    }

    /// A linter with an explicit configuration.
    pub fn with_config(schema: &'s SchemaModel, config: LintConfig) -> Self {
        Self { schema, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    /// The schema diagnostics are checked against.
    pub fn schema(&self) -> &'s SchemaModel {
        self.schema
    }

    /// Lint a script file.
    pub fn lint_script(&self, text: &str, filename: &str) -> Vec<Diagnostic> {
        let _span = tracing::debug_span!("lint_script", filename).entered();
        let diagnostics = self.check_script(text);
        tracing::debug!(count = diagnostics.len(), "script linted");
        with_filename(diagnostics, filename)
    }

    /// Lint a markup file, including its embedded scripts and templates.
    pub fn lint_markup(&self, text: &str, filename: &str) -> Vec<Diagnostic> {
        let _span = tracing::debug_span!("lint_markup", filename).entered();
        let diagnostics = self.check_markup(text);
        tracing::debug!(count = diagnostics.len(), "markup linted");
        with_filename(diagnostics, filename)
    }
}

fn with_filename(diagnostics: Vec<Diagnostic>, filename: &str) -> Vec<Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| d.in_file(filename))
        .collect()
}
