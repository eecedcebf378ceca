//! Lint settings.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Naming conventions the linter looks for.
///
/// Every field has a default, so a JSON config only lists what differs:
///
/// ```
/// use doclint::LintConfig;
///
/// let config = LintConfig::from_json(r#"{ "asp": true }"#).unwrap();
/// assert!(config.asp);
/// assert_eq!(config.role_attribute, "data-role");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LintConfig {
    /// Joined to a short component name to form its schema id.
    pub namespace: String,
    /// Method name prefix of scripted component calls: `$(el).kendoGrid({...})`.
    pub method_prefix: String,
    /// Prefix of configuration attributes in markup.
    pub data_prefix: String,
    /// Attribute naming the component an element becomes.
    pub role_attribute: String,
    /// Binding attribute; never an option.
    pub bind_attribute: String,
    /// Blank out `<% ... %>` blocks before parsing markup.
    pub asp: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            namespace: "kendo.ui.".to_string(),
            method_prefix: "kendo".to_string(),
            data_prefix: "data-".to_string(),
            role_attribute: "data-role".to_string(),
            bind_attribute: "data-bind".to_string(),
            asp: false,
        }
    }
}

impl LintConfig {
    /// Parse a configuration file; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError {
            message: e.to_string(),
        })
    }

    /// First segment of the namespace (`kendo` for `kendo.ui.`), the object
    /// that carries library functions such as `kendo.bind`.
    pub fn namespace_root(&self) -> &str {
        self.namespace.split('.').next().unwrap_or_default()
    }
}
