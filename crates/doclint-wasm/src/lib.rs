//! WASM bindings for doclint.
//!
//! Exposes a `Doclint` class to JavaScript via wasm-bindgen. Construct it
//! once with the schema JSON, then lint any number of files:
//!
//! ```js
//! const linter = new Doclint(schemaJson);
//! for (const d of linter.lintMarkup(html, "index.html")) {
//!   console.log(`${d.filename}:${d.line}:${d.column}: ${d.message}`);
//! }
//! ```

use doclint::{detect, Diagnostic, LintConfig, Linter, SchemaModel};
use wasm_bindgen::prelude::*;

/// A loaded schema plus lint settings.
#[wasm_bindgen]
pub struct Doclint {
    schema: SchemaModel,
    config: LintConfig,
}

#[wasm_bindgen]
impl Doclint {
    /// Load the schema JSON and an optional settings JSON.
    /// Throws if either does not parse.
    #[wasm_bindgen(constructor)]
    pub fn new(schema_json: &str, config_json: Option<String>) -> Result<Doclint, JsError> {
        Self::from_json(schema_json, config_json.as_deref()).map_err(|e| JsError::new(&e))
    }

    /// Lint a markup file. Returns an array of
    /// `{ message, severity, filename, line, column, offset, length }`.
    #[wasm_bindgen(js_name = lintMarkup)]
    pub fn lint_markup(&self, text: &str, filename: &str) -> Result<js_sys::Array, JsError> {
        to_js_array(&self.linter().lint_markup(text, filename))
    }

    /// Lint a script file. Same result shape as `lintMarkup`.
    #[wasm_bindgen(js_name = lintScript)]
    pub fn lint_script(&self, text: &str, filename: &str) -> Result<js_sys::Array, JsError> {
        to_js_array(&self.linter().lint_script(text, filename))
    }

    /// Look up `component.member`. Returns `{ component, kind, name }`;
    /// throws if nothing matches.
    pub fn search(&self, query: &str) -> Result<JsValue, JsError> {
        let hit = self
            .schema
            .search(query)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let js_obj = js_sys::Object::new();
        js_sys::Reflect::set(&js_obj, &"component".into(), &hit.component.id.as_str().into())
            .map_err(|_| JsError::new("Failed to set component property"))?;
        js_sys::Reflect::set(&js_obj, &"kind".into(), &hit.member.kind().into())
            .map_err(|_| JsError::new("Failed to set kind property"))?;
        js_sys::Reflect::set(&js_obj, &"name".into(), &hit.member.name().into())
            .map_err(|_| JsError::new("Failed to set name property"))?;

        Ok(js_obj.into())
    }

    /// Components used by the given scripts and pages:
    /// `{ components: string[], usesBinder: boolean }`.
    #[wasm_bindgen(js_name = detectUsage)]
    pub fn detect_usage(&self, scripts: Vec<String>, markups: Vec<String>) -> Result<JsValue, JsError> {
        let report = detect(
            scripts.iter().map(String::as_str),
            markups.iter().map(String::as_str),
            &self.config,
        );
        serde_wasm_bindgen::to_value(&report).map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Doclint {
    fn from_json(schema_json: &str, config_json: Option<&str>) -> Result<Self, String> {
        let schema = SchemaModel::from_json(schema_json).map_err(|e| e.to_string())?;
        let config = match config_json {
            Some(text) => LintConfig::from_json(text).map_err(|e| e.to_string())?,
            None => LintConfig::default(),
        };
        Ok(Self { schema, config })
    }

    fn linter(&self) -> Linter<'_> {
        Linter::with_config(&self.schema, self.config.clone())
    }
}

fn to_js_array(diagnostics: &[Diagnostic]) -> Result<js_sys::Array, JsError> {
    let array = js_sys::Array::new();
    for diagnostic in diagnostics {
        let value = serde_wasm_bindgen::to_value(diagnostic).map_err(|e| JsError::new(&e.to_string()))?;
        array.push(&value);
    }
    Ok(array)
}

/// Get the doclint version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
