// SPDX-License-Identifier: MIT

//! Read-only template document
//!
//! The engine only needs the `Conditions` and `Parameters` sections, but the
//! whole document is kept so callers can hand the same value to other rules.

mod loader;

pub use loader::TemplateLoader;

use crate::error::TemplateError;
use serde_json::{Map, Value};
use std::path::Path;

/// A parsed template, always rooted at a mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    root: Value,
}

impl Template {
    pub fn from_value(root: Value) -> Result<Self, TemplateError> {
        if !root.is_object() {
            return Err(TemplateError::NotAMapping(value_kind(&root)));
        }
        Ok(Self { root })
    }

    pub fn from_json_str(content: &str) -> Result<Self, TemplateError> {
        TemplateLoader::parse_json(content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, TemplateError> {
        TemplateLoader::parse_yaml(content)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        TemplateLoader::new().load(path)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    fn section(&self, key: &str) -> Option<&Map<String, Value>> {
        self.root.get(key).and_then(Value::as_object)
    }

    /// The `Conditions` section, if present and a mapping
    pub fn conditions(&self) -> Option<&Map<String, Value>> {
        self.section("Conditions")
    }

    /// Raw definition of one named condition
    pub fn condition(&self, name: &str) -> Option<&Value> {
        self.conditions()?.get(name)
    }

    pub fn condition_names(&self) -> Vec<&str> {
        self.conditions()
            .map(|c| c.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn parameters(&self) -> Option<&Map<String, Value>> {
        self.section("Parameters")
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters()
            .map(|p| p.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
