//! Exporter registry
//!
//! Maps format names to exporter constructors. Filled once from the entry
//! point and only read afterwards.

use std::collections::HashMap;

use super::options::{
    FORMAT_CSV, FORMAT_JSON, FORMAT_SQL, FORMAT_TEMPLATE, FORMAT_XLSX, FORMAT_XML, FORMAT_YAML,
    normalize_format,
};
use super::writers::{
    CsvExporter, JsonExporter, SqlExporter, TemplateExporter, XlsxExporter, XmlExporter,
    YamlExporter,
};
use super::Exporter;
use crate::error::{ConfigError, Result};

/// Constructor for a fresh exporter instance.
pub type Factory = fn() -> Box<dyn Exporter>;

/// Name to constructor table.
#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in format.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        register_builtin_exporters(&mut registry)?;
        Ok(registry)
    }

    /// Register `factory` under `name` (trimmed, lower-cased).
    ///
    /// # Returns
    /// * `Result<()>` - Error if the name is already taken
    pub fn register(&mut self, name: &str, factory: Factory) -> Result<()> {
        let name = normalize_format(name);
        if self.factories.contains_key(&name) {
            return Err(ConfigError::DuplicateFormat(name).into());
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Build a fresh exporter for `name`.
    ///
    /// # Returns
    /// * `Result<Box<dyn Exporter>>` - Exporter, or an error listing the
    ///   registered names
    pub fn get(&self, name: &str) -> Result<Box<dyn Exporter>> {
        let key = normalize_format(name);
        match self.factories.get(&key) {
            Some(factory) => Ok(factory()),
            None => Err(ConfigError::UnsupportedFormat {
                format: name.to_string(),
                available: self.list(),
            }
            .into()),
        }
    }

    /// Registered names in ascending order.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_format(name))
    }
}

/// Register csv, json, xml, yaml, sql, xlsx and template.
pub fn register_builtin_exporters(registry: &mut Registry) -> Result<()> {
    registry.register(FORMAT_CSV, || Box::new(CsvExporter))?;
    registry.register(FORMAT_JSON, || Box::new(JsonExporter))?;
    registry.register(FORMAT_XML, || Box::new(XmlExporter))?;
    registry.register(FORMAT_YAML, || Box::new(YamlExporter))?;
    registry.register(FORMAT_SQL, || Box::new(SqlExporter))?;
    registry.register(FORMAT_XLSX, || Box::new(XlsxExporter::default()))?;
    registry.register(FORMAT_TEMPLATE, || Box::new(TemplateExporter))?;
    Ok(())
}
