//! Static mapper configuration
//!
//! Each mapper type builds one `MapperConfig`: the table, its primary key
//! column, and the column -> property mapping. Columns not mentioned map to
//! the property of the same name.

#![allow(clippy::result_large_err)]

use crate::errors::Result;
use datamapper_core::errors::{DataMapperError, ExError};
use std::collections::BTreeMap;

/// Where a column's value goes on the object side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnTarget {
    Property(&'static str),
    /// Read but never exposed on the domain object, never written
    Drop,
}

#[derive(Debug, Clone)]
pub struct MapperConfig {
    name: &'static str,
    table: Option<&'static str>,
    primary_key: Option<&'static str>,
    columns: BTreeMap<&'static str, ColumnTarget>,
    defect: Option<String>,
}

impl MapperConfig {
    /// Start a configuration for the named mapper
    pub fn builder(name: &'static str) -> MapperConfigBuilder {
        MapperConfigBuilder {
            config: MapperConfig {
                name,
                table: None,
                primary_key: None,
                columns: BTreeMap::new(),
                defect: None,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn table(&self) -> Result<&'static str> {
        self.ensure_consistent()?;
        self.table.ok_or_else(|| self.missing("table"))
    }

    pub fn primary_key(&self) -> Result<&'static str> {
        self.ensure_consistent()?;
        self.primary_key.ok_or_else(|| self.missing("primary key"))
    }

    /// Explicit mapping entry for a column, if any
    pub fn target(&self, column: &str) -> Option<ColumnTarget> {
        self.columns.get(column).copied()
    }

    /// Property a column populates; `None` for dropped columns
    pub fn property_for<'a>(&self, column: &'a str) -> Option<&'a str> {
        match self.target(column) {
            Some(ColumnTarget::Property(property)) => Some(property),
            Some(ColumnTarget::Drop) => None,
            None => Some(column),
        }
    }

    /// Column a property is written to, derived from the forward mapping
    ///
    /// `None` when the same-named column is dropped or renamed away.
    pub fn column_for<'a>(&self, property: &'a str) -> Option<&'a str> {
        let renamed = self
            .columns
            .iter()
            .find(|(_, target)| matches!(target, ColumnTarget::Property(p) if *p == property));
        match renamed {
            Some((column, _)) => Some(*column),
            None if self.columns.contains_key(property) => None,
            None => Some(property),
        }
    }

    fn ensure_consistent(&self) -> Result<()> {
        match &self.defect {
            Some(reason) => Err(DataMapperError::InvalidConfiguration {
                subject: self.name.to_string(),
                reason: reason.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }

    fn missing(&self, setting: &'static str) -> ExError {
        DataMapperError::MissingConfiguration {
            subject: self.name.to_string(),
            setting,
        }
        .into()
    }
}

/// Builder for `MapperConfig`
///
/// Inconsistent mappings are recorded, not rejected; the first lookup that
/// needs the configuration reports them.
pub struct MapperConfigBuilder {
    config: MapperConfig,
}

impl MapperConfigBuilder {
    pub fn table(mut self, table: &'static str) -> Self {
        self.config.table = Some(table);
        self
    }

    pub fn primary_key(mut self, column: &'static str) -> Self {
        self.config.primary_key = Some(column);
        self
    }

    /// Map `column` to a differently named property
    pub fn column(self, column: &'static str, property: &'static str) -> Self {
        self.map(column, ColumnTarget::Property(property))
    }

    /// Exclude `column` from the domain object entirely
    pub fn drop_column(self, column: &'static str) -> Self {
        self.map(column, ColumnTarget::Drop)
    }

    pub fn build(self) -> MapperConfig {
        self.config
    }

    fn map(mut self, column: &'static str, target: ColumnTarget) -> Self {
        if self.config.columns.contains_key(column) {
            self.flag(format!("column {} mapped twice", column));
        }
        if let ColumnTarget::Property(property) = target {
            if self
                .config
                .columns
                .values()
                .any(|t| *t == ColumnTarget::Property(property))
            {
                self.flag(format!("property {} targeted by two columns", property));
            }
        }
        self.config.columns.insert(column, target);
        self
    }

    fn flag(&mut self, reason: String) {
        if self.config.defect.is_none() {
            self.config.defect = Some(reason);
        }
    }
}
