//! Serialized shape of a source declaration document
//!
//! ```yaml
//! version: 2
//! sources:
//! - name: <profile>
//!   tables:
//!   - name: <profile>__<table>
//!     identifier: <table>
//!     meta: { flow, location, file_format, table_properties, ... }
//!     tests: [ ... ]        # datalake compound keys only
//!     tags: [ ... ]         # datalake only
//!     columns: [ ... ]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const SOURCES_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesFile {
    pub version: u32,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Source profile
    pub name: String,
    pub tables: Vec<SourceTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTable {
    pub name: String,
    pub description: String,
    pub identifier: String,
    pub meta: TableMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<TableTest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub columns: Vec<SourceColumn>,
}

/// Physical storage description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    pub flow: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_delimiter: Option<String>,
    pub file_format: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub table_properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceColumn {
    pub name: String,
    pub description: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<ColumnTest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ColumnMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub partition: String,
}

/// Filter applied to an assertion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedTest {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// One column assertion. Exactly one field is set; each entry renders as a
/// single-key mapping such as `not_null: { where: ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_where: Option<ScopedTest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_null: Option<ScopedTest>,
}

impl ColumnTest {
    pub fn unique_where(condition: Option<String>) -> Self {
        Self {
            unique_where: Some(ScopedTest { condition }),
            ..Default::default()
        }
    }

    pub fn not_null(condition: Option<String>) -> Self {
        Self {
            not_null: Some(ScopedTest { condition }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableTest {
    pub unique_columns_where: CompoundUnique,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundUnique {
    pub combination_of_columns: Vec<String>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}
