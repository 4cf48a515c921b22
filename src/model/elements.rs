//! Mapping model element types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Source formats whose records carry their own field names.
const JSON_FORMATS: &[&str] = &["json", "jsonl", "ndjson"];

/// Physical layout of partition directories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionsStyle {
    /// `key=value/` directories; the partition key is the physical column name
    #[default]
    Hive,
    /// Bare `value/` directories; columns are named `partition_{index}`
    #[serde(alias = "non_hive", alias = "nonhive")]
    NonHive,
}

impl PartitionsStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionsStyle::Hive => "hive",
            PartitionsStyle::NonHive => "non-hive",
        }
    }
}

impl std::str::FromStr for PartitionsStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hive" => Ok(PartitionsStyle::Hive),
            "non-hive" | "non_hive" | "nonhive" => Ok(PartitionsStyle::NonHive),
            _ => Err(format!("Unknown partitions style: {}", s)),
        }
    }
}

/// Check whether a source format is one of the JSON-like formats.
pub fn is_json_format(source_format: &str) -> bool {
    JSON_FORMATS
        .iter()
        .any(|f| source_format.trim().eq_ignore_ascii_case(f))
}

/// A normalized column of a mapped table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Physical column name in the raw files
    pub source_column: String,
    /// Original source name, kept for formats whose physical columns are positional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_formula: Option<String>,
    /// Normalized, lower-case column name in the target table
    pub target_column: String,
    #[serde(default)]
    pub description: String,
    /// Canonical type, e.g. `varchar(255)`, `decimal(18,2)`, `double precision`
    pub data_type: String,
    /// Date/time format for `date` and `timestamp` columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default)]
    pub is_index: bool,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default)]
    pub is_partition: bool,
}

/// A table compiled from one worksheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Lower-case namespace of the flow this table belongs to
    pub flow: String,
    /// Worksheet the table was compiled from
    pub worksheet: String,
    pub batch_profile: String,
    pub datalake_profile: String,
    pub batch_location: String,
    pub datalake_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
    pub source_format: String,
    pub source_schema: String,
    pub source_table: String,
    pub source_location: String,
    pub field_delimiter: String,
    pub target_schema: String,
    pub target_table: String,
    pub target_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_condition: Option<String>,
    pub partitions: Vec<String>,
    pub partitions_style: PartitionsStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whitespace-separated tags for the datalake document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_type: Option<String>,
    #[serde(default)]
    pub use_source_name: bool,
    /// Data columns followed by the synthesized partition columns
    pub columns: Vec<ColumnDefinition>,
    /// `#CONFIG` settings with no dedicated field, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TableDefinition {
    pub fn is_json_source(&self) -> bool {
        is_json_format(&self.source_format)
    }

    /// `{batch_profile}__{source_table}`, the batch source document name
    pub fn batch_document_name(&self) -> String {
        format!("{}__{}", self.batch_profile, self.source_table)
    }

    /// `{datalake_profile}__{target_table}`, the datalake source document name
    pub fn datalake_document_name(&self) -> String {
        format!("{}__{}", self.datalake_profile, self.target_table)
    }

    /// Target names of the columns flagged as key, in column order.
    pub fn key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_key)
            .map(|c| c.target_column.as_str())
            .collect()
    }

    /// Tags split on whitespace; `None` when no tag is declared.
    pub fn tag_list(&self) -> Option<Vec<String>> {
        let tags: Vec<String> = self
            .tags
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if tags.is_empty() {
            None
        } else {
            Some(tags)
        }
    }
}
