//! Loader for the compiler configuration file

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

use crate::error::IngestError;
use crate::model::PartitionsStyle;
use crate::util::split_partitions;

const DEFAULT_SOURCE_FORMAT: &str = "csv";
const DEFAULT_FIELD_DELIMITER: &str = "|";
const DEFAULT_INGESTION_PATH: &str = "ingestion";
const DEFAULT_PARTITIONS: &[&str] = &["year", "month", "day"];

/// Settings shared by every table of a compilation run
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerConfig {
    /// Schema holding the raw (batch) tables
    pub source_schema: String,
    /// Schema holding the transformed (datalake) tables
    pub target_schema: String,
    /// Source profile name of the batch documents
    pub batch_profile: String,
    /// Source profile name of the datalake documents
    pub datalake_profile: String,
    /// Base storage location of raw files
    pub batch_location: String,
    /// Base storage location of transformed files
    pub datalake_location: String,
    /// Partitions used when a worksheet does not declare any
    pub default_partitions: Vec<String>,
    pub default_partitions_style: PartitionsStyle,
    pub default_source_format: String,
    pub default_field_delimiter: String,
    /// Directory holding `{flow}.xlsx` workbooks
    pub ingestion_path: PathBuf,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            source_schema: String::new(),
            target_schema: String::new(),
            batch_profile: String::new(),
            datalake_profile: String::new(),
            batch_location: String::new(),
            datalake_location: String::new(),
            default_partitions: DEFAULT_PARTITIONS.iter().map(|p| p.to_string()).collect(),
            default_partitions_style: PartitionsStyle::default(),
            default_source_format: DEFAULT_SOURCE_FORMAT.to_string(),
            default_field_delimiter: DEFAULT_FIELD_DELIMITER.to_string(),
            ingestion_path: PathBuf::from(DEFAULT_INGESTION_PATH),
        }
    }
}

impl CompilerConfig {
    /// Default workbook location for a flow: `{ingestion_path}/{flow}.xlsx`
    pub fn workbook_path(&self, flow: &str) -> PathBuf {
        self.ingestion_path
            .join(format!("{}.xlsx", flow.to_lowercase()))
    }

    /// Replace the values given on the command line.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        let fields = [
            (&mut self.source_schema, &overrides.source_schema),
            (&mut self.target_schema, &overrides.target_schema),
            (&mut self.batch_profile, &overrides.batch_profile),
            (&mut self.datalake_profile, &overrides.datalake_profile),
            (&mut self.batch_location, &overrides.batch_location),
            (&mut self.datalake_location, &overrides.datalake_location),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
        self
    }
}

/// Optional replacements for the schema, profile and location settings
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_schema: Option<String>,
    pub target_schema: Option<String>,
    pub batch_profile: Option<String>,
    pub datalake_profile: Option<String>,
    pub batch_location: Option<String>,
    pub datalake_location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    db: DbSection,
    dbt: DbtSection,
    s3: S3Section,
    #[serde(default)]
    default_partitions: Option<PartitionList>,
    #[serde(default)]
    partitions_style: Option<PartitionsStyle>,
    #[serde(default)]
    source_format: Option<String>,
    #[serde(default)]
    field_delimiter: Option<String>,
    #[serde(default)]
    ingestion_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct DbSection {
    source_schema: String,
    target_schema: String,
}

#[derive(Debug, Deserialize)]
struct DbtSection {
    batch_profile: String,
    datalake_profile: String,
}

#[derive(Debug, Deserialize)]
struct S3Section {
    batch_location: String,
    datalake_location: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PartitionList {
    List(Vec<String>),
    Csv(String),
}

impl PartitionList {
    fn into_vec(self) -> Vec<String> {
        match self {
            PartitionList::List(items) => items
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            PartitionList::Csv(value) => split_partitions(&value),
        }
    }
}

/// Parse a configuration file
pub fn load_config(path: &Path) -> Result<CompilerConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| IngestError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(&content, path)
}

/// Parse configuration YAML. `path` is only used in errors.
pub fn parse_config(content: &str, path: &Path) -> Result<CompilerConfig> {
    let parse_error = |e| IngestError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    };

    let raw: serde_yaml::Value = serde_yaml::from_str(content).map_err(parse_error)?;
    let file: ConfigFile = serde_yaml::from_value(lowercase_keys(raw)).map_err(parse_error)?;

    let defaults = CompilerConfig::default();
    Ok(CompilerConfig {
        source_schema: file.db.source_schema,
        target_schema: file.db.target_schema,
        batch_profile: file.dbt.batch_profile,
        datalake_profile: file.dbt.datalake_profile,
        batch_location: file.s3.batch_location,
        datalake_location: file.s3.datalake_location,
        default_partitions: file
            .default_partitions
            .map(PartitionList::into_vec)
            .unwrap_or(defaults.default_partitions),
        default_partitions_style: file
            .partitions_style
            .unwrap_or(defaults.default_partitions_style),
        default_source_format: file
            .source_format
            .unwrap_or(defaults.default_source_format),
        default_field_delimiter: file
            .field_delimiter
            .unwrap_or(defaults.default_field_delimiter),
        ingestion_path: file.ingestion_path.unwrap_or(defaults.ingestion_path),
    })
}

/// Lower-case every mapping key so `DB:`/`Source_Schema:` match the sections.
fn lowercase_keys(value: serde_yaml::Value) -> serde_yaml::Value {
    match value {
        serde_yaml::Value::Mapping(mapping) => serde_yaml::Value::Mapping(
            mapping
                .into_iter()
                .map(|(key, value)| {
                    let key = match key {
                        serde_yaml::Value::String(s) => serde_yaml::Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (key, lowercase_keys(value))
                })
                .collect(),
        ),
        other => other,
    }
}
