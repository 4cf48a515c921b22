//! Completion of a parsed worksheet into a table definition

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CompilerConfig;
use crate::error::MappingError;
use crate::parser::{RawTable, WHERE_CONDITION_KEY};
use crate::util::{ensure_trailing_slash, split_partitions, table_location, with_flow_prefix};

use super::column_normalizer::{normalize_columns, NormalizeContext, FORBIDDEN_TARGET_CHARS};
use super::{is_json_format, ColumnDefinition, PartitionsStyle, TableDefinition};

/// Everything after the first `.` of a filename
static EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\..*$").expect("Invalid regex pattern"));

/// Templating placeholders such as `{{ ds }}`
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{[^}]*\}\}").expect("Invalid regex pattern"));

/// Settings consumed by the assembler or colliding with a table field. Any
/// other `#CONFIG` key is carried verbatim in `TableDefinition::extra`.
const RESERVED_SETTINGS: &[&str] = &[
    "flow",
    "worksheet",
    "columns",
    "batch_profile",
    "datalake_profile",
    "batch_location",
    "datalake_location",
    "source_filename",
    "source_format",
    "source_schema",
    "source_table",
    "source_location",
    "field_delimiter",
    "target_schema",
    "target_table",
    "target_location",
    WHERE_CONDITION_KEY,
    "partitions",
    "partitions_style",
    "description",
    "tags",
    "compression_type",
    "use_source_name",
    "exclude_table",
];

/// Derive a source table name from a filename token.
///
/// `{{ ds }}-Orders.2024.csv.gz` → `{flow}_orders`. Returns `None` when nothing
/// usable is left.
pub fn filename_to_source_table(filename: &str, flow: &str) -> Option<String> {
    let stem = EXTENSION_RE.replace(filename.trim(), "");
    let stem = PLACEHOLDER_RE.replace_all(&stem, "").replace('-', "_");
    let stem = stem
        .trim_matches(|c: char| matches!(c, '_' | ' ' | '.' | '-'))
        .replace(|c: char| c == '*' || c == '?', "");
    let stem = stem.trim_matches('_').to_lowercase();

    if stem.is_empty() {
        None
    } else {
        Some(with_flow_prefix(&stem, flow))
    }
}

/// `source_table` setting, or the name derived from `source_filename`
pub fn resolve_source_table(raw: &RawTable, flow: &str) -> Result<String, MappingError> {
    if let Some(name) = raw.setting_text("source_table") {
        return Ok(with_flow_prefix(&name, flow));
    }
    let filename = raw.setting_text("source_filename");
    filename
        .as_deref()
        .and_then(|f| filename_to_source_table(f, flow))
        .ok_or_else(|| MappingError::InvalidFilename {
            worksheet: raw.worksheet.clone(),
            filename,
        })
}

/// `target_table` setting, falling back to the source table name
pub fn resolve_target_table(raw: &RawTable, flow: &str) -> Result<String, MappingError> {
    match raw.setting_text("target_table") {
        Some(name) => Ok(with_flow_prefix(&name, flow)),
        None => resolve_source_table(raw, flow),
    }
}

/// Type of a synthesized partition column
fn partition_data_type(key: &str) -> &'static str {
    match key {
        "year" => "char(4)",
        "month" | "day" | "hour" | "minute" => "char(2)",
        _ => "varchar(20)",
    }
}

/// Columns appended after the data columns, one per partition key.
pub fn partition_columns(partitions: &[String], style: PartitionsStyle) -> Vec<ColumnDefinition> {
    partitions
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let source_column = match style {
                PartitionsStyle::Hive => key.clone(),
                PartitionsStyle::NonHive => format!("partition_{}", i),
            };
            ColumnDefinition {
                description: format!("Partition {}", source_column),
                source_column,
                source_formula: None,
                target_column: key.clone(),
                data_type: partition_data_type(key).to_string(),
                format: None,
                is_key: false,
                is_index: false,
                is_nullable: false,
                is_partition: true,
            }
        })
        .collect()
}

/// Partition keys of a table, lower-cased.
///
/// A set `partitions` setting wins even when blank; otherwise the configured
/// default applies. Keys follow the target column naming rules.
fn resolve_partitions(
    raw: &RawTable,
    table: &str,
    config: &CompilerConfig,
) -> Result<Vec<String>, MappingError> {
    let keys = match raw.setting("partitions") {
        Some(value) => split_partitions(&value.to_text().unwrap_or_default()),
        None => config.default_partitions.clone(),
    };

    keys.iter()
        .map(|key| key.trim().to_lowercase())
        .filter(|key| !key.is_empty())
        .map(|key| {
            if key.contains(FORBIDDEN_TARGET_CHARS) {
                Err(MappingError::InvalidPartition {
                    table: table.to_string(),
                    partition: key,
                })
            } else {
                Ok(key)
            }
        })
        .collect()
}

/// Build the table definition of one parsed worksheet.
///
/// `target_table` is the already resolved (and namespaced) target name.
pub fn assemble_table(
    raw: &RawTable,
    target_table: &str,
    flow: &str,
    config: &CompilerConfig,
) -> Result<TableDefinition, MappingError> {
    let setting_or =
        |key: &str, default: &str| raw.setting_text(key).unwrap_or_else(|| default.to_string());

    let source_table = resolve_source_table(raw, flow)?;
    let source_format = setting_or("source_format", &config.default_source_format);
    let batch_location = setting_or("batch_location", &config.batch_location);
    let datalake_location = setting_or("datalake_location", &config.datalake_location);

    let source_location = raw
        .setting_text("source_location")
        .map(|l| ensure_trailing_slash(&l))
        .unwrap_or_else(|| table_location(&batch_location, flow, &source_table));
    let target_location = raw
        .setting_text("target_location")
        .map(|l| ensure_trailing_slash(&l))
        .unwrap_or_else(|| table_location(&datalake_location, flow, target_table));

    let partitions = resolve_partitions(raw, target_table, config)?;
    let partitions_style = match raw.setting_text("partitions_style") {
        Some(style) => style
            .parse()
            .map_err(|_| MappingError::InvalidPartitionsStyle {
                table: target_table.to_string(),
                style,
            })?,
        None => config.default_partitions_style,
    };

    let use_source_name = raw.setting_flag("use_source_name");
    let context = NormalizeContext {
        table: target_table,
        json_source: is_json_format(&source_format),
        use_source_name,
    };
    let mut columns = normalize_columns(&raw.records, &context)?;
    columns.extend(partition_columns(&partitions, partitions_style));

    let extra: BTreeMap<String, serde_json::Value> = raw
        .settings
        .iter()
        .filter(|(key, _)| !RESERVED_SETTINGS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect();

    Ok(TableDefinition {
        flow: flow.to_string(),
        worksheet: raw.worksheet.clone(),
        batch_profile: setting_or("batch_profile", &config.batch_profile),
        datalake_profile: setting_or("datalake_profile", &config.datalake_profile),
        batch_location,
        datalake_location,
        source_filename: raw.setting_text("source_filename"),
        source_schema: setting_or("source_schema", &config.source_schema),
        source_table,
        source_location,
        field_delimiter: raw
            .setting_verbatim("field_delimiter")
            .unwrap_or_else(|| config.default_field_delimiter.clone()),
        source_format,
        target_schema: setting_or("target_schema", &config.target_schema),
        target_table: target_table.to_string(),
        target_location,
        where_condition: raw.setting_text(WHERE_CONDITION_KEY),
        partitions,
        partitions_style,
        description: raw.setting_text("description"),
        tags: raw.setting_text("tags"),
        compression_type: raw.setting_text("compression_type"),
        use_source_name,
        columns,
        extra,
    })
}
