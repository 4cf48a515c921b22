//! Column and data type normalization
//!
//! Declared types accepted in the `data_type` column (case-insensitive) and their
//! canonical form:
//!
//! | declared                        | canonical                        |
//! |---------------------------------|----------------------------------|
//! | `char`, `varchar`               | `<type>(<length or 255>)`        |
//! | `decimal`                       | `decimal(<length or 18,2>)`      |
//! | `float`                         | `real`                           |
//! | `double`                        | `double precision`               |
//! | `date`, `timestamp`             | unchanged, length is the format  |
//! | `boolean` … `bigint`            | unchanged                        |
//! | `array<char>`, `array<varchar>` | `array<<type>(<length or 255>)>` |

use crate::error::MappingError;
use crate::parser::RawColumnRecord;

use super::ColumnDefinition;

const DEFAULT_TEXT_LENGTH: &str = "255";
const DEFAULT_DECIMAL_PRECISION: &str = "18,2";

const PASSTHROUGH_TYPES: &[&str] = &[
    "boolean",
    "tinyint",
    "smallint",
    "integer",
    "bigint",
    "double precision",
];

/// Characters not allowed in a target column name
pub(crate) const FORBIDDEN_TARGET_CHARS: &[char] = &['.', ' ', '-'];

/// Result of canonicalizing a declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalType {
    pub data_type: String,
    /// Date/time format (only for `date` and `timestamp`)
    pub format: Option<String>,
}

impl CanonicalType {
    fn plain(data_type: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            format: None,
        }
    }
}

/// Canonicalize a declared type and its length token.
///
/// Returns `None` for types outside the grammar.
pub fn canonical_type(declared: &str, length: Option<&str>) -> Option<CanonicalType> {
    let declared = declared.trim().to_lowercase();
    let canonical = match declared.as_str() {
        "char" | "varchar" => CanonicalType::plain(format!(
            "{}({})",
            declared,
            length.unwrap_or(DEFAULT_TEXT_LENGTH)
        )),
        "decimal" => CanonicalType::plain(format!(
            "decimal({})",
            length.unwrap_or(DEFAULT_DECIMAL_PRECISION).replace('.', ",")
        )),
        "float" => CanonicalType::plain("real"),
        "double" => CanonicalType::plain("double precision"),
        "date" | "timestamp" => CanonicalType {
            format: length.map(str::to_string),
            data_type: declared,
        },
        "array<char>" | "array<varchar>" => {
            let inner = &declared["array<".len()..declared.len() - 1];
            CanonicalType::plain(format!(
                "array<{}({})>",
                inner,
                length.unwrap_or(DEFAULT_TEXT_LENGTH)
            ))
        }
        t if PASSTHROUGH_TYPES.contains(&t) => CanonicalType::plain(declared),
        _ => return None,
    };
    Some(canonical)
}

/// Table-level inputs to column normalization
#[derive(Debug, Clone)]
pub struct NormalizeContext<'a> {
    /// Target table, used in error messages
    pub table: &'a str,
    /// JSON-like sources name their physical columns; others are positional
    pub json_source: bool,
    /// Keep the original source name as `source_formula` for positional columns
    pub use_source_name: bool,
}

/// Source name of a record. When the worksheet has no `source_name` column the
/// target name is used instead.
fn source_name(record: &RawColumnRecord) -> Option<String> {
    match &record.source_name {
        Some(_) => RawColumnRecord::text(&record.source_name),
        None => RawColumnRecord::text(&record.new_name),
    }
}

/// Rows without a source name are blank lines.
pub fn is_blank_record(record: &RawColumnRecord) -> bool {
    source_name(record).is_none()
}

/// Normalize one non-blank record. `ordinal` is its 1-based position among the
/// non-blank records of the table.
pub fn normalize_column(
    record: &RawColumnRecord,
    ordinal: usize,
    context: &NormalizeContext,
) -> Result<ColumnDefinition, MappingError> {
    let source = source_name(record).unwrap_or_default();

    let (source_column, source_formula) = if context.json_source {
        (source.to_lowercase(), None)
    } else {
        let formula = context.use_source_name.then(|| source.clone());
        (format!("col{}", ordinal), formula)
    };

    let target_column = RawColumnRecord::text(&record.new_name)
        .map(|name| name.to_lowercase())
        .ok_or_else(|| MappingError::MissingTargetColumn {
            table: context.table.to_string(),
            row: record.row,
        })?;
    if target_column.contains(FORBIDDEN_TARGET_CHARS) {
        return Err(MappingError::InvalidTargetColumn {
            table: context.table.to_string(),
            row: record.row,
            column: target_column,
        });
    }

    let declared = RawColumnRecord::text(&record.data_type).ok_or_else(|| {
        MappingError::MissingDataType {
            table: context.table.to_string(),
            row: record.row,
        }
    })?;
    let length = RawColumnRecord::text(&record.length);
    let canonical = canonical_type(&declared, length.as_deref()).ok_or_else(|| {
        MappingError::InvalidDataType {
            table: context.table.to_string(),
            row: record.row,
            data_type: declared.clone(),
        }
    })?;

    Ok(ColumnDefinition {
        source_column,
        source_formula,
        target_column,
        description: RawColumnRecord::text(&record.description).unwrap_or_default(),
        data_type: canonical.data_type,
        format: canonical.format,
        is_key: RawColumnRecord::flag(&record.key),
        is_index: RawColumnRecord::flag(&record.index),
        is_nullable: RawColumnRecord::flag(&record.nullable),
        is_partition: false,
    })
}

/// Normalize the data rows of a table, skipping blank lines.
pub fn normalize_columns(
    records: &[RawColumnRecord],
    context: &NormalizeContext,
) -> Result<Vec<ColumnDefinition>, MappingError> {
    records
        .iter()
        .filter(|record| !is_blank_record(record))
        .enumerate()
        .map(|(i, record)| normalize_column(record, i + 1, context))
        .collect()
}
