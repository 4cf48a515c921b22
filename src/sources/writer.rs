//! Rendering and writing of per-table source documents

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use crate::error::IngestError;
use crate::model::{check_document_names, ColumnDefinition, MappingDocument, TableDefinition};

use super::assertions::{column_tests, table_tests};
use super::document::{
    ColumnMeta, SourceColumn, SourceEntry, SourceTable, SourcesFile, TableMeta, SOURCES_VERSION,
};

/// Wide text type of untyped raw columns
const RAW_TEXT_TYPE: &str = "varchar(65535)";
const DEFAULT_COMPRESSION: &str = "none";
const SOURCES_DIR: &str = "models/sources";

/// Representation a source document describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Raw files as delivered
    Batch,
    /// Transformed columnar tables
    Datalake,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::Batch, SourceKind::Datalake];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Batch => "batch",
            SourceKind::Datalake => "datalake",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{output_dir}/models/sources/{kind}/{flow}`
pub fn sources_dir(output_dir: &Path, kind: SourceKind, flow: &str) -> PathBuf {
    output_dir.join(SOURCES_DIR).join(kind.as_str()).join(flow)
}

fn profile_and_identifier(table: &TableDefinition, kind: SourceKind) -> (&str, &str) {
    match kind {
        SourceKind::Batch => (table.batch_profile.as_str(), table.source_table.as_str()),
        SourceKind::Datalake => (table.datalake_profile.as_str(), table.target_table.as_str()),
    }
}

/// `{profile}__{table}`, also the file stem of the document
pub fn document_name(table: &TableDefinition, kind: SourceKind) -> String {
    match kind {
        SourceKind::Batch => table.batch_document_name(),
        SourceKind::Datalake => table.datalake_document_name(),
    }
}

fn render_column(
    column: &ColumnDefinition,
    table: &TableDefinition,
    kind: SourceKind,
) -> SourceColumn {
    let (name, data_type) = match kind {
        SourceKind::Batch if !column.is_partition && !table.is_json_source() => {
            (&column.source_column, RAW_TEXT_TYPE)
        }
        SourceKind::Batch => (&column.source_column, column.data_type.as_str()),
        SourceKind::Datalake => (&column.target_column, column.data_type.as_str()),
    };

    SourceColumn {
        name: name.clone(),
        description: column.description.clone(),
        data_type: data_type.to_string(),
        tests: column_tests(column, table, kind),
        meta: column.is_partition.then(|| ColumnMeta {
            partition: "yes".to_string(),
        }),
    }
}

fn batch_meta(table: &TableDefinition) -> TableMeta {
    let mut properties = BTreeMap::from([
        ("CrawlerSchemaDeserializerVersion".to_string(), "1.0".to_string()),
        ("CrawlerSchemaSerializerVersion".to_string(), "1.0".to_string()),
        ("typeOfData".to_string(), "file".to_string()),
        (
            "compressionType".to_string(),
            table
                .compression_type
                .clone()
                .unwrap_or_else(|| DEFAULT_COMPRESSION.to_string()),
        ),
    ]);

    let json = table.is_json_source();
    if json {
        properties.insert("classification".to_string(), "json".to_string());
    } else {
        properties.insert("areColumnsQuoted".to_string(), "false".to_string());
        properties.insert("classification".to_string(), "csv".to_string());
        properties.insert("columnsOrdered".to_string(), "true".to_string());
        properties.insert("delimiter".to_string(), table.field_delimiter.clone());
    }

    TableMeta {
        flow: table.flow.clone(),
        field_delimiter: (!json).then(|| table.field_delimiter.clone()),
        file_format: "textfile".to_string(),
        location: table.source_location.clone(),
        format: Some(table.source_format.clone()),
        table_properties: properties,
    }
}

fn datalake_meta(table: &TableDefinition) -> TableMeta {
    TableMeta {
        flow: table.flow.clone(),
        field_delimiter: None,
        file_format: "parquet".to_string(),
        location: table.target_location.clone(),
        format: None,
        table_properties: BTreeMap::from([(
            "classification".to_string(),
            "parquet".to_string(),
        )]),
    }
}

/// Build the source document of one table.
pub fn render_source(table: &TableDefinition, kind: SourceKind) -> SourcesFile {
    let (profile, identifier) = profile_and_identifier(table, kind);
    let name = document_name(table, kind);
    let description = table
        .description
        .clone()
        .unwrap_or_else(|| format!("{} - {}", table.flow, name));

    let (meta, tags) = match kind {
        SourceKind::Batch => (batch_meta(table), None),
        SourceKind::Datalake => (datalake_meta(table), table.tag_list()),
    };

    SourcesFile {
        version: SOURCES_VERSION,
        sources: vec![SourceEntry {
            name: profile.to_string(),
            tables: vec![SourceTable {
                name,
                description,
                identifier: identifier.to_string(),
                meta,
                tests: table_tests(table, kind),
                tags,
                columns: table
                    .columns
                    .iter()
                    .map(|c| render_column(c, table, kind))
                    .collect(),
            }],
        }],
    }
}

fn write_error(path: &Path, source: std::io::Error) -> IngestError {
    IngestError::SourceWrite {
        path: path.to_path_buf(),
        source,
    }
}

/// Clear `{output_dir}/models/sources/{kind}/{flow}` and write one document per
/// table. Returns the written paths in mapping order.
///
/// Fails before touching the directory when two tables share a document name.
pub fn generate_sources(
    mapping: &MappingDocument,
    kind: SourceKind,
    flow: &str,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    check_document_names(mapping)?;
    let dir = sources_dir(output_dir, kind, flow);

    match fs::remove_dir_all(&dir) {
        Ok(()) => debug!("Cleared {}", dir.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(write_error(&dir, e).into()),
    }
    fs::create_dir_all(&dir).map_err(|e| write_error(&dir, e))?;

    let mut written = Vec::with_capacity(mapping.len());
    for table in mapping {
        let path = dir.join(format!("{}.yml", document_name(table, kind)));
        let yaml = serde_yaml::to_string(&render_source(table, kind)).map_err(|e| {
            IngestError::SourceSerialize {
                path: path.clone(),
                source: e,
            }
        })?;
        fs::write(&path, yaml).map_err(|e| write_error(&path, e))?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }

    info!(
        "Generated {} {} source documents in {}",
        written.len(),
        kind,
        dir.display()
    );
    Ok(written)
}
