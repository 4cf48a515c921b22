//! Error types for ingest-mapping

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the content of a mapping workbook.
///
/// Every variant names the worksheet or table (and the worksheet row where one
/// exists) so the author of the workbook can find the offending cell.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("worksheet '{worksheet}': invalid type {found:?}, expected #INGESTION")]
    InvalidWorksheetType { worksheet: String, found: String },

    #[error(
        "worksheet '{worksheet}' row {row}: row found before any #CONFIG, #WHERE or #SELECT directive"
    )]
    NoActiveDirective { worksheet: String, row: usize },

    #[error("table '{table}' row {row}: missing target_column")]
    MissingTargetColumn { table: String, row: usize },

    #[error("table '{table}' row {row}: invalid target_column '{column}'")]
    InvalidTargetColumn {
        table: String,
        row: usize,
        column: String,
    },

    #[error("table '{table}' row {row}: missing data_type")]
    MissingDataType { table: String, row: usize },

    #[error("table '{table}' row {row}: invalid data_type '{data_type}'")]
    InvalidDataType {
        table: String,
        row: usize,
        data_type: String,
    },

    #[error("worksheet '{worksheet}': invalid filename {filename:?}")]
    InvalidFilename {
        worksheet: String,
        filename: Option<String>,
    },

    #[error("table '{table}': invalid partitions style '{style}'")]
    InvalidPartitionsStyle { table: String, style: String },

    #[error("table '{table}': invalid partition '{partition}'")]
    InvalidPartition { table: String, partition: String },

    #[error("duplicated target tables: {}", .tables.join(", "))]
    DuplicateTargetTables { tables: Vec<String> },

    #[error("duplicated source documents: {}", .documents.join(", "))]
    DuplicateSourceDocuments { documents: Vec<String> },

    #[error("duplicated columns: {}", join_duplicates(.duplicates))]
    DuplicateColumns { duplicates: Vec<DuplicateColumn> },
}

/// A target column that appears more than once in one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateColumn {
    pub table: String,
    pub column: String,
}

impl fmt::Display for DuplicateColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column '{}' in table '{}'", self.column, self.table)
    }
}

fn join_duplicates(duplicates: &[DuplicateColumn]) -> String {
    duplicates
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// I/O, container and serialization failures
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read workbook: {path}")]
    WorkbookRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid workbook {path}: {message}")]
    WorkbookFormat { path: PathBuf, message: String },

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write source document {path}")]
    SourceWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize source document {path}")]
    SourceSerialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write metadata document {path}")]
    MetadataWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read metadata document {path}")]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse metadata document {path}")]
    MetadataParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Table {table} not found in flow {flow}")]
    TableNotFound { flow: String, table: String },
}
