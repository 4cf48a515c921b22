//! Cross-table checks on a compiled mapping

use std::collections::HashSet;

use tracing::warn;

use crate::error::{DuplicateColumn, MappingError};

use super::MappingDocument;

/// Names seen more than once, each listed once in first-repeat order.
pub(crate) fn repeated(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for name in names {
        if !seen.insert(name.clone()) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }
    duplicates
}

/// Reject mappings where two tables would write the same source document.
///
/// Names are compared per kind. Batch documents are named after the source
/// table, so two target tables reading the same source table collide.
pub fn check_document_names(mapping: &MappingDocument) -> Result<(), MappingError> {
    let mut documents = repeated(mapping.iter().map(|t| t.batch_document_name()));
    documents.extend(repeated(mapping.iter().map(|t| t.datalake_document_name())));
    if documents.is_empty() {
        Ok(())
    } else {
        Err(MappingError::DuplicateSourceDocuments { documents })
    }
}

/// Reject mappings with repeated target tables or with a target column
/// repeated inside a table. Every duplicate column is reported, not only the
/// first.
pub fn validate_mapping(mapping: &MappingDocument) -> Result<(), MappingError> {
    let duplicate_tables = repeated(mapping.iter().map(|t| t.target_table.clone()));
    if !duplicate_tables.is_empty() {
        return Err(MappingError::DuplicateTargetTables {
            tables: duplicate_tables,
        });
    }

    check_document_names(mapping)?;

    let mut duplicates = Vec::new();
    for table in mapping {
        let mut seen = HashSet::new();
        for column in &table.columns {
            if !seen.insert(column.target_column.to_lowercase()) {
                warn!(
                    "Duplicate column '{}' in table '{}'",
                    column.target_column, table.target_table
                );
                duplicates.push(DuplicateColumn {
                    table: table.target_table.clone(),
                    column: column.target_column.clone(),
                });
            }
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(MappingError::DuplicateColumns { duplicates })
    }
}
