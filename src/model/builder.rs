//! Build the mapping document from a workbook

use tracing::{debug, info};

use crate::config::CompilerConfig;
use crate::error::MappingError;
use crate::parser::{parse_worksheet, RawTable};
use crate::workbook::Workbook;

use super::assembler::{assemble_table, resolve_target_table};
use super::validator::{repeated, validate_mapping};
use super::MappingDocument;

/// Compile every ingestion worksheet of `workbook` into a validated mapping.
///
/// `flow` is lower-cased. Worksheets that are not ingestion worksheets are
/// skipped; tables flagged `exclude_table` are left out after the duplicate
/// target table check.
pub fn build_mapping(
    workbook: &Workbook,
    flow: &str,
    config: &CompilerConfig,
) -> Result<MappingDocument, MappingError> {
    let flow = flow.trim().to_lowercase();

    let mut parsed: Vec<(String, RawTable)> = Vec::new();

    for sheet in workbook.worksheets() {
        let Some(raw) = parse_worksheet(sheet)? else {
            info!("Skipping worksheet {}: not an ingestion worksheet", sheet.title());
            continue;
        };
        let target_table = resolve_target_table(&raw, &flow)?;
        info!("worksheet {} table {}", sheet.title(), target_table);
        parsed.push((target_table, raw));
    }

    let duplicates = repeated(parsed.iter().map(|(name, _)| name.clone()));
    if !duplicates.is_empty() {
        return Err(MappingError::DuplicateTargetTables { tables: duplicates });
    }

    let mut mapping = MappingDocument::new();
    for (target_table, raw) in &parsed {
        if raw.setting_flag("exclude_table") {
            info!("Skipping target table {}: excluded", target_table);
            continue;
        }
        let table = assemble_table(raw, target_table, &flow, config)?;
        debug!(
            "Table {}: {} columns, partitions [{}]",
            table.target_table,
            table.columns.len(),
            table.partitions.join(", ")
        );
        mapping.push(table);
    }

    validate_mapping(&mapping)?;
    Ok(mapping)
}
