//! Row-directive parsing of ingestion worksheets
//!
//! Layout of an ingestion worksheet:
//!
//! ```text
//! A1: TYPE
//! A2: #INGESTION
//! #CONFIG                     switches to key/value rows
//! source_table | orders
//! #WHERE                      switches to the filter row
//! status <> 'X'
//! #SELECT                     next row is the column header
//! source_name | new_name | data_type | length | key | nullable
//! ORDER_ID    | order_id | integer   |        | yes | no
//! ```
//!
//! Directive rows may repeat in any order; every other row goes to the handler
//! selected by the last directive.
//!
//! `#CONFIG` values are trimmed, except whitespace-only values which stay as
//! written so a tab or space `field_delimiter` can be declared. Other settings
//! treat such values as unset.

use std::collections::HashMap;

use crate::error::MappingError;
use crate::workbook::{CellValue, Worksheet};

use super::raw_table::{RawColumnRecord, RawTable};

const TYPE_MARKER: &str = "TYPE";
const INGESTION_TYPE: &str = "#INGESTION";
const CONFIG_DIRECTIVE: &str = "#CONFIG";
const WHERE_DIRECTIVE: &str = "#WHERE";
const SELECT_DIRECTIVE: &str = "#SELECT";

/// Rows 1-2 carry the type marker and the worksheet type.
const FIRST_BODY_ROW: usize = 2;

pub(crate) const WHERE_CONDITION_KEY: &str = "where_condition";

/// Handler receiving non-directive rows
#[derive(Debug, Clone, PartialEq, Eq)]
enum RowHandler {
    None,
    Config,
    Where,
    SelectHeader,
    /// Header label (lower-case) → column index
    SelectRow(HashMap<String, usize>),
}

struct DirectiveParser<'a> {
    worksheet: &'a str,
    handler: RowHandler,
    table: RawTable,
}

impl<'a> DirectiveParser<'a> {
    fn new(worksheet: &'a str) -> Self {
        Self {
            worksheet,
            handler: RowHandler::None,
            table: RawTable {
                worksheet: worksheet.to_string(),
                ..Default::default()
            },
        }
    }

    fn parse_row(&mut self, row_number: usize, cells: &[CellValue]) -> Result<(), MappingError> {
        let first = cells.first().unwrap_or(&CellValue::Empty);
        if first.is_marker(CONFIG_DIRECTIVE) {
            self.handler = RowHandler::Config;
        } else if first.is_marker(WHERE_DIRECTIVE) {
            self.handler = RowHandler::Where;
        } else if first.is_marker(SELECT_DIRECTIVE) {
            self.handler = RowHandler::SelectHeader;
        } else {
            match &self.handler {
                RowHandler::None => {
                    return Err(MappingError::NoActiveDirective {
                        worksheet: self.worksheet.to_string(),
                        row: row_number,
                    })
                }
                RowHandler::Config => self.parse_config_row(cells),
                RowHandler::Where => self.parse_where_row(cells),
                RowHandler::SelectHeader => {
                    self.handler = RowHandler::SelectRow(parse_select_header(cells))
                }
                RowHandler::SelectRow(header) => {
                    let record = parse_select_row(header, row_number, cells);
                    self.table.records.push(record);
                }
            }
        }
        Ok(())
    }

    fn parse_config_row(&mut self, cells: &[CellValue]) {
        // A row without a key carries no setting
        let Some(key) = cells.first().and_then(CellValue::to_text) else {
            return;
        };
        let value = match cells.get(1) {
            // Whitespace-only values are kept as written
            Some(CellValue::Text(s)) if s.trim().is_empty() => CellValue::Text(s.clone()),
            Some(cell) => cell.trimmed(),
            None => CellValue::Empty,
        };
        self.table.settings.insert(key.to_lowercase(), value);
    }

    fn parse_where_row(&mut self, cells: &[CellValue]) {
        if let Some(condition) = cells.first().and_then(CellValue::to_text) {
            self.table
                .settings
                .insert(WHERE_CONDITION_KEY.to_string(), CellValue::Text(condition));
        }
    }
}

fn parse_select_header(cells: &[CellValue]) -> HashMap<String, usize> {
    cells
        .iter()
        .enumerate()
        .filter_map(|(i, cell)| cell.to_text().map(|label| (label.to_lowercase(), i)))
        .collect()
}

fn parse_select_row(
    header: &HashMap<String, usize>,
    row_number: usize,
    cells: &[CellValue],
) -> RawColumnRecord {
    let field = |label: &str| {
        header
            .get(label)
            .map(|&i| cells.get(i).map(CellValue::trimmed).unwrap_or_default())
    };

    RawColumnRecord {
        row: row_number,
        source_name: field("source_name"),
        new_name: field("new_name"),
        description: field("description"),
        data_type: field("data_type"),
        length: field("length"),
        key: field("key"),
        index: field("index"),
        nullable: field("nullable"),
    }
}

/// Parse one worksheet.
///
/// Returns `Ok(None)` for worksheets that are not part of the mapping (A1 is not
/// `TYPE`) and an error for ingestion worksheets that are malformed.
pub fn parse_worksheet(sheet: &Worksheet) -> Result<Option<RawTable>, MappingError> {
    if !sheet.cell(0, 0).is_marker(TYPE_MARKER) {
        return Ok(None);
    }

    let worksheet_type = sheet.cell(1, 0);
    if !worksheet_type.is_marker(INGESTION_TYPE) {
        return Err(MappingError::InvalidWorksheetType {
            worksheet: sheet.title().to_string(),
            found: worksheet_type.to_text().unwrap_or_default(),
        });
    }

    let mut parser = DirectiveParser::new(sheet.title());
    for (index, cells) in sheet.rows().iter().enumerate().skip(FIRST_BODY_ROW) {
        parser.parse_row(index + 1, cells)?;
    }

    Ok(Some(parser.table))
}
