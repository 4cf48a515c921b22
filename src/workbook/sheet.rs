//! Worksheet grids and the XML parts that produce them

use std::path::Path;

use anyhow::Result;
use roxmltree::{Document, Node};

use crate::error::IngestError;

use super::CellValue;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Largest grid an xlsx worksheet can hold (`XFD1048576`)
const MAX_COLUMNS: usize = 16_384;
const MAX_ROWS: usize = 1_048_576;

/// One worksheet as a 2-D grid of cell values (row-major, 0-based).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Worksheet {
    title: String,
    rows: Vec<Vec<CellValue>>,
}

impl Worksheet {
    pub fn new(title: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Cell at a 0-based position; anything outside the grid is empty.
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY_CELL)
    }
}

pub(crate) fn format_error(path: &Path, message: impl Into<String>) -> IngestError {
    IngestError::WorkbookFormat {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

#[inline]
fn is_element(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Concatenated text of the `<t>` runs below `node`, skipping phonetic runs.
fn run_text(node: Node) -> String {
    let mut text = String::new();
    for t in node.descendants().filter(|n| is_element(n, "t")) {
        if t.ancestors().any(|a| is_element(&a, "rPh")) {
            continue;
        }
        if let Some(s) = t.text() {
            text.push_str(s);
        }
    }
    text
}

/// Parse `xl/sharedStrings.xml` into the shared string table.
pub(crate) fn parse_shared_strings(xml: &str, path: &Path) -> Result<Vec<String>> {
    let doc = Document::parse(xml)
        .map_err(|e| format_error(path, format!("xl/sharedStrings.xml: {}", e)))?;

    Ok(doc
        .root_element()
        .children()
        .filter(|n| is_element(n, "si"))
        .map(run_text)
        .collect())
}

/// Zero-based column index of a cell reference such as `C7` or `AB12`.
///
/// `None` when the reference has no column letters or lies past column `XFD`.
pub(crate) fn column_index(reference: &str) -> Option<usize> {
    let mut index = 0usize;
    let mut seen = false;
    for ch in reference.chars() {
        if !ch.is_ascii_alphabetic() {
            break;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A' + 1) as usize;
        index = index.checked_mul(26)?.checked_add(digit)?;
        if index > MAX_COLUMNS {
            return None;
        }
        seen = true;
    }
    seen.then(|| index - 1)
}

/// Zero-based row index of a `<row r="…">` attribute.
fn row_index(reference: &str) -> Option<usize> {
    reference
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|r| (1..=MAX_ROWS).contains(r))
        .map(|r| r - 1)
}

fn cell_value(cell: Node, shared_strings: &[String]) -> CellValue {
    let raw = cell
        .children()
        .find(|n| is_element(n, "v"))
        .and_then(|v| v.text());

    match cell.attribute("t").unwrap_or("n") {
        "s" => raw
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|i| shared_strings.get(i))
            .map(|s| CellValue::Text(s.clone()))
            .unwrap_or(CellValue::Empty),
        "inlineStr" => cell
            .children()
            .find(|n| is_element(n, "is"))
            .map(|is| CellValue::Text(run_text(is)))
            .unwrap_or(CellValue::Empty),
        "b" => raw
            .map(|v| CellValue::Bool(v.trim() == "1"))
            .unwrap_or(CellValue::Empty),
        // str (formula result), e (error), d (ISO date) are kept as text
        "str" | "e" | "d" => raw
            .map(|v| CellValue::Text(v.to_string()))
            .unwrap_or(CellValue::Empty),
        _ => raw
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(CellValue::Number)
            .unwrap_or(CellValue::Empty),
    }
}

/// Parse one worksheet part into a grid.
///
/// Rows and cells are placed by their `r` reference; missing ones are empty.
/// Trailing rows without any value are dropped.
pub(crate) fn parse_sheet_rows(
    xml: &str,
    shared_strings: &[String],
    part: &str,
    path: &Path,
) -> Result<Vec<Vec<CellValue>>> {
    let doc = Document::parse(xml).map_err(|e| format_error(path, format!("{}: {}", part, e)))?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    let mut next_row = 0usize;

    for row_node in doc.descendants().filter(|n| is_element(n, "row")) {
        let row = match row_node.attribute("r") {
            Some(r) => row_index(r).ok_or_else(|| {
                format_error(path, format!("{}: invalid row reference {:?}", part, r))
            })?,
            None => next_row,
        };
        if row >= MAX_ROWS {
            return Err(format_error(path, format!("{}: too many rows", part)).into());
        }
        next_row = row + 1;

        let mut cells: Vec<CellValue> = Vec::new();
        let mut next_column = 0usize;
        for cell in row_node.children().filter(|n| is_element(n, "c")) {
            let column = match cell.attribute("r") {
                Some(r) => column_index(r).ok_or_else(|| {
                    format_error(path, format!("{}: invalid cell reference {:?}", part, r))
                })?,
                None => next_column,
            };
            if column >= MAX_COLUMNS {
                return Err(
                    format_error(path, format!("{}: too many cells in row {}", part, row + 1))
                        .into(),
                );
            }
            next_column = column + 1;

            if cells.len() <= column {
                cells.resize(column + 1, CellValue::Empty);
            }
            cells[column] = cell_value(cell, shared_strings);
        }

        if rows.len() <= row {
            rows.resize(row + 1, Vec::new());
        }
        rows[row] = cells;
    }

    while rows
        .last()
        .map_or(false, |cells| cells.iter().all(CellValue::is_empty))
    {
        rows.pop();
    }

    Ok(rows)
}
