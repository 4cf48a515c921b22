//! Raw worksheet content before normalization

use std::collections::BTreeMap;

use crate::workbook::CellValue;

/// One `#SELECT` data row, keyed by the recognized header labels.
///
/// A field is `None` when the worksheet has no column with that header, and
/// `Some(CellValue::Empty)` when the column exists but the cell is blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawColumnRecord {
    /// 1-based worksheet row
    pub row: usize,
    pub source_name: Option<CellValue>,
    pub new_name: Option<CellValue>,
    pub description: Option<CellValue>,
    pub data_type: Option<CellValue>,
    /// Length/precision token; the date/time format for `date` and `timestamp`
    pub length: Option<CellValue>,
    pub key: Option<CellValue>,
    pub index: Option<CellValue>,
    pub nullable: Option<CellValue>,
}

impl RawColumnRecord {
    /// Text of a field, `None` when absent or blank.
    pub fn text(field: &Option<CellValue>) -> Option<String> {
        field.as_ref().and_then(CellValue::to_text)
    }

    /// Flag value of a field; absent fields are false.
    pub fn flag(field: &Option<CellValue>) -> bool {
        field.as_ref().map_or(false, CellValue::is_truthy)
    }
}

/// Everything read from one ingestion worksheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub worksheet: String,
    /// `#CONFIG` keys (lower-cased) and the `#WHERE` condition, in key order
    pub settings: BTreeMap<String, CellValue>,
    /// `#SELECT` rows in worksheet order
    pub records: Vec<RawColumnRecord>,
}

impl RawTable {
    pub fn setting(&self, key: &str) -> Option<&CellValue> {
        self.settings.get(key)
    }

    /// Text of a setting, `None` when unset or blank.
    pub fn setting_text(&self, key: &str) -> Option<String> {
        self.settings.get(key).and_then(CellValue::to_text)
    }

    /// Like [`setting_text`](Self::setting_text), but a whitespace-only value
    /// (a tab or space delimiter) is returned as written.
    pub fn setting_verbatim(&self, key: &str) -> Option<String> {
        match self.settings.get(key)? {
            CellValue::Text(s) if !s.is_empty() && s.trim().is_empty() => Some(s.clone()),
            other => other.to_text(),
        }
    }

    pub fn setting_flag(&self, key: &str) -> bool {
        self.settings.get(key).map_or(false, CellValue::is_truthy)
    }
}
