//! Workbook loading from .xlsx containers

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use roxmltree::Document;

use super::reader::WorkbookParts;
use super::sheet::{format_error, parse_shared_strings, parse_sheet_rows};
use super::Worksheet;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// A fully loaded workbook: every worksheet in workbook order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    /// Load an .xlsx workbook.
    ///
    /// The container is read into memory and closed before any worksheet is
    /// decoded, so no file handle outlives this call.
    pub fn open(path: &Path) -> Result<Self> {
        let parts = WorkbookParts::from_path(path)?;
        Self::from_parts(&parts, path)
    }

    /// Build a workbook from in-memory worksheets.
    pub fn from_sheets(sheets: Vec<Worksheet>) -> Self {
        Self { sheets }
    }

    pub fn worksheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub(crate) fn from_parts(parts: &WorkbookParts, path: &Path) -> Result<Self> {
        let workbook_xml = parts
            .get_string(WORKBOOK_PART)
            .ok_or_else(|| format_error(path, format!("missing {}", WORKBOOK_PART)))?;
        let doc = Document::parse(&workbook_xml)
            .map_err(|e| format_error(path, format!("{}: {}", WORKBOOK_PART, e)))?;

        let relationships = parse_relationships(parts, path)?;
        let shared_strings = match parts.get_string(SHARED_STRINGS_PART) {
            Some(xml) => parse_shared_strings(&xml, path)?,
            None => Vec::new(),
        };

        let mut sheets = Vec::new();
        for node in doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "sheet")
        {
            let title = node.attribute("name").unwrap_or_default().to_string();
            // r:id lives in the relationships namespace; match on the local name
            let rel_id = node
                .attributes()
                .find(|a| a.name() == "id")
                .map(|a| a.value())
                .ok_or_else(|| format_error(path, format!("sheet '{}' has no r:id", title)))?;
            let part = relationships.get(rel_id).ok_or_else(|| {
                format_error(
                    path,
                    format!("sheet '{}' refers to unknown relationship {}", title, rel_id),
                )
            })?;
            let sheet_xml = parts
                .get_string(part)
                .ok_or_else(|| format_error(path, format!("missing {}", part)))?;

            let rows = parse_sheet_rows(&sheet_xml, &shared_strings, part, path)?;
            sheets.push(Worksheet::new(title, rows));
        }

        Ok(Self { sheets })
    }
}

/// Map relationship id → part name inside the container.
fn parse_relationships(parts: &WorkbookParts, path: &Path) -> Result<HashMap<String, String>> {
    let xml = parts
        .get_string(WORKBOOK_RELS_PART)
        .ok_or_else(|| format_error(path, format!("missing {}", WORKBOOK_RELS_PART)))?;
    let doc = Document::parse(&xml)
        .map_err(|e| format_error(path, format!("{}: {}", WORKBOOK_RELS_PART, e)))?;

    let mut relationships = HashMap::new();
    for node in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "Relationship")
    {
        if let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target")) {
            relationships.insert(id.to_string(), resolve_target(target));
        }
    }
    Ok(relationships)
}

/// Relationship targets are relative to `xl/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}
