//! Canonical metadata document: `{output_dir}/flows/{flow}.cfg.json`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::error::IngestError;
use crate::model::MappingDocument;
use crate::util::with_flow_prefix;

const FLOWS_DIR: &str = "flows";

pub fn metadata_path(output_dir: &Path, flow: &str) -> PathBuf {
    output_dir
        .join(FLOWS_DIR)
        .join(format!("{}.cfg.json", flow.to_lowercase()))
}

/// Write the whole mapping, replacing any previous document of the flow.
pub fn write_metadata(mapping: &MappingDocument, flow: &str, output_dir: &Path) -> Result<PathBuf> {
    let path = metadata_path(output_dir, flow);
    let write_error = |e| IngestError::MetadataWrite {
        path: path.clone(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let json = serde_json::to_string_pretty(mapping)?;
    fs::write(&path, json).map_err(write_error)?;

    info!("Wrote {} tables to {}", mapping.len(), path.display());
    Ok(path)
}

/// Read back the mapping of a flow.
///
/// With a non-empty `include` list only the named tables are returned, in the
/// order given. Names may be given with or without the `{flow}_` prefix.
pub fn load_mapping(output_dir: &Path, flow: &str, include: &[String]) -> Result<MappingDocument> {
    let flow = flow.to_lowercase();
    let path = metadata_path(output_dir, &flow);
    let content = fs::read_to_string(&path).map_err(|e| IngestError::MetadataRead {
        path: path.clone(),
        source: e,
    })?;
    let mapping: MappingDocument =
        serde_json::from_str(&content).map_err(|e| IngestError::MetadataParse {
            path: path.clone(),
            source: e,
        })?;

    if include.is_empty() {
        return Ok(mapping);
    }

    let mut selected = MappingDocument::new();
    for name in include {
        let name = with_flow_prefix(name.trim(), &flow);
        match mapping.get(&name) {
            Some(table) => selected.push(table.clone()),
            None => return Err(IngestError::TableNotFound { flow, table: name }.into()),
        }
    }
    Ok(selected)
}
