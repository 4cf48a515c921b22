//! Read workbook ZIP parts into memory

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use anyhow::Result;
use zip::ZipArchive;

use crate::error::IngestError;

/// All parts of an .xlsx container, loaded into memory.
pub struct WorkbookParts {
    parts: HashMap<String, Vec<u8>>,
}

impl WorkbookParts {
    /// Read every entry of the workbook at `path`.
    ///
    /// The file handle lives only for the duration of this call.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| IngestError::WorkbookRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_reader(file, path)
    }

    /// Read every entry from an already opened container. `path` is only used in errors.
    pub fn from_reader<R: Read + Seek>(reader: R, path: &Path) -> Result<Self> {
        let mut archive = ZipArchive::new(reader).map_err(|e| IngestError::WorkbookFormat {
            path: path.to_path_buf(),
            message: format!("not a valid xlsx container: {}", e),
        })?;

        let mut parts = HashMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| IngestError::WorkbookFormat {
                path: path.to_path_buf(),
                message: format!("failed to read entry {}: {}", i, e),
            })?;

            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| IngestError::WorkbookRead {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            parts.insert(name, data);
        }

        Ok(Self { parts })
    }

    /// Get a part as a UTF-8 string.
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.parts
            .get(name)
            .and_then(|data| String::from_utf8(data.clone()).ok())
    }
}
