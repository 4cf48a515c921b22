//! ingest-mapping: compiler for spreadsheet-based ingestion mappings
//!
//! This library compiles an ingestion workbook (.xlsx) into a canonical JSON
//! metadata document and batch/datalake source declaration documents.

pub mod config;
pub mod error;
pub mod metadata;
pub mod model;
pub mod parser;
pub mod sources;
pub mod util;
pub mod workbook;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

pub use config::{load_config, CompilerConfig, ConfigOverrides};
pub use error::{IngestError, MappingError};
pub use metadata::{load_mapping, write_metadata};
pub use model::{build_mapping, MappingDocument};
pub use sources::{generate_sources, SourceKind};
pub use workbook::Workbook;

/// Options for compiling a mapping workbook
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Path to the .xlsx workbook (defaults to `{ingestion_path}/{flow}.xlsx`)
    pub workbook_path: Option<PathBuf>,
    /// Flow namespace, case-insensitive
    pub flow: String,
    /// Root of the generated `flows/` and `models/sources/` trees
    pub output_dir: PathBuf,
    pub config: CompilerConfig,
}

impl CompileOptions {
    pub fn resolved_workbook_path(&self) -> PathBuf {
        self.workbook_path
            .clone()
            .unwrap_or_else(|| self.config.workbook_path(&self.flow))
    }
}

/// Result of a successful compilation
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub mapping: MappingDocument,
    pub metadata_path: PathBuf,
    /// Batch documents followed by datalake documents
    pub source_files: Vec<PathBuf>,
}

/// Compile a workbook without writing anything.
pub fn check_mapping(
    workbook_path: &Path,
    flow: &str,
    config: &CompilerConfig,
) -> Result<MappingDocument> {
    info!("Reading workbook: {}", workbook_path.display());
    let workbook = Workbook::open(workbook_path)?;
    info!("Found {} worksheets", workbook.worksheets().len());

    let mapping = build_mapping(&workbook, flow, config)?;
    info!("Compiled {} tables", mapping.len());
    Ok(mapping)
}

/// Compile a workbook and (re)write every generated document.
///
/// The metadata document is written last, so a failed run never leaves a new
/// metadata document behind.
pub fn compile_mapping(options: CompileOptions) -> Result<CompileOutput> {
    let flow = options.flow.trim().to_lowercase();
    let workbook_path = options.resolved_workbook_path();

    let mapping = check_mapping(&workbook_path, &flow, &options.config)?;

    let mut source_files = Vec::new();
    for kind in SourceKind::ALL {
        source_files.extend(generate_sources(&mapping, kind, &flow, &options.output_dir)?);
    }

    let metadata_path = write_metadata(&mapping, &flow, &options.output_dir)?;

    Ok(CompileOutput {
        mapping,
        metadata_path,
        source_files,
    })
}
