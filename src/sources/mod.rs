//! Source declaration documents for the transformation tool

mod assertions;
pub mod document;
mod writer;

pub use assertions::{column_tests, has_compound_key, partition_predicate, table_tests};
pub use writer::{document_name, generate_sources, render_source, sources_dir, SourceKind};
