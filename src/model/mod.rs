//! Mapping model building

mod assembler;
mod builder;
mod column_normalizer;
mod elements;
mod mapping_document;
mod validator;

pub use assembler::{
    assemble_table, filename_to_source_table, partition_columns, resolve_source_table,
    resolve_target_table,
};
pub use builder::build_mapping;
pub use column_normalizer::{
    canonical_type, is_blank_record, normalize_column, normalize_columns, CanonicalType,
    NormalizeContext,
};
pub use elements::*;
pub use mapping_document::MappingDocument;
pub use validator::{check_document_names, validate_mapping};
