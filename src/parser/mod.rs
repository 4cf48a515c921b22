//! Ingestion worksheet parsing

mod directive_parser;
mod raw_table;

pub(crate) use directive_parser::WHERE_CONDITION_KEY;
pub use directive_parser::parse_worksheet;
pub use raw_table::{RawColumnRecord, RawTable};
