//! Mapping workbook input (.xlsx)

mod cell;
mod reader;
mod sheet;
mod xlsx;

pub use cell::CellValue;
pub use reader::WorkbookParts;
pub use sheet::Worksheet;
pub use xlsx::Workbook;
