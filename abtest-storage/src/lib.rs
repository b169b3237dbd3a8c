pub mod csv_source;
pub mod memory;
pub mod table;
pub mod workbook;

pub use csv_source::CsvSource;
pub use memory::MemorySource;
pub use workbook::WorkbookSource;
