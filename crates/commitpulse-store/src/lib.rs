pub mod error;
pub mod models;
pub mod reader;
pub mod writer;

// Re-exports
pub use error::{Error, Result};
pub use models::{CsvRow, EntryStatus, ResultEntry, SERIES_FILE_NAME};
pub use reader::{read_series, scan_results};
pub use writer::{render_csv, ResultWriter};
