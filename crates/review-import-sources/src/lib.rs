pub mod csv_file;
pub mod error;
pub mod factory;
pub mod traits;

pub use csv_file::{CsvReader, FieldDefinition, FIELD_DEFINITIONS, REQUIRED_COLUMNS, sample_csv};
pub use error::SourceError;
pub use factory::source_for_path;
pub use traits::{ReviewSource, RowBatch, ValidationReport};
