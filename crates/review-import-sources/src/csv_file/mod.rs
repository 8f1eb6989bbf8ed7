mod fields;
mod reader;
mod validator;

pub use fields::{FieldDefinition, FIELD_DEFINITIONS, REQUIRED_COLUMNS, field_for_column, sample_csv};
pub use reader::CsvReader;
pub use validator::validate;
