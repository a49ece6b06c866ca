//! Generic, profile-driven CSV decoding

pub mod decode;
pub mod profile;
pub mod value;

pub use decode::{CsvDecoder, FromDecodedRow};
pub use profile::{ColumnMap, FieldFormatter, RawCsvProfile, ValueType};
pub use value::{DecodedRow, FieldValue};
