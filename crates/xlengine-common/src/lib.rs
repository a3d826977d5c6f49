//! Address, range, and error-taxonomy types shared between the tokenizer/parser
//! and the evaluation engine. The `Value` sum type itself lives in
//! `xlengine-parse`, alongside the AST, since a `LAMBDA` value closes over an
//! AST body.

mod address;
mod error;

pub use address::{column_to_letters, letters_to_column_index, Address, Range, SheetRef};
pub use error::{ErrorKind, ExcelError};
