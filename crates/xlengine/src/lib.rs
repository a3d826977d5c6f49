//! Re-exports the split crates as one dependency: `xlengine_common` for
//! addresses and error kinds, `xlengine_parse` for the tokenizer/parser/AST,
//! and (with the `eval` feature, on by default) `xlengine_eval`'s `Engine`.

#[cfg(feature = "common")]
pub use xlengine_common as common;

#[cfg(feature = "parse")]
pub use xlengine_parse as parse;

#[cfg(feature = "eval")]
pub use xlengine_eval as eval;

#[cfg(feature = "eval")]
pub use xlengine_eval::Engine;

#[cfg(feature = "parse")]
pub use xlengine_parse::{parse as parse_formula, AstNode, Value};

#[cfg(feature = "common")]
pub use xlengine_common::{Address, ErrorKind, Range};
