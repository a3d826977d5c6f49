use std::fmt;

/// The nine Excel-compatible error kinds, with stable textual codes.
///
/// These are *values*, not exceptions: they flow through [`crate::Value::Error`]
/// and propagate via the ordinary evaluation rules, never via `Result::Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Division by zero, or `AVERAGE` over zero numeric inputs.
    Div0,
    /// Coercion failure, wrong arity, wrong-type operand, invoking a non-function.
    Value,
    /// Unresolvable cell address, out-of-range lookup column, invalid range rectangle.
    Ref,
    /// Unknown function name or unbound identifier.
    Name,
    /// Out-of-domain numeric result.
    Num,
    /// Lookup not found, or explicit `NA()`.
    Na,
    /// Reserved for the explicit intersect-empty operator.
    Null,
    /// Calculation aborted (cancellation or refusal to allocate).
    Calc,
    /// Host-reported circular reference during cell resolution.
    Circular,
}

impl ErrorKind {
    /// The stable textual code, exactly as it appears in `toText`.
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::Div0 => "#DIV/0!",
            ErrorKind::Value => "#VALUE!",
            ErrorKind::Ref => "#REF!",
            ErrorKind::Name => "#NAME?",
            ErrorKind::Num => "#NUM!",
            ErrorKind::Na => "#N/A",
            ErrorKind::Null => "#NULL!",
            ErrorKind::Calc => "#CALC!",
            ErrorKind::Circular => "#CIRCULAR!",
        }
    }

    /// All nine kinds, in the order §3.3 lists them. Used by the tokenizer
    /// to recognize error-code literals in source text.
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::Div0,
        ErrorKind::Value,
        ErrorKind::Ref,
        ErrorKind::Name,
        ErrorKind::Num,
        ErrorKind::Na,
        ErrorKind::Null,
        ErrorKind::Calc,
        ErrorKind::Circular,
    ];

    /// Matches a literal occurrence of one of the nine codes at the start of `s`,
    /// returning the kind and the byte length of the matched code.
    pub fn from_prefix(s: &str) -> Option<(ErrorKind, usize)> {
        Self::ALL
            .iter()
            .map(|k| (*k, k.code()))
            .filter(|(_, code)| s.starts_with(code))
            .max_by_key(|(_, code)| code.len())
            .map(|(k, code)| (k, code.len()))
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Convenience wrapper so a host can bubble a [`ErrorKind`] out through
/// `anyhow`/`?` without conflating it with the parser's exceptional channel
/// (see §4.8 — value-level errors and parse errors are disjoint). Not used
/// anywhere inside this crate's own evaluation path.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq, Hash)]
#[error("{0}")]
pub struct ExcelError(pub ErrorKind);

impl From<ErrorKind> for ExcelError {
    fn from(kind: ErrorKind) -> Self {
        ExcelError(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_spec_table() {
        assert_eq!(ErrorKind::Div0.code(), "#DIV/0!");
        assert_eq!(ErrorKind::Value.code(), "#VALUE!");
        assert_eq!(ErrorKind::Ref.code(), "#REF!");
        assert_eq!(ErrorKind::Name.code(), "#NAME?");
        assert_eq!(ErrorKind::Num.code(), "#NUM!");
        assert_eq!(ErrorKind::Na.code(), "#N/A");
        assert_eq!(ErrorKind::Null.code(), "#NULL!");
        assert_eq!(ErrorKind::Calc.code(), "#CALC!");
        assert_eq!(ErrorKind::Circular.code(), "#CIRCULAR!");
    }

    #[test]
    fn from_prefix_picks_longest_match() {
        // #N/A is a prefix-free code but #DIV/0! shares no prefix with others;
        // still verify the matcher doesn't stop at a shorter accidental match.
        assert_eq!(
            ErrorKind::from_prefix("#N/A and then some"),
            Some((ErrorKind::Na, 4))
        );
        assert_eq!(ErrorKind::from_prefix("not an error"), None);
    }

    #[test]
    fn display_roundtrips_through_code() {
        for k in ErrorKind::ALL {
            assert_eq!(k.to_string(), k.code());
        }
    }
}
