use std::fmt;

/// A parse failure (§6.3): message, byte offset into `formula` (clamped to
/// `[0, formula.len()]`), and the original source. This is the engine's only
/// exceptional channel — value-level failures never take this shape (§4.8).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct ParseError {
    pub message: String,
    pub position: u32,
    pub formula: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: u32, formula: impl Into<String>) -> Self {
        let formula = formula.into();
        let clamped = position.min(formula.len() as u32);
        Self {
            message: message.into(),
            position: clamped,
            formula,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FormulaParseException: {}", self.message)?;
        writeln!(f, "  {}", self.formula)?;
        write!(f, "  {}^", " ".repeat(self.position as usize))
    }
}
