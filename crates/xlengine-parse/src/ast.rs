//! The sealed AST (§3.4). Nodes are immutable once built and hold no mutable
//! state (§9 "Immutability") — the parse cache can retain them indefinitely.

use smallvec::SmallVec;
use xlengine_common::{Address, Range};

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    /// Postfix `%`, divides the operand by 100 (§4.3).
    Percent,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Percent => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Concat => "&",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }

    /// True for every operator except `=`, matching the §4.2 short-circuit
    /// carve-out: `=` is the only operator that evaluates both sides
    /// regardless of either side being an error, and compares them as
    /// ordinary scalars. Used for both the left- and right-hand error
    /// checks in `Interpreter::eval`.
    pub fn short_circuits_on_error(self) -> bool {
        !matches!(self, BinaryOp::Eq)
    }
}

/// A cell or range reference's optional sheet scope, carried alongside the
/// resolved address/range (§3.1 — anchors are not preserved past parsing,
/// only the resolved coordinates and the sheet name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellReference {
    pub sheet: Option<String>,
    pub addr: Address,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Literal(Value),
    CellRef {
        addr: Address,
        sheet: Option<String>,
    },
    RangeRef {
        range: Range,
        sheet: Option<String>,
    },
    /// A bare identifier: a LAMBDA parameter or LET binding name.
    Name(String),
    UnaryOp {
        op: UnaryOp,
        operand: Box<AstNode>,
    },
    BinaryOp {
        left: Box<AstNode>,
        op: BinaryOp,
        right: Box<AstNode>,
    },
    /// `name` is upper-cased at construction time (§3.4).
    FunctionCall {
        name: String,
        args: Vec<AstNode>,
    },
    /// Invokes a `Value::Function` produced by `callee` — enables
    /// `LAMBDA(x, x+1)(5)` and chained calls.
    CallExpression {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
    },
    /// Preserves source formatting in `toFormulaString`; evaluates
    /// identically to `inner`.
    Parenthesized(Box<AstNode>),
}

impl AstNode {
    pub fn function_call(name: impl Into<String>, args: Vec<AstNode>) -> Self {
        AstNode::FunctionCall {
            name: name.into().to_ascii_uppercase(),
            args,
        }
    }

    /// Every scalar address covered by any contained range (§3.4), walked
    /// with an explicit stack rather than recursion — the same idiom the
    /// dependency graph's traversals use (§4.7), kept consistent here even
    /// though only the graph traversal is strictly mandated to be iterative.
    pub fn cell_references(&self) -> Vec<CellReference> {
        let mut out = Vec::new();
        let mut stack: SmallVec<[&AstNode; 8]> = SmallVec::new();
        stack.push(self);
        while let Some(node) = stack.pop() {
            match node {
                AstNode::CellRef { addr, sheet } => out.push(CellReference {
                    sheet: sheet.clone(),
                    addr: *addr,
                }),
                AstNode::RangeRef { range, sheet } => {
                    for addr in range.cells() {
                        out.push(CellReference {
                            sheet: sheet.clone(),
                            addr,
                        });
                    }
                }
                AstNode::UnaryOp { operand, .. } => stack.push(operand),
                AstNode::BinaryOp { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                AstNode::FunctionCall { args, .. } => {
                    for a in args.iter().rev() {
                        stack.push(a);
                    }
                }
                AstNode::CallExpression { callee, args } => {
                    stack.push(callee);
                    for a in args.iter().rev() {
                        stack.push(a);
                    }
                }
                AstNode::Parenthesized(inner) => stack.push(inner),
                AstNode::Literal(_) | AstNode::Name(_) => {}
            }
        }
        out
    }

    /// Faithful round-trip modulo whitespace and anchor markers (§3.4, §8
    /// "parse-and-render round-trip").
    pub fn to_formula_string(&self) -> String {
        match self {
            AstNode::Literal(v) => literal_to_formula(v),
            AstNode::CellRef { addr, sheet } => with_sheet(sheet, &addr.to_string()),
            AstNode::RangeRef { range, sheet } => with_sheet(sheet, &range.to_string()),
            AstNode::Name(n) => n.clone(),
            AstNode::UnaryOp { op, operand } => match op {
                UnaryOp::Percent => format!("{}%", operand.to_formula_string()),
                _ => format!("{}{}", op.symbol(), operand.to_formula_string()),
            },
            AstNode::BinaryOp { left, op, right } => format!(
                "{}{}{}",
                left.to_formula_string(),
                op.symbol(),
                right.to_formula_string()
            ),
            AstNode::FunctionCall { name, args } => format!(
                "{name}({})",
                args.iter()
                    .map(AstNode::to_formula_string)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            AstNode::CallExpression { callee, args } => format!(
                "{}({})",
                callee.to_formula_string(),
                args.iter()
                    .map(AstNode::to_formula_string)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            AstNode::Parenthesized(inner) => format!("({})", inner.to_formula_string()),
        }
    }
}

fn with_sheet(sheet: &Option<String>, text: &str) -> String {
    match sheet {
        Some(s) if s.contains(' ') => format!("'{s}'!{text}"),
        Some(s) => format!("{s}!{text}"),
        None => text.to_string(),
    }
}

fn literal_to_formula(v: &Value) -> String {
    match v {
        Value::Text(s) => format!("\"{}\"", s.replace('"', "\"\"")),
        _ => v.to_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xlengine_common::ErrorKind;

    #[test]
    fn cell_references_expands_ranges() {
        let node = AstNode::RangeRef {
            range: Range::new(Address::new(0, 0), Address::new(1, 1)),
            sheet: None,
        };
        let refs = node.cell_references();
        assert_eq!(refs.len(), 4);
    }

    #[test]
    fn to_formula_string_roundtrips_parenthesized() {
        let node = AstNode::Parenthesized(Box::new(AstNode::BinaryOp {
            left: Box::new(AstNode::Literal(Value::Number(1.0))),
            op: BinaryOp::Add,
            right: Box::new(AstNode::Literal(Value::Number(2.0))),
        }));
        assert_eq!(node.to_formula_string(), "(1+2)");
    }

    #[test]
    fn function_call_uppercases_name() {
        let node = AstNode::function_call("sum", vec![AstNode::Literal(Value::Number(1.0))]);
        match node {
            AstNode::FunctionCall { name, .. } => assert_eq!(name, "SUM"),
            _ => panic!("expected FunctionCall"),
        }
    }

    #[test]
    fn literal_error_renders_code() {
        let node = AstNode::Literal(Value::Error(ErrorKind::Na));
        assert_eq!(node.to_formula_string(), "#N/A");
    }
}
