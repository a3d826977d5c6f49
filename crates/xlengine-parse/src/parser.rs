//! Precedence-climbing parser over the exact table in §4.1. Levels are
//! numbered low-to-high exactly as spec'd; level 5 (`^`) is the only
//! right-associative tier, level 7 (postfix `%` and postfix `(args)` calls)
//! binds tightest of all — including tighter than `^`, per §9's resolved
//! open question (`2^50%` parses as `2^(50%)`).

use xlengine_common::{letters_to_column_index, Address, Range};

use crate::ast::{AstNode, BinaryOp, UnaryOp};
use crate::tokenizer::{Op, Token, TokenKind, Tokenizer};
use crate::value::Value;
use crate::ParseError;

pub fn parse(source: &str) -> Result<AstNode, ParseError> {
    let mut tokens = Tokenizer::tokenize(source)?;
    // The leading `=` is optional and ignored (§6.1); it can only appear as
    // the very first token since nothing precedes it to make it a binary
    // comparison.
    if let Some(Token {
        kind: TokenKind::Op(Op::Eq),
        ..
    }) = tokens.first()
    {
        tokens.remove(0);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        src: source,
    };
    let node = parser.parse_expr()?;
    parser.finish(node)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    src: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eof_pos(&self) -> u32 {
        self.src.len() as u32
    }

    fn err(&self, message: impl Into<String>, pos: u32) -> ParseError {
        ParseError::new(message, pos, self.src.to_string())
    }

    fn finish(&mut self, node: AstNode) -> Result<AstNode, ParseError> {
        match self.peek() {
            None => Ok(node),
            Some(tok) => {
                let pos = tok.start as u32;
                if matches!(tok.kind, TokenKind::Op(Op::RParen)) {
                    Err(self.err(format!("Unexpected closing parenthesis at position {pos}"), pos))
                } else {
                    Err(self.err(format!("Unexpected token at position {pos}"), pos))
                }
            }
        }
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        tok
    }

    fn expect_op(&mut self, op: Op, unbalanced_paren: bool) -> Result<(), ParseError> {
        match self.peek() {
            Some(tok) if tok.kind == TokenKind::Op(op) => {
                self.pos += 1;
                Ok(())
            }
            Some(tok) => {
                let pos = tok.start as u32;
                Err(self.err(format!("Expected '{}' at position {pos}", op.text()), pos))
            }
            None if unbalanced_paren => Err(self.err(
                "Unexpected end of formula: missing closing `)`",
                self.eof_pos(),
            )),
            None => Err(self.err("Unexpected end of formula", self.eof_pos())),
        }
    }

    fn parse_expr(&mut self) -> Result<AstNode, ParseError> {
        self.parse_level1()
    }

    fn parse_level1(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_level2()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Op(Op::Eq)) => BinaryOp::Eq,
                Some(TokenKind::Op(Op::Ne)) => BinaryOp::Ne,
                Some(TokenKind::Op(Op::Lt)) => BinaryOp::Lt,
                Some(TokenKind::Op(Op::Gt)) => BinaryOp::Gt,
                Some(TokenKind::Op(Op::Le)) => BinaryOp::Le,
                Some(TokenKind::Op(Op::Ge)) => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_level2()?;
            left = AstNode::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_level2(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_level3()?;
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Op(Op::Amp))) {
            self.advance();
            let right = self.parse_level3()?;
            left = AstNode::BinaryOp {
                left: Box::new(left),
                op: BinaryOp::Concat,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_level3(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_level4()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Op(Op::Plus)) => BinaryOp::Add,
                Some(TokenKind::Op(Op::Minus)) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_level4()?;
            left = AstNode::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_level4(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_level5()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Op(Op::Star)) => BinaryOp::Mul,
                Some(TokenKind::Op(Op::Slash)) => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_level5()?;
            left = AstNode::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// Right-associative: the right operand recurses into this same level,
    /// so `2^3^4` parses as `2^(3^4)`.
    fn parse_level5(&mut self) -> Result<AstNode, ParseError> {
        let left = self.parse_level6()?;
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Op(Op::Caret))) {
            self.advance();
            let right = self.parse_level5()?;
            Ok(AstNode::BinaryOp {
                left: Box::new(left),
                op: BinaryOp::Pow,
                right: Box::new(right),
            })
        } else {
            Ok(left)
        }
    }

    fn parse_level6(&mut self) -> Result<AstNode, ParseError> {
        let op = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Op(Op::Minus)) => Some(UnaryOp::Neg),
            Some(TokenKind::Op(Op::Plus)) => Some(UnaryOp::Pos),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let operand = self.parse_level6()?;
                Ok(AstNode::UnaryOp {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.parse_level7(),
        }
    }

    /// Postfix `%` and postfix `(args)` calls — the tightest-binding tier,
    /// above `^` (§9).
    fn parse_level7(&mut self) -> Result<AstNode, ParseError> {
        let mut node = self.parse_primary()?;
        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Op(Op::Percent)) => {
                    self.advance();
                    node = AstNode::UnaryOp {
                        op: UnaryOp::Percent,
                        operand: Box::new(node),
                    };
                }
                Some(TokenKind::Op(Op::LParen)) => {
                    let args = self.parse_arg_list()?;
                    node = AstNode::CallExpression {
                        callee: Box::new(node),
                        args,
                    };
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_arg_list(&mut self) -> Result<Vec<AstNode>, ParseError> {
        self.expect_op(Op::LParen, false)?;
        let mut args = Vec::new();
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Op(Op::RParen))) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Op(Op::Comma)) | Some(TokenKind::Op(Op::Semicolon)) => {
                    self.advance();
                }
                _ => break,
            }
        }
        self.expect_op(Op::RParen, true)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        let tok = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.err("Unexpected end of formula", self.eof_pos())),
        };
        match tok.kind {
            TokenKind::Op(Op::LParen) => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_op(Op::RParen, true)?;
                Ok(AstNode::Parenthesized(Box::new(inner)))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(AstNode::Literal(Value::Number(n)))
            }
            TokenKind::Text(s) => {
                self.advance();
                Ok(AstNode::Literal(Value::Text(s)))
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(AstNode::Literal(Value::Boolean(b)))
            }
            TokenKind::ErrorLiteral(k) => {
                self.advance();
                Ok(AstNode::Literal(Value::Error(k)))
            }
            TokenKind::SheetPrefix(sheet) => {
                self.advance();
                self.parse_reference(Some(sheet))
            }
            TokenKind::CellRef(_) => self.parse_reference(None),
            TokenKind::Ident(name) => {
                self.advance();
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Op(Op::LParen))) {
                    let args = self.parse_arg_list()?;
                    Ok(AstNode::function_call(name, args))
                } else {
                    Ok(AstNode::Name(name))
                }
            }
            TokenKind::Op(Op::RParen) => {
                let pos = tok.start as u32;
                Err(self.err(format!("Unexpected closing parenthesis at position {pos}"), pos))
            }
            _ => {
                let pos = tok.start as u32;
                Err(self.err(format!("Unexpected token at position {pos}"), pos))
            }
        }
    }

    fn parse_reference(&mut self, sheet: Option<String>) -> Result<AstNode, ParseError> {
        let first = match self.peek() {
            Some(Token {
                kind: TokenKind::CellRef(s),
                ..
            }) => s.clone(),
            Some(tok) => {
                let pos = tok.start as u32;
                return Err(self.err(format!("Expected cell reference at position {pos}"), pos));
            }
            None => return Err(self.err("Unexpected end of formula", self.eof_pos())),
        };
        self.advance();
        let first_addr = parse_cell_ref_text(&first);

        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Op(Op::Colon))) {
            self.advance();
            let second = match self.peek() {
                Some(Token {
                    kind: TokenKind::CellRef(s),
                    ..
                }) => s.clone(),
                Some(tok) => {
                    let pos = tok.start as u32;
                    return Err(self.err(
                        format!("Expected cell reference after ':' at position {pos}"),
                        pos,
                    ));
                }
                None => return Err(self.err("Unexpected end of formula", self.eof_pos())),
            };
            self.advance();
            let second_addr = parse_cell_ref_text(&second);
            Ok(AstNode::RangeRef {
                range: Range::new(first_addr, second_addr),
                sheet,
            })
        } else {
            Ok(AstNode::CellRef {
                addr: first_addr,
                sheet,
            })
        }
    }
}

/// Converts raw `$?letters$?digits` reference text (anchors included) into
/// a resolved zero-based `Address`; the tokenizer has already validated the
/// shape, so this never fails (§3.1 — anchors are discarded here).
fn parse_cell_ref_text(s: &str) -> Address {
    let bytes = s.as_bytes();
    let mut i = 0;
    if bytes[i] == b'$' {
        i += 1;
    }
    let col_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    let col_text = &s[col_start..i];
    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }
    let row_text = &s[i..];
    let col = letters_to_column_index(col_text).unwrap_or(0);
    let row: u32 = row_text.parse().unwrap_or(1);
    Address::new(col, row.saturating_sub(1))
}
