//! The `Function` trait (§4.4) and the `ArgumentHandle` a call site gets
//! passed — a thin window onto one unevaluated argument so lazy functions
//! (`IF`, `IFERROR`, `LAMBDA`, ...) can choose whether, and how many times,
//! to evaluate it.

use xlengine_parse::{AstNode, Scope, Value};

use crate::interpreter::Interpreter;
use crate::traits::EvaluationContext;

pub struct ArgumentHandle<'a> {
    node: &'a AstNode,
    interp: &'a Interpreter<'a>,
    scope: &'a Scope,
}

impl<'a> ArgumentHandle<'a> {
    pub(crate) fn new(node: &'a AstNode, interp: &'a Interpreter<'a>, scope: &'a Scope) -> Self {
        Self { node, interp, scope }
    }

    /// Evaluates the argument. Calling this is what makes a lazy function's
    /// unused branches never run (§4.2 "lazy calling convention").
    pub fn value(&self) -> Value {
        self.interp.eval(self.node, self.scope)
    }

    /// The raw AST, for functions that bind names rather than values
    /// (`LAMBDA`'s parameter list, `LET`'s alternating name slots).
    pub fn ast(&self) -> &'a AstNode {
        self.node
    }

    pub fn scope(&self) -> &'a Scope {
        self.scope
    }

    /// Evaluates the argument under a caller-supplied scope instead of the
    /// one it was constructed with — used by `LET` to thread each binding
    /// into the scope the next one (and the body) sees.
    pub fn eval_in(&self, scope: &Scope) -> Value {
        self.interp.eval(self.node, scope)
    }
}

/// An Excel-style callable (§4.4). `call` returns a `Value` directly, never
/// `Result` — a function failure is a `Value::Error`, not an exception
/// (§4.8's "errors are values" rule applies just as much to builtins as to
/// operators).
pub trait Function: 'static {
    fn name(&self) -> &'static str;

    fn min_args(&self) -> usize {
        0
    }

    /// `None` means variadic.
    fn max_args(&self) -> Option<usize> {
        None
    }

    /// Whether arguments are passed unevaluated (§4.4's `isLazy`). Purely
    /// descriptive here — whether an argument is actually evaluated is
    /// entirely up to what `call` does with each `ArgumentHandle`; this
    /// flag documents the function's calling convention for callers that
    /// introspect the registry.
    fn is_lazy(&self) -> bool {
        false
    }

    fn call(&self, args: &[ArgumentHandle<'_>], ctx: &dyn EvaluationContext) -> Value;
}
