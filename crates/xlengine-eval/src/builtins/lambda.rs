//! `LAMBDA` builds a closure value; `LET` is its natural dual, binding
//! names in a child scope before evaluating a trailing body (§9.1). Both
//! are lazy: a `LAMBDA` body must not run until applied, and `LET`'s value
//! expressions must see only the bindings that precede them.

use std::rc::Rc;

use xlengine_common::ErrorKind;
use xlengine_parse::{AstNode, Closure, Value};

use crate::function::{ArgumentHandle, Function};
use crate::traits::EvaluationContext;

pub struct LambdaFn;
impl Function for LambdaFn {
    fn name(&self) -> &'static str {
        "LAMBDA"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn is_lazy(&self) -> bool {
        true
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        let (param_handles, body_handle) = args.split_at(args.len() - 1);
        let mut params = Vec::with_capacity(param_handles.len());
        for h in param_handles {
            match h.ast() {
                AstNode::Name(n) => params.push(n.clone()),
                _ => return Value::Error(ErrorKind::Value),
            }
        }
        let body = Rc::new(body_handle[0].ast().clone());
        let scope = body_handle[0].scope().clone();
        Value::Function(Rc::new(Closure { params, body, scope }))
    }
}

pub struct LetFn;
impl Function for LetFn {
    fn name(&self) -> &'static str {
        "LET"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn is_lazy(&self) -> bool {
        true
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        if args.len() % 2 == 0 {
            return Value::Error(ErrorKind::Value);
        }
        let (pairs, body) = args.split_at(args.len() - 1);
        let mut scope = body[0].scope().clone();
        for chunk in pairs.chunks_exact(2) {
            let name = match chunk[0].ast() {
                AstNode::Name(n) => n.clone(),
                _ => return Value::Error(ErrorKind::Value),
            };
            let value = chunk[1].eval_in(&scope);
            if value.is_error() {
                return value;
            }
            scope = scope.child(vec![(name, value)]);
        }
        body[0].eval_in(&scope)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;
    use xlengine_parse::Value;

    #[test]
    fn lambda_applies_to_its_argument() {
        let engine = Engine::new();
        assert_eq!(
            engine.evaluate_string("=LAMBDA(x,x*x)(5)").unwrap(),
            Value::Number(25.0)
        );
    }

    #[test]
    fn let_bindings_chain_and_shadow() {
        let engine = Engine::new();
        assert_eq!(
            engine.evaluate_string("=LET(a,2,b,a*3,a+b)").unwrap(),
            Value::Number(8.0)
        );
    }

    #[test]
    fn let_requires_a_pair_plus_body() {
        let engine = Engine::new();
        assert!(engine.evaluate_string("=LET(a,1)").unwrap().is_error());
    }
}
