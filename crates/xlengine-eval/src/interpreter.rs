//! Walks an `AstNode` tree into a `Value` (§4.2). Operator semantics
//! (§4.3), the `=`-only error-participates-in-comparison carve-out, and the
//! lazy/eager function calling convention all live here.

use xlengine_common::ErrorKind;
use xlengine_parse::{AstNode, BinaryOp, Closure, Scope, UnaryOp, Value};

use crate::function::ArgumentHandle;
use crate::traits::EvaluationContext;

pub struct Interpreter<'a> {
    ctx: &'a dyn EvaluationContext,
}

impl<'a> Interpreter<'a> {
    pub fn new(ctx: &'a dyn EvaluationContext) -> Self {
        Self { ctx }
    }

    pub fn eval(&self, node: &AstNode, scope: &Scope) -> Value {
        match node {
            AstNode::Literal(v) => v.clone(),
            AstNode::Name(name) => scope.get(name).unwrap_or(Value::Error(ErrorKind::Name)),
            AstNode::CellRef { addr, sheet } => self.ctx.resolve_cell(sheet.as_deref(), *addr),
            AstNode::RangeRef { range, sheet } => self.ctx.resolve_range(sheet.as_deref(), *range),
            AstNode::Parenthesized(inner) => self.eval(inner, scope),
            AstNode::UnaryOp { op, operand } => {
                let v = self.eval(operand, scope);
                if v.is_error() {
                    return v;
                }
                eval_unary(*op, v)
            }
            AstNode::BinaryOp { left, op, right } => {
                let l = self.eval(left, scope);
                if op.short_circuits_on_error() && l.is_error() {
                    return l;
                }
                let r = self.eval(right, scope);
                if op.short_circuits_on_error() && r.is_error() {
                    return r;
                }
                eval_binary(*op, l, r)
            }
            AstNode::FunctionCall { name, args } => self.call_named(name, args, scope),
            AstNode::CallExpression { callee, args } => {
                let callee_value = self.eval(callee, scope);
                self.invoke(callee_value, args, scope)
            }
        }
    }

    fn call_named(&self, name: &str, args: &[AstNode], scope: &Scope) -> Value {
        if self.ctx.is_cancelled() {
            return Value::Error(ErrorKind::Calc);
        }
        let f = match self.ctx.get_function(name) {
            Some(f) => f,
            None => return Value::Error(ErrorKind::Name),
        };
        if args.len() < f.min_args() || f.max_args().is_some_and(|max| args.len() > max) {
            return Value::Error(ErrorKind::Value);
        }
        let handles: Vec<ArgumentHandle<'_>> = args
            .iter()
            .map(|a| ArgumentHandle::new(a, self, scope))
            .collect();
        f.call(&handles, self.ctx)
    }

    fn invoke(&self, callee: Value, args: &[AstNode], scope: &Scope) -> Value {
        match callee {
            Value::Error(k) => Value::Error(k),
            Value::Function(closure) => self.invoke_closure(&closure, args, scope),
            _ => Value::Error(ErrorKind::Value),
        }
    }

    /// Beta-reduction: each argument is evaluated in the *caller's* scope,
    /// then bound by name in a new scope chained onto the closure's capture
    /// (§3.2 "Function" value, §8 testable property 9).
    fn invoke_closure(&self, closure: &Closure, args: &[AstNode], scope: &Scope) -> Value {
        if self.ctx.is_cancelled() {
            return Value::Error(ErrorKind::Calc);
        }
        if args.len() != closure.params.len() {
            return Value::Error(ErrorKind::Value);
        }
        let bindings: Vec<(String, Value)> = closure
            .params
            .iter()
            .zip(args)
            .map(|(param, arg)| (param.clone(), self.eval(arg, scope)))
            .collect();
        let child = closure.scope.child(bindings);
        self.eval(&closure.body, &child)
    }
}

fn eval_unary(op: UnaryOp, v: Value) -> Value {
    let n = match v.to_number() {
        Some(n) => n,
        None => return Value::Error(ErrorKind::Value),
    };
    match op {
        UnaryOp::Neg => Value::Number(-n),
        UnaryOp::Pos => Value::Number(n),
        UnaryOp::Percent => Value::Number(n / 100.0),
    }
}

/// §4.3: every operator but `=` short-circuits on either side's error
/// before reaching here (see `Interpreter::eval`); `=` runs the ordinary
/// comparison algorithm with `Error` as an ordinary scalar at step 1.
fn eval_binary(op: BinaryOp, l: Value, r: Value) -> Value {
    match op {
        BinaryOp::Concat => Value::Text(format!("{}{}", l.to_text(), r.to_text())),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow => {
            eval_arithmetic(op, l, r)
        }
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
            eval_comparison(op, l, r)
        }
    }
}

fn eval_arithmetic(op: BinaryOp, l: Value, r: Value) -> Value {
    let (a, b) = match (l.to_number(), r.to_number()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Value::Error(ErrorKind::Value),
    };
    match op {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                Value::Error(ErrorKind::Div0)
            } else {
                Value::Number(a / b)
            }
        }
        BinaryOp::Pow => {
            let result = a.powf(b);
            if result.is_nan() {
                Value::Error(ErrorKind::Num)
            } else {
                Value::Number(result)
            }
        }
        _ => unreachable!(),
    }
}

/// The 3-step algorithm (§4.3): same-variant comparison first, else
/// numeric coercion on both sides, else textual coercion on both sides.
fn eval_comparison(op: BinaryOp, l: Value, r: Value) -> Value {
    let ordering = compare_values(&l, &r);
    let result = match op {
        BinaryOp::Eq => ordering == std::cmp::Ordering::Equal,
        BinaryOp::Ne => ordering != std::cmp::Ordering::Equal,
        BinaryOp::Lt => ordering == std::cmp::Ordering::Less,
        BinaryOp::Gt => ordering == std::cmp::Ordering::Greater,
        BinaryOp::Le => ordering != std::cmp::Ordering::Greater,
        BinaryOp::Ge => ordering != std::cmp::Ordering::Less,
        _ => unreachable!(),
    };
    Value::Boolean(result)
}

fn compare_values(l: &Value, r: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    if let (Value::Error(a), Value::Error(b)) = (l, r) {
        return if a == b { Ordering::Equal } else { Ordering::Greater };
    }
    if let (Value::Boolean(a), Value::Boolean(b)) = (l, r) {
        return a.cmp(b);
    }
    if let (Some(a), Some(b)) = (l.to_number(), r.to_number()) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Greater);
    }
    l.to_text().cmp(&r.to_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use xlengine_common::Range;

    struct EmptyContext;
    impl EvaluationContext for EmptyContext {
        fn resolve_cell(&self, _sheet: Option<&str>, _addr: xlengine_common::Address) -> Value {
            Value::Empty
        }
        fn get_function(&self, _name: &str) -> Option<std::rc::Rc<dyn crate::function::Function>> {
            None
        }
    }

    fn eval_str(src: &str) -> Value {
        let ast = xlengine_parse::parse(src).unwrap();
        let ctx = EmptyContext;
        Interpreter::new(&ctx).eval(&ast, &Scope::root())
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval_str("=1+2*3"), Value::Number(7.0));
    }

    #[test]
    fn division_by_zero_is_div0() {
        assert_eq!(eval_str("=1/0"), Value::Error(ErrorKind::Div0));
    }

    #[test]
    fn non_eq_short_circuits_on_left_error() {
        // #REF! + 1 never evaluates the comparison algorithm; it returns
        // the left error directly.
        assert_eq!(eval_str("=#REF!+1"), Value::Error(ErrorKind::Ref));
    }

    #[test]
    fn non_eq_short_circuits_on_right_error() {
        assert_eq!(eval_str("=1+#REF!"), Value::Error(ErrorKind::Ref));
    }

    #[test]
    fn concat_short_circuits_on_right_error() {
        assert_eq!(eval_str("=1&#REF!"), Value::Error(ErrorKind::Ref));
    }

    #[test]
    fn non_eq_comparison_short_circuits_on_right_error() {
        assert_eq!(eval_str("=5<#REF!"), Value::Error(ErrorKind::Ref));
    }

    #[test]
    fn eq_always_evaluates_both_sides_even_with_left_error() {
        assert_eq!(eval_str("=#REF!=#REF!"), Value::Boolean(true));
        assert_eq!(eval_str("=#REF!=#N/A"), Value::Boolean(false));
    }

    #[test]
    fn eq_falls_back_to_text_when_error_compared_to_other_variant() {
        // toNumber(Error) = None, so this falls to the textual fallback:
        // "#N/A" vs "5".
        assert_eq!(eval_str("=#N/A=5"), Value::Boolean(false));
    }

    #[test]
    fn concat_coerces_both_sides_to_text() {
        assert_eq!(eval_str("=1&\"x\""), Value::Text("1x".to_string()));
    }

    #[test]
    fn percent_binds_above_power_changes_result() {
        // 2^(50%) = 2^0.5
        let v = eval_str("=2^50%");
        match v {
            Value::Number(n) => assert!((n - std::f64::consts::SQRT_2).abs() < 1e-9),
            other => panic!("expected Number, got {other:?}"),
        }
    }

    #[test]
    fn lambda_beta_reduction() {
        assert_eq!(eval_str("=LAMBDA(x,x*2)(21)"), Value::Number(42.0));
    }

    #[test]
    fn cancellation_surfaces_as_calc_error() {
        struct CancelledContext;
        impl EvaluationContext for CancelledContext {
            fn resolve_cell(&self, _sheet: Option<&str>, _addr: xlengine_common::Address) -> Value {
                Value::Empty
            }
            fn get_function(&self, _name: &str) -> Option<Rc<dyn crate::function::Function>> {
                None
            }
            fn is_cancelled(&self) -> bool {
                true
            }
        }
        let ast = xlengine_parse::parse("=SUM(1,2)").unwrap();
        let ctx = CancelledContext;
        let v = Interpreter::new(&ctx).eval(&ast, &Scope::root());
        assert_eq!(v, Value::Error(ErrorKind::Calc));
    }

    #[test]
    fn range_reference_resolves_to_empty_grid() {
        struct Ctx;
        impl EvaluationContext for Ctx {
            fn resolve_cell(&self, _sheet: Option<&str>, _addr: xlengine_common::Address) -> Value {
                Value::Number(1.0)
            }
            fn get_function(&self, _name: &str) -> Option<Rc<dyn crate::function::Function>> {
                None
            }
        }
        let ctx = Ctx;
        let interp = Interpreter::new(&ctx);
        let range = Range::new(
            xlengine_common::Address::new(0, 0),
            xlengine_common::Address::new(1, 1),
        );
        let v = ctx.resolve_range(None, range);
        match v {
            Value::Range(rows) => assert_eq!(rows.len(), 2),
            other => panic!("expected Range, got {other:?}"),
        }
        let _ = interp; // silence unused warning in this focused test
    }
}
