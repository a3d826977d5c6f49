//! `IF`/`IFERROR`/`IFNA`/`IFS` are lazy (§4.2 step 3's own examples); the
//! plain connectives are eager and exercise `isTruthy`/`toBool` (§9.1).

use xlengine_common::ErrorKind;
use xlengine_parse::Value;

use crate::function::{ArgumentHandle, Function};
use crate::traits::EvaluationContext;

pub struct IfFn;
impl Function for IfFn {
    fn name(&self) -> &'static str {
        "IF"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
    fn is_lazy(&self) -> bool {
        true
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        let cond = args[0].value();
        if cond.is_error() {
            return cond;
        }
        if cond.is_truthy() {
            args[1].value()
        } else if let Some(else_branch) = args.get(2) {
            else_branch.value()
        } else {
            Value::Boolean(false)
        }
    }
}

pub struct IfErrorFn;
impl Function for IfErrorFn {
    fn name(&self) -> &'static str {
        "IFERROR"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
    fn is_lazy(&self) -> bool {
        true
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        let v = args[0].value();
        if v.is_error() {
            args[1].value()
        } else {
            v
        }
    }
}

pub struct IfNaFn;
impl Function for IfNaFn {
    fn name(&self) -> &'static str {
        "IFNA"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
    fn is_lazy(&self) -> bool {
        true
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        let v = args[0].value();
        if v == Value::Error(ErrorKind::Na) {
            args[1].value()
        } else {
            v
        }
    }
}

pub struct IfsFn;
impl Function for IfsFn {
    fn name(&self) -> &'static str {
        "IFS"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn is_lazy(&self) -> bool {
        true
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        if args.len() % 2 != 0 {
            return Value::Error(ErrorKind::Value);
        }
        for pair in args.chunks_exact(2) {
            let cond = pair[0].value();
            if cond.is_error() {
                return cond;
            }
            if cond.is_truthy() {
                return pair[1].value();
            }
        }
        Value::Error(ErrorKind::Na)
    }
}

pub struct NotFn;
impl Function for NotFn {
    fn name(&self) -> &'static str {
        "NOT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        let v = args[0].value();
        if v.is_error() {
            v
        } else {
            Value::Boolean(!v.is_truthy())
        }
    }
}

pub struct AndFn;
impl Function for AndFn {
    fn name(&self) -> &'static str {
        "AND"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        for a in args {
            let v = a.value();
            if v.is_error() {
                return v;
            }
            if !v.is_truthy() {
                return Value::Boolean(false);
            }
        }
        Value::Boolean(true)
    }
}

pub struct OrFn;
impl Function for OrFn {
    fn name(&self) -> &'static str {
        "OR"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        let mut found_true = false;
        for a in args {
            let v = a.value();
            if v.is_error() {
                return v;
            }
            if v.is_truthy() {
                found_true = true;
            }
        }
        Value::Boolean(found_true)
    }
}

pub struct NaFn;
impl Function for NaFn {
    fn name(&self) -> &'static str {
        "NA"
    }
    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
    fn call(&self, _args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        Value::Error(ErrorKind::Na)
    }
}
