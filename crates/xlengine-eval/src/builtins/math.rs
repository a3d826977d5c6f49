//! Eager numeric aggregates. Ranges flatten row-major; text and blanks are
//! ignored the way Excel's own aggregates ignore them, booleans count as
//! 0/1, and any `Error` encountered anywhere in the input propagates
//! immediately (§9.1).

use xlengine_common::ErrorKind;
use xlengine_parse::Value;

use crate::function::{ArgumentHandle, Function};
use crate::traits::EvaluationContext;

fn flatten(args: &[ArgumentHandle<'_>]) -> Result<Vec<f64>, Value> {
    let mut numbers = Vec::new();
    for arg in args {
        collect(&arg.value(), &mut numbers)?;
    }
    Ok(numbers)
}

fn collect(v: &Value, out: &mut Vec<f64>) -> Result<(), Value> {
    match v {
        Value::Error(k) => Err(Value::Error(*k)),
        Value::Number(n) => {
            out.push(*n);
            Ok(())
        }
        Value::Boolean(b) => {
            out.push(if *b { 1.0 } else { 0.0 });
            Ok(())
        }
        Value::Text(_) | Value::Empty | Value::Omitted => Ok(()),
        Value::Range(rows) => {
            for row in rows.iter() {
                for cell in row {
                    collect(cell, out)?;
                }
            }
            Ok(())
        }
        Value::Function(_) => Err(Value::Error(ErrorKind::Value)),
    }
}

pub struct SumFn;
impl Function for SumFn {
    fn name(&self) -> &'static str {
        "SUM"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        match flatten(args) {
            Ok(nums) => Value::Number(nums.iter().sum()),
            Err(e) => e,
        }
    }
}

pub struct AverageFn;
impl Function for AverageFn {
    fn name(&self) -> &'static str {
        "AVERAGE"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        match flatten(args) {
            Ok(nums) if nums.is_empty() => Value::Error(ErrorKind::Div0),
            Ok(nums) => Value::Number(nums.iter().sum::<f64>() / nums.len() as f64),
            Err(e) => e,
        }
    }
}

pub struct MinFn;
impl Function for MinFn {
    fn name(&self) -> &'static str {
        "MIN"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        match flatten(args) {
            Ok(nums) if nums.is_empty() => Value::Number(0.0),
            Ok(nums) => Value::Number(nums.into_iter().fold(f64::INFINITY, f64::min)),
            Err(e) => e,
        }
    }
}

pub struct MaxFn;
impl Function for MaxFn {
    fn name(&self) -> &'static str {
        "MAX"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        match flatten(args) {
            Ok(nums) if nums.is_empty() => Value::Number(0.0),
            Ok(nums) => Value::Number(nums.into_iter().fold(f64::NEG_INFINITY, f64::max)),
            Err(e) => e,
        }
    }
}
