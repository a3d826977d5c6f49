//! `MATCH` and `VLOOKUP`, eager. Both support exact lookup (match type 0,
//! or an explicit `FALSE` range-lookup argument) and approximate lookup
//! over an ascending- or descending-sorted array (match type 1 / -1),
//! mirroring Excel's own default behavior.

use xlengine_common::ErrorKind;
use xlengine_parse::Value;

use crate::function::{ArgumentHandle, Function};
use crate::traits::EvaluationContext;

fn values_equal_loose(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => x.eq_ignore_ascii_case(y),
        _ => a == b,
    }
}

fn flatten_row_major(v: &Value) -> Vec<Value> {
    match v {
        Value::Range(rows) => rows.iter().flatten().cloned().collect(),
        other => vec![other.clone()],
    }
}

pub struct MatchFn;
impl Function for MatchFn {
    fn name(&self) -> &'static str {
        "MATCH"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        let lookup = args[0].value();
        if lookup.is_error() {
            return lookup;
        }
        let array = args[1].value();
        let flat = flatten_row_major(&array);
        let match_type = match args.get(2) {
            Some(h) => match h.value().to_number() {
                Some(n) => n as i32,
                None => return Value::Error(ErrorKind::Value),
            },
            None => 1,
        };
        match match_type {
            0 => position_exact(&flat, &lookup),
            1 => position_approximate(&flat, &lookup, true),
            -1 => position_approximate(&flat, &lookup, false),
            _ => Value::Error(ErrorKind::Value),
        }
    }
}

fn position_exact(flat: &[Value], lookup: &Value) -> Value {
    match flat.iter().position(|v| values_equal_loose(v, lookup)) {
        Some(i) => Value::Number((i + 1) as f64),
        None => Value::Error(ErrorKind::Na),
    }
}

/// `ascending`: the array is assumed sorted ascending (match type 1) and
/// this returns the position of the largest entry `<=` lookup; otherwise
/// (match type -1) the array is assumed sorted descending and this returns
/// the position of the smallest entry `>=` lookup.
fn position_approximate(flat: &[Value], lookup: &Value, ascending: bool) -> Value {
    let lookup_n = match lookup.to_number() {
        Some(n) => n,
        None => return Value::Error(ErrorKind::Na),
    };
    let mut best = None;
    for (i, v) in flat.iter().enumerate() {
        let Some(vn) = v.to_number() else { break };
        let keep = if ascending { vn <= lookup_n } else { vn >= lookup_n };
        if keep {
            best = Some(i);
        } else {
            break;
        }
    }
    best.map(|i| Value::Number((i + 1) as f64))
        .unwrap_or(Value::Error(ErrorKind::Na))
}

fn find_row(rows: &[Vec<Value>], lookup: &Value, approximate: bool) -> Option<usize> {
    if !approximate {
        return rows
            .iter()
            .position(|row| row.first().is_some_and(|c| values_equal_loose(c, lookup)));
    }
    let lookup_n = lookup.to_number()?;
    let mut best = None;
    for (i, row) in rows.iter().enumerate() {
        let cell = row.first()?;
        let Some(cn) = cell.to_number() else { break };
        if cn <= lookup_n {
            best = Some(i);
        } else {
            break;
        }
    }
    best
}

pub struct VLookupFn;
impl Function for VLookupFn {
    fn name(&self) -> &'static str {
        "VLOOKUP"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn max_args(&self) -> Option<usize> {
        Some(4)
    }
    fn call(&self, args: &[ArgumentHandle<'_>], _ctx: &dyn EvaluationContext) -> Value {
        let lookup = args[0].value();
        if lookup.is_error() {
            return lookup;
        }
        let table = args[1].value();
        let rows = match &table {
            Value::Range(rows) => rows.clone(),
            _ => return Value::Error(ErrorKind::Value),
        };
        let col_index = match args[2].value().to_number() {
            Some(n) if n >= 1.0 => n as usize,
            _ => return Value::Error(ErrorKind::Value),
        };
        let approximate = match args.get(3) {
            Some(h) => h.value().is_truthy(),
            None => true,
        };
        let Some(row_idx) = find_row(&rows, &lookup, approximate) else {
            return Value::Error(ErrorKind::Na);
        };
        match rows.get(row_idx).and_then(|r| r.get(col_index - 1)) {
            Some(v) => v.clone(),
            None => Value::Error(ErrorKind::Ref),
        }
    }
}
