//! The seam between the interpreter and whatever owns cell storage (§4.5).
//! Object-safe by design, so `Engine` (and any host's own implementation)
//! can be passed around as `&dyn EvaluationContext`.

use std::rc::Rc;

use xlengine_common::Address;
use xlengine_parse::Value;

use crate::function::Function;

/// Resolves references and looks up registered functions. `Engine`
/// implements this directly; a host embedding this crate without `Engine`'s
/// dependency graph can implement it over its own cell storage instead.
pub trait EvaluationContext {
    fn resolve_cell(&self, sheet: Option<&str>, addr: Address) -> Value;

    /// Row-major `Value::Range` covering every cell in `range`. Default
    /// implementation calls `resolve_cell` once per address; a host with
    /// bulk storage access can override this for efficiency.
    fn resolve_range(&self, sheet: Option<&str>, range: xlengine_common::Range) -> Value {
        if self.is_cancelled() {
            return Value::Error(xlengine_common::ErrorKind::Calc);
        }
        let width = range.width() as usize;
        let mut rows = Vec::new();
        let mut current = Vec::with_capacity(width);
        for addr in range.cells() {
            current.push(self.resolve_cell(sheet, addr));
            if current.len() == width {
                rows.push(std::mem::take(&mut current));
            }
        }
        Value::Range(Rc::new(rows))
    }

    fn get_function(&self, name: &str) -> Option<Rc<dyn Function>>;

    /// The cell the current evaluation was entered for, if any (§4.5,
    /// informational).
    fn current_cell(&self) -> Option<Address> {
        None
    }

    /// The sheet the current evaluation was entered for, if any (§4.5,
    /// informational).
    fn current_sheet(&self) -> Option<String> {
        None
    }

    /// Cooperative cancellation check (§4.5, §5). Polled at component
    /// boundaries — function entry, range materialization, higher-order
    /// loop headers — so a host can abort a long-running evaluation; a
    /// `true` return surfaces as `Error(#CALC!)` at the next poll.
    fn is_cancelled(&self) -> bool {
        false
    }
}
