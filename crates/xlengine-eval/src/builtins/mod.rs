//! The engine's entire function catalog (§9.1) — small and fixed by
//! design; the ~400-function catalog a real spreadsheet ships is explicitly
//! out of scope.

mod lambda;
mod logical;
mod lookup;
mod math;

use std::rc::Rc;

use crate::registry::Registry;

pub fn register_all(registry: &mut Registry) {
    registry.register(Rc::new(math::SumFn));
    registry.register(Rc::new(math::AverageFn));
    registry.register(Rc::new(math::MinFn));
    registry.register(Rc::new(math::MaxFn));

    registry.register(Rc::new(logical::IfFn));
    registry.register(Rc::new(logical::IfErrorFn));
    registry.register(Rc::new(logical::IfNaFn));
    registry.register(Rc::new(logical::IfsFn));
    registry.register(Rc::new(logical::NotFn));
    registry.register(Rc::new(logical::AndFn));
    registry.register(Rc::new(logical::OrFn));
    registry.register(Rc::new(logical::NaFn));

    registry.register(Rc::new(lookup::MatchFn));
    registry.register(Rc::new(lookup::VLookupFn));

    registry.register(Rc::new(lambda::LambdaFn));
    registry.register(Rc::new(lambda::LetFn));
}
