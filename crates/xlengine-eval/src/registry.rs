//! Case-insensitive function registry (§4.4 "Registry"). Lives on the
//! `Engine` instance rather than behind a process-global static, so that
//! independent engines (e.g. one per test) never share registered functions.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::function::Function;

#[derive(Default)]
pub struct Registry {
    functions: FxHashMap<String, Rc<dyn Function>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, f: Rc<dyn Function>) {
        self.functions.insert(f.name().to_ascii_uppercase(), f);
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Function>> {
        self.functions.get(&name.to_ascii_uppercase()).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Clones the catalog and layers `extra` on top, leaving `self` untouched
    /// — lets a host build a variant registry (e.g. for a sandboxed
    /// evaluation) without disturbing the one already wired into an `Engine`.
    pub fn copy_with(&self, extra: impl IntoIterator<Item = Rc<dyn Function>>) -> Registry {
        let mut copy = Registry {
            functions: self.functions.clone(),
        };
        for f in extra {
            copy.register(f);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xlengine_parse::Value;

    struct Dummy;
    impl Function for Dummy {
        fn name(&self) -> &'static str {
            "DUMMY"
        }
        fn call(&self, _args: &[crate::function::ArgumentHandle<'_>], _ctx: &dyn crate::traits::EvaluationContext) -> Value {
            Value::Boolean(true)
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut reg = Registry::new();
        reg.register(Rc::new(Dummy));
        assert!(reg.get("dummy").is_some());
        assert!(reg.get("DUMMY").is_some());
        assert!(reg.get("missing").is_none());
    }

    #[test]
    fn copy_with_leaves_original_untouched() {
        let base = Registry::new();
        let extended = base.copy_with([Rc::new(Dummy) as Rc<dyn Function>]);
        assert!(base.get("dummy").is_none());
        assert!(extended.get("dummy").is_some());
    }
}
