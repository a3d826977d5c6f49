//! The engine façade (§4.6): owns the function registry, the parse cache,
//! and the dependency graph, and implements `EvaluationContext` over its
//! own graph so formulas can reference other cells.

pub mod graph;

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use xlengine_common::Address;
use xlengine_parse::{AstNode, CellReference, ParseError, Scope, Value};

use crate::builtins;
use crate::function::Function;
use crate::interpreter::Interpreter;
use crate::registry::Registry;
use crate::traits::EvaluationContext;
use graph::DependencyGraph;

/// Interior mutability via `RefCell`, not `Mutex`/`RwLock` — consistent
/// with `Value`'s `Rc`-based representation (§5 "shared state"), which
/// already rules out sending an `Engine` across threads. A single-writer
/// lock still applies; it is just not one that needs to survive a second
/// thread.
pub struct Engine {
    registry: RefCell<Registry>,
    parse_cache: RefCell<FxHashMap<String, Rc<AstNode>>>,
    graph: RefCell<DependencyGraph>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        let mut registry = Registry::new();
        builtins::register_all(&mut registry);
        Self {
            registry: RefCell::new(registry),
            parse_cache: RefCell::new(FxHashMap::default()),
            graph: RefCell::new(DependencyGraph::new()),
        }
    }

    pub fn register_function(&self, f: Rc<dyn Function>) {
        self.registry.borrow_mut().register(f);
    }

    pub fn functions(&self) -> Vec<String> {
        self.registry.borrow().names()
    }

    /// Parses `formula` or returns the cached `AstNode` from a prior call
    /// with the exact same source string (§4.6, §8 idempotence). Every
    /// clone of the returned `Rc` is the same allocation, so identity
    /// equality holds trivially for repeated calls.
    pub fn parse_cached(&self, formula: &str) -> Result<Rc<AstNode>, ParseError> {
        if let Some(hit) = self.parse_cache.borrow().get(formula) {
            return Ok(hit.clone());
        }
        let ast = Rc::new(xlengine_parse::parse(formula)?);
        self.parse_cache.borrow_mut().insert(formula.to_string(), ast.clone());
        Ok(ast)
    }

    pub fn clear_cache(&self) {
        self.parse_cache.borrow_mut().clear();
    }

    pub fn evaluate_string(&self, formula: &str) -> Result<Value, ParseError> {
        let ast = self.parse_cached(formula)?;
        Ok(self.evaluate(&ast))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
    pub fn evaluate(&self, ast: &AstNode) -> Value {
        let interp = Interpreter::new(self);
        interp.eval(ast, &Scope::root())
    }

    pub fn cell_references(&self, formula: &str) -> Result<Vec<CellReference>, ParseError> {
        Ok(self.parse_cached(formula)?.cell_references())
    }

    pub fn set_cell_value(&self, sheet: Option<&str>, addr: Address, value: Value) {
        self.graph.borrow_mut().set_value(sheet, addr, value);
    }

    pub fn set_cell_formula(
        &self,
        sheet: Option<&str>,
        addr: Address,
        formula: &str,
    ) -> Result<(), ParseError> {
        let ast = self.parse_cached(formula)?;
        self.graph.borrow_mut().set_formula(sheet, addr, ast);
        Ok(())
    }

    pub fn get_cell_value(&self, sheet: Option<&str>, addr: Address) -> Value {
        self.graph.borrow().get_value(sheet, addr)
    }

    /// `removeCell` (§4.7): drops `addr`'s stored value/formula and
    /// unwires it from both adjacency sides of the dependency graph.
    pub fn remove_cell(&self, sheet: Option<&str>, addr: Address) {
        self.graph.borrow_mut().remove_cell(sheet, addr);
    }

    /// `updateDependencies` (§4.7): rewires `addr`'s dependency edges to
    /// exactly `new_deps`, independent of whatever formula (if any) it
    /// holds. An empty `new_deps` removes `addr` from the dependencies
    /// side entirely.
    pub fn update_dependencies(
        &self,
        sheet: Option<&str>,
        addr: Address,
        new_deps: Vec<(Option<String>, Address)>,
    ) {
        self.graph.borrow_mut().update_dependencies(sheet, addr, new_deps);
    }

    /// `getDependents` (§4.7): empty for an unknown cell.
    pub fn dependents(&self, sheet: Option<&str>, addr: Address) -> Vec<(Option<String>, Address)> {
        self.graph.borrow().dependents(sheet, addr)
    }

    /// `getDependencies` (§4.7): empty for an unknown cell.
    pub fn dependencies(&self, sheet: Option<&str>, addr: Address) -> Vec<(Option<String>, Address)> {
        self.graph.borrow().dependencies(sheet, addr)
    }

    /// `hasCircularReference(cell)` (§4.7): true iff `addr` is reachable
    /// from itself through one or more `dependencies` hops. Per-cell — a
    /// cycle elsewhere in the graph does not implicate an unrelated cell.
    pub fn has_circular_reference(&self, sheet: Option<&str>, addr: Address) -> bool {
        self.graph.borrow().has_circular_reference(sheet, addr)
    }

    /// Recomputes every cell that transitively depends on `addr`, in
    /// dependency order, plus `addr` itself if it holds a formula, and
    /// returns the addresses touched in that order (§4.7). Cycles are
    /// tolerated: a cell participating in one is recomputed once rather
    /// than aborting the whole recalculation.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn recalculate(&self, sheet: Option<&str>, addr: Address) -> Vec<Address> {
        let start = self.graph.borrow_mut().cell_id(sheet, addr);
        let mut order = self.graph.borrow().get_cells_to_recalculate(start);
        if self.graph.borrow().formula(start).is_some() {
            order.insert(0, start);
        }

        let interp = Interpreter::new(self);
        let mut touched = Vec::with_capacity(order.len());
        for vid in order {
            let ast = self.graph.borrow().formula(vid);
            let (_, cell_addr) = self.graph.borrow().location(vid);
            if let Some(ast) = ast {
                let value = interp.eval(&ast, &Scope::root());
                self.graph.borrow_mut().set_computed_value(vid, value);
            }
            touched.push(cell_addr);
        }
        touched
    }
}

impl EvaluationContext for Engine {
    fn resolve_cell(&self, sheet: Option<&str>, addr: Address) -> Value {
        self.graph.borrow().get_value(sheet, addr)
    }

    fn get_function(&self, name: &str) -> Option<Rc<dyn Function>> {
        self.registry.borrow().get(name)
    }
}
