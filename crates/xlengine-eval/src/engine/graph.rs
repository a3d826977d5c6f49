//! The dependency graph (§4.7): a vertex arena plus bidirectional
//! `dependencies`/`dependents` adjacency, keyed by `(sheet, Address)`.
//! Traversals are iterative with an explicit stack, the same idiom as
//! `cell_references` (§3.4) and grounded directly in this shape of vertex
//! storage.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use xlengine_common::Address;
use xlengine_parse::{AstNode, CellReference, Value};

pub type VertexId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CellKey {
    sheet: Option<String>,
    addr: Address,
}

struct Vertex {
    sheet: Option<String>,
    addr: Address,
    ast: Option<Rc<AstNode>>,
    value: Value,
    dependencies: Vec<VertexId>,
    dependents: Vec<VertexId>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

#[derive(Default)]
pub struct DependencyGraph {
    vertices: Vec<Vertex>,
    index: FxHashMap<CellKey, VertexId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn vertex_id(&mut self, sheet: Option<&str>, addr: Address) -> VertexId {
        let key = CellKey { sheet: sheet.map(str::to_string), addr };
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.vertices.len();
        self.vertices.push(Vertex {
            sheet: key.sheet.clone(),
            addr,
            ast: None,
            value: Value::Empty,
            dependencies: Vec::new(),
            dependents: Vec::new(),
        });
        self.index.insert(key, id);
        id
    }

    fn existing_id(&self, sheet: Option<&str>, addr: Address) -> Option<VertexId> {
        let key = CellKey { sheet: sheet.map(str::to_string), addr };
        self.index.get(&key).copied()
    }

    pub fn set_value(&mut self, sheet: Option<&str>, addr: Address, value: Value) -> VertexId {
        let id = self.vertex_id(sheet, addr);
        self.wire_dependencies(id, Vec::new());
        let vertex = &mut self.vertices[id];
        vertex.ast = None;
        vertex.value = value;
        id
    }

    /// Replaces whatever formula (if any) previously lived at `addr`, and
    /// rewires the `dependencies`/`dependents` edges to match the new
    /// formula's cell references (§4.7 "bidirectional adjacency, updated
    /// atomically on every formula change").
    pub fn set_formula(&mut self, sheet: Option<&str>, addr: Address, ast: Rc<AstNode>) -> VertexId {
        let id = self.vertex_id(sheet, addr);
        let refs: Vec<CellReference> = ast.cell_references();
        let mut deps = Vec::with_capacity(refs.len());
        for r in refs {
            let dep_id = self.vertex_id(r.sheet.as_deref(), r.addr);
            if !deps.contains(&dep_id) {
                deps.push(dep_id);
            }
        }
        self.wire_dependencies(id, deps);
        self.vertices[id].ast = Some(ast);
        id
    }

    /// `updateDependencies` (§4.7): atomically replaces `cell`'s
    /// `dependencies` edges with `new_deps`, independent of any formula.
    /// An empty `new_deps` removes `cell` from the `dependencies` side
    /// entirely.
    pub fn update_dependencies(
        &mut self,
        sheet: Option<&str>,
        addr: Address,
        new_deps: Vec<(Option<String>, Address)>,
    ) -> VertexId {
        let id = self.vertex_id(sheet, addr);
        let mut deps = Vec::with_capacity(new_deps.len());
        for (dep_sheet, dep_addr) in new_deps {
            let dep_id = self.vertex_id(dep_sheet.as_deref(), dep_addr);
            if !deps.contains(&dep_id) {
                deps.push(dep_id);
            }
        }
        self.wire_dependencies(id, deps);
        id
    }

    /// `removeCell` (§4.7): clears both adjacency sides touching `cell` —
    /// it stops depending on anything, and nothing that depended on it
    /// still lists it as a dependency — and resets its stored value and
    /// formula. Unknown cells are a no-op.
    pub fn remove_cell(&mut self, sheet: Option<&str>, addr: Address) {
        let Some(id) = self.existing_id(sheet, addr) else { return };
        self.wire_dependencies(id, Vec::new());
        let dependents = std::mem::take(&mut self.vertices[id].dependents);
        for dependent_id in dependents {
            self.vertices[dependent_id].dependencies.retain(|&d| d != id);
        }
        let vertex = &mut self.vertices[id];
        vertex.ast = None;
        vertex.value = Value::Empty;
    }

    /// `getDependents` (§4.7): read-only view, empty for an unknown cell.
    pub fn dependents(&self, sheet: Option<&str>, addr: Address) -> Vec<(Option<String>, Address)> {
        match self.existing_id(sheet, addr) {
            Some(id) => self.vertices[id].dependents.iter().map(|&d| self.location(d)).collect(),
            None => Vec::new(),
        }
    }

    /// `getDependencies` (§4.7): read-only view, empty for an unknown cell.
    pub fn dependencies(&self, sheet: Option<&str>, addr: Address) -> Vec<(Option<String>, Address)> {
        match self.existing_id(sheet, addr) {
            Some(id) => self.vertices[id].dependencies.iter().map(|&d| self.location(d)).collect(),
            None => Vec::new(),
        }
    }

    /// Rewires both adjacency sides so `id`'s `dependencies` become
    /// exactly `deps`, keeping `dependents` in sync on whichever vertices
    /// gain or lose `id` as a dependent.
    fn wire_dependencies(&mut self, id: VertexId, deps: Vec<VertexId>) {
        let old_deps = std::mem::take(&mut self.vertices[id].dependencies);
        for dep_id in old_deps {
            self.vertices[dep_id].dependents.retain(|&d| d != id);
        }
        for &dep_id in &deps {
            if !self.vertices[dep_id].dependents.contains(&id) {
                self.vertices[dep_id].dependents.push(id);
            }
        }
        self.vertices[id].dependencies = deps;
    }

    pub fn get_value(&self, sheet: Option<&str>, addr: Address) -> Value {
        self.existing_id(sheet, addr).map(|id| self.vertices[id].value.clone()).unwrap_or(Value::Empty)
    }

    pub(crate) fn formula(&self, id: VertexId) -> Option<Rc<AstNode>> {
        self.vertices[id].ast.clone()
    }

    pub(crate) fn location(&self, id: VertexId) -> (Option<String>, Address) {
        (self.vertices[id].sheet.clone(), self.vertices[id].addr)
    }

    pub(crate) fn set_computed_value(&mut self, id: VertexId, value: Value) {
        self.vertices[id].value = value;
    }

    pub fn cell_id(&mut self, sheet: Option<&str>, addr: Address) -> VertexId {
        self.vertex_id(sheet, addr)
    }

    /// Every vertex reachable by following `dependents` from `start`,
    /// **excluding** `start` itself — the transitive dependents a change
    /// at `start` can affect (§4.7 "not including `changed` itself").
    fn reachable_dependents(&self, start: VertexId) -> FxHashSet<VertexId> {
        let mut seen = FxHashSet::default();
        let mut stack: Vec<VertexId> = self.vertices[start].dependents.clone();
        while let Some(id) = stack.pop() {
            if id != start && seen.insert(id) {
                stack.extend(self.vertices[id].dependents.iter().copied());
            }
        }
        seen
    }

    /// Iterative post-order DFS over `dependencies` edges restricted to
    /// `subset`, with two marks (`InProgress`, `Done`): a dependency
    /// found `InProgress` is on the current DFS stack, i.e. part of a
    /// cycle, and is skipped rather than revisited so the traversal
    /// always terminates and every cell in a cycle is still emitted
    /// exactly once (§4.7 "Cycles are tolerated", §9 design note).
    fn order_subset(&self, subset: &FxHashSet<VertexId>) -> Vec<VertexId> {
        let mut marks: FxHashMap<VertexId, Mark> =
            subset.iter().map(|&id| (id, Mark::Unvisited)).collect();
        let mut order = Vec::with_capacity(subset.len());

        let mut roots: Vec<VertexId> = subset.iter().copied().collect();
        roots.sort_unstable();

        for root in roots {
            if marks[&root] != Mark::Unvisited {
                continue;
            }
            let mut stack: Vec<(VertexId, usize)> = vec![(root, 0)];
            marks.insert(root, Mark::InProgress);
            while let Some(frame) = stack.last().copied() {
                let (id, next) = frame;
                let dep = self.vertices[id].dependencies.get(next).copied();
                match dep {
                    Some(dep_id) => {
                        stack.last_mut().unwrap().1 += 1;
                        if subset.contains(&dep_id) && marks.get(&dep_id) == Some(&Mark::Unvisited) {
                            marks.insert(dep_id, Mark::InProgress);
                            stack.push((dep_id, 0));
                        }
                    }
                    None => {
                        order.push(id);
                        marks.insert(id, Mark::Done);
                        stack.pop();
                    }
                }
            }
        }
        order
    }

    /// `getCellsToRecalculate` (§4.7): the transitive dependents of
    /// `start`, ordered so every cell follows each of its own
    /// dependencies, tolerating cycles rather than failing on them.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn get_cells_to_recalculate(&self, start: VertexId) -> Vec<VertexId> {
        let affected = self.reachable_dependents(start);
        self.order_subset(&affected)
    }

    /// `hasCircularReference` (§4.7): true iff `cell` is reachable from
    /// itself through one or more `dependencies` hops. Per-cell, not a
    /// whole-graph check — a cycle elsewhere in the graph does not make
    /// an unrelated cell circular.
    pub fn has_circular_reference(&self, sheet: Option<&str>, addr: Address) -> bool {
        match self.existing_id(sheet, addr) {
            Some(id) => self.reachable_from_self(id),
            None => false,
        }
    }

    fn reachable_from_self(&self, start: VertexId) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack: Vec<VertexId> = self.vertices[start].dependencies.clone();
        while let Some(id) = stack.pop() {
            if id == start {
                return true;
            }
            if seen.insert(id) {
                stack.extend(self.vertices[id].dependencies.iter().copied());
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xlengine_common::Address;

    fn addr(col: u32, row: u32) -> Address {
        Address::new(col, row)
    }

    #[test]
    fn recalculation_order_respects_dependencies() {
        let mut g = DependencyGraph::new();
        // C1 = B1 + 1, B1 = A1 + 1
        let a1 = g.cell_id(None, addr(0, 0));
        let ast_b1 = Rc::new(AstNode::CellRef { addr: addr(0, 0), sheet: None });
        let b1 = g.set_formula(None, addr(1, 0), ast_b1);
        let ast_c1 = Rc::new(AstNode::CellRef { addr: addr(1, 0), sheet: None });
        let c1 = g.set_formula(None, addr(2, 0), ast_c1);

        let order = g.get_cells_to_recalculate(a1);
        assert_eq!(order.len(), 2);
        let pos = |id: VertexId| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(b1) < pos(c1));
    }

    #[test]
    fn self_reference_is_circular() {
        let mut g = DependencyGraph::new();
        let ast = Rc::new(AstNode::CellRef { addr: addr(0, 0), sheet: None });
        g.set_formula(None, addr(0, 0), ast);
        assert!(g.has_circular_reference(None, addr(0, 0)));
    }

    #[test]
    fn two_cell_cycle_is_detected() {
        let mut g = DependencyGraph::new();
        let ast_a = Rc::new(AstNode::CellRef { addr: addr(1, 0), sheet: None });
        g.set_formula(None, addr(0, 0), ast_a);
        let ast_b = Rc::new(AstNode::CellRef { addr: addr(0, 0), sheet: None });
        g.set_formula(None, addr(1, 0), ast_b);
        assert!(g.has_circular_reference(None, addr(0, 0)));
        assert!(g.has_circular_reference(None, addr(1, 0)));
    }

    #[test]
    fn unrelated_cell_is_not_circular() {
        let mut g = DependencyGraph::new();
        let ast_a = Rc::new(AstNode::CellRef { addr: addr(1, 0), sheet: None });
        g.set_formula(None, addr(0, 0), ast_a);
        let ast_b = Rc::new(AstNode::CellRef { addr: addr(0, 0), sheet: None });
        g.set_formula(None, addr(1, 0), ast_b);
        // C1 sits outside the A1/B1 cycle entirely.
        g.set_value(None, addr(2, 0), Value::Number(1.0));
        assert!(!g.has_circular_reference(None, addr(2, 0)));
    }

    #[test]
    fn cycle_among_dependents_each_emit_once() {
        let mut g = DependencyGraph::new();
        let a1 = g.cell_id(None, addr(0, 0));
        // B1 depends on A1 and C1; C1 depends on B1 — B1/C1 form a cycle
        // downstream of A1.
        g.update_dependencies(None, addr(1, 0), vec![(None, addr(0, 0)), (None, addr(2, 0))]);
        g.update_dependencies(None, addr(2, 0), vec![(None, addr(1, 0))]);

        let order = g.get_cells_to_recalculate(a1);
        let mut seen = FxHashSet::default();
        assert!(order.iter().all(|id| seen.insert(*id)));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn breaking_a_formula_removes_its_dependency_edges() {
        let mut g = DependencyGraph::new();
        let a1 = g.cell_id(None, addr(0, 0));
        let ast = Rc::new(AstNode::CellRef { addr: addr(0, 0), sheet: None });
        let b1 = g.set_formula(None, addr(1, 0), ast);
        g.set_value(None, addr(1, 0), Value::Number(5.0));
        // a1 no longer has b1 as a dependent.
        let affected = g.get_cells_to_recalculate(a1);
        assert!(!affected.contains(&b1));
    }

    #[test]
    fn update_dependencies_with_empty_set_clears_dependency_side() {
        let mut g = DependencyGraph::new();
        let a1 = g.cell_id(None, addr(0, 0));
        g.update_dependencies(None, addr(1, 0), vec![(None, addr(0, 0))]);
        assert_eq!(g.dependents(None, addr(0, 0)), vec![(None, addr(1, 0))]);

        g.update_dependencies(None, addr(1, 0), Vec::new());
        assert!(g.dependents(None, addr(0, 0)).is_empty());
        assert!(g.dependencies(None, addr(1, 0)).is_empty());
        let _ = a1;
    }

    #[test]
    fn remove_cell_clears_both_adjacency_sides() {
        let mut g = DependencyGraph::new();
        let ast = Rc::new(AstNode::CellRef { addr: addr(0, 0), sheet: None });
        g.set_formula(None, addr(1, 0), ast);
        assert_eq!(g.dependents(None, addr(0, 0)), vec![(None, addr(1, 0))]);

        g.remove_cell(None, addr(1, 0));
        assert!(g.dependents(None, addr(0, 0)).is_empty());
        assert!(g.dependencies(None, addr(1, 0)).is_empty());
    }
}
