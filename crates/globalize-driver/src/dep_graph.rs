//! Dependency graph over compiled modules

use tracing::debug;

use crate::compile::{CompilationSet, ModuleIdx};
use crate::resolver::{ModuleKey, SpecifierResolver};

/// Import edges between the modules of a [`CompilationSet`], indexed in
/// parallel with it.
#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    /// Dependencies of each module, in declaration order, without repeats
    edges: Vec<Vec<ModuleIdx>>,
    /// Imports whose target has no compiled module
    unresolved: Vec<(ModuleIdx, ModuleKey)>,
}

impl DepGraph {
    /// Derives edges by resolving every module's import specifiers again.
    pub fn build(set: &CompilationSet, resolver: &SpecifierResolver) -> Self {
        let mut graph = DepGraph::default();

        for (idx, result) in set.iter() {
            let mut dependencies = Vec::new();
            for specifier in &result.module.imports {
                let target = resolver.resolve(specifier, &result.key);
                match set.lookup(&target) {
                    Some(dep) => {
                        if !dependencies.contains(&dep) {
                            debug!(from = %result.key, to = %target, "dependency edge");
                            dependencies.push(dep);
                        }
                    }
                    None => graph.unresolved.push((idx, target)),
                }
            }
            graph.edges.push(dependencies);
        }

        graph
    }

    /// Graph over `edges.len()` modules with the given adjacency lists
    pub fn from_edges(edges: Vec<Vec<ModuleIdx>>) -> Self {
        Self {
            edges,
            unresolved: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Modules `idx` imports from
    pub fn dependencies(&self, idx: ModuleIdx) -> &[ModuleIdx] {
        &self.edges[idx.0]
    }

    /// Modules that import `idx`
    pub fn dependents(&self, idx: ModuleIdx) -> Vec<ModuleIdx> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, deps)| deps.contains(&idx))
            .map(|(i, _)| ModuleIdx(i))
            .collect()
    }

    pub fn unresolved(&self) -> &[(ModuleIdx, ModuleKey)] {
        &self.unresolved
    }

    /// Every import cycle, each listed from the module where the DFS
    /// entered it. Cycles are allowed; this is for diagnostics.
    pub fn find_cycles(&self) -> Vec<Vec<ModuleIdx>> {
        let mut visited = vec![false; self.len()];
        let mut stack = Vec::new();
        let mut cycles = Vec::new();

        for start in 0..self.len() {
            if !visited[start] {
                self.find_cycles_from(ModuleIdx(start), &mut visited, &mut stack, &mut cycles);
            }
        }

        cycles
    }

    fn find_cycles_from(
        &self,
        current: ModuleIdx,
        visited: &mut [bool],
        stack: &mut Vec<ModuleIdx>,
        cycles: &mut Vec<Vec<ModuleIdx>>,
    ) {
        visited[current.0] = true;
        stack.push(current);

        for &dep in self.dependencies(current) {
            if let Some(pos) = stack.iter().position(|&m| m == dep) {
                cycles.push(stack[pos..].to_vec());
            } else if !visited[dep.0] {
                self.find_cycles_from(dep, visited, stack, cycles);
            }
        }

        stack.pop();
    }
}
