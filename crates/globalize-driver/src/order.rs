//! Emission order for compiled modules

use crate::compile::{CompilationSet, ModuleIdx};
use crate::dep_graph::DepGraph;

/// Dependencies-first order of every module in `set`.
///
/// Depth-first post-order, rooted at the inputs in input order and then at
/// any module not reached from them. A module is marked when the search
/// first enters it, so an import that closes a cycle is skipped and the
/// module where the cycle was entered is emitted last.
pub fn topological_order(set: &CompilationSet, graph: &DepGraph) -> Vec<ModuleIdx> {
    let count = set.len();
    let mut visited = vec![false; count];
    let mut order = Vec::with_capacity(count);
    let mut stack: Vec<(ModuleIdx, usize)> = Vec::new();

    let roots = set.inputs().iter().copied().chain((0..count).map(ModuleIdx));
    for root in roots {
        if visited[root.0] {
            continue;
        }
        visited[root.0] = true;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let dependencies = graph.dependencies(node);
            if frame.1 < dependencies.len() {
                let dep = dependencies[frame.1];
                frame.1 += 1;
                if !visited[dep.0] {
                    visited[dep.0] = true;
                    stack.push((dep, 0));
                }
            } else {
                order.push(node);
                stack.pop();
            }
        }
    }

    order
}
