//! Processing order for the component graph.

use std::collections::VecDeque;

use ns_ir::ComponentId;
use tracing::error;

use crate::component::Component;

/// Reverse breadth-first topological sort.
///
/// Starts from every component without outgoing edges and walks upstream.
/// A component is enqueued once all of its outgoing edges are satisfied,
/// i.e. every consumer has been placed after it. The visit order is then
/// reversed so iterating forward runs producers before consumers.
///
/// On a cyclic graph the components that could not be placed are logged and
/// appended in id order.
pub fn compute_update_order(arena: &[Option<Component>]) -> Vec<ComponentId> {
    let n = arena.len();
    let mut satisfied = vec![0usize; n];
    let mut placed = vec![false; n];
    let mut queue: VecDeque<ComponentId> = arena
        .iter()
        .flatten()
        .filter(|c| c.out_degree() == 0)
        .map(Component::id)
        .collect();

    let mut visit = Vec::with_capacity(n);
    while let Some(id) = queue.pop_front() {
        let Some(component) = arena.get(id as usize).and_then(Option::as_ref) else {
            continue;
        };
        placed[id as usize] = true;
        visit.push(id);

        for input in component.inputs() {
            for link in input.links() {
                let upstream = link.source.component as usize;
                let Some(source) = arena.get(upstream).and_then(Option::as_ref) else {
                    continue;
                };
                satisfied[upstream] += 1;
                if satisfied[upstream] == source.out_degree() {
                    queue.push_back(source.id());
                }
            }
        }
    }

    let mut order: Vec<ComponentId> = visit.into_iter().rev().collect();
    let live = arena.iter().flatten().count();
    if order.len() < live {
        let stuck: Vec<ComponentId> = arena
            .iter()
            .flatten()
            .map(Component::id)
            .filter(|&id| !placed[id as usize])
            .collect();
        error!(?stuck, "graph contains a cycle, appending unordered components");
        order.extend(stuck);
    }
    order
}
