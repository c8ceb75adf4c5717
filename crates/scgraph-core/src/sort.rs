//! Topological ordering and dead-code elimination.
//!
//! Both passes work on dependency bundles built over the live node order.
//! A bundle holds a node's antecedents (producers of its inputs, then every
//! width-first node that precedes it) and its descendants.

use crate::error::SynthDefError;
use crate::ugen::{NodeId, UGen, UGenScalar};

#[derive(Debug, Default)]
struct SortBundle {
    antecedents: Vec<NodeId>,
    descendants: Vec<NodeId>,
}

/// Bundles indexed by arena slot. Slots not in `order` stay `None`.
fn sort_bundles(arena: &[UGen], order: &[NodeId]) -> Vec<Option<SortBundle>> {
    let mut bundles: Vec<Option<SortBundle>> = (0..arena.len()).map(|_| None).collect();
    let mut width_first = Vec::new();
    let mut barriers = Vec::with_capacity(order.len());
    for &id in order {
        bundles[id.slot()] = Some(SortBundle::default());
        barriers.push(width_first.len());
        if arena[id.slot()].is_width_first() {
            width_first.push(id);
        }
    }

    for (position, &id) in order.iter().enumerate() {
        for input in &arena[id.slot()].inputs {
            if let UGenScalar::Output(proxy) = input {
                link(&mut bundles, proxy.node, id);
            }
        }
        for &barrier in &width_first[..barriers[position]] {
            link(&mut bundles, barrier, id);
        }
    }
    bundles
}

fn link(bundles: &mut [Option<SortBundle>], antecedent: NodeId, descendant: NodeId) {
    if bundles[antecedent.slot()].is_none() {
        return;
    }
    if let Some(bundle) = bundles[descendant.slot()].as_mut() {
        if bundle.antecedents.contains(&antecedent) {
            return;
        }
        bundle.antecedents.push(antecedent);
    }
    if let Some(bundle) = bundles[antecedent.slot()].as_mut() {
        bundle.descendants.push(descendant);
    }
}

/// Kahn's algorithm with a LIFO ready stack.
///
/// Ready nodes are seeded in reverse order so that ties pop in construction
/// order, and each node's descendants are released in reverse for the same
/// reason.
pub(crate) fn sort_topologically(
    arena: &[UGen],
    order: &[NodeId],
) -> Result<Vec<NodeId>, SynthDefError> {
    let bundles = sort_bundles(arena, order);
    let mut in_degree: Vec<usize> = bundles
        .iter()
        .map(|bundle| bundle.as_ref().map_or(0, |b| b.antecedents.len()))
        .collect();

    let mut queue: Vec<NodeId> = order
        .iter()
        .rev()
        .copied()
        .filter(|id| in_degree[id.slot()] == 0)
        .collect();
    let mut sorted = Vec::with_capacity(order.len());

    while let Some(id) = queue.pop() {
        if let Some(bundle) = &bundles[id.slot()] {
            for &descendant in bundle.descendants.iter().rev() {
                in_degree[descendant.slot()] -= 1;
                if in_degree[descendant.slot()] == 0 {
                    queue.push(descendant);
                }
            }
        }
        sorted.push(id);
    }

    if sorted.len() != order.len() {
        return Err(SynthDefError::CycleDetected);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("sort_topologically: {} nodes", sorted.len());

    Ok(sorted)
}

/// Drops pure nodes nothing depends on, repeating upstream until every
/// remaining pure node has a descendant.
pub(crate) fn optimize(arena: &[UGen], order: &[NodeId]) -> Vec<NodeId> {
    let mut bundles = sort_bundles(arena, order);
    for &id in order {
        eliminate(arena, &mut bundles, id);
    }
    let optimized: Vec<NodeId> = order
        .iter()
        .copied()
        .filter(|id| bundles[id.slot()].is_some())
        .collect();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "optimize: removed {} of {} nodes",
        order.len() - optimized.len(),
        order.len()
    );

    optimized
}

fn eliminate(arena: &[UGen], bundles: &mut [Option<SortBundle>], id: NodeId) {
    let mut worklist = vec![id];
    while let Some(id) = worklist.pop() {
        if !arena[id.slot()].is_pure() {
            continue;
        }
        let removable = bundles[id.slot()]
            .as_ref()
            .is_some_and(|bundle| bundle.descendants.is_empty());
        if !removable {
            continue;
        }
        let Some(bundle) = bundles[id.slot()].take() else {
            continue;
        };
        for antecedent in bundle.antecedents {
            if let Some(upstream) = bundles[antecedent.slot()].as_mut() {
                upstream.descendants.retain(|&d| d != id);
                worklist.push(antecedent);
            }
        }
    }
}
