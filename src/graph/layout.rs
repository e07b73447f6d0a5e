//! Layout engine - ranked left-to-right positioning
//!
//! Ranks are assigned by longest path from a root (left-to-right tiers), leaf
//! nodes take sequential vertical slots in traversal order, and parents
//! center on their children. On a tree this produces no edge crossings and
//! runs in linear time, which keeps layout interactive up to the node cap.
//!
//! Positions are box centers; `edge_ports` yields the points on the left and
//! right box edges so rendered edges connect box borders, not centers.
//! Output is deterministic for a given document, written once per parse.

use std::collections::HashMap;

use egui::{Pos2, Vec2};
use tracing::debug;

use super::types::{GraphDocument, NodeId};

// =============================================================================
// LAYOUT CONSTANTS
// =============================================================================

/// Default node size
pub const NODE_WIDTH: f32 = 160.0;
pub const NODE_HEIGHT: f32 = 36.0;

/// Horizontal gap between ranks
pub const RANK_GAP: f32 = 120.0;
/// Vertical gap between sibling slots
pub const SIBLING_GAP: f32 = 24.0;

/// Vertical pitch of one leaf slot
const SLOT_PITCH: f32 = NODE_HEIGHT + SIBLING_GAP;

// =============================================================================
// LAYOUT ENGINE
// =============================================================================

/// Assigns (x, y) to every node of a document
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine;

impl LayoutEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute and write positions for all nodes.
    ///
    /// For every edge source→target the source ends up strictly left of the
    /// target (rank order), and siblings never overlap vertically.
    pub fn compute_layout(&self, doc: &mut GraphDocument) {
        if doc.nodes.is_empty() {
            return;
        }

        let ranks = assign_ranks(doc);
        let ys = assign_vertical_slots(doc);

        for node in &mut doc.nodes {
            let rank = *ranks.get(&node.id).unwrap_or(&0);
            let y = *ys.get(&node.id).unwrap_or(&0.0);
            node.position = Pos2::new(rank as f32 * (NODE_WIDTH + RANK_GAP), y);
        }

        // The warning node floats above the content at rank 0
        if let Some(warning_id) = doc.warning_id.clone() {
            let min_y = doc
                .nodes
                .iter()
                .filter(|n| n.id != warning_id)
                .map(|n| n.position.y)
                .fold(f32::MAX, f32::min);
            if let Some(node) = doc.get_mut(&warning_id) {
                node.position = Pos2::new(0.0, min_y - SLOT_PITCH * 2.0);
            }
        }

        debug!(nodes = doc.nodes.len(), "layout computed");
    }
}

/// Rank = longest path from a root, derived by walking edges in document
/// order. Edges always point parent→child and parents precede children in
/// the pre-order node list, so a single pass settles every rank.
fn assign_ranks(doc: &GraphDocument) -> HashMap<NodeId, usize> {
    let mut ranks: HashMap<NodeId, usize> = HashMap::new();
    for node in &doc.nodes {
        ranks.entry(node.id.clone()).or_insert(0);
    }
    for edge in &doc.edges {
        let source_rank = *ranks.get(&edge.source).unwrap_or(&0);
        let entry = ranks.entry(edge.target.clone()).or_insert(0);
        if *entry < source_rank + 1 {
            *entry = source_rank + 1;
        }
    }
    ranks
}

/// Depth-first slot assignment: leaves take sequential y slots, parents
/// center on their children. Recursion is bounded by the builder's depth cap.
fn assign_vertical_slots(doc: &GraphDocument) -> HashMap<NodeId, f32> {
    let mut ys: HashMap<NodeId, f32> = HashMap::new();
    let mut cursor = 0.0_f32;
    place_subtree(doc, &doc.root_id, &mut cursor, &mut ys);
    ys
}

fn place_subtree(
    doc: &GraphDocument,
    id: &str,
    cursor: &mut f32,
    ys: &mut HashMap<NodeId, f32>,
) -> f32 {
    let children = doc.adjacency.children(id);
    let y = if children.is_empty() {
        let y = *cursor;
        *cursor += SLOT_PITCH;
        y
    } else {
        let mut first = f32::MAX;
        let mut last = f32::MIN;
        for child in children {
            let child_y = place_subtree(doc, child, cursor, ys);
            first = first.min(child_y);
            last = last.max(child_y);
        }
        (first + last) / 2.0
    };
    ys.insert(id.to_string(), y);
    y
}

/// World-space endpoints for an edge: source right-edge midpoint and target
/// left-edge midpoint.
pub fn edge_ports(source: &super::types::GraphNode, target: &super::types::GraphNode) -> (Pos2, Pos2) {
    let from = source.position + Vec2::new(source.size.x / 2.0, 0.0);
    let to = target.position - Vec2::new(target.size.x / 2.0, 0.0);
    (from, to)
}

// =============================================================================
// TESTS
// =============================================================================
