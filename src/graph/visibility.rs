//! Visibility controller - collapse state and viewport virtualization
//!
//! Two independent mechanisms decide whether a node renders:
//!
//! - collapse is a semantic decision the user controls explicitly; a node is
//!   logically hidden iff any strict ancestor is in the collapsed set
//! - viewport virtualization is a rendering-cost decision the system controls
//!   automatically; a node is spatially hidden when outside the viewport
//!   expanded by a fixed buffer
//!
//! Both are tracked independently: a collapsed subtree stays hidden after
//! scrolling back into view, and an expanded node still culls when far
//! off-screen. Visibility is always re-derived as a pure function of
//! (adjacency, collapsed set, viewport rect); flags are never patched
//! incrementally. All functions here run without a rendering context.

use std::collections::HashSet;

use egui::Rect;
use tracing::debug;

use super::types::{GraphDocument, NodeId};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Viewport expansion in world units, each direction
pub const VIEWPORT_BUFFER: f32 = 800.0;

/// Seconds of viewport inactivity before spatial visibility recomputes
pub const VIEWPORT_DEBOUNCE: f64 = 0.15;

// =============================================================================
// CONTROLLER
// =============================================================================

/// Owns the collapsed set and the debounced viewport state for one document's
/// lifetime. `reset` on every new parse.
#[derive(Debug, Clone, Default)]
pub struct VisibilityController {
    collapsed: HashSet<NodeId>,
    /// Last applied world-space viewport
    viewport: Option<Rect>,
    /// Most recent requested viewport and the time it was requested
    pending: Option<(Rect, f64)>,
}

impl VisibilityController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all state; called when a new parse replaces the document
    pub fn reset(&mut self) {
        self.collapsed.clear();
        self.viewport = None;
        self.pending = None;
    }

    /// Whether this node is explicitly collapsed (its own indicator state,
    /// not the derived hidden state)
    pub fn is_collapsed(&self, id: &str) -> bool {
        self.collapsed.contains(id)
    }

    pub fn collapsed_set(&self) -> &HashSet<NodeId> {
        &self.collapsed
    }

    /// Toggle collapse on one node and re-derive logical visibility.
    ///
    /// Returns the number of descendants affected (BFS over the adjacency
    /// tree, each node visited exactly once).
    pub fn toggle_collapse(&mut self, doc: &mut GraphDocument, id: &str) -> usize {
        if !doc.contains(id) {
            return 0;
        }
        let descendants = doc.adjacency.descendants(id);
        if self.collapsed.contains(id) {
            self.collapsed.remove(id);
        } else {
            self.collapsed.insert(id.to_string());
        }
        debug!(node = id, affected = descendants.len(), "collapse toggled");

        recompute_logical(doc, &self.collapsed);
        // Keep the spatial pass consistent with the last applied viewport
        if let Some(viewport) = self.viewport {
            apply_viewport(doc, viewport);
        }
        recompute_edge_visibility(doc);
        descendants.len()
    }

    /// Remove every id in `ids` from the collapsed set (search auto-expand)
    pub fn expand_all(&mut self, ids: &[NodeId]) {
        for id in ids {
            self.collapsed.remove(id);
        }
    }

    /// Request a viewport recompute; coalesced so only the latest rect is
    /// applied once the debounce window elapses.
    pub fn request_viewport(&mut self, world_rect: Rect, now: f64) {
        self.pending = Some((world_rect, now));
    }

    /// Apply the pending viewport if the debounce window has elapsed.
    /// Returns true when a recompute ran.
    pub fn poll(&mut self, doc: &mut GraphDocument, now: f64) -> bool {
        let Some((rect, requested_at)) = self.pending else {
            return false;
        };
        if now - requested_at < VIEWPORT_DEBOUNCE {
            return false;
        }
        self.pending = None;
        self.set_viewport(doc, rect);
        true
    }

    /// Apply a viewport immediately (initial fit, tests)
    pub fn set_viewport(&mut self, doc: &mut GraphDocument, world_rect: Rect) {
        self.viewport = Some(world_rect);
        recompute_logical(doc, &self.collapsed);
        apply_viewport(doc, world_rect);
        recompute_edge_visibility(doc);
    }

    /// Re-derive everything from current state (after search mutated the
    /// collapsed set)
    pub fn refresh(&mut self, doc: &mut GraphDocument) {
        recompute_logical(doc, &self.collapsed);
        if let Some(viewport) = self.viewport {
            apply_viewport(doc, viewport);
        }
        recompute_edge_visibility(doc);
    }
}

// =============================================================================
// PURE RECOMPUTATION
// =============================================================================

/// A node is logically hidden iff any strict ancestor is collapsed.
/// Re-derived from scratch for every node; stale flags are never trusted.
pub fn recompute_logical(doc: &mut GraphDocument, collapsed: &HashSet<NodeId>) {
    if collapsed.is_empty() {
        for node in &mut doc.nodes {
            node.logically_hidden = false;
        }
        return;
    }
    let mut hidden: Vec<bool> = Vec::with_capacity(doc.nodes.len());
    for node in &doc.nodes {
        let mut cursor = doc.adjacency.parent(&node.id);
        let mut is_hidden = false;
        while let Some(parent) = cursor {
            if collapsed.contains(parent) {
                is_hidden = true;
                break;
            }
            cursor = doc.adjacency.parent(parent);
        }
        hidden.push(is_hidden);
    }
    for (node, is_hidden) in doc.nodes.iter_mut().zip(hidden) {
        node.logically_hidden = is_hidden;
    }
}

/// Spatial visibility against `viewport` expanded by [`VIEWPORT_BUFFER`].
///
/// Pass 1 intersects every node's box with the expanded rect. Pass 2 runs
/// strictly afterwards: every ancestor of a spatially visible, not logically
/// hidden node is forced spatially visible, so edges never dangle from an
/// off-screen parent. The root and the warning node are always visible.
pub fn apply_viewport(doc: &mut GraphDocument, viewport: Rect) {
    let expanded = viewport.expand(VIEWPORT_BUFFER);

    for node in &mut doc.nodes {
        node.spatially_hidden = !expanded.intersects(node.rect());
    }

    let root_id = doc.root_id.clone();
    if let Some(root) = doc.get_mut(&root_id) {
        root.spatially_hidden = false;
    }
    if let Some(warning_id) = doc.warning_id.clone() {
        if let Some(warning) = doc.get_mut(&warning_id) {
            warning.spatially_hidden = false;
        }
    }

    // Ancestor protection, after the initial pass
    let mut protect: Vec<NodeId> = Vec::new();
    for node in &doc.nodes {
        if node.spatially_hidden || node.logically_hidden {
            continue;
        }
        let mut cursor = doc.adjacency.parent(&node.id);
        while let Some(parent) = cursor {
            protect.push(parent.to_string());
            cursor = doc.adjacency.parent(parent);
        }
    }
    for id in protect {
        if let Some(node) = doc.get_mut(&id) {
            node.spatially_hidden = false;
        }
    }
}

/// An edge is hidden iff either endpoint is hidden by either mechanism
pub fn recompute_edge_visibility(doc: &mut GraphDocument) {
    let mut hidden: Vec<bool> = Vec::with_capacity(doc.edges.len());
    for edge in &doc.edges {
        let source_hidden = doc.get(&edge.source).map(|n| n.hidden()).unwrap_or(true);
        let target_hidden = doc.get(&edge.target).map(|n| n.hidden()).unwrap_or(true);
        hidden.push(source_hidden || target_hidden);
    }
    for (edge, is_hidden) in doc.edges.iter_mut().zip(hidden) {
        edge.hidden = is_hidden;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder;
    use crate::graph::layout::LayoutEngine;
    use egui::{Pos2, Vec2};

    fn doc(text: &str) -> GraphDocument {
        let mut doc = builder::parse(text).unwrap();
        LayoutEngine::new().compute_layout(&mut doc);
        doc
    }

    fn id_of(doc: &GraphDocument, label: &str) -> NodeId {
        doc.nodes
            .iter()
            .find(|n| n.label == label)
            .unwrap_or_else(|| panic!("no node labeled {label}"))
            .id
            .clone()
    }

    #[test]
    fn test_collapse_hides_descendants_and_edges() {
        let mut doc = doc(r#"{"a": {"b": 1}}"#);
        let mut vis = VisibilityController::new();
        let a = id_of(&doc, "a {}");
        let b = id_of(&doc, "b: 1");

        let affected = vis.toggle_collapse(&mut doc, &a);
        assert_eq!(affected, 1);
        assert!(vis.is_collapsed(&a));
        // The collapsed node itself stays visible; its subtree hides
        assert!(!doc.get(&a).unwrap().logically_hidden);
        assert!(doc.get(&b).unwrap().logically_hidden);
        let edge = doc.edges.iter().find(|e| e.target == b).unwrap();
        assert!(edge.hidden);
    }

    #[test]
    fn test_collapse_expand_round_trip() {
        let mut doc = doc(r#"{"a": {"b": [1, 2]}, "c": 3}"#);
        let mut vis = VisibilityController::new();
        let a = id_of(&doc, "a {}");

        let before: Vec<bool> = doc.nodes.iter().map(|n| n.hidden()).collect();
        vis.toggle_collapse(&mut doc, &a);
        vis.toggle_collapse(&mut doc, &a);
        let after: Vec<bool> = doc.nodes.iter().map(|n| n.hidden()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_nested_collapse_survives_outer_expand() {
        let mut doc = doc(r#"{"outer": {"inner": {"leaf": 1}}}"#);
        let mut vis = VisibilityController::new();
        let outer = id_of(&doc, "outer {}");
        let inner = id_of(&doc, "inner {}");
        let leaf = id_of(&doc, "leaf: 1");

        vis.toggle_collapse(&mut doc, &inner);
        vis.toggle_collapse(&mut doc, &outer);
        vis.toggle_collapse(&mut doc, &outer);

        // Outer expanded again, but the leaf stays hidden under inner
        assert!(!doc.get(&inner).unwrap().logically_hidden);
        assert!(doc.get(&leaf).unwrap().logically_hidden);
    }

    #[test]
    fn test_viewport_culls_far_nodes() {
        let mut doc = doc(r#"{"a": 1}"#);
        // Move the child far outside any plausible viewport + buffer
        let a = id_of(&doc, "a: 1");
        doc.get_mut(&a).unwrap().position = Pos2::new(10_000.0, 10_000.0);

        let mut vis = VisibilityController::new();
        vis.set_viewport(
            &mut doc,
            Rect::from_center_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
        );
        assert!(doc.get(&a).unwrap().spatially_hidden);
        assert!(doc.get(&a).unwrap().hidden());
    }

    #[test]
    fn test_node_inside_buffer_stays_visible() {
        let mut doc = doc(r#"{"a": 1}"#);
        let a = id_of(&doc, "a: 1");
        // Outside the viewport but within the 800px buffer
        doc.get_mut(&a).unwrap().position = Pos2::new(1000.0, 0.0);

        let mut vis = VisibilityController::new();
        vis.set_viewport(
            &mut doc,
            Rect::from_center_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
        );
        assert!(!doc.get(&a).unwrap().spatially_hidden);
    }

    #[test]
    fn test_ancestor_protection() {
        let mut doc = doc(r#"{"a": {"b": 1}}"#);
        let a = id_of(&doc, "a {}");
        let b = id_of(&doc, "b: 1");
        // Parent far off-screen, leaf in view
        doc.get_mut(&a).unwrap().position = Pos2::new(-20_000.0, 0.0);
        doc.get_mut(&b).unwrap().position = Pos2::ZERO;

        let mut vis = VisibilityController::new();
        vis.set_viewport(
            &mut doc,
            Rect::from_center_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
        );
        // a is forced visible so b's edge does not dangle
        assert!(!doc.get(&a).unwrap().spatially_hidden);
        let edge = doc.edges.iter().find(|e| e.target == b).unwrap();
        assert!(!edge.hidden);
    }

    #[test]
    fn test_root_always_spatially_visible() {
        let mut doc = doc(r#"{"a": 1}"#);
        let root = doc.root_id.clone();
        doc.get_mut(&root).unwrap().position = Pos2::new(-50_000.0, -50_000.0);

        let mut vis = VisibilityController::new();
        vis.set_viewport(
            &mut doc,
            Rect::from_center_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
        );
        assert!(!doc.get(&root).unwrap().spatially_hidden);
    }

    #[test]
    fn test_collapsed_subtree_stays_hidden_when_scrolled_into_view() {
        let mut doc = doc(r#"{"a": {"b": 1}}"#);
        let mut vis = VisibilityController::new();
        let a = id_of(&doc, "a {}");
        let b = id_of(&doc, "b: 1");

        vis.toggle_collapse(&mut doc, &a);
        // Viewport covering everything must not resurrect the collapsed child
        vis.set_viewport(
            &mut doc,
            Rect::from_center_size(Pos2::ZERO, Vec2::new(100_000.0, 100_000.0)),
        );
        assert!(doc.get(&b).unwrap().hidden());
    }

    #[test]
    fn test_debounce_coalesces_requests() {
        let mut doc = doc(r#"{"a": 1}"#);
        let mut vis = VisibilityController::new();
        let viewport = Rect::from_center_size(Pos2::ZERO, Vec2::new(800.0, 600.0));

        vis.request_viewport(viewport, 0.0);
        // Still inside the debounce window
        assert!(!vis.poll(&mut doc, 0.05));
        // A newer request restarts the window
        vis.request_viewport(viewport, 0.1);
        assert!(!vis.poll(&mut doc, 0.2));
        // Window elapsed: exactly one recompute
        assert!(vis.poll(&mut doc, 0.26));
        assert!(!vis.poll(&mut doc, 0.3));
    }

    #[test]
    fn test_reset_clears_all_state() {
        let mut doc = doc(r#"{"a": {"b": 1}}"#);
        let mut vis = VisibilityController::new();
        let a = id_of(&doc, "a {}");
        vis.toggle_collapse(&mut doc, &a);
        vis.request_viewport(Rect::from_center_size(Pos2::ZERO, Vec2::splat(10.0)), 0.0);

        vis.reset();
        assert!(vis.collapsed_set().is_empty());
        assert!(!vis.poll(&mut doc, 10.0));
    }
}
