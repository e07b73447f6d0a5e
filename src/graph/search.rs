//! Search engine - label matching, ancestor expansion, match navigation
//!
//! Matching is a linear scan over node labels: case-insensitive substring,
//! results in the node list's existing order (stable, not relevance-sorted).
//! Every match's ancestors are expanded (removed from the collapsed set) via
//! the reverse parent index so matches are always reachable, then logical
//! visibility is re-derived from scratch. Clearing the query removes all
//! highlighting without touching the collapsed set: auto-expansions persist.

use tracing::debug;

use super::types::{GraphDocument, GraphResult, Highlight, NodeId};
use super::visibility::VisibilityController;

/// Zoom level used when centering on a navigated match
pub const FOCUS_ZOOM: f32 = 1.0;

/// Seconds to let layout/animation settle before centering on a match
pub const NAV_SETTLE: f64 = 0.2;

/// Collapse indicator glyphs a label may carry at render time
const INDICATOR_GLYPHS: [char; 2] = ['▸', '▾'];

/// Current query, its ordered match list, and the selected match index
/// (−1 when there are no matches).
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    query: String,
    matches: Vec<NodeId>,
    current: isize,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            matches: Vec::new(),
            current: -1,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[NodeId] {
        &self.matches
    }

    /// Index of the selected match, −1 when empty
    pub fn current_index(&self) -> isize {
        self.current
    }

    /// Currently selected match id, if any
    pub fn current_match(&self) -> Option<&NodeId> {
        usize::try_from(self.current)
            .ok()
            .and_then(|i| self.matches.get(i))
    }

    /// Discard match state; called when a new parse replaces the document
    pub fn reset(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.current = -1;
    }

    /// Run a query. An empty query clears highlighting and the match list
    /// but leaves the collapsed set exactly as it is.
    ///
    /// Returns the number of matches. Fails only on a broken parent chain,
    /// which is a construction bug, not a user error.
    pub fn run(
        &mut self,
        doc: &mut GraphDocument,
        vis: &mut VisibilityController,
        query: &str,
    ) -> GraphResult<usize> {
        if query.is_empty() {
            self.clear(doc);
            return Ok(0);
        }

        self.query = query.to_string();
        let needle = query.to_lowercase();
        self.matches = doc
            .nodes
            .iter()
            .filter(|n| strip_glyphs(&n.label).to_lowercase().contains(&needle))
            .map(|n| n.id.clone())
            .collect();

        // Expand every ancestor of every match so no match is left
        // logically hidden under a collapsed subtree
        let mut expand: Vec<NodeId> = Vec::new();
        for id in &self.matches {
            expand.extend(doc.adjacency.ancestors(id)?);
        }
        vis.expand_all(&expand);
        vis.refresh(doc);

        self.current = if self.matches.is_empty() { -1 } else { 0 };
        self.apply_highlights(doc);
        debug!(query, matches = self.matches.len(), "search ran");
        Ok(self.matches.len())
    }

    /// Clear the query: remove all highlighting, reset the match list and
    /// index. The collapsed set is untouched.
    pub fn clear(&mut self, doc: &mut GraphDocument) {
        self.reset();
        for node in &mut doc.nodes {
            node.highlight = Highlight::None;
        }
    }

    /// Select the next match with wraparound; no-op when there are none.
    /// Returns the newly selected id for the shell to center on.
    pub fn next(&mut self, doc: &mut GraphDocument) -> Option<NodeId> {
        let len = self.matches.len() as isize;
        if len == 0 {
            return None;
        }
        self.current = (self.current + 1) % len;
        self.apply_highlights(doc);
        self.current_match().cloned()
    }

    /// Select the previous match with wraparound; no-op when there are none
    pub fn prev(&mut self, doc: &mut GraphDocument) -> Option<NodeId> {
        let len = self.matches.len() as isize;
        if len == 0 {
            return None;
        }
        self.current = (self.current - 1 + len) % len;
        self.apply_highlights(doc);
        self.current_match().cloned()
    }

    fn apply_highlights(&self, doc: &mut GraphDocument) {
        let selected = self.current_match().cloned();
        for node in &mut doc.nodes {
            node.highlight = if Some(&node.id) == selected.as_ref() {
                Highlight::Selected
            } else if self.matches.contains(&node.id) {
                Highlight::Match
            } else {
                Highlight::None
            };
        }
    }
}

/// Strip collapse indicator glyphs and surrounding whitespace from a label
fn strip_glyphs(label: &str) -> &str {
    label
        .trim_start_matches(|c: char| INDICATOR_GLYPHS.contains(&c) || c.is_whitespace())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder;
    use crate::graph::layout::LayoutEngine;

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
    fn test_case_insensitive_substring_in_node_order() {
        let mut d = doc(r#"{"Alpha": 1, "beta": {"alphabet": 2}}"#);
        let mut vis = VisibilityController::new();
        let mut search = SearchEngine::new();

        let n = search.run(&mut d, &mut vis, "ALPHA").unwrap();
        assert_eq!(n, 2);
        // Node list order, not relevance order
        assert_eq!(search.matches()[0], id_of(&d, "Alpha: 1"));
        assert_eq!(search.matches()[1], id_of(&d, "alphabet: 2"));
        assert_eq!(search.current_index(), 0);
    }

    #[test]
    fn test_match_under_collapsed_ancestor_is_expanded() {
        let mut d = doc(r#"{"a": {"b": 1}}"#);
        let mut vis = VisibilityController::new();
        let mut search = SearchEngine::new();
        let a = id_of(&d, "a {}");
        let b = id_of(&d, "b: 1");

        vis.toggle_collapse(&mut d, &a);
        assert!(d.get(&b).unwrap().logically_hidden);

        let n = search.run(&mut d, &mut vis, "b").unwrap();
        assert_eq!(n, 1);
        assert!(!vis.is_collapsed(&a));
        assert!(!d.get(&b).unwrap().logically_hidden);
        assert_eq!(d.get(&b).unwrap().highlight, Highlight::Selected);
    }

    #[test]
    fn test_clear_keeps_collapsed_set_but_removes_highlights() {
        let mut d = doc(r#"{"a": {"b": 1}, "c": {"d": 2}}"#);
        let mut vis = VisibilityController::new();
        let mut search = SearchEngine::new();
        let a = id_of(&d, "a {}");
        let c = id_of(&d, "c {}");

        vis.toggle_collapse(&mut d, &a);
        vis.toggle_collapse(&mut d, &c);
        // Search for b: expands a, leaves c collapsed
        search.run(&mut d, &mut vis, "b").unwrap();
        let collapsed_after_search: Vec<bool> = vec![vis.is_collapsed(&a), vis.is_collapsed(&c)];
        assert_eq!(collapsed_after_search, vec![false, true]);

        search.run(&mut d, &mut vis, "").unwrap();
        // Auto-expansion persists; highlights are gone
        assert!(!vis.is_collapsed(&a));
        assert!(vis.is_collapsed(&c));
        assert!(d.nodes.iter().all(|n| n.highlight == Highlight::None));
        assert_eq!(search.current_index(), -1);
        assert!(search.matches().is_empty());
    }

    #[test]
    fn test_navigation_wraps_around() {
        let mut d = doc(r#"{"m1": 1, "m2": 2, "m3": 3}"#);
        let mut vis = VisibilityController::new();
        let mut search = SearchEngine::new();

        assert_eq!(search.run(&mut d, &mut vis, "m").unwrap(), 3);
        assert_eq!(search.current_index(), 0);
        search.next(&mut d);
        search.next(&mut d);
        assert_eq!(search.current_index(), 2);
        // 3 matches, index 2: next wraps to 0
        search.next(&mut d);
        assert_eq!(search.current_index(), 0);
        // prev wraps back to the end
        search.prev(&mut d);
        assert_eq!(search.current_index(), 2);
    }

    #[test]
    fn test_navigation_noop_when_empty() {
        let mut d = doc(r#"{"a": 1}"#);
        let mut vis = VisibilityController::new();
        let mut search = SearchEngine::new();

        assert_eq!(search.run(&mut d, &mut vis, "zzz").unwrap(), 0);
        assert_eq!(search.current_index(), -1);
        assert!(search.next(&mut d).is_none());
        assert!(search.prev(&mut d).is_none());
        assert_eq!(search.current_index(), -1);
    }

    #[test]
    fn test_selected_match_moves_with_navigation() {
        let mut d = doc(r#"{"m1": 1, "m2": 2}"#);
        let mut vis = VisibilityController::new();
        let mut search = SearchEngine::new();
        search.run(&mut d, &mut vis, "m").unwrap();

        let first = search.current_match().cloned().unwrap();
        assert_eq!(d.get(&first).unwrap().highlight, Highlight::Selected);

        let second = search.next(&mut d).unwrap();
        assert_ne!(first, second);
        assert_eq!(d.get(&first).unwrap().highlight, Highlight::Match);
        assert_eq!(d.get(&second).unwrap().highlight, Highlight::Selected);
    }

    #[test]
    fn test_glyph_stripping() {
        assert_eq!(strip_glyphs("▸ a {}"), "a {}");
        assert_eq!(strip_glyphs("▾ a {}"), "a {}");
        assert_eq!(strip_glyphs("plain"), "plain");
    }
}
