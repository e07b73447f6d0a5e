//! Core graph types shared by the builder, layout, visibility, and search
//! modules, plus the error taxonomy.
//!
//! `GraphNode` / `GraphEdge` are the boundary types handed to the rendering
//! shell; they are `Serialize` so the boundary stays concrete.

use std::collections::HashMap;

use egui::{Pos2, Rect, Vec2};
use serde::Serialize;
use thiserror::Error;

/// Stable node identifier, formatted `node-<n>` in traversal order.
pub type NodeId = String;

/// Errors surfaced by graph construction and ancestor lookups
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Input is not valid JSON (after the repair attempt also failed).
    /// The previously rendered graph must be left untouched.
    #[error("invalid JSON at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A node references a parent id the adjacency map does not know.
    /// This is a construction bug, not a user error: ancestor walks for
    /// search and virtualization depend on the index being closed.
    #[error("node {node} references unknown parent {parent}")]
    MissingParent { node: NodeId, parent: NodeId },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Search highlight state for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Highlight {
    #[default]
    None,
    /// Label matched the current query
    Match,
    /// The currently selected match (stronger style)
    Selected,
}

/// One node of the rendered graph
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: NodeId,
    /// Display label without any collapse glyph (glyphs are render-side)
    pub label: String,
    /// Object or array (vs scalar leaf)
    pub is_container: bool,
    /// Whether any child nodes were actually emitted for this node
    pub has_children: bool,
    /// Parent id, `None` for the root and the global warning node
    pub parent: Option<NodeId>,
    /// Box center in world coordinates, written only by the layout engine
    pub position: Pos2,
    /// Box size in world coordinates
    pub size: Vec2,
    /// Hidden because an ancestor is collapsed
    pub logically_hidden: bool,
    /// Hidden because outside the viewport + buffer
    pub spatially_hidden: bool,
    pub highlight: Highlight,
}

impl GraphNode {
    /// Derived visibility: hidden by either mechanism
    pub fn hidden(&self) -> bool {
        self.logically_hidden || self.spatially_hidden
    }

    /// World-space bounding box
    pub fn rect(&self) -> Rect {
        Rect::from_center_size(self.position, self.size)
    }
}

/// Directed edge between a parent and one of its children
#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    /// True iff either endpoint is hidden
    pub hidden: bool,
}

// =============================================================================
// ADJACENCY MAP
// =============================================================================

/// Parent→children adjacency plus an explicit child→parent reverse index.
///
/// Built once per parse, immutable until the next parse. The structure is a
/// tree: every non-root id has exactly one parent and there are no cycles.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdjacencyMap {
    children: HashMap<NodeId, Vec<NodeId>>,
    parents: HashMap<NodeId, NodeId>,
}

impl AdjacencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `child` as the next child of `parent`
    pub fn push_child(&mut self, parent: &str, child: &str) {
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
        self.parents.insert(child.to_string(), parent.to_string());
    }

    /// Ordered children of a node (empty slice for leaves)
    pub fn children(&self, id: &str) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent of a node via the reverse index, `None` for roots
    pub fn parent(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    /// All strict ancestors of a node, nearest first.
    ///
    /// Fails with `MissingParent` if the chain ever points at an id the
    /// forward map has never seen as parent or child.
    pub fn ancestors(&self, id: &str) -> GraphResult<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut cursor = id;
        while let Some(parent) = self.parents.get(cursor) {
            if !self.children.contains_key(parent.as_str()) {
                return Err(GraphError::MissingParent {
                    node: cursor.to_string(),
                    parent: parent.clone(),
                });
            }
            out.push(parent.clone());
            cursor = parent;
        }
        Ok(out)
    }

    /// All descendants of a node, collected breadth-first (FIFO).
    ///
    /// The map is a tree, so each node is enqueued exactly once and no
    /// visited-set is needed.
    pub fn descendants(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut queue: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
        queue.push_back(id);
        while let Some(current) = queue.pop_front() {
            for child in self.children(current) {
                out.push(child.clone());
                queue.push_back(child);
            }
        }
        out
    }

    /// Number of parent entries in the forward map
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

// =============================================================================
// GRAPH DOCUMENT
// =============================================================================

/// One parse's worth of graph state: nodes, edges, adjacency, and the ids of
/// the two synthetic nodes the visibility rules special-case.
#[derive(Debug, Clone, Default)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub adjacency: AdjacencyMap,
    /// Synthetic root (`node-1`); empty only for the default document
    pub root_id: NodeId,
    /// Global truncation warning node, present at most once per parse
    pub warning_id: Option<NodeId>,
    /// Whether the node/depth caps pruned any branch
    pub truncated: bool,
    index: HashMap<NodeId, usize>,
}

impl GraphDocument {
    pub fn new(
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
        adjacency: AdjacencyMap,
        root_id: NodeId,
        warning_id: Option<NodeId>,
        truncated: bool,
    ) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        Self {
            nodes,
            edges,
            adjacency,
            root_id,
            warning_id,
            truncated,
            index,
        }
    }

    pub fn get(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// World-space bounding box of all nodes: the image-export boundary.
    /// `None` for an empty document.
    pub fn content_bounds(&self) -> Option<Rect> {
        let mut iter = self.nodes.iter();
        let first = iter.next()?;
        let mut bounds = first.rect();
        for node in iter {
            bounds = bounds.union(node.rect());
        }
        Some(bounds)
    }

    /// Verify the parent references are closed over the node set.
    ///
    /// A violation here is a construction bug and is treated as fatal by
    /// callers rather than silently ignored.
    pub fn validate(&self) -> GraphResult<()> {
        for node in &self.nodes {
            if let Some(parent) = &node.parent {
                if !self.index.contains_key(parent.as_str()) {
                    return Err(GraphError::MissingParent {
                        node: node.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, parent: Option<&str>) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            label: id.to_string(),
            is_container: false,
            has_children: false,
            parent: parent.map(str::to_string),
            position: Pos2::ZERO,
            size: Vec2::new(160.0, 36.0),
            logically_hidden: false,
            spatially_hidden: false,
            highlight: Highlight::None,
        }
    }

    #[test]
    fn test_descendants_bfs_order() {
        let mut adj = AdjacencyMap::new();
        adj.push_child("r", "a");
        adj.push_child("r", "b");
        adj.push_child("a", "a1");
        adj.push_child("a", "a2");
        adj.push_child("b", "b1");

        // Breadth-first: both children of the root before any grandchild
        let d = adj.descendants("r");
        assert_eq!(d, vec!["a", "b", "a1", "a2", "b1"]);
    }

    #[test]
    fn test_descendants_visits_each_node_once() {
        let mut adj = AdjacencyMap::new();
        adj.push_child("r", "a");
        adj.push_child("a", "b");
        adj.push_child("b", "c");

        let d = adj.descendants("r");
        let mut sorted = d.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(d.len(), sorted.len());
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let mut adj = AdjacencyMap::new();
        adj.push_child("r", "a");
        adj.push_child("a", "b");

        assert_eq!(adj.ancestors("b").unwrap(), vec!["a", "r"]);
        assert!(adj.ancestors("r").unwrap().is_empty());
    }

    #[test]
    fn test_validate_missing_parent() {
        let nodes = vec![node("r", None), node("x", Some("ghost"))];
        let doc = GraphDocument::new(
            nodes,
            vec![],
            AdjacencyMap::new(),
            "r".to_string(),
            None,
            false,
        );
        match doc.validate() {
            Err(GraphError::MissingParent { node, parent }) => {
                assert_eq!(node, "x");
                assert_eq!(parent, "ghost");
            }
            other => panic!("expected MissingParent, got {other:?}"),
        }
    }

    #[test]
    fn test_content_bounds_spans_all_nodes() {
        let mut a = node("a", None);
        a.position = Pos2::new(0.0, 0.0);
        let mut b = node("b", Some("a"));
        b.position = Pos2::new(400.0, 300.0);
        let doc = GraphDocument::new(
            vec![a, b],
            vec![],
            AdjacencyMap::new(),
            "a".to_string(),
            None,
            false,
        );
        let bounds = doc.content_bounds().unwrap();
        assert!(bounds.min.x <= -80.0);
        assert!(bounds.max.x >= 480.0);
    }
}
