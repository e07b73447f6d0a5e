//! Tree Builder - bounded traversal of a parsed JSON value
//!
//! Turns a JSON document into a flat node list, edge list, and adjacency map.
//! Traversal is pre-order depth-first from a synthetic root labeled `Root`.
//! Hard caps bound the traversal cost; hitting the node or depth cap prunes
//! the branch and produces a single global warning node, never an error.
//!
//! Parse failure is terminal for the call: the caller keeps the previously
//! displayed graph and surfaces the error. A speculative lexical repair pass
//! (single quotes, bare keys, trailing commas) runs first on failure and is
//! adopted only if the repaired text itself parses.

use egui::{Pos2, Vec2};
use serde_json::Value;
use tracing::{debug, warn};

use super::layout::{NODE_HEIGHT, NODE_WIDTH};
use super::types::{
    AdjacencyMap, GraphDocument, GraphEdge, GraphError, GraphNode, GraphResult, Highlight, NodeId,
};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum total nodes per document
pub const MAX_NODES: usize = 3000;
/// Maximum traversal depth below the root
pub const MAX_DEPTH: usize = 10;
/// Maximum array elements rendered per container
pub const MAX_ARRAY_ITEMS: usize = 50;
/// Maximum object properties rendered per container
pub const MAX_OBJECT_PROPS: usize = 50;
/// Maximum characters of a scalar value shown in a label
pub const MAX_VALUE_CHARS: usize = 50;

/// Label of the synthetic root node
pub const ROOT_LABEL: &str = "Root";
/// Id of the global truncation warning node (prepended, parentless)
pub const WARNING_NODE_ID: &str = "node-0";
/// Label of the global truncation warning node
pub const WARNING_LABEL: &str = "Graph truncated: node or depth limit reached";

// =============================================================================
// PARSE
// =============================================================================

/// Parse a JSON text and build its graph document.
///
/// On invalid input this fails without partial effects; `LimitExceeded`-style
/// truncation is not a failure and shows up as `doc.truncated` plus the
/// warning node instead.
pub fn parse(text: &str) -> GraphResult<GraphDocument> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(err) => {
            let repaired = repair(text)
                .and_then(|fixed| serde_json::from_str::<Value>(&fixed).ok());
            match repaired {
                Some(value) => {
                    warn!("input was not valid JSON; adopted auto-repaired text");
                    value
                }
                None => return Err(parse_error(&err)),
            }
        }
    };

    let doc = build(&value);
    debug!(
        nodes = doc.nodes.len(),
        edges = doc.edges.len(),
        truncated = doc.truncated,
        "built graph document"
    );
    doc.validate()?;
    Ok(doc)
}

fn parse_error(err: &serde_json::Error) -> GraphError {
    GraphError::Parse {
        line: err.line(),
        column: err.column(),
        message: err.to_string(),
    }
}

// =============================================================================
// BUILD
// =============================================================================

/// Build the graph document for an already-parsed value
pub fn build(value: &Value) -> GraphDocument {
    let mut state = BuildState::new();

    // Root node always exists, even for a scalar document
    let (root_id, root_idx) = state
        .alloc(ROOT_LABEL.to_string(), value.is_object() || value.is_array(), None)
        .expect("node cap cannot be hit on the first node");

    let emitted = match value {
        Value::Object(map) => state.visit_object_entries(map, &root_id, 1),
        Value::Array(items) => state.visit_array_items(items, &root_id, 1),
        scalar => {
            state.visit_value(None, scalar, &root_id, 1);
            1
        }
    };
    state.nodes[root_idx].has_children = emitted > 0;

    let warning_id = if state.truncated {
        warn!("traversal hit the node or depth cap; graph is truncated");
        state.nodes.insert(0, warning_node());
        Some(WARNING_NODE_ID.to_string())
    } else {
        None
    };

    GraphDocument::new(
        state.nodes,
        state.edges,
        state.adjacency,
        root_id,
        warning_id,
        state.truncated,
    )
}

fn warning_node() -> GraphNode {
    GraphNode {
        id: WARNING_NODE_ID.to_string(),
        label: WARNING_LABEL.to_string(),
        is_container: false,
        has_children: false,
        parent: None,
        position: Pos2::ZERO,
        size: Vec2::new(NODE_WIDTH, NODE_HEIGHT),
        logically_hidden: false,
        spatially_hidden: false,
        highlight: Highlight::None,
    }
}

struct BuildState {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    adjacency: AdjacencyMap,
    next_node: usize,
    next_edge: usize,
    truncated: bool,
}

impl BuildState {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            adjacency: AdjacencyMap::new(),
            next_node: 1,
            next_edge: 1,
            truncated: false,
        }
    }

    /// Create a node (and its parent edge) unless the node cap is hit.
    /// Returns the new id and its index in the node list.
    fn alloc(
        &mut self,
        label: String,
        is_container: bool,
        parent: Option<&str>,
    ) -> Option<(NodeId, usize)> {
        if self.nodes.len() >= MAX_NODES {
            self.truncated = true;
            return None;
        }
        let id = format!("node-{}", self.next_node);
        self.next_node += 1;

        let idx = self.nodes.len();
        self.nodes.push(GraphNode {
            id: id.clone(),
            label,
            is_container,
            has_children: false,
            parent: parent.map(str::to_string),
            position: Pos2::ZERO,
            size: Vec2::new(NODE_WIDTH, NODE_HEIGHT),
            logically_hidden: false,
            spatially_hidden: false,
            highlight: Highlight::None,
        });

        if let Some(parent) = parent {
            self.edges.push(GraphEdge {
                id: format!("edge-{}", self.next_edge),
                source: parent.to_string(),
                target: id.clone(),
                hidden: false,
            });
            self.next_edge += 1;
            self.adjacency.push_child(parent, &id);
        }
        Some((id, idx))
    }

    /// Pre-order visit of one value. Containers recurse; the depth cap prunes
    /// the branch before creating its node.
    fn visit_value(&mut self, key: Option<&str>, value: &Value, parent: &str, depth: usize) {
        if depth > MAX_DEPTH {
            self.truncated = true;
            return;
        }
        match value {
            Value::Object(map) => {
                let Some((id, idx)) = self.alloc(container_label(key, "{}"), true, Some(parent))
                else {
                    return;
                };
                let emitted = self.visit_object_entries(map, &id, depth + 1);
                self.nodes[idx].has_children = emitted > 0;
            }
            Value::Array(items) => {
                let Some((id, idx)) = self.alloc(container_label(key, "[]"), true, Some(parent))
                else {
                    return;
                };
                let emitted = self.visit_array_items(items, &id, depth + 1);
                self.nodes[idx].has_children = emitted > 0;
            }
            scalar => {
                self.alloc(scalar_label(key, scalar), false, Some(parent));
            }
        }
    }

    /// Visit object properties in key order; returns how many children were
    /// actually emitted (including a "more" node).
    fn visit_object_entries(
        &mut self,
        map: &serde_json::Map<String, Value>,
        parent: &str,
        depth: usize,
    ) -> usize {
        let mut emitted = 0;
        for (i, (key, value)) in map.iter().enumerate() {
            if i >= MAX_OBJECT_PROPS {
                let remaining = map.len() - MAX_OBJECT_PROPS;
                let label = format!("... {remaining} more properties");
                if self.alloc(label, false, Some(parent)).is_some() {
                    emitted += 1;
                }
                break;
            }
            let before = self.nodes.len();
            self.visit_value(Some(key), value, parent, depth);
            if self.nodes.len() > before {
                emitted += 1;
            }
        }
        emitted
    }

    /// Visit array elements in index order; same truncation contract as
    /// object entries.
    fn visit_array_items(&mut self, items: &[Value], parent: &str, depth: usize) -> usize {
        let mut emitted = 0;
        for (i, value) in items.iter().enumerate() {
            if i >= MAX_ARRAY_ITEMS {
                let remaining = items.len() - MAX_ARRAY_ITEMS;
                let label = format!("... {remaining} more items");
                if self.alloc(label, false, Some(parent)).is_some() {
                    emitted += 1;
                }
                break;
            }
            let before = self.nodes.len();
            self.visit_value(None, value, parent, depth);
            if self.nodes.len() > before {
                emitted += 1;
            }
        }
        emitted
    }
}

// =============================================================================
// LABELS
// =============================================================================

fn container_label(key: Option<&str>, sigil: &str) -> String {
    match key {
        Some(key) => format!("{key} {sigil}"),
        None => sigil.to_string(),
    }
}

fn scalar_label(key: Option<&str>, value: &Value) -> String {
    let text = truncate_chars(&scalar_text(value), MAX_VALUE_CHARS);
    match key {
        Some(key) => format!("{key}: {text}"),
        None => text,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        // containers never reach here
        other => other.to_string(),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i >= max {
            out.push('…');
            break;
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// AUTO-REPAIR
// =============================================================================

/// Speculative lexical repair for the common JSON mistakes: single-quoted
/// strings, bare object keys, trailing commas. Returns `None` when the text
/// needed no change (so the original parse error stands).
///
/// String-aware: double-quoted regions are copied verbatim, escapes included.
fn repair(input: &str) -> Option<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut changed = false;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                // Copy a double-quoted string verbatim
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    out.push(c);
                    i += 1;
                    if c == '\\' {
                        if i < chars.len() {
                            out.push(chars[i]);
                            i += 1;
                        }
                        continue;
                    }
                    if c == '"' {
                        break;
                    }
                }
            }
            '\'' => {
                // Rewrite a single-quoted string as double-quoted
                changed = true;
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    i += 1;
                    if c == '\\' {
                        out.push('\\');
                        if i < chars.len() {
                            out.push(chars[i]);
                            i += 1;
                        }
                        continue;
                    }
                    if c == '\'' {
                        break;
                    }
                    if c == '"' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
            }
            ',' => {
                // Drop a trailing comma before a closing bracket
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                if j < chars.len() && (chars[j] == '}' || chars[j] == ']') {
                    changed = true;
                } else {
                    out.push(',');
                }
                i += 1;
            }
            c if c.is_alphabetic() || c == '_' => {
                // Quote a bare identifier used as an object key
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let mut j = i;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if j < chars.len() && chars[j] == ':' {
                    changed = true;
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                } else {
                    out.push_str(&word);
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    changed.then_some(out)
}

// =============================================================================
// TESTS
// =============================================================================
