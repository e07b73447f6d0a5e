//! JSON Atlas
//!
//! Turns arbitrary JSON text into an interactive node-link diagram:
//! parsing with auto-repair, bounded graph construction, ranked layout,
//! collapse/expand, viewport culling, and label search. The widget is an
//! egui component; the app shell in `src/bin/json-atlas.rs` owns the
//! window and the text input.

pub mod graph;

pub use graph::{
    // Graph construction
    builder,
    // Interaction controllers
    Camera2D,
    // Core document types
    GraphDocument,
    GraphEdge,
    GraphError,
    GraphNode,
    GraphResult,
    Highlight,
    JsonGraphWidget,
    LayoutEngine,
    NodeId,
    SearchEngine,
    SpatialIndex,
    VisibilityController,
};
