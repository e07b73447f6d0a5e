//! Spatial index for fast click/hover hit testing
//!
//! R-tree (via `rstar`) over node bounding boxes, rebuilt once per parse
//! after layout runs. O(log n) lookups keep hover responsive at the node cap.

use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};

use super::types::{GraphDocument, NodeId};

/// One indexed node box in world coordinates
#[derive(Debug, Clone)]
pub struct NodeBox {
    pub id: NodeId,
    bounds: AABB<[f32; 2]>,
}

impl NodeBox {
    pub fn new(id: impl Into<NodeId>, min: [f32; 2], max: [f32; 2]) -> Self {
        Self {
            id: id.into(),
            bounds: AABB::from_corners(min, max),
        }
    }

    pub fn bounds(&self) -> &AABB<[f32; 2]> {
        &self.bounds
    }
}

impl RTreeObject for NodeBox {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

impl PointDistance for NodeBox {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        self.bounds.distance_2(point)
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        self.bounds.contains_point(point)
    }
}

/// Hit-testing index over the current document's node boxes
#[derive(Clone, Default)]
pub struct SpatialIndex {
    tree: RTree<NodeBox>,
    count: usize,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from a laid-out document
    pub fn from_document(doc: &GraphDocument) -> Self {
        let boxes: Vec<NodeBox> = doc
            .nodes
            .iter()
            .map(|n| {
                let rect = n.rect();
                NodeBox::new(n.id.clone(), [rect.min.x, rect.min.y], [rect.max.x, rect.max.y])
            })
            .collect();
        let count = boxes.len();
        Self {
            tree: RTree::bulk_load(boxes),
            count,
        }
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.count = 0;
    }

    /// Node whose box contains the world-space point (topmost is irrelevant:
    /// laid-out boxes do not overlap)
    pub fn hit_test(&self, point: [f32; 2]) -> Option<&NodeBox> {
        self.tree.locate_all_at_point(&point).next()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
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

    fn index_for(text: &str) -> (GraphDocument, SpatialIndex) {
        let mut doc = builder::parse(text).unwrap();
        LayoutEngine::new().compute_layout(&mut doc);
        let index = SpatialIndex::from_document(&doc);
        (doc, index)
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::new();
        assert!(index.is_empty());
        assert!(index.hit_test([0.0, 0.0]).is_none());
    }

    #[test]
    fn test_hit_on_node_center() {
        let (doc, index) = index_for(r#"{"a": 1}"#);
        for node in &doc.nodes {
            let hit = index.hit_test([node.position.x, node.position.y]);
            assert_eq!(hit.map(|b| b.id.as_str()), Some(node.id.as_str()));
        }
    }

    #[test]
    fn test_miss_outside_all_boxes() {
        let (_, index) = index_for(r#"{"a": 1}"#);
        assert!(index.hit_test([99_999.0, 99_999.0]).is_none());
    }

    #[test]
    fn test_hit_respects_box_edges() {
        let (doc, index) = index_for(r#"{"a": 1}"#);
        let rect = doc.get(&doc.root_id).unwrap().rect();
        // Just inside the corner hits, just outside misses
        let inside = [rect.min.x + 0.5, rect.min.y + 0.5];
        let outside = [rect.min.x - 0.5, rect.min.y - 0.5];
        assert_eq!(
            index.hit_test(inside).map(|b| b.id.as_str()),
            Some(doc.root_id.as_str())
        );
        assert!(index.hit_test(outside).is_none());
    }
}
