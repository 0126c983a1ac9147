#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative in-memory store for emitted tree geometry.
//!
//! [`SceneStore`] implements the [`Scene`] contract for headless runs and for
//! adapters that render from snapshots. Handles are allocated from a counter
//! that survives [`Scene::clear_all`], so stale handles never alias new
//! emissions.

use std::collections::BTreeMap;

use arbor_core::{EmissionHandle, LeafHandle, LeafMarker, Scene, Segment, SegmentHandle};

#[derive(Clone, Copy, Debug)]
struct Record<T> {
    value: T,
    active: bool,
}

impl<T> Record<T> {
    const fn new(value: T) -> Self {
        Self {
            value,
            active: true,
        }
    }
}

/// Scene that keeps every emission in memory.
#[derive(Debug, Default)]
pub struct SceneStore {
    segments: BTreeMap<SegmentHandle, Record<Segment>>,
    leaves: BTreeMap<LeafHandle, Record<LeafMarker>>,
    next_handle: u64,
    clears: u64,
}

impl SceneStore {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle = self.next_handle.saturating_add(1);
        handle
    }
}

impl Scene for SceneStore {
    fn create_branch_segment(&mut self, segment: Segment) -> SegmentHandle {
        let handle = SegmentHandle::new(self.allocate());
        let _ = self.segments.insert(handle, Record::new(segment));
        handle
    }

    fn create_leaf(&mut self, leaf: LeafMarker) -> LeafHandle {
        let handle = LeafHandle::new(self.allocate());
        let _ = self.leaves.insert(handle, Record::new(leaf));
        handle
    }

    fn set_active(&mut self, handle: EmissionHandle, active: bool) {
        match handle {
            EmissionHandle::Segment(handle) => {
                if let Some(record) = self.segments.get_mut(&handle) {
                    record.active = active;
                }
            }
            EmissionHandle::Leaf(handle) => {
                if let Some(record) = self.leaves.get_mut(&handle) {
                    record.active = active;
                }
            }
        }
    }

    fn clear_all(&mut self) {
        self.segments.clear();
        self.leaves.clear();
        self.clears = self.clears.saturating_add(1);
    }
}

/// Query functions that expose read-only views into the scene.
pub mod query {
    use arbor_core::{LeafHandle, LeafMarker, Segment, SegmentHandle};

    use super::SceneStore;

    /// Active segments in creation order.
    #[must_use]
    pub fn active_segments(scene: &SceneStore) -> Vec<Segment> {
        scene
            .segments
            .values()
            .filter(|record| record.active)
            .map(|record| record.value)
            .collect()
    }

    /// Active leaves in creation order.
    #[must_use]
    pub fn active_leaves(scene: &SceneStore) -> Vec<LeafMarker> {
        scene
            .leaves
            .values()
            .filter(|record| record.active)
            .map(|record| record.value)
            .collect()
    }

    /// Number of active segments.
    #[must_use]
    pub fn active_segment_count(scene: &SceneStore) -> usize {
        scene.segments.values().filter(|record| record.active).count()
    }

    /// Number of active leaves.
    #[must_use]
    pub fn active_leaf_count(scene: &SceneStore) -> usize {
        scene.leaves.values().filter(|record| record.active).count()
    }

    /// Number of stored segments regardless of activation.
    #[must_use]
    pub fn stored_segment_count(scene: &SceneStore) -> usize {
        scene.segments.len()
    }

    /// Number of stored leaves regardless of activation.
    #[must_use]
    pub fn stored_leaf_count(scene: &SceneStore) -> usize {
        scene.leaves.len()
    }

    /// Looks up a segment by handle, whether active or not.
    #[must_use]
    pub fn segment(scene: &SceneStore, handle: SegmentHandle) -> Option<Segment> {
        scene.segments.get(&handle).map(|record| record.value)
    }

    /// Looks up a leaf by handle, whether active or not.
    #[must_use]
    pub fn leaf(scene: &SceneStore, handle: LeafHandle) -> Option<LeafMarker> {
        scene.leaves.get(&handle).map(|record| record.value)
    }

    /// Number of times the scene was cleared.
    #[must_use]
    pub fn clear_count(scene: &SceneStore) -> u64 {
        scene.clears
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn segment(height: f32) -> Segment {
        Segment {
            start: Vec3::ZERO,
            end: Vec3::new(0.0, height, 0.0),
            width: 1.0,
        }
    }

    fn leaf() -> LeafMarker {
        LeafMarker {
            anchor: Vec3::Y,
            orientation: Quat::IDENTITY,
            length: 1.0,
            start_width: 3.0,
            end_width: 2.0,
            material: None,
        }
    }

    #[test]
    fn created_emissions_start_active() {
        let mut scene = SceneStore::new();
        let _ = scene.create_branch_segment(segment(1.0));
        let _ = scene.create_leaf(leaf());

        assert_eq!(query::active_segment_count(&scene), 1);
        assert_eq!(query::active_leaf_count(&scene), 1);
    }

    #[test]
    fn deactivated_emissions_are_hidden_but_kept() {
        let mut scene = SceneStore::new();
        let first = scene.create_branch_segment(segment(1.0));
        let _ = scene.create_branch_segment(segment(2.0));

        scene.set_active(EmissionHandle::Segment(first), false);

        assert_eq!(query::active_segments(&scene), vec![segment(2.0)]);
        assert_eq!(query::stored_segment_count(&scene), 2);
        assert_eq!(query::segment(&scene, first), Some(segment(1.0)));
    }

    #[test]
    fn handles_are_not_reused_after_clear() {
        let mut scene = SceneStore::new();
        let stale = scene.create_branch_segment(segment(1.0));
        scene.clear_all();
        let fresh = scene.create_branch_segment(segment(2.0));

        assert_ne!(stale, fresh);
        assert_eq!(query::segment(&scene, stale), None);

        scene.set_active(EmissionHandle::Segment(stale), false);
        assert_eq!(query::active_segment_count(&scene), 1);
        assert_eq!(query::clear_count(&scene), 1);
    }

    #[test]
    fn clear_removes_leaves_too() {
        let mut scene = SceneStore::new();
        let handle = scene.create_leaf(leaf());
        scene.clear_all();

        assert_eq!(query::stored_leaf_count(&scene), 0);
        assert_eq!(query::leaf(&scene, handle), None);
    }
}
