//! Segment instances and their anchor geometry.
//!
//! A segment is one pre-authored piece of track. Its anchors are stored in
//! local space and the segment carries a single world-space origin, so moving
//! the segment is always a rigid translation: orientation and internal
//! geometry never change.

use glam::Vec3;
use runline_common::{AssetKey, Point3, SegmentId};

use crate::catalog::SegmentBlueprint;
use crate::props::PropSlot;

/// An instantiated track segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Instance ID
    id: SegmentId,
    /// Asset the instance was created from
    key: AssetKey,
    /// World-space origin
    origin: Point3,
    /// Entry anchor relative to the origin
    local_entry: Vec3,
    /// Exit anchor relative to the origin
    local_exit: Vec3,
    /// Cached entry-to-exit distance
    length: f32,
    /// Prop slots relative to the origin
    props: Vec<PropSlot>,
    /// Whether the segment is placed and visible
    active: bool,
}

impl Segment {
    /// Instantiates a segment at the world origin, inactive.
    #[must_use]
    pub fn from_blueprint(key: AssetKey, blueprint: &SegmentBlueprint) -> Self {
        let mut segment = Self {
            id: SegmentId::next(),
            key,
            origin: Point3::ZERO,
            local_entry: blueprint.entry,
            local_exit: blueprint.exit,
            length: 0.0,
            props: blueprint.props.clone(),
            active: false,
        };
        segment.recompute_length();
        segment
    }

    /// Returns the instance ID.
    #[must_use]
    pub const fn id(&self) -> SegmentId {
        self.id
    }

    /// Returns the asset key this instance was created from.
    #[must_use]
    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    /// Returns the world-space origin.
    #[must_use]
    pub const fn origin(&self) -> Point3 {
        self.origin
    }

    /// World-space position of the entry anchor.
    #[must_use]
    pub fn entry_anchor(&self) -> Point3 {
        self.origin + self.local_entry
    }

    /// World-space position of the exit anchor.
    #[must_use]
    pub fn exit_anchor(&self) -> Point3 {
        self.origin + self.local_exit
    }

    /// Returns the cached length.
    #[must_use]
    pub const fn length(&self) -> f32 {
        self.length
    }

    /// Re-derives the cached length from the current anchors.
    pub fn recompute_length(&mut self) -> f32 {
        self.length = self.local_entry.distance(self.local_exit);
        self.length
    }

    /// Moves the anchors within the segment, as authoring tools do.
    ///
    /// The cached length is left untouched until [`recompute_length`](Self::recompute_length).
    pub fn set_local_anchors(&mut self, entry: Vec3, exit: Vec3) {
        self.local_entry = entry;
        self.local_exit = exit;
    }

    /// Translates the segment so its entry anchor lands on `target`.
    pub fn place_at_entry(&mut self, target: Point3) {
        self.origin += target - self.entry_anchor();
    }

    /// Returns the prop slots, relative to the origin.
    #[must_use]
    pub fn prop_slots(&self) -> &[PropSlot] {
        &self.props
    }

    /// Returns whether the segment is placed and visible.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}
