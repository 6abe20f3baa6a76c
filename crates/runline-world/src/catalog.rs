//! Level catalogs and segment blueprints.
//!
//! A catalog is the ordered list of segment asset keys that make up a level.
//! Each key resolves, through an [`AssetLoader`](crate::loader::AssetLoader),
//! to a [`SegmentBlueprint`] describing the segment's local-space anchors.

use std::path::Path;

use glam::Vec3;
use runline_common::{AssetKey, RunlineError, RunlineResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::props::PropSlot;

/// Authored description of one segment type, in the segment's local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentBlueprint {
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Entry anchor relative to the segment origin
    pub entry: Vec3,
    /// Exit anchor relative to the segment origin
    pub exit: Vec3,
    /// Prop slots filled while the segment is active
    #[serde(default)]
    pub props: Vec<PropSlot>,
}

impl SegmentBlueprint {
    /// Creates a blueprint from its anchors.
    #[must_use]
    pub fn new(name: impl Into<String>, entry: Vec3, exit: Vec3) -> Self {
        Self {
            name: name.into(),
            entry,
            exit,
            props: Vec::new(),
        }
    }

    /// Creates a straight segment running `length` units along +Z from its origin.
    #[must_use]
    pub fn straight(name: impl Into<String>, length: f32) -> Self {
        Self::new(name, Vec3::ZERO, Vec3::new(0.0, 0.0, length))
    }

    /// Adds a prop slot.
    #[must_use]
    pub fn with_prop(mut self, slot: PropSlot) -> Self {
        self.props.push(slot);
        self
    }
}

/// Ordered, immutable list of segment asset keys.
///
/// One instance is materialized per entry, so the catalog size is also the
/// total number of segment instances the streamer will ever hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentCatalog {
    /// Segment asset keys in authoring order
    segments: Vec<AssetKey>,
}

impl SegmentCatalog {
    /// Creates a catalog from keys.
    #[must_use]
    pub fn new(segments: Vec<AssetKey>) -> Self {
        Self { segments }
    }

    /// Parses a catalog from TOML (`segments = ["key", ...]`).
    pub fn from_toml_str(contents: &str) -> RunlineResult<Self> {
        toml::from_str(contents).map_err(|e| RunlineError::Config(e.to_string()))
    }

    /// Loads a catalog from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> RunlineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&contents)?;
        info!(
            "Loaded level catalog from {} ({} segments)",
            path.display(),
            catalog.len()
        );
        Ok(catalog)
    }

    /// Returns the keys in order.
    #[must_use]
    pub fn keys(&self) -> &[AssetKey] {
        &self.segments
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
