//! ID types for instances and assets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for segment instance IDs.
static SEGMENT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Global counter for prop instance IDs.
static PROP_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an instantiated track segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(u64);

impl SegmentId {
    /// Allocates a new unique segment ID.
    #[must_use]
    pub fn next() -> Self {
        Self(SEGMENT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg#{}", self.0)
    }
}

/// Unique identifier for an instantiated prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropId(u64);

impl PropId {
    /// Allocates a new unique prop ID.
    #[must_use]
    pub fn next() -> Self {
        Self(PROP_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// External key addressing a loadable asset (a segment or prop template).
///
/// Keys are opaque to the engine; only loaders interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    /// Creates an asset key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_ids_increase() {
        let first = SegmentId::next();
        let second = SegmentId::next();
        assert!(second > first);
        assert_eq!(first.to_string(), format!("seg#{}", first.0));
    }

    #[test]
    fn test_prop_ids_unique() {
        assert_ne!(PropId::next(), PropId::next());
    }

    #[test]
    fn test_asset_key_display() {
        let key = AssetKey::from("road/straight_01");
        assert_eq!(key.to_string(), "road/straight_01");
        assert_eq!(key.as_str(), "road/straight_01");
    }
}
