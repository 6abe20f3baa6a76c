//! # Runline World
//!
//! Track management for runline.
//!
//! This crate handles:
//! - Segment geometry and seamless placement
//! - Level catalogs and asynchronous asset loading
//! - Streaming a bounded window of segments around a moving agent
//! - Pooled set-dressing props attached to segments

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod loader;
pub mod props;
pub mod segment;
pub mod streaming;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::loader::*;
    pub use crate::props::*;
    pub use crate::segment::*;
    pub use crate::streaming::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use runline_common::{anchors_coincide, AssetKey, Point3};

    #[test]
    fn test_segment_creation() {
        let blueprint = SegmentBlueprint::straight("flat", 30.0);
        let segment = Segment::from_blueprint(AssetKey::from("flat"), &blueprint);
        assert!(!segment.is_active());
        assert!((segment.length() - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_catalog_parsing() {
        let catalog = SegmentCatalog::from_toml_str(r#"segments = ["a", "b", "c"]"#)
            .expect("parse failed");
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.keys()[1], AssetKey::from("b"));
    }

    #[test]
    fn test_placement_chains_two_segments() {
        let mut first = Segment::from_blueprint("a".into(), &SegmentBlueprint::straight("a", 10.0));
        let mut second = Segment::from_blueprint("b".into(), &SegmentBlueprint::straight("b", 25.0));
        first.place_at_entry(Point3::ZERO);
        second.place_at_entry(first.exit_anchor());
        assert!(anchors_coincide(first.exit_anchor(), second.entry_anchor()));
    }
}
